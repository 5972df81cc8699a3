// src/db/action_repo.rs

use chrono::{DateTime, Utc};
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::action::{
        Action, ActionDetail, ActionFilter, ActionPriority, ActionStatus, ActionType, UpdateActionPayload,
    },
};

const ACTION_COLUMNS: &str = "id, lead_id, salesperson_id, action_type, due_at, completed_at, title, notes, priority, status, created_at, updated_at";

const ACTION_DETAIL_SELECT: &str = r#"
    SELECT a.id, a.lead_id, a.salesperson_id, a.action_type, a.due_at, a.completed_at,
           a.title, a.notes, a.priority, a.status, a.created_at, a.updated_at,
           l.company_name AS lead_company,
           l.contact_name AS lead_contact,
           u.username AS salesperson_name
    FROM actions a
    JOIN leads l ON l.id = a.lead_id
    JOIN users u ON u.id = a.salesperson_id
"#;

// Contagens cruas para o endpoint de estatísticas
#[derive(Debug, sqlx::FromRow)]
pub struct ActionCounts {
    pub total: i64,
    pub done: i64,
    pub pending: i64,
    pub cancelled: i64,
    pub overdue: i64,
}

// Campos de uma nova ação, já com status e conclusão resolvidos
#[derive(Debug)]
pub struct NewAction<'a> {
    pub lead_id: Uuid,
    pub salesperson_id: Uuid,
    pub action_type: ActionType,
    pub due_at: DateTime<Utc>,
    pub title: &'a str,
    pub notes: Option<&'a str>,
    pub priority: ActionPriority,
    pub status: ActionStatus,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Clone)]
pub struct ActionRepository {
    pool: PgPool,
}

impl ActionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, salesperson_id: Uuid, filter: &ActionFilter) -> Result<Vec<ActionDetail>, AppError> {
        let sql = format!(
            "{ACTION_DETAIL_SELECT}
             WHERE a.salesperson_id = $1
               AND ($2::action_type IS NULL OR a.action_type = $2)
               AND ($3::action_status IS NULL OR a.status = $3)
               AND ($4::action_priority IS NULL OR a.priority = $4)
               AND ($5::uuid IS NULL OR a.lead_id = $5)
               AND ($6::text IS NULL
                    OR a.title ILIKE '%' || $6 || '%'
                    OR a.notes ILIKE '%' || $6 || '%'
                    OR l.company_name ILIKE '%' || $6 || '%')
             ORDER BY a.due_at"
        );
        let actions = sqlx::query_as::<_, ActionDetail>(&sql)
            .bind(salesperson_id)
            .bind(filter.action_type)
            .bind(filter.status)
            .bind(filter.priority)
            .bind(filter.lead_id)
            .bind(filter.search.as_deref())
            .fetch_all(&self.pool)
            .await?;
        Ok(actions)
    }

    // =========================================================================
    //  CONSULTAS DE ACOMPANHAMENTO
    // =========================================================================

    // Pendentes com vencimento hoje (data do servidor)
    pub async fn list_due_today(&self, salesperson_id: Uuid) -> Result<Vec<ActionDetail>, AppError> {
        let sql = format!(
            "{ACTION_DETAIL_SELECT}
             WHERE a.salesperson_id = $1 AND a.status = 'pending' AND a.due_at::date = CURRENT_DATE
             ORDER BY a.due_at"
        );
        self.fetch_for(&sql, salesperson_id).await
    }

    pub async fn list_overdue(&self, salesperson_id: Uuid) -> Result<Vec<ActionDetail>, AppError> {
        let sql = format!(
            "{ACTION_DETAIL_SELECT}
             WHERE a.salesperson_id = $1 AND a.status = 'pending' AND a.due_at < NOW()
             ORDER BY a.due_at"
        );
        self.fetch_for(&sql, salesperson_id).await
    }

    pub async fn list_upcoming(&self, salesperson_id: Uuid) -> Result<Vec<ActionDetail>, AppError> {
        let sql = format!(
            "{ACTION_DETAIL_SELECT}
             WHERE a.salesperson_id = $1 AND a.status = 'pending'
             ORDER BY a.due_at"
        );
        self.fetch_for(&sql, salesperson_id).await
    }

    async fn fetch_for(&self, sql: &str, salesperson_id: Uuid) -> Result<Vec<ActionDetail>, AppError> {
        let actions = sqlx::query_as::<_, ActionDetail>(sql)
            .bind(salesperson_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(actions)
    }

    pub async fn counts(&self, salesperson_id: Uuid) -> Result<ActionCounts, AppError> {
        let counts = sqlx::query_as::<_, ActionCounts>(
            r#"
            SELECT COUNT(*) AS total,
                   COUNT(*) FILTER (WHERE status = 'done') AS done,
                   COUNT(*) FILTER (WHERE status = 'pending') AS pending,
                   COUNT(*) FILTER (WHERE status = 'cancelled') AS cancelled,
                   COUNT(*) FILTER (WHERE status = 'pending' AND due_at < NOW()) AS overdue
            FROM actions
            WHERE salesperson_id = $1
            "#,
        )
        .bind(salesperson_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(counts)
    }

    // =========================================================================
    //  CRUD
    // =========================================================================

    pub async fn find_detail<'e, E>(&self, executor: E, salesperson_id: Uuid, id: Uuid) -> Result<Option<ActionDetail>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("{ACTION_DETAIL_SELECT} WHERE a.id = $1 AND a.salesperson_id = $2");
        let action = sqlx::query_as::<_, ActionDetail>(&sql)
            .bind(id)
            .bind(salesperson_id)
            .fetch_optional(executor)
            .await?;
        Ok(action)
    }

    pub async fn lock_owned<'e, E>(&self, executor: E, salesperson_id: Uuid, id: Uuid) -> Result<Option<Action>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "SELECT {ACTION_COLUMNS} FROM actions WHERE id = $1 AND salesperson_id = $2 FOR UPDATE"
        );
        let action = sqlx::query_as::<_, Action>(&sql)
            .bind(id)
            .bind(salesperson_id)
            .fetch_optional(executor)
            .await?;
        Ok(action)
    }

    pub async fn create<'e, E>(&self, executor: E, action: &NewAction<'_>) -> Result<Action, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "INSERT INTO actions (lead_id, salesperson_id, action_type, due_at, title, notes, priority, status, completed_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING {ACTION_COLUMNS}"
        );
        let created = sqlx::query_as::<_, Action>(&sql)
            .bind(action.lead_id)
            .bind(action.salesperson_id)
            .bind(action.action_type)
            .bind(action.due_at)
            .bind(action.title.trim())
            .bind(action.notes)
            .bind(action.priority)
            .bind(action.status)
            .bind(action.completed_at)
            .fetch_one(executor)
            .await?;
        Ok(created)
    }

    pub async fn update<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        payload: &UpdateActionPayload,
        completed_at: Option<DateTime<Utc>>,
    ) -> Result<Action, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "UPDATE actions
             SET lead_id = COALESCE($2, lead_id),
                 action_type = COALESCE($3, action_type),
                 due_at = COALESCE($4, due_at),
                 title = COALESCE($5, title),
                 notes = COALESCE($6, notes),
                 priority = COALESCE($7, priority),
                 status = COALESCE($8, status),
                 completed_at = COALESCE($9, completed_at),
                 updated_at = NOW()
             WHERE id = $1
             RETURNING {ACTION_COLUMNS}"
        );
        let action = sqlx::query_as::<_, Action>(&sql)
            .bind(id)
            .bind(payload.lead_id)
            .bind(payload.action_type)
            .bind(payload.due_at)
            .bind(payload.title.as_deref().map(str::trim))
            .bind(payload.notes.as_deref())
            .bind(payload.priority)
            .bind(payload.status)
            .bind(completed_at)
            .fetch_one(executor)
            .await?;
        Ok(action)
    }

    pub async fn set_status<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        status: ActionStatus,
        completed_at: Option<DateTime<Utc>>,
    ) -> Result<Action, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "UPDATE actions SET status = $2, completed_at = $3, updated_at = NOW()
             WHERE id = $1
             RETURNING {ACTION_COLUMNS}"
        );
        let action = sqlx::query_as::<_, Action>(&sql)
            .bind(id)
            .bind(status)
            .bind(completed_at)
            .fetch_one(executor)
            .await?;
        Ok(action)
    }

    pub async fn delete_owned(&self, salesperson_id: Uuid, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM actions WHERE id = $1 AND salesperson_id = $2")
            .bind(id)
            .bind(salesperson_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
