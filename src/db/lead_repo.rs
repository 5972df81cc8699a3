// src/db/lead_repo.rs

use chrono::{DateTime, Utc};
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::{map_unique_violation, AppError},
    models::lead::{CreateLeadPayload, Lead, LeadDetail, LeadDetailRow, LeadFilter, LeadStatus, UpdateLeadPayload},
};

const LEAD_COLUMNS: &str = "id, created_by, company_name, contact_name, email, phone, siret, status, notes, declared_at, created_at, updated_at";

// Lead + dono + oferta da relação do dono com atividade mais recente
const LEAD_DETAIL_SELECT: &str = r#"
    SELECT l.id, l.created_by, l.company_name, l.contact_name, l.email, l.phone, l.siret,
           l.status, l.notes, l.declared_at, l.created_at, l.updated_at,
           u.username AS created_by_username,
           r.offer_id AS current_offer_id,
           o.name AS offer_name,
           o.commission_rate AS offer_commission_rate,
           o.commission_plan AS offer_commission_plan
    FROM leads l
    JOIN users u ON u.id = l.created_by
    LEFT JOIN LATERAL (
        SELECT offer_id FROM relations
        WHERE lead_id = l.id AND salesperson_id = l.created_by
        ORDER BY last_action_at DESC NULLS LAST, created_at DESC
        LIMIT 1
    ) r ON TRUE
    LEFT JOIN offers o ON o.id = r.offer_id
"#;

// E-mail de lead é único no sistema inteiro
const LEAD_UNIQUE_RULES: &[(&str, &str, &str)] = &[("leads_email_key", "email", "duplicate_lead_email")];

#[derive(Clone)]
pub struct LeadRepository {
    pool: PgPool,
}

impl LeadRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, owner_id: Uuid, filter: &LeadFilter) -> Result<Vec<LeadDetail>, AppError> {
        let sql = format!(
            "{LEAD_DETAIL_SELECT}
             WHERE l.created_by = $1
               AND ($2::lead_status IS NULL OR l.status = $2)
               AND ($3::text IS NULL
                    OR l.company_name ILIKE '%' || $3 || '%'
                    OR l.contact_name ILIKE '%' || $3 || '%'
                    OR l.email ILIKE '%' || $3 || '%'
                    OR l.siret ILIKE '%' || $3 || '%')
             ORDER BY l.declared_at DESC NULLS LAST, l.created_at DESC"
        );
        let rows = sqlx::query_as::<_, LeadDetailRow>(&sql)
            .bind(owner_id)
            .bind(filter.status)
            .bind(filter.search.as_deref())
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(LeadDetail::from).collect())
    }

    pub async fn find_detail<'e, E>(&self, executor: E, owner_id: Uuid, id: Uuid) -> Result<Option<LeadDetail>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("{LEAD_DETAIL_SELECT} WHERE l.id = $1 AND l.created_by = $2");
        let row = sqlx::query_as::<_, LeadDetailRow>(&sql)
            .bind(id)
            .bind(owner_id)
            .fetch_optional(executor)
            .await?;
        Ok(row.map(LeadDetail::from))
    }

    // Lead do dono, com a linha travada até o fim da transação
    pub async fn lock_owned<'e, E>(&self, executor: E, owner_id: Uuid, id: Uuid) -> Result<Option<Lead>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("SELECT {LEAD_COLUMNS} FROM leads WHERE id = $1 AND created_by = $2 FOR UPDATE");
        let lead = sqlx::query_as::<_, Lead>(&sql)
            .bind(id)
            .bind(owner_id)
            .fetch_optional(executor)
            .await?;
        Ok(lead)
    }

    // Lead da relação, travado durante a criação de negócios
    pub async fn lock_by_id<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Lead>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("SELECT {LEAD_COLUMNS} FROM leads WHERE id = $1 FOR UPDATE");
        let lead = sqlx::query_as::<_, Lead>(&sql)
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(lead)
    }

    pub async fn is_owned_by<'e, E>(&self, executor: E, owner_id: Uuid, id: Uuid) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM leads WHERE id = $1 AND created_by = $2)",
        )
        .bind(id)
        .bind(owner_id)
        .fetch_one(executor)
        .await?;
        Ok(exists)
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        created_by: Uuid,
        payload: &CreateLeadPayload,
        declared_at: DateTime<Utc>,
    ) -> Result<Lead, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "INSERT INTO leads (created_by, company_name, contact_name, email, phone, siret, status, notes, declared_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING {LEAD_COLUMNS}"
        );
        sqlx::query_as::<_, Lead>(&sql)
            .bind(created_by)
            .bind(payload.company_name.trim())
            .bind(payload.contact_name.trim())
            .bind(payload.email.trim())
            .bind(payload.phone.as_deref())
            .bind(payload.siret.as_deref())
            .bind(payload.status.unwrap_or_default())
            .bind(payload.notes.as_deref())
            .bind(declared_at)
            .fetch_one(executor)
            .await
            .map_err(|e| map_unique_violation(e, LEAD_UNIQUE_RULES))
    }

    pub async fn update<'e, E>(&self, executor: E, id: Uuid, payload: &UpdateLeadPayload) -> Result<Lead, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "UPDATE leads
             SET company_name = COALESCE($2, company_name),
                 contact_name = COALESCE($3, contact_name),
                 email = COALESCE($4, email),
                 phone = CASE WHEN $10 THEN $5 ELSE phone END,
                 siret = CASE WHEN $11 THEN $6 ELSE siret END,
                 status = COALESCE($7, status),
                 notes = COALESCE($8, notes),
                 declared_at = COALESCE($9, declared_at),
                 updated_at = NOW()
             WHERE id = $1
             RETURNING {LEAD_COLUMNS}"
        );
        sqlx::query_as::<_, Lead>(&sql)
            .bind(id)
            .bind(payload.company_name.as_deref().map(str::trim))
            .bind(payload.contact_name.as_deref().map(str::trim))
            .bind(payload.email.as_deref().map(str::trim))
            .bind(payload.phone.clone().flatten())
            .bind(payload.siret.clone().flatten())
            .bind(payload.status)
            .bind(payload.notes.as_deref())
            .bind(payload.declared_at)
            // Campo enviado (mesmo vazio) substitui o valor, inclusive por NULL
            .bind(payload.phone.is_some())
            .bind(payload.siret.is_some())
            .fetch_one(executor)
            .await
            .map_err(|e| map_unique_violation(e, LEAD_UNIQUE_RULES))
    }

    pub async fn set_status<'e, E>(&self, executor: E, id: Uuid, status: LeadStatus) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("UPDATE leads SET status = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(status)
            .execute(executor)
            .await?;
        Ok(())
    }

    pub async fn delete<'e, E>(&self, executor: E, id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("DELETE FROM leads WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(())
    }
}
