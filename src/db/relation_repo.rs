// src/db/relation_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::{map_unique_violation, AppError},
    models::relation::{AvailableRelation, Relation, RelationFilter, RelationStatus},
};

const RELATION_COLUMNS: &str = "id, lead_id, salesperson_id, offer_id, status, last_action_at, created_at, updated_at";

// Índices únicos parciais da tabela relations
const RELATION_UNIQUE_RULES: &[(&str, &str, &str)] = &[
    ("unique_relation_per_lead", "lead_id", "duplicate_relation"),
    ("unique_relation_without_lead", "offer_id", "duplicate_relation"),
];

#[derive(Clone)]
pub struct RelationRepository {
    pool: PgPool,
}

impl RelationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, salesperson_id: Uuid, filter: &RelationFilter) -> Result<Vec<Relation>, AppError> {
        let sql = format!(
            "SELECT {RELATION_COLUMNS} FROM relations
             WHERE salesperson_id = $1
               AND ($2::relation_status IS NULL OR status = $2)
               AND ($3::uuid IS NULL OR lead_id = $3)
               AND ($4::uuid IS NULL OR offer_id = $4)
             ORDER BY created_at DESC"
        );
        let relations = sqlx::query_as::<_, Relation>(&sql)
            .bind(salesperson_id)
            .bind(filter.status)
            .bind(filter.lead_id)
            .bind(filter.offer_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(relations)
    }

    /// Relações ativas do comercial, com resumo do lead e da oferta.
    pub async fn list_available(&self, salesperson_id: Uuid) -> Result<Vec<AvailableRelation>, AppError> {
        let relations = sqlx::query_as::<_, AvailableRelation>(
            r#"
            SELECT r.id, r.status, r.last_action_at,
                   r.lead_id,
                   l.company_name AS lead_company_name,
                   l.contact_name AS lead_contact_name,
                   l.email AS lead_email,
                   r.offer_id,
                   o.name AS offer_name,
                   o.commission_plan AS offer_commission_plan,
                   o.commission_rate AS offer_commission_rate
            FROM relations r
            JOIN offers o ON o.id = r.offer_id
            LEFT JOIN leads l ON l.id = r.lead_id
            WHERE r.salesperson_id = $1 AND r.status = 'active'
            ORDER BY l.company_name NULLS LAST, o.name
            "#,
        )
        .bind(salesperson_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(relations)
    }

    pub async fn find_owned<'e, E>(&self, executor: E, salesperson_id: Uuid, id: Uuid) -> Result<Option<Relation>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("SELECT {RELATION_COLUMNS} FROM relations WHERE id = $1 AND salesperson_id = $2");
        let relation = sqlx::query_as::<_, Relation>(&sql)
            .bind(id)
            .bind(salesperson_id)
            .fetch_optional(executor)
            .await?;
        Ok(relation)
    }

    pub async fn lock_owned<'e, E>(&self, executor: E, salesperson_id: Uuid, id: Uuid) -> Result<Option<Relation>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "SELECT {RELATION_COLUMNS} FROM relations WHERE id = $1 AND salesperson_id = $2 FOR UPDATE"
        );
        let relation = sqlx::query_as::<_, Relation>(&sql)
            .bind(id)
            .bind(salesperson_id)
            .fetch_optional(executor)
            .await?;
        Ok(relation)
    }

    // Relação mais recente do comercial para o lead (última atividade)
    pub async fn find_for_lead<'e, E>(&self, executor: E, salesperson_id: Uuid, lead_id: Uuid) -> Result<Option<Relation>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "SELECT {RELATION_COLUMNS} FROM relations
             WHERE lead_id = $1 AND salesperson_id = $2
             ORDER BY last_action_at DESC NULLS LAST, created_at DESC
             LIMIT 1"
        );
        let relation = sqlx::query_as::<_, Relation>(&sql)
            .bind(lead_id)
            .bind(salesperson_id)
            .fetch_optional(executor)
            .await?;
        Ok(relation)
    }

    // Relação exata (lead, comercial, oferta), se já existir
    pub async fn find_for_lead_offer<'e, E>(
        &self,
        executor: E,
        salesperson_id: Uuid,
        lead_id: Uuid,
        offer_id: Uuid,
    ) -> Result<Option<Relation>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "SELECT {RELATION_COLUMNS} FROM relations
             WHERE lead_id = $1 AND salesperson_id = $2 AND offer_id = $3"
        );
        let relation = sqlx::query_as::<_, Relation>(&sql)
            .bind(lead_id)
            .bind(salesperson_id)
            .bind(offer_id)
            .fetch_optional(executor)
            .await?;
        Ok(relation)
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        lead_id: Option<Uuid>,
        salesperson_id: Uuid,
        offer_id: Uuid,
        status: RelationStatus,
    ) -> Result<Relation, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "INSERT INTO relations (lead_id, salesperson_id, offer_id, status, last_action_at)
             VALUES ($1, $2, $3, $4, NOW())
             RETURNING {RELATION_COLUMNS}"
        );
        sqlx::query_as::<_, Relation>(&sql)
            .bind(lead_id)
            .bind(salesperson_id)
            .bind(offer_id)
            .bind(status)
            .fetch_one(executor)
            .await
            .map_err(|e| map_unique_violation(e, RELATION_UNIQUE_RULES))
    }

    pub async fn update<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        lead_id: Option<Uuid>,
        offer_id: Option<Uuid>,
        status: Option<RelationStatus>,
    ) -> Result<Relation, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "UPDATE relations
             SET lead_id = COALESCE($2, lead_id),
                 offer_id = COALESCE($3, offer_id),
                 status = COALESCE($4, status),
                 updated_at = NOW()
             WHERE id = $1
             RETURNING {RELATION_COLUMNS}"
        );
        sqlx::query_as::<_, Relation>(&sql)
            .bind(id)
            .bind(lead_id)
            .bind(offer_id)
            .bind(status)
            .fetch_one(executor)
            .await
            .map_err(|e| map_unique_violation(e, RELATION_UNIQUE_RULES))
    }

    // Registra atividade na relação (criação de negócio, troca de oferta)
    pub async fn touch<'e, E>(&self, executor: E, id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("UPDATE relations SET last_action_at = NOW(), updated_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(())
    }

    pub async fn delete_owned(&self, salesperson_id: Uuid, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM relations WHERE id = $1 AND salesperson_id = $2")
            .bind(id)
            .bind(salesperson_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // =========================================================================
    //  EXCLUSÃO DE LEAD
    // =========================================================================

    /// Antes de apagar um lead: negócios de relações que colidiriam com uma relação
    /// "sem lead" já existente (mesma oferta e comercial) passam para ela.
    pub async fn reassign_deals_to_unassigned<'e, E>(&self, executor: E, lead_id: Uuid) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            r#"
            UPDATE deals d
            SET relation_id = u.id, updated_at = NOW()
            FROM relations r
            JOIN relations u
              ON u.lead_id IS NULL
             AND u.offer_id = r.offer_id
             AND u.salesperson_id = r.salesperson_id
            WHERE r.lead_id = $1 AND d.relation_id = r.id
            "#,
        )
        .bind(lead_id)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }

    // As relações esvaziadas acima são removidas
    pub async fn delete_colliding_with_unassigned<'e, E>(&self, executor: E, lead_id: Uuid) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            r#"
            DELETE FROM relations r
            USING relations u
            WHERE r.lead_id = $1
              AND u.lead_id IS NULL
              AND u.offer_id = r.offer_id
              AND u.salesperson_id = r.salesperson_id
            "#,
        )
        .bind(lead_id)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }
}
