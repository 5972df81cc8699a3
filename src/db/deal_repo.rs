// src/db/deal_repo.rs

use chrono::{DateTime, Utc};
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::deal::{
        AvailableLead, Deal, DealDetail, DealFilter, InvoiceCandidate, NewDeal, UpdateDealPayload,
    },
};

const DEAL_COLUMNS: &str = "id, relation_id, invoice_id, name, deal_type, stage, amount, notes, commission_rate, won_at, client_paid_at, commission_paid_at, created_at, updated_at";

// Negócio + lead da relação; o dono é sempre o comercial da relação
const DEAL_DETAIL_SELECT: &str = r#"
    SELECT d.id, d.relation_id, d.invoice_id, d.name, d.deal_type, d.stage, d.amount, d.notes,
           d.commission_rate, d.won_at, d.client_paid_at, d.commission_paid_at,
           d.created_at, d.updated_at,
           l.id AS lead_id,
           l.company_name,
           l.contact_name,
           l.email AS lead_email
    FROM deals d
    JOIN relations r ON r.id = d.relation_id
    LEFT JOIN leads l ON l.id = r.lead_id
"#;

#[derive(Clone)]
pub struct DealRepository {
    pool: PgPool,
}

impl DealRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, salesperson_id: Uuid, filter: &DealFilter) -> Result<Vec<DealDetail>, AppError> {
        let sql = format!(
            "{DEAL_DETAIL_SELECT}
             WHERE r.salesperson_id = $1
               AND ($2::deal_stage IS NULL OR d.stage = $2)
               AND ($3::deal_type IS NULL OR d.deal_type = $3)
               AND ($4::uuid IS NULL OR d.relation_id = $4)
               AND ($5::text IS NULL
                    OR d.name ILIKE '%' || $5 || '%'
                    OR d.notes ILIKE '%' || $5 || '%'
                    OR l.company_name ILIKE '%' || $5 || '%')
             ORDER BY d.created_at DESC"
        );
        let deals = sqlx::query_as::<_, DealDetail>(&sql)
            .bind(salesperson_id)
            .bind(filter.stage)
            .bind(filter.deal_type)
            .bind(filter.relation_id)
            .bind(filter.search.as_deref())
            .fetch_all(&self.pool)
            .await?;
        Ok(deals)
    }

    pub async fn find_detail<'e, E>(&self, executor: E, salesperson_id: Uuid, id: Uuid) -> Result<Option<DealDetail>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("{DEAL_DETAIL_SELECT} WHERE d.id = $1 AND r.salesperson_id = $2");
        let deal = sqlx::query_as::<_, DealDetail>(&sql)
            .bind(id)
            .bind(salesperson_id)
            .fetch_optional(executor)
            .await?;
        Ok(deal)
    }

    pub async fn lock_owned<'e, E>(&self, executor: E, salesperson_id: Uuid, id: Uuid) -> Result<Option<Deal>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "SELECT {DEAL_COLUMNS} FROM deals
             WHERE id = $1
               AND relation_id IN (SELECT id FROM relations WHERE salesperson_id = $2)
             FOR UPDATE"
        );
        let deal = sqlx::query_as::<_, Deal>(&sql)
            .bind(id)
            .bind(salesperson_id)
            .fetch_optional(executor)
            .await?;
        Ok(deal)
    }

    // Negócios ganhos ainda sem fatura
    pub async fn list_commissionable(&self, salesperson_id: Uuid) -> Result<Vec<DealDetail>, AppError> {
        let sql = format!(
            "{DEAL_DETAIL_SELECT}
             WHERE r.salesperson_id = $1 AND d.stage = 'gagne' AND d.invoice_id IS NULL
             ORDER BY d.won_at DESC NULLS LAST, d.created_at DESC"
        );
        let deals = sqlx::query_as::<_, DealDetail>(&sql)
            .bind(salesperson_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(deals)
    }

    pub async fn list_available_leads(&self, salesperson_id: Uuid) -> Result<Vec<AvailableLead>, AppError> {
        let leads = sqlx::query_as::<_, AvailableLead>(
            r#"
            SELECT DISTINCT ON (l.id)
                   l.id, l.company_name, l.contact_name, l.email, r.id AS relation_id
            FROM leads l
            JOIN relations r ON r.lead_id = l.id
            WHERE l.created_by = $1
              AND r.salesperson_id = $1
              AND r.status = 'active'
            ORDER BY l.id, r.created_at DESC
            "#,
        )
        .bind(salesperson_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(leads)
    }

    // Algum negócio durável do lead, em qualquer relação (exceto `exclude_id`)
    pub async fn lead_has_durable_deal<'e, E>(&self, executor: E, lead_id: Uuid, exclude_id: Option<Uuid>) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM deals d
                JOIN relations r ON r.id = d.relation_id
                WHERE r.lead_id = $1
                  AND d.deal_type = 'durable'
                  AND ($2::uuid IS NULL OR d.id <> $2)
            )
            "#,
        )
        .bind(lead_id)
        .bind(exclude_id)
        .fetch_one(executor)
        .await?;
        Ok(exists)
    }

    pub async fn create<'e, E>(&self, executor: E, deal: &NewDeal<'_>) -> Result<Deal, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "INSERT INTO deals (relation_id, name, deal_type, stage, amount, notes, commission_rate,
                                won_at, client_paid_at, commission_paid_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
             RETURNING {DEAL_COLUMNS}"
        );
        let created = sqlx::query_as::<_, Deal>(&sql)
            .bind(deal.relation_id)
            .bind(deal.name.trim())
            .bind(deal.deal_type)
            .bind(deal.stage)
            .bind(deal.amount)
            .bind(deal.notes)
            .bind(deal.commission_rate)
            .bind(deal.won_at)
            .bind(deal.client_paid_at)
            .bind(deal.commission_paid_at)
            .fetch_one(executor)
            .await?;
        Ok(created)
    }

    // `won_at` já vem resolvido pelo serviço (carimbo de ganho)
    pub async fn update<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        payload: &UpdateDealPayload,
        won_at: Option<DateTime<Utc>>,
    ) -> Result<Deal, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "UPDATE deals
             SET relation_id = COALESCE($2, relation_id),
                 name = COALESCE($3, name),
                 deal_type = COALESCE($4, deal_type),
                 stage = COALESCE($5, stage),
                 amount = COALESCE($6, amount),
                 notes = COALESCE($7, notes),
                 commission_rate = COALESCE($8, commission_rate),
                 won_at = COALESCE($9, won_at),
                 client_paid_at = COALESCE($10, client_paid_at),
                 commission_paid_at = COALESCE($11, commission_paid_at),
                 updated_at = NOW()
             WHERE id = $1
             RETURNING {DEAL_COLUMNS}"
        );
        let deal = sqlx::query_as::<_, Deal>(&sql)
            .bind(id)
            .bind(payload.relation_id)
            .bind(payload.name.as_deref().map(str::trim))
            .bind(payload.deal_type)
            .bind(payload.stage)
            .bind(payload.amount)
            .bind(payload.notes.as_deref())
            .bind(payload.commission_rate)
            .bind(won_at)
            .bind(payload.client_paid_at)
            .bind(payload.commission_paid_at)
            .fetch_one(executor)
            .await?;
        Ok(deal)
    }

    pub async fn delete_owned(&self, salesperson_id: Uuid, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            DELETE FROM deals d
            USING relations r
            WHERE d.id = $1 AND r.id = d.relation_id AND r.salesperson_id = $2
            "#,
        )
        .bind(id)
        .bind(salesperson_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    // =========================================================================
    //  FATURAMENTO
    // =========================================================================

    /// Trava as linhas dos negócios selecionados até o fim da transação.
    pub async fn lock_for_invoicing<'e, E>(
        &self,
        executor: E,
        salesperson_id: Uuid,
        ids: &[Uuid],
    ) -> Result<Vec<InvoiceCandidate>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let candidates = sqlx::query_as::<_, InvoiceCandidate>(
            r#"
            SELECT d.id, d.relation_id, d.invoice_id, d.name, d.deal_type, d.stage, d.amount, d.notes,
                   d.commission_rate, d.won_at, d.client_paid_at, d.commission_paid_at,
                   d.created_at, d.updated_at,
                   (r.salesperson_id = $2) AS owned
            FROM deals d
            JOIN relations r ON r.id = d.relation_id
            WHERE d.id = ANY($1)
            ORDER BY d.id
            FOR UPDATE OF d
            "#,
        )
        .bind(ids)
        .bind(salesperson_id)
        .fetch_all(executor)
        .await?;
        Ok(candidates)
    }

    // Só anexa negócios ainda sem fatura; o chamador confere a contagem
    pub async fn attach_invoice<'e, E>(&self, executor: E, invoice_id: Uuid, ids: &[Uuid]) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            "UPDATE deals SET invoice_id = $1, updated_at = NOW() WHERE id = ANY($2) AND invoice_id IS NULL",
        )
        .bind(invoice_id)
        .bind(ids)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn list_by_invoices<'e, E>(&self, executor: E, invoice_ids: &[Uuid]) -> Result<Vec<Deal>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "SELECT {DEAL_COLUMNS} FROM deals WHERE invoice_id = ANY($1) ORDER BY created_at"
        );
        let deals = sqlx::query_as::<_, Deal>(&sql)
            .bind(invoice_ids)
            .fetch_all(executor)
            .await?;
        Ok(deals)
    }
}
