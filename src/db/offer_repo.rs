// src/db/offer_repo.rs

use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::offer::{CommissionPlan, Offer, OfferFilter, UpdateOfferPayload},
};

const OFFER_COLUMNS: &str = "id, name, commission_plan, commission_rate, active, additional_condition, created_at, updated_at";

#[derive(Clone)]
pub struct OfferRepository {
    pool: PgPool,
}

impl OfferRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, filter: &OfferFilter) -> Result<Vec<Offer>, AppError> {
        let sql = format!(
            "SELECT {OFFER_COLUMNS} FROM offers
             WHERE ($1::bool IS NULL OR active = $1)
               AND ($2::commission_plan IS NULL OR commission_plan = $2)
               AND ($3::text IS NULL OR name ILIKE '%' || $3 || '%')
             ORDER BY name"
        );
        let offers = sqlx::query_as::<_, Offer>(&sql)
            .bind(filter.active)
            .bind(filter.commission_plan)
            .bind(filter.search.as_deref())
            .fetch_all(&self.pool)
            .await?;
        Ok(offers)
    }

    pub async fn list_active(&self) -> Result<Vec<Offer>, AppError> {
        let sql = format!("SELECT {OFFER_COLUMNS} FROM offers WHERE active ORDER BY name");
        let offers = sqlx::query_as::<_, Offer>(&sql).fetch_all(&self.pool).await?;
        Ok(offers)
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Offer>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("SELECT {OFFER_COLUMNS} FROM offers WHERE id = $1");
        let offer = sqlx::query_as::<_, Offer>(&sql)
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(offer)
    }

    // Só ofertas ativas podem ser escolhidas para leads e relações
    pub async fn find_active<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Offer>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("SELECT {OFFER_COLUMNS} FROM offers WHERE id = $1 AND active");
        let offer = sqlx::query_as::<_, Offer>(&sql)
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(offer)
    }

    // Fallback quando o lead é criado sem oferta: a mais antiga ativa
    pub async fn first_active<'e, E>(&self, executor: E) -> Result<Option<Offer>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("SELECT {OFFER_COLUMNS} FROM offers WHERE active ORDER BY created_at, id LIMIT 1");
        let offer = sqlx::query_as::<_, Offer>(&sql)
            .fetch_optional(executor)
            .await?;
        Ok(offer)
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        name: &str,
        commission_plan: CommissionPlan,
        commission_rate: Decimal,
        active: bool,
        additional_condition: Option<&str>,
    ) -> Result<Offer, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "INSERT INTO offers (name, commission_plan, commission_rate, active, additional_condition)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {OFFER_COLUMNS}"
        );
        let offer = sqlx::query_as::<_, Offer>(&sql)
            .bind(name)
            .bind(commission_plan)
            .bind(commission_rate)
            .bind(active)
            .bind(additional_condition)
            .fetch_one(executor)
            .await?;
        Ok(offer)
    }

    pub async fn update(&self, id: Uuid, payload: &UpdateOfferPayload) -> Result<Option<Offer>, AppError> {
        let sql = format!(
            "UPDATE offers
             SET name = COALESCE($2, name),
                 commission_plan = COALESCE($3, commission_plan),
                 commission_rate = COALESCE($4, commission_rate),
                 active = COALESCE($5, active),
                 additional_condition = COALESCE($6, additional_condition),
                 updated_at = NOW()
             WHERE id = $1
             RETURNING {OFFER_COLUMNS}"
        );
        let offer = sqlx::query_as::<_, Offer>(&sql)
            .bind(id)
            .bind(payload.name.as_deref())
            .bind(payload.commission_plan)
            .bind(payload.commission_rate)
            .bind(payload.active)
            .bind(payload.additional_condition.as_deref())
            .fetch_optional(&self.pool)
            .await?;
        Ok(offer)
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM offers WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
