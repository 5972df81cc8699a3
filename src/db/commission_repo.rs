// src/db/commission_repo.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::commission::{Commission, CommissionFilter, CommissionStatus, UpdateCommissionPayload},
};

const COMMISSION_COLUMNS: &str = "id, deal_id, salesperson_id, commission_amount, commission_rate, status, payment_date, created_at, updated_at";

#[derive(Clone)]
pub struct CommissionRepository {
    pool: PgPool,
}

impl CommissionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, salesperson_id: Uuid, filter: &CommissionFilter) -> Result<Vec<Commission>, AppError> {
        let sql = format!(
            "SELECT {COMMISSION_COLUMNS} FROM commissions
             WHERE salesperson_id = $1
               AND ($2::commission_status IS NULL OR status = $2)
               AND ($3::uuid IS NULL OR deal_id = $3)
             ORDER BY created_at DESC"
        );
        let commissions = sqlx::query_as::<_, Commission>(&sql)
            .bind(salesperson_id)
            .bind(filter.status)
            .bind(filter.deal_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(commissions)
    }

    pub async fn find_owned(&self, salesperson_id: Uuid, id: Uuid) -> Result<Option<Commission>, AppError> {
        let sql = format!("SELECT {COMMISSION_COLUMNS} FROM commissions WHERE id = $1 AND salesperson_id = $2");
        let commission = sqlx::query_as::<_, Commission>(&sql)
            .bind(id)
            .bind(salesperson_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(commission)
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn create<'e, E>(
        &self,
        executor: E,
        deal_id: Uuid,
        salesperson_id: Uuid,
        commission_amount: Decimal,
        commission_rate: Decimal,
        status: CommissionStatus,
        payment_date: Option<NaiveDate>,
    ) -> Result<Commission, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "INSERT INTO commissions (deal_id, salesperson_id, commission_amount, commission_rate, status, payment_date)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COMMISSION_COLUMNS}"
        );
        let commission = sqlx::query_as::<_, Commission>(&sql)
            .bind(deal_id)
            .bind(salesperson_id)
            .bind(commission_amount)
            .bind(commission_rate)
            .bind(status)
            .bind(payment_date)
            .fetch_one(executor)
            .await?;
        Ok(commission)
    }

    pub async fn update(&self, salesperson_id: Uuid, id: Uuid, payload: &UpdateCommissionPayload) -> Result<Option<Commission>, AppError> {
        let sql = format!(
            "UPDATE commissions
             SET commission_amount = COALESCE($3, commission_amount),
                 commission_rate = COALESCE($4, commission_rate),
                 status = COALESCE($5, status),
                 payment_date = COALESCE($6, payment_date),
                 updated_at = NOW()
             WHERE id = $1 AND salesperson_id = $2
             RETURNING {COMMISSION_COLUMNS}"
        );
        let commission = sqlx::query_as::<_, Commission>(&sql)
            .bind(id)
            .bind(salesperson_id)
            .bind(payload.commission_amount)
            .bind(payload.commission_rate)
            .bind(payload.status)
            .bind(payload.payment_date)
            .fetch_optional(&self.pool)
            .await?;
        Ok(commission)
    }

    pub async fn delete_owned(&self, salesperson_id: Uuid, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM commissions WHERE id = $1 AND salesperson_id = $2")
            .bind(id)
            .bind(salesperson_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
