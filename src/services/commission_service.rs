// src/services/commission_service.rs

use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::{field_error, AppError},
    db::{CommissionRepository, DealRepository},
    models::commission::{Commission, CommissionFilter, CreateCommissionPayload, UpdateCommissionPayload},
};

/// Valor da comissão: montante × taxa / 100, ao centavo. Sem montante, zero.
pub fn commission_amount(deal_amount: Option<Decimal>, rate: Decimal) -> Decimal {
    let amount = deal_amount.unwrap_or(Decimal::ZERO);
    (amount * rate / Decimal::ONE_HUNDRED).round_dp(2)
}

#[derive(Clone)]
pub struct CommissionService {
    commission_repo: CommissionRepository,
    deal_repo: DealRepository,
    pool: PgPool,
}

impl CommissionService {
    pub fn new(commission_repo: CommissionRepository, deal_repo: DealRepository, pool: PgPool) -> Self {
        Self { commission_repo, deal_repo, pool }
    }

    pub async fn list_commissions(&self, user_id: Uuid, filter: &CommissionFilter) -> Result<Vec<Commission>, AppError> {
        self.commission_repo.list(user_id, filter).await
    }

    pub async fn get_commission(&self, user_id: Uuid, id: Uuid) -> Result<Commission, AppError> {
        self.commission_repo
            .find_owned(user_id, id)
            .await?
            .ok_or(AppError::NotFound("commission_not_found"))
    }

    pub async fn create_commission(&self, user_id: Uuid, payload: &CreateCommissionPayload) -> Result<Commission, AppError> {
        let deal_id = payload.deal_id.ok_or_else(|| field_error("deal_id", "required"))?;

        let mut tx = self.pool.begin().await?;

        let deal = self.deal_repo
            .lock_owned(&mut *tx, user_id, deal_id)
            .await?
            .ok_or_else(|| field_error("deal_id", "deal_not_owned"))?;

        let rate = payload
            .commission_rate
            .or(deal.commission_rate)
            .unwrap_or(Decimal::ZERO);
        let amount = payload
            .commission_amount
            .unwrap_or_else(|| commission_amount(deal.amount, rate));

        let commission = self.commission_repo
            .create(
                &mut *tx,
                deal.id,
                user_id,
                amount,
                rate,
                payload.status.unwrap_or_default(),
                payload.payment_date,
            )
            .await?;

        tx.commit().await?;

        tracing::info!("💰 Comissão {} de {} registrada no negócio {}", commission.id, amount, deal.id);
        Ok(commission)
    }

    pub async fn update_commission(
        &self,
        user_id: Uuid,
        id: Uuid,
        payload: &UpdateCommissionPayload,
    ) -> Result<Commission, AppError> {
        self.commission_repo
            .update(user_id, id, payload)
            .await?
            .ok_or(AppError::NotFound("commission_not_found"))
    }

    pub async fn delete_commission(&self, user_id: Uuid, id: Uuid) -> Result<(), AppError> {
        if !self.commission_repo.delete_owned(user_id, id).await? {
            return Err(AppError::NotFound("commission_not_found"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amount_is_rate_percent_of_deal() {
        assert_eq!(commission_amount(Some(Decimal::new(1000, 0)), Decimal::new(15, 0)), Decimal::new(150, 0));
        assert_eq!(commission_amount(Some(Decimal::new(999, 0)), Decimal::new(125, 1)), Decimal::new(12488, 2));
    }

    #[test]
    fn missing_amount_yields_zero() {
        assert_eq!(commission_amount(None, Decimal::new(20, 0)), Decimal::ZERO);
    }
}
