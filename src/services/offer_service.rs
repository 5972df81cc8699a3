// src/services/offer_service.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::{field_error, AppError},
    db::OfferRepository,
    models::offer::{CreateOfferPayload, Offer, OfferFilter, UpdateOfferPayload},
};

// Catálogo compartilhado: qualquer usuário autenticado lê e edita
#[derive(Clone)]
pub struct OfferService {
    offer_repo: OfferRepository,
    pool: PgPool,
}

impl OfferService {
    pub fn new(offer_repo: OfferRepository, pool: PgPool) -> Self {
        Self { offer_repo, pool }
    }

    pub async fn list_offers(&self, filter: &OfferFilter) -> Result<Vec<Offer>, AppError> {
        self.offer_repo.list(filter).await
    }

    pub async fn get_offer(&self, id: Uuid) -> Result<Offer, AppError> {
        self.offer_repo
            .find_by_id(&self.pool, id)
            .await?
            .ok_or(AppError::NotFound("offer_not_found"))
    }

    pub async fn create_offer(&self, payload: &CreateOfferPayload) -> Result<Offer, AppError> {
        // Campos obrigatórios já garantidos pelo `validate()`
        let (Some(plan), Some(rate)) = (payload.commission_plan, payload.commission_rate) else {
            return Err(field_error("commission_plan", "required"));
        };

        let offer = self.offer_repo
            .create(
                &self.pool,
                payload.name.trim(),
                plan,
                rate,
                payload.active.unwrap_or(true),
                payload.additional_condition.as_deref(),
            )
            .await?;

        tracing::info!("🏷️ Oferta criada: {} ({})", offer.name, offer.id);
        Ok(offer)
    }

    pub async fn update_offer(&self, id: Uuid, payload: &UpdateOfferPayload) -> Result<Offer, AppError> {
        self.offer_repo
            .update(id, payload)
            .await?
            .ok_or(AppError::NotFound("offer_not_found"))
    }

    pub async fn delete_offer(&self, id: Uuid) -> Result<(), AppError> {
        if !self.offer_repo.delete(id).await? {
            return Err(AppError::NotFound("offer_not_found"));
        }
        Ok(())
    }
}
