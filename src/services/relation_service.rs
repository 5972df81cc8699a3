// src/services/relation_service.rs

use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::{
    common::error::{field_error, AppError},
    db::{LeadRepository, OfferRepository, RelationRepository},
    models::relation::{
        AvailableRelation, CreateRelationPayload, Relation, RelationFilter, UpdateRelationPayload,
    },
};

#[derive(Clone)]
pub struct RelationService {
    relation_repo: RelationRepository,
    lead_repo: LeadRepository,
    offer_repo: OfferRepository,
    pool: PgPool,
}

impl RelationService {
    pub fn new(
        relation_repo: RelationRepository,
        lead_repo: LeadRepository,
        offer_repo: OfferRepository,
        pool: PgPool,
    ) -> Self {
        Self { relation_repo, lead_repo, offer_repo, pool }
    }

    pub async fn list_relations(&self, user_id: Uuid, filter: &RelationFilter) -> Result<Vec<Relation>, AppError> {
        self.relation_repo.list(user_id, filter).await
    }

    pub async fn available_relations(&self, user_id: Uuid) -> Result<Vec<AvailableRelation>, AppError> {
        self.relation_repo.list_available(user_id).await
    }

    pub async fn get_relation(&self, user_id: Uuid, id: Uuid) -> Result<Relation, AppError> {
        self.relation_repo
            .find_owned(&self.pool, user_id, id)
            .await?
            .ok_or(AppError::NotFound("relation_not_found"))
    }

    pub async fn create_relation(&self, user_id: Uuid, payload: &CreateRelationPayload) -> Result<Relation, AppError> {
        let offer_id = payload.offer_id.ok_or_else(|| field_error("offer_id", "required"))?;

        let mut tx = self.pool.begin().await?;
        self.check_references(&mut tx, user_id, payload.lead_id, Some(offer_id)).await?;

        let relation = self.relation_repo
            .create(&mut *tx, payload.lead_id, user_id, offer_id, payload.status.unwrap_or_default())
            .await?;

        tx.commit().await?;
        Ok(relation)
    }

    pub async fn update_relation(
        &self,
        user_id: Uuid,
        id: Uuid,
        payload: &UpdateRelationPayload,
    ) -> Result<Relation, AppError> {
        let mut tx = self.pool.begin().await?;

        self.relation_repo
            .lock_owned(&mut *tx, user_id, id)
            .await?
            .ok_or(AppError::NotFound("relation_not_found"))?;

        self.check_references(&mut tx, user_id, payload.lead_id, payload.offer_id).await?;

        let relation = self.relation_repo
            .update(&mut *tx, id, payload.lead_id, payload.offer_id, payload.status)
            .await?;

        tx.commit().await?;
        Ok(relation)
    }

    pub async fn delete_relation(&self, user_id: Uuid, id: Uuid) -> Result<(), AppError> {
        if !self.relation_repo.delete_owned(user_id, id).await? {
            return Err(AppError::NotFound("relation_not_found"));
        }
        Ok(())
    }

    // Lead tem que ser do comercial; oferta tem que estar ativa
    async fn check_references(
        &self,
        tx: &mut Transaction<'static, Postgres>,
        user_id: Uuid,
        lead_id: Option<Uuid>,
        offer_id: Option<Uuid>,
    ) -> Result<(), AppError> {
        if let Some(lead_id) = lead_id {
            if !self.lead_repo.is_owned_by(&mut **tx, user_id, lead_id).await? {
                return Err(field_error("lead_id", "lead_not_owned"));
            }
        }
        if let Some(offer_id) = offer_id {
            if self.offer_repo.find_active(&mut **tx, offer_id).await?.is_none() {
                return Err(field_error("offer_id", "offer_inactive"));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::test_support::{count, db_state, field_code, http_status, lead, offer, payload, signup};

    #[tokio::test]
    async fn partial_unique_indexes_become_field_errors() {
        let Some(state) = db_state().await else { return };
        let alice = signup(&state).await;
        let catalog = offer(&state, "one_shot").await;
        let (detail, _) = lead(&state, &alice, &catalog).await;

        // (lead, oferta, comercial) já existe desde a criação do lead
        let err = state
            .relation_service
            .create_relation(alice.id, &payload(json!({ "lead_id": detail.lead.id, "offer_id": catalog.id })))
            .await
            .unwrap_err();
        assert_eq!(field_code(&err, "lead_id").as_deref(), Some("duplicate_relation"));
        assert_eq!(http_status(&err, &state), 400);

        let unassigned = payload(json!({ "offer_id": catalog.id }));
        state.relation_service.create_relation(alice.id, &unassigned).await.unwrap();
        let err = state.relation_service.create_relation(alice.id, &unassigned).await.unwrap_err();
        assert_eq!(field_code(&err, "offer_id").as_deref(), Some("duplicate_relation"));
        assert_eq!(http_status(&err, &state), 400);

        let total = count(&state, "SELECT COUNT(*) FROM relations WHERE salesperson_id = $1", alice.id).await;
        assert_eq!(total, 2);
    }
}
