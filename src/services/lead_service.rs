// src/services/lead_service.rs

use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::{
    common::error::{field_error, AppError},
    db::{LeadRepository, OfferRepository, RelationRepository},
    models::{
        lead::{CreateLeadPayload, LeadDetail, LeadFilter, UpdateLeadPayload},
        offer::{CommissionPlan, Offer},
        relation::{Relation, RelationStatus},
    },
};

// Oferta criada quando o catálogo ainda está vazio
pub const DEFAULT_OFFER_NAME: &str = "Offre standard";

/// O que fazer com a relação do lead quando a oferta muda.
#[derive(Debug, PartialEq, Eq)]
pub enum OfferChange {
    Keep(Uuid),
    Repoint(Uuid),
    Create,
}

// `existing` é a relação (lead, comercial, nova oferta), mesmo que antiga
pub fn plan_offer_change(current: Option<&Relation>, existing: Option<&Relation>, new_offer_id: Uuid) -> OfferChange {
    if let Some(relation) = existing {
        return OfferChange::Keep(relation.id);
    }
    match current {
        Some(relation) if relation.offer_id == new_offer_id => OfferChange::Keep(relation.id),
        Some(relation) => OfferChange::Repoint(relation.id),
        None => OfferChange::Create,
    }
}

#[derive(Clone)]
pub struct LeadService {
    lead_repo: LeadRepository,
    offer_repo: OfferRepository,
    relation_repo: RelationRepository,
    pool: PgPool,
}

impl LeadService {
    pub fn new(
        lead_repo: LeadRepository,
        offer_repo: OfferRepository,
        relation_repo: RelationRepository,
        pool: PgPool,
    ) -> Self {
        Self { lead_repo, offer_repo, relation_repo, pool }
    }

    pub async fn list_leads(&self, user_id: Uuid, filter: &LeadFilter) -> Result<Vec<LeadDetail>, AppError> {
        self.lead_repo.list(user_id, filter).await
    }

    pub async fn get_lead(&self, user_id: Uuid, id: Uuid) -> Result<LeadDetail, AppError> {
        self.lead_repo
            .find_detail(&self.pool, user_id, id)
            .await?
            .ok_or(AppError::NotFound("lead_not_found"))
    }

    pub async fn available_offers(&self) -> Result<Vec<Offer>, AppError> {
        self.offer_repo.list_active().await
    }

    /// LÓGICA DE NEGÓCIO: cria o lead e, atomicamente, a relação
    /// (lead, comercial, oferta) que o vincula ao seu dono.
    pub async fn create_lead_with_relation(
        &self,
        user_id: Uuid,
        payload: &CreateLeadPayload,
    ) -> Result<(LeadDetail, Relation), AppError> {
        let mut tx = self.pool.begin().await?;

        // A oferta é validada antes de qualquer escrita
        let offer = self.resolve_offer(&mut tx, payload.offer_id).await?;

        let declared_at = payload.declared_at.unwrap_or_else(Utc::now);
        let lead = self.lead_repo
            .create(&mut *tx, user_id, payload, declared_at)
            .await?;

        let relation = self.relation_repo
            .create(&mut *tx, Some(lead.id), user_id, offer.id, RelationStatus::Active)
            .await?;

        let detail = self.lead_repo
            .find_detail(&mut *tx, user_id, lead.id)
            .await?
            .ok_or(AppError::NotFound("lead_not_found"))?;

        tx.commit().await?;

        tracing::info!("📇 Lead {} criado com a relação {} (oferta {})", lead.id, relation.id, offer.id);
        Ok((detail, relation))
    }

    // Oferta escolhida -> qualquer oferta ativa -> oferta padrão criada na hora
    async fn resolve_offer(
        &self,
        tx: &mut Transaction<'static, Postgres>,
        offer_id: Option<Uuid>,
    ) -> Result<Offer, AppError> {
        if let Some(id) = offer_id {
            return self.offer_repo
                .find_active(&mut **tx, id)
                .await?
                .ok_or_else(|| field_error("offer_id", "offer_inactive"));
        }

        if let Some(offer) = self.offer_repo.first_active(&mut **tx).await? {
            return Ok(offer);
        }

        tracing::warn!("Catálogo sem ofertas ativas; criando a oferta padrão");
        self.offer_repo
            .create(&mut **tx, DEFAULT_OFFER_NAME, CommissionPlan::OneShot, Decimal::ZERO, true, None)
            .await
    }

    pub async fn update_lead(
        &self,
        user_id: Uuid,
        id: Uuid,
        payload: &UpdateLeadPayload,
    ) -> Result<LeadDetail, AppError> {
        let mut tx = self.pool.begin().await?;

        self.lead_repo
            .lock_owned(&mut *tx, user_id, id)
            .await?
            .ok_or(AppError::NotFound("lead_not_found"))?;

        let new_offer = match payload.offer_id {
            Some(offer_id) => Some(
                self.offer_repo
                    .find_active(&mut *tx, offer_id)
                    .await?
                    .ok_or_else(|| field_error("offer_id", "offer_inactive"))?,
            ),
            None => None,
        };

        self.lead_repo.update(&mut *tx, id, payload).await?;

        // A oferta do lead vive na relação do dono
        if let Some(offer) = new_offer {
            let existing = self.relation_repo
                .find_for_lead_offer(&mut *tx, user_id, id, offer.id)
                .await?;
            let current = self.relation_repo.find_for_lead(&mut *tx, user_id, id).await?;
            match plan_offer_change(current.as_ref(), existing.as_ref(), offer.id) {
                // Volta a ser a relação corrente do lead
                OfferChange::Keep(relation_id) => {
                    self.relation_repo.touch(&mut *tx, relation_id).await?;
                }
                OfferChange::Repoint(relation_id) => {
                    self.relation_repo
                        .update(&mut *tx, relation_id, None, Some(offer.id), None)
                        .await?;
                    self.relation_repo.touch(&mut *tx, relation_id).await?;
                }
                OfferChange::Create => {
                    self.relation_repo
                        .create(&mut *tx, Some(id), user_id, offer.id, RelationStatus::Active)
                        .await?;
                }
            }
        }

        let detail = self.lead_repo
            .find_detail(&mut *tx, user_id, id)
            .await?
            .ok_or(AppError::NotFound("lead_not_found"))?;

        tx.commit().await?;
        Ok(detail)
    }

    /// Apaga o lead. Relações que ficariam duplicadas como "sem lead" são
    /// fundidas na relação sem lead existente antes do DELETE.
    pub async fn delete_lead(&self, user_id: Uuid, id: Uuid) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        self.lead_repo
            .lock_owned(&mut *tx, user_id, id)
            .await?
            .ok_or(AppError::NotFound("lead_not_found"))?;

        let moved = self.relation_repo.reassign_deals_to_unassigned(&mut *tx, id).await?;
        let merged = self.relation_repo.delete_colliding_with_unassigned(&mut *tx, id).await?;
        self.lead_repo.delete(&mut *tx, id).await?;

        tx.commit().await?;

        if merged > 0 {
            tracing::info!("🗑️ Lead {} apagado; {} relações fundidas ({} negócios movidos)", id, merged, moved);
        } else {
            tracing::info!("🗑️ Lead {} apagado", id);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn relation(offer_id: Uuid) -> Relation {
        let now = Utc::now();
        Relation {
            id: Uuid::new_v4(),
            lead_id: Some(Uuid::new_v4()),
            salesperson_id: Uuid::new_v4(),
            offer_id,
            status: RelationStatus::Active,
            last_action_at: Some(now),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn same_offer_keeps_relation() {
        let offer = Uuid::new_v4();
        let current = relation(offer);
        assert_eq!(
            plan_offer_change(Some(&current), Some(&current), offer),
            OfferChange::Keep(current.id)
        );
    }

    #[test]
    fn other_offer_repoints_existing_relation() {
        let current = relation(Uuid::new_v4());
        assert_eq!(
            plan_offer_change(Some(&current), None, Uuid::new_v4()),
            OfferChange::Repoint(current.id)
        );
    }

    #[test]
    fn older_relation_with_new_offer_is_reused() {
        let offer = Uuid::new_v4();
        let current = relation(Uuid::new_v4());
        let older = relation(offer);
        assert_eq!(
            plan_offer_change(Some(&current), Some(&older), offer),
            OfferChange::Keep(older.id)
        );
    }

    #[test]
    fn lead_without_relation_gets_one() {
        assert_eq!(plan_offer_change(None, None, Uuid::new_v4()), OfferChange::Create);
    }

    // Banco real (DATABASE_URL)

    use serde_json::json;

    use crate::test_support::{count, db_state, field_code, http_status, lead, offer, payload, signup};

    #[tokio::test]
    async fn lead_email_is_unique_across_salespeople() {
        let Some(state) = db_state().await else { return };
        let (alice, bob) = (signup(&state).await, signup(&state).await);
        let catalog = offer(&state, "one_shot").await;
        let (existing, _) = lead(&state, &alice, &catalog).await;

        let err = state
            .lead_service
            .create_lead_with_relation(
                bob.id,
                &payload(json!({
                    "company_name": "Autre",
                    "contact_name": "Paul",
                    "email": existing.lead.email,
                    "offer_id": catalog.id,
                })),
            )
            .await
            .unwrap_err();
        assert_eq!(field_code(&err, "email").as_deref(), Some("duplicate_lead_email"));
        assert_eq!(http_status(&err, &state), 400);

        // Nada do lead recusado ficou para trás
        assert_eq!(count(&state, "SELECT COUNT(*) FROM leads WHERE created_by = $1", bob.id).await, 0);
        assert_eq!(count(&state, "SELECT COUNT(*) FROM relations WHERE salesperson_id = $1", bob.id).await, 0);
    }

    #[tokio::test]
    async fn leads_of_others_are_not_found() {
        let Some(state) = db_state().await else { return };
        let (alice, bob) = (signup(&state).await, signup(&state).await);
        let catalog = offer(&state, "one_shot").await;
        let (detail, _) = lead(&state, &alice, &catalog).await;
        let id = detail.lead.id;

        let err = state.lead_service.get_lead(bob.id, id).await.unwrap_err();
        assert_eq!(http_status(&err, &state), 404);
        let patch: UpdateLeadPayload = payload(json!({ "company_name": "Volé" }));
        assert!(matches!(state.lead_service.update_lead(bob.id, id, &patch).await, Err(AppError::NotFound(_))));
        assert!(matches!(state.lead_service.delete_lead(bob.id, id).await, Err(AppError::NotFound(_))));

        let kept = state.lead_service.get_lead(alice.id, id).await.unwrap();
        assert_eq!(kept.lead.company_name, "ACME");
    }

    #[tokio::test]
    async fn clearing_siret_stores_null() {
        let Some(state) = db_state().await else { return };
        let alice = signup(&state).await;
        let catalog = offer(&state, "one_shot").await;
        let (detail, _) = lead(&state, &alice, &catalog).await;
        assert_eq!(detail.lead.siret.as_deref(), Some("123456789"));

        let patch: UpdateLeadPayload = payload(json!({ "siret": "" }));
        let updated = state.lead_service.update_lead(alice.id, detail.lead.id, &patch).await.unwrap();
        assert_eq!(updated.lead.siret, None);

        // Campo ausente não mexe no valor
        let patch: UpdateLeadPayload = payload(json!({ "phone": "0612345678" }));
        let updated = state.lead_service.update_lead(alice.id, detail.lead.id, &patch).await.unwrap();
        assert_eq!(updated.lead.siret, None);
        assert_eq!(updated.lead.phone.as_deref(), Some("0612345678"));
    }

    #[tokio::test]
    async fn switching_back_to_an_older_offer_reuses_its_relation() {
        let Some(state) = db_state().await else { return };
        let alice = signup(&state).await;
        let (first, second) = (offer(&state, "one_shot").await, offer(&state, "durable").await);
        let (detail, original) = lead(&state, &alice, &first).await;
        let id = detail.lead.id;

        state
            .relation_service
            .create_relation(alice.id, &payload(json!({ "lead_id": id, "offer_id": second.id })))
            .await
            .unwrap();

        let patch: UpdateLeadPayload = payload(json!({ "offer_id": first.id }));
        let updated = state.lead_service.update_lead(alice.id, id, &patch).await.unwrap();
        assert_eq!(updated.current_offer_id, Some(first.id));

        let relations = count(&state, "SELECT COUNT(*) FROM relations WHERE lead_id = $1", id).await;
        assert_eq!(relations, 2);
        let kept = state.relation_service.get_relation(alice.id, original.id).await.unwrap();
        assert_eq!(kept.offer_id, first.id);
    }

    #[tokio::test]
    async fn deleting_a_lead_merges_its_relation_into_the_unassigned_one() {
        let Some(state) = db_state().await else { return };
        let alice = signup(&state).await;
        let catalog = offer(&state, "one_shot").await;
        let (detail, with_lead) = lead(&state, &alice, &catalog).await;

        let unassigned = state
            .relation_service
            .create_relation(alice.id, &payload(json!({ "offer_id": catalog.id })))
            .await
            .unwrap();
        let deal = state
            .deal_service
            .create_deal(alice.id, &payload(json!({ "relation_id": with_lead.id, "name": "Contrat" })))
            .await
            .unwrap();

        state.lead_service.delete_lead(alice.id, detail.lead.id).await.unwrap();

        let moved = state.deal_service.get_deal(alice.id, deal.deal.id).await.unwrap();
        assert_eq!(moved.deal.relation_id, unassigned.id);
        assert!(matches!(
            state.relation_service.get_relation(alice.id, with_lead.id).await,
            Err(AppError::NotFound(_))
        ));
        let orphans = count(
            &state,
            "SELECT COUNT(*) FROM relations WHERE salesperson_id = $1 AND lead_id IS NULL",
            alice.id,
        )
        .await;
        assert_eq!(orphans, 1);
    }
}
