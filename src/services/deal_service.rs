// src/services/deal_service.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::{field_error, AppError},
    db::{DealRepository, LeadRepository, OfferRepository, RelationRepository},
    models::{
        deal::{
            AvailableLead, CreateDealPayload, DealDetail, DealFilter, DealStage, DealType, NewDeal,
            UpdateDealPayload,
        },
        lead::LeadStatus,
        offer::CommissionPlan,
        relation::AvailableRelation,
    },
};

// =============================================================================
//  REGRAS DE DERIVAÇÃO
// =============================================================================

/// Tipo do negócio na criação. Um lead com negócio durável só recebe
/// negócios pontuais; sem lead, o padrão é pontual.
pub fn derive_deal_type(
    requested: Option<DealType>,
    offer_plan: Option<CommissionPlan>,
    has_lead: bool,
    lead_has_durable_deal: bool,
) -> DealType {
    if lead_has_durable_deal {
        return DealType::OneShot;
    }
    if !has_lead {
        return requested.unwrap_or(DealType::OneShot);
    }
    requested
        .or_else(|| offer_plan.map(DealType::from))
        .unwrap_or(DealType::OneShot)
}

// Taxa explícita -> taxa da oferta da relação -> 0
pub fn resolve_commission_rate(requested: Option<Decimal>, offer_rate: Option<Decimal>) -> Decimal {
    requested.or(offer_rate).unwrap_or(Decimal::ZERO)
}

// Negócio ganho sem data de ganho recebe "agora"
pub fn stamp_won_at(
    stage: DealStage,
    won_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    match (stage, won_at) {
        (DealStage::Gagne, None) => Some(now),
        (_, won_at) => won_at,
    }
}

// Ganho converte o lead; perdido marca o lead como perdido
pub fn lead_status_for_stage(stage: DealStage) -> Option<LeadStatus> {
    match stage {
        DealStage::Gagne => Some(LeadStatus::Converti),
        DealStage::Perdu => Some(LeadStatus::Perdu),
        DealStage::Prospection | DealStage::Negociation => None,
    }
}

// =============================================================================
//  SERVIÇO
// =============================================================================

#[derive(Clone)]
pub struct DealService {
    deal_repo: DealRepository,
    relation_repo: RelationRepository,
    offer_repo: OfferRepository,
    lead_repo: LeadRepository,
    pool: PgPool,
}

impl DealService {
    pub fn new(
        deal_repo: DealRepository,
        relation_repo: RelationRepository,
        offer_repo: OfferRepository,
        lead_repo: LeadRepository,
        pool: PgPool,
    ) -> Self {
        Self { deal_repo, relation_repo, offer_repo, lead_repo, pool }
    }

    pub async fn list_deals(&self, user_id: Uuid, filter: &DealFilter) -> Result<Vec<DealDetail>, AppError> {
        self.deal_repo.list(user_id, filter).await
    }

    pub async fn get_deal(&self, user_id: Uuid, id: Uuid) -> Result<DealDetail, AppError> {
        self.deal_repo
            .find_detail(&self.pool, user_id, id)
            .await?
            .ok_or(AppError::NotFound("deal_not_found"))
    }

    pub async fn commissionable_deals(&self, user_id: Uuid) -> Result<Vec<DealDetail>, AppError> {
        self.deal_repo.list_commissionable(user_id).await
    }

    pub async fn available_leads(&self, user_id: Uuid) -> Result<Vec<AvailableLead>, AppError> {
        self.deal_repo.list_available_leads(user_id).await
    }

    pub async fn available_relations(&self, user_id: Uuid) -> Result<Vec<AvailableRelation>, AppError> {
        self.relation_repo.list_available(user_id).await
    }

    /// LÓGICA DE NEGÓCIO: cria o negócio com tipo, taxa e data de ganho
    /// derivados, toca a relação e propaga o status para o lead.
    /// Relação e lead ficam travados durante toda a transação.
    pub async fn create_deal(&self, user_id: Uuid, payload: &CreateDealPayload) -> Result<DealDetail, AppError> {
        let relation_id = payload.relation_id.ok_or_else(|| field_error("relation_id", "required"))?;

        let mut tx = self.pool.begin().await?;

        let relation = self.relation_repo
            .lock_owned(&mut *tx, user_id, relation_id)
            .await?
            .ok_or_else(|| field_error("relation_id", "relation_not_owned"))?;

        let lead = match relation.lead_id {
            Some(lead_id) => self.lead_repo.lock_by_id(&mut *tx, lead_id).await?,
            None => None,
        };

        let lead_has_durable_deal = match &lead {
            Some(lead) => self.deal_repo.lead_has_durable_deal(&mut *tx, lead.id, None).await?,
            None => false,
        };

        let offer = self.offer_repo.find_by_id(&mut *tx, relation.offer_id).await?;

        let stage = payload.stage.unwrap_or_default();
        let new_deal = NewDeal {
            relation_id: relation.id,
            name: &payload.name,
            deal_type: derive_deal_type(
                payload.deal_type,
                offer.as_ref().map(|o| o.commission_plan),
                lead.is_some(),
                lead_has_durable_deal,
            ),
            stage,
            amount: payload.amount,
            notes: payload.notes.as_deref(),
            commission_rate: resolve_commission_rate(
                payload.commission_rate,
                offer.as_ref().map(|o| o.commission_rate),
            ),
            won_at: stamp_won_at(stage, payload.won_at, Utc::now()),
            client_paid_at: payload.client_paid_at,
            commission_paid_at: payload.commission_paid_at,
        };

        let deal = self.deal_repo.create(&mut *tx, &new_deal).await?;
        self.relation_repo.touch(&mut *tx, relation.id).await?;

        if let (Some(lead), Some(status)) = (&lead, lead_status_for_stage(stage)) {
            self.lead_repo.set_status(&mut *tx, lead.id, status).await?;
        }

        let detail = self.deal_repo
            .find_detail(&mut *tx, user_id, deal.id)
            .await?
            .ok_or(AppError::NotFound("deal_not_found"))?;

        tx.commit().await?;

        tracing::info!("💼 Negócio {} criado ({:?}, {:?}) na relação {}", deal.id, deal.deal_type, deal.stage, relation.id);
        Ok(detail)
    }

    /// Atualização parcial com os mesmos efeitos de etapa da criação.
    pub async fn update_deal(
        &self,
        user_id: Uuid,
        id: Uuid,
        payload: &UpdateDealPayload,
    ) -> Result<DealDetail, AppError> {
        let mut tx = self.pool.begin().await?;

        let current = self.deal_repo
            .lock_owned(&mut *tx, user_id, id)
            .await?
            .ok_or(AppError::NotFound("deal_not_found"))?;

        // Trocar de relação exige que a nova também seja do comercial
        let relation_id = match payload.relation_id {
            Some(relation_id) if relation_id != current.relation_id => {
                self.relation_repo
                    .lock_owned(&mut *tx, user_id, relation_id)
                    .await?
                    .ok_or_else(|| field_error("relation_id", "relation_not_owned"))?;
                relation_id
            }
            _ => current.relation_id,
        };

        let stage = payload.stage.unwrap_or(current.stage);
        let won_at = stamp_won_at(stage, payload.won_at.or(current.won_at), Utc::now());

        let deal = self.deal_repo.update(&mut *tx, id, payload, won_at).await?;

        if payload.stage.is_some() || relation_id != current.relation_id {
            self.relation_repo.touch(&mut *tx, relation_id).await?;
        }

        if let Some(status) = payload.stage.and_then(lead_status_for_stage) {
            let relation = self.relation_repo.find_owned(&mut *tx, user_id, relation_id).await?;
            if let Some(lead_id) = relation.and_then(|r| r.lead_id) {
                self.lead_repo.set_status(&mut *tx, lead_id, status).await?;
            }
        }

        let detail = self.deal_repo
            .find_detail(&mut *tx, user_id, deal.id)
            .await?
            .ok_or(AppError::NotFound("deal_not_found"))?;

        tx.commit().await?;
        Ok(detail)
    }

    pub async fn delete_deal(&self, user_id: Uuid, id: Uuid) -> Result<(), AppError> {
        if !self.deal_repo.delete_owned(user_id, id).await? {
            return Err(AppError::NotFound("deal_not_found"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn durable_history_forces_one_shot() {
        let derived = derive_deal_type(Some(DealType::Durable), Some(CommissionPlan::Durable), true, true);
        assert_eq!(derived, DealType::OneShot);
    }

    #[test]
    fn requested_type_wins_over_offer_plan() {
        let derived = derive_deal_type(Some(DealType::OneShot), Some(CommissionPlan::Durable), true, false);
        assert_eq!(derived, DealType::OneShot);
    }

    #[test]
    fn offer_plan_is_the_fallback() {
        assert_eq!(
            derive_deal_type(None, Some(CommissionPlan::Durable), true, false),
            DealType::Durable
        );
        assert_eq!(derive_deal_type(None, None, true, false), DealType::OneShot);
    }

    #[test]
    fn relation_without_lead_defaults_to_one_shot() {
        assert_eq!(derive_deal_type(None, Some(CommissionPlan::Durable), false, false), DealType::OneShot);
    }

    #[test]
    fn commission_rate_falls_back_to_offer_then_zero() {
        let explicit = Decimal::new(1250, 2);
        let offer = Decimal::new(2000, 2);
        assert_eq!(resolve_commission_rate(Some(explicit), Some(offer)), explicit);
        assert_eq!(resolve_commission_rate(None, Some(offer)), offer);
        assert_eq!(resolve_commission_rate(None, None), Decimal::ZERO);
    }

    #[test]
    fn won_stage_stamps_only_when_absent() {
        let now = Utc::now();
        let earlier = now - Duration::days(3);

        assert_eq!(stamp_won_at(DealStage::Gagne, None, now), Some(now));
        assert_eq!(stamp_won_at(DealStage::Gagne, Some(earlier), now), Some(earlier));
        assert_eq!(stamp_won_at(DealStage::Negociation, None, now), None);
    }

    #[test]
    fn stage_propagates_to_lead_status() {
        assert_eq!(lead_status_for_stage(DealStage::Gagne), Some(LeadStatus::Converti));
        assert_eq!(lead_status_for_stage(DealStage::Perdu), Some(LeadStatus::Perdu));
        assert_eq!(lead_status_for_stage(DealStage::Prospection), None);
        assert_eq!(lead_status_for_stage(DealStage::Negociation), None);
    }

    // Banco real (DATABASE_URL)

    use serde_json::json;

    use crate::test_support::{db_state, http_status, lead, offer, payload, signup};

    #[tokio::test]
    async fn second_deal_on_durable_lead_is_one_shot() {
        let Some(state) = db_state().await else { return };
        let alice = signup(&state).await;
        let durable = offer(&state, "durable").await;
        let (_, relation) = lead(&state, &alice, &durable).await;

        let new_deal = || payload::<CreateDealPayload>(json!({ "relation_id": relation.id, "name": "Contrat" }));
        let first = state.deal_service.create_deal(alice.id, &new_deal()).await.unwrap();
        let second = state.deal_service.create_deal(alice.id, &new_deal()).await.unwrap();
        assert_eq!(first.deal.deal_type, DealType::Durable);
        assert_eq!(second.deal.deal_type, DealType::OneShot);
    }

    #[tokio::test]
    async fn deals_of_others_are_not_found() {
        let Some(state) = db_state().await else { return };
        let (alice, bob) = (signup(&state).await, signup(&state).await);
        let catalog = offer(&state, "one_shot").await;
        let (_, relation) = lead(&state, &alice, &catalog).await;
        let deal = state
            .deal_service
            .create_deal(alice.id, &payload(json!({ "relation_id": relation.id, "name": "Contrat" })))
            .await
            .unwrap();

        let err = state.deal_service.get_deal(bob.id, deal.deal.id).await.unwrap_err();
        assert_eq!(http_status(&err, &state), 404);
        assert!(matches!(state.deal_service.delete_deal(bob.id, deal.deal.id).await, Err(AppError::NotFound(_))));

        // Criar na relação alheia também é recusado
        let err = state
            .deal_service
            .create_deal(bob.id, &payload(json!({ "relation_id": relation.id, "name": "Intrus" })))
            .await
            .unwrap_err();
        assert_eq!(http_status(&err, &state), 400);
        assert!(state.deal_service.get_deal(alice.id, deal.deal.id).await.is_ok());
    }
}
