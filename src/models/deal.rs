// src/models/deal.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::common::validation::{validate_not_blank, validate_not_negative, validate_rate};
use crate::models::offer::CommissionPlan;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "deal_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DealType {
    #[default]
    OneShot,
    Durable,
}

impl From<CommissionPlan> for DealType {
    fn from(plan: CommissionPlan) -> Self {
        match plan {
            CommissionPlan::OneShot => DealType::OneShot,
            CommissionPlan::Durable => DealType::Durable,
        }
    }
}

// Etapas do pipeline: gagne = ganho, perdu = perdido
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "deal_stage", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DealStage {
    #[default]
    Prospection,
    Negociation,
    Gagne,
    Perdu,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct Deal {
    pub id: Uuid,
    pub relation_id: Uuid,
    pub invoice_id: Option<Uuid>,
    pub name: String,
    pub deal_type: DealType,
    pub stage: DealStage,
    pub amount: Option<Decimal>,
    pub notes: Option<String>,
    pub commission_rate: Option<Decimal>,
    pub won_at: Option<DateTime<Utc>>,
    pub client_paid_at: Option<DateTime<Utc>>,
    pub commission_paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Negócio com os dados do lead da relação
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct DealDetail {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub deal: Deal,
    pub lead_id: Option<Uuid>,
    pub company_name: Option<String>,
    pub contact_name: Option<String>,
    pub lead_email: Option<String>,
}

// Valores já resolvidos (padrões e derivações aplicados) para o INSERT
#[derive(Debug, Clone)]
pub struct NewDeal<'a> {
    pub relation_id: Uuid,
    pub name: &'a str,
    pub deal_type: DealType,
    pub stage: DealStage,
    pub amount: Option<Decimal>,
    pub notes: Option<&'a str>,
    pub commission_rate: Decimal,
    pub won_at: Option<DateTime<Utc>>,
    pub client_paid_at: Option<DateTime<Utc>>,
    pub commission_paid_at: Option<DateTime<Utc>>,
}

// Linha travada para faturamento, com a checagem de dono já feita no SELECT
#[derive(Debug, Clone, FromRow)]
pub struct InvoiceCandidate {
    #[sqlx(flatten)]
    pub deal: Deal,
    pub owned: bool,
}

// Leads do comercial que já têm relação ativa
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct AvailableLead {
    pub id: Uuid,
    pub company_name: String,
    pub contact_name: String,
    pub email: String,
    pub relation_id: Uuid,
}

// =============================================================================
//  PAYLOADS
// =============================================================================

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateDealPayload {
    #[validate(required(message = "required"))]
    #[serde(alias = "relation")]
    pub relation_id: Option<Uuid>,

    #[serde(default)]
    #[validate(length(max = 255), custom(function = "validate_not_blank"))]
    #[schema(example = "Contrat annuel")]
    pub name: String,

    pub deal_type: Option<DealType>,
    pub stage: Option<DealStage>,

    #[validate(custom(function = "validate_not_negative"))]
    #[schema(example = 1000.0)]
    pub amount: Option<Decimal>,

    pub notes: Option<String>,

    #[validate(custom(function = "validate_rate"))]
    pub commission_rate: Option<Decimal>,

    pub won_at: Option<DateTime<Utc>>,
    pub client_paid_at: Option<DateTime<Utc>>,
    pub commission_paid_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateDealPayload {
    #[serde(alias = "relation")]
    pub relation_id: Option<Uuid>,
    #[validate(length(max = 255), custom(function = "validate_not_blank"))]
    pub name: Option<String>,
    pub deal_type: Option<DealType>,
    pub stage: Option<DealStage>,
    #[validate(custom(function = "validate_not_negative"))]
    pub amount: Option<Decimal>,
    pub notes: Option<String>,
    #[validate(custom(function = "validate_rate"))]
    pub commission_rate: Option<Decimal>,
    pub won_at: Option<DateTime<Utc>>,
    pub client_paid_at: Option<DateTime<Utc>>,
    pub commission_paid_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateInvoiceFromDealsPayload {
    #[serde(default)]
    #[validate(length(min = 1, message = "deal_ids_required"))]
    pub deal_ids: Vec<Uuid>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DealFilter {
    pub stage: Option<DealStage>,
    pub deal_type: Option<DealType>,
    pub relation_id: Option<Uuid>,
    /// Busca em nome, notas e empresa do lead
    pub search: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deal_type_mirrors_commission_plan() {
        assert_eq!(DealType::from(CommissionPlan::Durable), DealType::Durable);
        assert_eq!(DealType::from(CommissionPlan::OneShot), DealType::OneShot);
    }

    #[test]
    fn bulk_invoice_needs_at_least_one_deal() {
        let p: CreateInvoiceFromDealsPayload = serde_json::from_str(r#"{"deal_ids":[]}"#).unwrap();
        assert!(p.validate().is_err());
        let p: CreateInvoiceFromDealsPayload = serde_json::from_str("{}").unwrap();
        assert!(p.validate().is_err());
    }

    #[test]
    fn relation_accepts_short_key() {
        let relation = Uuid::new_v4();
        let p: CreateDealPayload =
            serde_json::from_str(&format!(r#"{{"relation":"{relation}","name":"Contrat"}}"#)).unwrap();
        assert_eq!(p.relation_id, Some(relation));
        assert!(p.validate().is_ok());

        let missing: CreateDealPayload = serde_json::from_str(r#"{"name":"Contrat"}"#).unwrap();
        assert!(missing.validate().unwrap_err().field_errors().contains_key("relation_id"));
    }

    #[test]
    fn negative_amounts_are_rejected() {
        let relation = Uuid::new_v4();
        let p: CreateDealPayload = serde_json::from_str(&format!(
            r#"{{"relation_id":"{relation}","name":"Contrat","amount":-10}}"#
        ))
        .unwrap();
        assert!(p.validate().unwrap_err().field_errors().contains_key("amount"));
    }
}
