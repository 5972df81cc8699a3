// src/models/lead.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::common::validation::{blank_as_null, empty_as_none, validate_not_blank, PHONE_RE, SIRET_RE};
use crate::models::offer::CommissionPlan;

// Mapeia o CREATE TYPE lead_status do banco
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "lead_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum LeadStatus {
    #[default]
    Nouveau,
    EnCours,
    Converti,
    Perdu,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct Lead {
    pub id: Uuid,
    pub created_by: Uuid,
    pub company_name: String,
    pub contact_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub siret: Option<String>,
    pub status: LeadStatus,
    pub notes: Option<String>,
    pub declared_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Resumo da oferta vinculada ao lead (via relação do dono)
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LeadOfferDetails {
    pub id: Uuid,
    pub name: String,
    pub commission_rate: Decimal,
    pub commission_plan: CommissionPlan,
}

// Linha "achatada" do SELECT com joins; vira `LeadDetail`
#[derive(Debug, FromRow)]
pub struct LeadDetailRow {
    #[sqlx(flatten)]
    pub lead: Lead,
    pub created_by_username: String,
    pub current_offer_id: Option<Uuid>,
    pub offer_name: Option<String>,
    pub offer_commission_rate: Option<Decimal>,
    pub offer_commission_plan: Option<CommissionPlan>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LeadDetail {
    #[serde(flatten)]
    pub lead: Lead,
    pub created_by_username: String,
    pub current_offer_id: Option<Uuid>,
    pub offer_details: Option<LeadOfferDetails>,
}

impl From<LeadDetailRow> for LeadDetail {
    fn from(row: LeadDetailRow) -> Self {
        let offer_details = match (
            row.current_offer_id,
            row.offer_name,
            row.offer_commission_rate,
            row.offer_commission_plan,
        ) {
            (Some(id), Some(name), Some(commission_rate), Some(commission_plan)) => {
                Some(LeadOfferDetails { id, name, commission_rate, commission_plan })
            }
            _ => None,
        };

        Self {
            lead: row.lead,
            created_by_username: row.created_by_username,
            current_offer_id: row.current_offer_id,
            offer_details,
        }
    }
}

// =============================================================================
//  PAYLOADS
// =============================================================================

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateLeadPayload {
    #[serde(default)]
    #[validate(length(max = 255), custom(function = "validate_not_blank"))]
    #[schema(example = "ACME SAS")]
    pub company_name: String,

    #[serde(default)]
    #[validate(length(max = 255), custom(function = "validate_not_blank"))]
    #[schema(example = "Jeanne Martin")]
    pub contact_name: String,

    #[serde(default)]
    #[validate(email(message = "invalid_email"), length(min = 1, message = "required"))]
    #[schema(example = "contact@acme.fr")]
    pub email: String,

    #[serde(default, deserialize_with = "empty_as_none")]
    #[validate(regex(path = *PHONE_RE, message = "invalid_phone"))]
    #[schema(example = "+33612345678")]
    pub phone: Option<String>,

    #[serde(default, deserialize_with = "empty_as_none")]
    #[validate(regex(path = *SIRET_RE, message = "invalid_siret"))]
    #[schema(example = "123456789")]
    pub siret: Option<String>,

    pub status: Option<LeadStatus>,
    pub notes: Option<String>,
    pub declared_at: Option<DateTime<Utc>>,

    // Oferta escolhida; sem ela, usa qualquer oferta ativa
    pub offer_id: Option<Uuid>,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateLeadPayload {
    #[validate(length(max = 255), custom(function = "validate_not_blank"))]
    pub company_name: Option<String>,

    #[validate(length(max = 255), custom(function = "validate_not_blank"))]
    pub contact_name: Option<String>,

    #[validate(email(message = "invalid_email"))]
    pub email: Option<String>,

    // "" ou null apaga o telefone
    #[serde(default, deserialize_with = "blank_as_null")]
    #[validate(regex(path = *PHONE_RE, message = "invalid_phone"))]
    #[schema(value_type = Option<String>)]
    pub phone: Option<Option<String>>,

    #[serde(default, deserialize_with = "blank_as_null")]
    #[validate(regex(path = *SIRET_RE, message = "invalid_siret"))]
    #[schema(value_type = Option<String>)]
    pub siret: Option<Option<String>>,

    pub status: Option<LeadStatus>,
    pub notes: Option<String>,
    pub declared_at: Option<DateTime<Utc>>,
    pub offer_id: Option<Uuid>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LeadFilter {
    pub status: Option<LeadStatus>,
    /// Busca em empresa, contato, e-mail e SIRET
    pub search: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(json: &str) -> CreateLeadPayload {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn accepts_minimal_lead() {
        let p = payload(r#"{"company_name":"ACME","contact_name":"Jeanne","email":"j@acme.fr","siret":""}"#);
        assert!(p.validate().is_ok());
        assert!(p.siret.is_none());
    }

    #[test]
    fn rejects_bad_siret_phone_and_blank_names() {
        let p = payload(
            r#"{"company_name":"  ","contact_name":"Jeanne","email":"nope","phone":"12","siret":"12345"}"#,
        );
        let errors = p.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("company_name"));
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("phone"));
        assert!(fields.contains_key("siret"));
        assert!(!fields.contains_key("contact_name"));
    }

    #[test]
    fn missing_required_fields_are_validation_errors() {
        let errors = payload("{}").validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("company_name"));
        assert!(fields.contains_key("contact_name"));
        assert!(fields.contains_key("email"));
    }

    #[test]
    fn update_can_clear_siret_and_phone() {
        let p: UpdateLeadPayload = serde_json::from_str(r#"{"siret":"","phone":""}"#).unwrap();
        assert!(p.validate().is_ok());
        assert_eq!(p.siret, Some(None));
        assert_eq!(p.phone, Some(None));

        let untouched: UpdateLeadPayload = serde_json::from_str(r#"{"notes":"rappel"}"#).unwrap();
        assert_eq!(untouched.siret, None);
        assert_eq!(untouched.phone, None);
    }

    #[test]
    fn update_still_validates_new_siret() {
        let p: UpdateLeadPayload = serde_json::from_str(r#"{"siret":"12345"}"#).unwrap();
        assert!(p.validate().unwrap_err().field_errors().contains_key("siret"));

        let p: UpdateLeadPayload = serde_json::from_str(r#"{"siret":"987654321"}"#).unwrap();
        assert!(p.validate().is_ok());
    }

    #[test]
    fn status_uses_wire_names() {
        let p = payload(r#"{"company_name":"A","contact_name":"B","email":"a@b.fr","status":"en_cours"}"#);
        assert_eq!(p.status, Some(LeadStatus::EnCours));
    }

    #[test]
    fn detail_keeps_offer_only_when_complete() {
        let now = Utc::now();
        let lead = Lead {
            id: Uuid::new_v4(),
            created_by: Uuid::new_v4(),
            company_name: "ACME".into(),
            contact_name: "Jeanne".into(),
            email: "j@acme.fr".into(),
            phone: None,
            siret: None,
            status: LeadStatus::Nouveau,
            notes: None,
            declared_at: Some(now),
            created_at: now,
            updated_at: now,
        };
        let offer_id = Uuid::new_v4();
        let detail = LeadDetail::from(LeadDetailRow {
            lead: lead.clone(),
            created_by_username: "j@acme.fr".into(),
            current_offer_id: Some(offer_id),
            offer_name: Some("Premium".into()),
            offer_commission_rate: Some(Decimal::new(1500, 2)),
            offer_commission_plan: Some(CommissionPlan::Durable),
        });
        assert_eq!(detail.offer_details.map(|o| o.id), Some(offer_id));

        let bare = LeadDetail::from(LeadDetailRow {
            lead,
            created_by_username: "j@acme.fr".into(),
            current_offer_id: None,
            offer_name: None,
            offer_commission_rate: None,
            offer_commission_plan: None,
        });
        assert!(bare.offer_details.is_none());

        let json = serde_json::to_value(&bare).unwrap();
        assert_eq!(json["company_name"], "ACME");
        assert!(json["offer_details"].is_null());
    }
}
