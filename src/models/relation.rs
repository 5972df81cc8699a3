// src/models/relation.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::models::offer::CommissionPlan;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "relation_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RelationStatus {
    #[default]
    Active,
    NonActive,
}

// Quem vende o quê para quem: (lead, comercial, oferta)
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct Relation {
    pub id: Uuid,
    pub lead_id: Option<Uuid>,
    pub salesperson_id: Uuid,
    pub offer_id: Uuid,
    pub status: RelationStatus,
    pub last_action_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Usado para montar as escolhas na criação de negócios
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct AvailableRelation {
    pub id: Uuid,
    pub status: RelationStatus,
    pub last_action_at: Option<DateTime<Utc>>,
    pub lead_id: Option<Uuid>,
    pub lead_company_name: Option<String>,
    pub lead_contact_name: Option<String>,
    pub lead_email: Option<String>,
    pub offer_id: Uuid,
    pub offer_name: String,
    pub offer_commission_plan: CommissionPlan,
    pub offer_commission_rate: Decimal,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateRelationPayload {
    #[serde(alias = "lead")]
    pub lead_id: Option<Uuid>,
    #[validate(required(message = "required"))]
    #[serde(alias = "offer")]
    pub offer_id: Option<Uuid>,
    pub status: Option<RelationStatus>,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateRelationPayload {
    pub lead_id: Option<Uuid>,
    pub offer_id: Option<Uuid>,
    pub status: Option<RelationStatus>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RelationFilter {
    pub status: Option<RelationStatus>,
    pub lead_id: Option<Uuid>,
    pub offer_id: Option<Uuid>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offer_is_required_lead_is_not() {
        let p: CreateRelationPayload = serde_json::from_str("{}").unwrap();
        assert!(p.validate().unwrap_err().field_errors().contains_key("offer_id"));

        let offer = Uuid::new_v4();
        let p: CreateRelationPayload =
            serde_json::from_str(&format!(r#"{{"offer":"{offer}","status":"non_active"}}"#)).unwrap();
        assert!(p.validate().is_ok());
        assert_eq!(p.offer_id, Some(offer));
        assert!(p.lead_id.is_none());
        assert_eq!(p.status, Some(RelationStatus::NonActive));
    }
}
