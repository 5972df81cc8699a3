// src/models/offer.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::common::validation::{validate_not_blank, validate_rate};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "commission_plan", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CommissionPlan {
    OneShot,
    Durable,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct Offer {
    pub id: Uuid,
    pub name: String,
    pub commission_plan: CommissionPlan,
    pub commission_rate: Decimal,
    pub active: bool,
    pub additional_condition: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateOfferPayload {
    #[serde(default)]
    #[validate(length(max = 255), custom(function = "validate_not_blank"))]
    #[schema(example = "Offre Premium")]
    pub name: String,

    #[validate(required(message = "required"))]
    pub commission_plan: Option<CommissionPlan>,

    #[validate(required(message = "required"), custom(function = "validate_rate"))]
    #[schema(example = 15.0)]
    pub commission_rate: Option<Decimal>,

    pub active: Option<bool>,

    #[validate(length(max = 255))]
    pub additional_condition: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateOfferPayload {
    #[validate(length(max = 255), custom(function = "validate_not_blank"))]
    pub name: Option<String>,
    pub commission_plan: Option<CommissionPlan>,
    #[validate(custom(function = "validate_rate"))]
    pub commission_rate: Option<Decimal>,
    pub active: Option<bool>,
    #[validate(length(max = 255))]
    pub additional_condition: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct OfferFilter {
    pub active: Option<bool>,
    pub commission_plan: Option<CommissionPlan>,
    pub search: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requires_plan_and_rate() {
        let p: CreateOfferPayload = serde_json::from_str(r#"{"name":"Premium"}"#).unwrap();
        let errors = p.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("commission_plan"));
        assert!(errors.field_errors().contains_key("commission_rate"));
    }

    #[test]
    fn rate_must_be_a_percentage() {
        let p: CreateOfferPayload = serde_json::from_str(
            r#"{"name":"Premium","commission_plan":"durable","commission_rate":150}"#,
        )
        .unwrap();
        assert!(p.validate().unwrap_err().field_errors().contains_key("commission_rate"));

        let p: CreateOfferPayload = serde_json::from_str(
            r#"{"name":"Premium","commission_plan":"one_shot","commission_rate":12.5}"#,
        )
        .unwrap();
        assert!(p.validate().is_ok());
        assert_eq!(p.commission_plan, Some(CommissionPlan::OneShot));
    }
}
