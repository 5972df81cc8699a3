// src/models/commission.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::common::validation::{validate_not_negative, validate_rate};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "commission_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CommissionStatus {
    #[default]
    Pending,
    Paid,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct Commission {
    pub id: Uuid,
    pub deal_id: Uuid,
    pub salesperson_id: Uuid,
    pub commission_amount: Decimal,
    pub commission_rate: Decimal,
    pub status: CommissionStatus,
    pub payment_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateCommissionPayload {
    #[validate(required(message = "required"))]
    #[serde(alias = "deal")]
    pub deal_id: Option<Uuid>,

    // Padrão: taxa do negócio e valor = montante * taxa / 100
    #[validate(custom(function = "validate_not_negative"))]
    pub commission_amount: Option<Decimal>,
    #[validate(custom(function = "validate_rate"))]
    pub commission_rate: Option<Decimal>,

    pub status: Option<CommissionStatus>,
    pub payment_date: Option<NaiveDate>,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateCommissionPayload {
    #[validate(custom(function = "validate_not_negative"))]
    pub commission_amount: Option<Decimal>,
    #[validate(custom(function = "validate_rate"))]
    pub commission_rate: Option<Decimal>,
    pub status: Option<CommissionStatus>,
    pub payment_date: Option<NaiveDate>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CommissionFilter {
    pub status: Option<CommissionStatus>,
    pub deal_id: Option<Uuid>,
}
