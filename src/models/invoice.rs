// src/models/invoice.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::common::validation::{validate_manual_invoice_number, validate_not_negative};
use crate::models::deal::Deal;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "payment_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
    Cancelled,
    Overdue,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct Invoice {
    pub id: Uuid,
    pub salesperson_id: Uuid,
    pub invoice_number: String,
    pub amount_excl_tax: Decimal,
    pub amount_incl_tax: Decimal,
    pub invoice_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub payment_status: PaymentStatus,
    pub file_path: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Fatura com os negócios vinculados
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct InvoiceDetail {
    #[serde(flatten)]
    pub invoice: Invoice,
    pub deals: Vec<Deal>,
}

// Valores prontos para o INSERT (número e totais já calculados)
#[derive(Debug, Clone)]
pub struct NewInvoice {
    pub salesperson_id: Uuid,
    pub invoice_number: String,
    pub amount_excl_tax: Decimal,
    pub amount_incl_tax: Decimal,
    pub invoice_date: NaiveDate,
    pub due_date: NaiveDate,
    pub payment_status: PaymentStatus,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateInvoicePayload {
    // Sem número, a sequência gera um; FAC-AAAAMMDD-N é reservado a ela
    #[validate(length(min = 1, max = 50), custom(function = "validate_manual_invoice_number"))]
    #[schema(example = "F2025-0042")]
    pub invoice_number: Option<String>,

    #[validate(required(message = "required"), custom(function = "validate_not_negative"))]
    #[schema(example = 1500.0)]
    pub amount_excl_tax: Option<Decimal>,

    #[validate(custom(function = "validate_not_negative"))]
    pub amount_incl_tax: Option<Decimal>,

    pub invoice_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub payment_status: Option<PaymentStatus>,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateInvoicePayload {
    #[validate(length(min = 1, max = 50))]
    pub invoice_number: Option<String>,
    #[validate(custom(function = "validate_not_negative"))]
    pub amount_excl_tax: Option<Decimal>,
    #[validate(custom(function = "validate_not_negative"))]
    pub amount_incl_tax: Option<Decimal>,
    pub invoice_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub payment_status: Option<PaymentStatus>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct InvoiceFilter {
    pub payment_status: Option<PaymentStatus>,
    /// Busca no número da fatura
    pub search: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_number_cannot_take_sequence_format() {
        let p: CreateInvoicePayload =
            serde_json::from_str(r#"{"invoice_number":"FAC-20990101-00001","amount_excl_tax":100}"#).unwrap();
        let errors = p.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("invoice_number"));

        let p: CreateInvoicePayload =
            serde_json::from_str(r#"{"invoice_number":"F2025-0042","amount_excl_tax":100}"#).unwrap();
        assert!(p.validate().is_ok());

        let p: CreateInvoicePayload = serde_json::from_str(r#"{"amount_excl_tax":100}"#).unwrap();
        assert!(p.validate().is_ok());
    }
}
