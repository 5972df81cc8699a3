// src/common/validation.rs

use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use validator::ValidationError;

pub static SIRET_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9]{9}$").unwrap());
pub static PHONE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\+?1?[0-9]{9,15}$").unwrap());
// Formato dos números gerados pela sequence invoice_number_seq
pub static INVOICE_NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)^FAC-[0-9]{8}-[0-9]+$").unwrap());

pub fn validate_not_negative(val: &Decimal) -> Result<(), ValidationError> {
    if val.is_sign_negative() {
        let mut err = ValidationError::new("range");
        err.message = Some("negative_amount".into());
        return Err(err);
    }
    Ok(())
}

// Taxas são percentuais (20.00 = 20%)
pub fn validate_rate(val: &Decimal) -> Result<(), ValidationError> {
    if val.is_sign_negative() || *val > Decimal::ONE_HUNDRED {
        let mut err = ValidationError::new("range");
        err.message = Some("invalid_rate".into());
        return Err(err);
    }
    Ok(())
}

pub fn is_sequence_invoice_number(val: &str) -> bool {
    INVOICE_NUMBER_RE.is_match(val.trim())
}

// Número manual não pode ocupar um valor futuro da sequência
pub fn validate_manual_invoice_number(val: &str) -> Result<(), ValidationError> {
    if is_sequence_invoice_number(val) {
        let mut err = ValidationError::new("reserved_invoice_number");
        err.message = Some("reserved_invoice_number".into());
        return Err(err);
    }
    Ok(())
}

pub fn validate_not_blank(val: &str) -> Result<(), ValidationError> {
    if val.trim().is_empty() {
        return Err(ValidationError::new("required"));
    }
    Ok(())
}

// Campos opcionais enviados como "" pelos formulários contam como ausentes
pub fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}

// Atualização parcial de campo anulável: ausente -> None (mantém),
// "" ou null -> Some(None) (apaga), valor -> Some(Some(v))
pub fn blank_as_null<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(Some(value.filter(|s| !s.trim().is_empty())))
}

/// Divide "Nome Sobrenome Composto" no primeiro espaço.
pub fn split_full_name(full_name: &str) -> (String, String) {
    match full_name.trim().split_once(' ') {
        Some((first, last)) => (first.to_string(), last.trim().to_string()),
        None => (full_name.trim().to_string(), String::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn siret_requires_exactly_nine_digits() {
        assert!(SIRET_RE.is_match("123456789"));
        assert!(!SIRET_RE.is_match("12345678"));
        assert!(!SIRET_RE.is_match("1234567890"));
        assert!(!SIRET_RE.is_match("12345678a"));
        assert!(!SIRET_RE.is_match(" 23456789"));
    }

    #[test]
    fn phone_accepts_international_prefix() {
        assert!(PHONE_RE.is_match("+33612345678"));
        assert!(PHONE_RE.is_match("0612345678"));
        assert!(!PHONE_RE.is_match("06 12 34 56 78"));
        assert!(!PHONE_RE.is_match("12345"));
    }

    #[test]
    fn sequence_shaped_invoice_numbers_are_reserved() {
        assert!(validate_manual_invoice_number("FAC-20250307-00042").is_err());
        assert!(validate_manual_invoice_number(" fac-20250307-123456 ").is_err());
        assert!(validate_manual_invoice_number("FAC-2025-001").is_ok());
        assert!(validate_manual_invoice_number("F2025-0042").is_ok());
    }

    #[test]
    fn rates_are_bounded_percentages() {
        assert!(validate_rate(&dec("20.00")).is_ok());
        assert!(validate_rate(&dec("100")).is_ok());
        assert!(validate_rate(&dec("100.01")).is_err());
        assert!(validate_rate(&dec("-1")).is_err());
        assert!(validate_not_negative(&dec("0")).is_ok());
        assert!(validate_not_negative(&dec("-0.01")).is_err());
    }

    #[test]
    fn full_name_splits_on_first_space() {
        assert_eq!(split_full_name("Jean Pierre Martin"), ("Jean".to_string(), "Pierre Martin".to_string()));
        assert_eq!(split_full_name("Cher"), ("Cher".to_string(), String::new()));
        assert_eq!(split_full_name(""), (String::new(), String::new()));
    }

    #[derive(Debug, serde::Deserialize)]
    struct Form {
        #[serde(default, deserialize_with = "empty_as_none")]
        siret: Option<String>,
    }

    #[test]
    fn empty_optional_strings_become_none() {
        let form: Form = serde_json::from_str(r#"{"siret": ""}"#).unwrap();
        assert!(form.siret.is_none());
        let form: Form = serde_json::from_str(r#"{"siret": "123456789"}"#).unwrap();
        assert_eq!(form.siret.as_deref(), Some("123456789"));
        let form: Form = serde_json::from_str("{}").unwrap();
        assert!(form.siret.is_none());
    }

    #[derive(Debug, serde::Deserialize)]
    struct Patch {
        #[serde(default, deserialize_with = "blank_as_null")]
        siret: Option<Option<String>>,
    }

    #[test]
    fn patch_tells_absent_from_cleared() {
        let patch: Patch = serde_json::from_str("{}").unwrap();
        assert_eq!(patch.siret, None);
        let patch: Patch = serde_json::from_str(r#"{"siret": ""}"#).unwrap();
        assert_eq!(patch.siret, Some(None));
        let patch: Patch = serde_json::from_str(r#"{"siret": null}"#).unwrap();
        assert_eq!(patch.siret, Some(None));
        let patch: Patch = serde_json::from_str(r#"{"siret": "123456789"}"#).unwrap();
        assert_eq!(patch.siret, Some(Some("123456789".to_string())));
    }

    #[test]
    fn blank_strings_are_rejected() {
        assert!(validate_not_blank("  ").is_err());
        assert!(validate_not_blank("ACME").is_ok());
    }
}
