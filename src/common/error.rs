use std::collections::HashMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::common::i18n::I18nStore;
use crate::middleware::i18n::Locale;

// Erros de domínio. Cada variante é traduzida para HTTP em `to_api_error`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("E-mail já existe")]
    EmailAlreadyExists,

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Usuário não encontrado")]
    UserNotFound,

    // Guarda a chave de tradução (ex: "lead_not_found")
    #[error("Recurso não encontrado: {0}")]
    NotFound(&'static str),

    // Mudança de status não permitida (ex: ação cancelada -> concluída)
    #[error("Transição inválida: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Upload inválido: {0}")]
    InvalidUpload(String),

    #[error("Erro de banco de dados: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Erro interno do servidor: {0}")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),

    #[error("Erro de I/O: {0}")]
    IoError(#[from] std::io::Error),
}

// A resposta HTTP de erro, já traduzida.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: String,
    pub details: Option<Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.details {
            Some(details) => json!({ "error": self.error, "details": details }),
            None => json!({ "error": self.error }),
        };
        (self.status, Json(body)).into_response()
    }
}

impl AppError {
    pub fn to_api_error(&self, locale: &Locale, store: &I18nStore) -> ApiError {
        let lang = locale.0.as_str();
        let simple = |status: StatusCode, key: &str| ApiError {
            status,
            error: store.translate(lang, key),
            details: None,
        };

        match self {
            AppError::ValidationError(errors) => {
                let mut details: HashMap<String, Vec<String>> = HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages = field_errors
                        .iter()
                        .map(|e| {
                            let key = e.message.as_deref().unwrap_or(&*e.code);
                            store.translate(lang, key)
                        })
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                ApiError {
                    status: StatusCode::BAD_REQUEST,
                    error: store.translate(lang, "validation_failed"),
                    details: Some(json!(details)),
                }
            }
            // Cadastro com e-mail repetido é erro de validação (400), não conflito
            AppError::EmailAlreadyExists => simple(StatusCode::BAD_REQUEST, "email_already_exists"),
            AppError::InvalidCredentials => simple(StatusCode::UNAUTHORIZED, "invalid_credentials"),
            AppError::InvalidToken => simple(StatusCode::UNAUTHORIZED, "invalid_token"),
            AppError::UserNotFound => simple(StatusCode::UNAUTHORIZED, "user_not_found"),
            AppError::NotFound(key) => simple(StatusCode::NOT_FOUND, key),
            AppError::DatabaseError(sqlx::Error::RowNotFound) => simple(StatusCode::NOT_FOUND, "not_found"),
            AppError::InvalidTransition { .. } => simple(StatusCode::BAD_REQUEST, "invalid_transition"),
            AppError::InvalidUpload(reason) => {
                tracing::warn!("Upload rejeitado: {}", reason);
                simple(StatusCode::BAD_REQUEST, "invalid_upload")
            }
            e => {
                tracing::error!("Erro Interno do Servidor: {}", e);
                simple(StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
            }
        }
    }
}

/// Monta um erro de validação de um único campo, no mesmo formato do `validator`.
pub fn field_error(field: &'static str, code: &'static str) -> AppError {
    let mut errors = validator::ValidationErrors::new();
    errors.add(field, validator::ValidationError::new(code));
    AppError::ValidationError(errors)
}

/// Converte violações de unicidade em erro de campo; o resto segue como erro de banco.
pub fn map_unique_violation(err: sqlx::Error, rules: &[(&str, &'static str, &'static str)]) -> AppError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            if let Some(constraint) = db_err.constraint() {
                for &(name, field, code) in rules {
                    if name == constraint {
                        return field_error(field, code);
                    }
                }
            }
        }
    }
    err.into()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn en() -> Locale {
        Locale("en".to_string())
    }

    #[test]
    fn field_errors_become_bad_request_with_details() {
        let store = I18nStore::load();
        let api = field_error("siret", "invalid_siret").to_api_error(&en(), &store);

        assert_eq!(api.status, StatusCode::BAD_REQUEST);
        let details = api.details.expect("details");
        let messages = details["siret"].as_array().expect("siret messages");
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0], store.translate("en", "invalid_siret"));
    }

    #[test]
    fn not_found_and_auth_errors_map_to_expected_status() {
        let store = I18nStore::load();
        assert_eq!(AppError::NotFound("lead_not_found").to_api_error(&en(), &store).status, StatusCode::NOT_FOUND);
        assert_eq!(AppError::InvalidToken.to_api_error(&en(), &store).status, StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::EmailAlreadyExists.to_api_error(&en(), &store).status, StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::DatabaseError(sqlx::Error::RowNotFound).to_api_error(&en(), &store).status,
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn internal_errors_hide_details() {
        let store = I18nStore::load();
        let api = AppError::InternalServerError(anyhow::anyhow!("segredo")).to_api_error(&en(), &store);
        assert_eq!(api.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!api.error.contains("segredo"));
        assert!(api.details.is_none());
    }

    #[test]
    fn non_unique_errors_pass_through_mapping() {
        let err = map_unique_violation(sqlx::Error::RowNotFound, &[("leads_email_key", "email", "duplicate_lead_email")]);
        assert!(matches!(err, AppError::DatabaseError(sqlx::Error::RowNotFound)));
    }
}
