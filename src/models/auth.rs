// src/models/auth.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;
use utoipa::ToSchema;

use crate::common::validation::PHONE_RE;

// Representa um usuário vindo do banco de dados
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,

    #[serde(skip_serializing)] // IMPORTANTE para segurança
    #[schema(ignore)]
    pub password_hash: String,

    pub first_name: String,
    pub last_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
pub struct Profile {
    pub user_id: Uuid,
    pub company: Option<String>,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Dados para registro de um novo usuário
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterUserPayload {
    #[serde(default)]
    #[validate(email(message = "invalid_email"), length(min = 1, message = "required"))]
    #[schema(example = "jeanne@acme.fr")]
    pub email: String,

    #[serde(default)]
    #[validate(length(min = 6, message = "password_too_short"))]
    pub password: String,

    #[serde(default)]
    #[schema(example = "Jeanne Martin")]
    pub full_name: Option<String>,

    #[serde(default)]
    #[schema(example = "ACME")]
    pub company: Option<String>,
}

// Dados para login (o "username" é o próprio e-mail)
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginUserPayload {
    #[serde(default, alias = "username")]
    #[validate(length(min = 1, message = "required"))]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "required"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RefreshTokenPayload {
    #[serde(default)]
    #[validate(length(min = 1, message = "required"))]
    pub refresh: String,
}

// Par de tokens devolvido no cadastro e no login
#[derive(Debug, Serialize, ToSchema)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AccessTokenResponse {
    pub access: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenType {
    Access,
    Refresh,
}

// Estrutura de dados ("claims") dentro do JWT
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,  // Subject (ID do usuário)
    pub exp: usize, // Expiration time (quando o token expira)
    pub iat: usize, // Issued At (quando o token foi criado)
    pub token_type: TokenType,
}

// GET /profile/
#[derive(Debug, Serialize, ToSchema)]
pub struct ProfileSummary {
    pub email: String,
    pub username: String,
    pub full_name: String,
    pub company: Option<String>,
}

// GET /current-user/
#[derive(Debug, Serialize, ToSchema)]
pub struct CurrentUser {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub date_joined: DateTime<Utc>,
    pub phone: Option<String>,
    pub company: Option<String>,
}

impl CurrentUser {
    pub fn new(user: &User, profile: Option<&Profile>) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            date_joined: user.created_at,
            phone: profile.and_then(|p| p.phone.clone()),
            company: profile.and_then(|p| p.company.clone()),
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateCurrentUserPayload {
    #[validate(length(max = 150))]
    pub first_name: Option<String>,
    #[validate(length(max = 150))]
    pub last_name: Option<String>,
    #[validate(regex(path = *PHONE_RE, message = "invalid_phone"))]
    pub phone: Option<String>,
    #[validate(length(max = 255))]
    pub company: Option<String>,
}
