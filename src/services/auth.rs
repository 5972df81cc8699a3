// src/services/auth.rs

use bcrypt::{hash, verify};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{error::AppError, validation::split_full_name},
    db::UserRepository,
    models::auth::{
        Claims, CurrentUser, ProfileSummary, RegisterUserPayload, TokenPair, TokenType,
        UpdateCurrentUserPayload, User,
    },
};

// =============================================================================
//  CHAVES JWT
// =============================================================================

/// Emissão e verificação dos tokens HS256 (access de vida curta, refresh de vida longa).
#[derive(Clone)]
pub struct JwtKeys {
    secret: String,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl JwtKeys {
    pub fn new(secret: String, access_ttl: Duration, refresh_ttl: Duration) -> Self {
        Self { secret, access_ttl, refresh_ttl }
    }

    pub fn issue(&self, user_id: Uuid, token_type: TokenType) -> Result<String, AppError> {
        let now = Utc::now();
        let ttl = match token_type {
            TokenType::Access => self.access_ttl,
            TokenType::Refresh => self.refresh_ttl,
        };

        let claims = Claims {
            sub: user_id,
            exp: (now + ttl).timestamp() as usize,
            iat: now.timestamp() as usize,
            token_type,
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_ref()),
        )?)
    }

    pub fn issue_pair(&self, user_id: Uuid) -> Result<TokenPair, AppError> {
        Ok(TokenPair {
            access: self.issue(user_id, TokenType::Access)?,
            refresh: self.issue(user_id, TokenType::Refresh)?,
        })
    }

    // Assinatura, expiração e tipo precisam bater
    pub fn decode(&self, token: &str, expected: TokenType) -> Result<Claims, AppError> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_ref()),
            &Validation::default(),
        )
        .map_err(|_| AppError::InvalidToken)?;

        if token_data.claims.token_type != expected {
            return Err(AppError::InvalidToken);
        }
        Ok(token_data.claims)
    }
}

// =============================================================================
//  SERVIÇO DE AUTENTICAÇÃO
// =============================================================================

#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
    keys: JwtKeys,
    pool: PgPool,
}

impl AuthService {
    pub fn new(user_repo: UserRepository, keys: JwtKeys, pool: PgPool) -> Self {
        Self { user_repo, keys, pool }
    }

    /// Cria usuário e perfil na mesma transação e devolve o par de tokens.
    pub async fn register_user(&self, payload: &RegisterUserPayload) -> Result<TokenPair, AppError> {
        // O hash fica fora da transação, não toca no banco
        let password_clone = payload.password.clone();
        let hashed_password = tokio::task::spawn_blocking(move || {
            hash(&password_clone, bcrypt::DEFAULT_COST)
        })
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;

        let (first_name, last_name) = split_full_name(payload.full_name.as_deref().unwrap_or(""));

        let mut tx = self.pool.begin().await?;

        let new_user = self.user_repo
            .create_user(&mut *tx, &payload.email, &hashed_password, &first_name, &last_name)
            .await?;

        self.user_repo
            .create_profile(&mut *tx, new_user.id, payload.company.as_deref())
            .await?;

        tx.commit().await?;

        tracing::info!("👤 Novo usuário cadastrado: {}", new_user.id);
        self.keys.issue_pair(new_user.id)
    }

    pub async fn login_user(&self, email: &str, password: &str) -> Result<TokenPair, AppError> {
        let user = self.user_repo
            .find_by_email(email)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        let password_clone = password.to_owned();
        let password_hash_clone = user.password_hash.clone();

        // Executa a verificação em um thread separado
        let is_password_valid = tokio::task::spawn_blocking(move || {
            verify(&password_clone, &password_hash_clone)
        })
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??;

        if !is_password_valid {
            return Err(AppError::InvalidCredentials);
        }

        self.keys.issue_pair(user.id)
    }

    /// Troca um refresh token válido por um novo access token.
    pub async fn refresh(&self, refresh_token: &str) -> Result<String, AppError> {
        let claims = self.keys.decode(refresh_token, TokenType::Refresh)?;

        // Conta removida depois da emissão do token
        let user = self.user_repo
            .find_by_id(claims.sub)
            .await?
            .ok_or(AppError::UserNotFound)?;

        self.keys.issue(user.id, TokenType::Access)
    }

    pub async fn validate_token(&self, token: &str) -> Result<User, AppError> {
        let claims = self.keys.decode(token, TokenType::Access)?;

        self.user_repo
            .find_by_id(claims.sub)
            .await?
            .ok_or(AppError::UserNotFound)
    }

    // =========================================================================
    //  PERFIL
    // =========================================================================

    pub async fn profile_summary(&self, user: &User) -> Result<ProfileSummary, AppError> {
        let profile = self.user_repo.find_profile(user.id).await?;
        Ok(ProfileSummary {
            email: user.email.clone(),
            username: user.username.clone(),
            full_name: user.full_name(),
            company: profile.and_then(|p| p.company),
        })
    }

    pub async fn current_user(&self, user: &User) -> Result<CurrentUser, AppError> {
        let profile = self.user_repo.find_profile(user.id).await?;
        Ok(CurrentUser::new(user, profile.as_ref()))
    }

    pub async fn update_current_user(
        &self,
        user: &User,
        payload: &UpdateCurrentUserPayload,
    ) -> Result<CurrentUser, AppError> {
        let mut tx = self.pool.begin().await?;

        let updated = self.user_repo
            .update_names(
                &mut *tx,
                user.id,
                payload.first_name.as_deref(),
                payload.last_name.as_deref(),
            )
            .await?;

        let profile = self.user_repo
            .upsert_profile(&mut *tx, user.id, payload.company.as_deref(), payload.phone.as_deref())
            .await?;

        tx.commit().await?;

        Ok(CurrentUser::new(&updated, Some(&profile)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys() -> JwtKeys {
        JwtKeys::new("segredo-de-teste".to_string(), Duration::minutes(30), Duration::days(7))
    }

    #[test]
    fn access_token_round_trips_subject_and_type() {
        let keys = keys();
        let user_id = Uuid::new_v4();
        let token = keys.issue(user_id, TokenType::Access).unwrap();

        let claims = keys.decode(&token, TokenType::Access).unwrap();
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.token_type, TokenType::Access);
        assert_eq!(claims.exp - claims.iat, 30 * 60);
    }

    #[test]
    fn token_types_are_not_interchangeable() {
        let keys = keys();
        let pair = keys.issue_pair(Uuid::new_v4()).unwrap();

        assert!(matches!(keys.decode(&pair.refresh, TokenType::Access), Err(AppError::InvalidToken)));
        assert!(matches!(keys.decode(&pair.access, TokenType::Refresh), Err(AppError::InvalidToken)));
        assert!(keys.decode(&pair.refresh, TokenType::Refresh).is_ok());
    }

    #[test]
    fn refresh_token_lives_seven_days() {
        let keys = keys();
        let token = keys.issue(Uuid::new_v4(), TokenType::Refresh).unwrap();
        let claims = keys.decode(&token, TokenType::Refresh).unwrap();
        assert_eq!(claims.exp - claims.iat, 7 * 24 * 60 * 60);
    }

    #[test]
    fn rejects_foreign_signature_and_garbage() {
        let token = keys().issue(Uuid::new_v4(), TokenType::Access).unwrap();
        let other = JwtKeys::new("outro-segredo".to_string(), Duration::minutes(30), Duration::days(7));

        assert!(matches!(other.decode(&token, TokenType::Access), Err(AppError::InvalidToken)));
        assert!(matches!(keys().decode("nao.e.jwt", TokenType::Access), Err(AppError::InvalidToken)));
    }

    #[test]
    fn expired_tokens_are_rejected() {
        // Além da folga padrão de 60s da validação
        let keys = JwtKeys::new("segredo".to_string(), Duration::minutes(-5), Duration::days(7));
        let token = keys.issue(Uuid::new_v4(), TokenType::Access).unwrap();
        assert!(matches!(keys.decode(&token, TokenType::Access), Err(AppError::InvalidToken)));
    }

    #[tokio::test]
    async fn duplicate_signup_leaves_a_single_user() {
        use crate::test_support::{db_state, http_status, payload, unique_email};
        use serde_json::json;

        let Some(state) = db_state().await else { return };
        let email = unique_email("dup");
        let register: RegisterUserPayload =
            payload(json!({ "email": email, "password": "segredo123", "fullName": "Jeanne Martin" }));

        state.auth_service.register_user(&register).await.unwrap();
        let err = state.auth_service.register_user(&register).await.unwrap_err();
        assert!(matches!(err, AppError::EmailAlreadyExists));
        assert_eq!(http_status(&err, &state), 400);

        let users: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE email = $1")
            .bind(&email)
            .fetch_one(&state.db_pool)
            .await
            .unwrap();
        let profiles: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM profiles p JOIN users u ON u.id = p.user_id WHERE u.email = $1",
        )
        .bind(&email)
        .fetch_one(&state.db_pool)
        .await
        .unwrap();
        assert_eq!((users, profiles), (1, 1));
    }
}
