// src/handlers/auth.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::auth::{
        AccessTokenResponse, CurrentUser, LoginUserPayload, ProfileSummary, RefreshTokenPayload,
        RegisterUserPayload, TokenPair, UpdateCurrentUserPayload,
    },
};

// POST /api/signup/
#[utoipa::path(
    post,
    path = "/api/signup/",
    tag = "Auth",
    request_body = RegisterUserPayload,
    responses(
        (status = 201, description = "Conta criada; devolve o par de tokens", body = TokenPair),
        (status = 400, description = "Dados inválidos ou e-mail já cadastrado")
    )
)]
pub async fn signup(
    State(app_state): State<AppState>,
    locale: Locale,
    Json(payload): Json<RegisterUserPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let tokens = app_state
        .auth_service
        .register_user(&payload)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(tokens)))
}

// POST /api/login/
#[utoipa::path(
    post,
    path = "/api/login/",
    tag = "Auth",
    request_body = LoginUserPayload,
    responses(
        (status = 200, description = "Login efetuado", body = TokenPair),
        (status = 401, description = "Credenciais inválidas")
    )
)]
pub async fn login(
    State(app_state): State<AppState>,
    locale: Locale,
    Json(payload): Json<LoginUserPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let tokens = app_state
        .auth_service
        .login_user(payload.email.trim(), &payload.password)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(tokens))
}

// POST /api/token/refresh/
#[utoipa::path(
    post,
    path = "/api/token/refresh/",
    tag = "Auth",
    request_body = RefreshTokenPayload,
    responses(
        (status = 200, description = "Novo access token", body = AccessTokenResponse),
        (status = 401, description = "Refresh token inválido ou expirado")
    )
)]
pub async fn refresh_token(
    State(app_state): State<AppState>,
    locale: Locale,
    Json(payload): Json<RefreshTokenPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let access = app_state
        .auth_service
        .refresh(&payload.refresh)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(AccessTokenResponse { access }))
}

// GET /api/profile/
#[utoipa::path(
    get,
    path = "/api/profile/",
    tag = "Users",
    responses(
        (status = 200, description = "Resumo do perfil", body = ProfileSummary),
        (status = 401, description = "Não autorizado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_profile(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let summary = app_state
        .auth_service
        .profile_summary(&user)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(summary))
}

// GET /api/current-user/
#[utoipa::path(
    get,
    path = "/api/current-user/",
    tag = "Users",
    responses(
        (status = 200, description = "Dados do usuário logado", body = CurrentUser),
        (status = 401, description = "Não autorizado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_current_user(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let current = app_state
        .auth_service
        .current_user(&user)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(current))
}

// Só o próprio id é visível; qualquer outro é 404
fn ensure_self(user_id: Uuid, id: Uuid) -> Result<(), AppError> {
    if user_id != id {
        return Err(AppError::NotFound("user_not_found"));
    }
    Ok(())
}

// GET /api/current-user/{id}/
#[utoipa::path(
    get,
    path = "/api/current-user/{id}/",
    tag = "Users",
    params(("id" = Uuid, Path, description = "ID do usuário (o próprio)")),
    responses(
        (status = 200, description = "Dados do usuário logado", body = CurrentUser),
        (status = 404, description = "Outro usuário")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_current_user_by_id(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    ensure_self(user.id, id).map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let current = app_state
        .auth_service
        .current_user(&user)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(current))
}

// PUT|PATCH /api/current-user/{id}/
#[utoipa::path(
    patch,
    path = "/api/current-user/{id}/",
    tag = "Users",
    params(("id" = Uuid, Path, description = "ID do usuário (o próprio)")),
    request_body = UpdateCurrentUserPayload,
    responses(
        (status = 200, description = "Usuário atualizado", body = CurrentUser),
        (status = 400, description = "Dados inválidos"),
        (status = 404, description = "Outro usuário")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_current_user(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCurrentUserPayload>,
) -> Result<impl IntoResponse, ApiError> {
    ensure_self(user.id, id).map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let updated = app_state
        .auth_service
        .update_current_user(&user, &payload)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(updated))
}
