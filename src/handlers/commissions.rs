// src/handlers/commissions.rs

use axum::{
    extract::{Path, Query, State},
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
    models::commission::{Commission, CommissionFilter, CreateCommissionPayload, UpdateCommissionPayload},
};

// GET /api/commissions/
#[utoipa::path(
    get,
    path = "/api/commissions/",
    tag = "Commissions",
    params(CommissionFilter),
    responses((status = 200, description = "Comissões do comercial", body = Vec<Commission>)),
    security(("api_jwt" = []))
)]
pub async fn list_commissions(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Query(filter): Query<CommissionFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let commissions = app_state
        .commission_service
        .list_commissions(user.id, &filter)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(commissions))
}

// POST /api/commissions/
#[utoipa::path(
    post,
    path = "/api/commissions/",
    tag = "Commissions",
    request_body = CreateCommissionPayload,
    responses(
        (status = 201, description = "Comissão registrada", body = Commission),
        (status = 400, description = "Dados inválidos ou negócio alheio")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_commission(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<CreateCommissionPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let commission = app_state
        .commission_service
        .create_commission(user.id, &payload)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(commission)))
}

// GET /api/commissions/{id}/
#[utoipa::path(
    get,
    path = "/api/commissions/{id}/",
    tag = "Commissions",
    params(("id" = Uuid, Path, description = "ID da comissão")),
    responses(
        (status = 200, description = "Comissão", body = Commission),
        (status = 404, description = "Comissão inexistente ou de outro comercial")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_commission(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let commission = app_state
        .commission_service
        .get_commission(user.id, id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(commission))
}

// PUT|PATCH /api/commissions/{id}/
#[utoipa::path(
    patch,
    path = "/api/commissions/{id}/",
    tag = "Commissions",
    params(("id" = Uuid, Path, description = "ID da comissão")),
    request_body = UpdateCommissionPayload,
    responses(
        (status = 200, description = "Comissão atualizada", body = Commission),
        (status = 400, description = "Dados inválidos"),
        (status = 404, description = "Comissão inexistente ou de outro comercial")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_commission(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCommissionPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let commission = app_state
        .commission_service
        .update_commission(user.id, id, &payload)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(commission))
}

// DELETE /api/commissions/{id}/
#[utoipa::path(
    delete,
    path = "/api/commissions/{id}/",
    tag = "Commissions",
    params(("id" = Uuid, Path, description = "ID da comissão")),
    responses(
        (status = 204, description = "Comissão apagada"),
        (status = 404, description = "Comissão inexistente ou de outro comercial")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_commission(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .commission_service
        .delete_commission(user.id, id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}
