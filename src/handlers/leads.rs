// src/handlers/leads.rs

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
    models::{
        lead::{CreateLeadPayload, LeadDetail, LeadFilter, UpdateLeadPayload},
        offer::Offer,
    },
};

// GET /api/leads/
#[utoipa::path(
    get,
    path = "/api/leads/",
    tag = "Leads",
    params(LeadFilter),
    responses(
        (status = 200, description = "Leads do comercial, mais recentes primeiro", body = Vec<LeadDetail>),
        (status = 401, description = "Não autorizado")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_leads(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Query(filter): Query<LeadFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let leads = app_state
        .lead_service
        .list_leads(user.id, &filter)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(leads))
}

// POST /api/leads/
#[utoipa::path(
    post,
    path = "/api/leads/",
    tag = "Leads",
    request_body = CreateLeadPayload,
    responses(
        (status = 201, description = "Lead criado junto com a sua relação", body = LeadDetail),
        (status = 400, description = "Dados inválidos, e-mail repetido ou oferta inativa")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_lead(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<CreateLeadPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let (lead, _relation) = app_state
        .lead_service
        .create_lead_with_relation(user.id, &payload)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(lead)))
}

// GET /api/leads/{id}/
#[utoipa::path(
    get,
    path = "/api/leads/{id}/",
    tag = "Leads",
    params(("id" = Uuid, Path, description = "ID do lead")),
    responses(
        (status = 200, description = "Lead", body = LeadDetail),
        (status = 404, description = "Lead inexistente ou de outro comercial")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_lead(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let lead = app_state
        .lead_service
        .get_lead(user.id, id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(lead))
}

// PUT|PATCH /api/leads/{id}/
#[utoipa::path(
    patch,
    path = "/api/leads/{id}/",
    tag = "Leads",
    params(("id" = Uuid, Path, description = "ID do lead")),
    request_body = UpdateLeadPayload,
    responses(
        (status = 200, description = "Lead atualizado", body = LeadDetail),
        (status = 400, description = "Dados inválidos"),
        (status = 404, description = "Lead inexistente ou de outro comercial")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_lead(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateLeadPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let lead = app_state
        .lead_service
        .update_lead(user.id, id, &payload)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(lead))
}

// DELETE /api/leads/{id}/
#[utoipa::path(
    delete,
    path = "/api/leads/{id}/",
    tag = "Leads",
    params(("id" = Uuid, Path, description = "ID do lead")),
    responses(
        (status = 204, description = "Lead apagado"),
        (status = 404, description = "Lead inexistente ou de outro comercial")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_lead(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .lead_service
        .delete_lead(user.id, id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// GET /api/leads/available-offres/
#[utoipa::path(
    get,
    path = "/api/leads/available-offres/",
    tag = "Leads",
    responses(
        (status = 200, description = "Ofertas ativas que podem ser escolhidas", body = Vec<Offer>)
    ),
    security(("api_jwt" = []))
)]
pub async fn available_offers(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let offers = app_state
        .lead_service
        .available_offers()
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(offers))
}
