// src/handlers/offers.rs

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
    models::offer::{CreateOfferPayload, Offer, OfferFilter, UpdateOfferPayload},
};

// GET /api/offres/
#[utoipa::path(
    get,
    path = "/api/offres/",
    tag = "Offers",
    params(OfferFilter),
    responses((status = 200, description = "Catálogo de ofertas", body = Vec<Offer>)),
    security(("api_jwt" = []))
)]
pub async fn list_offers(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
    Query(filter): Query<OfferFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let offers = app_state
        .offer_service
        .list_offers(&filter)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(offers))
}

// POST /api/offres/
#[utoipa::path(
    post,
    path = "/api/offres/",
    tag = "Offers",
    request_body = CreateOfferPayload,
    responses(
        (status = 201, description = "Oferta criada", body = Offer),
        (status = 400, description = "Dados inválidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_offer(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
    Json(payload): Json<CreateOfferPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let offer = app_state
        .offer_service
        .create_offer(&payload)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(offer)))
}

// GET /api/offres/{id}/
#[utoipa::path(
    get,
    path = "/api/offres/{id}/",
    tag = "Offers",
    params(("id" = Uuid, Path, description = "ID da oferta")),
    responses(
        (status = 200, description = "Oferta", body = Offer),
        (status = 404, description = "Oferta inexistente")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_offer(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let offer = app_state
        .offer_service
        .get_offer(id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(offer))
}

// PUT|PATCH /api/offres/{id}/
#[utoipa::path(
    patch,
    path = "/api/offres/{id}/",
    tag = "Offers",
    params(("id" = Uuid, Path, description = "ID da oferta")),
    request_body = UpdateOfferPayload,
    responses(
        (status = 200, description = "Oferta atualizada", body = Offer),
        (status = 400, description = "Dados inválidos"),
        (status = 404, description = "Oferta inexistente")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_offer(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateOfferPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let offer = app_state
        .offer_service
        .update_offer(id, &payload)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(offer))
}

// DELETE /api/offres/{id}/
#[utoipa::path(
    delete,
    path = "/api/offres/{id}/",
    tag = "Offers",
    params(("id" = Uuid, Path, description = "ID da oferta")),
    responses(
        (status = 204, description = "Oferta apagada"),
        (status = 404, description = "Oferta inexistente")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_offer(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .offer_service
        .delete_offer(id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}
