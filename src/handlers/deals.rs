// src/handlers/deals.rs

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
        deal::{
            AvailableLead, CreateDealPayload, CreateInvoiceFromDealsPayload, DealDetail, DealFilter,
            UpdateDealPayload,
        },
        invoice::InvoiceDetail,
        relation::AvailableRelation,
    },
};

// GET /api/deals/
#[utoipa::path(
    get,
    path = "/api/deals/",
    tag = "Deals",
    params(DealFilter),
    responses((status = 200, description = "Negócios das relações do comercial", body = Vec<DealDetail>)),
    security(("api_jwt" = []))
)]
pub async fn list_deals(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Query(filter): Query<DealFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let deals = app_state
        .deal_service
        .list_deals(user.id, &filter)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(deals))
}

// POST /api/deals/
#[utoipa::path(
    post,
    path = "/api/deals/",
    tag = "Deals",
    request_body = CreateDealPayload,
    responses(
        (status = 201, description = "Negócio criado com tipo e taxa derivados", body = DealDetail),
        (status = 400, description = "Dados inválidos ou relação alheia")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_deal(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<CreateDealPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let deal = app_state
        .deal_service
        .create_deal(user.id, &payload)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(deal)))
}

// GET /api/deals/{id}/
#[utoipa::path(
    get,
    path = "/api/deals/{id}/",
    tag = "Deals",
    params(("id" = Uuid, Path, description = "ID do negócio")),
    responses(
        (status = 200, description = "Negócio", body = DealDetail),
        (status = 404, description = "Negócio inexistente ou de outro comercial")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_deal(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let deal = app_state
        .deal_service
        .get_deal(user.id, id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(deal))
}

// PUT|PATCH /api/deals/{id}/
#[utoipa::path(
    patch,
    path = "/api/deals/{id}/",
    tag = "Deals",
    params(("id" = Uuid, Path, description = "ID do negócio")),
    request_body = UpdateDealPayload,
    responses(
        (status = 200, description = "Negócio atualizado", body = DealDetail),
        (status = 400, description = "Dados inválidos"),
        (status = 404, description = "Negócio inexistente ou de outro comercial")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_deal(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateDealPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let deal = app_state
        .deal_service
        .update_deal(user.id, id, &payload)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(deal))
}

// DELETE /api/deals/{id}/
#[utoipa::path(
    delete,
    path = "/api/deals/{id}/",
    tag = "Deals",
    params(("id" = Uuid, Path, description = "ID do negócio")),
    responses(
        (status = 204, description = "Negócio apagado"),
        (status = 404, description = "Negócio inexistente ou de outro comercial")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_deal(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .deal_service
        .delete_deal(user.id, id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// GET /api/deals/commissions/
#[utoipa::path(
    get,
    path = "/api/deals/commissions/",
    tag = "Deals",
    responses((status = 200, description = "Negócios ganhos ainda sem fatura", body = Vec<DealDetail>)),
    security(("api_jwt" = []))
)]
pub async fn commissionable_deals(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let deals = app_state
        .deal_service
        .commissionable_deals(user.id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(deals))
}

// GET /api/deals/available_leads/
#[utoipa::path(
    get,
    path = "/api/deals/available_leads/",
    tag = "Deals",
    responses((status = 200, description = "Leads com relação ativa do comercial", body = Vec<AvailableLead>)),
    security(("api_jwt" = []))
)]
pub async fn available_leads(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let leads = app_state
        .deal_service
        .available_leads(user.id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(leads))
}

// GET /api/deals/available_relations/
#[utoipa::path(
    get,
    path = "/api/deals/available_relations/",
    tag = "Deals",
    responses((status = 200, description = "Relações ativas do comercial", body = Vec<AvailableRelation>)),
    security(("api_jwt" = []))
)]
pub async fn available_relations(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let relations = app_state
        .deal_service
        .available_relations(user.id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(relations))
}

// POST /api/deals/create_facture_from_deals/
#[utoipa::path(
    post,
    path = "/api/deals/create_facture_from_deals/",
    tag = "Deals",
    request_body = CreateInvoiceFromDealsPayload,
    responses(
        (status = 201, description = "Fatura gerada e anexada aos negócios", body = InvoiceDetail),
        (status = 400, description = "Negócio alheio, não ganho ou já faturado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_invoice_from_deals(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<CreateInvoiceFromDealsPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let invoice = app_state
        .invoice_service
        .create_from_deals(user.id, &payload.deal_ids)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(invoice)))
}
