// src/handlers/invoices.rs

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::invoice::{CreateInvoicePayload, InvoiceDetail, InvoiceFilter, UpdateInvoicePayload},
};

// Nomes aceitos para o campo do arquivo no multipart
const FILE_FIELDS: &[&str] = &["fichier", "file"];

// Só documenta o corpo multipart no OpenAPI
#[allow(dead_code)]
#[derive(ToSchema)]
pub struct InvoiceUpload {
    #[schema(value_type = String, format = Binary)]
    pub fichier: Vec<u8>,
}

// GET /api/factures/
#[utoipa::path(
    get,
    path = "/api/factures/",
    tag = "Invoices",
    params(InvoiceFilter),
    responses((status = 200, description = "Faturas do comercial com os negócios anexados", body = Vec<InvoiceDetail>)),
    security(("api_jwt" = []))
)]
pub async fn list_invoices(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Query(filter): Query<InvoiceFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let invoices = app_state
        .invoice_service
        .list_invoices(user.id, &filter)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(invoices))
}

// POST /api/factures/
#[utoipa::path(
    post,
    path = "/api/factures/",
    tag = "Invoices",
    request_body = CreateInvoicePayload,
    responses(
        (status = 201, description = "Fatura criada", body = InvoiceDetail),
        (status = 400, description = "Dados inválidos ou número repetido")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_invoice(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<CreateInvoicePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let invoice = app_state
        .invoice_service
        .create_invoice(user.id, &payload)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(invoice)))
}

// GET /api/factures/{id}/
#[utoipa::path(
    get,
    path = "/api/factures/{id}/",
    tag = "Invoices",
    params(("id" = Uuid, Path, description = "ID da fatura")),
    responses(
        (status = 200, description = "Fatura", body = InvoiceDetail),
        (status = 404, description = "Fatura inexistente ou de outro comercial")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_invoice(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let invoice = app_state
        .invoice_service
        .get_invoice(user.id, id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(invoice))
}

// PUT|PATCH /api/factures/{id}/
#[utoipa::path(
    patch,
    path = "/api/factures/{id}/",
    tag = "Invoices",
    params(("id" = Uuid, Path, description = "ID da fatura")),
    request_body = UpdateInvoicePayload,
    responses(
        (status = 200, description = "Fatura atualizada", body = InvoiceDetail),
        (status = 400, description = "Dados inválidos"),
        (status = 404, description = "Fatura inexistente ou de outro comercial")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_invoice(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateInvoicePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let invoice = app_state
        .invoice_service
        .update_invoice(user.id, id, &payload)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(invoice))
}

// DELETE /api/factures/{id}/
#[utoipa::path(
    delete,
    path = "/api/factures/{id}/",
    tag = "Invoices",
    params(("id" = Uuid, Path, description = "ID da fatura")),
    responses(
        (status = 204, description = "Fatura apagada; os negócios voltam a ficar sem fatura"),
        (status = 404, description = "Fatura inexistente ou de outro comercial")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_invoice(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .invoice_service
        .delete_invoice(user.id, id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// Lê o primeiro campo de arquivo aceito: (nome original, bytes)
async fn read_file_field(multipart: &mut Multipart) -> Result<(String, Vec<u8>), AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidUpload(format!("multipart inválido: {}", e)))?
    {
        let is_file = field.name().is_some_and(|name| FILE_FIELDS.contains(&name));
        if !is_file {
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::InvalidUpload(format!("falha ao ler o arquivo: {}", e)))?;
        return Ok((file_name, data.to_vec()));
    }

    Err(AppError::InvalidUpload("campo 'fichier' ausente".to_string()))
}

// POST /api/factures/{id}/upload_file/
#[utoipa::path(
    post,
    path = "/api/factures/{id}/upload_file/",
    tag = "Invoices",
    params(("id" = Uuid, Path, description = "ID da fatura")),
    request_body(content = InvoiceUpload, content_type = "multipart/form-data", description = "Campo `fichier` (ou `file`) com o documento"),
    responses(
        (status = 200, description = "Arquivo anexado", body = InvoiceDetail),
        (status = 400, description = "Upload inválido"),
        (status = 404, description = "Fatura inexistente ou de outro comercial")
    ),
    security(("api_jwt" = []))
)]
pub async fn upload_invoice_file(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let (file_name, data) = read_file_field(&mut multipart)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let invoice = app_state
        .invoice_service
        .upload_file(user.id, id, &file_name, &data)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(invoice))
}
