// src/handlers/relations.rs

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
    models::relation::{
        AvailableRelation, CreateRelationPayload, Relation, RelationFilter, UpdateRelationPayload,
    },
};

// GET /api/relations/
#[utoipa::path(
    get,
    path = "/api/relations/",
    tag = "Relations",
    params(RelationFilter),
    responses((status = 200, description = "Relações do comercial", body = Vec<Relation>)),
    security(("api_jwt" = []))
)]
pub async fn list_relations(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Query(filter): Query<RelationFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let relations = app_state
        .relation_service
        .list_relations(user.id, &filter)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(relations))
}

// POST /api/relations/
#[utoipa::path(
    post,
    path = "/api/relations/",
    tag = "Relations",
    request_body = CreateRelationPayload,
    responses(
        (status = 201, description = "Relação criada", body = Relation),
        (status = 400, description = "Lead alheio, oferta inativa ou relação duplicada")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_relation(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<CreateRelationPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let relation = app_state
        .relation_service
        .create_relation(user.id, &payload)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(relation)))
}

// GET /api/relations/available_relations/
// Também servido em /api/deals/available_relations/
#[utoipa::path(
    get,
    path = "/api/relations/available_relations/",
    tag = "Relations",
    responses((status = 200, description = "Relações ativas com resumo do lead e da oferta", body = Vec<AvailableRelation>)),
    security(("api_jwt" = []))
)]
pub async fn available_relations(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let relations = app_state
        .relation_service
        .available_relations(user.id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(relations))
}

// GET /api/relations/{id}/
#[utoipa::path(
    get,
    path = "/api/relations/{id}/",
    tag = "Relations",
    params(("id" = Uuid, Path, description = "ID da relação")),
    responses(
        (status = 200, description = "Relação", body = Relation),
        (status = 404, description = "Relação inexistente ou de outro comercial")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_relation(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let relation = app_state
        .relation_service
        .get_relation(user.id, id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(relation))
}

// PUT|PATCH /api/relations/{id}/
#[utoipa::path(
    patch,
    path = "/api/relations/{id}/",
    tag = "Relations",
    params(("id" = Uuid, Path, description = "ID da relação")),
    request_body = UpdateRelationPayload,
    responses(
        (status = 200, description = "Relação atualizada", body = Relation),
        (status = 400, description = "Dados inválidos"),
        (status = 404, description = "Relação inexistente ou de outro comercial")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_relation(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateRelationPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let relation = app_state
        .relation_service
        .update_relation(user.id, id, &payload)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(relation))
}

// DELETE /api/relations/{id}/
#[utoipa::path(
    delete,
    path = "/api/relations/{id}/",
    tag = "Relations",
    params(("id" = Uuid, Path, description = "ID da relação")),
    responses(
        (status = 204, description = "Relação apagada"),
        (status = 404, description = "Relação inexistente ou de outro comercial")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_relation(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .relation_service
        .delete_relation(user.id, id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}
