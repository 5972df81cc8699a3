// src/handlers/actions.rs

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
    models::action::{
        ActionDetail, ActionFilter, ActionStats, CreateActionPayload, UpdateActionPayload,
    },
};

// GET /api/actions/
#[utoipa::path(
    get,
    path = "/api/actions/",
    tag = "Actions",
    params(ActionFilter),
    responses((status = 200, description = "Ações do comercial por data de vencimento", body = Vec<ActionDetail>)),
    security(("api_jwt" = []))
)]
pub async fn list_actions(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Query(filter): Query<ActionFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let actions = app_state
        .action_service
        .list_actions(user.id, &filter)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(actions))
}

// POST /api/actions/
#[utoipa::path(
    post,
    path = "/api/actions/",
    tag = "Actions",
    request_body = CreateActionPayload,
    responses(
        (status = 201, description = "Ação criada", body = ActionDetail),
        (status = 400, description = "Dados inválidos ou lead alheio")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_action(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<CreateActionPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let action = app_state
        .action_service
        .create_action(user.id, &payload)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(action)))
}

// GET /api/actions/{id}/
#[utoipa::path(
    get,
    path = "/api/actions/{id}/",
    tag = "Actions",
    params(("id" = Uuid, Path, description = "ID da ação")),
    responses(
        (status = 200, description = "Ação", body = ActionDetail),
        (status = 404, description = "Ação inexistente ou de outro comercial")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_action(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let action = app_state
        .action_service
        .get_action(user.id, id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(action))
}

// PUT|PATCH /api/actions/{id}/
#[utoipa::path(
    patch,
    path = "/api/actions/{id}/",
    tag = "Actions",
    params(("id" = Uuid, Path, description = "ID da ação")),
    request_body = UpdateActionPayload,
    responses(
        (status = 200, description = "Ação atualizada", body = ActionDetail),
        (status = 400, description = "Dados inválidos"),
        (status = 404, description = "Ação inexistente ou de outro comercial")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_action(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateActionPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let action = app_state
        .action_service
        .update_action(user.id, id, &payload)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(action))
}

// DELETE /api/actions/{id}/
#[utoipa::path(
    delete,
    path = "/api/actions/{id}/",
    tag = "Actions",
    params(("id" = Uuid, Path, description = "ID da ação")),
    responses(
        (status = 204, description = "Ação apagada"),
        (status = 404, description = "Ação inexistente ou de outro comercial")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_action(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .action_service
        .delete_action(user.id, id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// POST /api/actions/{id}/marquer_terminee/
#[utoipa::path(
    post,
    path = "/api/actions/{id}/marquer_terminee/",
    tag = "Actions",
    params(("id" = Uuid, Path, description = "ID da ação")),
    responses(
        (status = 200, description = "Ação concluída", body = ActionDetail),
        (status = 400, description = "Ação cancelada não pode ser concluída"),
        (status = 404, description = "Ação inexistente ou de outro comercial")
    ),
    security(("api_jwt" = []))
)]
pub async fn mark_done(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let action = app_state
        .action_service
        .mark_done(user.id, id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(action))
}

// POST /api/actions/{id}/marquer_annulee/
#[utoipa::path(
    post,
    path = "/api/actions/{id}/marquer_annulee/",
    tag = "Actions",
    params(("id" = Uuid, Path, description = "ID da ação")),
    responses(
        (status = 200, description = "Ação cancelada", body = ActionDetail),
        (status = 400, description = "Ação concluída não pode ser cancelada"),
        (status = 404, description = "Ação inexistente ou de outro comercial")
    ),
    security(("api_jwt" = []))
)]
pub async fn mark_cancelled(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let action = app_state
        .action_service
        .mark_cancelled(user.id, id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(action))
}

// GET /api/actions/actions_du_jour/
#[utoipa::path(
    get,
    path = "/api/actions/actions_du_jour/",
    tag = "Actions",
    responses((status = 200, description = "Pendentes com vencimento hoje", body = Vec<ActionDetail>)),
    security(("api_jwt" = []))
)]
pub async fn due_today(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let actions = app_state
        .action_service
        .due_today(user.id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(actions))
}

// GET /api/actions/actions_en_retard/
#[utoipa::path(
    get,
    path = "/api/actions/actions_en_retard/",
    tag = "Actions",
    responses((status = 200, description = "Pendentes já vencidas", body = Vec<ActionDetail>)),
    security(("api_jwt" = []))
)]
pub async fn overdue(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let actions = app_state
        .action_service
        .overdue(user.id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(actions))
}

// GET /api/actions/actions_a_venir/
#[utoipa::path(
    get,
    path = "/api/actions/actions_a_venir/",
    tag = "Actions",
    responses((status = 200, description = "Pendentes por data de vencimento", body = Vec<ActionDetail>)),
    security(("api_jwt" = []))
)]
pub async fn upcoming(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let actions = app_state
        .action_service
        .upcoming(user.id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(actions))
}

// GET /api/actions/statistiques/
#[utoipa::path(
    get,
    path = "/api/actions/statistiques/",
    tag = "Actions",
    responses((status = 200, description = "Contagens por status e taxa de conclusão", body = ActionStats)),
    security(("api_jwt" = []))
)]
pub async fn stats(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let stats = app_state
        .action_service
        .stats(user.id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(stats))
}
