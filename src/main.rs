// src/main.rs

use anyhow::Context;
use axum::{
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{get, post},
    Json, Router,
};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;

mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod middleware;
mod models;
mod services;
#[cfg(test)]
mod test_support;

use crate::config::{AppConfig, AppState};
use crate::docs::ApiDoc;
use crate::middleware::auth::auth_guard;
use crate::services::invoice_service::MAX_UPLOAD_BYTES;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // RUST_LOG manda; sem ele, "info"
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    let config = AppConfig::from_env()?;
    let app_state = AppState::new(&config).await?;

    sqlx::migrate!()
        .run(&app_state.db_pool)
        .await
        .context("Falha ao rodar as migrações do banco de dados")?;

    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    let app = build_router(app_state);

    let listener = TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Falha ao iniciar o listener TCP em {}", config.bind_addr))?;
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr()?);

    axum::serve(listener, app).await.context("Erro no servidor Axum")?;
    Ok(())
}

pub fn build_router(app_state: AppState) -> Router {
    // Rotas públicas: cadastro, login e renovação do token
    let auth_routes = Router::new()
        .route("/signup/", post(handlers::auth::signup))
        .route("/login/", post(handlers::auth::login))
        .route("/token/refresh/", post(handlers::auth::refresh_token));

    let user_routes = Router::new()
        .route("/profile/", get(handlers::auth::get_profile))
        .route("/current-user/", get(handlers::auth::get_current_user))
        .route(
            "/current-user/{id}/",
            get(handlers::auth::get_current_user_by_id)
                .put(handlers::auth::update_current_user)
                .patch(handlers::auth::update_current_user),
        )
        .route("/dashboard-stats/", get(handlers::dashboard::get_stats));

    let lead_routes = Router::new()
        .route("/leads/", get(handlers::leads::list_leads).post(handlers::leads::create_lead))
        .route("/leads/available-offres/", get(handlers::leads::available_offers))
        .route(
            "/leads/{id}/",
            get(handlers::leads::get_lead)
                .put(handlers::leads::update_lead)
                .patch(handlers::leads::update_lead)
                .delete(handlers::leads::delete_lead),
        );

    let offer_routes = Router::new()
        .route("/offres/", get(handlers::offers::list_offers).post(handlers::offers::create_offer))
        .route(
            "/offres/{id}/",
            get(handlers::offers::get_offer)
                .put(handlers::offers::update_offer)
                .patch(handlers::offers::update_offer)
                .delete(handlers::offers::delete_offer),
        );

    let relation_routes = Router::new()
        .route(
            "/relations/",
            get(handlers::relations::list_relations).post(handlers::relations::create_relation),
        )
        .route("/relations/available_relations/", get(handlers::relations::available_relations))
        .route(
            "/relations/{id}/",
            get(handlers::relations::get_relation)
                .put(handlers::relations::update_relation)
                .patch(handlers::relations::update_relation)
                .delete(handlers::relations::delete_relation),
        );

    let deal_routes = Router::new()
        .route("/deals/", get(handlers::deals::list_deals).post(handlers::deals::create_deal))
        .route("/deals/commissions/", get(handlers::deals::commissionable_deals))
        .route("/deals/available_leads/", get(handlers::deals::available_leads))
        .route("/deals/available_relations/", get(handlers::deals::available_relations))
        .route("/deals/create_facture_from_deals/", post(handlers::deals::create_invoice_from_deals))
        .route(
            "/deals/{id}/",
            get(handlers::deals::get_deal)
                .put(handlers::deals::update_deal)
                .patch(handlers::deals::update_deal)
                .delete(handlers::deals::delete_deal),
        );

    let invoice_routes = Router::new()
        .route(
            "/factures/",
            get(handlers::invoices::list_invoices).post(handlers::invoices::create_invoice),
        )
        .route(
            "/factures/{id}/",
            get(handlers::invoices::get_invoice)
                .put(handlers::invoices::update_invoice)
                .patch(handlers::invoices::update_invoice)
                .delete(handlers::invoices::delete_invoice),
        )
        .route(
            "/factures/{id}/upload_file/",
            post(handlers::invoices::upload_invoice_file)
                // Folga para os cabeçalhos do multipart
                .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES + 64 * 1024)),
        );

    let action_routes = Router::new()
        .route("/actions/", get(handlers::actions::list_actions).post(handlers::actions::create_action))
        .route("/actions/actions_du_jour/", get(handlers::actions::due_today))
        .route("/actions/actions_en_retard/", get(handlers::actions::overdue))
        .route("/actions/actions_a_venir/", get(handlers::actions::upcoming))
        .route("/actions/statistiques/", get(handlers::actions::stats))
        .route(
            "/actions/{id}/",
            get(handlers::actions::get_action)
                .put(handlers::actions::update_action)
                .patch(handlers::actions::update_action)
                .delete(handlers::actions::delete_action),
        )
        .route("/actions/{id}/marquer_terminee/", post(handlers::actions::mark_done))
        .route("/actions/{id}/marquer_annulee/", post(handlers::actions::mark_cancelled));

    let commission_routes = Router::new()
        .route(
            "/commissions/",
            get(handlers::commissions::list_commissions).post(handlers::commissions::create_commission),
        )
        .route(
            "/commissions/{id}/",
            get(handlers::commissions::get_commission)
                .put(handlers::commissions::update_commission)
                .patch(handlers::commissions::update_commission)
                .delete(handlers::commissions::delete_commission),
        );

    // Tudo abaixo exige um access token válido
    let protected_routes = Router::new()
        .merge(user_routes)
        .merge(lead_routes)
        .merge(offer_routes)
        .merge(relation_routes)
        .merge(deal_routes)
        .merge(invoice_routes)
        .merge(action_routes)
        .merge(commission_routes)
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    let api_routes = Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/docs/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .merge(auth_routes)
        .merge(protected_routes);

    Router::new()
        .nest("/api", api_routes)
        .with_state(app_state)
}

#[cfg(test)]
mod tests {
    use super::*;

    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
    };
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;
    use uuid::Uuid;

    use crate::models::auth::TokenType;
    use crate::test_support::test_config;

    // Pool preguiçoso: nenhuma conexão é aberta enquanto a rota não tocar no banco
    fn test_app() -> Router {
        let config = test_config();
        let pool = PgPoolOptions::new()
            .max_connections(1)
            .connect_lazy(&config.database_url)
            .expect("url válida");
        build_router(AppState::from_parts(pool, &config))
    }

    #[tokio::test]
    async fn health_is_public() {
        let response = test_app()
            .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn missing_token_is_unauthorized() {
        let response = test_app()
            .oneshot(Request::get("/api/leads/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn garbage_token_is_unauthorized_and_localized() {
        let response = test_app()
            .oneshot(
                Request::get("/api/deals/")
                    .header(header::AUTHORIZATION, "Bearer nao-e-um-jwt")
                    .header(header::ACCEPT_LANGUAGE, "fr-FR")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "Jeton d'authentification absent ou invalide.");
    }

    #[tokio::test]
    async fn refresh_token_cannot_authenticate_requests() {
        let refresh = test_config()
            .jwt_keys()
            .issue(Uuid::new_v4(), TokenType::Refresh)
            .unwrap();

        let response = test_app()
            .oneshot(
                Request::get("/api/actions/statistiques/")
                    .header(header::AUTHORIZATION, format!("Bearer {}", refresh))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn access_token_is_rejected_by_refresh_endpoint() {
        let access = test_config()
            .jwt_keys()
            .issue(Uuid::new_v4(), TokenType::Access)
            .unwrap();

        let response = test_app()
            .oneshot(
                Request::post("/api/token/refresh/")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(serde_json::json!({ "refresh": access }).to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn signup_without_credentials_is_a_validation_error() {
        let response = test_app()
            .oneshot(
                Request::post("/api/signup/")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from("{}"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert!(json["details"]["email"].is_array());
        assert!(json["details"]["password"].is_array());
    }

    #[tokio::test]
    async fn openapi_document_lists_the_crm_routes() {
        let response = test_app()
            .oneshot(Request::get("/api/docs/openapi.json").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert!(json["paths"]["/api/leads/"].is_object());
        assert!(json["paths"]["/api/deals/create_facture_from_deals/"].is_object());
    }
}
