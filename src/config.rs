// src/config.rs

use std::{env, path::PathBuf, str::FromStr, time::Duration};

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    common::i18n::I18nStore,
    db::{
        ActionRepository, CommissionRepository, DashboardRepository, DealRepository, InvoiceRepository,
        LeadRepository, OfferRepository, RelationRepository, UserRepository,
    },
    services::{
        action_service::ActionService,
        auth::{AuthService, JwtKeys},
        commission_service::CommissionService,
        dashboard_service::DashboardService,
        deal_service::DealService,
        invoice_service::InvoiceService,
        lead_service::LeadService,
        offer_service::OfferService,
        relation_service::RelationService,
    },
};

// Configuração lida do ambiente (.env opcional)
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt_secret: String,
    pub bind_addr: String,
    pub db_max_connections: u32,
    pub access_token_minutes: i64,
    pub refresh_token_days: i64,
    pub media_root: PathBuf,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL deve ser definida")?,
            jwt_secret: env::var("JWT_SECRET").context("JWT_SECRET deve ser definido")?,
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            db_max_connections: parse_or("DB_MAX_CONNECTIONS", 5)?,
            access_token_minutes: parse_or("ACCESS_TOKEN_MINUTES", 30)?,
            refresh_token_days: parse_or("REFRESH_TOKEN_DAYS", 7)?,
            media_root: env::var("MEDIA_ROOT")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./media")),
        })
    }

    pub fn jwt_keys(&self) -> JwtKeys {
        JwtKeys::new(
            self.jwt_secret.clone(),
            chrono::Duration::minutes(self.access_token_minutes),
            chrono::Duration::days(self.refresh_token_days),
        )
    }
}

// Variável ausente usa o padrão; presente e inválida é erro de boot
fn parse_or<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} inválida: {}", key, raw)),
        Err(_) => Ok(default),
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub i18n_store: I18nStore,
    pub auth_service: AuthService,
    pub lead_service: LeadService,
    pub offer_service: OfferService,
    pub relation_service: RelationService,
    pub deal_service: DealService,
    pub invoice_service: InvoiceService,
    pub action_service: ActionService,
    pub commission_service: CommissionService,
    pub dashboard_service: DashboardService,
}

impl AppState {
    pub async fn new(config: &AppConfig) -> anyhow::Result<Self> {
        let db_pool = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&config.database_url)
            .await
            .context("Falha ao conectar no banco de dados")?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        Ok(Self::from_parts(db_pool, config))
    }

    // Monta o gráfico de dependências sobre um pool já criado
    pub fn from_parts(db_pool: PgPool, config: &AppConfig) -> Self {
        let user_repo = UserRepository::new(db_pool.clone());
        let lead_repo = LeadRepository::new(db_pool.clone());
        let offer_repo = OfferRepository::new(db_pool.clone());
        let relation_repo = RelationRepository::new(db_pool.clone());
        let deal_repo = DealRepository::new(db_pool.clone());
        let invoice_repo = InvoiceRepository::new(db_pool.clone());
        let action_repo = ActionRepository::new(db_pool.clone());
        let commission_repo = CommissionRepository::new(db_pool.clone());
        let dashboard_repo = DashboardRepository::new(db_pool.clone());

        Self {
            i18n_store: I18nStore::load(),
            auth_service: AuthService::new(user_repo, config.jwt_keys(), db_pool.clone()),
            lead_service: LeadService::new(
                lead_repo.clone(),
                offer_repo.clone(),
                relation_repo.clone(),
                db_pool.clone(),
            ),
            offer_service: OfferService::new(offer_repo.clone(), db_pool.clone()),
            relation_service: RelationService::new(
                relation_repo.clone(),
                lead_repo.clone(),
                offer_repo.clone(),
                db_pool.clone(),
            ),
            deal_service: DealService::new(
                deal_repo.clone(),
                relation_repo,
                offer_repo,
                lead_repo.clone(),
                db_pool.clone(),
            ),
            invoice_service: InvoiceService::new(
                invoice_repo,
                deal_repo.clone(),
                db_pool.clone(),
                config.media_root.clone(),
            ),
            action_service: ActionService::new(action_repo, lead_repo, db_pool.clone()),
            commission_service: CommissionService::new(commission_repo, deal_repo, db_pool.clone()),
            dashboard_service: DashboardService::new(dashboard_repo),
            db_pool,
        }
    }
}
