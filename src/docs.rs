// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::signup,
        handlers::auth::login,
        handlers::auth::refresh_token,

        // --- Users ---
        handlers::auth::get_profile,
        handlers::auth::get_current_user,
        handlers::auth::get_current_user_by_id,
        handlers::auth::update_current_user,

        // --- Leads ---
        handlers::leads::list_leads,
        handlers::leads::create_lead,
        handlers::leads::get_lead,
        handlers::leads::update_lead,
        handlers::leads::delete_lead,
        handlers::leads::available_offers,

        // --- Offers ---
        handlers::offers::list_offers,
        handlers::offers::create_offer,
        handlers::offers::get_offer,
        handlers::offers::update_offer,
        handlers::offers::delete_offer,

        // --- Relations ---
        handlers::relations::list_relations,
        handlers::relations::create_relation,
        handlers::relations::available_relations,
        handlers::relations::get_relation,
        handlers::relations::update_relation,
        handlers::relations::delete_relation,

        // --- Deals ---
        handlers::deals::list_deals,
        handlers::deals::create_deal,
        handlers::deals::get_deal,
        handlers::deals::update_deal,
        handlers::deals::delete_deal,
        handlers::deals::commissionable_deals,
        handlers::deals::available_leads,
        handlers::deals::available_relations,
        handlers::deals::create_invoice_from_deals,

        // --- Invoices ---
        handlers::invoices::list_invoices,
        handlers::invoices::create_invoice,
        handlers::invoices::get_invoice,
        handlers::invoices::update_invoice,
        handlers::invoices::delete_invoice,
        handlers::invoices::upload_invoice_file,

        // --- Actions ---
        handlers::actions::list_actions,
        handlers::actions::create_action,
        handlers::actions::get_action,
        handlers::actions::update_action,
        handlers::actions::delete_action,
        handlers::actions::mark_done,
        handlers::actions::mark_cancelled,
        handlers::actions::due_today,
        handlers::actions::overdue,
        handlers::actions::upcoming,
        handlers::actions::stats,

        // --- Commissions ---
        handlers::commissions::list_commissions,
        handlers::commissions::create_commission,
        handlers::commissions::get_commission,
        handlers::commissions::update_commission,
        handlers::commissions::delete_commission,

        // --- Dashboard ---
        handlers::dashboard::get_stats,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::User,
            models::auth::RegisterUserPayload,
            models::auth::LoginUserPayload,
            models::auth::RefreshTokenPayload,
            models::auth::TokenPair,
            models::auth::AccessTokenResponse,
            models::auth::ProfileSummary,
            models::auth::CurrentUser,
            models::auth::UpdateCurrentUserPayload,

            // --- Leads ---
            models::lead::LeadStatus,
            models::lead::Lead,
            models::lead::LeadOfferDetails,
            models::lead::LeadDetail,
            models::lead::CreateLeadPayload,
            models::lead::UpdateLeadPayload,

            // --- Offers ---
            models::offer::CommissionPlan,
            models::offer::Offer,
            models::offer::CreateOfferPayload,
            models::offer::UpdateOfferPayload,

            // --- Relations ---
            models::relation::RelationStatus,
            models::relation::Relation,
            models::relation::AvailableRelation,
            models::relation::CreateRelationPayload,
            models::relation::UpdateRelationPayload,

            // --- Deals ---
            models::deal::DealType,
            models::deal::DealStage,
            models::deal::Deal,
            models::deal::DealDetail,
            models::deal::AvailableLead,
            models::deal::CreateDealPayload,
            models::deal::UpdateDealPayload,
            models::deal::CreateInvoiceFromDealsPayload,

            // --- Invoices ---
            models::invoice::PaymentStatus,
            models::invoice::Invoice,
            models::invoice::InvoiceDetail,
            models::invoice::CreateInvoicePayload,
            models::invoice::UpdateInvoicePayload,
            handlers::invoices::InvoiceUpload,

            // --- Actions ---
            models::action::ActionType,
            models::action::ActionPriority,
            models::action::ActionStatus,
            models::action::Action,
            models::action::ActionDetail,
            models::action::ActionStats,
            models::action::CreateActionPayload,
            models::action::UpdateActionPayload,

            // --- Commissions ---
            models::commission::CommissionStatus,
            models::commission::Commission,
            models::commission::CreateCommissionPayload,
            models::commission::UpdateCommissionPayload,

            // --- Dashboard ---
            models::dashboard::DashboardStats,
        )
    ),
    tags(
        (name = "Auth", description = "Cadastro, login e renovação de tokens"),
        (name = "Users", description = "Perfil do usuário logado"),
        (name = "Leads", description = "Prospects declarados pelo comercial"),
        (name = "Offers", description = "Catálogo de ofertas e planos de comissão"),
        (name = "Relations", description = "Vínculos lead / comercial / oferta"),
        (name = "Deals", description = "Pipeline de negócios e faturamento em lote"),
        (name = "Invoices", description = "Faturas e arquivos anexados"),
        (name = "Actions", description = "Agenda de ações de acompanhamento"),
        (name = "Commissions", description = "Comissões do comercial"),
        (name = "Dashboard", description = "Indicadores do comercial")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}
