pub mod auth;
pub mod lead_service;
pub mod offer_service;
pub mod relation_service;
pub mod deal_service;
pub mod invoice_service;
pub mod action_service;
pub mod commission_service;
pub mod dashboard_service;
