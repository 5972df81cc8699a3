pub mod user_repo;
pub use user_repo::UserRepository;
pub mod lead_repo;
pub use lead_repo::LeadRepository;
pub mod offer_repo;
pub use offer_repo::OfferRepository;
pub mod relation_repo;
pub use relation_repo::RelationRepository;
pub mod deal_repo;
pub use deal_repo::DealRepository;
pub mod invoice_repo;
pub use invoice_repo::InvoiceRepository;
pub mod action_repo;
pub use action_repo::ActionRepository;
pub mod commission_repo;
pub use commission_repo::CommissionRepository;
pub mod dashboard_repo;
pub use dashboard_repo::DashboardRepository;
