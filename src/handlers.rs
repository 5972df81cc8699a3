pub mod auth;
pub mod leads;
pub mod offers;
pub mod relations;
pub mod deals;
pub mod invoices;
pub mod actions;
pub mod commissions;
pub mod dashboard;
