pub mod action;
pub mod auth;
pub mod commission;
pub mod dashboard;
pub mod deal;
pub mod invoice;
pub mod lead;
pub mod offer;
pub mod relation;
