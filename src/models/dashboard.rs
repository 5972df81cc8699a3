// src/models/dashboard.rs

use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;

// Os cards do topo do painel
#[derive(Debug, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_leads: i64,  // Leads declarados pelo comercial
    pub active_deals: i64, // Em prospecção ou negociação
    pub won_deals: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_camel_case_keys() {
        let stats = DashboardStats { total_leads: 4, active_deals: 2, won_deals: 1 };
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json, serde_json::json!({"totalLeads": 4, "activeDeals": 2, "wonDeals": 1}));
    }
}
