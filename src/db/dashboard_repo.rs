// src/db/dashboard_repo.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{common::error::AppError, models::dashboard::DashboardStats};

#[derive(Clone)]
pub struct DashboardRepository {
    pool: PgPool,
}

impl DashboardRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // Uma única consulta: os três números saem do mesmo snapshot
    pub async fn get_stats(&self, user_id: Uuid) -> Result<DashboardStats, AppError> {
        let stats = sqlx::query_as::<_, DashboardStats>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM leads WHERE created_by = $1) AS total_leads,
                (SELECT COUNT(*) FROM deals d
                   JOIN relations r ON r.id = d.relation_id
                  WHERE r.salesperson_id = $1
                    AND d.stage IN ('prospection', 'negociation')) AS active_deals,
                (SELECT COUNT(*) FROM deals d
                   JOIN relations r ON r.id = d.relation_id
                  WHERE r.salesperson_id = $1
                    AND d.stage = 'gagne') AS won_deals
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(stats)
    }
}
