// src/services/action_service.rs

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::{field_error, AppError},
    db::{
        action_repo::{ActionCounts, NewAction},
        ActionRepository, LeadRepository,
    },
    models::action::{
        ActionDetail, ActionFilter, ActionStats, ActionStatus, CreateActionPayload, UpdateActionPayload,
    },
};

// =============================================================================
//  REGRAS DE STATUS
// =============================================================================

/// Transições dedicadas (concluir / cancelar). Repetir a mesma transição é
/// permitido e não mexe no `completed_at` já gravado.
pub fn transition(
    current: ActionStatus,
    target: ActionStatus,
    completed_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Result<Option<DateTime<Utc>>, AppError> {
    match (current, target) {
        (ActionStatus::Pending | ActionStatus::Done, ActionStatus::Done)
        | (ActionStatus::Pending | ActionStatus::Cancelled, ActionStatus::Cancelled) => {
            Ok(completed_at.or(Some(now)))
        }
        (from, to) => Err(AppError::InvalidTransition {
            from: from.as_str().to_string(),
            to: to.as_str().to_string(),
        }),
    }
}

// Status "done" gravado por create/update carimba a conclusão se faltar
pub fn stamp_completion(
    status: ActionStatus,
    completed_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    match (status, completed_at) {
        (ActionStatus::Done, None) => Some(now),
        (_, completed_at) => completed_at,
    }
}

pub fn completion_rate(done: i64, total: i64) -> f64 {
    if total <= 0 {
        return 0.0;
    }
    done as f64 / total as f64
}

impl From<ActionCounts> for ActionStats {
    fn from(c: ActionCounts) -> Self {
        ActionStats {
            completion_rate: completion_rate(c.done, c.total),
            total: c.total,
            done: c.done,
            pending: c.pending,
            cancelled: c.cancelled,
            overdue: c.overdue,
        }
    }
}

// =============================================================================
//  SERVIÇO
// =============================================================================

#[derive(Clone)]
pub struct ActionService {
    action_repo: ActionRepository,
    lead_repo: LeadRepository,
    pool: PgPool,
}

impl ActionService {
    pub fn new(action_repo: ActionRepository, lead_repo: LeadRepository, pool: PgPool) -> Self {
        Self { action_repo, lead_repo, pool }
    }

    pub async fn list_actions(&self, user_id: Uuid, filter: &ActionFilter) -> Result<Vec<ActionDetail>, AppError> {
        self.action_repo.list(user_id, filter).await
    }

    pub async fn due_today(&self, user_id: Uuid) -> Result<Vec<ActionDetail>, AppError> {
        self.action_repo.list_due_today(user_id).await
    }

    pub async fn overdue(&self, user_id: Uuid) -> Result<Vec<ActionDetail>, AppError> {
        self.action_repo.list_overdue(user_id).await
    }

    pub async fn upcoming(&self, user_id: Uuid) -> Result<Vec<ActionDetail>, AppError> {
        self.action_repo.list_upcoming(user_id).await
    }

    pub async fn stats(&self, user_id: Uuid) -> Result<ActionStats, AppError> {
        Ok(self.action_repo.counts(user_id).await?.into())
    }

    pub async fn get_action(&self, user_id: Uuid, id: Uuid) -> Result<ActionDetail, AppError> {
        self.action_repo
            .find_detail(&self.pool, user_id, id)
            .await?
            .ok_or(AppError::NotFound("action_not_found"))
    }

    pub async fn create_action(&self, user_id: Uuid, payload: &CreateActionPayload) -> Result<ActionDetail, AppError> {
        let (Some(lead_id), Some(action_type), Some(due_at)) =
            (payload.lead_id, payload.action_type, payload.due_at)
        else {
            return Err(field_error("lead_id", "required"));
        };

        let mut tx = self.pool.begin().await?;

        if !self.lead_repo.is_owned_by(&mut *tx, user_id, lead_id).await? {
            return Err(field_error("lead_id", "lead_not_owned"));
        }

        let status = payload.status.unwrap_or_default();
        let new_action = NewAction {
            lead_id,
            salesperson_id: user_id,
            action_type,
            due_at,
            title: &payload.title,
            notes: payload.notes.as_deref(),
            priority: payload.priority.unwrap_or_default(),
            status,
            completed_at: stamp_completion(status, None, Utc::now()),
        };
        let action = self.action_repo.create(&mut *tx, &new_action).await?;

        let detail = self.action_repo
            .find_detail(&mut *tx, user_id, action.id)
            .await?
            .ok_or(AppError::NotFound("action_not_found"))?;

        tx.commit().await?;

        tracing::info!("📌 Ação {} agendada para {} (lead {})", action.id, action.due_at, lead_id);
        Ok(detail)
    }

    pub async fn update_action(
        &self,
        user_id: Uuid,
        id: Uuid,
        payload: &UpdateActionPayload,
    ) -> Result<ActionDetail, AppError> {
        let mut tx = self.pool.begin().await?;

        let current = self.action_repo
            .lock_owned(&mut *tx, user_id, id)
            .await?
            .ok_or(AppError::NotFound("action_not_found"))?;

        if let Some(lead_id) = payload.lead_id {
            if !self.lead_repo.is_owned_by(&mut *tx, user_id, lead_id).await? {
                return Err(field_error("lead_id", "lead_not_owned"));
            }
        }

        let status = payload.status.unwrap_or(current.status);
        let completed_at = stamp_completion(status, current.completed_at, Utc::now());

        self.action_repo.update(&mut *tx, id, payload, completed_at).await?;

        let detail = self.action_repo
            .find_detail(&mut *tx, user_id, id)
            .await?
            .ok_or(AppError::NotFound("action_not_found"))?;

        tx.commit().await?;
        Ok(detail)
    }

    pub async fn delete_action(&self, user_id: Uuid, id: Uuid) -> Result<(), AppError> {
        if !self.action_repo.delete_owned(user_id, id).await? {
            return Err(AppError::NotFound("action_not_found"));
        }
        Ok(())
    }

    pub async fn mark_done(&self, user_id: Uuid, id: Uuid) -> Result<ActionDetail, AppError> {
        self.apply_transition(user_id, id, ActionStatus::Done).await
    }

    pub async fn mark_cancelled(&self, user_id: Uuid, id: Uuid) -> Result<ActionDetail, AppError> {
        self.apply_transition(user_id, id, ActionStatus::Cancelled).await
    }

    async fn apply_transition(&self, user_id: Uuid, id: Uuid, target: ActionStatus) -> Result<ActionDetail, AppError> {
        let mut tx = self.pool.begin().await?;

        let current = self.action_repo
            .lock_owned(&mut *tx, user_id, id)
            .await?
            .ok_or(AppError::NotFound("action_not_found"))?;

        let completed_at = transition(current.status, target, current.completed_at, Utc::now())?;
        self.action_repo.set_status(&mut *tx, id, target, completed_at).await?;

        let detail = self.action_repo
            .find_detail(&mut *tx, user_id, id)
            .await?
            .ok_or(AppError::NotFound("action_not_found"))?;

        tx.commit().await?;

        tracing::info!("Ação {}: {} -> {}", id, current.status.as_str(), target.as_str());
        Ok(detail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn completing_pending_action_stamps_now() {
        let now = Utc::now();
        let stamped = transition(ActionStatus::Pending, ActionStatus::Done, None, now).unwrap();
        assert_eq!(stamped, Some(now));
    }

    #[test]
    fn repeated_completion_keeps_original_timestamp() {
        let first = Utc::now() - Duration::hours(2);
        let stamped = transition(ActionStatus::Done, ActionStatus::Done, Some(first), Utc::now()).unwrap();
        assert_eq!(stamped, Some(first));
    }

    #[test]
    fn cancelling_is_idempotent_too() {
        let now = Utc::now();
        assert_eq!(transition(ActionStatus::Pending, ActionStatus::Cancelled, None, now).unwrap(), Some(now));
        let earlier = now - Duration::minutes(5);
        assert_eq!(
            transition(ActionStatus::Cancelled, ActionStatus::Cancelled, Some(earlier), now).unwrap(),
            Some(earlier)
        );
    }

    #[test]
    fn crossing_terminal_states_is_rejected() {
        let now = Utc::now();
        let err = transition(ActionStatus::Cancelled, ActionStatus::Done, None, now).unwrap_err();
        match err {
            AppError::InvalidTransition { from, to } => {
                assert_eq!(from, "cancelled");
                assert_eq!(to, "done");
            }
            other => panic!("erro inesperado: {:?}", other),
        }
        assert!(transition(ActionStatus::Done, ActionStatus::Cancelled, Some(now), now).is_err());
        assert!(transition(ActionStatus::Pending, ActionStatus::Pending, None, now).is_err());
    }

    #[test]
    fn writes_with_done_status_stamp_completion() {
        let now = Utc::now();
        let earlier = now - Duration::days(1);
        assert_eq!(stamp_completion(ActionStatus::Done, None, now), Some(now));
        assert_eq!(stamp_completion(ActionStatus::Done, Some(earlier), now), Some(earlier));
        assert_eq!(stamp_completion(ActionStatus::Pending, None, now), None);
    }

    #[test]
    fn completion_rate_is_a_ratio() {
        assert_eq!(completion_rate(0, 0), 0.0);
        assert_eq!(completion_rate(1, 4), 0.25);
        assert_eq!(completion_rate(3, 3), 1.0);
    }

    #[test]
    fn stats_carry_counts_and_rate() {
        let stats = ActionStats::from(ActionCounts { total: 10, done: 4, pending: 5, cancelled: 1, overdue: 2 });
        assert_eq!(stats.total, 10);
        assert_eq!(stats.overdue, 2);
        assert_eq!(stats.completion_rate, 0.4);
    }

    // Banco real (DATABASE_URL)

    use serde_json::json;

    use crate::test_support::{db_state, field_code, http_status, lead, offer, payload, signup};

    #[tokio::test]
    async fn actions_of_others_are_not_found() {
        let Some(state) = db_state().await else { return };
        let (alice, bob) = (signup(&state).await, signup(&state).await);
        let catalog = offer(&state, "one_shot").await;
        let (detail, _) = lead(&state, &alice, &catalog).await;
        let new_action = |lead_id: Uuid| {
            payload::<CreateActionPayload>(json!({
                "lead_id": lead_id,
                "action_type": "call",
                "due_at": Utc::now() + Duration::days(1),
                "title": "Rappeler",
            }))
        };
        let action = state.action_service.create_action(alice.id, &new_action(detail.lead.id)).await.unwrap();
        let id = action.action.id;

        let err = state.action_service.get_action(bob.id, id).await.unwrap_err();
        assert_eq!(http_status(&err, &state), 404);
        assert!(matches!(state.action_service.mark_done(bob.id, id).await, Err(AppError::NotFound(_))));
        assert!(matches!(state.action_service.delete_action(bob.id, id).await, Err(AppError::NotFound(_))));

        // Agendar no lead alheio é erro de campo
        let err = state.action_service.create_action(bob.id, &new_action(detail.lead.id)).await.unwrap_err();
        assert_eq!(field_code(&err, "lead_id").as_deref(), Some("lead_not_owned"));

        let kept = state.action_service.get_action(alice.id, id).await.unwrap();
        assert_eq!(kept.action.title, "Rappeler");
    }
}
