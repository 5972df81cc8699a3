// src/models/action.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::common::validation::validate_not_blank;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "action_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    Call,
    Email,
    Meeting,
    Other,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "action_priority", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ActionPriority {
    Low,
    #[default]
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "action_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ActionStatus {
    #[default]
    Pending,
    Done,
    Cancelled,
}

impl ActionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionStatus::Pending => "pending",
            ActionStatus::Done => "done",
            ActionStatus::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct Action {
    pub id: Uuid,
    pub lead_id: Uuid,
    pub salesperson_id: Uuid,
    pub action_type: ActionType,
    pub due_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub title: String,
    pub notes: Option<String>,
    pub priority: ActionPriority,
    pub status: ActionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Ação com os nomes do lead e do comercial
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct ActionDetail {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub action: Action,
    pub lead_company: String,
    pub lead_contact: String,
    pub salesperson_name: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ActionStats {
    pub total: i64,
    pub done: i64,
    pub pending: i64,
    pub cancelled: i64,
    pub overdue: i64,
    /// done / total (0 quando não há ações)
    pub completion_rate: f64,
}

// =============================================================================
//  PAYLOADS
// =============================================================================

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateActionPayload {
    #[validate(required(message = "required"))]
    #[serde(alias = "lead")]
    pub lead_id: Option<Uuid>,

    #[validate(required(message = "required"))]
    pub action_type: Option<ActionType>,

    #[validate(required(message = "required"))]
    pub due_at: Option<DateTime<Utc>>,

    #[serde(default)]
    #[validate(length(max = 255), custom(function = "validate_not_blank"))]
    #[schema(example = "Rappeler le client")]
    pub title: String,

    pub notes: Option<String>,
    pub priority: Option<ActionPriority>,
    pub status: Option<ActionStatus>,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateActionPayload {
    #[serde(alias = "lead")]
    pub lead_id: Option<Uuid>,
    pub action_type: Option<ActionType>,
    pub due_at: Option<DateTime<Utc>>,
    #[validate(length(max = 255), custom(function = "validate_not_blank"))]
    pub title: Option<String>,
    pub notes: Option<String>,
    pub priority: Option<ActionPriority>,
    pub status: Option<ActionStatus>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ActionFilter {
    pub action_type: Option<ActionType>,
    pub status: Option<ActionStatus>,
    pub priority: Option<ActionPriority>,
    pub lead_id: Option<Uuid>,
    /// Busca em título, notas e empresa do lead
    pub search: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_requires_lead_type_and_due_date() {
        let p: CreateActionPayload = serde_json::from_str(r#"{"title":"Appel"}"#).unwrap();
        let errors = p.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("lead_id"));
        assert!(fields.contains_key("action_type"));
        assert!(fields.contains_key("due_at"));
    }

    #[test]
    fn parses_wire_enums() {
        let p: UpdateActionPayload =
            serde_json::from_str(r#"{"action_type":"meeting","priority":"high","status":"done"}"#).unwrap();
        assert_eq!(p.action_type, Some(ActionType::Meeting));
        assert_eq!(p.priority, Some(ActionPriority::High));
        assert_eq!(p.status, Some(ActionStatus::Done));
    }
}
