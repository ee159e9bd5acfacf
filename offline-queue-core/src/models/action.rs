use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

use super::category::ActionCategory;

/// Lifecycle state of a queued action.
///
/// ```text
/// pending ──> in_flight ──> completed
///    ^            │
///    └────────────┤
///                 └──────> failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionStatus {
    Pending,
    InFlight,
    Completed,
    Failed,
}

impl ActionStatus {
    /// Returns true for `completed` and `failed`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ActionStatus::Completed | ActionStatus::Failed)
    }

    /// Returns true if the state machine permits moving from `self` to `next`.
    pub fn can_transition_to(&self, next: ActionStatus) -> bool {
        matches!(
            (self, next),
            (ActionStatus::Pending, ActionStatus::InFlight)
                | (ActionStatus::InFlight, ActionStatus::Pending)
                | (ActionStatus::InFlight, ActionStatus::Completed)
                | (ActionStatus::InFlight, ActionStatus::Failed)
        )
    }
}

impl fmt::Display for ActionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionStatus::Pending => write!(f, "pending"),
            ActionStatus::InFlight => write!(f, "in_flight"),
            ActionStatus::Completed => write!(f, "completed"),
            ActionStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Attempted a transition the state machine does not allow.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid transition for action {id}: {from} -> {to}")]
pub struct InvalidTransition {
    pub id: Uuid,
    pub from: ActionStatus,
    pub to: ActionStatus,
}

/// A unit of user work awaiting delivery to the remote endpoint.
///
/// The payload is opaque to the queue; it is carried through to the
/// transport untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueuedAction {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub category: ActionCategory,
    pub payload: serde_json::Value,
    /// Milliseconds since the Unix epoch.
    pub created_at: i64,
    pub retry_count: u32,
    pub status: ActionStatus,
}

impl QueuedAction {
    pub fn new(category: ActionCategory, payload: serde_json::Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            category,
            payload,
            created_at: Utc::now().timestamp_millis(),
            retry_count: 0,
            status: ActionStatus::Pending,
        }
    }

    /// Moves the action to `to`, rejecting transitions out of terminal
    /// states and any edge not in the lifecycle graph.
    pub fn transition(&mut self, to: ActionStatus) -> Result<(), InvalidTransition> {
        if !self.status.can_transition_to(to) {
            return Err(InvalidTransition {
                id: self.id,
                from: self.status,
                to,
            });
        }
        self.status = to;
        Ok(())
    }

    /// Counts a failed attempt. Only valid while `in_flight`; the caller
    /// decides whether the action goes back to `pending` or to `failed`.
    ///
    /// Returns the new retry count.
    pub fn record_failure(&mut self) -> Result<u32, InvalidTransition> {
        if self.status != ActionStatus::InFlight {
            return Err(InvalidTransition {
                id: self.id,
                from: self.status,
                to: ActionStatus::Pending,
            });
        }
        self.retry_count = self.retry_count.saturating_add(1);
        Ok(self.retry_count)
    }

    /// Resets an action loaded from durable storage so it can be dispatched
    /// again. An attempt interrupted by a crash is treated as never sent.
    pub fn into_restored(mut self) -> Self {
        if self.status == ActionStatus::InFlight {
            self.status = ActionStatus::Pending;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_action_defaults() {
        let action = QueuedAction::new(ActionCategory::Small, json!({ "n": 1 }));

        assert_eq!(action.category, ActionCategory::Small);
        assert_eq!(action.retry_count, 0);
        assert_eq!(action.status, ActionStatus::Pending);
        assert!(action.created_at > 0);
        assert_eq!(action.payload["n"], 1);
    }

    #[test]
    fn test_ids_are_unique() {
        let a = QueuedAction::new(ActionCategory::Small, json!(null));
        let b = QueuedAction::new(ActionCategory::Small, json!(null));
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_happy_path_transitions() {
        let mut action = QueuedAction::new(ActionCategory::Large, json!(null));
        action.transition(ActionStatus::InFlight).unwrap();
        action.transition(ActionStatus::Completed).unwrap();
        assert!(action.status.is_terminal());
    }

    #[test]
    fn test_retry_cycle() {
        let mut action = QueuedAction::new(ActionCategory::Small, json!(null));
        action.transition(ActionStatus::InFlight).unwrap();
        assert_eq!(action.record_failure().unwrap(), 1);
        action.transition(ActionStatus::Pending).unwrap();
        action.transition(ActionStatus::InFlight).unwrap();
        assert_eq!(action.record_failure().unwrap(), 2);
        action.transition(ActionStatus::Failed).unwrap();
        assert_eq!(action.retry_count, 2);
    }

    #[test]
    fn test_no_regression_from_terminal() {
        let mut action = QueuedAction::new(ActionCategory::Small, json!(null));
        action.transition(ActionStatus::InFlight).unwrap();
        action.transition(ActionStatus::Completed).unwrap();

        let err = action.transition(ActionStatus::Pending).unwrap_err();
        assert_eq!(err.from, ActionStatus::Completed);
        assert_eq!(err.to, ActionStatus::Pending);
        assert_eq!(action.status, ActionStatus::Completed);
    }

    #[test]
    fn test_pending_cannot_complete_directly() {
        let mut action = QueuedAction::new(ActionCategory::Small, json!(null));
        assert!(action.transition(ActionStatus::Completed).is_err());
        assert!(action.record_failure().is_err());
        assert_eq!(action.retry_count, 0);
    }

    #[test]
    fn test_into_restored_resets_in_flight() {
        let mut action = QueuedAction::new(ActionCategory::Large, json!(null));
        action.transition(ActionStatus::InFlight).unwrap();
        action.record_failure().unwrap();

        let restored = action.into_restored();
        assert_eq!(restored.status, ActionStatus::Pending);
        assert_eq!(restored.retry_count, 1);
    }

    #[test]
    fn test_json_uses_wire_field_names() {
        let action = QueuedAction::new(ActionCategory::Small, json!({ "k": "v" }));
        let value = serde_json::to_value(&action).unwrap();

        assert_eq!(value["type"], "small");
        assert_eq!(value["retryCount"], 0);
        assert_eq!(value["status"], "pending");
        assert!(value.get("createdAt").is_some());

        let parsed: QueuedAction = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, action);
    }
}
