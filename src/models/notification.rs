use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single notification owned by one user.
///
/// Lifecycle: created `pending` (deferred) or `sent` (immediate), promoted
/// `pending` → `sent` by the delivery sweep once `scheduled_for` is due,
/// then `sent` → `read` by user acknowledgment. Dismissal is allowed from
/// any state and is terminal. `sent_at` and `read_at` are stamped exactly
/// once, at the corresponding transition.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub scheduled_for: Option<DateTime<Utc>>,
    pub priority: Priority,
    pub status: NotificationStatus,
    pub created_at: DateTime<Utc>,
    pub sent_at: Option<DateTime<Utc>>,
    pub read_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "varchar", rename_all = "lowercase")]
pub enum NotificationKind {
    Reminder,
    Alert,
    Motivation,
    Instruction,
}

/// Informational only. Delivery order is governed by `scheduled_for`,
/// never by priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "varchar", rename_all = "lowercase")]
pub enum Priority {
    Low,
    Normal,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "varchar", rename_all = "lowercase")]
pub enum NotificationStatus {
    Pending,
    Sent,
    Read,
    Dismissed,
}

impl NotificationStatus {
    /// Whether the state machine permits moving from `self` to `next`.
    ///
    /// Forward-only: `pending` → `sent` → `read`, with `dismissed` reachable
    /// from anywhere. Re-entering the current terminal state is not a
    /// transition; idempotent no-ops are handled by the callers.
    pub fn can_transition_to(self, next: NotificationStatus) -> bool {
        use NotificationStatus::*;
        matches!(
            (self, next),
            (Pending, Sent) | (Sent, Read) | (Pending, Dismissed) | (Sent, Dismissed) | (Read, Dismissed)
        )
    }

    /// Terminal states are never revisited by the delivery sweep.
    pub fn is_terminal(self) -> bool {
        matches!(self, NotificationStatus::Read | NotificationStatus::Dismissed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            NotificationStatus::Pending => "pending",
            NotificationStatus::Sent => "sent",
            NotificationStatus::Read => "read",
            NotificationStatus::Dismissed => "dismissed",
        }
    }
}

impl Notification {
    /// Timestamp invariants: `sent_at` is present iff the record is (or has
    /// been) sent; `read_at` is present iff it has been read. Dismissal
    /// freezes whatever was stamped before it.
    pub fn timestamps_consistent(&self) -> bool {
        use NotificationStatus::*;
        match self.status {
            Pending => self.sent_at.is_none() && self.read_at.is_none(),
            Sent => self.sent_at.is_some() && self.read_at.is_none(),
            Read => self.sent_at.is_some() && self.read_at.is_some(),
            Dismissed => self.read_at.is_none() || self.sent_at.is_some(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use NotificationStatus::*;

    #[test]
    fn test_forward_transitions_allowed() {
        assert!(Pending.can_transition_to(Sent));
        assert!(Sent.can_transition_to(Read));
        assert!(Pending.can_transition_to(Dismissed));
        assert!(Sent.can_transition_to(Dismissed));
        assert!(Read.can_transition_to(Dismissed));
    }

    #[test]
    fn test_backward_transitions_rejected() {
        assert!(!Read.can_transition_to(Sent));
        assert!(!Sent.can_transition_to(Pending));
        assert!(!Read.can_transition_to(Pending));
        assert!(!Dismissed.can_transition_to(Pending));
        assert!(!Dismissed.can_transition_to(Sent));
        assert!(!Dismissed.can_transition_to(Read));
    }

    #[test]
    fn test_pending_cannot_skip_to_read() {
        // The stricter rule: a record must be delivered before it can be
        // acknowledged.
        assert!(!Pending.can_transition_to(Read));
    }

    #[test]
    fn test_terminal_states() {
        assert!(Read.is_terminal());
        assert!(Dismissed.is_terminal());
        assert!(!Pending.is_terminal());
        assert!(!Sent.is_terminal());
    }

    #[test]
    fn test_status_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Pending).unwrap(), "\"pending\"");
        assert_eq!(serde_json::to_string(&Dismissed).unwrap(), "\"dismissed\"");
        assert_eq!(
            serde_json::to_string(&NotificationKind::Motivation).unwrap(),
            "\"motivation\""
        );
    }
}
