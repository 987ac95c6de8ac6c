//! Integration tests for the notification lifecycle.
//!
//! These tests verify:
//! 1. Timestamp invariants across every lifecycle state
//! 2. Delivery sweep semantics (due filtering, ordering, idempotence) against
//!    an in-memory model that mirrors the store's status-guarded update
//! 3. Bulk acknowledgment scoping (sent-only, pending untouched)
//! 4. Recurring reminder expansion under a fixed clock
//!
//! The live store enforces the same rules with a single conditional UPDATE;
//! these tests pin the contract without requiring PostgreSQL.

use chrono::{DateTime, Duration, TimeZone, Utc};
use uuid::Uuid;

use healthd::models::notification::{
    Notification, NotificationKind, NotificationStatus, Priority,
};
use healthd::scheduling;

fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

fn notification(status: NotificationStatus, scheduled_for: Option<DateTime<Utc>>) -> Notification {
    let now = fixed_now();
    Notification {
        id: Uuid::new_v4(),
        user_id: Uuid::new_v4(),
        kind: NotificationKind::Reminder,
        title: "Medication Reminder: Metformin".to_string(),
        message: "Time to take your Metformin (500mg)".to_string(),
        scheduled_for,
        priority: Priority::High,
        status,
        created_at: now,
        sent_at: match status {
            NotificationStatus::Sent | NotificationStatus::Read => Some(now),
            _ => None,
        },
        read_at: match status {
            NotificationStatus::Read => Some(now),
            _ => None,
        },
    }
}

/// In-memory mirror of the store's sweep: transition due pending records to
/// sent, stamp `sent_at`, return them earliest due first. The status check
/// is the same guard the SQL carries in its WHERE clause.
fn sweep(notifications: &mut [Notification], now: DateTime<Utc>) -> Vec<Uuid> {
    let mut transitioned: Vec<(DateTime<Utc>, Uuid)> = Vec::new();
    for n in notifications.iter_mut() {
        let due = matches!(n.scheduled_for, Some(at) if at <= now);
        if n.status == NotificationStatus::Pending
            && due
            && n.status.can_transition_to(NotificationStatus::Sent)
        {
            n.status = NotificationStatus::Sent;
            n.sent_at = Some(now);
            transitioned.push((n.scheduled_for.unwrap(), n.id));
        }
    }
    transitioned.sort();
    transitioned.into_iter().map(|(_, id)| id).collect()
}

mod timestamp_invariants {
    use super::*;

    #[test]
    fn test_every_state_has_consistent_timestamps() {
        for status in [
            NotificationStatus::Pending,
            NotificationStatus::Sent,
            NotificationStatus::Read,
            NotificationStatus::Dismissed,
        ] {
            let n = notification(status, None);
            assert!(
                n.timestamps_consistent(),
                "inconsistent timestamps for {:?}",
                status
            );
        }
    }

    #[test]
    fn test_sent_without_sent_at_is_inconsistent() {
        let mut n = notification(NotificationStatus::Sent, None);
        n.sent_at = None;
        assert!(!n.timestamps_consistent());
    }

    #[test]
    fn test_read_requires_both_timestamps() {
        let mut n = notification(NotificationStatus::Read, None);
        n.sent_at = None;
        assert!(!n.timestamps_consistent());

        let mut n = notification(NotificationStatus::Read, None);
        n.read_at = None;
        assert!(!n.timestamps_consistent());
    }

    #[test]
    fn test_pending_must_have_no_delivery_timestamps() {
        let mut n = notification(NotificationStatus::Pending, Some(fixed_now()));
        assert!(n.timestamps_consistent());
        n.sent_at = Some(fixed_now());
        assert!(!n.timestamps_consistent());
    }
}

mod delivery_sweep {
    use super::*;

    #[test]
    fn test_sweep_promotes_only_due_pending_records() {
        let now = fixed_now();
        let mut records = vec![
            notification(NotificationStatus::Pending, Some(now - Duration::hours(2))),
            notification(NotificationStatus::Pending, Some(now + Duration::hours(2))),
            notification(NotificationStatus::Sent, Some(now - Duration::hours(5))),
            notification(NotificationStatus::Pending, None),
        ];

        let transitioned = sweep(&mut records, now);

        assert_eq!(transitioned.len(), 1);
        assert_eq!(transitioned[0], records[0].id);
        assert_eq!(records[0].status, NotificationStatus::Sent);
        assert_eq!(records[0].sent_at, Some(now));
        // Not yet due, and unscheduled records are never swept.
        assert_eq!(records[1].status, NotificationStatus::Pending);
        assert_eq!(records[3].status, NotificationStatus::Pending);
        assert!(records[1].sent_at.is_none());
    }

    #[test]
    fn test_second_sweep_transitions_nothing() {
        let now = fixed_now();
        let mut records = vec![
            notification(NotificationStatus::Pending, Some(now - Duration::hours(1))),
            notification(NotificationStatus::Pending, Some(now - Duration::minutes(5))),
        ];

        assert_eq!(sweep(&mut records, now).len(), 2);
        assert_eq!(sweep(&mut records, now).len(), 0);
    }

    #[test]
    fn test_sweep_returns_records_earliest_due_first() {
        let now = fixed_now();
        let early = notification(NotificationStatus::Pending, Some(now - Duration::hours(3)));
        let late = notification(NotificationStatus::Pending, Some(now - Duration::hours(1)));
        let middle = notification(NotificationStatus::Pending, Some(now - Duration::hours(2)));
        let (early_id, middle_id, late_id) = (early.id, middle.id, late.id);

        // Insertion order deliberately scrambled.
        let mut records = vec![late, early, middle];
        let transitioned = sweep(&mut records, now);

        assert_eq!(transitioned, vec![early_id, middle_id, late_id]);
    }

    #[test]
    fn test_terminal_states_are_never_revisited() {
        let now = fixed_now();
        let read = notification(NotificationStatus::Read, Some(now - Duration::hours(1)));
        let dismissed =
            notification(NotificationStatus::Dismissed, Some(now - Duration::hours(1)));
        assert!(read.status.is_terminal());
        assert!(dismissed.status.is_terminal());

        let mut records = vec![read.clone(), dismissed.clone()];
        assert!(sweep(&mut records, now).is_empty());

        // And the state machine itself refuses the backward moves.
        assert!(!read.status.can_transition_to(NotificationStatus::Sent));
        assert!(!dismissed.status.can_transition_to(NotificationStatus::Sent));
    }
}

mod acknowledgment {
    use super::*;

    #[test]
    fn test_mark_all_read_touches_only_sent_records() {
        let now = fixed_now();
        let mut records = vec![
            notification(NotificationStatus::Sent, None),
            notification(NotificationStatus::Sent, None),
            notification(NotificationStatus::Sent, None),
            notification(NotificationStatus::Pending, Some(now + Duration::hours(1))),
            notification(NotificationStatus::Pending, Some(now + Duration::hours(2))),
        ];

        // Mirror of the store's bulk update: sent-only, count reported.
        let mut marked = 0;
        for n in records.iter_mut() {
            if n.status == NotificationStatus::Sent {
                n.status = NotificationStatus::Read;
                n.read_at = Some(now);
                marked += 1;
            }
        }

        assert_eq!(marked, 3);
        assert_eq!(
            records
                .iter()
                .filter(|n| n.status == NotificationStatus::Pending)
                .count(),
            2
        );
        for n in &records {
            assert!(n.timestamps_consistent());
        }
    }
}

mod recurring_expansion {
    use super::*;

    #[test]
    fn test_fixed_clock_expansion_matches_contract() {
        let times = scheduling::parse_times(&["08:00".to_string(), "20:00".to_string()]).unwrap();
        let occurrences =
            scheduling::expand_occurrences(&times, fixed_now(), scheduling::DEFAULT_WINDOW_DAYS);

        assert_eq!(occurrences.len(), 62);
        assert_eq!(
            occurrences.first().unwrap(),
            &Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap()
        );
        assert_eq!(
            occurrences.last().unwrap(),
            &Utc.with_ymd_and_hms(2024, 1, 31, 20, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_malformed_time_creates_nothing() {
        let raw = vec!["08:00".to_string(), "25:99".to_string()];
        let result = scheduling::parse_times(&raw);
        assert!(result.is_err());
        // Validation failed, so expansion is never reached and no records
        // exist to persist.
    }
}
