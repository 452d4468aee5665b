//! Activity lifecycle engine.
//!
//! Pure functions over the activity model: derived state, time-driven
//! flag recomputation, field-type-aware edit diffing and deletion
//! eligibility. Every function takes `now` as an argument, so the whole
//! module is deterministic and directly unit-testable.

use chrono::{DateTime, Duration, FixedOffset, Utc};
use gather_db::entities::{activity, activity_participant};
use serde::Serialize;

/// Days a cancelled activity must age before it may be deleted while
/// other participants remain on the roster.
pub const CANCELLED_DELETE_AFTER_DAYS: i64 = 7;

/// Conceptual lifecycle state, derived from the three boolean flags.
///
/// Exactly one state holds at a time; `Cancelled` wins over the other
/// flags because cancellation clears them on entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    /// Voting still open, nothing locked.
    Active,
    /// Schedule and location locked, event still ahead.
    Finalized,
    /// Terminal unless the activity is deleted.
    Cancelled,
    /// Finalized and the event date has passed.
    Completed,
}

/// Derive the conceptual state from an activity's flags.
#[must_use]
pub fn state_of(activity: &activity::Model) -> LifecycleState {
    if activity.is_cancelled {
        LifecycleState::Cancelled
    } else if activity.is_completed {
        LifecycleState::Completed
    } else if activity.is_finalized {
        LifecycleState::Finalized
    } else {
        LifecycleState::Active
    }
}

/// What [`recompute`] did to the model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecomputeOutcome {
    /// Any flag changed; the caller must persist the model.
    pub changed: bool,
    /// The activity was auto-cancelled; the caller must force every
    /// participant to `not_participating` with empty availability.
    pub participants_reset: bool,
}

/// Apply the time-driven lifecycle transitions to `activity`.
///
/// Idempotent: a second call with the same `now` reports no change.
/// Cancelled activities are left untouched.
pub fn recompute(activity: &mut activity::Model, now: DateTime<Utc>) -> RecomputeOutcome {
    let mut outcome = RecomputeOutcome::default();

    if activity.is_cancelled {
        return outcome;
    }

    // No voting period means there is nothing to wait for.
    if activity.voting_date.is_none() && !activity.is_finalized {
        activity.is_finalized = true;
        outcome.changed = true;
    }

    let event_passed = activity.event_date.with_timezone(&Utc) < now;

    // The event date arrived without the vote concluding.
    if !activity.is_finalized && event_passed {
        activity.is_cancelled = true;
        activity.is_completed = false;
        activity.cancelled_at = Some(now.into());
        outcome.changed = true;
        outcome.participants_reset = true;
        return outcome;
    }

    if activity.is_finalized && !activity.is_completed && event_passed {
        activity.is_completed = true;
        outcome.changed = true;
    }

    outcome
}

/// Trimmed string comparison used by the edit diff.
#[must_use]
pub fn text_differs(current: &str, proposed: &str) -> bool {
    current.trim() != proposed.trim()
}

/// Order-independent comparison of string lists. Duplicates and length
/// still matter, only ordering is ignored.
#[must_use]
pub fn list_differs(current: &[String], proposed: &[String]) -> bool {
    if current.len() != proposed.len() {
        return true;
    }
    let mut a: Vec<&str> = current.iter().map(String::as_str).collect();
    let mut b: Vec<&str> = proposed.iter().map(String::as_str).collect();
    a.sort_unstable();
    b.sort_unstable();
    a != b
}

/// Instant-based comparison of optional timestamps, normalized to UTC
/// so offset differences do not count as a change.
#[must_use]
pub fn date_differs(
    current: Option<&DateTime<FixedOffset>>,
    proposed: Option<&DateTime<Utc>>,
) -> bool {
    match (current, proposed) {
        (None, None) => false,
        (Some(c), Some(p)) => c.with_timezone(&Utc) != *p,
        _ => true,
    }
}

/// True when nobody other than the creator is on the roster.
#[must_use]
pub fn is_sole_creator_roster(
    participants: &[activity_participant::Model],
    created_by: &str,
) -> bool {
    participants.iter().all(|p| p.user_id == created_by)
}

/// Deletion eligibility: the creator is the only participant, or the
/// activity has been cancelled for at least
/// [`CANCELLED_DELETE_AFTER_DAYS`] days.
#[must_use]
pub fn deletion_allowed(
    activity: &activity::Model,
    participants: &[activity_participant::Model],
    now: DateTime<Utc>,
) -> bool {
    if is_sole_creator_roster(participants, &activity.created_by) {
        return true;
    }

    match (activity.is_cancelled, activity.cancelled_at.as_ref()) {
        (true, Some(at)) => {
            now - at.with_timezone(&Utc) >= Duration::days(CANCELLED_DELETE_AFTER_DAYS)
        }
        _ => false,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use gather_db::entities::activity::StringList;
    use gather_db::entities::activity_participant::ParticipantStatus;

    fn at(y: i32, mo: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, 12, 0, 0).unwrap()
    }

    fn test_activity(event: DateTime<Utc>, voting: Option<DateTime<Utc>>) -> activity::Model {
        activity::Model {
            id: "a1".to_string(),
            event_title: "Picnic".to_string(),
            description: String::new(),
            agenda: String::new(),
            contact_info: String::new(),
            cost: "TBD".to_string(),
            location: "Riverside park".to_string(),
            what_to_bring: StringList::new(),
            whats_provided: StringList::new(),
            event_date: event.into(),
            voting_date: voting.map(Into::into),
            is_finalized: false,
            is_cancelled: false,
            is_completed: false,
            cancelled_at: None,
            created_by: "u1".to_string(),
            created_at: at(2026, 1, 1).into(),
            updated_at: None,
        }
    }

    fn participant(user_id: &str) -> activity_participant::Model {
        activity_participant::Model {
            id: format!("p_{user_id}"),
            activity_id: "a1".to_string(),
            user_id: user_id.to_string(),
            status: ParticipantStatus::Interested,
            available_times: StringList::new(),
            joined_at: at(2026, 1, 1).into(),
            updated_at: None,
        }
    }

    #[test]
    fn test_no_voting_date_auto_finalizes() {
        let mut a = test_activity(at(2026, 6, 1), None);
        let outcome = recompute(&mut a, at(2026, 5, 1));

        assert!(outcome.changed);
        assert!(!outcome.participants_reset);
        assert!(a.is_finalized);
        assert!(!a.is_cancelled);
        assert!(!a.is_completed);
    }

    #[test]
    fn test_recompute_is_idempotent() {
        let now = at(2026, 5, 1);
        let mut a = test_activity(at(2026, 6, 1), None);

        assert!(recompute(&mut a, now).changed);
        let second = recompute(&mut a, now);
        assert_eq!(second, RecomputeOutcome::default());
    }

    #[test]
    fn test_unfinalized_past_event_auto_cancels() {
        let now = at(2026, 6, 2);
        let mut a = test_activity(at(2026, 6, 1), Some(at(2026, 5, 25)));
        let outcome = recompute(&mut a, now);

        assert!(outcome.changed);
        assert!(outcome.participants_reset);
        assert!(a.is_cancelled);
        assert!(!a.is_finalized);
        assert!(!a.is_completed);
        assert_eq!(a.cancelled_at.unwrap().with_timezone(&Utc), now);
    }

    #[test]
    fn test_finalized_past_event_auto_completes() {
        let mut a = test_activity(at(2026, 6, 1), Some(at(2026, 5, 25)));
        a.is_finalized = true;

        let outcome = recompute(&mut a, at(2026, 6, 2));

        assert!(outcome.changed);
        assert!(!outcome.participants_reset);
        assert!(a.is_completed);
        assert!(a.is_finalized);
        assert!(!a.is_cancelled);
    }

    #[test]
    fn test_no_voting_date_past_event_completes_not_cancels() {
        // Auto-finalize runs before the cancellation check.
        let mut a = test_activity(at(2026, 6, 1), None);
        let outcome = recompute(&mut a, at(2026, 6, 2));

        assert!(outcome.changed);
        assert!(a.is_finalized);
        assert!(a.is_completed);
        assert!(!a.is_cancelled);
    }

    #[test]
    fn test_future_event_with_voting_date_stays_active() {
        let mut a = test_activity(at(2026, 6, 1), Some(at(2026, 5, 25)));
        let outcome = recompute(&mut a, at(2026, 5, 1));

        assert_eq!(outcome, RecomputeOutcome::default());
        assert_eq!(state_of(&a), LifecycleState::Active);
    }

    #[test]
    fn test_cancelled_is_terminal() {
        let mut a = test_activity(at(2026, 6, 1), None);
        a.is_cancelled = true;
        a.cancelled_at = Some(at(2026, 5, 1).into());

        // Dates long past; nothing may move.
        let outcome = recompute(&mut a, at(2027, 1, 1));

        assert_eq!(outcome, RecomputeOutcome::default());
        assert!(!a.is_finalized);
        assert!(!a.is_completed);
    }

    #[test]
    fn test_state_of_mapping() {
        let mut a = test_activity(at(2026, 6, 1), Some(at(2026, 5, 1)));
        assert_eq!(state_of(&a), LifecycleState::Active);

        a.is_finalized = true;
        assert_eq!(state_of(&a), LifecycleState::Finalized);

        a.is_completed = true;
        assert_eq!(state_of(&a), LifecycleState::Completed);

        a.is_cancelled = true;
        assert_eq!(state_of(&a), LifecycleState::Cancelled);
    }

    #[test]
    fn test_text_differs_trims() {
        assert!(!text_differs("Picnic", "  Picnic  "));
        assert!(text_differs("Picnic", "Hike"));
    }

    #[test]
    fn test_list_differs_ignores_order_only() {
        let current = vec!["plates".to_string(), "cups".to_string()];

        assert!(!list_differs(
            &current,
            &["cups".to_string(), "plates".to_string()]
        ));
        assert!(list_differs(&current, &["cups".to_string()]));
        assert!(list_differs(
            &current,
            &["cups".to_string(), "cups".to_string()]
        ));
    }

    #[test]
    fn test_date_differs_normalizes_offsets() {
        let utc = at(2026, 6, 1);
        let offset = utc.with_timezone(&FixedOffset::east_opt(9 * 3600).unwrap());

        assert!(!date_differs(Some(&offset), Some(&utc)));
        assert!(date_differs(Some(&offset), None));
        assert!(date_differs(None, Some(&utc)));
        assert!(!date_differs(None, None));
    }

    #[test]
    fn test_sole_creator_roster() {
        assert!(is_sole_creator_roster(&[], "u1"));
        assert!(is_sole_creator_roster(&[participant("u1")], "u1"));
        assert!(!is_sole_creator_roster(
            &[participant("u1"), participant("u2")],
            "u1"
        ));
    }

    #[test]
    fn test_deletion_allowed_for_sole_creator() {
        let a = test_activity(at(2026, 6, 1), None);
        assert!(deletion_allowed(&a, &[participant("u1")], at(2026, 5, 1)));
    }

    #[test]
    fn test_deletion_blocked_with_other_participants() {
        let a = test_activity(at(2026, 6, 1), None);
        let roster = [participant("u1"), participant("u2")];
        assert!(!deletion_allowed(&a, &roster, at(2026, 5, 1)));
    }

    #[test]
    fn test_deletion_allowed_after_cancellation_grace() {
        let mut a = test_activity(at(2026, 6, 1), None);
        a.is_cancelled = true;
        a.cancelled_at = Some(at(2026, 5, 1).into());
        let roster = [participant("u1"), participant("u2")];

        // Six days is too early; exactly seven is enough.
        assert!(!deletion_allowed(&a, &roster, at(2026, 5, 7)));
        assert!(deletion_allowed(&a, &roster, at(2026, 5, 8)));
    }
}
