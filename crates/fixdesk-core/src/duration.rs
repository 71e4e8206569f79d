//! Duration accounting.
//!
//! "Active duration" is the wall-clock span from ticket creation to its
//! final completion minus every interval the ticket sat already-completed
//! before being reopened. Only time spent in `Pending` phases counts as
//! active; the dormant closed spans between a completion and the reopen
//! that undid it are subtracted out.
//!
//! Both functions are pure and derive everything from the ticket's own
//! immutable history — no external state, no side effects.

use chrono::Duration;

use crate::ticket::Ticket;

/// Sum of all dormant intervals recorded in the reopen history.
///
/// Each history entry contributes the span from the completion it undid
/// (its snapshot `previous_completed_at`, falling back to the ticket's
/// `created_at`) to its `reopened_at`. Entries whose reopen timestamp
/// precedes the phase start — clock skew between writers — contribute
/// zero, never negative time.
pub fn dormant_duration(ticket: &Ticket) -> Duration {
    ticket
        .reopen_history
        .iter()
        .fold(Duration::zero(), |acc, event| {
            let phase_start = event.previous_completed_at.unwrap_or(ticket.created_at);
            let dormant = event
                .reopened_at
                .signed_duration_since(phase_start)
                .max(Duration::zero());
            acc + dormant
        })
}

/// Net active working time for a ticket, or `None` while `completed_at`
/// is unset (never completed, or reopened without a new completion yet —
/// the caller decides whether to defer or treat it as still in progress).
///
/// `active = max(0, (completed_at - created_at) - dormant_duration)`,
/// with the final result clamped to zero so pathological timestamp skew
/// can never report negative work.
pub fn active_duration(ticket: &Ticket) -> Option<Duration> {
    let completed_at = ticket.completed_at?;
    let total = completed_at.signed_duration_since(ticket.created_at);
    let active = (total - dormant_duration(ticket)).max(Duration::zero());
    Some(active)
}
