//! Ticket model and lifecycle transitions.
//!
//! A ticket cycles `Pending -> Completed -> Pending -> ...` without bound.
//! Every reopen appends an immutable [`ReopenEvent`] snapshotting the
//! completion fields it clears, which is what later lets the duration
//! accountant reconstruct how long the ticket sat dormant between phases.

use chrono::{DateTime, Duration, Utc};
use fixdesk_proto::{MediaRef, Priority, TicketId, UserId};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Lifecycle status of a ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    /// Open and being worked on (or waiting to be).
    Pending,
    /// Marked done. May be reopened.
    Completed,
}

/// Immutable record of one Completed → Pending transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReopenEvent {
    /// When the ticket was reopened.
    pub reopened_at: DateTime<Utc>,

    /// Who reopened it.
    pub reopened_by: UserId,

    /// Why it was reopened.
    pub reason: String,

    /// Status immediately before this reopen. Always `Completed` for
    /// events produced through [`Ticket::reopen`].
    pub previous_status: TicketStatus,

    /// Snapshot of `completed_at` taken before it was cleared.
    pub previous_completed_at: Option<DateTime<Utc>>,

    /// Snapshot of `completed_by` taken before it was cleared.
    pub previous_completed_by: Option<UserId>,

    /// Wall-clock length, in seconds, of the phase that just ended: from
    /// `previous_completed_at` (or ticket creation when absent) to
    /// `reopened_at`, clamped to zero on clock skew.
    ///
    /// For a reopen of a completed ticket this is *dormant* time — how
    /// long the ticket sat closed — not active work time.
    pub closed_phase_secs: i64,
}

impl ReopenEvent {
    /// The dormant phase length as a duration.
    pub fn closed_phase(&self) -> Duration {
        Duration::seconds(self.closed_phase_secs)
    }
}

/// A maintenance ticket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    /// Assigned once by the ticket store; never reused.
    pub id: TicketId,

    /// Issue description, copied from the wizard's opening message.
    pub description: String,

    /// Category. Mutable by operators after creation.
    pub category: String,

    /// Optional finer-grained category, set by operators.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_category: Option<String>,

    /// Priority. Mutable by operators after creation.
    pub priority: Priority,

    /// Resolved location label.
    pub location: String,

    /// Lifecycle status.
    pub status: TicketStatus,

    /// Who filed the ticket.
    pub created_by: UserId,

    /// When the ticket was created. Immutable.
    pub created_at: DateTime<Utc>,

    /// When the current completion happened. `Some` iff `status` is
    /// `Completed`, and then it is the most recent completion.
    pub completed_at: Option<DateTime<Utc>>,

    /// Who completed it. Set and cleared together with `completed_at`.
    pub completed_by: Option<UserId>,

    /// Photos attached during intake or afterwards.
    #[serde(default)]
    pub photos: Vec<MediaRef>,

    /// Append-only, chronological reopen history. Entries are never
    /// edited or removed.
    #[serde(default)]
    pub reopen_history: Vec<ReopenEvent>,

    /// Optimistic-concurrency token, managed by the ticket store.
    #[serde(default)]
    pub version: u64,
}

impl Ticket {
    /// Marks the ticket completed.
    ///
    /// Valid only from `Pending`; fails with `InvalidTransition` and
    /// leaves the ticket untouched otherwise.
    pub fn complete(&mut self, by: UserId, at: DateTime<Utc>) -> CoreResult<()> {
        if self.status == TicketStatus::Completed {
            return Err(CoreError::InvalidTransition {
                ticket: self.id.clone(),
                from: self.status,
                to: TicketStatus::Completed,
            });
        }
        self.status = TicketStatus::Completed;
        self.completed_at = Some(at);
        self.completed_by = Some(by);
        Ok(())
    }

    /// Reopens a completed ticket.
    ///
    /// Valid only from `Completed`; fails with `InvalidTransition` and
    /// leaves the ticket untouched otherwise. Snapshots the completion
    /// fields into a new [`ReopenEvent`] before clearing them.
    pub fn reopen(
        &mut self,
        by: UserId,
        reason: impl Into<String>,
        at: DateTime<Utc>,
    ) -> CoreResult<()> {
        if self.status == TicketStatus::Pending {
            return Err(CoreError::InvalidTransition {
                ticket: self.id.clone(),
                from: self.status,
                to: TicketStatus::Pending,
            });
        }

        let phase_start = self.completed_at.unwrap_or(self.created_at);
        // Clamp: a reopen timestamped before the completion it undoes
        // indicates clock skew between writers, not negative time.
        let closed_phase_secs = at.signed_duration_since(phase_start).num_seconds().max(0);

        self.reopen_history.push(ReopenEvent {
            reopened_at: at,
            reopened_by: by,
            reason: reason.into(),
            previous_status: self.status,
            previous_completed_at: self.completed_at,
            previous_completed_by: self.completed_by.clone(),
            closed_phase_secs,
        });

        self.status = TicketStatus::Pending;
        self.completed_at = None;
        self.completed_by = None;
        Ok(())
    }
}
