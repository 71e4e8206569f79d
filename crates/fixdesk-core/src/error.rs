//! Error types for the Fixdesk core.

use fixdesk_proto::{SessionId, TicketId};
use thiserror::Error;

use crate::ticket::TicketStatus;

/// Result type alias using [`CoreError`].
pub type CoreResult<T> = std::result::Result<T, CoreError>;

/// Errors that can occur in the intake and lifecycle core.
///
/// Nothing here is fatal to the process; every failure is scoped to the
/// operation that raised it and leaves stored state intact.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The referenced session does not exist (never created, expired, or
    /// already consumed into a ticket).
    #[error("session not found: {0}")]
    SessionNotFound(SessionId),

    /// A ticket was requested from a session that does not satisfy the
    /// completion predicate.
    #[error("wizard incomplete for session {0}: missing {1}")]
    IncompleteWizard(SessionId, String),

    /// A lifecycle transition was requested from the wrong status.
    /// The ticket is left untouched.
    #[error("invalid transition for {ticket}: cannot go from {from:?} to {to:?}")]
    InvalidTransition {
        ticket: TicketId,
        from: TicketStatus,
        to: TicketStatus,
    },

    /// A concurrent writer changed the record between our read and write,
    /// and the bounded retries were exhausted. Surfaced, never swallowed:
    /// a silently dropped conflict is exactly how duplicate reopen entries
    /// or lost completions happen.
    #[error("concurrent modification of {key} after {attempts} attempts")]
    ConcurrentModification { key: String, attempts: u32 },

    /// The backing store failed.
    #[error("storage error: {0}")]
    Storage(String),

    /// Configuration could not be read or parsed.
    #[error("configuration error: {0}")]
    Config(String),
}
