//! Turning a completed wizard session into a ticket.
//!
//! This is the sole creation path for tickets. The intake service calls it
//! inside the same serialized pass that deletes the session, so a session
//! can never produce two tickets.

use chrono::{DateTime, Utc};
use fixdesk_proto::{TicketId, UserId};

use crate::error::{CoreError, CoreResult};
use crate::session::WizardSession;
use crate::ticket::{Ticket, TicketStatus};

/// Builds the immutable creation request for a ticket from a completed
/// wizard session.
///
/// Fails with [`CoreError::IncompleteWizard`] when the completion
/// predicate does not hold. The session is consumed by value: once a
/// ticket has been built from it there is nothing left to resubmit.
pub fn build_ticket(
    session: WizardSession,
    id: TicketId,
    created_by: UserId,
    now: DateTime<Utc>,
) -> CoreResult<Ticket> {
    let Some(location) = session.location.resolved() else {
        return Err(CoreError::IncompleteWizard(
            session.id.clone(),
            session.missing_summary(),
        ));
    };
    let (Some(category), Some(priority)) = (session.category.clone(), session.priority) else {
        return Err(CoreError::IncompleteWizard(
            session.id.clone(),
            session.missing_summary(),
        ));
    };

    Ok(Ticket {
        id,
        description: session.description,
        category,
        sub_category: None,
        priority,
        location: location.label(),
        status: TicketStatus::Pending,
        created_by,
        created_at: now,
        completed_at: None,
        completed_by: None,
        photos: session.attached_media,
        reopen_history: Vec::new(),
        version: 0,
    })
}
