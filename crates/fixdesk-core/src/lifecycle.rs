//! Ticket lifecycle tracking.
//!
//! [`LifecycleTracker`] applies the pure transitions from
//! [`crate::ticket`] through the ticket store under the optimistic
//! concurrency contract: load, transition, save with the loaded version,
//! retry on conflict a bounded number of times. Concurrent `complete` and
//! `reopen` calls on the same ticket therefore never interleave — one of
//! them re-reads and either succeeds against the new state or fails its
//! guard cleanly.

use std::sync::Arc;

use fixdesk_proto::{Clock, TicketId, UserId};
use tracing::{info, warn};

use crate::error::{CoreError, CoreResult};
use crate::store::TicketStore;
use crate::ticket::Ticket;

/// Applies lifecycle transitions to stored tickets.
pub struct LifecycleTracker {
    store: Arc<dyn TicketStore>,
    clock: Arc<dyn Clock>,
    max_retries: u32,
}

impl LifecycleTracker {
    /// Creates a tracker over the given store and clock.
    pub fn new(store: Arc<dyn TicketStore>, clock: Arc<dyn Clock>, max_retries: u32) -> Self {
        Self {
            store,
            clock,
            max_retries,
        }
    }

    /// Marks a ticket completed by `by` at the clock's current instant.
    pub async fn complete(&self, id: &TicketId, by: &UserId) -> CoreResult<Ticket> {
        let at = self.clock.now();
        self.transition(id, "complete", |ticket| ticket.complete(by.clone(), at))
            .await
    }

    /// Reopens a completed ticket, recording why and by whom.
    pub async fn reopen(&self, id: &TicketId, by: &UserId, reason: &str) -> CoreResult<Ticket> {
        let at = self.clock.now();
        self.transition(id, "reopen", |ticket| ticket.reopen(by.clone(), reason, at))
            .await
    }

    async fn transition<F>(&self, id: &TicketId, op: &str, mut apply: F) -> CoreResult<Ticket>
    where
        F: FnMut(&mut Ticket) -> CoreResult<()>,
    {
        let mut attempts = 0;
        loop {
            attempts += 1;

            let mut ticket = self
                .store
                .load(id)
                .await?
                .ok_or_else(|| CoreError::Storage(format!("ticket not found: {id}")))?;

            // Guard failures (wrong status) are terminal, not retryable;
            // the ticket is returned to storage untouched by never saving.
            apply(&mut ticket)?;

            match self.store.save(&ticket).await {
                Ok(version) => {
                    ticket.version = version;
                    info!(ticket = %id, op, "applied lifecycle transition");
                    return Ok(ticket);
                }
                Err(CoreError::ConcurrentModification { .. }) if attempts <= self.max_retries => {
                    warn!(ticket = %id, op, attempts, "conflict, retrying transition");
                }
                Err(CoreError::ConcurrentModification { key, .. }) => {
                    return Err(CoreError::ConcurrentModification { key, attempts });
                }
                Err(other) => return Err(other),
            }
        }
    }
}
