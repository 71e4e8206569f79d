//! Storage seams.
//!
//! The core talks to durable storage through two narrow async traits.
//! Both carry an optimistic-concurrency contract: `save` succeeds only if
//! the caller's `version` matches the stored one, which is how the
//! per-session and per-ticket single-writer discipline is enforced without
//! assuming anything about the backing technology. The in-memory
//! implementations here are the reference for adapter authors and the
//! backbone of the test suite and the dev CLI.

use std::collections::HashMap;

use async_trait::async_trait;
use fixdesk_proto::{SessionId, TicketId};
use tokio::sync::Mutex;

use crate::error::{CoreError, CoreResult};
use crate::session::WizardSession;
use crate::ticket::Ticket;

/// Durable keyed storage for wizard sessions.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Loads a session. `Ok(None)` when it does not exist.
    async fn load(&self, id: &SessionId) -> CoreResult<Option<WizardSession>>;

    /// Persists a session and returns the new stored version.
    ///
    /// For an existing session the caller's `session.version` must match
    /// the stored version; for a new one it must be zero. A mismatch
    /// fails with `ConcurrentModification` and changes nothing.
    async fn save(&self, session: &WizardSession) -> CoreResult<u64>;

    /// Deletes a session, conditional on the caller still holding the
    /// current version. A mismatch fails with `ConcurrentModification`;
    /// deleting a session that is already gone is a no-op.
    async fn delete(&self, id: &SessionId, expected_version: u64) -> CoreResult<()>;
}

/// Durable keyed storage for tickets.
#[async_trait]
pub trait TicketStore: Send + Sync {
    /// Allocates the next ticket id. Ids are monotonic, human-readable,
    /// and never reused.
    async fn next_id(&self) -> CoreResult<TicketId>;

    /// Stores a freshly created ticket. Fails if the id already exists.
    async fn create(&self, ticket: &Ticket) -> CoreResult<()>;

    /// Loads a ticket. `Ok(None)` when it does not exist.
    async fn load(&self, id: &TicketId) -> CoreResult<Option<Ticket>>;

    /// Persists a mutated ticket under the same version contract as
    /// [`SessionStore::save`].
    async fn save(&self, ticket: &Ticket) -> CoreResult<u64>;
}

fn conflict(key: impl std::fmt::Display) -> CoreError {
    CoreError::ConcurrentModification {
        key: key.to_string(),
        attempts: 1,
    }
}

/// In-memory session store.
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: Mutex<HashMap<SessionId, WizardSession>>,
}

impl InMemorySessionStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn load(&self, id: &SessionId) -> CoreResult<Option<WizardSession>> {
        Ok(self.sessions.lock().await.get(id).cloned())
    }

    async fn save(&self, session: &WizardSession) -> CoreResult<u64> {
        let mut sessions = self.sessions.lock().await;
        let stored_version = sessions.get(&session.id).map(|s| s.version).unwrap_or(0);
        if stored_version != session.version {
            return Err(conflict(&session.id));
        }
        let mut stored = session.clone();
        stored.version += 1;
        let new_version = stored.version;
        sessions.insert(session.id.clone(), stored);
        Ok(new_version)
    }

    async fn delete(&self, id: &SessionId, expected_version: u64) -> CoreResult<()> {
        let mut sessions = self.sessions.lock().await;
        match sessions.get(id) {
            None => Ok(()),
            Some(stored) if stored.version == expected_version => {
                sessions.remove(id);
                Ok(())
            }
            Some(_) => Err(conflict(id)),
        }
    }
}

/// In-memory ticket store with a monotonic id counter.
#[derive(Default)]
pub struct InMemoryTicketStore {
    inner: Mutex<TicketStoreState>,
}

#[derive(Default)]
struct TicketStoreState {
    tickets: HashMap<TicketId, Ticket>,
    next_seq: u64,
}

impl InMemoryTicketStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TicketStore for InMemoryTicketStore {
    async fn next_id(&self) -> CoreResult<TicketId> {
        let mut state = self.inner.lock().await;
        state.next_seq += 1;
        Ok(TicketId::new(format!("T-{:05}", state.next_seq)))
    }

    async fn create(&self, ticket: &Ticket) -> CoreResult<()> {
        let mut state = self.inner.lock().await;
        if state.tickets.contains_key(&ticket.id) {
            return Err(CoreError::Storage(format!(
                "ticket already exists: {}",
                ticket.id
            )));
        }
        let mut stored = ticket.clone();
        stored.version = 1;
        state.tickets.insert(ticket.id.clone(), stored);
        Ok(())
    }

    async fn load(&self, id: &TicketId) -> CoreResult<Option<Ticket>> {
        Ok(self.inner.lock().await.tickets.get(id).cloned())
    }

    async fn save(&self, ticket: &Ticket) -> CoreResult<u64> {
        let mut state = self.inner.lock().await;
        let Some(stored) = state.tickets.get(&ticket.id) else {
            return Err(CoreError::Storage(format!("ticket not found: {}", ticket.id)));
        };
        if stored.version != ticket.version {
            return Err(conflict(&ticket.id));
        }
        let mut updated = ticket.clone();
        updated.version += 1;
        let new_version = updated.version;
        state.tickets.insert(ticket.id.clone(), updated);
        Ok(new_version)
    }
}
