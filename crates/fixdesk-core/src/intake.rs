//! The adapter-facing intake service.
//!
//! This is what a messaging-channel adapter calls with each translated
//! event. The service owns everything the wizard engine deliberately does
//! not: session load/create/expiry, the bounded conflict-retry loop that
//! serializes writers per session, and the submit path that turns a
//! completed session into a stored ticket and consumes the session in the
//! same serialized pass.

use std::sync::Arc;

use fixdesk_proto::{Clock, EventKind, InboundEvent, RenderInstruction, TicketId};
use tracing::{info, warn};

use crate::config::IntakeConfig;
use crate::error::{CoreError, CoreResult};
use crate::factory::build_ticket;
use crate::session::WizardSession;
use crate::store::{SessionStore, TicketStore};
use crate::wizard::{WizardEngine, WizardOutcome};

/// What came out of handling one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntakeResponse {
    /// What the adapter should show.
    pub render: RenderInstruction,

    /// Set when this event finalized the wizard into a ticket.
    pub created: Option<TicketId>,
}

/// Front door of the intake core.
pub struct IntakeService {
    sessions: Arc<dyn SessionStore>,
    tickets: Arc<dyn TicketStore>,
    clock: Arc<dyn Clock>,
    engine: WizardEngine,
    config: IntakeConfig,
}

impl IntakeService {
    /// Creates a service over the given stores and clock.
    pub fn new(
        sessions: Arc<dyn SessionStore>,
        tickets: Arc<dyn TicketStore>,
        clock: Arc<dyn Clock>,
        config: IntakeConfig,
    ) -> Self {
        Self {
            sessions,
            tickets,
            clock,
            engine: WizardEngine::new(config.clone()),
            config,
        }
    }

    /// Handles one inbound event, retrying transparently when a concurrent
    /// writer invalidates the read-modify-write, up to the configured
    /// bound. The conflict is surfaced after that — never swallowed.
    pub async fn handle_event(&self, event: &InboundEvent) -> CoreResult<IntakeResponse> {
        let mut attempts = 0;
        loop {
            attempts += 1;
            match self.try_handle(event).await {
                Err(CoreError::ConcurrentModification { key, .. }) => {
                    if attempts <= self.config.max_conflict_retries {
                        warn!(session = %event.session_id, attempts, "conflict, retrying event");
                        continue;
                    }
                    return Err(CoreError::ConcurrentModification { key, attempts });
                }
                other => return other,
            }
        }
    }

    async fn try_handle(&self, event: &InboundEvent) -> CoreResult<IntakeResponse> {
        let now = self.clock.now();

        let existing = match self.sessions.load(&event.session_id).await? {
            Some(session) if session.is_expired(now, self.config.session_ttl()) => {
                info!(session = %session.id, "session expired, discarding");
                // Best-effort cleanup; a conflict here means another event
                // just revived the session, and the retry loop re-reads.
                self.sessions.delete(&session.id, session.version).await?;
                None
            }
            other => other,
        };

        match (&event.kind, existing) {
            (
                EventKind::NewWizard {
                    channel,
                    initiator,
                    description,
                },
                None,
            ) => {
                let mut session = WizardSession::new(
                    event.session_id.clone(),
                    channel.clone(),
                    initiator.clone(),
                    description.clone(),
                    now,
                );
                session.version = self.sessions.save(&session).await?;
                info!(session = %session.id, channel = %channel, "started intake wizard");
                Ok(IntakeResponse {
                    render: self.engine.render(&session),
                    created: None,
                })
            }

            // A redelivered start event re-renders the in-progress wizard
            // instead of resetting it.
            (EventKind::NewWizard { .. }, Some(session)) => Ok(IntakeResponse {
                render: self.engine.render(&session),
                created: None,
            }),

            (_, None) => Err(CoreError::SessionNotFound(event.session_id.clone())),

            (kind, Some(mut session)) => {
                let outcome = self.engine.apply(&mut session, kind, now)?;
                match outcome {
                    WizardOutcome::Continue => {
                        session.version = self.sessions.save(&session).await?;
                        Ok(IntakeResponse {
                            render: self.engine.render(&session),
                            created: None,
                        })
                    }
                    WizardOutcome::Submit => self.finalize(session).await,
                }
            }
        }
    }

    /// Consumes a completed session into a ticket.
    ///
    /// The versioned delete claims the session: if a concurrent event got
    /// in after our read, the delete conflicts and the retry loop starts
    /// over from fresh state instead of minting a second ticket.
    async fn finalize(&self, session: WizardSession) -> CoreResult<IntakeResponse> {
        let session_id = session.id.clone();
        let created_by = session.initiator_id.clone();
        self.sessions.delete(&session_id, session.version).await?;

        let ticket_id = self.tickets.next_id().await?;
        let ticket = build_ticket(session, ticket_id, created_by, self.clock.now())?;
        self.tickets.create(&ticket).await?;

        info!(
            ticket = %ticket.id,
            session = %session_id,
            category = %ticket.category,
            "created ticket from wizard"
        );

        Ok(IntakeResponse {
            render: RenderInstruction::text_only(
                session_id,
                format!(
                    "Ticket {} created: {} ({}, {} priority). We'll keep you posted.",
                    ticket.id, ticket.description, ticket.location, ticket.priority
                ),
            ),
            created: Some(ticket.id),
        })
    }
}
