//! # fixdesk-core
//!
//! Intake wizard, ticket lifecycle, and duration accounting for Fixdesk.
//!
//! This crate provides:
//! - The multi-step intake wizard state machine driven by channel events
//! - Session and ticket models with optimistic-concurrency versioning
//! - The ticket factory (sole creation path from a completed wizard)
//! - Lifecycle transitions with unbounded complete/reopen cycles
//! - Pure active/dormant duration accounting over reopen history
//! - The adapter-facing intake service tying the above together

mod config;
mod duration;
mod error;
mod factory;
mod intake;
mod lifecycle;
mod session;
mod store;
mod ticket;
mod wizard;

pub use config::{FixdeskConfig, IntakeConfig};
pub use duration::{active_duration, dormant_duration};
pub use error::{CoreError, CoreResult};
pub use factory::build_ticket;
pub use intake::{IntakeResponse, IntakeService};
pub use lifecycle::LifecycleTracker;
pub use session::{FreeTextTarget, Location, LocationDraft, LocationStage, WizardSession};
pub use store::{InMemorySessionStore, InMemoryTicketStore, SessionStore, TicketStore};
pub use ticket::{ReopenEvent, Ticket, TicketStatus};
pub use wizard::{WizardEngine, WizardOutcome};
