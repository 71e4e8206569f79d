//! # fixdesk-proto
//!
//! Shared types and trait definitions for the Fixdesk ticket intake core.
//!
//! This crate provides the foundational vocabulary used across all Fixdesk
//! crates, including:
//! - Opaque identifier newtypes for sessions, tickets, channels, and users
//! - The inbound event types produced by messaging-channel adapters
//! - The render instruction consumed by adapters to display wizard state
//! - The injectable [`Clock`] trait that keeps time-dependent logic testable

mod clock;
mod event;
mod ids;
mod render;

pub use clock::{Clock, ManualClock, SystemClock};
pub use event::{EventKind, FieldChoice, InboundEvent, NavAction, Priority, WizardStep};
pub use ids::{ChannelId, MediaRef, SessionId, TicketId, UserId};
pub use render::{Action, RenderInstruction};
