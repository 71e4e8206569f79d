//! Render instructions.
//!
//! The core never draws buttons or keyboards. It hands the adapter a plain
//! text prompt plus an ordered list of actions, each pairing a label with
//! the event the adapter should emit back when the user activates it. How
//! those actions are presented (inline keyboard, menu, quick replies) is
//! the adapter's business.

use serde::{Deserialize, Serialize};

use crate::event::EventKind;
use crate::ids::SessionId;

/// One selectable action offered to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    /// Human-readable label.
    pub label: String,

    /// The event the adapter emits (addressed to the same session) when
    /// the user activates this action.
    pub event: EventKind,
}

impl Action {
    /// Creates an action.
    pub fn new(label: impl Into<String>, event: EventKind) -> Self {
        Self {
            label: label.into(),
            event,
        }
    }
}

/// What the adapter should show after an event was applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderInstruction {
    /// The session this render belongs to.
    pub session_id: SessionId,

    /// Prompt text for the current wizard state.
    pub text: String,

    /// Ordered actions to offer. May be empty (e.g. while awaiting free
    /// text, or after the session was consumed into a ticket).
    pub actions: Vec<Action>,
}

impl RenderInstruction {
    /// Creates a render instruction with no actions.
    pub fn text_only(session_id: SessionId, text: impl Into<String>) -> Self {
        Self {
            session_id,
            text: text.into(),
            actions: Vec::new(),
        }
    }

    /// Returns the action labels, in order. Convenience for adapters and
    /// tests that only care about what is offered, not the payloads.
    pub fn labels(&self) -> Vec<&str> {
        self.actions.iter().map(|a| a.label.as_str()).collect()
    }
}
