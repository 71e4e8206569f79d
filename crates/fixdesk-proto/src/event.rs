//! Inbound event vocabulary.
//!
//! Channel adapters translate raw platform callbacks (messages, button
//! presses, attachments) into [`InboundEvent`]s. Events may be redelivered
//! or arrive out of order; the wizard engine is written so that re-applying
//! a genuinely duplicated event leaves the session unchanged.

use serde::{Deserialize, Serialize};

use crate::ids::{ChannelId, MediaRef, SessionId, UserId};

/// Ticket priority as chosen during intake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    /// Human-readable label used in prompts and action buttons.
    pub fn label(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// The wizard's top-level steps.
///
/// This is an informational cursor: the wizard renders the prompt for the
/// current step, but whether a session can be submitted is governed solely
/// by the completion predicate on the session itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    Category,
    Priority,
    Location,
    Complete,
}

/// A structured field choice or a manual-entry request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "field", rename_all = "snake_case")]
pub enum FieldChoice {
    /// Pick a category from the configured catalog.
    Category { value: String },

    /// Ask to type the category by hand; the next free-text event is
    /// consumed as the category value.
    CategoryManual,

    /// Pick a priority.
    Priority { value: Priority },

    /// Pick the building of the structured location triple.
    Building { value: String },

    /// Pick the floor within the chosen building.
    Floor { value: u8 },

    /// Pick the room on the chosen floor.
    Room { value: String },

    /// Ask to type the location by hand; the next free-text event is
    /// consumed as the custom location, replacing any structured triple.
    LocationManual,
}

/// Navigation commands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "nav", rename_all = "snake_case")]
pub enum NavAction {
    /// Step back within the location triple (room → floor → building).
    /// Previously chosen values are kept.
    Back,

    /// Jump to re-selecting a field regardless of current completeness.
    Goto { step: WizardStep },

    /// Finalize the wizard into a ticket. A no-op unless the completion
    /// predicate holds.
    Submit,
}

/// What happened, from the adapter's point of view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventKind {
    /// Start a new intake conversation. The only event kind that creates
    /// a session; every other kind fails with `SessionNotFound` when the
    /// session does not exist.
    NewWizard {
        channel: ChannelId,
        initiator: UserId,
        description: String,
    },

    /// A structured choice was made (button press, menu selection).
    SetField(FieldChoice),

    /// The user typed free text. Only consumed as a field value while the
    /// session is awaiting one; stray free text is ignored.
    FreeText { text: String },

    /// A navigation command.
    Navigate(NavAction),

    /// A media object was attached. Appended unconditionally; never moves
    /// the wizard cursor.
    AttachMedia { media: MediaRef },
}

/// One event addressed to one wizard session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundEvent {
    /// The session this event belongs to.
    pub session_id: SessionId,

    /// What happened.
    #[serde(flatten)]
    pub kind: EventKind,
}

impl InboundEvent {
    /// Creates an event addressed to the given session.
    pub fn new(session_id: impl Into<SessionId>, kind: EventKind) -> Self {
        Self {
            session_id: session_id.into(),
            kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_kind_serializes_with_kind_tag() {
        let event = InboundEvent::new(
            "s-1",
            EventKind::FreeText {
                text: "leaky tap".into(),
            },
        );
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["kind"], "free_text");
        assert_eq!(json["text"], "leaky tap");
        assert_eq!(json["session_id"], "s-1");
    }

    #[test]
    fn test_set_field_round_trip() {
        let event = InboundEvent::new(
            "s-2",
            EventKind::SetField(FieldChoice::Priority {
                value: Priority::High,
            }),
        );
        let json = serde_json::to_string(&event).unwrap();
        let back: InboundEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn test_navigate_goto_carries_step() {
        let event = InboundEvent::new(
            "s-3",
            EventKind::Navigate(NavAction::Goto {
                step: WizardStep::Location,
            }),
        );
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["nav"], "goto");
        assert_eq!(json["step"], "location");
    }
}
