//! Wizard session model.
//!
//! A [`WizardSession`] is the in-progress, not-yet-finalized state of one
//! ticket-intake conversation. It is created by the `new_wizard` event,
//! mutated by every transition, and deleted once a ticket has been created
//! from it (or lazily expired after a configurable inactivity window).

use chrono::{DateTime, Duration, Utc};
use fixdesk_proto::{ChannelId, MediaRef, Priority, SessionId, UserId, WizardStep};
use serde::{Deserialize, Serialize};

/// Which field the next free-text message will be captured into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FreeTextTarget {
    Category,
    Location,
}

/// Sub-cursor within the structured location triple.
///
/// Kept separately from the filled-in values so that `back` can re-ask an
/// already-answered sub-step without clearing it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationStage {
    Building,
    Floor,
    Room,
}

/// The location while the wizard is filling it in.
///
/// Exactly one form can be populated at a time: committing a custom string
/// discards the structured triple and vice versa, so the ambiguous
/// both-set state is unrepresentable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "form", rename_all = "snake_case")]
pub enum LocationDraft {
    /// Nothing chosen yet.
    #[default]
    Empty,

    /// The structured triple, filled depth-first building → floor → room.
    Structured {
        building: String,
        floor: Option<u8>,
        room: Option<String>,
    },

    /// Free-text override typed by the user.
    Custom { text: String },
}

impl LocationDraft {
    /// The building, if the structured form is in progress.
    pub fn building(&self) -> Option<&str> {
        match self {
            Self::Structured { building, .. } => Some(building),
            _ => None,
        }
    }

    /// The floor, if chosen.
    pub fn floor(&self) -> Option<u8> {
        match self {
            Self::Structured { floor, .. } => *floor,
            _ => None,
        }
    }

    /// The room, if chosen.
    pub fn room(&self) -> Option<&str> {
        match self {
            Self::Structured { room, .. } => room.as_deref(),
            _ => None,
        }
    }

    /// Resolves the draft into a final location, if it is complete.
    pub fn resolved(&self) -> Option<Location> {
        match self {
            Self::Custom { text } => Some(Location::Custom { text: text.clone() }),
            Self::Structured {
                building,
                floor: Some(floor),
                room: Some(room),
            } => Some(Location::Structured {
                building: building.clone(),
                floor: *floor,
                room: room.clone(),
            }),
            _ => None,
        }
    }

    /// True once the draft satisfies the location half of the completion
    /// predicate.
    pub fn is_resolved(&self) -> bool {
        self.resolved().is_some()
    }
}

/// A finalized location, as stored on a ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "form", rename_all = "snake_case")]
pub enum Location {
    /// Building/floor/room chosen from the structured catalog.
    Structured {
        building: String,
        floor: u8,
        room: String,
    },

    /// Free text typed by the user.
    Custom { text: String },
}

impl Location {
    /// The operator-facing label: the custom text verbatim, or the
    /// structured triple as `"<building> - Floor <floor> - Room <room>"`.
    pub fn label(&self) -> String {
        match self {
            Self::Custom { text } => text.clone(),
            Self::Structured {
                building,
                floor,
                room,
            } => format!("{building} - Floor {floor} - Room {room}"),
        }
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.label())
    }
}

/// One in-progress intake conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WizardSession {
    /// Opaque identity, stable for the conversation thread.
    pub id: SessionId,

    /// Channel the conversation started in. Immutable.
    pub channel_id: ChannelId,

    /// Who started the intake. Immutable.
    pub initiator_id: UserId,

    /// Free-text issue description from the opening message. Immutable.
    pub description: String,

    /// Chosen category, structured or manually typed.
    pub category: Option<String>,

    /// Chosen priority.
    pub priority: Option<Priority>,

    /// Location in whichever form the user is building it.
    #[serde(default)]
    pub location: LocationDraft,

    /// Informational cursor; completeness is governed by
    /// [`WizardSession::is_complete`], not this field.
    pub step: WizardStep,

    /// Sub-cursor within the location triple.
    pub location_stage: LocationStage,

    /// When set, the next free-text event is consumed as a field value.
    pub awaiting_free_text: bool,

    /// Which field the awaited free text belongs to.
    pub free_text_target: Option<FreeTextTarget>,

    /// Media attached so far. Append-only.
    pub attached_media: Vec<MediaRef>,

    /// When the session was created.
    pub created_at: DateTime<Utc>,

    /// Last transition time; drives expiry.
    pub updated_at: DateTime<Utc>,

    /// Optimistic-concurrency token, managed by the session store.
    #[serde(default)]
    pub version: u64,
}

impl WizardSession {
    /// Creates a fresh session positioned at the category step.
    pub fn new(
        id: SessionId,
        channel_id: ChannelId,
        initiator_id: UserId,
        description: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            channel_id,
            initiator_id,
            description: description.into(),
            category: None,
            priority: None,
            location: LocationDraft::default(),
            step: WizardStep::Category,
            location_stage: LocationStage::Building,
            awaiting_free_text: false,
            free_text_target: None,
            attached_media: Vec::new(),
            created_at: now,
            updated_at: now,
            version: 0,
        }
    }

    /// The completion predicate: category and priority are set, and the
    /// location is resolved in exactly one of its two forms.
    pub fn is_complete(&self) -> bool {
        self.category.is_some() && self.priority.is_some() && self.location.is_resolved()
    }

    /// Human-readable list of what is still missing, for error messages.
    pub fn missing_summary(&self) -> String {
        let mut missing = Vec::new();
        if self.category.is_none() {
            missing.push("category");
        }
        if self.priority.is_none() {
            missing.push("priority");
        }
        if !self.location.is_resolved() {
            missing.push("location");
        }
        missing.join(", ")
    }

    /// The first incomplete top-level field, or `Complete` once the
    /// completion predicate holds.
    pub fn next_incomplete_step(&self) -> WizardStep {
        if self.category.is_none() {
            WizardStep::Category
        } else if self.priority.is_none() {
            WizardStep::Priority
        } else if !self.location.is_resolved() {
            WizardStep::Location
        } else {
            WizardStep::Complete
        }
    }

    /// Records a transition time.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }

    /// True once the session has sat untouched longer than the TTL.
    pub fn is_expired(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now.signed_duration_since(self.updated_at) > ttl
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap()
    }

    fn session() -> WizardSession {
        WizardSession::new(
            SessionId::new("s-1"),
            ChannelId::new("c-1"),
            UserId::new("u-1"),
            "broken light in the stairwell",
            t0(),
        )
    }

    #[test]
    fn test_fresh_session_is_incomplete() {
        let s = session();
        assert!(!s.is_complete());
        assert_eq!(s.next_incomplete_step(), WizardStep::Category);
        assert_eq!(s.missing_summary(), "category, priority, location");
    }

    #[test]
    fn test_predicate_all_location_forms() {
        let mut s = session();
        s.category = Some("electrical".into());
        s.priority = Some(Priority::Medium);

        // Neither form resolved.
        assert!(!s.is_complete());

        // Partial triple does not satisfy the predicate.
        s.location = LocationDraft::Structured {
            building: "A".into(),
            floor: None,
            room: None,
        };
        assert!(!s.is_complete());

        s.location = LocationDraft::Structured {
            building: "A".into(),
            floor: Some(2),
            room: None,
        };
        assert!(!s.is_complete());

        // Full triple does.
        s.location = LocationDraft::Structured {
            building: "A".into(),
            floor: Some(2),
            room: Some("201".into()),
        };
        assert!(s.is_complete());

        // Custom form does too.
        s.location = LocationDraft::Custom {
            text: "behind the gym".into(),
        };
        assert!(s.is_complete());
    }

    #[test]
    fn test_predicate_truth_table() {
        let locations = [
            (LocationDraft::Empty, false),
            (
                LocationDraft::Structured {
                    building: "A".into(),
                    floor: Some(2),
                    room: Some("201".into()),
                },
                true,
            ),
            (
                LocationDraft::Custom {
                    text: "roof".into(),
                },
                true,
            ),
        ];

        for has_category in [false, true] {
            for has_priority in [false, true] {
                for (location, location_ok) in &locations {
                    let mut s = session();
                    s.category = has_category.then(|| "electrical".to_string());
                    s.priority = has_priority.then_some(Priority::Low);
                    s.location = location.clone();

                    let expected = has_category && has_priority && *location_ok;
                    assert_eq!(
                        s.is_complete(),
                        expected,
                        "category={has_category} priority={has_priority} location={location:?}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_custom_location_replaces_triple() {
        let mut s = session();
        s.location = LocationDraft::Structured {
            building: "A".into(),
            floor: Some(2),
            room: Some("201".into()),
        };
        s.location = LocationDraft::Custom {
            text: "rooftop".into(),
        };
        assert_eq!(s.location.building(), None);
        assert_eq!(
            s.location.resolved(),
            Some(Location::Custom {
                text: "rooftop".into()
            })
        );
    }

    #[test]
    fn test_location_label_formats() {
        let structured = Location::Structured {
            building: "B".into(),
            floor: 3,
            room: "302".into(),
        };
        assert_eq!(structured.label(), "B - Floor 3 - Room 302");

        let custom = Location::Custom {
            text: "parking lot".into(),
        };
        assert_eq!(custom.label(), "parking lot");
    }

    #[test]
    fn test_expiry_window() {
        let s = session();
        let ttl = Duration::hours(24);
        assert!(!s.is_expired(t0() + Duration::hours(23), ttl));
        assert!(!s.is_expired(t0() + Duration::hours(24), ttl));
        assert!(s.is_expired(t0() + Duration::hours(24) + Duration::seconds(1), ttl));
    }
}
