//! The intake wizard state machine.
//!
//! [`WizardEngine::apply`] applies exactly one inbound event to a loaded
//! session; [`WizardEngine::render`] turns the resulting state into a
//! prompt plus the actions the adapter should offer. The engine itself
//! never touches storage — the intake service owns load/save and the
//! concurrency discipline around it — which keeps every transition
//! unit-testable on a plain session value.
//!
//! Events arrive from a messaging channel that may redeliver. Every
//! transition here is written to be idempotent: re-applying a duplicated
//! event leaves the session exactly as the first application did. The one
//! structurally non-idempotent input, free-text capture, is guarded by the
//! `awaiting_free_text` flag so at most one value is captured per
//! activation and stray text changes nothing.

use chrono::{DateTime, Utc};
use fixdesk_proto::{
    Action, EventKind, FieldChoice, NavAction, Priority, RenderInstruction, WizardStep,
};
use tracing::debug;

use crate::config::IntakeConfig;
use crate::error::CoreResult;
use crate::session::{FreeTextTarget, LocationDraft, LocationStage, WizardSession};

/// What an applied event means for the session's lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardOutcome {
    /// The wizard continues; render and wait for the next event.
    Continue,

    /// A submit was accepted: the completion predicate holds and the
    /// session should now be finalized into a ticket.
    Submit,
}

/// Applies inbound events to wizard sessions and renders their state.
pub struct WizardEngine {
    config: IntakeConfig,
}

impl WizardEngine {
    /// Creates an engine with the given intake catalog settings.
    pub fn new(config: IntakeConfig) -> Self {
        Self { config }
    }

    /// Applies one event to the session.
    ///
    /// Always touches `updated_at` — any user activity keeps the session
    /// from expiring, including events that change nothing else.
    pub fn apply(
        &self,
        session: &mut WizardSession,
        kind: &EventKind,
        now: DateTime<Utc>,
    ) -> CoreResult<WizardOutcome> {
        let outcome = match kind {
            // A redelivered start event must not wipe an in-progress
            // wizard; the session already exists, so just re-render.
            EventKind::NewWizard { .. } => WizardOutcome::Continue,

            EventKind::SetField(choice) => {
                self.apply_field(session, choice);
                WizardOutcome::Continue
            }

            EventKind::FreeText { text } => {
                self.apply_free_text(session, text);
                WizardOutcome::Continue
            }

            EventKind::Navigate(nav) => self.apply_nav(session, nav),

            EventKind::AttachMedia { media } => {
                // Redelivered attachment refs are not duplicated.
                if !session.attached_media.contains(media) {
                    session.attached_media.push(media.clone());
                }
                WizardOutcome::Continue
            }
        };

        session.touch(now);
        debug!(
            session = %session.id,
            step = ?session.step,
            outcome = ?outcome,
            "applied wizard event"
        );
        Ok(outcome)
    }

    fn apply_field(&self, session: &mut WizardSession, choice: &FieldChoice) {
        match choice {
            FieldChoice::Category { value } => {
                session.category = Some(value.clone());
                clear_free_text(session);
                advance(session);
            }

            FieldChoice::CategoryManual => {
                session.step = WizardStep::Category;
                session.awaiting_free_text = true;
                session.free_text_target = Some(FreeTextTarget::Category);
            }

            FieldChoice::Priority { value } => {
                session.priority = Some(*value);
                clear_free_text(session);
                advance(session);
            }

            FieldChoice::Building { value } => {
                // Re-picking the same building is a pure no-op; a different
                // building invalidates the floor and room derived from it.
                if session.location.building() != Some(value.as_str()) {
                    session.location = LocationDraft::Structured {
                        building: value.clone(),
                        floor: None,
                        room: None,
                    };
                }
                session.location_stage = LocationStage::Floor;
                session.step = WizardStep::Location;
                clear_free_text(session);
            }

            FieldChoice::Floor { value } => {
                let LocationDraft::Structured { floor, room, .. } = &mut session.location else {
                    // A floor press with no building chosen (stale button,
                    // or after a custom override) has nothing to attach to.
                    return;
                };
                if *floor != Some(*value) {
                    *floor = Some(*value);
                    *room = None;
                }
                session.location_stage = LocationStage::Room;
                session.step = WizardStep::Location;
                clear_free_text(session);
            }

            FieldChoice::Room { value } => {
                let LocationDraft::Structured {
                    floor: Some(_),
                    room,
                    ..
                } = &mut session.location
                else {
                    return;
                };
                *room = Some(value.clone());
                session.location_stage = LocationStage::Room;
                clear_free_text(session);
                advance(session);
            }

            FieldChoice::LocationManual => {
                session.step = WizardStep::Location;
                session.awaiting_free_text = true;
                session.free_text_target = Some(FreeTextTarget::Location);
            }
        }
    }

    fn apply_free_text(&self, session: &mut WizardSession, text: &str) {
        // Single-shot capture: without an armed flag, stray text must not
        // overwrite anything.
        if !session.awaiting_free_text {
            return;
        }
        match session.free_text_target {
            Some(FreeTextTarget::Category) => {
                session.category = Some(text.trim().to_string());
            }
            Some(FreeTextTarget::Location) => {
                // Custom text replaces the structured triple outright.
                session.location = LocationDraft::Custom {
                    text: text.trim().to_string(),
                };
                session.location_stage = LocationStage::Building;
            }
            None => return,
        }
        clear_free_text(session);
        advance(session);
    }

    fn apply_nav(&self, session: &mut WizardSession, nav: &NavAction) -> WizardOutcome {
        match nav {
            NavAction::Back => {
                // Back only steps within the location triple, and never
                // clears the ancestor value it returns to.
                if session.step == WizardStep::Location {
                    session.location_stage = match session.location_stage {
                        LocationStage::Room => LocationStage::Floor,
                        LocationStage::Floor | LocationStage::Building => LocationStage::Building,
                    };
                }
                WizardOutcome::Continue
            }

            NavAction::Goto { step } => {
                // Jumping to a field cancels any pending free-text capture.
                clear_free_text(session);
                match step {
                    WizardStep::Location => {
                        session.step = WizardStep::Location;
                        session.location_stage = LocationStage::Building;
                    }
                    WizardStep::Complete => {
                        session.step = session.next_incomplete_step();
                    }
                    other => session.step = *other,
                }
                WizardOutcome::Continue
            }

            NavAction::Submit => {
                if session.is_complete() {
                    WizardOutcome::Submit
                } else {
                    // Not submittable yet; re-render the current state
                    // unchanged.
                    WizardOutcome::Continue
                }
            }
        }
    }

    /// Renders the session's current state into a prompt and actions.
    pub fn render(&self, session: &WizardSession) -> RenderInstruction {
        if session.awaiting_free_text {
            let text = match session.free_text_target {
                Some(FreeTextTarget::Location) => {
                    "Describe where to find the issue (e.g. \"behind the gym, west wall\")."
                }
                _ => "Type the category that fits best.",
            };
            return RenderInstruction::text_only(session.id.clone(), text);
        }

        match session.step {
            WizardStep::Category => self.render_category(session),
            WizardStep::Priority => self.render_priority(session),
            WizardStep::Location => self.render_location(session),
            WizardStep::Complete => self.render_summary(session),
        }
    }

    fn render_category(&self, session: &WizardSession) -> RenderInstruction {
        let mut actions: Vec<Action> = self
            .config
            .categories
            .iter()
            .map(|c| {
                Action::new(
                    c.clone(),
                    EventKind::SetField(FieldChoice::Category { value: c.clone() }),
                )
            })
            .collect();
        actions.push(Action::new(
            "Something else...",
            EventKind::SetField(FieldChoice::CategoryManual),
        ));

        RenderInstruction {
            session_id: session.id.clone(),
            text: "What kind of issue are you reporting?".into(),
            actions,
        }
    }

    fn render_priority(&self, session: &WizardSession) -> RenderInstruction {
        let actions = [Priority::Low, Priority::Medium, Priority::High]
            .into_iter()
            .map(|p| {
                Action::new(
                    p.label(),
                    EventKind::SetField(FieldChoice::Priority { value: p }),
                )
            })
            .collect();

        RenderInstruction {
            session_id: session.id.clone(),
            text: "How urgent is it?".into(),
            actions,
        }
    }

    fn render_location(&self, session: &WizardSession) -> RenderInstruction {
        match session.location_stage {
            LocationStage::Building => {
                let mut actions: Vec<Action> = self
                    .config
                    .buildings
                    .iter()
                    .map(|b| {
                        Action::new(
                            format!("Building {b}"),
                            EventKind::SetField(FieldChoice::Building { value: b.clone() }),
                        )
                    })
                    .collect();
                actions.push(Action::new(
                    "Describe it instead...",
                    EventKind::SetField(FieldChoice::LocationManual),
                ));

                RenderInstruction {
                    session_id: session.id.clone(),
                    text: "Where is the issue? Pick a building.".into(),
                    actions,
                }
            }

            LocationStage::Floor => {
                let building = session.location.building().unwrap_or("?").to_string();
                let mut actions: Vec<Action> = self
                    .config
                    .floors()
                    .into_iter()
                    .map(|f| {
                        Action::new(
                            format!("Floor {f}"),
                            EventKind::SetField(FieldChoice::Floor { value: f }),
                        )
                    })
                    .collect();
                actions.push(back_action());

                RenderInstruction {
                    session_id: session.id.clone(),
                    text: format!("Building {building} - which floor?"),
                    actions,
                }
            }

            LocationStage::Room => {
                let floor = session.location.floor().unwrap_or(0);
                let mut actions: Vec<Action> = self
                    .config
                    .rooms_on_floor(floor)
                    .into_iter()
                    .map(|r| {
                        Action::new(
                            format!("Room {r}"),
                            EventKind::SetField(FieldChoice::Room { value: r }),
                        )
                    })
                    .collect();
                actions.push(back_action());

                RenderInstruction {
                    session_id: session.id.clone(),
                    text: format!("Floor {floor} - which room?"),
                    actions,
                }
            }
        }
    }

    fn render_summary(&self, session: &WizardSession) -> RenderInstruction {
        let location = session
            .location
            .resolved()
            .map(|l| l.label())
            .unwrap_or_else(|| "not set".into());
        let mut lines = vec![
            "Here's your ticket so far:".to_string(),
            String::new(),
            format!("Issue: {}", session.description),
            format!(
                "Category: {}",
                session.category.as_deref().unwrap_or("not set")
            ),
            format!(
                "Priority: {}",
                session
                    .priority
                    .map(|p| p.label().to_string())
                    .unwrap_or_else(|| "not set".into())
            ),
            format!("Location: {location}"),
        ];
        if !session.attached_media.is_empty() {
            lines.push(format!("Photos: {}", session.attached_media.len()));
        }

        let actions = vec![
            Action::new("Create ticket", EventKind::Navigate(NavAction::Submit)),
            Action::new(
                "Change category",
                EventKind::Navigate(NavAction::Goto {
                    step: WizardStep::Category,
                }),
            ),
            Action::new(
                "Change priority",
                EventKind::Navigate(NavAction::Goto {
                    step: WizardStep::Priority,
                }),
            ),
            Action::new(
                "Change location",
                EventKind::Navigate(NavAction::Goto {
                    step: WizardStep::Location,
                }),
            ),
        ];

        RenderInstruction {
            session_id: session.id.clone(),
            text: lines.join("\n"),
            actions,
        }
    }
}

fn advance(session: &mut WizardSession) {
    session.step = session.next_incomplete_step();
    if session.step == WizardStep::Location && session.location.building().is_none() {
        session.location_stage = LocationStage::Building;
    }
}

fn clear_free_text(session: &mut WizardSession) {
    session.awaiting_free_text = false;
    session.free_text_target = None;
}

fn back_action() -> Action {
    Action::new("Back", EventKind::Navigate(NavAction::Back))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use fixdesk_proto::{ChannelId, MediaRef, SessionId, UserId};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap()
    }

    fn engine() -> WizardEngine {
        WizardEngine::new(IntakeConfig::default())
    }

    fn session() -> WizardSession {
        WizardSession::new(
            SessionId::new("s-1"),
            ChannelId::new("c-1"),
            UserId::new("u-1"),
            "window won't close",
            t0(),
        )
    }

    fn set(s: &mut WizardSession, choice: FieldChoice) -> WizardOutcome {
        engine()
            .apply(s, &EventKind::SetField(choice), t0())
            .unwrap()
    }

    fn nav(s: &mut WizardSession, action: NavAction) -> WizardOutcome {
        engine()
            .apply(s, &EventKind::Navigate(action), t0())
            .unwrap()
    }

    fn fill_complete(s: &mut WizardSession) {
        set(
            s,
            FieldChoice::Category {
                value: "carpentry".into(),
            },
        );
        set(
            s,
            FieldChoice::Priority {
                value: Priority::Low,
            },
        );
        set(s, FieldChoice::Building { value: "A".into() });
        set(s, FieldChoice::Floor { value: 2 });
        set(s, FieldChoice::Room { value: "202".into() });
    }

    #[test]
    fn test_set_category_advances_to_priority() {
        let mut s = session();
        set(
            &mut s,
            FieldChoice::Category {
                value: "electrical".into(),
            },
        );
        assert_eq!(s.category.as_deref(), Some("electrical"));
        assert_eq!(s.step, WizardStep::Priority);
    }

    #[test]
    fn test_set_category_twice_is_idempotent() {
        let mut s = session();
        set(
            &mut s,
            FieldChoice::Category {
                value: "electrical".into(),
            },
        );
        let after_first = s.clone();
        set(
            &mut s,
            FieldChoice::Category {
                value: "electrical".into(),
            },
        );
        assert_eq!(s, after_first);
    }

    #[test]
    fn test_full_structured_flow_reaches_complete() {
        let mut s = session();
        fill_complete(&mut s);
        assert_eq!(s.step, WizardStep::Complete);
        assert!(s.is_complete());
    }

    #[test]
    fn test_building_alone_is_not_complete() {
        let mut s = session();
        set(
            &mut s,
            FieldChoice::Category {
                value: "hvac".into(),
            },
        );
        set(
            &mut s,
            FieldChoice::Priority {
                value: Priority::High,
            },
        );
        set(&mut s, FieldChoice::Building { value: "B".into() });
        assert!(!s.is_complete());
        assert_eq!(s.step, WizardStep::Location);
        assert_eq!(s.location_stage, LocationStage::Floor);
    }

    #[test]
    fn test_changing_building_clears_floor_and_room() {
        let mut s = session();
        fill_complete(&mut s);
        set(&mut s, FieldChoice::Building { value: "B".into() });
        assert_eq!(s.location.building(), Some("B"));
        assert_eq!(s.location.floor(), None);
        assert_eq!(s.location.room(), None);
        assert!(!s.is_complete());
    }

    #[test]
    fn test_repicking_same_building_keeps_floor_and_room() {
        let mut s = session();
        fill_complete(&mut s);
        set(&mut s, FieldChoice::Building { value: "A".into() });
        assert_eq!(s.location.floor(), Some(2));
        assert_eq!(s.location.room(), Some("202"));
    }

    #[test]
    fn test_back_preserves_ancestors() {
        let mut s = session();
        set(
            &mut s,
            FieldChoice::Category {
                value: "plumbing".into(),
            },
        );
        set(
            &mut s,
            FieldChoice::Priority {
                value: Priority::Medium,
            },
        );
        set(&mut s, FieldChoice::Building { value: "C".into() });
        set(&mut s, FieldChoice::Floor { value: 3 });
        assert_eq!(s.location_stage, LocationStage::Room);

        nav(&mut s, NavAction::Back);
        assert_eq!(s.location_stage, LocationStage::Floor);
        nav(&mut s, NavAction::Back);
        assert_eq!(s.location_stage, LocationStage::Building);

        // Originally chosen values survive, and so do the earlier fields.
        assert_eq!(s.location.building(), Some("C"));
        assert_eq!(s.location.floor(), Some(3));
        assert_eq!(s.category.as_deref(), Some("plumbing"));
        assert_eq!(s.priority, Some(Priority::Medium));
    }

    #[test]
    fn test_floor_without_building_is_ignored() {
        let mut s = session();
        set(&mut s, FieldChoice::Floor { value: 2 });
        assert_eq!(s.location, LocationDraft::Empty);
    }

    #[test]
    fn test_manual_category_capture() {
        let mut s = session();
        set(&mut s, FieldChoice::CategoryManual);
        assert!(s.awaiting_free_text);

        engine()
            .apply(
                &mut s,
                &EventKind::FreeText {
                    text: "  pest control ".into(),
                },
                t0(),
            )
            .unwrap();
        assert_eq!(s.category.as_deref(), Some("pest control"));
        assert!(!s.awaiting_free_text);
        assert_eq!(s.step, WizardStep::Priority);
    }

    #[test]
    fn test_stray_free_text_changes_nothing() {
        let mut s = session();
        set(
            &mut s,
            FieldChoice::Category {
                value: "cleaning".into(),
            },
        );
        let before = s.clone();

        engine()
            .apply(
                &mut s,
                &EventKind::FreeText {
                    text: "ignore me".into(),
                },
                t0(),
            )
            .unwrap();
        assert_eq!(s, before);
    }

    #[test]
    fn test_free_text_capture_is_single_shot() {
        let mut s = session();
        set(&mut s, FieldChoice::CategoryManual);
        engine()
            .apply(
                &mut s,
                &EventKind::FreeText {
                    text: "first".into(),
                },
                t0(),
            )
            .unwrap();
        engine()
            .apply(
                &mut s,
                &EventKind::FreeText {
                    text: "second".into(),
                },
                t0(),
            )
            .unwrap();
        assert_eq!(s.category.as_deref(), Some("first"));
    }

    #[test]
    fn test_custom_location_replaces_structured_triple() {
        let mut s = session();
        fill_complete(&mut s);
        set(&mut s, FieldChoice::LocationManual);
        engine()
            .apply(
                &mut s,
                &EventKind::FreeText {
                    text: "boiler room in the basement".into(),
                },
                t0(),
            )
            .unwrap();

        assert_eq!(s.location.building(), None);
        assert!(s.is_complete());
        assert_eq!(s.step, WizardStep::Complete);
    }

    #[test]
    fn test_structured_choice_after_custom_location() {
        let mut s = session();
        set(&mut s, FieldChoice::LocationManual);
        engine()
            .apply(
                &mut s,
                &EventKind::FreeText {
                    text: "somewhere".into(),
                },
                t0(),
            )
            .unwrap();
        set(&mut s, FieldChoice::Building { value: "A".into() });
        assert_eq!(s.location.building(), Some("A"));
        assert!(!s.location.is_resolved());
    }

    #[test]
    fn test_submit_rejected_until_complete() {
        let mut s = session();
        let before = s.clone();
        let outcome = nav(&mut s, NavAction::Submit);
        assert_eq!(outcome, WizardOutcome::Continue);
        // Only the activity timestamp moved.
        assert_eq!(s.category, before.category);
        assert_eq!(s.step, before.step);

        fill_complete(&mut s);
        let outcome = nav(&mut s, NavAction::Submit);
        assert_eq!(outcome, WizardOutcome::Submit);
    }

    #[test]
    fn test_goto_allows_changes_after_complete() {
        let mut s = session();
        fill_complete(&mut s);

        nav(
            &mut s,
            NavAction::Goto {
                step: WizardStep::Priority,
            },
        );
        assert_eq!(s.step, WizardStep::Priority);

        set(
            &mut s,
            FieldChoice::Priority {
                value: Priority::High,
            },
        );
        assert_eq!(s.priority, Some(Priority::High));
        assert_eq!(s.step, WizardStep::Complete);
    }

    #[test]
    fn test_attach_media_never_moves_cursor() {
        let mut s = session();
        set(
            &mut s,
            FieldChoice::Category {
                value: "electrical".into(),
            },
        );
        let step_before = s.step;

        engine()
            .apply(
                &mut s,
                &EventKind::AttachMedia {
                    media: MediaRef::new("photo-1"),
                },
                t0(),
            )
            .unwrap();
        assert_eq!(s.step, step_before);
        assert_eq!(s.attached_media.len(), 1);

        // Redelivery of the same attachment is not duplicated.
        engine()
            .apply(
                &mut s,
                &EventKind::AttachMedia {
                    media: MediaRef::new("photo-1"),
                },
                t0(),
            )
            .unwrap();
        assert_eq!(s.attached_media.len(), 1);

        engine()
            .apply(
                &mut s,
                &EventKind::AttachMedia {
                    media: MediaRef::new("photo-2"),
                },
                t0(),
            )
            .unwrap();
        assert_eq!(s.attached_media.len(), 2);
    }

    #[test]
    fn test_render_offers_rooms_derived_from_floor() {
        let mut s = session();
        set(&mut s, FieldChoice::Building { value: "A".into() });
        set(&mut s, FieldChoice::Floor { value: 3 });

        let render = engine().render(&s);
        assert_eq!(
            render.labels(),
            vec!["Room 301", "Room 302", "Room 303", "Back"]
        );
    }

    #[test]
    fn test_render_summary_offers_submit_and_changes() {
        let mut s = session();
        fill_complete(&mut s);

        let render = engine().render(&s);
        assert!(render.text.contains("carpentry"));
        assert!(render.text.contains("A - Floor 2 - Room 202"));
        assert_eq!(render.labels()[0], "Create ticket");
    }

    #[test]
    fn test_render_while_awaiting_free_text_has_no_actions() {
        let mut s = session();
        set(&mut s, FieldChoice::CategoryManual);
        let render = engine().render(&s);
        assert!(render.actions.is_empty());
    }
}
