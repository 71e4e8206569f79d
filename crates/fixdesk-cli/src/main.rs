//! # fixdesk-cli
//!
//! Console harness for the Fixdesk intake core.
//!
//! This binary drives the same [`IntakeService`] a messaging-channel
//! adapter would, but from an interactive terminal loop against the
//! in-memory stores. It exists for development and demos: walk the wizard,
//! create a ticket, cycle it through complete/reopen, and inspect the
//! active-duration accounting — without any chat platform wired up.

use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use fixdesk_core::{
    active_duration, dormant_duration, FixdeskConfig, InMemorySessionStore, InMemoryTicketStore,
    IntakeService, LifecycleTracker, TicketStatus, TicketStore,
};
use fixdesk_proto::{
    ChannelId, EventKind, InboundEvent, MediaRef, RenderInstruction, SystemClock, TicketId, UserId,
};
use tracing::debug;

/// Fixdesk console harness.
#[derive(Debug, Parser)]
#[command(name = "fixdesk", version, about)]
struct Cli {
    /// Path to the configuration file.
    #[arg(long, default_value = "fixdesk.yml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let config = FixdeskConfig::load(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    debug!(?config, "configuration loaded");

    let sessions = Arc::new(InMemorySessionStore::new());
    let tickets: Arc<InMemoryTicketStore> = Arc::new(InMemoryTicketStore::new());
    let clock = Arc::new(SystemClock);

    let service = IntakeService::new(
        sessions,
        tickets.clone(),
        clock.clone(),
        config.intake.clone(),
    );
    let tracker = LifecycleTracker::new(tickets.clone(), clock, config.intake.max_conflict_retries);

    println!("fixdesk console harness");
    println!("commands: new <description> | <number> | <free text> | photo <ref>");
    println!("          complete <ticket> | reopen <ticket> <reason> | show <ticket> | quit");

    let mut harness = Harness {
        service,
        tracker,
        tickets,
        session_seq: 0,
        current_session: None,
        last_render: None,
    };

    let stdin = std::io::stdin();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "quit" {
            break;
        }

        if let Err(e) = harness.dispatch(line).await {
            println!("error: {e}");
        }
    }

    Ok(())
}

struct Harness {
    service: IntakeService,
    tracker: LifecycleTracker,
    tickets: Arc<InMemoryTicketStore>,
    session_seq: u32,
    current_session: Option<String>,
    last_render: Option<RenderInstruction>,
}

impl Harness {
    async fn dispatch(&mut self, line: &str) -> Result<()> {
        let (command, rest) = line
            .split_once(char::is_whitespace)
            .map(|(c, r)| (c, r.trim()))
            .unwrap_or((line, ""));

        match command {
            "new" => {
                self.session_seq += 1;
                let session = format!("console-{}", self.session_seq);
                let event = InboundEvent::new(
                    session.as_str(),
                    EventKind::NewWizard {
                        channel: ChannelId::new("console"),
                        initiator: UserId::new("console-user"),
                        description: rest.to_string(),
                    },
                );
                self.current_session = Some(session);
                self.send(event).await
            }
            "photo" => {
                let event = self.session_event(EventKind::AttachMedia {
                    media: MediaRef::new(rest),
                })?;
                self.send(event).await
            }
            "complete" => {
                let ticket = self
                    .tracker
                    .complete(&TicketId::new(rest), &UserId::new("console-operator"))
                    .await?;
                println!("{} is now {:?}", ticket.id, ticket.status);
                Ok(())
            }
            "reopen" => {
                let (id, reason) = rest
                    .split_once(char::is_whitespace)
                    .map(|(i, r)| (i, r.trim()))
                    .unwrap_or((rest, "no reason given"));
                let ticket = self
                    .tracker
                    .reopen(&TicketId::new(id), &UserId::new("console-operator"), reason)
                    .await?;
                println!("{} is now {:?}", ticket.id, ticket.status);
                Ok(())
            }
            "show" => self.show(rest).await,
            _ => {
                // A bare number activates an offered action; anything else
                // is free text for the wizard.
                if let Some(event) = self.numbered_action(line) {
                    self.send(event).await
                } else {
                    let event = self.session_event(EventKind::FreeText {
                        text: line.to_string(),
                    })?;
                    self.send(event).await
                }
            }
        }
    }

    fn session_event(&self, kind: EventKind) -> Result<InboundEvent> {
        let session = self
            .current_session
            .as_deref()
            .context("no wizard in progress; start one with: new <description>")?;
        Ok(InboundEvent::new(session, kind))
    }

    fn numbered_action(&self, line: &str) -> Option<InboundEvent> {
        let index: usize = line.parse().ok()?;
        let render = self.last_render.as_ref()?;
        let action = render.actions.get(index.checked_sub(1)?)?;
        Some(InboundEvent::new(
            render.session_id.clone(),
            action.event.clone(),
        ))
    }

    async fn send(&mut self, event: InboundEvent) -> Result<()> {
        let response = self.service.handle_event(&event).await?;

        println!("{}", response.render.text);
        for (i, action) in response.render.actions.iter().enumerate() {
            println!("  {}. {}", i + 1, action.label);
        }
        if let Some(ticket_id) = &response.created {
            println!("(ticket {ticket_id} stored)");
            self.current_session = None;
        }

        self.last_render = Some(response.render);
        Ok(())
    }

    async fn show(&self, id: &str) -> Result<()> {
        let ticket = self
            .tickets
            .load(&TicketId::new(id))
            .await?
            .with_context(|| format!("no ticket {id}"))?;

        println!("{} [{}] {}", ticket.id, ticket.category, ticket.description);
        println!("  location: {}", ticket.location);
        println!("  priority: {}", ticket.priority);
        println!("  status:   {:?}", ticket.status);
        println!("  reopened: {} time(s)", ticket.reopen_history.len());
        if ticket.status == TicketStatus::Completed {
            println!("  dormant:  {}", format_duration(dormant_duration(&ticket)));
            if let Some(active) = active_duration(&ticket) {
                println!("  active:   {}", format_duration(active));
            }
        }
        Ok(())
    }
}

/// Formats a duration as `3h 20m` / `45m` / `12s`.
fn format_duration(d: chrono::Duration) -> String {
    let hours = d.num_hours();
    let mins = d.num_minutes() % 60;
    if hours > 0 {
        format!("{hours}h {mins}m")
    } else if mins > 0 {
        format!("{mins}m")
    } else {
        format!("{}s", d.num_seconds())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration_buckets() {
        assert_eq!(format_duration(chrono::Duration::hours(3) + chrono::Duration::minutes(20)), "3h 20m");
        assert_eq!(format_duration(chrono::Duration::minutes(45)), "45m");
        assert_eq!(format_duration(chrono::Duration::seconds(12)), "12s");
    }
}
