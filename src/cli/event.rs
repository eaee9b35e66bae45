//! Event CLI commands

use std::time::Instant;

use anyhow::Result;
use clap::Subcommand;

use super::app::acting_user;
use super::output::Output;
use crate::domain::{EventId, EventStatus, Tab};
use crate::service::{AssignmentTracker, Lifecycle, TabGate};
use crate::storage::Project;

#[derive(Subcommand)]
pub enum EventCommands {
    /// Create a draft event owned by the acting user
    New {
        /// Event title
        title: String,
    },

    /// List events
    List {
        /// Filter by status
        #[arg(long)]
        status: Option<String>,
    },

    /// Show event details
    Show {
        /// Event ID
        id: String,
    },

    /// Change the event status (owner only)
    ///
    /// Examples:
    ///   lineup event status e-1234567 planning
    ///   lineup --as olivia event status e-1234567 cancelled --reason "venue lost"
    Status {
        /// Event ID
        id: String,

        /// Target status (draft, planning, confirmed, in_progress, completed, cancelled)
        status: String,

        /// Reason recorded in the history
        #[arg(long, short)]
        reason: Option<String>,
    },

    /// Show the status history
    History {
        /// Event ID
        id: String,
    },

    /// Show which tabs are reachable in the current status
    Tabs {
        /// Event ID
        id: String,
    },

    /// Open one or more tabs in order, as a user clicking through them would
    Open {
        /// Event ID
        id: String,

        /// Tabs to open (overview, team, contractors, tasks, documents, notifications)
        #[arg(required = true)]
        tabs: Vec<String>,
    },
}

pub fn run(cmd: EventCommands, output: &Output, actor: Option<&str>) -> Result<()> {
    match cmd {
        EventCommands::New { title } => new_event(output, actor, &title),
        EventCommands::List { status } => list_events(output, status.as_deref()),
        EventCommands::Show { id } => show_event(output, &id),
        EventCommands::Status { id, status, reason } => {
            change_status(output, actor, &id, &status, reason.as_deref())
        }
        EventCommands::History { id } => show_history(output, &id),
        EventCommands::Tabs { id } => show_tabs(output, &id),
        EventCommands::Open { id, tabs } => open_tabs(output, &id, &tabs),
    }
}

fn new_event(output: &Output, actor: Option<&str>, title: &str) -> Result<()> {
    let project = Project::open_current()?;
    let owner = acting_user(&project, actor)?;
    let mut store = project.store();

    output.verbose_ctx("event", &format!("Creating event owned by {}", owner));
    let event = Lifecycle::new(&mut store).create_event(title, owner)?;

    if output.is_json() {
        output.data(&event);
    } else {
        output.success(&format!("Created event {}: {}", event.id, event.title));
    }

    Ok(())
}

fn list_events(output: &Output, status: Option<&str>) -> Result<()> {
    let project = Project::open_current()?;
    let mut store = project.store();

    let filter: Option<EventStatus> = status.map(str::parse).transpose()?;
    let events: Vec<_> = Lifecycle::new(&mut store)
        .events()?
        .into_iter()
        .filter(|event| filter.map_or(true, |status| event.status() == status))
        .collect();

    output.verbose_ctx("event", &format!("Found {} events", events.len()));

    if output.is_json() {
        output.data(&events);
    } else if events.is_empty() {
        println!("No events found.");
    } else {
        output.header(&[("ID", 12), ("STATUS", 12), ("OWNER", 14), ("TITLE", 0)]);
        for event in &events {
            output.row(&[
                (event.id.to_string().as_str(), 12),
                (event.status().as_str(), 12),
                (event.created_by.as_str(), 14),
                (event.title.as_str(), 0),
            ]);
        }
    }

    Ok(())
}

fn show_event(output: &Output, id: &str) -> Result<()> {
    let project = Project::open_current()?;
    let mut store = project.store();
    let event_id: EventId = id.parse()?;

    let event = Lifecycle::new(&mut store).event(&event_id)?;
    let roster = AssignmentTracker::new(&mut store).roster(&event_id)?;

    if output.is_json() {
        output.data(&serde_json::json!({
            "event": event,
            "tabs": event.reachable_tabs(),
            "team_members": roster.team_members.len(),
            "contractors": roster.contractors.len(),
        }));
        return Ok(());
    }

    println!("Event: {}", event.id);
    println!("Title: {}", event.title);
    println!("Status: {}", event.status());
    println!("Owner: {}", event.created_by);
    println!("Created: {}", event.created_at.format("%Y-%m-%d %H:%M"));
    println!("Updated: {}", event.updated_at.format("%Y-%m-%d %H:%M"));
    println!(
        "Roster: {} member(s), {} contractor(s)",
        roster.team_members.len(),
        roster.contractors.len()
    );
    let tabs: Vec<&str> = event.reachable_tabs().iter().map(Tab::as_str).collect();
    println!("Tabs: {}", tabs.join(", "));

    Ok(())
}

fn change_status(
    output: &Output,
    actor: Option<&str>,
    id: &str,
    status: &str,
    reason: Option<&str>,
) -> Result<()> {
    let project = Project::open_current()?;
    let actor = acting_user(&project, actor)?;
    let mut store = project.store();
    let event_id: EventId = id.parse()?;
    let target: EventStatus = status.parse()?;

    output.verbose_ctx("event", &format!("{} requests {} -> {}", actor, event_id, target));
    let event = Lifecycle::new(&mut store).transition(&event_id, target, &actor, reason)?;

    if output.is_json() {
        output.data(&event);
    } else {
        output.success(&format!("Event {} is now {}", event.id, event.status()));
        if let Some(next) = event.status().next() {
            output.verbose_ctx("event", &format!("Next step would be {}", next));
        }
    }

    Ok(())
}

fn show_history(output: &Output, id: &str) -> Result<()> {
    let project = Project::open_current()?;
    let mut store = project.store();
    let event_id: EventId = id.parse()?;

    let history = Lifecycle::new(&mut store).history(&event_id)?;

    if output.is_json() {
        output.data(&history);
    } else if history.is_empty() {
        println!("No status changes recorded for {}.", event_id);
    } else {
        output.header(&[("WHEN", 17), ("FROM", 12), ("TO", 12), ("BY", 14), ("REASON", 0)]);
        for entry in &history {
            output.row(&[
                (entry.timestamp.format("%Y-%m-%d %H:%M").to_string().as_str(), 17),
                (entry.previous_status.map_or("-", |s| s.as_str()), 12),
                (entry.new_status.as_str(), 12),
                (entry.changed_by.as_str(), 14),
                (entry.reason.as_deref().unwrap_or(""), 0),
            ]);
        }
    }

    Ok(())
}

fn show_tabs(output: &Output, id: &str) -> Result<()> {
    let project = Project::open_current()?;
    let mut store = project.store();
    let event_id: EventId = id.parse()?;

    let event = Lifecycle::new(&mut store).event(&event_id)?;
    let reachable = event.reachable_tabs();

    if output.is_json() {
        let tabs: Vec<_> = Tab::ALL
            .iter()
            .map(|tab| serde_json::json!({ "tab": tab, "reachable": reachable.contains(tab) }))
            .collect();
        output.data(&tabs);
    } else {
        for tab in Tab::ALL {
            let mark = if reachable.contains(&tab) { "open" } else { "locked" };
            println!("{:<14} {}", tab.as_str(), mark);
        }
    }

    Ok(())
}

fn open_tabs(output: &Output, id: &str, tabs: &[String]) -> Result<()> {
    let project = Project::open_current()?;
    let mut store = project.store();
    let event_id: EventId = id.parse()?;
    let tabs = tabs
        .iter()
        .map(|tab| tab.parse::<Tab>())
        .collect::<Result<Vec<_>, _>>()?;

    let event = Lifecycle::new(&mut store).event(&event_id)?;
    let mut gate = TabGate::new(project.config().project.tabs.lock_debounce());
    output.verbose_ctx("tabs", &format!("Lock debounce window: {:?}", gate.window()));

    let mut results = Vec::with_capacity(tabs.len());
    for tab in tabs {
        match gate.activate(event.status(), tab, Instant::now()) {
            Ok(tab) => {
                if !output.is_json() {
                    println!("Opened {}", tab);
                }
                results.push(serde_json::json!({ "tab": tab, "opened": true }));
            }
            Err(locked) => {
                if locked.notify {
                    output.warn(&locked.to_string());
                } else {
                    output.verbose_ctx("tabs", &format!("Suppressed repeat notice for {}", tab));
                }
                results.push(serde_json::json!({
                    "tab": tab,
                    "opened": false,
                    "notified": locked.notify,
                }));
            }
        }
    }

    if output.is_json() {
        output.data(&results);
    }

    Ok(())
}
