//! Event domain model
//!
//! An event moves through a lifecycle of statuses. The status decides which
//! functional areas ("tabs") of the event are reachable. Status changes are
//! recorded in an append-only history log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use super::id::{EventId, PersonId};

#[derive(Debug, Error, PartialEq)]
pub enum StatusParseError {
    #[error("Unknown event status '{0}' (expected draft, planning, confirmed, in_progress, completed or cancelled)")]
    UnknownStatus(String),

    #[error("Unknown tab '{0}' (expected overview, team, contractors, tasks, documents or notifications)")]
    UnknownTab(String),
}

/// Lifecycle status of an event
///
/// `draft -> planning -> confirmed -> in_progress -> completed`, with
/// `cancelled` reachable from any non-terminal status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    #[default]
    Draft,
    Planning,
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
}

impl EventStatus {
    pub const ALL: [EventStatus; 6] = [
        EventStatus::Draft,
        EventStatus::Planning,
        EventStatus::Confirmed,
        EventStatus::InProgress,
        EventStatus::Completed,
        EventStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Draft => "draft",
            EventStatus::Planning => "planning",
            EventStatus::Confirmed => "confirmed",
            EventStatus::InProgress => "in_progress",
            EventStatus::Completed => "completed",
            EventStatus::Cancelled => "cancelled",
        }
    }

    /// Returns true for statuses with no forward progress
    ///
    /// Informational only: the transition engine still accepts moves out of
    /// a terminal status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, EventStatus::Completed | EventStatus::Cancelled)
    }

    /// Returns the next status on the main path, if any
    pub fn next(&self) -> Option<EventStatus> {
        match self {
            EventStatus::Draft => Some(EventStatus::Planning),
            EventStatus::Planning => Some(EventStatus::Confirmed),
            EventStatus::Confirmed => Some(EventStatus::InProgress),
            EventStatus::InProgress => Some(EventStatus::Completed),
            EventStatus::Completed | EventStatus::Cancelled => None,
        }
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventStatus {
    type Err = StatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        EventStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == normalized)
            .ok_or_else(|| StatusParseError::UnknownStatus(s.to_string()))
    }
}

/// Functional area of an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tab {
    Overview,
    Team,
    Contractors,
    Tasks,
    Documents,
    Notifications,
}

impl Tab {
    pub const ALL: [Tab; 6] = [
        Tab::Overview,
        Tab::Team,
        Tab::Contractors,
        Tab::Tasks,
        Tab::Documents,
        Tab::Notifications,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tab::Overview => "overview",
            Tab::Team => "team",
            Tab::Contractors => "contractors",
            Tab::Tasks => "tasks",
            Tab::Documents => "documents",
            Tab::Notifications => "notifications",
        }
    }
}

impl fmt::Display for Tab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tab {
    type Err = StatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        Tab::ALL
            .into_iter()
            .find(|tab| tab.as_str() == normalized)
            .ok_or_else(|| StatusParseError::UnknownTab(s.to_string()))
    }
}

/// Returns the tabs reachable for an event in the given status
///
/// A draft event only exposes its overview; every other status unlocks all
/// tabs.
pub fn reachable_tabs(status: EventStatus) -> BTreeSet<Tab> {
    match status {
        EventStatus::Draft => BTreeSet::from([Tab::Overview]),
        _ => Tab::ALL.into_iter().collect(),
    }
}

/// An event record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,

    pub title: String,

    /// Only changed through [`Event::apply_status`], which the lifecycle
    /// engine calls together with a history append.
    status: EventStatus,

    /// Owner of the event; the only person allowed to change its status
    pub created_by: PersonId,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Event {
    /// Creates a new draft event
    pub fn new(title: impl Into<String>, created_by: PersonId) -> Self {
        let title = title.into();
        let now = Utc::now();
        Self {
            id: EventId::new(&title, now),
            title,
            status: EventStatus::Draft,
            created_by,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn status(&self) -> EventStatus {
        self.status
    }

    /// Returns true if the given person owns this event
    pub fn is_owned_by(&self, person: &PersonId) -> bool {
        &self.created_by == person
    }

    pub fn reachable_tabs(&self) -> BTreeSet<Tab> {
        reachable_tabs(self.status)
    }

    /// Sets the status and bumps `updated_at`
    pub(crate) fn apply_status(&mut self, status: EventStatus, at: DateTime<Utc>) {
        self.status = status;
        self.updated_at = at;
    }
}

/// One entry of an event's status log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusHistoryEntry {
    pub event_id: EventId,

    /// None for the first entry of an event
    pub previous_status: Option<EventStatus>,

    pub new_status: EventStatus,

    pub changed_by: PersonId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    pub timestamp: DateTime<Utc>,

    /// 1-based insertion order within the event, breaks timestamp ties
    pub sequence: u64,
}

/// Sorts history entries by timestamp, then insertion order
pub fn sort_history(entries: &mut [StatusHistoryEntry]) {
    entries.sort_by(|a, b| {
        a.timestamp
            .cmp(&b.timestamp)
            .then_with(|| a.sequence.cmp(&b.sequence))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owner() -> PersonId {
        "olivia".parse().unwrap()
    }

    #[test]
    fn new_event_is_draft() {
        let event = Event::new("Summer Gala", owner());
        assert_eq!(event.status(), EventStatus::Draft);
        assert!(event.is_owned_by(&owner()));
        assert!(!event.is_owned_by(&"mallory".parse().unwrap()));
    }

    #[test]
    fn draft_only_reaches_overview() {
        let tabs = reachable_tabs(EventStatus::Draft);
        assert_eq!(tabs, BTreeSet::from([Tab::Overview]));
    }

    #[test]
    fn non_draft_reaches_every_tab() {
        for status in EventStatus::ALL.into_iter().filter(|s| *s != EventStatus::Draft) {
            assert_eq!(reachable_tabs(status).len(), Tab::ALL.len(), "{status}");
        }
    }

    #[test]
    fn status_parsing() {
        assert_eq!("planning".parse::<EventStatus>(), Ok(EventStatus::Planning));
        assert_eq!("In-Progress".parse::<EventStatus>(), Ok(EventStatus::InProgress));
        assert_eq!(
            "archived".parse::<EventStatus>(),
            Err(StatusParseError::UnknownStatus("archived".to_string()))
        );
    }

    #[test]
    fn tab_parsing() {
        assert_eq!("Documents".parse::<Tab>(), Ok(Tab::Documents));
        assert!("budget".parse::<Tab>().is_err());
    }

    #[test]
    fn status_serializes_snake_case() {
        let json = serde_json::to_string(&EventStatus::InProgress).unwrap();
        assert_eq!(json, "\"in_progress\"");
    }

    #[test]
    fn terminal_statuses() {
        assert!(EventStatus::Completed.is_terminal());
        assert!(EventStatus::Cancelled.is_terminal());
        assert!(!EventStatus::Confirmed.is_terminal());
        assert_eq!(EventStatus::Completed.next(), None);
        assert_eq!(EventStatus::Draft.next(), Some(EventStatus::Planning));
    }

    #[test]
    fn history_sort_breaks_ties_by_sequence() {
        let event = Event::new("Gala", owner());
        let ts = Utc::now();
        let entry = |sequence, new_status| StatusHistoryEntry {
            event_id: event.id.clone(),
            previous_status: None,
            new_status,
            changed_by: owner(),
            reason: None,
            timestamp: ts,
            sequence,
        };

        let mut entries = vec![
            entry(2, EventStatus::Confirmed),
            entry(1, EventStatus::Planning),
        ];
        sort_history(&mut entries);

        assert_eq!(entries[0].sequence, 1);
        assert_eq!(entries[1].sequence, 2);
    }

    #[test]
    fn event_serde_keeps_status() {
        let mut event = Event::new("Gala", owner());
        event.apply_status(EventStatus::Confirmed, Utc::now());

        let json = serde_json::to_string(&event).unwrap();
        let parsed: Event = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.status(), EventStatus::Confirmed);
        assert_eq!(parsed, event);
    }
}
