//! Status transition engine
//!
//! The only sanctioned way to change an event's status. Each transition is
//! committed to the store together with its history entry in one write, so
//! callers never observe a status without its log entry or the reverse.
//!
//! There is no expected-status precondition: two concurrent transitions on
//! the same event race and the last write wins.

use std::collections::BTreeSet;

use chrono::Utc;
use tracing::{debug, info, warn};

use super::error::{CoreError, CoreResult};
use crate::domain::{
    reachable_tabs, sort_history, Event, EventId, EventStatus, PersonId, StatusHistoryEntry, Tab,
};
use crate::storage::EventStore;

pub struct Lifecycle<'s, S: EventStore> {
    store: &'s mut S,
}

impl<'s, S: EventStore> Lifecycle<'s, S> {
    pub fn new(store: &'s mut S) -> Self {
        Self { store }
    }

    /// Creates a new draft event owned by `owner`
    pub fn create_event(&mut self, title: &str, owner: PersonId) -> CoreResult<Event> {
        let title = title.trim();
        if title.is_empty() {
            return Err(CoreError::ValidationFailed(
                "event title must not be empty".to_string(),
            ));
        }

        let event = Event::new(title, owner);
        self.store.create_event(&event)?;
        info!(event = %event.id, owner = %event.created_by, "created event");
        Ok(event)
    }

    pub fn event(&self, id: &EventId) -> CoreResult<Event> {
        Ok(self.store.get_event(id)?)
    }

    pub fn events(&self) -> CoreResult<Vec<Event>> {
        Ok(self.store.list_events()?)
    }

    /// Moves an event to `target` on behalf of `actor`
    ///
    /// Only the event owner may transition it. Any target is accepted,
    /// including the current status and moves out of terminal statuses.
    pub fn transition(
        &mut self,
        event_id: &EventId,
        target: EventStatus,
        actor: &PersonId,
        reason: Option<&str>,
    ) -> CoreResult<Event> {
        let event = self.store.get_event(event_id)?;

        if !event.is_owned_by(actor) {
            warn!(event = %event_id, actor = %actor, "rejected status change by non-owner");
            return Err(CoreError::Unauthorized {
                actor: actor.clone(),
                event: event_id.clone(),
            });
        }

        let history = self.store.history(event_id)?;
        let now = Utc::now();

        let entry = StatusHistoryEntry {
            event_id: event_id.clone(),
            previous_status: if history.is_empty() {
                None
            } else {
                Some(event.status())
            },
            new_status: target,
            changed_by: actor.clone(),
            reason: reason
                .map(str::trim)
                .filter(|r| !r.is_empty())
                .map(str::to_string),
            timestamp: now,
            sequence: history.len() as u64 + 1,
        };

        let mut updated = event;
        updated.apply_status(target, now);

        self.store.commit_transition(&updated, &entry)?;

        info!(
            event = %event_id,
            from = ?entry.previous_status,
            to = %target,
            actor = %actor,
            "event status changed"
        );
        if target.is_terminal() {
            debug!(event = %event_id, "event reached a terminal status");
        }

        Ok(updated)
    }

    /// Returns the status log ordered by timestamp, then insertion order
    pub fn history(&self, event_id: &EventId) -> CoreResult<Vec<StatusHistoryEntry>> {
        let mut entries = self.store.history(event_id)?;
        sort_history(&mut entries);
        Ok(entries)
    }

    /// Returns the tabs reachable for the event's current status
    pub fn tabs(&self, event_id: &EventId) -> CoreResult<BTreeSet<Tab>> {
        let event = self.store.get_event(event_id)?;
        Ok(reachable_tabs(event.status()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        Artifact, ArtifactId, ArtifactKind, Contractor, ContractorId, MemberId, Roster,
        RosterMember, Task,
    };
    use crate::storage::{MemoryStore, StoreError, StoreResult};

    fn person(name: &str) -> PersonId {
        name.parse().unwrap()
    }

    /// Delegates to a memory store but fails every transition commit
    #[derive(Default)]
    struct FailingCommits {
        inner: MemoryStore,
    }

    impl EventStore for FailingCommits {
        fn get_event(&self, id: &EventId) -> StoreResult<Event> {
            self.inner.get_event(id)
        }
        fn list_events(&self) -> StoreResult<Vec<Event>> {
            self.inner.list_events()
        }
        fn create_event(&mut self, event: &Event) -> StoreResult<()> {
            self.inner.create_event(event)
        }
        fn commit_transition(&mut self, _: &Event, _: &StatusHistoryEntry) -> StoreResult<()> {
            Err(StoreError::Backend(anyhow::anyhow!("connection reset")))
        }
        fn history(&self, id: &EventId) -> StoreResult<Vec<StatusHistoryEntry>> {
            self.inner.history(id)
        }
        fn roster(&self, event_id: &EventId) -> StoreResult<Roster> {
            self.inner.roster(event_id)
        }
        fn add_member(&mut self, event_id: &EventId, member: &RosterMember) -> StoreResult<()> {
            self.inner.add_member(event_id, member)
        }
        fn add_contractor(&mut self, event_id: &EventId, c: &Contractor) -> StoreResult<()> {
            self.inner.add_contractor(event_id, c)
        }
        fn remove_member(&mut self, event_id: &EventId, id: &MemberId) -> StoreResult<()> {
            self.inner.remove_member(event_id, id)
        }
        fn remove_contractor(&mut self, event_id: &EventId, id: &ContractorId) -> StoreResult<()> {
            self.inner.remove_contractor(event_id, id)
        }
        fn list_artifacts(
            &self,
            event_id: &EventId,
            kind: Option<ArtifactKind>,
        ) -> StoreResult<Vec<Artifact>> {
            self.inner.list_artifacts(event_id, kind)
        }
        fn get_artifact(&self, id: &ArtifactId) -> StoreResult<Artifact> {
            self.inner.get_artifact(id)
        }
        fn create_artifact(&mut self, artifact: &Artifact) -> StoreResult<()> {
            self.inner.create_artifact(artifact)
        }
        fn update_artifact(&mut self, artifact: &Artifact) -> StoreResult<()> {
            self.inner.update_artifact(artifact)
        }
        fn delete_artifact(&mut self, id: &ArtifactId) -> StoreResult<()> {
            self.inner.delete_artifact(id)
        }
        fn tasks_assigned_to(&self, member_id: &MemberId) -> StoreResult<Vec<Task>> {
            self.inner.tasks_assigned_to(member_id)
        }
    }

    #[test]
    fn create_event_rejects_blank_title() {
        let mut store = MemoryStore::new();
        let err = Lifecycle::new(&mut store)
            .create_event("   ", person("olivia"))
            .unwrap_err();

        assert!(matches!(err, CoreError::ValidationFailed(_)));
    }

    #[test]
    fn non_owner_is_unauthorized() {
        let mut store = MemoryStore::new();
        let mut engine = Lifecycle::new(&mut store);
        let event = engine.create_event("Gala", person("olivia")).unwrap();

        let err = engine
            .transition(&event.id, EventStatus::Planning, &person("mallory"), None)
            .unwrap_err();

        assert!(matches!(err, CoreError::Unauthorized { .. }));
        assert_eq!(engine.event(&event.id).unwrap().status(), EventStatus::Draft);
        assert!(engine.history(&event.id).unwrap().is_empty());
    }

    #[test]
    fn owner_transition_records_first_entry_without_previous() {
        let mut store = MemoryStore::new();
        let mut engine = Lifecycle::new(&mut store);
        let owner = person("olivia");
        let event = engine.create_event("Gala", owner.clone()).unwrap();

        let updated = engine
            .transition(&event.id, EventStatus::Planning, &owner, Some("kickoff"))
            .unwrap();

        assert_eq!(updated.status(), EventStatus::Planning);
        let history = engine.history(&event.id).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].previous_status, None);
        assert_eq!(history[0].new_status, EventStatus::Planning);
        assert_eq!(history[0].reason.as_deref(), Some("kickoff"));
        assert_eq!(history[0].changed_by, owner);
    }

    #[test]
    fn history_chains_previous_statuses() {
        let mut store = MemoryStore::new();
        let mut engine = Lifecycle::new(&mut store);
        let owner = person("olivia");
        let event = engine.create_event("Gala", owner.clone()).unwrap();

        let path = [
            EventStatus::Planning,
            EventStatus::Confirmed,
            EventStatus::Cancelled,
            EventStatus::Planning,
        ];
        for status in path {
            engine.transition(&event.id, status, &owner, None).unwrap();
        }

        let history = engine.history(&event.id).unwrap();
        assert_eq!(history.len(), path.len());
        for pair in history.windows(2) {
            assert_eq!(pair[1].previous_status, Some(pair[0].new_status));
        }
        assert_eq!(history.last().unwrap().sequence, 4);
    }

    #[test]
    fn transition_to_same_status_is_recorded() {
        let mut store = MemoryStore::new();
        let mut engine = Lifecycle::new(&mut store);
        let owner = person("olivia");
        let event = engine.create_event("Gala", owner.clone()).unwrap();

        engine.transition(&event.id, EventStatus::Draft, &owner, None).unwrap();

        assert_eq!(engine.history(&event.id).unwrap().len(), 1);
    }

    #[test]
    fn blank_reason_is_dropped() {
        let mut store = MemoryStore::new();
        let mut engine = Lifecycle::new(&mut store);
        let owner = person("olivia");
        let event = engine.create_event("Gala", owner.clone()).unwrap();

        engine
            .transition(&event.id, EventStatus::Planning, &owner, Some("  "))
            .unwrap();

        assert!(engine.history(&event.id).unwrap()[0].reason.is_none());
    }

    #[test]
    fn failed_commit_changes_nothing() {
        let mut store = FailingCommits::default();
        let mut engine = Lifecycle::new(&mut store);
        let owner = person("olivia");
        let event = engine.create_event("Gala", owner.clone()).unwrap();

        let err = engine
            .transition(&event.id, EventStatus::Planning, &owner, None)
            .unwrap_err();

        assert!(matches!(err, CoreError::StorageFailure(_)));
        assert_eq!(engine.event(&event.id).unwrap().status(), EventStatus::Draft);
        assert!(engine.history(&event.id).unwrap().is_empty());
    }

    #[test]
    fn missing_event_is_not_found() {
        let mut store = MemoryStore::new();
        let mut engine = Lifecycle::new(&mut store);
        let id = EventId::new("Ghost", Utc::now());

        let err = engine
            .transition(&id, EventStatus::Planning, &person("olivia"), None)
            .unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
    }

    #[test]
    fn tabs_follow_status() {
        let mut store = MemoryStore::new();
        let mut engine = Lifecycle::new(&mut store);
        let owner = person("olivia");
        let event = engine.create_event("Gala", owner.clone()).unwrap();

        assert_eq!(engine.tabs(&event.id).unwrap(), BTreeSet::from([Tab::Overview]));

        engine
            .transition(&event.id, EventStatus::Planning, &owner, None)
            .unwrap();
        assert_eq!(engine.tabs(&event.id).unwrap().len(), Tab::ALL.len());
    }
}
