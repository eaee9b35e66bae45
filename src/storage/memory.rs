//! In-process event store
//!
//! Holds everything in memory. Used by embedders that keep their own
//! persistence elsewhere, and throughout the test suite.

use std::collections::BTreeMap;

use super::jsonl::{created_at, EventRecord};
use super::store::{not_found, EventStore, StoreResult};
use crate::domain::{
    Artifact, ArtifactId, ArtifactKind, Contractor, ContractorId, Event, EventId, MemberId,
    Roster, RosterMember, StatusHistoryEntry, Task,
};

#[derive(Debug, Default)]
pub struct MemoryStore {
    events: BTreeMap<EventId, EventRecord>,
    rosters: BTreeMap<EventId, Roster>,
    artifacts: BTreeMap<ArtifactId, Artifact>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn roster_mut(&mut self, event_id: &EventId) -> &mut Roster {
        self.rosters
            .entry(event_id.clone())
            .or_insert_with(|| Roster::new(event_id.clone()))
    }
}

impl EventStore for MemoryStore {
    fn get_event(&self, id: &EventId) -> StoreResult<Event> {
        self.events
            .get(id)
            .map(|record| record.event.clone())
            .ok_or_else(|| not_found("event", id))
    }

    fn list_events(&self) -> StoreResult<Vec<Event>> {
        let mut events: Vec<Event> = self.events.values().map(|r| r.event.clone()).collect();
        events.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(events)
    }

    fn create_event(&mut self, event: &Event) -> StoreResult<()> {
        self.events.insert(
            event.id.clone(),
            EventRecord {
                event: event.clone(),
                history: Vec::new(),
            },
        );
        Ok(())
    }

    fn commit_transition(
        &mut self,
        event: &Event,
        entry: &StatusHistoryEntry,
    ) -> StoreResult<()> {
        let record = self
            .events
            .get_mut(&event.id)
            .ok_or_else(|| not_found("event", &event.id))?;
        record.event = event.clone();
        record.history.push(entry.clone());
        Ok(())
    }

    fn history(&self, id: &EventId) -> StoreResult<Vec<StatusHistoryEntry>> {
        self.events
            .get(id)
            .map(|record| record.history.clone())
            .ok_or_else(|| not_found("event", id))
    }

    fn roster(&self, event_id: &EventId) -> StoreResult<Roster> {
        Ok(self
            .rosters
            .get(event_id)
            .cloned()
            .unwrap_or_else(|| Roster::new(event_id.clone())))
    }

    fn add_member(&mut self, event_id: &EventId, member: &RosterMember) -> StoreResult<()> {
        self.roster_mut(event_id).team_members.push(member.clone());
        Ok(())
    }

    fn add_contractor(&mut self, event_id: &EventId, contractor: &Contractor) -> StoreResult<()> {
        self.roster_mut(event_id).contractors.push(contractor.clone());
        Ok(())
    }

    fn remove_member(&mut self, event_id: &EventId, member_id: &MemberId) -> StoreResult<()> {
        let roster = self.roster_mut(event_id);
        let before = roster.team_members.len();
        roster.team_members.retain(|m| &m.id != member_id);
        if roster.team_members.len() == before {
            return Err(not_found("member", member_id));
        }
        Ok(())
    }

    fn remove_contractor(
        &mut self,
        event_id: &EventId,
        contractor_id: &ContractorId,
    ) -> StoreResult<()> {
        let roster = self.roster_mut(event_id);
        let before = roster.contractors.len();
        roster.contractors.retain(|c| &c.id != contractor_id);
        if roster.contractors.len() == before {
            return Err(not_found("contractor", contractor_id));
        }
        Ok(())
    }

    fn list_artifacts(
        &self,
        event_id: &EventId,
        kind: Option<ArtifactKind>,
    ) -> StoreResult<Vec<Artifact>> {
        let mut artifacts: Vec<Artifact> = self
            .artifacts
            .values()
            .filter(|a| a.event_id() == event_id)
            .filter(|a| kind.map_or(true, |k| a.kind() == k))
            .cloned()
            .collect();
        artifacts.sort_by_key(created_at);
        Ok(artifacts)
    }

    fn get_artifact(&self, id: &ArtifactId) -> StoreResult<Artifact> {
        self.artifacts
            .get(id)
            .cloned()
            .ok_or_else(|| not_found(&id.kind().to_string(), id))
    }

    fn create_artifact(&mut self, artifact: &Artifact) -> StoreResult<()> {
        self.artifacts.insert(artifact.id(), artifact.clone());
        Ok(())
    }

    fn update_artifact(&mut self, artifact: &Artifact) -> StoreResult<()> {
        let id = artifact.id();
        match self.artifacts.get_mut(&id) {
            Some(slot) => {
                *slot = artifact.clone();
                Ok(())
            }
            None => Err(not_found(&id.kind().to_string(), &id)),
        }
    }

    fn delete_artifact(&mut self, id: &ArtifactId) -> StoreResult<()> {
        self.artifacts
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| not_found(&id.kind().to_string(), id))
    }

    fn tasks_assigned_to(&self, member_id: &MemberId) -> StoreResult<Vec<Task>> {
        Ok(self
            .artifacts
            .values()
            .filter_map(Artifact::as_task)
            .filter(|task| task.is_assigned_to(member_id))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Document, PersonId, SharingSpec};
    use crate::storage::StoreError;

    fn owner() -> PersonId {
        "olivia".parse().unwrap()
    }

    #[test]
    fn missing_event_is_not_found() {
        let store = MemoryStore::new();
        let id = EventId::new("Missing", chrono::Utc::now());

        assert!(matches!(store.get_event(&id), Err(StoreError::NotFound(_))));
        assert!(matches!(store.history(&id), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn roster_of_unknown_event_is_empty() {
        let store = MemoryStore::new();
        let id = EventId::new("Gala", chrono::Utc::now());

        assert!(store.roster(&id).unwrap().is_empty());
    }

    #[test]
    fn list_artifacts_filters_by_event_and_kind() {
        let mut store = MemoryStore::new();
        let gala = Event::new("Gala", owner());
        let fair = Event::new("Fair", owner());
        store.create_event(&gala).unwrap();
        store.create_event(&fair).unwrap();

        store
            .create_artifact(&Document::new(gala.id.clone(), "Plan", SharingSpec::default()).into())
            .unwrap();
        store
            .create_artifact(&Task::new(gala.id.clone(), "Book venue").into())
            .unwrap();
        store
            .create_artifact(&Task::new(fair.id.clone(), "Hire band").into())
            .unwrap();

        assert_eq!(store.list_artifacts(&gala.id, None).unwrap().len(), 2);
        assert_eq!(
            store
                .list_artifacts(&gala.id, Some(ArtifactKind::Document))
                .unwrap()
                .len(),
            1
        );
        assert_eq!(store.list_artifacts(&fair.id, None).unwrap().len(), 1);
    }

    #[test]
    fn update_missing_artifact_fails() {
        let mut store = MemoryStore::new();
        let task: Artifact = Task::new(EventId::new("Gala", chrono::Utc::now()), "x").into();

        assert!(matches!(
            store.update_artifact(&task),
            Err(StoreError::NotFound(_))
        ));
        assert!(matches!(
            store.delete_artifact(&task.id()),
            Err(StoreError::NotFound(_))
        ));
    }
}
