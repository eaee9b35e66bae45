//! Event store contract
//!
//! The lifecycle engine and the assignment tracker only talk to persistence
//! through [`EventStore`]. Implementations own transport, retries and
//! locking; the core never retries a failed call.

use thiserror::Error;

use crate::domain::{
    Artifact, ArtifactId, ArtifactKind, Contractor, ContractorId, Event, EventId, MemberId,
    Roster, RosterMember, StatusHistoryEntry, Task,
};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(String),

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Synchronous request/response access to events, rosters and artifacts
///
/// Writes are last-writer-wins; there is no optimistic-concurrency token.
pub trait EventStore {
    fn get_event(&self, id: &EventId) -> StoreResult<Event>;

    fn list_events(&self) -> StoreResult<Vec<Event>>;

    fn create_event(&mut self, event: &Event) -> StoreResult<()>;

    /// Persists an updated event together with its new history entry
    ///
    /// Must be all-or-nothing: after an error neither the event nor its
    /// history may have changed.
    fn commit_transition(&mut self, event: &Event, entry: &StatusHistoryEntry)
        -> StoreResult<()>;

    /// Returns the status log of an event, in insertion order
    fn history(&self, id: &EventId) -> StoreResult<Vec<StatusHistoryEntry>>;

    fn roster(&self, event_id: &EventId) -> StoreResult<Roster>;

    fn add_member(&mut self, event_id: &EventId, member: &RosterMember) -> StoreResult<()>;

    fn add_contractor(&mut self, event_id: &EventId, contractor: &Contractor) -> StoreResult<()>;

    fn remove_member(&mut self, event_id: &EventId, member_id: &MemberId) -> StoreResult<()>;

    fn remove_contractor(
        &mut self,
        event_id: &EventId,
        contractor_id: &ContractorId,
    ) -> StoreResult<()>;

    /// Lists artifacts of an event, oldest first, optionally of one kind
    fn list_artifacts(
        &self,
        event_id: &EventId,
        kind: Option<ArtifactKind>,
    ) -> StoreResult<Vec<Artifact>>;

    fn get_artifact(&self, id: &ArtifactId) -> StoreResult<Artifact>;

    fn create_artifact(&mut self, artifact: &Artifact) -> StoreResult<()>;

    fn update_artifact(&mut self, artifact: &Artifact) -> StoreResult<()>;

    fn delete_artifact(&mut self, id: &ArtifactId) -> StoreResult<()>;

    /// Tasks whose stored team selection lists the member
    fn tasks_assigned_to(&self, member_id: &MemberId) -> StoreResult<Vec<Task>>;
}

pub(crate) fn not_found(kind: &str, id: impl std::fmt::Display) -> StoreError {
    StoreError::NotFound(format!("{} {}", kind, id))
}
