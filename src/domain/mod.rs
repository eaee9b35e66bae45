//! Domain models for Lineup
//!
//! Contains the core business logic without any I/O concerns.

mod id;
mod event;
mod roster;
mod sharing;
mod artifact;

pub use id::{ContractorId, DocumentId, EventId, IdError, MemberId, PersonId, TaskId};
pub use event::{reachable_tabs, sort_history, Event, EventStatus, StatusHistoryEntry, StatusParseError, Tab};
pub use roster::{Contractor, ContractorStatus, Roster, RosterMember};
pub use sharing::{
    can_view_contractor, can_view_member, resolve, visible_to_member, Audience, AudienceMode,
    DanglingRefs, EffectiveViewers, Shared, SharingSpec,
};
pub use artifact::{Artifact, ArtifactId, ArtifactKind, Document, Task, TaskStatus};
