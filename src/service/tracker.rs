//! Roster and assignment tracking
//!
//! Bridges artifacts and roster members. Every visibility answer is
//! computed from a fresh roster read; nothing is cached between calls.
//!
//! Removal rules:
//! - the creator can never be removed, override or not
//! - a member directly assigned to tasks is only removed with an override
//! - removal never touches the tasks; their stale ids are dropped on read

use std::collections::BTreeSet;

use tracing::{debug, info, warn};

use super::error::{BlockReason, CoreError, CoreResult};
use crate::domain::{
    visible_to_member, Artifact, ArtifactId, ArtifactKind, Contractor, ContractorId,
    ContractorStatus, Document, EffectiveViewers, EventId, MemberId, PersonId, Roster,
    RosterMember, Shared, SharingSpec, Task, TaskId, TaskStatus,
};
use crate::storage::EventStore;

/// Outcome of a removal-safety check
#[derive(Debug, Clone, PartialEq)]
pub enum RemovalSafety {
    Safe,
    /// The member is the event creator
    IsCreator,
    /// Tasks that list the member as a direct assignee
    Blocked(Vec<Task>),
}

impl RemovalSafety {
    pub fn is_safe(&self) -> bool {
        matches!(self, RemovalSafety::Safe)
    }

    pub fn blocking_tasks(&self) -> &[Task] {
        match self {
            RemovalSafety::Blocked(tasks) => tasks,
            RemovalSafety::Safe | RemovalSafety::IsCreator => &[],
        }
    }
}

/// Details for a new team member
#[derive(Debug, Clone)]
pub struct NewMember {
    pub person_id: PersonId,
    pub name: String,
    pub role: String,
    pub is_creator: bool,
}

pub struct AssignmentTracker<'s, S: EventStore> {
    store: &'s mut S,
}

impl<'s, S: EventStore> AssignmentTracker<'s, S> {
    pub fn new(store: &'s mut S) -> Self {
        Self { store }
    }

    /// Returns the current roster of an existing event
    pub fn roster(&self, event_id: &EventId) -> CoreResult<Roster> {
        self.store.get_event(event_id)?;
        Ok(self.store.roster(event_id)?)
    }

    /// Adds a team member and returns the updated roster
    pub fn add_member(&mut self, event_id: &EventId, new: NewMember) -> CoreResult<Roster> {
        let event = self.store.get_event(event_id)?;
        let roster = self.store.roster(event_id)?;

        let name = new.name.trim();
        if name.is_empty() {
            return Err(CoreError::ValidationFailed(
                "member name must not be empty".to_string(),
            ));
        }
        if roster.member_for_person(&new.person_id).is_some() {
            return Err(CoreError::ValidationFailed(format!(
                "{} is already on the roster of {}",
                new.person_id, event_id
            )));
        }
        if new.is_creator {
            if roster.creator().is_some() {
                return Err(CoreError::ValidationFailed(format!(
                    "event {} already has a creator",
                    event_id
                )));
            }
            if !event.is_owned_by(&new.person_id) {
                return Err(CoreError::ValidationFailed(format!(
                    "only the event owner ({}) can be the creator",
                    event.created_by
                )));
            }
        }

        let role = match new.role.trim() {
            "" if new.is_creator => "owner",
            "" => "member",
            role => role,
        };
        let mut member = RosterMember::new(new.person_id, name, role);
        member.is_creator = new.is_creator;

        self.store.add_member(event_id, &member)?;
        info!(event = %event_id, member = %member.id, creator = member.is_creator, "added roster member");

        Ok(self.store.roster(event_id)?)
    }

    /// Adds a contractor and returns the updated roster
    pub fn add_contractor(
        &mut self,
        event_id: &EventId,
        company_name: &str,
        status: ContractorStatus,
    ) -> CoreResult<Roster> {
        self.store.get_event(event_id)?;

        let company_name = company_name.trim();
        if company_name.is_empty() {
            return Err(CoreError::ValidationFailed(
                "company name must not be empty".to_string(),
            ));
        }

        let contractor = Contractor::new(company_name, status);
        self.store.add_contractor(event_id, &contractor)?;
        info!(event = %event_id, contractor = %contractor.id, "added contractor");

        Ok(self.store.roster(event_id)?)
    }

    /// Checks whether a team member can be removed without an override
    ///
    /// An event with no creator yet has no protected member; only task
    /// assignments can block.
    pub fn check_removal_safety(
        &self,
        event_id: &EventId,
        member_id: &MemberId,
    ) -> CoreResult<RemovalSafety> {
        let roster = self.roster(event_id)?;
        let member = roster
            .member(member_id)
            .ok_or_else(|| CoreError::NotFound(format!("member {} on event {}", member_id, event_id)))?;

        if member.is_creator {
            return Ok(RemovalSafety::IsCreator);
        }

        let blocking: Vec<Task> = self
            .store
            .tasks_assigned_to(member_id)?
            .into_iter()
            .filter(|task| &task.event_id == event_id)
            .collect();

        if blocking.is_empty() {
            Ok(RemovalSafety::Safe)
        } else {
            Ok(RemovalSafety::Blocked(blocking))
        }
    }

    /// Removes a team member and returns the updated roster
    ///
    /// With `override_blocks` a member with assigned tasks is removed
    /// anyway; the creator is refused regardless.
    pub fn remove_member(
        &mut self,
        event_id: &EventId,
        member_id: &MemberId,
        override_blocks: bool,
    ) -> CoreResult<Roster> {
        match self.check_removal_safety(event_id, member_id)? {
            RemovalSafety::IsCreator => {
                warn!(event = %event_id, member = %member_id, "refused to remove creator");
                return Err(CoreError::RemovalBlocked {
                    member: member_id.clone(),
                    reason: BlockReason::IsCreator,
                });
            }
            RemovalSafety::Blocked(tasks) if !override_blocks => {
                warn!(
                    event = %event_id,
                    member = %member_id,
                    tasks = tasks.len(),
                    "removal blocked by assigned tasks"
                );
                return Err(CoreError::RemovalBlocked {
                    member: member_id.clone(),
                    reason: BlockReason::AssignedTasks(tasks),
                });
            }
            RemovalSafety::Blocked(tasks) => {
                info!(
                    event = %event_id,
                    member = %member_id,
                    tasks = tasks.len(),
                    "removing member despite assigned tasks"
                );
            }
            RemovalSafety::Safe => {}
        }

        self.store.remove_member(event_id, member_id)?;
        info!(event = %event_id, member = %member_id, "removed roster member");

        Ok(self.store.roster(event_id)?)
    }

    /// Removes a contractor and returns the updated roster
    pub fn remove_contractor(
        &mut self,
        event_id: &EventId,
        contractor_id: &ContractorId,
    ) -> CoreResult<Roster> {
        self.store.get_event(event_id)?;
        self.store.remove_contractor(event_id, contractor_id)?;
        info!(event = %event_id, contractor = %contractor_id, "removed contractor");

        Ok(self.store.roster(event_id)?)
    }

    /// Creates a document; selections are limited to the current roster
    pub fn create_document(
        &mut self,
        event_id: &EventId,
        title: &str,
        file_name: Option<&str>,
        sharing: SharingSpec,
    ) -> CoreResult<Document> {
        let title = require_title(title)?;
        let roster = self.roster(event_id)?;

        let mut document = Document::new(event_id.clone(), title, restrict(&sharing, &roster));
        document.file_name = file_name
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string);

        self.store.create_artifact(&Artifact::Document(document.clone()))?;
        info!(event = %event_id, document = %document.id, "created document");
        Ok(document)
    }

    /// Creates an unassigned task
    pub fn create_task(
        &mut self,
        event_id: &EventId,
        title: &str,
        description: Option<&str>,
    ) -> CoreResult<Task> {
        let title = require_title(title)?;
        self.store.get_event(event_id)?;

        let mut task = Task::new(event_id.clone(), title);
        task.description = description
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(str::to_string);

        self.store.create_artifact(&Artifact::Task(task.clone()))?;
        info!(event = %event_id, task = %task.id, "created task");
        Ok(task)
    }

    pub fn artifact(&self, id: &ArtifactId) -> CoreResult<Artifact> {
        Ok(self.store.get_artifact(id)?)
    }

    pub fn artifacts(
        &self,
        event_id: &EventId,
        kind: Option<ArtifactKind>,
    ) -> CoreResult<Vec<Artifact>> {
        self.store.get_event(event_id)?;
        Ok(self.store.list_artifacts(event_id, kind)?)
    }

    /// Assigns an artifact to explicit team members and contractors
    ///
    /// Ids not on the current roster are dropped, not rejected.
    pub fn assign(
        &mut self,
        artifact_id: &ArtifactId,
        team: impl IntoIterator<Item = MemberId>,
        contractors: impl IntoIterator<Item = ContractorId>,
    ) -> CoreResult<Artifact> {
        self.share(artifact_id, SharingSpec::assigned(team, contractors))
    }

    /// Replaces an artifact's sharing spec
    pub fn share(&mut self, artifact_id: &ArtifactId, sharing: SharingSpec) -> CoreResult<Artifact> {
        let mut artifact = self.store.get_artifact(artifact_id)?;
        let roster = self.store.roster(artifact.event_id())?;

        artifact.set_sharing(restrict(&sharing, &roster));
        self.store.update_artifact(&artifact)?;
        info!(artifact = %artifact_id, "updated sharing");

        Ok(artifact)
    }

    /// Sets a task's status; any status may follow any other
    pub fn set_task_status(&mut self, task_id: &TaskId, status: TaskStatus) -> CoreResult<Task> {
        let id = ArtifactId::Task(task_id.clone());
        let mut task = self
            .store
            .get_artifact(&id)?
            .into_task()
            .ok_or_else(|| CoreError::NotFound(format!("task {}", task_id)))?;

        task.set_status(status);
        self.store.update_artifact(&Artifact::Task(task.clone()))?;
        debug!(task = %task_id, status = %status, "task status changed");

        Ok(task)
    }

    /// Deletes an artifact and returns the remaining artifacts of its kind
    pub fn delete_artifact(&mut self, artifact_id: &ArtifactId) -> CoreResult<Vec<Artifact>> {
        let artifact = self.store.get_artifact(artifact_id)?;
        self.store.delete_artifact(artifact_id)?;
        info!(artifact = %artifact_id, "deleted artifact");

        Ok(self
            .store
            .list_artifacts(artifact.event_id(), Some(artifact.kind()))?)
    }

    /// Resolves who may currently see or act on an artifact
    pub fn viewers(&self, artifact_id: &ArtifactId) -> CoreResult<EffectiveViewers> {
        let artifact = self.store.get_artifact(artifact_id)?;
        let roster = self.store.roster(artifact.event_id())?;

        let dangling = artifact.sharing().dangling(&roster);
        if !dangling.is_empty() {
            debug!(
                artifact = %artifact_id,
                team = dangling.team.len(),
                contractors = dangling.contractors.len(),
                "ignoring ids no longer on the roster"
            );
        }

        Ok(artifact.sharing().resolve(&roster))
    }

    /// Tasks storing the member as a direct assignee, including stale ones
    pub fn assigned_tasks(&self, member_id: &MemberId) -> CoreResult<Vec<Task>> {
        Ok(self.store.tasks_assigned_to(member_id)?)
    }

    /// Team members currently assigned to a task (removed members excluded)
    pub fn active_assignees(&self, task_id: &TaskId) -> CoreResult<BTreeSet<MemberId>> {
        Ok(self.viewers(&ArtifactId::Task(task_id.clone()))?.team)
    }

    /// Artifacts of an event the member may currently see
    pub fn visible_to(
        &self,
        event_id: &EventId,
        member_id: &MemberId,
        kind: Option<ArtifactKind>,
    ) -> CoreResult<Vec<Artifact>> {
        let roster = self.roster(event_id)?;
        if !roster.has_member(member_id) {
            return Err(CoreError::NotFound(format!(
                "member {} on event {}",
                member_id, event_id
            )));
        }

        let artifacts = self.store.list_artifacts(event_id, kind)?;
        Ok(visible_to_member(&artifacts, &roster, member_id)
            .into_iter()
            .cloned()
            .collect())
    }
}

fn require_title(title: &str) -> CoreResult<&str> {
    let title = title.trim();
    if title.is_empty() {
        return Err(CoreError::ValidationFailed(
            "title must not be empty".to_string(),
        ));
    }
    Ok(title)
}

fn restrict(sharing: &SharingSpec, roster: &Roster) -> SharingSpec {
    let restricted = sharing.restricted_to(roster);
    let dropped = sharing.dangling(roster);
    if !dropped.is_empty() {
        debug!(
            team = ?dropped.team,
            contractors = ?dropped.contractors,
            "dropped unknown ids from selection"
        );
    }
    restricted
}
