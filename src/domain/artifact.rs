//! Shared artifacts: documents and tasks
//!
//! Both kinds carry a [`SharingSpec`]. Task assignees are never stored on
//! their own; they are the team selection of the task's sharing spec,
//! resolved against the live roster.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use super::id::{DocumentId, EventId, IdError, MemberId, TaskId};
use super::sharing::{Shared, SharingSpec};

/// Status of a task
///
/// Transitions are free-form: any status may follow any other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Todo,
    InProgress,
    Completed,
    Cancelled,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
            TaskStatus::Cancelled => "cancelled",
        }
    }

    /// Returns true if this status represents completion
    pub fn is_complete(&self) -> bool {
        matches!(self, TaskStatus::Completed)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "todo" => Ok(TaskStatus::Todo),
            "in_progress" => Ok(TaskStatus::InProgress),
            "completed" | "done" => Ok(TaskStatus::Completed),
            "cancelled" | "canceled" => Ok(TaskStatus::Cancelled),
            other => Err(format!("Unknown task status '{}'", other)),
        }
    }
}

/// A document attached to an event
///
/// The blob itself lives in external file storage; only its name and the
/// sharing metadata are kept here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,

    pub event_id: EventId,

    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,

    pub sharing: SharingSpec,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Document {
    pub fn new(event_id: EventId, title: impl Into<String>, sharing: SharingSpec) -> Self {
        let title = title.into();
        let now = Utc::now();
        Self {
            id: DocumentId::new(&title, now),
            event_id,
            title,
            file_name: None,
            sharing,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A task attached to an event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,

    pub event_id: EventId,

    pub title: String,

    pub status: TaskStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub sharing: SharingSpec,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,

    /// When the task was completed (if completed)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Task {
    /// Creates a new task; unassigned tasks are visible to nobody
    pub fn new(event_id: EventId, title: impl Into<String>) -> Self {
        let title = title.into();
        let now = Utc::now();
        Self {
            id: TaskId::new(&title, now),
            event_id,
            title,
            status: TaskStatus::Todo,
            description: None,
            sharing: SharingSpec::private(),
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }

    /// Sets any status; `completed_at` follows entering/leaving `Completed`
    pub fn set_status(&mut self, status: TaskStatus) {
        if self.status == status {
            return;
        }
        let now = Utc::now();
        self.status = status;
        self.updated_at = now;
        self.completed_at = if status.is_complete() { Some(now) } else { None };
    }

    /// Team members stored as direct assignees (may include dangling ids)
    pub fn assigned_member_ids(&self) -> BTreeSet<MemberId> {
        self.sharing.team.selection().cloned().unwrap_or_default()
    }

    /// Returns true if the member is directly assigned (not via "all")
    pub fn is_assigned_to(&self, member: &MemberId) -> bool {
        self.sharing.team.directly_includes(member)
    }
}

impl Shared for Document {
    fn sharing(&self) -> &SharingSpec {
        &self.sharing
    }
}

impl Shared for Task {
    fn sharing(&self) -> &SharingSpec {
        &self.sharing
    }
}

/// Kind of artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Document,
    Task,
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactKind::Document => f.write_str("document"),
            ArtifactKind::Task => f.write_str("task"),
        }
    }
}

/// ID of either kind of artifact
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ArtifactId {
    Document(DocumentId),
    Task(TaskId),
}

impl ArtifactId {
    pub fn kind(&self) -> ArtifactKind {
        match self {
            ArtifactId::Document(_) => ArtifactKind::Document,
            ArtifactId::Task(_) => ArtifactKind::Task,
        }
    }
}

impl fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactId::Document(id) => write!(f, "{}", id),
            ArtifactId::Task(id) => write!(f, "{}", id),
        }
    }
}

impl FromStr for ArtifactId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.starts_with("d-") {
            s.parse().map(ArtifactId::Document)
        } else if trimmed.starts_with("t-") {
            s.parse().map(ArtifactId::Task)
        } else {
            Err(IdError::UnknownArtifact(trimmed.to_string()))
        }
    }
}

impl TryFrom<String> for ArtifactId {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ArtifactId> for String {
    fn from(id: ArtifactId) -> Self {
        id.to_string()
    }
}

impl From<DocumentId> for ArtifactId {
    fn from(id: DocumentId) -> Self {
        ArtifactId::Document(id)
    }
}

impl From<TaskId> for ArtifactId {
    fn from(id: TaskId) -> Self {
        ArtifactId::Task(id)
    }
}

/// A document or a task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Artifact {
    Document(Document),
    Task(Task),
}

impl Artifact {
    pub fn id(&self) -> ArtifactId {
        match self {
            Artifact::Document(doc) => ArtifactId::Document(doc.id.clone()),
            Artifact::Task(task) => ArtifactId::Task(task.id.clone()),
        }
    }

    pub fn kind(&self) -> ArtifactKind {
        match self {
            Artifact::Document(_) => ArtifactKind::Document,
            Artifact::Task(_) => ArtifactKind::Task,
        }
    }

    pub fn event_id(&self) -> &EventId {
        match self {
            Artifact::Document(doc) => &doc.event_id,
            Artifact::Task(task) => &task.event_id,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Artifact::Document(doc) => &doc.title,
            Artifact::Task(task) => &task.title,
        }
    }

    /// Replaces the sharing spec and bumps `updated_at`
    pub fn set_sharing(&mut self, sharing: SharingSpec) {
        let now = Utc::now();
        match self {
            Artifact::Document(doc) => {
                doc.sharing = sharing;
                doc.updated_at = now;
            }
            Artifact::Task(task) => {
                task.sharing = sharing;
                task.updated_at = now;
            }
        }
    }

    pub fn as_task(&self) -> Option<&Task> {
        match self {
            Artifact::Task(task) => Some(task),
            Artifact::Document(_) => None,
        }
    }

    pub fn into_task(self) -> Option<Task> {
        match self {
            Artifact::Task(task) => Some(task),
            Artifact::Document(_) => None,
        }
    }
}

impl Shared for Artifact {
    fn sharing(&self) -> &SharingSpec {
        match self {
            Artifact::Document(doc) => &doc.sharing,
            Artifact::Task(task) => &task.sharing,
        }
    }
}

impl From<Document> for Artifact {
    fn from(doc: Document) -> Self {
        Artifact::Document(doc)
    }
}

impl From<Task> for Artifact {
    fn from(task: Task) -> Self {
        Artifact::Task(task)
    }
}
