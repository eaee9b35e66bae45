//! Error taxonomy of the lifecycle and assignment services

use thiserror::Error;

use crate::domain::{EventId, IdError, MemberId, PersonId, StatusParseError, Task};
use crate::storage::StoreError;

/// Why a roster member cannot be removed
#[derive(Debug, Clone, PartialEq)]
pub enum BlockReason {
    /// The event creator is never removable
    IsCreator,
    /// Tasks still list the member as a direct assignee
    AssignedTasks(Vec<Task>),
}

impl std::fmt::Display for BlockReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BlockReason::IsCreator => f.write_str("the event creator cannot be removed"),
            BlockReason::AssignedTasks(tasks) => {
                write!(f, "still assigned to {} task(s)", tasks.len())
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("{actor} is not allowed to change event {event}")]
    Unauthorized { actor: PersonId, event: EventId },

    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    #[error("Cannot remove member {member}: {reason}")]
    RemovalBlocked { member: MemberId, reason: BlockReason },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Storage failure: {0:#}")]
    StorageFailure(#[source] anyhow::Error),
}

impl CoreError {
    /// Returns true for errors the user can act on (as opposed to retrying)
    pub fn is_actionable(&self) -> bool {
        matches!(
            self,
            CoreError::Unauthorized { .. }
                | CoreError::ValidationFailed(_)
                | CoreError::RemovalBlocked { .. }
        )
    }

    /// Tasks blocking a removal, if this is a task-blocked removal
    pub fn blocking_tasks(&self) -> Option<&[Task]> {
        match self {
            CoreError::RemovalBlocked {
                reason: BlockReason::AssignedTasks(tasks),
                ..
            } => Some(tasks),
            _ => None,
        }
    }
}

impl From<StoreError> for CoreError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => CoreError::NotFound(what),
            StoreError::Backend(source) => CoreError::StorageFailure(source),
        }
    }
}

impl From<IdError> for CoreError {
    fn from(err: IdError) -> Self {
        CoreError::ValidationFailed(err.to_string())
    }
}

impl From<StatusParseError> for CoreError {
    fn from(err: StatusParseError) -> Self {
        CoreError::ValidationFailed(err.to_string())
    }
}

pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_map_to_core_kinds() {
        let not_found: CoreError = StoreError::NotFound("event e-1234567".to_string()).into();
        assert!(matches!(not_found, CoreError::NotFound(_)));

        let backend: CoreError = StoreError::Backend(anyhow::anyhow!("disk full")).into();
        assert!(matches!(backend, CoreError::StorageFailure(_)));
        assert!(!backend.is_actionable());
    }

    #[test]
    fn parse_errors_are_validation_failures() {
        let err: CoreError = "bogus".parse::<EventId>().unwrap_err().into();
        assert!(matches!(err, CoreError::ValidationFailed(_)));
        assert!(err.is_actionable());
    }

    #[test]
    fn removal_blocked_message() {
        let err = CoreError::RemovalBlocked {
            member: "m-1234567".parse().unwrap(),
            reason: BlockReason::IsCreator,
        };
        assert_eq!(
            err.to_string(),
            "Cannot remove member m-1234567: the event creator cannot be removed"
        );
        assert!(err.blocking_tasks().is_none());
    }
}
