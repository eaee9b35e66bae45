//! # Services
//!
//! Operations on top of an [`EventStore`](crate::storage::EventStore).
//!
//! - [`Lifecycle`] - Event creation and owner-only status transitions
//! - [`AssignmentTracker`] - Roster changes, sharing, assignment and removal safety
//! - [`TabGate`] - Status-driven tab locking with rejection debounce
//!
//! Every fallible operation returns a [`CoreError`].

mod error;
mod lifecycle;
mod tabs;
mod tracker;

pub use error::{BlockReason, CoreError, CoreResult};
pub use lifecycle::Lifecycle;
pub use tabs::{TabGate, TabLocked};
pub use tracker::{AssignmentTracker, NewMember, RemovalSafety};
