//! Lineup CLI - Event planning with rosters, shared documents and tasks
//!
//! An event moves through a status lifecycle owned by its creator. Team
//! members and contractors are tracked on a roster, and every document or
//! task carries sharing settings that resolve against the live roster.

pub mod domain;
pub mod storage;
pub mod service;
pub mod cli;

pub use domain::{Event, EventId, EventStatus, Roster, SharingSpec, Task, TaskId, TaskStatus};
pub use service::{AssignmentTracker, CoreError, Lifecycle, TabGate};
