//! # Storage Layer
//!
//! The [`EventStore`] contract plus two implementations.
//!
//! ## Storage Formats
//!
//! | Data | Format | Location |
//! |------|--------|----------|
//! | Events + status history | JSONL | `.lineup/events.jsonl` |
//! | Rosters | JSONL | `.lineup/rosters.jsonl` |
//! | Documents and tasks | JSONL | `.lineup/artifacts.jsonl` |
//! | Config | TOML | `.lineup/config.toml` |
//!
//! ## Concurrency Safety
//!
//! - [`JsonlStore`] uses file locking (`fs2`) for concurrent access
//! - All rewrites are atomic (temp file + rename)
//! - Writers are last-writer-wins; there is no version check
//!
//! ## Key Types
//!
//! - [`Project`] - Entry point for accessing a Lineup project
//! - [`EventStore`] - Contract used by the lifecycle engine and tracker
//! - [`JsonlStore`] - File-backed store
//! - [`MemoryStore`] - In-process store
//! - [`Config`] - Project and global configuration

mod store;
mod jsonl;
mod memory;
mod config;
mod project;

pub use store::{EventStore, StoreError, StoreResult};
pub use jsonl::{EventRecord, JsonlFile, JsonlStore};
pub use memory::MemoryStore;
pub use config::{
    Config, ConfigError, DefaultAudience, GlobalConfig, OutputFormat, ProjectConfig,
    SharingConfig, TabsConfig, UserConfig,
};
pub use project::{Project, ProjectError};
