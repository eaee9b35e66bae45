//! # Command-Line Interface
//!
//! User-facing CLI commands and output formatting.
//!
//! ## Command Groups
//!
//! | Group | Purpose | Examples |
//! |-------|---------|----------|
//! | Core | Project setup | `init` |
//! | Event | Lifecycle and tabs | `event new`, `event status`, `event open` |
//! | Roster | Team and contractors | `roster add`, `roster check`, `roster remove` |
//! | Doc | Shared documents | `doc add`, `doc share`, `doc viewers` |
//! | Task | Assignment | `task add`, `task assign`, `task assigned` |
//!
//! ## Output Formats
//!
//! All commands support `--format` flag:
//! - `text` (default) - Human-readable output
//! - `json` - Machine-parseable JSON
//!
//! ## Acting User
//!
//! Owner-only operations act as `--as <person>`, falling back to
//! `[user] name` in the config, then `$LINEUP_USER` and `$USER`.
//!
//! ## Verbose Mode
//!
//! Use `--verbose` (or `-v`) for debug output and library traces:
//! ```bash
//! lineup --verbose roster remove e-1234567 m-7654321
//! ```
//!
//! ## Entry Point
//!
//! Call [`run()`] to parse arguments and execute the appropriate command.

mod app;
mod output;
mod event;
mod roster;
mod doc;
mod task;

pub use app::{run, Cli, Commands};
pub use output::{Output, OutputFormat};
