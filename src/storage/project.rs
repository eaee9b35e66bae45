//! Project management
//!
//! Handles project initialization and provides access to the store.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use thiserror::Error;

use super::{Config, JsonlStore};

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("Not in a lineup project. Run 'lineup init' first.")]
    NotInProject,
}

/// A Lineup project
pub struct Project {
    root: PathBuf,
    config: Config,
}

impl Project {
    /// Opens an existing project at the given path
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let lineup_dir = root.join(".lineup");

        if !lineup_dir.is_dir() {
            return Err(ProjectError::NotInProject.into());
        }

        let config = Config::for_project(&root)?;
        config.validate()?;

        Ok(Self { root, config })
    }

    /// Opens the project at the current directory or a parent
    pub fn open_current() -> Result<Self> {
        let root = Config::find_project_root().ok_or(ProjectError::NotInProject)?;

        Self::open(root)
    }

    /// Initializes a new project at the given path
    pub fn init(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let lineup_dir = root.join(".lineup");

        fs::create_dir_all(&lineup_dir).with_context(|| {
            format!(
                "Failed to create .lineup directory: {}",
                lineup_dir.display()
            )
        })?;

        // Create default config
        let config_path = lineup_dir.join("config.toml");
        if !config_path.exists() {
            let default_config = r#"# Lineup configuration

[tabs]
# Repeated clicks on a locked tab within this window are not re-notified
lock_debounce_ms = 1000

[user]
# Acting user (defaults to $LINEUP_USER, then $USER)
# name = "olivia"

[sharing]
# Default audience for new documents: "all" or "none"
team = "all"
contractors = "none"
"#;
            fs::write(&config_path, default_config)
                .with_context(|| format!("Failed to write config: {}", config_path.display()))?;
        }

        Self::open(root)
    }

    /// Returns the project root path
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the .lineup directory path
    pub fn lineup_dir(&self) -> PathBuf {
        self.root.join(".lineup")
    }

    /// Returns the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the event store
    pub fn store(&self) -> JsonlStore {
        JsonlStore::for_project(&self.root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn init_creates_structure() {
        let dir = TempDir::new().unwrap();
        let project = Project::init(dir.path()).unwrap();

        assert!(project.lineup_dir().is_dir());
        assert!(project.lineup_dir().join("config.toml").is_file());
    }

    #[test]
    fn init_is_idempotent() {
        let dir = TempDir::new().unwrap();

        Project::init(dir.path()).unwrap();
        Project::init(dir.path()).unwrap(); // Should not fail

        assert!(dir.path().join(".lineup").is_dir());
    }

    #[test]
    fn default_config_file_parses() {
        let dir = TempDir::new().unwrap();
        let project = Project::init(dir.path()).unwrap();

        assert_eq!(project.config().project.tabs.lock_debounce_ms, 1000);
    }

    #[test]
    fn open_non_project_fails() {
        let dir = TempDir::new().unwrap();
        let result = Project::open(dir.path());

        assert!(result.is_err());
    }

    #[test]
    fn store_lives_in_lineup_dir() {
        let dir = TempDir::new().unwrap();
        let project = Project::init(dir.path()).unwrap();

        assert!(project.store().events_path().starts_with(project.lineup_dir()));
    }
}
