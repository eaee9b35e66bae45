//! Configuration handling for Lineup
//!
//! Configuration is stored in `.lineup/config.toml` (project) and
//! `~/.config/lineup/config.toml` (global).

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{Audience, ContractorId, MemberId};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to parse configuration: {0}")]
    Parse(String),
}

/// Tab gating settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TabsConfig {
    /// Window in milliseconds during which repeated locked-tab rejections
    /// are not re-notified
    pub lock_debounce_ms: u64,
}

impl Default for TabsConfig {
    fn default() -> Self {
        Self {
            lock_debounce_ms: 1000,
        }
    }
}

impl TabsConfig {
    pub fn lock_debounce(&self) -> Duration {
        Duration::from_millis(self.lock_debounce_ms)
    }
}

/// Identity of the acting user
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct UserConfig {
    /// User name (defaults to $LINEUP_USER, then $USER)
    pub name: Option<String>,
}

/// Default audience for one sharing axis of new documents
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DefaultAudience {
    All,
    None,
}

impl DefaultAudience {
    pub fn as_str(&self) -> &str {
        match self {
            DefaultAudience::All => "all",
            DefaultAudience::None => "none",
        }
    }

    pub fn to_audience<Id>(self) -> Audience<Id> {
        match self {
            DefaultAudience::All => Audience::All,
            DefaultAudience::None => Audience::None,
        }
    }
}

/// Sharing defaults applied when a document is added without flags
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SharingConfig {
    pub team: DefaultAudience,
    pub contractors: DefaultAudience,
}

impl Default for SharingConfig {
    fn default() -> Self {
        Self {
            team: DefaultAudience::All,
            contractors: DefaultAudience::None,
        }
    }
}

impl SharingConfig {
    pub fn team_audience(&self) -> Audience<MemberId> {
        self.team.to_audience()
    }

    pub fn contractor_audience(&self) -> Audience<ContractorId> {
        self.contractors.to_audience()
    }
}

/// Project-level configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ProjectConfig {
    /// Tab gating settings
    pub tabs: TabsConfig,

    /// Acting user override for this project
    pub user: UserConfig,

    /// Sharing defaults for new documents
    pub sharing: SharingConfig,
}

/// Global user configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct GlobalConfig {
    /// Default output format (text or json)
    pub default_format: OutputFormat,

    /// Acting user
    pub user: UserConfig,
}

/// Output format for commands
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Combined configuration (global + project)
#[derive(Debug, Clone)]
pub struct Config {
    pub project: ProjectConfig,
    pub global: GlobalConfig,
    pub project_root: Option<PathBuf>,
}

impl Config {
    /// Loads configuration from default locations
    pub fn load() -> Result<Self> {
        let global = Self::load_global()?;
        let (project, project_root) = Self::load_project()?;

        Ok(Self {
            project,
            global,
            project_root,
        })
    }

    /// Loads configuration for a specific project
    pub fn for_project(project_root: &Path) -> Result<Self> {
        let global = Self::load_global()?;
        let project = Self::load_project_config(project_root)?;

        Ok(Self {
            project,
            global,
            project_root: Some(project_root.to_path_buf()),
        })
    }

    /// Returns the global config directory
    pub fn global_config_dir() -> Option<PathBuf> {
        ProjectDirs::from("dev", "lineup", "lineup").map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Resolves the acting user from config, environment, or defaults
    pub fn effective_user(&self) -> String {
        first_user([
            self.project.user.name.clone(),
            self.global.user.name.clone(),
            std::env::var("LINEUP_USER").ok(),
            std::env::var("USER").ok(),
        ])
    }

    /// Checks values that parse but make no sense
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(name) = &self.project.user.name {
            if name.trim().is_empty() {
                return Err(ConfigError::Invalid("user.name must not be empty".to_string()));
            }
        }
        if self.project.tabs.lock_debounce_ms > 60_000 {
            return Err(ConfigError::Invalid(format!(
                "tabs.lock_debounce_ms = {} exceeds one minute",
                self.project.tabs.lock_debounce_ms
            )));
        }
        Ok(())
    }

    /// Loads global configuration
    fn load_global() -> Result<GlobalConfig> {
        let config_dir = match Self::global_config_dir() {
            Some(dir) => dir,
            None => return Ok(GlobalConfig::default()),
        };

        let config_path = config_dir.join("config.toml");
        if !config_path.exists() {
            return Ok(GlobalConfig::default());
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read global config: {}", config_path.display()))?;

        toml::from_str(&content)
            .map_err(|e| ConfigError::Parse(e.to_string()))
            .context("Failed to parse global config")
    }

    /// Finds and loads project configuration
    fn load_project() -> Result<(ProjectConfig, Option<PathBuf>)> {
        let project_root = Self::find_project_root();

        match project_root {
            Some(root) => {
                let config = Self::load_project_config(&root)?;
                Ok((config, Some(root)))
            }
            None => Ok((ProjectConfig::default(), None)),
        }
    }

    /// Loads project configuration from a specific root
    fn load_project_config(project_root: &Path) -> Result<ProjectConfig> {
        let config_path = project_root.join(".lineup").join("config.toml");

        if !config_path.exists() {
            return Ok(ProjectConfig::default());
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read project config: {}", config_path.display()))?;

        toml::from_str(&content)
            .map_err(|e| ConfigError::Parse(e.to_string()))
            .context("Failed to parse project config")
    }

    /// Finds the project root by looking for `.lineup/` directory
    pub fn find_project_root() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;

        loop {
            if current.join(".lineup").is_dir() {
                return Some(current);
            }

            if !current.pop() {
                return None;
            }
        }
    }
}

/// First non-blank candidate, or "anonymous"
fn first_user(candidates: impl IntoIterator<Item = Option<String>>) -> String {
    candidates
        .into_iter()
        .flatten()
        .find(|name| !name.trim().is_empty())
        .unwrap_or_else(|| "anonymous".to_string())
}
