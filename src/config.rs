//! Configuration management for sitewright.
//!
//! Supports layered configuration: defaults → project → user → env

use crate::domain::DEFAULT_MAX_ENTRIES;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuilderConfig {
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub autosave: AutosaveConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

impl BuilderConfig {
    /// Load configuration with hierarchy: defaults → project → user → env
    pub fn load(project_root: Option<&Path>) -> Result<Self, ConfigError> {
        use config::{Config, Environment, File};

        let mut builder = Config::builder();

        // 1. Start with defaults
        builder = builder.add_source(
            config::File::from_str(
                include_str!("../default_config.toml"),
                config::FileFormat::Toml,
            )
            .required(false),
        );

        // 2. Project-specific config (.sitewright.toml in project root)
        if let Some(root) = project_root {
            let project_config = root.join(".sitewright.toml");
            if project_config.exists() {
                builder = builder.add_source(File::from(project_config).required(false));
            }
        }

        // 3. User config (~/.config/sitewright/config.toml)
        if let Some(dirs) = project_dirs() {
            let user_config = dirs.config_dir().join("config.toml");
            if user_config.exists() {
                builder = builder.add_source(File::from(user_config).required(false));
            }
        }

        // 4. Environment variables (SITEWRIGHT__*)
        builder = builder.add_source(
            Environment::with_prefix("SITEWRIGHT")
                .separator("__")
                .try_parsing(true),
        );

        let config: Self = builder
            .build()
            .map_err(|e| ConfigError::Parse(e.to_string()))?
            .try_deserialize()
            .map_err(|e| ConfigError::Parse(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Reject values the engine cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.history.max_entries == 0 {
            return Err(ConfigError::Invalid(
                "history.max_entries must be at least 1".to_string(),
            ));
        }
        if self.autosave.interval_seconds == 0 {
            return Err(ConfigError::Invalid(
                "autosave.interval_seconds must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

pub(crate) fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("com", "sitewright", "sitewright")
}

/// History log configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Entries kept before the oldest are evicted
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_entries: default_max_entries(),
        }
    }
}

fn default_max_entries() -> usize {
    DEFAULT_MAX_ENTRIES
}

/// Autosave configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutosaveConfig {
    #[serde(default = "default_autosave_enabled")]
    pub enabled: bool,
    #[serde(default = "default_interval_seconds")]
    pub interval_seconds: u64,
}

impl AutosaveConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_seconds.max(1))
    }
}

impl Default for AutosaveConfig {
    fn default() -> Self {
        Self {
            enabled: default_autosave_enabled(),
            interval_seconds: default_interval_seconds(),
        }
    }
}

fn default_autosave_enabled() -> bool {
    true
}

fn default_interval_seconds() -> u64 {
    30
}

/// External generator process configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Command spawned for each generation request; empty means unconfigured
    #[serde(default)]
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl GenerationConfig {
    pub fn is_configured(&self) -> bool {
        !self.command.trim().is_empty()
    }
}

/// Snapshot storage configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory for saved projects; defaults to the platform data directory
    #[serde(default)]
    pub directory: Option<PathBuf>,
}

impl StorageConfig {
    pub fn resolve_directory(&self) -> Option<PathBuf> {
        self.directory
            .clone()
            .or_else(|| project_dirs().map(|d| d.data_dir().join("projects")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = BuilderConfig::default();
        assert_eq!(config.history.max_entries, 50);
        assert!(config.autosave.enabled);
        assert_eq!(config.autosave.interval(), Duration::from_secs(30));
        assert!(!config.generation.is_configured());
        assert!(config.storage.directory.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_project_file_overrides_defaults() {
        let temp = tempfile::TempDir::new().unwrap();
        std::fs::write(
            temp.path().join(".sitewright.toml"),
            "[history]\nmax_entries = 7\n\n[generation]\ncommand = \"gen\"\nargs = [\"--fast\"]\n",
        )
        .unwrap();

        let config = BuilderConfig::load(Some(temp.path())).unwrap();
        assert_eq!(config.history.max_entries, 7);
        assert_eq!(config.generation.command, "gen");
        assert_eq!(config.generation.args, vec!["--fast".to_string()]);
        assert_eq!(config.autosave.interval_seconds, 30);
    }

    #[test]
    fn test_validate_rejects_zero_history() {
        let mut config = BuilderConfig::default();
        config.history.max_entries = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_explicit_storage_directory_wins() {
        let storage = StorageConfig {
            directory: Some(PathBuf::from("/tmp/sw")),
        };
        assert_eq!(storage.resolve_directory(), Some(PathBuf::from("/tmp/sw")));
    }
}
