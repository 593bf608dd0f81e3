//! Configuration management for Linnea.
//!
//! Configuration is loaded from the platform config directory with sensible
//! defaults; a missing file means the defaults are used as-is.

mod types;
mod validate;

pub use types::*;

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration structure for Linnea.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Knowledge-base hierarchy settings
    pub hierarchy: HierarchyConfig,

    /// Evaluation loop settings
    pub eval: EvalConfig,

    /// Output settings
    pub output: OutputConfig,

    /// Logging settings
    pub logging: LoggingConfig,

    /// Model provider settings
    pub llm: LlmConfig,
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// Returns default configuration if the file doesn't exist.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default config file path.
    ///
    /// Uses platform-appropriate directories:
    /// - macOS: ~/Library/Application Support/com.linnea.linnea/config.toml
    /// - Linux: ~/.config/linnea/config.toml
    /// - Windows: C:\Users\<User>\AppData\Roaming\linnea\config\config.toml
    ///
    /// Falls back to ~/.linnea/config.toml if directory detection fails.
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("com", "linnea", "linnea")
            .map(|dirs| dirs.config_dir().to_path_buf().join("config.toml"))
            .unwrap_or_else(|| {
                let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
                PathBuf::from(home).join(".linnea").join("config.toml")
            })
    }

    /// Get the resolved dataset directory path (with ~ expansion).
    pub fn data_dir(&self) -> PathBuf {
        let path_str = self.general.data_dir.to_string_lossy();
        let expanded = shellexpand::tilde(&path_str);
        PathBuf::from(expanded.into_owned())
    }

    /// Get the resolved WordNet index file path (with ~ expansion).
    pub fn wordnet_index(&self) -> PathBuf {
        let expanded = shellexpand::tilde(&self.hierarchy.wordnet_index);
        PathBuf::from(expanded.into_owned())
    }

    /// Serialize the config to a pretty TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ValidationError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.hierarchy.max_depth, 10);
        assert_eq!(config.hierarchy.wikidata_max_depth, 15);
        assert_eq!(config.eval.retry_attempts, 3);
    }

    #[test]
    fn test_config_to_toml() {
        let config = Config::default();
        let toml = config.to_toml().unwrap();
        assert!(toml.contains("[general]"));
        assert!(toml.contains("[hierarchy]"));
        assert!(toml.contains("[eval]"));
    }

    #[test]
    fn test_load_from_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[hierarchy]\nmax_depth = 4\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.hierarchy.max_depth, 4);
        // Untouched sections keep their defaults
        assert_eq!(config.eval.retry_attempts, 3);
    }

    #[test]
    fn test_data_dir_expands_tilde() {
        let config = Config::default();
        let dir = config.data_dir();
        assert!(!dir.to_string_lossy().starts_with('~'));
    }
}
