//! Configuration management for Taskdeck.
//!
//! This module provides configuration loading, saving, and defaults.
//! Configuration is stored in TOML format in a platform-appropriate location.

use crate::error::{Result, SyncError};
use crate::gate::{DEFAULT_DEBOUNCE, DEFAULT_FRESHNESS_WINDOW};
use crate::index::{SearchOptions, DEFAULT_PARALLEL_THRESHOLD, DEFAULT_THRESHOLD};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Main configuration structure for Taskdeck.
///
/// ## Example Configuration File (taskdeck.toml)
///
/// ```toml
/// [general]
/// log_level = "info"
/// data_file = "/home/me/tasks.json"
///
/// [sync]
/// freshness_window_ms = 5000
/// debounce_ms = 300
/// auto_refresh_secs = 0
///
/// [search]
/// threshold = 0.4
/// parallel_threshold = 10000
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Fetch gating
    pub sync: SyncConfig,

    /// Search index tuning
    pub search: SearchConfig,
}

/// General configuration options
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Task file used by the CLI's file remote (None = default location)
    pub data_file: Option<PathBuf>,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        GeneralConfig {
            log_level: "info".to_string(),
            data_file: None,
        }
    }
}

/// Fetch gating configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Skip non-forced fetches this soon after a successful one
    pub freshness_window_ms: u64,

    /// Collapse fetch requests arriving within this period
    pub debounce_ms: u64,

    /// Periodic refresh interval in seconds (0 = disabled)
    pub auto_refresh_secs: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        SyncConfig {
            freshness_window_ms: DEFAULT_FRESHNESS_WINDOW.as_millis() as u64,
            debounce_ms: DEFAULT_DEBOUNCE.as_millis() as u64,
            auto_refresh_secs: 0,
        }
    }
}

/// Search configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Maximum normalized edit distance for a title to match (0.0 - 1.0)
    pub threshold: f64,

    /// Threshold for switching to parallel search
    pub parallel_threshold: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            threshold: DEFAULT_THRESHOLD,
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// Returns default config if no config file exists.
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path()?;
        Self::load_from(&config_path)
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Config::default());
        }

        info!(path = %path.display(), "Loading configuration");
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents).map_err(|e| SyncError::ConfigError {
            reason: format!("Failed to parse config: {}", e),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        info!(path = %path.display(), "Saving configuration");
        let contents = toml::to_string_pretty(self).map_err(|e| SyncError::ConfigError {
            reason: format!("Failed to serialize config: {}", e),
        })?;

        fs::write(path, contents)?;
        Ok(())
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.search.threshold) {
            return Err(SyncError::ConfigError {
                reason: format!(
                    "search.threshold must be between 0 and 1, got {}",
                    self.search.threshold
                ),
            });
        }
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("", "", "taskdeck").ok_or_else(|| SyncError::ConfigError {
            reason: "Could not determine config directory".to_string(),
        })?;

        Ok(dirs.config_dir().join("taskdeck.toml"))
    }

    /// Get the default data directory path.
    pub fn default_data_dir() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("", "", "taskdeck").ok_or_else(|| SyncError::ConfigError {
            reason: "Could not determine data directory".to_string(),
        })?;

        Ok(dirs.data_dir().to_path_buf())
    }

    /// Get the task data file (from config or default).
    pub fn data_file(&self) -> Result<PathBuf> {
        if let Some(ref path) = self.general.data_file {
            Ok(path.clone())
        } else {
            Ok(Self::default_data_dir()?.join("tasks.json"))
        }
    }

    pub fn freshness_window(&self) -> Duration {
        Duration::from_millis(self.sync.freshness_window_ms)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.sync.debounce_ms)
    }

    /// Periodic refresh interval, if enabled.
    pub fn auto_refresh(&self) -> Option<Duration> {
        (self.sync.auto_refresh_secs > 0).then(|| Duration::from_secs(self.sync.auto_refresh_secs))
    }

    pub fn search_options(&self) -> SearchOptions {
        SearchOptions {
            threshold: self.search.threshold,
            parallel_threshold: self.search.parallel_threshold,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.freshness_window(), Duration::from_millis(5000));
        assert_eq!(config.debounce(), Duration::from_millis(300));
        assert_eq!(config.auto_refresh(), None);
        assert_eq!(config.search_options(), SearchOptions::default());
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        let mut config = Config::default();
        config.sync.debounce_ms = 150;
        config.sync.auto_refresh_secs = 60;
        config.general.data_file = Some(PathBuf::from("/tmp/tasks.json"));

        config.save_to(&config_path).unwrap();
        let loaded = Config::load_from(&config_path).unwrap();

        assert_eq!(loaded.debounce(), Duration::from_millis(150));
        assert_eq!(loaded.auto_refresh(), Some(Duration::from_secs(60)));
        assert_eq!(loaded.data_file().unwrap(), PathBuf::from("/tmp/tasks.json"));
    }

    #[test]
    fn test_load_nonexistent() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nonexistent.toml");

        let config = Config::load_from(&config_path).unwrap();
        assert_eq!(config.sync.freshness_window_ms, 5000);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("partial.toml");
        fs::write(&config_path, "[search]\nthreshold = 0.25\n").unwrap();

        let config = Config::load_from(&config_path).unwrap();
        assert_eq!(config.search.threshold, 0.25);
        assert_eq!(config.search.parallel_threshold, DEFAULT_PARALLEL_THRESHOLD);
        assert_eq!(config.sync.debounce_ms, 300);
    }

    #[test]
    fn test_invalid_threshold_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("bad.toml");
        fs::write(&config_path, "[search]\nthreshold = 1.5\n").unwrap();

        let err = Config::load_from(&config_path).unwrap_err();
        assert!(matches!(err, SyncError::ConfigError { .. }));
    }

    #[test]
    fn test_malformed_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("broken.toml");
        fs::write(&config_path, "[sync\n").unwrap();

        assert!(Config::load_from(&config_path).is_err());
    }
}
