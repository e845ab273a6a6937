//! Application configuration
//!
//! Dispatcher sizing and demo settings, read from `config.yaml` in the platform config
//! directory. Missing fields fall back to defaults.

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration
};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::domain::error::DispatchError;

/// Dispatcher sizing and timers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatcherConfig {
    /// Maximum number of queued items; submissions beyond it are dropped
    pub queue_capacity:   usize,
    /// How often the dispatcher checks on the feeder
    pub tick_interval_ms: u64,
    /// Ask the feeder again once it has not been asked for this long
    pub feeder_idle_ms:   u64,
    /// Items requested from the feeder per ask
    pub feed_batch_size:  usize
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self { queue_capacity: 10_000, tick_interval_ms: 100, feeder_idle_ms: 200, feed_batch_size: 10 }
    }
}

impl DispatcherConfig {
    pub fn with_capacity(queue_capacity: usize) -> Self {
        Self { queue_capacity, ..Self::default() }
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn feeder_idle(&self) -> Duration {
        Duration::from_millis(self.feeder_idle_ms)
    }

    pub fn validate(&self) -> Result<(), DispatchError> {
        if self.queue_capacity == 0 {
            return Err(DispatchError::Configuration("queue_capacity must be greater than zero".to_string()));
        }
        if self.tick_interval_ms == 0 {
            return Err(DispatchError::Configuration("tick_interval_ms must be greater than zero".to_string()));
        }
        if self.feed_batch_size == 0 {
            return Err(DispatchError::Configuration("feed_batch_size must be greater than zero".to_string()));
        }
        Ok(())
    }
}

/// Settings for the demo system
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub dispatcher:         DispatcherConfig,
    /// Number of workers spawned at startup
    pub workers:            usize,
    /// Delay between two submissions of the built-in producer
    pub submit_interval_ms: u64,
    /// Total items the feeder may ever produce; unlimited when absent
    pub feeder_budget:      Option<u64>
}

impl Default for Settings {
    fn default() -> Self {
        Self { dispatcher: DispatcherConfig::default(), workers: 5, submit_interval_ms: 10, feeder_budget: None }
    }
}

impl Settings {
    pub fn validate(&self) -> Result<(), DispatchError> {
        self.dispatcher.validate()?;
        if self.workers == 0 {
            return Err(DispatchError::Configuration("workers must be greater than zero".to_string()));
        }
        Ok(())
    }
}

/// Get the project directories for cross-platform config path resolution
pub fn get_project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("", "", "workpull").context("Failed to determine project directories")
}

/// Get the configuration directory path
pub fn get_config_dir() -> Result<PathBuf> {
    let project_dirs = get_project_dirs()?;
    Ok(project_dirs.config_dir().to_path_buf())
}

/// Get the config file path
pub fn get_config_file_path() -> Result<PathBuf> {
    let config_dir = get_config_dir()?;
    Ok(config_dir.join("config.yaml"))
}

/// Load settings from the default location, creating the file with defaults if missing
pub fn load_settings() -> Result<Settings> {
    load_settings_from(&get_config_file_path()?)
}

/// Load settings from `path`, creating the file with defaults if missing
pub fn load_settings_from(path: &Path) -> Result<Settings> {
    if path.exists() {
        let content =
            fs::read_to_string(path).with_context(|| format!("Failed to read config file: {}", path.display()))?;

        serde_yaml::from_str(&content).with_context(|| format!("Failed to parse config file: {}", path.display()))
    } else {
        let settings = Settings::default();
        save_settings_to(path, &settings)?;
        Ok(settings)
    }
}

/// Save settings to `path`
pub fn save_settings_to(path: &Path, settings: &Settings) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
    }

    let content = serde_yaml::to_string(settings).context("Failed to serialize config")?;

    fs::write(path, content).with_context(|| format!("Failed to write config file: {}", path.display()))?;

    Ok(())
}
