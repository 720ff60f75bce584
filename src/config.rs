//! Persisted user defaults.
//!
//! A small JSON file under the platform config directory holds the
//! preferred grouping thresholds. An effective threshold resolves in this
//! order, highest first: command-line flag, this file, built-in default.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::dedupe::{GroupingConfig, DEFAULT_IDENTICAL_MAX, DEFAULT_SIMILAR_MAX};

/// User configuration persisted between runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Default identical-tier threshold.
    #[serde(default = "default_identical_max")]
    pub identical_max: u32,
    /// Default similar-tier threshold.
    #[serde(default = "default_similar_max")]
    pub similar_max: u32,
}

fn default_identical_max() -> u32 {
    DEFAULT_IDENTICAL_MAX
}

fn default_similar_max() -> u32 {
    DEFAULT_SIMILAR_MAX
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            identical_max: DEFAULT_IDENTICAL_MAX,
            similar_max: DEFAULT_SIMILAR_MAX,
        }
    }
}

impl AppConfig {
    /// Load the configuration from the platform config path.
    ///
    /// Never fails: a missing file or unavailable config directory falls
    /// back to the built-in defaults quietly, a malformed file with a
    /// warning.
    #[must_use]
    pub fn load() -> Self {
        let path = match Self::config_path() {
            Ok(path) => path,
            Err(e) => {
                log::debug!("No config directory available: {e}");
                return Self::default();
            }
        };
        if !path.exists() {
            log::debug!("No config file at {}, using defaults", path.display());
            return Self::default();
        }

        match fs::read_to_string(&path) {
            Ok(text) => match serde_json::from_str(&text) {
                Ok(config) => config,
                Err(e) => {
                    log::warn!(
                        "Malformed config file {}, using defaults: {e}",
                        path.display()
                    );
                    Self::default()
                }
            },
            Err(e) => {
                log::debug!(
                    "Could not read config file {}, using defaults: {e}",
                    path.display()
                );
                Self::default()
            }
        }
    }

    /// Save the configuration, returning where it was written.
    ///
    /// # Errors
    ///
    /// Fails when the config directory cannot be determined or created, or
    /// the file cannot be written.
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory {}", parent.display())
            })?;
        }

        let content = serde_json::to_string_pretty(self)?;
        fs::write(&path, content)
            .with_context(|| format!("Failed to write config file {}", path.display()))?;

        log::info!("Saved configuration to {}", path.display());
        Ok(path)
    }

    /// Platform-specific configuration file path.
    ///
    /// # Errors
    ///
    /// Fails when the platform provides no home/config directory.
    pub fn config_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("com", "photosieve", "photosieve")
            .context("Could not determine the platform config directory")?;
        Ok(dirs.config_dir().join("config.json"))
    }

    /// Effective grouping thresholds after applying CLI overrides.
    #[must_use]
    pub fn resolve_thresholds(
        &self,
        identical_flag: Option<u32>,
        similar_flag: Option<u32>,
    ) -> GroupingConfig {
        GroupingConfig::new(
            identical_flag.unwrap_or(self.identical_max),
            similar_flag.unwrap_or(self.similar_max),
        )
    }
}
