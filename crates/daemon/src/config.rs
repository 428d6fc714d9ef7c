// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon configuration
//!
//! Loaded from a TOML file; every field has a default so an empty file
//! (or no file at all) is a valid configuration.

use fso_core::naming::DEFAULT_NAMESPACE;
use fso_engine::ProcessorConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use uuid::Uuid;

/// Directory name under the platform data directory
const APP_DIR: &str = "fso";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {0}: {1}")]
    Read(PathBuf, #[source] std::io::Error),

    #[error("invalid config {0}: {1}")]
    Parse(PathBuf, #[source] toml::de::Error),

    #[error("failed to render config: {0}")]
    Render(#[from] toml::ser::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Journals and the lock file live here
    pub data_dir: PathBuf,
    /// Name of the fleet root aggregate
    pub main_name: String,
    /// Namespace for name-derived ids; must match across the fleet
    pub namespace: Uuid,
    /// Log to this file instead of stderr
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,
    pub processors: ProcessorConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            main_name: "main".to_string(),
            namespace: DEFAULT_NAMESPACE,
            log_file: None,
            processors: ProcessorConfig::default(),
        }
    }
}

impl Config {
    /// Load `path`, or the defaults when no path is given
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Read(path.to_path_buf(), e))?;
        Self::parse(path, &text)
    }

    pub fn parse(path: &Path, text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|e| ConfigError::Parse(path.to_path_buf(), e))
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn lock_path(&self) -> PathBuf {
        self.data_dir.join("fsod.lock")
    }

    pub fn journal_dir(&self, name: &str) -> PathBuf {
        self.data_dir.join("journals").join(name)
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|dir| dir.join(APP_DIR))
        .unwrap_or_else(|| PathBuf::from(".").join(APP_DIR))
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
