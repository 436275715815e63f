//! User configuration
//!
//! Stored as JSON at `<config dir>/bgm/config.json`. Every field is
//! optional; a missing file means defaults.

use std::path::{Path, PathBuf};

use bgm_logging::FileConfig;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::browser::default_browser_data_dir;
use crate::error::StorageError;

/// bgm configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BgmConfig {
    /// Profile used when none is given (display name or directory)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_profile: Option<String>,

    /// Override for the browser's user data directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub browser_data_dir: Option<PathBuf>,

    /// Override for where backups are written
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backup_dir: Option<PathBuf>,

    /// JSONL log files in addition to console output
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_file: Option<FileConfig>,
}

impl BgmConfig {
    /// Default location of the config file
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("bgm").join("config.json"))
    }

    /// Load from the default location
    pub fn load() -> Result<Self, StorageError> {
        match Self::default_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load from a specific file; a missing file yields defaults
    pub fn load_from(path: &Path) -> Result<Self, StorageError> {
        if !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| StorageError::json(path, e))
    }

    /// Write to a specific file, creating parent directories
    pub fn save_to(&self, path: &Path) -> Result<(), StorageError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self).map_err(|e| StorageError::json(path, e))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Browser user data directory, honoring the override
    pub fn browser_data_dir(&self) -> Result<PathBuf, StorageError> {
        match &self.browser_data_dir {
            Some(dir) => Ok(dir.clone()),
            None => default_browser_data_dir(),
        }
    }

    /// Backup root, honoring the override
    pub fn backup_dir(&self) -> Result<PathBuf, StorageError> {
        match &self.backup_dir {
            Some(dir) => Ok(dir.clone()),
            None => dirs::data_dir()
                .map(|dir| dir.join("bgm").join("backups"))
                .ok_or(StorageError::NoDirectory("data")),
        }
    }
}
