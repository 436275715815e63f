//! Timestamped backups of browser files
//!
//! Each backup is a directory `<root>/<timestamp>/` holding copies named
//! `<kind>-<original filename>` and a `metadata.json` describing them.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::StorageError;

/// File name of the per-backup metadata
pub const METADATA_FILE: &str = "metadata.json";

/// Suffixed names tried when a timestamp directory already exists
const MAX_DIR_ATTEMPTS: usize = 100;

/// One file copied into a backup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackedUpFile {
    pub kind: String,
    pub original_path: PathBuf,
    pub backup_path: PathBuf,
}

/// Contents of `metadata.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupMetadata {
    pub timestamp: String,
    pub files: Vec<BackedUpFile>,
    pub created_at: DateTime<Utc>,
}

/// A backup found on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupEntry {
    pub path: PathBuf,
    pub created_at: DateTime<Utc>,
    pub metadata: BackupMetadata,
}

impl BackupEntry {
    /// Kinds of the files in this backup, comma separated
    pub fn kinds(&self) -> String {
        let kinds: Vec<&str> = self.metadata.files.iter().map(|f| f.kind.as_str()).collect();
        if kinds.is_empty() {
            "unknown".to_string()
        } else {
            kinds.join(", ")
        }
    }
}

/// Creates and lists backups under a root directory
#[derive(Debug, Clone)]
pub struct BackupManager {
    root: PathBuf,
}

impl BackupManager {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Back up one file, returning the path of the copy
    pub fn create_backup(&self, file: &Path, kind: &str) -> Result<PathBuf, StorageError> {
        let mut paths = self.create_backups(&[(file, kind)])?;
        paths
            .pop()
            .ok_or_else(|| StorageError::io("backup produced no files"))
    }

    /// Back up several files into one timestamped directory
    pub fn create_backups(&self, files: &[(&Path, &str)]) -> Result<Vec<PathBuf>, StorageError> {
        let created_at = Utc::now();
        let stamp = created_at.format("%Y-%m-%dT%H-%M-%S-%3fZ").to_string();
        let (dir, timestamp) = self.create_unique_dir(&stamp)?;

        let mut backed_up = Vec::with_capacity(files.len());
        for (path, kind) in files {
            let filename = path
                .file_name()
                .ok_or_else(|| {
                    StorageError::InvalidInput(format!("not a file path: {}", path.display()))
                })?
                .to_string_lossy();
            let backup_path = dir.join(format!("{kind}-{filename}"));
            std::fs::copy(path, &backup_path)?;
            debug!(from = %path.display(), to = %backup_path.display(), "Copied file");
            backed_up.push(BackedUpFile {
                kind: kind.to_string(),
                original_path: path.to_path_buf(),
                backup_path,
            });
        }

        let metadata = BackupMetadata {
            timestamp,
            files: backed_up,
            created_at,
        };
        let metadata_path = dir.join(METADATA_FILE);
        let json = serde_json::to_string_pretty(&metadata)
            .map_err(|e| StorageError::json(&metadata_path, e))?;
        std::fs::write(&metadata_path, json)?;

        info!(dir = %dir.display(), files = metadata.files.len(), "Created backup");
        Ok(metadata.files.into_iter().map(|f| f.backup_path).collect())
    }

    /// Create `<root>/<stamp>`, or `<stamp>-N` if that is taken
    fn create_unique_dir(&self, stamp: &str) -> Result<(PathBuf, String), StorageError> {
        std::fs::create_dir_all(&self.root)?;
        for attempt in 0..MAX_DIR_ATTEMPTS {
            let name = if attempt == 0 {
                stamp.to_string()
            } else {
                format!("{stamp}-{attempt}")
            };
            let dir = self.root.join(&name);
            match std::fs::create_dir(&dir) {
                Ok(()) => return Ok((dir, name)),
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Err(StorageError::io(format!("no free backup directory for {stamp}")))
    }

    /// All readable backups, newest first.
    ///
    /// Directories without valid metadata are skipped. A missing root yields
    /// an empty list.
    pub fn list_backups(&self) -> Result<Vec<BackupEntry>, StorageError> {
        let entries = match std::fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut backups = Vec::new();
        for entry in entries {
            let path = entry?.path();
            let metadata_path = path.join(METADATA_FILE);
            let Ok(content) = std::fs::read_to_string(&metadata_path) else {
                continue;
            };
            match serde_json::from_str::<BackupMetadata>(&content) {
                Ok(metadata) => backups.push(BackupEntry {
                    path,
                    created_at: metadata.created_at,
                    metadata,
                }),
                Err(e) => {
                    warn!(path = %metadata_path.display(), error = %e, "Skipping unreadable backup");
                }
            }
        }

        backups.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(backups)
    }
}
