//! Session file discovery
//!
//! Each profile keeps its logs under `<profile>/Sessions/` as
//! `Session_<timestamp>`, `Tabs_<timestamp>` and `Apps_<timestamp>`.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::StorageError;

/// Name of the sessions directory inside a profile
pub const SESSIONS_DIR: &str = "Sessions";

/// Which log a session file holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionKind {
    Session,
    Tabs,
    Apps,
}

impl SessionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionKind::Session => "Session",
            SessionKind::Tabs => "Tabs",
            SessionKind::Apps => "Apps",
        }
    }
}

impl fmt::Display for SessionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SessionKind {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Session" => Ok(SessionKind::Session),
            "Tabs" => Ok(SessionKind::Tabs),
            "Apps" => Ok(SessionKind::Apps),
            other => Err(StorageError::InvalidInput(format!(
                "unknown session kind '{other}'"
            ))),
        }
    }
}

/// A session file found on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionFile {
    pub path: PathBuf,
    pub kind: SessionKind,
    pub timestamp: u64,
    pub filename: String,
}

/// Parse `<Kind>_<digits>` into its parts
pub fn parse_session_filename(name: &str) -> Option<(SessionKind, u64)> {
    let (kind, digits) = name.split_once('_')?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let kind = kind.parse().ok()?;
    let timestamp = digits.parse().ok()?;
    Some((kind, timestamp))
}

pub fn sessions_dir(profile_path: &Path) -> PathBuf {
    profile_path.join(SESSIONS_DIR)
}

/// All session files of a profile, newest first.
///
/// A missing sessions directory yields an empty list.
pub fn list_session_files(profile_path: &Path) -> Result<Vec<SessionFile>, StorageError> {
    let dir = sessions_dir(profile_path);
    let entries = match std::fs::read_dir(&dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(dir = %dir.display(), "No sessions directory");
            return Ok(Vec::new());
        }
        Err(e) => return Err(e.into()),
    };

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry?;
        let filename = entry.file_name().to_string_lossy().into_owned();
        if let Some((kind, timestamp)) = parse_session_filename(&filename) {
            files.push(SessionFile {
                path: entry.path(),
                kind,
                timestamp,
                filename,
            });
        }
    }

    files.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    Ok(files)
}

/// Newest session file of the given kind
pub fn latest_session_file(
    profile_path: &Path,
    kind: SessionKind,
) -> Result<Option<SessionFile>, StorageError> {
    Ok(list_session_files(profile_path)?
        .into_iter()
        .find(|f| f.kind == kind))
}
