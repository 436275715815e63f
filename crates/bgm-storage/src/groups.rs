//! Tab-group operations against a profile's latest session log

use std::path::{Path, PathBuf};

use tracing::{info, instrument};

use bgm_core::{GroupToken, IdSource, TabGroup, TabGroupColor, TabInput, find_group_by_name};
use bgm_snss::encode_group;

use crate::backup::BackupManager;
use crate::browser::ensure_browser_closed;
use crate::error::StorageError;
use crate::session_file::{append_to_session_log, read_session_log};
use crate::sessions::{SessionKind, latest_session_file};

/// Backup kind label for session logs
pub const SESSION_BACKUP_KIND: &str = "session";

/// Current tab groups of a profile.
///
/// A profile without a session log has no groups.
pub fn read_tab_groups(profile_path: &Path) -> Result<Vec<TabGroup>, StorageError> {
    let Some(file) = latest_session_file(profile_path, SessionKind::Session)? else {
        return Ok(Vec::new());
    };
    Ok(read_session_log(&file.path)?.tab_groups())
}

/// A group by name, case-insensitively
pub fn find_tab_group(profile_path: &Path, name: &str) -> Result<Option<TabGroup>, StorageError> {
    let groups = read_tab_groups(profile_path)?;
    Ok(find_group_by_name(&groups, name).cloned())
}

/// How [`create_tab_group`] should behave
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreateGroupOptions {
    /// Encode only; touch nothing on disk
    pub dry_run: bool,
    /// Copy the session log aside before appending
    pub backup: bool,
    /// Refuse while the browser is running
    pub require_browser_closed: bool,
}

impl Default for CreateGroupOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            backup: true,
            require_browser_closed: true,
        }
    }
}

/// Outcome of [`create_tab_group`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateGroupReport {
    pub group_name: String,
    pub token: GroupToken,
    pub tab_count: usize,
    /// Bytes appended, or that would be appended on a dry run
    pub appended_bytes: usize,
    pub session_file: PathBuf,
    pub backup_path: Option<PathBuf>,
    pub dry_run: bool,
}

/// Append a new group to the profile's latest session log
#[instrument(skip(profile_path, backups, tabs, ids), fields(tabs = tabs.len()))]
pub fn create_tab_group(
    profile_path: &Path,
    backups: &BackupManager,
    name: &str,
    color: TabGroupColor,
    tabs: &[TabInput],
    ids: &mut dyn IdSource,
    options: CreateGroupOptions,
) -> Result<CreateGroupReport, StorageError> {
    if tabs.is_empty() {
        return Err(StorageError::InvalidInput(
            "a group needs at least one tab".into(),
        ));
    }
    if !options.dry_run && options.require_browser_closed {
        ensure_browser_closed()?;
    }

    let file = latest_session_file(profile_path, SessionKind::Session)?.ok_or_else(|| {
        StorageError::not_found(format!("session log in {}", profile_path.display()))
    })?;

    let encoded = encode_group(name, color, tabs, ids)?;
    let mut report = CreateGroupReport {
        group_name: name.to_string(),
        token: encoded.token,
        tab_count: tabs.len(),
        appended_bytes: encoded.to_bytes().len(),
        session_file: file.path.clone(),
        backup_path: None,
        dry_run: options.dry_run,
    };
    if options.dry_run {
        info!(bytes = report.appended_bytes, "Dry run, nothing written");
        return Ok(report);
    }

    if options.backup {
        report.backup_path = Some(backups.create_backup(&file.path, SESSION_BACKUP_KIND)?);
    }
    report.appended_bytes = append_to_session_log(&file.path, &encoded.records)?;

    info!(token = %report.token, bytes = report.appended_bytes, "Created tab group");
    Ok(report)
}
