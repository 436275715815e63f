//! Closed remote tab groups in the profile's `Preferences`
//!
//! When a group synced from another device is closed locally, the browser
//! remembers its id under the sync cache it came from so it is not reopened
//! on the next sync. Only the ids are stored; names live in encrypted sync
//! data and are not available here.

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tracing::{info, instrument};

use crate::backup::BackupManager;
use crate::browser::ensure_browser_closed;
use crate::error::StorageError;
use crate::json_file::{read_json, write_json};

/// File name inside the profile directory
pub const PREFERENCES_FILE: &str = "Preferences";

/// Backup kind label for the preferences file
pub const PREFERENCES_BACKUP_KIND: &str = "preferences";

/// Dotted path of the closed-remote-group map inside `Preferences`
const CLOSED_REMOTE_KEY: [&str; 2] = ["tab_group_sync", "locally_closed_remote_tab_group_ids"];

pub fn preferences_path(profile_path: &Path) -> PathBuf {
    profile_path.join(PREFERENCES_FILE)
}

/// Closed group ids remembered for one sync cache (one remote device)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncCacheGroups {
    pub cache_guid: String,
    pub group_ids: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClosedRemoteGroups {
    pub by_sync_cache: Vec<SyncCacheGroups>,
}

impl ClosedRemoteGroups {
    pub fn total_count(&self) -> usize {
        self.by_sync_cache.iter().map(|c| c.group_ids.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total_count() == 0
    }

    /// Accepts a map of cache guid to either a list of ids or a map keyed
    /// by id. Anything else contributes nothing.
    fn from_value(value: Option<&Value>) -> Self {
        let Some(Value::Object(caches)) = value else {
            return Self::default();
        };
        let by_sync_cache = caches
            .iter()
            .map(|(guid, ids)| SyncCacheGroups {
                cache_guid: guid.clone(),
                group_ids: match ids {
                    Value::Array(items) => items
                        .iter()
                        .filter_map(|v| v.as_str().map(str::to_string))
                        .collect(),
                    Value::Object(map) => map.keys().cloned().collect(),
                    _ => Vec::new(),
                },
            })
            .filter(|cache| !cache.group_ids.is_empty())
            .collect();
        Self { by_sync_cache }
    }
}

fn closed_remote_value(prefs: &Value) -> Option<&Value> {
    CLOSED_REMOTE_KEY
        .iter()
        .try_fold(prefs, |node, key| node.get(key))
}

/// Closed remote groups of a profile; a profile without `Preferences` has none
pub fn read_closed_remote_groups(profile_path: &Path) -> Result<ClosedRemoteGroups, StorageError> {
    let prefs: Value = match read_json(&preferences_path(profile_path)) {
        Ok(prefs) => prefs,
        Err(StorageError::NotFound(_)) => return Ok(ClosedRemoteGroups::default()),
        Err(e) => return Err(e),
    };
    Ok(ClosedRemoteGroups::from_value(closed_remote_value(&prefs)))
}

/// Outcome of [`clear_closed_remote_groups`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClearRemoteReport {
    pub cleared: usize,
    pub backup_path: Option<PathBuf>,
}

/// Forget every closed remote group id.
///
/// Groups that still exist on other devices may sync back afterwards.
/// Nothing is written when there is nothing to clear.
#[instrument(skip(profile_path, backups))]
pub fn clear_closed_remote_groups(
    profile_path: &Path,
    backups: &BackupManager,
    backup: bool,
    require_browser_closed: bool,
) -> Result<ClearRemoteReport, StorageError> {
    if require_browser_closed {
        ensure_browser_closed()?;
    }

    let path = preferences_path(profile_path);
    let mut prefs: Value = match read_json(&path) {
        Ok(prefs) => prefs,
        Err(StorageError::NotFound(_)) => {
            return Ok(ClearRemoteReport {
                cleared: 0,
                backup_path: None,
            });
        }
        Err(e) => return Err(e),
    };
    let cleared = ClosedRemoteGroups::from_value(closed_remote_value(&prefs)).total_count();
    if cleared == 0 {
        return Ok(ClearRemoteReport {
            cleared,
            backup_path: None,
        });
    }

    let backup_path = if backup {
        Some(backups.create_backup(&path, PREFERENCES_BACKUP_KIND)?)
    } else {
        None
    };

    let [section, key] = CLOSED_REMOTE_KEY;
    if let Some(Value::Object(sync)) = prefs.get_mut(section) {
        sync.insert(key.to_string(), Value::Object(Map::new()));
    }
    write_json(&path, &prefs)?;

    info!(cleared, "Cleared closed remote tab groups");
    Ok(ClearRemoteReport {
        cleared,
        backup_path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn write_prefs(profile: &Path, prefs: &Value) {
        std::fs::create_dir_all(profile).unwrap();
        std::fs::write(preferences_path(profile), prefs.to_string()).unwrap();
    }

    fn sample() -> Value {
        json!({
            "browser": { "window_placement": { "top": 10 } },
            "tab_group_sync": {
                "locally_closed_remote_tab_group_ids": {
                    "cache-aaaa": ["g1", "g2"],
                    "cache-bbbb": { "g3": true },
                    "cache-empty": []
                },
                "other_setting": 1
            }
        })
    }

    #[test]
    fn test_reads_ids_per_sync_cache() {
        let temp = TempDir::new().unwrap();
        write_prefs(temp.path(), &sample());

        let groups = read_closed_remote_groups(temp.path()).unwrap();
        assert_eq!(groups.total_count(), 3);
        assert_eq!(groups.by_sync_cache.len(), 2);
        assert_eq!(groups.by_sync_cache[0].cache_guid, "cache-aaaa");
        assert_eq!(groups.by_sync_cache[0].group_ids, ["g1", "g2"]);
        assert_eq!(groups.by_sync_cache[1].group_ids, ["g3"]);
    }

    #[test]
    fn test_missing_file_or_key_means_none() {
        let temp = TempDir::new().unwrap();
        assert!(read_closed_remote_groups(temp.path()).unwrap().is_empty());

        write_prefs(temp.path(), &json!({ "tab_group_sync": 5 }));
        assert!(read_closed_remote_groups(temp.path()).unwrap().is_empty());
    }

    #[test]
    fn test_clear_backs_up_and_keeps_other_settings() {
        let temp = TempDir::new().unwrap();
        let profile = temp.path().join("Default");
        write_prefs(&profile, &sample());
        let original = std::fs::read(preferences_path(&profile)).unwrap();
        let backups = BackupManager::new(temp.path().join("backups"));

        let report = clear_closed_remote_groups(&profile, &backups, true, false).unwrap();

        assert_eq!(report.cleared, 3);
        assert_eq!(std::fs::read(report.backup_path.unwrap()).unwrap(), original);
        assert!(read_closed_remote_groups(&profile).unwrap().is_empty());

        let prefs: Value = read_json(&preferences_path(&profile)).unwrap();
        assert_eq!(prefs["browser"]["window_placement"]["top"], 10);
        assert_eq!(prefs["tab_group_sync"]["other_setting"], 1);
    }

    #[test]
    fn test_clear_with_nothing_to_clear_writes_nothing() {
        let temp = TempDir::new().unwrap();
        let profile = temp.path().join("Default");
        write_prefs(&profile, &json!({ "browser": {} }));
        let original = std::fs::read(preferences_path(&profile)).unwrap();
        let backups = BackupManager::new(temp.path().join("backups"));

        let report = clear_closed_remote_groups(&profile, &backups, true, false).unwrap();

        assert_eq!(report.cleared, 0);
        assert!(report.backup_path.is_none());
        assert_eq!(std::fs::read(preferences_path(&profile)).unwrap(), original);
        assert!(backups.list_backups().unwrap().is_empty());
    }
}
