//! Moving tab groups into bookmark folders and back
//!
//! Parking copies a group's tabs into `<destination>/<group name>` under the
//! bookmarks bar. The session log is not touched, so the group stays open
//! until the user closes it. Unparking reads a bookmark folder and appends a
//! new group through [`create_tab_group`].

use std::path::{Path, PathBuf};

use tracing::{info, instrument};

use bgm_core::{IdSource, TabGroup, TabGroupColor, TabInput};

use crate::backup::BackupManager;
use crate::bookmarks::{
    Bookmark, BookmarkFolder, BookmarkNode, bookmark_time_now, bookmarks_path, read_bookmarks,
    write_bookmarks,
};
use crate::browser::ensure_browser_closed;
use crate::error::StorageError;
use crate::groups::{CreateGroupOptions, CreateGroupReport, create_tab_group, read_tab_groups};

/// Folder on the bookmarks bar that parked groups go to by default
pub const DEFAULT_PARKED_FOLDER: &str = "Parked Groups";

/// Folder that `groups cleanup` parks phone-sync junk into
pub const JUNK_PARKED_FOLDER: &str = "Phone Sync Junk";

/// Backup kind label for the bookmarks file
pub const BOOKMARKS_BACKUP_KIND: &str = "bookmarks";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParkOptions {
    /// Folder path under the bookmarks bar; `Parked Groups` when unset
    pub destination: Option<String>,
    pub dry_run: bool,
    pub backup: bool,
    pub require_browser_closed: bool,
}

impl Default for ParkOptions {
    fn default() -> Self {
        Self {
            destination: None,
            dry_run: false,
            backup: true,
            require_browser_closed: true,
        }
    }
}

impl ParkOptions {
    fn destination(&self) -> &str {
        self.destination.as_deref().unwrap_or(DEFAULT_PARKED_FOLDER)
    }
}

/// Outcome of parking one group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParkReport {
    pub group_name: String,
    /// `<destination>/<group name>`
    pub folder_path: String,
    pub bookmark_count: usize,
    pub backup_path: Option<PathBuf>,
    pub dry_run: bool,
}

/// Park the group called `group_name` (case-insensitive)
pub fn park_tab_group(
    profile_path: &Path,
    backups: &BackupManager,
    group_name: &str,
    options: &ParkOptions,
) -> Result<ParkReport, StorageError> {
    let groups = read_tab_groups(profile_path)?;
    let group = bgm_core::find_group_by_name(&groups, group_name)
        .ok_or_else(|| StorageError::not_found(format!("tab group '{group_name}'")))?;

    park_groups(profile_path, backups, std::slice::from_ref(group), options)?
        .pop()
        .ok_or_else(|| StorageError::not_found(format!("tab group '{group_name}'")))
}

/// Park several groups with one backup and one write of the bookmarks file
#[instrument(skip(profile_path, backups, groups), fields(groups = groups.len()))]
pub fn park_groups(
    profile_path: &Path,
    backups: &BackupManager,
    groups: &[TabGroup],
    options: &ParkOptions,
) -> Result<Vec<ParkReport>, StorageError> {
    if groups.is_empty() {
        return Ok(Vec::new());
    }
    if !options.dry_run && options.require_browser_closed {
        ensure_browser_closed()?;
    }

    let mut bookmarks = read_bookmarks(profile_path)?;
    let mut ids = bookmarks.node_ids();
    let now = bookmark_time_now();
    let base = options.destination();

    let parent = bookmarks
        .roots
        .bookmark_bar
        .ensure_folder_path(base, &mut ids, &now)?;

    let mut reports = Vec::with_capacity(groups.len());
    for group in groups {
        let mut folder = BookmarkFolder::new(ids.next_id(), group.name.clone(), &now);
        for tab in &group.tabs {
            let bookmark = Bookmark::new(ids.next_id(), tab.title.clone(), tab.url.clone(), &now);
            folder.children.push(BookmarkNode::Url(bookmark));
        }
        parent.children.push(BookmarkNode::Folder(folder));
        reports.push(ParkReport {
            group_name: group.name.clone(),
            folder_path: format!("{}/{}", base.trim_end_matches('/'), group.name),
            bookmark_count: group.tabs.len(),
            backup_path: None,
            dry_run: options.dry_run,
        });
    }
    parent.date_modified = now;

    if options.dry_run {
        info!(groups = reports.len(), "Dry run, bookmarks not written");
        return Ok(reports);
    }

    if options.backup {
        let backup = backups.create_backup(&bookmarks_path(profile_path), BOOKMARKS_BACKUP_KIND)?;
        for report in &mut reports {
            report.backup_path = Some(backup.clone());
        }
    }
    write_bookmarks(profile_path, &bookmarks)?;

    info!(groups = reports.len(), destination = base, "Parked tab groups");
    Ok(reports)
}

/// Groups whose names look like phone-sync leftovers ("3 tabs")
pub fn junk_groups(profile_path: &Path) -> Result<Vec<TabGroup>, StorageError> {
    let mut groups = read_tab_groups(profile_path)?;
    groups.retain(TabGroup::is_phone_sync_junk);
    Ok(groups)
}

/// Park every phone-sync junk group into [`JUNK_PARKED_FOLDER`]
/// unless the options name another destination
pub fn cleanup_junk_groups(
    profile_path: &Path,
    backups: &BackupManager,
    options: &ParkOptions,
) -> Result<Vec<ParkReport>, StorageError> {
    let junk = junk_groups(profile_path)?;
    let options = ParkOptions {
        destination: Some(
            options
                .destination
                .clone()
                .unwrap_or_else(|| JUNK_PARKED_FOLDER.to_string()),
        ),
        ..options.clone()
    };
    park_groups(profile_path, backups, &junk, &options)
}

/// Reopen the bookmark folder at `folder_path` (under the bookmarks bar) as
/// a new tab group named after the folder
pub fn unpark_bookmark_folder(
    profile_path: &Path,
    backups: &BackupManager,
    folder_path: &str,
    color: TabGroupColor,
    ids: &mut dyn IdSource,
    options: CreateGroupOptions,
) -> Result<CreateGroupReport, StorageError> {
    let bookmarks = read_bookmarks(profile_path)?;
    let folder = bookmarks
        .roots
        .bookmark_bar
        .find_folder(folder_path)
        .ok_or_else(|| StorageError::not_found(format!("bookmark folder '{folder_path}'")))?;

    let tabs: Vec<TabInput> = folder
        .flatten()
        .into_iter()
        .map(|b| TabInput::new(b.url.clone(), b.name.clone()))
        .collect();
    if tabs.is_empty() {
        return Err(StorageError::InvalidInput(format!(
            "bookmark folder '{folder_path}' is empty"
        )));
    }

    create_tab_group(profile_path, backups, &folder.name, color, &tabs, ids, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bookmarks::tests::write_sample;
    use crate::sessions::sessions_dir;
    use bgm_core::SequentialIdSource;
    use tempfile::TempDir;

    const CREATE: CreateGroupOptions = CreateGroupOptions {
        dry_run: false,
        backup: false,
        require_browser_closed: false,
    };

    fn options() -> ParkOptions {
        ParkOptions {
            require_browser_closed: false,
            ..ParkOptions::default()
        }
    }

    /// A profile with a session log holding the named groups and the
    /// sample bookmarks file
    fn profile_with_groups(temp: &TempDir, groups: &[(&str, usize)]) -> PathBuf {
        let profile = temp.path().join("Default");
        let dir = sessions_dir(&profile);
        std::fs::create_dir_all(&dir).unwrap();
        let mut header = b"SNSS".to_vec();
        header.extend_from_slice(&3u32.to_le_bytes());
        std::fs::write(dir.join("Session_100"), &header).unwrap();
        write_sample(&profile);

        let backups = BackupManager::new(temp.path().join("setup"));
        let mut ids = SequentialIdSource::new(10, 1);
        for (name, count) in groups {
            let tabs: Vec<TabInput> = (0..*count)
                .map(|i| TabInput::new(format!("https://{name}.test/{i}"), format!("{name} {i}")))
                .collect();
            create_tab_group(&profile, &backups, name, TabGroupColor::Blue, &tabs, &mut ids, CREATE)
                .unwrap();
        }
        profile
    }

    #[test]
    fn test_park_creates_folder_under_default_destination() {
        let temp = TempDir::new().unwrap();
        let profile = profile_with_groups(&temp, &[("Research", 2)]);
        let backups = BackupManager::new(temp.path().join("backups"));
        let original = std::fs::read(bookmarks_path(&profile)).unwrap();

        let report = park_tab_group(&profile, &backups, "research", &options()).unwrap();

        assert_eq!(report.folder_path, "Parked Groups/Research");
        assert_eq!(report.bookmark_count, 2);
        let backup = report.backup_path.unwrap();
        assert_eq!(std::fs::read(backup).unwrap(), original);

        let bookmarks = read_bookmarks(&profile).unwrap();
        let folder = bookmarks
            .roots
            .bookmark_bar
            .find_folder("parked groups/research")
            .unwrap();
        let saved: Vec<(&str, &str)> = folder
            .flatten()
            .iter()
            .map(|b| (b.name.as_str(), b.url.as_str()))
            .collect();
        assert_eq!(
            saved,
            [
                ("Research 0", "https://Research.test/0"),
                ("Research 1", "https://Research.test/1")
            ]
        );
        // existing bookmarks untouched
        assert!(bookmarks.roots.bookmark_bar.find_folder("Projects/Deep").is_some());
    }

    #[test]
    fn test_park_into_custom_destination_reuses_folder() {
        let temp = TempDir::new().unwrap();
        let profile = profile_with_groups(&temp, &[("Research", 1), ("Later", 1)]);
        let backups = BackupManager::new(temp.path().join("backups"));
        let to_projects = ParkOptions {
            destination: Some("Projects".into()),
            ..options()
        };

        park_tab_group(&profile, &backups, "Research", &to_projects).unwrap();
        let report = park_tab_group(&profile, &backups, "Later", &to_projects).unwrap();
        assert_eq!(report.folder_path, "Projects/Later");

        let bookmarks = read_bookmarks(&profile).unwrap();
        let projects = bookmarks.roots.bookmark_bar.find_folder("Projects").unwrap();
        let names: Vec<&str> = projects.folders().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["Deep", "Research", "Later"]);
        assert_eq!(bookmarks.roots.bookmark_bar.folders().count(), 1);
    }

    #[test]
    fn test_park_dry_run_leaves_bookmarks_alone() {
        let temp = TempDir::new().unwrap();
        let profile = profile_with_groups(&temp, &[("Research", 3)]);
        let backups = BackupManager::new(temp.path().join("backups"));
        let original = std::fs::read(bookmarks_path(&profile)).unwrap();

        let report = park_tab_group(
            &profile,
            &backups,
            "Research",
            &ParkOptions {
                dry_run: true,
                ..options()
            },
        )
        .unwrap();

        assert!(report.dry_run);
        assert_eq!(report.bookmark_count, 3);
        assert_eq!(std::fs::read(bookmarks_path(&profile)).unwrap(), original);
        assert!(backups.list_backups().unwrap().is_empty());
    }

    #[test]
    fn test_park_unknown_group_is_not_found() {
        let temp = TempDir::new().unwrap();
        let profile = profile_with_groups(&temp, &[("Research", 1)]);
        let backups = BackupManager::new(temp.path().join("backups"));
        let result = park_tab_group(&profile, &backups, "Nope", &options());
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[test]
    fn test_cleanup_parks_only_junk_with_one_backup() {
        let temp = TempDir::new().unwrap();
        let profile =
            profile_with_groups(&temp, &[("Research", 1), ("3 tabs", 3), ("1 tab", 1), ("1 tab", 1)]);
        let backups = BackupManager::new(temp.path().join("backups"));

        assert_eq!(junk_groups(&profile).unwrap().len(), 3);
        let reports = cleanup_junk_groups(&profile, &backups, &options()).unwrap();

        assert_eq!(reports.len(), 3);
        assert!(reports.iter().all(|r| r.folder_path.starts_with("Phone Sync Junk/")));
        assert_eq!(backups.list_backups().unwrap().len(), 1);

        let bookmarks = read_bookmarks(&profile).unwrap();
        let junk = bookmarks.roots.bookmark_bar.find_folder("Phone Sync Junk").unwrap();
        assert_eq!(junk.folders().count(), 3);
        assert_eq!(junk.flatten().len(), 5);
        assert!(bookmarks.roots.bookmark_bar.find_folder("Phone Sync Junk/Research").is_none());
    }

    #[test]
    fn test_cleanup_without_junk_writes_nothing() {
        let temp = TempDir::new().unwrap();
        let profile = profile_with_groups(&temp, &[("Research", 1)]);
        let backups = BackupManager::new(temp.path().join("backups"));
        let original = std::fs::read(bookmarks_path(&profile)).unwrap();

        assert!(cleanup_junk_groups(&profile, &backups, &options()).unwrap().is_empty());
        assert_eq!(std::fs::read(bookmarks_path(&profile)).unwrap(), original);
    }

    #[test]
    fn test_unpark_appends_group_from_folder() {
        let temp = TempDir::new().unwrap();
        let profile = profile_with_groups(&temp, &[]);
        let backups = BackupManager::new(temp.path().join("backups"));

        let report = unpark_bookmark_folder(
            &profile,
            &backups,
            "projects",
            TabGroupColor::Cyan,
            &mut SequentialIdSource::new(500, 9),
            CreateGroupOptions {
                backup: true,
                ..CREATE
            },
        )
        .unwrap();

        assert_eq!(report.group_name, "Projects");
        assert_eq!(report.tab_count, 2);
        assert!(report.backup_path.is_some());

        let groups = read_tab_groups(&profile).unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].name, "Projects");
        assert_eq!(groups[0].color, TabGroupColor::Cyan);
        let urls: Vec<&str> = groups[0].tabs.iter().map(|t| t.url.as_str()).collect();
        assert_eq!(urls, ["https://rust-lang.org/", "https://docs.rs/"]);
    }

    #[test]
    fn test_park_then_unpark_restores_tabs() {
        let temp = TempDir::new().unwrap();
        let profile = profile_with_groups(&temp, &[("Reading", 2)]);
        let backups = BackupManager::new(temp.path().join("backups"));

        let parked = park_tab_group(&profile, &backups, "Reading", &options()).unwrap();
        unpark_bookmark_folder(
            &profile,
            &backups,
            &parked.folder_path,
            TabGroupColor::Grey,
            &mut SequentialIdSource::new(900, 77),
            CREATE,
        )
        .unwrap();

        let groups = read_tab_groups(&profile).unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].name, "Reading");
        assert_eq!(groups[1].name, "Reading");
        assert_eq!(groups[0].tabs.len(), groups[1].tabs.len());
    }

    #[test]
    fn test_unpark_empty_or_missing_folder() {
        let temp = TempDir::new().unwrap();
        let profile = profile_with_groups(&temp, &[]);
        let backups = BackupManager::new(temp.path().join("backups"));
        let mut ids = SequentialIdSource::new(1, 1);

        let missing = unpark_bookmark_folder(
            &profile, &backups, "Nope", TabGroupColor::Grey, &mut ids, CREATE,
        );
        assert!(matches!(missing, Err(StorageError::NotFound(_))));

        let mut bookmarks = read_bookmarks(&profile).unwrap();
        let mut node_ids = bookmarks.node_ids();
        bookmarks
            .roots
            .bookmark_bar
            .ensure_folder_path("Empty", &mut node_ids, "1")
            .unwrap();
        crate::bookmarks::write_bookmarks(&profile, &bookmarks).unwrap();

        let empty = unpark_bookmark_folder(
            &profile, &backups, "Empty", TabGroupColor::Grey, &mut ids, CREATE,
        );
        assert!(matches!(empty, Err(StorageError::InvalidInput(_))));
    }
}
