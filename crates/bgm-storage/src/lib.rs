//! # bgm Storage
//!
//! Everything around the session log that touches the filesystem or the
//! host: locating the browser's data directory, listing profiles and session
//! files, loading and appending logs, backups, and the browser-running check.
//! Parking moves groups into the profile's bookmarks and back, and the
//! closed-remote-group list lives in `Preferences`.
//!
//! ## Layout on disk
//!
//! ```text
//! <browser data dir>/
//! ├── Local State               # profile.info_cache
//! └── <profile>/
//!     ├── Bookmarks             # parked groups
//!     ├── Preferences           # closed remote group ids
//!     └── Sessions/
//!         ├── Session_<timestamp>   # the log tab groups live in
//!         ├── Tabs_<timestamp>
//!         └── Apps_<timestamp>
//!
//! <backup dir>/<timestamp>/
//! ├── session-Session_<timestamp>
//! └── metadata.json
//! ```

pub mod backup;
pub mod bookmarks;
pub mod browser;
pub mod config;
pub mod error;
pub mod groups;
mod json_file;
pub mod park;
pub mod profiles;
pub mod remote;
pub mod session_file;
pub mod sessions;

pub use backup::{BackedUpFile, BackupEntry, BackupManager, BackupMetadata};
pub use bookmarks::{
    BOOKMARKS_FILE, Bookmark, BookmarkFolder, BookmarkNode, BookmarksFile, read_bookmarks,
    write_bookmarks,
};
pub use browser::{default_browser_data_dir, ensure_browser_closed, is_browser_running};
pub use config::BgmConfig;
pub use error::StorageError;
pub use groups::{
    CreateGroupOptions, CreateGroupReport, create_tab_group, find_tab_group, read_tab_groups,
};
pub use park::{
    DEFAULT_PARKED_FOLDER, JUNK_PARKED_FOLDER, ParkOptions, ParkReport, cleanup_junk_groups,
    junk_groups, park_groups, park_tab_group, unpark_bookmark_folder,
};
pub use profiles::{Profile, list_profiles, resolve_profile};
pub use remote::{
    ClearRemoteReport, ClosedRemoteGroups, SyncCacheGroups, clear_closed_remote_groups,
    read_closed_remote_groups,
};
pub use session_file::{
    append_to_session_log, is_valid_session_log, load_session_bytes, read_session_log,
};
pub use sessions::{SessionFile, SessionKind, latest_session_file, list_session_files};
