//! The profile's `Bookmarks` file
//!
//! A JSON tree with three roots (`bookmark_bar`, `other`, `synced`). Nodes
//! are either folders with `children` or URLs. Ids are decimal strings
//! unique across the file, dates are microseconds since 1601-01-01 as
//! strings. Fields this module does not model are carried through
//! untouched on write.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::StorageError;
use crate::json_file::{read_json, write_json};

/// File name inside the profile directory
pub const BOOKMARKS_FILE: &str = "Bookmarks";

/// Seconds between 1601-01-01 and the Unix epoch
const WINDOWS_EPOCH_OFFSET_SECS: i64 = 11_644_473_600;

/// Current time in the browser's bookmark date format
pub fn bookmark_time_now() -> String {
    let micros = chrono::Utc::now().timestamp_micros() + WINDOWS_EPOCH_OFFSET_SECS * 1_000_000;
    micros.to_string()
}

pub fn bookmarks_path(profile_path: &Path) -> PathBuf {
    profile_path.join(BOOKMARKS_FILE)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookmarksFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
    pub roots: BookmarkRoots,
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_version() -> u32 {
    1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookmarkRoots {
    pub bookmark_bar: BookmarkFolder,
    pub other: BookmarkFolder,
    #[serde(default)]
    pub synced: BookmarkFolder,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A node in the tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BookmarkNode {
    Url(Bookmark),
    Folder(BookmarkFolder),
}

impl BookmarkNode {
    pub fn id(&self) -> &str {
        match self {
            BookmarkNode::Url(b) => &b.id,
            BookmarkNode::Folder(f) => &f.id,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BookmarkFolder {
    pub id: String,
    #[serde(default)]
    pub guid: String,
    pub name: String,
    #[serde(default)]
    pub date_added: String,
    #[serde(default)]
    pub date_modified: String,
    #[serde(default)]
    pub children: Vec<BookmarkNode>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bookmark {
    pub id: String,
    #[serde(default)]
    pub guid: String,
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub date_added: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub date_last_used: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Hands out ids above every id already in the file
#[derive(Debug, Clone)]
pub struct NodeIds {
    next: u64,
}

impl NodeIds {
    pub fn next_id(&mut self) -> String {
        let id = self.next;
        self.next += 1;
        id.to_string()
    }
}

impl Bookmark {
    pub fn new(id: String, name: impl Into<String>, url: impl Into<String>, now: &str) -> Self {
        Self {
            id,
            guid: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            url: url.into(),
            date_added: now.to_string(),
            date_last_used: String::new(),
            extra: Map::new(),
        }
    }
}

impl BookmarkFolder {
    pub fn new(id: String, name: impl Into<String>, now: &str) -> Self {
        Self {
            id,
            guid: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            date_added: now.to_string(),
            date_modified: now.to_string(),
            children: Vec::new(),
            extra: Map::new(),
        }
    }

    /// Direct child folders
    pub fn folders(&self) -> impl Iterator<Item = &BookmarkFolder> {
        self.children.iter().filter_map(|c| match c {
            BookmarkNode::Folder(f) => Some(f),
            BookmarkNode::Url(_) => None,
        })
    }

    /// Direct child URLs
    pub fn urls(&self) -> impl Iterator<Item = &Bookmark> {
        self.children.iter().filter_map(|c| match c {
            BookmarkNode::Url(b) => Some(b),
            BookmarkNode::Folder(_) => None,
        })
    }

    /// Every URL below this folder, depth first in tree order
    pub fn flatten(&self) -> Vec<&Bookmark> {
        let mut out = Vec::new();
        collect_urls(self, &mut out);
        out
    }

    /// Folder at a `/`-separated path, names compared case-insensitively.
    /// An empty path is this folder.
    pub fn find_folder(&self, path: &str) -> Option<&BookmarkFolder> {
        let mut current = self;
        for part in path_parts(path) {
            let wanted = part.to_lowercase();
            current = current.folders().find(|f| f.name.to_lowercase() == wanted)?;
        }
        Some(current)
    }

    /// Folder at `path`, creating missing folders along the way
    pub fn ensure_folder_path(
        &mut self,
        path: &str,
        ids: &mut NodeIds,
        now: &str,
    ) -> Result<&mut BookmarkFolder, StorageError> {
        let mut current = self;
        for part in path_parts(path) {
            let wanted = part.to_lowercase();
            let existing = current.children.iter().position(
                |c| matches!(c, BookmarkNode::Folder(f) if f.name.to_lowercase() == wanted),
            );
            let index = match existing {
                Some(index) => index,
                None => {
                    debug!(folder = part, "Creating bookmark folder");
                    let folder = BookmarkFolder::new(ids.next_id(), part, now);
                    current.children.push(BookmarkNode::Folder(folder));
                    current.date_modified = now.to_string();
                    current.children.len() - 1
                }
            };
            current = match current.children.get_mut(index) {
                Some(BookmarkNode::Folder(folder)) => folder,
                _ => {
                    return Err(StorageError::InvalidInput(format!(
                        "bookmark path '{path}' does not lead to a folder"
                    )));
                }
            };
        }
        Ok(current)
    }

    fn max_id(&self) -> u64 {
        let own = self.id.parse().unwrap_or(0);
        self.children
            .iter()
            .map(|c| match c {
                BookmarkNode::Folder(f) => f.max_id(),
                BookmarkNode::Url(b) => b.id.parse().unwrap_or(0),
            })
            .fold(own, u64::max)
    }
}

fn collect_urls<'a>(folder: &'a BookmarkFolder, out: &mut Vec<&'a Bookmark>) {
    for child in &folder.children {
        match child {
            BookmarkNode::Url(b) => out.push(b),
            BookmarkNode::Folder(f) => collect_urls(f, out),
        }
    }
}

fn path_parts(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').map(str::trim).filter(|p| !p.is_empty())
}

impl BookmarksFile {
    /// Id allocator for nodes added to this file
    pub fn node_ids(&self) -> NodeIds {
        let max = [
            &self.roots.bookmark_bar,
            &self.roots.other,
            &self.roots.synced,
        ]
        .iter()
        .map(|root| root.max_id())
        .max()
        .unwrap_or(0);
        NodeIds { next: max + 1 }
    }
}

/// Read a profile's bookmarks
pub fn read_bookmarks(profile_path: &Path) -> Result<BookmarksFile, StorageError> {
    read_json(&bookmarks_path(profile_path))
}

/// Replace a profile's bookmarks.
///
/// The stored checksum no longer matches once the tree changes, so it is
/// dropped and the browser recomputes it on its next save.
pub fn write_bookmarks(profile_path: &Path, bookmarks: &BookmarksFile) -> Result<(), StorageError> {
    let mut bookmarks = bookmarks.clone();
    bookmarks.checksum = None;
    write_json(&bookmarks_path(profile_path), &bookmarks)?;
    debug!(path = %profile_path.display(), "Wrote bookmarks");
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use tempfile::TempDir;

    pub(crate) const SAMPLE: &str = r#"{
        "checksum": "0123456789abcdef",
        "roots": {
            "bookmark_bar": {
                "children": [
                    {
                        "children": [
                            { "date_added": "1", "guid": "g-3", "id": "3", "name": "Rust", "type": "url", "url": "https://rust-lang.org/" },
                            {
                                "children": [
                                    { "date_added": "1", "guid": "g-5", "id": "5", "name": "Docs", "type": "url", "url": "https://docs.rs/" }
                                ],
                                "date_added": "1", "date_modified": "1", "guid": "g-4", "id": "4", "name": "Deep", "type": "folder"
                            }
                        ],
                        "date_added": "1", "date_modified": "1", "guid": "g-2", "id": "2", "name": "Projects", "type": "folder"
                    },
                    { "date_added": "1", "guid": "g-6", "id": "6", "name": "News", "type": "url", "url": "https://news.test/", "meta_info": { "k": "v" } }
                ],
                "date_added": "1", "date_modified": "1", "guid": "g-1", "id": "1", "name": "Bookmarks bar", "type": "folder"
            },
            "other": { "children": [], "date_added": "1", "date_modified": "0", "guid": "g-7", "id": "17", "name": "Other bookmarks", "type": "folder" },
            "synced": { "children": [], "date_added": "1", "date_modified": "0", "guid": "g-8", "id": "8", "name": "Mobile bookmarks", "type": "folder" }
        },
        "sync_metadata": "opaque",
        "version": 1
    }"#;

    pub(crate) fn write_sample(profile: &Path) {
        std::fs::create_dir_all(profile).unwrap();
        std::fs::write(bookmarks_path(profile), SAMPLE).unwrap();
    }

    #[test]
    fn test_read_tree() {
        let temp = TempDir::new().unwrap();
        write_sample(temp.path());
        let bookmarks = read_bookmarks(temp.path()).unwrap();

        let bar = &bookmarks.roots.bookmark_bar;
        assert_eq!(bar.folders().count(), 1);
        assert_eq!(bar.urls().count(), 1);
        let urls: Vec<&str> = bar.flatten().iter().map(|b| b.url.as_str()).collect();
        assert_eq!(
            urls,
            ["https://rust-lang.org/", "https://docs.rs/", "https://news.test/"]
        );
    }

    #[test]
    fn test_find_folder_by_path() {
        let temp = TempDir::new().unwrap();
        write_sample(temp.path());
        let bar = read_bookmarks(temp.path()).unwrap().roots.bookmark_bar;

        assert_eq!(bar.find_folder("projects/DEEP").unwrap().id, "4");
        assert_eq!(bar.find_folder("/Projects/").unwrap().id, "2");
        assert_eq!(bar.find_folder("").unwrap().id, "1");
        assert!(bar.find_folder("Projects/Missing").is_none());
        // a URL is not a folder
        assert!(bar.find_folder("News").is_none());
    }

    #[test]
    fn test_node_ids_start_above_every_root() {
        let bookmarks: BookmarksFile = serde_json::from_str(SAMPLE).unwrap();
        let mut ids = bookmarks.node_ids();
        assert_eq!(ids.next_id(), "18");
        assert_eq!(ids.next_id(), "19");
    }

    #[test]
    fn test_ensure_folder_path_reuses_and_creates() {
        let mut bookmarks: BookmarksFile = serde_json::from_str(SAMPLE).unwrap();
        let mut ids = bookmarks.node_ids();
        let bar = &mut bookmarks.roots.bookmark_bar;

        let existing = bar.ensure_folder_path("PROJECTS", &mut ids, "99").unwrap();
        assert_eq!(existing.id, "2");

        let created = bar.ensure_folder_path("Parked Groups/Later", &mut ids, "99").unwrap();
        assert_eq!(created.name, "Later");
        assert_eq!(created.id, "19");
        assert!(!created.guid.is_empty());
        assert_eq!(bar.find_folder("parked groups").unwrap().id, "18");
        assert_eq!(bar.date_modified, "99");
    }

    #[test]
    fn test_write_keeps_unknown_fields_and_drops_checksum() {
        let temp = TempDir::new().unwrap();
        write_sample(temp.path());
        let mut bookmarks = read_bookmarks(temp.path()).unwrap();
        let mut ids = bookmarks.node_ids();
        let now = bookmark_time_now();
        let folder = bookmarks
            .roots
            .bookmark_bar
            .ensure_folder_path("New", &mut ids, &now)
            .unwrap();
        folder
            .children
            .push(BookmarkNode::Url(Bookmark::new(ids.next_id(), "A", "https://a.test/", &now)));
        write_bookmarks(temp.path(), &bookmarks).unwrap();

        let raw: Value =
            serde_json::from_str(&std::fs::read_to_string(bookmarks_path(temp.path())).unwrap())
                .unwrap();
        assert!(raw.get("checksum").is_none());
        assert_eq!(raw["sync_metadata"], "opaque");
        assert_eq!(raw["roots"]["bookmark_bar"]["type"], "folder");
        assert_eq!(raw["roots"]["bookmark_bar"]["children"][1]["meta_info"]["k"], "v");
        let new_folder = &raw["roots"]["bookmark_bar"]["children"][2];
        assert_eq!(new_folder["type"], "folder");
        assert_eq!(new_folder["children"][0]["type"], "url");
        assert_eq!(new_folder["children"][0]["url"], "https://a.test/");

        let reread = read_bookmarks(temp.path()).unwrap();
        assert_eq!(reread.roots.bookmark_bar.find_folder("new").unwrap().flatten().len(), 1);
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let temp = TempDir::new().unwrap();
        assert!(matches!(
            read_bookmarks(temp.path()),
            Err(StorageError::NotFound(_))
        ));
    }

    #[test]
    fn test_bookmark_time_is_after_unix_epoch_offset() {
        let now: i64 = bookmark_time_now().parse().unwrap();
        assert!(now > WINDOWS_EPOCH_OFFSET_SECS * 1_000_000);
    }
}
