//! Browser profiles
//!
//! Profiles are listed in the browser's `Local State` JSON under
//! `profile.info_cache`, keyed by directory name.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::StorageError;

/// Directory of the profile the browser creates first
pub const DEFAULT_PROFILE_DIR: &str = "Default";

/// A browser profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Directory name, e.g. "Default" or "Profile 1"
    pub directory: String,
    /// Display name, e.g. "Work"
    pub name: String,
    /// Full path to the profile directory
    pub path: PathBuf,
}

#[derive(Debug, Deserialize)]
struct LocalState {
    profile: ProfileSection,
}

#[derive(Debug, Deserialize)]
struct ProfileSection {
    #[serde(default)]
    info_cache: BTreeMap<String, ProfileInfo>,
}

#[derive(Debug, Deserialize)]
struct ProfileInfo {
    #[serde(default)]
    name: String,
}

/// List profiles, `Default` first and the rest by display name
pub fn list_profiles(data_dir: &Path) -> Result<Vec<Profile>, StorageError> {
    let local_state = data_dir.join("Local State");
    if !local_state.exists() {
        return Err(StorageError::not_found(format!(
            "Local State file at {}",
            local_state.display()
        )));
    }

    let content = std::fs::read_to_string(&local_state)?;
    let state: LocalState =
        serde_json::from_str(&content).map_err(|e| StorageError::json(&local_state, e))?;

    let mut profiles: Vec<Profile> = state
        .profile
        .info_cache
        .into_iter()
        .map(|(directory, info)| Profile {
            name: if info.name.is_empty() {
                directory.clone()
            } else {
                info.name
            },
            path: data_dir.join(&directory),
            directory,
        })
        .collect();

    profiles.sort_by(|a, b| {
        let a_default = a.directory == DEFAULT_PROFILE_DIR;
        let b_default = b.directory == DEFAULT_PROFILE_DIR;
        b_default.cmp(&a_default).then_with(|| a.name.cmp(&b.name))
    });

    debug!(count = profiles.len(), "Listed profiles");
    Ok(profiles)
}

/// Find a profile by display name (case-insensitive), then by directory
pub fn resolve_profile<'a>(profiles: &'a [Profile], input: &str) -> Option<&'a Profile> {
    let wanted = input.to_lowercase();
    profiles
        .iter()
        .find(|p| p.name.to_lowercase() == wanted)
        .or_else(|| profiles.iter().find(|p| p.directory == input))
}
