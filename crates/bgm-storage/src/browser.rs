//! Browser location and process checks

use std::path::PathBuf;
use std::process::{Command, Stdio};

use tracing::{debug, warn};

use crate::error::StorageError;

/// Display name used in messages
pub const BROWSER_NAME: &str = "Brave";

/// Default user data directory for the current platform
pub fn default_browser_data_dir() -> Result<PathBuf, StorageError> {
    if cfg!(target_os = "windows") {
        let local = dirs::data_local_dir().ok_or(StorageError::NoDirectory("local data"))?;
        Ok(local
            .join("BraveSoftware")
            .join("Brave-Browser")
            .join("User Data"))
    } else if cfg!(target_os = "macos") {
        let home = dirs::home_dir().ok_or(StorageError::NoDirectory("home"))?;
        Ok(home
            .join("Library")
            .join("Application Support")
            .join("BraveSoftware")
            .join("Brave-Browser"))
    } else {
        let home = dirs::home_dir().ok_or(StorageError::NoDirectory("home"))?;
        Ok(home
            .join(".config")
            .join("BraveSoftware")
            .join("Brave-Browser"))
    }
}

/// Whether a browser process is currently running.
///
/// A process check that cannot run counts as "not running".
pub fn is_browser_running() -> bool {
    let result = if cfg!(target_os = "windows") {
        Command::new("tasklist")
            .args(["/FI", "IMAGENAME eq brave.exe"])
            .stderr(Stdio::null())
            .output()
            .map(|out| {
                String::from_utf8_lossy(&out.stdout)
                    .to_lowercase()
                    .contains("brave.exe")
            })
    } else {
        Command::new("pgrep")
            .args(["-x", "brave"])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|status| status.success())
    };

    match result {
        Ok(running) => {
            debug!(running, "Checked for browser process");
            running
        }
        Err(e) => {
            warn!(error = %e, "Could not check for browser process");
            false
        }
    }
}

/// Fail if the browser is running
pub fn ensure_browser_closed() -> Result<(), StorageError> {
    if is_browser_running() {
        return Err(StorageError::BrowserRunning(BROWSER_NAME.to_string()));
    }
    Ok(())
}
