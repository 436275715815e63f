//! Reading and replacing the browser's JSON files

use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::StorageError;

/// Parse a JSON file; a missing file is `NotFound`
pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, StorageError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(StorageError::not_found(format!("{}", path.display())));
        }
        Err(e) => return Err(e.into()),
    };
    serde_json::from_str(&content).map_err(|e| StorageError::json(path, e))
}

/// Replace a JSON file through a sibling temp file and a rename, so a
/// failed write leaves the old file in place
pub(crate) fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), StorageError> {
    let content = serde_json::to_string_pretty(value).map_err(|e| StorageError::json(path, e))?;
    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".bgm-tmp");
    let tmp = std::path::PathBuf::from(tmp_name);

    std::fs::write(&tmp, content)?;
    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(e.into());
    }
    Ok(())
}
