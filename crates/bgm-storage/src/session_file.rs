//! Reading and appending to session logs on disk

use std::fs::OpenOptions;
use std::io::{Read, Write};
use std::path::Path;

use tracing::{debug, info, instrument};

use bgm_snss::frame::HEADER_LEN;
use bgm_snss::{Record, SessionLog, read_header, serialize_records};

use crate::error::StorageError;

/// Read a whole session file into memory
pub fn load_session_bytes(path: &Path) -> Result<Vec<u8>, StorageError> {
    match std::fs::read(path) {
        Ok(bytes) => Ok(bytes),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(StorageError::not_found(
            format!("session file {}", path.display()),
        )),
        Err(e) => Err(e.into()),
    }
}

/// Read and decode a session file
#[instrument(skip_all, fields(path = %path.display()))]
pub fn read_session_log(path: &Path) -> Result<SessionLog, StorageError> {
    let bytes = load_session_bytes(path)?;
    let log = bgm_snss::decode(&bytes)?;
    debug!(records = log.entries.len(), "Read session log");
    Ok(log)
}

/// Whether the file starts with a valid header
pub fn is_valid_session_log(path: &Path) -> bool {
    load_session_bytes(path)
        .map(|bytes| read_header(&bytes).is_ok())
        .unwrap_or(false)
}

/// Append records to an existing session log.
///
/// Only the header is read back and checked before anything is written.
/// The records go out in one write and are synced before returning.
/// Returns the number of bytes appended.
#[instrument(skip_all, fields(path = %path.display(), records = records.len()))]
pub fn append_to_session_log(path: &Path, records: &[Record]) -> Result<usize, StorageError> {
    let mut file = match OpenOptions::new().read(true).append(true).open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(StorageError::not_found(format!(
                "session file {}",
                path.display()
            )));
        }
        Err(e) => return Err(e.into()),
    };

    let mut header = Vec::with_capacity(HEADER_LEN);
    (&mut file).take(HEADER_LEN as u64).read_to_end(&mut header)?;
    read_header(&header)?;

    let bytes = serialize_records(records);
    file.write_all(&bytes)?;
    file.sync_data()?;

    info!(bytes = bytes.len(), "Appended to session log");
    Ok(bytes.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bgm_core::{SequentialIdSource, TabGroupColor, TabInput};
    use tempfile::TempDir;

    fn empty_log() -> Vec<u8> {
        let mut bytes = b"SNSS".to_vec();
        bytes.extend_from_slice(&3u32.to_le_bytes());
        bytes
    }

    #[test]
    fn test_append_then_read() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("Session_1");
        std::fs::write(&path, empty_log()).unwrap();

        let tabs = [TabInput::new("https://a.test", "A")];
        let group = bgm_snss::encode_group(
            "Reading",
            TabGroupColor::Cyan,
            &tabs,
            &mut SequentialIdSource::new(10, 1),
        )
        .unwrap();

        let written = append_to_session_log(&path, &group.records).unwrap();
        assert_eq!(written, group.to_bytes().len());

        let log = read_session_log(&path).unwrap();
        let groups = log.tab_groups();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].name, "Reading");
        assert_eq!(groups[0].tabs[0].url, "https://a.test");
    }

    #[test]
    fn test_append_refuses_bad_header() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("Session_1");
        std::fs::write(&path, b"JUNKJUNK").unwrap();

        let result = append_to_session_log(&path, &[]);
        assert!(matches!(result, Err(StorageError::Format(_))));
        assert_eq!(std::fs::read(&path).unwrap(), b"JUNKJUNK");
        assert!(!is_valid_session_log(&path));
    }

    #[test]
    fn test_append_after_short_header_is_refused() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("Session_2");
        std::fs::write(&path, b"SNSS\x01").unwrap();

        let result = append_to_session_log(&path, &[]);
        assert!(matches!(result, Err(StorageError::Format(_))));
        assert_eq!(std::fs::read(&path).unwrap(), b"SNSS\x01");
    }

    #[test]
    fn test_append_to_missing_file_is_not_found() {
        let temp = TempDir::new().unwrap();
        let result = append_to_session_log(&temp.path().join("Session_3"), &[]);
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[test]
    fn test_missing_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("Session_9");
        assert!(matches!(
            read_session_log(&path),
            Err(StorageError::NotFound(_))
        ));
        assert!(!is_valid_session_log(&path));
    }
}
