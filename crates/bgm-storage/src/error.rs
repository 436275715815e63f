//! Error types for bgm-storage

use thiserror::Error;

use bgm_core::{EncodeError, FormatError};

/// Errors that can occur while locating, reading or writing browser data
#[derive(Debug, Error)]
pub enum StorageError {
    /// I/O error during storage operations
    #[error("I/O error: {0}")]
    Io(String),

    /// Requested item was not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// A JSON file could not be parsed
    #[error("Invalid JSON in {path}: {message}")]
    Json { path: String, message: String },

    /// The session log header is invalid
    #[error("Session log format error: {0}")]
    Format(#[from] FormatError),

    /// New records could not be encoded
    #[error("Encode error: {0}")]
    Encode(#[from] EncodeError),

    /// The browser holds the session log open
    #[error("{0} is running; close it before modifying browser data")]
    BrowserRunning(String),

    /// Caller supplied something unusable
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// No home/config/data directory could be determined
    #[error("Cannot determine {0} directory")]
    NoDirectory(&'static str),
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        StorageError::Io(err.to_string())
    }
}

impl StorageError {
    /// Create a new NotFound error
    pub fn not_found(item: impl Into<String>) -> Self {
        Self::NotFound(item.into())
    }

    /// Create a new I/O error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io(message.into())
    }

    /// Create a JSON error for a file
    pub fn json(path: &std::path::Path, err: serde_json::Error) -> Self {
        Self::Json {
            path: path.display().to_string(),
            message: err.to_string(),
        }
    }
}
