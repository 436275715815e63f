//! Logging configuration
//!
//! [`LogConfig`] is built by the binary from `-v` flags; the optional
//! [`FileConfig`] part comes from the user's `config.json` (`logFile`).

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// What the subscriber should emit and where
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Filter directive used when RUST_LOG is unset
    pub default_level: String,
    pub console: ConsoleConfig,
    /// JSONL file sink, off when `None`
    pub file: Option<FileConfig>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            default_level: "info".to_string(),
            console: ConsoleConfig::default(),
            file: None,
        }
    }
}

impl LogConfig {
    /// Command line output: pretty on stderr, `warn` unless raised by `-v`
    pub fn cli(verbosity: u8) -> Self {
        let level = match verbosity {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        };
        Self {
            default_level: level.to_string(),
            console: ConsoleConfig {
                format: ConsoleFormat::Pretty,
                ansi: true,
                target: ConsoleTarget::Stderr,
                ..ConsoleConfig::default()
            },
            file: None,
        }
    }

    /// Quiet JSONL on stderr for test binaries
    pub fn testing() -> Self {
        Self {
            default_level: "warn".to_string(),
            console: ConsoleConfig {
                target: ConsoleTarget::Stderr,
                ..ConsoleConfig::default()
            },
            file: None,
        }
    }
}

/// Terminal output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleConfig {
    pub enabled: bool,
    pub format: ConsoleFormat,
    /// Colors, pretty format only
    pub ansi: bool,
    pub target: ConsoleTarget,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            format: ConsoleFormat::Jsonl,
            ansi: false,
            target: ConsoleTarget::Stdout,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConsoleFormat {
    Pretty,
    #[default]
    Jsonl,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConsoleTarget {
    #[default]
    Stdout,
    Stderr,
}

/// JSONL log files, as written in `config.json`:
///
/// ```json
/// "logFile": { "directory": "/home/me/.local/state/bgm", "rotation": "daily", "maxFiles": 14 }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileConfig {
    pub directory: PathBuf,
    #[serde(default = "default_prefix")]
    pub prefix: String,
    #[serde(default)]
    pub rotation: RotationStrategy,
    /// Oldest rotated files beyond this count are deleted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_files: Option<usize>,
}

fn default_prefix() -> String {
    "bgm".to_string()
}

impl FileConfig {
    /// Daily rotation under `directory` with the default prefix
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            prefix: default_prefix(),
            rotation: RotationStrategy::default(),
            max_files: None,
        }
    }
}

/// When the log file rolls over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RotationStrategy {
    #[default]
    Daily,
    Hourly,
    /// One `<prefix>.log`, truncated on start
    Never,
}
