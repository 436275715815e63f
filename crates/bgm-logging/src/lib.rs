//! Logging setup for bgm
//!
//! Builds a `tracing` subscriber from a [`LogConfig`]:
//!
//! - **Console**: pretty human-readable output or JSONL, on stdout or stderr
//! - **File**: JSONL via `tracing-appender`, rotated daily/hourly or a single
//!   truncated file
//! - **Filter**: `RUST_LOG` when set, otherwise the configured default level
//!
//! # Quick Start
//!
//! ```ignore
//! use bgm_logging::{BgmSubscriberBuilder, FileConfig, LogConfig};
//!
//! let mut builder = BgmSubscriberBuilder::new().with_config(LogConfig::cli(verbosity));
//! if let Some(file) = user_config.log_file {
//!     builder = builder.with_file_output(file);
//! }
//! let _guard = builder.init();
//! ```
//!
//! Keep the returned guard alive while logging to a file; dropping it
//! flushes the background writer.

pub mod config;

pub use config::{
    ConsoleConfig, ConsoleFormat, ConsoleTarget, FileConfig, LogConfig, RotationStrategy,
};

use std::fs::{self, File};

use thiserror::Error;
use tracing::debug;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{EnvFilter, Registry, layer::SubscriberExt, util::SubscriberInitExt};

/// Errors raised while installing the subscriber
#[derive(Debug, Error)]
pub enum LoggingError {
    /// The log file or directory could not be created
    #[error("Failed to open log file: {0}")]
    File(String),

    /// A global subscriber is already installed
    #[error("Failed to install subscriber: {0}")]
    Init(String),
}

/// Builder for the global bgm subscriber
#[derive(Debug, Default)]
pub struct BgmSubscriberBuilder {
    config: LogConfig,
}

impl BgmSubscriberBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a specific configuration
    pub fn with_config(mut self, config: LogConfig) -> Self {
        self.config = config;
        self
    }

    /// Also write JSONL to files
    pub fn with_file_output(mut self, config: FileConfig) -> Self {
        self.config.file = Some(config);
        self
    }

    /// Initialize the subscriber globally.
    ///
    /// Failures are reported on stderr and logging stays off.
    pub fn init(self) -> Option<WorkerGuard> {
        self.try_init().unwrap_or_else(|e| {
            eprintln!("Warning: {e}");
            None
        })
    }

    /// Try to initialize the subscriber globally.
    ///
    /// Returns the file writer's guard when file output is configured.
    pub fn try_init(self) -> Result<Option<WorkerGuard>, LoggingError> {
        let env_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&self.config.default_level));

        let (file_writer, guard) = match &self.config.file {
            Some(file_config) => {
                let (writer, guard) = create_file_writer(file_config)?;
                (Some(writer), Some(guard))
            }
            None => (None, None),
        };

        let console = &self.config.console;

        // Pretty and JSONL layers have different types; at most one is Some
        let pretty_console = (console.enabled && console.format == ConsoleFormat::Pretty).then(|| {
            tracing_subscriber::fmt::layer()
                .with_ansi(console.ansi)
                .with_target(true)
                .with_writer(console_writer(console.target))
        });

        let jsonl_console = (console.enabled && console.format == ConsoleFormat::Jsonl).then(|| {
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(true)
                .with_span_list(true)
                .flatten_event(true)
                .with_writer(console_writer(console.target))
        });

        let file_layer = file_writer.map(|writer| {
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(true)
                .with_span_list(true)
                .flatten_event(true)
                .with_file(true)
                .with_line_number(true)
                .with_writer(writer)
        });

        Registry::default()
            .with(env_filter)
            .with(pretty_console)
            .with(jsonl_console)
            .with(file_layer)
            .try_init()
            .map_err(|e| LoggingError::Init(e.to_string()))?;

        debug!(
            level = %self.config.default_level,
            log_dir = ?self.config.file.as_ref().map(|f| &f.directory),
            "Logging initialized"
        );
        Ok(guard)
    }
}

fn console_writer(target: ConsoleTarget) -> BoxMakeWriter {
    match target {
        ConsoleTarget::Stdout => BoxMakeWriter::new(std::io::stdout),
        ConsoleTarget::Stderr => BoxMakeWriter::new(std::io::stderr),
    }
}

/// Open the file sink: truncates for `Never` rotation, appends for others
fn create_file_writer(config: &FileConfig) -> Result<(NonBlocking, WorkerGuard), LoggingError> {
    fs::create_dir_all(&config.directory).map_err(|e| LoggingError::File(e.to_string()))?;

    let rotation = match config.rotation {
        RotationStrategy::Never => {
            let path = config.directory.join(format!("{}.log", config.prefix));
            let file = File::create(&path).map_err(|e| LoggingError::File(e.to_string()))?;
            return Ok(tracing_appender::non_blocking(file));
        }
        RotationStrategy::Daily => Rotation::DAILY,
        RotationStrategy::Hourly => Rotation::HOURLY,
    };

    let mut builder = RollingFileAppender::builder()
        .rotation(rotation)
        .filename_prefix(config.prefix.clone())
        .filename_suffix("log");
    if let Some(max) = config.max_files {
        builder = builder.max_log_files(max);
    }
    let appender = builder
        .build(&config.directory)
        .map_err(|e| LoggingError::File(e.to_string()))?;
    Ok(tracing_appender::non_blocking(appender))
}

/// Initialize logging for testing (minimal output, errors ignored)
pub fn init_testing() {
    let _ = BgmSubscriberBuilder::new()
        .with_config(LogConfig::testing())
        .try_init();
}
