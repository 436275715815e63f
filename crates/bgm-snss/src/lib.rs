//! # bgm SNSS
//!
//! Codec and projection engine for the browser's session log.
//!
//! The browser keeps live window, tab and tab-group state in an append-only
//! binary log. This crate reads it and writes to it:
//!
//! - **Read path**: bytes -> [`frame::read_frames`] -> [`Record`]s ->
//!   [`command::decode_record`] -> [`SessionCommand`]s -> [`project`] ->
//!   [`TabGroup`]s
//! - **Write path**: (name, color, tabs) -> [`encoder::encode_group`] ->
//!   [`Record`]s -> [`writer::serialize_records`] -> bytes to append
//!
//! ## Storage Format
//!
//! ```text
//! [4 bytes: "SNSS"][u32: version]
//! [u16: size][u8: opcode][size - 1 bytes: payload][u16: size][...]
//! ```
//!
//! All integers are little-endian. Payloads are pickle-style, see
//! [`pickle`].
//!
//! ## Example
//!
//! ```rust,ignore
//! use bgm_snss::{decode, encode, project};
//! use bgm_core::{SystemIdSource, TabGroupColor, TabInput};
//!
//! let log = decode(&bytes)?;
//! for group in log.tab_groups() {
//!     println!("{} ({} tabs)", group.name, group.tabs.len());
//! }
//!
//! let tabs = [TabInput::new("https://example.com", "Example")];
//! let to_append = encode("Reading", TabGroupColor::Blue, &tabs, &mut SystemIdSource::new())?;
//! ```

pub mod command;
pub mod encoder;
pub mod frame;
pub mod pickle;
pub mod projection;
pub mod writer;

use std::collections::BTreeMap;

use tracing::{info, instrument};

use bgm_core::{FormatError, TabGroup};

pub use command::{Opcode, SessionCommand, decode_record};
pub use encoder::{EncodedGroup, encode, encode_command, encode_group};
pub use frame::{FrameScan, Record, SNSS_MAGIC, read_frames, read_header};
pub use projection::{ReplayTables, project};
pub use writer::{append_records, serialize_records, write_record};

/// A record with its decoded command, if it could be decoded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub record: Record,
    /// `None` when a known opcode's payload was too short
    pub command: Option<SessionCommand>,
}

/// A fully decoded session log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionLog {
    pub version: u32,
    pub entries: Vec<LogEntry>,
    /// Offset where a torn tail stopped the scan
    pub truncated_at: Option<usize>,
}

impl SessionLog {
    pub fn records(&self) -> impl Iterator<Item = &Record> {
        self.entries.iter().map(|e| &e.record)
    }

    /// Decoded commands in log order, skipping undecodable records
    pub fn commands(&self) -> impl Iterator<Item = &SessionCommand> {
        self.entries.iter().filter_map(|e| e.command.as_ref())
    }

    pub fn tab_groups(&self) -> Vec<TabGroup> {
        project(self.commands())
    }

    pub fn summary(&self) -> LogSummary {
        let mut by_opcode = BTreeMap::new();
        let mut undecoded = 0;
        let mut unknown = 0;
        for entry in &self.entries {
            *by_opcode.entry(entry.record.opcode()).or_insert(0) += 1;
            match &entry.command {
                None => undecoded += 1,
                Some(cmd) if cmd.is_unknown() => unknown += 1,
                Some(_) => {}
            }
        }
        LogSummary {
            version: self.version,
            records: self.entries.len(),
            by_opcode,
            undecoded,
            unknown,
            truncated_at: self.truncated_at,
        }
    }
}

/// Record counts for a decoded log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSummary {
    pub version: u32,
    pub records: usize,
    /// Record count per raw opcode
    pub by_opcode: BTreeMap<u8, usize>,
    /// Known opcodes whose payload was too short
    pub undecoded: usize,
    /// Opcodes outside the known vocabulary
    pub unknown: usize,
    pub truncated_at: Option<usize>,
}

/// Frame and decode a whole session log.
///
/// Fails only on a bad header.
#[instrument(skip(buffer), fields(len = buffer.len()))]
pub fn decode(buffer: &[u8]) -> Result<SessionLog, FormatError> {
    let scan = read_frames(buffer)?;
    let entries: Vec<LogEntry> = scan
        .records
        .into_iter()
        .map(|record| {
            let command = decode_record(&record);
            LogEntry { record, command }
        })
        .collect();

    info!(
        version = scan.version,
        records = entries.len(),
        truncated = scan.truncated_at.is_some(),
        "Decoded session log"
    );
    Ok(SessionLog {
        version: scan.version,
        entries,
        truncated_at: scan.truncated_at,
    })
}
