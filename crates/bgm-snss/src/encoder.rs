//! Command encoder: builds records for a brand-new tab group
//!
//! The record layouts mirror [`crate::command`] byte for byte so the
//! browser, and our own decoder, read them back unchanged.

use tracing::{debug, instrument};

use bgm_core::{EncodeError, GroupToken, IdSource, TabGroupColor, TabInput};

use crate::command::{Opcode, SessionCommand};
use crate::frame::Record;
use crate::pickle::PickleWriter;
use crate::writer::serialize_records;

/// Opcode used when writing group metadata
pub const METADATA_OPCODE: Opcode = Opcode::SetTabGroupMetadata2;

/// Navigation index written for new tabs
pub const INITIAL_NAVIGATION_INDEX: u32 = 0;

/// Records for one new group plus the identifiers they were built with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedGroup {
    pub token: GroupToken,
    pub window_id: u32,
    /// One id per input tab, in input order
    pub tab_ids: Vec<u32>,
    pub records: Vec<Record>,
}

impl EncodedGroup {
    /// Bytes to append to the log
    pub fn to_bytes(&self) -> Vec<u8> {
        serialize_records(&self.records)
    }
}

/// Encode a single command as a record
pub fn encode_command(command: &SessionCommand) -> Result<Record, EncodeError> {
    let mut w = PickleWriter::new();
    let opcode = match command {
        SessionCommand::Unknown { opcode, payload } => {
            return Record::new(*opcode, payload.clone());
        }
        SessionCommand::SetTabWindow { tab_id, window_id } => {
            w.write_u32(*tab_id).write_u32(*window_id);
            Opcode::SetTabWindow
        }
        SessionCommand::SetTabIndexInWindow { tab_id, index } => {
            w.write_u32(*tab_id).write_u32(*index);
            Opcode::SetTabIndexInWindow
        }
        SessionCommand::UpdateTabNavigation {
            tab_id,
            navigation_index,
            url,
            title,
        } => {
            w.write_u32(*tab_id).write_u32(*navigation_index);
            w.write_string8(url)?;
            w.write_string16(title)?;
            Opcode::UpdateTabNavigation
        }
        SessionCommand::SetSelectedNavigationIndex { tab_id, index } => {
            w.write_u32(*tab_id).write_u32(*index);
            Opcode::SetSelectedNavigationIndex
        }
        SessionCommand::SetSelectedTabInIndex { window_id, index } => {
            w.write_u32(*window_id).write_u32(*index);
            Opcode::SetSelectedTabInIndex
        }
        SessionCommand::SetWindowType {
            window_id,
            window_type,
        } => {
            w.write_u32(*window_id).write_u32(*window_type);
            Opcode::SetWindowType
        }
        SessionCommand::SetPinnedState { tab_id, pinned } => {
            w.write_u32(*tab_id).write_bool(*pinned);
            Opcode::SetPinnedState
        }
        SessionCommand::SetWindowBounds {
            window_id,
            x,
            y,
            width,
            height,
            show_state,
        } => {
            w.write_u32(*window_id)
                .write_i32(*x)
                .write_i32(*y)
                .write_i32(*width)
                .write_i32(*height)
                .write_u32(*show_state);
            Opcode::SetWindowBounds
        }
        SessionCommand::TabClosed { tab_id, close_time } => {
            w.write_u32(*tab_id).write_u64(*close_time);
            Opcode::TabClosed
        }
        SessionCommand::WindowClosed {
            window_id,
            close_time,
        } => {
            w.write_u32(*window_id).write_u64(*close_time);
            Opcode::WindowClosed
        }
        SessionCommand::SetActiveWindow { window_id } => {
            w.write_u32(*window_id);
            Opcode::SetActiveWindow
        }
        SessionCommand::SetTabGroup { tab_id, token } => {
            w.write_u32(*tab_id)
                .write_u64(token.high)
                .write_u64(token.low);
            Opcode::SetTabGroup
        }
        SessionCommand::SetTabGroupMetadata {
            token,
            title,
            color,
        } => {
            w.write_u64(token.high).write_u64(token.low);
            w.write_string16(title)?;
            w.write_u32(color.wire_value());
            METADATA_OPCODE
        }
    };

    Record::new(opcode.as_u8(), w.finish())
}

/// Build the records for a new tab group.
///
/// Emits one metadata record under a fresh token, then for each tab, in
/// input order: window assignment (one shared fresh window), index,
/// navigation, and group assignment.
#[instrument(skip(tabs, ids), fields(tabs = tabs.len()))]
pub fn encode_group(
    name: &str,
    color: TabGroupColor,
    tabs: &[TabInput],
    ids: &mut dyn IdSource,
) -> Result<EncodedGroup, EncodeError> {
    let token = ids.next_group_token();
    let window_id = ids.next_session_id();

    let mut commands = Vec::with_capacity(1 + tabs.len() * 4);
    commands.push(SessionCommand::SetTabGroupMetadata {
        token,
        title: name.to_string(),
        color,
    });

    let mut tab_ids = Vec::with_capacity(tabs.len());
    for (index, tab) in tabs.iter().enumerate() {
        let tab_id = ids.next_session_id();
        tab_ids.push(tab_id);
        commands.push(SessionCommand::SetTabWindow { tab_id, window_id });
        commands.push(SessionCommand::SetTabIndexInWindow {
            tab_id,
            index: index as u32,
        });
        commands.push(SessionCommand::UpdateTabNavigation {
            tab_id,
            navigation_index: INITIAL_NAVIGATION_INDEX,
            url: tab.url.clone(),
            title: tab.title.clone(),
        });
        commands.push(SessionCommand::SetTabGroup { tab_id, token });
    }

    let records = commands
        .iter()
        .map(encode_command)
        .collect::<Result<Vec<_>, _>>()?;

    debug!(%token, window_id, records = records.len(), "Encoded tab group");
    Ok(EncodedGroup {
        token,
        window_id,
        tab_ids,
        records,
    })
}

/// Encode a new group straight to the bytes to append
pub fn encode(
    name: &str,
    color: TabGroupColor,
    tabs: &[TabInput],
    ids: &mut dyn IdSource,
) -> Result<Vec<u8>, EncodeError> {
    encode_group(name, color, tabs, ids).map(|group| group.to_bytes())
}
