//! Payload decoder: typed session commands
//!
//! The vocabulary is closed. An opcode outside it decodes to
//! [`SessionCommand::Unknown`] carrying the raw payload, so logs written by
//! newer browsers still scan end to end. A known opcode whose payload is
//! too short to hold its fields decodes to `None`.

use std::fmt::Display;

use bytes::Bytes;
use tracing::debug;

use bgm_core::{GroupToken, TabGroupColor};

use crate::frame::Record;
use crate::pickle::PickleReader;

/// Opcodes understood by the decoder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Opcode {
    SetTabWindow = 0,
    SetTabIndexInWindow = 2,
    UpdateTabNavigation = 6,
    SetSelectedNavigationIndex = 7,
    SetSelectedTabInIndex = 8,
    SetWindowType = 9,
    SetPinnedState = 12,
    SetWindowBounds = 14,
    TabClosed = 16,
    WindowClosed = 17,
    SetActiveWindow = 20,
    SetTabGroup = 25,
    SetTabGroupMetadata = 26,
    SetTabGroupMetadata2 = 27,
}

impl Opcode {
    pub fn from_u8(value: u8) -> Option<Self> {
        Some(match value {
            0 => Self::SetTabWindow,
            2 => Self::SetTabIndexInWindow,
            6 => Self::UpdateTabNavigation,
            7 => Self::SetSelectedNavigationIndex,
            8 => Self::SetSelectedTabInIndex,
            9 => Self::SetWindowType,
            12 => Self::SetPinnedState,
            14 => Self::SetWindowBounds,
            16 => Self::TabClosed,
            17 => Self::WindowClosed,
            20 => Self::SetActiveWindow,
            25 => Self::SetTabGroup,
            26 => Self::SetTabGroupMetadata,
            27 => Self::SetTabGroupMetadata2,
            _ => return None,
        })
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Smallest payload, pickle length field included, that holds the
    /// fixed fields of this opcode
    pub fn min_payload_len(self) -> usize {
        match self {
            Self::SetTabWindow
            | Self::SetTabIndexInWindow
            | Self::UpdateTabNavigation
            | Self::SetSelectedNavigationIndex
            | Self::SetSelectedTabInIndex
            | Self::SetWindowType => 12,
            Self::SetPinnedState => 9,
            Self::SetWindowBounds => 28,
            Self::TabClosed | Self::WindowClosed => 16,
            Self::SetActiveWindow => 8,
            Self::SetTabGroup => 24,
            Self::SetTabGroupMetadata | Self::SetTabGroupMetadata2 => 24,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::SetTabWindow => "set_tab_window",
            Self::SetTabIndexInWindow => "set_tab_index_in_window",
            Self::UpdateTabNavigation => "update_tab_navigation",
            Self::SetSelectedNavigationIndex => "set_selected_navigation_index",
            Self::SetSelectedTabInIndex => "set_selected_tab_in_index",
            Self::SetWindowType => "set_window_type",
            Self::SetPinnedState => "set_pinned_state",
            Self::SetWindowBounds => "set_window_bounds",
            Self::TabClosed => "tab_closed",
            Self::WindowClosed => "window_closed",
            Self::SetActiveWindow => "set_active_window",
            Self::SetTabGroup => "set_tab_group",
            Self::SetTabGroupMetadata => "set_tab_group_metadata",
            Self::SetTabGroupMetadata2 => "set_tab_group_metadata2",
        }
    }
}

impl Display for Opcode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.name(), self.as_u8())
    }
}

/// A decoded session command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    SetTabWindow {
        tab_id: u32,
        window_id: u32,
    },
    SetTabIndexInWindow {
        tab_id: u32,
        index: u32,
    },
    UpdateTabNavigation {
        tab_id: u32,
        navigation_index: u32,
        url: String,
        title: String,
    },
    SetSelectedNavigationIndex {
        tab_id: u32,
        index: u32,
    },
    SetSelectedTabInIndex {
        window_id: u32,
        index: u32,
    },
    SetWindowType {
        window_id: u32,
        window_type: u32,
    },
    SetPinnedState {
        tab_id: u32,
        pinned: bool,
    },
    SetWindowBounds {
        window_id: u32,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        show_state: u32,
    },
    TabClosed {
        tab_id: u32,
        close_time: u64,
    },
    WindowClosed {
        window_id: u32,
        close_time: u64,
    },
    SetActiveWindow {
        window_id: u32,
    },
    SetTabGroup {
        tab_id: u32,
        token: GroupToken,
    },
    /// Opcodes 26 and 27 share this layout
    SetTabGroupMetadata {
        token: GroupToken,
        title: String,
        color: TabGroupColor,
    },
    /// Opcode outside the known vocabulary, passed through untouched
    Unknown {
        opcode: u8,
        payload: Bytes,
    },
}

impl SessionCommand {
    /// Known opcode of this command, `None` for [`SessionCommand::Unknown`]
    pub fn opcode(&self) -> Option<Opcode> {
        Some(match self {
            Self::SetTabWindow { .. } => Opcode::SetTabWindow,
            Self::SetTabIndexInWindow { .. } => Opcode::SetTabIndexInWindow,
            Self::UpdateTabNavigation { .. } => Opcode::UpdateTabNavigation,
            Self::SetSelectedNavigationIndex { .. } => Opcode::SetSelectedNavigationIndex,
            Self::SetSelectedTabInIndex { .. } => Opcode::SetSelectedTabInIndex,
            Self::SetWindowType { .. } => Opcode::SetWindowType,
            Self::SetPinnedState { .. } => Opcode::SetPinnedState,
            Self::SetWindowBounds { .. } => Opcode::SetWindowBounds,
            Self::TabClosed { .. } => Opcode::TabClosed,
            Self::WindowClosed { .. } => Opcode::WindowClosed,
            Self::SetActiveWindow { .. } => Opcode::SetActiveWindow,
            Self::SetTabGroup { .. } => Opcode::SetTabGroup,
            Self::SetTabGroupMetadata { .. } => Opcode::SetTabGroupMetadata2,
            Self::Unknown { .. } => return None,
        })
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown { .. })
    }
}

/// Decode one record.
///
/// Returns `None` when a known opcode's payload is too short for its
/// fields; the caller keeps the raw record.
pub fn decode_record(record: &Record) -> Option<SessionCommand> {
    let Some(opcode) = Opcode::from_u8(record.opcode()) else {
        return Some(SessionCommand::Unknown {
            opcode: record.opcode(),
            payload: record.payload().clone(),
        });
    };

    let payload = record.payload().as_ref();
    let decoded = if payload.len() < opcode.min_payload_len() {
        None
    } else {
        decode_payload(opcode, payload)
    };

    if decoded.is_none() {
        debug!(
            opcode = %opcode,
            len = payload.len(),
            min = opcode.min_payload_len(),
            "Undersized payload, leaving record undecoded"
        );
    }
    decoded
}

fn decode_payload(opcode: Opcode, payload: &[u8]) -> Option<SessionCommand> {
    let mut r = PickleReader::new(payload)?;

    let command = match opcode {
        Opcode::SetTabWindow => SessionCommand::SetTabWindow {
            tab_id: r.read_u32()?,
            window_id: r.read_u32()?,
        },
        Opcode::SetTabIndexInWindow => SessionCommand::SetTabIndexInWindow {
            tab_id: r.read_u32()?,
            index: r.read_u32()?,
        },
        Opcode::UpdateTabNavigation => {
            let tab_id = r.read_u32()?;
            let navigation_index = r.read_u32()?;
            // Both strings are optional at the tail; a declared length that
            // overruns the payload invalidates the record.
            let url = if r.remaining() >= 4 {
                r.read_string8()?
            } else {
                String::new()
            };
            let title = if r.remaining() >= 4 {
                r.read_string16()?
            } else {
                String::new()
            };
            SessionCommand::UpdateTabNavigation {
                tab_id,
                navigation_index,
                url,
                title,
            }
        }
        Opcode::SetSelectedNavigationIndex => SessionCommand::SetSelectedNavigationIndex {
            tab_id: r.read_u32()?,
            index: r.read_u32()?,
        },
        Opcode::SetSelectedTabInIndex => SessionCommand::SetSelectedTabInIndex {
            window_id: r.read_u32()?,
            index: r.read_u32()?,
        },
        Opcode::SetWindowType => SessionCommand::SetWindowType {
            window_id: r.read_u32()?,
            window_type: r.read_u32()?,
        },
        Opcode::SetPinnedState => SessionCommand::SetPinnedState {
            tab_id: r.read_u32()?,
            pinned: r.read_bool()?,
        },
        Opcode::SetWindowBounds => SessionCommand::SetWindowBounds {
            window_id: r.read_u32()?,
            x: r.read_i32()?,
            y: r.read_i32()?,
            width: r.read_i32()?,
            height: r.read_i32()?,
            show_state: r.read_u32()?,
        },
        Opcode::TabClosed => SessionCommand::TabClosed {
            tab_id: r.read_u32()?,
            close_time: r.read_u64()?,
        },
        Opcode::WindowClosed => SessionCommand::WindowClosed {
            window_id: r.read_u32()?,
            close_time: r.read_u64()?,
        },
        Opcode::SetActiveWindow => SessionCommand::SetActiveWindow {
            window_id: r.read_u32()?,
        },
        Opcode::SetTabGroup => SessionCommand::SetTabGroup {
            tab_id: r.read_u32()?,
            token: GroupToken::new(r.read_u64()?, r.read_u64()?),
        },
        Opcode::SetTabGroupMetadata | Opcode::SetTabGroupMetadata2 => {
            let token = GroupToken::new(r.read_u64()?, r.read_u64()?);
            let title = r.read_string16()?;
            let color = r.read_u32().map(TabGroupColor::from_wire).unwrap_or_default();
            SessionCommand::SetTabGroupMetadata {
                token,
                title,
                color,
            }
        }
    };

    Some(command)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pickle::PickleWriter;

    fn record(opcode: u8, payload: impl Into<Bytes>) -> Record {
        Record::new(opcode, payload).unwrap()
    }

    #[test]
    fn test_opcode_table_round_trips() {
        for value in 0..=u8::MAX {
            if let Some(op) = Opcode::from_u8(value) {
                assert_eq!(op.as_u8(), value);
            }
        }
        assert!(Opcode::from_u8(1).is_none());
        assert!(Opcode::from_u8(28).is_none());
    }

    #[test]
    fn test_decode_set_tab_window() {
        let mut w = PickleWriter::new();
        w.write_u32(5).write_u32(9);
        let cmd = decode_record(&record(0, w.finish())).unwrap();
        assert_eq!(
            cmd,
            SessionCommand::SetTabWindow {
                tab_id: 5,
                window_id: 9
            }
        );
    }

    #[test]
    fn test_decode_navigation_with_strings() {
        let mut w = PickleWriter::new();
        w.write_u32(3).write_u32(0);
        w.write_string8("https://a.test/").unwrap();
        w.write_string16("A \u{2603}").unwrap();
        let cmd = decode_record(&record(6, w.finish())).unwrap();
        assert_eq!(
            cmd,
            SessionCommand::UpdateTabNavigation {
                tab_id: 3,
                navigation_index: 0,
                url: "https://a.test/".into(),
                title: "A \u{2603}".into(),
            }
        );
    }

    #[test]
    fn test_decode_navigation_without_strings() {
        let mut w = PickleWriter::new();
        w.write_u32(3).write_u32(1);
        let cmd = decode_record(&record(6, w.finish())).unwrap();
        assert!(matches!(
            cmd,
            SessionCommand::UpdateTabNavigation { ref url, ref title, .. } if url.is_empty() && title.is_empty()
        ));
    }

    #[test]
    fn test_decode_navigation_overrunning_url_is_absent() {
        let mut w = PickleWriter::new();
        w.write_u32(3).write_u32(1).write_u32(500);
        assert!(decode_record(&record(6, w.finish())).is_none());
    }

    #[test]
    fn test_decode_pinned_and_bounds() {
        let mut w = PickleWriter::new();
        w.write_u32(4).write_bool(true);
        assert_eq!(
            decode_record(&record(12, w.finish())),
            Some(SessionCommand::SetPinnedState {
                tab_id: 4,
                pinned: true
            })
        );

        let mut w = PickleWriter::new();
        w.write_u32(1)
            .write_i32(-10)
            .write_i32(20)
            .write_i32(800)
            .write_i32(600)
            .write_u32(3);
        assert_eq!(
            decode_record(&record(14, w.finish())),
            Some(SessionCommand::SetWindowBounds {
                window_id: 1,
                x: -10,
                y: 20,
                width: 800,
                height: 600,
                show_state: 3
            })
        );
    }

    #[test]
    fn test_decode_closed_and_active() {
        let mut w = PickleWriter::new();
        w.write_u32(8).write_u64(13_300_000_000_000_000);
        assert_eq!(
            decode_record(&record(16, w.finish())),
            Some(SessionCommand::TabClosed {
                tab_id: 8,
                close_time: 13_300_000_000_000_000
            })
        );

        let mut w = PickleWriter::new();
        w.write_u32(2);
        assert_eq!(
            decode_record(&record(20, w.finish())),
            Some(SessionCommand::SetActiveWindow { window_id: 2 })
        );
    }

    #[test]
    fn test_decode_tab_group_assign() {
        let mut w = PickleWriter::new();
        w.write_u32(11).write_u64(7).write_u64(9);
        assert_eq!(
            decode_record(&record(25, w.finish())),
            Some(SessionCommand::SetTabGroup {
                tab_id: 11,
                token: GroupToken::new(7, 9)
            })
        );
    }

    #[test]
    fn test_both_metadata_opcodes_decode_identically() {
        let mut w = PickleWriter::new();
        w.write_u64(7).write_u64(9);
        w.write_string16("Work").unwrap();
        w.write_u32(1);
        let payload = w.finish();

        let a = decode_record(&record(26, payload.clone())).unwrap();
        let b = decode_record(&record(27, payload)).unwrap();
        assert_eq!(a, b);
        assert_eq!(
            a,
            SessionCommand::SetTabGroupMetadata {
                token: GroupToken::new(7, 9),
                title: "Work".into(),
                color: TabGroupColor::Blue
            }
        );
    }

    #[test]
    fn test_out_of_range_color_is_grey() {
        let mut w = PickleWriter::new();
        w.write_u64(1).write_u64(2);
        w.write_string16("X").unwrap();
        w.write_u32(99);
        let cmd = decode_record(&record(27, w.finish())).unwrap();
        assert!(matches!(
            cmd,
            SessionCommand::SetTabGroupMetadata {
                color: TabGroupColor::Grey,
                ..
            }
        ));
    }

    #[test]
    fn test_metadata_without_color_is_grey() {
        let mut w = PickleWriter::new();
        w.write_u64(1).write_u64(2);
        w.write_string16("No color").unwrap();
        let cmd = decode_record(&record(26, w.finish())).unwrap();
        assert!(matches!(
            cmd,
            SessionCommand::SetTabGroupMetadata { color: TabGroupColor::Grey, ref title, .. } if title == "No color"
        ));
    }

    #[test]
    fn test_undersized_payloads_are_absent() {
        assert!(decode_record(&record(0, vec![8, 0, 0, 0, 1, 0, 0, 0])).is_none());
        assert!(decode_record(&record(25, vec![0u8; 23])).is_none());
        assert!(decode_record(&record(14, vec![0u8; 27])).is_none());
        assert!(decode_record(&record(12, vec![0u8; 8])).is_none());
        assert!(decode_record(&record(2, Vec::new())).is_none());
    }

    #[test]
    fn test_unknown_opcode_is_opaque() {
        let cmd = decode_record(&record(200, vec![1, 2, 3])).unwrap();
        assert!(cmd.is_unknown());
        assert_eq!(cmd.opcode(), None);
        match cmd {
            SessionCommand::Unknown { opcode, payload } => {
                assert_eq!(opcode, 200);
                assert_eq!(payload.as_ref(), &[1, 2, 3]);
            }
            other => panic!("expected unknown, got {other:?}"),
        }
    }
}
