//! Error types for bgm

use thiserror::Error;

/// The session log header could not be recognised.
///
/// This is the only decode failure that is ever surfaced to callers; torn
/// tails, short payloads and unknown opcodes are absorbed by the decoder.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("buffer too short for a session log header: {len} bytes")]
    MissingHeader { len: usize },

    #[error("invalid session log magic: expected {expected:02x?}, found {found:02x?}")]
    BadMagic { expected: [u8; 4], found: [u8; 4] },
}

/// Errors raised while building records to append.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    #[error("record for opcode {opcode} is {size} bytes, exceeding the {max} byte limit")]
    RecordTooLarge { opcode: u8, size: usize, max: usize },

    #[error("string of {len} units does not fit a 32-bit length prefix")]
    StringTooLong { len: usize },
}

/// A color name that is not one of the nine tab group colors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown tab group color '{0}' (expected one of grey, blue, red, yellow, green, pink, purple, cyan, orange)")]
pub struct ColorParseError(pub String);
