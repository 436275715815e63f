//! Frame reader: splits a session log into records
//!
//! ```text
//! [4 bytes: magic "SNSS"][u32: version]
//! [u16: size][u8: opcode][size - 1 bytes: payload]
//! [u16: size][u8: opcode][...]
//! ```
//!
//! `size` counts the opcode byte plus the payload, never itself. A record
//! whose declared size runs past the end of the buffer marks a torn tail;
//! scanning stops there and everything before it is kept.

use bytes::Bytes;
use tracing::{debug, warn};

use bgm_core::{EncodeError, FormatError};

/// Magic bytes at the start of every session log
pub const SNSS_MAGIC: [u8; 4] = *b"SNSS";

/// Magic plus version
pub const HEADER_LEN: usize = 8;

/// Size field plus opcode byte
pub const RECORD_HEADER_LEN: usize = 3;

/// Largest payload a record can carry (the size field also counts the opcode)
pub const MAX_PAYLOAD_LEN: usize = u16::MAX as usize - 1;

/// One length-delimited record. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    opcode: u8,
    payload: Bytes,
}

impl Record {
    /// Build a record, rejecting payloads the size field cannot describe
    pub fn new(opcode: u8, payload: impl Into<Bytes>) -> Result<Self, EncodeError> {
        let payload = payload.into();
        if payload.len() > MAX_PAYLOAD_LEN {
            return Err(EncodeError::RecordTooLarge {
                opcode,
                size: payload.len() + 1,
                max: u16::MAX as usize,
            });
        }
        Ok(Self { opcode, payload })
    }

    pub fn opcode(&self) -> u8 {
        self.opcode
    }

    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    /// Value of the on-disk size field
    pub fn size_field(&self) -> u16 {
        // new() guarantees this fits
        (self.payload.len() + 1) as u16
    }

    /// Bytes this record occupies on disk
    pub fn encoded_len(&self) -> usize {
        2 + self.payload.len() + 1
    }
}

/// Result of scanning a buffer for records
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameScan {
    pub version: u32,
    pub records: Vec<Record>,
    /// Offset of the first byte that could not be framed, if the scan
    /// stopped before the end of the buffer
    pub truncated_at: Option<usize>,
}

/// Check the magic and return the version
pub fn read_header(buffer: &[u8]) -> Result<u32, FormatError> {
    if buffer.len() < SNSS_MAGIC.len() {
        return Err(FormatError::MissingHeader { len: buffer.len() });
    }
    let mut found = [0u8; 4];
    found.copy_from_slice(&buffer[..4]);
    if found != SNSS_MAGIC {
        return Err(FormatError::BadMagic {
            expected: SNSS_MAGIC,
            found,
        });
    }
    let version = buffer
        .get(4..HEADER_LEN)
        .ok_or(FormatError::MissingHeader { len: buffer.len() })?;
    Ok(u32::from_le_bytes([version[0], version[1], version[2], version[3]]))
}

/// Split a whole log into records.
///
/// Only a bad header is an error. A torn tail ends the scan early and is
/// reported through [`FrameScan::truncated_at`].
pub fn read_frames(buffer: &[u8]) -> Result<FrameScan, FormatError> {
    let version = read_header(buffer)?;
    let data = Bytes::copy_from_slice(buffer);

    let mut records = Vec::new();
    let mut truncated_at = None;
    let mut offset = HEADER_LEN;

    while data.len() - offset >= RECORD_HEADER_LEN {
        let size = u16::from_le_bytes([data[offset], data[offset + 1]]) as usize;
        let opcode = data[offset + 2];

        if size < 1 || offset + 2 + size > data.len() {
            warn!(
                offset = offset,
                size = size,
                opcode = opcode,
                available = data.len() - offset,
                "Truncated session log record, stopping scan"
            );
            truncated_at = Some(offset);
            break;
        }

        let payload = data.slice(offset + RECORD_HEADER_LEN..offset + 2 + size);
        records.push(Record { opcode, payload });
        offset += 2 + size;
    }

    if truncated_at.is_none() && offset < data.len() {
        // fewer than three bytes left: clean end of stream
        debug!(offset = offset, trailing = data.len() - offset, "Ignoring trailing bytes");
    }

    debug!(version = version, records = records.len(), "Framed session log");
    Ok(FrameScan {
        version,
        records,
        truncated_at,
    })
}
