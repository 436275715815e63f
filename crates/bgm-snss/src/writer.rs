//! Append writer
//!
//! Records serialize as `[u16 size = 1 + payload][u8 opcode][payload]`.
//! The only legal mutation of a session log is appending such records to
//! its end; bytes already present are never touched.

use bytes::BufMut;
use tracing::debug;

use bgm_core::FormatError;

use crate::frame::{Record, read_header};

/// Serialize one record onto `out`
pub fn write_record(record: &Record, out: &mut Vec<u8>) {
    out.reserve(record.encoded_len());
    out.put_u16_le(record.size_field());
    out.put_u8(record.opcode());
    out.put_slice(record.payload());
}

/// Serialize records back to back
pub fn serialize_records(records: &[Record]) -> Vec<u8> {
    let total: usize = records.iter().map(Record::encoded_len).sum();
    let mut out = Vec::with_capacity(total);
    for record in records {
        write_record(record, &mut out);
    }
    out
}

/// Append records to an in-memory log.
///
/// The log must start with a valid header. Returns the number of bytes
/// appended.
pub fn append_records(log: &mut Vec<u8>, records: &[Record]) -> Result<usize, FormatError> {
    read_header(log)?;
    let bytes = serialize_records(records);
    let start = log.len();
    log.extend_from_slice(&bytes);
    debug!(offset = start, bytes = bytes.len(), records = records.len(), "Appended records");
    Ok(bytes.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{SNSS_MAGIC, read_frames};

    fn empty_log() -> Vec<u8> {
        let mut log = SNSS_MAGIC.to_vec();
        log.extend_from_slice(&1u32.to_le_bytes());
        log
    }

    #[test]
    fn test_record_wire_format() {
        let record = Record::new(9, vec![0xaa, 0xbb]).unwrap();
        let bytes = serialize_records(&[record]);
        assert_eq!(bytes, [3, 0, 9, 0xaa, 0xbb]);
    }

    #[test]
    fn test_append_preserves_existing_bytes() {
        let mut log = empty_log();
        log.extend_from_slice(&[2, 0, 20, 0]);
        let before = log.clone();

        let records = vec![
            Record::new(0, vec![1; 12]).unwrap(),
            Record::new(99, vec![]).unwrap(),
        ];
        let appended = append_records(&mut log, &records).unwrap();

        assert_eq!(appended, 15 + 3);
        assert_eq!(&log[..before.len()], before.as_slice());
        let scan = read_frames(&log).unwrap();
        assert_eq!(scan.records.len(), 3);
        assert_eq!(&scan.records[1..], records.as_slice());
    }

    #[test]
    fn test_append_refuses_invalid_log() {
        let mut log = b"NOPE\x01\x00\x00\x00".to_vec();
        let err = append_records(&mut log, &[]).unwrap_err();
        assert!(matches!(err, FormatError::BadMagic { .. }));
        assert_eq!(log.len(), 8);
    }
}
