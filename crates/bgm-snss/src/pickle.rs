//! Pickle-style payload fields
//!
//! Every typed payload starts with a redundant u32 holding the length of
//! what follows. Integers are little-endian. Two string encodings exist:
//!
//! ```text
//! String16: [u32 code units][units * 2 bytes UTF-16LE]
//! String8:  [u32 byte count][bytes UTF-8][zero padding to a 4-byte boundary]
//! ```
//!
//! Padding is measured from the start of the payload, i.e. including the
//! leading size field.

use bytes::{BufMut, Bytes, BytesMut};

use bgm_core::EncodeError;

/// Size of the leading pickle length field
pub const PICKLE_HEADER_LEN: usize = 4;

const fn align4(n: usize) -> usize {
    (n + 3) & !3
}

/// Cursor over one payload. Every read returns `None` on underflow.
#[derive(Debug, Clone)]
pub struct PickleReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> PickleReader<'a> {
    /// Start reading after the pickle length field
    pub fn new(payload: &'a [u8]) -> Option<Self> {
        if payload.len() < PICKLE_HEADER_LEN {
            return None;
        }
        Some(Self {
            data: payload,
            pos: PICKLE_HEADER_LEN,
        })
    }

    /// Bytes left after the cursor
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    fn take(&mut self, n: usize) -> Option<&'a [u8]> {
        let end = self.pos.checked_add(n)?;
        let slice = self.data.get(self.pos..end)?;
        self.pos = end;
        Some(slice)
    }

    fn take_array<const N: usize>(&mut self) -> Option<[u8; N]> {
        self.take(N)?.try_into().ok()
    }

    pub fn read_u32(&mut self) -> Option<u32> {
        self.take_array().map(u32::from_le_bytes)
    }

    pub fn read_i32(&mut self) -> Option<i32> {
        self.take_array().map(i32::from_le_bytes)
    }

    pub fn read_u64(&mut self) -> Option<u64> {
        self.take_array().map(u64::from_le_bytes)
    }

    /// One byte, non-zero is true
    pub fn read_bool(&mut self) -> Option<bool> {
        self.take(1).map(|b| b[0] != 0)
    }

    pub fn read_string16(&mut self) -> Option<String> {
        let units = self.read_u32()? as usize;
        let raw = self.take(units.checked_mul(2)?)?;
        let utf16: Vec<u16> = raw
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
            .collect();
        Some(String::from_utf16_lossy(&utf16))
    }

    pub fn read_string8(&mut self) -> Option<String> {
        let len = self.read_u32()? as usize;
        let raw = self.take(len)?;
        let value = String::from_utf8_lossy(raw).into_owned();
        // Padding may run past a short payload; later reads then underflow.
        self.pos = align4(self.pos);
        Some(value)
    }
}

/// Builds one payload, patching the leading length field on `finish`.
#[derive(Debug)]
pub struct PickleWriter {
    buf: BytesMut,
}

impl PickleWriter {
    pub fn new() -> Self {
        let mut buf = BytesMut::with_capacity(64);
        buf.put_u32_le(0);
        Self { buf }
    }

    pub fn write_u32(&mut self, value: u32) -> &mut Self {
        self.buf.put_u32_le(value);
        self
    }

    pub fn write_i32(&mut self, value: i32) -> &mut Self {
        self.buf.put_i32_le(value);
        self
    }

    pub fn write_u64(&mut self, value: u64) -> &mut Self {
        self.buf.put_u64_le(value);
        self
    }

    pub fn write_bool(&mut self, value: bool) -> &mut Self {
        self.buf.put_u8(u8::from(value));
        self
    }

    pub fn write_string16(&mut self, value: &str) -> Result<&mut Self, EncodeError> {
        let units: Vec<u16> = value.encode_utf16().collect();
        let len = u32::try_from(units.len())
            .map_err(|_| EncodeError::StringTooLong { len: units.len() })?;
        self.buf.put_u32_le(len);
        for unit in units {
            self.buf.put_u16_le(unit);
        }
        Ok(self)
    }

    pub fn write_string8(&mut self, value: &str) -> Result<&mut Self, EncodeError> {
        let len = u32::try_from(value.len())
            .map_err(|_| EncodeError::StringTooLong { len: value.len() })?;
        self.buf.put_u32_le(len);
        self.buf.put_slice(value.as_bytes());
        let padded = align4(self.buf.len());
        self.buf.resize(padded, 0);
        Ok(self)
    }

    /// Current payload length including the length field
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.len() == PICKLE_HEADER_LEN
    }

    /// Patch the length field and return the payload
    pub fn finish(mut self) -> Bytes {
        let body_len = (self.buf.len() - PICKLE_HEADER_LEN) as u32;
        self.buf[..PICKLE_HEADER_LEN].copy_from_slice(&body_len.to_le_bytes());
        self.buf.freeze()
    }
}

impl Default for PickleWriter {
    fn default() -> Self {
        Self::new()
    }
}
