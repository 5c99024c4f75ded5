//! Field-by-field payload cursor
//!
//! Payloads are read and written one field at a time with explicit bounds
//! checks, so nothing depends on in-memory struct layout.

use heapless::Vec;

use crate::commands::DecodeError;
use crate::frame::{FrameError, MAX_PAYLOAD_SIZE};

/// Sequential little-endian reader over a payload
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Bytes not yet consumed
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn u8(&mut self) -> Result<u8, DecodeError> {
        let bytes = self.bytes(1)?;
        Ok(bytes[0])
    }

    pub fn u16_le(&mut self) -> Result<u16, DecodeError> {
        let bytes = self.bytes(2)?;
        Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    /// Take the next `len` bytes
    pub fn bytes(&mut self, len: usize) -> Result<&'a [u8], DecodeError> {
        if self.remaining() < len {
            return Err(DecodeError::TooShort {
                expected: self.pos + len,
                actual: self.buf.len(),
            });
        }
        let slice = &self.buf[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    /// Take a fixed-width, NUL-padded string field
    ///
    /// The string ends at the first NUL byte or at the field width.
    pub fn padded_str(&mut self, width: usize) -> Result<&'a str, DecodeError> {
        let field = self.bytes(width)?;
        let end = field.iter().position(|&b| b == 0).unwrap_or(width);
        core::str::from_utf8(&field[..end]).map_err(|_| DecodeError::InvalidUtf8)
    }
}

/// Payload under construction
pub type PayloadBuf = Vec<u8, MAX_PAYLOAD_SIZE>;

pub fn put_u8(buf: &mut PayloadBuf, value: u8) -> Result<(), FrameError> {
    buf.push(value).map_err(|_| FrameError::PayloadTooLarge)
}

pub fn put_u16_le(buf: &mut PayloadBuf, value: u16) -> Result<(), FrameError> {
    buf.extend_from_slice(&value.to_le_bytes())
        .map_err(|_| FrameError::PayloadTooLarge)
}

/// Write `bytes` into a fixed-width field, truncating or NUL-padding
pub fn put_padded(buf: &mut PayloadBuf, bytes: &[u8], width: usize) -> Result<(), FrameError> {
    let len = bytes.len().min(width);
    buf.extend_from_slice(&bytes[..len])
        .map_err(|_| FrameError::PayloadTooLarge)?;
    for _ in len..width {
        put_u8(buf, 0)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reader_little_endian() {
        let mut reader = Reader::new(&[0x34, 0x12, 0xFF]);
        assert_eq!(reader.u16_le().unwrap(), 0x1234);
        assert_eq!(reader.u8().unwrap(), 0xFF);
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn test_reader_short_input() {
        let mut reader = Reader::new(&[0x01]);
        assert_eq!(
            reader.u16_le(),
            Err(DecodeError::TooShort {
                expected: 2,
                actual: 1
            })
        );
    }

    #[test]
    fn test_padded_str_stops_at_nul() {
        let mut reader = Reader::new(b"abc\0\0\0xyz");
        assert_eq!(reader.padded_str(6).unwrap(), "abc");
        assert_eq!(reader.padded_str(3).unwrap(), "xyz");
    }

    #[test]
    fn test_put_padded_truncates() {
        let mut buf = PayloadBuf::new();
        put_padded(&mut buf, b"abcdef", 4).unwrap();
        put_padded(&mut buf, b"z", 3).unwrap();
        assert_eq!(&buf[..], b"abcdz\0\0");
    }
}
