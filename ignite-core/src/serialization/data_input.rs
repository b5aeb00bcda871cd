//! Data input trait and buffer reader for the Ignite binary format.

use crate::error::{IgniteError, Result};
use bytes::Buf;
use std::io::Cursor;
use uuid::Uuid;

/// Trait for reading primitive values from Ignite's binary format.
///
/// All multi-byte values are read in little-endian byte order.
pub trait DataInput {
    /// Reads a single signed byte.
    fn read_byte(&mut self) -> Result<i8>;

    /// Reads a single unsigned byte.
    fn read_ubyte(&mut self) -> Result<u8>;

    /// Reads a boolean from a single byte.
    fn read_bool(&mut self) -> Result<bool>;

    /// Reads a 16-bit signed integer.
    fn read_short(&mut self) -> Result<i16>;

    /// Reads a 16-bit unsigned integer (Java `char`).
    fn read_char(&mut self) -> Result<u16>;

    /// Reads a 32-bit signed integer.
    fn read_int(&mut self) -> Result<i32>;

    /// Reads a 64-bit signed integer.
    fn read_long(&mut self) -> Result<i64>;

    /// Reads a 32-bit floating point value.
    fn read_float(&mut self) -> Result<f32>;

    /// Reads a 64-bit floating point value.
    fn read_double(&mut self) -> Result<f64>;

    /// Reads the specified number of raw bytes.
    fn read_bytes(&mut self, len: usize) -> Result<Vec<u8>>;

    /// Reads a UUID stored as two 64-bit halves (most significant first).
    fn read_uuid(&mut self) -> Result<Uuid> {
        let msb = self.read_long()? as u64;
        let lsb = self.read_long()? as u64;
        Ok(Uuid::from_u64_pair(msb, lsb))
    }

    /// Reads a 4-byte length followed by that many UTF-8 bytes.
    fn read_string(&mut self) -> Result<String> {
        let len = self.read_int()?;
        if len < 0 {
            return Err(IgniteError::Protocol(format!(
                "invalid string length: {}",
                len
            )));
        }
        let bytes = self.read_bytes(len as usize)?;
        String::from_utf8(bytes)
            .map_err(|e| IgniteError::Protocol(format!("invalid UTF-8 string: {}", e)))
    }
}

/// A buffer-based implementation of `DataInput`.
#[derive(Debug)]
pub struct ObjectDataInput<'a> {
    cursor: Cursor<&'a [u8]>,
}

impl<'a> ObjectDataInput<'a> {
    /// Creates a new `ObjectDataInput` from the given byte slice.
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            cursor: Cursor::new(data),
        }
    }

    /// Returns the number of bytes remaining to be read.
    pub fn remaining(&self) -> usize {
        self.cursor.remaining()
    }

    /// Returns the current position in the buffer.
    pub fn position(&self) -> usize {
        self.cursor.position() as usize
    }

    /// Returns the unread part of the buffer without consuming it.
    pub fn peek_remaining(&self) -> &'a [u8] {
        let data: &'a [u8] = *self.cursor.get_ref();
        &data[self.position()..]
    }

    /// Skips `n` bytes.
    pub fn skip(&mut self, n: usize) -> Result<()> {
        self.ensure_remaining(n)?;
        self.cursor.advance(n);
        Ok(())
    }

    /// Fails unless at least `n` more bytes are available.
    pub fn ensure_remaining(&self, n: usize) -> Result<()> {
        if self.cursor.remaining() < n {
            Err(IgniteError::Protocol(format!(
                "insufficient data: need {} bytes, have {}",
                n,
                self.cursor.remaining()
            )))
        } else {
            Ok(())
        }
    }
}

impl DataInput for ObjectDataInput<'_> {
    fn read_byte(&mut self) -> Result<i8> {
        self.ensure_remaining(1)?;
        Ok(self.cursor.get_i8())
    }

    fn read_ubyte(&mut self) -> Result<u8> {
        self.ensure_remaining(1)?;
        Ok(self.cursor.get_u8())
    }

    fn read_bool(&mut self) -> Result<bool> {
        self.ensure_remaining(1)?;
        Ok(self.cursor.get_u8() != 0)
    }

    fn read_short(&mut self) -> Result<i16> {
        self.ensure_remaining(2)?;
        Ok(self.cursor.get_i16_le())
    }

    fn read_char(&mut self) -> Result<u16> {
        self.ensure_remaining(2)?;
        Ok(self.cursor.get_u16_le())
    }

    fn read_int(&mut self) -> Result<i32> {
        self.ensure_remaining(4)?;
        Ok(self.cursor.get_i32_le())
    }

    fn read_long(&mut self) -> Result<i64> {
        self.ensure_remaining(8)?;
        Ok(self.cursor.get_i64_le())
    }

    fn read_float(&mut self) -> Result<f32> {
        self.ensure_remaining(4)?;
        Ok(self.cursor.get_f32_le())
    }

    fn read_double(&mut self) -> Result<f64> {
        self.ensure_remaining(8)?;
        Ok(self.cursor.get_f64_le())
    }

    fn read_bytes(&mut self, len: usize) -> Result<Vec<u8>> {
        self.ensure_remaining(len)?;
        let mut buf = vec![0u8; len];
        self.cursor.copy_to_slice(&mut buf);
        Ok(buf)
    }
}
