//! Data output trait and buffer writer for the Ignite binary format.

use crate::error::Result;
use bytes::{BufMut, BytesMut};
use uuid::Uuid;

/// Trait for writing primitive values in Ignite's binary format.
///
/// All multi-byte values are written in little-endian byte order.
pub trait DataOutput {
    /// Writes a single signed byte.
    fn write_byte(&mut self, v: i8) -> Result<()>;

    /// Writes a single unsigned byte.
    fn write_ubyte(&mut self, v: u8) -> Result<()>;

    /// Writes a boolean as a single byte (0 for false, 1 for true).
    fn write_bool(&mut self, v: bool) -> Result<()>;

    /// Writes a 16-bit signed integer.
    fn write_short(&mut self, v: i16) -> Result<()>;

    /// Writes a 16-bit unsigned integer (Java `char`).
    fn write_char(&mut self, v: u16) -> Result<()>;

    /// Writes a 32-bit signed integer.
    fn write_int(&mut self, v: i32) -> Result<()>;

    /// Writes a 64-bit signed integer.
    fn write_long(&mut self, v: i64) -> Result<()>;

    /// Writes a 32-bit floating point value.
    fn write_float(&mut self, v: f32) -> Result<()>;

    /// Writes a 64-bit floating point value.
    fn write_double(&mut self, v: f64) -> Result<()>;

    /// Writes raw bytes without a length prefix.
    fn write_bytes(&mut self, v: &[u8]) -> Result<()>;

    /// Writes a UUID as two 64-bit halves (most significant first).
    fn write_uuid(&mut self, v: &Uuid) -> Result<()> {
        let (msb, lsb) = v.as_u64_pair();
        self.write_long(msb as i64)?;
        self.write_long(lsb as i64)
    }

    /// Writes a string with its 4-byte length prefix.
    fn write_string(&mut self, v: &str) -> Result<()> {
        self.write_int(v.len() as i32)?;
        self.write_bytes(v.as_bytes())
    }
}

/// A buffer-based implementation of `DataOutput`.
#[derive(Debug)]
pub struct ObjectDataOutput {
    buffer: BytesMut,
}

impl ObjectDataOutput {
    /// Creates a new `ObjectDataOutput` with default capacity.
    pub fn new() -> Self {
        Self {
            buffer: BytesMut::with_capacity(256),
        }
    }

    /// Creates a new `ObjectDataOutput` with the specified capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(capacity),
        }
    }

    /// Returns the written bytes as a slice.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    /// Consumes the output and returns the written bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer.to_vec()
    }

    /// Consumes the output and returns the underlying buffer.
    pub fn into_inner(self) -> BytesMut {
        self.buffer
    }

    /// Returns the number of bytes written.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Returns true if no bytes have been written.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

impl Default for ObjectDataOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl DataOutput for ObjectDataOutput {
    fn write_byte(&mut self, v: i8) -> Result<()> {
        self.buffer.put_i8(v);
        Ok(())
    }

    fn write_ubyte(&mut self, v: u8) -> Result<()> {
        self.buffer.put_u8(v);
        Ok(())
    }

    fn write_bool(&mut self, v: bool) -> Result<()> {
        self.buffer.put_u8(if v { 1 } else { 0 });
        Ok(())
    }

    fn write_short(&mut self, v: i16) -> Result<()> {
        self.buffer.put_i16_le(v);
        Ok(())
    }

    fn write_char(&mut self, v: u16) -> Result<()> {
        self.buffer.put_u16_le(v);
        Ok(())
    }

    fn write_int(&mut self, v: i32) -> Result<()> {
        self.buffer.put_i32_le(v);
        Ok(())
    }

    fn write_long(&mut self, v: i64) -> Result<()> {
        self.buffer.put_i64_le(v);
        Ok(())
    }

    fn write_float(&mut self, v: f32) -> Result<()> {
        self.buffer.put_f32_le(v);
        Ok(())
    }

    fn write_double(&mut self, v: f64) -> Result<()> {
        self.buffer.put_f64_le(v);
        Ok(())
    }

    fn write_bytes(&mut self, v: &[u8]) -> Result<()> {
        self.buffer.put_slice(v);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serialization::{DataInput, ObjectDataInput};

    #[test]
    fn test_write_int_little_endian() {
        let mut output = ObjectDataOutput::new();
        output.write_int(0x01020304).unwrap();
        assert_eq!(output.as_bytes(), &[0x04, 0x03, 0x02, 0x01]);
    }

    #[test]
    fn test_write_short_little_endian() {
        let mut output = ObjectDataOutput::new();
        output.write_short(0x0102).unwrap();
        assert_eq!(output.as_bytes(), &[0x02, 0x01]);
    }

    #[test]
    fn test_write_bool() {
        let mut output = ObjectDataOutput::new();
        output.write_bool(true).unwrap();
        output.write_bool(false).unwrap();
        assert_eq!(output.as_bytes(), &[1, 0]);
    }

    #[test]
    fn test_write_string_prefixes_length() {
        let mut output = ObjectDataOutput::new();
        output.write_string("abc").unwrap();
        assert_eq!(output.as_bytes(), &[3, 0, 0, 0, b'a', b'b', b'c']);
    }

    #[test]
    fn test_uuid_is_read_back() {
        let uuid = Uuid::new_v4();
        let mut output = ObjectDataOutput::new();
        output.write_uuid(&uuid).unwrap();
        assert_eq!(output.len(), 16);

        let bytes = output.into_bytes();
        let mut input = ObjectDataInput::new(&bytes);
        assert_eq!(input.read_uuid().unwrap(), uuid);
    }

    #[test]
    fn test_empty_output() {
        let output = ObjectDataOutput::default();
        assert!(output.is_empty());
        assert_eq!(output.len(), 0);
    }
}
