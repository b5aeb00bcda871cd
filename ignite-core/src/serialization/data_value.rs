//! Type-coded data objects.
//!
//! Every value the server returns outside of a fixed message layout (SQL
//! cells, query arguments, nullable strings inside type descriptions) is
//! prefixed by a one-byte type code. Complex objects are kept as raw blobs:
//! their field layout is resolved through the type registry, not here.

use uuid::Uuid;

use super::{DataInput, DataOutput, ObjectDataInput};
use crate::error::{IgniteError, Result};
use crate::protocol::constants::*;

/// A complex (binary) object kept in its serialized form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComplexObject {
    type_id: i32,
    schema_id: i32,
    flags: i16,
    bytes: Vec<u8>,
}

impl ComplexObject {
    /// Parses the header of a serialized complex object.
    ///
    /// `bytes` must start with the complex object type code.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        let mut input = ObjectDataInput::new(&bytes);
        let code = input.read_ubyte()?;
        if code != TC_COMPLEX_OBJECT {
            return Err(IgniteError::Protocol(format!(
                "expected complex object, found type code {}",
                code
            )));
        }
        let _version = input.read_ubyte()?;
        let flags = input.read_short()?;
        let type_id = input.read_int()?;
        let _hash_code = input.read_int()?;
        let length = input.read_int()?;
        let schema_id = input.read_int()?;
        if length < COMPLEX_OBJECT_HEADER_SIZE as i32 || length as usize != bytes.len() {
            return Err(IgniteError::Protocol(format!(
                "complex object length {} does not match {} available bytes",
                length,
                bytes.len()
            )));
        }
        Ok(Self {
            type_id,
            schema_id,
            flags,
            bytes,
        })
    }

    /// Returns the binary type id of the object.
    pub fn type_id(&self) -> i32 {
        self.type_id
    }

    /// Returns the schema id describing the object's field layout.
    pub fn schema_id(&self) -> i32 {
        self.schema_id
    }

    /// Returns the header flags.
    pub fn flags(&self) -> i16 {
        self.flags
    }

    /// Returns the serialized object, header included.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// A single type-coded value.
#[derive(Debug, Clone, PartialEq)]
pub enum DataValue {
    /// Null.
    Null,
    /// Signed byte.
    Byte(i8),
    /// 16-bit integer.
    Short(i16),
    /// 32-bit integer.
    Int(i32),
    /// 64-bit integer.
    Long(i64),
    /// 32-bit float.
    Float(f32),
    /// 64-bit float.
    Double(f64),
    /// UTF-16 code unit.
    Char(u16),
    /// Boolean.
    Bool(bool),
    /// UTF-8 string.
    String(String),
    /// UUID.
    Uuid(Uuid),
    /// Milliseconds since the epoch.
    Date(i64),
    /// Milliseconds since the epoch plus a nanosecond fraction.
    Timestamp {
        /// Milliseconds since the epoch.
        millis: i64,
        /// Nanoseconds within the millisecond.
        nanos: i32,
    },
    /// Milliseconds since midnight.
    Time(i64),
    /// Arbitrary-precision decimal as scale plus big-endian magnitude.
    Decimal {
        /// Decimal scale.
        scale: i32,
        /// Big-endian two's complement unscaled value.
        magnitude: Vec<u8>,
    },
    /// Byte array.
    ByteArray(Vec<u8>),
    /// Int array.
    IntArray(Vec<i32>),
    /// Long array.
    LongArray(Vec<i64>),
    /// String array with nullable elements.
    StringArray(Vec<Option<String>>),
    /// Enum value.
    Enum {
        /// Enum type id.
        type_id: i32,
        /// Ordinal within the enum.
        ordinal: i32,
    },
    /// Complex object blob.
    Complex(ComplexObject),
}

impl DataValue {
    /// Returns the type code this value is written with.
    pub fn type_code(&self) -> u8 {
        match self {
            Self::Null => TC_NULL,
            Self::Byte(_) => TC_BYTE,
            Self::Short(_) => TC_SHORT,
            Self::Int(_) => TC_INT,
            Self::Long(_) => TC_LONG,
            Self::Float(_) => TC_FLOAT,
            Self::Double(_) => TC_DOUBLE,
            Self::Char(_) => TC_CHAR,
            Self::Bool(_) => TC_BOOL,
            Self::String(_) => TC_STRING,
            Self::Uuid(_) => TC_UUID,
            Self::Date(_) => TC_DATE,
            Self::Timestamp { .. } => TC_TIMESTAMP,
            Self::Time(_) => TC_TIME,
            Self::Decimal { .. } => TC_DECIMAL,
            Self::ByteArray(_) => TC_BYTE_ARRAY,
            Self::IntArray(_) => TC_INT_ARRAY,
            Self::LongArray(_) => TC_LONG_ARRAY,
            Self::StringArray(_) => TC_STRING_ARRAY,
            Self::Enum { .. } => TC_BINARY_ENUM,
            Self::Complex(_) => TC_COMPLEX_OBJECT,
        }
    }

    /// Returns `true` for [`DataValue::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the string slice if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the value widened to `i64` if this is an integral value.
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Self::Byte(v) => Some(v as i64),
            Self::Short(v) => Some(v as i64),
            Self::Int(v) => Some(v as i64),
            Self::Long(v) => Some(v),
            _ => None,
        }
    }
}

impl From<i32> for DataValue {
    fn from(v: i32) -> Self {
        Self::Int(v)
    }
}

impl From<i64> for DataValue {
    fn from(v: i64) -> Self {
        Self::Long(v)
    }
}

impl From<f64> for DataValue {
    fn from(v: f64) -> Self {
        Self::Double(v)
    }
}

impl From<bool> for DataValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<&str> for DataValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for DataValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<Uuid> for DataValue {
    fn from(v: Uuid) -> Self {
        Self::Uuid(v)
    }
}

fn read_len<R: DataInput>(input: &mut R) -> Result<usize> {
    let len = input.read_int()?;
    if len < 0 {
        return Err(IgniteError::Protocol(format!("negative length: {}", len)));
    }
    Ok(len as usize)
}

/// Reads one type-coded value.
pub fn read_data_value(input: &mut ObjectDataInput<'_>) -> Result<DataValue> {
    let start = input.position();
    let code = input.read_ubyte()?;
    let value = match code {
        TC_NULL => DataValue::Null,
        TC_BYTE => DataValue::Byte(input.read_byte()?),
        TC_SHORT => DataValue::Short(input.read_short()?),
        TC_INT => DataValue::Int(input.read_int()?),
        TC_LONG => DataValue::Long(input.read_long()?),
        TC_FLOAT => DataValue::Float(input.read_float()?),
        TC_DOUBLE => DataValue::Double(input.read_double()?),
        TC_CHAR => DataValue::Char(input.read_char()?),
        TC_BOOL => DataValue::Bool(input.read_bool()?),
        TC_STRING => DataValue::String(input.read_string()?),
        TC_UUID => DataValue::Uuid(input.read_uuid()?),
        TC_DATE => DataValue::Date(input.read_long()?),
        TC_TIMESTAMP => DataValue::Timestamp {
            millis: input.read_long()?,
            nanos: input.read_int()?,
        },
        TC_TIME => DataValue::Time(input.read_long()?),
        TC_DECIMAL => {
            let scale = input.read_int()?;
            let len = read_len(input)?;
            DataValue::Decimal {
                scale,
                magnitude: input.read_bytes(len)?,
            }
        }
        TC_BYTE_ARRAY => {
            let len = read_len(input)?;
            DataValue::ByteArray(input.read_bytes(len)?)
        }
        TC_INT_ARRAY => {
            let len = read_len(input)?;
            input.ensure_remaining(len.saturating_mul(4))?;
            let mut values = Vec::with_capacity(len);
            for _ in 0..len {
                values.push(input.read_int()?);
            }
            DataValue::IntArray(values)
        }
        TC_LONG_ARRAY => {
            let len = read_len(input)?;
            input.ensure_remaining(len.saturating_mul(8))?;
            let mut values = Vec::with_capacity(len);
            for _ in 0..len {
                values.push(input.read_long()?);
            }
            DataValue::LongArray(values)
        }
        TC_STRING_ARRAY => {
            let len = read_len(input)?;
            input.ensure_remaining(len)?;
            let mut values = Vec::with_capacity(len);
            for _ in 0..len {
                values.push(read_string_object(input)?);
            }
            DataValue::StringArray(values)
        }
        TC_ENUM | TC_BINARY_ENUM => DataValue::Enum {
            type_id: input.read_int()?,
            ordinal: input.read_int()?,
        },
        TC_COMPLEX_OBJECT => {
            input.ensure_remaining(COMPLEX_OBJECT_HEADER_SIZE - 1)?;
            let header = &input.peek_remaining()[..COMPLEX_OBJECT_HEADER_SIZE - 1];
            let length = i32::from_le_bytes([header[7], header[8], header[9], header[10]]);
            if length < COMPLEX_OBJECT_HEADER_SIZE as i32 {
                return Err(IgniteError::Protocol(format!(
                    "invalid complex object length: {}",
                    length
                )));
            }
            let mut bytes = Vec::with_capacity(length as usize);
            bytes.push(code);
            bytes.extend(input.read_bytes(length as usize - 1)?);
            DataValue::Complex(ComplexObject::from_bytes(bytes)?)
        }
        TC_WRAPPED_BINARY => {
            let len = read_len(input)?;
            let payload = input.read_bytes(len)?;
            let offset = input.read_int()?;
            if offset < 0 || offset as usize >= payload.len() {
                return Err(IgniteError::Protocol(format!(
                    "wrapped binary offset {} outside {} bytes",
                    offset, len
                )));
            }
            let mut inner = ObjectDataInput::new(&payload[offset as usize..]);
            read_data_value(&mut inner)?
        }
        other => {
            return Err(IgniteError::Protocol(format!(
                "unsupported type code {} at offset {}",
                other, start
            )))
        }
    };
    Ok(value)
}

/// Writes one type-coded value.
pub fn write_data_value<W: DataOutput>(output: &mut W, value: &DataValue) -> Result<()> {
    if let DataValue::Complex(obj) = value {
        return output.write_bytes(obj.as_bytes());
    }
    output.write_ubyte(value.type_code())?;
    match value {
        DataValue::Null => Ok(()),
        DataValue::Byte(v) => output.write_byte(*v),
        DataValue::Short(v) => output.write_short(*v),
        DataValue::Int(v) => output.write_int(*v),
        DataValue::Long(v) => output.write_long(*v),
        DataValue::Float(v) => output.write_float(*v),
        DataValue::Double(v) => output.write_double(*v),
        DataValue::Char(v) => output.write_char(*v),
        DataValue::Bool(v) => output.write_bool(*v),
        DataValue::String(v) => output.write_string(v),
        DataValue::Uuid(v) => output.write_uuid(v),
        DataValue::Date(v) | DataValue::Time(v) => output.write_long(*v),
        DataValue::Timestamp { millis, nanos } => {
            output.write_long(*millis)?;
            output.write_int(*nanos)
        }
        DataValue::Decimal { scale, magnitude } => {
            output.write_int(*scale)?;
            output.write_int(magnitude.len() as i32)?;
            output.write_bytes(magnitude)
        }
        DataValue::ByteArray(v) => {
            output.write_int(v.len() as i32)?;
            output.write_bytes(v)
        }
        DataValue::IntArray(v) => {
            output.write_int(v.len() as i32)?;
            v.iter().try_for_each(|x| output.write_int(*x))
        }
        DataValue::LongArray(v) => {
            output.write_int(v.len() as i32)?;
            v.iter().try_for_each(|x| output.write_long(*x))
        }
        DataValue::StringArray(v) => {
            output.write_int(v.len() as i32)?;
            v.iter()
                .try_for_each(|s| write_string_object(output, s.as_deref()))
        }
        DataValue::Enum { type_id, ordinal } => {
            output.write_int(*type_id)?;
            output.write_int(*ordinal)
        }
        // Written verbatim above, header included.
        DataValue::Complex(_) => Ok(()),
    }
}

/// Reads a nullable string object (string or null type code).
pub fn read_string_object<R: DataInput>(input: &mut R) -> Result<Option<String>> {
    match input.read_ubyte()? {
        TC_NULL => Ok(None),
        TC_STRING => Ok(Some(input.read_string()?)),
        other => Err(IgniteError::Protocol(format!(
            "expected string or null, found type code {}",
            other
        ))),
    }
}

/// Writes a nullable string object.
pub fn write_string_object<W: DataOutput>(output: &mut W, value: Option<&str>) -> Result<()> {
    match value {
        None => output.write_ubyte(TC_NULL),
        Some(s) => {
            output.write_ubyte(TC_STRING)?;
            output.write_string(s)
        }
    }
}

/// Reads a nullable UUID object.
pub fn read_uuid_object<R: DataInput>(input: &mut R) -> Result<Option<Uuid>> {
    match input.read_ubyte()? {
        TC_NULL => Ok(None),
        TC_UUID => Ok(Some(input.read_uuid()?)),
        other => Err(IgniteError::Protocol(format!(
            "expected UUID or null, found type code {}",
            other
        ))),
    }
}

/// Writes a nullable UUID object.
pub fn write_uuid_object<W: DataOutput>(output: &mut W, value: Option<&Uuid>) -> Result<()> {
    match value {
        None => output.write_ubyte(TC_NULL),
        Some(uuid) => {
            output.write_ubyte(TC_UUID)?;
            output.write_uuid(uuid)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serialization::ObjectDataOutput;

    fn write(value: &DataValue) -> Vec<u8> {
        let mut out = ObjectDataOutput::new();
        write_data_value(&mut out, value).unwrap();
        out.into_bytes()
    }

    fn complex_blob(type_id: i32, schema_id: i32, body: &[u8]) -> Vec<u8> {
        let length = (COMPLEX_OBJECT_HEADER_SIZE + body.len()) as i32;
        let mut out = ObjectDataOutput::new();
        out.write_ubyte(TC_COMPLEX_OBJECT).unwrap();
        out.write_ubyte(1).unwrap();
        out.write_short(0x2b).unwrap();
        out.write_int(type_id).unwrap();
        out.write_int(0).unwrap();
        out.write_int(length).unwrap();
        out.write_int(schema_id).unwrap();
        out.write_int(COMPLEX_OBJECT_HEADER_SIZE as i32).unwrap();
        out.write_bytes(body).unwrap();
        out.into_bytes()
    }

    #[test]
    fn test_int_layout() {
        assert_eq!(write(&DataValue::Int(7)), vec![TC_INT, 7, 0, 0, 0]);
    }

    #[test]
    fn test_null_layout() {
        assert_eq!(write(&DataValue::Null), vec![TC_NULL]);
    }

    #[test]
    fn test_string_read() {
        let bytes = write(&DataValue::from("ignite"));
        let mut input = ObjectDataInput::new(&bytes);
        assert_eq!(
            read_data_value(&mut input).unwrap(),
            DataValue::String("ignite".to_string())
        );
        assert_eq!(input.remaining(), 0);
    }

    #[test]
    fn test_timestamp_read() {
        let value = DataValue::Timestamp {
            millis: 1_600_000_000_000,
            nanos: 500,
        };
        let bytes = write(&value);
        assert_eq!(bytes.len(), 1 + 8 + 4);
        let mut input = ObjectDataInput::new(&bytes);
        assert_eq!(read_data_value(&mut input).unwrap(), value);
    }

    #[test]
    fn test_string_array_with_null_element() {
        let value = DataValue::StringArray(vec![Some("a".into()), None]);
        let bytes = write(&value);
        let mut input = ObjectDataInput::new(&bytes);
        assert_eq!(read_data_value(&mut input).unwrap(), value);
    }

    #[test]
    fn test_complex_object_header_is_exposed() {
        let blob = complex_blob(1234, -99, &[1, 2, 3, 4]);
        let mut input = ObjectDataInput::new(&blob);
        match read_data_value(&mut input).unwrap() {
            DataValue::Complex(obj) => {
                assert_eq!(obj.type_id(), 1234);
                assert_eq!(obj.schema_id(), -99);
                assert_eq!(obj.as_bytes(), &blob[..]);
            }
            other => panic!("unexpected value {:?}", other),
        }
        assert_eq!(input.remaining(), 0);
    }

    #[test]
    fn test_wrapped_binary_unwraps_complex_object() {
        let blob = complex_blob(5, 6, &[]);
        let mut out = ObjectDataOutput::new();
        out.write_ubyte(TC_WRAPPED_BINARY).unwrap();
        out.write_int(blob.len() as i32).unwrap();
        out.write_bytes(&blob).unwrap();
        out.write_int(0).unwrap();
        let bytes = out.into_bytes();

        let mut input = ObjectDataInput::new(&bytes);
        match read_data_value(&mut input).unwrap() {
            DataValue::Complex(obj) => assert_eq!((obj.type_id(), obj.schema_id()), (5, 6)),
            other => panic!("unexpected value {:?}", other),
        }
    }

    #[test]
    fn test_truncated_complex_object_fails() {
        let blob = complex_blob(1, 2, &[9, 9, 9]);
        let mut input = ObjectDataInput::new(&blob[..blob.len() - 1]);
        assert!(matches!(
            read_data_value(&mut input),
            Err(IgniteError::Protocol(_))
        ));
    }

    #[test]
    fn test_unknown_type_code_fails() {
        let bytes = [200u8, 0, 0];
        let mut input = ObjectDataInput::new(&bytes);
        let err = read_data_value(&mut input).unwrap_err();
        assert!(err.to_string().contains("unsupported type code 200"));
    }

    #[test]
    fn test_huge_int_array_count_rejected_before_allocation() {
        let mut out = ObjectDataOutput::new();
        out.write_ubyte(TC_INT_ARRAY).unwrap();
        out.write_int(i32::MAX).unwrap();
        let bytes = out.into_bytes();
        let mut input = ObjectDataInput::new(&bytes);
        assert!(read_data_value(&mut input).is_err());
    }

    #[test]
    fn test_string_object_null() {
        let mut out = ObjectDataOutput::new();
        write_string_object(&mut out, None).unwrap();
        write_string_object(&mut out, Some("x")).unwrap();
        let bytes = out.into_bytes();
        let mut input = ObjectDataInput::new(&bytes);
        assert_eq!(read_string_object(&mut input).unwrap(), None);
        assert_eq!(read_string_object(&mut input).unwrap(), Some("x".to_string()));
    }

    #[test]
    fn test_as_i64_widening() {
        assert_eq!(DataValue::Short(-3).as_i64(), Some(-3));
        assert_eq!(DataValue::Double(1.0).as_i64(), None);
    }
}
