//! Values produced and consumed by the descriptor codec.

use uuid::Uuid;

use crate::error::{IgniteError, Result};

/// A decoded wire value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Signed byte.
    Byte(i8),
    /// Unsigned byte.
    UByte(u8),
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
    /// Boolean.
    Bool(bool),
    /// Raw 16-byte UUID.
    Uuid(Uuid),
    /// Nullable string object.
    String(Option<String>),
    /// Nullable UUID object.
    UuidObject(Option<Uuid>),
    /// Ordered set of named fields.
    Record(Record),
    /// Ordered sequence of records.
    Array(Vec<Record>),
}

impl Value {
    /// Short name of the variant, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Byte(_) => "byte",
            Self::UByte(_) => "ubyte",
            Self::Short(_) => "short",
            Self::Int(_) => "int",
            Self::Long(_) => "long",
            Self::Float(_) => "float",
            Self::Double(_) => "double",
            Self::Bool(_) => "bool",
            Self::Uuid(_) => "uuid",
            Self::String(_) => "string",
            Self::UuidObject(_) => "uuid object",
            Self::Record(_) => "record",
            Self::Array(_) => "array",
        }
    }

    /// Returns the value if this is an `Int`.
    pub fn as_int(&self) -> Option<i32> {
        match *self {
            Self::Int(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the value if this is a `Long`.
    pub fn as_long(&self) -> Option<i64> {
        match *self {
            Self::Long(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the value if this is a `Bool`.
    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            Self::Bool(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the record if this is a `Record`.
    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Self::Record(r) => Some(r),
            _ => None,
        }
    }

    /// Returns the elements if this is an `Array`.
    pub fn as_array(&self) -> Option<&[Record]> {
        match self {
            Self::Array(a) => Some(a),
            _ => None,
        }
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Long(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(Some(v.to_string()))
    }
}

impl From<Record> for Value {
    fn from(v: Record) -> Self {
        Self::Record(v)
    }
}

impl From<Vec<Record>> for Value {
    fn from(v: Vec<Record>) -> Self {
        Self::Array(v)
    }
}

/// Named fields in wire order.
///
/// Field order is significant and preserved. Lookups are linear; records
/// are small.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: Vec<(String, Value)>,
}

impl Record {
    /// Creates an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            fields: Vec::with_capacity(capacity),
        }
    }

    /// Appends a field, builder style.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.push(name, value);
        self
    }

    /// Appends a field.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.fields.push((name.into(), value.into()));
    }

    /// Returns the first field named `name`.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` if the record has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterates over fields in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Field names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(n, _)| n.as_str())
    }

    fn require(&self, name: &str) -> Result<&Value> {
        self.get(name)
            .ok_or_else(|| IgniteError::Serialization(format!("missing field `{}`", name)))
    }

    fn mismatch(name: &str, expected: &str, found: &Value) -> IgniteError {
        IgniteError::Serialization(format!(
            "field `{}`: expected {}, found {}",
            name,
            expected,
            found.kind()
        ))
    }

    /// Returns an `Int` field.
    pub fn int(&self, name: &str) -> Result<i32> {
        let value = self.require(name)?;
        value.as_int().ok_or_else(|| Self::mismatch(name, "int", value))
    }

    /// Returns a `Long` field.
    pub fn long(&self, name: &str) -> Result<i64> {
        let value = self.require(name)?;
        value.as_long().ok_or_else(|| Self::mismatch(name, "long", value))
    }

    /// Returns a `Bool` field.
    pub fn bool(&self, name: &str) -> Result<bool> {
        let value = self.require(name)?;
        value.as_bool().ok_or_else(|| Self::mismatch(name, "bool", value))
    }

    /// Returns a nullable string field.
    pub fn string(&self, name: &str) -> Result<Option<&str>> {
        match self.require(name)? {
            Value::String(s) => Ok(s.as_deref()),
            other => Err(Self::mismatch(name, "string", other)),
        }
    }

    /// Returns a nullable UUID object field.
    pub fn uuid_object(&self, name: &str) -> Result<Option<Uuid>> {
        match self.require(name)? {
            Value::UuidObject(u) => Ok(*u),
            other => Err(Self::mismatch(name, "uuid object", other)),
        }
    }

    /// Returns an array field.
    pub fn array(&self, name: &str) -> Result<&[Record]> {
        let value = self.require(name)?;
        value.as_array().ok_or_else(|| Self::mismatch(name, "array", value))
    }

    /// Returns a nested record field.
    pub fn record(&self, name: &str) -> Result<&Record> {
        let value = self.require(name)?;
        value.as_record().ok_or_else(|| Self::mismatch(name, "record", value))
    }
}
