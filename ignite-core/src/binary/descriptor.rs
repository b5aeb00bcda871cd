//! Binary type descriptions.

use super::hash::{entity_id, schema_id};

/// A field of a binary type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryField {
    name: String,
    type_code: i32,
    field_id: i32,
}

impl BinaryField {
    /// Creates a field, deriving its id from the name.
    pub fn new(name: impl Into<String>, type_code: i32) -> Self {
        let name = name.into();
        let field_id = entity_id(&name);
        Self::with_id(name, type_code, field_id)
    }

    /// Creates a field with an explicit id.
    pub fn with_id(name: impl Into<String>, type_code: i32, field_id: i32) -> Self {
        Self {
            name: name.into(),
            type_code,
            field_id,
        }
    }

    /// Field name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Data object type code the field is written with.
    pub fn type_code(&self) -> i32 {
        self.type_code
    }

    /// Field id.
    pub fn field_id(&self) -> i32 {
        self.field_id
    }
}

/// Identifies one schema of a type: by id, or by the ordered field names.
#[derive(Debug, Clone, Copy)]
pub enum SchemaRef<'a> {
    /// A schema id as carried in a complex object header.
    Id(i32),
    /// Ordered field names.
    Fields(&'a [&'a str]),
}

impl SchemaRef<'_> {
    /// Resolves to a schema id.
    pub fn schema_id(&self) -> i32 {
        match *self {
            Self::Id(id) => id,
            Self::Fields(names) => schema_id(names.iter().map(|n| entity_id(n))),
        }
    }
}

impl From<i32> for SchemaRef<'_> {
    fn from(id: i32) -> Self {
        Self::Id(id)
    }
}

impl<'a> From<&'a [&'a str]> for SchemaRef<'a> {
    fn from(names: &'a [&'a str]) -> Self {
        Self::Fields(names)
    }
}

/// Field layout of one schema of a binary type.
///
/// A type that evolved over time has several schemas; each is described by
/// its own `BinaryTypeDescriptor` sharing the type id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryTypeDescriptor {
    type_id: i32,
    type_name: String,
    affinity_key_field: Option<String>,
    is_enum: bool,
    enum_values: Vec<(String, i32)>,
    fields: Vec<BinaryField>,
    schema_id: i32,
}

impl BinaryTypeDescriptor {
    /// Builds a descriptor for `type_name` with `fields` in order.
    ///
    /// Type id, field ids and schema id are derived from the names.
    pub fn new(type_name: impl Into<String>, fields: Vec<BinaryField>) -> Self {
        let type_name = type_name.into();
        let schema_id = schema_id(fields.iter().map(BinaryField::field_id));
        Self {
            type_id: entity_id(&type_name),
            type_name,
            affinity_key_field: None,
            is_enum: false,
            enum_values: Vec::new(),
            fields,
            schema_id,
        }
    }

    /// Builds an enum type descriptor with `(literal, ordinal)` pairs.
    pub fn enumeration(type_name: impl Into<String>, values: Vec<(String, i32)>) -> Self {
        let mut descriptor = Self::new(type_name, Vec::new());
        descriptor.is_enum = true;
        descriptor.enum_values = values;
        descriptor
    }

    /// Builds a descriptor from ids reported by the server.
    pub(crate) fn from_parts(
        type_id: i32,
        type_name: String,
        affinity_key_field: Option<String>,
        enum_values: Option<Vec<(String, i32)>>,
        fields: Vec<BinaryField>,
        schema_id: i32,
    ) -> Self {
        Self {
            type_id,
            type_name,
            affinity_key_field,
            is_enum: enum_values.is_some(),
            enum_values: enum_values.unwrap_or_default(),
            fields,
            schema_id,
        }
    }

    /// Sets the field used for affinity routing.
    pub fn with_affinity_key_field(mut self, field: impl Into<String>) -> Self {
        self.affinity_key_field = Some(field.into());
        self
    }

    /// Type id.
    pub fn type_id(&self) -> i32 {
        self.type_id
    }

    /// Type name as registered.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Field used for affinity routing, if any.
    pub fn affinity_key_field(&self) -> Option<&str> {
        self.affinity_key_field.as_deref()
    }

    /// Returns `true` for enum types.
    pub fn is_enum(&self) -> bool {
        self.is_enum
    }

    /// Enum literals and their ordinals; empty for non-enum types.
    pub fn enum_values(&self) -> &[(String, i32)] {
        &self.enum_values
    }

    /// Fields in schema order.
    pub fn fields(&self) -> &[BinaryField] {
        &self.fields
    }

    /// Returns the field named `name`.
    pub fn field(&self, name: &str) -> Option<&BinaryField> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Schema id of this field layout.
    pub fn schema_id(&self) -> i32 {
        self.schema_id
    }
}
