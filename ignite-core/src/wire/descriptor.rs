//! Declarative layout of wire records.

use super::value::Record;

/// Fixed-width and type-coded scalars.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    /// `i8`.
    Byte,
    /// `u8`.
    UByte,
    /// `i16`.
    Short,
    /// `i32`.
    Int,
    /// `i64`.
    Long,
    /// `f32`.
    Float,
    /// `f64`.
    Double,
    /// One byte, non-zero is true.
    Bool,
    /// Two `i64` halves, no type code.
    Uuid,
    /// Type-coded string, or the null code.
    String,
    /// Type-coded UUID, or the null code.
    UuidObject,
}

impl Primitive {
    /// Smallest number of bytes this scalar occupies on the wire.
    pub fn min_size(self) -> usize {
        match self {
            Self::Byte | Self::UByte | Self::Bool => 1,
            Self::Short => 2,
            Self::Int | Self::Float => 4,
            Self::Long | Self::Double => 8,
            Self::Uuid => 16,
            Self::String | Self::UuidObject => 1,
        }
    }
}

/// Predicate over the sibling fields decoded so far.
pub type Predicate = fn(&Record) -> bool;

/// A named member of a struct layout.
#[derive(Debug, Clone)]
pub struct Field {
    name: &'static str,
    descriptor: Descriptor,
}

impl Field {
    /// Field name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Field layout.
    pub fn descriptor(&self) -> &Descriptor {
        &self.descriptor
    }
}

/// Shorthand for building a [`Field`].
pub fn field(name: &'static str, descriptor: Descriptor) -> Field {
    Field { name, descriptor }
}

/// Layout of a wire value.
///
/// Descriptor trees are immutable and carry no decode state, so one tree can
/// be shared by any number of concurrent decodes.
#[derive(Debug, Clone)]
pub enum Descriptor {
    /// A single scalar.
    Primitive(Primitive),
    /// Fields in fixed order.
    Struct(Vec<Field>),
    /// A signed 4-byte count followed by that many structs.
    StructArray(Vec<Field>),
    /// One of two layouts, chosen by a predicate over earlier siblings.
    Conditional {
        /// Selects `then` when true, `otherwise` when false.
        predicate: Predicate,
        /// Layout used when the predicate holds.
        then: Box<Descriptor>,
        /// Layout used otherwise.
        otherwise: Box<Descriptor>,
    },
}

impl Descriptor {
    /// `i8`.
    pub const BYTE: Descriptor = Descriptor::Primitive(Primitive::Byte);
    /// `i16`.
    pub const SHORT: Descriptor = Descriptor::Primitive(Primitive::Short);
    /// `i32`.
    pub const INT: Descriptor = Descriptor::Primitive(Primitive::Int);
    /// `i64`.
    pub const LONG: Descriptor = Descriptor::Primitive(Primitive::Long);
    /// Boolean.
    pub const BOOL: Descriptor = Descriptor::Primitive(Primitive::Bool);
    /// Nullable string object.
    pub const STRING: Descriptor = Descriptor::Primitive(Primitive::String);
    /// Nullable UUID object.
    pub const UUID_OBJECT: Descriptor = Descriptor::Primitive(Primitive::UuidObject);

    /// Builds a struct layout.
    pub fn structure(fields: Vec<Field>) -> Self {
        Self::Struct(fields)
    }

    /// Builds a struct array layout.
    pub fn struct_array(fields: Vec<Field>) -> Self {
        Self::StructArray(fields)
    }

    /// Builds a conditional layout.
    pub fn conditional(predicate: Predicate, then: Descriptor, otherwise: Descriptor) -> Self {
        Self::Conditional {
            predicate,
            then: Box::new(then),
            otherwise: Box::new(otherwise),
        }
    }

    /// Smallest number of bytes a value of this layout occupies.
    ///
    /// Used to reject array counts that cannot fit in the remaining input
    /// before anything is allocated.
    pub fn min_size(&self) -> usize {
        match self {
            Self::Primitive(p) => p.min_size(),
            Self::Struct(fields) => fields.iter().map(|f| f.descriptor.min_size()).sum(),
            Self::StructArray(_) => 4,
            Self::Conditional {
                then, otherwise, ..
            } => then.min_size().min(otherwise.min_size()),
        }
    }
}
