//! Structural codec for nested wire records.
//!
//! A [`Descriptor`] tree states the layout of a message: scalars, structs,
//! count-prefixed struct arrays and conditional branches whose shape depends
//! on sibling values decoded earlier in the same struct. [`decode`] walks the
//! tree strictly left to right and produces a [`Value`]; [`encode`] does the
//! reverse and validates the value's shape on the way.

mod codec;
mod descriptor;
mod value;

pub use codec::{decode, encode};
pub use descriptor::{field, Descriptor, Field, Predicate, Primitive};
pub use value::{Record, Value};
