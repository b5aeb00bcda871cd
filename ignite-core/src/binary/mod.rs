//! Binary (complex object) type model: ids, schemas and type messages.

mod descriptor;
pub mod hash;
mod messages;

pub use descriptor::{BinaryField, BinaryTypeDescriptor, SchemaRef};
pub use hash::{cache_id, entity_id, java_hashcode, schema_id};
pub use messages::{
    binary_type_response_descriptor, get_binary_type_request, parse_binary_type_response,
    put_binary_type_request,
};
