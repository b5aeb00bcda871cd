//! Little-endian primitive I/O and the type-coded data object codec.

mod data_input;
mod data_output;
mod data_value;

pub use data_input::{DataInput, ObjectDataInput};
pub use data_output::{DataOutput, ObjectDataOutput};
pub use data_value::{
    read_data_value, read_string_object, read_uuid_object, write_data_value, write_string_object,
    write_uuid_object, ComplexObject, DataValue,
};
