//! Core types of the Apache Ignite thin client.
//!
//! Everything here is free of I/O: the error type, primitive and data
//! object codecs, the descriptor-driven wire codec, protocol framing and the
//! message builders and parsers for binary types, affinity, SQL queries and
//! cache listing.

#![warn(missing_docs)]

pub mod affinity;
pub mod binary;
pub mod cache;
pub mod error;
pub mod protocol;
pub mod query;
pub mod serialization;
pub mod wire;

pub use affinity::{CacheAffinity, NodeMap, PartitionTopology, TopologyVersion};
pub use binary::{BinaryField, BinaryTypeDescriptor, SchemaRef};
pub use error::{IgniteError, Result};
pub use protocol::ProtocolVersion;
pub use query::SqlFieldsQuery;
pub use serialization::{
    DataInput, DataOutput, DataValue, ObjectDataInput, ObjectDataOutput,
};
