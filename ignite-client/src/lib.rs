//! Async Rust thin client for [Apache Ignite](https://ignite.apache.org/).
//!
//! The client speaks the Ignite binary client protocol over plain TCP. It
//! connects to one or more nodes, negotiates a protocol version, and offers
//! type registration and lookup, partition topology queries with
//! affinity-aware node routing, paginated SQL fields queries and cache
//! listing. It is built on [Tokio](https://tokio.rs/); a blocking facade
//! lives in [`blocking`].
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use ignite_client::{ClientConfig, IgniteClient, NodeAddress, SqlFieldsQuery};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ClientConfig::builder()
//!         .add_address(NodeAddress::new("127.0.0.1", 10800))
//!         .build()?;
//!     let client = IgniteClient::connect(config).await?;
//!
//!     let mut cursor = client
//!         .sql(SqlFieldsQuery::new("SELECT name FROM Person").page_size(100))
//!         .await?;
//!     loop {
//!         let rows = cursor.advance().await?;
//!         if rows.is_empty() {
//!             break;
//!         }
//!         println!("{:?}", rows);
//!     }
//!
//!     client.close().await;
//!     Ok(())
//! }
//! ```
//!
//! # Node selection
//!
//! By default requests stick to one node and fail over to the next
//! configured one. With [`ClientConfigBuilder::partition_aware`] every node
//! is kept connected and requests are spread over them; keyed requests can
//! be routed to the partition owner through
//! [`IgniteClient::node_for_key`]. Partition awareness needs protocol 1.4.0
//! or later and silently falls back to failover mode on older servers.

#![warn(missing_docs)]

pub mod affinity;
pub mod blocking;
mod client;
pub mod config;
pub mod config_file;
pub mod connection;
pub mod cursor;
pub mod registry;

pub use affinity::AffinityMap;
pub use client::IgniteClient;
pub use config::{
    ClientConfig, ClientConfigBuilder, ConfigError, NetworkConfig, NetworkConfigBuilder,
    NodeAddress, SecurityConfig, SecurityConfigBuilder,
};
pub use config_file::{FileConfig, FileNetworkConfig, FileSecurityConfig};
pub use connection::{NodeEndpoint, NodePool, NodeState, SelectionPolicy};
pub use cursor::{CursorState, PageSource, QueryCursor};
pub use registry::{TypeRegistry, TypeSource};

pub use ignite_core::{
    BinaryField, BinaryTypeDescriptor, DataValue, IgniteError, PartitionTopology, ProtocolVersion,
    Result, SchemaRef, SqlFieldsQuery, TopologyVersion,
};
