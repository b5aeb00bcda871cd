//! Connections, node endpoints and the node pool.

mod connection;
mod endpoint;
mod pool;

pub use connection::{ConnectOptions, Connection};
pub use endpoint::{NodeEndpoint, NodeState};
pub use pool::{NodePool, SelectionPolicy};
