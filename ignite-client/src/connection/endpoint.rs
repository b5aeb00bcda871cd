//! One configured node: its address, liveness state and connection.

use std::fmt;
use std::sync::Arc;

use ignite_core::protocol::{Request, Response};
use ignite_core::{IgniteError, ProtocolVersion, Result};
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use super::connection::{ConnectOptions, Connection};
use crate::config::NodeAddress;

/// Liveness of a node endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeState {
    /// Connected and handshaken.
    Alive,
    /// Not connected; the last attempt or request failed, or it was closed.
    Dead,
    /// A connect attempt is in progress.
    Reconnecting,
}

impl fmt::Display for NodeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Alive => "alive",
            Self::Dead => "dead",
            Self::Reconnecting => "reconnecting",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy)]
struct NodeStatus {
    state: NodeState,
    version: Option<ProtocolVersion>,
    node_uuid: Option<Uuid>,
}

/// A cluster node the pool may route requests to.
///
/// The connection sits behind an async mutex, so at most one request is in
/// flight per node. Liveness is tracked separately and can be read while a
/// request holds the connection.
#[derive(Debug)]
pub struct NodeEndpoint {
    address: NodeAddress,
    options: Arc<ConnectOptions>,
    status: RwLock<NodeStatus>,
    connection: Mutex<Option<Connection>>,
}

impl NodeEndpoint {
    /// Creates a disconnected endpoint.
    pub fn new(address: NodeAddress, options: Arc<ConnectOptions>) -> Self {
        Self {
            address,
            options,
            status: RwLock::new(NodeStatus {
                state: NodeState::Dead,
                version: None,
                node_uuid: None,
            }),
            connection: Mutex::new(None),
        }
    }

    /// Address this endpoint connects to.
    pub fn address(&self) -> &NodeAddress {
        &self.address
    }

    /// Current state.
    pub async fn state(&self) -> NodeState {
        self.status.read().await.state
    }

    /// Returns `true` if the endpoint holds a usable connection.
    pub async fn is_alive(&self) -> bool {
        self.state().await == NodeState::Alive
    }

    /// Version negotiated by the last successful handshake.
    pub async fn version(&self) -> Option<ProtocolVersion> {
        self.status.read().await.version
    }

    /// Node id reported by the last successful handshake.
    pub async fn node_uuid(&self) -> Option<Uuid> {
        self.status.read().await.node_uuid
    }

    async fn set_state(&self, state: NodeState) {
        self.status.write().await.state = state;
    }

    /// Opens a fresh connection, replacing any existing one.
    ///
    /// Returns the negotiated version. On failure the endpoint is `Dead`.
    pub async fn connect(&self) -> Result<ProtocolVersion> {
        let mut slot = self.connection.lock().await;
        if let Some(old) = slot.take() {
            old.close().await;
        }
        self.set_state(NodeState::Reconnecting).await;

        match Connection::open(&self.address, &self.options).await {
            Ok(connection) => {
                let version = connection.version();
                {
                    let mut status = self.status.write().await;
                    status.state = NodeState::Alive;
                    status.version = Some(version);
                    status.node_uuid = connection.node_uuid();
                }
                *slot = Some(connection);
                tracing::info!(address = %self.address, version = %version, "node connected");
                Ok(version)
            }
            Err(e) => {
                self.set_state(NodeState::Dead).await;
                tracing::warn!(address = %self.address, error = %e, "failed to connect to node");
                Err(e)
            }
        }
    }

    /// Closes the connection, if any, and marks the endpoint `Dead`.
    pub async fn close(&self) {
        let mut slot = self.connection.lock().await;
        if let Some(connection) = slot.take() {
            connection.close().await;
        }
        self.set_state(NodeState::Dead).await;
    }

    /// Sends `request` and waits for its response.
    ///
    /// An error that leaves the stream unusable drops the connection and
    /// marks the endpoint `Dead`; the pool reconnects it on a later selection.
    pub async fn request(&self, request: &Request) -> Result<Response> {
        let mut slot = self.connection.lock().await;
        let connection = slot.as_mut().ok_or_else(|| {
            IgniteError::Connection(format!("node {} is not connected", self.address))
        })?;

        match connection.request(request).await {
            Ok(response) => Ok(response),
            Err(e) => {
                if e.is_connection_fatal() {
                    if let Some(connection) = slot.take() {
                        connection.close().await;
                    }
                    self.set_state(NodeState::Dead).await;
                    tracing::warn!(
                        address = %self.address,
                        op_code = request.op_code(),
                        error = %e,
                        "request failed, node marked dead"
                    );
                }
                Err(e)
            }
        }
    }

    /// Passes through the result of decoding a response payload.
    ///
    /// A decode failure that means the stream can no longer be trusted closes
    /// the connection and marks the endpoint `Dead`, like a failed read.
    pub async fn check_payload<T>(&self, decoded: Result<T>) -> Result<T> {
        if let Err(e) = &decoded {
            if e.is_connection_fatal() {
                tracing::warn!(
                    address = %self.address,
                    error = %e,
                    "malformed response payload, node marked dead"
                );
                self.close().await;
            }
        }
        decoded
    }
}
