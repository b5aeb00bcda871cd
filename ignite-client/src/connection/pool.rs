//! Node pool: owns the endpoints and picks the node a request goes to.

use std::sync::Arc;

use ignite_core::{IgniteError, ProtocolVersion, Result};
use rand::seq::SliceRandom;
use tracing::instrument;
use uuid::Uuid;

use super::connection::ConnectOptions;
use super::endpoint::NodeEndpoint;
use crate::config::NodeAddress;

fn choose_random(nodes: &[Arc<NodeEndpoint>]) -> Option<Arc<NodeEndpoint>> {
    nodes.choose(&mut rand::thread_rng()).cloned()
}

/// How the pool chooses a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionPolicy {
    /// Stick to one node; on failure move to the next configured one.
    #[default]
    Sequential,
    /// Keep every node connected and pick one at random per request.
    PartitionAware,
}

/// The set of configured nodes.
///
/// Not internally synchronized: callers serialize `connect`, `select` and
/// `close`. Reconnection happens only inside those calls.
#[derive(Debug)]
pub struct NodePool {
    options: Arc<ConnectOptions>,
    policy: SelectionPolicy,
    endpoints: Vec<Arc<NodeEndpoint>>,
    current: usize,
    version: Option<ProtocolVersion>,
}

impl NodePool {
    /// Creates an empty pool.
    pub fn new(options: ConnectOptions, policy: SelectionPolicy) -> Self {
        Self {
            options: Arc::new(options),
            policy,
            endpoints: Vec::new(),
            current: 0,
            version: None,
        }
    }

    /// Policy requested at construction.
    pub fn policy(&self) -> SelectionPolicy {
        self.policy
    }

    /// Policy actually applied: partition awareness needs protocol 1.4.0.
    pub fn effective_policy(&self) -> SelectionPolicy {
        match (self.policy, self.version) {
            (SelectionPolicy::PartitionAware, Some(v)) if v.supports_partition_awareness() => {
                SelectionPolicy::PartitionAware
            }
            _ => SelectionPolicy::Sequential,
        }
    }

    /// Version negotiated with the first node that accepted a handshake.
    pub fn protocol_version(&self) -> Option<ProtocolVersion> {
        self.version
    }

    /// All endpoints, in configuration order.
    pub fn endpoints(&self) -> &[Arc<NodeEndpoint>] {
        &self.endpoints
    }

    /// Number of configured endpoints.
    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    /// Returns `true` if the pool has no endpoints.
    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    /// Index of the node sequential selection sticks to.
    pub fn current_index(&self) -> usize {
        self.current
    }

    /// Builds an endpoint per address and opens the initial connections.
    ///
    /// Sequentially, only the first node that accepts is connected and becomes
    /// current. Partition-aware, every node is tried, and a failed node gets
    /// one more attempt in place; if the first accepted handshake is older
    /// than 1.4.0 the remaining nodes are left closed.
    #[instrument(name = "node_pool.connect", skip(self, addresses), fields(nodes = addresses.len()))]
    pub async fn connect(&mut self, addresses: &[NodeAddress]) -> Result<()> {
        self.close().await;
        self.endpoints = addresses
            .iter()
            .map(|a| Arc::new(NodeEndpoint::new(a.clone(), Arc::clone(&self.options))))
            .collect();

        let mut last_error = None;
        for (index, endpoint) in self.endpoints.iter().enumerate() {
            // once a version is known, an old server turns partition awareness off
            let partition_aware = match self.version {
                None => self.policy == SelectionPolicy::PartitionAware,
                Some(_) => self.effective_policy() == SelectionPolicy::PartitionAware,
            };
            if self.version.is_some() && !partition_aware {
                break;
            }

            let mut result = endpoint.connect().await;
            if result.is_err() && partition_aware {
                result = endpoint.connect().await;
            }

            match result {
                Ok(version) => {
                    if self.version.is_none() {
                        self.version = Some(version);
                        self.current = index;
                    }
                }
                Err(e) => last_error = Some(e),
            }
        }

        match self.version {
            Some(version) => {
                tracing::info!(
                    version = %version,
                    policy = ?self.effective_policy(),
                    "node pool connected"
                );
                Ok(())
            }
            None => Err(IgniteError::Reconnect(match last_error {
                Some(e) => format!("no node accepted a connection, last error: {}", e),
                None => "no node addresses configured".to_string(),
            })),
        }
    }

    /// Picks the node for the next request, reconnecting as needed.
    ///
    /// Fails with [`IgniteError::Reconnect`] once every node has been tried.
    #[instrument(name = "node_pool.select", skip(self), fields(policy = ?self.effective_policy()))]
    pub async fn select(&mut self) -> Result<Arc<NodeEndpoint>> {
        if self.endpoints.is_empty() {
            return Err(IgniteError::Reconnect("node pool is empty".to_string()));
        }
        match self.effective_policy() {
            SelectionPolicy::Sequential => self.select_sequential().await,
            SelectionPolicy::PartitionAware => self.select_random().await,
        }
    }

    async fn select_sequential(&mut self) -> Result<Arc<NodeEndpoint>> {
        let current = &self.endpoints[self.current];
        if current.is_alive().await {
            return Ok(Arc::clone(current));
        }
        current.close().await;

        let count = self.endpoints.len();
        for step in 1..=count {
            let index = (self.current + step) % count;
            let endpoint = &self.endpoints[index];
            if endpoint.connect().await.is_ok() {
                self.current = index;
                tracing::info!(address = %endpoint.address(), "failed over to node");
                return Ok(Arc::clone(endpoint));
            }
        }

        Err(IgniteError::Reconnect(format!(
            "all {} nodes are unreachable",
            count
        )))
    }

    async fn select_random(&mut self) -> Result<Arc<NodeEndpoint>> {
        if let Some(endpoint) = self.pick_alive().await {
            return Ok(endpoint);
        }

        tracing::warn!("no alive nodes, reconnecting all");
        for endpoint in &self.endpoints {
            let _ = endpoint.connect().await;
        }

        self.pick_alive().await.ok_or_else(|| {
            IgniteError::Reconnect(format!(
                "all {} nodes are unreachable",
                self.endpoints.len()
            ))
        })
    }

    async fn pick_alive(&self) -> Option<Arc<NodeEndpoint>> {
        let mut alive = Vec::with_capacity(self.endpoints.len());
        for endpoint in &self.endpoints {
            if endpoint.is_alive().await {
                alive.push(Arc::clone(endpoint));
            }
        }
        choose_random(&alive)
    }

    /// Alive endpoint whose handshake reported `uuid`.
    pub async fn node_by_uuid(&self, uuid: &Uuid) -> Option<Arc<NodeEndpoint>> {
        for endpoint in &self.endpoints {
            if endpoint.node_uuid().await.as_ref() == Some(uuid) && endpoint.is_alive().await {
                return Some(Arc::clone(endpoint));
            }
        }
        None
    }

    /// Closes every endpoint and clears the pool. Safe to call repeatedly.
    #[instrument(name = "node_pool.close", skip(self))]
    pub async fn close(&mut self) {
        for endpoint in self.endpoints.drain(..) {
            endpoint.close().await;
        }
        self.current = 0;
        self.version = None;
    }
}
