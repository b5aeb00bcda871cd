//! Async Ignite thin client.

use std::sync::Arc;

use async_trait::async_trait;
use ignite_core::affinity::{parse_partitions_response, partitions_request, PartitionTopology};
use ignite_core::binary::{
    get_binary_type_request, parse_binary_type_response, put_binary_type_request,
    BinaryTypeDescriptor, SchemaRef,
};
use ignite_core::cache::{cache_names_request, parse_cache_names};
use ignite_core::protocol::{Request, Response};
use ignite_core::query::parse_first_page;
use ignite_core::{IgniteError, ProtocolVersion, Result, SqlFieldsQuery};
use tokio::sync::Mutex;
use tracing::instrument;

use crate::affinity::AffinityMap;
use crate::config::ClientConfig;
use crate::connection::{ConnectOptions, NodeEndpoint, NodePool, SelectionPolicy};
use crate::cursor::{QueryCursor, SqlFieldsPages};
use crate::registry::{TypeRegistry, TypeSource};

/// The main client for talking to an Ignite cluster.
///
/// Owns the node pool, the type registry and the affinity map. Cheap
/// operations borrow `&self`; the pool is serialized by an async mutex.
#[derive(Debug)]
pub struct IgniteClient {
    config: Arc<ClientConfig>,
    pool: Mutex<NodePool>,
    registry: TypeRegistry,
    affinity: Arc<AffinityMap>,
}

impl IgniteClient {
    /// Connects to the nodes listed in `config`.
    ///
    /// # Errors
    ///
    /// Returns [`IgniteError::Reconnect`] if no node accepts a connection.
    #[instrument(name = "ignite_client.connect", skip(config), fields(nodes = config.network().addresses().len()))]
    pub async fn connect(config: ClientConfig) -> Result<Self> {
        let policy = if config.network().partition_aware() {
            SelectionPolicy::PartitionAware
        } else {
            SelectionPolicy::Sequential
        };
        let mut pool = NodePool::new(ConnectOptions::from_config(&config), policy);
        pool.connect(config.network().addresses()).await?;

        tracing::info!(
            version = ?pool.protocol_version(),
            policy = ?pool.effective_policy(),
            "connected to Ignite cluster"
        );

        Ok(Self {
            config: Arc::new(config),
            pool: Mutex::new(pool),
            registry: TypeRegistry::new(),
            affinity: Arc::new(AffinityMap::new()),
        })
    }

    /// Returns the client configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Returns the type registry.
    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// Returns the affinity map.
    pub fn affinity(&self) -> &AffinityMap {
        &self.affinity
    }

    /// Version negotiated with the cluster, `None` after [`close`](Self::close).
    pub async fn protocol_version(&self) -> Option<ProtocolVersion> {
        self.pool.lock().await.protocol_version()
    }

    /// Node selection policy in effect.
    pub async fn selection_policy(&self) -> SelectionPolicy {
        self.pool.lock().await.effective_policy()
    }

    async fn select(&self) -> Result<Arc<NodeEndpoint>> {
        self.pool.lock().await.select().await
    }

    /// Sends `request` to the node chosen by the pool.
    ///
    /// A failed status becomes [`IgniteError::ServerStatus`].
    pub async fn request(&self, request: Request) -> Result<Response> {
        let endpoint = self.select().await?;
        self.request_on(&endpoint, &request).await
    }

    /// Sends `request` to `endpoint`.
    ///
    /// A topology version in the response header is passed to the affinity
    /// map before the status is checked.
    pub async fn request_on(&self, endpoint: &NodeEndpoint, request: &Request) -> Result<Response> {
        let response = endpoint.request(request).await?;
        if let Some(version) = response.topology_version() {
            self.affinity.observe(version).await;
        }
        response.into_result()
    }

    /// Sends `request` and decodes the response payload with `decode`.
    ///
    /// A payload that fails to decode is a protocol error: the connection it
    /// came from is closed and the node marked dead.
    pub async fn request_decoded<T, F>(&self, request: Request, decode: F) -> Result<T>
    where
        F: FnOnce(&[u8]) -> Result<T>,
    {
        let endpoint = self.select().await?;
        self.request_decoded_on(&endpoint, &request, decode).await
    }

    async fn request_decoded_on<T, F>(
        &self,
        endpoint: &NodeEndpoint,
        request: &Request,
        decode: F,
    ) -> Result<T>
    where
        F: FnOnce(&[u8]) -> Result<T>,
    {
        let response = self.request_on(endpoint, request).await?;
        endpoint.check_payload(decode(response.payload())).await
    }

    /// Fetches the partition topology of `cache_ids` in one request.
    ///
    /// The result also refreshes the affinity map; a stale result is returned
    /// to the caller but not cached.
    #[instrument(name = "ignite_client.get_partitions", skip(self), fields(caches = cache_ids.len()))]
    pub async fn get_partitions(&self, cache_ids: &[i32]) -> Result<PartitionTopology> {
        if let Some(version) = self.protocol_version().await {
            if !version.supports_partition_awareness() {
                return Err(IgniteError::Configuration(format!(
                    "partition mapping requires protocol {} or later, negotiated {}",
                    ProtocolVersion::V1_4_0,
                    version
                )));
            }
        }

        let topology = self
            .request_decoded(partitions_request(cache_ids, None)?, |payload| {
                parse_partitions_response(payload, cache_ids)
            })
            .await?;
        if let Err(e) = self.affinity.update(topology.clone()).await {
            tracing::warn!(error = %e, "discarding stale partition topology");
        }
        Ok(topology)
    }

    /// Node that should serve a key with `key_hash` in `cache_id`.
    ///
    /// Uses the affinity map when partition awareness is in effect, fetching
    /// the cache's topology on a miss. Falls back to regular selection when
    /// the cache is not applicable or its owner is not connected.
    pub async fn node_for_key(&self, cache_id: i32, key_hash: i32) -> Result<Arc<NodeEndpoint>> {
        if self.selection_policy().await != SelectionPolicy::PartitionAware {
            return self.select().await;
        }

        let owner = match self.affinity.get(cache_id).await {
            Some(entry) => entry.node_for_hash(key_hash),
            None => self
                .get_partitions(&[cache_id])
                .await?
                .get(cache_id)
                .and_then(|entry| entry.node_for_hash(key_hash)),
        };

        if let Some(uuid) = owner {
            if let Some(endpoint) = self.pool.lock().await.node_by_uuid(&uuid).await {
                return Ok(endpoint);
            }
            tracing::debug!(node = %uuid, cache_id, "partition owner not connected");
        }
        self.select().await
    }

    /// Runs an SQL fields query and returns a cursor over its rows.
    ///
    /// Later pages are read from the node that answered the query.
    #[instrument(name = "ignite_client.sql", skip(self, query), fields(sql = %query.sql()))]
    pub async fn sql(&self, query: SqlFieldsQuery) -> Result<QueryCursor> {
        let request = query.to_request()?;
        let endpoint = self.select().await?;
        let include_field_names = query.includes_field_names();
        let first = self
            .request_decoded_on(&endpoint, &request, |payload| {
                parse_first_page(payload, include_field_names)
            })
            .await?;
        let pages = SqlFieldsPages::new(endpoint, Arc::clone(&self.affinity));
        Ok(QueryCursor::new(Box::new(pages), first))
    }

    /// Lists the names of all caches.
    pub async fn cache_names(&self) -> Result<Vec<String>> {
        self.request_decoded(cache_names_request(), parse_cache_names).await
    }

    /// Local type lookup; see [`TypeRegistry::get`].
    pub async fn get_type(
        &self,
        type_id: i32,
        schema: Option<SchemaRef<'_>>,
    ) -> Option<Vec<BinaryTypeDescriptor>> {
        self.registry.get(type_id, schema).await
    }

    /// Type lookup that asks the server on a miss; see [`TypeRegistry::resolve`].
    pub async fn resolve_type(
        &self,
        type_id: i32,
        schema: Option<SchemaRef<'_>>,
    ) -> Result<Option<Vec<BinaryTypeDescriptor>>> {
        self.registry.resolve(self, type_id, schema).await
    }

    /// Registers a type with the cluster; see [`TypeRegistry::register`].
    #[instrument(
        name = "ignite_client.register_type",
        skip(self, descriptor),
        fields(type_name = %descriptor.type_name(), type_id = descriptor.type_id())
    )]
    pub async fn register_type(
        &self,
        descriptor: BinaryTypeDescriptor,
        affinity_key_field: Option<&str>,
    ) -> Result<BinaryTypeDescriptor> {
        self.registry
            .register(self, descriptor, affinity_key_field)
            .await
    }

    /// Closes every connection. Safe to call repeatedly.
    pub async fn close(&self) {
        tracing::info!("closing Ignite client");
        self.pool.lock().await.close().await;
        self.affinity.invalidate().await;
    }
}

#[async_trait]
impl TypeSource for IgniteClient {
    async fn get_binary_type(&self, type_id: i32) -> Result<Option<Vec<BinaryTypeDescriptor>>> {
        self.request_decoded(get_binary_type_request(type_id)?, parse_binary_type_response)
            .await
    }

    async fn put_binary_type(&self, descriptor: &BinaryTypeDescriptor) -> Result<()> {
        self.request(put_binary_type_request(descriptor)?).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NodeAddress;
    use std::time::Duration;

    #[tokio::test]
    async fn test_connect_to_unreachable_cluster() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let config = ClientConfig::builder()
            .add_address(NodeAddress::new("127.0.0.1", port))
            .connection_timeout(Duration::from_millis(500))
            .build()
            .unwrap();
        let err = IgniteClient::connect(config).await.unwrap_err();
        assert!(matches!(err, IgniteError::Reconnect(_)));
    }

    #[test]
    fn test_client_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<IgniteClient>();
    }
}
