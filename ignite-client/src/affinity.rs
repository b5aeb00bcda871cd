//! Cached partition topology used for affinity routing.

use ignite_core::affinity::{CacheAffinity, PartitionTopology, TopologyVersion};
use ignite_core::{IgniteError, Result};
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Default)]
struct AffinityState {
    topology: Option<PartitionTopology>,
    // Highest version seen in a topology or a response header.
    floor: Option<TopologyVersion>,
}

/// Last known partition topology, versioned.
///
/// Read-only with respect to the pool: it only informs which node a keyed
/// request should go to.
#[derive(Debug, Default)]
pub struct AffinityMap {
    state: RwLock<AffinityState>,
}

impl AffinityMap {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Version of the cached topology, if any.
    pub async fn version(&self) -> Option<TopologyVersion> {
        self.state.read().await.topology.as_ref().map(PartitionTopology::version)
    }

    /// Stores a freshly fetched topology.
    ///
    /// A topology older than what was already seen is discarded with
    /// [`IgniteError::StaleTopology`]. One at the cached version is merged
    /// into the cache; a newer one replaces it.
    pub async fn update(&self, topology: PartitionTopology) -> Result<()> {
        let mut state = self.state.write().await;
        let received = topology.version();

        if let Some(floor) = state.floor {
            if received < floor {
                return Err(IgniteError::StaleTopology {
                    cached: floor.as_tuple(),
                    received: received.as_tuple(),
                });
            }
        }
        state.floor = Some(received);

        match state.topology.as_mut() {
            Some(cached) if cached.version() == received => cached.merge(topology),
            _ => state.topology = Some(topology),
        }
        Ok(())
    }

    /// Notes a topology version carried by a response header.
    ///
    /// A version newer than the cache drops the cached topology so the next
    /// routed call fetches it again. Returns `true` if the cache was dropped.
    pub async fn observe(&self, version: TopologyVersion) -> bool {
        let mut state = self.state.write().await;
        if state.floor.is_some_and(|floor| version <= floor) {
            return false;
        }
        state.floor = Some(version);
        let dropped = state.topology.take().is_some();
        if dropped {
            tracing::debug!(version = %version, "affinity topology changed, cache invalidated");
        }
        dropped
    }

    /// Cached entry for `cache_id`.
    pub async fn get(&self, cache_id: i32) -> Option<CacheAffinity> {
        let state = self.state.read().await;
        state.topology.as_ref()?.get(cache_id).cloned()
    }

    /// Node owning the key with `key_hash` in `cache_id`.
    ///
    /// `None` if the cache is not cached, not applicable, or the partition has
    /// no owner.
    pub async fn node_for_key(&self, cache_id: i32, key_hash: i32) -> Option<Uuid> {
        self.get(cache_id).await?.node_for_hash(key_hash)
    }

    /// Node owning `partition` of `cache_id`.
    pub async fn node_for_partition(&self, cache_id: i32, partition: i32) -> Option<Uuid> {
        self.get(cache_id).await?.node_for_partition(partition)
    }

    /// Drops the cached topology, keeping the version floor.
    pub async fn invalidate(&self) {
        self.state.write().await.topology = None;
    }
}
