//! Partition topology model.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use uuid::Uuid;

use super::partition::partition_for_hash;

/// Affinity topology version. Versions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct TopologyVersion {
    /// Incremented when nodes join or leave.
    pub major: i64,
    /// Incremented on partition reassignment within one major version.
    pub minor: i32,
}

impl TopologyVersion {
    /// Creates a version.
    pub const fn new(major: i64, minor: i32) -> Self {
        Self { major, minor }
    }

    /// Returns the version as a `(major, minor)` pair.
    pub fn as_tuple(&self) -> (i64, i32) {
        (self.major, self.minor)
    }
}

impl fmt::Display for TopologyVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Affinity key configuration of one cache: key type id → affinity field id.
pub type AffinityKeyConfig = HashMap<i32, i32>;

/// Partition ownership of one applicability group.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NodeMap {
    nodes: HashMap<Uuid, Vec<i32>>,
    owners: Vec<Option<Uuid>>,
}

impl NodeMap {
    /// Builds a map from `(node, partitions)` pairs.
    pub fn new<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (Uuid, Vec<i32>)>,
    {
        let nodes: HashMap<Uuid, Vec<i32>> = entries.into_iter().collect();
        let count = nodes
            .values()
            .flatten()
            .filter(|p| **p >= 0)
            .map(|p| *p as usize + 1)
            .max()
            .unwrap_or(0);
        let mut owners = vec![None; count];
        for (node, partitions) in &nodes {
            for partition in partitions.iter().filter(|p| **p >= 0) {
                owners[*partition as usize] = Some(*node);
            }
        }
        Self { nodes, owners }
    }

    /// Partitions owned by `node`, in server order.
    pub fn partitions(&self, node: &Uuid) -> Option<&[i32]> {
        self.nodes.get(node).map(Vec::as_slice)
    }

    /// Iterates over `(node, partitions)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&Uuid, &[i32])> {
        self.nodes.iter().map(|(n, p)| (n, p.as_slice()))
    }

    /// Number of nodes in the map.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of partitions the map covers.
    pub fn partition_count(&self) -> usize {
        self.owners.len()
    }

    /// Node owning `partition`.
    pub fn owner(&self, partition: i32) -> Option<Uuid> {
        usize::try_from(partition)
            .ok()
            .and_then(|p| self.owners.get(p).copied().flatten())
    }
}

/// Affinity of one cache within a topology.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheAffinity {
    cache_id: i32,
    key_config: Option<Arc<AffinityKeyConfig>>,
    node_map: Option<Arc<NodeMap>>,
}

impl CacheAffinity {
    /// An applicable entry sharing `node_map` with the rest of its group.
    pub fn applicable(cache_id: i32, key_config: Arc<AffinityKeyConfig>, node_map: Arc<NodeMap>) -> Self {
        Self {
            cache_id,
            key_config: Some(key_config),
            node_map: Some(node_map),
        }
    }

    /// An entry for a cache without affinity-aware distribution.
    pub fn inapplicable(cache_id: i32) -> Self {
        Self {
            cache_id,
            key_config: None,
            node_map: None,
        }
    }

    /// Cache id.
    pub fn cache_id(&self) -> i32 {
        self.cache_id
    }

    /// Returns `false` when callers must fall back to non-affinity routing.
    pub fn is_applicable(&self) -> bool {
        self.node_map.is_some()
    }

    /// Key type id → affinity key field id.
    pub fn key_config(&self) -> Option<&Arc<AffinityKeyConfig>> {
        self.key_config.as_ref()
    }

    /// Partition ownership, shared with every cache of the same group.
    pub fn node_map(&self) -> Option<&Arc<NodeMap>> {
        self.node_map.as_ref()
    }

    /// Node owning `partition`.
    pub fn node_for_partition(&self, partition: i32) -> Option<Uuid> {
        self.node_map.as_ref().and_then(|m| m.owner(partition))
    }

    /// Node owning the partition of a key with the given hash.
    pub fn node_for_hash(&self, hash: i32) -> Option<Uuid> {
        let map = self.node_map.as_ref()?;
        let partition = partition_for_hash(hash, map.partition_count())?;
        map.owner(partition)
    }
}

/// Partition topology of a set of caches at one version.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PartitionTopology {
    version: TopologyVersion,
    caches: HashMap<i32, CacheAffinity>,
}

impl PartitionTopology {
    /// Creates a topology from per-cache entries.
    pub fn new<I>(version: TopologyVersion, caches: I) -> Self
    where
        I: IntoIterator<Item = CacheAffinity>,
    {
        Self {
            version,
            caches: caches.into_iter().map(|c| (c.cache_id, c)).collect(),
        }
    }

    /// Topology version the server reported.
    pub fn version(&self) -> TopologyVersion {
        self.version
    }

    /// Entry for `cache_id`.
    pub fn get(&self, cache_id: i32) -> Option<&CacheAffinity> {
        self.caches.get(&cache_id)
    }

    /// Iterates over all entries.
    pub fn caches(&self) -> impl Iterator<Item = &CacheAffinity> {
        self.caches.values()
    }

    /// Number of cache entries.
    pub fn len(&self) -> usize {
        self.caches.len()
    }

    /// Returns `true` if no cache is described.
    pub fn is_empty(&self) -> bool {
        self.caches.is_empty()
    }

    /// Node owning `partition` of `cache_id`.
    pub fn node_for_partition(&self, cache_id: i32, partition: i32) -> Option<Uuid> {
        self.get(cache_id).and_then(|c| c.node_for_partition(partition))
    }

    /// Merges `other` into this topology, keeping the newer version.
    pub fn merge(&mut self, other: PartitionTopology) {
        self.version = self.version.max(other.version);
        self.caches.extend(other.caches);
    }
}
