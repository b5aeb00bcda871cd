//! Affinity: partition topology, its wire messages and partition math.

mod messages;
mod partition;
mod topology;

pub use messages::{parse_partitions_response, partitions_request, partitions_response_descriptor};
pub use partition::{partition_for_hash, MAX_PARTITIONS};
pub use topology::{AffinityKeyConfig, CacheAffinity, NodeMap, PartitionTopology, TopologyVersion};
