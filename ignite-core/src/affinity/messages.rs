//! Partition topology query.

use std::collections::HashMap;
use std::sync::Arc;

use super::partition::MAX_PARTITIONS;
use super::topology::{AffinityKeyConfig, CacheAffinity, NodeMap, PartitionTopology, TopologyVersion};
use crate::error::{IgniteError, Result};
use crate::protocol::{Request, OP_CACHE_PARTITIONS};
use crate::serialization::ObjectDataInput;
use crate::wire::{decode, encode, field, Descriptor, Record, Value};

fn is_applicable(record: &Record) -> bool {
    matches!(record.get("is_applicable"), Some(Value::Bool(true)))
}

fn request_descriptor() -> Descriptor {
    Descriptor::struct_array(vec![field("cache_id", Descriptor::INT)])
}

/// Layout of the partition topology response payload.
pub fn partitions_response_descriptor() -> Descriptor {
    let cache_mapping = Descriptor::conditional(
        is_applicable,
        Descriptor::struct_array(vec![
            field("cache_id", Descriptor::INT),
            field(
                "cache_config",
                Descriptor::struct_array(vec![
                    field("key_type_id", Descriptor::INT),
                    field("affinity_key_field_id", Descriptor::INT),
                ]),
            ),
        ]),
        Descriptor::struct_array(vec![field("cache_id", Descriptor::INT)]),
    );
    let node_mapping = Descriptor::conditional(
        is_applicable,
        Descriptor::struct_array(vec![
            field("node_uuid", Descriptor::UUID_OBJECT),
            field(
                "node_partitions",
                Descriptor::struct_array(vec![field("partition_id", Descriptor::INT)]),
            ),
        ]),
        Descriptor::structure(vec![]),
    );
    Descriptor::structure(vec![
        field("version_major", Descriptor::LONG),
        field("version_minor", Descriptor::INT),
        field(
            "partition_mapping",
            Descriptor::struct_array(vec![
                field("is_applicable", Descriptor::BOOL),
                field("cache_mapping", cache_mapping),
                field("node_mapping", node_mapping),
            ]),
        ),
    ])
}

/// Builds a partition topology query for `cache_ids` in one request.
///
/// `request_id` overrides the process-wide request counter.
pub fn partitions_request(cache_ids: &[i32], request_id: Option<i64>) -> Result<Request> {
    let ids = cache_ids
        .iter()
        .map(|id| Record::new().with("cache_id", *id))
        .collect::<Vec<_>>();
    let mut request = match request_id {
        Some(id) => Request::with_request_id(OP_CACHE_PARTITIONS, id),
        None => Request::new(OP_CACHE_PARTITIONS),
    };
    encode(&request_descriptor(), &Value::Array(ids), request.payload_mut())?;
    Ok(request)
}

/// Parses a partition topology response.
///
/// Every applicability group is expanded into one entry per cache id; all
/// caches of a group share one [`NodeMap`]. Ids in `requested` that the
/// server did not mention are reported as inapplicable.
pub fn parse_partitions_response(payload: &[u8], requested: &[i32]) -> Result<PartitionTopology> {
    let mut input = ObjectDataInput::new(payload);
    let value = decode(&partitions_response_descriptor(), &mut input)?;
    let record = value
        .as_record()
        .ok_or_else(|| IgniteError::Protocol("partition response is not a record".to_string()))?;

    let version = TopologyVersion::new(record.long("version_major")?, record.int("version_minor")?);
    let mut caches: HashMap<i32, CacheAffinity> = HashMap::new();

    for group in record.array("partition_mapping")? {
        let cache_mapping = group.array("cache_mapping")?;
        if !group.bool("is_applicable")? {
            for cache in cache_mapping {
                let cache_id = cache.int("cache_id")?;
                caches.insert(cache_id, CacheAffinity::inapplicable(cache_id));
            }
            continue;
        }

        let node_map = Arc::new(NodeMap::new(
            group
                .array("node_mapping")?
                .iter()
                .map(|node| {
                    let uuid = node.uuid_object("node_uuid")?.ok_or_else(|| {
                        IgniteError::Protocol("null node id in partition mapping".to_string())
                    })?;
                    let partitions = node
                        .array("node_partitions")?
                        .iter()
                        .map(|p| {
                            let id = p.int("partition_id")?;
                            if !(0..MAX_PARTITIONS).contains(&id) {
                                return Err(IgniteError::Protocol(format!(
                                    "partition id {} out of range",
                                    id
                                )));
                            }
                            Ok(id)
                        })
                        .collect::<Result<Vec<_>>>()?;
                    Ok((uuid, partitions))
                })
                .collect::<Result<Vec<_>>>()?,
        ));

        for cache in cache_mapping {
            let cache_id = cache.int("cache_id")?;
            let key_config = cache
                .array("cache_config")?
                .iter()
                .map(|c| Ok((c.int("key_type_id")?, c.int("affinity_key_field_id")?)))
                .collect::<Result<AffinityKeyConfig>>()?;
            caches.insert(
                cache_id,
                CacheAffinity::applicable(cache_id, Arc::new(key_config), Arc::clone(&node_map)),
            );
        }
    }

    for cache_id in requested {
        caches
            .entry(*cache_id)
            .or_insert_with(|| CacheAffinity::inapplicable(*cache_id));
    }

    Ok(PartitionTopology::new(version, caches.into_values()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serialization::{DataInput, ObjectDataOutput};
    use uuid::Uuid;

    fn group_applicable(caches: &[i32], nodes: &[(Uuid, Vec<i32>)]) -> Record {
        Record::new()
            .with("is_applicable", true)
            .with(
                "cache_mapping",
                caches
                    .iter()
                    .map(|id| {
                        Record::new().with("cache_id", *id).with(
                            "cache_config",
                            vec![Record::new()
                                .with("key_type_id", 100)
                                .with("affinity_key_field_id", 200)],
                        )
                    })
                    .collect::<Vec<_>>(),
            )
            .with(
                "node_mapping",
                nodes
                    .iter()
                    .map(|(uuid, parts)| {
                        Record::new()
                            .with("node_uuid", Value::UuidObject(Some(*uuid)))
                            .with(
                                "node_partitions",
                                parts
                                    .iter()
                                    .map(|p| Record::new().with("partition_id", *p))
                                    .collect::<Vec<_>>(),
                            )
                    })
                    .collect::<Vec<_>>(),
            )
    }

    fn group_inapplicable(caches: &[i32]) -> Record {
        Record::new()
            .with("is_applicable", false)
            .with(
                "cache_mapping",
                caches
                    .iter()
                    .map(|id| Record::new().with("cache_id", *id))
                    .collect::<Vec<_>>(),
            )
            .with("node_mapping", Record::new())
    }

    fn response(major: i64, minor: i32, groups: Vec<Record>) -> Vec<u8> {
        let value = Value::Record(
            Record::new()
                .with("version_major", major)
                .with("version_minor", minor)
                .with("partition_mapping", groups),
        );
        let mut out = ObjectDataOutput::new();
        encode(&partitions_response_descriptor(), &value, &mut out).unwrap();
        out.into_bytes()
    }

    #[test]
    fn test_request_payload() {
        let request = partitions_request(&[7, 9], None).unwrap();
        assert_eq!(request.op_code(), OP_CACHE_PARTITIONS);
        let mut input = ObjectDataInput::new(request.payload());
        assert_eq!(input.read_int().unwrap(), 2);
        assert_eq!(input.read_int().unwrap(), 7);
        assert_eq!(input.read_int().unwrap(), 9);
    }

    #[test]
    fn test_request_with_explicit_id() {
        let request = partitions_request(&[7], Some(i64::MAX)).unwrap();
        assert_eq!(request.request_id(), i64::MAX);
        let fresh = partitions_request(&[7], None).unwrap();
        assert_ne!(fresh.request_id(), i64::MAX);
    }

    #[test]
    fn test_group_expands_with_shared_node_map() {
        let node_a = Uuid::new_v4();
        let bytes = response(3, 1, vec![group_applicable(&[7, 9], &[(node_a, vec![0, 1, 2])])]);
        let topology = parse_partitions_response(&bytes, &[7, 9]).unwrap();

        assert_eq!(topology.version(), TopologyVersion::new(3, 1));
        let seven = topology.get(7).unwrap();
        let nine = topology.get(9).unwrap();
        assert!(seven.is_applicable());
        assert!(nine.is_applicable());
        assert_eq!(seven.node_map(), nine.node_map());
        assert!(Arc::ptr_eq(seven.node_map().unwrap(), nine.node_map().unwrap()));
        assert_eq!(seven.node_map().unwrap().partitions(&node_a), Some(&[0, 1, 2][..]));
        assert_eq!(seven.key_config().unwrap().get(&100), Some(&200));
        assert_eq!(topology.node_for_partition(9, 2), Some(node_a));
    }

    #[test]
    fn test_single_id_query_yields_same_map() {
        let node_a = Uuid::new_v4();
        let bytes = response(1, 0, vec![group_applicable(&[7, 9], &[(node_a, vec![0, 1, 2])])]);
        let only_nine = parse_partitions_response(&bytes, &[9]).unwrap();
        let only_seven = parse_partitions_response(&bytes, &[7]).unwrap();
        assert_eq!(
            only_nine.get(9).unwrap().node_map(),
            only_seven.get(7).unwrap().node_map()
        );
    }

    #[test]
    fn test_inapplicable_group() {
        let node_a = Uuid::new_v4();
        let bytes = response(
            2,
            0,
            vec![
                group_inapplicable(&[11]),
                group_applicable(&[7], &[(node_a, vec![0])]),
            ],
        );
        let topology = parse_partitions_response(&bytes, &[7, 11]).unwrap();
        let eleven = topology.get(11).unwrap();
        assert!(!eleven.is_applicable());
        assert!(eleven.node_map().is_none());
        assert!(eleven.key_config().is_none());
        assert!(topology.get(7).unwrap().is_applicable());
    }

    #[test]
    fn test_unreported_id_is_inapplicable() {
        let bytes = response(1, 0, vec![]);
        let topology = parse_partitions_response(&bytes, &[42]).unwrap();
        assert!(!topology.get(42).unwrap().is_applicable());
    }

    #[test]
    fn test_out_of_range_partition_rejected() {
        let node_a = Uuid::new_v4();
        let bytes = response(1, 0, vec![group_applicable(&[7], &[(node_a, vec![i32::MAX])])]);
        assert!(parse_partitions_response(&bytes, &[7]).is_err());
    }

    #[test]
    fn test_truncated_response() {
        let node_a = Uuid::new_v4();
        let bytes = response(1, 0, vec![group_applicable(&[7], &[(node_a, vec![0, 1])])]);
        assert!(matches!(
            parse_partitions_response(&bytes[..bytes.len() - 2], &[7]),
            Err(IgniteError::Protocol(_))
        ));
    }
}
