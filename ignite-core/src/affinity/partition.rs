//! Key hash to partition mapping (rendezvous affinity).

/// Upper bound on the partition count of a cache.
pub const MAX_PARTITIONS: i32 = 65_536;

/// Maps a key hash to a partition out of `partitions`.
///
/// Power-of-two partition counts use a mask over the hash folded with its
/// upper half; other counts use `|hash % partitions|`. Returns `None` for an
/// empty or out-of-range partition count.
pub fn partition_for_hash(hash: i32, partitions: usize) -> Option<i32> {
    if partitions == 0 {
        return None;
    }
    let parts = i32::try_from(partitions).ok()?;
    if partitions.is_power_of_two() {
        let mask = parts - 1;
        let folded = hash ^ ((hash as u32) >> 16) as i32;
        Some(folded & mask)
    } else {
        Some((hash % parts).abs())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_power_of_two_uses_mask() {
        assert_eq!(partition_for_hash(5, 1024), Some(5));
        // 0x0001_0003 folds to 0x0001_0002, masked to 2
        assert_eq!(partition_for_hash(0x0001_0003, 4), Some(2));
    }

    #[test]
    fn test_negative_hash_power_of_two() {
        let p = partition_for_hash(-1, 1024).unwrap();
        assert!((0..1024).contains(&p));
    }

    #[test]
    fn test_non_power_of_two_uses_modulo() {
        assert_eq!(partition_for_hash(10, 3), Some(1));
        assert_eq!(partition_for_hash(-10, 3), Some(1));
    }

    #[test]
    fn test_zero_partitions() {
        assert_eq!(partition_for_hash(1, 0), None);
    }
}
