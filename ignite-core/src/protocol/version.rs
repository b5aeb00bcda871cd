//! Protocol version negotiated during the handshake.

use std::fmt;

/// A thin client protocol version `(major, minor, patch)`.
///
/// Versions order lexicographically, so feature gates are plain comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProtocolVersion {
    /// Major component.
    pub major: i16,
    /// Minor component.
    pub minor: i16,
    /// Patch component.
    pub patch: i16,
}

impl ProtocolVersion {
    /// Version 1.2.0, the oldest version this client speaks.
    pub const V1_2_0: Self = Self::new(1, 2, 0);
    /// Version 1.4.0: response flags, node ids in handshake, partition awareness.
    pub const V1_4_0: Self = Self::new(1, 4, 0);
    /// Version 1.7.0: feature bitmaps in the handshake.
    pub const V1_7_0: Self = Self::new(1, 7, 0);

    /// The version offered first when connecting.
    pub const LATEST: Self = Self::V1_7_0;

    /// Creates a version from its components.
    pub const fn new(major: i16, minor: i16, patch: i16) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Returns `true` if responses carry a flags field instead of a status code.
    pub fn has_response_flags(&self) -> bool {
        *self >= Self::V1_4_0
    }

    /// Returns `true` if the server can report partition mappings.
    pub fn supports_partition_awareness(&self) -> bool {
        *self >= Self::V1_4_0
    }

    /// Returns `true` if the handshake exchanges feature bitmaps.
    pub fn has_feature_flags(&self) -> bool {
        *self >= Self::V1_7_0
    }
}

impl Default for ProtocolVersion {
    fn default() -> Self {
        Self::LATEST
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl From<(i16, i16, i16)> for ProtocolVersion {
    fn from((major, minor, patch): (i16, i16, i16)) -> Self {
        Self::new(major, minor, patch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_ordering() {
        assert!(ProtocolVersion::new(1, 4, 0) > ProtocolVersion::new(1, 3, 9));
        assert!(ProtocolVersion::new(2, 0, 0) > ProtocolVersion::new(1, 7, 0));
        assert!(ProtocolVersion::new(1, 4, 1) > ProtocolVersion::V1_4_0);
    }

    #[test]
    fn test_feature_gates() {
        let old = ProtocolVersion::new(1, 3, 0);
        assert!(!old.has_response_flags());
        assert!(!old.supports_partition_awareness());

        assert!(ProtocolVersion::V1_4_0.supports_partition_awareness());
        assert!(!ProtocolVersion::V1_4_0.has_feature_flags());
        assert!(ProtocolVersion::V1_7_0.has_feature_flags());
    }

    #[test]
    fn test_display() {
        assert_eq!(ProtocolVersion::new(1, 7, 0).to_string(), "1.7.0");
    }
}
