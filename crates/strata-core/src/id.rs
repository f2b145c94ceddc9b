//! Strongly-typed identifiers for nodes and partitions.

use std::fmt;

/// Mesh-wide identifier of a node, independent of how the mesh is split.
///
/// Local node indices change with the partition count; `GlobalId` does
/// not. Checksums and cross-run comparisons are keyed by it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GlobalId(pub u64);

impl GlobalId {
    /// The id as a `usize`, for indexing tables of all nodes.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for GlobalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for GlobalId {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

/// Identifies one cooperating partition of a decomposed mesh.
///
/// Partitions are numbered `0..size` and play the role of MPI ranks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PartitionId(pub u32);

impl PartitionId {
    /// The partition index as a `usize`, for indexing per-partition tables.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for PartitionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for PartitionId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partition_index_matches_raw_value() {
        assert_eq!(PartitionId(3).index(), 3);
        assert_eq!(PartitionId::from(7), PartitionId(7));
    }

    #[test]
    fn ids_order_by_raw_value() {
        assert!(GlobalId(2) < GlobalId(10));
        assert!(PartitionId(0) < PartitionId(1));
        assert_eq!(GlobalId(42).to_string(), "42");
    }
}
