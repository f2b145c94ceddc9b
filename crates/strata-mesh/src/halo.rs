//! Per-neighbour halo send/receive lists.
//!
//! A partition's ghost nodes are read-only replicas of nodes owned by a
//! neighbour. For each neighbour the topology holds:
//!
//! - `send`: owned local nodes whose values the neighbour replicates
//! - `recv`: ghost local nodes owned by the neighbour, to be filled
//!
//! The `send` list of partition A for B and the `recv` list of B for A
//! describe the same nodes in the same order. Neighbours iterate in
//! ascending partition order.

use indexmap::IndexMap;
use strata_core::{MeshError, PartitionId};

/// Send and receive lists for one neighbour.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HaloLists {
    /// Owned local node indices whose values this neighbour needs.
    pub send: Vec<u32>,
    /// Ghost local node indices this neighbour fills.
    pub recv: Vec<u32>,
}

/// Halo topology of one partition: lists per neighbour.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HaloTopology {
    neighbours: IndexMap<PartitionId, HaloLists>,
}

impl HaloTopology {
    /// An empty topology (a partition with no neighbours).
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the lists for `peer`, replacing any previous entry.
    pub fn insert(&mut self, peer: PartitionId, lists: HaloLists) {
        self.neighbours.insert(peer, lists);
        self.neighbours.sort_keys();
    }

    /// Lists for `peer`, if it is a neighbour.
    pub fn get(&self, peer: PartitionId) -> Option<&HaloLists> {
        self.neighbours.get(&peer)
    }

    /// Neighbours and their lists, ascending by partition.
    pub fn iter(&self) -> impl Iterator<Item = (PartitionId, &HaloLists)> {
        self.neighbours.iter().map(|(p, l)| (*p, l))
    }

    /// Number of neighbours.
    pub fn len(&self) -> usize {
        self.neighbours.len()
    }

    /// `true` if the partition has no neighbours.
    pub fn is_empty(&self) -> bool {
        self.neighbours.is_empty()
    }

    /// Total number of ghost slots filled by the exchange.
    pub fn recv_count(&self) -> usize {
        self.neighbours.values().map(|l| l.recv.len()).sum()
    }

    /// Total number of node blocks sent per exchange.
    pub fn send_count(&self) -> usize {
        self.neighbours.values().map(|l| l.send.len()).sum()
    }

    /// Check the lists against node ownership.
    ///
    /// Every send entry must be owned by `partition`; every receive entry
    /// must be a ghost owned by that neighbour; every ghost node must be
    /// received exactly once.
    pub(crate) fn validate(
        &self,
        partition: PartitionId,
        owners: &[PartitionId],
    ) -> Result<(), MeshError> {
        let mut received = vec![false; owners.len()];

        for (peer, lists) in self.iter() {
            if peer == partition {
                return Err(MeshError::InvalidHalo {
                    peer,
                    reason: "partition lists itself as a neighbour".to_string(),
                });
            }
            for &n in &lists.send {
                match owners.get(n as usize) {
                    Some(&owner) if owner == partition => {}
                    Some(&owner) => {
                        return Err(MeshError::InvalidHalo {
                            peer,
                            reason: format!("send node {n} is owned by partition {owner}"),
                        })
                    }
                    None => {
                        return Err(MeshError::InvalidHalo {
                            peer,
                            reason: format!("send node {n} out of range"),
                        })
                    }
                }
            }
            for &n in &lists.recv {
                match owners.get(n as usize) {
                    Some(&owner) if owner == peer => {}
                    Some(&owner) => {
                        return Err(MeshError::InvalidHalo {
                            peer,
                            reason: format!("receive node {n} is owned by partition {owner}"),
                        })
                    }
                    None => {
                        return Err(MeshError::InvalidHalo {
                            peer,
                            reason: format!("receive node {n} out of range"),
                        })
                    }
                }
                if std::mem::replace(&mut received[n as usize], true) {
                    return Err(MeshError::InvalidHalo {
                        peer,
                        reason: format!("ghost node {n} is received twice"),
                    });
                }
            }
        }

        for (n, &owner) in owners.iter().enumerate() {
            if owner != partition && !received[n] {
                return Err(MeshError::InvalidHalo {
                    peer: owner,
                    reason: format!("ghost node {n} is never received"),
                });
            }
        }
        Ok(())
    }
}
