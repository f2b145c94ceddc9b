//! Error types for the Strata gradient benchmark.
//!
//! Organized by subsystem: mesh construction, kernel preconditions,
//! partition-to-partition transport, and the halo exchange protocol.
//! Every variant is fatal to the run that raised it; nothing here is
//! meant to be retried.

use std::error::Error;
use std::fmt;

use crate::id::PartitionId;

/// Errors detected while assembling or validating a mesh.
///
/// Raised at setup, before any iteration runs.
#[derive(Clone, Debug, PartialEq)]
pub enum MeshError {
    /// Two arrays that must describe the same entities disagree in length.
    LengthMismatch {
        /// Which array was the wrong size.
        what: &'static str,
        /// Length implied by the rest of the mesh.
        expected: usize,
        /// Length actually supplied.
        found: usize,
    },
    /// An edge references a node index outside the node table.
    EndpointOutOfRange {
        /// The offending edge.
        edge: usize,
        /// The out-of-range node index.
        node: u32,
        /// Number of nodes in the mesh.
        node_count: usize,
    },
    /// An edge has the same node at both ends.
    DegenerateEdge {
        /// The offending edge.
        edge: usize,
        /// The repeated endpoint.
        node: u32,
    },
    /// A dual volume is zero, negative, or not finite.
    NonPositiveVolume {
        /// The offending node.
        node: usize,
        /// The supplied volume.
        volume: f64,
    },
    /// A supplied node-to-edge incidence list disagrees with the edge table.
    IncidenceMismatch {
        /// The node whose list is wrong.
        node: usize,
        /// Description of the disagreement.
        reason: String,
    },
    /// Halo send/receive lists are inconsistent with node ownership.
    InvalidHalo {
        /// The neighbour whose lists are wrong.
        peer: PartitionId,
        /// Description of the inconsistency.
        reason: String,
    },
    /// Grid dimensions cannot produce a valid median-dual mesh.
    InvalidGrid {
        /// Description of the problem.
        reason: String,
    },
    /// The mesh cannot be split into the requested number of partitions.
    InvalidPartitionCount {
        /// Requested partition count.
        parts: usize,
        /// Number of nodes available to distribute.
        nodes: usize,
    },
    /// Two nodes carry the same global id.
    DuplicateGlobalId {
        /// The repeated id.
        id: u64,
    },
    /// The mesh has no nodes.
    EmptyMesh,
    /// A node or edge count does not fit the 32-bit index type.
    IndexOverflow {
        /// The value that overflowed.
        value: usize,
    },
}

impl fmt::Display for MeshError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LengthMismatch {
                what,
                expected,
                found,
            } => write!(f, "{what} has length {found}, expected {expected}"),
            Self::EndpointOutOfRange {
                edge,
                node,
                node_count,
            } => write!(
                f,
                "edge {edge} references node {node}, mesh has {node_count} nodes"
            ),
            Self::DegenerateEdge { edge, node } => {
                write!(f, "edge {edge} has node {node} at both ends")
            }
            Self::NonPositiveVolume { node, volume } => {
                write!(f, "node {node} has dual volume {volume}, must be finite and > 0")
            }
            Self::IncidenceMismatch { node, reason } => {
                write!(f, "incidence list of node {node}: {reason}")
            }
            Self::InvalidHalo { peer, reason } => {
                write!(f, "halo lists for partition {peer}: {reason}")
            }
            Self::InvalidGrid { reason } => write!(f, "invalid grid: {reason}"),
            Self::InvalidPartitionCount { parts, nodes } => {
                write!(f, "cannot split {nodes} nodes into {parts} partitions")
            }
            Self::DuplicateGlobalId { id } => write!(f, "global id {id} appears twice"),
            Self::EmptyMesh => write!(f, "mesh must have at least one node"),
            Self::IndexOverflow { value } => {
                write!(f, "count {value} exceeds u32::MAX")
            }
        }
    }
}

impl Error for MeshError {}

/// Precondition failures of the gradient kernel.
///
/// The kernel is pure computation over validated inputs; these are
/// configuration errors surfaced before any work is done.
#[derive(Clone, Debug, PartialEq)]
pub enum KernelError {
    /// A field, gradient, or scratch buffer does not match the mesh shape.
    ShapeMismatch {
        /// Which buffer was the wrong shape.
        what: &'static str,
        /// Size implied by the mesh and level count.
        expected: usize,
        /// Size actually supplied.
        found: usize,
    },
    /// The vertical column height is not finite and positive.
    InvalidColumnHeight {
        /// The supplied height.
        value: f64,
    },
    /// The spacing between vertical levels is not finite and positive.
    InvalidLevelSpacing {
        /// The supplied spacing.
        dz: f64,
    },
    /// The field has no vertical levels.
    NoLevels,
}

impl fmt::Display for KernelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ShapeMismatch {
                what,
                expected,
                found,
            } => write!(f, "{what} has size {found}, expected {expected}"),
            Self::InvalidColumnHeight { value } => {
                write!(f, "column height must be finite and positive, got {value}")
            }
            Self::InvalidLevelSpacing { dz } => {
                write!(f, "level spacing must be finite and positive, got {dz}")
            }
            Self::NoLevels => write!(f, "field must have at least one vertical level"),
        }
    }
}

impl Error for KernelError {}

/// Transport failures between partitions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommError {
    /// The peer partition has gone away (its end of the channel closed).
    Disconnected {
        /// The unreachable peer.
        peer: PartitionId,
    },
    /// There is no channel to the requested peer.
    NoRoute {
        /// The requested peer.
        peer: PartitionId,
    },
    /// A partition tried to send a point-to-point message to itself.
    SelfMessage,
}

impl fmt::Display for CommError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected { peer } => write!(f, "partition {peer} disconnected"),
            Self::NoRoute { peer } => write!(f, "no route to partition {peer}"),
            Self::SelfMessage => write!(f, "point-to-point message addressed to self"),
        }
    }
}

impl Error for CommError {}

/// Failures of the halo exchange protocol.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExchangeError {
    /// At setup, a neighbour announced a different send count than the
    /// local receive list expects.
    TopologyMismatch {
        /// The neighbour.
        peer: PartitionId,
        /// Length of the local receive list.
        expected: usize,
        /// Node count the neighbour will send.
        announced: usize,
    },
    /// A received buffer does not match the receive list it fills.
    SizeMismatch {
        /// The neighbour that sent the buffer.
        peer: PartitionId,
        /// Expected buffer length in values.
        expected: usize,
        /// Actual buffer length in values.
        found: usize,
    },
    /// The gradient field does not match the level count the exchange was
    /// set up for.
    LevelMismatch {
        /// Levels the exchange was set up for.
        expected: usize,
        /// Levels of the supplied gradient.
        found: usize,
    },
    /// The gradient field does not have the node count the exchange was
    /// set up for.
    NodeMismatch {
        /// Nodes of the mesh the exchange was set up for.
        expected: usize,
        /// Nodes of the supplied gradient.
        found: usize,
    },
    /// The transport failed mid-exchange.
    Comm(CommError),
}

impl fmt::Display for ExchangeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TopologyMismatch {
                peer,
                expected,
                announced,
            } => write!(
                f,
                "partition {peer} will send {announced} nodes, receive list holds {expected}"
            ),
            Self::SizeMismatch {
                peer,
                expected,
                found,
            } => write!(
                f,
                "buffer from partition {peer} has {found} values, expected {expected}"
            ),
            Self::LevelMismatch { expected, found } => {
                write!(f, "gradient has {found} levels, exchange expects {expected}")
            }
            Self::NodeMismatch { expected, found } => {
                write!(f, "gradient has {found} nodes, exchange expects {expected}")
            }
            Self::Comm(e) => write!(f, "transport: {e}"),
        }
    }
}

impl Error for ExchangeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Comm(e) => Some(e),
            _ => None,
        }
    }
}

impl From<CommError> for ExchangeError {
    fn from(e: CommError) -> Self {
        Self::Comm(e)
    }
}
