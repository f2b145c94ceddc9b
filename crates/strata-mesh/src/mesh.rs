//! The immutable mesh: nodes, edges, dual geometry, incidence, halo.
//!
//! [`MeshParts`] is the contract with whatever built the mesh (a grid
//! generator, a partitioner, a file reader). [`Mesh::new`] validates it
//! once; afterwards the mesh is read-only and is shared across worker
//! threads by reference.

use std::collections::HashSet;

use strata_core::{GlobalId, MeshError, PartitionId};

use crate::halo::HaloTopology;
use crate::incidence::Incidence;

/// Raw mesh arrays as supplied by a mesh builder.
///
/// Node arrays (`global_ids`, `owners`, `lonlat`, `dual_volumes`) are
/// indexed by local node; edge arrays (`edges`, `dual_normals`,
/// `pole_edges`) by local edge.
#[derive(Clone, Debug, Default)]
pub struct MeshParts {
    /// The partition this mesh belongs to.
    pub partition: PartitionId,
    /// Mesh-wide id of each node.
    pub global_ids: Vec<GlobalId>,
    /// Owning partition of each node. Nodes owned elsewhere are ghosts.
    pub owners: Vec<PartitionId>,
    /// `(lon, lat)` of each node, radians.
    pub lonlat: Vec<[f64; 2]>,
    /// Dual (control) volume of each node.
    pub dual_volumes: Vec<f64>,
    /// `(first, second)` endpoints of each edge.
    pub edges: Vec<[u32; 2]>,
    /// `(Sx, Sy)` dual normal of each edge, oriented from first to second.
    pub dual_normals: Vec<[f64; 2]>,
    /// Whether each edge crosses a pole singularity.
    pub pole_edges: Vec<bool>,
    /// Per-node incident edge lists in summation order. Derived from
    /// `edges` when `None`.
    pub incidence: Option<Vec<Vec<u32>>>,
    /// Send/receive lists per neighbouring partition.
    pub halo: HaloTopology,
}

impl MeshParts {
    /// Parts of an undecomposed mesh: partition 0 owns every node,
    /// global ids are `0..n`, and there is no halo.
    pub fn undecomposed(
        lonlat: Vec<[f64; 2]>,
        dual_volumes: Vec<f64>,
        edges: Vec<[u32; 2]>,
        dual_normals: Vec<[f64; 2]>,
        pole_edges: Vec<bool>,
    ) -> Self {
        let n = lonlat.len();
        Self {
            partition: PartitionId(0),
            global_ids: (0..n as u64).map(GlobalId).collect(),
            owners: vec![PartitionId(0); n],
            lonlat,
            dual_volumes,
            edges,
            dual_normals,
            pole_edges,
            incidence: None,
            halo: HaloTopology::new(),
        }
    }
}

/// Validated, immutable median-dual mesh of one partition.
#[derive(Clone, Debug)]
pub struct Mesh {
    partition: PartitionId,
    global_ids: Vec<GlobalId>,
    owners: Vec<PartitionId>,
    owned: Vec<bool>,
    owned_count: usize,
    lonlat: Vec<[f64; 2]>,
    dual_volumes: Vec<f64>,
    edges: Vec<[u32; 2]>,
    dual_normals: Vec<[f64; 2]>,
    is_pole: Vec<bool>,
    pole_edges: Vec<u32>,
    incidence: Incidence,
    halo: HaloTopology,
}

fn check_len(what: &'static str, expected: usize, found: usize) -> Result<(), MeshError> {
    if expected != found {
        return Err(MeshError::LengthMismatch {
            what,
            expected,
            found,
        });
    }
    Ok(())
}

impl Mesh {
    /// Validate `parts` and build the mesh.
    ///
    /// Checks array lengths, index ranges, distinct edge endpoints,
    /// positive dual volumes, unique global ids, supplied incidence lists,
    /// and halo lists against ownership. Derives incidence and the
    /// ascending pole-edge list.
    pub fn new(parts: MeshParts) -> Result<Self, MeshError> {
        let MeshParts {
            partition,
            global_ids,
            owners,
            lonlat,
            dual_volumes,
            edges,
            dual_normals,
            pole_edges,
            incidence,
            halo,
        } = parts;

        let n = global_ids.len();
        if n == 0 {
            return Err(MeshError::EmptyMesh);
        }
        if n > u32::MAX as usize {
            return Err(MeshError::IndexOverflow { value: n });
        }
        if edges.len() > u32::MAX as usize {
            return Err(MeshError::IndexOverflow { value: edges.len() });
        }
        check_len("owners", n, owners.len())?;
        check_len("lonlat", n, lonlat.len())?;
        check_len("dual_volumes", n, dual_volumes.len())?;
        check_len("dual_normals", edges.len(), dual_normals.len())?;
        check_len("pole_edges", edges.len(), pole_edges.len())?;

        for (node, &volume) in dual_volumes.iter().enumerate() {
            if !volume.is_finite() || volume <= 0.0 {
                return Err(MeshError::NonPositiveVolume { node, volume });
            }
        }

        let mut seen = HashSet::with_capacity(n);
        for id in &global_ids {
            if !seen.insert(*id) {
                return Err(MeshError::DuplicateGlobalId { id: id.0 });
            }
        }

        for (edge, &[a, b]) in edges.iter().enumerate() {
            for node in [a, b] {
                if node as usize >= n {
                    return Err(MeshError::EndpointOutOfRange {
                        edge,
                        node,
                        node_count: n,
                    });
                }
            }
            if a == b {
                return Err(MeshError::DegenerateEdge { edge, node: a });
            }
        }

        let incidence = match incidence {
            Some(lists) => {
                check_len("incidence", n, lists.len())?;
                Incidence::from_lists(&lists, &edges)?
            }
            None => Incidence::derive(n, &edges),
        };

        halo.validate(partition, &owners)?;

        let owned: Vec<bool> = owners.iter().map(|&o| o == partition).collect();
        let owned_count = owned.iter().filter(|&&o| o).count();
        let pole_list: Vec<u32> = pole_edges
            .iter()
            .enumerate()
            .filter(|(_, &p)| p)
            .map(|(e, _)| e as u32)
            .collect();

        log::debug!(
            "partition {partition}: mesh with {n} nodes ({owned_count} owned), {} edges ({} pole), {} neighbours",
            edges.len(),
            pole_list.len(),
            halo.len(),
        );

        Ok(Self {
            partition,
            global_ids,
            owners,
            owned,
            owned_count,
            lonlat,
            dual_volumes,
            edges,
            dual_normals,
            is_pole: pole_edges,
            pole_edges: pole_list,
            incidence,
            halo,
        })
    }

    /// The partition this mesh belongs to.
    pub fn partition(&self) -> PartitionId {
        self.partition
    }

    /// Number of local nodes, owned and ghost.
    pub fn node_count(&self) -> usize {
        self.global_ids.len()
    }

    /// Number of nodes owned by this partition.
    pub fn owned_count(&self) -> usize {
        self.owned_count
    }

    /// Number of ghost nodes.
    pub fn ghost_count(&self) -> usize {
        self.node_count() - self.owned_count
    }

    /// Number of local edges.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Global id of a local node.
    pub fn global_id(&self, node: usize) -> GlobalId {
        self.global_ids[node]
    }

    /// Global ids of all local nodes.
    pub fn global_ids(&self) -> &[GlobalId] {
        &self.global_ids
    }

    /// Owning partition of a local node.
    pub fn owner(&self, node: usize) -> PartitionId {
        self.owners[node]
    }

    /// `true` if this partition computes `node`; `false` for ghosts.
    pub fn is_owned(&self, node: usize) -> bool {
        self.owned[node]
    }

    /// `(lon, lat)` of a node, radians.
    pub fn lonlat(&self, node: usize) -> [f64; 2] {
        self.lonlat[node]
    }

    /// Dual volume of a node.
    pub fn dual_volume(&self, node: usize) -> f64 {
        self.dual_volumes[node]
    }

    /// `(first, second)` endpoints of an edge.
    pub fn edge(&self, edge: usize) -> [u32; 2] {
        self.edges[edge]
    }

    /// All edges.
    pub fn edges(&self) -> &[[u32; 2]] {
        &self.edges
    }

    /// `(Sx, Sy)` dual normal of an edge.
    pub fn dual_normal(&self, edge: usize) -> [f64; 2] {
        self.dual_normals[edge]
    }

    /// Whether an edge crosses a pole.
    pub fn is_pole_edge(&self, edge: usize) -> bool {
        self.is_pole[edge]
    }

    /// Pole edges in ascending order.
    pub fn pole_edges(&self) -> &[u32] {
        &self.pole_edges
    }

    /// Node-to-edge incidence.
    pub fn incidence(&self) -> &Incidence {
        &self.incidence
    }

    /// Per-neighbour halo lists.
    pub fn halo(&self) -> &HaloTopology {
        &self.halo
    }
}
