//! Reusable fixture meshes.
//!
//! - [`pole_mesh`]: three nodes, one ordinary edge pair and one pole edge
//! - [`grid24`]: the 6 × 4 lon-lat mesh (24 nodes, 48 edges)
//! - [`grid`]: any lon-lat mesh on the Earth sphere

use strata_core::{GlobalId, PartitionId};
use strata_mesh::{partition_blocks, HaloTopology, LonLatGrid, Mesh, MeshParts};

/// Three nodes with unit-ish volumes and one pole edge.
///
/// ```text
/// edge 0: 0 -> 1  S = (1, 0)
/// edge 1: 1 -> 2  S = (0, -1)
/// edge 2: 0 -> 2  S = (0, 1.5)  pole
/// volumes: 1, 1, 2
/// ```
pub fn pole_mesh() -> Mesh {
    let parts = MeshParts {
        partition: PartitionId(0),
        global_ids: (0..3).map(GlobalId).collect(),
        owners: vec![PartitionId(0); 3],
        lonlat: vec![[0.0, 1.4], [0.0, 1.2], [3.1, 1.4]],
        dual_volumes: vec![1.0, 1.0, 2.0],
        edges: vec![[0, 1], [1, 2], [0, 2]],
        dual_normals: vec![[1.0, 0.0], [0.0, -1.0], [0.0, 1.5]],
        pole_edges: vec![false, false, true],
        incidence: None,
        halo: HaloTopology::new(),
    };
    match Mesh::new(parts) {
        Ok(mesh) => mesh,
        Err(e) => panic!("pole fixture is invalid: {e}"),
    }
}

/// A lon-lat mesh of `nlon × nlat` nodes.
pub fn grid(nlon: usize, nlat: usize) -> Mesh {
    LonLatGrid::new(nlon, nlat)
        .and_then(|g| g.build())
        .unwrap_or_else(|e| panic!("grid {nlon}x{nlat}: {e}"))
}

/// The 24-node lon-lat mesh.
pub fn grid24() -> Mesh {
    grid(6, 4)
}

/// [`grid24`] split into `parts` partitions.
pub fn grid24_partitions(parts: usize) -> Vec<Mesh> {
    partition_blocks(&grid24(), parts).unwrap_or_else(|e| panic!("split into {parts}: {e}"))
}
