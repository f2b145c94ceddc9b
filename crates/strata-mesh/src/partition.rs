//! Deterministic block partitioner.
//!
//! Splits an undecomposed mesh into contiguous runs of global ids. Each
//! partition keeps every edge touching one of its nodes, so an owned
//! node sees exactly the edges it saw in the undecomposed mesh, in the
//! same summation order, even when the undecomposed mesh was given an
//! explicit incidence order. Ghosts keep the subset of their edges that
//! the partition holds, in the same relative order. Nodes at the far end
//! of a cut edge become ghosts.

use std::collections::HashMap;

use strata_core::{GlobalId, MeshError, PartitionId};

use crate::halo::{HaloLists, HaloTopology};
use crate::mesh::{Mesh, MeshParts};

/// Block boundaries for `nodes` items over `parts` partitions.
///
/// Returns `parts + 1` offsets; partition `p` owns `starts[p]..starts[p + 1]`.
/// Block sizes differ by at most one.
pub fn block_starts(nodes: usize, parts: usize) -> Vec<usize> {
    (0..=parts).map(|p| p * nodes / parts).collect()
}

// Edges and ghosts of one partition, in undecomposed-mesh numbering.
struct Slice {
    owned: Vec<usize>,
    edges: Vec<usize>,
    ghosts: Vec<usize>,
}

/// Split `global` into `parts` partition meshes.
///
/// Local numbering per partition: owned nodes ascending by global id,
/// then ghosts ascending by global id. Halo lists are ascending by global
/// id on both sides, so a sender's list and its peer's receive list name
/// the same nodes in the same order.
///
/// # Errors
///
/// [`MeshError::InvalidGrid`] if `global` already has ghosts,
/// [`MeshError::InvalidPartitionCount`] unless `1 <= parts <= nodes`.
pub fn partition_blocks(global: &Mesh, parts: usize) -> Result<Vec<Mesh>, MeshError> {
    let n = global.node_count();
    if global.ghost_count() != 0 {
        return Err(MeshError::InvalidGrid {
            reason: "only an undecomposed mesh can be partitioned".to_string(),
        });
    }
    if parts == 0 || parts > n {
        return Err(MeshError::InvalidPartitionCount { parts, nodes: n });
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_unstable_by_key(|&node| global.global_id(node));

    let starts = block_starts(n, parts);
    let mut owner = vec![PartitionId(0); n];
    for p in 0..parts {
        for &node in &order[starts[p]..starts[p + 1]] {
            owner[node] = PartitionId(p as u32);
        }
    }

    // Phase 1: what each partition holds.
    let slices: Vec<Slice> = (0..parts)
        .map(|p| {
            let me = PartitionId(p as u32);
            let owned = order[starts[p]..starts[p + 1]].to_vec();
            let mut edges = Vec::new();
            let mut ghosts = Vec::new();
            for (e, &[a, b]) in global.edges().iter().enumerate() {
                let (a, b) = (a as usize, b as usize);
                if owner[a] != me && owner[b] != me {
                    continue;
                }
                edges.push(e);
                for node in [a, b] {
                    if owner[node] != me {
                        ghosts.push(node);
                    }
                }
            }
            ghosts.sort_unstable_by_key(|&node| global.global_id(node));
            ghosts.dedup();
            Slice {
                owned,
                edges,
                ghosts,
            }
        })
        .collect();

    // Phase 2: renumber and build halo lists.
    let mut meshes = Vec::with_capacity(parts);
    for (p, slice) in slices.iter().enumerate() {
        let me = PartitionId(p as u32);
        let local: HashMap<usize, u32> = slice
            .owned
            .iter()
            .chain(&slice.ghosts)
            .enumerate()
            .map(|(l, &g)| (g, l as u32))
            .collect();
        let nodes: Vec<usize> = slice.owned.iter().chain(&slice.ghosts).copied().collect();
        let local_edge: HashMap<u32, u32> = slice
            .edges
            .iter()
            .enumerate()
            .map(|(l, &e)| (e as u32, l as u32))
            .collect();
        // global summation order, restricted to the edges this partition holds
        let incidence: Vec<Vec<u32>> = nodes
            .iter()
            .map(|&g| {
                global
                    .incidence()
                    .edges_of(g)
                    .iter()
                    .filter_map(|e| local_edge.get(e).copied())
                    .collect()
            })
            .collect();

        let mut halo = HaloTopology::new();
        for (q, other) in slices.iter().enumerate() {
            if q == p {
                continue;
            }
            let peer = PartitionId(q as u32);
            let recv: Vec<u32> = slice
                .ghosts
                .iter()
                .filter(|&&g| owner[g] == peer)
                .map(|g| local[g])
                .collect();
            let send: Vec<u32> = other
                .ghosts
                .iter()
                .filter(|&&g| owner[g] == me)
                .map(|g| local[g])
                .collect();
            if !send.is_empty() || !recv.is_empty() {
                halo.insert(peer, HaloLists { send, recv });
            }
        }

        let local_parts = MeshParts {
            partition: me,
            global_ids: nodes.iter().map(|&g| global.global_id(g)).collect::<Vec<GlobalId>>(),
            owners: nodes.iter().map(|&g| owner[g]).collect(),
            lonlat: nodes.iter().map(|&g| global.lonlat(g)).collect(),
            dual_volumes: nodes.iter().map(|&g| global.dual_volume(g)).collect(),
            edges: slice
                .edges
                .iter()
                .map(|&e| {
                    let [a, b] = global.edge(e);
                    [local[&(a as usize)], local[&(b as usize)]]
                })
                .collect(),
            dual_normals: slice.edges.iter().map(|&e| global.dual_normal(e)).collect(),
            pole_edges: slice.edges.iter().map(|&e| global.is_pole_edge(e)).collect(),
            incidence: Some(incidence),
            halo,
        };
        let mesh = Mesh::new(local_parts)?;
        log::debug!(
            "partition {me}: {} owned, {} ghosts, {} neighbours",
            mesh.owned_count(),
            mesh.ghost_count(),
            mesh.halo().len()
        );
        meshes.push(mesh);
    }
    Ok(meshes)
}
