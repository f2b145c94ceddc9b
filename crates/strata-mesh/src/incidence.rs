//! Node-to-edge incidence with the first-endpoint sign convention.
//!
//! Stored compressed: `offsets[n]..offsets[n + 1]` indexes the flat
//! `edges` and `signs` arrays for node `n`. The order of a node's entries
//! is the order its fluxes are summed in, so it is fixed at construction
//! and never changes.

use smallvec::SmallVec;
use strata_core::MeshError;

/// Ordered incident-edge lists for every node, with signs.
///
/// The sign is `+1.0` when the node is the edge's first endpoint and
/// `-1.0` when it is the second.
#[derive(Clone, Debug, PartialEq)]
pub struct Incidence {
    offsets: Vec<u32>,
    edges: Vec<u32>,
    signs: Vec<f64>,
}

impl Incidence {
    /// Derive incidence from the edge table.
    ///
    /// Edges are visited in ascending index order and appended to each
    /// endpoint, so every node's list is sorted by edge index. Linear in
    /// `node_count + edges.len()`. Endpoints must already be validated.
    pub fn derive(node_count: usize, edges: &[[u32; 2]]) -> Self {
        let mut offsets = vec![0u32; node_count + 1];
        for &[a, b] in edges {
            offsets[a as usize + 1] += 1;
            offsets[b as usize + 1] += 1;
        }
        for n in 0..node_count {
            offsets[n + 1] += offsets[n];
        }

        let total = offsets[node_count] as usize;
        let mut cursor: Vec<u32> = offsets[..node_count].to_vec();
        let mut flat_edges = vec![0u32; total];
        let mut signs = vec![0.0f64; total];
        for (e, &[a, b]) in edges.iter().enumerate() {
            for (node, sign) in [(a, 1.0), (b, -1.0)] {
                let slot = cursor[node as usize] as usize;
                flat_edges[slot] = e as u32;
                signs[slot] = sign;
                cursor[node as usize] += 1;
            }
        }

        Self {
            offsets,
            edges: flat_edges,
            signs,
        }
    }

    /// Adopt externally supplied per-node lists, keeping their order.
    ///
    /// Each list must name every edge incident to its node exactly once
    /// and nothing else. Signs are derived from the edge table.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::LengthMismatch`] if there is not one list per
    /// node, or [`MeshError::IncidenceMismatch`] if a list is wrong.
    pub fn from_lists(lists: &[Vec<u32>], edges: &[[u32; 2]]) -> Result<Self, MeshError> {
        let derived = Self::derive(lists.len(), edges);

        let mut offsets = Vec::with_capacity(lists.len() + 1);
        let mut flat_edges = Vec::with_capacity(derived.edges.len());
        let mut signs = Vec::with_capacity(derived.edges.len());
        offsets.push(0u32);

        for (node, list) in lists.iter().enumerate() {
            let mut supplied: SmallVec<[u32; 8]> = list.iter().copied().collect();
            supplied.sort_unstable();
            let expected = derived.edges_of(node);
            if supplied.as_slice() != expected {
                return Err(MeshError::IncidenceMismatch {
                    node,
                    reason: format!("lists edges {list:?}, incident edges are {expected:?}"),
                });
            }
            for &e in list {
                let [first, _] = edges[e as usize];
                flat_edges.push(e);
                signs.push(if first as usize == node { 1.0 } else { -1.0 });
            }
            offsets.push(flat_edges.len() as u32);
        }

        Ok(Self {
            offsets,
            edges: flat_edges,
            signs,
        })
    }

    /// Number of nodes covered.
    pub fn node_count(&self) -> usize {
        self.offsets.len() - 1
    }

    /// Number of edges incident to `node`.
    pub fn degree(&self, node: usize) -> usize {
        (self.offsets[node + 1] - self.offsets[node]) as usize
    }

    /// Largest degree over all nodes (0 for an empty table).
    pub fn max_degree(&self) -> usize {
        (0..self.node_count())
            .map(|n| self.degree(n))
            .max()
            .unwrap_or(0)
    }

    /// Incident edges of `node`, in summation order.
    pub fn edges_of(&self, node: usize) -> &[u32] {
        &self.edges[self.offsets[node] as usize..self.offsets[node + 1] as usize]
    }

    /// Signs matching [`edges_of`](Self::edges_of).
    pub fn signs_of(&self, node: usize) -> &[f64] {
        &self.signs[self.offsets[node] as usize..self.offsets[node + 1] as usize]
    }

    /// `(edge, sign)` pairs of `node`, in summation order.
    pub fn iter(&self, node: usize) -> impl Iterator<Item = (u32, f64)> + '_ {
        self.edges_of(node)
            .iter()
            .copied()
            .zip(self.signs_of(node).iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 0 -- 1 -- 2, plus 2 -> 0
    fn triangle() -> Vec<[u32; 2]> {
        vec![[0, 1], [1, 2], [2, 0]]
    }

    #[test]
    fn derive_orders_by_edge_index() {
        let inc = Incidence::derive(3, &triangle());
        assert_eq!(inc.edges_of(0), &[0, 2]);
        assert_eq!(inc.signs_of(0), &[1.0, -1.0]);
        assert_eq!(inc.edges_of(1), &[0, 1]);
        assert_eq!(inc.signs_of(1), &[-1.0, 1.0]);
        assert_eq!(inc.edges_of(2), &[1, 2]);
        assert_eq!(inc.signs_of(2), &[-1.0, 1.0]);
        assert_eq!(inc.max_degree(), 2);
    }

    #[test]
    fn derive_handles_isolated_nodes() {
        let inc = Incidence::derive(4, &[[0, 2]]);
        assert_eq!(inc.degree(1), 0);
        assert_eq!(inc.degree(3), 0);
        assert!(inc.edges_of(3).is_empty());
    }

    #[test]
    fn supplied_order_is_kept() {
        let lists = vec![vec![2, 0], vec![1, 0], vec![2, 1]];
        let inc = Incidence::from_lists(&lists, &triangle()).unwrap();
        assert_eq!(inc.edges_of(0), &[2, 0]);
        assert_eq!(inc.signs_of(0), &[-1.0, 1.0]);
        let pairs: Vec<_> = inc.iter(1).collect();
        assert_eq!(pairs, vec![(1, 1.0), (0, -1.0)]);
    }

    #[test]
    fn supplied_list_missing_an_edge_is_rejected() {
        let lists = vec![vec![0], vec![0, 1], vec![1, 2]];
        let err = Incidence::from_lists(&lists, &triangle()).unwrap_err();
        assert!(matches!(err, MeshError::IncidenceMismatch { node: 0, .. }));
    }

    #[test]
    fn supplied_list_with_foreign_edge_is_rejected() {
        let lists = vec![vec![0, 2], vec![0, 1, 2], vec![1, 2]];
        let err = Incidence::from_lists(&lists, &triangle()).unwrap_err();
        assert!(matches!(err, MeshError::IncidenceMismatch { node: 1, .. }));
    }
}
