//! Per-node multi-level field storage.
//!
//! Both stores are node-major so that one node's column is contiguous:
//! the kernel hands each worker whole columns, and the halo exchange
//! packs whole columns.

use crate::error::KernelError;

/// Number of gradient components per level (x, y, z).
pub const COMPONENTS: usize = 3;

/// One component of a gradient vector.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Component {
    /// Horizontal, along increasing longitude.
    X = 0,
    /// Horizontal, along increasing latitude.
    Y = 1,
    /// Vertical, along increasing level index.
    Z = 2,
}

/// A scalar value per node per vertical level.
///
/// Layout: `data[node * levels + level]`.
#[derive(Clone, Debug, PartialEq)]
pub struct ScalarField {
    nodes: usize,
    levels: usize,
    data: Vec<f64>,
}

impl ScalarField {
    /// A zero-filled field of `nodes × levels` values.
    pub fn new(nodes: usize, levels: usize) -> Self {
        Self {
            nodes,
            levels,
            data: vec![0.0; nodes * levels],
        }
    }

    /// Build a field by evaluating `f(node, level)` for every slot.
    pub fn from_fn(nodes: usize, levels: usize, mut f: impl FnMut(usize, usize) -> f64) -> Self {
        let mut data = Vec::with_capacity(nodes * levels);
        for node in 0..nodes {
            for level in 0..levels {
                data.push(f(node, level));
            }
        }
        Self {
            nodes,
            levels,
            data,
        }
    }

    /// Wrap an existing node-major buffer.
    ///
    /// Returns `Err(KernelError::ShapeMismatch)` if `data.len()` is not
    /// `nodes * levels`.
    pub fn from_vec(nodes: usize, levels: usize, data: Vec<f64>) -> Result<Self, KernelError> {
        if data.len() != nodes * levels {
            return Err(KernelError::ShapeMismatch {
                what: "field",
                expected: nodes * levels,
                found: data.len(),
            });
        }
        Ok(Self {
            nodes,
            levels,
            data,
        })
    }

    /// Number of nodes.
    pub fn nodes(&self) -> usize {
        self.nodes
    }

    /// Number of vertical levels.
    pub fn levels(&self) -> usize {
        self.levels
    }

    /// Value at `(node, level)`.
    pub fn get(&self, node: usize, level: usize) -> f64 {
        self.data[node * self.levels + level]
    }

    /// Overwrite the value at `(node, level)`.
    pub fn set(&mut self, node: usize, level: usize, value: f64) {
        self.data[node * self.levels + level] = value;
    }

    /// All levels of one node.
    pub fn column(&self, node: usize) -> &[f64] {
        &self.data[node * self.levels..(node + 1) * self.levels]
    }

    /// The whole buffer, node-major.
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// The whole buffer, node-major, mutably.
    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }
}

/// A 3-component gradient per node per vertical level.
///
/// Layout: `data[(node * levels + level) * 3 + component]`. A node's
/// block of `levels * 3` values is contiguous.
#[derive(Clone, Debug, PartialEq)]
pub struct GradientField {
    nodes: usize,
    levels: usize,
    data: Vec<f64>,
}

impl GradientField {
    /// A zero-filled gradient of `nodes × levels × 3` values.
    pub fn new(nodes: usize, levels: usize) -> Self {
        Self {
            nodes,
            levels,
            data: vec![0.0; nodes * levels * COMPONENTS],
        }
    }

    /// Number of nodes.
    pub fn nodes(&self) -> usize {
        self.nodes
    }

    /// Number of vertical levels.
    pub fn levels(&self) -> usize {
        self.levels
    }

    /// Values per node (`levels * 3`).
    pub fn block_len(&self) -> usize {
        self.levels * COMPONENTS
    }

    /// One component at `(node, level)`.
    pub fn get(&self, node: usize, level: usize, component: Component) -> f64 {
        self.data[(node * self.levels + level) * COMPONENTS + component as usize]
    }

    /// Overwrite one component at `(node, level)`.
    pub fn set(&mut self, node: usize, level: usize, component: Component, value: f64) {
        self.data[(node * self.levels + level) * COMPONENTS + component as usize] = value;
    }

    /// The contiguous `levels * 3` block of one node.
    pub fn node(&self, node: usize) -> &[f64] {
        let len = self.block_len();
        &self.data[node * len..(node + 1) * len]
    }

    /// The contiguous `levels * 3` block of one node, mutably.
    pub fn node_mut(&mut self, node: usize) -> &mut [f64] {
        let len = self.block_len();
        &mut self.data[node * len..(node + 1) * len]
    }

    /// The whole buffer.
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// The whole buffer, mutably.
    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn scalar_from_vec_rejects_wrong_length() {
        let err = ScalarField::from_vec(3, 2, vec![0.0; 5]).unwrap_err();
        assert_eq!(
            err,
            KernelError::ShapeMismatch {
                what: "field",
                expected: 6,
                found: 5
            }
        );
    }

    #[test]
    fn gradient_node_block_is_contiguous() {
        let mut g = GradientField::new(4, 2);
        g.set(2, 1, Component::Z, 7.0);
        g.set(2, 0, Component::X, 1.0);
        let block = g.node(2);
        assert_eq!(block.len(), 6);
        assert_eq!(block[0], 1.0);
        assert_eq!(block[5], 7.0);
        assert_eq!(g.get(2, 1, Component::Z), 7.0);
    }

    proptest! {
        #[test]
        fn scalar_from_fn_round_trips_coordinates(nodes in 1usize..20, levels in 1usize..8) {
            let f = ScalarField::from_fn(nodes, levels, |n, l| (n * 100 + l) as f64);
            for n in 0..nodes {
                prop_assert_eq!(f.column(n).len(), levels);
                for l in 0..levels {
                    prop_assert_eq!(f.get(n, l), (n * 100 + l) as f64);
                }
            }
        }
    }
}
