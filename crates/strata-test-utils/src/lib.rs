//! Test utilities for Strata development.
//!
//! Provides fixture meshes ([`pole_mesh`], [`grid24`], [`grid`]) and
//! closed-form fields ([`constant_field`], [`linear_in_level`]) whose
//! gradients are known exactly.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

pub use fixtures::{grid, grid24, grid24_partitions, pole_mesh};

use strata_core::ScalarField;
use strata_mesh::Mesh;

/// The same value at every node and level.
pub fn constant_field(mesh: &Mesh, levels: usize, value: f64) -> ScalarField {
    ScalarField::from_fn(mesh.node_count(), levels, |_, _| value)
}

/// `a + b * level` at every node.
pub fn linear_in_level(mesh: &Mesh, levels: usize, a: f64, b: f64) -> ScalarField {
    ScalarField::from_fn(mesh.node_count(), levels, |_, l| a + b * l as f64)
}

/// Bitwise comparison of two float slices, reporting the first difference.
pub fn first_bit_difference(a: &[f64], b: &[f64]) -> Option<(usize, f64, f64)> {
    if a.len() != b.len() {
        return Some((a.len().min(b.len()), f64::NAN, f64::NAN));
    }
    a.iter()
        .zip(b)
        .enumerate()
        .find(|(_, (x, y))| x.to_bits() != y.to_bits())
        .map(|(i, (x, y))| (i, *x, *y))
}
