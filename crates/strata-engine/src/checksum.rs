//! Partition-independent gradient checksum.
//!
//! Each owned node is hashed on its own with FNV-1a: the global id first,
//! then the bits of every gradient value in `(level, component)` order.
//! Node hashes are combined with wrapping addition, which is commutative,
//! so neither local numbering nor the partition split affects the result.
//! Partition sums are combined the same way by
//! [`Communicator::all_reduce_wrapping_sum`](strata_halo::Communicator::all_reduce_wrapping_sum).

use strata_core::{GlobalId, GradientField};
use strata_mesh::Mesh;

/// FNV-1a offset basis for 64-bit.
const FNV_OFFSET: u64 = 0xcbf29ce484222325;
/// FNV-1a prime for 64-bit.
const FNV_PRIME: u64 = 0x00000100000001B3;

#[inline]
fn fnv1a_byte(hash: u64, byte: u8) -> u64 {
    (hash ^ byte as u64).wrapping_mul(FNV_PRIME)
}

#[inline]
fn fnv1a_u64(mut hash: u64, v: u64) -> u64 {
    for &b in &v.to_le_bytes() {
        hash = fnv1a_byte(hash, b);
    }
    hash
}

/// Hash of one node's gradient block, keyed by its global id.
pub fn node_hash(id: GlobalId, block: &[f64]) -> u64 {
    let mut hash = fnv1a_u64(FNV_OFFSET, id.0);
    for &v in block {
        hash = fnv1a_u64(hash, v.to_bits());
    }
    hash
}

/// Wrapping sum of [`node_hash`] over the owned nodes of one partition.
pub fn gradient_checksum(mesh: &Mesh, grad: &GradientField) -> u64 {
    (0..mesh.node_count())
        .filter(|&n| mesh.is_owned(n))
        .map(|n| node_hash(mesh.global_id(n), grad.node(n)))
        .fold(0u64, u64::wrapping_add)
}
