//! Green-Gauss gradient kernel for Strata.
//!
//! Computes a 3-component gradient per node per vertical level on a
//! median-dual mesh:
//!
//! 1. [`edge_fluxes`]: `S * 0.5 * (f[p1] + f[p2])` per edge and level
//! 2. [`accumulate_nodes`]: signed flux sum over each owned node's
//!    incident edges, in incidence order, divided by the dual volume
//! 3. [`correct_poles`]: restores the missing dual face at the second
//!    endpoint of every pole edge
//! 4. [`vertical_gradient`]: finite differences along the column
//!
//! [`GreenGauss`] runs all four with one scratch buffer. Every loop is a
//! fixed-order reduction per output slot, so results do not depend on the
//! number of rayon workers. Ghost nodes are never written.
//!
//! [`FieldInit`] builds the input field as a pure function of each node's
//! global id and coordinates, so ghost replicas agree with their owners.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod green_gauss;
pub mod init;
pub mod vertical;

pub use green_gauss::{accumulate_nodes, correct_poles, edge_fluxes, EdgeFluxes, GreenGauss};
pub use init::{zonal, FieldInit};
pub use vertical::vertical_gradient;
