//! Median-dual mesh connectivity for Strata.
//!
//! This crate defines [`Mesh`], the immutable connectivity and dual
//! geometry that the gradient kernel and halo exchange read from,
//! together with the node-to-edge [`Incidence`] table, the per-neighbour
//! [`HaloTopology`], and two mesh-builder stand-ins:
//!
//! - [`LonLatGrid`]: a regular longitude-latitude median-dual mesh with
//!   pole edges across both poles
//! - [`partition_blocks`]: splits an undecomposed mesh into per-partition
//!   local meshes with a one-layer ghost halo

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod halo;
pub mod incidence;
pub mod lonlat;
pub mod mesh;
pub mod partition;

pub use halo::{HaloLists, HaloTopology};
pub use incidence::Incidence;
pub use lonlat::{LonLatGrid, EARTH_RADIUS};
pub use mesh::{Mesh, MeshParts};
pub use partition::{block_starts, partition_blocks};
