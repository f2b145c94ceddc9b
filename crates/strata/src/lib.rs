//! Strata: a Green-Gauss gradient kernel on partitioned median-dual meshes.
//!
//! This is the top-level facade crate that re-exports the public API from
//! all Strata sub-crates.
//!
//! # Quick start
//!
//! ```rust
//! use strata::prelude::*;
//!
//! let config = BenchConfig {
//!     resolution: 2,
//!     levels: 4,
//!     iterations: 2,
//!     partitions: 2,
//!     threads: Some(1),
//!     ..BenchConfig::default()
//! };
//! let bench = Benchmark::new();
//! let report = bench.run(&config).unwrap();
//! assert_eq!(report.nodes, 32);
//!
//! // the checksum does not depend on the split
//! let serial = bench.run(&config.with_partitions(1)).unwrap();
//! assert_eq!(report.checksum, serial.checksum);
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `strata-core` | IDs, field storage, error types |
//! | [`mesh`] | `strata-mesh` | Median-dual mesh, lon-lat grid, partitioner |
//! | [`kernel`] | `strata-kernel` | Green-Gauss and vertical gradients, field init |
//! | [`halo`] | `strata-halo` | Communicators and the halo exchange |
//! | [`engine`] | `strata-engine` | Configuration, driver, timers, checksums |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Identifiers, field storage and error types (`strata-core`).
pub use strata_core as types;

/// Mesh connectivity and the synthetic mesh builders (`strata-mesh`).
///
/// [`mesh::LonLatGrid`] builds an undecomposed mesh;
/// [`mesh::partition_blocks`] splits it with a one-layer ghost halo.
pub use strata_mesh as mesh;

/// The gradient kernel (`strata-kernel`).
pub use strata_kernel as kernel;

/// Partition transport and ghost synchronization (`strata-halo`).
///
/// [`halo::SerialComm`] for a single partition, [`halo::ThreadComm`] for
/// one OS thread per partition.
pub use strata_halo as halo;

/// Benchmark configuration and driver (`strata-engine`).
pub use strata_engine as engine;

/// Common imports for running the kernel or the benchmark.
pub mod prelude {
    // Core types
    pub use strata_core::{Component, GlobalId, GradientField, PartitionId, ScalarField};

    // Errors
    pub use strata_core::{CommError, ExchangeError, KernelError, MeshError};

    // Mesh
    pub use strata_mesh::{partition_blocks, LonLatGrid, Mesh, MeshParts};

    // Kernel
    pub use strata_kernel::{FieldInit, GreenGauss};

    // Transport
    pub use strata_halo::{Communicator, HaloExchange, SerialComm, ThreadComm};

    // Engine
    pub use strata_engine::{BenchConfig, BenchReport, Benchmark, ConfigError, RunError};
}
