//! Core types for the Strata gradient benchmark.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the identifiers, error types, and per-node field storage shared by
//! the mesh, kernel, halo-exchange, and engine crates.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod field;
pub mod id;

pub use error::{CommError, ExchangeError, KernelError, MeshError};
pub use field::{Component, GradientField, ScalarField, COMPONENTS};
pub use id::{GlobalId, PartitionId};
