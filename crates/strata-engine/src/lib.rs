//! Benchmark driver for the Strata gradient kernel.
//!
//! [`Benchmark`] turns a [`BenchConfig`] into a [`BenchReport`]:
//!
//! 1. build (or fetch from its [`MeshCache`]) the global lon-lat mesh and
//!    its block partitions
//! 2. start one OS thread per partition, each with its own rayon pool and
//!    a connected [`Communicator`](strata_halo::Communicator)
//! 3. per iteration: kernel, barrier, halo exchange, barrier, timers
//! 4. reduce global min, max and [`gradient_checksum`] across partitions
//!
//! The checksum is independent of the partition and thread counts, which
//! makes it the acceptance test for a run.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod cache;
pub mod checksum;
pub mod config;
pub mod driver;
pub mod error;
pub mod report;
pub mod run;
pub mod timer;

pub use cache::MeshCache;
pub use checksum::{gradient_checksum, node_hash};
pub use config::{BenchConfig, ConfigError};
pub use driver::{Benchmark, SweepReport};
pub use error::RunError;
pub use report::{BenchReport, IterationTiming};
pub use run::{PartitionOutcome, PartitionRun};
pub use timer::TimerStats;
