//! Cross-partition communication for Strata.
//!
//! [`Communicator`] is the transport seam: pairwise `send`/`recv` of
//! `f64` buffers plus one collective primitive, `all_gather_u64`, from
//! which the barrier and the min/max/sum reductions are derived. Two
//! backends are provided:
//!
//! - [`SerialComm`]: a single partition, no peers
//! - [`ThreadComm`]: one communicator per OS thread, wired together with
//!   unbounded crossbeam channels
//!
//! [`HaloExchange`] runs the ghost-node synchronization on top of any
//! communicator.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod comm;
pub mod exchange;

pub use comm::{Communicator, SerialComm, ThreadComm};
pub use exchange::{pack, unpack, HaloExchange};
