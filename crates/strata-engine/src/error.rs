//! Top-level error of a benchmark run.

use std::error::Error;
use std::fmt;

use strata_core::{CommError, ExchangeError, KernelError, MeshError, PartitionId};

use crate::config::ConfigError;

/// Why a benchmark run stopped.
///
/// Wraps the subsystem error that caused it; [`Error::source`] exposes
/// the wrapped error.
#[derive(Debug)]
pub enum RunError {
    /// The configuration was rejected before any work started.
    Config(ConfigError),
    /// Mesh construction or partitioning failed.
    Mesh(MeshError),
    /// The kernel rejected its inputs.
    Kernel(KernelError),
    /// Halo setup or exchange failed.
    Exchange(ExchangeError),
    /// A collective outside the halo exchange failed.
    Comm(CommError),
    /// The rayon pool for a partition could not be built.
    ThreadPool {
        /// The partition whose pool failed.
        partition: PartitionId,
        /// Message from the pool builder.
        reason: String,
    },
    /// The OS thread for a partition could not be spawned.
    ThreadSpawn {
        /// The partition whose thread failed.
        partition: PartitionId,
        /// Message from the OS.
        reason: String,
    },
    /// A partition thread panicked.
    PartitionPanicked {
        /// The partition that panicked.
        partition: PartitionId,
    },
}

impl RunError {
    /// `true` for errors that are only a consequence of another partition
    /// having failed first.
    pub fn is_cascade(&self) -> bool {
        matches!(
            self,
            Self::Comm(CommError::Disconnected { .. })
                | Self::Exchange(ExchangeError::Comm(CommError::Disconnected { .. }))
        )
    }
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Mesh(e) => write!(f, "mesh: {e}"),
            Self::Kernel(e) => write!(f, "kernel: {e}"),
            Self::Exchange(e) => write!(f, "halo exchange: {e}"),
            Self::Comm(e) => write!(f, "collective: {e}"),
            Self::ThreadPool { partition, reason } => {
                write!(f, "partition {partition}: cannot build thread pool: {reason}")
            }
            Self::ThreadSpawn { partition, reason } => {
                write!(f, "partition {partition}: cannot spawn thread: {reason}")
            }
            Self::PartitionPanicked { partition } => {
                write!(f, "partition {partition} panicked")
            }
        }
    }
}

impl Error for RunError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::Mesh(e) => Some(e),
            Self::Kernel(e) => Some(e),
            Self::Exchange(e) => Some(e),
            Self::Comm(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigError> for RunError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<MeshError> for RunError {
    fn from(e: MeshError) -> Self {
        Self::Mesh(e)
    }
}

impl From<KernelError> for RunError {
    fn from(e: KernelError) -> Self {
        Self::Kernel(e)
    }
}

impl From<ExchangeError> for RunError {
    fn from(e: ExchangeError) -> Self {
        Self::Exchange(e)
    }
}

impl From<CommError> for RunError {
    fn from(e: CommError) -> Self {
        Self::Comm(e)
    }
}
