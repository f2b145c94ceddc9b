//! Benchmark configuration, validation, and error types.
//!
//! [`BenchConfig`] carries the harness parameters as plain fields.
//! [`validate()`](BenchConfig::validate) checks them once before any mesh
//! is built; `resolved_*` helpers fill in auto-detected values.

use std::error::Error;
use std::fmt;

use strata_core::MeshError;
use strata_kernel::FieldInit;
use strata_mesh::LonLatGrid;

/// Height of the model column in metres.
pub const DEFAULT_COLUMN_HEIGHT: f64 = 80e3;

// ── ConfigError ────────────────────────────────────────────────────

/// Errors detected during [`BenchConfig::validate()`].
#[derive(Clone, Debug, PartialEq)]
pub enum ConfigError {
    /// Resolution `N` is zero.
    ZeroResolution,
    /// Level count is zero.
    ZeroLevels,
    /// Iteration count is zero.
    ZeroIterations,
    /// Every iteration would be excluded from the timer statistics.
    ExcludeTooLarge {
        /// Requested warm-up exclusion.
        exclude: usize,
        /// Requested iteration count.
        iterations: usize,
    },
    /// An explicit thread count of zero.
    ZeroThreads,
    /// The partition count is zero or exceeds the node count.
    InvalidPartitions {
        /// Requested partitions.
        partitions: usize,
        /// Nodes in the mesh.
        nodes: usize,
    },
    /// Column height is NaN, infinite, zero, or negative.
    InvalidColumnHeight {
        /// The invalid value.
        value: f64,
    },
    /// The field initializer parameters are unusable.
    InvalidInit {
        /// Description of the problem.
        reason: String,
    },
    /// The grid for this resolution cannot be built.
    Mesh(MeshError),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroResolution => write!(f, "resolution N must be at least 1"),
            Self::ZeroLevels => write!(f, "levels must be at least 1"),
            Self::ZeroIterations => write!(f, "iterations must be at least 1"),
            Self::ExcludeTooLarge {
                exclude,
                iterations,
            } => write!(
                f,
                "excluding {exclude} warm-up iterations leaves none of {iterations} to time"
            ),
            Self::ZeroThreads => write!(f, "threads must be at least 1"),
            Self::InvalidPartitions { partitions, nodes } => {
                write!(f, "cannot run {partitions} partitions on {nodes} nodes")
            }
            Self::InvalidColumnHeight { value } => {
                write!(f, "column height must be finite and positive, got {value}")
            }
            Self::InvalidInit { reason } => write!(f, "invalid field init: {reason}"),
            Self::Mesh(e) => write!(f, "mesh: {e}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Mesh(e) => Some(e),
            _ => None,
        }
    }
}

impl From<MeshError> for ConfigError {
    fn from(e: MeshError) -> Self {
        Self::Mesh(e)
    }
}

// ── BenchConfig ────────────────────────────────────────────────────

/// Parameters of one benchmark run.
#[derive(Clone, Debug, PartialEq)]
pub struct BenchConfig {
    /// Horizontal resolution `N`; the grid is `4N × 2N`. Default: 64.
    pub resolution: usize,
    /// Vertical levels per node. Default: 137.
    pub levels: usize,
    /// Kernel + exchange iterations. Default: 100.
    pub iterations: usize,
    /// Leading iterations left out of the timer statistics. `None` =
    /// 0 for a single iteration, else 1.
    pub exclude: Option<usize>,
    /// Rayon workers per partition. `None` = auto-detect.
    pub threads: Option<usize>,
    /// Cooperating partitions (one OS thread each). Default: 1.
    pub partitions: usize,
    /// Column height spanned by the levels, in metres. Default: 80 km.
    pub column_height: f64,
    /// Input field. Default: [`FieldInit::Zonal`].
    pub init: FieldInit,
    /// Log coarse progress instead of one line per iteration.
    pub progress: bool,
    /// Return the full gradient, keyed by global id, in the report.
    pub gather: bool,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            resolution: 64,
            levels: 137,
            iterations: 100,
            exclude: None,
            threads: None,
            partitions: 1,
            column_height: DEFAULT_COLUMN_HEIGHT,
            init: FieldInit::Zonal,
            progress: false,
            gather: false,
        }
    }
}

impl BenchConfig {
    /// Validate every parameter.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.resolution == 0 {
            return Err(ConfigError::ZeroResolution);
        }
        if self.levels == 0 {
            return Err(ConfigError::ZeroLevels);
        }
        if self.iterations == 0 {
            return Err(ConfigError::ZeroIterations);
        }
        let exclude = self.resolved_exclude();
        if exclude >= self.iterations {
            return Err(ConfigError::ExcludeTooLarge {
                exclude,
                iterations: self.iterations,
            });
        }
        if self.threads == Some(0) {
            return Err(ConfigError::ZeroThreads);
        }
        if !self.column_height.is_finite() || self.column_height <= 0.0 {
            return Err(ConfigError::InvalidColumnHeight {
                value: self.column_height,
            });
        }
        match self.init {
            FieldInit::Zonal => {}
            FieldInit::Stratified { lapse } if !lapse.is_finite() => {
                return Err(ConfigError::InvalidInit {
                    reason: format!("lapse must be finite, got {lapse}"),
                });
            }
            FieldInit::Perturbed { amplitude, .. }
                if !amplitude.is_finite() || amplitude < 0.0 =>
            {
                return Err(ConfigError::InvalidInit {
                    reason: format!("amplitude must be finite and >= 0, got {amplitude}"),
                });
            }
            _ => {}
        }
        let nodes = self.grid()?.node_count();
        if self.partitions == 0 || self.partitions > nodes {
            return Err(ConfigError::InvalidPartitions {
                partitions: self.partitions,
                nodes,
            });
        }
        Ok(())
    }

    /// The lon-lat grid for this resolution.
    pub fn grid(&self) -> Result<LonLatGrid, ConfigError> {
        if self.resolution == 0 {
            return Err(ConfigError::ZeroResolution);
        }
        Ok(LonLatGrid::from_resolution(self.resolution)?)
    }

    /// Warm-up iterations to exclude, applying the default if `None`.
    pub fn resolved_exclude(&self) -> usize {
        self.exclude
            .unwrap_or(if self.iterations == 1 { 0 } else { 1 })
    }

    /// Workers per partition, applying auto-detection if `None`.
    ///
    /// Auto-detection splits the available cores evenly across
    /// partitions, at least one each.
    pub fn resolved_threads(&self) -> usize {
        match self.threads {
            Some(n) => n.max(1),
            None => {
                let cpus = std::thread::available_parallelism()
                    .map(|n| n.get())
                    .unwrap_or(4);
                (cpus / self.partitions.max(1)).max(1)
            }
        }
    }

    /// A copy with a different partition count.
    pub fn with_partitions(&self, partitions: usize) -> Self {
        Self {
            partitions,
            ..self.clone()
        }
    }
}
