//! Benchmark profiles and utilities for the Strata gradient kernel.
//!
//! - [`reference_profile`]: `N = 64`, 137 levels, 100 iterations
//! - [`smoke_profile`]: a run that finishes in well under a second
//! - [`KernelFixture`]: a mesh with field, gradient and kernel ready to
//!   compute, for micro-benchmarks
//! - [`scaling_table`]: the sweep summary printed by `strata-benchmark`

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::fmt::{self, Write as _};

use strata_core::{GradientField, ScalarField};
use strata_engine::{BenchConfig, RunError, SweepReport};
use strata_kernel::GreenGauss;
use strata_mesh::Mesh;

/// The default production-sized run: a 256 x 128 grid with 137 levels.
pub fn reference_profile() -> BenchConfig {
    BenchConfig::default()
}

/// A small run: 32 x 16 grid, 16 levels, 5 iterations.
pub fn smoke_profile() -> BenchConfig {
    BenchConfig {
        resolution: 8,
        levels: 16,
        iterations: 5,
        ..BenchConfig::default()
    }
}

/// Everything one partition needs to call [`GreenGauss::compute`].
pub struct KernelFixture {
    /// The undecomposed mesh.
    pub mesh: Mesh,
    /// Input field.
    pub field: ScalarField,
    /// Output gradient.
    pub grad: GradientField,
    /// Kernel with its flux scratch.
    pub kernel: GreenGauss,
}

impl KernelFixture {
    /// Build the global mesh for `config` with its field and kernel.
    pub fn new(config: &BenchConfig) -> Result<Self, RunError> {
        config.validate()?;
        let mesh = config.grid()?.build()?;
        let field = config.init.build(&mesh, config.levels);
        let grad = GradientField::new(mesh.node_count(), config.levels);
        let kernel = GreenGauss::new(&mesh, config.levels, config.column_height)?;
        Ok(Self {
            mesh,
            field,
            grad,
            kernel,
        })
    }

    /// One kernel pass on the current rayon pool.
    pub fn compute(&mut self) -> Result<(), RunError> {
        self.kernel
            .compute(&self.mesh, &self.field, &mut self.grad)
            .map_err(RunError::from)
    }
}

/// Average iteration time per partition count, with speedup relative to
/// the first run.
pub fn scaling_table(sweep: &SweepReport) -> String {
    let mut out = String::new();
    // formatting into a String only fails if a Display impl does
    if write_scaling_table(&mut out, sweep).is_err() {
        log::warn!("scaling table truncated");
    }
    out
}

fn write_scaling_table(out: &mut impl fmt::Write, sweep: &SweepReport) -> fmt::Result {
    writeln!(out, "partitions  threads  iteration avg  speedup  halo %")?;
    let base = sweep
        .reports
        .first()
        .map(|r| r.iteration_stats.avg().as_secs_f64())
        .unwrap_or(0.0);
    for r in &sweep.reports {
        let avg = r.iteration_stats.avg().as_secs_f64();
        let speedup = if avg > 0.0 { base / avg } else { 0.0 };
        writeln!(
            out,
            "{:>10}  {:>7}  {:>13.5}  {:>7.2}  {:>6.2}",
            r.partitions,
            r.threads,
            avg,
            speedup,
            r.halo_fraction()
        )?;
    }
    let verdict = if sweep.checksums_agree {
        "checksums agree"
    } else {
        "CHECKSUMS DISAGREE"
    };
    out.write_str(verdict)
}
