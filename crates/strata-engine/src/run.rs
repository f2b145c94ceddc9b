//! The iteration loop of one partition.
//!
//! Every partition runs the same sequence, so the collectives line up:
//!
//! ```text
//! setup:      field init, kernel scratch, halo handshake (collective)
//! iteration:  kernel | barrier | exchange | barrier
//! finish:     min / max / checksum reductions (collective)
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use rayon::ThreadPool;
use strata_core::{GlobalId, GradientField, PartitionId, ScalarField};
use strata_halo::{Communicator, HaloExchange};
use strata_kernel::GreenGauss;
use strata_mesh::Mesh;

use crate::checksum::gradient_checksum;
use crate::config::BenchConfig;
use crate::error::RunError;
use crate::report::IterationTiming;
use crate::timer::TimerStats;

const PROGRESS_WIDTH: usize = 20;

/// What one partition hands back after its last iteration.
///
/// `min`, `max` and `checksum` are already reduced over all partitions and
/// are the same on every partition.
#[derive(Clone, Debug)]
pub struct PartitionOutcome {
    /// The partition that produced this outcome.
    pub partition: PartitionId,
    /// Field, kernel and halo setup inside the partition.
    pub setup: Duration,
    /// Every iteration as timed locally.
    pub iterations: Vec<IterationTiming>,
    /// Full-iteration statistics after warm-up.
    pub iteration_stats: TimerStats,
    /// Halo exchange statistics after warm-up.
    pub halo_stats: TimerStats,
    /// Global minimum gradient component.
    pub min: f64,
    /// Global maximum gradient component.
    pub max: f64,
    /// Global checksum.
    pub checksum: u64,
    /// Owned gradient blocks, ascending by global id, if gathering.
    pub gradient: Option<Vec<(GlobalId, Vec<f64>)>>,
}

/// A partition that has finished setup and is ready to iterate.
pub struct PartitionRun<C: Communicator> {
    mesh: Arc<Mesh>,
    comm: C,
    field: ScalarField,
    grad: GradientField,
    kernel: GreenGauss,
    exchange: HaloExchange,
    iterations: usize,
    exclude: usize,
    progress: bool,
    gather: bool,
    setup: Duration,
}

impl<C: Communicator> PartitionRun<C> {
    /// Initialize the field and kernel, and agree on the halo topology
    /// with every other partition.
    ///
    /// Collective: every partition of the run must call it.
    pub fn new(mesh: Arc<Mesh>, config: &BenchConfig, comm: C) -> Result<Self, RunError> {
        let start = Instant::now();
        let levels = config.levels;
        let field = config.init.build(&mesh, levels);
        let grad = GradientField::new(mesh.node_count(), levels);
        let kernel = GreenGauss::new(&mesh, levels, config.column_height)?;
        let exchange = HaloExchange::setup(&mesh, levels, &comm)?;
        let setup = start.elapsed();
        log::debug!(
            "partition {}: {} owned + {} ghost nodes, {} edges, setup {:.5} s",
            mesh.partition(),
            mesh.owned_count(),
            mesh.ghost_count(),
            mesh.edge_count(),
            setup.as_secs_f64(),
        );
        Ok(Self {
            mesh,
            comm,
            field,
            grad,
            kernel,
            exchange,
            iterations: config.iterations,
            exclude: config.resolved_exclude(),
            progress: config.progress,
            gather: config.gather,
            setup,
        })
    }

    /// The partition this run belongs to.
    pub fn partition(&self) -> PartitionId {
        self.comm.rank()
    }

    /// Run every iteration on `pool`, then reduce the results.
    ///
    /// Consumes the run so that its communicator is dropped on return;
    /// peers still waiting on it observe a disconnect instead of hanging.
    pub fn run(mut self, pool: &ThreadPool) -> Result<PartitionOutcome, RunError> {
        let me = self.comm.rank();
        let lead = me.index() == 0;
        let mut iteration_stats = TimerStats::new("iteration");
        let mut halo_stats = TimerStats::new("halo");
        let mut timings = Vec::with_capacity(self.iterations);
        let mut shown = 0;

        for iter in 0..self.iterations {
            let start = Instant::now();
            {
                let (mesh, field) = (&*self.mesh, &self.field);
                let (kernel, grad) = (&mut self.kernel, &mut self.grad);
                pool.install(|| kernel.compute(mesh, field, grad))?;
            }
            self.comm.barrier()?;
            let halo_start = Instant::now();
            self.exchange.execute(&mut self.grad, &self.comm)?;
            let halo = halo_start.elapsed();
            self.comm.barrier()?;
            let total = start.elapsed();

            if iter >= self.exclude {
                iteration_stats.update(total);
                halo_stats.update(halo);
            }
            let timing = IterationTiming { total, halo };
            timings.push(timing);

            if lead {
                if self.progress {
                    let step = (iter + 1) * 10 / self.iterations;
                    if step > shown {
                        shown = step;
                        log::info!("{}", progress_bar(iter + 1, self.iterations));
                    }
                } else {
                    log::info!(
                        "iteration {iter:>4}: {:.5} s / {:.5} s halo ({:.1} %)",
                        total.as_secs_f64(),
                        halo.as_secs_f64(),
                        timing.halo_percent(),
                    );
                }
            }
        }

        let (local_min, local_max) = self.owned_extrema();
        let min = self.comm.all_reduce_min_f64(local_min)?;
        let max = self.comm.all_reduce_max_f64(local_max)?;
        let checksum = self
            .comm
            .all_reduce_wrapping_sum(gradient_checksum(&self.mesh, &self.grad))?;
        log::debug!("partition {me}: done, checksum {checksum:#018x}");

        let gradient = self.gather.then(|| self.owned_blocks());
        Ok(PartitionOutcome {
            partition: me,
            setup: self.setup,
            iterations: timings,
            iteration_stats,
            halo_stats,
            min,
            max,
            checksum,
            gradient,
        })
    }

    fn owned_nodes(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.mesh.node_count()).filter(|&n| self.mesh.is_owned(n))
    }

    fn owned_extrema(&self) -> (f64, f64) {
        self.owned_nodes()
            .flat_map(|n| self.grad.node(n).iter().copied())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(v), hi.max(v))
            })
    }

    fn owned_blocks(&self) -> Vec<(GlobalId, Vec<f64>)> {
        let mut blocks: Vec<_> = self
            .owned_nodes()
            .map(|n| (self.mesh.global_id(n), self.grad.node(n).to_vec()))
            .collect();
        blocks.sort_by_key(|(id, _)| *id);
        blocks
    }
}

/// `[#########           ]  45 %` for `done` out of `total`.
pub(crate) fn progress_bar(done: usize, total: usize) -> String {
    let total = total.max(1);
    let filled = done.min(total) * PROGRESS_WIDTH / total;
    format!(
        "[{}{}] {:>3} %",
        "#".repeat(filled),
        " ".repeat(PROGRESS_WIDTH - filled),
        done.min(total) * 100 / total
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::Component;
    use strata_halo::SerialComm;
    use strata_test_utils::grid;

    fn pool(threads: usize) -> ThreadPool {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .unwrap()
    }

    fn small() -> BenchConfig {
        BenchConfig {
            resolution: 2,
            levels: 3,
            iterations: 4,
            ..BenchConfig::default()
        }
    }

    #[test]
    fn progress_bar_fills_proportionally() {
        assert_eq!(progress_bar(0, 10), format!("[{}]   0 %", " ".repeat(20)));
        assert_eq!(progress_bar(5, 10), format!("[{}{}]  50 %", "#".repeat(10), " ".repeat(10)));
        assert_eq!(progress_bar(10, 10), format!("[{}] 100 %", "#".repeat(20)));
    }

    #[test]
    fn warm_up_iterations_are_not_timed() {
        let mesh = Arc::new(grid(8, 4));
        let run = PartitionRun::new(mesh, &small(), SerialComm).unwrap();
        let out = run.run(&pool(2)).unwrap();
        assert_eq!(out.iterations.len(), 4);
        assert_eq!(out.iteration_stats.count(), 3);
        assert_eq!(out.halo_stats.count(), 3);
        assert!(out.gradient.is_none());
    }

    #[test]
    fn gathered_blocks_cover_every_node_in_order() {
        let mesh = Arc::new(grid(8, 4));
        let config = BenchConfig {
            gather: true,
            ..small()
        };
        let out = PartitionRun::new(Arc::clone(&mesh), &config, SerialComm)
            .unwrap()
            .run(&pool(1))
            .unwrap();
        let blocks = out.gradient.unwrap();
        assert_eq!(blocks.len(), 32);
        for (i, (id, block)) in blocks.iter().enumerate() {
            assert_eq!(id.index(), i);
            assert_eq!(block.len(), 3 * 3);
        }
    }

    #[test]
    fn extrema_bound_every_component() {
        let mesh = Arc::new(grid(8, 4));
        let config = BenchConfig {
            gather: true,
            ..small()
        };
        let out = PartitionRun::new(mesh, &config, SerialComm)
            .unwrap()
            .run(&pool(1))
            .unwrap();
        let values: Vec<f64> = out
            .gradient
            .unwrap()
            .into_iter()
            .flat_map(|(_, b)| b)
            .collect();
        assert!(values.iter().all(|&v| out.min <= v && v <= out.max));
        assert!(values.contains(&out.min));
        assert!(values.contains(&out.max));
        // a zonal field has no vertical structure
        assert!(values.chunks(3).all(|g| g[Component::Z as usize] == 0.0));
    }
}
