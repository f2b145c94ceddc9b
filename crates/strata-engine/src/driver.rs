//! Run orchestration: meshes, partition threads, result assembly.

use std::sync::Arc;
use std::thread;
use std::time::Instant;

use strata_core::PartitionId;
use strata_halo::{Communicator, SerialComm, ThreadComm};
use strata_mesh::{partition_blocks, Mesh};

use crate::cache::MeshCache;
use crate::config::BenchConfig;
use crate::error::RunError;
use crate::report::BenchReport;
use crate::run::{PartitionOutcome, PartitionRun};

/// Reports of one configuration run at several partition counts.
#[derive(Clone, Debug)]
pub struct SweepReport {
    /// One report per partition count, in the order requested.
    pub reports: Vec<BenchReport>,
    /// `true` if every run produced the same checksum.
    pub checksums_agree: bool,
}

impl SweepReport {
    /// The common checksum, if all runs agree.
    pub fn checksum(&self) -> Option<u64> {
        if self.checksums_agree {
            self.reports.first().map(|r| r.checksum)
        } else {
            None
        }
    }
}

/// Runs benchmarks, keeping built meshes and partitions between runs.
///
/// A sweep over partition counts builds the global mesh once.
#[derive(Default)]
pub struct Benchmark {
    meshes: MeshCache<usize, Mesh>,
    partitions: MeshCache<(usize, usize), Vec<Arc<Mesh>>>,
}

impl Benchmark {
    /// A benchmark with empty caches.
    pub fn new() -> Self {
        Self::default()
    }

    /// The global mesh cache, keyed by resolution.
    pub fn mesh_cache(&self) -> &MeshCache<usize, Mesh> {
        &self.meshes
    }

    /// The undecomposed mesh for `config.resolution`.
    pub fn global_mesh(&self, config: &BenchConfig) -> Result<Arc<Mesh>, RunError> {
        self.meshes
            .get_or_try_insert_with(config.resolution, || -> Result<Mesh, RunError> {
                let grid = config.grid()?;
                log::debug!(
                    "building {} x {} mesh for N = {}",
                    grid.nlon(),
                    grid.nlat(),
                    config.resolution
                );
                Ok(grid.build()?)
            })
    }

    /// The per-partition meshes for `config`, in rank order.
    pub fn partitioned(&self, config: &BenchConfig) -> Result<Arc<Vec<Arc<Mesh>>>, RunError> {
        let global = self.global_mesh(config)?;
        let parts = config.partitions;
        self.partitions
            .get_or_try_insert_with(
                (config.resolution, parts),
                || -> Result<Vec<Arc<Mesh>>, RunError> {
                    if parts == 1 {
                        return Ok(vec![Arc::clone(&global)]);
                    }
                    log::debug!("splitting {} nodes into {parts} partitions", global.node_count());
                    Ok(partition_blocks(&global, parts)?
                        .into_iter()
                        .map(Arc::new)
                        .collect())
                },
            )
    }

    /// Run `config` to completion.
    ///
    /// # Errors
    ///
    /// The first root-cause error of any partition. Disconnects seen by
    /// the other partitions as a consequence are not reported.
    pub fn run(&self, config: &BenchConfig) -> Result<BenchReport, RunError> {
        config.validate()?;
        let start = Instant::now();
        let global = self.global_mesh(config)?;
        let meshes = self.partitioned(config)?;
        let prepared = start.elapsed();
        let threads = config.resolved_threads();
        log::info!(
            "N = {}: {} nodes, {} levels, {} partitions x {} threads",
            config.resolution,
            global.node_count(),
            config.levels,
            meshes.len(),
            threads,
        );

        let mut outcomes = if meshes.len() == 1 {
            vec![run_partition(Arc::clone(&meshes[0]), config, SerialComm, threads)?]
        } else {
            run_threaded(&meshes, config, threads)?
        };
        outcomes.sort_by_key(|o| o.partition);

        let gradient = if config.gather {
            let mut all: Vec<_> = outcomes
                .iter_mut()
                .filter_map(|o| o.gradient.take())
                .flatten()
                .collect();
            all.sort_by_key(|(id, _)| *id);
            Some(all)
        } else {
            None
        };

        let lead = outcomes.swap_remove(0);
        let report = BenchReport {
            config: config.clone(),
            partitions: meshes.len(),
            threads,
            nodes: global.node_count(),
            edges: global.edge_count(),
            setup: prepared + lead.setup,
            iterations: lead.iterations,
            iteration_stats: lead.iteration_stats,
            halo_stats: lead.halo_stats,
            min: lead.min,
            max: lead.max,
            checksum: lead.checksum,
            gradient,
        };
        log::info!(
            "{} partitions: checksum {:#018x}, iteration avg {:.5} s",
            report.partitions,
            report.checksum,
            report.iteration_stats.avg().as_secs_f64(),
        );
        Ok(report)
    }

    /// Run `config` once per entry of `partitions`.
    ///
    /// An empty list runs `config.partitions` alone.
    pub fn sweep(&self, config: &BenchConfig, partitions: &[usize]) -> Result<SweepReport, RunError> {
        let counts = if partitions.is_empty() {
            vec![config.partitions]
        } else {
            partitions.to_vec()
        };
        let reports = counts
            .into_iter()
            .map(|p| self.run(&config.with_partitions(p)))
            .collect::<Result<Vec<_>, _>>()?;
        let checksums_agree = reports.windows(2).all(|w| w[0].checksum == w[1].checksum);
        if !checksums_agree {
            log::warn!(
                "checksums disagree: {:?}",
                reports.iter().map(|r| (r.partitions, r.checksum)).collect::<Vec<_>>()
            );
        }
        Ok(SweepReport {
            reports,
            checksums_agree,
        })
    }
}

fn run_partition<C: Communicator>(
    mesh: Arc<Mesh>,
    config: &BenchConfig,
    comm: C,
    threads: usize,
) -> Result<PartitionOutcome, RunError> {
    let partition = comm.rank();
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(move |i| format!("strata-p{partition}-w{i}"))
        .build()
        .map_err(|e| RunError::ThreadPool {
            partition,
            reason: e.to_string(),
        })?;
    PartitionRun::new(mesh, config, comm)?.run(&pool)
}

fn run_threaded(
    meshes: &[Arc<Mesh>],
    config: &BenchConfig,
    threads: usize,
) -> Result<Vec<PartitionOutcome>, RunError> {
    let comms = ThreadComm::universe(meshes.len());
    let results: Vec<Result<PartitionOutcome, RunError>> = thread::scope(|s| {
        let handles: Vec<_> = meshes
            .iter()
            .zip(comms)
            .map(|(mesh, comm)| {
                let partition = comm.rank();
                let mesh = Arc::clone(mesh);
                let handle = thread::Builder::new()
                    .name(format!("strata-p{partition}"))
                    .spawn_scoped(s, move || run_partition(mesh, config, comm, threads))
                    .map_err(|e| RunError::ThreadSpawn {
                        partition,
                        reason: e.to_string(),
                    });
                (partition, handle)
            })
            .collect();
        handles
            .into_iter()
            .map(|(partition, handle)| match handle {
                Ok(h) => h
                    .join()
                    .unwrap_or(Err(RunError::PartitionPanicked { partition })),
                Err(e) => Err(e),
            })
            .collect()
    });
    root_cause(results)
}

// A failing partition drops its communicator; every peer then fails with
// a disconnect. Report the partition that failed first.
fn root_cause(
    results: Vec<Result<PartitionOutcome, RunError>>,
) -> Result<Vec<PartitionOutcome>, RunError> {
    let mut outcomes = Vec::with_capacity(results.len());
    let mut errors: Vec<(PartitionId, RunError)> = Vec::new();
    for (rank, result) in results.into_iter().enumerate() {
        match result {
            Ok(o) => outcomes.push(o),
            Err(e) => errors.push((PartitionId(rank as u32), e)),
        }
    }
    if errors.is_empty() {
        return Ok(outcomes);
    }
    for (partition, e) in &errors {
        log::debug!("partition {partition} failed: {e}");
    }
    let i = errors.iter().position(|(_, e)| !e.is_cascade()).unwrap_or(0);
    Err(errors.swap_remove(i).1)
}
