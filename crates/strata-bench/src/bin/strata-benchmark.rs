//! Run the gradient benchmark from the command line.
//!
//! ```text
//! strata-benchmark -N 64 --levels 137 --iterations 100 --partitions 1,2,4
//! ```
//!
//! Logging goes through `env_logger` (default filter `info`; set
//! `RUST_LOG=debug` for setup detail). Exits non-zero on any error and
//! when a partition sweep produces differing checksums.

use std::error::Error;

use clap::Parser;
use strata_bench::scaling_table;
use strata_engine::config::DEFAULT_COLUMN_HEIGHT;
use strata_engine::{BenchConfig, Benchmark};
use strata_kernel::FieldInit;

/// Green-Gauss gradient benchmark on a partitioned lon-lat mesh.
#[derive(Parser, Debug)]
#[command(name = "strata-benchmark", version, long_about = None)]
struct Cli {
    /// Horizontal resolution N; the grid is 4N x 2N
    #[arg(short = 'N', long, default_value_t = 64)]
    resolution: usize,
    /// Vertical levels per node
    #[arg(long, default_value_t = 137)]
    levels: usize,
    /// Kernel + halo exchange iterations
    #[arg(long, default_value_t = 100)]
    iterations: usize,
    /// Warm-up iterations left out of the timers [default: 0 for one
    /// iteration, else 1]
    #[arg(long)]
    exclude: Option<usize>,
    /// Rayon workers per partition [default: cores / partitions]
    #[arg(long)]
    threads: Option<usize>,
    /// Partition counts; more than one runs a scaling sweep
    #[arg(long, default_value = "1", value_delimiter = ',')]
    partitions: Vec<usize>,
    /// Field: zonal, stratified[:LAPSE], perturbed[:SEED[:AMPLITUDE]]
    #[arg(long, default_value = "zonal")]
    init: FieldInit,
    /// Column height spanned by the levels, in metres
    #[arg(long, default_value_t = DEFAULT_COLUMN_HEIGHT)]
    column_height: f64,
    /// Show a progress bar instead of per-iteration timings
    #[arg(long)]
    progress: bool,
}

impl Cli {
    fn config(&self) -> BenchConfig {
        BenchConfig {
            resolution: self.resolution,
            levels: self.levels,
            iterations: self.iterations,
            exclude: self.exclude,
            threads: self.threads,
            partitions: self.partitions.first().copied().unwrap_or(1),
            column_height: self.column_height,
            init: self.init,
            progress: self.progress,
            gather: false,
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    let config = cli.config();

    let bench = Benchmark::new();
    let sweep = bench.sweep(&config, &cli.partitions)?;
    for report in &sweep.reports {
        println!("{report}");
    }
    if sweep.reports.len() > 1 {
        println!("{}", scaling_table(&sweep));
    }
    if !sweep.checksums_agree {
        log::error!("partition sweep {:?} is not reproducible", cli.partitions);
        return Err("checksums differ between partition counts".into());
    }
    Ok(())
}
