//! Results of a benchmark run.

use std::fmt;
use std::time::Duration;

use strata_core::GlobalId;

use crate::config::BenchConfig;
use crate::timer::TimerStats;

/// Wall time of one iteration as seen by partition 0.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IterationTiming {
    /// Kernel, both barriers and the exchange.
    pub total: Duration,
    /// The halo exchange alone.
    pub halo: Duration,
}

impl IterationTiming {
    /// Share of the iteration spent in the halo exchange, in percent.
    pub fn halo_percent(&self) -> f64 {
        percent(self.halo, self.total)
    }
}

fn percent(part: Duration, whole: Duration) -> f64 {
    let whole = whole.as_secs_f64();
    if whole > 0.0 {
        100.0 * part.as_secs_f64() / whole
    } else {
        0.0
    }
}

/// Everything a run produced.
#[derive(Clone, Debug)]
pub struct BenchReport {
    /// The configuration that was run.
    pub config: BenchConfig,
    /// Partition count.
    pub partitions: usize,
    /// Rayon workers per partition.
    pub threads: usize,
    /// Global node count.
    pub nodes: usize,
    /// Global edge count.
    pub edges: usize,
    /// Mesh build, partitioning, field and exchange setup.
    pub setup: Duration,
    /// Every iteration, warm-up included.
    pub iterations: Vec<IterationTiming>,
    /// Full-iteration statistics after warm-up.
    pub iteration_stats: TimerStats,
    /// Halo exchange statistics after warm-up.
    pub halo_stats: TimerStats,
    /// Smallest gradient component on any owned node.
    pub min: f64,
    /// Largest gradient component on any owned node.
    pub max: f64,
    /// Partition-independent checksum of the final gradient.
    pub checksum: u64,
    /// Final gradient per node, ascending by global id. Only with
    /// [`BenchConfig::gather`].
    pub gradient: Option<Vec<(GlobalId, Vec<f64>)>>,
}

impl BenchReport {
    /// Average share of an iteration spent in the halo exchange, in
    /// percent, over the timed iterations.
    pub fn halo_fraction(&self) -> f64 {
        percent(self.halo_stats.avg(), self.iteration_stats.avg())
    }
}

impl fmt::Display for BenchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = &self.config;
        writeln!(f, "strata gradient benchmark")?;
        writeln!(
            f,
            "  N = {} ({} nodes, {} edges), levels = {}, init = {}",
            c.resolution, self.nodes, self.edges, c.levels, c.init
        )?;
        writeln!(
            f,
            "  partitions = {}, threads = {}, iterations = {} ({} excluded)",
            self.partitions,
            self.threads,
            c.iterations,
            c.resolved_exclude()
        )?;
        writeln!(f, "  setup: {:.5}", self.setup.as_secs_f64())?;
        writeln!(f, "timers")?;
        writeln!(f, "  {}", self.iteration_stats)?;
        writeln!(f, "  {}", self.halo_stats)?;
        writeln!(f, "  halo share: {:.2} %", self.halo_fraction())?;
        writeln!(f, "  maxval: {:.15e}", self.max)?;
        writeln!(f, "  minval: {:.15e}", self.min)?;
        write!(f, "  checksum: {:#018x}", self.checksum)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> BenchReport {
        let mut iteration_stats = TimerStats::new("iteration");
        let mut halo_stats = TimerStats::new("halo");
        iteration_stats.update(Duration::from_millis(40));
        halo_stats.update(Duration::from_millis(10));
        BenchReport {
            config: BenchConfig::default(),
            partitions: 2,
            threads: 4,
            nodes: 32768,
            edges: 65536,
            setup: Duration::from_millis(120),
            iterations: vec![IterationTiming {
                total: Duration::from_millis(40),
                halo: Duration::from_millis(10),
            }],
            iteration_stats,
            halo_stats,
            min: -1.5,
            max: 2.5,
            checksum: 0xdead_beef,
            gradient: None,
        }
    }

    #[test]
    fn halo_fraction_is_a_percentage() {
        let r = report();
        assert!((r.halo_fraction() - 25.0).abs() < 1e-9);
        assert!((r.iterations[0].halo_percent() - 25.0).abs() < 1e-9);
        assert_eq!(IterationTiming::default().halo_percent(), 0.0);
    }

    #[test]
    fn display_lists_timers_and_checksum() {
        let text = report().to_string();
        assert!(text.contains("partitions = 2, threads = 4"));
        assert!(text.contains("halo: min, max, avg -- 0.01000, 0.01000, 0.01000"));
        assert!(text.contains("checksum: 0x00000000deadbeef"));
        assert!(text.contains("maxval: 2.5"));
    }
}
