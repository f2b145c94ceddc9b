//! Integration test: end-to-end checksum against a stored value.
//!
//! One partition, one level, one iteration of the zonal field on the
//! 12 x 6 grid. Any change to mesh geometry, edge order, the kernel's
//! summation order or the hash shows up here.

use strata_engine::{BenchConfig, Benchmark};

const PINNED_CHECKSUM: u64 = 0xbcba_7c57_7305_7258;
const PINNED_MAX: f64 = 3.93577791288255e-12;

fn pinned() -> BenchConfig {
    BenchConfig {
        resolution: 3,
        levels: 1,
        iterations: 1,
        threads: Some(1),
        ..BenchConfig::default()
    }
}

#[test]
fn single_partition_checksum_is_pinned() {
    let report = Benchmark::new().run(&pinned()).unwrap();
    assert_eq!(report.nodes, 72);
    assert_eq!(report.edges, 72 + 60 + 12);
    assert_eq!(
        report.checksum, PINNED_CHECKSUM,
        "checksum {:#018x}",
        report.checksum
    );
    assert_eq!(report.max, PINNED_MAX);
    // the field is symmetric about the equator
    assert_eq!(report.min, -PINNED_MAX);
}

#[test]
fn pinned_checksum_survives_partitioning() {
    let bench = Benchmark::new();
    for partitions in [2, 3, 5, 24] {
        let report = bench
            .run(&BenchConfig {
                partitions,
                threads: Some(2),
                ..pinned()
            })
            .unwrap();
        assert_eq!(report.checksum, PINNED_CHECKSUM, "{partitions} partitions");
    }
}
