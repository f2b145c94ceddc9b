//! Integration test: the gradient does not depend on how the work is split.
//!
//! The same configuration is run with every combination of partition and
//! worker counts. Every run must report the same checksum, min and max,
//! and the gathered gradients must match bit for bit.

use proptest::prelude::*;
use strata_engine::{BenchConfig, Benchmark};
use strata_kernel::FieldInit;

fn base(init: FieldInit) -> BenchConfig {
    BenchConfig {
        resolution: 3,
        levels: 5,
        iterations: 2,
        init,
        gather: true,
        ..BenchConfig::default()
    }
}

fn assert_splits_agree(bench: &Benchmark, config: &BenchConfig, splits: &[(usize, usize)]) {
    let reference = bench
        .run(&BenchConfig {
            partitions: 1,
            threads: Some(1),
            ..config.clone()
        })
        .unwrap();
    for &(partitions, threads) in splits {
        let report = bench
            .run(&BenchConfig {
                partitions,
                threads: Some(threads),
                ..config.clone()
            })
            .unwrap();
        let label = format!("{partitions} partitions x {threads} threads");
        assert_eq!(report.checksum, reference.checksum, "{label}");
        assert_eq!(report.min.to_bits(), reference.min.to_bits(), "{label}");
        assert_eq!(report.max.to_bits(), reference.max.to_bits(), "{label}");
        assert!(report.gradient == reference.gradient, "{label}: gradients differ");
    }
}

#[test]
fn zonal_field_is_split_independent() {
    let bench = Benchmark::new();
    let splits: Vec<(usize, usize)> = [1, 2, 3, 4]
        .into_iter()
        .flat_map(|p| [1, 2, 4].into_iter().map(move |t| (p, t)))
        .collect();
    assert_splits_agree(&bench, &base(FieldInit::Zonal), &splits);
}

#[test]
fn perturbed_field_is_split_independent() {
    let bench = Benchmark::new();
    let config = base(FieldInit::Perturbed {
        seed: 0x5eed,
        amplitude: 2.5,
    });
    assert_splits_agree(&bench, &config, &[(2, 3), (5, 1), (7, 2)]);
}

#[test]
fn sweep_reports_agreement() {
    let bench = Benchmark::new();
    let config = BenchConfig {
        gather: false,
        threads: Some(2),
        ..base(FieldInit::Stratified { lapse: -0.65 })
    };
    let sweep = bench.sweep(&config, &[1, 2, 3, 6]).unwrap();
    assert!(sweep.checksums_agree);
    let partitions: Vec<usize> = sweep.reports.iter().map(|r| r.partitions).collect();
    assert_eq!(partitions, vec![1, 2, 3, 6]);
}

#[test]
fn repeated_iterations_give_the_same_result() {
    // the kernel reads only the input field, so iteration count is invisible
    let bench = Benchmark::new();
    let once = bench
        .run(&BenchConfig {
            iterations: 1,
            ..base(FieldInit::Zonal)
        })
        .unwrap();
    let thrice = bench
        .run(&BenchConfig {
            iterations: 3,
            partitions: 2,
            ..base(FieldInit::Zonal)
        })
        .unwrap();
    assert_eq!(once.checksum, thrice.checksum);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(12))]

    #[test]
    fn any_split_matches_one_partition(
        partitions in 1usize..=8,
        threads in 1usize..=4,
        levels in 1usize..=4,
        seed in any::<u64>(),
    ) {
        let bench = Benchmark::new();
        let config = BenchConfig {
            resolution: 2,
            levels,
            iterations: 1,
            init: FieldInit::Perturbed { seed, amplitude: 1.0 },
            ..BenchConfig::default()
        };
        let serial = bench.run(&BenchConfig { threads: Some(1), ..config.clone() }).unwrap();
        let split = bench
            .run(&BenchConfig { partitions, threads: Some(threads), ..config })
            .unwrap();
        prop_assert_eq!(split.checksum, serial.checksum);
        prop_assert_eq!(split.min.to_bits(), serial.min.to_bits());
        prop_assert_eq!(split.max.to_bits(), serial.max.to_bits());
    }
}
