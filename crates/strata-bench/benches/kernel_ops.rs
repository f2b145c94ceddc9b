//! Criterion micro-benchmarks for the gradient kernel steps.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use strata_bench::KernelFixture;
use strata_engine::BenchConfig;
use strata_kernel::{accumulate_nodes, edge_fluxes, vertical_gradient, EdgeFluxes};

/// 64 x 32 grid (2048 nodes) with 32 levels.
fn config() -> BenchConfig {
    BenchConfig {
        resolution: 16,
        levels: 32,
        ..BenchConfig::default()
    }
}

fn fixture() -> KernelFixture {
    match KernelFixture::new(&config()) {
        Ok(fx) => fx,
        Err(e) => panic!("fixture: {e}"),
    }
}

fn pool(threads: usize) -> rayon::ThreadPool {
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .unwrap()
}

/// Benchmark: the full kernel at several worker counts.
fn bench_compute_threads(c: &mut Criterion) {
    let mut group = c.benchmark_group("green_gauss_compute");
    for threads in [1, 2, 4, 8] {
        let pool = pool(threads);
        let mut fx = fixture();
        group.bench_with_input(BenchmarkId::from_parameter(threads), &threads, |b, _| {
            b.iter(|| {
                pool.install(|| fx.compute()).unwrap();
                black_box(fx.grad.as_slice());
            });
        });
    }
    group.finish();
}

/// Benchmark: each kernel step alone, single worker.
fn bench_steps(c: &mut Criterion) {
    let pool = pool(1);
    let mut fx = fixture();
    let levels = config().levels;
    let mut fluxes = EdgeFluxes::new(fx.mesh.edge_count(), levels);

    c.bench_function("edge_fluxes_2k_nodes", |b| {
        b.iter(|| pool.install(|| edge_fluxes(&fx.mesh, &fx.field, &mut fluxes)).unwrap());
    });
    c.bench_function("accumulate_nodes_2k_nodes", |b| {
        b.iter(|| pool.install(|| accumulate_nodes(&fx.mesh, &fluxes, &mut fx.grad)).unwrap());
    });
    c.bench_function("vertical_gradient_2k_nodes", |b| {
        let dz = fx.kernel.dz();
        b.iter(|| {
            pool.install(|| vertical_gradient(&fx.mesh, &fx.field, dz, &mut fx.grad))
                .unwrap()
        });
    });
}

criterion_group!(benches, bench_compute_threads, bench_steps);
criterion_main!(benches);
