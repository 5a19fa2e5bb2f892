use beamkit_camtools::PathOptimizer;
use beamkit_core::geometry::{Curve, CurvePath, PathSet, Point};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn scattered_paths(count: usize) -> PathSet {
    (0..count)
        .map(|i| {
            let x = ((i * 7919) % 1000) as f64;
            let y = ((i * 104729) % 1000) as f64;
            CurvePath::new(vec![Curve::line(
                Point::new(x, y),
                Point::new(x + 2.0, y),
            )])
        })
        .collect()
}

fn bench_optimize(c: &mut Criterion) {
    let paths = scattered_paths(512);
    c.bench_function("optimize 512 paths", |b| {
        b.iter(|| PathOptimizer::optimize(black_box(paths.clone()), 0.0))
    });

    let large = scattered_paths(4096);
    c.bench_function("optimize_parallel 4096 paths", |b| {
        b.iter(|| PathOptimizer::optimize_parallel(black_box(large.clone()), 0.0))
    });
}

criterion_group!(benches, bench_optimize);
criterion_main!(benches);
