//! Criterion benchmarks for 2D H-rep polytope operations.
//! Focus sizes: m in {0, 10, 20, 50, 100} halfspaces per random polygon.
//! Results: by default under target/criterion; to store under data/bench, run:
//!   CARGO_TARGET_DIR=data/bench cargo bench -p polyabs

use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use rand::{rngs::StdRng, Rng, SeedableRng};

use polyabs::halfspace::Halfspace;
use polyabs::linalg::vector;
use polyabs::polytope::Polytope;

fn random_halfspaces(m: usize, seed: u64) -> Vec<Halfspace> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut hs = Vec::with_capacity(m);
    for _ in 0..m {
        let theta: f64 = rng.gen::<f64>() * std::f64::consts::TAU;
        let n = vector(&[theta.cos(), theta.sin()]);
        let c = rng.gen_range(0.5..1.5);
        hs.push(Halfspace::normalize(n, c));
    }
    hs
}

fn bench_intersection(c: &mut Criterion) {
    let mut group = c.benchmark_group("polytope_intersection");
    for &m in &[0usize, 10, 20, 50, 100] {
        group.bench_with_input(BenchmarkId::from_parameter(m), &m, |b, &m| {
            b.iter_batched(
                || random_halfspaces(m.max(4), m as u64),
                |hs| Polytope::intersection(hs).unwrap(),
                BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

fn bench_intersect_one(c: &mut Criterion) {
    let mut group = c.benchmark_group("polytope_intersect_one");
    for &m in &[4usize, 10, 20, 50, 100] {
        group.bench_with_input(BenchmarkId::from_parameter(m), &m, |b, &m| {
            let a = Polytope::intersection(random_halfspaces(m, 1)).unwrap();
            let bp = Polytope::intersection(random_halfspaces(m, 2)).unwrap();
            b.iter_batched(
                || (a.clone(), bp.clone()),
                |(a, bp)| a.intersect(&[bp]).unwrap(),
                BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

criterion_group!(benches, bench_intersection, bench_intersect_one);
criterion_main!(benches);
