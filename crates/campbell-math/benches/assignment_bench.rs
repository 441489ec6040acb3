// ─────────────────────────────────────────────────────────────────────
// Campbell Core — Assignment Benchmarks
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
use campbell_math::assignment::min_cost_assignment;
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use ndarray::Array2;
use std::hint::black_box;

fn pseudo_random_costs(rows: usize, cols: usize) -> Array2<i64> {
    // Deterministic LCG so runs compare across commits
    let mut state: u64 = 0x2545_f491;
    Array2::from_shape_fn((rows, cols), |_| {
        state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        ((state >> 33) % 10_000_000) as i64
    })
}

fn bench_assignment(c: &mut Criterion) {
    let mut group = c.benchmark_group("min_cost_assignment");
    for &n in &[10usize, 40, 100] {
        let cost = pseudo_random_costs(n, n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &cost, |b, cost| {
            b.iter(|| black_box(min_cost_assignment(cost).map(|p| p.len())))
        });
    }
    group.finish();
}

fn bench_rectangular(c: &mut Criterion) {
    let cost = pseudo_random_costs(30, 60);
    c.bench_function("min_cost_assignment_30x60", |b| {
        b.iter(|| black_box(min_cost_assignment(&cost).map(|p| p.len())))
    });
}

criterion_group!(benches, bench_assignment, bench_rectangular);
criterion_main!(benches);
