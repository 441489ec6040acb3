// ─────────────────────────────────────────────────────────────────────
// Campbell Core — Transform and Tracking Benchmarks
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
use campbell_core::cancel::CancelToken;
use campbell_core::mbc::mbc_transform;
use campbell_core::modal::eigen_analysis;
use campbell_core::tracker::track_modes;
use campbell_types::config::DiagramOptions;
use campbell_types::constants::TWO_PI;
use campbell_types::modal::OperatingPoint;
use campbell_types::snapshot::{AggregatedSeries, Descriptor};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use ndarray::Array2;
use std::hint::black_box;

fn desc(index: usize, rotating: bool, label: String) -> Descriptor {
    Descriptor {
        index,
        value: 0.0,
        rotating,
        derivative_order: 2,
        label,
    }
}

/// `fixed` tower DOFs plus `blade_dofs` triplets, positions then rates.
fn rotor_series(fixed: usize, blade_dofs: usize, steps: usize) -> AggregatedSeries {
    let mut positions = Vec::new();
    for i in 0..fixed {
        positions.push((false, format!("ED tower dof {i}, m")));
    }
    for d in 0..blade_dofs {
        for b in 1..=3 {
            positions.push((true, format!("ED bending dof {d} of blade {b}, m")));
        }
    }
    let m = positions.len();
    let mut states: Vec<Descriptor> = Vec::with_capacity(2 * m);
    for (i, (rot, label)) in positions.iter().enumerate() {
        states.push(desc(i, *rot, label.clone()));
    }
    for (i, (rot, label)) in positions.iter().enumerate() {
        let rate = format!("ED First time derivative of {}", &label[3..]);
        states.push(desc(m + i, *rot, rate));
    }

    // Deterministic LCG so runs compare across commits
    let mut seed: u64 = 0x9e37_79b9;
    let mut next = move || {
        seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        ((seed >> 33) as f64 / (1u64 << 31) as f64) - 0.5
    };
    let mut a = Array2::zeros((2 * m, 2 * m));
    for i in 0..m {
        let w = TWO_PI * (0.2 + 0.15 * i as f64);
        a[[i, m + i]] = 1.0;
        a[[m + i, i]] = -w * w;
        a[[m + i, m + i]] = -0.02 * w;
        for j in 0..m {
            if i != j {
                a[[m + i, j]] += 0.05 * next();
            }
        }
    }

    let n = 2 * m;
    AggregatedSeries {
        azimuths: (0..steps).map(|k| TWO_PI * k as f64 / steps as f64).collect(),
        rotor_speeds: vec![1.2; steps],
        wind_speeds: vec![8.0; steps],
        a: vec![a; steps],
        x: Array2::zeros((steps, n)),
        xdot: Array2::zeros((steps, n)),
        states,
        inputs: vec![],
        outputs: vec![],
    }
}

fn bench_mbc(c: &mut Criterion) {
    let mut group = c.benchmark_group("mbc_transform");
    for &(fixed, blades) in &[(4usize, 2usize), (10, 6), (20, 12)] {
        let series = rotor_series(fixed, blades, 36);
        let label = format!("{}states", series.num_states());
        group.bench_with_input(BenchmarkId::from_parameter(label), &series, |b, s| {
            b.iter(|| black_box(mbc_transform(s).map(|m| m.avg_a.sum())))
        });
    }
    group.finish();
}

fn bench_tracking(c: &mut Criterion) {
    let ops: Vec<OperatingPoint> = (0..20)
        .map(|k| {
            let mut series = rotor_series(10, 6, 8);
            series.rotor_speeds.iter_mut().for_each(|w| *w = 0.05 * k as f64);
            let model = mbc_transform(&series).unwrap_or_default();
            let modes = eigen_analysis(&model, k).unwrap_or_default();
            OperatingPoint {
                name: format!("op{k:02}"),
                model,
                modes,
            }
        })
        .collect();
    let opts = DiagramOptions::default();
    c.bench_function("track_modes_20ops", |b| {
        b.iter(|| black_box(track_modes(&ops, &opts, &CancelToken::new()).map(|s| s.len())))
    });
}

criterion_group!(benches, bench_mbc, bench_tracking);
criterion_main!(benches);
