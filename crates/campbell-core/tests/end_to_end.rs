// ─────────────────────────────────────────────────────────────────────
// Campbell Core — End-to-End Tests
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Linearization data through to a finished Campbell diagram.

use campbell_core::cancel::CancelToken;
use campbell_core::linfile::format_lin;
use campbell_core::pipeline::{analyze_directory, analyze_groups, finish, PipelineOutput};
use campbell_types::config::{AnalysisConfig, FailurePolicy, PipelineConfig};
use campbell_types::constants::TWO_PI;
use campbell_types::diagram::Diagram;
use campbell_types::modal::{resolve, Mode};
use campbell_types::snapshot::{Descriptor, OperatingPointGroup, Snapshot};
use ndarray::Array2;

fn desc(index: usize, rotating: bool, label: String) -> Descriptor {
    Descriptor {
        index,
        value: 0.0,
        rotating,
        derivative_order: 2,
        label,
    }
}

fn snapshot(
    name: &str,
    step: usize,
    descs: Vec<Descriptor>,
    a: Array2<f64>,
    omega: f64,
    azimuth: f64,
) -> Snapshot {
    let n = descs.len();
    Snapshot {
        source: format!("{name}.{step}.lin"),
        sim_time: step as f64,
        rotor_speed: omega,
        azimuth,
        wind_speed: 0.0,
        num_states: n,
        num_discrete_states: 0,
        num_constraint_states: 0,
        num_inputs: 0,
        num_outputs: 0,
        state_rates: descs.clone(),
        states: descs,
        inputs: vec![],
        outputs: vec![],
        a,
        b: Array2::zeros((n, 0)),
        c: Array2::zeros((0, n)),
        d: Array2::zeros((0, 0)),
    }
}

/// Decoupled fixed-frame oscillators `[q; q̇]` at the given frequencies.
fn tower_snapshot(name: &str, omega: f64, freqs_hz: &[f64]) -> Snapshot {
    let m = freqs_hz.len();
    let mut descs: Vec<Descriptor> = (0..m)
        .map(|i| desc(i, false, format!("ED tower dof {i}, m")))
        .collect();
    descs.extend((0..m).map(|i| {
        let label = format!("ED First time derivative of tower dof {i}, m/s");
        desc(m + i, false, label)
    }));

    let mut a = Array2::zeros((2 * m, 2 * m));
    for (i, f) in freqs_hz.iter().enumerate() {
        let w = TWO_PI * f;
        a[[i, m + i]] = 1.0;
        a[[m + i, i]] = -w * w;
        a[[m + i, m + i]] = -0.02 * w;
    }
    snapshot(name, 1, descs, a, omega, 0.0)
}

fn tower_group(name: &str, omega: f64, freqs_hz: &[f64]) -> OperatingPointGroup {
    OperatingPointGroup::new(name, vec![tower_snapshot(name, omega, freqs_hz)]).unwrap()
}

fn workers(n: usize) -> PipelineConfig {
    PipelineConfig {
        num_workers: Some(n),
        failure_policy: FailurePolicy::AbortAll,
    }
}

fn run_groups(groups: &[OperatingPointGroup], cfg: &AnalysisConfig) -> PipelineOutput {
    let cancel = CancelToken::new();
    let modal = analyze_groups(groups, &cfg.pipeline, &cancel).unwrap();
    finish(modal, cfg, &cancel).unwrap()
}

fn dominant_dof(m: &Mode) -> usize {
    m.magnitudes
        .iter()
        .enumerate()
        .max_by(|x, y| x.1.total_cmp(y.1))
        .map(|(i, _)| i)
        .unwrap()
}

fn line_freqs(diagram: &Diagram, line: usize) -> Vec<f64> {
    diagram.lines[line].points.iter().map(|p| p.natural_freq_hz).collect()
}

#[test]
fn well_separated_modes_give_one_line_each() {
    let groups: Vec<_> = (0..5)
        .map(|k| {
            let s = 1.0 + 0.01 * k as f64;
            tower_group(&format!("op{k}"), 0.2 * (k + 1) as f64, &[0.3 * s, 0.9 * s, 1.6 * s])
        })
        .collect();
    let cfg = AnalysisConfig {
        pipeline: workers(2),
        ..Default::default()
    };
    let out = run_groups(&groups, &cfg);

    assert_eq!(out.mode_sets.len(), 3);
    assert!(out.mode_sets.iter().all(|s| s.is_complete(5)));
    assert_eq!(out.diagram.lines.len(), 3);
    for (i, expected) in [0.3, 0.9, 1.6].iter().enumerate() {
        let freqs = line_freqs(&out.diagram, i);
        assert_eq!(freqs.len(), 5);
        for (k, f) in freqs.iter().enumerate() {
            let want = expected * (1.0 + 0.01 * k as f64);
            assert!((f - want).abs() < 1e-6, "line {i} point {k}: {f} vs {want}");
        }
    }
    assert!(!out.diagram.has_wind);
    assert_eq!(out.diagram.rotor_speeds.len(), 5);
}

#[test]
fn crossing_frequencies_follow_mode_shapes() {
    let a = [0.50, 0.58, 0.66, 0.74];
    let b = [0.70, 0.64, 0.56, 0.48];
    let groups: Vec<_> = (0..4)
        .map(|k| tower_group(&format!("op{k}"), 0.3 * (k + 1) as f64, &[a[k], b[k]]))
        .collect();
    let out = run_groups(&groups, &AnalysisConfig::default());

    assert_eq!(out.diagram.lines.len(), 2);
    // Sorted by minimum frequency: the falling mode reaches 0.48.
    let falling = line_freqs(&out.diagram, 0);
    let rising = line_freqs(&out.diagram, 1);
    for k in 0..4 {
        assert!((falling[k] - b[k]).abs() < 1e-6);
        assert!((rising[k] - a[k]).abs() < 1e-6);
    }

    for set in &out.mode_sets {
        let first = resolve(&out.operating_points, set.modes[0]);
        let dominant = dominant_dof(first);
        for &r in &set.modes {
            let m = resolve(&out.operating_points, r);
            assert_eq!(dominant_dof(m), dominant, "set {} switched shape at op {}", set.id, r.op);
        }
    }
}

#[test]
fn isotropic_rotor_splits_into_whirl_frequencies() {
    let w0 = TWO_PI;
    let omega = 1.0;
    let descs: Vec<Descriptor> = (0..3)
        .map(|b| desc(b, true, format!("ED 1st flapwise bending-mode DOF of blade {}, m", b + 1)))
        .chain((0..3).map(|b| {
            desc(
                3 + b,
                true,
                format!("ED First time derivative of 1st flapwise bending-mode DOF of blade {}, m/s", b + 1),
            )
        }))
        .collect();
    let mut a = Array2::zeros((6, 6));
    for b in 0..3 {
        a[[b, 3 + b]] = 1.0;
        a[[3 + b, b]] = -w0 * w0;
    }
    let snaps: Vec<Snapshot> = [0.0, 1.1, 2.5, 4.0]
        .iter()
        .enumerate()
        .map(|(k, &az)| snapshot("rotor", k + 1, descs.clone(), a.clone(), omega, az))
        .collect();
    let group = OperatingPointGroup::new("rotor", snaps).unwrap();

    let cancel = CancelToken::new();
    let modal = analyze_groups(&[group], &workers(1), &cancel).unwrap();
    let modes = &modal.operating_points[0].modes;
    assert_eq!(modes.len(), 3);
    let expected = [(w0 - omega) / TWO_PI, w0 / TWO_PI, (w0 + omega) / TWO_PI];
    for (m, want) in modes.iter().zip(expected) {
        assert!((m.natural_freq_hz - want).abs() < 1e-7, "{} vs {want}", m.natural_freq_hz);
        assert!(m.damping_ratio.abs() < 1e-7);
    }
    assert!(modal.operating_points[0].model.rotor_speed_rpm > 0.0);
}

#[test]
fn clustering_keeps_one_mode_per_operating_point() {
    let groups: Vec<_> = (0..6)
        .map(|k| {
            let s = 1.0 + 0.005 * k as f64;
            tower_group(&format!("op{k}"), 0.1 * (k + 1) as f64, &[0.40 * s, 0.42 * s, 0.44 * s, 1.5 * s])
        })
        .collect();
    let out = run_groups(&groups, &AnalysisConfig::default());

    for set in &out.mode_sets {
        let mut seen: Vec<usize> = set.modes.iter().map(|r| r.op).collect();
        seen.sort_unstable();
        let before = seen.len();
        seen.dedup();
        assert_eq!(seen.len(), before, "set {} repeats an operating point", set.id);
    }
    let total: usize = out.mode_sets.iter().map(|s| s.modes.len()).sum();
    assert_eq!(total, 6 * 4);
    for set in &out.mode_sets {
        for &r in &set.modes {
            let m = resolve(&out.operating_points, r);
            if let Some(tag) = m.cluster {
                assert_eq!(tag, set.id);
            }
        }
    }
}

#[test]
fn frequency_window_limits_lines() {
    let groups: Vec<_> = (0..3)
        .map(|k| tower_group(&format!("op{k}"), 0.5 * (k + 1) as f64, &[0.3, 2.0, 7.0]))
        .collect();
    let mut cfg = AnalysisConfig::default();
    cfg.diagram.max_freq_hz = 3.0;
    let out = run_groups(&groups, &cfg);
    assert_eq!(out.diagram.lines.len(), 2);
    assert!(out
        .diagram
        .lines
        .iter()
        .flat_map(|l| &l.points)
        .all(|p| p.natural_freq_hz < 3.0));
}

#[test]
fn lin_directory_to_diagram_json() {
    let dir = tempfile::tempdir().unwrap();
    // Names sort opposite to rotor speed.
    let cases = [("case_a", 1.5), ("case_b", 1.0), ("case_c", 0.5)];
    for (name, omega) in cases {
        for step in 1..=2 {
            let mut snap = tower_snapshot(name, omega, &[0.35, 1.2]);
            snap.azimuth = step as f64;
            snap.source = format!("{name}.{step}.lin");
            std::fs::write(dir.path().join(&snap.source), format_lin(&snap)).unwrap();
        }
    }
    std::fs::write(dir.path().join("notes.txt"), "not a linearization file").unwrap();

    let cfg = AnalysisConfig::default();
    let out = analyze_directory(dir.path(), &cfg, &CancelToken::new()).unwrap();
    let names: Vec<&str> = out.operating_points.iter().map(|o| o.name.as_str()).collect();
    assert_eq!(names, vec!["case_c", "case_b", "case_a"]);
    assert_eq!(out.diagram.lines.len(), 2);
    assert!(out.diagram.rotor_speeds.windows(2).all(|w| w[0] < w[1]));

    let path = dir.path().join("campbell.json");
    let path = path.to_str().unwrap();
    out.diagram.save(path).unwrap();
    let back = Diagram::load(path).unwrap();
    assert_eq!(back.lines.len(), out.diagram.lines.len());
    assert_eq!(back.rotor_speeds, out.diagram.rotor_speeds);
}

#[test]
fn empty_directory_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(analyze_directory(dir.path(), &AnalysisConfig::default(), &CancelToken::new()).is_err());
}
