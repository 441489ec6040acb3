// ─────────────────────────────────────────────────────────────────────
// Campbell Core — Diagram Assembly
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
use crate::cancel::CancelToken;
use crate::cluster::refine_clusters;
use crate::modal::assign_op_indices;
use crate::tracker::track_modes;
use campbell_types::config::{ClusterConfig, DiagramOptions};
use campbell_types::diagram::{Diagram, Line, Point};
use campbell_types::error::CampbellResult;
use campbell_types::modal::{resolve, ModeSet, OperatingPoint};

/// True when any operating point has a positive wind speed.
pub fn has_wind(ops: &[OperatingPoint]) -> bool {
    ops.iter().any(|op| op.model.wind_speed > 0.0)
}

/// Stable sort by wind speed when any point has wind, else by rotor
/// speed; mode `op` indices are re-stamped to the new positions.
pub fn order_operating_points(ops: &mut [OperatingPoint]) {
    if has_wind(ops) {
        ops.sort_by(|a, b| a.model.wind_speed.total_cmp(&b.model.wind_speed));
    } else {
        ops.sort_by(|a, b| a.model.rotor_speed_rpm.total_cmp(&b.model.rotor_speed_rpm));
    }
    assign_op_indices(ops);
}

/// Render finished mode-sets as diagram lines, in set order.
pub fn assemble(ops: &[OperatingPoint], sets: &[ModeSet]) -> Diagram {
    let rotor_speeds: Vec<f64> = ops.iter().map(|op| op.model.rotor_speed_rpm).collect();
    let wind_speeds: Vec<f64> = ops.iter().map(|op| op.model.wind_speed).collect();

    let lines = sets
        .iter()
        .enumerate()
        .map(|(i, set)| Line {
            id: i,
            label: format!("Line {}", i + 1),
            points: set
                .modes
                .iter()
                .map(|&r| {
                    let m = resolve(ops, r);
                    Point {
                        line: i,
                        op: r.op,
                        mode: r.mode,
                        rotor_speed: rotor_speeds[r.op],
                        wind_speed: wind_speeds[r.op],
                        natural_freq_hz: m.natural_freq_hz,
                        damped_freq_hz: m.damped_freq_hz,
                        damping_ratio: m.damping_ratio,
                    }
                })
                .collect(),
        })
        .collect();

    Diagram {
        has_wind: has_wind(ops),
        rotor_speeds,
        wind_speeds,
        lines,
    }
}

/// Track, optionally refine, and assemble. `ops` must already be ordered.
pub fn build_diagram(
    ops: &mut [OperatingPoint],
    opts: &DiagramOptions,
    clustering: &ClusterConfig,
    cancel: &CancelToken,
) -> CampbellResult<(Diagram, Vec<ModeSet>)> {
    let mut sets = track_modes(ops, opts, cancel)?;
    if opts.cluster {
        refine_clusters(ops, &mut sets, clustering, cancel)?;
    }
    let diagram = assemble(ops, &sets);
    tracing::info!(
        operating_points = ops.len(),
        lines = diagram.lines.len(),
        has_wind = diagram.has_wind,
        "diagram assembled"
    );
    Ok((diagram, sets))
}
