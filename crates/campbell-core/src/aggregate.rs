// ─────────────────────────────────────────────────────────────────────
// Campbell Core — Aggregation
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
use campbell_types::snapshot::{AggregatedSeries, OperatingPointGroup};
use ndarray::Array2;

/// Stack the snapshots of one group by ascending azimuth.
///
/// Descriptor lists are taken once from the group; the group constructor
/// already guarantees they agree across snapshots.
pub fn aggregate(group: &OperatingPointGroup) -> AggregatedSeries {
    let mut snaps: Vec<_> = group.snapshots().iter().collect();
    snaps.sort_by(|a, b| a.azimuth.total_cmp(&b.azimuth));

    let steps = snaps.len();
    let n = snaps.first().map_or(0, |s| s.num_states);

    let mut x = Array2::zeros((steps, n));
    let mut xdot = Array2::zeros((steps, n));
    for (k, s) in snaps.iter().enumerate() {
        x.row_mut(k).assign(&s.state_values());
        xdot.row_mut(k).assign(&s.state_rate_values());
    }

    let template = snaps.last();
    AggregatedSeries {
        azimuths: snaps.iter().map(|s| s.azimuth).collect(),
        rotor_speeds: snaps.iter().map(|s| s.rotor_speed).collect(),
        wind_speeds: snaps.iter().map(|s| s.wind_speed).collect(),
        a: snaps.iter().map(|s| s.a.clone()).collect(),
        x,
        xdot,
        states: template.map(|s| s.states.clone()).unwrap_or_default(),
        inputs: template.map(|s| s.inputs.clone()).unwrap_or_default(),
        outputs: template.map(|s| s.outputs.clone()).unwrap_or_default(),
    }
}
