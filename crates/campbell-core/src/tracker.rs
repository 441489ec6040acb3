// ─────────────────────────────────────────────────────────────────────
// Campbell Core — Mode Tracker
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Streaming mode tracking across ordered operating points.
//!
//! Every mode-set is compared through its latest mode with the candidate
//! modes of the next operating point. Similarity is the MAC penalized by the
//! frequency gap relative to the frequency window; the minimum-cost
//! assignment extends the sets and unmatched candidates open new ones.
//! Sets left without a match keep their modes and stay eligible for later
//! operating points.

use crate::cancel::CancelToken;
use campbell_math::assignment::min_cost_assignment;
use campbell_math::mac::mac;
use campbell_types::config::DiagramOptions;
use campbell_types::constants::ASSIGNMENT_COST_SCALE;
use campbell_types::error::{CampbellError, CampbellResult};
use campbell_types::modal::{resolve, Mode, ModeRef, ModeSet, OperatingPoint};
use ndarray::Array2;

/// Window and structural predicate applied to seeds and candidates.
///
/// The structural predicate only applies to operating points whose model
/// carries aerodynamic states.
pub fn passes_filter(mode: &Mode, opts: &DiagramOptions, has_aero_states: bool) -> bool {
    if !opts.in_window(mode.natural_freq_hz) {
        return false;
    }
    !(opts.structural_only && has_aero_states) || mode.is_structural()
}

fn candidates(op: &OperatingPoint, opts: &DiagramOptions) -> Vec<ModeRef> {
    op.modes
        .iter()
        .filter(|m| passes_filter(m, opts, op.model.has_aero_states))
        .map(Mode::key)
        .collect()
}

/// Penalized similarity between the latest mode of a set and a candidate.
pub fn similarity(prev: &Mode, next: &Mode, frequency_range: f64) -> f64 {
    let gap = (next.natural_freq_hz - prev.natural_freq_hz).abs() / frequency_range;
    (mac(&prev.eigenvector, &next.eigenvector) * (1.0 - gap)).max(0.0)
}

/// Integer costs `round(scale · (1 − w / w_max))`; all zero when `w_max` is 0.
pub fn cost_matrix(weights: &Array2<f64>) -> Array2<i64> {
    let w_max = weights.iter().copied().fold(0.0_f64, f64::max);
    if w_max <= 0.0 {
        return Array2::zeros(weights.dim());
    }
    weights.mapv(|w| (ASSIGNMENT_COST_SCALE * (1.0 - w / w_max)).round().max(0.0) as i64)
}

pub(crate) fn check_shape_lengths(ops: &[OperatingPoint]) -> CampbellResult<()> {
    let mut expected: Option<(usize, &str)> = None;
    for op in ops {
        for m in &op.modes {
            match expected {
                None => expected = Some((m.eigenvector.len(), op.name.as_str())),
                Some((len, first)) if len != m.eigenvector.len() => {
                    return Err(CampbellError::InvalidInput(format!(
                        "mode shapes of '{}' have {} entries, '{first}' has {len}",
                        op.name,
                        m.eigenvector.len()
                    )));
                }
                Some(_) => {}
            }
        }
    }
    Ok(())
}

/// Link the modes of `ops` (already in operating-point order) into sets.
///
/// Result is sorted by minimum frequency. An infeasible assignment at any
/// transition aborts tracking.
pub fn track_modes(
    ops: &[OperatingPoint],
    opts: &DiagramOptions,
    cancel: &CancelToken,
) -> CampbellResult<Vec<ModeSet>> {
    opts.validate()?;
    check_shape_lengths(ops)?;
    let Some(first) = ops.first() else {
        return Ok(Vec::new());
    };
    let range = opts.frequency_range();

    let mut sets: Vec<ModeSet> = Vec::new();
    for r in candidates(first, opts) {
        sets.push(ModeSet::new(sets.len(), r));
    }

    for (i, op) in ops.iter().enumerate().skip(1) {
        cancel.check(&format!("tracking operating point {i}"))?;
        let cands = candidates(op, opts);
        let mut matched = vec![false; cands.len()];

        if !sets.is_empty() && !cands.is_empty() {
            let mut weights = Array2::zeros((sets.len(), cands.len()));
            for (j, set) in sets.iter().enumerate() {
                let Some(last) = set.last() else { continue };
                let prev = resolve(ops, last);
                for (k, &c) in cands.iter().enumerate() {
                    weights[[j, k]] = similarity(prev, resolve(ops, c), range);
                }
            }
            let pairs = min_cost_assignment(&cost_matrix(&weights)).inspect_err(|_| {
                tracing::error!(op = i, name = %op.name, "mode assignment failed");
            })?;
            for (j, k) in pairs {
                sets[j].modes.push(cands[k]);
                matched[k] = true;
            }
        }

        let before = sets.len();
        for (k, &c) in cands.iter().enumerate() {
            if !matched[k] {
                sets.push(ModeSet::new(sets.len(), c));
            }
        }
        tracing::debug!(
            op = i,
            candidates = cands.len(),
            extended = matched.iter().filter(|&&m| m).count(),
            opened = sets.len() - before,
            "tracking transition"
        );
    }

    sets.retain(|s| !s.modes.is_empty());
    for s in sets.iter_mut() {
        s.update_frequency(ops);
    }
    sets.sort_by(|a, b| a.frequency[0].total_cmp(&b.frequency[0]));
    tracing::info!(
        operating_points = ops.len(),
        sets = sets.len(),
        "mode tracking complete"
    );
    Ok(sets)
}
