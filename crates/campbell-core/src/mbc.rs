// ─────────────────────────────────────────────────────────────────────
// Campbell Core — Multi-Blade Coordinate Transform
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Multi-blade coordinate transform for three-bladed rotors.
//!
//! State vector is reordered as `[q2, q2dot, q1]`, each part as fixed
//! entries followed by blade triplets. Per azimuth step:
//!
//! ```text
//! L   = [[T1, 0, 0], [Ω·T2, T1, 0], [0, 0, T1q]]
//! R   = [[Ω·T2, 0, 0], [Ω²·T3 + Ω̇·T2, 2Ω·T2, 0], [0, 0, Ω·T2q]]
//! Anr = blkdiag(T1⁻¹, T1⁻¹, T1q⁻¹) · (P A Pᵀ · L − R)
//! ```
//!
//! and the non-rotating matrix is the step average of `Pᵀ Anr P`.

use crate::ordering::triplet_ordering;
use campbell_math::linalg::{invert, permute_symmetric, place_block, unpermute_symmetric};
use campbell_types::constants::{
    AERO_MODULE, NUM_BLADES, RAD_PER_SEC_TO_RPM, ROTOR_ANGULAR_ACCELERATION, TWO_PI,
};
use campbell_types::error::{CampbellError, CampbellResult};
use campbell_types::modal::NonRotatingModel;
use campbell_types::snapshot::{AggregatedSeries, Descriptor, StateOrdering};
use ndarray::{s, Array1, Array2, Axis};

// ── Blade matrices ───────────────────────────────────────────────────

/// Per-blade rotation `t̃` and its first and second azimuth derivatives.
struct BladeMatrices {
    tt: Array2<f64>,
    tt_inv: Array2<f64>,
    tt2: Array2<f64>,
    tt3: Array2<f64>,
}

impl BladeMatrices {
    fn at(azimuth: f64) -> CampbellResult<Self> {
        let mut tt = Array2::zeros((NUM_BLADES, 3));
        let mut tt2 = Array2::zeros((NUM_BLADES, 3));
        let mut tt3 = Array2::zeros((NUM_BLADES, 3));
        for j in 0..NUM_BLADES {
            let xi = azimuth + TWO_PI * j as f64 / NUM_BLADES as f64;
            let (sin, cos) = xi.sin_cos();
            tt.row_mut(j).assign(&ndarray::arr1(&[1.0, cos, sin]));
            tt2.row_mut(j).assign(&ndarray::arr1(&[0.0, -sin, cos]));
            tt3.row_mut(j).assign(&ndarray::arr1(&[0.0, -cos, -sin]));
        }
        let tt_inv = invert(&tt).map_err(|e| {
            CampbellError::SingularMatrix(format!("blade transform at azimuth {azimuth:.6} rad: {e}"))
        })?;
        Ok(BladeMatrices {
            tt,
            tt_inv,
            tt2,
            tt3,
        })
    }
}

/// `fixed_diag · I` on the fixed entries, then `block` once per triplet.
fn blade_operator(ordering: &StateOrdering, fixed_diag: f64, block: &Array2<f64>) -> Array2<f64> {
    let n = ordering.num_fixed + 3 * ordering.num_triplets();
    let mut op = Array2::zeros((n, n));
    for i in 0..ordering.num_fixed {
        op[[i, i]] = fixed_diag;
    }
    for t in 0..ordering.num_triplets() {
        let at = ordering.num_fixed + 3 * t;
        place_block(&mut op, at, at, block);
    }
    op
}

fn block_diag(parts: &[&Array2<f64>]) -> Array2<f64> {
    let n: usize = parts.iter().map(|p| p.nrows()).sum();
    let mut out = Array2::zeros((n, n));
    let mut at = 0;
    for p in parts {
        place_block(&mut out, at, at, p);
        at += p.nrows();
    }
    out
}

// ── State partition ──────────────────────────────────────────────────

/// Orderings of the `q2`, `q2dot` and `q1` parts of the state vector.
#[derive(Debug, Clone)]
pub struct StatePartition {
    pub q2: StateOrdering,
    pub q2dot: StateOrdering,
    pub q1: StateOrdering,
}

impl StatePartition {
    /// Split by derivative order after a stable sort on the descriptor key.
    ///
    /// Second-order entries are taken to be positions for the first half
    /// and rates for the second half; an odd count is rejected.
    pub fn from_states(states: &[Descriptor]) -> CampbellResult<Self> {
        let mut sorted: Vec<Descriptor> = states.to_vec();
        sorted.sort_by_key(Descriptor::sort_key);

        let num_x1 = sorted.iter().filter(|d| d.derivative_order == 1).count();
        let num_x2 = sorted.len() - num_x1;
        if num_x2 % 2 != 0 {
            return Err(CampbellError::InvalidInput(format!(
                "{num_x2} second-order states cannot split evenly into positions and rates"
            )));
        }
        let half = num_x2 / 2;
        Ok(StatePartition {
            q2: triplet_ordering(&sorted[..half]),
            q2dot: triplet_ordering(&sorted[half..num_x2]),
            q1: triplet_ordering(&sorted[num_x2..]),
        })
    }

    pub fn combined(&self) -> StateOrdering {
        StateOrdering::combine(&[&self.q2, &self.q2dot, &self.q1])
    }

    /// Sorted `q2` and `q1` indices; `q2dot` duplicates `q2` in mode shapes.
    pub fn eigen_indices(&self) -> Vec<usize> {
        let mut idx: Vec<usize> = self
            .q2
            .indices
            .iter()
            .chain(&self.q1.indices)
            .copied()
            .collect();
        idx.sort_unstable();
        idx
    }
}

// ── Transform ────────────────────────────────────────────────────────

/// One step's non-rotating state matrix, in original state order.
fn step_matrix(
    a: &Array2<f64>,
    part: &StatePartition,
    order: &[usize],
    azimuth: f64,
    omega: f64,
) -> CampbellResult<Array2<f64>> {
    let omega_dot = ROTOR_ANGULAR_ACCELERATION;
    let bm = BladeMatrices::at(azimuth)?;

    let t1 = blade_operator(&part.q2, 1.0, &bm.tt);
    let t1_inv = blade_operator(&part.q2, 1.0, &bm.tt_inv);
    let t2 = blade_operator(&part.q2, 0.0, &bm.tt2);
    let t3 = blade_operator(&part.q2, 0.0, &bm.tt3);
    let t1q = blade_operator(&part.q1, 1.0, &bm.tt);
    let t1q_inv = blade_operator(&part.q1, 1.0, &bm.tt_inv);
    let t2q = blade_operator(&part.q1, 0.0, &bm.tt2);

    let n2 = part.q2.num;
    let n2d = part.q2dot.num;

    let mut l = block_diag(&[&t1, &t1, &t1q]);
    l.slice_mut(s![n2..n2 + n2d, ..n2]).assign(&(&t2 * omega));

    let mut r = block_diag(&[&(&t2 * omega), &(&t2 * (2.0 * omega)), &(&t2q * omega)]);
    r.slice_mut(s![n2..n2 + n2d, ..n2])
        .assign(&(&t3 * (omega * omega) + &t2 * omega_dot));

    let reordered = permute_symmetric(a, order);
    let inner = reordered.dot(&l) - &r;
    let anr = block_diag(&[&t1_inv, &t1_inv, &t1q_inv]).dot(&inner);
    Ok(unpermute_symmetric(&anr, order))
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Average the rotating-frame series of one operating point into a
/// non-rotating model.
pub fn mbc_transform(series: &AggregatedSeries) -> CampbellResult<NonRotatingModel> {
    let steps = series.num_steps();
    let n = series.num_states();
    if steps == 0 {
        return Err(CampbellError::InvalidInput(
            "multi-blade transform needs at least one azimuth step".to_string(),
        ));
    }
    if let Some(d) = series.states.iter().enumerate().find(|(i, d)| d.index != *i) {
        return Err(CampbellError::InvalidInput(format!(
            "state descriptor at position {} carries index {}",
            d.0, d.1.index
        )));
    }
    for (k, a) in series.a.iter().enumerate() {
        if a.dim() != (n, n) {
            return Err(CampbellError::CountMismatch {
                context: format!("A matrix of azimuth step {k}"),
                expected: n,
                found: a.nrows(),
            });
        }
    }

    let part = StatePartition::from_states(&series.states)?;
    let ordering = part.combined();
    let triplets = part.q2.num_triplets() + part.q1.num_triplets();
    tracing::debug!(
        states = n,
        steps,
        q2 = part.q2.num,
        q1 = part.q1.num,
        triplets,
        "multi-blade transform"
    );

    let mut avg_a = Array2::<f64>::zeros((n, n));
    for k in 0..steps {
        avg_a += &step_matrix(
            &series.a[k],
            &part,
            &ordering.indices,
            series.azimuths[k],
            series.rotor_speeds[k],
        )?;
    }
    avg_a /= steps as f64;

    let avg_x: Array1<f64> = series.x.sum_axis(Axis(0)) / steps as f64;
    let avg_xdot: Array1<f64> = series.xdot.sum_axis(Axis(0)) / steps as f64;

    let eigen_indices = part.eigen_indices();
    let eigen_labels: Vec<String> = eigen_indices
        .iter()
        .map(|&i| series.states[i].label.clone())
        .collect();
    let has_aero_states = eigen_labels.iter().any(|l| l.starts_with(AERO_MODULE));

    Ok(NonRotatingModel {
        avg_a,
        avg_x,
        avg_xdot,
        ordering,
        ordering_q2: part.q2,
        ordering_q2dot: part.q2dot,
        ordering_q1: part.q1,
        ordering_inputs: triplet_ordering(&series.inputs),
        ordering_outputs: triplet_ordering(&series.outputs),
        azimuths: series.azimuths.clone(),
        rotor_speed_rpm: mean(&series.rotor_speeds) * RAD_PER_SEC_TO_RPM,
        wind_speed: mean(&series.wind_speeds),
        eigen_indices,
        eigen_labels,
        has_aero_states,
    })
}
