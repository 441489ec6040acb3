// ─────────────────────────────────────────────────────────────────────
// Campbell Core — Modal Results
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
use crate::constants::STRUCTURAL_MODULES;
use crate::snapshot::StateOrdering;
use ndarray::{Array1, Array2};
use num_complex::Complex64;

/// Averaged non-rotating model of one operating point.
#[derive(Debug, Clone, Default)]
pub struct NonRotatingModel {
    pub avg_a: Array2<f64>,      // [num_states, num_states]
    pub avg_x: Array1<f64>,      // mean state operating point
    pub avg_xdot: Array1<f64>,   // mean state-rate operating point
    pub ordering: StateOrdering, // q2, q2dot, q1 combined
    pub ordering_q2: StateOrdering,
    pub ordering_q2dot: StateOrdering,
    pub ordering_q1: StateOrdering,
    pub ordering_inputs: StateOrdering,
    pub ordering_outputs: StateOrdering,
    pub azimuths: Vec<f64>,
    pub rotor_speed_rpm: f64,
    pub wind_speed: f64,
    /// Sorted state indices kept in eigenvectors (q2 and q1, no q2dot).
    pub eigen_indices: Vec<usize>,
    /// Labels of `eigen_indices`, same order.
    pub eigen_labels: Vec<String>,
    /// Any eigen-relevant state belongs to the aerodynamics module.
    pub has_aero_states: bool,
}

/// One eigenmode of a non-rotating model.
#[derive(Debug, Clone)]
pub struct Mode {
    /// Position in the owning operating point's list (ascending frequency).
    pub id: usize,
    /// Owning operating point.
    pub op: usize,
    pub eigenvalue: Complex64,
    pub natural_freq_raw: f64, // |λ| [rad/s]
    pub natural_freq_hz: f64,
    pub damped_freq_raw: f64, // Im(λ) [rad/s]
    pub damped_freq_hz: f64,
    pub damping_ratio: f64,
    /// Eigenvector restricted to the eigen-relevant states.
    pub eigenvector: Vec<Complex64>,
    pub magnitudes: Vec<f64>,
    pub phases: Vec<f64>,
    /// Module of the state with the largest eigenvector magnitude.
    pub max_module: String,
    /// Cluster assigned by refinement, if any.
    pub cluster: Option<usize>,
}

impl Mode {
    /// Dominated by a structural module (ElastoDyn, BeamDyn or SubDyn).
    pub fn is_structural(&self) -> bool {
        STRUCTURAL_MODULES
            .iter()
            .any(|prefix| self.max_module.starts_with(prefix))
    }

    pub fn key(&self) -> ModeRef {
        ModeRef {
            op: self.op,
            mode: self.id,
        }
    }

    pub fn name(&self) -> String {
        format!("{}-{}", self.op, self.id)
    }
}

/// Index of a mode: operating point and position within it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModeRef {
    pub op: usize,
    pub mode: usize,
}

/// Everything computed for one operating point.
#[derive(Debug, Clone)]
pub struct OperatingPoint {
    /// Group name the point was built from.
    pub name: String,
    pub model: NonRotatingModel,
    pub modes: Vec<Mode>,
}

impl OperatingPoint {
    pub fn mode(&self, id: usize) -> Option<&Mode> {
        self.modes.get(id)
    }
}

/// Look up a mode across operating points.
pub fn resolve<'a>(ops: &'a [OperatingPoint], r: ModeRef) -> &'a Mode {
    &ops[r.op].modes[r.mode]
}

/// A tracked line: at most one mode per operating point, ordered by OP.
#[derive(Debug, Clone, PartialEq)]
pub struct ModeSet {
    pub id: usize,
    pub label: String,
    /// [min, max] natural frequency [Hz]
    pub frequency: [f64; 2],
    pub modes: Vec<ModeRef>,
}

impl ModeSet {
    pub fn new(id: usize, first: ModeRef) -> Self {
        ModeSet {
            id,
            label: id.to_string(),
            frequency: [0.0, 0.0],
            modes: vec![first],
        }
    }

    pub fn last(&self) -> Option<ModeRef> {
        self.modes.last().copied()
    }

    /// One mode for every operating point.
    pub fn is_complete(&self, num_ops: usize) -> bool {
        self.modes.len() == num_ops
    }

    pub fn mode_at(&self, op: usize) -> Option<ModeRef> {
        self.modes.iter().copied().find(|r| r.op == op)
    }

    /// Recompute the frequency range from the member modes.
    pub fn update_frequency(&mut self, ops: &[OperatingPoint]) {
        let mut range = [f64::INFINITY, f64::NEG_INFINITY];
        for &r in &self.modes {
            let f = resolve(ops, r).natural_freq_hz;
            range[0] = range[0].min(f);
            range[1] = range[1].max(f);
        }
        if self.modes.is_empty() {
            range = [0.0, 0.0];
        }
        self.frequency = range;
    }
}
