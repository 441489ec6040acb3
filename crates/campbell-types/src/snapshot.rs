// ─────────────────────────────────────────────────────────────────────
// Campbell Core — Snapshots
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Linearization snapshots and their grouping into operating points.
//!
//! A [`Snapshot`] is one linearization at one rotor azimuth. All snapshots
//! of one [`OperatingPointGroup`] share descriptor ordering and dimensions;
//! this is checked once when the group is built.

use crate::error::{CampbellError, CampbellResult};
use ndarray::{Array1, Array2};

/// One entry of a state, state-rate, input or output vector.
#[derive(Debug, Clone, PartialEq)]
pub struct Descriptor {
    /// Zero-based position in the vector.
    pub index: usize,
    /// Operating-point value of this entry.
    pub value: f64,
    /// True when the quantity is expressed in the rotating frame.
    pub rotating: bool,
    /// 0 (algebraic), 1 (first-order state) or 2 (second-order state).
    pub derivative_order: u8,
    pub label: String,
}

impl Descriptor {
    /// Partition key: q2 < q2dot < q1 < other, rotating after fixed.
    pub fn sort_key(&self) -> u32 {
        let mut key = match self.derivative_order {
            2 => {
                let rest = self
                    .label
                    .split_once(' ')
                    .map(|(_, rest)| rest)
                    .unwrap_or("");
                if rest.starts_with("First time derivative") {
                    15
                } else {
                    10
                }
            }
            1 => 20,
            0 => 30,
            _ => 1000,
        };
        if self.rotating {
            key += 1;
        }
        key
    }

    /// Label with the parenthesized part removed for `ED` entries, so that
    /// blade-specific units or coordinates do not break triplet matching.
    pub fn sanitized_label(&self) -> String {
        if self.label.starts_with("ED") {
            if let (Some(open), Some(close)) = (self.label.find('('), self.label.rfind(')')) {
                if open < close {
                    return format!("{}{}", &self.label[..open], &self.label[close + 1..]);
                }
            }
        }
        self.label.clone()
    }

    /// Owning module prefix, e.g. `ED`, `BD`, `AD`.
    pub fn module(&self) -> &str {
        self.label.split_whitespace().next().unwrap_or("")
    }
}

/// One linearization at one azimuth.
#[derive(Debug, Clone)]
pub struct Snapshot {
    /// File name or other identifier, used in error context.
    pub source: String,
    /// Simulation time [s]
    pub sim_time: f64,
    /// Rotor speed [rad/s]
    pub rotor_speed: f64,
    /// Azimuth [rad], normalized to [0, 2π)
    pub azimuth: f64,
    /// Wind speed [m/s]
    pub wind_speed: f64,
    pub num_states: usize,
    pub num_discrete_states: usize,
    pub num_constraint_states: usize,
    pub num_inputs: usize,
    pub num_outputs: usize,
    pub states: Vec<Descriptor>,
    pub state_rates: Vec<Descriptor>,
    pub inputs: Vec<Descriptor>,
    pub outputs: Vec<Descriptor>,
    pub a: Array2<f64>, // [num_states, num_states]
    pub b: Array2<f64>, // [num_states, num_inputs]
    pub c: Array2<f64>, // [num_outputs, num_states]
    pub d: Array2<f64>, // [num_outputs, num_inputs]
}

impl Snapshot {
    /// Check declared counts against descriptor lists and matrix shapes.
    pub fn validate(&self) -> CampbellResult<()> {
        let n = self.num_states;
        let checks = [
            ("state descriptors", n, self.states.len()),
            ("state-rate descriptors", n, self.state_rates.len()),
            ("input descriptors", self.num_inputs, self.inputs.len()),
            ("output descriptors", self.num_outputs, self.outputs.len()),
            ("A rows", n, self.a.nrows()),
            ("A columns", n, self.a.ncols()),
        ];
        for (what, expected, found) in checks {
            if expected != found {
                return Err(CampbellError::CountMismatch {
                    context: format!("{} ({what})", self.source),
                    expected,
                    found,
                });
            }
        }
        if !self.rotor_speed.is_finite() || !self.azimuth.is_finite() {
            return Err(CampbellError::InvalidInput(format!(
                "{}: rotor speed and azimuth must be finite",
                self.source
            )));
        }
        Ok(())
    }

    /// State operating-point values.
    pub fn state_values(&self) -> Array1<f64> {
        self.states.iter().map(|d| d.value).collect()
    }

    /// State-rate operating-point values.
    pub fn state_rate_values(&self) -> Array1<f64> {
        self.state_rates.iter().map(|d| d.value).collect()
    }
}

/// All snapshots of one (rotor speed, wind speed) condition.
#[derive(Debug, Clone)]
pub struct OperatingPointGroup {
    name: String,
    snapshots: Vec<Snapshot>,
}

impl OperatingPointGroup {
    /// Build a group, checking every snapshot and that all share ordering.
    pub fn new(name: impl Into<String>, snapshots: Vec<Snapshot>) -> CampbellResult<Self> {
        let name = name.into();
        let first = snapshots.first().ok_or_else(|| {
            CampbellError::InvalidInput(format!("operating point '{name}' has no snapshots"))
        })?;
        first.validate()?;
        for snap in &snapshots[1..] {
            snap.validate()?;
            let same_layout = snap.num_states == first.num_states
                && snap.num_inputs == first.num_inputs
                && snap.num_outputs == first.num_outputs
                && same_ordering(&snap.states, &first.states)
                && same_ordering(&snap.inputs, &first.inputs)
                && same_ordering(&snap.outputs, &first.outputs);
            if !same_layout {
                return Err(CampbellError::InvalidInput(format!(
                    "'{}' and '{}' in operating point '{name}' differ in descriptor layout",
                    first.source, snap.source
                )));
            }
        }
        Ok(OperatingPointGroup { name, snapshots })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn snapshots(&self) -> &[Snapshot] {
        &self.snapshots
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

fn same_ordering(a: &[Descriptor], b: &[Descriptor]) -> bool {
    a.len() == b.len()
        && a.iter().zip(b).all(|(x, y)| {
            x.index == y.index
                && x.rotating == y.rotating
                && x.derivative_order == y.derivative_order
                && x.label == y.label
        })
}

/// Per-group arrays stacked across azimuth steps (sorted by azimuth).
#[derive(Debug, Clone)]
pub struct AggregatedSeries {
    pub azimuths: Vec<f64>,       // [rad]
    pub rotor_speeds: Vec<f64>,   // [rad/s]
    pub wind_speeds: Vec<f64>,    // [m/s]
    pub a: Vec<Array2<f64>>,      // one A matrix per step
    pub x: Array2<f64>,           // [steps, num_states]
    pub xdot: Array2<f64>,        // [steps, num_states]
    pub states: Vec<Descriptor>,  // taken once
    pub inputs: Vec<Descriptor>,  // taken once
    pub outputs: Vec<Descriptor>, // taken once
}

impl AggregatedSeries {
    pub fn num_steps(&self) -> usize {
        self.azimuths.len()
    }

    pub fn num_states(&self) -> usize {
        self.states.len()
    }
}

/// Partition of a vector's indices into fixed entries and blade triplets.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateOrdering {
    /// Total number of entries covered.
    pub num: usize,
    /// Number of non-triplet entries (listed first in `indices`).
    pub num_fixed: usize,
    /// Original indices in transformed order: fixed entries, then triplets.
    pub indices: Vec<usize>,
    /// Blade 1/2/3 indices of each triplet.
    pub triplets: Vec<[usize; 3]>,
}

impl StateOrdering {
    pub fn num_triplets(&self) -> usize {
        self.triplets.len()
    }

    pub fn num_rotating(&self) -> usize {
        3 * self.triplets.len()
    }

    /// Concatenate orderings in sequence; fixed counts add up.
    pub fn combine(parts: &[&StateOrdering]) -> StateOrdering {
        let mut out = StateOrdering::default();
        for part in parts {
            out.num_fixed += part.num_fixed;
            out.indices.extend_from_slice(&part.indices);
            out.triplets.extend_from_slice(&part.triplets);
        }
        out.num = out.indices.len();
        out
    }
}
