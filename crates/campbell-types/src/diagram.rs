// ─────────────────────────────────────────────────────────────────────
// Campbell Core — Diagram
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
use crate::error::CampbellResult;
use serde::{Deserialize, Serialize};

/// One mode of one operating point as drawn on the diagram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub line: usize,
    pub op: usize,
    pub mode: usize,
    pub rotor_speed: f64, // [RPM]
    pub wind_speed: f64,  // [m/s]
    pub natural_freq_hz: f64,
    pub damped_freq_hz: f64,
    pub damping_ratio: f64,
}

/// A tracked mode-set rendered as a point sequence ordered by OP.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub id: usize,
    pub label: String,
    pub points: Vec<Point>,
}

/// Campbell diagram: per-OP abscissae and the tracked lines.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Diagram {
    /// Any operating point has nonzero wind speed.
    pub has_wind: bool,
    pub rotor_speeds: Vec<f64>,
    pub wind_speeds: Vec<f64>,
    pub lines: Vec<Line>,
}

impl Diagram {
    pub fn num_operating_points(&self) -> usize {
        self.rotor_speeds.len()
    }

    /// Abscissa of an OP: wind speed when the diagram has wind, else rotor speed.
    pub fn abscissa(&self, op: usize) -> Option<f64> {
        if self.has_wind {
            self.wind_speeds.get(op).copied()
        } else {
            self.rotor_speeds.get(op).copied()
        }
    }

    pub fn to_json(&self) -> CampbellResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> CampbellResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn save(&self, path: &str) -> CampbellResult<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn load(path: &str) -> CampbellResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }
}
