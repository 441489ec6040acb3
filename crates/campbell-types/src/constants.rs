// ─────────────────────────────────────────────────────────────────────
// Campbell Core — Constants
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Fixed numerical and domain constants.

/// Number of rotor blades. The multi-blade transform is specialized to triplets.
pub const NUM_BLADES: usize = 3;

/// Rotor angular acceleration used in the transform [rad/s²].
/// Always zero: linearizations are assumed to be taken at constant rotor speed.
pub const ROTOR_ANGULAR_ACCELERATION: f64 = 0.0;

/// Scale applied to normalized similarity before integer rounding for the
/// assignment solver. Preserves rank order at high precision.
pub const ASSIGNMENT_COST_SCALE: f64 = 1e7;

/// rad/s → RPM.
pub const RAD_PER_SEC_TO_RPM: f64 = 30.0 / std::f64::consts::PI;

/// 2π
pub const TWO_PI: f64 = 2.0 * std::f64::consts::PI;

/// Module prefixes of structural (non-aerodynamic) states.
pub const STRUCTURAL_MODULES: [&str; 3] = ["ED", "BD", "SD"];

/// Module prefix of aerodynamic states.
pub const AERO_MODULE: &str = "AD";

/// Pivot magnitude below which a matrix is treated as singular.
pub const SINGULAR_PIVOT_TOL: f64 = 1e-12;
