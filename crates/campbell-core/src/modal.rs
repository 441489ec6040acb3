// ─────────────────────────────────────────────────────────────────────
// Campbell Core — Eigen-Analysis
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
use campbell_math::eigen::eigen_general;
use campbell_types::constants::TWO_PI;
use campbell_types::error::CampbellResult;
use campbell_types::modal::{Mode, NonRotatingModel, OperatingPoint};
use num_complex::Complex64;

/// Modes of a non-rotating model, ascending by natural frequency.
///
/// Only eigenvalues with strictly positive imaginary part are kept, one per
/// conjugate pair; real eigenvalues carry no oscillation and are dropped.
/// Mode IDs are positions in the returned list and `op` is set to `op`.
pub fn eigen_analysis(model: &NonRotatingModel, op: usize) -> CampbellResult<Vec<Mode>> {
    let eig = eigen_general(&model.avg_a)?;

    let mut modes: Vec<Mode> = Vec::new();
    for (k, &lambda) in eig.values.iter().enumerate() {
        if lambda.im <= 0.0 {
            continue;
        }
        let abs = lambda.norm();
        let eigenvector: Vec<Complex64> = model
            .eigen_indices
            .iter()
            .map(|&row| eig.vectors[[row, k]])
            .collect();
        let (magnitudes, phases): (Vec<f64>, Vec<f64>) =
            eigenvector.iter().map(|v| v.to_polar()).unzip();

        modes.push(Mode {
            id: 0,
            op,
            eigenvalue: lambda,
            natural_freq_raw: abs,
            natural_freq_hz: abs / TWO_PI,
            damped_freq_raw: lambda.im,
            damped_freq_hz: lambda.im / TWO_PI,
            damping_ratio: if abs > 0.0 { -lambda.re / abs } else { 0.0 },
            max_module: dominant_module(&magnitudes, &model.eigen_labels),
            eigenvector,
            magnitudes,
            phases,
            cluster: None,
        });
    }

    modes.sort_by(|a, b| a.natural_freq_hz.total_cmp(&b.natural_freq_hz));
    for (id, m) in modes.iter_mut().enumerate() {
        m.id = id;
    }
    tracing::debug!(
        op,
        eigenvalues = eig.len(),
        modes = modes.len(),
        "eigen-analysis"
    );
    Ok(modes)
}

/// Module prefix of the label with the largest magnitude.
fn dominant_module(magnitudes: &[f64], labels: &[String]) -> String {
    magnitudes
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(b.1))
        .and_then(|(i, _)| labels.get(i))
        .and_then(|label| label.split_whitespace().next())
        .unwrap_or_default()
        .to_string()
}

/// Re-stamp mode operating-point indices after the points were reordered.
pub fn assign_op_indices(ops: &mut [OperatingPoint]) {
    for (i, op) in ops.iter_mut().enumerate() {
        for m in op.modes.iter_mut() {
            m.op = i;
        }
    }
}

/// Magnitudes scaled so that the largest is one.
pub fn mode_shape(mode: &Mode) -> Vec<f64> {
    let max = mode.magnitudes.iter().copied().fold(0.0_f64, f64::max);
    if max > 0.0 {
        mode.magnitudes.iter().map(|m| m / max).collect()
    } else {
        mode.magnitudes.clone()
    }
}
