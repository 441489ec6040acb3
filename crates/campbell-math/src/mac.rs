// ─────────────────────────────────────────────────────────────────────
// Campbell Core — Modal Assurance Criterion
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
use num_complex::Complex64;

/// Modal assurance criterion between two complex mode shapes:
///
/// `|Σ v1·conj(v2)|² / (Σ |v1|² · Σ |v2|²)`, in `[0, 1]`.
///
/// Returns 0 when either vector has zero norm.
///
/// # Panics
/// When the vectors differ in length. Mode shapes compared by the tracker
/// always share the eigen-relevant state set, so a mismatch is a bug.
pub fn mac(v1: &[Complex64], v2: &[Complex64]) -> f64 {
    assert_eq!(
        v1.len(),
        v2.len(),
        "MAC of mode shapes with different lengths"
    );

    let mut cross = Complex64::new(0.0, 0.0);
    let mut n1 = 0.0;
    let mut n2 = 0.0;
    for (a, b) in v1.iter().zip(v2) {
        cross += a * b.conj();
        n1 += a.norm_sqr();
        n2 += b.norm_sqr();
    }

    let denom = n1 * n2;
    if denom <= 0.0 || !denom.is_finite() {
        return 0.0;
    }
    (cross.norm_sqr() / denom).clamp(0.0, 1.0)
}
