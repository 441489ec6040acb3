// ─────────────────────────────────────────────────────────────────────
// Campbell Core — General Eigen-Solver
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Eigenvalues and eigenvectors of a real, non-symmetric matrix.
//!
//! Orthogonal reduction to upper Hessenberg form (Householder), then
//! Francis double-shift QR on the Hessenberg matrix with the transforms
//! accumulated, then back-substitution on the quasi-triangular Schur form.
//! This is the classical `orthes` + `hqr2` pair.
//!
//! Complex eigenvalues come in conjugate pairs that occupy two adjacent
//! real columns of the Schur vectors; they are expanded into complex
//! eigenvector columns on the way out.

use campbell_types::error::{CampbellError, CampbellResult};
use ndarray::Array2;
use num_complex::Complex64;

/// QR iterations allowed per eigenvalue, times the matrix dimension.
const MAX_ITER_FACTOR: usize = 30;

/// Result of [`eigen_general`].
#[derive(Debug, Clone)]
pub struct EigenDecomposition {
    /// Eigenvalues in Schur order. Conjugate pairs are adjacent, positive
    /// imaginary part first.
    pub values: Vec<Complex64>,
    /// Column `k` is the (unnormalized) eigenvector of `values[k]`.
    pub vectors: Array2<Complex64>,
}

impl EigenDecomposition {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Full eigen-decomposition of a real square matrix.
pub fn eigen_general(a: &Array2<f64>) -> CampbellResult<EigenDecomposition> {
    let (n, m) = a.dim();
    if n != m {
        return Err(CampbellError::InvalidInput(format!(
            "eigen-solver needs a square matrix, got {n}x{m}"
        )));
    }
    if a.iter().any(|v| !v.is_finite()) {
        return Err(CampbellError::InvalidInput(
            "eigen-solver input contains non-finite entries".to_string(),
        ));
    }

    let mut h = a.clone();
    let mut v = Array2::eye(n);
    let mut d = vec![0.0; n];
    let mut e = vec![0.0; n];

    if n > 0 {
        orthes(&mut h, &mut v);
        hqr2(&mut h, &mut v, &mut d, &mut e)?;
    }

    let values: Vec<Complex64> = d
        .iter()
        .zip(&e)
        .map(|(&re, &im)| Complex64::new(re, im))
        .collect();
    let mut vectors = Array2::zeros((n, n));
    let mut k = 0;
    while k < n {
        if e[k] > 0.0 && k + 1 < n {
            for i in 0..n {
                let re = v[[i, k]];
                let im = v[[i, k + 1]];
                vectors[[i, k]] = Complex64::new(re, im);
                vectors[[i, k + 1]] = Complex64::new(re, -im);
            }
            k += 2;
        } else {
            for i in 0..n {
                vectors[[i, k]] = Complex64::new(v[[i, k]], 0.0);
            }
            k += 1;
        }
    }

    Ok(EigenDecomposition { values, vectors })
}

// ── Hessenberg reduction ─────────────────────────────────────────────

fn orthes(h: &mut Array2<f64>, v: &mut Array2<f64>) {
    let n = h.nrows();
    let high = n - 1;
    let mut ort = vec![0.0; n];

    for m in 1..high {
        let scale: f64 = (m..=high).map(|i| h[[i, m - 1]].abs()).sum();
        if scale == 0.0 {
            continue;
        }

        let mut hh = 0.0;
        for i in (m..=high).rev() {
            ort[i] = h[[i, m - 1]] / scale;
            hh += ort[i] * ort[i];
        }
        let mut g = hh.sqrt();
        if ort[m] > 0.0 {
            g = -g;
        }
        hh -= ort[m] * g;
        ort[m] -= g;

        // H = (I - u uᵀ / h) H (I - u uᵀ / h)
        for j in m..n {
            let mut f = 0.0;
            for i in (m..=high).rev() {
                f += ort[i] * h[[i, j]];
            }
            f /= hh;
            for i in m..=high {
                h[[i, j]] -= f * ort[i];
            }
        }
        for i in 0..=high {
            let mut f = 0.0;
            for j in (m..=high).rev() {
                f += ort[j] * h[[i, j]];
            }
            f /= hh;
            for j in m..=high {
                h[[i, j]] -= f * ort[j];
            }
        }
        ort[m] *= scale;
        h[[m, m - 1]] = scale * g;
    }

    // Accumulate transformations
    for m in (1..high).rev() {
        if h[[m, m - 1]] == 0.0 {
            continue;
        }
        for i in (m + 1)..=high {
            ort[i] = h[[i, m - 1]];
        }
        for j in m..=high {
            let mut g = 0.0;
            for i in m..=high {
                g += ort[i] * v[[i, j]];
            }
            // Double division avoids possible underflow
            g = (g / ort[m]) / h[[m, m - 1]];
            for i in m..=high {
                v[[i, j]] += g * ort[i];
            }
        }
    }
}

// ── Schur form and back-substitution ─────────────────────────────────

fn cdiv(xr: f64, xi: f64, yr: f64, yi: f64) -> (f64, f64) {
    if yr.abs() > yi.abs() {
        let r = yi / yr;
        let d = yr + r * yi;
        ((xr + r * xi) / d, (xi - r * xr) / d)
    } else {
        let r = yr / yi;
        let d = yi + r * yr;
        ((r * xr + xi) / d, (r * xi - xr) / d)
    }
}

fn hqr2(
    h: &mut Array2<f64>,
    v: &mut Array2<f64>,
    d: &mut [f64],
    e: &mut [f64],
) -> CampbellResult<()> {
    let nn = h.nrows();
    let high = nn - 1;
    let eps = f64::EPSILON;
    let max_iter = MAX_ITER_FACTOR * nn.max(1);
    let mut exshift = 0.0;
    let (mut p, mut q, mut r, mut s, mut z) = (0.0_f64, 0.0_f64, 0.0_f64, 0.0_f64, 0.0_f64);
    let (mut t, mut w, mut x, mut y) = (0.0_f64, 0.0_f64, 0.0_f64, 0.0_f64);

    let mut norm = 0.0;
    for i in 0..nn {
        for j in i.saturating_sub(1)..nn {
            norm += h[[i, j]].abs();
        }
    }
    if norm == 0.0 {
        // Zero matrix: all eigenvalues zero, Schur vectors already identity
        return Ok(());
    }

    // Outer loop over eigenvalue index, n counts down
    let mut iter = 0;
    let mut n_signed = high as isize;
    while n_signed >= 0 {
        let n = n_signed as usize;

        // Look for a single small sub-diagonal element
        let mut l = n;
        while l > 0 {
            s = h[[l - 1, l - 1]].abs() + h[[l, l]].abs();
            if s == 0.0 {
                s = norm;
            }
            if h[[l, l - 1]].abs() < eps * s {
                break;
            }
            l -= 1;
        }

        if l == n {
            // One root found
            h[[n, n]] += exshift;
            d[n] = h[[n, n]];
            e[n] = 0.0;
            n_signed -= 1;
            iter = 0;
        } else if l + 1 == n {
            // Two roots found
            w = h[[n, n - 1]] * h[[n - 1, n]];
            p = (h[[n - 1, n - 1]] - h[[n, n]]) / 2.0;
            q = p * p + w;
            z = q.abs().sqrt();
            h[[n, n]] += exshift;
            h[[n - 1, n - 1]] += exshift;
            x = h[[n, n]];

            if q >= 0.0 {
                // Real pair
                z = if p >= 0.0 { p + z } else { p - z };
                d[n - 1] = x + z;
                d[n] = d[n - 1];
                if z != 0.0 {
                    d[n] = x - w / z;
                }
                e[n - 1] = 0.0;
                e[n] = 0.0;
                x = h[[n, n - 1]];
                s = x.abs() + z.abs();
                p = x / s;
                q = z / s;
                r = (p * p + q * q).sqrt();
                p /= r;
                q /= r;

                for j in (n - 1)..nn {
                    z = h[[n - 1, j]];
                    h[[n - 1, j]] = q * z + p * h[[n, j]];
                    h[[n, j]] = q * h[[n, j]] - p * z;
                }
                for i in 0..=n {
                    z = h[[i, n - 1]];
                    h[[i, n - 1]] = q * z + p * h[[i, n]];
                    h[[i, n]] = q * h[[i, n]] - p * z;
                }
                for i in 0..=high {
                    z = v[[i, n - 1]];
                    v[[i, n - 1]] = q * z + p * v[[i, n]];
                    v[[i, n]] = q * v[[i, n]] - p * z;
                }
            } else {
                // Complex pair
                d[n - 1] = x + p;
                d[n] = x + p;
                e[n - 1] = z;
                e[n] = -z;
            }
            n_signed -= 2;
            iter = 0;
        } else {
            // No convergence yet
            x = h[[n, n]];
            y = 0.0;
            w = 0.0;
            if l < n {
                y = h[[n - 1, n - 1]];
                w = h[[n, n - 1]] * h[[n - 1, n]];
            }

            // Wilkinson's exceptional shift
            if iter == 10 {
                exshift += x;
                for i in 0..=n {
                    h[[i, i]] -= x;
                }
                s = h[[n, n - 1]].abs() + h[[n - 1, n - 2]].abs();
                x = 0.75 * s;
                y = x;
                w = -0.4375 * s * s;
            }

            // Second exceptional shift
            if iter == 30 {
                s = (y - x) / 2.0;
                s = s * s + w;
                if s > 0.0 {
                    s = s.sqrt();
                    if y < x {
                        s = -s;
                    }
                    s = x - w / ((y - x) / 2.0 + s);
                    for i in 0..=n {
                        h[[i, i]] -= s;
                    }
                    exshift += s;
                    x = 0.964;
                    y = x;
                    w = x;
                }
            }

            iter += 1;
            if iter > max_iter {
                return Err(CampbellError::EigenNotConverged {
                    context: format!("QR iteration on eigenvalue {n} of {nn}x{nn} matrix"),
                    iterations: iter,
                });
            }

            // Look for two consecutive small sub-diagonal elements
            let mut m = n - 2;
            loop {
                z = h[[m, m]];
                r = x - z;
                s = y - z;
                p = (r * s - w) / h[[m + 1, m]] + h[[m, m + 1]];
                q = h[[m + 1, m + 1]] - z - r - s;
                r = h[[m + 2, m + 1]];
                s = p.abs() + q.abs() + r.abs();
                p /= s;
                q /= s;
                r /= s;
                if m == l {
                    break;
                }
                if h[[m, m - 1]].abs() * (q.abs() + r.abs())
                    < eps * (p.abs() * (h[[m - 1, m - 1]].abs() + z.abs() + h[[m + 1, m + 1]].abs()))
                {
                    break;
                }
                m -= 1;
            }

            for i in (m + 2)..=n {
                h[[i, i - 2]] = 0.0;
                if i > m + 2 {
                    h[[i, i - 3]] = 0.0;
                }
            }

            // Double QR step on rows l..=n and columns m..=n
            for k in m..n {
                let notlast = k != n - 1;
                if k != m {
                    p = h[[k, k - 1]];
                    q = h[[k + 1, k - 1]];
                    r = if notlast { h[[k + 2, k - 1]] } else { 0.0 };
                    x = p.abs() + q.abs() + r.abs();
                    if x == 0.0 {
                        continue;
                    }
                    p /= x;
                    q /= x;
                    r /= x;
                }

                s = (p * p + q * q + r * r).sqrt();
                if p < 0.0 {
                    s = -s;
                }
                if s == 0.0 {
                    continue;
                }
                if k != m {
                    h[[k, k - 1]] = -s * x;
                } else if l != m {
                    h[[k, k - 1]] = -h[[k, k - 1]];
                }
                p += s;
                x = p / s;
                y = q / s;
                z = r / s;
                q /= p;
                r /= p;

                // Row modification
                for j in k..nn {
                    p = h[[k, j]] + q * h[[k + 1, j]];
                    if notlast {
                        p += r * h[[k + 2, j]];
                        h[[k + 2, j]] -= p * z;
                    }
                    h[[k, j]] -= p * x;
                    h[[k + 1, j]] -= p * y;
                }

                // Column modification
                for i in 0..=n.min(k + 3) {
                    p = x * h[[i, k]] + y * h[[i, k + 1]];
                    if notlast {
                        p += z * h[[i, k + 2]];
                        h[[i, k + 2]] -= p * r;
                    }
                    h[[i, k]] -= p;
                    h[[i, k + 1]] -= p * q;
                }

                // Accumulate transformations
                for i in 0..=high {
                    p = x * v[[i, k]] + y * v[[i, k + 1]];
                    if notlast {
                        p += z * v[[i, k + 2]];
                        v[[i, k + 2]] -= p * r;
                    }
                    v[[i, k]] -= p;
                    v[[i, k + 1]] -= p * q;
                }
            }
        }
    }

    // Back-substitute to find vectors of the upper triangular form
    for n in (0..nn).rev() {
        p = d[n];
        q = e[n];

        if q == 0.0 {
            // Real vector
            let mut l = n;
            h[[n, n]] = 1.0;
            for i in (0..n).rev() {
                w = h[[i, i]] - p;
                r = 0.0;
                for j in l..=n {
                    r += h[[i, j]] * h[[j, n]];
                }
                if e[i] < 0.0 {
                    z = w;
                    s = r;
                } else {
                    l = i;
                    if e[i] == 0.0 {
                        h[[i, n]] = if w != 0.0 { -r / w } else { -r / (eps * norm) };
                    } else {
                        // Solve real equations
                        x = h[[i, i + 1]];
                        y = h[[i + 1, i]];
                        q = (d[i] - p) * (d[i] - p) + e[i] * e[i];
                        t = (x * s - z * r) / q;
                        h[[i, n]] = t;
                        h[[i + 1, n]] = if x.abs() > z.abs() {
                            (-r - w * t) / x
                        } else {
                            (-s - y * t) / z
                        };
                    }

                    // Overflow control
                    t = h[[i, n]].abs();
                    if (eps * t) * t > 1.0 {
                        for j in i..=n {
                            h[[j, n]] /= t;
                        }
                    }
                }
            }
        } else if q < 0.0 {
            // Complex vector; the last component is chosen imaginary so
            // the system is triangular
            let mut l = n - 1;
            if h[[n, n - 1]].abs() > h[[n - 1, n]].abs() {
                h[[n - 1, n - 1]] = q / h[[n, n - 1]];
                h[[n - 1, n]] = -(h[[n, n]] - p) / h[[n, n - 1]];
            } else {
                let (cr, ci) = cdiv(0.0, -h[[n - 1, n]], h[[n - 1, n - 1]] - p, q);
                h[[n - 1, n - 1]] = cr;
                h[[n - 1, n]] = ci;
            }
            h[[n, n - 1]] = 0.0;
            h[[n, n]] = 1.0;

            let (mut ra, mut sa);
            for i in (0..n - 1).rev() {
                ra = 0.0;
                sa = 0.0;
                for j in l..=n {
                    ra += h[[i, j]] * h[[j, n - 1]];
                    sa += h[[i, j]] * h[[j, n]];
                }
                w = h[[i, i]] - p;

                if e[i] < 0.0 {
                    z = w;
                    r = ra;
                    s = sa;
                } else {
                    l = i;
                    if e[i] == 0.0 {
                        let (cr, ci) = cdiv(-ra, -sa, w, q);
                        h[[i, n - 1]] = cr;
                        h[[i, n]] = ci;
                    } else {
                        // Solve complex equations
                        x = h[[i, i + 1]];
                        y = h[[i + 1, i]];
                        let mut vr = (d[i] - p) * (d[i] - p) + e[i] * e[i] - q * q;
                        let vi = (d[i] - p) * 2.0 * q;
                        if vr == 0.0 && vi == 0.0 {
                            vr = eps * norm * (w.abs() + q.abs() + x.abs() + y.abs() + z.abs());
                        }
                        let (cr, ci) =
                            cdiv(x * r - z * ra + q * sa, x * s - z * sa - q * ra, vr, vi);
                        h[[i, n - 1]] = cr;
                        h[[i, n]] = ci;
                        if x.abs() > z.abs() + q.abs() {
                            h[[i + 1, n - 1]] = (-ra - w * h[[i, n - 1]] + q * h[[i, n]]) / x;
                            h[[i + 1, n]] = (-sa - w * h[[i, n]] - q * h[[i, n - 1]]) / x;
                        } else {
                            let (cr, ci) =
                                cdiv(-r - y * h[[i, n - 1]], -s - y * h[[i, n]], z, q);
                            h[[i + 1, n - 1]] = cr;
                            h[[i + 1, n]] = ci;
                        }
                    }

                    // Overflow control
                    t = h[[i, n - 1]].abs().max(h[[i, n]].abs());
                    if (eps * t) * t > 1.0 {
                        for j in i..=n {
                            h[[j, n - 1]] /= t;
                            h[[j, n]] /= t;
                        }
                    }
                }
            }
        }
    }

    // Back-transform to eigenvectors of the original matrix
    for j in (0..nn).rev() {
        for i in 0..=high {
            let mut acc = 0.0;
            for k in 0..=j.min(high) {
                acc += v[[i, k]] * h[[k, j]];
            }
            v[[i, j]] = acc;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn residual(a: &Array2<f64>, dec: &EigenDecomposition) -> f64 {
        let n = a.nrows();
        let mut worst: f64 = 0.0;
        for k in 0..n {
            let lambda = dec.values[k];
            let vk = dec.vectors.column(k);
            let scale = vk.iter().map(|c| c.norm()).fold(0.0, f64::max).max(1e-300);
            for i in 0..n {
                let mut av = Complex64::new(0.0, 0.0);
                for j in 0..n {
                    av += vk[j] * a[[i, j]];
                }
                worst = worst.max((av - lambda * vk[i]).norm() / scale);
            }
        }
        worst
    }

    #[test]
    fn test_diagonal_matrix() {
        let a = array![[1.0, 0.0, 0.0], [0.0, -2.0, 0.0], [0.0, 0.0, 3.5]];
        let dec = eigen_general(&a).unwrap();
        let mut re: Vec<f64> = dec.values.iter().map(|c| c.re).collect();
        re.sort_by(f64::total_cmp);
        assert_eq!(re, vec![-2.0, 1.0, 3.5]);
        assert!(dec.values.iter().all(|c| c.im == 0.0));
        assert!(residual(&a, &dec) < 1e-12);
    }

    #[test]
    fn test_rotation_generator_complex_pair() {
        // ẋ = [[0, 1], [-ω², -2ζω]] x, ω = 3, ζ = 0.1
        let omega = 3.0;
        let zeta = 0.1;
        let a = array![[0.0, 1.0], [-omega * omega, -2.0 * zeta * omega]];
        let dec = eigen_general(&a).unwrap();
        assert_eq!(dec.len(), 2);
        let positive: Vec<&Complex64> = dec.values.iter().filter(|c| c.im > 0.0).collect();
        assert_eq!(positive.len(), 1);
        assert!((positive[0].norm() - omega).abs() < 1e-12);
        assert!((-positive[0].re / positive[0].norm() - zeta).abs() < 1e-12);
        assert!((dec.values[0] - dec.values[1].conj()).norm() < 1e-12);
        assert!(residual(&a, &dec) < 1e-10);
    }

    #[test]
    fn test_nonsymmetric_residual() {
        let a = array![
            [4.0, -2.0, 1.0, 0.5],
            [3.0, 6.0, -4.0, 2.0],
            [2.0, 1.0, 8.0, -1.0],
            [-1.0, 0.5, 2.0, 3.0]
        ];
        let dec = eigen_general(&a).unwrap();
        assert!(residual(&a, &dec) < 1e-9);
        let trace: f64 = dec.values.iter().map(|c| c.re).sum();
        assert!((trace - 21.0).abs() < 1e-9);
        let im_sum: f64 = dec.values.iter().map(|c| c.im).sum();
        assert!(im_sum.abs() < 1e-9);
    }

    #[test]
    fn test_block_oscillators() {
        // Two decoupled oscillators at 1 and 2 rad/s
        let mut a = Array2::zeros((4, 4));
        a[[0, 2]] = 1.0;
        a[[1, 3]] = 1.0;
        a[[2, 0]] = -1.0;
        a[[3, 1]] = -4.0;
        let dec = eigen_general(&a).unwrap();
        let mut freqs: Vec<f64> = dec
            .values
            .iter()
            .filter(|c| c.im > 0.0)
            .map(|c| c.norm())
            .collect();
        freqs.sort_by(f64::total_cmp);
        assert_eq!(freqs.len(), 2);
        assert!((freqs[0] - 1.0).abs() < 1e-12);
        assert!((freqs[1] - 2.0).abs() < 1e-12);
        assert!(residual(&a, &dec) < 1e-10);
    }

    #[test]
    fn test_zero_and_empty() {
        let dec = eigen_general(&Array2::zeros((3, 3))).unwrap();
        assert!(dec.values.iter().all(|c| c.norm() == 0.0));
        assert!(eigen_general(&Array2::zeros((0, 0))).unwrap().is_empty());
        let dec = eigen_general(&array![[2.5]]).unwrap();
        assert_eq!(dec.values[0], Complex64::new(2.5, 0.0));
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!(eigen_general(&Array2::zeros((2, 3))).is_err());
        assert!(eigen_general(&array![[f64::INFINITY]]).is_err());
    }
}
