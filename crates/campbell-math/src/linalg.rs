// ─────────────────────────────────────────────────────────────────────
// Campbell Core — Linear Algebra
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Small dense kernels: Gauss–Jordan inverse, Jacobi symmetric eigen-solver
//! and block placement helpers.

use campbell_types::constants::SINGULAR_PIVOT_TOL;
use campbell_types::error::{CampbellError, CampbellResult};
use ndarray::{s, Array1, Array2};

/// Sweep limit for the cyclic Jacobi iteration.
const JACOBI_MAX_SWEEPS: usize = 100;

/// Inverse by Gauss–Jordan elimination with partial pivoting.
///
/// Fails with `SingularMatrix` when the largest available pivot drops
/// below `SINGULAR_PIVOT_TOL`.
pub fn invert(a: &Array2<f64>) -> CampbellResult<Array2<f64>> {
    let (n, m) = a.dim();
    if n != m {
        return Err(CampbellError::InvalidInput(format!(
            "cannot invert a {n}x{m} matrix"
        )));
    }
    let mut work = a.clone();
    let mut inv = Array2::eye(n);

    for col in 0..n {
        let mut pivot_row = col;
        let mut pivot_abs = work[[col, col]].abs();
        for row in (col + 1)..n {
            if work[[row, col]].abs() > pivot_abs {
                pivot_abs = work[[row, col]].abs();
                pivot_row = row;
            }
        }
        if !(pivot_abs >= SINGULAR_PIVOT_TOL) {
            return Err(CampbellError::SingularMatrix(format!(
                "pivot {pivot_abs:.3e} in column {col} of {n}x{n} matrix"
            )));
        }
        if pivot_row != col {
            for j in 0..n {
                work.swap([col, j], [pivot_row, j]);
                inv.swap([col, j], [pivot_row, j]);
            }
        }

        let inv_pivot = 1.0 / work[[col, col]];
        for j in 0..n {
            work[[col, j]] *= inv_pivot;
            inv[[col, j]] *= inv_pivot;
        }
        for row in 0..n {
            if row == col {
                continue;
            }
            let factor = work[[row, col]];
            if factor == 0.0 {
                continue;
            }
            for j in 0..n {
                work[[row, j]] -= factor * work[[col, j]];
                inv[[row, j]] -= factor * inv[[col, j]];
            }
        }
    }

    Ok(inv)
}

/// Eigen-decomposition of a real symmetric matrix by cyclic Jacobi rotations.
///
/// Returns `(values, vectors)` with eigenvalues ascending and the matching
/// unit eigenvectors as columns of `vectors`.
pub fn symmetric_eigen(a: &Array2<f64>) -> CampbellResult<(Array1<f64>, Array2<f64>)> {
    let (n, m) = a.dim();
    if n != m {
        return Err(CampbellError::InvalidInput(format!(
            "symmetric eigen-solver needs a square matrix, got {n}x{m}"
        )));
    }
    if a.iter().any(|v| !v.is_finite()) {
        return Err(CampbellError::InvalidInput(
            "symmetric eigen-solver input contains non-finite entries".to_string(),
        ));
    }

    let mut work = a.clone();
    let mut v = Array2::eye(n);
    let scale = work.iter().map(|x| x.abs()).sum::<f64>().max(1.0);
    let tol = 1e-13 * scale;

    let mut converged = n < 2;
    for _ in 0..JACOBI_MAX_SWEEPS {
        let mut off_diag = 0.0;
        for i in 0..n {
            for j in (i + 1)..n {
                off_diag += work[[i, j]].abs();
            }
        }
        if off_diag < tol {
            converged = true;
            break;
        }

        for i in 0..n {
            for j in (i + 1)..n {
                let aij = work[[i, j]];
                if aij.abs() < 1e-300 {
                    continue;
                }
                let tau = (work[[j, j]] - work[[i, i]]) / (2.0 * aij);
                let t = if tau >= 0.0 {
                    1.0 / (tau + (1.0 + tau * tau).sqrt())
                } else {
                    -1.0 / (-tau + (1.0 + tau * tau).sqrt())
                };
                let cos = 1.0 / (1.0 + t * t).sqrt();
                let sin = t * cos;

                let aii = work[[i, i]];
                let ajj = work[[j, j]];
                work[[i, i]] = cos * cos * aii - 2.0 * sin * cos * aij + sin * sin * ajj;
                work[[j, j]] = sin * sin * aii + 2.0 * sin * cos * aij + cos * cos * ajj;
                work[[i, j]] = 0.0;
                work[[j, i]] = 0.0;

                for r in 0..n {
                    if r == i || r == j {
                        continue;
                    }
                    let ri = work[[r, i]];
                    let rj = work[[r, j]];
                    work[[r, i]] = cos * ri - sin * rj;
                    work[[i, r]] = work[[r, i]];
                    work[[r, j]] = sin * ri + cos * rj;
                    work[[j, r]] = work[[r, j]];
                }

                for r in 0..n {
                    let vi = v[[r, i]];
                    let vj = v[[r, j]];
                    v[[r, i]] = cos * vi - sin * vj;
                    v[[r, j]] = sin * vi + cos * vj;
                }
            }
        }
    }
    if !converged {
        return Err(CampbellError::EigenNotConverged {
            context: format!("Jacobi sweep on {n}x{n} symmetric matrix"),
            iterations: JACOBI_MAX_SWEEPS,
        });
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&i, &j| work[[i, i]].total_cmp(&work[[j, j]]));

    let values: Array1<f64> = order.iter().map(|&k| work[[k, k]]).collect();
    let mut vectors = Array2::zeros((n, n));
    for (dst, &src) in order.iter().enumerate() {
        vectors.column_mut(dst).assign(&v.column(src));
    }
    Ok((values, vectors))
}

/// Write `block` into `target` with its top-left corner at `(row, col)`.
pub fn place_block(target: &mut Array2<f64>, row: usize, col: usize, block: &Array2<f64>) {
    let (r, c) = block.dim();
    target
        .slice_mut(s![row..row + r, col..col + c])
        .assign(block);
}

/// Symmetric permutation `P A Pᵀ`: `out[i][j] = a[idx[i]][idx[j]]`.
pub fn permute_symmetric(a: &Array2<f64>, idx: &[usize]) -> Array2<f64> {
    let n = idx.len();
    Array2::from_shape_fn((n, n), |(i, j)| a[[idx[i], idx[j]]])
}

/// Inverse of [`permute_symmetric`]: `out[idx[i]][idx[j]] = a[i][j]`.
pub fn unpermute_symmetric(a: &Array2<f64>, idx: &[usize]) -> Array2<f64> {
    let n = idx.len();
    let mut out = Array2::zeros((n, n));
    for (i, &ri) in idx.iter().enumerate() {
        for (j, &cj) in idx.iter().enumerate() {
            out[[ri, cj]] = a[[i, j]];
        }
    }
    out
}
