// ─────────────────────────────────────────────────────────────────────
// Campbell Core — Assignment Solver
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Minimum-cost bipartite assignment (Kuhn–Munkres).
//!
//! The cost matrix is padded to square with zero-cost dummy entries; pairs
//! touching a dummy row or column are dropped from the result. Entries equal
//! to [`INVALID_COST`] are never assigned.
//!
//! Complexity: O(n³) in the padded dimension.

use campbell_types::error::{CampbellError, CampbellResult};
use ndarray::Array2;

/// Marks a forbidden pairing.
pub const INVALID_COST: i64 = i64::MAX;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    CoverStarredColumns,
    PrimeUncoveredZero,
    Augment(usize, usize),
    AdjustByMinimum,
    Done,
}

struct Munkres {
    n: usize,
    cost: Array2<i64>,
    starred: Array2<bool>,
    primed: Array2<bool>,
    row_covered: Vec<bool>,
    col_covered: Vec<bool>,
}

/// Solve the minimum-cost assignment for a non-negative integer cost matrix.
///
/// Returns `(row, col)` pairs in row-major order, each within the original
/// bounds, covering `min(rows, cols)` items.
pub fn min_cost_assignment(cost: &Array2<i64>) -> CampbellResult<Vec<(usize, usize)>> {
    let (rows, cols) = cost.dim();
    let n = rows.max(cols);
    if rows == 0 || cols == 0 {
        return Ok(Vec::new());
    }
    if let Some(bad) = cost.iter().find(|&&c| c < 0) {
        return Err(CampbellError::InvalidInput(format!(
            "assignment costs must be non-negative, found {bad}"
        )));
    }

    let mut padded = Array2::zeros((n, n));
    padded
        .slice_mut(ndarray::s![..rows, ..cols])
        .assign(cost);

    let mut solver = Munkres {
        n,
        cost: padded,
        starred: Array2::from_elem((n, n), false),
        primed: Array2::from_elem((n, n), false),
        row_covered: vec![false; n],
        col_covered: vec![false; n],
    };
    solver.reduce_rows()?;
    solver.star_zeros();

    let mut step = Step::CoverStarredColumns;
    while step != Step::Done {
        step = match step {
            Step::CoverStarredColumns => solver.cover_starred_columns(),
            Step::PrimeUncoveredZero => solver.prime_uncovered_zero(),
            Step::Augment(r, c) => solver.augment(r, c),
            Step::AdjustByMinimum => solver.adjust_by_minimum()?,
            Step::Done => Step::Done,
        };
    }

    let mut pairs = Vec::with_capacity(rows.min(cols));
    for i in 0..rows {
        for j in 0..cols {
            if solver.starred[[i, j]] {
                pairs.push((i, j));
            }
        }
    }
    Ok(pairs)
}

/// Sum of `cost` over the given pairs.
pub fn total_cost(cost: &Array2<i64>, pairs: &[(usize, usize)]) -> i64 {
    pairs.iter().map(|&(i, j)| cost[[i, j]]).sum()
}

impl Munkres {
    fn reduce_rows(&mut self) -> CampbellResult<()> {
        for i in 0..self.n {
            let min = self
                .cost
                .row(i)
                .iter()
                .copied()
                .filter(|&c| c != INVALID_COST)
                .min()
                .ok_or_else(|| {
                    CampbellError::AssignmentInfeasible(format!("row {i} has no valid entry"))
                })?;
            for c in self.cost.row_mut(i).iter_mut() {
                if *c != INVALID_COST {
                    *c -= min;
                }
            }
        }
        Ok(())
    }

    fn star_zeros(&mut self) {
        for i in 0..self.n {
            for j in 0..self.n {
                if self.cost[[i, j]] == 0 && !self.row_covered[i] && !self.col_covered[j] {
                    self.starred[[i, j]] = true;
                    self.row_covered[i] = true;
                    self.col_covered[j] = true;
                }
            }
        }
        self.clear_covers();
    }

    fn cover_starred_columns(&mut self) -> Step {
        let mut count = 0;
        for j in 0..self.n {
            if (0..self.n).any(|i| self.starred[[i, j]]) {
                self.col_covered[j] = true;
                count += 1;
            }
        }
        if count >= self.n {
            Step::Done
        } else {
            Step::PrimeUncoveredZero
        }
    }

    fn prime_uncovered_zero(&mut self) -> Step {
        loop {
            let Some((r, c)) = self.find_uncovered_zero() else {
                return Step::AdjustByMinimum;
            };
            self.primed[[r, c]] = true;
            match self.star_in_row(r) {
                Some(star_col) => {
                    self.row_covered[r] = true;
                    self.col_covered[star_col] = false;
                }
                None => return Step::Augment(r, c),
            }
        }
    }

    /// Flip stars and primes along the alternating path starting at the
    /// primed zero `(r, c)`.
    fn augment(&mut self, r: usize, c: usize) -> Step {
        let mut path = vec![(r, c)];
        let mut col = c;
        while let Some(star_row) = self.star_in_col(col) {
            path.push((star_row, col));
            // A star on the path always has a prime in its row
            let Some(prime_col) = self.prime_in_row(star_row) else {
                break;
            };
            path.push((star_row, prime_col));
            col = prime_col;
        }

        for &(i, j) in &path {
            self.starred[[i, j]] = !self.starred[[i, j]];
        }
        self.clear_covers();
        self.primed.fill(false);
        Step::CoverStarredColumns
    }

    fn adjust_by_minimum(&mut self) -> CampbellResult<Step> {
        let mut min: Option<i64> = None;
        for i in 0..self.n {
            if self.row_covered[i] {
                continue;
            }
            for j in 0..self.n {
                let c = self.cost[[i, j]];
                if !self.col_covered[j] && c != INVALID_COST {
                    min = Some(min.map_or(c, |m| m.min(c)));
                }
            }
        }
        let min = match min {
            Some(m) if m > 0 => m,
            _ => {
                return Err(CampbellError::AssignmentInfeasible(
                    "matrix cannot be solved: no uncovered entry to adjust".to_string(),
                ))
            }
        };

        for i in 0..self.n {
            for j in 0..self.n {
                let c = &mut self.cost[[i, j]];
                if *c == INVALID_COST {
                    continue;
                }
                if self.row_covered[i] {
                    *c = c.saturating_add(min);
                }
                if !self.col_covered[j] {
                    *c -= min;
                }
            }
        }
        Ok(Step::PrimeUncoveredZero)
    }

    fn find_uncovered_zero(&self) -> Option<(usize, usize)> {
        for i in 0..self.n {
            if self.row_covered[i] {
                continue;
            }
            for j in 0..self.n {
                if !self.col_covered[j] && self.cost[[i, j]] == 0 {
                    return Some((i, j));
                }
            }
        }
        None
    }

    fn star_in_row(&self, r: usize) -> Option<usize> {
        (0..self.n).find(|&j| self.starred[[r, j]])
    }

    fn star_in_col(&self, c: usize) -> Option<usize> {
        (0..self.n).find(|&i| self.starred[[i, c]])
    }

    fn prime_in_row(&self, r: usize) -> Option<usize> {
        (0..self.n).find(|&j| self.primed[[r, j]])
    }

    fn clear_covers(&mut self) {
        self.row_covered.fill(false);
        self.col_covered.fill(false);
    }
}
