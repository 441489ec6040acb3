// ─────────────────────────────────────────────────────────────────────
// Campbell Core — k-means
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Lloyd's k-means with k-means++ seeding on the rows of a dense matrix.

use campbell_types::error::{CampbellError, CampbellResult};
use ndarray::{Array2, ArrayView1};
use rand::Rng;

/// Outcome of one k-means run.
#[derive(Debug, Clone)]
pub struct KMeansResult {
    /// Cluster index per input row.
    pub labels: Vec<usize>,
    /// [k, dims]
    pub centroids: Array2<f64>,
    pub iterations: usize,
    pub converged: bool,
}

fn sq_dist(a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// k-means++ initial centroids.
fn seed_centroids<R: Rng + ?Sized>(points: &Array2<f64>, k: usize, rng: &mut R) -> Array2<f64> {
    let (n, dims) = points.dim();
    let mut centroids = Array2::zeros((k, dims));
    let first = rng.gen_range(0..n);
    centroids.row_mut(0).assign(&points.row(first));

    let mut nearest: Vec<f64> = (0..n)
        .map(|i| sq_dist(points.row(i), centroids.row(0)))
        .collect();

    for c in 1..k {
        let total: f64 = nearest.iter().sum();
        let pick = if total > 0.0 {
            let mut target = rng.gen::<f64>() * total;
            let mut chosen = n - 1;
            for (i, &d) in nearest.iter().enumerate() {
                if target < d {
                    chosen = i;
                    break;
                }
                target -= d;
            }
            chosen
        } else {
            rng.gen_range(0..n)
        };
        centroids.row_mut(c).assign(&points.row(pick));
        for (i, best) in nearest.iter_mut().enumerate() {
            *best = best.min(sq_dist(points.row(i), centroids.row(c)));
        }
    }
    centroids
}

/// Cluster the rows of `points` into `k` groups.
///
/// Iterates until every centroid moves less than `tolerance` (Euclidean) or
/// `max_iterations` is reached. An emptied cluster keeps its old centroid.
pub fn kmeans<R: Rng + ?Sized>(
    points: &Array2<f64>,
    k: usize,
    tolerance: f64,
    max_iterations: usize,
    rng: &mut R,
) -> CampbellResult<KMeansResult> {
    let (n, dims) = points.dim();
    if k == 0 || k > n {
        return Err(CampbellError::InvalidInput(format!(
            "k-means needs 1 <= k <= points, got k={k} for {n} points"
        )));
    }

    let mut centroids = seed_centroids(points, k, rng);
    let mut labels = vec![0usize; n];
    let mut iterations = 0;
    let mut converged = false;

    while iterations < max_iterations {
        iterations += 1;

        for (i, label) in labels.iter_mut().enumerate() {
            let mut best = f64::INFINITY;
            for c in 0..k {
                let d = sq_dist(points.row(i), centroids.row(c));
                if d < best {
                    best = d;
                    *label = c;
                }
            }
        }

        let mut sums = Array2::<f64>::zeros((k, dims));
        let mut counts = vec![0usize; k];
        for (i, &label) in labels.iter().enumerate() {
            let mut row = sums.row_mut(label);
            row += &points.row(i);
            counts[label] += 1;
        }

        let mut max_shift: f64 = 0.0;
        for c in 0..k {
            if counts[c] == 0 {
                continue;
            }
            let updated = sums.row(c).mapv(|v| v / counts[c] as f64);
            max_shift = max_shift.max(sq_dist(updated.view(), centroids.row(c)).sqrt());
            centroids.row_mut(c).assign(&updated);
        }

        if max_shift < tolerance {
            converged = true;
            break;
        }
    }

    Ok(KMeansResult {
        labels,
        centroids,
        iterations,
        converged,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn blobs() -> Array2<f64> {
        let centers = [[0.0, 0.0], [10.0, 0.0], [0.0, 10.0]];
        let mut pts = Array2::zeros((12, 2));
        for (b, center) in centers.iter().enumerate() {
            for j in 0..4 {
                let off = 0.1 * j as f64;
                pts[[4 * b + j, 0]] = center[0] + off;
                pts[[4 * b + j, 1]] = center[1] - off;
            }
        }
        pts
    }

    #[test]
    fn test_separates_blobs() {
        let pts = blobs();
        let mut rng = StdRng::seed_from_u64(3);
        let res = kmeans(&pts, 3, 1e-3, 100, &mut rng).unwrap();
        assert!(res.converged);
        for b in 0..3 {
            let label = res.labels[4 * b];
            for j in 1..4 {
                assert_eq!(res.labels[4 * b + j], label, "blob {b} split");
            }
        }
        let mut distinct = res.labels.clone();
        distinct.sort_unstable();
        distinct.dedup();
        assert_eq!(distinct.len(), 3);
    }

    #[test]
    fn test_seeded_runs_repeat() {
        let pts = blobs();
        let a = kmeans(&pts, 3, 1e-3, 100, &mut StdRng::seed_from_u64(11)).unwrap();
        let b = kmeans(&pts, 3, 1e-3, 100, &mut StdRng::seed_from_u64(11)).unwrap();
        assert_eq!(a.labels, b.labels);
    }

    #[test]
    fn test_duplicate_points() {
        let pts = Array2::from_elem((4, 2), 1.0);
        let res = kmeans(&pts, 2, 1e-3, 10, &mut StdRng::seed_from_u64(0)).unwrap();
        assert_eq!(res.labels.len(), 4);
        assert!(res.labels.iter().all(|&l| l < 2));
    }

    #[test]
    fn test_rejects_bad_k() {
        let pts = blobs();
        let mut rng = StdRng::seed_from_u64(0);
        assert!(kmeans(&pts, 0, 1e-3, 10, &mut rng).is_err());
        assert!(kmeans(&pts, 13, 1e-3, 10, &mut rng).is_err());
    }
}
