// ─────────────────────────────────────────────────────────────────────
// Campbell Core — Cluster Refiner
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Spectral-clustering repair of crowded mode-sets.
//!
//! Complete sets (one mode per operating point) are sorted by their first
//! frequency and grouped while their frequencies stay within the gap
//! threshold of the group. Each group with more than one set is re-split:
//! pooled modes are embedded with the eigenvectors of the normalized
//! Laplacian of their MAC graph, clustered with seeded k-means, and the
//! clusters are handed back to the sets by minimum-cost assignment. Any
//! operating point contributing more than one mode to a cluster is dropped
//! from that set.

use crate::cancel::CancelToken;
use crate::tracker::check_shape_lengths;
use campbell_math::assignment::min_cost_assignment;
use campbell_math::kmeans::kmeans;
use campbell_math::linalg::symmetric_eigen;
use campbell_math::mac::mac;
use campbell_types::config::ClusterConfig;
use campbell_types::error::{CampbellError, CampbellResult};
use campbell_types::modal::{resolve, ModeRef, ModeSet, OperatingPoint};
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::BTreeMap;

/// Indices into `sets` of the complete sets, grouped by frequency proximity.
pub fn group_complete_sets(
    ops: &[OperatingPoint],
    sets: &[ModeSet],
    gap_hz: f64,
) -> Vec<Vec<usize>> {
    let num_ops = ops.len();
    let freq_at = |set: usize, op: usize| {
        sets[set]
            .mode_at(op)
            .map(|r| resolve(ops, r).natural_freq_hz)
    };

    let mut complete: Vec<usize> = (0..sets.len())
        .filter(|&i| num_ops > 0 && sets[i].is_complete(num_ops))
        .collect();
    complete.sort_by(|&a, &b| {
        let fa = freq_at(a, 0).unwrap_or(f64::INFINITY);
        let fb = freq_at(b, 0).unwrap_or(f64::INFINITY);
        fa.total_cmp(&fb)
    });

    let mut groups: Vec<Vec<usize>> = Vec::new();
    for s in complete {
        let min_gap = groups
            .last()
            .into_iter()
            .flatten()
            .flat_map(|&g| {
                (0..num_ops).filter_map(move |op| Some((freq_at(s, op)? - freq_at(g, op)?).abs()))
            })
            .fold(f64::INFINITY, f64::min);
        match groups.last_mut() {
            Some(group) if min_gap <= gap_hz => group.push(s),
            _ => groups.push(vec![s]),
        }
    }
    groups
}

/// Σ over clusters and operating points of `(count − 1)` for repeated OPs.
pub fn repeated_op_penalty(labels: &[usize], members: &[ModeRef]) -> usize {
    let mut counts: BTreeMap<(usize, usize), usize> = BTreeMap::new();
    for (&label, r) in labels.iter().zip(members) {
        *counts.entry((label, r.op)).or_default() += 1;
    }
    counts.values().map(|&c| c - 1).sum()
}

/// Row-normalized spectral embedding of the MAC graph of `members`.
pub fn spectral_embedding(
    ops: &[OperatingPoint],
    members: &[ModeRef],
    dims: usize,
) -> CampbellResult<Array2<f64>> {
    let n = members.len();
    let mut w = Array2::<f64>::zeros((n, n));
    for i in 0..n {
        for j in (i + 1)..n {
            let v = mac(
                &resolve(ops, members[i]).eigenvector,
                &resolve(ops, members[j]).eigenvector,
            );
            w[[i, j]] = v;
            w[[j, i]] = v;
        }
    }

    let inv_sqrt_deg: Vec<f64> = w
        .rows()
        .into_iter()
        .map(|row| {
            let d = row.sum();
            if d > 0.0 {
                1.0 / d.sqrt()
            } else {
                0.0
            }
        })
        .collect();
    let lsym = Array2::from_shape_fn((n, n), |(i, j)| {
        let lap = if i == j { w.row(i).sum() } else { -w[[i, j]] };
        inv_sqrt_deg[i] * lap * inv_sqrt_deg[j]
    });

    // Ascending eigenvalues: leading columns span the smoothest partitions
    let (_, vectors) = symmetric_eigen(&lsym)?;
    let dims = dims.min(n);
    let mut embedding = vectors.slice(ndarray::s![.., ..dims]).to_owned();
    for mut row in embedding.rows_mut() {
        let norm = row.dot(&row).sqrt();
        if norm > 0.0 {
            row /= norm;
        }
    }
    Ok(embedding)
}

/// Cluster labels for `members` minimizing repeated operating points.
fn best_partition(
    embedding: &Array2<f64>,
    members: &[ModeRef],
    k: usize,
    cfg: &ClusterConfig,
    cancel: &CancelToken,
) -> CampbellResult<(Vec<usize>, usize)> {
    let n = members.len();
    let mut best: Option<(Vec<usize>, usize)> = None;
    for trial in 0..cfg.max_trials {
        cancel.check(&format!("clustering trial {trial}"))?;
        let mut rng = StdRng::seed_from_u64(cfg.seed.wrapping_add(trial as u64));
        let result = kmeans(
            embedding,
            k,
            cfg.kmeans_tolerance,
            cfg.kmeans_max_iterations,
            &mut rng,
        )?;
        let penalty = repeated_op_penalty(&result.labels, members);
        if best.as_ref().map_or(true, |(_, p)| penalty < *p) {
            best = Some((result.labels, penalty));
        }
        if (penalty as f64) / (n as f64) < cfg.early_stop_ratio {
            tracing::trace!(trial, penalty, "clustering stopped early");
            break;
        }
    }
    best.ok_or_else(|| CampbellError::ConfigError("max_trials must be >= 1".to_string()))
}

/// New member lists for the sets of one group, in group order.
fn refine_group(
    ops: &[OperatingPoint],
    sets: &[ModeSet],
    group: &[usize],
    cfg: &ClusterConfig,
    cancel: &CancelToken,
) -> CampbellResult<Vec<Vec<ModeRef>>> {
    let members: Vec<ModeRef> = group
        .iter()
        .flat_map(|&s| sets[s].modes.iter().copied())
        .collect();
    let n = members.len();
    let k = group.len();

    let embedding = spectral_embedding(ops, &members, k)?;
    let (labels, penalty) = best_partition(&embedding, &members, k, cfg, cancel)?;

    let mut cost = Array2::<i64>::zeros((k, k));
    let mut offset = 0;
    for (i, &s) in group.iter().enumerate() {
        let len = sets[s].modes.len();
        let mut overlap = vec![0usize; k];
        for &label in &labels[offset..offset + len] {
            overlap[label] += 1;
        }
        for (j, o) in overlap.into_iter().enumerate() {
            cost[[i, j]] = (n - 1 - o) as i64;
        }
        offset += len;
    }
    let pairs = min_cost_assignment(&cost)?;

    let mut refined = vec![Vec::new(); k];
    for (i, cluster) in pairs {
        let mut by_op: BTreeMap<usize, Vec<ModeRef>> = BTreeMap::new();
        for (r, &label) in members.iter().zip(&labels) {
            if label == cluster {
                by_op.entry(r.op).or_default().push(*r);
            }
        }
        refined[i] = by_op
            .into_values()
            .filter(|modes| modes.len() == 1)
            .flatten()
            .collect();
    }
    tracing::debug!(sets = k, modes = n, penalty, "refined mode-set group");
    Ok(refined)
}

/// Runs `refine` on every multi-set group and writes the new members back.
/// A group whose refinement fails keeps its sets untouched.
fn apply_refinements<F>(
    ops: &mut [OperatingPoint],
    sets: &mut [ModeSet],
    groups: &[Vec<usize>],
    mut refine: F,
) -> CampbellResult<usize>
where
    F: FnMut(&[OperatingPoint], &[ModeSet], &[usize]) -> CampbellResult<Vec<Vec<ModeRef>>>,
{
    let mut refined = 0;
    for group in groups.iter().filter(|g| g.len() > 1) {
        match refine(ops, sets, group) {
            Ok(members) => {
                for (&s, modes) in group.iter().zip(members) {
                    let id = sets[s].id;
                    for r in &modes {
                        ops[r.op].modes[r.mode].cluster = Some(id);
                    }
                    sets[s].modes = modes;
                }
                refined += 1;
            }
            Err(e) if e.is_cancelled() => return Err(e),
            Err(e) => {
                tracing::warn!(sets = group.len(), error = %e, "cluster refinement skipped");
            }
        }
    }
    Ok(refined)
}

/// Re-split crowded groups of complete sets; returns the number of groups
/// refined.
///
/// A failing group is logged and left as tracked. Cancellation aborts.
/// Refined modes are tagged with the id of the set they end up in, empty
/// sets are dropped and the result is re-sorted by minimum frequency.
pub fn refine_clusters(
    ops: &mut [OperatingPoint],
    sets: &mut Vec<ModeSet>,
    cfg: &ClusterConfig,
    cancel: &CancelToken,
) -> CampbellResult<usize> {
    cfg.validate()?;
    check_shape_lengths(ops)?;

    let groups = group_complete_sets(ops, sets, cfg.group_gap_hz);
    let refined = apply_refinements(ops, sets, &groups, |ops, sets, group| {
        refine_group(ops, sets, group, cfg, cancel)
    })?;

    let before = sets.len();
    sets.retain(|s| !s.modes.is_empty());
    if sets.len() < before {
        tracing::debug!(dropped = before - sets.len(), "empty sets after refinement");
    }
    for s in sets.iter_mut() {
        s.update_frequency(ops);
    }
    sets.sort_by(|a, b| a.frequency[0].total_cmp(&b.frequency[0]));
    tracing::info!(
        groups = groups.len(),
        refined,
        sets = sets.len(),
        "cluster refinement complete"
    );
    Ok(refined)
}
