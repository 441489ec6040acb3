// ─────────────────────────────────────────────────────────────────────
// Campbell Core — Pipeline
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Parallel per-group analysis and sequential diagram construction.
//!
//! Groups are independent: each worker of a dedicated rayon pool runs
//! aggregation, the multi-blade transform and eigen-analysis for one group.
//! Results are collected, sorted by group name, then ordered by wind or
//! rotor speed before tracking, which stays single-threaded.

use crate::aggregate::aggregate;
use crate::cancel::CancelToken;
use crate::diagram::{build_diagram, order_operating_points};
use crate::linfile::{discover_groups, LinFileGroup};
use crate::mbc::mbc_transform;
use crate::modal::eigen_analysis;
use campbell_types::config::{AnalysisConfig, FailurePolicy, PipelineConfig};
use campbell_types::diagram::Diagram;
use campbell_types::error::{CampbellError, CampbellResult};
use campbell_types::modal::{ModeSet, OperatingPoint};
use campbell_types::snapshot::OperatingPointGroup;
use rayon::prelude::*;
use std::path::Path;

/// Per-group results, ordered for tracking.
#[derive(Debug, Default)]
pub struct ModalResults {
    pub operating_points: Vec<OperatingPoint>,
    /// Groups that failed under the best-effort policy, by name.
    pub failures: Vec<(String, CampbellError)>,
}

#[derive(Debug)]
pub struct PipelineOutput {
    pub operating_points: Vec<OperatingPoint>,
    pub mode_sets: Vec<ModeSet>,
    pub diagram: Diagram,
    pub failures: Vec<(String, CampbellError)>,
}

/// Aggregate, transform and eigen-analyze one operating-point group.
pub fn analyze_group(group: &OperatingPointGroup) -> CampbellResult<OperatingPoint> {
    let series = aggregate(group);
    let model = mbc_transform(&series)?;
    let modes = eigen_analysis(&model, 0)?;
    tracing::debug!(
        group = group.name(),
        steps = series.num_steps(),
        modes = modes.len(),
        rpm = model.rotor_speed_rpm,
        "operating point analyzed"
    );
    Ok(OperatingPoint {
        name: group.name().to_string(),
        model,
        modes,
    })
}

fn available_cores() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Run `work` over `items` on a pool sized by `cfg`.
///
/// Under `AbortAll` the first failure stops groups that have not started
/// and is returned; under `BestEffort` failures are collected and the run
/// fails only when no group succeeds.
fn run_pool<T, N, F>(
    items: &[T],
    name_of: N,
    work: F,
    cfg: &PipelineConfig,
    cancel: &CancelToken,
) -> CampbellResult<ModalResults>
where
    T: Sync,
    N: Fn(&T) -> String + Sync,
    F: Fn(&T) -> CampbellResult<OperatingPoint> + Sync,
{
    cfg.validate()?;
    let workers = cfg.worker_count(available_cores());
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("campbell-worker-{i}"))
        .build()
        .map_err(|e| CampbellError::ConfigError(format!("worker pool: {e}")))?;
    tracing::info!(
        groups = items.len(),
        workers,
        policy = ?cfg.failure_policy,
        "analyzing operating points"
    );

    let abort = CancelToken::new();
    let mut results: Vec<(String, CampbellResult<OperatingPoint>)> = pool.install(|| {
        items
            .par_iter()
            .map(|item| {
                let name = name_of(item);
                let outcome = cancel
                    .check("operating-point analysis")
                    .and_then(|_| abort.check("sibling group failed"))
                    .and_then(|_| work(item))
                    .map_err(|e| e.in_group(&name));
                if let Err(e) = &outcome {
                    if !e.is_cancelled() && cfg.failure_policy == FailurePolicy::AbortAll {
                        abort.cancel();
                    }
                }
                (name, outcome)
            })
            .collect()
    });
    cancel.check("operating-point analysis")?;
    results.sort_by(|a, b| a.0.cmp(&b.0));

    let mut out = ModalResults::default();
    for (name, outcome) in results {
        match outcome {
            Ok(op) => out.operating_points.push(op),
            Err(e) => out.failures.push((name, e)),
        }
    }

    if cfg.failure_policy == FailurePolicy::AbortAll {
        if let Some(pos) = out.failures.iter().position(|(_, e)| !e.is_cancelled()) {
            let (name, err) = out.failures.swap_remove(pos);
            tracing::error!(group = %name, error = %err, "operating point failed, aborting");
            return Err(err);
        }
    }
    for (name, err) in &out.failures {
        tracing::warn!(group = %name, error = %err, "operating point skipped");
    }
    if out.operating_points.is_empty() && !out.failures.is_empty() {
        let (_, err) = out.failures.swap_remove(0);
        return Err(err);
    }

    order_operating_points(&mut out.operating_points);
    Ok(out)
}

/// Analyze already-loaded groups.
pub fn analyze_groups(
    groups: &[OperatingPointGroup],
    cfg: &PipelineConfig,
    cancel: &CancelToken,
) -> CampbellResult<ModalResults> {
    run_pool(groups, |g| g.name().to_string(), analyze_group, cfg, cancel)
}

/// Load and analyze groups of linearization files; parse errors count as
/// group failures.
pub fn analyze_lin_groups(
    groups: &[LinFileGroup],
    cfg: &PipelineConfig,
    cancel: &CancelToken,
) -> CampbellResult<ModalResults> {
    run_pool(
        groups,
        |g| g.name.clone(),
        |g| analyze_group(&g.load()?),
        cfg,
        cancel,
    )
}

/// Track, refine and assemble from per-group results.
pub fn finish(
    modal: ModalResults,
    cfg: &AnalysisConfig,
    cancel: &CancelToken,
) -> CampbellResult<PipelineOutput> {
    let ModalResults {
        mut operating_points,
        failures,
    } = modal;
    let (diagram, mode_sets) = build_diagram(
        &mut operating_points,
        &cfg.diagram,
        &cfg.clustering,
        cancel,
    )?;
    Ok(PipelineOutput {
        operating_points,
        mode_sets,
        diagram,
        failures,
    })
}

/// Full run over the `.lin` files directly inside `dir`.
pub fn analyze_directory(
    dir: impl AsRef<Path>,
    cfg: &AnalysisConfig,
    cancel: &CancelToken,
) -> CampbellResult<PipelineOutput> {
    cfg.validate()?;
    let groups = discover_groups(dir.as_ref())?;
    if groups.is_empty() {
        return Err(CampbellError::InvalidInput(format!(
            "no '.N.lin' files in {}",
            dir.as_ref().display()
        )));
    }
    let modal = analyze_lin_groups(&groups, &cfg.pipeline, cancel)?;
    finish(modal, cfg, cancel)
}
