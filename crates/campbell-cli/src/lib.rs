// ─────────────────────────────────────────────────────────────────────
// Campbell Core — CLI
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Command-line front end.
//!
//! ```bash
//! # Diagram from every `<name>.<N>.lin` in a directory
//! campbell diagram runs/ -o campbell.json
//!
//! # Per-operating-point mode table, no tracking
//! campbell modes runs/ --max-freq 2.0
//!
//! # Print the default configuration as JSON
//! campbell config
//! ```

use anyhow::{Context, Result};
use campbell_core::cancel::CancelToken;
use campbell_core::linfile::discover_groups;
use campbell_core::pipeline::{analyze_directory, analyze_lin_groups};
use campbell_types::config::{AnalysisConfig, FailurePolicy};
use campbell_types::modal::OperatingPoint;
use clap::{Args, Parser, Subcommand};
use std::fmt::Write;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "campbell")]
#[command(author, version, about = "Campbell diagrams from wind-turbine linearizations")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Track modes across operating points and write the diagram as JSON
    Diagram(DiagramArgs),
    /// List the modes of each operating point
    Modes(ModesArgs),
    /// Print the effective configuration
    Config(ConfigArgs),
}

/// Settings shared by every command that runs the analysis.
#[derive(Args, Debug, Clone, Default)]
pub struct AnalysisArgs {
    /// JSON configuration file; flags below override it
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Lower bound of the frequency window [Hz]
    #[arg(long)]
    pub min_freq: Option<f64>,

    /// Upper bound of the frequency window [Hz]
    #[arg(long)]
    pub max_freq: Option<f64>,

    /// Keep only structurally dominated modes when aero states exist
    #[arg(long)]
    pub structural_only: bool,

    /// Worker threads for per-operating-point analysis
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Skip failing operating points instead of aborting
    #[arg(long)]
    pub best_effort: bool,
}

#[derive(Args, Debug)]
pub struct DiagramArgs {
    /// Directory holding the linearization files
    pub dir: PathBuf,

    #[command(flatten)]
    pub analysis: AnalysisArgs,

    /// Skip spectral cluster refinement
    #[arg(long)]
    pub no_cluster: bool,

    /// Output file; stdout when omitted
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct ModesArgs {
    /// Directory holding the linearization files
    pub dir: PathBuf,

    #[command(flatten)]
    pub analysis: AnalysisArgs,
}

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(flatten)]
    pub analysis: AnalysisArgs,
}

impl AnalysisArgs {
    /// Configuration file (or defaults) with command-line overrides applied.
    pub fn resolve(&self) -> Result<AnalysisConfig> {
        let mut cfg = match &self.config {
            Some(path) => {
                let path = path
                    .to_str()
                    .with_context(|| format!("non-UTF-8 config path {}", path.display()))?;
                AnalysisConfig::from_file(path)
                    .with_context(|| format!("loading config {path}"))?
            }
            None => AnalysisConfig::default(),
        };
        if let Some(v) = self.min_freq {
            cfg.diagram.min_freq_hz = v;
        }
        if let Some(v) = self.max_freq {
            cfg.diagram.max_freq_hz = v;
        }
        if self.structural_only {
            cfg.diagram.structural_only = true;
        }
        if let Some(n) = self.workers {
            cfg.pipeline.num_workers = Some(n);
        }
        if self.best_effort {
            cfg.pipeline.failure_policy = FailurePolicy::BestEffort;
        }
        cfg.validate().context("invalid configuration")?;
        Ok(cfg)
    }
}

pub fn run_diagram(args: &DiagramArgs, cancel: &CancelToken) -> Result<()> {
    let mut cfg = args.analysis.resolve()?;
    if args.no_cluster {
        cfg.diagram.cluster = false;
    }
    let out = analyze_directory(&args.dir, &cfg, cancel)
        .with_context(|| format!("analyzing {}", args.dir.display()))?;
    for (name, err) in &out.failures {
        tracing::warn!(group = %name, error = %err, "not in diagram");
    }

    match &args.output {
        Some(path) => {
            let path = path
                .to_str()
                .with_context(|| format!("non-UTF-8 output path {}", path.display()))?;
            out.diagram.save(path).with_context(|| format!("writing {path}"))?;
            tracing::info!(path, lines = out.diagram.lines.len(), "diagram written");
        }
        None => println!("{}", out.diagram.to_json()?),
    }
    Ok(())
}

pub fn run_modes(args: &ModesArgs, cancel: &CancelToken) -> Result<()> {
    let cfg = args.analysis.resolve()?;
    let groups = discover_groups(&args.dir)?;
    anyhow::ensure!(!groups.is_empty(), "no '.N.lin' files in {}", args.dir.display());
    let modal = analyze_lin_groups(&groups, &cfg.pipeline, cancel)?;
    print!("{}", render_modes(&modal.operating_points, &cfg));
    Ok(())
}

pub fn run_config(args: &ConfigArgs) -> Result<()> {
    let cfg = args.analysis.resolve()?;
    println!("{}", serde_json::to_string_pretty(&cfg)?);
    Ok(())
}

/// Plain-text table of the in-window modes of each operating point.
pub fn render_modes(ops: &[OperatingPoint], cfg: &AnalysisConfig) -> String {
    let mut out = String::new();
    for op in ops {
        let _ = writeln!(
            out,
            "{}  rotor {:.2} rpm  wind {:.2} m/s",
            op.name, op.model.rotor_speed_rpm, op.model.wind_speed
        );
        let _ = writeln!(
            out,
            "  {:>4}  {:>12}  {:>12}  {:>10}  module",
            "id", "natural Hz", "damped Hz", "damping"
        );
        for m in op
            .modes
            .iter()
            .filter(|m| cfg.diagram.in_window(m.natural_freq_hz))
        {
            let _ = writeln!(
                out,
                "  {:>4}  {:>12.5}  {:>12.5}  {:>10.5}  {}",
                m.id, m.natural_freq_hz, m.damped_freq_hz, m.damping_ratio, m.max_module
            );
        }
    }
    out
}
