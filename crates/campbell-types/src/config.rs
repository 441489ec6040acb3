// ─────────────────────────────────────────────────────────────────────
// Campbell Core — Config
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
use crate::error::{CampbellError, CampbellResult};
use serde::{Deserialize, Serialize};

/// Top-level analysis configuration.
/// Every section is optional in JSON; missing fields take their defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default)]
    pub diagram: DiagramOptions,
    #[serde(default)]
    pub clustering: ClusterConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

/// Options accepted by diagram generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagramOptions {
    /// Lower bound of the frequency window [Hz] (default: 0.0)
    #[serde(default = "default_min_freq_hz")]
    pub min_freq_hz: f64,
    /// Upper bound of the frequency window [Hz] (default: 5.0)
    #[serde(default = "default_max_freq_hz")]
    pub max_freq_hz: f64,
    /// Exclude modes dominated by non-structural states (default: false)
    #[serde(default)]
    pub structural_only: bool,
    /// Run the spectral-clustering refinement pass (default: true)
    #[serde(default = "default_true")]
    pub cluster: bool,
}

/// Spectral-clustering refinement parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterConfig {
    /// Frequency gap that starts a new candidate group [Hz] (default: 0.05)
    #[serde(default = "default_group_gap_hz")]
    pub group_gap_hz: f64,
    /// k-means centroid movement tolerance (default: 0.001)
    #[serde(default = "default_kmeans_tolerance")]
    pub kmeans_tolerance: f64,
    /// k-means iteration cap per trial (default: 1000)
    #[serde(default = "default_kmeans_max_iterations")]
    pub kmeans_max_iterations: usize,
    /// Number of randomly seeded k-means trials (default: 1000)
    #[serde(default = "default_max_trials")]
    pub max_trials: usize,
    /// Stop early once repeated-OP penalty / modes falls below this (default: 0.01)
    #[serde(default = "default_early_stop_ratio")]
    pub early_stop_ratio: f64,
    /// Seed for k-means initialization
    #[serde(default = "default_seed")]
    pub seed: u64,
}

/// What happens to the rest of the run when one operating point fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Cancel queued groups and return the first error.
    #[default]
    AbortAll,
    /// Drop failed groups and continue with the rest.
    BestEffort,
}

/// Per-group worker pool settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Worker thread count. None selects 1 + 2/3 of the available cores.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_workers: Option<usize>,
    #[serde(default)]
    pub failure_policy: FailurePolicy,
}

fn default_min_freq_hz() -> f64 {
    0.0
}
fn default_max_freq_hz() -> f64 {
    5.0
}
fn default_true() -> bool {
    true
}
fn default_group_gap_hz() -> f64 {
    0.05
}
fn default_kmeans_tolerance() -> f64 {
    0.001
}
fn default_kmeans_max_iterations() -> usize {
    1000
}
fn default_max_trials() -> usize {
    1000
}
fn default_early_stop_ratio() -> f64 {
    0.01
}
fn default_seed() -> u64 {
    0x5eed_ca3b
}

impl Default for DiagramOptions {
    fn default() -> Self {
        DiagramOptions {
            min_freq_hz: default_min_freq_hz(),
            max_freq_hz: default_max_freq_hz(),
            structural_only: false,
            cluster: default_true(),
        }
    }
}

impl Default for ClusterConfig {
    fn default() -> Self {
        ClusterConfig {
            group_gap_hz: default_group_gap_hz(),
            kmeans_tolerance: default_kmeans_tolerance(),
            kmeans_max_iterations: default_kmeans_max_iterations(),
            max_trials: default_max_trials(),
            early_stop_ratio: default_early_stop_ratio(),
            seed: default_seed(),
        }
    }
}

impl DiagramOptions {
    /// Width of the frequency window, used to normalize frequency gaps.
    pub fn frequency_range(&self) -> f64 {
        self.max_freq_hz - self.min_freq_hz
    }

    /// True when `freq_hz` lies inside the closed window.
    pub fn in_window(&self, freq_hz: f64) -> bool {
        freq_hz >= self.min_freq_hz && freq_hz <= self.max_freq_hz
    }

    pub fn validate(&self) -> CampbellResult<()> {
        if !self.min_freq_hz.is_finite() || !self.max_freq_hz.is_finite() {
            return Err(CampbellError::ConfigError(
                "frequency window bounds must be finite".to_string(),
            ));
        }
        if self.max_freq_hz <= self.min_freq_hz {
            return Err(CampbellError::ConfigError(format!(
                "max_freq_hz ({}) must exceed min_freq_hz ({})",
                self.max_freq_hz, self.min_freq_hz
            )));
        }
        Ok(())
    }
}

impl ClusterConfig {
    pub fn validate(&self) -> CampbellResult<()> {
        if !self.group_gap_hz.is_finite() || self.group_gap_hz < 0.0 {
            return Err(CampbellError::ConfigError(
                "group_gap_hz must be finite and >= 0".to_string(),
            ));
        }
        if !self.kmeans_tolerance.is_finite() || self.kmeans_tolerance <= 0.0 {
            return Err(CampbellError::ConfigError(
                "kmeans_tolerance must be finite and > 0".to_string(),
            ));
        }
        if self.kmeans_max_iterations == 0 || self.max_trials == 0 {
            return Err(CampbellError::ConfigError(
                "kmeans_max_iterations and max_trials must be >= 1".to_string(),
            ));
        }
        if !self.early_stop_ratio.is_finite() || self.early_stop_ratio < 0.0 {
            return Err(CampbellError::ConfigError(
                "early_stop_ratio must be finite and >= 0".to_string(),
            ));
        }
        Ok(())
    }
}

impl PipelineConfig {
    /// Worker count: configured value, or 1 + 2/3 of `available` cores.
    pub fn worker_count(&self, available: usize) -> usize {
        self.num_workers
            .unwrap_or_else(|| 1 + (2 * available.max(1)) / 3)
    }

    pub fn validate(&self) -> CampbellResult<()> {
        if self.num_workers == Some(0) {
            return Err(CampbellError::ConfigError(
                "num_workers must be >= 1 when set".to_string(),
            ));
        }
        Ok(())
    }
}

impl AnalysisConfig {
    /// Load from a JSON file.
    pub fn from_file(path: &str) -> CampbellResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> CampbellResult<()> {
        self.diagram.validate()?;
        self.clustering.validate()?;
        self.pipeline.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let cfg = AnalysisConfig::default();
        assert!(cfg.validate().is_ok());
        assert!(cfg.diagram.cluster);
        assert!(!cfg.diagram.structural_only);
        assert!((cfg.clustering.group_gap_hz - 0.05).abs() < 1e-15);
        assert_eq!(cfg.clustering.max_trials, 1000);
        assert_eq!(cfg.pipeline.failure_policy, FailurePolicy::AbortAll);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let json = r#"{ "diagram": { "max_freq_hz": 2.5, "structural_only": true } }"#;
        let cfg: AnalysisConfig = serde_json::from_str(json).unwrap();
        assert!((cfg.diagram.max_freq_hz - 2.5).abs() < 1e-15);
        assert!((cfg.diagram.min_freq_hz - 0.0).abs() < 1e-15);
        assert!(cfg.diagram.structural_only);
        assert!(cfg.diagram.cluster);
        assert_eq!(cfg.clustering, ClusterConfig::default());
    }

    #[test]
    fn test_failure_policy_snake_case() {
        let json = r#"{ "pipeline": { "failure_policy": "best_effort", "num_workers": 3 } }"#;
        let cfg: AnalysisConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.pipeline.failure_policy, FailurePolicy::BestEffort);
        assert_eq!(cfg.pipeline.worker_count(64), 3);
    }

    #[test]
    fn test_worker_count_two_thirds() {
        let p = PipelineConfig::default();
        assert_eq!(p.worker_count(1), 1);
        assert_eq!(p.worker_count(3), 3);
        assert_eq!(p.worker_count(12), 9);
        assert_eq!(p.worker_count(0), 1);
    }

    #[test]
    fn test_rejects_inverted_window() {
        let mut cfg = AnalysisConfig::default();
        cfg.diagram.min_freq_hz = 3.0;
        cfg.diagram.max_freq_hz = 1.0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_rejects_zero_workers_and_trials() {
        let mut cfg = AnalysisConfig::default();
        cfg.pipeline.num_workers = Some(0);
        assert!(cfg.validate().is_err());

        let mut cfg = AnalysisConfig::default();
        cfg.clustering.max_trials = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_in_window_is_closed() {
        let opts = DiagramOptions {
            min_freq_hz: 0.5,
            max_freq_hz: 1.5,
            ..DiagramOptions::default()
        };
        assert!(opts.in_window(0.5));
        assert!(opts.in_window(1.5));
        assert!(!opts.in_window(1.5000001));
        assert!((opts.frequency_range() - 1.0).abs() < 1e-15);
    }

    #[test]
    fn test_from_file_roundtrip() {
        let mut cfg = AnalysisConfig::default();
        cfg.diagram.max_freq_hz = 3.5;
        cfg.clustering.seed = 7;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", serde_json::to_string_pretty(&cfg).unwrap()).unwrap();

        let loaded = AnalysisConfig::from_file(file.path().to_str().unwrap()).unwrap();
        assert_eq!(loaded, cfg);
    }
}
