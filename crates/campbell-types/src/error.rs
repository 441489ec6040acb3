// ─────────────────────────────────────────────────────────────────────
// Campbell Core — Errors
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CampbellError {
    #[error("Parse error in {source_name} line {line}: {message}")]
    Parse {
        source_name: String,
        line: usize,
        message: String,
    },

    #[error("Count mismatch in {context}: expected {expected}, found {found}")]
    CountMismatch {
        context: String,
        expected: usize,
        found: usize,
    },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Singular matrix: {0}")]
    SingularMatrix(String),

    #[error("Eigen-decomposition did not converge in {context} after {iterations} iterations")]
    EigenNotConverged { context: String, iterations: usize },

    #[error("Assignment infeasible: {0}")]
    AssignmentInfeasible(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Cancelled: {0}")]
    Cancelled(String),

    #[error("Operating point '{group}': {source}")]
    Group {
        group: String,
        #[source]
        source: Box<CampbellError>,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CampbellError {
    /// Attach the operating-point group name to an error raised inside a worker.
    pub fn in_group(self, group: &str) -> Self {
        match self {
            already @ CampbellError::Group { .. } => already,
            other => CampbellError::Group {
                group: group.to_string(),
                source: Box::new(other),
            },
        }
    }

    /// True for errors produced by a cancelled token rather than by the data.
    pub fn is_cancelled(&self) -> bool {
        match self {
            CampbellError::Cancelled(_) => true,
            CampbellError::Group { source, .. } => source.is_cancelled(),
            _ => false,
        }
    }
}

pub type CampbellResult<T> = Result<T, CampbellError>;
