//! Error and warning types.
//!
//! Exit codes follow a small convention so that callers embedding the modeler
//! in a tool can map failures without matching on variants:
//!
//! - `2`: invalid input, configuration, or file contents
//! - `3`: not enough data / unsupported problem size
//! - `4`: numerical failure during fitting

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ModelingError>;

#[derive(Debug, Error)]
pub enum ModelingError {
    /// Fewer measurement points than a fit requires.
    #[error("insufficient data: {points} measurement points, at least {required} required")]
    InsufficientData { points: usize, required: usize },

    /// More parameters than the structural cap allows.
    #[error("unsupported dimensionality: {parameters} parameters, at most {max} supported")]
    UnsupportedDimensionality { parameters: usize, max: usize },

    /// The regression basis of one candidate is singular or ill-conditioned.
    #[error("degenerate fit: {0}")]
    FitDegenerate(String),

    /// Every candidate hypothesis was discarded.
    #[error("every candidate hypothesis was discarded")]
    EmptySearchSpace,

    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Malformed measurement text file.
    #[error("line {line}: {message}")]
    FileFormat { line: usize, message: String },

    /// The hypothesis cannot be expressed in the flat interchange form.
    #[error("hypothesis not representable in flat form: {0}")]
    NotRepresentable(String),

    #[error("I/O error on '{}': {source}", .path.display())]
    Io { path: PathBuf, source: std::io::Error },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ModelingError {
    pub fn exit_code(&self) -> u8 {
        match self {
            ModelingError::InvalidInput(_)
            | ModelingError::FileFormat { .. }
            | ModelingError::NotRepresentable(_)
            | ModelingError::Io { .. }
            | ModelingError::Json(_) => 2,
            ModelingError::InsufficientData { .. } | ModelingError::UnsupportedDimensionality { .. } => 3,
            ModelingError::FitDegenerate(_) | ModelingError::EmptySearchSpace => 4,
        }
    }

    pub(crate) fn degenerate(reason: impl Into<String>) -> Self {
        ModelingError::FitDegenerate(reason.into())
    }

    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        ModelingError::InvalidInput(message.into())
    }

    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        ModelingError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Conditions the selector recovered from locally.
///
/// These never abort a search; they are returned next to the result and
/// logged at `warn` level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelingWarning {
    /// Too few points; the constant hypothesis was returned.
    InsufficientData { points: usize, required: usize },
    /// No candidate survived fitting and pruning; the constant hypothesis was returned.
    EmptySearchSpace { candidates: usize },
    /// The deadline passed before every candidate was dispatched.
    TimedOut { evaluated: usize, total: usize },
    /// The cancel flag was raised before every candidate was dispatched.
    Cancelled { evaluated: usize, total: usize },
}

impl std::fmt::Display for ModelingWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelingWarning::InsufficientData { points, required } => write!(
                f,
                "only {points} measurement points ({required} required); using a constant model"
            ),
            ModelingWarning::EmptySearchSpace { candidates } => write!(
                f,
                "all {candidates} candidate hypotheses were discarded; using a constant model"
            ),
            ModelingWarning::TimedOut { evaluated, total } => {
                write!(f, "search timed out after {evaluated} of {total} candidates")
            }
            ModelingWarning::Cancelled { evaluated, total } => {
                write!(f, "search cancelled after {evaluated} of {total} candidates")
            }
        }
    }
}
