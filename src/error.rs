//! Centralized error handling for datasight.
//!
//! Two layers of failure exist in this crate:
//!
//! - [`AnalysisError`] covers everything that happens *around* an analysis
//!   run: loading a file, reading configuration, building a [`Dataset`].
//!   These propagate with `?` to the caller.
//! - [`StageError`] describes a failure *inside* a pipeline stage. Stage
//!   errors never propagate out of the pipeline; the orchestrator records them
//!   on the [`AnalysisState`] and keeps going.
//!
//! ```
//! use datasight::error::{AnalysisError, ResultExt as _};
//!
//! fn parse_rows(raw: &str) -> datasight::error::Result<usize> {
//!     raw.parse::<usize>()
//!         .map_err(|e| AnalysisError::Config(e.to_string()))
//!         .context("Invalid row limit")
//! }
//!
//! assert!(parse_rows("ten").is_err());
//! ```
//!
//! [`Dataset`]: crate::dataset::Dataset
//! [`AnalysisState`]: crate::pipeline::AnalysisState

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::pipeline::PipelineStage;

/// Main error type for datasight operations outside the stage boundary.
#[derive(Debug)]
pub enum AnalysisError {
    /// I/O errors (reading input files, writing reports)
    Io(std::io::Error),

    /// The data-loading collaborator could not produce a table
    DataLoading(String),

    /// The table violates a structural invariant (ragged columns, duplicate names)
    InvalidDataset(String),

    /// Configuration errors
    Config(String),

    /// A stage failure surfaced outside the pipeline
    Stage(StageError),

    /// Generic error with context
    Other(String),
}

impl fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::DataLoading(msg) => write!(f, "Data loading error: {msg}"),
            Self::InvalidDataset(msg) => write!(f, "Invalid dataset: {msg}"),
            Self::Config(msg) => write!(f, "Configuration error: {msg}"),
            Self::Stage(err) => write!(f, "{err}"),
            Self::Other(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for AnalysisError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for AnalysisError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<anyhow::Error> for AnalysisError {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(format!("{err:#}"))
    }
}

impl From<serde_json::Error> for AnalysisError {
    fn from(err: serde_json::Error) -> Self {
        Self::Config(format!("JSON error: {err}"))
    }
}

impl From<polars::error::PolarsError> for AnalysisError {
    fn from(err: polars::error::PolarsError) -> Self {
        Self::DataLoading(err.to_string())
    }
}

impl From<StageError> for AnalysisError {
    fn from(err: StageError) -> Self {
        Self::Stage(err)
    }
}

/// Result type alias for datasight operations.
pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Extension trait to add context to results.
pub trait ResultExt<T> {
    /// Add context to an error.
    fn context(self, msg: impl Into<String>) -> Result<T>;

    /// Add context using a closure (lazy evaluation).
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<AnalysisError>,
{
    fn context(self, msg: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let err: AnalysisError = e.into();
            AnalysisError::Other(format!("{}: {}", msg.into(), err))
        })
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| {
            let err: AnalysisError = e.into();
            AnalysisError::Other(format!("{}: {}", f(), err))
        })
    }
}

/// Classification of a stage failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StageErrorKind {
    /// Absent or empty dataset, detected at pipeline entry
    InputDefect,
    /// A statistic could not be computed and the stage gave up on its result
    Computation,
    /// Anything else, including panics caught at the orchestrator boundary
    Unexpected,
}

impl StageErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InputDefect => "input defect",
            Self::Computation => "computation fault",
            Self::Unexpected => "unexpected fault",
        }
    }
}

/// A failure recorded by one stage of the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageError {
    pub stage: PipelineStage,
    pub kind: StageErrorKind,
    pub message: String,
}

impl StageError {
    pub fn new(stage: PipelineStage, kind: StageErrorKind, message: impl Into<String>) -> Self {
        Self {
            stage,
            kind,
            message: message.into(),
        }
    }

    pub fn input_defect(stage: PipelineStage, message: impl Into<String>) -> Self {
        Self::new(stage, StageErrorKind::InputDefect, message)
    }

    pub fn unexpected(stage: PipelineStage, message: impl Into<String>) -> Self {
        Self::new(stage, StageErrorKind::Unexpected, message)
    }
}

impl fmt::Display for StageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} in {} stage: {}",
            self.kind.as_str(),
            self.stage.as_str(),
            self.message
        )
    }
}

impl std::error::Error for StageError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AnalysisError::InvalidDataset("column 'b' has 3 rows, expected 4".to_owned());
        assert_eq!(
            err.to_string(),
            "Invalid dataset: column 'b' has 3 rows, expected 4"
        );
    }

    #[test]
    fn test_stage_error_display() {
        let err = StageError::input_defect(PipelineStage::Profiling, "dataset has zero rows");
        assert_eq!(
            err.to_string(),
            "input defect in profiling stage: dataset has zero rows"
        );
    }

    #[test]
    fn test_result_context() {
        let result: std::result::Result<(), std::io::Error> = Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "sales.csv",
        ));

        let result: Result<()> = result.context("Failed to read dataset");
        let message = result.err().map(|e| e.to_string()).unwrap_or_default();
        assert!(message.contains("Failed to read dataset"));
        assert!(message.contains("sales.csv"));
    }
}
