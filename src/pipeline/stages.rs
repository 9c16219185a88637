//! Stage executors.
//!
//! Every stage implements [`StageExecutor`]: it reads the accumulated
//! [`AnalysisState`], returns a [`StageOutcome`], and knows which slot its
//! output belongs in. The orchestrator owns the state and does the writing.

pub mod anomalies;
pub mod insights;
pub mod profile;
pub mod synthesize;
pub mod visualize;

pub use anomalies::AnomalyStage;
pub use insights::InsightStage;
pub use profile::ProfileStage;
pub use synthesize::SynthesisStage;
pub use visualize::VisualizationStage;

use super::PipelineStage;
use super::state::AnalysisState;
use crate::error::StageError;
use serde::{Deserialize, Serialize};

/// Result of running one stage.
#[derive(Debug, Clone, PartialEq)]
pub enum StageOutcome<T> {
    /// The stage produced findings.
    Completed(T),
    /// The stage ran but had nothing to report.
    Empty { result: T, reason: String },
    /// The stage could not produce a result.
    Fault(StageError),
}

impl<T> StageOutcome<T> {
    pub fn kind(&self) -> OutcomeKind {
        match self {
            Self::Completed(_) => OutcomeKind::Completed,
            Self::Empty { .. } => OutcomeKind::Empty,
            Self::Fault(_) => OutcomeKind::Fault,
        }
    }
}

impl<I> StageOutcome<Vec<I>> {
    /// `Completed` when anything was found, `Empty` otherwise.
    pub fn from_findings(result: Vec<I>, reason: &str) -> Self {
        if result.is_empty() {
            Self::Empty {
                result,
                reason: reason.to_owned(),
            }
        } else {
            Self::Completed(result)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeKind {
    Completed,
    Empty,
    Fault,
}

impl OutcomeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Empty => "empty",
            Self::Fault => "fault",
        }
    }
}

/// Trait for executing one pipeline stage
pub trait StageExecutor {
    type Output;

    /// Get the stage this executor handles
    fn stage(&self) -> PipelineStage;

    /// Get a description of what this stage does
    fn description(&self) -> &'static str;

    /// Run the stage against the current state
    fn execute(&self, state: &AnalysisState) -> StageOutcome<Self::Output>;

    /// Well-formed empty output used when the stage faults
    fn fallback(&self, state: &AnalysisState) -> Self::Output;

    /// Write the output into the stage's slot
    fn store(&self, state: &mut AnalysisState, output: Self::Output);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_kind() {
        let done: StageOutcome<Vec<u8>> = StageOutcome::from_findings(vec![1], "nothing found");
        assert_eq!(done.kind(), OutcomeKind::Completed);

        let empty: StageOutcome<Vec<u8>> = StageOutcome::from_findings(Vec::new(), "nothing found");
        assert!(matches!(
            &empty,
            StageOutcome::Empty { reason, .. } if reason == "nothing found"
        ));

        let fault: StageOutcome<Vec<u8>> = StageOutcome::Fault(StageError::unexpected(
            PipelineStage::Insights,
            "boom",
        ));
        assert_eq!(fault.kind().as_str(), "fault");
    }
}
