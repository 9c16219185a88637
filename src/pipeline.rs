//! Orchestration of one analysis run.
//!
//! A run threads a single [`AnalysisState`] through five stages:
//!
//! ```text
//! start → profiled → insighted → detected ─┬─ visualized ─┬→ synthesized → done
//!                                          └─ skipped ────┘
//! ```
//!
//! The only conditional edge is the visualization branch, evaluated once
//! from configuration and row count and recorded as a [`BranchDecision`].
//! A failing stage never halts the run: its fault is recorded, its result
//! slot gets a well-formed empty value, and later stages carry on.
//!
//! # Example
//!
//! ```
//! use datasight::config::AnalysisConfig;
//! use datasight::dataset::{Column, Dataset};
//! use datasight::pipeline::{ExecutionStatus, Pipeline};
//!
//! let dataset = Dataset::new(vec![
//!     Column::from_f64("a", &[1.0, 2.0, 3.0, 4.0, 100.0]),
//!     Column::from_f64("b", &[10.0, 20.0, 30.0, 40.0, 50.0]),
//! ])?;
//!
//! let state = Pipeline::new(AnalysisConfig::default()).run(dataset);
//! assert_eq!(state.execution_status(), ExecutionStatus::Completed);
//! assert!(state.anomaly_result().is_some());
//! # Ok::<(), datasight::error::AnalysisError>(())
//! ```

pub mod stages;
pub mod state;
pub mod workflow;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use stages::{OutcomeKind, StageExecutor, StageOutcome};
pub use state::{
    AnalysisState, BranchDecision, BranchRoute, ExecutionStatus, StageRecord, WorkflowState,
};
pub use workflow::Pipeline;

/// The five stages of a run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineStage {
    Profiling,
    Insights,
    Anomalies,
    Visualization,
    Synthesis,
}

impl PipelineStage {
    pub const ALL: [Self; 5] = [
        Self::Profiling,
        Self::Insights,
        Self::Anomalies,
        Self::Visualization,
        Self::Synthesis,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Profiling => "profiling",
            Self::Insights => "insights",
            Self::Anomalies => "anomalies",
            Self::Visualization => "visualization",
            Self::Synthesis => "synthesis",
        }
    }

    pub fn next_stage(&self) -> Option<Self> {
        match self {
            Self::Profiling => Some(Self::Insights),
            Self::Insights => Some(Self::Anomalies),
            Self::Anomalies => Some(Self::Visualization),
            Self::Visualization => Some(Self::Synthesis),
            Self::Synthesis => None,
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
