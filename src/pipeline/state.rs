//! The shared analysis state threaded through every stage.

use super::PipelineStage;
use super::stages::OutcomeKind;
use crate::analyser::{Anomaly, Insight, ProfileResult};
use crate::config::AnalysisConfig;
use crate::dataset::Dataset;
use crate::error::StageError;
use crate::synthesis::SynthesisResult;
use crate::visualization::VisualizationResult;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExecutionStatus {
    #[default]
    NotStarted,
    Running,
    Completed,
    CompletedWithErrors,
}

impl ExecutionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotStarted => "not-started",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::CompletedWithErrors => "completed-with-errors",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::CompletedWithErrors)
    }
}

/// Position of a run in the orchestration state machine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WorkflowState {
    #[default]
    Start,
    Profiled,
    Insighted,
    Detected,
    Visualized,
    VisualizationSkipped,
    Synthesized,
    Done,
}

impl WorkflowState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Profiled => "profiled",
            Self::Insighted => "insighted",
            Self::Detected => "detected",
            Self::Visualized => "visualized",
            Self::VisualizationSkipped => "visualization-skipped",
            Self::Synthesized => "synthesized",
            Self::Done => "done",
        }
    }

    /// Transitions are strictly sequential except the visualization branch.
    pub fn can_transition_to(&self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Start, Self::Profiled)
                | (Self::Profiled, Self::Insighted)
                | (Self::Insighted, Self::Detected)
                | (Self::Detected, Self::Visualized | Self::VisualizationSkipped)
                | (Self::Visualized | Self::VisualizationSkipped, Self::Synthesized)
                | (Self::Synthesized, Self::Done)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BranchRoute {
    Visualize,
    Skip,
}

/// The visualization branch decision together with the inputs it was made from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchDecision {
    pub enable_visualizations: bool,
    pub row_count: usize,
    pub min_rows: usize,
    pub route: BranchRoute,
}

impl BranchDecision {
    pub fn evaluate(config: &AnalysisConfig, row_count: usize) -> Self {
        let route = if config.enable_visualizations && row_count >= config.min_rows_for_visualization
        {
            BranchRoute::Visualize
        } else {
            BranchRoute::Skip
        };
        Self {
            enable_visualizations: config.enable_visualizations,
            row_count,
            min_rows: config.min_rows_for_visualization,
            route,
        }
    }

    pub fn reason(&self) -> String {
        match self.route {
            BranchRoute::Visualize => format!(
                "visualizations enabled and {} rows >= {}",
                self.row_count, self.min_rows
            ),
            BranchRoute::Skip if !self.enable_visualizations => {
                "visualizations disabled in configuration".to_owned()
            }
            BranchRoute::Skip => format!("{} rows < minimum of {}", self.row_count, self.min_rows),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageRecord {
    pub stage: PipelineStage,
    pub outcome: OutcomeKind,
    pub elapsed: Duration,
}

/// Accumulated results and status of one run.
///
/// Result slots start empty and are written at most once. Once the pipeline
/// has finished, every slot of a stage that ran holds a value, even if that
/// stage failed.
#[derive(Debug, Clone)]
pub struct AnalysisState {
    dataset: Arc<Dataset>,
    profile_result: Option<ProfileResult>,
    insight_result: Option<Vec<Insight>>,
    anomaly_result: Option<Vec<Anomaly>>,
    visualization_result: Option<VisualizationResult>,
    summary_result: Option<SynthesisResult>,
    error: Option<StageError>,
    error_history: Vec<StageError>,
    current_stage: Option<PipelineStage>,
    execution_status: ExecutionStatus,
    workflow_state: WorkflowState,
    stage_records: Vec<StageRecord>,
    branch: Option<BranchDecision>,
}

/// Store `value` in an empty slot. A second write is dropped.
fn write_once<T>(slot: &mut Option<T>, value: T, name: &str) -> bool {
    if slot.is_some() {
        tracing::warn!(slot = name, "Result already set; ignoring second write");
        return false;
    }
    *slot = Some(value);
    true
}

impl AnalysisState {
    pub fn new(dataset: impl Into<Arc<Dataset>>) -> Self {
        Self {
            dataset: dataset.into(),
            profile_result: None,
            insight_result: None,
            anomaly_result: None,
            visualization_result: None,
            summary_result: None,
            error: None,
            error_history: Vec::new(),
            current_stage: None,
            execution_status: ExecutionStatus::NotStarted,
            workflow_state: WorkflowState::Start,
            stage_records: Vec::new(),
            branch: None,
        }
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn profile_result(&self) -> Option<&ProfileResult> {
        self.profile_result.as_ref()
    }

    pub fn insight_result(&self) -> Option<&[Insight]> {
        self.insight_result.as_deref()
    }

    pub fn anomaly_result(&self) -> Option<&[Anomaly]> {
        self.anomaly_result.as_deref()
    }

    pub fn visualization_result(&self) -> Option<&VisualizationResult> {
        self.visualization_result.as_ref()
    }

    pub fn summary_result(&self) -> Option<&SynthesisResult> {
        self.summary_result.as_ref()
    }

    /// Most recent stage failure, if any.
    pub fn error(&self) -> Option<&StageError> {
        self.error.as_ref()
    }

    pub fn error_history(&self) -> &[StageError] {
        &self.error_history
    }

    pub fn current_stage(&self) -> Option<PipelineStage> {
        self.current_stage
    }

    pub fn execution_status(&self) -> ExecutionStatus {
        self.execution_status
    }

    pub fn workflow_state(&self) -> WorkflowState {
        self.workflow_state
    }

    pub fn stage_records(&self) -> &[StageRecord] {
        &self.stage_records
    }

    pub fn branch(&self) -> Option<&BranchDecision> {
        self.branch.as_ref()
    }

    pub fn set_profile_result(&mut self, value: ProfileResult) -> bool {
        write_once(&mut self.profile_result, value, "profile_result")
    }

    pub fn set_insight_result(&mut self, value: Vec<Insight>) -> bool {
        write_once(&mut self.insight_result, value, "insight_result")
    }

    pub fn set_anomaly_result(&mut self, value: Vec<Anomaly>) -> bool {
        write_once(&mut self.anomaly_result, value, "anomaly_result")
    }

    pub fn set_visualization_result(&mut self, value: VisualizationResult) -> bool {
        write_once(&mut self.visualization_result, value, "visualization_result")
    }

    pub fn set_summary_result(&mut self, value: SynthesisResult) -> bool {
        write_once(&mut self.summary_result, value, "summary_result")
    }

    pub(crate) fn begin(&mut self) {
        self.execution_status = ExecutionStatus::Running;
    }

    pub(crate) fn enter_stage(&mut self, stage: PipelineStage) {
        self.current_stage = Some(stage);
    }

    pub(crate) fn record_error(&mut self, error: StageError) {
        self.error_history.push(error.clone());
        self.error = Some(error);
    }

    pub(crate) fn record_stage(&mut self, record: StageRecord) {
        self.stage_records.push(record);
    }

    pub(crate) fn record_branch(&mut self, decision: BranchDecision) {
        self.branch = Some(decision);
    }

    /// Move to `next`. An out-of-order transition is logged and ignored.
    pub(crate) fn advance(&mut self, next: WorkflowState) -> bool {
        if !self.workflow_state.can_transition_to(next) {
            tracing::warn!(
                from = self.workflow_state.as_str(),
                to = next.as_str(),
                "Invalid workflow transition"
            );
            return false;
        }
        tracing::debug!(from = self.workflow_state.as_str(), to = next.as_str(), "Transition");
        self.workflow_state = next;
        true
    }

    pub(crate) fn finish(&mut self) {
        self.execution_status = if self.error_history.is_empty() {
            ExecutionStatus::Completed
        } else {
            ExecutionStatus::CompletedWithErrors
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slots_are_write_once() {
        let mut state = AnalysisState::new(Dataset::empty());
        assert!(state.insight_result().is_none());
        assert!(state.set_insight_result(Vec::new()));
        assert!(!state.set_insight_result(Vec::new()));
        assert_eq!(state.insight_result().map(<[Insight]>::len), Some(0));
    }

    #[test]
    fn test_workflow_transitions() {
        assert!(WorkflowState::Start.can_transition_to(WorkflowState::Profiled));
        assert!(WorkflowState::Detected.can_transition_to(WorkflowState::VisualizationSkipped));
        assert!(WorkflowState::VisualizationSkipped.can_transition_to(WorkflowState::Synthesized));
        assert!(!WorkflowState::Start.can_transition_to(WorkflowState::Detected));
        assert!(!WorkflowState::Done.can_transition_to(WorkflowState::Start));

        let mut state = AnalysisState::new(Dataset::empty());
        assert!(!state.advance(WorkflowState::Insighted));
        assert_eq!(state.workflow_state(), WorkflowState::Start);
    }

    #[test]
    fn test_branch_decision() {
        let mut config = AnalysisConfig::default();
        let go = BranchDecision::evaluate(&config, 10);
        assert_eq!(go.route, BranchRoute::Visualize);

        let small = BranchDecision::evaluate(&config, 9);
        assert_eq!(small.route, BranchRoute::Skip);
        assert_eq!(small.reason(), "9 rows < minimum of 10");

        config.enable_visualizations = false;
        let off = BranchDecision::evaluate(&config, 1_000);
        assert_eq!(off.route, BranchRoute::Skip);
        assert!(off.reason().contains("disabled"));
    }

    #[test]
    fn test_finish_reflects_errors() {
        let mut state = AnalysisState::new(Dataset::empty());
        state.begin();
        assert_eq!(state.execution_status(), ExecutionStatus::Running);
        state.record_error(StageError::input_defect(PipelineStage::Profiling, "empty"));
        state.finish();
        assert_eq!(state.execution_status(), ExecutionStatus::CompletedWithErrors);
        assert!(state.execution_status().is_terminal());
        assert_eq!(state.error_history().len(), 1);
    }
}
