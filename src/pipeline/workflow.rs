//! The orchestrator: runs the stages in order and contains their failures.

use super::PipelineStage;
use super::stages::{
    AnomalyStage, InsightStage, ProfileStage, StageExecutor, StageOutcome, SynthesisStage,
    VisualizationStage,
};
use super::state::{AnalysisState, BranchDecision, BranchRoute, StageRecord, WorkflowState};
use crate::config::AnalysisConfig;
use crate::dataset::Dataset;
use crate::error::StageError;
use crate::synthesis::Summarizer;
use crate::visualization::{ChartPlanner, Visualizer};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

/// Runs one dataset through profiling, insights, anomaly detection,
/// optional visualization and synthesis.
pub struct Pipeline {
    config: AnalysisConfig,
    visualizer: Box<dyn Visualizer>,
    summarizer: Option<Box<dyn Summarizer>>,
}

impl Pipeline {
    /// A pipeline with the default [`ChartPlanner`] and no summarizer, so
    /// synthesis always uses the deterministic fallback.
    pub fn new(config: AnalysisConfig) -> Self {
        Self {
            config,
            visualizer: Box::new(ChartPlanner),
            summarizer: None,
        }
    }

    #[must_use]
    pub fn with_visualizer(mut self, visualizer: impl Visualizer + 'static) -> Self {
        self.visualizer = Box::new(visualizer);
        self
    }

    #[must_use]
    pub fn with_summarizer(mut self, summarizer: impl Summarizer + 'static) -> Self {
        self.summarizer = Some(Box::new(summarizer));
        self
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Run every stage and return the final state. Never fails: stage
    /// faults are recorded on the state and the run continues.
    pub fn run(&self, dataset: impl Into<Arc<Dataset>>) -> AnalysisState {
        let mut state = AnalysisState::new(dataset);
        let rows = state.dataset().row_count();
        let span = tracing::info_span!("pipeline", rows, columns = state.dataset().column_count());
        let _enter = span.enter();

        if state.dataset().is_empty() {
            tracing::warn!("Dataset is empty; stages will produce empty results");
        }

        state.begin();
        let thresholds = &self.config.thresholds;

        run_stage(&mut state, &ProfileStage::new(thresholds));
        state.advance(WorkflowState::Profiled);

        run_stage(&mut state, &InsightStage::new(thresholds));
        state.advance(WorkflowState::Insighted);

        run_stage(&mut state, &AnomalyStage::new(thresholds));
        state.advance(WorkflowState::Detected);

        let decision = BranchDecision::evaluate(&self.config, rows);
        tracing::info!(route = ?decision.route, reason = %decision.reason(), "Visualization branch");
        state.record_branch(decision);
        match decision.route {
            BranchRoute::Visualize => {
                run_stage(&mut state, &VisualizationStage::new(self.visualizer.as_ref()));
                state.advance(WorkflowState::Visualized);
            }
            BranchRoute::Skip => {
                state.advance(WorkflowState::VisualizationSkipped);
            }
        }

        run_stage(&mut state, &SynthesisStage::new(self.summarizer.as_deref()));
        state.advance(WorkflowState::Synthesized);

        state.advance(WorkflowState::Done);
        state.finish();
        tracing::info!(
            status = state.execution_status().as_str(),
            errors = state.error_history().len(),
            "Pipeline finished"
        );
        state
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(AnalysisConfig::default())
    }
}

/// Run one stage, merging its output into `state`. A panic inside the stage
/// becomes an unexpected fault.
pub fn run_stage<E: StageExecutor>(state: &mut AnalysisState, executor: &E) {
    let stage = executor.stage();
    state.enter_stage(stage);
    tracing::info!(stage = stage.as_str(), "{}", executor.description());

    let start = Instant::now();
    let outcome = {
        let view: &AnalysisState = state;
        panic::catch_unwind(AssertUnwindSafe(|| executor.execute(view)))
            .unwrap_or_else(|payload| StageOutcome::Fault(panic_fault(stage, payload.as_ref())))
    };
    let kind = outcome.kind();

    match outcome {
        StageOutcome::Completed(output) => executor.store(state, output),
        StageOutcome::Empty { result, reason } => {
            tracing::info!(stage = stage.as_str(), %reason, "Stage produced no findings");
            executor.store(state, result);
        }
        StageOutcome::Fault(err) => {
            tracing::warn!(stage = stage.as_str(), error = %err, "Stage failed; continuing");
            let fallback = executor.fallback(state);
            executor.store(state, fallback);
            state.record_error(err);
        }
    }

    let elapsed = start.elapsed();
    tracing::debug!(stage = stage.as_str(), outcome = kind.as_str(), ?elapsed, "Stage done");
    state.record_stage(StageRecord {
        stage,
        outcome: kind,
        elapsed,
    });
}

fn panic_fault(stage: PipelineStage, payload: &(dyn Any + Send)) -> StageError {
    let message = payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_owned())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "stage panicked".to_owned());
    StageError::unexpected(stage, format!("panic: {message}"))
}

#[cfg(test)]
mod tests {
    #![expect(clippy::unwrap_used)]
    use super::*;
    use crate::dataset::Column;
    use crate::error::{Result, StageErrorKind};
    use crate::pipeline::{ExecutionStatus, OutcomeKind};
    use crate::synthesis::{SummarySource, SynthesisContext};
    use crate::visualization::VisualizationResult;

    struct PanickingVisualizer;

    impl Visualizer for PanickingVisualizer {
        fn visualize(&self, _state: &AnalysisState) -> Result<VisualizationResult> {
            panic!("renderer exploded");
        }
    }

    struct FixedSummarizer;

    impl Summarizer for FixedSummarizer {
        fn summarize(&self, context: &SynthesisContext<'_>) -> Option<String> {
            Some(format!("{} insights", context.insights.len()))
        }
    }

    fn dataset(rows: usize) -> Dataset {
        let a: Vec<f64> = (0..rows).map(|i| i as f64).collect();
        let b: Vec<f64> = (0..rows).map(|i| (i * 2) as f64).collect();
        Dataset::new(vec![Column::from_f64("a", &a), Column::from_f64("b", &b)]).unwrap()
    }

    #[test]
    fn test_full_run_visualizes() {
        let state = Pipeline::default().run(dataset(20));
        assert_eq!(state.execution_status(), ExecutionStatus::Completed);
        assert_eq!(state.workflow_state(), WorkflowState::Done);
        assert_eq!(state.current_stage(), Some(PipelineStage::Synthesis));
        assert!(state.visualization_result().is_some());
        assert_eq!(state.stage_records().len(), 5);
        assert_eq!(state.branch().unwrap().route, BranchRoute::Visualize);
    }

    #[test]
    fn test_small_dataset_skips_visualization() {
        let state = Pipeline::default().run(dataset(5));
        assert!(state.visualization_result().is_none());
        assert_eq!(state.stage_records().len(), 4);
        assert_eq!(state.branch().unwrap().route, BranchRoute::Skip);
        assert_eq!(state.summary_result().unwrap().source, SummarySource::Fallback);
    }

    #[test]
    fn test_panicking_stage_is_contained() {
        let state = Pipeline::default()
            .with_visualizer(PanickingVisualizer)
            .run(dataset(20));
        assert_eq!(state.execution_status(), ExecutionStatus::CompletedWithErrors);
        let err = state.error().unwrap();
        assert_eq!(err.stage, PipelineStage::Visualization);
        assert_eq!(err.kind, StageErrorKind::Unexpected);
        assert!(err.message.contains("renderer exploded"));
        assert_eq!(state.visualization_result(), Some(&VisualizationResult::default()));
        assert!(state.summary_result().is_some());
        assert_eq!(state.workflow_state(), WorkflowState::Done);
        let viz = state
            .stage_records()
            .iter()
            .find(|r| r.stage == PipelineStage::Visualization)
            .unwrap();
        assert_eq!(viz.outcome, OutcomeKind::Fault);
    }

    #[test]
    fn test_summarizer_is_used() {
        let state = Pipeline::default()
            .with_summarizer(FixedSummarizer)
            .run(dataset(20));
        let summary = state.summary_result().unwrap();
        assert_eq!(summary.source, SummarySource::Narrative);
        assert!(summary.text.ends_with("insights"));
    }

    #[test]
    fn test_empty_dataset_degrades() {
        let state = Pipeline::default().run(Dataset::empty());
        assert_eq!(state.execution_status(), ExecutionStatus::CompletedWithErrors);
        assert_eq!(state.error().unwrap().kind, StageErrorKind::InputDefect);
        assert!(state.profile_result().is_some());
        assert_eq!(state.insight_result().map(<[_]>::len), Some(0));
        assert_eq!(state.anomaly_result().map(<[_]>::len), Some(0));
        assert_eq!(state.workflow_state(), WorkflowState::Done);
    }
}
