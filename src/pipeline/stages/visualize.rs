//! Visualization stage - chart planning through a pluggable [`Visualizer`]

use super::{PipelineStage, StageExecutor, StageOutcome};
use crate::error::{StageError, StageErrorKind};
use crate::pipeline::state::AnalysisState;
use crate::visualization::{VisualizationResult, Visualizer};

pub struct VisualizationStage<'a> {
    pub visualizer: &'a dyn Visualizer,
}

impl<'a> VisualizationStage<'a> {
    pub fn new(visualizer: &'a dyn Visualizer) -> Self {
        Self { visualizer }
    }
}

impl StageExecutor for VisualizationStage<'_> {
    type Output = VisualizationResult;

    fn stage(&self) -> PipelineStage {
        PipelineStage::Visualization
    }

    fn description(&self) -> &'static str {
        "Plan charts for the analysed dataset"
    }

    #[tracing::instrument(name = "visualization", skip_all)]
    fn execute(&self, state: &AnalysisState) -> StageOutcome<VisualizationResult> {
        match self.visualizer.visualize(state) {
            Ok(result) if result.is_empty() => StageOutcome::Empty {
                result,
                reason: "no chart applies to these columns".to_owned(),
            },
            Ok(result) => StageOutcome::Completed(result),
            Err(err) => StageOutcome::Fault(StageError::new(
                self.stage(),
                StageErrorKind::Computation,
                err.to_string(),
            )),
        }
    }

    fn fallback(&self, _state: &AnalysisState) -> VisualizationResult {
        VisualizationResult::default()
    }

    fn store(&self, state: &mut AnalysisState, output: VisualizationResult) {
        state.set_visualization_result(output);
    }
}
