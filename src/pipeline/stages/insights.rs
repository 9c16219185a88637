//! Insight stage - correlations, shape, imbalance, missingness, duplicates

use super::{PipelineStage, StageExecutor, StageOutcome};
use crate::analyser::{Insight, generate_insights};
use crate::config::Thresholds;
use crate::pipeline::state::AnalysisState;

pub struct InsightStage<'a> {
    pub thresholds: &'a Thresholds,
}

impl<'a> InsightStage<'a> {
    pub fn new(thresholds: &'a Thresholds) -> Self {
        Self { thresholds }
    }
}

impl StageExecutor for InsightStage<'_> {
    type Output = Vec<Insight>;

    fn stage(&self) -> PipelineStage {
        PipelineStage::Insights
    }

    fn description(&self) -> &'static str {
        "Extract correlations, distribution shape, imbalance, missing-data and duplicate patterns"
    }

    #[tracing::instrument(name = "insights", skip_all)]
    fn execute(&self, state: &AnalysisState) -> StageOutcome<Vec<Insight>> {
        if state.dataset().is_empty() {
            return StageOutcome::from_findings(Vec::new(), "dataset is empty");
        }
        let insights = generate_insights(state.dataset(), self.thresholds);
        StageOutcome::from_findings(insights, "no pattern crossed its threshold")
    }

    fn fallback(&self, _state: &AnalysisState) -> Vec<Insight> {
        Vec::new()
    }

    fn store(&self, state: &mut AnalysisState, output: Vec<Insight>) {
        state.set_insight_result(output);
    }
}
