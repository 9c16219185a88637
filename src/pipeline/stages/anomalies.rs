//! Anomaly stage - outliers, sparse categories, temporal irregularities

use super::{PipelineStage, StageExecutor, StageOutcome};
use crate::analyser::{Anomaly, detect_anomalies};
use crate::config::Thresholds;
use crate::pipeline::state::AnalysisState;

pub struct AnomalyStage<'a> {
    pub thresholds: &'a Thresholds,
}

impl<'a> AnomalyStage<'a> {
    pub fn new(thresholds: &'a Thresholds) -> Self {
        Self { thresholds }
    }
}

impl StageExecutor for AnomalyStage<'_> {
    type Output = Vec<Anomaly>;

    fn stage(&self) -> PipelineStage {
        PipelineStage::Anomalies
    }

    fn description(&self) -> &'static str {
        "Detect z-score and IQR outliers, sparse categories and temporal anomalies"
    }

    #[tracing::instrument(name = "anomalies", skip_all)]
    fn execute(&self, state: &AnalysisState) -> StageOutcome<Vec<Anomaly>> {
        if state.dataset().is_empty() {
            return StageOutcome::from_findings(Vec::new(), "dataset is empty");
        }
        let anomalies = detect_anomalies(state.dataset(), self.thresholds);
        StageOutcome::from_findings(anomalies, "no anomalies detected")
    }

    fn fallback(&self, _state: &AnalysisState) -> Vec<Anomaly> {
        Vec::new()
    }

    fn store(&self, state: &mut AnalysisState, output: Vec<Anomaly>) {
        state.set_anomaly_result(output);
    }
}
