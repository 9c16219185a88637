//! Profile stage - structural summaries and quality issues

use super::{PipelineStage, StageExecutor, StageOutcome};
use crate::analyser::{ProfileResult, profile_dataset};
use crate::config::Thresholds;
use crate::error::StageError;
use crate::pipeline::state::AnalysisState;

pub struct ProfileStage<'a> {
    pub thresholds: &'a Thresholds,
}

impl<'a> ProfileStage<'a> {
    pub fn new(thresholds: &'a Thresholds) -> Self {
        Self { thresholds }
    }
}

impl StageExecutor for ProfileStage<'_> {
    type Output = ProfileResult;

    fn stage(&self) -> PipelineStage {
        PipelineStage::Profiling
    }

    fn description(&self) -> &'static str {
        "Summarise columns and flag data-quality issues"
    }

    #[tracing::instrument(name = "profile", skip_all)]
    fn execute(&self, state: &AnalysisState) -> StageOutcome<ProfileResult> {
        let dataset = state.dataset();
        if dataset.row_count() == 0 {
            return StageOutcome::Fault(StageError::input_defect(
                self.stage(),
                "dataset has zero rows",
            ));
        }
        if dataset.column_count() == 0 {
            return StageOutcome::Fault(StageError::input_defect(
                self.stage(),
                "dataset has no columns",
            ));
        }
        StageOutcome::Completed(profile_dataset(dataset, self.thresholds))
    }

    fn fallback(&self, _state: &AnalysisState) -> ProfileResult {
        ProfileResult::placeholder()
    }

    fn store(&self, state: &mut AnalysisState, output: ProfileResult) {
        state.set_profile_result(output);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{Column, Dataset};

    #[test]
    fn test_empty_dataset_is_input_defect() {
        let thresholds = Thresholds::default();
        let state = AnalysisState::new(Dataset::empty());
        let outcome = ProfileStage::new(&thresholds).execute(&state);
        let StageOutcome::Fault(err) = outcome else {
            panic!("expected a fault");
        };
        assert_eq!(err.to_string(), "input defect in profiling stage: dataset has zero rows");
    }

    #[test]
    fn test_profiles_rows() -> anyhow::Result<()> {
        let thresholds = Thresholds::default();
        let state = AnalysisState::new(Dataset::new(vec![Column::from_f64("x", &[1.0])])?);
        let outcome = ProfileStage::new(&thresholds).execute(&state);
        assert!(matches!(outcome, StageOutcome::Completed(p) if p.overview.row_count == 1));
        Ok(())
    }
}
