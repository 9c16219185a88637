//! Synthesis stage - narrative summary with a deterministic fallback

use super::{PipelineStage, StageExecutor, StageOutcome};
use crate::pipeline::state::AnalysisState;
use crate::synthesis::{Summarizer, SummarySource, SynthesisContext, SynthesisResult, fallback_summary};

pub struct SynthesisStage<'a> {
    pub summarizer: Option<&'a dyn Summarizer>,
}

impl<'a> SynthesisStage<'a> {
    pub fn new(summarizer: Option<&'a dyn Summarizer>) -> Self {
        Self { summarizer }
    }
}

impl StageExecutor for SynthesisStage<'_> {
    type Output = SynthesisResult;

    fn stage(&self) -> PipelineStage {
        PipelineStage::Synthesis
    }

    fn description(&self) -> &'static str {
        "Summarise the findings as a narrative"
    }

    #[tracing::instrument(name = "synthesis", skip_all)]
    fn execute(&self, state: &AnalysisState) -> StageOutcome<SynthesisResult> {
        let context = SynthesisContext::from_state(state);

        let narrative = self
            .summarizer
            .and_then(|summarizer| summarizer.summarize(&context))
            .filter(|text| !text.trim().is_empty());

        match narrative {
            Some(text) => StageOutcome::Completed(SynthesisResult {
                text,
                source: SummarySource::Narrative,
            }),
            None => {
                if self.summarizer.is_some() {
                    tracing::warn!("Summarizer returned nothing; using fallback summary");
                }
                StageOutcome::Completed(SynthesisResult {
                    text: fallback_summary(&context),
                    source: SummarySource::Fallback,
                })
            }
        }
    }

    fn fallback(&self, state: &AnalysisState) -> SynthesisResult {
        SynthesisResult {
            text: fallback_summary(&SynthesisContext::from_state(state)),
            source: SummarySource::Fallback,
        }
    }

    fn store(&self, state: &mut AnalysisState, output: SynthesisResult) {
        state.set_summary_result(output);
    }
}
