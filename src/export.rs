//! JSON export of a finished run.

use crate::analyser::{Anomaly, Insight, ProfileResult};
use crate::error::{Result, ResultExt as _, StageError};
use crate::pipeline::{
    AnalysisState, BranchDecision, ExecutionStatus, OutcomeKind, PipelineStage, WorkflowState,
};
use crate::synthesis::SynthesisResult;
use crate::visualization::VisualizationResult;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct StageTiming {
    pub stage: PipelineStage,
    pub outcome: OutcomeKind,
    pub elapsed_ms: f64,
}

/// Serialisable snapshot of an [`AnalysisState`]. The dataset itself is
/// not included.
#[derive(Debug, Serialize)]
pub struct AnalysisExport<'a> {
    pub exported_at: DateTime<Utc>,
    pub execution_status: ExecutionStatus,
    pub workflow_state: WorkflowState,
    pub profile: Option<&'a ProfileResult>,
    pub insights: Option<&'a [Insight]>,
    pub anomalies: Option<&'a [Anomaly]>,
    pub visualizations: Option<&'a VisualizationResult>,
    pub summary: Option<&'a SynthesisResult>,
    pub error: Option<&'a StageError>,
    pub errors: &'a [StageError],
    pub branch: Option<&'a BranchDecision>,
    pub stages: Vec<StageTiming>,
}

impl<'a> AnalysisExport<'a> {
    pub fn from_state(state: &'a AnalysisState) -> Self {
        Self {
            exported_at: Utc::now(),
            execution_status: state.execution_status(),
            workflow_state: state.workflow_state(),
            profile: state.profile_result(),
            insights: state.insight_result(),
            anomalies: state.anomaly_result(),
            visualizations: state.visualization_result(),
            summary: state.summary_result(),
            error: state.error(),
            errors: state.error_history(),
            branch: state.branch(),
            stages: state
                .stage_records()
                .iter()
                .map(|r| StageTiming {
                    stage: r.stage,
                    outcome: r.outcome,
                    elapsed_ms: r.elapsed.as_secs_f64() * 1000.0,
                })
                .collect(),
        }
    }
}

pub fn to_json(state: &AnalysisState) -> Result<String> {
    let json = serde_json::to_string_pretty(&AnalysisExport::from_state(state))?;
    Ok(json)
}

pub fn write_json(state: &AnalysisState, path: &Path) -> Result<()> {
    let json = to_json(state)?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write JSON export to {}", path.display()))?;
    tracing::info!(path = %path.display(), "Exported results as JSON");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{Column, Dataset};
    use crate::pipeline::Pipeline;

    #[test]
    fn test_json_export_shape() -> anyhow::Result<()> {
        let ds = Dataset::new(vec![
            Column::from_f64("A", &[1.0, 2.0, 3.0, 4.0, 100.0]),
            Column::from_f64("B", &[10.0, 20.0, 30.0, 40.0, 50.0]),
        ])?;
        let state = Pipeline::default().run(ds);

        let value: serde_json::Value = serde_json::from_str(&to_json(&state)?)?;
        assert_eq!(value["execution_status"], "completed");
        assert_eq!(value["workflow_state"], "done");
        assert_eq!(value["profile"]["overview"]["row_count"], 5);
        assert_eq!(value["insights"][0]["kind"], "correlation");
        assert_eq!(value["branch"]["route"], "skip");
        assert!(value["visualizations"].is_null());
        assert_eq!(value["stages"].as_array().map(Vec::len), Some(4));
        Ok(())
    }

    #[test]
    fn test_write_json() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("out.json");
        let state = Pipeline::default().run(Dataset::empty());
        write_json(&state, &path)?;
        let text = std::fs::read_to_string(&path)?;
        assert!(text.contains("\"completed-with-errors\""));
        Ok(())
    }
}
