use crate::analyser::types::{by_confidence, by_severity};
use crate::analyser::{Anomaly, Insight, ProfileResult};
use crate::pipeline::AnalysisState;
use crate::visualization::VisualizationResult;

/// How many insights and anomalies the rendered context includes.
pub const CONTEXT_TOP_N: usize = 5;

/// Read-only view of a run's results handed to a summarizer.
#[derive(Debug, Clone, Copy)]
pub struct SynthesisContext<'a> {
    pub profile: Option<&'a ProfileResult>,
    pub insights: &'a [Insight],
    pub anomalies: &'a [Anomaly],
    pub charts: Option<&'a VisualizationResult>,
}

impl<'a> SynthesisContext<'a> {
    pub fn from_state(state: &'a AnalysisState) -> Self {
        Self {
            profile: state.profile_result(),
            insights: state.insight_result().unwrap_or_default(),
            anomalies: state.anomaly_result().unwrap_or_default(),
            charts: state.visualization_result(),
        }
    }

    pub fn top_insights(&self, n: usize) -> Vec<&'a Insight> {
        by_confidence(self.insights).into_iter().take(n).collect()
    }

    pub fn top_anomalies(&self, n: usize) -> Vec<&'a Anomaly> {
        by_severity(self.anomalies).into_iter().take(n).collect()
    }

    /// Plain-text context suitable as a prompt body.
    pub fn render(&self) -> String {
        let mut out = String::from("ANALYSIS CONTEXT\n");
        out.push_str(&"=".repeat(60));
        out.push_str("\n\n");

        if let Some(profile) = self.profile {
            let o = &profile.overview;
            let q = &profile.quality_score;
            out.push_str("DATA PROFILE:\n");
            out.push_str(&format!("- Rows: {}\n", o.row_count));
            out.push_str(&format!("- Columns: {}\n", o.column_count));
            out.push_str(&format!("- Memory: {:.2} MB\n", o.memory_mb()));
            out.push_str(&format!("- Quality score: {:.1}/100\n", q.score));
            out.push_str(&format!(
                "  (missing {:.2}%, duplicates {:.2}%, outliers {:.2}%)\n",
                q.missing_pct, q.duplicate_pct, q.outlier_pct
            ));
            if !profile.quality_issues.is_empty() {
                out.push_str("Quality issues:\n");
                for issue in &profile.quality_issues {
                    out.push_str(&format!("  - {issue}\n"));
                }
            }
            if !profile.target_suggestions.is_empty() {
                let targets: Vec<String> = profile
                    .target_suggestions
                    .iter()
                    .map(|t| format!("{} ({})", t.column, t.confidence.as_str()))
                    .collect();
                out.push_str(&format!("Possible targets: {}\n", targets.join(", ")));
            }
            out.push('\n');
        }

        let insights = self.top_insights(CONTEXT_TOP_N);
        if !insights.is_empty() {
            out.push_str("KEY INSIGHTS:\n");
            for (i, insight) in insights.iter().enumerate() {
                out.push_str(&format!("{}. {}\n", i + 1, insight.title));
                out.push_str(&format!("   {}\n", insight.description));
                out.push_str(&format!("   Confidence: {:.0}%\n", insight.confidence * 100.0));
                if let Some(guidance) = &insight.guidance {
                    out.push_str(&format!("   Action: {}\n", guidance.action));
                }
            }
            out.push('\n');
        }

        let anomalies = self.top_anomalies(CONTEXT_TOP_N);
        if !anomalies.is_empty() {
            out.push_str("DETECTED ANOMALIES:\n");
            for anomaly in anomalies {
                out.push_str(&format!("- [{}] {}\n", anomaly.severity, anomaly.title));
                out.push_str(&format!("  {}\n", anomaly.description));
            }
            out.push('\n');
        }

        if let Some(charts) = self.charts.filter(|c| !c.is_empty()) {
            out.push_str(&format!("VISUALIZATIONS PLANNED: {}\n", charts.len()));
        }

        out
    }
}
