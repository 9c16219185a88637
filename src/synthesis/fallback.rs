use super::SynthesisContext;

const FALLBACK_INSIGHTS: usize = 3;
const FALLBACK_ANOMALIES: usize = 2;

/// Executive summary assembled directly from the results, without any
/// external call.
pub fn fallback_summary(context: &SynthesisContext<'_>) -> String {
    let mut out = String::from("EXECUTIVE SUMMARY\n");
    out.push_str(&"=".repeat(50));
    out.push_str("\n\n");

    if let Some(profile) = context.profile {
        out.push_str("Dataset overview:\n");
        out.push_str(&format!("- Records: {}\n", profile.overview.row_count));
        out.push_str(&format!("- Columns: {}\n", profile.overview.column_count));
        out.push_str(&format!(
            "- Data quality score: {:.1}/100\n",
            profile.quality_score.score
        ));
        out.push('\n');
    }

    let insights = context.top_insights(FALLBACK_INSIGHTS);
    if insights.is_empty() {
        out.push_str("No notable patterns were found.\n\n");
    } else {
        out.push_str("Key findings:\n");
        for (i, insight) in insights.iter().enumerate() {
            out.push_str(&format!("{}. {}\n", i + 1, insight.title));
        }
        out.push('\n');
    }

    if context.anomalies.is_empty() {
        out.push_str("No anomalies were detected.\n");
    } else {
        out.push_str("Anomalies:\n");
        out.push_str(&format!(
            "- Total anomalies detected: {}\n",
            context.anomalies.len()
        ));
        for anomaly in context.top_anomalies(FALLBACK_ANOMALIES) {
            out.push_str(&format!("- [{}] {}\n", anomaly.severity, anomaly.title));
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{Column, Dataset};
    use crate::pipeline::{AnalysisState, Pipeline};

    #[test]
    fn test_fallback_without_results() {
        let state = AnalysisState::new(Dataset::empty());
        let text = fallback_summary(&SynthesisContext::from_state(&state));
        assert!(text.starts_with("EXECUTIVE SUMMARY"));
        assert!(text.contains("No notable patterns"));
        assert!(text.contains("No anomalies"));
    }

    #[test]
    fn test_fallback_lists_findings_line_by_line() -> anyhow::Result<()> {
        let ds = Dataset::new(vec![
            Column::from_f64("A", &[1.0, 2.0, 3.0, 4.0, 100.0]),
            Column::from_f64("B", &[10.0, 20.0, 30.0, 40.0, 50.0]),
        ])?;
        let state = Pipeline::default().run(ds);
        let text = fallback_summary(&SynthesisContext::from_state(&state));
        assert!(text.contains("Dataset overview:\n- Records: 5\n- Columns: 2\n"));
        assert!(text.contains("Key findings:\n1. "));
        assert!(text.contains("- Total anomalies detected: "));
        Ok(())
    }
}
