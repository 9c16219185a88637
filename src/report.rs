//! Human-readable reports of a finished run.
//!
//! Text summaries are meant for a terminal; [`render_markdown`] produces a
//! standalone document.

use crate::analyser::types::{by_confidence, by_severity};
use crate::analyser::{ColumnProfile, ColumnStats};
use crate::pipeline::AnalysisState;
use crate::synthesis::SummarySource;

/// How many insights and anomalies the summaries list.
pub const SUMMARY_TOP_N: usize = 10;
const CONFIDENCE_BAR_WIDTH: usize = 10;

fn rule(title: &str) -> String {
    format!("{title}\n{}\n", "=".repeat(50))
}

pub fn profile_summary(state: &AnalysisState) -> String {
    let Some(profile) = state.profile_result() else {
        return "No profile available\n".to_owned();
    };

    let mut out = rule("DATA PROFILE SUMMARY");
    out.push_str(&format!("Rows: {}\n", profile.overview.row_count));
    out.push_str(&format!("Columns: {}\n", profile.overview.column_count));
    out.push_str(&format!("Memory: {:.2} MB\n", profile.overview.memory_mb()));

    let q = &profile.quality_score;
    out.push_str(&format!("\nData quality score: {:.1}/100\n", q.score));
    out.push_str(&format!(
        "  missing {:.2}% | duplicates {:.2}% | outliers {:.2}%\n",
        q.missing_pct, q.duplicate_pct, q.outlier_pct
    ));

    let roles = &profile.roles;
    out.push_str(&format!(
        "\nColumn types: {} numeric, {} categorical, {} date\n",
        roles.numeric.len(),
        roles.categorical.len(),
        roles.date.len()
    ));
    if !roles.id.is_empty() {
        out.push_str(&format!("ID-like columns: {}\n", roles.id.join(", ")));
    }

    if !profile.quality_issues.is_empty() {
        out.push_str("\nQuality issues:\n");
        for issue in &profile.quality_issues {
            out.push_str(&format!("  - {issue}\n"));
        }
    }
    out
}

pub fn insights_summary(state: &AnalysisState) -> String {
    let insights = state.insight_result().unwrap_or_default();
    if insights.is_empty() {
        return "No insights generated\n".to_owned();
    }

    let mut out = rule(&format!("KEY INSIGHTS ({} found)", insights.len()));
    for (i, insight) in by_confidence(insights).into_iter().take(SUMMARY_TOP_N).enumerate() {
        let filled = (insight.confidence * CONFIDENCE_BAR_WIDTH as f64).round() as usize;
        let bar = format!(
            "{}{}",
            "#".repeat(filled.min(CONFIDENCE_BAR_WIDTH)),
            ".".repeat(CONFIDENCE_BAR_WIDTH.saturating_sub(filled))
        );
        out.push_str(&format!("\n{}. {}\n", i + 1, insight.title));
        out.push_str(&format!("   {}\n", insight.description));
        out.push_str(&format!(
            "   Confidence: [{bar}] {:.0}%\n",
            insight.confidence * 100.0
        ));
    }
    out
}

pub fn anomalies_summary(state: &AnalysisState) -> String {
    let anomalies = state.anomaly_result().unwrap_or_default();
    if anomalies.is_empty() {
        return "No anomalies detected\n".to_owned();
    }

    let mut out = rule(&format!("ANOMALIES ({} found)", anomalies.len()));
    for anomaly in by_severity(anomalies).into_iter().take(SUMMARY_TOP_N) {
        out.push_str(&format!(
            "\n[{}] {}\n",
            anomaly.severity.as_str().to_uppercase(),
            anomaly.title
        ));
        out.push_str(&format!("   Column: {}\n", anomaly.column));
        out.push_str(&format!("   {}\n", anomaly.description));
    }
    out
}

pub fn visualizations_summary(state: &AnalysisState) -> String {
    match state.visualization_result() {
        None => match state.branch() {
            Some(branch) => format!("Visualizations skipped: {}\n", branch.reason()),
            None => "Visualizations not run\n".to_owned(),
        },
        Some(result) if result.is_empty() => "No charts planned\n".to_owned(),
        Some(result) => {
            let mut out = rule(&format!("CHARTS ({} planned)", result.len()));
            for chart in &result.charts {
                out.push_str(&format!("  - [{}] {}\n", chart.kind.as_str(), chart.title));
            }
            out
        }
    }
}

/// Status, stage outcomes, branch route and errors of a run.
pub fn workflow_summary(state: &AnalysisState) -> String {
    let mut out = rule("WORKFLOW SUMMARY");
    out.push_str(&format!("Status: {}\n", state.execution_status().as_str()));
    out.push_str(&format!("Final state: {}\n", state.workflow_state().as_str()));

    out.push_str("\nStages:\n");
    for record in state.stage_records() {
        out.push_str(&format!(
            "  {:<14} {:<10} {:>8.1} ms\n",
            record.stage.as_str(),
            record.outcome.as_str(),
            record.elapsed.as_secs_f64() * 1000.0
        ));
    }

    if let Some(branch) = state.branch() {
        out.push_str(&format!("\nVisualization branch: {}\n", branch.reason()));
    }

    out.push_str(&format!(
        "\nInsights: {} | Anomalies: {}\n",
        state.insight_result().map_or(0, <[_]>::len),
        state.anomaly_result().map_or(0, <[_]>::len)
    ));

    if !state.error_history().is_empty() {
        out.push_str("\nErrors:\n");
        for err in state.error_history() {
            out.push_str(&format!("  - {err}\n"));
        }
    }
    out
}

fn fmt_opt(v: Option<f64>) -> String {
    match v {
        Some(x) if x.is_finite() => format!("{x:.2}"),
        _ => "n/a".to_owned(),
    }
}

fn column_detail(col: &ColumnProfile) -> String {
    match &col.stats {
        ColumnStats::Numeric(s) => format!(
            "mean {}, median {}, range {} to {}",
            fmt_opt(s.mean),
            fmt_opt(s.median),
            fmt_opt(s.min),
            fmt_opt(s.max)
        ),
        ColumnStats::Categorical(s) => match s.top_values.first() {
            Some(top) => format!("{} unique, top `{}` ({})", s.unique_count, top.value, top.count),
            None => format!("{} unique", s.unique_count),
        },
        ColumnStats::Temporal(s) => format!(
            "{} to {}",
            s.min.as_deref().unwrap_or("n/a"),
            s.max.as_deref().unwrap_or("n/a")
        ),
        ColumnStats::Boolean(s) => format!("{} true, {} false", s.true_count, s.false_count),
    }
}

/// Render the whole run as a Markdown document.
pub fn render_markdown(state: &AnalysisState, title: &str) -> String {
    let mut md = String::new();

    md.push_str(&format!("# {title}\n\n"));
    md.push_str(&format!(
        "> **Status:** {}  \n",
        state.execution_status().as_str()
    ));
    md.push_str(&format!(
        "> **Generated:** {}  \n\n",
        chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    ));

    // Summary
    if let Some(summary) = state.summary_result() {
        md.push_str("## Summary\n\n");
        if summary.source == SummarySource::Fallback {
            md.push_str("*Automatic summary.*\n\n");
        }
        md.push_str("```text\n");
        md.push_str(&summary.text);
        if !summary.text.ends_with('\n') {
            md.push('\n');
        }
        md.push_str("```\n\n");
    }

    // Profile
    if let Some(profile) = state.profile_result() {
        md.push_str("## Data Profile\n\n");
        md.push_str(&format!("**Rows:** {}  \n", profile.overview.row_count));
        md.push_str(&format!("**Columns:** {}  \n", profile.overview.column_count));
        md.push_str(&format!(
            "**Quality Score:** {:.1}/100\n\n",
            profile.quality_score.score
        ));

        if !profile.columns.is_empty() {
            md.push_str("| Column | Type | Null % | Details |\n");
            md.push_str("|--------|------|--------|---------|\n");
            for col in &profile.columns {
                md.push_str(&format!(
                    "| `{}` | {} | {:.1}% | {} |\n",
                    col.name,
                    col.kind,
                    col.null_pct,
                    column_detail(col)
                ));
            }
            md.push('\n');
        }

        if !profile.quality_issues.is_empty() {
            md.push_str("**Quality Issues:**  \n");
            for issue in &profile.quality_issues {
                md.push_str(&format!("- {issue}\n"));
            }
            md.push('\n');
        }
    }

    // Insights
    let insights = state.insight_result().unwrap_or_default();
    md.push_str("## Insights\n\n");
    if insights.is_empty() {
        md.push_str("*No insights generated.*\n\n");
    } else {
        for insight in by_confidence(insights) {
            md.push_str(&format!(
                "- **{}** ({:.0}% confidence): {}\n",
                insight.title,
                insight.confidence * 100.0,
                insight.description
            ));
        }
        md.push('\n');
    }

    // Anomalies
    let anomalies = state.anomaly_result().unwrap_or_default();
    md.push_str("## Anomalies\n\n");
    if anomalies.is_empty() {
        md.push_str("*No anomalies detected.*\n\n");
    } else {
        md.push_str("| Severity | Kind | Column | Count | % | Description |\n");
        md.push_str("|----------|------|--------|-------|---|-------------|\n");
        for a in by_severity(anomalies) {
            md.push_str(&format!(
                "| {} | {} | `{}` | {} | {:.1}% | {} |\n",
                a.severity, a.kind, a.column, a.count, a.percentage, a.description
            ));
        }
        md.push('\n');
    }

    // Charts
    if let Some(charts) = state.visualization_result().filter(|c| !c.is_empty()) {
        md.push_str("## Planned Charts\n\n");
        for chart in &charts.charts {
            md.push_str(&format!("- **{}** ({})\n", chart.title, chart.kind.as_str()));
        }
        md.push('\n');
    }

    // Errors
    if !state.error_history().is_empty() {
        md.push_str("## Errors\n\n");
        for err in state.error_history() {
            md.push_str(&format!("- {err}\n"));
        }
        md.push('\n');
    }

    md
}
