//! Rule-based answers to follow-up questions, drawn from the results of a
//! finished run.

use crate::analyser::types::{by_confidence, by_severity};
use crate::analyser::{ColumnProfile, InsightKind, ProfileResult};
use crate::pipeline::AnalysisState;

const LISTED: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Intent {
    Correlation,
    Anomaly,
    Missing,
    Duplicates,
    Max,
    Min,
    Mean,
    Size,
    Overview,
}

fn tokens(question: &str) -> Vec<String> {
    question
        .to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|t| !t.is_empty())
        .map(str::to_owned)
        .collect()
}

fn classify(words: &[String]) -> Intent {
    let has = |options: &[&str]| words.iter().any(|w| options.contains(&w.as_str()));
    let has_prefix = |prefixes: &[&str]| {
        words
            .iter()
            .any(|w| prefixes.iter().any(|p| w.starts_with(p)))
    };

    if has_prefix(&["correlat", "relationship", "related"]) {
        Intent::Correlation
    } else if has_prefix(&["anomal", "outlier", "unusual"]) {
        Intent::Anomaly
    } else if has(&["missing", "null", "nulls", "blank"]) {
        Intent::Missing
    } else if has_prefix(&["duplicat"]) {
        Intent::Duplicates
    } else if has(&["max", "maximum", "highest", "largest"]) {
        Intent::Max
    } else if has(&["min", "minimum", "lowest", "smallest"]) {
        Intent::Min
    } else if has(&["mean", "average", "avg"]) {
        Intent::Mean
    } else if has(&["rows", "records", "count", "size"]) {
        Intent::Size
    } else {
        Intent::Overview
    }
}

/// The column the question names, preferring the longest match.
fn mentioned_column<'a>(profile: &'a ProfileResult, question: &str, words: &[String]) -> Option<&'a ColumnProfile> {
    let lower = question.to_lowercase();
    profile
        .columns
        .iter()
        .filter(|c| {
            let name = c.name.to_lowercase();
            if lower.contains(&name) {
                return true;
            }
            let parts: Vec<&str> = name
                .split(|ch: char| ch == '_' || ch == '-' || ch.is_whitespace())
                .filter(|p| !p.is_empty())
                .collect();
            !parts.is_empty() && parts.iter().all(|p| words.iter().any(|w| w == p))
        })
        .max_by_key(|c| c.name.len())
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.0}")
    } else {
        format!("{value:.2}")
    }
}

fn numeric_answer(
    profile: &ProfileResult,
    question: &str,
    words: &[String],
    label: &str,
    pick: fn(&ColumnProfile) -> Option<f64>,
) -> String {
    if let Some(column) = mentioned_column(profile, question, words) {
        return match pick(column) {
            Some(value) => format!("The {label} of {} is {}.", column.name, format_number(value)),
            None => format!("{} has no numeric {label}.", column.name),
        };
    }

    let lines: Vec<String> = profile
        .columns
        .iter()
        .filter_map(|c| pick(c).map(|v| format!("- {}: {}", c.name, format_number(v))))
        .collect();
    if lines.is_empty() {
        "There are no numeric columns to answer that from.".to_owned()
    } else {
        format!("{} by numeric column:\n{}", capitalized(label), lines.join("\n"))
    }
}

fn capitalized(label: &str) -> String {
    let mut chars = label.chars();
    chars
        .next()
        .map(|c| c.to_uppercase().chain(chars).collect())
        .unwrap_or_default()
}

/// Answer `question` from the profile, insights and anomalies of `state`.
pub fn answer_question(state: &AnalysisState, question: &str) -> String {
    let words = tokens(question);
    let intent = classify(&words);
    tracing::debug!(?intent, "Answering question");

    let Some(profile) = state.profile_result() else {
        return "No analysis results are available yet.".to_owned();
    };
    let insights = state.insight_result().unwrap_or_default();
    let anomalies = state.anomaly_result().unwrap_or_default();

    match intent {
        Intent::Correlation => {
            let lines: Vec<String> = by_confidence(insights)
                .into_iter()
                .filter(|i| i.kind == InsightKind::Correlation)
                .take(LISTED)
                .map(|i| format!("- {}", i.description))
                .collect();
            if lines.is_empty() {
                "No strong correlations were found between numeric columns.".to_owned()
            } else {
                format!("Key relationships:\n{}", lines.join("\n"))
            }
        }
        Intent::Anomaly => {
            if anomalies.is_empty() {
                return "No anomalies were detected.".to_owned();
            }
            let lines: Vec<String> = by_severity(anomalies)
                .into_iter()
                .take(LISTED)
                .map(|a| format!("- [{}] {}: {}", a.severity, a.title, a.description))
                .collect();
            format!("{} anomalies detected. Most severe:\n{}", anomalies.len(), lines.join("\n"))
        }
        Intent::Missing => {
            let lines: Vec<String> = profile
                .columns
                .iter()
                .filter(|c| c.null_count > 0)
                .map(|c| format!("- {}: {} missing ({:.1}%)", c.name, c.null_count, c.null_pct))
                .collect();
            if lines.is_empty() {
                "No values are missing.".to_owned()
            } else {
                format!(
                    "{} missing values in total ({:.2}% of cells):\n{}",
                    profile.quality_score.total_missing,
                    profile.quality_score.missing_pct,
                    lines.join("\n")
                )
            }
        }
        Intent::Duplicates => match profile.quality_score.total_duplicates {
            0 => "There are no duplicate rows.".to_owned(),
            n => format!(
                "{n} rows ({:.1}%) are duplicates of an earlier row.",
                profile.quality_score.duplicate_pct
            ),
        },
        Intent::Max => numeric_answer(profile, question, &words, "maximum", |c| {
            c.numeric().and_then(|s| s.max)
        }),
        Intent::Min => numeric_answer(profile, question, &words, "minimum", |c| {
            c.numeric().and_then(|s| s.min)
        }),
        Intent::Mean => numeric_answer(profile, question, &words, "mean", |c| {
            c.numeric().and_then(|s| s.mean)
        }),
        Intent::Size => format!(
            "The dataset has {} rows and {} columns.",
            profile.overview.row_count, profile.overview.column_count
        ),
        Intent::Overview => {
            let titles: Vec<String> = by_confidence(insights)
                .into_iter()
                .take(LISTED)
                .map(|i| format!("- {}", i.title))
                .collect();
            if titles.is_empty() {
                "Analysis summary: no notable patterns were found.".to_owned()
            } else {
                format!("Analysis summary:\n{}", titles.join("\n"))
            }
        }
    }
}
