//! Rule-based column advice built on top of a finished profile: which
//! columns chart well, which make good grouping keys, which need cleaning,
//! and which look like prediction targets.

use super::profile::has_id_name;
use super::types::{
    CleaningRecommendation, ColumnProfile, ColumnRecommendation, ColumnRecommendations,
    ColumnRoles, SuggestionConfidence, TargetSuggestion,
};
use crate::dataset::{ColumnKind, Dataset};

/// Visualization score a numeric column needs to be recommended.
const MIN_VISUALIZATION_SCORE: u32 = 4;
/// Grouping score a categorical column needs to be recommended.
const MIN_GROUPING_SCORE: u32 = 3;
/// Temporal columns always group well.
const TEMPORAL_GROUPING_SCORE: u32 = 5;

const IDEAL_GROUPS: std::ops::RangeInclusive<usize> = 2..=20;
const ACCEPTABLE_GROUPS: std::ops::RangeInclusive<usize> = 2..=50;
const MAX_TARGET_CATEGORIES: usize = 10;

const TARGET_KEYWORDS: &[&str] = &[
    "target",
    "label",
    "outcome",
    "result",
    "class",
    "prediction",
    "response",
    "dependent",
    "y",
    "output",
    "status",
    "success",
    "failure",
    "churn",
    "converted",
];
const FREE_TEXT_NAMES: &[&str] = &["name", "description", "notes"];

pub fn column_recommendations(
    dataset: &Dataset,
    profiles: &[ColumnProfile],
    roles: &ColumnRoles,
) -> ColumnRecommendations {
    let mut out = ColumnRecommendations::default();

    for (column, profile) in dataset.columns().iter().zip(profiles) {
        let name = column.name();
        let is_id = roles.id.iter().any(|c| c == name);
        let is_constant = roles.constant.iter().any(|c| c == name);
        let non_null = column.non_null_count();

        match column.kind() {
            ColumnKind::Numeric => {
                if let Some(fit) = visualization_fit(profile, is_id, is_constant, non_null) {
                    out.best_for_visualization.push(fit);
                }
            }
            ColumnKind::Categorical | ColumnKind::Boolean => {
                let groups = column.distinct_count();
                if let Some(fit) = grouping_fit(profile, groups, is_id || is_constant) {
                    out.best_for_grouping.push(fit);
                }
            }
            ColumnKind::Temporal => out.best_for_grouping.push(ColumnRecommendation {
                column: name.to_owned(),
                kind: ColumnKind::Temporal,
                score: TEMPORAL_GROUPING_SCORE,
                reasons: vec!["time-based grouping".to_owned(), "trend analysis".to_owned()],
            }),
        }

        if let Some(needs) = cleaning_needs(profile, is_id, is_constant, non_null) {
            out.columns_to_clean.push(needs);
        }
    }

    out.best_for_visualization.sort_by(|a, b| b.score.cmp(&a.score));
    out.best_for_grouping.sort_by(|a, b| b.score.cmp(&a.score));
    out.columns_to_clean.sort_by(|a, b| b.severity.cmp(&a.severity));
    out
}

fn visualization_fit(
    profile: &ColumnProfile,
    is_id: bool,
    is_constant: bool,
    non_null: usize,
) -> Option<ColumnRecommendation> {
    let stats = profile.numeric()?;
    let mut score = 0;
    let mut reasons = Vec::new();

    if stats.std_dev.is_some_and(|s| s > 0.0) && !is_id && !is_constant {
        score += 3;
        reasons.push("good variance".to_owned());
    }
    if profile.null_pct < 30.0 {
        score += 2;
        reasons.push("low missing values".to_owned());
    }
    if (stats.outlier_count as f64) < non_null as f64 * 0.1 {
        score += 1;
        reasons.push("few outliers".to_owned());
    }

    (score >= MIN_VISUALIZATION_SCORE && !is_id).then(|| ColumnRecommendation {
        column: profile.name.clone(),
        kind: profile.kind,
        score,
        reasons,
    })
}

fn grouping_fit(
    profile: &ColumnProfile,
    groups: usize,
    excluded: bool,
) -> Option<ColumnRecommendation> {
    if excluded || !ACCEPTABLE_GROUPS.contains(&groups) {
        return None;
    }
    let (mut score, fit) = if IDEAL_GROUPS.contains(&groups) {
        (3, "ideal")
    } else {
        (2, "acceptable")
    };
    let mut reasons = vec![format!("{fit} cardinality ({groups} categories)")];
    if profile.null_pct < 20.0 {
        score += 2;
        reasons.push("low missing values".to_owned());
    }

    (score >= MIN_GROUPING_SCORE).then(|| ColumnRecommendation {
        column: profile.name.clone(),
        kind: profile.kind,
        score,
        reasons,
    })
}

fn cleaning_needs(
    profile: &ColumnProfile,
    is_id: bool,
    is_constant: bool,
    non_null: usize,
) -> Option<CleaningRecommendation> {
    let mut issues = Vec::new();
    let mut severity = 0;

    if profile.null_pct > 50.0 {
        issues.push(format!("{:.1}% missing values", profile.null_pct));
        severity += 3;
    } else if profile.null_pct > 20.0 {
        issues.push(format!("{:.1}% missing values", profile.null_pct));
        severity += 2;
    }

    if is_constant {
        issues.push("constant value (no variance)".to_owned());
        severity += 3;
    }

    if let Some(stats) = profile.numeric()
        && non_null > 0
    {
        let outlier_pct = stats.outlier_count as f64 / non_null as f64 * 100.0;
        if outlier_pct > 20.0 {
            issues.push(format!("{outlier_pct:.1}% outliers"));
            severity += 2;
        } else if outlier_pct > 10.0 {
            issues.push(format!("{outlier_pct:.1}% outliers"));
            severity += 1;
        }
    }

    if is_id && !is_constant {
        issues.push("ID column (exclude from analysis)".to_owned());
        severity += 1;
    }

    (!issues.is_empty()).then(|| CleaningRecommendation {
        column: profile.name.clone(),
        severity,
        issues,
    })
}

fn has_target_name(lower: &str) -> bool {
    TARGET_KEYWORDS
        .iter()
        .any(|kw| lower == *kw || lower.strip_suffix(kw).is_some_and(|rest| rest.ends_with('_')))
}

/// Columns that look like something a model would predict, in column order.
pub fn target_suggestions(dataset: &Dataset) -> Vec<TargetSuggestion> {
    let mut out = Vec::new();

    for column in dataset.columns() {
        let name = column.name();
        let lower = name.to_lowercase();
        let id_like = has_id_name(name);
        let unique = column.distinct_count();

        let suggestion = if has_target_name(&lower) {
            Some((
                "Name suggests target variable".to_owned(),
                SuggestionConfidence::High,
            ))
        } else if unique == 2 && column.kind() != ColumnKind::Temporal && !id_like {
            Some((
                format!("Binary column ({unique} values)"),
                SuggestionConfidence::Medium,
            ))
        } else if column.kind() == ColumnKind::Categorical
            && (2..=MAX_TARGET_CATEGORIES).contains(&unique)
            && !id_like
            && !FREE_TEXT_NAMES.contains(&lower.as_str())
        {
            Some((
                format!("Low cardinality categorical ({unique} categories)"),
                SuggestionConfidence::Low,
            ))
        } else {
            None
        };

        if let Some((reason, confidence)) = suggestion {
            out.push(TargetSuggestion {
                column: name.to_owned(),
                reason,
                confidence,
            });
        }
    }

    out
}
