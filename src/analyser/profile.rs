//! Structural profiling: per-column summaries, quality issues, a quality
//! score, coarse column roles and usage recommendations.

use super::recommend;
use super::stats::{self, IqrFence};
use super::types::{
    BooleanStats, CategoricalStats, ColumnProfile, ColumnRoles, ColumnStats, DatasetOverview,
    NumericStats, ProfileResult, QualityScore, TemporalStats,
};
use crate::config::Thresholds;
use crate::dataset::{Column, ColumnKind, Dataset, format_timestamp};
use polars::prelude::{ChunkAgg as _, ChunkQuantile as _};

const TOP_VALUES: usize = 5;
const ID_KEYWORDS: &[&str] = &["id", "key", "index", "code", "number", "num", "serial"];

/// Profile every column of `dataset`. Callers are expected to reject an
/// empty dataset first; with zero rows every column profiles as all-null.
pub fn profile_dataset(dataset: &Dataset, thresholds: &Thresholds) -> ProfileResult {
    let row_count = dataset.row_count();
    let columns: Vec<ColumnProfile> = dataset
        .columns()
        .iter()
        .map(|c| profile_column(c, row_count, thresholds))
        .collect();

    let duplicates = dataset.duplicate_row_count();
    let quality_score = quality_score(dataset, &columns, duplicates);
    let roles = column_roles(dataset);
    let quality_issues = quality_issues(dataset, &columns, &quality_score, thresholds);
    let recommendations = recommend::column_recommendations(dataset, &columns, &roles);
    let target_suggestions = recommend::target_suggestions(dataset);

    tracing::debug!(
        columns = columns.len(),
        issues = quality_issues.len(),
        score = quality_score.score,
        targets = target_suggestions.len(),
        "Profiled dataset"
    );

    ProfileResult {
        overview: DatasetOverview {
            row_count,
            column_count: dataset.column_count(),
            memory_bytes: dataset.estimated_memory_bytes(),
        },
        columns,
        quality_issues,
        quality_score,
        roles,
        recommendations,
        target_suggestions,
    }
}

fn profile_column(column: &Column, row_count: usize, thresholds: &Thresholds) -> ColumnProfile {
    let null_count = column.null_count();
    let stats = match column.kind() {
        ColumnKind::Numeric => ColumnStats::Numeric(numeric_stats(column, thresholds.iqr_multiplier)),
        ColumnKind::Categorical => {
            let counts = column.str().map(stats::value_counts).unwrap_or_default();
            ColumnStats::Categorical(CategoricalStats {
                unique_count: counts.len(),
                top_values: counts.into_iter().take(TOP_VALUES).collect(),
            })
        }
        ColumnKind::Temporal => {
            let stamps = column.timestamps();
            ColumnStats::Temporal(TemporalStats {
                min: stamps.and_then(|ca| ca.min()).map(format_timestamp),
                max: stamps.and_then(|ca| ca.max()).map(format_timestamp),
                unique_count: column.distinct_count(),
            })
        }
        ColumnKind::Boolean => {
            let (true_count, false_count) = column
                .bool()
                .map_or((0, 0), |ca| (ca.num_trues(), ca.num_falses()));
            ColumnStats::Boolean(BooleanStats {
                true_count,
                false_count,
            })
        }
    };

    ColumnProfile {
        name: column.name().to_owned(),
        kind: column.kind(),
        null_count,
        null_pct: stats::percentage(null_count, row_count),
        stats,
    }
}

fn numeric_stats(column: &Column, iqr_multiplier: f64) -> NumericStats {
    let Some(ca) = column.f64() else {
        return NumericStats::default();
    };
    let fence = IqrFence::from_column(ca, iqr_multiplier);
    let outlier_count = match fence {
        Some(f) if f.iqr > 0.0 => f.count_outliers(ca),
        _ => 0,
    };

    NumericStats {
        mean: ca.mean(),
        median: ca.median(),
        std_dev: stats::std_dev(ca),
        min: ca.min(),
        max: ca.max(),
        q1: fence.map(|f| f.q1),
        q3: fence.map(|f| f.q3),
        outlier_count,
    }
}

fn quality_score(dataset: &Dataset, columns: &[ColumnProfile], duplicates: usize) -> QualityScore {
    let rows = dataset.row_count();
    let total_cells = rows * dataset.column_count();
    let total_missing: usize = columns.iter().map(|c| c.null_count).sum();

    let mut numeric_values = 0;
    let mut total_outliers = 0;
    for (column, profile) in dataset.columns().iter().zip(columns) {
        if let Some(numeric) = profile.numeric() {
            numeric_values += column.non_null_count();
            total_outliers += numeric.outlier_count;
        }
    }

    let missing_pct = stats::percentage(total_missing, total_cells);
    let duplicate_pct = stats::percentage(duplicates, rows);
    let outlier_pct = stats::percentage(total_outliers, numeric_values);

    QualityScore {
        score: (100.0 - (missing_pct + duplicate_pct + outlier_pct)).max(0.0),
        missing_pct,
        duplicate_pct,
        outlier_pct,
        total_missing,
        total_duplicates: duplicates,
        total_outliers,
    }
}

fn quality_issues(
    dataset: &Dataset,
    columns: &[ColumnProfile],
    score: &QualityScore,
    thresholds: &Thresholds,
) -> Vec<String> {
    let mut issues = Vec::new();

    for (column, profile) in dataset.columns().iter().zip(columns) {
        if profile.null_pct > thresholds.quality_null_pct {
            issues.push(format!(
                "Column '{}' has {:.1}% missing values",
                profile.name, profile.null_pct
            ));
        }

        let distinct = column.distinct_count();
        if distinct == 1 {
            issues.push(format!("Column '{}' is constant (single value)", profile.name));
            continue;
        }

        if let Some(cat) = profile.categorical()
            && let Some(top) = cat.top_values.first()
            && column.non_null_count() > 0
        {
            let share = top.count as f64 / column.non_null_count() as f64;
            if share > thresholds.quality_dominance {
                issues.push(format!(
                    "Column '{}' is dominated by '{}' ({:.1}% of values)",
                    profile.name,
                    top.value,
                    share * 100.0
                ));
            }
        }
    }

    if score.total_duplicates > 0 {
        issues.push(format!(
            "Found {} duplicate rows ({:.1}%)",
            score.total_duplicates, score.duplicate_pct
        ));
    }
    if score.total_outliers > 0 {
        issues.push(format!(
            "Found {} outliers across numeric columns ({:.1}%)",
            score.total_outliers, score.outlier_pct
        ));
    }

    issues
}

/// Lowercase words of a column name, split on separators and on camelCase
/// boundaries: `CustomerID` gives `customer`, `id`.
pub fn name_tokens(name: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    for part in name.split(|c: char| !c.is_alphanumeric()) {
        let chars: Vec<char> = part.chars().collect();
        let mut current = String::new();
        for (i, &c) in chars.iter().enumerate() {
            let prev = i.checked_sub(1).and_then(|j| chars.get(j));
            let next = chars.get(i + 1);
            let boundary = c.is_uppercase()
                && match prev {
                    Some(p) if p.is_lowercase() || p.is_numeric() => true,
                    // Last capital of an acronym that starts a new word: `IDNumber`.
                    Some(p) if p.is_uppercase() => next.is_some_and(|n| n.is_lowercase()),
                    _ => false,
                };
            if boundary && !current.is_empty() {
                tokens.push(std::mem::take(&mut current));
            }
            current.extend(c.to_lowercase());
        }
        if !current.is_empty() {
            tokens.push(current);
        }
    }
    tokens
}

pub fn has_id_name(name: &str) -> bool {
    name_tokens(name)
        .iter()
        .any(|token| ID_KEYWORDS.contains(&token.as_str()))
}

fn column_roles(dataset: &Dataset) -> ColumnRoles {
    let mut roles = ColumnRoles::default();

    for column in dataset.columns() {
        let name = column.name().to_owned();
        let unique = column.distinct_count();
        let non_null = column.non_null_count();
        let uniqueness = if non_null == 0 {
            0.0
        } else {
            unique as f64 / non_null as f64
        };

        match column.kind() {
            ColumnKind::Numeric => roles.numeric.push(name.clone()),
            ColumnKind::Temporal => roles.date.push(name.clone()),
            ColumnKind::Categorical | ColumnKind::Boolean => roles.categorical.push(name.clone()),
        }

        if column.kind() != ColumnKind::Temporal
            && ((uniqueness > 0.95 && unique > 10) || (has_id_name(&name) && uniqueness > 0.8))
        {
            roles.id.push(name.clone());
        }
        if unique == 1 {
            roles.constant.push(name);
        }
    }

    roles
}

#[cfg(test)]
mod tests {
    #![expect(clippy::unwrap_used)]
    use super::*;

    fn profile(columns: Vec<Column>) -> ProfileResult {
        let ds = Dataset::new(columns).unwrap();
        profile_dataset(&ds, &Thresholds::default())
    }

    #[test]
    fn test_numeric_profile() {
        let p = profile(vec![Column::from_f64("a", &[1.0, 2.0, 3.0, 4.0, 100.0])]);
        let stats = p.column("a").unwrap().numeric().unwrap();
        assert_eq!(stats.median, Some(3.0));
        assert_eq!(stats.q1, Some(2.0));
        assert_eq!(stats.q3, Some(4.0));
        assert_eq!(stats.min, Some(1.0));
        assert_eq!(stats.max, Some(100.0));
        assert_eq!(stats.outlier_count, 1);
        assert_eq!(p.overview.row_count, 5);
        assert_eq!(p.quality_score.total_outliers, 1);
        assert!(p.quality_issues.iter().any(|i| i.contains("outliers")));
    }

    #[test]
    fn test_categorical_top_values() {
        let p = profile(vec![Column::from_strs(
            "city",
            &["York", "Leeds", "York", "Hull", "York", "Leeds", "Bath", "Ely", "Rye"],
        )]);
        let cat = p.column("city").unwrap().categorical().unwrap();
        assert_eq!(cat.unique_count, 6);
        assert_eq!(cat.top_values.len(), 5);
        assert_eq!(cat.top_values.first().unwrap().value, "York");
    }

    #[test]
    fn test_quality_issues_for_nulls_constant_and_dominance() {
        let mut dominant = vec!["a"; 19];
        dominant.push("b");
        let p = profile(vec![
            Column::numeric("sparse", (0..20).map(|i| (i < 5).then_some(1.0 + i as f64)).collect()),
            Column::from_f64("flat", &[7.0; 20]),
            Column::from_strs("mostly_a", &dominant),
        ]);
        let issues = p.quality_issues.join("\n");
        assert!(issues.contains("'sparse' has 75.0% missing"), "{issues}");
        assert!(issues.contains("'flat' is constant"), "{issues}");
        assert!(issues.contains("'mostly_a' is dominated by 'a'"), "{issues}");
        assert_eq!(p.roles.constant, vec!["flat".to_owned()]);
    }

    #[test]
    fn test_quality_score_and_duplicates() {
        let p = profile(vec![
            Column::from_f64("x", &[1.0, 1.0, 2.0, 3.0]),
            Column::from_strs("y", &["a", "a", "b", "c"]),
        ]);
        assert_eq!(p.quality_score.total_duplicates, 1);
        assert!((p.quality_score.duplicate_pct - 25.0).abs() < 1e-9);
        assert!((p.quality_score.score - 75.0).abs() < 1e-9);
        assert!(p.quality_issues.iter().any(|i| i.starts_with("Found 1 duplicate rows")));
    }

    #[test]
    fn test_roles_detect_id_columns() {
        let ids: Vec<f64> = (0..20).map(f64::from).collect();
        let p = profile(vec![
            Column::from_f64("customer_id", &ids),
            Column::temporal("when", (0..20).map(|d| Some(d * 86_400_000)).collect()),
        ]);
        assert_eq!(p.roles.id, vec!["customer_id".to_owned()]);
        assert_eq!(p.roles.date, vec!["when".to_owned()]);
        let ColumnStats::Temporal(t) = &p.column("when").unwrap().stats else {
            panic!("expected temporal stats");
        };
        assert_eq!(t.min.as_deref(), Some("1970-01-01"));
        assert_eq!(t.unique_count, 20);
    }

    #[test]
    fn test_boolean_and_all_null_columns() {
        let p = profile(vec![
            Column::boolean("flag", vec![Some(true), Some(false), Some(true), None]),
            Column::numeric("empty", vec![None; 4]),
        ]);
        let ColumnStats::Boolean(b) = &p.column("flag").unwrap().stats else {
            panic!("expected boolean stats");
        };
        assert_eq!((b.true_count, b.false_count), (2, 1));
        let empty = p.column("empty").unwrap().numeric().unwrap();
        assert_eq!(empty.mean, None);
        assert_eq!(empty.outlier_count, 0);
    }

    #[test]
    fn test_id_name_matching() {
        assert!(has_id_name("order_id"));
        assert!(has_id_name("CustomerID"));
        assert!(has_id_name("userId"));
        assert!(has_id_name("IDNumber"));
        assert!(has_id_name("serial number"));
        assert!(!has_id_name("price"));
        for word in ["paid", "valid", "humid", "Void", "amount_paid"] {
            assert!(!has_id_name(word), "{word} is not an identifier");
        }
    }

    #[test]
    fn test_name_tokens() {
        assert_eq!(name_tokens("CustomerID"), vec!["customer", "id"]);
        assert_eq!(name_tokens("userId"), vec!["user", "id"]);
        assert_eq!(name_tokens("IDNumber"), vec!["id", "number"]);
        assert_eq!(name_tokens("order-id 2"), vec!["order", "id", "2"]);
    }

    #[test]
    fn test_unique_paid_amounts_are_not_ids() {
        // Highly unique, but under the 10-value floor, so only the name could tag it.
        let p = profile(vec![Column::from_f64("paid", &[1.0, 2.0, 3.0, 4.0, 5.0])]);
        assert!(p.roles.id.is_empty());
        let p = profile(vec![Column::from_f64("paid_id", &[1.0, 2.0, 3.0, 4.0, 5.0])]);
        assert_eq!(p.roles.id, vec!["paid_id".to_owned()]);
    }
}
