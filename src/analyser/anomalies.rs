//! Anomaly detection: z-score and IQR outliers, sparse categories and
//! irregular period-over-period changes.
//!
//! The two outlier methods are independent; a value may be reported by both.
//! Degenerate columns (all null, zero spread, too few values) produce no
//! records rather than errors.

use super::stats::{self, IqrFence};
use super::types::{Anomaly, AnomalyKind, Guidance, Severity};
use crate::config::{TemporalPeriod, Thresholds};
use crate::dataset::{ColumnKind, Dataset};
use chrono::{DateTime, Datelike as _, NaiveDate};
use polars::prelude::{ChunkAgg as _, Float64Chunked, NewChunkedArray as _, PlSmallStr};
use std::collections::BTreeMap;

/// Fewest prior deltas a period-over-period change is compared against.
const MIN_TEMPORAL_WINDOW: usize = 3;
/// Fewest periods for which the temporal check is meaningful.
const MIN_PERIODS: usize = MIN_TEMPORAL_WINDOW + 2;
/// How many flagged labels a description lists before eliding.
const MAX_LISTED: usize = 10;

pub fn detect_anomalies(dataset: &Dataset, thresholds: &Thresholds) -> Vec<Anomaly> {
    let mut anomalies = Vec::new();
    if dataset.is_empty() {
        return anomalies;
    }

    zscore_outliers(dataset, thresholds, &mut anomalies);
    iqr_outliers(dataset, thresholds, &mut anomalies);
    sparse_categories(dataset, thresholds, &mut anomalies);
    temporal_anomalies(dataset, thresholds, &mut anomalies);

    tracing::debug!(count = anomalies.len(), "Detected anomalies");
    anomalies
}

fn zscore_outliers(dataset: &Dataset, thresholds: &Thresholds, out: &mut Vec<Anomaly>) {
    for column in dataset.columns_of_kind(ColumnKind::Numeric) {
        let Some(ca) = column.f64() else {
            continue;
        };
        let present = column.non_null_count();
        if present < thresholds.min_rows_for_outliers || !stats::has_spread(ca) {
            continue;
        }
        let (Some(mean), Some(std)) = (ca.mean(), stats::population_std_dev(ca)) else {
            continue;
        };
        if std <= 0.0 {
            continue;
        }

        let count = ca
            .into_iter()
            .flatten()
            .filter(|v| ((v - mean) / std).abs() > thresholds.z_score)
            .count();
        if count == 0 {
            continue;
        }

        let name = column.name();
        let percentage = stats::percentage(count, present);
        out.push(Anomaly {
            kind: AnomalyKind::ZScoreOutlier,
            column: name.to_owned(),
            title: format!("Z-score outliers in {name}"),
            description: format!(
                "{count} values ({percentage:.1}% of non-null values) lie more than {} standard \
                 deviations from the mean ({mean:.2}).",
                thresholds.z_score
            ),
            count,
            percentage,
            severity: Severity::from_percentage(percentage),
            guidance: Some(Guidance::new(
                format!(
                    "In the '{name}' column, {count} values are extremely different from the \
                     average ({mean:.2})."
                ),
                "Outliers can indicate errors, rare events, or important exceptions that need \
                 attention.",
                format!(
                    "Review these {count} unusual values to decide if they are valid or errors."
                ),
            )),
        });
    }
}

fn iqr_outliers(dataset: &Dataset, thresholds: &Thresholds, out: &mut Vec<Anomaly>) {
    for column in dataset.columns_of_kind(ColumnKind::Numeric) {
        let Some(ca) = column.f64() else {
            continue;
        };
        let present = column.non_null_count();
        if present < thresholds.min_rows_for_outliers {
            continue;
        }
        let Some(fence) = IqrFence::from_column(ca, thresholds.iqr_multiplier) else {
            continue;
        };
        if fence.iqr <= 0.0 {
            continue;
        }

        let count = fence.count_outliers(ca);
        if count == 0 {
            continue;
        }

        let name = column.name();
        let percentage = stats::percentage(count, present);
        out.push(Anomaly {
            kind: AnomalyKind::IqrOutlier,
            column: name.to_owned(),
            title: format!("IQR outliers in {name}"),
            description: format!(
                "{count} values fall outside [{:.2}, {:.2}] (Q1 = {:.2}, Q3 = {:.2}).",
                fence.lower, fence.upper, fence.q1, fence.q3
            ),
            count,
            percentage,
            severity: Severity::from_percentage(percentage),
            guidance: Some(Guidance::new(
                format!(
                    "In the '{name}' column, {count} values sit far outside the range where most \
                     values fall ({:.2} to {:.2}).",
                    fence.q1, fence.q3
                ),
                "Values beyond the fences distort averages and stretch chart axes.",
                format!("Check these {count} values; correct errors and keep genuine extremes."),
            )),
        });
    }
}

/// Categories rarer than `floor` and rarer than the most frequent value.
/// A column whose categories are all equally small has nothing sparse.
fn sparse_categories(dataset: &Dataset, thresholds: &Thresholds, out: &mut Vec<Anomaly>) {
    let rows = dataset.row_count();
    let floor = (rows as f64 * thresholds.sparse_category_pct / 100.0)
        .max(thresholds.sparse_category_min_count as f64);

    for column in dataset.columns_of_kind(ColumnKind::Categorical) {
        let Some(values) = column.str() else {
            continue;
        };
        if column.non_null_count() < thresholds.min_rows_for_outliers {
            continue;
        }
        let counts = stats::value_counts(values);
        let Some(top) = counts.first().map(|c| c.count) else {
            continue;
        };
        if counts.len() < 2 {
            continue;
        }

        let sparse: Vec<_> = counts
            .iter()
            .filter(|c| (c.count as f64) < floor && c.count < top)
            .collect();
        if sparse.is_empty() {
            continue;
        }

        let name = column.name();
        let affected: usize = sparse.iter().map(|c| c.count).sum();
        let percentage = stats::percentage(affected, rows);
        let labels: Vec<&str> = sparse.iter().map(|c| c.value.as_str()).collect();
        out.push(Anomaly {
            kind: AnomalyKind::SparseCategory,
            column: name.to_owned(),
            title: format!("Sparse categories in {name}"),
            description: format!(
                "{} of {} categories are rare (fewer than {:.0} rows each): {}. Together they \
                 cover {percentage:.1}% of rows.",
                sparse.len(),
                counts.len(),
                floor.ceil(),
                list_labels(&labels)
            ),
            count: sparse.len(),
            percentage,
            severity: Severity::from_percentage(percentage),
            guidance: Some(Guidance::new(
                format!(
                    "In the '{name}' column, {} categories appear only a handful of times.",
                    sparse.len()
                ),
                "Rare categories can be typos, and they are too small for reliable group \
                 statistics.",
                "Fix misspellings, or merge rare categories into an 'Other' group.",
            )),
        });
    }
}

/// Calendar bucket a timestamp falls in.
pub fn period_start(millis: i64, period: TemporalPeriod) -> Option<NaiveDate> {
    let date = DateTime::from_timestamp_millis(millis)?.date_naive();
    match period {
        TemporalPeriod::Day => Some(date),
        TemporalPeriod::Week => {
            let offset = date.weekday().num_days_from_monday();
            date.checked_sub_days(chrono::Days::new(u64::from(offset)))
        }
        TemporalPeriod::Month => date.with_day(1),
    }
}

pub fn period_label(start: NaiveDate, period: TemporalPeriod) -> String {
    match period {
        TemporalPeriod::Day => start.format("%Y-%m-%d").to_string(),
        TemporalPeriod::Week => format!("week of {}", start.format("%Y-%m-%d")),
        TemporalPeriod::Month => start.format("%Y-%m").to_string(),
    }
}

/// Indices of deltas that stray from their trailing window by more than
/// `multiplier` sample standard deviations.
pub fn irregular_deltas(deltas: &[f64], window: usize, multiplier: f64) -> Vec<usize> {
    let mut flagged = Vec::new();
    for (k, delta) in deltas.iter().enumerate().skip(MIN_TEMPORAL_WINDOW) {
        let Some(trailing) = deltas.get(k.saturating_sub(window)..k) else {
            continue;
        };
        let trailing = Float64Chunked::from_slice(PlSmallStr::EMPTY, trailing);
        let (Some(mean), Some(std)) = (trailing.mean(), stats::std_dev(&trailing)) else {
            continue;
        };
        if std > 0.0 && (delta - mean).abs() > multiplier * std {
            flagged.push(k);
        }
    }
    flagged
}

fn temporal_anomalies(dataset: &Dataset, thresholds: &Thresholds, out: &mut Vec<Anomaly>) {
    if dataset.row_count() <= thresholds.min_rows_for_temporal {
        return;
    }
    let period = thresholds.temporal_period;

    for date_col in dataset.columns_of_kind(ColumnKind::Temporal) {
        let Some(stamps) = date_col.timestamps() else {
            continue;
        };
        for metric in dataset.columns_of_kind(ColumnKind::Numeric) {
            let Some(values) = metric.f64() else {
                continue;
            };

            let mut totals: BTreeMap<NaiveDate, f64> = BTreeMap::new();
            for (stamp, value) in stamps.into_iter().zip(values) {
                if let (Some(stamp), Some(value)) = (stamp, value)
                    && let Some(start) = period_start(stamp, period)
                {
                    *totals.entry(start).or_insert(0.0) += value;
                }
            }
            if totals.len() < MIN_PERIODS {
                continue;
            }

            let periods: Vec<(NaiveDate, f64)> = totals.into_iter().collect();
            let deltas: Vec<f64> = periods
                .windows(2)
                .map(|w| match w {
                    [(_, prev), (_, next)] => next - prev,
                    _ => 0.0,
                })
                .collect();

            let flagged = irregular_deltas(
                &deltas,
                thresholds.temporal_window,
                thresholds.temporal_spread_multiplier,
            );
            if flagged.is_empty() {
                continue;
            }

            // Delta k ends at period k + 1.
            let labels: Vec<String> = flagged
                .iter()
                .filter_map(|k| periods.get(k + 1))
                .map(|(start, _)| period_label(*start, period))
                .collect();
            let label_refs: Vec<&str> = labels.iter().map(String::as_str).collect();

            let count = flagged.len();
            let percentage = stats::percentage(count, periods.len());
            let metric_name = metric.name();
            out.push(Anomaly {
                kind: AnomalyKind::TemporalAnomaly,
                column: format!("{metric_name} (by {})", date_col.name()),
                title: format!("Temporal anomaly in {metric_name}"),
                description: format!(
                    "{count} of {} {} totals of {metric_name} changed unusually sharply: {}.",
                    periods.len(),
                    period.as_str(),
                    list_labels(&label_refs)
                ),
                count,
                percentage,
                severity: Severity::from_percentage(percentage),
                guidance: Some(Guidance::new(
                    format!(
                        "The {} total of {metric_name} jumped or dropped sharply in {count} \
                         period(s).",
                        period.as_str()
                    ),
                    "Sudden changes over time can signal data collection problems or real \
                     events worth explaining.",
                    "Look at what happened in the flagged periods before trusting the trend.",
                )),
            });
        }
    }
}

fn list_labels(labels: &[&str]) -> String {
    let shown: Vec<&str> = labels.iter().take(MAX_LISTED).copied().collect();
    let mut text = shown.join(", ");
    if labels.len() > MAX_LISTED {
        text.push_str(&format!(" and {} more", labels.len() - MAX_LISTED));
    }
    text
}

#[cfg(test)]
mod tests {
    #![expect(clippy::unwrap_used)]
    use super::*;
    use crate::dataset::Column;

    const DAY_MS: i64 = 86_400_000;

    fn detect(columns: Vec<Column>) -> Vec<Anomaly> {
        let ds = Dataset::new(columns).unwrap();
        detect_anomalies(&ds, &Thresholds::default())
    }

    fn of_kind(all: &[Anomaly], kind: AnomalyKind) -> Vec<&Anomaly> {
        all.iter().filter(|a| a.kind == kind).collect()
    }

    #[test]
    fn test_iqr_flags_extreme_value() {
        let all = detect(vec![Column::from_f64("A", &[1.0, 2.0, 3.0, 4.0, 100.0])]);
        let iqr = of_kind(&all, AnomalyKind::IqrOutlier);
        let a = iqr.first().unwrap();
        assert_eq!(a.column, "A");
        assert_eq!(a.count, 1);
        assert!((a.percentage - 20.0).abs() < 1e-9);
        assert_eq!(a.severity, Severity::Low);
    }

    #[test]
    fn test_zscore_outlier_in_large_column() {
        let mut values = vec![10.0; 200];
        for (i, v) in values.iter_mut().enumerate() {
            *v += (i % 5) as f64;
        }
        values.push(500.0);
        let all = detect(vec![Column::from_f64("x", &values)]);
        let z = of_kind(&all, AnomalyKind::ZScoreOutlier);
        let a = z.first().unwrap();
        assert_eq!(a.count, 1);
        assert_eq!(a.severity, Severity::High);
    }

    #[test]
    fn test_zero_variance_yields_nothing() {
        let all = detect(vec![Column::from_f64("flat", &[3.0; 50])]);
        assert!(all.is_empty());
    }

    #[test]
    fn test_too_few_values_skip_outlier_checks() {
        let all = detect(vec![Column::from_f64("x", &[1.0, 2.0, 1000.0])]);
        assert!(all.is_empty());
    }

    #[test]
    fn test_sparse_minority_categories() {
        let mut values = vec!["common"; 18];
        values.extend(["rare1", "rare2"]);
        let all = detect(vec![Column::from_strs("c", &values)]);
        let sparse = of_kind(&all, AnomalyKind::SparseCategory);
        let a = sparse.first().unwrap();
        assert_eq!(a.count, 2);
        assert!((a.percentage - 10.0).abs() < 1e-9);
        assert!(a.description.contains("rare1, rare2"));
    }

    #[test]
    fn test_balanced_categories_are_not_sparse() {
        let all = detect(vec![Column::from_strs("c", &["a", "a", "b", "b", "c", "c"])]);
        assert!(of_kind(&all, AnomalyKind::SparseCategory).is_empty());
    }

    #[test]
    fn test_small_categories_below_the_leader_are_sparse() {
        let all = detect(vec![Column::from_strs("c", &["a", "a", "b", "b", "c"])]);
        let sparse = of_kind(&all, AnomalyKind::SparseCategory);
        let a = sparse.first().unwrap();
        assert_eq!(a.count, 1);
        assert!(a.description.contains(": c."), "{}", a.description);
    }

    #[test]
    fn test_outliers_carry_guidance() {
        let all = detect(vec![Column::from_f64("A", &[1.0, 2.0, 3.0, 4.0, 100.0])]);
        let iqr = of_kind(&all, AnomalyKind::IqrOutlier);
        let guidance = iqr.first().unwrap().guidance.as_ref().unwrap();
        assert!(guidance.explanation.starts_with("In the 'A' column, 1 values"));
        assert!(guidance.action.contains("1 values"));
    }

    #[test]
    fn test_irregular_deltas() {
        let deltas = [2.0, -1.0, 2.0, -1.0, 2.0, -1.0, 87.0, -86.0, 1.0];
        let flagged = irregular_deltas(&deltas, 7, 3.0);
        assert!(flagged.contains(&6));
        assert!(!flagged.contains(&3));
        assert!(irregular_deltas(&[0.0; 8], 7, 3.0).is_empty());
    }

    #[test]
    fn test_temporal_spike() {
        let sales = [10.0, 12.0, 11.0, 13.0, 12.0, 14.0, 13.0, 100.0, 14.0, 15.0, 14.0, 16.0];
        let days: Vec<Option<i64>> = (0..sales.len() as i64).map(|d| Some(d * DAY_MS)).collect();
        let all = detect(vec![
            Column::temporal("date", days),
            Column::from_f64("sales", &sales),
        ]);
        let temporal = of_kind(&all, AnomalyKind::TemporalAnomaly);
        let a = temporal.first().unwrap();
        assert_eq!(a.column, "sales (by date)");
        assert!(a.description.contains("1970-01-08"), "{}", a.description);
    }

    #[test]
    fn test_temporal_skipped_below_min_rows() {
        let days: Vec<Option<i64>> = (0..6).map(|d| Some(d * DAY_MS)).collect();
        let all = detect(vec![
            Column::temporal("date", days),
            Column::from_f64("v", &[1.0, 1.0, 1.0, 1.0, 1.0, 90.0]),
        ]);
        assert!(of_kind(&all, AnomalyKind::TemporalAnomaly).is_empty());
    }

    #[test]
    fn test_temporal_needs_more_than_min_rows() {
        // The same spike is flagged at twelve rows; ten rows is not enough.
        let sales = [10.0, 12.0, 11.0, 13.0, 12.0, 14.0, 13.0, 100.0, 14.0, 15.0];
        let days: Vec<Option<i64>> = (0..10).map(|d| Some(d * DAY_MS)).collect();
        let ds = Dataset::new(vec![
            Column::temporal("date", days),
            Column::from_f64("sales", &sales),
        ])
        .unwrap();
        let thresholds = Thresholds::default();
        assert_eq!(ds.row_count(), thresholds.min_rows_for_temporal);
        let all = detect_anomalies(&ds, &thresholds);
        assert!(of_kind(&all, AnomalyKind::TemporalAnomaly).is_empty());
    }

    #[test]
    fn test_period_bucketing() {
        // 1970-01-01 was a Thursday.
        let week = period_start(0, TemporalPeriod::Week).unwrap();
        assert_eq!(week.to_string(), "1969-12-29");
        let month = period_start(40 * DAY_MS, TemporalPeriod::Month).unwrap();
        assert_eq!(period_label(month, TemporalPeriod::Month), "1970-02");
    }

    #[test]
    fn test_single_row_and_empty() {
        assert!(detect(vec![Column::from_f64("x", &[1.0])]).is_empty());
        assert!(detect_anomalies(&Dataset::empty(), &Thresholds::default()).is_empty());
    }
}
