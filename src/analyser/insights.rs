//! Pattern extraction. Each check appends [`Insight`] records in discovery
//! order; nothing here sorts by confidence.

use super::stats;
use super::types::{Guidance, Insight, InsightKind};
use crate::config::Thresholds;
use crate::dataset::{Column, ColumnKind, Dataset};
use polars::prelude::Float64Chunked;

/// |r| at or above which a correlation is described as strong.
const STRONG_CORRELATION: f64 = 0.85;
/// |r| at or above which a correlation is described as very strong.
const VERY_STRONG_CORRELATION: f64 = 0.95;
/// Skewness magnitude that maps to full confidence.
const SKEW_FULL_CONFIDENCE: f64 = 3.0;
/// Percentage (missing or duplicated) that maps to full confidence.
const PCT_FULL_CONFIDENCE: f64 = 50.0;
/// Minimum rows where two columns are both null before co-missingness counts.
const MIN_CO_MISSING_ROWS: usize = 2;
/// Minimum Jaccard overlap of two null masks for a systematic pattern.
const MIN_CO_MISSING_OVERLAP: f64 = 0.5;

pub fn generate_insights(dataset: &Dataset, thresholds: &Thresholds) -> Vec<Insight> {
    let mut insights = Vec::new();
    if dataset.is_empty() {
        return insights;
    }

    correlation_insights(dataset, thresholds, &mut insights);
    distribution_insights(dataset, thresholds, &mut insights);
    imbalance_insights(dataset, thresholds, &mut insights);
    missing_data_insights(dataset, thresholds, &mut insights);
    duplicate_insights(dataset, &mut insights);

    tracing::debug!(count = insights.len(), "Generated insights");
    insights
}

pub fn correlation_strength(abs_r: f64) -> &'static str {
    if abs_r >= VERY_STRONG_CORRELATION {
        "very strong"
    } else if abs_r >= STRONG_CORRELATION {
        "strong"
    } else {
        "moderate"
    }
}

fn correlation_insights(dataset: &Dataset, thresholds: &Thresholds, out: &mut Vec<Insight>) {
    let numeric: Vec<(&str, &Float64Chunked)> = dataset
        .columns()
        .iter()
        .filter_map(|c| c.f64().map(|ca| (c.name(), ca)))
        .collect();

    for (i, (name_a, a)) in numeric.iter().enumerate() {
        for (name_b, b) in numeric.iter().skip(i + 1) {
            let Some(r) = stats::pearson(a, b) else {
                continue;
            };
            if r.abs() <= thresholds.correlation {
                continue;
            }

            let strength = correlation_strength(r.abs());
            let (direction, tendency, movement) = if r > 0.0 {
                ("positive", "increase", "up")
            } else {
                ("negative", "decrease", "down")
            };
            let p_value = stats::correlation_p_value(r, stats::complete_pairs(a, b));
            let significance = match p_value {
                Some(p) if p < 0.05 => format!("p = {p:.4}, significant"),
                Some(p) => format!("p = {p:.4}, not significant"),
                None => "too few rows for a p-value".to_owned(),
            };
            out.push(Insight {
                kind: InsightKind::Correlation,
                title: format!("{} {direction} correlation: {name_a} and {name_b}", capitalize(strength)),
                description: format!(
                    "{name_a} and {name_b} have a {strength} {direction} correlation \
                     (r = {r:.3}, {significance}). As {name_a} increases, {name_b} tends \
                     to {tendency}."
                ),
                confidence: r.abs(),
                value: Some(r),
                columns: vec![(*name_a).to_owned(), (*name_b).to_owned()],
                p_value,
                guidance: Some(Guidance::new(
                    format!("When {name_a} goes up, {name_b} usually goes {movement}."),
                    format!("The two columns tend to {tendency} together proportionally."),
                    "Consider using one to predict the other, or investigate the underlying \
                     relationship.",
                )),
            });
        }
    }
}

fn distribution_insights(dataset: &Dataset, thresholds: &Thresholds, out: &mut Vec<Insight>) {
    for column in dataset.columns_of_kind(ColumnKind::Numeric) {
        let Some(skew) = column.f64().and_then(stats::skewness) else {
            continue;
        };
        if skew.abs() < thresholds.skew {
            continue;
        }

        let name = column.name();
        let (shape, detail) = if skew > 0.0 {
            ("Right-skewed", "most values are low with a long tail of high values")
        } else {
            ("Left-skewed", "most values are high with a long tail of low values")
        };
        out.push(Insight {
            kind: InsightKind::Distribution,
            title: format!("{shape} distribution: {name}"),
            description: format!("{name} has skewness {skew:.2}; {detail}."),
            confidence: (skew.abs() / SKEW_FULL_CONFIDENCE).min(1.0),
            value: Some(skew),
            columns: vec![name.to_owned()],
            p_value: None,
            guidance: Some(Guidance::new(
                format!("Values in {name} are not spread evenly around the average."),
                "Averages of skewed data are pulled toward the tail and can mislead.",
                "Prefer the median for summaries, or apply a log transform before modelling.",
            )),
        });
    }
}

fn imbalance_insights(dataset: &Dataset, thresholds: &Thresholds, out: &mut Vec<Insight>) {
    let rows = dataset.row_count();
    for column in dataset.columns_of_kind(ColumnKind::Categorical) {
        let Some(counts) = column.str().map(stats::value_counts) else {
            continue;
        };
        if counts.len() < 2 {
            continue;
        }
        let Some(top) = counts.first() else {
            continue;
        };

        let share = top.count as f64 / rows as f64;
        if share <= thresholds.dominance {
            continue;
        }

        let name = column.name();
        out.push(Insight {
            kind: InsightKind::Imbalance,
            title: format!("Imbalanced categories: {name}"),
            description: format!(
                "'{}' accounts for {:.1}% of rows in {name} ({} of {rows}), across {} categories.",
                top.value,
                share * 100.0,
                top.count,
                counts.len()
            ),
            confidence: share.min(1.0),
            value: Some(share),
            columns: vec![name.to_owned()],
            p_value: None,
            guidance: Some(Guidance::new(
                format!("Most rows in {name} share the same value, '{}'.", top.value),
                "Rare categories have too few rows for reliable comparisons.",
                "Group rare categories together, or rebalance before training a classifier.",
            )),
        });
    }
}

fn missing_data_insights(dataset: &Dataset, thresholds: &Thresholds, out: &mut Vec<Insight>) {
    let rows = dataset.row_count();

    for column in dataset.columns() {
        let pct = stats::percentage(column.null_count(), rows);
        if pct <= thresholds.missing_pct {
            continue;
        }
        let name = column.name();
        out.push(Insight {
            kind: InsightKind::MissingData,
            title: format!("Missing data: {name}"),
            description: format!(
                "{name} is missing {pct:.1}% of its values ({} of {rows} rows).",
                column.null_count()
            ),
            confidence: (pct / PCT_FULL_CONFIDENCE).min(1.0),
            value: Some(pct),
            columns: vec![name.to_owned()],
            p_value: None,
            guidance: Some(Guidance::new(
                format!("{name} is empty in {pct:.1}% of rows."),
                "Gaps shrink the usable sample and can bias any analysis of this column.",
                "Find out why values are missing, then fill, flag or drop them.",
            )),
        });
    }

    if let Some(pattern) = co_missing_insight(dataset) {
        out.push(pattern);
    }
}

struct CoMissing<'a> {
    a: &'a str,
    b: &'a str,
    both: usize,
    overlap: f64,
}

/// Column pairs whose nulls land on the same rows more often than chance.
fn co_missing_pairs(dataset: &Dataset) -> Vec<CoMissing<'_>> {
    let rows = dataset.row_count();
    let with_nulls: Vec<&Column> = dataset
        .columns()
        .iter()
        .filter(|c| c.null_count() > 0)
        .collect();

    let mut pairs = Vec::new();
    for (i, a) in with_nulls.iter().enumerate() {
        for b in with_nulls.iter().skip(i + 1) {
            let both = (&a.null_mask() & &b.null_mask()).num_trues();
            if both < MIN_CO_MISSING_ROWS {
                continue;
            }
            let (na, nb) = (a.null_count(), b.null_count());
            let expected = (na * nb) as f64 / rows as f64;
            let overlap = both as f64 / (na + nb - both) as f64;
            if both as f64 > expected && overlap >= MIN_CO_MISSING_OVERLAP {
                pairs.push(CoMissing {
                    a: a.name(),
                    b: b.name(),
                    both,
                    overlap,
                });
            }
        }
    }
    pairs
}

fn co_missing_insight(dataset: &Dataset) -> Option<Insight> {
    let pairs = co_missing_pairs(dataset);
    let max_overlap = pairs.iter().map(|p| p.overlap).reduce(f64::max)?;

    let listed: Vec<String> = pairs
        .iter()
        .map(|p| format!("{} & {} ({} rows)", p.a, p.b, p.both))
        .collect();
    let mut columns: Vec<String> = Vec::new();
    for p in &pairs {
        for name in [p.a, p.b] {
            if !columns.iter().any(|c| c == name) {
                columns.push(name.to_owned());
            }
        }
    }

    Some(Insight {
        kind: InsightKind::MissingData,
        title: "Systematic missing-data pattern".to_owned(),
        description: format!(
            "Missing values co-occur across {} column pair(s): {}.",
            pairs.len(),
            listed.join(", ")
        ),
        confidence: max_overlap.min(1.0),
        value: Some(pairs.len() as f64),
        columns,
        p_value: None,
        guidance: Some(Guidance::new(
            "Some columns tend to be empty on the same rows.",
            "Values missing together usually share a cause, such as an optional form section.",
            "Check how these fields are collected before filling them independently.",
        )),
    })
}

fn duplicate_insights(dataset: &Dataset, out: &mut Vec<Insight>) {
    let duplicates = dataset.duplicate_row_count();
    if duplicates == 0 {
        return;
    }
    let pct = stats::percentage(duplicates, dataset.row_count());
    out.push(Insight {
        kind: InsightKind::Duplicates,
        title: "Duplicate rows".to_owned(),
        description: format!(
            "{duplicates} rows ({pct:.1}%) are exact duplicates of an earlier row."
        ),
        confidence: (pct / PCT_FULL_CONFIDENCE).min(1.0),
        value: Some(duplicates as f64),
        columns: Vec::new(),
        p_value: None,
        guidance: Some(Guidance::new(
            format!("{duplicates} rows repeat an earlier row exactly."),
            "Duplicates inflate counts and give repeated records extra weight.",
            "Confirm whether repeats are real events; otherwise deduplicate.",
        )),
    });
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    #![expect(clippy::unwrap_used)]
    use super::*;

    fn insights(columns: Vec<Column>) -> Vec<Insight> {
        let ds = Dataset::new(columns).unwrap();
        generate_insights(&ds, &Thresholds::default())
    }

    fn of_kind(all: &[Insight], kind: InsightKind) -> Vec<&Insight> {
        all.iter().filter(|i| i.kind == kind).collect()
    }

    #[test]
    fn test_correlation_between_a_and_b() {
        let all = insights(vec![
            Column::from_f64("A", &[1.0, 2.0, 3.0, 4.0, 100.0]),
            Column::from_f64("B", &[10.0, 20.0, 30.0, 40.0, 50.0]),
        ]);
        let corr = of_kind(&all, InsightKind::Correlation);
        assert_eq!(corr.len(), 1);
        let insight = corr.first().unwrap();
        assert!(insight.confidence > 0.7 && insight.confidence < 0.75);
        assert!(insight.description.contains("moderate positive"));
        assert_eq!(insight.columns, vec!["A".to_owned(), "B".to_owned()]);
        // Five rows are not enough for r = 0.72 to be significant.
        assert_eq!(insight.is_significant(), Some(false));
        assert!(insight.description.contains("not significant"));
    }

    #[test]
    fn test_correlation_p_value_and_guidance() {
        let x: Vec<f64> = (0..30).map(f64::from).collect();
        let y: Vec<f64> = (0..30).map(|i| f64::from(i) * 2.0 + f64::from(i % 3)).collect();
        let all = insights(vec![Column::from_f64("x", &x), Column::from_f64("y", &y)]);
        let corr = of_kind(&all, InsightKind::Correlation);
        let insight = corr.first().unwrap();
        assert!(insight.p_value.unwrap() < 1e-6);
        assert_eq!(insight.is_significant(), Some(true));
        let guidance = insight.guidance.as_ref().unwrap();
        assert!(guidance.explanation.contains("goes up"));
        assert!(guidance.action.contains("predict"));
    }

    #[test]
    fn test_every_insight_carries_guidance() {
        let a: Vec<Option<f64>> = (0..10).map(|i| (i >= 3).then_some(f64::from(i))).collect();
        let mut colour = vec!["red"; 9];
        colour.push("blue");
        let all = insights(vec![
            Column::numeric("a", a),
            Column::from_strs("colour", &colour),
            Column::from_f64("skewed", &[1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 2.0, 40.0]),
        ]);
        assert!(!all.is_empty());
        assert!(all.iter().all(|i| i.guidance.is_some()));
        assert!(
            all.iter()
                .filter(|i| i.kind != InsightKind::Correlation)
                .all(|i| i.p_value.is_none())
        );
    }

    #[test]
    fn test_negative_very_strong_correlation() {
        let all = insights(vec![
            Column::from_f64("x", &[1.0, 2.0, 3.0, 4.0]),
            Column::from_f64("y", &[8.0, 6.0, 4.0, 2.0]),
        ]);
        let corr = of_kind(&all, InsightKind::Correlation);
        let insight = corr.first().unwrap();
        assert!((insight.value.unwrap() + 1.0).abs() < 1e-9);
        assert!(insight.title.starts_with("Very strong negative"));
    }

    #[test]
    fn test_skewed_distribution() {
        let all = insights(vec![Column::from_f64(
            "income",
            &[1.0, 1.0, 1.0, 2.0, 2.0, 3.0, 10.0],
        )]);
        let dist = of_kind(&all, InsightKind::Distribution);
        assert_eq!(dist.len(), 1);
        assert!(dist.first().unwrap().title.starts_with("Right-skewed"));
    }

    #[test]
    fn test_symmetric_distribution_is_silent() {
        let all = insights(vec![Column::from_f64("x", &[1.0, 2.0, 3.0, 4.0, 5.0])]);
        assert!(of_kind(&all, InsightKind::Distribution).is_empty());
    }

    #[test]
    fn test_imbalance_names_dominant_value() {
        let mut values = vec!["red"; 18];
        values.extend(["blue", "green"]);
        let all = insights(vec![Column::from_strs("colour", &values)]);
        let imbalance = of_kind(&all, InsightKind::Imbalance);
        let insight = imbalance.first().unwrap();
        assert!(insight.description.starts_with("'red' accounts for 90.0%"));
        assert!((insight.confidence - 0.9).abs() < 1e-9);
    }

    #[test]
    fn test_single_category_is_not_imbalance() {
        let all = insights(vec![Column::from_strs("c", &["x", "x", "x"])]);
        assert!(of_kind(&all, InsightKind::Imbalance).is_empty());
    }

    #[test]
    fn test_missing_data_and_co_missing_pattern() {
        let a: Vec<Option<f64>> = (0..10).map(|i| (i >= 3).then_some(i as f64)).collect();
        let b: Vec<Option<String>> = (0..10).map(|i| (i >= 3).then(|| format!("v{}", i % 2))).collect();
        let all = insights(vec![Column::numeric("a", a), Column::categorical("b", b)]);
        let missing = of_kind(&all, InsightKind::MissingData);
        assert_eq!(missing.len(), 3);
        let pattern = missing.last().unwrap();
        assert_eq!(pattern.title, "Systematic missing-data pattern");
        assert!((pattern.confidence - 1.0).abs() < 1e-9);
        assert!(pattern.description.contains("a & b (3 rows)"));
    }

    #[test]
    fn test_duplicates() {
        let all = insights(vec![Column::from_f64("x", &[1.0, 1.0, 2.0, 3.0])]);
        let dup = of_kind(&all, InsightKind::Duplicates);
        let insight = dup.first().unwrap();
        assert_eq!(insight.value, Some(1.0));
        assert!((insight.confidence - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_tiny_and_empty_inputs() {
        assert!(insights(vec![Column::from_f64("x", &[1.0])]).is_empty());
        assert!(generate_insights(&Dataset::empty(), &Thresholds::default()).is_empty());
    }

    #[test]
    fn test_strength_tiers() {
        assert_eq!(correlation_strength(0.75), "moderate");
        assert_eq!(correlation_strength(0.85), "strong");
        assert_eq!(correlation_strength(0.97), "very strong");
    }
}
