//! End-to-end runs of the analysis pipeline on small in-memory datasets.

#![expect(clippy::unwrap_used)]

use datasight::analyser::{AnomalyKind, InsightKind, Severity, detect_anomalies};
use datasight::config::{AnalysisConfig, Thresholds};
use datasight::dataset::{Column, Dataset};
use datasight::pipeline::{BranchRoute, ExecutionStatus, Pipeline, WorkflowState};
use std::sync::Arc;

fn correlated_pair() -> Dataset {
    Dataset::new(vec![
        Column::from_f64("A", &[1.0, 2.0, 3.0, 4.0, 100.0]),
        Column::from_f64("B", &[10.0, 20.0, 30.0, 40.0, 50.0]),
    ])
    .unwrap()
}

#[test]
fn test_correlation_and_iqr_outlier() {
    let state = Pipeline::default().run(correlated_pair());
    assert_eq!(state.execution_status(), ExecutionStatus::Completed);

    let insights = state.insight_result().unwrap();
    let correlation = insights
        .iter()
        .find(|i| i.kind == InsightKind::Correlation)
        .expect("A and B should correlate above 0.7");
    assert_eq!(correlation.columns, vec!["A", "B"]);
    assert!(correlation.value.unwrap() > 0.7);

    let anomalies = state.anomaly_result().unwrap();
    let iqr = anomalies
        .iter()
        .find(|a| a.kind == AnomalyKind::IqrOutlier && a.column == "A")
        .expect("100 lies above Q3 + 1.5 IQR");
    assert_eq!(iqr.count, 1);

    let profile = state.profile_result().unwrap();
    assert_eq!(profile.column("A").unwrap().numeric().unwrap().outlier_count, 1);
}

#[test]
fn test_dominant_category_is_imbalanced_and_sparse() {
    let mut values = vec!["north"; 18];
    values.extend(["east", "west"]);
    let ds = Dataset::new(vec![Column::from_strs("region", &values)]).unwrap();

    let state = Pipeline::default().run(ds);

    let imbalance = state
        .insight_result()
        .unwrap()
        .iter()
        .find(|i| i.kind == InsightKind::Imbalance)
        .expect("90% of rows share one value");
    assert_eq!(imbalance.columns, vec!["region"]);

    let sparse = state
        .anomaly_result()
        .unwrap()
        .iter()
        .find(|a| a.kind == AnomalyKind::SparseCategory)
        .expect("the two minority values are rare");
    assert_eq!(sparse.column, "region");
    assert_eq!(sparse.count, 2);
    assert!(sparse.description.contains("east"));
    assert!(sparse.description.contains("west"));
}

/// 200 rows cycling 10..=14 with the first `outliers` rows replaced by 1000.
fn spiked_column(outliers: usize) -> Dataset {
    let values: Vec<f64> = (0..200)
        .map(|i| if i < outliers { 1000.0 } else { 10.0 + (i % 5) as f64 })
        .collect();
    Dataset::new(vec![Column::from_f64("amount", &values)]).unwrap()
}

#[test]
fn test_outlier_severity_falls_as_outliers_grow() {
    let thresholds = Thresholds::default();
    let mut tiers = Vec::new();

    for outliers in [1, 4, 12] {
        let anomalies = detect_anomalies(&spiked_column(outliers), &thresholds);
        for kind in [AnomalyKind::IqrOutlier, AnomalyKind::ZScoreOutlier] {
            let found = anomalies
                .iter()
                .find(|a| a.kind == kind)
                .unwrap_or_else(|| panic!("{kind} missing with {outliers} outliers"));
            assert_eq!(found.count, outliers);
            assert!(found.guidance.is_some());
        }
        let iqr = anomalies.iter().find(|a| a.kind == AnomalyKind::IqrOutlier).unwrap();
        tiers.push(iqr.severity);
    }

    assert_eq!(tiers, vec![Severity::High, Severity::Medium, Severity::Low]);
}

#[test]
fn test_single_row_completes_with_empty_anomalies() {
    let ds = Dataset::new(vec![
        Column::from_f64("x", &[42.0]),
        Column::from_strs("label", &["only"]),
    ])
    .unwrap();

    let state = Pipeline::default().run(ds);

    assert!(state.execution_status().is_terminal());
    assert_eq!(state.workflow_state(), WorkflowState::Done);
    assert_eq!(state.anomaly_result(), Some(&[][..]));
    assert!(state.summary_result().is_some());
}

#[test]
fn test_disabled_visualizations_still_finish() {
    let rows: Vec<f64> = (0..50).map(f64::from).collect();
    let ds = Dataset::new(vec![Column::from_f64("v", &rows)]).unwrap();
    let config = AnalysisConfig {
        enable_visualizations: false,
        ..AnalysisConfig::default()
    };

    let state = Pipeline::new(config).run(ds);

    assert!(state.visualization_result().is_none());
    assert_eq!(state.branch().unwrap().route, BranchRoute::Skip);
    assert_eq!(state.workflow_state(), WorkflowState::Done);
    assert_eq!(state.execution_status(), ExecutionStatus::Completed);
    assert_eq!(state.stage_records().len(), 4);
}

#[test]
fn test_enough_rows_visualize() {
    let a: Vec<f64> = (0..12).map(f64::from).collect();
    let b: Vec<f64> = a.iter().map(|x| x * 3.0 + 1.0).collect();
    let ds = Dataset::new(vec![Column::from_f64("a", &a), Column::from_f64("b", &b)]).unwrap();

    let state = Pipeline::default().run(ds);

    let charts = state.visualization_result().unwrap();
    assert!(!charts.is_empty());
    assert_eq!(state.branch().unwrap().route, BranchRoute::Visualize);
}

#[test]
fn test_runs_are_idempotent() {
    let ds = Arc::new(correlated_pair());
    let pipeline = Pipeline::default();

    let first = pipeline.run(Arc::clone(&ds));
    let second = pipeline.run(ds);

    assert_eq!(first.profile_result(), second.profile_result());
    assert_eq!(first.insight_result(), second.insight_result());
    assert_eq!(first.anomaly_result(), second.anomaly_result());
    assert_eq!(first.summary_result(), second.summary_result());
}

#[test]
fn test_empty_dataset_degrades() {
    let state = Pipeline::default().run(Dataset::empty());

    assert_eq!(state.execution_status(), ExecutionStatus::CompletedWithErrors);
    assert_eq!(state.workflow_state(), WorkflowState::Done);
    assert!(state.error().is_some());
    assert!(state.profile_result().is_some());
    assert_eq!(state.insight_result(), Some(&[][..]));
    assert_eq!(state.anomaly_result(), Some(&[][..]));
}
