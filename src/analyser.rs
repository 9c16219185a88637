//! The three quantitative analyses: profiling, insight extraction and
//! anomaly detection.
//!
//! Each analysis is a pure function of a [`Dataset`](crate::dataset::Dataset)
//! and the configured [`Thresholds`](crate::config::Thresholds). The
//! pipeline stages in [`crate::pipeline::stages`] wrap them.

pub mod anomalies;
pub mod insights;
pub mod profile;
pub mod recommend;
pub mod stats;
pub mod types;

pub use anomalies::detect_anomalies;
pub use insights::generate_insights;
pub use profile::profile_dataset;
pub use types::{
    Anomaly, AnomalyKind, ColumnProfile, ColumnRecommendations, ColumnStats, Guidance, Insight,
    InsightKind, ProfileResult, Severity, TargetSuggestion,
};
