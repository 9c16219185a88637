//! Analysis configuration.
//!
//! Every option has a default, so an empty JSON object (or no file at all)
//! yields a usable configuration. Thresholds are grouped in [`Thresholds`].

use crate::error::{AnalysisError, Result, ResultExt as _};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Bucketing used when turning a datetime column into periods.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemporalPeriod {
    #[default]
    Day,
    Week,
    Month,
}

impl TemporalPeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Day => "daily",
            Self::Week => "weekly",
            Self::Month => "monthly",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Minimum |r| for a correlation insight.
    pub correlation: f64,
    /// |skew| at or above which a distribution counts as skewed.
    pub skew: f64,
    /// Share of the most frequent category above which a column is imbalanced.
    pub dominance: f64,
    /// Categories below this percentage of rows are sparse.
    pub sparse_category_pct: f64,
    /// Categories with fewer occurrences than this are sparse regardless of size.
    pub sparse_category_min_count: usize,
    pub z_score: f64,
    pub iqr_multiplier: f64,
    /// Null percentage above which a column gets a missing-data insight.
    pub missing_pct: f64,
    /// Null percentage above which profiling raises a quality issue.
    pub quality_null_pct: f64,
    /// Category share above which profiling raises a dominance quality issue.
    pub quality_dominance: f64,
    /// Below this many non-null values, outlier and category checks are skipped.
    pub min_rows_for_outliers: usize,
    /// Temporal checks need more than this many rows.
    pub min_rows_for_temporal: usize,
    pub temporal_spread_multiplier: f64,
    /// Number of trailing period deltas a delta is compared against.
    pub temporal_window: usize,
    pub temporal_period: TemporalPeriod,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            correlation: 0.7,
            skew: 0.5,
            dominance: 0.4,
            sparse_category_pct: 1.0,
            sparse_category_min_count: 3,
            z_score: 3.0,
            iqr_multiplier: 1.5,
            missing_pct: 10.0,
            quality_null_pct: 50.0,
            quality_dominance: 0.9,
            min_rows_for_outliers: 4,
            min_rows_for_temporal: 10,
            temporal_spread_multiplier: 3.0,
            temporal_window: 7,
            temporal_period: TemporalPeriod::Day,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub enable_visualizations: bool,
    pub min_rows_for_visualization: usize,
    pub thresholds: Thresholds,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            enable_visualizations: true,
            min_rows_for_visualization: 10,
            thresholds: Thresholds::default(),
        }
    }
}

impl AnalysisConfig {
    /// Read a JSON configuration file and validate it.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let t = &self.thresholds;
        let fraction_checks = [
            ("correlation", t.correlation),
            ("dominance", t.dominance),
            ("quality_dominance", t.quality_dominance),
        ];
        for (name, value) in fraction_checks {
            if !(value > 0.0 && value <= 1.0) {
                return Err(AnalysisError::Config(format!(
                    "thresholds.{name} must be in (0, 1], got {value}"
                )));
            }
        }

        let percent_checks = [
            ("sparse_category_pct", t.sparse_category_pct),
            ("missing_pct", t.missing_pct),
            ("quality_null_pct", t.quality_null_pct),
        ];
        for (name, value) in percent_checks {
            if !(0.0..=100.0).contains(&value) {
                return Err(AnalysisError::Config(format!(
                    "thresholds.{name} must be a percentage in [0, 100], got {value}"
                )));
            }
        }

        let positive_checks = [
            ("skew", t.skew),
            ("z_score", t.z_score),
            ("iqr_multiplier", t.iqr_multiplier),
            ("temporal_spread_multiplier", t.temporal_spread_multiplier),
        ];
        for (name, value) in positive_checks {
            if !(value.is_finite() && value > 0.0) {
                return Err(AnalysisError::Config(format!(
                    "thresholds.{name} must be a positive number, got {value}"
                )));
            }
        }

        if t.temporal_window < 2 {
            return Err(AnalysisError::Config(format!(
                "thresholds.temporal_window must be at least 2, got {}",
                t.temporal_window
            )));
        }

        Ok(())
    }
}
