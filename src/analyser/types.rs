use crate::dataset::ColumnKind;
use serde::{Deserialize, Serialize};
use std::fmt;

// PROFILE

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatasetOverview {
    pub row_count: usize,
    pub column_count: usize,
    pub memory_bytes: usize,
}

impl DatasetOverview {
    pub fn memory_mb(&self) -> f64 {
        self.memory_bytes as f64 / 1_048_576.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueCount {
    pub value: String,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NumericStats {
    pub mean: Option<f64>,
    pub median: Option<f64>,
    pub std_dev: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub q1: Option<f64>,
    pub q3: Option<f64>,
    /// Values outside the IQR fence.
    pub outlier_count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoricalStats {
    pub unique_count: usize,
    pub top_values: Vec<ValueCount>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TemporalStats {
    pub min: Option<String>,
    pub max: Option<String>,
    pub unique_count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BooleanStats {
    pub true_count: usize,
    pub false_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ColumnStats {
    Numeric(NumericStats),
    Categorical(CategoricalStats),
    Temporal(TemporalStats),
    Boolean(BooleanStats),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnProfile {
    pub name: String,
    pub kind: ColumnKind,
    pub null_count: usize,
    pub null_pct: f64,
    pub stats: ColumnStats,
}

impl ColumnProfile {
    pub fn numeric(&self) -> Option<&NumericStats> {
        match &self.stats {
            ColumnStats::Numeric(s) => Some(s),
            _ => None,
        }
    }

    pub fn categorical(&self) -> Option<&CategoricalStats> {
        match &self.stats {
            ColumnStats::Categorical(s) => Some(s),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QualityScore {
    /// 0-100, higher is cleaner.
    pub score: f64,
    pub missing_pct: f64,
    pub duplicate_pct: f64,
    pub outlier_pct: f64,
    pub total_missing: usize,
    pub total_duplicates: usize,
    pub total_outliers: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColumnRoles {
    pub numeric: Vec<String>,
    pub categorical: Vec<String>,
    pub date: Vec<String>,
    pub id: Vec<String>,
    pub constant: Vec<String>,
}

/// A column judged suitable for a use, with the reasons that scored it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnRecommendation {
    pub column: String,
    pub kind: ColumnKind,
    pub score: u32,
    pub reasons: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleaningRecommendation {
    pub column: String,
    /// Sum of the weights of `issues`; higher needs attention first.
    pub severity: u32,
    pub issues: Vec<String>,
}

/// Rule-based advice on how to use each column. Every list is ordered by
/// descending score (or severity); ties keep column order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColumnRecommendations {
    pub best_for_visualization: Vec<ColumnRecommendation>,
    pub best_for_grouping: Vec<ColumnRecommendation>,
    pub columns_to_clean: Vec<CleaningRecommendation>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionConfidence {
    Low,
    Medium,
    High,
}

impl SuggestionConfidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

/// A column that looks like a prediction target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetSuggestion {
    pub column: String,
    pub reason: String,
    pub confidence: SuggestionConfidence,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileResult {
    pub overview: DatasetOverview,
    pub columns: Vec<ColumnProfile>,
    pub quality_issues: Vec<String>,
    pub quality_score: QualityScore,
    pub roles: ColumnRoles,
    #[serde(default)]
    pub recommendations: ColumnRecommendations,
    #[serde(default)]
    pub target_suggestions: Vec<TargetSuggestion>,
}

impl ProfileResult {
    /// Well-formed profile with nothing in it, used when profiling cannot run.
    pub fn placeholder() -> Self {
        Self::default()
    }

    pub fn column(&self, name: &str) -> Option<&ColumnProfile> {
        self.columns.iter().find(|c| c.name == name)
    }
}

// INSIGHTS

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InsightKind {
    Correlation,
    Distribution,
    Imbalance,
    MissingData,
    Duplicates,
}

impl InsightKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Correlation => "correlation",
            Self::Distribution => "distribution",
            Self::Imbalance => "imbalance",
            Self::MissingData => "missing-data",
            Self::Duplicates => "duplicates",
        }
    }
}

impl fmt::Display for InsightKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Plain-language reading of a finding for a non-specialist audience.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guidance {
    pub explanation: String,
    pub why_it_matters: String,
    pub action: String,
}

impl Guidance {
    pub fn new(
        explanation: impl Into<String>,
        why_it_matters: impl Into<String>,
        action: impl Into<String>,
    ) -> Self {
        Self {
            explanation: explanation.into(),
            why_it_matters: why_it_matters.into(),
            action: action.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    pub kind: InsightKind,
    pub title: String,
    pub description: String,
    /// Always within `[0, 1]`.
    pub confidence: f64,
    pub value: Option<f64>,
    /// Columns the finding is about.
    pub columns: Vec<String>,
    /// Two-sided significance of a correlation coefficient.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub p_value: Option<f64>,
    #[serde(flatten)]
    pub guidance: Option<Guidance>,
}

impl Insight {
    /// Significant at the 5% level, when a p-value is known.
    pub fn is_significant(&self) -> Option<bool> {
        self.p_value.map(|p| p < 0.05)
    }
}

// ANOMALIES

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnomalyKind {
    ZScoreOutlier,
    IqrOutlier,
    SparseCategory,
    TemporalAnomaly,
}

impl AnomalyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ZScoreOutlier => "z-score-outlier",
            Self::IqrOutlier => "iqr-outlier",
            Self::SparseCategory => "sparse-category",
            Self::TemporalAnomaly => "temporal-anomaly",
        }
    }
}

impl fmt::Display for AnomalyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered `Low < Medium < High`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    /// Severity from the share of flagged rows. A rare finding is treated as
    /// more anomalous than a common one: many flagged rows point at a property
    /// of the distribution rather than at individual bad values.
    pub fn from_percentage(pct: f64) -> Self {
        if pct < 1.0 {
            Self::High
        } else if pct < 5.0 {
            Self::Medium
        } else {
            Self::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anomaly {
    pub kind: AnomalyKind,
    pub column: String,
    pub title: String,
    pub description: String,
    pub count: usize,
    pub percentage: f64,
    pub severity: Severity,
    #[serde(flatten)]
    pub guidance: Option<Guidance>,
}

/// Insights ordered by descending confidence; ties keep discovery order.
pub fn by_confidence(insights: &[Insight]) -> Vec<&Insight> {
    let mut ranked: Vec<&Insight> = insights.iter().collect();
    ranked.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    ranked
}

/// Anomalies ordered from high to low severity; ties keep discovery order.
pub fn by_severity(anomalies: &[Anomaly]) -> Vec<&Anomaly> {
    let mut ranked: Vec<&Anomaly> = anomalies.iter().collect();
    ranked.sort_by(|a, b| b.severity.cmp(&a.severity));
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;

    fn anomaly(column: &str, severity: Severity) -> Anomaly {
        Anomaly {
            kind: AnomalyKind::IqrOutlier,
            column: column.to_owned(),
            title: String::new(),
            description: String::new(),
            count: 1,
            percentage: 1.0,
            severity,
            guidance: None,
        }
    }

    #[test]
    fn test_by_severity_is_stable() {
        let all = vec![
            anomaly("a", Severity::Low),
            anomaly("b", Severity::High),
            anomaly("c", Severity::Low),
            anomaly("d", Severity::High),
        ];
        let order: Vec<&str> = by_severity(&all).iter().map(|a| a.column.as_str()).collect();
        assert_eq!(order, vec!["b", "d", "a", "c"]);
    }

    #[test]
    fn test_severity_tiers() {
        assert_eq!(Severity::from_percentage(0.0), Severity::High);
        assert_eq!(Severity::from_percentage(0.99), Severity::High);
        assert_eq!(Severity::from_percentage(1.0), Severity::Medium);
        assert_eq!(Severity::from_percentage(4.99), Severity::Medium);
        assert_eq!(Severity::from_percentage(5.0), Severity::Low);
        assert_eq!(Severity::from_percentage(80.0), Severity::Low);
        assert!(Severity::High > Severity::Medium && Severity::Medium > Severity::Low);
    }

    #[test]
    fn test_guidance_flattens_into_record() -> anyhow::Result<()> {
        let mut a = anomaly("x", Severity::Low);
        let bare = serde_json::to_value(&a)?;
        assert!(bare.get("explanation").is_none());

        a.guidance = Some(Guidance::new("odd values", "may be errors", "review them"));
        let json = serde_json::to_value(&a)?;
        assert_eq!(json["why_it_matters"], "may be errors");
        assert_eq!(json["action"], "review them");
        let back: Anomaly = serde_json::from_value(json)?;
        assert_eq!(back, a);
        Ok(())
    }

    #[test]
    fn test_kind_serialization() -> anyhow::Result<()> {
        assert_eq!(serde_json::to_string(&InsightKind::MissingData)?, "\"missing-data\"");
        assert_eq!(serde_json::to_string(&AnomalyKind::ZScoreOutlier)?, "\"z-score-outlier\"");
        assert_eq!(serde_json::to_string(&Severity::Medium)?, "\"medium\"");
        Ok(())
    }
}
