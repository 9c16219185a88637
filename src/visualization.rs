//! Chart planning.
//!
//! Charts are described, not drawn: a [`Visualizer`] turns the accumulated
//! results into [`ChartSpec`]s that a renderer outside this crate can draw.

use crate::analyser::InsightKind;
use crate::dataset::ColumnKind;
use crate::error::Result;
use crate::pipeline::AnalysisState;
use serde::{Deserialize, Serialize};

const MAX_DISTRIBUTION_CHARTS: usize = 3;
const MAX_CATEGORY_CHARTS: usize = 2;
/// Bars shown in a category chart.
const TOP_CATEGORIES: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChartKind {
    Distribution,
    CorrelationHeatmap,
    Bar,
    Scatter,
    TimeSeries,
}

impl ChartKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Distribution => "distribution",
            Self::CorrelationHeatmap => "heatmap",
            Self::Bar => "bar",
            Self::Scatter => "scatter",
            Self::TimeSeries => "time series",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSpec {
    pub kind: ChartKind,
    pub title: String,
    pub columns: Vec<String>,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VisualizationResult {
    pub charts: Vec<ChartSpec>,
}

impl VisualizationResult {
    pub fn is_empty(&self) -> bool {
        self.charts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.charts.len()
    }
}

/// Produces chart descriptions from the state of a run.
pub trait Visualizer {
    fn visualize(&self, state: &AnalysisState) -> Result<VisualizationResult>;
}

/// Default [`Visualizer`]: picks chart types from column kinds and insights.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChartPlanner;

impl Visualizer for ChartPlanner {
    fn visualize(&self, state: &AnalysisState) -> Result<VisualizationResult> {
        let dataset = state.dataset();
        let numeric: Vec<&str> = dataset
            .columns_of_kind(ColumnKind::Numeric)
            .map(|c| c.name())
            .collect();
        let categorical: Vec<&str> = dataset
            .columns_of_kind(ColumnKind::Categorical)
            .map(|c| c.name())
            .collect();
        let temporal = dataset.columns_of_kind(ColumnKind::Temporal).next();

        let mut charts = Vec::new();

        for name in numeric.iter().take(MAX_DISTRIBUTION_CHARTS) {
            charts.push(ChartSpec {
                kind: ChartKind::Distribution,
                title: format!("Distribution of {name}"),
                columns: vec![(*name).to_owned()],
                description: format!("Histogram and box plot for {name}"),
            });
        }

        if numeric.len() >= 2 {
            charts.push(ChartSpec {
                kind: ChartKind::CorrelationHeatmap,
                title: "Correlation matrix".to_owned(),
                columns: numeric.iter().map(|s| (*s).to_owned()).collect(),
                description: format!("Pairwise correlations across {} numeric columns", numeric.len()),
            });
        }

        for name in categorical.iter().take(MAX_CATEGORY_CHARTS) {
            charts.push(ChartSpec {
                kind: ChartKind::Bar,
                title: format!("Top categories in {name}"),
                columns: vec![(*name).to_owned()],
                description: format!("Counts of the {TOP_CATEGORIES} most frequent values of {name}"),
            });
        }

        if let Some(pair) = scatter_pair(state, &numeric) {
            charts.push(ChartSpec {
                kind: ChartKind::Scatter,
                title: format!("{} vs {}", pair.0, pair.1),
                description: format!("Scatter plot with trendline: {} vs {}", pair.0, pair.1),
                columns: vec![pair.0, pair.1],
            });
        }

        if let Some(date_col) = temporal {
            let date = date_col.name().to_owned();
            let (columns, title) = match numeric.first() {
                Some(metric) => (
                    vec![date.clone(), (*metric).to_owned()],
                    format!("{metric} over time"),
                ),
                None => (vec![date.clone()], "Records over time".to_owned()),
            };
            charts.push(ChartSpec {
                kind: ChartKind::TimeSeries,
                title,
                columns,
                description: format!("Values aggregated by {date}"),
            });
        }

        tracing::debug!(charts = charts.len(), "Planned charts");
        Ok(VisualizationResult { charts })
    }
}

/// The most strongly correlated pair, else the first two numeric columns.
fn scatter_pair(state: &AnalysisState, numeric: &[&str]) -> Option<(String, String)> {
    let strongest = state
        .insight_result()
        .unwrap_or_default()
        .iter()
        .filter(|i| i.kind == InsightKind::Correlation)
        .max_by(|a, b| a.confidence.total_cmp(&b.confidence))
        .and_then(|i| match i.columns.as_slice() {
            [a, b] => Some((a.clone(), b.clone())),
            _ => None,
        });

    strongest.or_else(|| match numeric {
        [a, b, ..] => Some(((*a).to_owned(), (*b).to_owned())),
        _ => None,
    })
}
