//! In-memory tabular dataset consumed by the analysis pipeline.
//!
//! A [`Dataset`] is an ordered list of named, typed [`Column`]s of equal
//! length. It is built once by the data-loading collaborator (see
//! [`loader`]) or directly from values, and is read-only afterwards: every
//! pipeline stage borrows it, none mutates it.
//!
//! ```
//! use datasight::dataset::{Column, Dataset};
//!
//! let ds = Dataset::new(vec![
//!     Column::from_f64("price", &[9.5, 12.0, 11.25]),
//!     Column::from_strs("region", &["north", "south", "north"]),
//! ])?;
//! assert_eq!(ds.row_count(), 3);
//! assert_eq!(ds.column_count(), 2);
//! # Ok::<(), datasight::error::AnalysisError>(())
//! ```

pub mod infer;
pub mod loader;

use crate::error::{AnalysisError, Result};
use chrono::{DateTime, Timelike as _, Utc};
use polars::prelude::{
    BooleanChunked, DataFrame, DataType, Float64Chunked, Int64Chunked, IntoColumn as _,
    IntoSeries as _, NamedFrom as _, NewChunkedArray as _, PlSmallStr, Series, StringChunked,
    TimeUnit, UniqueKeepStrategy,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Declared kind of a column, inferred from its content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    Numeric,
    Categorical,
    Temporal,
    Boolean,
}

impl ColumnKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Numeric => "numeric",
            Self::Categorical => "categorical",
            Self::Temporal => "datetime",
            Self::Boolean => "boolean",
        }
    }

    /// Polars dtype a column of this kind is stored as.
    pub fn dtype(&self) -> DataType {
        match self {
            Self::Numeric => DataType::Float64,
            Self::Categorical => DataType::String,
            Self::Temporal => DataType::Datetime(TimeUnit::Milliseconds, None),
            Self::Boolean => DataType::Boolean,
        }
    }
}

impl std::fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A named Polars series tagged with its [`ColumnKind`].
///
/// Numeric columns are `Float64` with non-finite values stored as nulls,
/// temporal columns are millisecond `Datetime`s, categorical columns are
/// `String` and boolean columns are `Boolean`.
#[derive(Debug, Clone)]
pub struct Column {
    kind: ColumnKind,
    series: Series,
}

fn finite(value: Option<f64>) -> Option<f64> {
    // `+ 0.0` folds -0.0 into 0.0 so equal values hash alike.
    value.filter(|x| x.is_finite()).map(|x| x + 0.0)
}

impl Column {
    /// Numeric column. Non-finite values are stored as nulls.
    pub fn numeric(name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        let ca = Float64Chunked::from_iter_options(
            PlSmallStr::from(name.into()),
            values.into_iter().map(finite),
        );
        Self {
            kind: ColumnKind::Numeric,
            series: ca.into_series(),
        }
    }

    pub fn categorical(name: impl Into<String>, values: Vec<Option<String>>) -> Self {
        Self {
            kind: ColumnKind::Categorical,
            series: Series::new(PlSmallStr::from(name.into()), values),
        }
    }

    /// Temporal column from milliseconds since the Unix epoch, UTC.
    pub fn temporal(name: impl Into<String>, millis: Vec<Option<i64>>) -> Self {
        let ca = Int64Chunked::from_iter_options(PlSmallStr::from(name.into()), millis.into_iter())
            .into_datetime(TimeUnit::Milliseconds, None);
        Self {
            kind: ColumnKind::Temporal,
            series: ca.into_series(),
        }
    }

    pub fn boolean(name: impl Into<String>, values: Vec<Option<bool>>) -> Self {
        Self {
            kind: ColumnKind::Boolean,
            series: Series::new(PlSmallStr::from(name.into()), values),
        }
    }

    pub fn from_f64(name: impl Into<String>, values: &[f64]) -> Self {
        Self::numeric(name, values.iter().copied().map(Some).collect())
    }

    pub fn from_strs(name: impl Into<String>, values: &[&str]) -> Self {
        Self::categorical(name, values.iter().map(|s| Some((*s).to_owned())).collect())
    }

    /// Build a column from raw text, inferring its kind from the content.
    pub fn infer(name: impl Into<String>, raw: Vec<Option<String>>) -> Self {
        infer::infer_column(name.into(), raw)
    }

    /// Wrap an existing series, casting it to the storage dtype of `kind`.
    pub fn from_series(kind: ColumnKind, series: &Series) -> Result<Self> {
        let cast = series.cast(&kind.dtype())?;
        if kind == ColumnKind::Numeric {
            let ca = cast.f64()?;
            let normalized = Float64Chunked::from_iter_options(
                ca.name().clone(),
                ca.into_iter().map(finite),
            );
            return Ok(Self {
                kind,
                series: normalized.into_series(),
            });
        }
        Ok(Self { kind, series: cast })
    }

    pub fn name(&self) -> &str {
        self.series.name().as_str()
    }

    pub fn kind(&self) -> ColumnKind {
        self.kind
    }

    pub fn series(&self) -> &Series {
        &self.series
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    pub fn null_count(&self) -> usize {
        self.series.null_count()
    }

    pub fn non_null_count(&self) -> usize {
        self.len() - self.null_count()
    }

    /// `true` where the column is null.
    pub fn null_mask(&self) -> BooleanChunked {
        self.series.is_null()
    }

    /// Values of a numeric column, or `None` for other kinds.
    pub fn f64(&self) -> Option<&Float64Chunked> {
        match self.kind {
            ColumnKind::Numeric => self.series.f64().ok(),
            _ => None,
        }
    }

    /// Values of a categorical column, or `None` for other kinds.
    pub fn str(&self) -> Option<&StringChunked> {
        match self.kind {
            ColumnKind::Categorical => self.series.str().ok(),
            _ => None,
        }
    }

    /// Epoch milliseconds of a temporal column, or `None` for other kinds.
    pub fn timestamps(&self) -> Option<&Int64Chunked> {
        match self.kind {
            ColumnKind::Temporal => self.series.datetime().ok().map(|ca| &ca.0),
            _ => None,
        }
    }

    /// Values of a boolean column, or `None` for other kinds.
    pub fn bool(&self) -> Option<&BooleanChunked> {
        match self.kind {
            ColumnKind::Boolean => self.series.bool().ok(),
            _ => None,
        }
    }

    /// Distinct non-null values.
    pub fn distinct_count(&self) -> usize {
        self.series.drop_nulls().n_unique().unwrap_or(0)
    }

    /// Rough in-memory footprint of the column's values, in bytes.
    pub fn estimated_bytes(&self) -> usize {
        self.series.estimated_size()
    }
}

/// An ordered collection of equal-length columns, backed by a Polars
/// [`DataFrame`] for row-level operations.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    columns: Vec<Column>,
    frame: DataFrame,
}

impl Dataset {
    /// Build a dataset, checking that column lengths agree and names are unique.
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        let row_count = columns.first().map_or(0, Column::len);
        let mut seen = HashSet::new();
        for column in &columns {
            if column.len() != row_count {
                return Err(AnalysisError::InvalidDataset(format!(
                    "column '{}' has {} rows, expected {row_count}",
                    column.name(),
                    column.len()
                )));
            }
            if !seen.insert(column.name()) {
                return Err(AnalysisError::InvalidDataset(format!(
                    "duplicate column name '{}'",
                    column.name()
                )));
            }
        }

        let frame = DataFrame::new(
            columns
                .iter()
                .map(|c| c.series.clone().into_column())
                .collect(),
        )?;
        Ok(Self { columns, frame })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn row_count(&self) -> usize {
        self.frame.height()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// True when there is nothing to analyse: no rows or no columns.
    pub fn is_empty(&self) -> bool {
        self.row_count() == 0 || self.columns.is_empty()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name() == name)
    }

    pub fn columns_of_kind(&self, kind: ColumnKind) -> impl Iterator<Item = &Column> + '_ {
        self.columns.iter().filter(move |c| c.kind() == kind)
    }

    /// Number of rows identical to an earlier row. The first occurrence of
    /// each distinct row is not counted.
    pub fn duplicate_row_count(&self) -> usize {
        if self.frame.width() == 0 {
            return 0;
        }
        match self
            .frame
            .unique_stable(None, UniqueKeepStrategy::First, None)
        {
            Ok(distinct) => self.row_count() - distinct.height(),
            Err(err) => {
                tracing::warn!(error = %err, "Could not compare rows for duplicates");
                0
            }
        }
    }

    pub fn estimated_memory_bytes(&self) -> usize {
        self.frame.estimated_size()
    }
}

/// Render an epoch-millisecond timestamp; midnight values render as a date.
pub fn format_timestamp(millis: i64) -> String {
    match DateTime::<Utc>::from_timestamp_millis(millis) {
        Some(dt) if dt.num_seconds_from_midnight() == 0 && dt.timestamp_subsec_millis() == 0 => {
            dt.format("%Y-%m-%d").to_string()
        }
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => millis.to_string(),
    }
}
