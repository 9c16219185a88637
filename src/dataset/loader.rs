//! File loading through Polars.
//!
//! This is the data-loading collaborator: it turns CSV / JSON / NDJSON files
//! into a [`Dataset`]. The analysis stages never see file formats.

use super::{Column, ColumnKind, Dataset};
use crate::error::{AnalysisError, Result};
use polars::prelude::*;
use std::path::Path;

/// Rows Polars inspects when inferring a CSV schema.
const INFER_SCHEMA_ROWS: usize = 10_000;

/// Load a file into a validated [`Dataset`].
pub fn load_dataset(path: &Path) -> Result<Dataset> {
    let df = read_dataframe(path)?;
    let dataset = Dataset::from_dataframe(&df)?;
    tracing::info!(
        path = %path.display(),
        rows = dataset.row_count(),
        columns = dataset.column_count(),
        "Loaded dataset"
    );
    Ok(dataset)
}

pub fn read_dataframe(path: &Path) -> Result<DataFrame> {
    if !path.exists() {
        return Err(AnalysisError::DataLoading(format!(
            "File not found: {}",
            path.display()
        )));
    }

    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or("")
        .to_lowercase();

    let df = match ext.as_str() {
        "csv" | "txt" => CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(INFER_SCHEMA_ROWS))
            .try_into_reader_with_file_path(Some(path.to_path_buf()))?
            .finish()?,
        "json" => {
            let file = std::fs::File::open(path)?;
            JsonReader::new(file).finish()?
        }
        "jsonl" | "ndjson" => JsonLineReader::from_path(path)?.finish()?,
        other => {
            return Err(AnalysisError::DataLoading(format!(
                "Unsupported file format: '.{other}'. Supported: .csv, .json, .jsonl, .ndjson"
            )));
        }
    };

    if df.width() == 0 {
        return Err(AnalysisError::DataLoading("File has no columns".to_owned()));
    }

    Ok(df)
}

impl Dataset {
    /// Convert a Polars `DataFrame`, mapping dtypes onto column kinds.
    /// Text columns are re-inferred so date strings become temporal columns.
    pub fn from_dataframe(df: &DataFrame) -> Result<Self> {
        let mut columns = Vec::with_capacity(df.width());

        for col in df.get_columns() {
            let name = col.name().to_string();
            let series = col.as_materialized_series();
            let dtype = series.dtype();

            let column = if dtype.is_bool() {
                Column::from_series(ColumnKind::Boolean, series)?
            } else if dtype.is_primitive_numeric() {
                Column::from_series(ColumnKind::Numeric, series)?
            } else if matches!(dtype, DataType::Date | DataType::Datetime(_, _)) {
                Column::from_series(ColumnKind::Temporal, series)?
            } else {
                let cast = series.cast(&DataType::String)?;
                let ca = cast.str()?;
                Column::infer(name, ca.into_iter().map(|v| v.map(str::to_owned)).collect())
            };
            columns.push(column);
        }

        Self::new(columns)
    }
}

#[cfg(test)]
mod tests {
    #![expect(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_from_dataframe_maps_kinds() -> anyhow::Result<()> {
        let df = df! {
            "amount" => [1.5, 2.0, 3.25],
            "count" => [1i64, 2, 3],
            "flag" => [true, false, true],
            "city" => ["Leeds", "York", "Leeds"],
            "when" => ["2024-01-01", "2024-01-02", "2024-01-03"],
        }?;

        let ds = Dataset::from_dataframe(&df)?;
        assert_eq!(ds.row_count(), 3);
        assert_eq!(ds.column("amount").unwrap().kind(), ColumnKind::Numeric);
        assert_eq!(ds.column("count").unwrap().kind(), ColumnKind::Numeric);
        assert_eq!(ds.column("flag").unwrap().kind(), ColumnKind::Boolean);
        assert_eq!(ds.column("city").unwrap().kind(), ColumnKind::Categorical);
        assert_eq!(ds.column("when").unwrap().kind(), ColumnKind::Temporal);
        Ok(())
    }

    #[test]
    fn test_unsupported_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.parquet");
        std::fs::write(&path, b"not really parquet").unwrap();
        let err = read_dataframe(&path).unwrap_err();
        assert!(err.to_string().contains("Unsupported file format"));
    }

    #[test]
    fn test_missing_file() {
        let err = read_dataframe(Path::new("does/not/exist.csv")).unwrap_err();
        assert!(matches!(err, AnalysisError::DataLoading(_)));
    }
}
