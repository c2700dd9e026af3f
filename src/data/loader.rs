//! Dataset Loader Module
//! Loads the survey CSV from a local file or a remote URL using Polars.

use polars::prelude::*;
use std::io::Cursor;
use std::path::PathBuf;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Failed to read CSV: {0}")]
    Csv(#[from] PolarsError),
    #[error("Failed to fetch dataset: {0}")]
    Http(#[from] reqwest::Error),
    #[error("No dataset loaded")]
    NoData,
}

/// Where the current frame came from.
#[derive(Debug, Clone)]
pub enum DataSource {
    Url(String),
    File(PathBuf),
}

impl DataSource {
    pub fn display_name(&self) -> String {
        match self {
            DataSource::Url(url) => url
                .rsplit('/')
                .next()
                .unwrap_or(url.as_str())
                .to_string(),
            DataSource::File(path) => path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| path.display().to_string()),
        }
    }
}

/// Holds the loaded survey frame and answers picker queries against it.
pub struct DataLoader {
    df: Option<DataFrame>,
    source: Option<DataSource>,
}

impl Default for DataLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DataLoader {
    pub fn new() -> Self {
        Self {
            df: None,
            source: None,
        }
    }

    /// Read a CSV file from disk. Safe to call from a worker thread.
    pub fn read_csv_file(path: &str) -> Result<DataFrame, LoaderError> {
        let df = LazyCsvReader::new(path)
            .with_infer_schema_length(Some(10000))
            .with_ignore_errors(true)
            .finish()?
            .collect()?;

        info!(rows = df.height(), cols = df.width(), path, "loaded dataset from file");
        Ok(df)
    }

    /// Fetch a CSV over HTTP and parse it. Safe to call from a worker thread.
    pub fn fetch_csv_url(url: &str) -> Result<DataFrame, LoaderError> {
        let bytes = reqwest::blocking::get(url)?.error_for_status()?.bytes()?.to_vec();

        let df = CsvReadOptions::default()
            .with_infer_schema_length(Some(10000))
            .with_ignore_errors(true)
            .into_reader_with_file_handle(Cursor::new(bytes))
            .finish()?;

        info!(rows = df.height(), cols = df.width(), url, "fetched dataset");
        Ok(df)
    }

    /// Install a frame produced by a background load.
    pub fn set_dataframe(&mut self, df: DataFrame, source: DataSource) {
        self.df = Some(df);
        self.source = Some(source);
    }

    pub fn dataframe(&self) -> Option<&DataFrame> {
        self.df.as_ref()
    }

    pub fn source(&self) -> Option<&DataSource> {
        self.source.as_ref()
    }

    pub fn row_count(&self) -> usize {
        self.df.as_ref().map(|df| df.height()).unwrap_or(0)
    }

    /// Column names of the loaded frame.
    pub fn columns(&self) -> Vec<String> {
        self.df
            .as_ref()
            .map(|df| {
                df.get_column_names()
                    .iter()
                    .map(|s| s.to_string())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Names of numeric columns, for value-column pickers.
    pub fn numeric_columns(&self) -> Vec<String> {
        let Some(df) = &self.df else {
            return Vec::new();
        };

        df.get_columns()
            .iter()
            .filter(|col| {
                matches!(
                    col.dtype(),
                    DataType::Float32
                        | DataType::Float64
                        | DataType::Int8
                        | DataType::Int16
                        | DataType::Int32
                        | DataType::Int64
                        | DataType::UInt8
                        | DataType::UInt16
                        | DataType::UInt32
                        | DataType::UInt64
                )
            })
            .map(|col| col.name().to_string())
            .collect()
    }

    /// Sorted unique non-null values of a column, for the indicator picker.
    pub fn unique_values(&self, column: &str) -> Vec<String> {
        let Some(df) = &self.df else {
            return Vec::new();
        };

        df.column(column)
            .ok()
            .and_then(|col| col.unique().ok())
            .map(|unique| {
                let series = unique.as_materialized_series();
                let mut values: Vec<String> = (0..series.len())
                    .filter_map(|i| {
                        let val = series.get(i).ok()?;
                        if val.is_null() {
                            None
                        } else {
                            Some(val.to_string().trim_matches('"').to_string())
                        }
                    })
                    .collect();
                values.sort();
                values
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loader_with_frame() -> DataLoader {
        let df = df!(
            "state" => ["Kerala", "Bihar", "Kerala"],
            "indicator" => [Some("Stunting"), Some("Wasting"), None],
            "nfhs5_total" => [4.0, 47.0, 23.0],
        )
        .unwrap();

        let mut loader = DataLoader::new();
        loader.set_dataframe(df, DataSource::File(PathBuf::from("nfhs.csv")));
        loader
    }

    #[test]
    fn unique_values_are_sorted_and_null_free() {
        let loader = loader_with_frame();
        assert_eq!(loader.unique_values("indicator"), vec!["Stunting", "Wasting"]);
        assert_eq!(loader.unique_values("state"), vec!["Bihar", "Kerala"]);
    }

    #[test]
    fn numeric_columns_skip_strings() {
        let loader = loader_with_frame();
        assert_eq!(loader.numeric_columns(), vec!["nfhs5_total"]);
        assert_eq!(loader.row_count(), 3);
    }

    #[test]
    fn empty_loader_answers_with_empty_collections() {
        let loader = DataLoader::new();
        assert!(loader.columns().is_empty());
        assert!(loader.unique_values("indicator").is_empty());
        assert_eq!(loader.row_count(), 0);
        assert!(loader.dataframe().is_none());
    }
}
