//! Dataset Schema Module
//! Column configuration for the survey table, validated once at load time.

use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Column '{0}' not found in dataset")]
    MissingColumn(String),
    #[error("Dataset has no survey rounds configured")]
    NoRounds,
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Urban/rural/total split of one round's value columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Breakdown {
    Total,
    Urban,
    Rural,
}

impl Breakdown {
    pub const ALL: [Breakdown; 3] = [Breakdown::Total, Breakdown::Urban, Breakdown::Rural];

    pub fn label(&self) -> &'static str {
        match self {
            Breakdown::Total => "Total",
            Breakdown::Urban => "Urban",
            Breakdown::Rural => "Rural",
        }
    }
}

/// Value columns contributed by one survey round.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundColumns {
    /// Display label, e.g. "NFHS-5 (2019-21)"
    pub label: String,
    pub total: String,
    pub urban: Option<String>,
    pub rural: Option<String>,
}

impl RoundColumns {
    /// Configured column name for a breakdown, if the round has one.
    pub fn column(&self, breakdown: Breakdown) -> Option<&str> {
        match breakdown {
            Breakdown::Total => Some(self.total.as_str()),
            Breakdown::Urban => self.urban.as_deref(),
            Breakdown::Rural => self.rural.as_deref(),
        }
    }
}

/// The two columns a round-over-round comparison diffs, earlier first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundColumnPair {
    pub from: String,
    pub to: String,
}

/// User-editable dataset layout. Defaults match the NFHS states CSV.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    pub dataset_url: String,
    pub state_col: String,
    pub indicator_col: String,
    /// Rounds in chronological order (earliest first).
    pub rounds: Vec<RoundColumns>,
    pub top_n: usize,
    pub correlation_min_coverage: f64,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            dataset_url: "https://raw.githubusercontent.com/sameekshajangra/Maternal-Child-Health-Dashboard/refs/heads/main/data/NFHS5_states_clean.csv".to_string(),
            state_col: "state".to_string(),
            indicator_col: "indicator".to_string(),
            rounds: vec![
                RoundColumns {
                    label: "NFHS-4 (2015-16)".to_string(),
                    total: "nfhs4_total".to_string(),
                    urban: Some("nfhs4_urban".to_string()),
                    rural: Some("nfhs4_rural".to_string()),
                },
                RoundColumns {
                    label: "NFHS-5 (2019-21)".to_string(),
                    total: "nfhs5_total".to_string(),
                    urban: Some("nfhs5_urban".to_string()),
                    rural: Some("nfhs5_rural".to_string()),
                },
            ],
            top_n: 3,
            correlation_min_coverage: 0.5,
        }
    }
}

impl DatasetConfig {
    /// Load a config override from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, SchemaError> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Check the configured layout against the loaded frame.
    ///
    /// State, indicator and every round's total column are required and
    /// fail fast with `MissingColumn`. Urban/rural columns are optional;
    /// absent ones just make that breakdown unavailable.
    pub fn validate(&self, df: &DataFrame) -> Result<DatasetSchema, SchemaError> {
        if self.rounds.is_empty() {
            return Err(SchemaError::NoRounds);
        }

        let columns: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();

        let required = std::iter::once(self.state_col.as_str())
            .chain(std::iter::once(self.indicator_col.as_str()))
            .chain(self.rounds.iter().map(|r| r.total.as_str()));

        for col in required {
            if !columns.iter().any(|c| c == col) {
                return Err(SchemaError::MissingColumn(col.to_string()));
            }
        }

        Ok(DatasetSchema {
            state_col: self.state_col.clone(),
            indicator_col: self.indicator_col.clone(),
            rounds: self.rounds.clone(),
            columns,
        })
    }
}

/// Validated column layout: configured rounds plus the columns actually
/// present in the loaded frame.
#[derive(Debug, Clone)]
pub struct DatasetSchema {
    pub state_col: String,
    pub indicator_col: String,
    pub rounds: Vec<RoundColumns>,
    columns: Vec<String>,
}

impl DatasetSchema {
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    /// Whether every round carries this breakdown in the loaded frame.
    pub fn breakdown_available(&self, breakdown: Breakdown) -> bool {
        self.rounds.iter().all(|r| {
            r.column(breakdown)
                .map(|c| self.has_column(c))
                .unwrap_or(false)
        })
    }

    /// Resolve one round + breakdown to a concrete column name.
    pub fn value_column(
        &self,
        round_idx: usize,
        breakdown: Breakdown,
    ) -> Result<String, SchemaError> {
        let round = self
            .rounds
            .get(round_idx)
            .ok_or(SchemaError::NoRounds)?;
        let col = round
            .column(breakdown)
            .ok_or_else(|| missing_breakdown(round, breakdown))?;
        if !self.has_column(col) {
            return Err(SchemaError::MissingColumn(col.to_string()));
        }
        Ok(col.to_string())
    }

    /// The pair of columns to diff between two rounds for a breakdown.
    pub fn column_pair(
        &self,
        from_idx: usize,
        to_idx: usize,
        breakdown: Breakdown,
    ) -> Result<RoundColumnPair, SchemaError> {
        Ok(RoundColumnPair {
            from: self.value_column(from_idx, breakdown)?,
            to: self.value_column(to_idx, breakdown)?,
        })
    }

    /// All round value columns present in the frame, chronological order.
    pub fn value_columns(&self) -> Vec<String> {
        let mut cols = Vec::new();
        for round in &self.rounds {
            for breakdown in Breakdown::ALL {
                if let Some(col) = round.column(breakdown) {
                    if self.has_column(col) {
                        cols.push(col.to_string());
                    }
                }
            }
        }
        cols
    }
}

fn missing_breakdown(round: &RoundColumns, breakdown: Breakdown) -> SchemaError {
    SchemaError::MissingColumn(format!("{} ({})", round.label, breakdown.label()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nfhs_frame() -> DataFrame {
        df!(
            "state" => ["Kerala", "Bihar"],
            "indicator" => ["Infant mortality rate", "Infant mortality rate"],
            "nfhs4_total" => [Some(6.0), Some(48.0)],
            "nfhs4_urban" => [Some(5.0), Some(40.0)],
            "nfhs4_rural" => [Some(7.0), Some(50.0)],
            "nfhs5_total" => [Some(4.0), Some(47.0)],
            "nfhs5_urban" => [Some(3.0), Some(39.0)],
            "nfhs5_rural" => [Some(5.0), Some(49.0)],
        )
        .unwrap()
    }

    #[test]
    fn default_config_validates_against_nfhs_layout() {
        let schema = DatasetConfig::default().validate(&nfhs_frame()).unwrap();
        assert_eq!(schema.rounds.len(), 2);
        assert!(schema.breakdown_available(Breakdown::Total));
        assert!(schema.breakdown_available(Breakdown::Urban));
        assert_eq!(schema.value_columns().len(), 6);
    }

    #[test]
    fn missing_total_column_fails_fast_by_name() {
        let df = df!(
            "state" => ["Kerala"],
            "indicator" => ["Infant mortality rate"],
            "nfhs4_total" => [6.0],
        )
        .unwrap();

        let err = DatasetConfig::default().validate(&df).unwrap_err();
        match err {
            SchemaError::MissingColumn(col) => assert_eq!(col, "nfhs5_total"),
            other => panic!("expected MissingColumn, got {other:?}"),
        }
    }

    #[test]
    fn absent_urban_columns_degrade_to_unavailable_breakdown() {
        let df = df!(
            "state" => ["Kerala"],
            "indicator" => ["Infant mortality rate"],
            "nfhs4_total" => [6.0],
            "nfhs5_total" => [4.0],
        )
        .unwrap();

        let schema = DatasetConfig::default().validate(&df).unwrap();
        assert!(schema.breakdown_available(Breakdown::Total));
        assert!(!schema.breakdown_available(Breakdown::Urban));
        assert!(matches!(
            schema.column_pair(0, 1, Breakdown::Urban),
            Err(SchemaError::MissingColumn(_))
        ));
        let pair = schema.column_pair(0, 1, Breakdown::Total).unwrap();
        assert_eq!(pair.from, "nfhs4_total");
        assert_eq!(pair.to, "nfhs5_total");
    }

    #[test]
    fn config_round_trips_through_json() {
        let config = DatasetConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: DatasetConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.state_col, config.state_col);
        assert_eq!(back.rounds.len(), config.rounds.len());
        assert_eq!(back.top_n, 3);
    }
}
