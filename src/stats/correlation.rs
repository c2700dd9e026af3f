//! Correlation Builder Module
//! Pivots the survey frame into a state x indicator grid and computes a
//! pairwise Pearson correlation matrix across indicators.

use polars::prelude::*;
use rayon::prelude::*;
use statrs::statistics::Statistics;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CorrelationError {
    #[error("Column '{0}' not found in dataset")]
    MissingColumn(String),
    #[error("Only {available} indicator column(s) qualify; at least 2 required")]
    InsufficientColumns { available: usize },
    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),
}

/// Square matrix of pairwise Pearson correlations. A cell is `None` when
/// fewer than two complete pairs exist or a column has zero variance.
#[derive(Debug, Clone)]
pub struct CorrelationMatrix {
    pub indicators: Vec<String>,
    values: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    pub fn len(&self) -> usize {
        self.indicators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indicators.is_empty()
    }

    pub fn get(&self, i: usize, j: usize) -> Option<f64> {
        self.values.get(i).and_then(|row| row.get(j)).copied().flatten()
    }
}

/// Builds the indicator correlation matrix for one value column.
pub struct CorrelationBuilder;

impl CorrelationBuilder {
    /// Pivot `value_column` into a state x indicator grid (duplicate cells
    /// collapsed by mean), drop indicators below `min_coverage`, then
    /// correlate the surviving columns pairwise over pairwise-complete
    /// state rows.
    ///
    /// `allowlist`, when given, restricts the candidate indicators to
    /// those of its entries present in the frame; it is deliberately not
    /// widened when too few remain, so a one-entry allowlist reports
    /// `InsufficientColumns` rather than producing a 1x1 matrix.
    pub fn build_matrix(
        df: &DataFrame,
        state_col: &str,
        indicator_col: &str,
        value_column: &str,
        allowlist: Option<&[String]>,
        min_coverage: f64,
    ) -> Result<CorrelationMatrix, CorrelationError> {
        let (cells, states) = Self::pivot(df, state_col, indicator_col, value_column)?;

        let candidates: Vec<String> = match allowlist {
            Some(names) => names
                .iter()
                .filter(|name| cells.contains_key(*name))
                .cloned()
                .collect(),
            None => cells.keys().cloned().collect(),
        };

        let state_count = states.len().max(1);
        let indicators: Vec<String> = candidates
            .into_iter()
            .filter(|name| {
                let covered = cells[name].values().filter(|m| m.is_some()).count();
                covered as f64 / state_count as f64 >= min_coverage
            })
            .collect();

        if indicators.len() < 2 {
            return Err(CorrelationError::InsufficientColumns {
                available: indicators.len(),
            });
        }

        // One value vector per surviving indicator, aligned on the shared
        // state ordering.
        let columns: Vec<Vec<Option<f64>>> = indicators
            .iter()
            .map(|name| {
                let by_state = &cells[name];
                states
                    .iter()
                    .map(|state| by_state.get(state).copied().flatten())
                    .collect()
            })
            .collect();

        let k = indicators.len();
        let pairs: Vec<(usize, usize)> = (0..k)
            .flat_map(|i| (i..k).map(move |j| (i, j)))
            .collect();

        let computed: Vec<((usize, usize), Option<f64>)> = pairs
            .par_iter()
            .map(|&(i, j)| ((i, j), Self::pairwise_pearson(&columns[i], &columns[j])))
            .collect();

        let mut values = vec![vec![None; k]; k];
        for ((i, j), r) in computed {
            values[i][j] = r;
            values[j][i] = r;
        }

        Ok(CorrelationMatrix { indicators, values })
    }

    /// Extract (indicator -> state -> mean value) plus the sorted list of
    /// states seen in the frame. A state counts toward coverage
    /// denominators even when its cell is missing.
    fn pivot(
        df: &DataFrame,
        state_col: &str,
        indicator_col: &str,
        value_column: &str,
    ) -> Result<(PivotCells, Vec<String>), CorrelationError> {
        let states = df
            .column(state_col)
            .map_err(|_| CorrelationError::MissingColumn(state_col.to_string()))?;
        let indicators = df
            .column(indicator_col)
            .map_err(|_| CorrelationError::MissingColumn(indicator_col.to_string()))?;
        let values_f64 = df
            .column(value_column)
            .map_err(|_| CorrelationError::MissingColumn(value_column.to_string()))?
            .cast(&DataType::Float64)?;
        let values = values_f64.f64()?;

        let mut sums: BTreeMap<String, BTreeMap<String, (f64, usize)>> = BTreeMap::new();
        let mut state_set: BTreeMap<String, ()> = BTreeMap::new();

        for i in 0..df.height() {
            let (Ok(state), Ok(indicator)) = (states.get(i), indicators.get(i)) else {
                continue;
            };
            if state.is_null() || indicator.is_null() {
                continue;
            }
            let state = state.to_string().trim_matches('"').to_string();
            let indicator = indicator.to_string().trim_matches('"').to_string();
            state_set.insert(state.clone(), ());

            let cell = sums.entry(indicator).or_default().entry(state).or_insert((0.0, 0));
            if let Some(v) = values.get(i).filter(|v| !v.is_nan()) {
                cell.0 += v;
                cell.1 += 1;
            }
        }

        let cells: PivotCells = sums
            .into_iter()
            .map(|(indicator, by_state)| {
                let means = by_state
                    .into_iter()
                    .map(|(state, (sum, n))| {
                        let mean = if n > 0 { Some(sum / n as f64) } else { None };
                        (state, mean)
                    })
                    .collect();
                (indicator, means)
            })
            .collect();

        Ok((cells, state_set.into_keys().collect()))
    }

    /// Pearson r over the rows where both columns have a value. `None`
    /// for fewer than two complete pairs or zero variance on either side.
    fn pairwise_pearson(a: &[Option<f64>], b: &[Option<f64>]) -> Option<f64> {
        let (xs, ys): (Vec<f64>, Vec<f64>) = a
            .iter()
            .zip(b.iter())
            .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
            .unzip();

        if xs.len() < 2 {
            return None;
        }

        let mean_x = xs.iter().mean();
        let mean_y = ys.iter().mean();
        let std_x = xs.iter().std_dev();
        let std_y = ys.iter().std_dev();
        if std_x == 0.0 || std_y == 0.0 {
            return None;
        }

        let n = xs.len() as f64;
        let cov = xs
            .iter()
            .zip(ys.iter())
            .map(|(x, y)| (x - mean_x) * (y - mean_y))
            .sum::<f64>()
            / (n - 1.0);

        Some(cov / (std_x * std_y))
    }
}

type PivotCells = BTreeMap<String, BTreeMap<String, Option<f64>>>;

#[cfg(test)]
mod tests {
    use super::*;

    fn pivot_frame() -> DataFrame {
        // X and Y move together, Z moves against both.
        df!(
            "state" => ["A", "B", "C", "A", "B", "C", "A", "B", "C"],
            "indicator" => ["X", "X", "X", "Y", "Y", "Y", "Z", "Z", "Z"],
            "nfhs5_total" => [1.0, 2.0, 3.0, 2.0, 4.0, 6.0, 3.0, 2.0, 1.0],
        )
        .unwrap()
    }

    fn build(df: &DataFrame, allowlist: Option<&[String]>) -> Result<CorrelationMatrix, CorrelationError> {
        CorrelationBuilder::build_matrix(df, "state", "indicator", "nfhs5_total", allowlist, 0.5)
    }

    #[test]
    fn matrix_is_symmetric_with_unit_diagonal() {
        let matrix = build(&pivot_frame(), None).unwrap();
        assert_eq!(matrix.len(), 3);

        for i in 0..matrix.len() {
            assert!((matrix.get(i, i).unwrap() - 1.0).abs() < 1e-9);
            for j in 0..matrix.len() {
                assert_eq!(matrix.get(i, j), matrix.get(j, i));
            }
        }
    }

    #[test]
    fn perfect_and_inverse_relationships_hit_the_extremes() {
        let matrix = build(&pivot_frame(), None).unwrap();
        // BTreeMap keying sorts indicators: X, Y, Z.
        assert_eq!(matrix.indicators, vec!["X", "Y", "Z"]);
        assert!((matrix.get(0, 1).unwrap() - 1.0).abs() < 1e-9);
        assert!((matrix.get(0, 2).unwrap() + 1.0).abs() < 1e-9);
    }

    #[test]
    fn one_entry_allowlist_is_insufficient_not_a_1x1_matrix() {
        let allow = vec!["X".to_string()];
        let err = build(&pivot_frame(), Some(&allow)).unwrap_err();
        assert!(matches!(
            err,
            CorrelationError::InsufficientColumns { available: 1 }
        ));
    }

    #[test]
    fn allowlist_entries_absent_from_the_frame_are_ignored() {
        let allow = vec!["X".to_string(), "Y".to_string(), "Q".to_string()];
        let matrix = build(&pivot_frame(), Some(&allow)).unwrap();
        assert_eq!(matrix.indicators, vec!["X", "Y"]);
    }

    #[test]
    fn sparse_indicators_fall_below_the_coverage_cutoff() {
        let df = df!(
            "state" => ["A", "B", "C", "D", "A", "B", "C", "D", "A"],
            "indicator" => ["X", "X", "X", "X", "Y", "Y", "Y", "Y", "S"],
            "nfhs5_total" => [Some(1.0), Some(2.0), Some(3.0), Some(4.0),
                              Some(2.0), Some(3.0), Some(5.0), Some(9.0),
                              Some(7.0)],
        )
        .unwrap();

        let matrix = build(&df, None).unwrap();
        assert_eq!(matrix.indicators, vec!["X", "Y"]);
    }

    #[test]
    fn duplicate_state_rows_collapse_by_mean() {
        // A's duplicate X rows average to 2.0, giving X == Y exactly.
        let df = df!(
            "state" => ["A", "A", "B", "C", "A", "B", "C"],
            "indicator" => ["X", "X", "X", "X", "Y", "Y", "Y"],
            "nfhs5_total" => [1.0, 3.0, 4.0, 6.0, 2.0, 4.0, 6.0],
        )
        .unwrap();

        let matrix = build(&df, None).unwrap();
        assert!((matrix.get(0, 1).unwrap() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn zero_variance_columns_yield_undefined_cells() {
        let df = df!(
            "state" => ["A", "B", "C", "A", "B", "C"],
            "indicator" => ["X", "X", "X", "F", "F", "F"],
            "nfhs5_total" => [1.0, 2.0, 3.0, 5.0, 5.0, 5.0],
        )
        .unwrap();

        let matrix = build(&df, None).unwrap();
        let flat = matrix.indicators.iter().position(|n| n == "F").unwrap();
        let x = matrix.indicators.iter().position(|n| n == "X").unwrap();
        assert_eq!(matrix.get(flat, x), None);
        assert_eq!(matrix.get(flat, flat), None);
        assert!((matrix.get(x, x).unwrap() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn missing_value_column_is_reported_by_name() {
        let err = CorrelationBuilder::build_matrix(
            &pivot_frame(),
            "state",
            "indicator",
            "nfhs9_total",
            None,
            0.5,
        )
        .unwrap_err();
        assert!(matches!(err, CorrelationError::MissingColumn(c) if c == "nfhs9_total"));
    }
}
