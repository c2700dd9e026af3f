//! Indicator Comparator Module
//! Pure ranking and round-over-round comparison over the survey frame.
//! No I/O, no rendering; every result is recomputed per selection.

use polars::prelude::*;
use std::cmp::Ordering;
use thiserror::Error;

use crate::data::RoundColumnPair;

#[derive(Error, Debug)]
pub enum CompareError {
    #[error("Column '{0}' not found in dataset")]
    MissingColumn(String),
    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankDirection {
    Top,
    Bottom,
}

/// One state's value for a single round column. A missing or
/// non-convertible cell is `None`, never NaN.
#[derive(Debug, Clone, PartialEq)]
pub struct StateValue {
    pub state: String,
    pub value: Option<f64>,
}

/// One state's round-over-round deltas. `percent_change` is undefined
/// (`None`) when the baseline is missing or zero.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeRecord {
    pub state: String,
    pub from_value: Option<f64>,
    pub to_value: Option<f64>,
    pub absolute_change: Option<f64>,
    pub percent_change: Option<f64>,
}

/// Stateless comparison and ranking over the loaded frame.
pub struct IndicatorComparator;

impl IndicatorComparator {
    /// Rows whose indicator column equals `name` (case-sensitive exact
    /// match), original order preserved. An empty result is valid.
    pub fn filter_by_indicator(
        df: &DataFrame,
        indicator_col: &str,
        name: &str,
    ) -> Result<DataFrame, CompareError> {
        if df.column(indicator_col).is_err() {
            return Err(CompareError::MissingColumn(indicator_col.to_string()));
        }

        let filtered = df
            .clone()
            .lazy()
            .filter(col(indicator_col).eq(lit(name)))
            .collect()?;
        Ok(filtered)
    }

    /// Extract one numeric column aligned with state names. Cells that are
    /// null or fail the cast to f64 become `None`; NaN is normalized to
    /// `None` so it can never leak into sorting. Rows without a state name
    /// are dropped.
    pub fn state_values(
        df: &DataFrame,
        state_col: &str,
        column: &str,
    ) -> Result<Vec<StateValue>, CompareError> {
        let states = df
            .column(state_col)
            .map_err(|_| CompareError::MissingColumn(state_col.to_string()))?;
        let values_f64 = df
            .column(column)
            .map_err(|_| CompareError::MissingColumn(column.to_string()))?
            .cast(&DataType::Float64)?;
        let values = values_f64.f64()?;

        let mut rows = Vec::with_capacity(df.height());
        for i in 0..df.height() {
            let Ok(state) = states.get(i) else { continue };
            if state.is_null() {
                continue;
            }
            rows.push(StateValue {
                state: state.to_string().trim_matches('"').to_string(),
                value: values.get(i).filter(|v| !v.is_nan()),
            });
        }
        Ok(rows)
    }

    /// First `n` rows after a stable sort by value: descending for Top,
    /// ascending for Bottom, missing values last in either direction, tied
    /// values keeping their source order.
    pub fn rank_by_column(
        rows: &[StateValue],
        n: usize,
        direction: RankDirection,
    ) -> Vec<StateValue> {
        let mut ranked = rows.to_vec();
        ranked.sort_by(|a, b| Self::order_values(a.value, b.value, direction));
        ranked.truncate(n);
        ranked
    }

    /// Per-row deltas between the two columns of a round pair. Preserves
    /// input row count and order.
    pub fn compute_change(
        df: &DataFrame,
        state_col: &str,
        pair: &RoundColumnPair,
    ) -> Result<Vec<ChangeRecord>, CompareError> {
        let from_rows = Self::state_values(df, state_col, &pair.from)?;
        let to_rows = Self::state_values(df, state_col, &pair.to)?;

        let records = from_rows
            .into_iter()
            .zip(to_rows)
            .map(|(from, to)| Self::change_record(from.state, from.value, to.value))
            .collect();
        Ok(records)
    }

    fn change_record(state: String, from: Option<f64>, to: Option<f64>) -> ChangeRecord {
        let absolute_change = match (from, to) {
            (Some(f), Some(t)) => Some(t - f),
            _ => None,
        };
        let percent_change = match (from, absolute_change) {
            (Some(f), Some(abs)) if f != 0.0 => Some(abs / f * 100.0),
            _ => None,
        };
        ChangeRecord {
            state,
            from_value: from,
            to_value: to,
            absolute_change,
            percent_change,
        }
    }

    /// Rank by percent change. Unlike `rank_by_column`, rows without a
    /// defined percent change are excluded entirely, not sorted last: an
    /// undefined ratio must never occupy a top/bottom slot.
    pub fn rank_by_change(
        records: &[ChangeRecord],
        n: usize,
        direction: RankDirection,
    ) -> Vec<ChangeRecord> {
        let mut ranked: Vec<ChangeRecord> = records
            .iter()
            .filter(|r| r.percent_change.is_some())
            .cloned()
            .collect();
        ranked.sort_by(|a, b| Self::order_values(a.percent_change, b.percent_change, direction));
        ranked.truncate(n);
        ranked
    }

    /// Mean of the present values; `None` when every value is missing.
    /// Missing values are excluded from both sum and count.
    pub fn national_average(rows: &[StateValue]) -> Option<f64> {
        let present: Vec<f64> = rows.iter().filter_map(|r| r.value).collect();
        if present.is_empty() {
            return None;
        }
        Some(present.iter().sum::<f64>() / present.len() as f64)
    }

    fn order_values(a: Option<f64>, b: Option<f64>, direction: RankDirection) -> Ordering {
        match (a, b) {
            (Some(x), Some(y)) => {
                let ord = x.partial_cmp(&y).unwrap_or(Ordering::Equal);
                match direction {
                    RankDirection::Top => ord.reverse(),
                    RankDirection::Bottom => ord,
                }
            }
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sv(state: &str, value: Option<f64>) -> StateValue {
        StateValue {
            state: state.to_string(),
            value,
        }
    }

    fn survey_frame() -> DataFrame {
        df!(
            "state" => ["A", "B", "C", "D"],
            "indicator" => ["X", "X", "X", "Y"],
            "nfhs4_total" => [Some(50.0), Some(0.0), Some(40.0), Some(10.0)],
            "nfhs5_total" => [Some(60.0), Some(10.0), None, Some(12.0)],
        )
        .unwrap()
    }

    fn pair() -> RoundColumnPair {
        RoundColumnPair {
            from: "nfhs4_total".to_string(),
            to: "nfhs5_total".to_string(),
        }
    }

    #[test]
    fn filter_is_exact_and_order_preserving() {
        let df = survey_frame();
        let sub = IndicatorComparator::filter_by_indicator(&df, "indicator", "X").unwrap();
        let rows = IndicatorComparator::state_values(&sub, "state", "nfhs4_total").unwrap();
        assert_eq!(
            rows,
            vec![sv("A", Some(50.0)), sv("B", Some(0.0)), sv("C", Some(40.0))]
        );
    }

    #[test]
    fn filter_with_no_match_is_empty_not_an_error() {
        let df = survey_frame();
        let sub = IndicatorComparator::filter_by_indicator(&df, "indicator", "missing").unwrap();
        assert_eq!(sub.height(), 0);
    }

    #[test]
    fn missing_columns_are_reported_by_name() {
        let df = survey_frame();
        let err = IndicatorComparator::filter_by_indicator(&df, "nope", "X").unwrap_err();
        assert!(matches!(err, CompareError::MissingColumn(c) if c == "nope"));

        let err = IndicatorComparator::state_values(&df, "state", "nfhs3_total").unwrap_err();
        assert!(matches!(err, CompareError::MissingColumn(c) if c == "nfhs3_total"));
    }

    #[test]
    fn rank_sorts_missing_last_in_both_directions() {
        let rows = vec![
            sv("A", Some(10.0)),
            sv("B", None),
            sv("C", Some(30.0)),
            sv("D", Some(20.0)),
        ];

        let top = IndicatorComparator::rank_by_column(&rows, 4, RankDirection::Top);
        let order: Vec<&str> = top.iter().map(|r| r.state.as_str()).collect();
        assert_eq!(order, vec!["C", "D", "A", "B"]);

        let bottom = IndicatorComparator::rank_by_column(&rows, 4, RankDirection::Bottom);
        let order: Vec<&str> = bottom.iter().map(|r| r.state.as_str()).collect();
        assert_eq!(order, vec!["A", "D", "C", "B"]);
    }

    #[test]
    fn rank_is_stable_for_ties_and_clamps_n() {
        let rows = vec![sv("A", Some(5.0)), sv("B", Some(5.0)), sv("C", Some(5.0))];

        let top = IndicatorComparator::rank_by_column(&rows, 2, RankDirection::Top);
        let order: Vec<&str> = top.iter().map(|r| r.state.as_str()).collect();
        assert_eq!(order, vec!["A", "B"]);

        let all = IndicatorComparator::rank_by_column(&rows, 10, RankDirection::Bottom);
        assert_eq!(all.len(), 3);
    }

    #[test]
    fn top_and_bottom_are_disjoint_for_enough_distinct_values() {
        let rows: Vec<StateValue> = (0..6).map(|i| sv(&format!("S{i}"), Some(i as f64))).collect();

        let top = IndicatorComparator::rank_by_column(&rows, 3, RankDirection::Top);
        let bottom = IndicatorComparator::rank_by_column(&rows, 3, RankDirection::Bottom);
        for t in &top {
            assert!(bottom.iter().all(|b| b.state != t.state));
        }
    }

    #[test]
    fn change_handles_zero_and_missing_baselines() {
        let df = survey_frame();
        let sub = IndicatorComparator::filter_by_indicator(&df, "indicator", "X").unwrap();
        let records = IndicatorComparator::compute_change(&sub, "state", &pair()).unwrap();
        assert_eq!(records.len(), 3);

        // A: 50 -> 60
        assert_eq!(records[0].absolute_change, Some(10.0));
        assert_eq!(records[0].percent_change, Some(20.0));
        // B: zero baseline, ratio undefined
        assert_eq!(records[1].absolute_change, Some(10.0));
        assert_eq!(records[1].percent_change, None);
        // C: missing later round
        assert_eq!(records[2].absolute_change, None);
        assert_eq!(records[2].percent_change, None);
    }

    #[test]
    fn change_is_idempotent() {
        let df = survey_frame();
        let first = IndicatorComparator::compute_change(&df, "state", &pair()).unwrap();
        let second = IndicatorComparator::compute_change(&df, "state", &pair()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn rank_by_change_excludes_undefined_ratios() {
        let df = survey_frame();
        let sub = IndicatorComparator::filter_by_indicator(&df, "indicator", "X").unwrap();
        let records = IndicatorComparator::compute_change(&sub, "state", &pair()).unwrap();

        let top = IndicatorComparator::rank_by_change(&records, 2, RankDirection::Top);
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].state, "A");
    }

    #[test]
    fn national_average_excludes_missing_from_sum_and_count() {
        let rows = vec![sv("A", Some(10.0)), sv("B", None), sv("C", Some(30.0))];
        assert_eq!(IndicatorComparator::national_average(&rows), Some(20.0));

        let empty = vec![sv("A", None), sv("B", None)];
        assert_eq!(IndicatorComparator::national_average(&empty), None);
        assert_eq!(IndicatorComparator::national_average(&[]), None);
    }
}
