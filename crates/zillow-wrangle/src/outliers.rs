//! IQR outlier removal.
//!
//! Columns are filtered one after another, and each column's quartiles are
//! computed on the rows that survived the previous columns. This sequential
//! narrowing means the order of `columns` changes the result, and a second call
//! on the output may still remove rows because the quartiles shift. The
//! behaviour may have started as an accident of reassigning one dataframe
//! inside a loop; it is kept as-is so results match existing analyses.

use crate::error::{Result, WrangleError};
use crate::utils::f64_values;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Bounds applied to one column during a filter pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlierBounds {
    pub column: String,
    pub q1: f64,
    pub q3: f64,
    pub lower: f64,
    pub upper: f64,
    /// Rows removed by this column, after earlier columns were applied.
    pub rows_removed: usize,
}

impl OutlierBounds {
    /// Compute bounds from a column's values with multiplier `k`.
    pub fn from_values(column: &str, values: &[f64], k: f64) -> Result<Self> {
        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));

        let empty = || {
            WrangleError::EmptyPartition(format!(
                "no rows left to compute quartiles of '{column}'"
            ))
        };
        let q1 = quantile_sorted(&sorted, 0.25).ok_or_else(empty)?;
        let q3 = quantile_sorted(&sorted, 0.75).ok_or_else(empty)?;
        let iqr = q3 - q1;

        Ok(Self {
            column: column.to_string(),
            q1,
            q3,
            lower: q1 - k * iqr,
            upper: q3 + k * iqr,
            rows_removed: 0,
        })
    }

    /// Whether a value survives. Both bounds are exclusive.
    #[inline]
    pub fn contains(&self, value: f64) -> bool {
        value > self.lower && value < self.upper
    }
}

/// Filtered dataset plus the bounds used, in filtering order.
#[derive(Debug, Clone)]
pub struct OutlierOutcome {
    pub data: DataFrame,
    pub bounds: Vec<OutlierBounds>,
}

/// Remove rows outside `[Q1 - k*IQR, Q3 + k*IQR]` (exclusive) for each column
/// in order, narrowing the data as it goes.
pub fn remove_outliers(df: &DataFrame, k: f64, columns: &[String]) -> Result<OutlierOutcome> {
    if !k.is_finite() || k < 0.0 {
        return Err(WrangleError::InvalidConfig(format!(
            "outlier multiplier must be finite and non-negative, got {k}"
        )));
    }

    let original_rows = df.height();
    let mut current = df.clone();
    let mut applied = Vec::with_capacity(columns.len());

    for name in columns {
        let values = f64_values(&current, name)?;
        let mut bounds = OutlierBounds::from_values(name, &values, k)?;

        let mask_values: Vec<bool> = values.iter().map(|v| bounds.contains(*v)).collect();
        let mask = BooleanChunked::from_slice("mask".into(), &mask_values);

        let before = current.height();
        current = current.filter(&mask)?;
        bounds.rows_removed = before - current.height();

        debug!(
            "'{}': q1={} q3={} bounds=({}, {}) removed {} rows",
            name, bounds.q1, bounds.q3, bounds.lower, bounds.upper, bounds.rows_removed
        );
        applied.push(bounds);
    }

    info!(
        "Outlier removal kept {} of {} rows",
        current.height(),
        original_rows
    );

    Ok(OutlierOutcome {
        data: current,
        bounds: applied,
    })
}

/// Quantile of sorted data, interpolating linearly between closest ranks.
///
/// Returns `None` for empty input.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> Option<f64> {
    let last = sorted.len().checked_sub(1)?;
    let position = q * last as f64;
    let lo = position.floor() as usize;
    let hi = position.ceil() as usize;
    let fraction = position - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * fraction)
}
