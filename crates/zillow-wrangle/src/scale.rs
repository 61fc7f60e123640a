//! Standard scaling.
//!
//! [`StandardScaler::fit`] learns per-column mean and population standard
//! deviation from the training features only. The resulting [`FittedScaler`]
//! is then applied to train, validate and test alike.

use crate::error::{Result, WrangleError};
use crate::utils::{f64_values, require_column, require_no_nulls};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Unfitted scaler over a fixed, ordered list of columns.
#[derive(Debug, Clone, PartialEq)]
pub struct StandardScaler {
    columns: Vec<String>,
}

impl StandardScaler {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }

    /// Learn mean and scale of every column from `train`.
    pub fn fit(&self, train: &DataFrame) -> Result<FittedScaler> {
        if train.height() == 0 {
            return Err(WrangleError::EmptyPartition(
                "cannot fit a scaler on zero rows".to_string(),
            ));
        }

        let mut means = Vec::with_capacity(self.columns.len());
        let mut scales = Vec::with_capacity(self.columns.len());
        for name in &self.columns {
            let values = encoded_values(train, name)?;
            let n = values.len() as f64;
            let mean = values.iter().sum::<f64>() / n;
            let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
            let std = variance.sqrt();
            let scale = if std == 0.0 { 1.0 } else { std };

            debug!("Scaler '{}': mean={:.4}, scale={:.4}", name, mean, scale);
            means.push(mean);
            scales.push(scale);
        }

        Ok(FittedScaler {
            columns: self.columns.clone(),
            means,
            scales,
        })
    }
}

/// Scaler with statistics learned from a training partition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedScaler {
    columns: Vec<String>,
    means: Vec<f64>,
    scales: Vec<f64>,
}

impl FittedScaler {
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn means(&self) -> &[f64] {
        &self.means
    }

    /// Standard deviations, with zero replaced by 1.
    pub fn scales(&self) -> &[f64] {
        &self.scales
    }

    /// Standardise the fitted columns of `df`.
    ///
    /// Returns only the scaled columns, all `Float64`, in fitted order. Row
    /// order follows `df`.
    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        let mut columns = Vec::with_capacity(self.columns.len());
        for ((name, mean), scale) in self.columns.iter().zip(&self.means).zip(&self.scales) {
            let scaled: Vec<f64> = encoded_values(df, name)?
                .into_iter()
                .map(|v| (v - mean) / scale)
                .collect();
            columns.push(Column::new(name.as_str().into(), scaled));
        }
        Ok(DataFrame::new(columns)?)
    }
}

/// Column values as `f64`. Boolean flags encode `true` as 0 and `false` as 1.
fn encoded_values(df: &DataFrame, name: &str) -> Result<Vec<f64>> {
    let column = require_column(df, name)?;
    if column.dtype() == &DataType::Boolean {
        require_no_nulls(column)?;
        return Ok(column
            .bool()?
            .into_no_null_iter()
            .map(|flag| if flag { 0.0 } else { 1.0 })
            .collect());
    }
    f64_values(df, name)
}
