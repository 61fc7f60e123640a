//! Partition containers and the pipeline's output and summary types.

use crate::outliers::OutlierBounds;
use crate::scale::FittedScaler;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// The train/validate/test triple.
#[derive(Debug, Clone, PartialEq)]
pub struct Partitions<T> {
    pub train: T,
    pub validate: T,
    pub test: T,
}

impl<T> Partitions<T> {
    pub fn new(train: T, validate: T, test: T) -> Self {
        Self {
            train,
            validate,
            test,
        }
    }

    /// Apply `f` to each partition, stopping at the first error.
    pub fn try_map<U, E>(
        &self,
        mut f: impl FnMut(&str, &T) -> Result<U, E>,
    ) -> Result<Partitions<U>, E> {
        Ok(Partitions {
            train: f("train", &self.train)?,
            validate: f("validate", &self.validate)?,
            test: f("test", &self.test)?,
        })
    }

    /// Iterate `(name, partition)` pairs in train, validate, test order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &T)> {
        [
            ("train", &self.train),
            ("validate", &self.validate),
            ("test", &self.test),
        ]
        .into_iter()
    }
}

/// Features and target of one partition, aligned on the row-id column.
#[derive(Debug, Clone)]
pub struct FeatureTarget {
    /// Every column except the target (row id included).
    pub features: DataFrame,
    /// Row id and target column.
    pub target: DataFrame,
}

/// Row counts of the three partitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionSizes {
    pub train: usize,
    pub validate: usize,
    pub test: usize,
}

impl From<&Partitions<DataFrame>> for PartitionSizes {
    fn from(partitions: &Partitions<DataFrame>) -> Self {
        Self {
            train: partitions.train.height(),
            validate: partitions.validate.height(),
            test: partitions.test.height(),
        }
    }
}

/// Summary of a pipeline run, suitable for logging or JSON output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WrangleSummary {
    /// Timestamp when the run finished
    pub generated_at: String,
    /// Total execution time in milliseconds
    pub duration_ms: u64,
    /// Rows handed to the pipeline
    pub rows_loaded: usize,
    /// Rows left after dropping nulls
    pub rows_after_null_drop: usize,
    /// Rows left after outlier removal
    pub rows_after_outliers: usize,
    /// Bounds applied by each outlier pass, in order
    pub outlier_bounds: Vec<OutlierBounds>,
    /// Rows flagged `is_coastal`, if geo features were derived
    pub coastal_rows: Option<usize>,
    /// Rows flagged `cool_places`, if geo features were derived
    pub cool_place_rows: Option<usize>,
    /// Partition row counts
    pub partition_sizes: PartitionSizes,
    /// Columns scaled, in output order
    pub scaled_columns: Vec<String>,
    /// Warnings raised during the run
    pub warnings: Vec<String>,
}

impl WrangleSummary {
    /// Share of loaded rows that did not survive cleaning, in percent.
    pub fn rows_removed_percentage(&self) -> f64 {
        if self.rows_loaded == 0 {
            return 0.0;
        }
        let removed = self.rows_loaded.saturating_sub(self.rows_after_outliers);
        removed as f64 / self.rows_loaded as f64 * 100.0
    }
}

/// Everything a pipeline run produces, in the order analysts consume it.
#[derive(Debug, Clone)]
pub struct WrangleOutput {
    /// Full cleaned dataset (nulls dropped, normalized, outliers removed,
    /// geo flags added when enabled).
    pub cleaned: DataFrame,
    /// Unscaled training features with the target and the scaled columns
    /// appended, for exploration.
    pub train_exploration: DataFrame,
    pub x_train: DataFrame,
    pub y_train: DataFrame,
    pub x_validate: DataFrame,
    pub y_validate: DataFrame,
    pub x_test: DataFrame,
    pub y_test: DataFrame,
    /// Scaled feature snapshots per partition.
    pub scaled: Partitions<DataFrame>,
    /// Scaler fitted on the training features.
    pub scaler: FittedScaler,
    pub summary: WrangleSummary,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_try_map_stops_on_error() {
        let parts = Partitions::new(1, 2, 3);
        let doubled: Result<Partitions<i32>, String> = parts.try_map(|_, v| Ok(v * 2));
        assert_eq!(doubled.unwrap(), Partitions::new(2, 4, 6));

        let failed: Result<Partitions<i32>, String> = parts.try_map(|name, v| {
            if name == "validate" {
                Err(format!("bad {v}"))
            } else {
                Ok(*v)
            }
        });
        assert_eq!(failed.unwrap_err(), "bad 2");
    }

    #[test]
    fn test_rows_removed_percentage() {
        let summary = WrangleSummary {
            generated_at: String::new(),
            duration_ms: 0,
            rows_loaded: 200,
            rows_after_null_drop: 190,
            rows_after_outliers: 150,
            outlier_bounds: vec![],
            coastal_rows: None,
            cool_place_rows: None,
            partition_sizes: PartitionSizes {
                train: 90,
                validate: 30,
                test: 30,
            },
            scaled_columns: vec![],
            warnings: vec![],
        };
        assert_eq!(summary.rows_removed_percentage(), 25.0);
    }
}
