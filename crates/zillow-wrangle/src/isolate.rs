//! Feature/target separation.

use crate::error::{Result, WrangleError};
use crate::schema::INDEX_COLUMN;
use crate::types::{FeatureTarget, Partitions};
use crate::utils::require_column;
use polars::prelude::*;

/// Split one partition into features and target.
///
/// Features keep every column except `target`, row id included. The target
/// frame holds the row id and the target column, so both sides stay aligned
/// row by row.
pub fn isolate_partition(df: &DataFrame, target: &str) -> Result<FeatureTarget> {
    if target == INDEX_COLUMN {
        return Err(WrangleError::InvalidConfig(format!(
            "'{INDEX_COLUMN}' cannot be the target column"
        )));
    }
    require_column(df, target)?;
    require_column(df, INDEX_COLUMN)?;

    Ok(FeatureTarget {
        features: df.drop(target)?,
        target: df.select([INDEX_COLUMN, target])?,
    })
}

/// Apply [`isolate_partition`] to each of train, validate and test.
pub fn isolate_target(
    target: &str,
    partitions: &Partitions<DataFrame>,
) -> Result<Partitions<FeatureTarget>> {
    partitions.try_map(|name, df| {
        isolate_partition(df, target).map_err(|e| e.with_context(format!("{name} partition")))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn partition(ids: &[u32]) -> DataFrame {
        let values: Vec<f64> = ids.iter().map(|i| *i as f64 / 100.0).collect();
        let beds: Vec<i64> = ids.iter().map(|i| *i as i64 % 5).collect();
        df![
            INDEX_COLUMN => ids,
            "Beds" => beds,
            "Prediction.Error" => values,
        ]
        .unwrap()
    }

    #[test]
    fn test_isolate_partition() {
        let out = isolate_partition(&partition(&[4, 2, 9]), "Prediction.Error").unwrap();

        let feature_names: Vec<&str> = out
            .features
            .get_column_names()
            .iter()
            .map(|c| c.as_str())
            .collect();
        assert_eq!(feature_names, vec![INDEX_COLUMN, "Beds"]);

        let target_names: Vec<&str> = out
            .target
            .get_column_names()
            .iter()
            .map(|c| c.as_str())
            .collect();
        assert_eq!(target_names, vec![INDEX_COLUMN, "Prediction.Error"]);

        let feature_ids = out.features.column(INDEX_COLUMN).unwrap();
        let target_ids = out.target.column(INDEX_COLUMN).unwrap();
        assert!(
            feature_ids
                .as_materialized_series()
                .equals(target_ids.as_materialized_series())
        );
        assert_eq!(
            out.target.column("Prediction.Error").unwrap().f64().unwrap().get(2),
            Some(0.09)
        );
    }

    #[test]
    fn test_isolate_missing_target() {
        let err = isolate_partition(&partition(&[1]), "logerror").unwrap_err();
        assert!(matches!(err, WrangleError::ColumnNotFound(name) if name == "logerror"));
    }

    #[test]
    fn test_isolate_rejects_index_as_target() {
        let err = isolate_partition(&partition(&[1]), INDEX_COLUMN).unwrap_err();
        assert!(matches!(err, WrangleError::InvalidConfig(_)));
    }

    #[test]
    fn test_isolate_target_reports_partition() {
        let parts = Partitions::new(
            partition(&[1, 2]),
            partition(&[3]),
            df!["Beds" => [1i64]].unwrap(),
        );
        let err = isolate_target("Prediction.Error", &parts).unwrap_err();
        assert!(err.to_string().starts_with("test partition"));
        assert!(matches!(err.root(), WrangleError::ColumnNotFound(_)));
    }
}
