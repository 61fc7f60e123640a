//! Acquisition queries and their post-processing.

use crate::error::Result;
use crate::utils::{column_exists, require_column};
use polars::prelude::*;
use tracing::info;

/// Database holding the property and prediction tables.
pub const DATABASE: &str = "zillow";

const MVP_QUERY: &str = "
SELECT propertylandusetypeid, parcelid, fips, latitude, longitude, taxvaluedollarcnt,
       logerror, bathroomcnt, bedroomcnt, calculatedfinishedsquarefeet
FROM properties_2017
JOIN predictions_2017 USING(parcelid)
WHERE (transactiondate BETWEEN '2017-01-01' AND '2017-12-31')
  AND (latitude IS NOT NULL)
  AND (longitude IS NOT NULL)
  AND propertylandusetypeid = 261
";

const FULL_QUERY: &str = "
SELECT *, properties_2017.id AS property_id, predictions_2017.id AS transaction_id
FROM properties_2017
JOIN predictions_2017 USING(parcelid)
LEFT JOIN airconditioningtype USING(airconditioningtypeid)
LEFT JOIN architecturalstyletype USING(architecturalstyletypeid)
LEFT JOIN buildingclasstype USING(buildingclasstypeid)
LEFT JOIN heatingorsystemtype USING(heatingorsystemtypeid)
LEFT JOIN propertylandusetype USING(propertylandusetypeid)
LEFT JOIN storytype USING(storytypeid)
LEFT JOIN typeconstructiontype USING(typeconstructiontypeid)
LEFT JOIN unique_properties USING(parcelid)
WHERE (transactiondate BETWEEN '2017-01-01' AND '2017-12-31')
  AND (latitude IS NOT NULL)
  AND (longitude IS NOT NULL)
  AND propertylandusedesc = 'Single Family Residential'
";

const PARCEL_ID: &str = "parcelid";
const TRANSACTION_DATE: &str = "transactiondate";

/// Which acquisition query to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueryVariant {
    /// The nine modelling columns, single-family land use code 261.
    #[default]
    Mvp,
    /// Every property column plus lookup descriptions, one row per parcel.
    Full,
}

impl QueryVariant {
    pub fn sql(&self) -> &'static str {
        match self {
            Self::Mvp => MVP_QUERY,
            Self::Full => FULL_QUERY,
        }
    }

    /// Conventional cache file name for this variant.
    pub fn cache_file_name(&self) -> &'static str {
        match self {
            Self::Mvp => "MVP_zillow.csv",
            Self::Full => "fresh_zillow.csv",
        }
    }

    /// Shape the raw query result.
    pub fn postprocess(&self, df: DataFrame) -> Result<DataFrame> {
        match self {
            Self::Mvp => drop_if_present(df, "propertylandusetypeid"),
            Self::Full => drop_if_present(keep_latest_transactions(&df)?, "id"),
        }
    }
}

fn drop_if_present(df: DataFrame, name: &str) -> Result<DataFrame> {
    if column_exists(&df, name) {
        Ok(df.drop(name)?)
    } else {
        Ok(df)
    }
}

/// Keep, per parcel, the rows dated on that parcel's latest transaction.
///
/// Several rows sharing the latest date all survive. Output is ordered by
/// parcel id with `parcelid` and `transactiondate` leading.
pub fn keep_latest_transactions(df: &DataFrame) -> Result<DataFrame> {
    require_column(df, PARCEL_ID)?;
    require_column(df, TRANSACTION_DATE)?;

    let latest = df
        .clone()
        .lazy()
        .group_by([col(PARCEL_ID)])
        .agg([col(TRANSACTION_DATE).max()]);

    let kept = latest
        .join(
            df.clone().lazy(),
            [col(PARCEL_ID), col(TRANSACTION_DATE)],
            [col(PARCEL_ID), col(TRANSACTION_DATE)],
            JoinArgs::new(JoinType::Inner),
        )
        .sort(
            [PARCEL_ID],
            SortMultipleOptions::default().with_maintain_order(true),
        )
        .collect()?;

    info!(
        "Kept {} of {} transactions (latest per parcel)",
        kept.height(),
        df.height()
    );
    Ok(kept)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn transactions() -> DataFrame {
        df![
            "id" => [10i64, 11, 12, 13, 14, 15],
            "parcelid" => [2i64, 1, 2, 1, 2, 3],
            "transactiondate" => [
                "2017-03-01", "2017-01-01", "2017-03-01", "2017-05-01", "2017-02-01", "2017-07-04",
            ],
            "logerror" => [0.1, 0.2, 0.3, 0.4, 0.5, 0.6],
        ]
        .unwrap()
    }

    #[test]
    fn test_keep_latest_transactions() {
        let kept = keep_latest_transactions(&transactions()).unwrap();

        let names: Vec<&str> = kept.get_column_names().iter().map(|c| c.as_str()).collect();
        assert_eq!(&names[..2], &["parcelid", "transactiondate"]);

        let parcels: Vec<i64> = kept
            .column("parcelid")
            .unwrap()
            .i64()
            .unwrap()
            .into_no_null_iter()
            .collect();
        assert_eq!(parcels, vec![1, 2, 2, 3]);

        // Both rows tied on parcel 2's latest date survive.
        let mut ids: Vec<i64> = kept
            .column("id")
            .unwrap()
            .i64()
            .unwrap()
            .into_no_null_iter()
            .collect();
        ids.sort();
        assert_eq!(ids, vec![10, 12, 13, 15]);
    }

    #[test]
    fn test_full_postprocess_drops_id() {
        let out = QueryVariant::Full.postprocess(transactions()).unwrap();
        assert!(!column_exists(&out, "id"));
        assert_eq!(out.height(), 4);
    }

    #[test]
    fn test_mvp_postprocess_drops_land_use() {
        let df = df![
            "propertylandusetypeid" => [261i64, 261],
            "parcelid" => [1i64, 2],
        ]
        .unwrap();
        let out = QueryVariant::Mvp.postprocess(df).unwrap();
        assert_eq!(out.width(), 1);
        assert!(column_exists(&out, "parcelid"));
    }

    #[test]
    fn test_queries_filter_2017_transactions() {
        for variant in [QueryVariant::Mvp, QueryVariant::Full] {
            assert!(variant.sql().contains("'2017-01-01' AND '2017-12-31'"));
            assert!(variant.sql().contains("latitude IS NOT NULL"));
        }
        assert!(QueryVariant::Mvp.sql().contains("propertylandusetypeid = 261"));
        assert!(QueryVariant::Full.sql().contains("'Single Family Residential'"));
    }
}
