//! Canonical column names.
//!
//! The acquisition query delivers source names (`parcelid`, `fips`, ...). The
//! labelled variant of the pipeline renames them to human-readable labels.
//! Stages never hardcode either spelling; they take a [`ColumnSet`].

use serde::Serialize;

/// Row-identity column carried by every dataset in the pipeline.
pub const INDEX_COLUMN: &str = "row_id";

/// Boolean column produced by coastal detection.
pub const IS_COASTAL: &str = "is_coastal";

/// Boolean column produced by the cool-area detection.
pub const COOL_PLACES: &str = "cool_places";

/// Names of the columns the pipeline operates on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ColumnSet {
    pub parcel_id: &'static str,
    pub county: &'static str,
    pub latitude: &'static str,
    pub longitude: &'static str,
    pub home_value: &'static str,
    pub target: &'static str,
    pub baths: &'static str,
    pub beds: &'static str,
    pub finished_area: &'static str,
}

impl ColumnSet {
    /// Names as delivered by the acquisition query.
    pub const SOURCE: ColumnSet = ColumnSet {
        parcel_id: "parcelid",
        county: "fips",
        latitude: "latitude",
        longitude: "longitude",
        home_value: "taxvaluedollarcnt",
        target: "logerror",
        baths: "bathroomcnt",
        beds: "bedroomcnt",
        finished_area: "calculatedfinishedsquarefeet",
    };

    /// Human-readable labels used by the labelled pipeline variant.
    pub const LABELED: ColumnSet = ColumnSet {
        parcel_id: "Parcel.ID",
        county: "County",
        latitude: "Latitude",
        longitude: "Longitude",
        home_value: "Home.Value",
        target: "Prediction.Error",
        baths: "Baths",
        beds: "Beds",
        finished_area: "Finished.Area",
    };

    /// Pick the set matching the `rename_columns` switch.
    pub fn for_rename(rename_columns: bool) -> ColumnSet {
        if rename_columns {
            Self::LABELED
        } else {
            Self::SOURCE
        }
    }

    /// All nine columns, in acquisition order.
    pub fn all(&self) -> [&'static str; 9] {
        [
            self.parcel_id,
            self.county,
            self.latitude,
            self.longitude,
            self.home_value,
            self.target,
            self.baths,
            self.beds,
            self.finished_area,
        ]
    }

    /// The four core numeric features filtered for outliers and scaled.
    pub fn core_features(&self) -> [&'static str; 4] {
        [self.home_value, self.baths, self.beds, self.finished_area]
    }
}

/// Map a county FIPS code to its name.
///
/// Only the three counties in the source data are known; anything else maps to
/// `None`.
pub fn county_name(fips: &str) -> Option<&'static str> {
    match fips {
        "6037" => Some("LA"),
        "6059" => Some("Orange"),
        "6111" => Some("Ventura"),
        _ => None,
    }
}

/// Column name used for a scaled copy of `column` in the exploration frame.
pub fn scaled_column_name(column: &str) -> String {
    match column {
        IS_COASTAL => "Is.Coastal.Scaled".to_string(),
        COOL_PLACES => "Is.Cool.Place.Scaled".to_string(),
        other => format!("{other}.Scaled"),
    }
}
