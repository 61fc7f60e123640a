//! Geographic feature engineering.
//!
//! Two boolean flags derived from raw coordinates (degrees scaled by 1e6):
//!
//! - `is_coastal`: westmost point of its latitude band in the south and
//!   southmost point of its longitude band in the east, found by grouping on
//!   coarsened ("relaxed") coordinates.
//! - `cool_places`: coastal, or inside one of five hand-picked rectangles.
//!
//! The thresholds were fitted by eye during exploration. They are data, not a
//! geofencing model, and must stay exactly as written.

use crate::error::Result;
use crate::schema::{COOL_PLACES, IS_COASTAL};
use crate::utils::{i64_values, require_column, require_no_nulls};
use polars::prelude::*;
use std::collections::HashMap;
use tracing::{debug, info};

/// Relaxed latitudes at or below this belong to the southern coastline.
const SOUTHERN_RELAXED_LAT_MAX: f64 = 33.9;

/// Relaxed longitudes at or above this belong to the southern coastline.
const EASTERN_RELAXED_LONG_MIN: f64 = -118.40;

/// Axis-aligned region in raw coordinates; every bound is exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub name: &'static str,
    pub lat_min: i64,
    pub lat_max: i64,
    pub long_min: i64,
    pub long_max: i64,
}

impl Region {
    #[inline]
    pub fn contains(&self, lat: i64, long: i64) -> bool {
        lat > self.lat_min && lat < self.lat_max && long > self.long_min && long < self.long_max
    }
}

/// Regions flagged as `cool_places` in addition to the coastline.
pub const COOL_REGIONS: [Region; 5] = [
    Region {
        name: "square",
        lat_min: 33_850_000,
        lat_max: 34_000_000,
        long_min: -118_200_000,
        long_max: -118_000_000,
    },
    Region {
        name: "rectangle",
        lat_min: 33_950_000,
        lat_max: 34_070_000,
        long_min: -118_150_000,
        long_max: -117_650_000,
    },
    Region {
        name: "diagonal_0",
        lat_min: 34_150_000,
        lat_max: 34_200_000,
        long_min: -118_650_000,
        long_max: -118_560_000,
    },
    Region {
        name: "diagonal_1",
        lat_min: 34_190_000,
        lat_max: 34_210_000,
        long_min: -118_650_000,
        long_max: -118_480_000,
    },
    Region {
        name: "diagonal_2",
        lat_min: 34_220_000,
        lat_max: 34_350_000,
        long_min: -118_650_000,
        long_max: -118_340_000,
    },
];

/// Coarsen a raw coordinate: `2 * round(raw / 2_000_000, 4)`.
///
/// Rounding is half-to-even at four decimals, so relaxed values land on a grid
/// of even ten-thousandths of a degree.
pub fn relax_coordinate(raw: i64) -> f64 {
    let halved = raw as f64 / 2_000_000.0;
    2.0 * ((halved * 10_000.0).round_ties_even() / 10_000.0)
}

/// Add `is_coastal` and then `cool_places` to a copy of `df`.
pub fn derive_geo_features(df: &DataFrame, latitude: &str, longitude: &str) -> Result<DataFrame> {
    let with_coastal = add_coastal_flag(df, latitude, longitude)?;
    add_cool_places_flag(&with_coastal, latitude, longitude)
}

/// Add the `is_coastal` column to a copy of `df`.
pub fn add_coastal_flag(df: &DataFrame, latitude: &str, longitude: &str) -> Result<DataFrame> {
    let lats = i64_values(df, latitude)?;
    let longs = i64_values(df, longitude)?;
    let flags = coastal_flags(&lats, &longs);

    let coastal = flags.iter().filter(|f| **f).count();
    info!("Flagged {} of {} rows as coastal", coastal, flags.len());

    let mut out = df.clone();
    out.with_column(Series::new(IS_COASTAL.into(), flags))?;
    Ok(out)
}

/// Add the `cool_places` column to a copy of `df`. Requires `is_coastal`.
pub fn add_cool_places_flag(
    df: &DataFrame,
    latitude: &str,
    longitude: &str,
) -> Result<DataFrame> {
    let lats = i64_values(df, latitude)?;
    let longs = i64_values(df, longitude)?;
    let coastal = require_column(df, IS_COASTAL)?;
    require_no_nulls(coastal)?;
    let coastal = coastal.bool()?;

    let flags: Vec<bool> = lats
        .iter()
        .zip(&longs)
        .zip(coastal.into_no_null_iter())
        .map(|((lat, long), is_coastal)| {
            is_coastal || COOL_REGIONS.iter().any(|r| r.contains(*lat, *long))
        })
        .collect();

    let cool = flags.iter().filter(|f| **f).count();
    info!("Flagged {} of {} rows as cool places", cool, flags.len());

    let mut out = df.clone();
    out.with_column(Series::new(COOL_PLACES.into(), flags))?;
    Ok(out)
}

/// Coastal flag per row from raw coordinates.
pub fn coastal_flags(lats: &[i64], longs: &[i64]) -> Vec<bool> {
    let relaxed_lats: Vec<f64> = lats.iter().map(|v| relax_coordinate(*v)).collect();
    let relaxed_longs: Vec<f64> = longs.iter().map(|v| relax_coordinate(*v)).collect();

    // relaxed latitude -> westmost raw longitude, relaxed longitude -> southmost
    // raw latitude. Keys are the exact f64 bit patterns of the relaxed values.
    let mut west_by_lat: HashMap<u64, i64> = HashMap::new();
    let mut south_by_long: HashMap<u64, i64> = HashMap::new();
    for i in 0..lats.len() {
        west_by_lat
            .entry(relaxed_lats[i].to_bits())
            .and_modify(|m| *m = (*m).min(longs[i]))
            .or_insert(longs[i]);
        south_by_long
            .entry(relaxed_longs[i].to_bits())
            .and_modify(|m| *m = (*m).min(lats[i]))
            .or_insert(lats[i]);
    }
    debug!(
        "{} latitude bands, {} longitude bands",
        west_by_lat.len(),
        south_by_long.len()
    );

    (0..lats.len())
        .map(|i| {
            let horizontal = relaxed_lats[i] <= SOUTHERN_RELAXED_LAT_MAX
                && west_by_lat.get(&relaxed_lats[i].to_bits()) == Some(&longs[i]);
            let vertical = relaxed_longs[i] >= EASTERN_RELAXED_LONG_MIN
                && south_by_long.get(&relaxed_longs[i].to_bits()) == Some(&lats[i]);
            horizontal && vertical
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WrangleError;
    use pretty_assertions::assert_eq;

    fn bools(df: &DataFrame, name: &str) -> Vec<bool> {
        df.column(name)
            .unwrap()
            .bool()
            .unwrap()
            .into_no_null_iter()
            .collect()
    }

    #[test]
    fn test_relax_coordinate() {
        assert_eq!(relax_coordinate(33_800_000), 33.8);
        assert_eq!(relax_coordinate(-118_300_000), -118.3);
        // 33_634_931 / 2e6 = 16.8174655 -> 16.8175 -> 33.635
        assert!((relax_coordinate(33_634_931) - 33.635).abs() < 1e-9);
        // Nearby points share a bucket.
        assert_eq!(relax_coordinate(33_800_010), relax_coordinate(33_800_000));
    }

    #[test]
    fn test_region_bounds_are_exclusive() {
        let square = COOL_REGIONS[0];
        assert!(square.contains(33_900_000, -118_100_000));
        assert!(!square.contains(33_850_000, -118_100_000));
        assert!(!square.contains(33_900_000, -118_000_000));
    }

    #[test]
    fn test_coastal_flags_single_westmost_southern_point() {
        let df = df![
            // A: westmost of the 33.8 band and southmost of the -118.3 band.
            // A2: exact duplicate of A.
            // B: same latitude band as A, further east.
            // C: same longitude band as A, north of the southern coastline.
            // D: west of the eastern cutoff, north of the coastline.
            "Latitude" => [33_800_000i64, 33_800_000, 33_800_000, 34_500_000, 34_500_000],
            "Longitude" => [-118_300_000i64, -118_300_000, -118_200_000, -118_300_000, -119_000_000],
        ]
        .unwrap();

        let out = add_coastal_flag(&df, "Latitude", "Longitude").unwrap();
        assert_eq!(
            bools(&out, IS_COASTAL),
            vec![true, true, false, false, false]
        );
        // Intermediates are not kept.
        assert_eq!(out.width(), 3);
    }

    #[test]
    fn test_coastal_requires_both_directions() {
        // B alone in its longitude band is southmost there, but not westmost in
        // its latitude band.
        let lats = [33_800_000, 33_800_000];
        let longs = [-118_300_000, -118_200_000];
        assert_eq!(coastal_flags(&lats, &longs), vec![true, false]);

        // North of the coastline nothing is coastal, even the westmost point.
        let lats = [34_000_000, 34_000_000];
        assert_eq!(coastal_flags(&lats, &longs), vec![false, false]);
    }

    #[test]
    fn test_cool_places() {
        let df = df![
            "Latitude" => [33_800_000i64, 33_950_000, 34_300_000, 35_000_000],
            "Longitude" => [-118_300_000i64, -118_100_000, -118_400_000, -118_300_000],
        ]
        .unwrap();

        let out = derive_geo_features(&df, "Latitude", "Longitude").unwrap();
        // row 0 coastal, row 1 inside "square", row 2 inside "diagonal_2".
        assert_eq!(bools(&out, IS_COASTAL), vec![true, false, false, false]);
        assert_eq!(bools(&out, COOL_PLACES), vec![true, true, true, false]);
        assert_eq!(out.width(), 4);
        // Input is untouched.
        assert_eq!(df.width(), 2);
    }

    #[test]
    fn test_cool_places_requires_coastal_flag() {
        let df = df![
            "Latitude" => [33_800_000i64],
            "Longitude" => [-118_300_000i64],
        ]
        .unwrap();
        let err = add_cool_places_flag(&df, "Latitude", "Longitude").unwrap_err();
        assert!(matches!(err, WrangleError::ColumnNotFound(_)));
    }

    #[test]
    fn test_missing_coordinates_fail() {
        let df = df![
            "Latitude" => [Some(33_800_000i64), None],
            "Longitude" => [Some(-118_300_000i64), Some(-118_200_000)],
        ]
        .unwrap();
        let err = derive_geo_features(&df, "Latitude", "Longitude").unwrap_err();
        assert!(matches!(err, WrangleError::MissingValue { .. }));
    }
}
