//! Column normalization.
//!
//! Retypes the acquisition columns into the canonical schema and, for the
//! labelled pipeline variant, renames them and maps county codes to names.
//! Casts are strict: a value that cannot be converted fails the run instead of
//! silently becoming null.

use crate::error::{Result, WrangleError};
use crate::schema::{ColumnSet, county_name};
use crate::utils::require_column;
use polars::prelude::*;
use tracing::{debug, info, warn};

/// Normalizes raw acquisition columns.
pub struct ColumnNormalizer;

impl ColumnNormalizer {
    /// Drop every row holding a null in any of `columns`. A `NaN` in a float
    /// column counts as missing.
    pub fn drop_missing(df: &DataFrame, columns: &[&str]) -> Result<DataFrame> {
        let mut keep = BooleanChunked::full("keep".into(), true, df.height());
        for name in columns {
            let column = require_column(df, name)?;
            keep = &keep & &column.is_not_null();
            if column.dtype().is_float() {
                let not_nan = column
                    .as_materialized_series()
                    .is_not_nan()?
                    .fill_null_with_values(false)?;
                keep = &keep & &not_nan;
            }
        }

        let filtered = df.filter(&keep)?;
        let dropped = df.height() - filtered.height();
        if dropped > 0 {
            debug!("Dropped {} rows with missing values", dropped);
        }
        Ok(filtered)
    }

    /// Cast the source columns to their canonical types, optionally renaming
    /// them to labels.
    ///
    /// Expects source column names (see [`ColumnSet::SOURCE`]) and no nulls in
    /// them.
    pub fn normalize(df: &DataFrame, rename: bool) -> Result<DataFrame> {
        let source = ColumnSet::SOURCE;
        for name in source.all() {
            require_column(df, name)?;
        }

        let mut df = df.clone();

        let parcel = Self::to_string_id(df.column(source.parcel_id)?.as_materialized_series())?;
        df.replace(source.parcel_id, parcel)?;

        let county = truncate_to_int(df.column(source.county)?.as_materialized_series())?
            .cast(&DataType::String)?;
        df.replace(source.county, county)?;

        for name in [
            source.latitude,
            source.longitude,
            source.home_value,
            source.finished_area,
        ] {
            let cast = truncate_to_int(df.column(name)?.as_materialized_series())?;
            df.replace(name, cast)?;
        }

        if rename {
            let mapped = Self::map_counties(df.column(source.county)?.as_materialized_series())?;
            df.replace(source.county, mapped)?;

            let labels = ColumnSet::LABELED;
            for (from, to) in source.all().into_iter().zip(labels.all()) {
                df.rename(from, to.into())?;
            }
        }

        info!(
            "Normalized {} columns ({} rows){}",
            source.all().len(),
            df.height(),
            if rename { ", renamed to labels" } else { "" }
        );
        Ok(df)
    }

    /// Parcel ids become strings; integral floats lose their fractional part.
    fn to_string_id(series: &Series) -> Result<Series> {
        if series.dtype() == &DataType::String {
            return Ok(series.clone());
        }
        Ok(truncate_to_int(series)?.cast(&DataType::String)?)
    }

    /// Replace county codes with names. Unknown codes become null.
    fn map_counties(series: &Series) -> Result<Series> {
        let codes = series.str()?;
        let mut unmapped = 0usize;
        let names: Vec<Option<&str>> = codes
            .into_iter()
            .map(|code| {
                let name = code.and_then(county_name);
                if code.is_some() && name.is_none() {
                    unmapped += 1;
                }
                name
            })
            .collect();

        if unmapped > 0 {
            warn!(
                "{} rows have a county code outside the known counties",
                unmapped
            );
        }
        Ok(Series::new(series.name().clone(), names))
    }
}

/// Cast to `Int64`, truncating fractional values toward zero.
///
/// Non-integer inputs go through `Float64` first so that numeric text such as
/// `"6037.0"` is accepted. Anything that does not survive a strict cast fails
/// with [`WrangleError::TypeConversionFailed`].
pub fn truncate_to_int(series: &Series) -> Result<Series> {
    let converted = if series.dtype().is_integer() {
        series.strict_cast(&DataType::Int64)
    } else {
        series
            .strict_cast(&DataType::Float64)
            .and_then(|s| s.strict_cast(&DataType::Int64))
    };

    converted.map_err(|e| WrangleError::TypeConversionFailed {
        column: series.name().to_string(),
        target_type: "Int64".to_string(),
        reason: e.to_string(),
    })
}
