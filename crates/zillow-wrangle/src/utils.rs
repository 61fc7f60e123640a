//! Shared column helpers for the wrangling stages.

use crate::error::{Result, WrangleError};
use crate::schema::INDEX_COLUMN;
use polars::prelude::*;

// =============================================================================
// Data Type Utilities
// =============================================================================

/// Check if a DataType is numeric (integer or float).
#[inline]
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

// =============================================================================
// Column Access
// =============================================================================

/// Check whether `df` has a column called `name`.
pub fn column_exists(df: &DataFrame, name: &str) -> bool {
    df.get_column_names().iter().any(|c| c.as_str() == name)
}

/// Get a column or fail with [`WrangleError::ColumnNotFound`].
pub fn require_column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Column> {
    df.column(name)
        .map_err(|_| WrangleError::ColumnNotFound(name.to_string()))
}

/// Fail with [`WrangleError::MissingValue`] if the column holds any null.
pub fn require_no_nulls(column: &Column) -> Result<()> {
    let count = column.null_count();
    if count > 0 {
        return Err(WrangleError::MissingValue {
            column: column.name().to_string(),
            count,
        });
    }
    Ok(())
}

/// Extract a numeric column as `f64` values.
///
/// Nulls are not tolerated: every downstream statistic assumes complete data.
pub fn f64_values(df: &DataFrame, name: &str) -> Result<Vec<f64>> {
    let column = require_column(df, name)?;
    require_no_nulls(column)?;

    if !is_numeric_dtype(column.dtype()) {
        return Err(WrangleError::TypeConversionFailed {
            column: name.to_string(),
            target_type: "Float64".to_string(),
            reason: format!("column has non-numeric type {}", column.dtype()),
        });
    }

    let cast = column.cast(&DataType::Float64)?;
    Ok(cast.f64()?.into_no_null_iter().collect())
}

/// Extract an integer column as `i64` values.
pub fn i64_values(df: &DataFrame, name: &str) -> Result<Vec<i64>> {
    let column = require_column(df, name)?;
    require_no_nulls(column)?;

    let cast = column
        .as_materialized_series()
        .strict_cast(&DataType::Int64)
        .map_err(|e| WrangleError::TypeConversionFailed {
            column: name.to_string(),
            target_type: "Int64".to_string(),
            reason: e.to_string(),
        })?;
    Ok(cast.i64()?.into_no_null_iter().collect())
}

/// Return `df` with a leading [`INDEX_COLUMN`] (0..n) if it has none yet.
pub fn ensure_row_index(df: &DataFrame) -> Result<DataFrame> {
    if column_exists(df, INDEX_COLUMN) {
        return Ok(df.clone());
    }
    Ok(df.with_row_index(INDEX_COLUMN.into(), None)?)
}
