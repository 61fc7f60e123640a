//! Error types for the wrangling pipeline.
//!
//! Every stage returns [`WrangleError`]. No stage retries: all operations are
//! deterministic transforms over already-loaded data, so the first error aborts
//! the run and no partial output is returned.
//!
//! Errors are serializable as `{ code, message }` so the CLI can emit them
//! alongside JSON summaries.

use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

/// The main error type for the wrangling pipeline.
#[derive(Error, Debug)]
pub enum WrangleError {
    /// Nulls found where the pipeline assumes none remain.
    #[error("Column '{column}' has {count} missing values")]
    MissingValue { column: String, count: usize },

    /// A value could not be cast during column normalization.
    #[error("Failed to convert column '{column}' to {target_type}: {reason}")]
    TypeConversionFailed {
        column: String,
        target_type: String,
        reason: String,
    },

    /// Column was not found in the dataset.
    #[error("Column '{0}' not found in dataset")]
    ColumnNotFound(String),

    /// A dataset or partition has no rows to compute statistics on.
    #[error("Empty partition: {0}")]
    EmptyPartition(String),

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The tabular source could not supply data.
    #[error("Data source error: {0}")]
    Source(String),

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<WrangleError>,
    },
}

impl WrangleError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        WrangleError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Stable error code, independent of the message text.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::MissingValue { .. } => "MISSING_VALUE",
            Self::TypeConversionFailed { .. } => "TYPE_CONVERSION_FAILED",
            Self::ColumnNotFound(_) => "COLUMN_NOT_FOUND",
            Self::EmptyPartition(_) => "EMPTY_PARTITION",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::Source(_) => "SOURCE_ERROR",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Strip any context wrappers and return the underlying error.
    pub fn root(&self) -> &WrangleError {
        match self {
            Self::WithContext { source, .. } => source.root(),
            other => other,
        }
    }
}

impl Serialize for WrangleError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("WrangleError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for wrangling operations.
pub type Result<T> = std::result::Result<T, WrangleError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| WrangleError::Polars(e).with_context(context))
    }
}
