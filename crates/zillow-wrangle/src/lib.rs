//! Zillow Wrangling Library
//!
//! Acquisition cache and wrangling pipeline for 2017 single-family property
//! transactions, preparing data for models of Zestimate prediction error.
//!
//! # Overview
//!
//! - **Loading**: cache-first acquisition from a CSV export or a SQL source
//! - **Normalizing**: dropping incomplete rows, retyping and optionally
//!   relabelling the nine modelling columns
//! - **Outlier Removal**: sequential IQR filtering of the core numeric columns
//! - **Geographic Features**: `is_coastal` and `cool_places` flags
//! - **Splitting**: seeded 60/20/20 train/validate/test partitions
//! - **Scaling**: standard scaling fitted on the training features only
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use zillow_wrangle::{CsvCache, CsvExportSource, Loader, WrangleConfig, WranglePipeline};
//!
//! let loader = Loader::new(
//!     CsvExportSource::new("zillow_export.csv"),
//!     CsvCache::new("MVP_zillow.csv"),
//! );
//!
//! // Labelled columns with geographic flags
//! let output = WranglePipeline::builder()
//!     .config(WrangleConfig::mvp())
//!     .build()?
//!     .run_with(&loader)?;
//!
//! println!("Train rows: {}", output.x_train.height());
//! println!("Scaled columns: {:?}", output.scaler.columns());
//! ```
//!
//! # Configuration
//!
//! ```rust,ignore
//! use zillow_wrangle::WrangleConfig;
//!
//! let config = WrangleConfig::builder()
//!     .rename_columns(false)
//!     .derive_geo_features(false)
//!     .outlier_k(3.0)
//!     .seed(42)
//!     .build()?;
//! ```

pub mod config;
pub mod error;
pub mod geo;
pub mod isolate;
pub mod loader;
pub mod normalize;
pub mod outliers;
pub mod pipeline;
pub mod scale;
pub mod schema;
pub mod split;
pub mod types;
pub mod utils;

// Re-exports for convenient access
pub use config::{ConfigValidationError, SplitConfig, WrangleConfig, WrangleConfigBuilder};
pub use error::{Result as WrangleResult, ResultExt, WrangleError};
pub use geo::{COOL_REGIONS, Region, derive_geo_features};
pub use isolate::isolate_target;
pub use loader::{
    ConnectionConfig, CsvCache, CsvExportSource, Loader, QueryExecutor, QueryVariant, SqlSource,
    TabularSource,
};
pub use normalize::ColumnNormalizer;
pub use outliers::{OutlierBounds, OutlierOutcome, remove_outliers};
pub use pipeline::{
    ClosureProgressReporter, ProgressReporter, ProgressUpdate, WranglePipeline,
    WranglePipelineBuilder, WrangleStage,
};
pub use scale::{FittedScaler, StandardScaler};
pub use schema::{COOL_PLACES, ColumnSet, INDEX_COLUMN, IS_COASTAL};
pub use split::split;
pub use types::{FeatureTarget, PartitionSizes, Partitions, WrangleOutput, WrangleSummary};
