//! Configuration for the wrangling pipeline.
//!
//! The two historical pipeline variants (labelled columns with geographic
//! features, and source columns without) are both expressed as a single
//! [`WrangleConfig`]; [`WrangleConfig::mvp`] and [`WrangleConfig::core`] are the
//! presets.

use crate::schema::{COOL_PLACES, ColumnSet, IS_COASTAL};
use serde::{Deserialize, Serialize};

/// Seed used for both partitioning steps unless overridden.
pub const DEFAULT_SEED: u64 = 123;

/// Default IQR multiplier for outlier removal.
pub const DEFAULT_OUTLIER_K: f64 = 1.5;

/// Configuration of the train/validate/test split.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SplitConfig {
    /// Seed for the shuffling RNG. Each of the two splits re-seeds with it.
    /// Default: 123
    pub seed: u64,

    /// Share of the full dataset held out as test.
    /// Default: 0.2
    pub test_fraction: f64,

    /// Share of the remaining (train + validate) rows held out as validate.
    /// Default: 0.25, i.e. 20% of the full dataset
    pub validate_fraction: f64,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            test_fraction: 0.2,
            validate_fraction: 0.25,
        }
    }
}

/// Configuration for the wrangling pipeline.
///
/// Use [`WrangleConfig::builder()`] to create a custom configuration.
///
/// # Example
///
/// ```rust,ignore
/// use zillow_wrangle::config::WrangleConfig;
///
/// let config = WrangleConfig::builder()
///     .rename_columns(false)
///     .derive_geo_features(false)
///     .outlier_k(3.0)
///     .build()?;
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WrangleConfig {
    /// Rename columns to human-readable labels and map county codes to names.
    /// Default: true
    pub rename_columns: bool,

    /// Add the `is_coastal` and `cool_places` flags.
    /// Default: true
    pub derive_geo_features: bool,

    /// Columns filtered for IQR outliers, in filtering order.
    /// Default: the four core numeric features
    pub outlier_columns: Vec<String>,

    /// IQR multiplier for outlier bounds.
    /// Default: 1.5
    pub outlier_k: f64,

    /// Columns standardised for modelling, in output order.
    /// Default: the four core numeric features, plus both flags when
    /// `derive_geo_features` is set
    pub scale_columns: Vec<String>,

    /// Train/validate/test split settings.
    pub split: SplitConfig,
}

impl Default for WrangleConfig {
    fn default() -> Self {
        Self::mvp()
    }
}

impl WrangleConfig {
    /// Create a new configuration builder.
    pub fn builder() -> WrangleConfigBuilder {
        WrangleConfigBuilder::default()
    }

    /// Labelled columns, geographic features, six scaled columns.
    pub fn mvp() -> Self {
        Self::with_defaults(true, true)
    }

    /// Source column names, no geographic features, four scaled columns.
    pub fn core() -> Self {
        Self::with_defaults(false, false)
    }

    fn with_defaults(rename_columns: bool, derive_geo_features: bool) -> Self {
        Self {
            rename_columns,
            derive_geo_features,
            outlier_columns: default_outlier_columns(rename_columns),
            outlier_k: DEFAULT_OUTLIER_K,
            scale_columns: default_scale_columns(rename_columns, derive_geo_features),
            split: SplitConfig::default(),
        }
    }

    /// Column names used by this configuration.
    pub fn columns(&self) -> ColumnSet {
        ColumnSet::for_rename(self.rename_columns)
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if !self.outlier_k.is_finite() || self.outlier_k < 0.0 {
            return Err(ConfigValidationError::InvalidMultiplier(self.outlier_k));
        }

        for (field, value) in [
            ("split.test_fraction", self.split.test_fraction),
            ("split.validate_fraction", self.split.validate_fraction),
        ] {
            if !(value > 0.0 && value < 1.0) {
                return Err(ConfigValidationError::InvalidFraction {
                    field: field.to_string(),
                    value,
                });
            }
        }

        if self.scale_columns.is_empty() {
            return Err(ConfigValidationError::NoScaleColumns);
        }

        if !self.derive_geo_features
            && let Some(flag) = self
                .scale_columns
                .iter()
                .find(|c| c.as_str() == IS_COASTAL || c.as_str() == COOL_PLACES)
        {
            return Err(ConfigValidationError::FlagWithoutGeoFeatures(flag.clone()));
        }

        Ok(())
    }
}

fn default_outlier_columns(rename_columns: bool) -> Vec<String> {
    ColumnSet::for_rename(rename_columns)
        .core_features()
        .iter()
        .map(|c| c.to_string())
        .collect()
}

fn default_scale_columns(rename_columns: bool, derive_geo_features: bool) -> Vec<String> {
    let mut columns = default_outlier_columns(rename_columns);
    if derive_geo_features {
        columns.push(IS_COASTAL.to_string());
        columns.push(COOL_PLACES.to_string());
    }
    columns
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid outlier multiplier: {0} (must be finite and non-negative)")]
    InvalidMultiplier(f64),

    #[error("Invalid fraction for '{field}': {value} (must be strictly between 0.0 and 1.0)")]
    InvalidFraction { field: String, value: f64 },

    #[error("At least one column must be scaled")]
    NoScaleColumns,

    #[error("Column '{0}' is scaled but geographic features are disabled")]
    FlagWithoutGeoFeatures(String),
}

/// Builder for [`WrangleConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct WrangleConfigBuilder {
    rename_columns: Option<bool>,
    derive_geo_features: Option<bool>,
    outlier_columns: Option<Vec<String>>,
    outlier_k: Option<f64>,
    scale_columns: Option<Vec<String>>,
    seed: Option<u64>,
    test_fraction: Option<f64>,
    validate_fraction: Option<f64>,
}

impl WrangleConfigBuilder {
    /// Rename columns to labels and map county codes to names.
    pub fn rename_columns(mut self, rename: bool) -> Self {
        self.rename_columns = Some(rename);
        self
    }

    /// Enable or disable the coastal / cool-area flags.
    pub fn derive_geo_features(mut self, derive: bool) -> Self {
        self.derive_geo_features = Some(derive);
        self
    }

    /// Columns to filter for outliers, applied in the given order.
    ///
    /// Names must match the naming selected by [`rename_columns`](Self::rename_columns).
    pub fn outlier_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.outlier_columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    /// IQR multiplier for outlier bounds.
    pub fn outlier_k(mut self, k: f64) -> Self {
        self.outlier_k = Some(k);
        self
    }

    /// Columns to standardise, in output order.
    pub fn scale_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scale_columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Seed for both split steps.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Share of rows held out as test.
    pub fn test_fraction(mut self, fraction: f64) -> Self {
        self.test_fraction = Some(fraction);
        self
    }

    /// Share of the remaining rows held out as validate.
    pub fn validate_fraction(mut self, fraction: f64) -> Self {
        self.validate_fraction = Some(fraction);
        self
    }

    /// Build the configuration.
    ///
    /// Column lists left unset follow the rename and geo switches.
    pub fn build(self) -> Result<WrangleConfig, ConfigValidationError> {
        let rename_columns = self.rename_columns.unwrap_or(true);
        let derive_geo_features = self.derive_geo_features.unwrap_or(true);
        let split_defaults = SplitConfig::default();

        let config = WrangleConfig {
            rename_columns,
            derive_geo_features,
            outlier_columns: self
                .outlier_columns
                .unwrap_or_else(|| default_outlier_columns(rename_columns)),
            outlier_k: self.outlier_k.unwrap_or(DEFAULT_OUTLIER_K),
            scale_columns: self
                .scale_columns
                .unwrap_or_else(|| default_scale_columns(rename_columns, derive_geo_features)),
            split: SplitConfig {
                seed: self.seed.unwrap_or(split_defaults.seed),
                test_fraction: self.test_fraction.unwrap_or(split_defaults.test_fraction),
                validate_fraction: self
                    .validate_fraction
                    .unwrap_or(split_defaults.validate_fraction),
            },
        };

        config.validate()?;
        Ok(config)
    }
}
