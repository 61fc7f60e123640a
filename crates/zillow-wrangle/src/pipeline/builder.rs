//! The wrangling pipeline and its builder.

use crate::config::{ConfigValidationError, WrangleConfig};
use crate::error::{Result, ResultExt};
use crate::geo::derive_geo_features;
use crate::isolate::isolate_target;
use crate::loader::{Loader, TabularSource};
use crate::normalize::ColumnNormalizer;
use crate::outliers::remove_outliers;
use crate::pipeline::progress::{
    ClosureProgressReporter, ProgressReporter, ProgressUpdate, WrangleStage,
};
use crate::scale::StandardScaler;
use crate::schema::{COOL_PLACES, ColumnSet, IS_COASTAL, scaled_column_name};
use crate::split::split;
use crate::types::{FeatureTarget, PartitionSizes, WrangleOutput, WrangleSummary};
use crate::utils::ensure_row_index;
use chrono::Local;
use polars::prelude::*;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Share of loaded rows whose loss triggers a warning, in percent.
const DATA_LOSS_WARNING_PCT: f64 = 30.0;

/// The wrangling pipeline.
///
/// Use [`WranglePipeline::builder()`] to create one.
///
/// # Example
///
/// ```rust,ignore
/// use zillow_wrangle::{CsvCache, CsvExportSource, Loader, WrangleConfig, WranglePipeline};
///
/// let loader = Loader::new(
///     CsvExportSource::new("zillow_export.csv"),
///     CsvCache::new("MVP_zillow.csv"),
/// );
///
/// let output = WranglePipeline::builder()
///     .config(WrangleConfig::mvp())
///     .on_progress(|update| {
///         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
///     })
///     .build()?
///     .run_with(&loader)?;
/// ```
pub struct WranglePipeline {
    config: WrangleConfig,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
}

// Callers may move a configured pipeline to a worker thread.
static_assertions::assert_impl_all!(WranglePipeline: Send);

impl WranglePipeline {
    /// Create a new pipeline builder.
    pub fn builder() -> WranglePipelineBuilder {
        WranglePipelineBuilder::default()
    }

    pub fn config(&self) -> &WrangleConfig {
        &self.config
    }

    /// Load the dataset through `loader`, then [`run`](Self::run) it.
    pub fn run_with<S: TabularSource>(&self, loader: &Loader<S>) -> Result<WrangleOutput> {
        self.report_progress(ProgressUpdate::new(
            WrangleStage::Loading,
            0.0,
            "Loading dataset...",
        ));
        let df = match loader.load() {
            Ok(df) => df,
            Err(e) => {
                self.report_progress(ProgressUpdate::failed(e.to_string()));
                error!("Loading failed: {}", e);
                return Err(e);
            }
        };
        self.report_progress(ProgressUpdate::new(
            WrangleStage::Loading,
            1.0,
            format!("Loaded {} rows", df.height()),
        ));
        self.run(df)
    }

    /// Wrangle an already loaded raw dataset.
    ///
    /// The first error aborts the run; no partial output is returned.
    pub fn run(&self, df: DataFrame) -> Result<WrangleOutput> {
        match self.run_internal(df) {
            Ok(output) => {
                self.report_progress(ProgressUpdate::complete("Wrangling completed successfully"));
                Ok(output)
            }
            Err(e) => {
                self.report_progress(ProgressUpdate::failed(e.to_string()));
                error!("Pipeline error: {}", e);
                Err(e)
            }
        }
    }

    /// Report progress if a reporter is configured.
    fn report_progress(&self, update: ProgressUpdate) {
        if let Some(reporter) = &self.progress_reporter {
            reporter.report(update);
        }
    }

    fn run_internal(&self, df: DataFrame) -> Result<WrangleOutput> {
        let start_time = Instant::now();
        let columns = self.config.columns();
        let mut warnings = Vec::new();

        info!("Starting wrangling pipeline on {} rows...", df.height());
        let rows_loaded = df.height();

        // Step 1: Drop incomplete rows and normalize columns
        self.report_progress(ProgressUpdate::new(
            WrangleStage::Normalizing,
            0.0,
            "Dropping incomplete rows...",
        ));
        let df = ensure_row_index(&df)?;
        let df = ColumnNormalizer::drop_missing(&df, &ColumnSet::SOURCE.all())
            .context("While dropping missing values")?;
        let rows_after_null_drop = df.height();
        info!(
            "Step 1: {} rows after dropping missing values",
            rows_after_null_drop
        );

        let df = ColumnNormalizer::normalize(&df, self.config.rename_columns)
            .context("While normalizing columns")?;
        self.report_progress(ProgressUpdate::new(
            WrangleStage::Normalizing,
            1.0,
            "Columns normalized",
        ));

        // Step 2: Outlier removal
        self.report_progress(ProgressUpdate::new(
            WrangleStage::OutlierRemoval,
            0.0,
            "Removing outliers...",
        ));
        let outcome = remove_outliers(&df, self.config.outlier_k, &self.config.outlier_columns)
            .context("While removing outliers")?;
        let rows_after_outliers = outcome.data.height();
        info!("Step 2: {} rows after outlier removal", rows_after_outliers);

        // Step 3: Geographic features
        let (cleaned, coastal_rows, cool_place_rows) = if self.config.derive_geo_features {
            self.report_progress(ProgressUpdate::new(
                WrangleStage::GeoFeatures,
                0.0,
                "Deriving geographic features...",
            ));
            let with_geo = derive_geo_features(&outcome.data, columns.latitude, columns.longitude)
                .context("While deriving geographic features")?;
            let coastal = count_true(&with_geo, IS_COASTAL)?;
            let cool = count_true(&with_geo, COOL_PLACES)?;
            info!(
                "Step 3: {} coastal rows, {} cool-place rows",
                coastal, cool
            );
            (with_geo, Some(coastal), Some(cool))
        } else {
            info!("Step 3: Skipping geographic features (disabled)");
            (outcome.data, None, None)
        };

        // Step 4: Split
        self.report_progress(ProgressUpdate::new(
            WrangleStage::Splitting,
            0.0,
            "Splitting into train/validate/test...",
        ));
        let partitions = split(&cleaned, &self.config.split).context("While splitting")?;
        let partition_sizes = PartitionSizes::from(&partitions);
        debug!("Partition sizes: {:?}", partition_sizes);

        // Step 5: Target isolation
        self.report_progress(ProgressUpdate::new(
            WrangleStage::TargetIsolation,
            0.0,
            "Isolating target...",
        ));
        let isolated = isolate_target(columns.target, &partitions)?;

        // Step 6: Scaling, fitted on training features only
        self.report_progress(ProgressUpdate::new(
            WrangleStage::Scaling,
            0.0,
            "Fitting scaler on training features...",
        ));
        let scaler = StandardScaler::new(self.config.scale_columns.iter().cloned())
            .fit(&isolated.train.features)
            .context("While fitting scaler")?;
        let scaled = isolated.try_map(|name, part| {
            scaler
                .transform(&part.features)
                .context(format!("While scaling {name} features"))
        })?;
        let train_exploration = exploration_frame(&isolated.train, columns.target, &scaled.train)?;
        info!("Step 6: Scaled {} columns", scaler.columns().len());

        let summary = WrangleSummary {
            generated_at: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            duration_ms: start_time.elapsed().as_millis() as u64,
            rows_loaded,
            rows_after_null_drop,
            rows_after_outliers,
            outlier_bounds: outcome.bounds,
            coastal_rows,
            cool_place_rows,
            partition_sizes,
            scaled_columns: scaler.columns().to_vec(),
            warnings: Vec::new(),
        };

        let removed_pct = summary.rows_removed_percentage();
        if removed_pct > DATA_LOSS_WARNING_PCT {
            let message = format!(
                "{:.1}% of loaded rows were removed by cleaning",
                removed_pct
            );
            warn!("{}", message);
            warnings.push(message);
        }

        let FeatureTarget {
            features: x_train,
            target: y_train,
        } = isolated.train;
        let FeatureTarget {
            features: x_validate,
            target: y_validate,
        } = isolated.validate;
        let FeatureTarget {
            features: x_test,
            target: y_test,
        } = isolated.test;

        info!(
            "Pipeline completed in {}ms",
            start_time.elapsed().as_millis()
        );

        Ok(WrangleOutput {
            cleaned,
            train_exploration,
            x_train,
            y_train,
            x_validate,
            y_validate,
            x_test,
            y_test,
            scaled,
            scaler,
            summary: WrangleSummary {
                warnings,
                ..summary
            },
        })
    }
}

/// Unscaled training features, the target, then each scaled column under its
/// exploration name.
fn exploration_frame(train: &FeatureTarget, target: &str, scaled: &DataFrame) -> Result<DataFrame> {
    let mut out = train.features.clone();
    out.with_column(train.target.column(target)?.clone())?;
    for column in scaled.get_columns() {
        let mut renamed = column.clone();
        renamed.rename(scaled_column_name(column.name()).into());
        out.with_column(renamed)?;
    }
    Ok(out)
}

fn count_true(df: &DataFrame, name: &str) -> Result<usize> {
    Ok(df
        .column(name)?
        .bool()?
        .into_iter()
        .filter(|v| *v == Some(true))
        .count())
}

/// Builder for [`WranglePipeline`].
#[derive(Default)]
pub struct WranglePipelineBuilder {
    config: Option<WrangleConfig>,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
}

static_assertions::assert_impl_all!(WranglePipelineBuilder: Send);

impl WranglePipelineBuilder {
    /// Set the pipeline configuration. Defaults to [`WrangleConfig::mvp`].
    pub fn config(mut self, config: WrangleConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set a progress reporter for receiving updates during the run.
    pub fn progress_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.progress_reporter = Some(reporter);
        self
    }

    /// Set a progress callback closure.
    ///
    /// For more complex scenarios, use [`progress_reporter`](Self::progress_reporter).
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(ProgressUpdate) + Send + Sync + 'static,
    {
        self.progress_reporter = Some(Arc::new(ClosureProgressReporter::new(callback)));
        self
    }

    /// Build the pipeline.
    ///
    /// Returns an error if the configuration is invalid.
    pub fn build(self) -> std::result::Result<WranglePipeline, ConfigValidationError> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        Ok(WranglePipeline {
            config,
            progress_reporter: self.progress_reporter,
        })
    }
}
