//! CLI entry point for the Zillow wrangling pipeline.

use anyhow::{Result, anyhow};
use clap::Parser;
use polars::prelude::*;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::{error, info};
use zillow_wrangle::{
    CsvCache, CsvExportSource, Loader, WrangleConfig, WrangleOutput, WranglePipeline,
    WrangleSummary,
};

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Wrangle Zillow 2017 property transactions into modelling partitions",
    long_about = "Loads the acquisition cache (fetching it from a raw export on first use), \
                  cleans it, derives geographic features and writes seeded \
                  train/validate/test partitions.\n\n\
                  EXAMPLES:\n  \
                  # First run: build the cache from a raw export\n  \
                  zillow-wrangle --raw-export zillow_export.csv\n\n  \
                  # Source column names, no geo features, write partitions\n  \
                  zillow-wrangle --no-rename --no-geo --output-dir partitions/\n\n  \
                  # Machine-readable summary\n  \
                  zillow-wrangle --json | jq .partition_sizes"
)]
struct Args {
    /// Cache file holding the acquired dataset
    #[arg(long, default_value = "MVP_zillow.csv")]
    cache: PathBuf,

    /// Raw CSV export read when the cache does not exist yet
    #[arg(long)]
    raw_export: Option<PathBuf>,

    /// Keep source column names and county codes
    #[arg(long)]
    no_rename: bool,

    /// Skip the is_coastal and cool_places features
    #[arg(long)]
    no_geo: bool,

    /// IQR multiplier for outlier removal
    #[arg(long, default_value = "1.5")]
    k: f64,

    /// Seed for the train/validate/test split
    #[arg(long, default_value = "123")]
    seed: u64,

    /// Directory to write cleaned data and per-partition CSVs to
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Output JSON summary to stdout instead of human-readable summary
    ///
    /// Disables all progress logs; only outputs the final JSON summary.
    #[arg(long)]
    json: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Suppress progress output (only show warnings and the final result)
    #[arg(short, long)]
    quiet: bool,
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is completely disabled to ensure
/// only JSON is written to stdout.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level, args.quiet, args.json);

    let cache = CsvCache::new(&args.cache);
    let export = match (&args.raw_export, cache.exists()) {
        (Some(path), _) => path.clone(),
        (None, true) => args.cache.clone(),
        (None, false) => {
            return Err(anyhow!(
                "Cache {} not found; pass --raw-export to build it",
                args.cache.display()
            ));
        }
    };
    let loader = Loader::new(CsvExportSource::new(export), cache);

    let config = WrangleConfig::builder()
        .rename_columns(!args.no_rename)
        .derive_geo_features(!args.no_geo)
        .outlier_k(args.k)
        .seed(args.seed)
        .build()?;

    let pipeline = WranglePipeline::builder().config(config).build()?;

    let output = match pipeline.run_with(&loader) {
        Ok(output) => output,
        Err(e) => {
            error!("Pipeline failed: {}", e);
            if args.json {
                println!("{}", serde_json::to_string_pretty(&e)?);
            }
            return Err(anyhow!("Pipeline failed: {}", e));
        }
    };

    if let Some(dir) = &args.output_dir {
        write_outputs(&output, dir)?;
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&output.summary)?);
        return Ok(());
    }

    print_human_readable_summary(&output.summary, &args);
    Ok(())
}

/// Write the cleaned dataset, the exploration frame and every partition.
fn write_outputs(output: &WrangleOutput, dir: &Path) -> Result<()> {
    fs::create_dir_all(dir)?;

    let frames = [
        ("cleaned", &output.cleaned),
        ("train_exploration", &output.train_exploration),
        ("x_train", &output.x_train),
        ("y_train", &output.y_train),
        ("x_validate", &output.x_validate),
        ("y_validate", &output.y_validate),
        ("x_test", &output.x_test),
        ("y_test", &output.y_test),
        ("x_train_scaled", &output.scaled.train),
        ("x_validate_scaled", &output.scaled.validate),
        ("x_test_scaled", &output.scaled.test),
    ];

    for (name, df) in frames {
        let path = dir.join(format!("{name}.csv"));
        let mut file = File::create(&path)?;
        let mut df = df.clone();
        CsvWriter::new(&mut file)
            .include_header(true)
            .with_separator(b',')
            .finish(&mut df)?;
        info!("Written: {}", path.display());
    }

    let scaler_path = dir.join("scaler.json");
    fs::write(&scaler_path, serde_json::to_string_pretty(&output.scaler)?)?;
    info!("Written: {}", scaler_path.display());
    Ok(())
}

/// Print a human-readable summary of the run.
fn print_human_readable_summary(summary: &WrangleSummary, args: &Args) {
    println!();
    println!("{}", "=".repeat(80));
    println!("WRANGLING COMPLETE");
    println!("{}", "=".repeat(80));
    println!();

    println!("Cache: {}", args.cache.display());
    println!("Duration: {}ms", summary.duration_ms);
    println!();

    println!("Rows:");
    println!("  Loaded:              {}", summary.rows_loaded);
    println!("  After missing drop:  {}", summary.rows_after_null_drop);
    println!(
        "  After outliers:      {} ({:.1}% removed)",
        summary.rows_after_outliers,
        summary.rows_removed_percentage()
    );
    println!();

    println!("Outlier Bounds (k = {}):", args.k);
    for bounds in &summary.outlier_bounds {
        println!(
            "  {:<30} ({:.2}, {:.2})  -{} rows",
            bounds.column, bounds.lower, bounds.upper, bounds.rows_removed
        );
    }
    println!();

    if let (Some(coastal), Some(cool)) = (summary.coastal_rows, summary.cool_place_rows) {
        println!("Geographic Features:");
        println!("  Coastal rows:     {}", coastal);
        println!("  Cool-place rows:  {}", cool);
        println!();
    }

    let sizes = summary.partition_sizes;
    println!(
        "Partitions: train={} validate={} test={}",
        sizes.train, sizes.validate, sizes.test
    );
    println!("Scaled Columns: {}", summary.scaled_columns.join(", "));
    println!();

    if !summary.warnings.is_empty() {
        println!("Warnings:");
        for warning in &summary.warnings {
            println!("  ! {}", warning);
        }
        println!();
    }

    if args.output_dir.is_none() {
        println!("Use --output-dir to write partitions to disk");
    }
    println!("Use --json for machine-readable output");
    println!("{}", "=".repeat(80));
}
