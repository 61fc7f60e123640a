//! Data acquisition with a local CSV cache.
//!
//! The first [`Loader::load`] pulls the raw table from a [`TabularSource`] and
//! persists it to the cache file. Every load, first included, returns what the
//! cache file reads back, so a fresh fetch and a cache hit yield the same frame.

mod connection;
mod queries;
mod source;

pub use connection::{ConnectionConfig, HOST_VAR, PASSWORD_VAR, USER_VAR};
pub use queries::{DATABASE, QueryVariant, keep_latest_transactions};
pub use source::{CsvExportSource, QueryExecutor, SqlSource, TabularSource};

use crate::error::{Result, ResultExt};
use crate::schema::INDEX_COLUMN;
use crate::utils::ensure_row_index;
use polars::prelude::*;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Leading column names treated as a written-out row index.
const INDEX_ALIASES: [&str; 4] = [INDEX_COLUMN, "", "Unnamed: 0", "column_1"];

/// CSV file holding a previously fetched dataset.
#[derive(Debug, Clone)]
pub struct CsvCache {
    path: PathBuf,
}

impl CsvCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Read the cache. A leading index column is renamed to `row_id`.
    pub fn read(&self) -> Result<DataFrame> {
        let mut df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(None)
            .try_into_reader_with_file_path(Some(self.path.clone()))
            .and_then(|reader| reader.finish())
            .context(format!("Failed to read cache {}", self.path.display()))?;

        let first = df.get_column_names().first().map(|c| c.to_string());
        if let Some(first) = first
            && first != INDEX_COLUMN
            && INDEX_ALIASES.contains(&first.as_str())
        {
            df.rename(&first, INDEX_COLUMN.into())?;
        }

        debug!("Read {} rows from cache {}", df.height(), self.path.display());
        Ok(df)
    }

    /// Write `df` with a leading `row_id` column (added when missing).
    ///
    /// The rows go to a sibling temporary file that is renamed over the cache
    /// path once complete, so a failed write never leaves a partial cache.
    pub fn write(&self, df: &DataFrame) -> Result<()> {
        let mut indexed = ensure_row_index(df)?;

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let partial = self.partial_path();
        let written = Self::write_csv(&partial, &mut indexed)
            .and_then(|()| fs::rename(&partial, &self.path).map_err(Into::into));
        if let Err(e) = written {
            let _ = fs::remove_file(&partial);
            return Err(e.with_context(format!("Failed to write cache {}", self.path.display())));
        }

        info!("Cached {} rows at {}", indexed.height(), self.path.display());
        Ok(())
    }

    fn write_csv(path: &Path, df: &mut DataFrame) -> Result<()> {
        let mut file = File::create(path)?;
        CsvWriter::new(&mut file)
            .include_header(true)
            .with_separator(b',')
            .finish(df)?;
        file.sync_all()?;
        Ok(())
    }

    /// `<cache file name>.partial`, next to the cache.
    fn partial_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".partial");
        self.path.with_file_name(name)
    }
}

/// Cache-first loader over a [`TabularSource`].
pub struct Loader<S> {
    source: S,
    cache: CsvCache,
}

impl<S: TabularSource> Loader<S> {
    pub fn new(source: S, cache: CsvCache) -> Self {
        Self { source, cache }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn cache(&self) -> &CsvCache {
        &self.cache
    }

    /// Load the dataset, fetching and caching it on first access.
    pub fn load(&self) -> Result<DataFrame> {
        if self.cache.exists() {
            info!("Using cache {}", self.cache.path().display());
        } else {
            info!(
                "Cache {} not found, fetching from {}",
                self.cache.path().display(),
                self.source.describe()
            );
            let df = self.source.fetch()?;
            self.cache.write(&df)?;
        }
        self.cache.read()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WrangleError;
    use pretty_assertions::assert_eq;
    use std::cell::Cell;
    use std::io::Write;

    struct CountingSource {
        calls: Cell<usize>,
    }

    impl TabularSource for CountingSource {
        fn fetch(&self) -> Result<DataFrame> {
            self.calls.set(self.calls.get() + 1);
            Ok(df![
                "parcelid" => [11i64, 12, 13],
                "logerror" => [0.5, -0.25, 0.125],
            ]?)
        }

        fn describe(&self) -> String {
            "counting source".to_string()
        }
    }

    struct BrokenSource;

    impl TabularSource for BrokenSource {
        fn fetch(&self) -> Result<DataFrame> {
            Err(WrangleError::Source("unreachable host".to_string()))
        }

        fn describe(&self) -> String {
            "broken source".to_string()
        }
    }

    fn names(df: &DataFrame) -> Vec<String> {
        df.get_column_names().iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_loader_fetches_once_then_reads_cache() {
        let dir = tempfile::tempdir().unwrap();
        let cache = CsvCache::new(dir.path().join("MVP_zillow.csv"));
        let loader = Loader::new(
            CountingSource {
                calls: Cell::new(0),
            },
            cache,
        );

        let first = loader.load().unwrap();
        assert!(loader.cache().exists());
        let second = loader.load().unwrap();

        assert_eq!(loader.source().calls.get(), 1);
        assert_eq!(names(&first), vec!["row_id", "parcelid", "logerror"]);
        assert!(first.equals(&second));

        let errors: Vec<f64> = second
            .column("logerror")
            .unwrap()
            .f64()
            .unwrap()
            .into_no_null_iter()
            .collect();
        assert_eq!(errors, vec![0.5, -0.25, 0.125]);
    }

    #[test]
    fn test_loader_source_failure_leaves_no_cache() {
        let dir = tempfile::tempdir().unwrap();
        let loader = Loader::new(BrokenSource, CsvCache::new(dir.path().join("cache.csv")));
        let err = loader.load().unwrap_err();
        assert_eq!(err.error_code(), "SOURCE_ERROR");
        assert!(!loader.cache().exists());
    }

    #[test]
    fn test_cache_recognises_unnamed_index() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("legacy.csv");
        let mut file = File::create(&path).unwrap();
        writeln!(file, "Unnamed: 0,parcelid,logerror").unwrap();
        writeln!(file, "0,14297519,0.0255").unwrap();
        writeln!(file, "1,17052889,0.0556").unwrap();
        drop(file);

        let df = CsvCache::new(&path).read().unwrap();
        assert_eq!(names(&df), vec!["row_id", "parcelid", "logerror"]);
        assert_eq!(df.height(), 2);
    }

    #[test]
    fn test_cache_keeps_existing_row_id() {
        let dir = tempfile::tempdir().unwrap();
        let cache = CsvCache::new(dir.path().join("nested").join("cache.csv"));
        let df = df![
            INDEX_COLUMN => [7u32, 3],
            "parcelid" => [1i64, 2],
        ]
        .unwrap();

        cache.write(&df).unwrap();
        let back = cache.read().unwrap();
        assert_eq!(names(&back), vec!["row_id", "parcelid"]);

        let ids: Vec<i64> = back
            .column(INDEX_COLUMN)
            .unwrap()
            .cast(&DataType::Int64)
            .unwrap()
            .i64()
            .unwrap()
            .into_no_null_iter()
            .collect();
        assert_eq!(ids, vec![7, 3]);
    }

    /// CSV cannot hold list columns, so writing this frame fails.
    fn unwritable_frame() -> DataFrame {
        let tags = Series::new(
            "tags".into(),
            [
                Series::new("".into(), [1i64, 2]),
                Series::new("".into(), [3i64]),
            ],
        );
        DataFrame::new(vec![
            Series::new("parcelid".into(), [11i64, 12]).into(),
            tags.into(),
        ])
        .unwrap()
    }

    #[test]
    fn test_failed_write_leaves_no_cache() {
        let dir = tempfile::tempdir().unwrap();
        let cache = CsvCache::new(dir.path().join("cache.csv"));

        assert!(cache.write(&unwritable_frame()).is_err());
        assert!(!cache.exists());
        assert!(!cache.partial_path().exists());
    }

    #[test]
    fn test_failed_write_keeps_previous_cache() {
        let dir = tempfile::tempdir().unwrap();
        let cache = CsvCache::new(dir.path().join("cache.csv"));
        cache
            .write(&df!["parcelid" => [11i64, 12, 13]].unwrap())
            .unwrap();

        let err = cache.write(&unwritable_frame()).unwrap_err();
        assert!(err.to_string().contains("Failed to write cache"));

        let back = cache.read().unwrap();
        assert_eq!(names(&back), vec!["row_id", "parcelid"]);
        assert_eq!(back.height(), 3);
        assert!(!cache.partial_path().exists());
    }

    #[test]
    fn test_read_infers_types_from_every_row() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("late_fraction.csv");
        let mut file = File::create(&path).unwrap();
        writeln!(file, "parcelid,bathroomcnt").unwrap();
        for i in 0..250 {
            writeln!(file, "{},2", 11_000_000 + i).unwrap();
        }
        writeln!(file, "11000250,2.5").unwrap();
        drop(file);

        let df = CsvCache::new(&path).read().unwrap();
        let baths = df.column("bathroomcnt").unwrap();
        assert_eq!(baths.dtype(), &DataType::Float64);
        assert_eq!(baths.f64().unwrap().get(250), Some(2.5));

        let export = CsvExportSource::new(&path).fetch().unwrap();
        assert_eq!(export.column("bathroomcnt").unwrap().dtype(), &DataType::Float64);
    }

    #[test]
    fn test_read_missing_cache() {
        let err = CsvCache::new("/nonexistent/cache.csv").read().unwrap_err();
        assert_eq!(err.error_code(), "POLARS_ERROR");
    }
}
