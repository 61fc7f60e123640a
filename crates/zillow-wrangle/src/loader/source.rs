//! Tabular data sources.

use super::connection::ConnectionConfig;
use super::queries::{DATABASE, QueryVariant};
use crate::error::{Result, ResultExt};
use polars::prelude::*;
use std::path::{Path, PathBuf};
use tracing::info;

/// Anything that can produce the raw acquisition table.
pub trait TabularSource {
    fn fetch(&self) -> Result<DataFrame>;

    /// Human-readable description for logs.
    fn describe(&self) -> String;
}

/// Raw comma-separated export with a header row.
#[derive(Debug, Clone)]
pub struct CsvExportSource {
    path: PathBuf,
}

impl CsvExportSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TabularSource for CsvExportSource {
    fn fetch(&self) -> Result<DataFrame> {
        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(None)
            .try_into_reader_with_file_path(Some(self.path.clone()))
            .and_then(|reader| reader.finish())
            .context(format!("Failed to read export {}", self.path.display()))?;
        info!("Read {} rows from {}", df.height(), self.path.display());
        Ok(df)
    }

    fn describe(&self) -> String {
        format!("CSV export {}", self.path.display())
    }
}

/// Runs a SQL query against a database URL.
///
/// No driver ships with this crate; callers plug one in here. Failures should
/// be reported as [`WrangleError::Source`](crate::WrangleError::Source).
pub trait QueryExecutor {
    fn read_sql(&self, query: &str, url: &str) -> Result<DataFrame>;
}

/// A [`TabularSource`] running one of the acquisition queries.
pub struct SqlSource<E> {
    connection: ConnectionConfig,
    database: String,
    variant: QueryVariant,
    executor: E,
}

impl<E: QueryExecutor> SqlSource<E> {
    pub fn new(connection: ConnectionConfig, variant: QueryVariant, executor: E) -> Self {
        Self {
            connection,
            database: DATABASE.to_string(),
            variant,
            executor,
        }
    }

    /// Query a database other than the default `zillow`.
    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    pub fn variant(&self) -> QueryVariant {
        self.variant
    }
}

impl<E: QueryExecutor> TabularSource for SqlSource<E> {
    fn fetch(&self) -> Result<DataFrame> {
        let url = self.connection.database_url(&self.database);
        let raw = self
            .executor
            .read_sql(self.variant.sql(), &url)
            .map_err(|e| e.with_context(self.describe()))?;
        info!("Query returned {} rows", raw.height());
        self.variant.postprocess(raw)
    }

    fn describe(&self) -> String {
        format!(
            "{:?} query on {}@{}/{}",
            self.variant, self.connection.username, self.connection.host, self.database
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WrangleError;
    use std::cell::RefCell;

    struct RecordingExecutor {
        calls: RefCell<Vec<(String, String)>>,
        result: DataFrame,
    }

    impl QueryExecutor for RecordingExecutor {
        fn read_sql(&self, query: &str, url: &str) -> Result<DataFrame> {
            self.calls
                .borrow_mut()
                .push((query.to_string(), url.to_string()));
            Ok(self.result.clone())
        }
    }

    struct FailingExecutor;

    impl QueryExecutor for FailingExecutor {
        fn read_sql(&self, _query: &str, _url: &str) -> Result<DataFrame> {
            Err(WrangleError::Source("connection refused".to_string()))
        }
    }

    fn connection() -> ConnectionConfig {
        ConnectionConfig::new("db.local", "analyst", "pw")
    }

    #[test]
    fn test_sql_source_runs_variant_query() {
        let executor = RecordingExecutor {
            calls: RefCell::new(Vec::new()),
            result: df![
                "propertylandusetypeid" => [261i64],
                "parcelid" => [14297519i64],
            ]
            .unwrap(),
        };
        let source = SqlSource::new(connection(), QueryVariant::Mvp, executor);

        let df = source.fetch().unwrap();
        assert_eq!(df.width(), 1);

        let calls = source.executor.calls.borrow();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, QueryVariant::Mvp.sql());
        assert_eq!(calls[0].1, "mysql://analyst:pw@db.local/zillow");
    }

    #[test]
    fn test_sql_source_error_keeps_source_code() {
        let source = SqlSource::new(connection(), QueryVariant::Full, FailingExecutor)
            .with_database("zillow_test");
        let err = source.fetch().unwrap_err();
        assert_eq!(err.error_code(), "SOURCE_ERROR");
        assert!(err.to_string().contains("zillow_test"));
        assert!(!source.describe().contains("pw"));
    }

    #[test]
    fn test_csv_export_missing_file() {
        let source = CsvExportSource::new("/nonexistent/zillow_export.csv");
        assert!(source.fetch().is_err());
        assert!(source.describe().contains("zillow_export.csv"));
    }
}
