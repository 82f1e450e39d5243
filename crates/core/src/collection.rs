//! Metric collection pipeline.
//!
//! A [`MetricSource`] runs one static diagnostic query through a
//! [`QueryExecutor`]. [`collect`] drives the whole catalog: every source is
//! attempted, a failing source is logged and recorded in the
//! [`CollectionResult`] failure set, and the remaining sources still run.
//! Each successful table is handed to a [`TableSink`] before the next
//! source executes, so partial results are durable even if the process
//! dies later in the run.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;

use crate::table::{MetricTable, Value};

/// Why a single metric could not be collected. Always recoverable.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CollectionError {
    /// The database rejected or failed the query (missing view,
    /// permission denied, connection hiccup).
    #[error("query failed: {0}")]
    Query(String),

    /// The query did not finish within the per-query budget.
    #[error("query timed out after {0:?}")]
    Timeout(Duration),

    /// The result set could not be converted into a table.
    #[error("result decode failed: {0}")]
    Decode(String),
}

/// Columns and rows exactly as the driver returned them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

/// How long the client keeps waiting past the per-query limit. The server
/// enforces the limit itself; this only catches a server that never answers.
pub const CLIENT_TIMEOUT_GRACE: Duration = Duration::from_secs(1);

/// "Execute query, get columns and rows". The only capability the
/// collection pipeline needs from a database.
#[async_trait]
pub trait QueryExecutor: Send {
    async fn query(&mut self, sql: &str) -> Result<RawResult, CollectionError>;

    /// Make the session usable again after the client abandoned a query.
    ///
    /// The abandoned statement may still be running server-side and would
    /// otherwise block every later query on the same session.
    async fn recover(&mut self) -> Result<(), CollectionError> {
        Ok(())
    }
}

/// Receives each successfully collected table as soon as it exists.
pub trait TableSink {
    type Error;

    fn persist(&mut self, table: &MetricTable) -> Result<(), Self::Error>;
}

/// A named, parameterless diagnostic query.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSource {
    pub name: String,
    pub sql: String,
}

impl MetricSource {
    pub fn new(name: impl Into<String>, sql: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sql: sql.into(),
        }
    }

    /// Execute the query with a bounded wait.
    ///
    /// `timeout` is the limit the executor's server is expected to enforce.
    /// If no answer arrives within `timeout` plus [`CLIENT_TIMEOUT_GRACE`],
    /// the query is abandoned and the executor is asked to recover its
    /// session before anything else runs on it.
    pub async fn collect<X>(
        &self,
        executor: &mut X,
        timeout: Duration,
    ) -> Result<MetricTable, CollectionError>
    where
        X: QueryExecutor + ?Sized,
    {
        let answered =
            tokio::time::timeout(timeout + CLIENT_TIMEOUT_GRACE, executor.query(&self.sql)).await;
        let raw = match answered {
            Ok(result) => result?,
            Err(_) => {
                tracing::warn!(metric = %self.name, "No answer from the server; recovering session");
                match tokio::time::timeout(timeout + CLIENT_TIMEOUT_GRACE, executor.recover()).await {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => {
                        tracing::error!(metric = %self.name, error = %e, "Session recovery failed");
                    }
                    Err(_) => {
                        tracing::error!(metric = %self.name, "Session recovery timed out");
                    }
                }
                return Err(CollectionError::Timeout(timeout));
            }
        };

        if let Some(bad) = raw.rows.iter().find(|r| r.len() != raw.columns.len()) {
            return Err(CollectionError::Decode(format!(
                "row has {} cells but the result has {} columns",
                bad.len(),
                raw.columns.len()
            )));
        }

        Ok(MetricTable::new(self.name.clone(), raw.columns, raw.rows))
    }
}

/// Outcome of one collection pass.
///
/// A metric name lives either in the success map or in the failure map,
/// never both.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollectionResult {
    tables: BTreeMap<String, MetricTable>,
    failures: BTreeMap<String, CollectionError>,
}

impl CollectionResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the outcome for one metric, replacing any earlier outcome
    /// for the same name.
    pub fn record(&mut self, name: &str, outcome: Result<MetricTable, CollectionError>) {
        match outcome {
            Ok(table) => {
                self.failures.remove(name);
                self.tables.insert(name.to_string(), table);
            }
            Err(e) => {
                self.tables.remove(name);
                self.failures.insert(name.to_string(), e);
            }
        }
    }

    pub fn table(&self, name: &str) -> Option<&MetricTable> {
        self.tables.get(name)
    }

    /// Table for `name` only if it was collected and has at least one row.
    pub fn non_empty(&self, name: &str) -> Option<&MetricTable> {
        self.table(name).filter(|t| !t.is_empty())
    }

    pub fn tables(&self) -> impl Iterator<Item = &MetricTable> {
        self.tables.values()
    }

    pub fn failures(&self) -> &BTreeMap<String, CollectionError> {
        &self.failures
    }

    pub fn success_count(&self) -> usize {
        self.tables.len()
    }

    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }
}

/// Run every source in catalog order.
///
/// Query failures are absorbed into the result. Sink failures are not:
/// downstream phases rely on the persisted artifacts, so a write error
/// aborts the run.
pub async fn collect<X, S>(
    executor: &mut X,
    sources: &[MetricSource],
    timeout: Duration,
    sink: &mut S,
) -> Result<CollectionResult, S::Error>
where
    X: QueryExecutor + ?Sized,
    S: TableSink + ?Sized,
{
    let mut result = CollectionResult::new();

    for source in sources {
        let outcome = source.collect(executor, timeout).await;
        match &outcome {
            Ok(table) => {
                tracing::debug!(
                    metric = %source.name,
                    rows = table.rows.len(),
                    "Metric collected"
                );
                sink.persist(table)?;
            }
            Err(e) => {
                tracing::error!(metric = %source.name, error = %e, "Metric query failed");
            }
        }
        result.record(&source.name, outcome);
    }

    Ok(result)
}
