//! Orchestration of a single health-check pass.

use std::path::PathBuf;
use std::time::Duration;

use dbhealth_core::artifact::RunStamp;
use dbhealth_core::collection::{collect, MetricSource, QueryExecutor};
use dbhealth_core::summary::RunSummary;
use dbhealth_core::thresholds::{evaluate, ThresholdConfig};
use dbhealth_db::catalog::default_catalog;
use dbhealth_db::PgExecutor;
use dbhealth_store::{RunWriter, StoreError};

use crate::config::CheckConfig;
use crate::error::CheckError;

/// What a finished run produced.
#[derive(Debug)]
pub struct RunOutcome {
    pub summary: RunSummary,
    pub summary_path: PathBuf,
    /// Metrics that could not be collected, with the reason.
    pub failed: Vec<(String, String)>,
}

/// Full pass against the configured database.
///
/// The connection is held for the whole catalog and closed before
/// evaluation; on any early return it is dropped, which closes the socket.
pub async fn run_health_check(config: &CheckConfig) -> Result<RunOutcome, CheckError> {
    let stamp = RunStamp::now();
    let mut writer = RunWriter::create(config.report_dir.clone(), stamp.clone())?;

    let mut executor = PgExecutor::connect(&config.database, config.query_timeout).await?;
    tracing::info!(run_id = %stamp, host = %config.database.host, "Connected to database");

    if let Err(e) = dbhealth_db::health_check(executor.connection()).await {
        executor.close().await;
        return Err(CheckError::Probe(e));
    }

    let catalog = default_catalog(config.tablespace_quota_mb);
    let outcome = run_with_executor(
        &mut executor,
        &catalog,
        config.query_timeout,
        &config.thresholds,
        &mut writer,
    )
    .await;
    executor.close().await;

    Ok(outcome?)
}

/// Collect, persist, evaluate and write the summary through any executor.
pub async fn run_with_executor<X>(
    executor: &mut X,
    catalog: &[MetricSource],
    query_timeout: Duration,
    thresholds: &ThresholdConfig,
    writer: &mut RunWriter,
) -> Result<RunOutcome, StoreError>
where
    X: QueryExecutor + ?Sized,
{
    let collected = collect(executor, catalog, query_timeout, writer).await?;

    let alerts = evaluate(&collected, thresholds);
    let summary = RunSummary::new(writer.stamp().clone(), alerts);
    let summary_path = writer.write_summary(&summary)?;

    let failed = collected
        .failures()
        .iter()
        .map(|(name, e)| (name.clone(), e.to_string()))
        .collect();

    tracing::info!(
        run_id = %summary.run_id,
        collected = collected.success_count(),
        failed = collected.failure_count(),
        alerts = summary.alert_count(),
        "Health check complete"
    );

    Ok(RunOutcome {
        summary,
        summary_path,
        failed,
    })
}
