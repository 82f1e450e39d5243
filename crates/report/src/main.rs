//! `dbhealth-report` -- merges every historical run artifact into one
//! multi-sheet workbook and prints its path.
//!
//! `HEALTH_REPORT_DIR` selects the report directory.

use std::process::ExitCode;

use dbhealth_core::artifact::RunStamp;
use dbhealth_report::consolidate;
use dbhealth_store::ReportDir;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> ExitCode {
    dotenvy::from_path("config/.env").ok();
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dbhealth_report=info,dbhealth_store=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let reports = ReportDir::from_lookup(|key| std::env::var(key).ok());

    match consolidate(&reports, &RunStamp::now()) {
        Ok(report) => {
            println!("Consolidated report: {}", report.path.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Consolidation failed");
            ExitCode::FAILURE
        }
    }
}
