//! `dbhealth-check` -- single-pass database health check.
//!
//! Samples the diagnostic catalog, writes one CSV + XLSX per metric and a
//! `<stamp>_summary.csv`, then exits. Exits 0 even when individual metrics
//! fail to collect; exits 1 on configuration, connection or persistence
//! errors. See [`dbhealth_check::config`] for environment variables.

use std::process::ExitCode;

use dbhealth_check::{run_health_check, CheckConfig};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    dotenvy::from_path("config/.env").ok();
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dbhealth_check=info,dbhealth_core=info,dbhealth_db=info,dbhealth_store=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match CheckConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    match run_health_check(&config).await {
        Ok(outcome) => {
            println!("| Summary | Alerts |");
            println!(
                "| {} | {} |",
                outcome.summary.run_id,
                outcome.summary.alert_count()
            );
            if !outcome.failed.is_empty() {
                let names: Vec<&str> = outcome.failed.iter().map(|(n, _)| n.as_str()).collect();
                println!("Metrics not collected: {}", names.join(", "));
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Health check failed");
            ExitCode::FAILURE
        }
    }
}
