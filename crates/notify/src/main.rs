//! `dbhealth-notify` -- emails an alert when the latest health-check
//! summary reports a breach.
//!
//! Exits 0 whether or not an alert fires, and when no summary exists yet.
//! SMTP settings are only read once an alert has to go out, so a quiet run
//! needs none. Exits 1 on unreadable artifacts, missing SMTP settings when
//! alerting, or SMTP failures.
//!
//! # Environment variables
//!
//! See [`dbhealth_notify::EmailConfig::from_env`] for the SMTP settings;
//! `HEALTH_REPORT_DIR` selects the report directory.

use std::process::ExitCode;

use dbhealth_notify::{inspect_latest, send_alert, EmailConfig, EmailDelivery, Inspection};
use dbhealth_store::ReportDir;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    dotenvy::from_path("config/.env").ok();
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dbhealth_notify=info,dbhealth_store=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let reports = ReportDir::from_lookup(|key| std::env::var(key).ok());

    let (summary, body) = match inspect_latest(&reports) {
        Ok(Inspection::NoSummary) => {
            println!("No summary found.");
            return ExitCode::SUCCESS;
        }
        Ok(Inspection::NoAlert { .. }) => {
            println!("No alerts.");
            return ExitCode::SUCCESS;
        }
        Ok(Inspection::Alert { summary, body }) => (summary, body),
        Err(e) => {
            tracing::error!(error = %e, "Could not read the latest summary");
            return ExitCode::FAILURE;
        }
    };

    let email = match EmailConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Invalid email configuration");
            return ExitCode::FAILURE;
        }
    };

    match send_alert(&EmailDelivery::new(email), &summary, &body).await {
        Ok(()) => {
            println!("Alert sent.");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Notification failed");
            ExitCode::FAILURE
        }
    }
}
