//! Latest-summary content sniffing.
//!
//! The summary is not parsed; it is searched for the literal `CRIT:`/`WARN:`
//! markers. Any change to the summary format has to keep those substrings or
//! alerting stops.

use std::path::{Path, PathBuf};

use dbhealth_core::alert::contains_alert_marker;
use dbhealth_core::metric_names::SUMMARY;
use dbhealth_store::{ReportDir, StoreError};

use crate::email::{AlertSender, EmailError};

/// Fixed subject line of every alert.
pub const ALERT_SUBJECT: &str = "DB ALERT: Health Check Thresholds Breached";

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Delivery(#[from] EmailError),
}

/// What the latest summary calls for. Needs no mail configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inspection {
    /// No run has written a summary yet.
    NoSummary,
    /// The latest summary carries no markers.
    NoAlert { summary: PathBuf },
    /// The latest summary reports a breach; `body` is its full text.
    Alert { summary: PathBuf, body: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifyOutcome {
    /// No run has written a summary yet.
    NoSummary,
    /// The latest summary carries no markers.
    NoAlert { summary: PathBuf },
    /// An alert was delivered.
    Sent { summary: PathBuf },
}

/// Find the most recent summary and decide whether it needs an alert.
pub fn inspect_latest(reports: &ReportDir) -> Result<Inspection, StoreError> {
    let Some(summary) = reports.latest_csv(SUMMARY)? else {
        tracing::info!(dir = %reports.root().display(), "No summary artifact found");
        return Ok(Inspection::NoSummary);
    };

    let body = reports.read_text(&summary)?;
    if !contains_alert_marker(&body) {
        tracing::info!(summary = %summary.display(), "Latest summary has no alerts");
        return Ok(Inspection::NoAlert { summary });
    }

    Ok(Inspection::Alert { summary, body })
}

/// Deliver an alert whose body is a summary's full text.
pub async fn send_alert(sender: &dyn AlertSender, summary: &Path, body: &str) -> Result<(), EmailError> {
    sender.send(ALERT_SUBJECT, body).await?;
    tracing::info!(summary = %summary.display(), "Alert delivered");
    Ok(())
}

/// Inspect the most recent summary and alert if it reports any breach.
pub async fn notify_latest(
    reports: &ReportDir,
    sender: &dyn AlertSender,
) -> Result<NotifyOutcome, NotifyError> {
    Ok(match inspect_latest(reports)? {
        Inspection::NoSummary => NotifyOutcome::NoSummary,
        Inspection::NoAlert { summary } => NotifyOutcome::NoAlert { summary },
        Inspection::Alert { summary, body } => {
            send_alert(sender, &summary, &body).await?;
            NotifyOutcome::Sent { summary }
        }
    })
}
