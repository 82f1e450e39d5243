//! Per-run summary in the long `metric,value` layout.
//!
//! The summary file is the only thing the notifier reads, and it reads it
//! as text: severity is folded into each message as a `CRIT:`/`WARN:`
//! prefix rather than stored in its own column.

use crate::alert::AlertLine;
use crate::artifact::RunStamp;

/// Header row of the summary artifact.
pub const SUMMARY_HEADER: [&str; 2] = ["metric", "value"];

/// Row label carrying the alert count.
pub const ALERTS_COUNT_ROW: &str = "alerts_count";

/// Row label carrying one alert.
pub const ALERT_ROW: &str = "alert";

#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub run_id: RunStamp,
    pub alerts: Vec<AlertLine>,
}

impl RunSummary {
    pub fn new(run_id: RunStamp, alerts: Vec<AlertLine>) -> Self {
        Self { run_id, alerts }
    }

    pub fn alert_count(&self) -> usize {
        self.alerts.len()
    }

    /// Data rows (without header): the count first, then one row per alert
    /// in evaluation order.
    pub fn rows(&self) -> Vec<[String; 2]> {
        let mut rows = Vec::with_capacity(self.alerts.len() + 1);
        rows.push([ALERTS_COUNT_ROW.to_string(), self.alert_count().to_string()]);
        rows.extend(
            self.alerts
                .iter()
                .map(|a| [ALERT_ROW.to_string(), a.to_string()]),
        );
        rows
    }
}
