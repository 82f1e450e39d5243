//! Alert line types for threshold breaches.

use std::fmt;

use serde::Serialize;

/// Severity tier of a threshold breach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    /// Breach that needs urgent action.
    Crit,
    /// Early warning.
    Warn,
}

impl Severity {
    /// Literal prefix written into the summary artifact.
    ///
    /// The notifier decides purely by looking for these substrings, so
    /// changing them silently disables alerting.
    pub fn marker(self) -> &'static str {
        match self {
            Severity::Crit => CRIT_MARKER,
            Severity::Warn => WARN_MARKER,
        }
    }
}

pub const CRIT_MARKER: &str = "CRIT:";
pub const WARN_MARKER: &str = "WARN:";

/// One evaluated alert.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertLine {
    pub severity: Severity,
    pub message: String,
}

impl AlertLine {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
        }
    }
}

/// Renders as `CRIT: <message>` / `WARN: <message>`.
impl fmt::Display for AlertLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.severity.marker(), self.message)
    }
}

/// True if the text carries a CRIT or WARN marker anywhere.
pub fn contains_alert_marker(text: &str) -> bool {
    text.contains(CRIT_MARKER) || text.contains(WARN_MARKER)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_marker() {
        let line = AlertLine::new(Severity::Crit, "Tablespace usage 96%");
        assert_eq!(line.to_string(), "CRIT: Tablespace usage 96%");
        let line = AlertLine::new(Severity::Warn, "Active sessions 60");
        assert_eq!(line.to_string(), "WARN: Active sessions 60");
    }

    #[test]
    fn marker_scan() {
        assert!(contains_alert_marker("alert,WARN: Active sessions 60"));
        assert!(!contains_alert_marker("metric,value\nalerts_count,0\n"));
        // Bare words without the colon are not markers.
        assert!(!contains_alert_marker("CRITICAL WARNING"));
    }
}
