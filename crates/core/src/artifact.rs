//! Artifact naming contract.
//!
//! The check run, the notifier and the consolidator never share memory;
//! they only agree on file names. Every artifact is named
//! `<stamp>_<kind>.<ext>` where the stamp is a fixed-width
//! `YYYYMMDD_HHMMSS` timestamp, so lexical order of names equals
//! chronological order of runs.
//!
//! Stamps are UTC. Local clock time repeats an hour when daylight saving
//! ends, which would let a later run sort before an earlier one.

use std::fmt;

use chrono::{NaiveDateTime, Utc};

use crate::error::CoreError;
use crate::metric_names::SUMMARY;

const STAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
const STAMP_LEN: usize = 15;

/// Suffix of the consolidated workbook.
pub const REPORT_SUFFIX: &str = "DB_Health_Report";

/// Run identifier and filename prefix.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RunStamp(String);

impl RunStamp {
    /// Stamp for the current UTC time.
    pub fn now() -> Self {
        Self(Utc::now().format(STAMP_FORMAT).to_string())
    }

    /// Validate a stamp: exactly 15 characters and a real calendar time.
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        if raw.len() != STAMP_LEN || !raw.is_ascii() {
            return Err(CoreError::InvalidRunStamp(raw.to_string()));
        }
        NaiveDateTime::parse_from_str(raw, STAMP_FORMAT)
            .map_err(|_| CoreError::InvalidRunStamp(raw.to_string()))?;
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `<stamp>_<metric>.csv`
    pub fn table_csv(&self, metric: &str) -> String {
        format!("{}_{metric}.csv", self.0)
    }

    /// `<stamp>_<metric>.xlsx`
    pub fn table_xlsx(&self, metric: &str) -> String {
        format!("{}_{metric}.xlsx", self.0)
    }

    /// `<stamp>_summary.csv`
    pub fn summary_csv(&self) -> String {
        self.table_csv(SUMMARY)
    }

    /// `<stamp>_DB_Health_Report.xlsx`
    pub fn report_xlsx(&self) -> String {
        self.table_xlsx(REPORT_SUFFIX)
    }
}

impl fmt::Display for RunStamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Split `<stamp>_<kind>.csv` into its stamp. Returns `Ok(None)` when the
/// name is not a CSV artifact of `kind`, and an error when it is one but
/// its prefix is not a valid stamp.
pub fn stamp_of_csv(file_name: &str, kind: &str) -> Result<Option<RunStamp>, CoreError> {
    let suffix = format!("_{kind}.csv");
    let Some(prefix) = file_name.strip_suffix(&suffix) else {
        return Ok(None);
    };
    RunStamp::parse(prefix).map(Some)
}
