//! Well-known metric kinds and the column names the evaluator reads.
//!
//! Metric names double as artifact filename suffixes and spreadsheet
//! sheet names, so they must stay stable across releases.

/// Tablespace fill level, one row per tablespace.
pub const METRIC_TABLESPACE: &str = "tablespace";

/// Count of sessions currently executing work.
pub const METRIC_SESSIONS: &str = "sessions";

/// Statements with the highest cumulative elapsed time.
pub const METRIC_TOP_SQL: &str = "top_sql";

/// Server resource statistics. Collected and persisted, never evaluated.
pub const METRIC_OS: &str = "os";

/// Artifact kind of the per-run summary.
pub const SUMMARY: &str = "summary";

/// Percent-used column of the tablespace table.
pub const COL_PCT_USED: &str = "pct_used";

/// Scalar column of the sessions table.
pub const COL_ACTIVE_SESSIONS: &str = "active_sessions";

/// Elapsed-time column of the top-SQL table.
pub const COL_ELAPSED_MS: &str = "elapsed_ms";

/// Sheets of the consolidated report, in workbook order.
pub const REPORT_KINDS: [&str; 4] = [METRIC_TABLESPACE, METRIC_SESSIONS, METRIC_TOP_SQL, SUMMARY];
