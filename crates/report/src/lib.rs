//! Consolidation of historical per-run CSV artifacts into one workbook.
//!
//! For each report kind (`tablespace`, `sessions`, `top_sql`, `summary`)
//! every `<stamp>_<kind>.csv` in the report directory is appended, oldest
//! first, to a sheet of that name. Rows are appended as-is: there is no
//! deduplication and no reconciliation when a kind's columns changed
//! between runs. Such files are logged and their rows still land under
//! the first file's header.

use std::path::PathBuf;

use dbhealth_core::artifact::RunStamp;
use dbhealth_core::metric_names::REPORT_KINDS;
use dbhealth_core::table::MetricTable;
use dbhealth_store::{csv_io, xlsx, ReportDir, StoreError};

/// What went into one sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetReport {
    pub kind: String,
    pub files: Vec<PathBuf>,
    pub rows: usize,
    /// Files whose header differs from the sheet header.
    pub mismatched: Vec<PathBuf>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConsolidatedReport {
    pub path: PathBuf,
    pub sheets: Vec<SheetReport>,
}

/// Build `<stamp>_DB_Health_Report.xlsx` in the report directory.
///
/// Kinds with no artifacts get no sheet.
pub fn consolidate(reports: &ReportDir, stamp: &RunStamp) -> Result<ConsolidatedReport, StoreError> {
    reports.ensure()?;

    let mut tables = Vec::new();
    let mut sheets = Vec::new();

    for kind in REPORT_KINDS {
        let files = reports.list_csv(kind)?;
        if files.is_empty() {
            tracing::debug!(kind, "No artifacts for sheet");
            continue;
        }

        let mut merged: Option<MetricTable> = None;
        let mut mismatched = Vec::new();
        for (_, path) in &files {
            let table = csv_io::read_table(path, kind)?;
            match merged.as_mut() {
                None => merged = Some(table),
                Some(sheet) => {
                    if sheet.columns != table.columns {
                        tracing::warn!(
                            kind,
                            path = %path.display(),
                            expected = ?sheet.columns,
                            found = ?table.columns,
                            "Column set changed between runs; appending rows as-is"
                        );
                        mismatched.push(path.clone());
                    }
                    sheet.rows.extend(table.rows);
                }
            }
        }

        if let Some(sheet) = merged {
            sheets.push(SheetReport {
                kind: kind.to_string(),
                files: files.into_iter().map(|(_, p)| p).collect(),
                rows: sheet.rows.len(),
                mismatched,
            });
            tables.push(sheet);
        }
    }

    let path = reports.path_of(&stamp.report_xlsx());
    xlsx::write_workbook(&path, &tables)?;
    tracing::info!(path = %path.display(), sheets = tables.len(), "Consolidated report written");

    Ok(ConsolidatedReport { path, sheets })
}
