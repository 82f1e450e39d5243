//! Persists the artifacts of a single run.

use std::path::PathBuf;

use dbhealth_core::artifact::RunStamp;
use dbhealth_core::collection::TableSink;
use dbhealth_core::summary::RunSummary;
use dbhealth_core::table::MetricTable;

use crate::csv_io;
use crate::error::StoreError;
use crate::report_dir::ReportDir;
use crate::xlsx;

/// Writes `<stamp>_<metric>.csv` + `.xlsx` per table and
/// `<stamp>_summary.csv` for the run.
#[derive(Debug)]
pub struct RunWriter {
    dir: ReportDir,
    stamp: RunStamp,
    written: Vec<PathBuf>,
}

impl RunWriter {
    /// Prepare a writer, creating the report directory if needed.
    pub fn create(dir: ReportDir, stamp: RunStamp) -> Result<Self, StoreError> {
        dir.ensure()?;
        Ok(Self {
            dir,
            stamp,
            written: Vec::new(),
        })
    }

    pub fn stamp(&self) -> &RunStamp {
        &self.stamp
    }

    /// Every file written so far, in write order.
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    pub fn write_table(&mut self, table: &MetricTable) -> Result<(), StoreError> {
        let csv_path = self.dir.path_of(&self.stamp.table_csv(&table.name));
        csv_io::write_table(&csv_path, table)?;
        self.written.push(csv_path);

        let xlsx_path = self.dir.path_of(&self.stamp.table_xlsx(&table.name));
        xlsx::write_workbook(&xlsx_path, std::slice::from_ref(table))?;
        self.written.push(xlsx_path);

        tracing::debug!(metric = %table.name, run_id = %self.stamp, "Metric artifacts written");
        Ok(())
    }

    pub fn write_summary(&mut self, summary: &RunSummary) -> Result<PathBuf, StoreError> {
        let path = self.dir.path_of(&self.stamp.summary_csv());
        csv_io::write_summary(&path, summary)?;
        self.written.push(path.clone());
        Ok(path)
    }
}

impl TableSink for RunWriter {
    type Error = StoreError;

    fn persist(&mut self, table: &MetricTable) -> Result<(), StoreError> {
        self.write_table(table)
    }
}
