//! CSV readers and writers for metric tables and run summaries.

use std::path::Path;

use dbhealth_core::summary::{RunSummary, SUMMARY_HEADER};
use dbhealth_core::table::{MetricTable, Value};

use crate::error::StoreError;

fn csv_err(path: &Path) -> impl FnOnce(csv::Error) -> StoreError + '_ {
    move |source| StoreError::Csv {
        path: path.to_path_buf(),
        source,
    }
}

/// Write a table with its native header. Nulls become empty fields.
pub fn write_table(path: &Path, table: &MetricTable) -> Result<(), StoreError> {
    let mut writer = csv::Writer::from_path(path).map_err(csv_err(path))?;
    writer
        .write_record(&table.columns)
        .map_err(csv_err(path))?;
    for row in &table.rows {
        writer
            .write_record(row.iter().map(Value::to_string))
            .map_err(csv_err(path))?;
    }
    writer.flush().map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Write the `metric,value` summary: header, `alerts_count`, then one
/// `alert` row per line.
pub fn write_summary(path: &Path, summary: &RunSummary) -> Result<(), StoreError> {
    let mut writer = csv::Writer::from_path(path).map_err(csv_err(path))?;
    writer.write_record(SUMMARY_HEADER).map_err(csv_err(path))?;
    for row in summary.rows() {
        writer.write_record(&row).map_err(csv_err(path))?;
    }
    writer.flush().map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Read a CSV artifact back into a table, inferring cell types.
pub fn read_table(path: &Path, name: &str) -> Result<MetricTable, StoreError> {
    let mut reader = csv::Reader::from_path(path).map_err(csv_err(path))?;
    let columns: Vec<String> = reader
        .headers()
        .map_err(csv_err(path))?
        .iter()
        .map(str::to_string)
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(csv_err(path))?;
        rows.push(record.iter().map(Value::infer).collect());
    }

    Ok(MetricTable::new(name, columns, rows))
}
