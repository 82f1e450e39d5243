//! Spreadsheet rendering of metric tables.

use std::path::Path;

use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};

use dbhealth_core::table::{MetricTable, Value};

use crate::error::StoreError;

/// Largest magnitude a spreadsheet number (an IEEE double) holds exactly.
const MAX_EXACT_INTEGER: i64 = 1 << 53;

/// Write one sheet per table, named after the table, in the given order.
pub fn write_workbook(path: &Path, sheets: &[MetricTable]) -> Result<(), StoreError> {
    let to_store = |source| StoreError::Xlsx {
        path: path.to_path_buf(),
        source,
    };

    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();

    for table in sheets {
        let worksheet = workbook.add_worksheet();
        fill_sheet(worksheet, table, &header).map_err(to_store)?;
    }

    workbook.save(path).map_err(to_store)
}

fn fill_sheet(sheet: &mut Worksheet, table: &MetricTable, header: &Format) -> Result<(), XlsxError> {
    sheet.set_name(&table.name)?;

    for (col, name) in table.columns.iter().enumerate() {
        sheet.write_string_with_format(0, col_index(col)?, name, header)?;
    }

    for (r, row) in table.rows.iter().enumerate() {
        let row_idx = u32::try_from(r + 1).map_err(|_| XlsxError::RowColumnLimitError)?;
        for (c, value) in row.iter().enumerate() {
            let col = col_index(c)?;
            match value {
                Value::Integer(i) => match exact_number(*i) {
                    Some(n) => {
                        sheet.write_number(row_idx, col, n)?;
                    }
                    None => {
                        sheet.write_string(row_idx, col, i.to_string())?;
                    }
                },
                Value::Float(f) => {
                    sheet.write_number(row_idx, col, *f)?;
                }
                Value::Text(s) => {
                    sheet.write_string(row_idx, col, s)?;
                }
                Value::Null => {}
            }
        }
    }

    Ok(())
}

/// `None` when the integer would lose digits as a spreadsheet number.
fn exact_number(i: i64) -> Option<f64> {
    (i.unsigned_abs() <= MAX_EXACT_INTEGER.unsigned_abs()).then_some(i as f64)
}

fn col_index(col: usize) -> Result<u16, XlsxError> {
    u16::try_from(col).map_err(|_| XlsxError::RowColumnLimitError)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_multi_sheet_workbook() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("report.xlsx");
        let sheets = vec![
            MetricTable::new(
                "sessions",
                vec!["active_sessions".into()],
                vec![vec![Value::Integer(12)]],
            ),
            MetricTable::new(
                "summary",
                vec!["metric".into(), "value".into()],
                vec![vec!["alerts_count".into(), Value::Integer(0)]],
            ),
        ];

        write_workbook(&path, &sheets).expect("write workbook");

        let bytes = std::fs::read(&path).expect("read workbook");
        // XLSX is a zip container.
        assert_eq!(&bytes[..2], b"PK");
    }

    #[test]
    fn integers_beyond_double_precision_are_not_numbers() {
        assert_eq!(exact_number(42), Some(42.0));
        assert_eq!(exact_number(MAX_EXACT_INTEGER), Some(9_007_199_254_740_992.0));
        assert_eq!(exact_number(-MAX_EXACT_INTEGER), Some(-9_007_199_254_740_992.0));
        assert_eq!(exact_number(MAX_EXACT_INTEGER + 1), None);
        assert_eq!(exact_number(i64::MIN), None);
    }

    #[test]
    fn duplicate_sheet_names_are_rejected() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("dup.xlsx");
        let table = MetricTable::new("os", vec!["stat_name".into()], vec![]);

        let err = write_workbook(&path, &[table.clone(), table]).unwrap_err();
        assert!(matches!(err, StoreError::Xlsx { .. }), "got {err:?}");
    }
}
