//! Spreadsheet output with per-sheet row chunking.

use std::ops::Range;
use std::path::Path;

use etl_model::{Table, Value};
use rust_xlsxwriter::{Workbook, Worksheet, XlsxError};
use tracing::debug;

use crate::WriteError;

/// Write the table as a workbook, splitting rows across sheets so no
/// sheet holds more than `sheet_row_limit` data rows. Sheets are named
/// `Sheet1`, `Sheet2`, ... in order; each carries the header row.
///
/// Returns the number of sheets written.
pub(crate) fn write_xlsx(
    table: &Table,
    path: &Path,
    sheet_row_limit: usize,
) -> Result<usize, WriteError> {
    if sheet_row_limit == 0 {
        return Err(WriteError::ZeroSheetRowLimit {
            path: path.to_path_buf(),
        });
    }
    build_workbook(table, path, sheet_row_limit).map_err(|source| WriteError::Spreadsheet {
        path: path.to_path_buf(),
        source,
    })
}

/// Row ranges per sheet: contiguous, in order, each at most `limit` rows.
/// An empty table still gets one (empty) sheet.
fn sheet_ranges(height: usize, limit: usize) -> Vec<Range<usize>> {
    let sheet_count = height.div_ceil(limit).max(1);
    (0..sheet_count)
        .map(|index| {
            let start = index * limit;
            start..(start + limit).min(height)
        })
        .collect()
}

fn build_workbook(table: &Table, path: &Path, limit: usize) -> Result<usize, XlsxError> {
    let ranges = sheet_ranges(table.height(), limit);

    let mut workbook = Workbook::new();
    for (sheet_index, range) in ranges.iter().enumerate() {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(format!("Sheet{}", sheet_index + 1))?;

        for (col, name) in table.column_names().enumerate() {
            worksheet.write_string(0, col as u16, name)?;
        }

        for (offset, row) in range.clone().enumerate() {
            for (col, column) in table.columns().iter().enumerate() {
                write_cell(worksheet, (offset + 1) as u32, col as u16, &column.values[row])?;
            }
        }
        debug!(sheet = sheet_index + 1, rows = range.len(), "sheet filled");
    }

    workbook.save(path)?;
    Ok(ranges.len())
}

fn write_cell(
    worksheet: &mut Worksheet,
    row: u32,
    col: u16,
    value: &Value,
) -> Result<(), XlsxError> {
    match value {
        Value::Str(s) => {
            worksheet.write_string(row, col, s.as_str())?;
        }
        Value::Int(n) => {
            worksheet.write_number(row, col, *n as f64)?;
        }
        Value::Float(f) => {
            worksheet.write_number(row, col, *f)?;
        }
        Value::Bool(b) => {
            worksheet.write_boolean(row, col, *b)?;
        }
        // Blank cell.
        Value::Null => {}
        other => {
            worksheet.write_string(row, col, other.render())?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranges_partition_the_rows_in_order() {
        let ranges = sheet_ranges(10, 4);
        assert_eq!(ranges, vec![0..4, 4..8, 8..10]);
    }

    #[test]
    fn no_range_exceeds_the_limit() {
        for (height, limit) in [(1, 1), (7, 3), (100, 99), (100, 100), (101, 100)] {
            let ranges = sheet_ranges(height, limit);
            let mut next = 0;
            for range in &ranges {
                assert_eq!(range.start, next, "height {height} limit {limit}");
                assert!(range.len() <= limit, "height {height} limit {limit}");
                next = range.end;
            }
            assert_eq!(next, height, "height {height} limit {limit}");
        }
    }

    #[test]
    fn exact_multiple_adds_no_trailing_sheet() {
        assert_eq!(sheet_ranges(8, 4), vec![0..4, 4..8]);
    }

    #[test]
    fn empty_table_still_gets_one_sheet() {
        assert_eq!(sheet_ranges(0, 4), vec![0..0]);
    }
}
