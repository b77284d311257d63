//! Delimited text output.

use std::path::Path;

use etl_model::Table;

use crate::WriteError;

/// Write the table as comma-delimited text with a header row.
///
/// Values use their canonical string form; null becomes an empty field.
pub(crate) fn write_csv(table: &Table, path: &Path) -> Result<(), WriteError> {
    let csv_err = |source| WriteError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut writer = ::csv::Writer::from_path(path).map_err(csv_err)?;
    writer
        .write_record(table.column_names())
        .map_err(csv_err)?;
    for row in 0..table.height() {
        let record = table.columns().iter().map(|c| c.values[row].render());
        writer.write_record(record).map_err(csv_err)?;
    }
    writer
        .flush()
        .map_err(|source| WriteError::io(path, source))?;
    Ok(())
}
