//! Newline-delimited JSON output.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use etl_model::Table;
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::WriteError;

/// One table row serialized as a JSON object, columns in table order.
struct JsonRow<'a> {
    table: &'a Table,
    row: usize,
}

impl Serialize for JsonRow<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.table.width()))?;
        for column in self.table.columns() {
            map.serialize_entry(&column.name, &column.values[self.row].to_json())?;
        }
        map.end()
    }
}

/// Write one JSON object per row, newline-delimited.
pub(crate) fn write_jsonl(table: &Table, path: &Path) -> Result<(), WriteError> {
    let io_err = |source| WriteError::io(path, source);

    let file = File::create(path).map_err(io_err)?;
    let mut writer = BufWriter::new(file);
    for row in 0..table.height() {
        serde_json::to_writer(&mut writer, &JsonRow { table, row }).map_err(|source| {
            WriteError::Json {
                path: path.to_path_buf(),
                source,
            }
        })?;
        writer.write_all(b"\n").map_err(io_err)?;
    }
    writer.flush().map_err(io_err)?;
    Ok(())
}
