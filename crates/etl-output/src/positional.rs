//! Fixed-width positional output.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use etl_model::{MappingDocument, Table, Value};
use tracing::warn;

use crate::WriteError;

/// Column width used when the mapping does not specify one.
pub const DEFAULT_FIELD_WIDTH: usize = 20;

/// Write the table as fixed-width text without delimiters.
///
/// Each column occupies the width declared on its field mapping (or the
/// default). Numbers are right-aligned, everything else left-aligned;
/// values longer than the width are truncated.
pub(crate) fn write_positional(
    table: &Table,
    document: &MappingDocument,
    path: &Path,
) -> Result<(), WriteError> {
    let io_err = |source| WriteError::io(path, source);

    let declared: BTreeMap<&str, usize> = document
        .mappings
        .iter()
        .filter_map(|m| m.length.map(|len| (m.target.as_str(), len)))
        .collect();

    let file = File::create(path).map_err(io_err)?;
    let mut writer = BufWriter::new(file);
    let mut line = String::new();
    for row in 0..table.height() {
        line.clear();
        for column in table.columns() {
            let width = declared
                .get(column.name.as_str())
                .copied()
                .unwrap_or(DEFAULT_FIELD_WIDTH);
            line.push_str(&render_cell(&column.values[row], &column.name, row, width));
        }
        line.push('\n');
        writer.write_all(line.as_bytes()).map_err(io_err)?;
    }
    writer.flush().map_err(io_err)?;
    Ok(())
}

fn render_cell(value: &Value, column: &str, row: usize, width: usize) -> String {
    let text = value.render();
    if text.chars().count() > width {
        warn!(column, row, width, "truncating value to field width");
        return text.chars().take(width).collect();
    }
    if value.is_numeric() {
        format!("{text:>width$}")
    } else {
        format!("{text:<width$}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_right_align_text_left_aligns() {
        assert_eq!(render_cell(&Value::Int(42), "n", 0, 5), "   42");
        assert_eq!(render_cell(&Value::Str("ab".into()), "s", 0, 5), "ab   ");
    }

    #[test]
    fn overlong_values_truncate_to_width() {
        let value = Value::Str("abcdefgh".into());
        assert_eq!(render_cell(&value, "s", 0, 4), "abcd");
    }

    #[test]
    fn null_renders_as_blank_field() {
        assert_eq!(render_cell(&Value::Null, "s", 0, 3), "   ");
    }
}
