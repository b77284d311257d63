//! Multi-format output writing.
//!
//! One entry point, [`write_table`], serializes a transformed table to the
//! format declared in the mapping document: csv, newline-delimited JSON,
//! xml, fixed-width positional text, or a chunked spreadsheet. The output
//! path is owned by an [`OutputGuard`] for the duration of the write, so a
//! failure on any path leaves no partial file behind.

use std::fs;
use std::path::{Path, PathBuf};

use etl_model::{MappingDocument, OutputFormat, Table};
use tracing::info;

mod csv;
mod error;
mod guard;
mod jsonl;
mod positional;
mod spreadsheet;
mod xml;

pub use error::WriteError;
pub use guard::OutputGuard;
pub use positional::DEFAULT_FIELD_WIDTH;

/// Per-sheet row threshold for spreadsheet output.
pub const DEFAULT_SHEET_ROW_LIMIT: usize = 1_048_000;

/// Writer tuning knobs.
#[derive(Debug, Clone)]
pub struct WriterOptions {
    /// Maximum data rows per spreadsheet sheet.
    pub sheet_row_limit: usize,
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self {
            sheet_row_limit: DEFAULT_SHEET_ROW_LIMIT,
        }
    }
}

/// Outcome of a successful write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteResult {
    pub path: PathBuf,
    /// Number of sheets written; 1 for every non-spreadsheet format.
    pub sheets: usize,
}

/// Serialize `table` under `output_dir` at the mapping's
/// `<output_path>.<ext>` location.
pub fn write_table(
    table: &Table,
    document: &MappingDocument,
    output_dir: &Path,
    options: &WriterOptions,
) -> Result<WriteResult, WriteError> {
    let file_name = format!(
        "{}.{}",
        document.output_path,
        document.output_format.extension()
    );
    let path = output_dir.join(file_name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| WriteError::io(parent, source))?;
    }

    let guard = OutputGuard::new(&path);
    let sheets = match document.output_format {
        OutputFormat::Csv => {
            csv::write_csv(table, &path)?;
            1
        }
        OutputFormat::Json => {
            jsonl::write_jsonl(table, &path)?;
            1
        }
        OutputFormat::Xml => {
            let config = document
                .xml_config
                .as_ref()
                .ok_or_else(|| WriteError::MissingXmlConfig { path: path.clone() })?;
            xml::write_xml(table, config, &path)?;
            1
        }
        OutputFormat::Positional => {
            positional::write_positional(table, document, &path)?;
            1
        }
        OutputFormat::Xlsx => spreadsheet::write_xlsx(table, &path, options.sheet_row_limit)?,
    };
    guard.commit();

    info!(path = %path.display(), rows = table.height(), sheets, "output written");
    Ok(WriteResult { path, sheets })
}
