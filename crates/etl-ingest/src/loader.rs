//! File loading entry points.

use std::fs::File;
use std::path::Path;

use etl_model::Table;
use polars::prelude::{CsvReadOptions, ParquetReader, SerReader};
use tracing::debug;

use crate::convert::dataframe_to_table;
use crate::error::IngestError;

/// Recognized input file formats, detected by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Csv,
    Parquet,
}

impl InputFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()?.to_ascii_lowercase().as_str() {
            "csv" => Some(Self::Csv),
            "parquet" => Some(Self::Parquet),
            _ => None,
        }
    }
}

/// Load an input file into a table, dispatching on its extension.
pub fn load_table(path: &Path) -> Result<Table, IngestError> {
    match InputFormat::from_path(path) {
        Some(InputFormat::Csv) => read_csv_table(path),
        Some(InputFormat::Parquet) => read_parquet_table(path),
        None => Err(IngestError::UnsupportedFormat {
            path: path.to_path_buf(),
        }),
    }
}

/// Read a headered CSV file, letting polars infer column types.
pub fn read_csv_table(path: &Path) -> Result<Table, IngestError> {
    let read_err = |source| IngestError::Read {
        path: path.to_path_buf(),
        source,
    };

    let df = CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .map_err(read_err)?
        .finish()
        .map_err(read_err)?;
    debug!(path = %path.display(), rows = df.height(), cols = df.width(), "csv loaded");
    dataframe_to_table(&df).map_err(read_err)
}

/// Read a Parquet file.
pub fn read_parquet_table(path: &Path) -> Result<Table, IngestError> {
    let read_err = |source| IngestError::Read {
        path: path.to_path_buf(),
        source,
    };

    let file = File::open(path).map_err(|source| IngestError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let df = ParquetReader::new(file).finish().map_err(read_err)?;
    debug!(path = %path.display(), rows = df.height(), cols = df.width(), "parquet loaded");
    dataframe_to_table(&df).map_err(read_err)
}
