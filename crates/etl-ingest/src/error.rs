use std::path::PathBuf;

use polars::error::PolarsError;
use thiserror::Error;

/// Failure to load an input table.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("unsupported input format for {path}, expected .csv or .parquet")]
    UnsupportedFormat { path: PathBuf },

    #[error("failed to open {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: PolarsError,
    },
}
