use std::path::PathBuf;

use thiserror::Error;

/// A fatal output-writing failure.
///
/// Write errors abort the remaining output and trigger removal of any
/// partially written file; the caller never sees a half-written artifact.
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("csv serialization failed for {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: ::csv::Error,
    },

    #[error("json serialization failed for {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("xml serialization failed for {path}: {source}")]
    Xml {
        path: PathBuf,
        #[source]
        source: quick_xml::Error,
    },

    #[error("spreadsheet serialization failed for {path}: {source}")]
    Spreadsheet {
        path: PathBuf,
        #[source]
        source: rust_xlsxwriter::XlsxError,
    },

    #[error("xml output for {path} requires an xml_config")]
    MissingXmlConfig { path: PathBuf },

    #[error("sheet row limit must be at least 1 for {path}")]
    ZeroSheetRowLimit { path: PathBuf },
}

impl WriteError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
