use thiserror::Error;

/// Errors produced while parsing or validating a mapping document.
///
/// Mapping errors are fatal: they abort the request before any row is read.
#[derive(Debug, Error)]
pub enum MappingError {
    #[error("mapping document is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A structurally valid document that violates a mapping invariant.
    /// `path` identifies the offending field, e.g. `mappings[2].target`.
    #[error("invalid mapping at {path}: {reason}")]
    Invalid { path: String, reason: String },
}

impl MappingError {
    pub fn invalid(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Invalid {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
