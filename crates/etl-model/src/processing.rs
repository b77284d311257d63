//! Request/response types for one transformation job.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// A row-scoped problem recorded during evaluation or validation.
///
/// Row indices refer to the input table, before filtering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowIssue {
    pub row: usize,
    pub field: String,
    pub reason: String,
}

/// Summary returned to the caller after a successful run.
///
/// The caller always receives either this report plus a complete output
/// artifact, or a fatal error and no artifact at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformReport {
    pub output_path: PathBuf,
    pub total_rows: usize,
    pub accepted_rows: usize,
    pub rejected_rows: usize,
    pub issues: Vec<RowIssue>,
}
