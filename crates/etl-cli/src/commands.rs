//! Command implementations.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use comfy_table::Table;
use etl_expr::FunctionId;
use etl_ingest::load_table;
use etl_model::{MappingDocument, TransformReport};
use etl_output::{WriteResult, WriterOptions, write_table};
use etl_transform::{PipelineOptions, run_pipeline};
use etl_validate::ValidationPolicy;
use tracing::{info, info_span};

use crate::summary::apply_table_style;

/// One transformation request, as resolved from CLI flags.
#[derive(Debug, Clone)]
pub struct TransformRequest {
    pub input: PathBuf,
    pub mapping: PathBuf,
    pub output_dir: PathBuf,
    /// Request clock; defaults to today when absent.
    pub current_date: Option<NaiveDate>,
    pub policy: ValidationPolicy,
    /// Override for the per-sheet spreadsheet row threshold.
    pub sheet_row_limit: Option<usize>,
    pub dry_run: bool,
}

/// What a transform run produced.
#[derive(Debug, Clone)]
pub struct TransformOutcome {
    pub report: TransformReport,
    /// Absent on dry runs.
    pub written: Option<WriteResult>,
}

/// Load the input, run the pipeline, and write the output artifact.
pub fn run_transform(request: &TransformRequest) -> Result<TransformOutcome> {
    let span = info_span!("transform", input = %request.input.display());
    let _guard = span.enter();

    let raw = fs::read_to_string(&request.mapping)
        .with_context(|| format!("read mapping document {}", request.mapping.display()))?;
    let document = MappingDocument::parse(&raw).context("parse mapping document")?;

    let table = load_table(&request.input)
        .with_context(|| format!("load input {}", request.input.display()))?;
    info!(rows = table.height(), cols = table.width(), "input loaded");

    let options = PipelineOptions {
        current_date: request
            .current_date
            .unwrap_or_else(|| Utc::now().date_naive()),
        policy: request.policy,
    };
    let output = run_pipeline(&table, &document, &options)?;

    let written = if request.dry_run {
        info!("dry run, skipping output");
        None
    } else {
        let mut writer_options = WriterOptions::default();
        if let Some(limit) = request.sheet_row_limit {
            writer_options.sheet_row_limit = limit;
        }
        Some(write_table(
            &output.table,
            &document,
            &request.output_dir,
            &writer_options,
        )?)
    };

    let output_path = match &written {
        Some(result) => result.path.clone(),
        None => request.output_dir.join(format!(
            "{}.{}",
            document.output_path,
            document.output_format.extension()
        )),
    };
    Ok(TransformOutcome {
        report: TransformReport {
            output_path,
            total_rows: output.total_rows,
            accepted_rows: output.accepted_rows,
            rejected_rows: output.rejected_rows,
            issues: output.issues,
        },
        written,
    })
}

/// Render the builtin function catalogue as a table.
pub fn functions_table() -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Function", "Arguments"]);
    apply_table_style(&mut table);
    for function in FunctionId::catalogue() {
        table.add_row(vec![function.display_name(), render_arity(function.arity())]);
    }
    table
}

fn render_arity((min, max): (usize, Option<usize>)) -> String {
    match max {
        Some(max) if max == min => min.to_string(),
        Some(max) => format!("{min}..{max}"),
        None => format!("{min}+"),
    }
}
