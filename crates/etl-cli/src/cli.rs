//! CLI argument definitions.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;
use etl_cli::commands::TransformRequest;
use etl_validate::ValidationPolicy;

#[derive(Parser)]
#[command(
    name = "etl",
    version,
    about = "Mapping-driven tabular data transformation",
    long_about = "Transform tabular data files according to a JSON mapping document.\n\n\
                  Reads CSV or Parquet input, applies per-column transform expressions,\n\
                  validation rules, and row filters, and writes csv, json-lines, xml,\n\
                  fixed-width, or spreadsheet output."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for debug, -vv for trace, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Transform an input file according to a mapping document.
    Transform(TransformArgs),

    /// List the builtin transform functions.
    Functions,
}

#[derive(Parser)]
pub struct TransformArgs {
    /// Input data file (.csv or .parquet).
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// JSON mapping document.
    #[arg(value_name = "MAPPING")]
    pub mapping: PathBuf,

    /// Root directory for output files.
    #[arg(
        long = "output-dir",
        value_name = "DIR",
        env = "ETL_OUTPUT_DIR",
        default_value = "output"
    )]
    pub output_dir: PathBuf,

    /// Date used by CURRENT_DATE() (default: today).
    #[arg(long = "current-date", value_name = "YYYY-MM-DD")]
    pub current_date: Option<NaiveDate>,

    /// Keep rows that fail validation in the output (failures are still
    /// reported).
    #[arg(long = "keep-invalid")]
    pub keep_invalid: bool,

    /// Maximum data rows per spreadsheet sheet.
    #[arg(long = "sheet-row-limit", value_name = "ROWS")]
    pub sheet_row_limit: Option<usize>,

    /// Run the pipeline and report without writing output files.
    #[arg(long = "dry-run")]
    pub dry_run: bool,
}

impl TransformArgs {
    pub fn to_request(&self) -> TransformRequest {
        TransformRequest {
            input: self.input.clone(),
            mapping: self.mapping.clone(),
            output_dir: self.output_dir.clone(),
            current_date: self.current_date,
            policy: if self.keep_invalid {
                ValidationPolicy::FlagAndKeep
            } else {
                ValidationPolicy::RejectRow
            },
            sheet_row_limit: self.sheet_row_limit,
            dry_run: self.dry_run,
        }
    }
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
