//! Per-request transformation pipeline.
//!
//! One synchronous pass per request: compile the mapping document's
//! expressions, evaluate every target column, apply validation rules,
//! run the row-filter stage, and hand the result to the output writer.
//! The pipeline owns all of its data for the request's duration; nothing
//! is shared or cached across requests.

pub mod filters;
pub mod pipeline;

pub use filters::FilterPlan;
pub use pipeline::{PipelineOptions, PipelineOutput, evaluate_column, run_pipeline};
