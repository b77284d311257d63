//! Input table loading.
//!
//! The pipeline assumes column names and types are already known; this
//! crate is the boundary that makes that true, reading Parquet or CSV
//! through polars and materializing the typed in-memory table the
//! evaluator works on.

mod convert;
mod error;
mod loader;

pub use convert::dataframe_to_table;
pub use error::IngestError;
pub use loader::{InputFormat, load_table, read_csv_table, read_parquet_table};
