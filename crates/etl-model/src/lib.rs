//! Shared data model for the mapping-driven transformation engine.
//!
//! This crate defines the types that flow through the whole pipeline:
//!
//! - **value**: the typed [`Value`] union used for every cell
//! - **table**: ordered, named columns of values
//! - **mapping**: the user-supplied mapping document and its parser
//! - **processing**: request/response types for one transformation job

pub mod error;
pub mod mapping;
pub mod processing;
pub mod table;
pub mod value;

pub use error::MappingError;
pub use mapping::{FieldMapping, MappingDocument, OutputFormat, XmlConfig};
pub use processing::{RowIssue, TransformReport};
pub use table::{Column, Table};
pub use value::Value;
