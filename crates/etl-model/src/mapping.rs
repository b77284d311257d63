//! Mapping document parsing and validation.
//!
//! The mapping document is the user-supplied JSON specification describing
//! how input columns become output columns, plus output format options.
//! Parsing fails fast with a [`MappingError`] naming the offending field
//! path; there is no partial recovery.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::{MappingError, Value};

/// Supported serialization formats for the output writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Csv,
    Xlsx,
    Json,
    Xml,
    Positional,
}

impl OutputFormat {
    /// File extension appended to the mapping's `output_path`.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Xlsx => "xlsx",
            Self::Json => "jsonl",
            Self::Xml => "xml",
            Self::Positional => "txt",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Some(Self::Csv),
            "xlsx" => Some(Self::Xlsx),
            "json" => Some(Self::Json),
            "xml" => Some(Self::Xml),
            "positional" => Some(Self::Positional),
            _ => None,
        }
    }
}

/// Tag names used when serializing to XML.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct XmlConfig {
    pub root_tag: String,
    pub row_tag: String,
}

/// One target column specification.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldMapping {
    /// Source column in the input table. Absent when the target is derived
    /// purely from literals or a transform.
    pub source: Option<String>,
    /// Output column name, unique across the document.
    pub target: String,
    /// Raw transform expression, compiled by the expression parser.
    pub transform: Option<String>,
    /// Raw validation rule, compiled by the expression parser.
    pub validation: Option<String>,
    /// Literal used when the source column is missing from the input.
    pub default: Option<Value>,
    /// Fixed character width for positional output.
    pub length: Option<usize>,
}

/// The parsed and validated mapping document.
#[derive(Debug, Clone, PartialEq)]
pub struct MappingDocument {
    pub output_path: String,
    pub output_format: OutputFormat,
    pub xml_config: Option<XmlConfig>,
    pub mappings: Vec<FieldMapping>,
}

#[derive(Deserialize)]
struct RawDocument {
    output_path: Option<String>,
    output_format: Option<String>,
    xml_config: Option<XmlConfig>,
    #[serde(default)]
    mappings: Vec<RawFieldMapping>,
}

#[derive(Deserialize)]
struct RawFieldMapping {
    source: Option<String>,
    target: Option<String>,
    transform: Option<String>,
    validation: Option<String>,
    default: Option<serde_json::Value>,
    length: Option<usize>,
}

impl MappingDocument {
    /// Parse and validate a raw JSON mapping document.
    pub fn parse(raw: &str) -> Result<Self, MappingError> {
        let raw_doc: RawDocument = serde_json::from_str(raw)?;

        let output_path = raw_doc
            .output_path
            .filter(|p| !p.trim().is_empty())
            .ok_or_else(|| {
                MappingError::invalid("output_path", "required and must be non-empty")
            })?;

        let format_str = raw_doc
            .output_format
            .ok_or_else(|| MappingError::invalid("output_format", "required"))?;
        let output_format = OutputFormat::parse(&format_str).ok_or_else(|| {
            MappingError::invalid(
                "output_format",
                format!(
                    "unsupported format '{format_str}', expected one of \
                     csv, xlsx, json, xml, positional"
                ),
            )
        })?;

        // xml_config is required iff the output format is xml.
        match (output_format, &raw_doc.xml_config) {
            (OutputFormat::Xml, None) => {
                return Err(MappingError::invalid(
                    "xml_config",
                    "required when output_format is xml",
                ));
            }
            (OutputFormat::Xml, Some(config)) => {
                if config.root_tag.trim().is_empty() {
                    return Err(MappingError::invalid("xml_config.root_tag", "must be non-empty"));
                }
                if config.row_tag.trim().is_empty() {
                    return Err(MappingError::invalid("xml_config.row_tag", "must be non-empty"));
                }
            }
            (_, Some(_)) => {
                return Err(MappingError::invalid(
                    "xml_config",
                    format!("only valid when output_format is xml, not {format_str}"),
                ));
            }
            (_, None) => {}
        }

        if raw_doc.mappings.is_empty() {
            return Err(MappingError::invalid("mappings", "must contain at least one entry"));
        }

        let mut seen_targets = BTreeSet::new();
        let mut mappings = Vec::with_capacity(raw_doc.mappings.len());
        for (index, raw_mapping) in raw_doc.mappings.into_iter().enumerate() {
            let path = |field: &str| format!("mappings[{index}].{field}");

            let target = raw_mapping
                .target
                .filter(|t| !t.trim().is_empty())
                .ok_or_else(|| {
                    MappingError::invalid(path("target"), "required and must be non-empty")
                })?;
            if !seen_targets.insert(target.clone()) {
                return Err(MappingError::invalid(
                    path("target"),
                    format!("duplicate target column '{target}'"),
                ));
            }

            if raw_mapping.source.is_none()
                && raw_mapping.transform.is_none()
                && raw_mapping.default.is_none()
            {
                return Err(MappingError::invalid(
                    format!("mappings[{index}]"),
                    "at least one of source, transform, or default is required",
                ));
            }

            mappings.push(FieldMapping {
                source: raw_mapping.source,
                target,
                transform: raw_mapping.transform,
                validation: raw_mapping.validation,
                default: raw_mapping.default.as_ref().map(Value::from_json),
                length: raw_mapping.length,
            });
        }

        Ok(Self {
            output_path,
            output_format,
            xml_config: raw_doc.xml_config,
            mappings,
        })
    }

    /// Ordered list of output column names.
    pub fn targets(&self) -> impl Iterator<Item = &str> {
        self.mappings.iter().map(|m| m.target.as_str())
    }
}
