//! Typed cell values.
//!
//! Every cell in a [`crate::Table`] holds one [`Value`]. Coercion between
//! kinds is never implicit: callers that want a string form go through
//! [`Value::render`], and numeric access is explicit via [`Value::as_f64`].

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A single typed cell value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value")]
pub enum Value {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Date(NaiveDate),
    Array(Vec<Value>),
    Null,
}

impl Value {
    /// Short name of the value's kind, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Str(_) => "string",
            Self::Int(_) => "integer",
            Self::Float(_) => "float",
            Self::Bool(_) => "boolean",
            Self::Date(_) => "date",
            Self::Array(_) => "array",
            Self::Null => "null",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Canonical string form used by output writers and STRING functions.
    ///
    /// Null renders as the empty string; dates render as ISO 8601.
    pub fn render(&self) -> String {
        match self {
            Self::Str(s) => s.clone(),
            Self::Int(n) => n.to_string(),
            Self::Float(f) => f.to_string(),
            Self::Bool(b) => b.to_string(),
            Self::Date(d) => d.format("%Y-%m-%d").to_string(),
            Self::Array(items) => items
                .iter()
                .map(Self::render)
                .collect::<Vec<_>>()
                .join(","),
            Self::Null => String::new(),
        }
    }

    /// Numeric view for MATH functions. Strings never coerce to numbers.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(n) => Some(*n as f64),
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// True when the value renders as a number (used for positional
    /// alignment, not for arithmetic).
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Int(_) | Self::Float(_))
    }

    /// Convert to the plain JSON representation used by the JSON-lines
    /// writer: no type tags, null stays null.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Str(s) => serde_json::Value::String(s.clone()),
            Self::Int(n) => serde_json::Value::from(*n),
            Self::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Self::Bool(b) => serde_json::Value::Bool(*b),
            Self::Date(d) => serde_json::Value::String(d.format("%Y-%m-%d").to_string()),
            Self::Array(items) => {
                serde_json::Value::Array(items.iter().map(Self::to_json).collect())
            }
            Self::Null => serde_json::Value::Null,
        }
    }

    /// Build a value from a plain JSON scalar or array.
    ///
    /// Used for mapping `default` literals and the JSON-lines round trip.
    /// Dates come back as strings; the JSON form does not tag them.
    pub fn from_json(json: &serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(*b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Self::Int(i)
                } else {
                    Self::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_json::Value::String(s) => Self::Str(s.clone()),
            serde_json::Value::Array(items) => {
                Self::Array(items.iter().map(Self::from_json).collect())
            }
            serde_json::Value::Object(_) => Self::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_null_is_empty() {
        assert_eq!(Value::Null.render(), "");
    }

    #[test]
    fn render_date_is_iso() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(Value::Date(date).render(), "2024-03-09");
    }

    #[test]
    fn strings_do_not_coerce_to_numbers() {
        assert_eq!(Value::Str("42".into()).as_f64(), None);
        assert_eq!(Value::Int(42).as_f64(), Some(42.0));
    }

    #[test]
    fn json_round_trip_preserves_scalars() {
        for value in [
            Value::Str("abc".into()),
            Value::Int(-7),
            Value::Float(1.5),
            Value::Bool(true),
            Value::Null,
        ] {
            assert_eq!(Value::from_json(&value.to_json()), value);
        }
    }
}
