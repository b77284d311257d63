use thiserror::Error;

/// A malformed expression, reported at compile time.
///
/// Syntax errors are fatal: they abort the request before any row is
/// processed. The offset is a byte position into the original expression.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("syntax error at offset {offset} in `{expression}`: {message}")]
pub struct SyntaxError {
    pub expression: String,
    pub offset: usize,
    pub message: String,
}

impl SyntaxError {
    pub fn new(expression: impl Into<String>, offset: usize, message: impl Into<String>) -> Self {
        Self {
            expression: expression.into(),
            offset,
            message: message.into(),
        }
    }
}

/// A row/field-scoped evaluation failure.
///
/// Evaluation errors never abort the request; the affected row is recorded
/// and excluded from output while the pipeline continues.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    #[error("missing attribute '{0}'")]
    MissingAttribute(String),

    #[error("type mismatch in {context}: expected {expected}, found {found}")]
    TypeMismatch {
        context: String,
        expected: String,
        found: String,
    },

    #[error("division by zero")]
    DivisionByZero,

    #[error("array index {index} out of bounds for length {len}")]
    IndexError { index: i64, len: usize },

    #[error("cannot parse '{text}' as a date with pattern '{pattern}'")]
    DateParseError { text: String, pattern: String },
}

impl EvalError {
    pub fn type_mismatch(
        context: impl Into<String>,
        expected: impl Into<String>,
        found: impl Into<String>,
    ) -> Self {
        Self::TypeMismatch {
            context: context.into(),
            expected: expected.into(),
            found: found.into(),
        }
    }
}
