//! Validation-rule engine.
//!
//! A validation rule is a boolean expression evaluated with the transformed
//! value bound as the implicit subject: `>=0 and <=120` means
//! `subject >= 0 and subject <= 120`. Rules never abort the pipeline; a
//! failing or erroring rule marks the field invalid and the row outcome
//! aggregates every failing field.

use chrono::NaiveDate;
use etl_expr::{
    AttributeSource, EvaluationContext, Expr, SyntaxError, compile_validation, evaluate,
};
use etl_model::Value;

/// Result of checking one value against one rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Valid,
    Invalid(String),
}

impl Outcome {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }
}

/// A compiled validation rule, owned by its field mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationRule {
    raw: String,
    expr: Expr,
}

impl ValidationRule {
    /// Compile a raw rule string. Malformed rules are fatal and abort the
    /// request before any row is processed.
    pub fn compile(raw: &str) -> Result<Self, SyntaxError> {
        let expr = compile_validation(raw)?;
        Ok(Self {
            raw: raw.to_string(),
            expr,
        })
    }

    /// The rule as written in the mapping document.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Check a transformed value. Rules may also reference other attributes
    /// of the same row via `attr(...)`.
    pub fn check(
        &self,
        subject: &Value,
        attributes: &dyn AttributeSource,
        current_date: NaiveDate,
    ) -> Outcome {
        let ctx = EvaluationContext::new(attributes, current_date).with_subject(subject);
        match evaluate(&self.expr, &ctx) {
            Ok(Value::Bool(true)) => Outcome::Valid,
            Ok(Value::Bool(false)) => Outcome::Invalid(format!(
                "value {} failed rule `{}`",
                render_subject(subject),
                self.raw
            )),
            Ok(other) => Outcome::Invalid(format!(
                "rule `{}` produced {}, expected boolean",
                self.raw,
                other.kind()
            )),
            Err(error) => Outcome::Invalid(format!("rule `{}` failed: {error}", self.raw)),
        }
    }
}

fn render_subject(value: &Value) -> String {
    match value {
        Value::Str(s) => format!("'{s}'"),
        Value::Null => "null".to_string(),
        other => other.render(),
    }
}

/// One failing field within a row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldFailure {
    pub field: String,
    pub reason: String,
}

/// Aggregated validation outcome for one row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowOutcome {
    Accepted,
    Rejected(Vec<FieldFailure>),
}

impl RowOutcome {
    /// Fold per-field failures into a row outcome.
    pub fn from_failures(failures: Vec<FieldFailure>) -> Self {
        if failures.is_empty() {
            Self::Accepted
        } else {
            Self::Rejected(failures)
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted)
    }
}

/// What to do with a row whose validation failed.
///
/// The source material is ambiguous on this point, so the policy is
/// configurable instead of hard-coded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ValidationPolicy {
    /// Drop the row from the output and report it (default).
    #[default]
    RejectRow,
    /// Keep the row in the output but still report the failure.
    FlagAndKeep,
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
    }

    fn empty() -> BTreeMap<String, Value> {
        BTreeMap::new()
    }

    #[test]
    fn range_rule_bounds() {
        let rule = ValidationRule::compile(">=0 and <=120").unwrap();
        let attrs = empty();
        let expected = [
            (Value::Int(-1), false),
            (Value::Int(0), true),
            (Value::Int(120), true),
            (Value::Int(121), false),
        ];
        for (value, valid) in expected {
            assert_eq!(
                rule.check(&value, &attrs, today()).is_valid(),
                valid,
                "value {value:?}"
            );
        }
    }

    #[test]
    fn eval_error_inside_rule_is_invalid_not_fatal() {
        let rule = ValidationRule::compile("attr('other') > 0").unwrap();
        let attrs = empty();
        let outcome = rule.check(&Value::Int(1), &attrs, today());
        let Outcome::Invalid(reason) = outcome else {
            panic!("expected invalid");
        };
        assert!(reason.contains("missing attribute"));
    }

    #[test]
    fn null_subject_fails_numeric_rule() {
        let rule = ValidationRule::compile(">=0").unwrap();
        let attrs = empty();
        assert!(!rule.check(&Value::Null, &attrs, today()).is_valid());
    }

    #[test]
    fn string_equality_rule() {
        let rule = ValidationRule::compile("== 'ACTIVE' or == 'PENDING'").unwrap();
        let attrs = empty();
        assert!(rule.check(&Value::Str("ACTIVE".into()), &attrs, today()).is_valid());
        assert!(!rule.check(&Value::Str("CLOSED".into()), &attrs, today()).is_valid());
    }

    #[test]
    fn row_outcome_aggregates_failures() {
        let outcome = RowOutcome::from_failures(vec![FieldFailure {
            field: "age".to_string(),
            reason: "out of range".to_string(),
        }]);
        assert!(!outcome.is_accepted());
        assert!(RowOutcome::from_failures(Vec::new()).is_accepted());
    }
}
