//! Tree-walking evaluator.
//!
//! Evaluation is pure: the context is a read-only view over one row's
//! attributes plus a per-request current date, and no node is ever mutated.
//! All failures are row/field-scoped [`EvalError`]s; the pipeline records
//! them and moves on.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use etl_model::Value;

use crate::ast::{BinaryOp, Expr, FunctionId, LogicalFn, UnaryOp};
use crate::error::EvalError;
use crate::functions;

/// Read-only attribute lookup for one row.
pub trait AttributeSource {
    fn attribute(&self, name: &str) -> Option<&Value>;
}

impl AttributeSource for BTreeMap<String, Value> {
    fn attribute(&self, name: &str) -> Option<&Value> {
        self.get(name)
    }
}

impl AttributeSource for HashMap<String, Value> {
    fn attribute(&self, name: &str) -> Option<&Value> {
        self.get(name)
    }
}

/// Evaluation context: one row's attributes plus the request clock.
///
/// The current date is set once per request so `DATE[CURRENT_DATE()]` is
/// deterministic across every row of a run.
pub struct EvaluationContext<'a> {
    attributes: &'a dyn AttributeSource,
    current_date: NaiveDate,
    subject: Option<&'a Value>,
}

impl<'a> EvaluationContext<'a> {
    pub fn new(attributes: &'a dyn AttributeSource, current_date: NaiveDate) -> Self {
        Self {
            attributes,
            current_date,
            subject: None,
        }
    }

    /// Bind the implicit subject for validation-rule evaluation.
    pub fn with_subject(mut self, subject: &'a Value) -> Self {
        self.subject = Some(subject);
        self
    }

    pub fn current_date(&self) -> NaiveDate {
        self.current_date
    }
}

/// Evaluate an expression against one row.
pub fn evaluate(expr: &Expr, ctx: &EvaluationContext<'_>) -> Result<Value, EvalError> {
    match expr {
        Expr::Literal(value) => Ok(value.clone()),
        Expr::Attribute(name) => ctx
            .attributes
            .attribute(name)
            .cloned()
            .ok_or_else(|| EvalError::MissingAttribute(name.clone())),
        Expr::Subject => ctx
            .subject
            .cloned()
            .ok_or_else(|| EvalError::MissingAttribute("<subject>".to_string())),
        Expr::Call { function, args } => match function {
            // LOGICAL stays here: IF/AND/OR must not evaluate untaken
            // branches, so argument evaluation cannot be eager.
            FunctionId::Logical(f) => evaluate_logical(*f, args, ctx),
            _ => {
                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    values.push(evaluate(arg, ctx)?);
                }
                functions::call(*function, &values, ctx.current_date)
            }
        },
        Expr::Binary { op, left, right } => evaluate_binary(*op, left, right, ctx),
        Expr::Unary { op, operand } => {
            let value = evaluate(operand, ctx)?;
            match op {
                UnaryOp::Not => match value {
                    Value::Bool(b) => Ok(Value::Bool(!b)),
                    other => Err(EvalError::type_mismatch("not", "boolean", other.kind())),
                },
                UnaryOp::Neg => match value {
                    // i64::MIN cannot be negated in place; promote to float.
                    Value::Int(n) => Ok(n
                        .checked_neg()
                        .map_or(Value::Float(-(n as f64)), Value::Int)),
                    Value::Float(f) => Ok(Value::Float(-f)),
                    other => Err(EvalError::type_mismatch("negation", "number", other.kind())),
                },
            }
        }
    }
}

fn evaluate_logical(
    function: LogicalFn,
    args: &[Expr],
    ctx: &EvaluationContext<'_>,
) -> Result<Value, EvalError> {
    match function {
        LogicalFn::If => {
            let cond = expect_bool(evaluate(&args[0], ctx)?, "IF condition")?;
            if cond {
                evaluate(&args[1], ctx)
            } else {
                evaluate(&args[2], ctx)
            }
        }
        LogicalFn::And => {
            for arg in args {
                if !expect_bool(evaluate(arg, ctx)?, "AND operand")? {
                    return Ok(Value::Bool(false));
                }
            }
            Ok(Value::Bool(true))
        }
        LogicalFn::Or => {
            for arg in args {
                if expect_bool(evaluate(arg, ctx)?, "OR operand")? {
                    return Ok(Value::Bool(true));
                }
            }
            Ok(Value::Bool(false))
        }
        LogicalFn::Not => {
            let value = expect_bool(evaluate(&args[0], ctx)?, "NOT operand")?;
            Ok(Value::Bool(!value))
        }
    }
}

fn evaluate_binary(
    op: BinaryOp,
    left: &Expr,
    right: &Expr,
    ctx: &EvaluationContext<'_>,
) -> Result<Value, EvalError> {
    // `and`/`or` short-circuit: the right operand is untouched once the
    // result is determined.
    match op {
        BinaryOp::And => {
            if !expect_bool(evaluate(left, ctx)?, "and")? {
                return Ok(Value::Bool(false));
            }
            return Ok(Value::Bool(expect_bool(evaluate(right, ctx)?, "and")?));
        }
        BinaryOp::Or => {
            if expect_bool(evaluate(left, ctx)?, "or")? {
                return Ok(Value::Bool(true));
            }
            return Ok(Value::Bool(expect_bool(evaluate(right, ctx)?, "or")?));
        }
        _ => {}
    }

    let lhs = evaluate(left, ctx)?;
    let rhs = evaluate(right, ctx)?;

    match op {
        BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => {
            arithmetic(op, &lhs, &rhs)
        }
        BinaryOp::Eq => Ok(Value::Bool(values_equal(&lhs, &rhs)?)),
        BinaryOp::Ne => Ok(Value::Bool(!values_equal(&lhs, &rhs)?)),
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
            let ordering = compare_values(op, &lhs, &rhs)?;
            Ok(Value::Bool(match op {
                BinaryOp::Lt => ordering.is_lt(),
                BinaryOp::Le => ordering.is_le(),
                BinaryOp::Gt => ordering.is_gt(),
                BinaryOp::Ge => ordering.is_ge(),
                _ => unreachable!(),
            }))
        }
        BinaryOp::And | BinaryOp::Or => unreachable!("handled above"),
    }
}

/// Arithmetic over numbers. Integer pairs stay integral except for
/// division, which always produces a float; overflow promotes to float.
pub(crate) fn arithmetic(op: BinaryOp, lhs: &Value, rhs: &Value) -> Result<Value, EvalError> {
    let context = op.symbol();
    if let (Value::Int(a), Value::Int(b)) = (lhs, rhs) {
        match op {
            BinaryOp::Add => {
                return Ok(a
                    .checked_add(*b)
                    .map_or(Value::Float(*a as f64 + *b as f64), Value::Int));
            }
            BinaryOp::Sub => {
                return Ok(a
                    .checked_sub(*b)
                    .map_or(Value::Float(*a as f64 - *b as f64), Value::Int));
            }
            BinaryOp::Mul => {
                return Ok(a
                    .checked_mul(*b)
                    .map_or(Value::Float(*a as f64 * *b as f64), Value::Int));
            }
            BinaryOp::Mod => {
                if *b == 0 {
                    return Err(EvalError::DivisionByZero);
                }
                return Ok(Value::Int(a.rem_euclid(*b)));
            }
            BinaryOp::Div => {}
            _ => unreachable!(),
        }
    }

    let a = numeric(lhs, context)?;
    let b = numeric(rhs, context)?;
    match op {
        BinaryOp::Add => Ok(Value::Float(a + b)),
        BinaryOp::Sub => Ok(Value::Float(a - b)),
        BinaryOp::Mul => Ok(Value::Float(a * b)),
        BinaryOp::Div => {
            if b == 0.0 {
                Err(EvalError::DivisionByZero)
            } else {
                Ok(Value::Float(a / b))
            }
        }
        BinaryOp::Mod => {
            if b == 0.0 {
                Err(EvalError::DivisionByZero)
            } else {
                Ok(Value::Float(a.rem_euclid(b)))
            }
        }
        _ => unreachable!(),
    }
}

fn values_equal(lhs: &Value, rhs: &Value) -> Result<bool, EvalError> {
    match (lhs, rhs) {
        // Mixed int/float pairs compare numerically.
        (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
            let a = lhs.as_f64().unwrap_or(f64::NAN);
            let b = rhs.as_f64().unwrap_or(f64::NAN);
            Ok(a == b)
        }
        (Value::Str(a), Value::Str(b)) => Ok(a == b),
        (Value::Bool(a), Value::Bool(b)) => Ok(a == b),
        (Value::Date(a), Value::Date(b)) => Ok(a == b),
        (Value::Null, Value::Null) => Ok(true),
        (Value::Null, _) | (_, Value::Null) => Ok(false),
        _ => Err(EvalError::type_mismatch(
            "equality",
            lhs.kind(),
            rhs.kind(),
        )),
    }
}

fn compare_values(
    op: BinaryOp,
    lhs: &Value,
    rhs: &Value,
) -> Result<std::cmp::Ordering, EvalError> {
    match (lhs, rhs) {
        (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
            let a = lhs.as_f64().unwrap_or(f64::NAN);
            let b = rhs.as_f64().unwrap_or(f64::NAN);
            a.partial_cmp(&b)
                .ok_or_else(|| EvalError::type_mismatch(op.symbol(), "number", "NaN"))
        }
        (Value::Str(a), Value::Str(b)) => Ok(a.cmp(b)),
        (Value::Date(a), Value::Date(b)) => Ok(a.cmp(b)),
        _ => Err(EvalError::type_mismatch(
            op.symbol(),
            lhs.kind(),
            rhs.kind(),
        )),
    }
}

pub(crate) fn numeric(value: &Value, context: &str) -> Result<f64, EvalError> {
    value
        .as_f64()
        .ok_or_else(|| EvalError::type_mismatch(context, "number", value.kind()))
}

fn expect_bool(value: Value, context: &str) -> Result<bool, EvalError> {
    value
        .as_bool()
        .ok_or_else(|| EvalError::type_mismatch(context, "boolean", value.kind()))
}
