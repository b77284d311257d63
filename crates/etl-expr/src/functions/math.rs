//! MATH category builtins.
//!
//! Arguments must already be numeric; strings never parse as numbers here,
//! malformed input surfaces as a TypeMismatch on the row.

use etl_model::Value;

use crate::ast::{BinaryOp, MathFn};
use crate::error::EvalError;
use crate::eval::{arithmetic, numeric};

const MAX_ROUND_PRECISION: i64 = 15;

pub(crate) fn call(function: MathFn, args: &[Value]) -> Result<Value, EvalError> {
    match function {
        MathFn::Add => arithmetic(BinaryOp::Add, &args[0], &args[1]),
        MathFn::Sub => arithmetic(BinaryOp::Sub, &args[0], &args[1]),
        MathFn::Mul => arithmetic(BinaryOp::Mul, &args[0], &args[1]),
        MathFn::Div => arithmetic(BinaryOp::Div, &args[0], &args[1]),
        MathFn::Mod => arithmetic(BinaryOp::Mod, &args[0], &args[1]),
        MathFn::Round => {
            let value = numeric(&args[0], "ROUND value")?;
            // f64 carries ~15 significant decimal digits; a larger precision
            // would overflow the scale factor and round to NaN.
            let precision = match &args[1] {
                Value::Int(n) if (0..=MAX_ROUND_PRECISION).contains(n) => *n as i32,
                Value::Int(n) => {
                    return Err(EvalError::type_mismatch(
                        "ROUND precision",
                        "integer between 0 and 15",
                        n.to_string(),
                    ));
                }
                other => {
                    return Err(EvalError::type_mismatch(
                        "ROUND precision",
                        "integer between 0 and 15",
                        other.kind(),
                    ));
                }
            };
            let factor = 10f64.powi(precision);
            Ok(Value::Float((value * factor).round() / factor))
        }
        MathFn::Abs => match &args[0] {
            // i64::MIN has no integral absolute value; promote to float.
            Value::Int(n) => Ok(n
                .checked_abs()
                .map_or(Value::Float((*n as f64).abs()), Value::Int)),
            Value::Float(f) => Ok(Value::Float(f.abs())),
            other => Err(EvalError::type_mismatch("ABS", "number", other.kind())),
        },
    }
}
