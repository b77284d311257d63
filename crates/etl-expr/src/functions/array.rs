//! ARRAY category builtins.

use etl_model::Value;

use crate::ast::ArrayFn;
use crate::error::EvalError;

pub(crate) fn call(function: ArrayFn, args: &[Value]) -> Result<Value, EvalError> {
    match function {
        ArrayFn::Join => {
            let items = array_arg(&args[0], "JOIN")?;
            let sep = args[1].render();
            let out = items
                .iter()
                .map(Value::render)
                .collect::<Vec<_>>()
                .join(&sep);
            Ok(Value::Str(out))
        }
        ArrayFn::Split => {
            let text = args[0].render();
            let sep = args[1].render();
            if sep.is_empty() {
                return Err(EvalError::type_mismatch(
                    "SPLIT separator",
                    "non-empty string",
                    "empty string",
                ));
            }
            let items = text
                .split(&sep)
                .map(|part| Value::Str(part.to_string()))
                .collect();
            Ok(Value::Array(items))
        }
        ArrayFn::Length => {
            let items = array_arg(&args[0], "LENGTH")?;
            Ok(Value::Int(items.len() as i64))
        }
        ArrayFn::Get => {
            let items = array_arg(&args[0], "GET")?;
            let index = match &args[1] {
                Value::Int(n) => *n,
                other => {
                    return Err(EvalError::type_mismatch(
                        "GET index",
                        "integer",
                        other.kind(),
                    ));
                }
            };
            if index < 0 || index as usize >= items.len() {
                return Err(EvalError::IndexError {
                    index,
                    len: items.len(),
                });
            }
            Ok(items[index as usize].clone())
        }
    }
}

fn array_arg<'a>(value: &'a Value, context: &str) -> Result<&'a [Value], EvalError> {
    match value {
        Value::Array(items) => Ok(items),
        other => Err(EvalError::type_mismatch(context, "array", other.kind())),
    }
}
