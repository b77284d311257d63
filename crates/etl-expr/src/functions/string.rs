//! STRING category builtins.
//!
//! Non-string arguments coerce through [`Value::render`]; null renders as
//! the empty string. The opposite direction never happens implicitly.

use etl_model::Value;

use crate::ast::StringFn;
use crate::error::EvalError;

pub(crate) fn call(function: StringFn, args: &[Value]) -> Result<Value, EvalError> {
    match function {
        StringFn::Concat => {
            let mut out = String::new();
            for arg in args {
                out.push_str(&arg.render());
            }
            Ok(Value::Str(out))
        }
        StringFn::Substr => {
            let text = args[0].render();
            let start = integer(&args[1], "SUBSTR start")?.max(0) as usize;
            let len = integer(&args[2], "SUBSTR length")?.max(0) as usize;
            // Out-of-range indices clip instead of erroring.
            let out: String = text.chars().skip(start).take(len).collect();
            Ok(Value::Str(out))
        }
        StringFn::Replace => {
            let text = args[0].render();
            let old = args[1].render();
            let new = args[2].render();
            if old.is_empty() {
                return Ok(Value::Str(text));
            }
            Ok(Value::Str(text.replace(&old, &new)))
        }
        StringFn::Upper => Ok(Value::Str(args[0].render().to_uppercase())),
        StringFn::Lower => Ok(Value::Str(args[0].render().to_lowercase())),
        StringFn::Trim => Ok(Value::Str(args[0].render().trim().to_string())),
        StringFn::Length => Ok(Value::Int(args[0].render().chars().count() as i64)),
    }
}

fn integer(value: &Value, context: &str) -> Result<i64, EvalError> {
    match value {
        Value::Int(n) => Ok(*n),
        other => Err(EvalError::type_mismatch(context, "integer", other.kind())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn concat_coerces_numbers() {
        let out = call(
            StringFn::Concat,
            &[Value::Str("id-".into()), Value::Int(42)],
        )
        .unwrap();
        assert_eq!(out, Value::Str("id-42".into()));
    }

    #[test]
    fn substr_clips_out_of_range() {
        let out = call(
            StringFn::Substr,
            &[Value::Str("abc".into()), Value::Int(1), Value::Int(10)],
        )
        .unwrap();
        assert_eq!(out, Value::Str("bc".into()));

        let out = call(
            StringFn::Substr,
            &[Value::Str("abc".into()), Value::Int(7), Value::Int(2)],
        )
        .unwrap();
        assert_eq!(out, Value::Str(String::new()));
    }

    #[test]
    fn length_counts_chars() {
        let out = call(StringFn::Length, &[Value::Str("héllo".into())]).unwrap();
        assert_eq!(out, Value::Int(5));
    }

    #[test]
    fn trim_strips_whitespace() {
        let out = call(StringFn::Trim, &[Value::Str("  x \t".into())]).unwrap();
        assert_eq!(out, Value::Str("x".into()));
    }
}
