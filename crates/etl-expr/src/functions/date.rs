//! DATE category builtins.
//!
//! Patterns are chrono strftime patterns. `CURRENT_DATE()` reads the
//! per-request clock from the evaluation context, never the wall clock.

use chrono::{Datelike, Days, NaiveDate};
use etl_model::Value;

use crate::ast::DateFn;
use crate::error::EvalError;

pub(crate) fn call(
    function: DateFn,
    args: &[Value],
    current_date: NaiveDate,
) -> Result<Value, EvalError> {
    match function {
        DateFn::Format => {
            let pattern = pattern_arg(&args[1], "FORMAT pattern")?;
            let date = coerce_date(&args[0], &pattern)?;
            Ok(Value::Str(date.format(&pattern).to_string()))
        }
        DateFn::Parse => {
            let pattern = pattern_arg(&args[1], "PARSE pattern")?;
            match &args[0] {
                Value::Date(d) => Ok(Value::Date(*d)),
                Value::Str(text) => parse_date(text, &pattern).map(Value::Date),
                other => Err(EvalError::type_mismatch("PARSE", "string", other.kind())),
            }
        }
        DateFn::AddDays | DateFn::SubDays => {
            let date = date_arg(&args[0], "date")?;
            let days = integer_arg(&args[1], "day count")?;
            let shifted = shift_days(
                date,
                if function == DateFn::AddDays { days } else { -days },
            );
            Ok(Value::Date(shifted))
        }
        DateFn::DiffDays => {
            // Signed day count: first argument minus second.
            let end = date_arg(&args[0], "DIFF_DAYS end")?;
            let start = date_arg(&args[1], "DIFF_DAYS start")?;
            Ok(Value::Int((end - start).num_days()))
        }
        DateFn::CurrentDate => Ok(Value::Date(current_date)),
        DateFn::Extract => {
            let date = date_arg(&args[0], "EXTRACT date")?;
            let unit = match &args[1] {
                Value::Str(s) => s.to_ascii_lowercase(),
                other => {
                    return Err(EvalError::type_mismatch(
                        "EXTRACT unit",
                        "string",
                        other.kind(),
                    ));
                }
            };
            let out = match unit.as_str() {
                "year" => i64::from(date.year()),
                "month" => i64::from(date.month()),
                "day" => i64::from(date.day()),
                // ISO numbering: Monday = 1 .. Sunday = 7.
                "weekday" => i64::from(date.weekday().number_from_monday()),
                _ => {
                    return Err(EvalError::type_mismatch(
                        "EXTRACT unit",
                        "one of year, month, day, weekday",
                        unit,
                    ));
                }
            };
            Ok(Value::Int(out))
        }
    }
}

fn parse_date(text: &str, pattern: &str) -> Result<NaiveDate, EvalError> {
    NaiveDate::parse_from_str(text, pattern).map_err(|_| EvalError::DateParseError {
        text: text.to_string(),
        pattern: pattern.to_string(),
    })
}

/// A string argument to FORMAT is parsed with the same pattern first, so
/// date columns that arrive as text still format cleanly.
fn coerce_date(value: &Value, pattern: &str) -> Result<NaiveDate, EvalError> {
    match value {
        Value::Date(d) => Ok(*d),
        Value::Str(text) => parse_date(text, pattern),
        other => Err(EvalError::type_mismatch("FORMAT", "date", other.kind())),
    }
}

fn pattern_arg(value: &Value, context: &str) -> Result<String, EvalError> {
    match value {
        Value::Str(s) => Ok(s.clone()),
        other => Err(EvalError::type_mismatch(context, "string", other.kind())),
    }
}

fn date_arg(value: &Value, context: &str) -> Result<NaiveDate, EvalError> {
    match value {
        Value::Date(d) => Ok(*d),
        other => Err(EvalError::type_mismatch(context, "date", other.kind())),
    }
}

fn integer_arg(value: &Value, context: &str) -> Result<i64, EvalError> {
    match value {
        Value::Int(n) => Ok(*n),
        other => Err(EvalError::type_mismatch(context, "integer", other.kind())),
    }
}

fn shift_days(date: NaiveDate, days: i64) -> NaiveDate {
    if days >= 0 {
        date.checked_add_days(Days::new(days as u64)).unwrap_or(date)
    } else {
        date.checked_sub_days(Days::new(days.unsigned_abs()))
            .unwrap_or(date)
    }
}
