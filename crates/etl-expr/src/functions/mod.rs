//! Builtin function implementations, one module per category.
//!
//! Every function is a pure mapping from already-evaluated argument values
//! to a result value or an [`EvalError`]. Arity is guaranteed by the parser,
//! so argument indexing here is safe.

pub mod array;
pub mod date;
pub mod math;
pub mod string;

use chrono::NaiveDate;
use etl_model::Value;

use crate::ast::FunctionId;
use crate::error::EvalError;

/// Dispatch an eagerly evaluated call. LOGICAL functions never reach this
/// point; the evaluator handles them to preserve short-circuiting.
pub(crate) fn call(
    function: FunctionId,
    args: &[Value],
    current_date: NaiveDate,
) -> Result<Value, EvalError> {
    match function {
        FunctionId::String(f) => string::call(f, args),
        FunctionId::Math(f) => math::call(f, args),
        FunctionId::Date(f) => date::call(f, args, current_date),
        FunctionId::Array(f) => array::call(f, args),
        FunctionId::Logical(_) => unreachable!("LOGICAL is evaluated lazily"),
    }
}
