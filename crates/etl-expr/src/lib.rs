//! Expression DSL for the transformation engine.
//!
//! Transform expressions take the form `trns: CATEGORY[NAME(args...)]`,
//! validation rules are boolean expressions with an implicit subject
//! (`>=0 and <=120`). Both compile once per request into an immutable
//! [`ast::Expr`] tree and evaluate as a pure tree walk against one row at
//! a time.
//!
//! - **lexer** / **parser**: recursive-descent compilation, unknown
//!   categories, functions, and arities are rejected up front
//! - **ast**: the expression tree with a closed function catalogue
//! - **eval**: the tree-walking evaluator and its [`eval::EvaluationContext`]
//! - **functions**: pure per-category builtin implementations

pub mod ast;
pub mod error;
pub mod eval;
pub mod functions;
mod lexer;
pub mod parser;

pub use ast::{
    ArrayFn, BinaryOp, CompiledTransform, DateFn, Expr, FilterSpec, FunctionId, LogicalFn, MathFn,
    StringFn, UnaryOp,
};
pub use error::{EvalError, SyntaxError};
pub use eval::{AttributeSource, EvaluationContext, evaluate};
pub use parser::{compile_transform, compile_validation};
