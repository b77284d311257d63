//! Expression tree and the closed builtin catalogue.
//!
//! Function identifiers are resolved at parse time to these enums; an
//! unknown category or name never survives past compilation.

use etl_model::Value;

/// An immutable expression tree node.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A literal value (quoted string, number, boolean).
    Literal(Value),
    /// `attr('column')` reference, resolved through the evaluation context.
    Attribute(String),
    /// The implicit subject of a validation rule (`>=0` means `subject >= 0`).
    Subject,
    /// A builtin function call; arity is checked at parse time.
    Call { function: FunctionId, args: Vec<Expr> },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Unary { op: UnaryOp, operand: Box<Expr> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Mod => "%",
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::And => "and",
            Self::Or => "or",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Neg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringFn {
    Concat,
    Substr,
    Replace,
    Upper,
    Lower,
    Trim,
    Length,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MathFn {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Round,
    Abs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalFn {
    If,
    And,
    Or,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateFn {
    Format,
    Parse,
    AddDays,
    SubDays,
    DiffDays,
    CurrentDate,
    Extract,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrayFn {
    Join,
    Split,
    Length,
    Get,
}

/// A fully resolved builtin function identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionId {
    String(StringFn),
    Math(MathFn),
    Logical(LogicalFn),
    Date(DateFn),
    Array(ArrayFn),
}

impl FunctionId {
    /// True when `category` names one of the value-producing categories.
    pub fn category_exists(category: &str) -> bool {
        matches!(
            category.to_ascii_uppercase().as_str(),
            "STRING" | "MATH" | "LOGICAL" | "DATE" | "ARRAY"
        )
    }

    /// Resolve a `(category, name)` pair. FILTERS functions are resolved
    /// separately because they are markers, not value-producing calls.
    pub fn resolve(category: &str, name: &str) -> Option<Self> {
        let name = name.to_ascii_uppercase();
        match category.to_ascii_uppercase().as_str() {
            "STRING" => Some(Self::String(match name.as_str() {
                "CONCAT" => StringFn::Concat,
                "SUBSTR" => StringFn::Substr,
                "REPLACE" => StringFn::Replace,
                "UPPER" => StringFn::Upper,
                "LOWER" => StringFn::Lower,
                "TRIM" => StringFn::Trim,
                "LENGTH" => StringFn::Length,
                _ => return None,
            })),
            "MATH" => Some(Self::Math(match name.as_str() {
                "ADD" => MathFn::Add,
                "SUB" => MathFn::Sub,
                "MUL" => MathFn::Mul,
                "DIV" => MathFn::Div,
                "MOD" => MathFn::Mod,
                "ROUND" => MathFn::Round,
                "ABS" => MathFn::Abs,
                _ => return None,
            })),
            "LOGICAL" => Some(Self::Logical(match name.as_str() {
                "IF" => LogicalFn::If,
                "AND" => LogicalFn::And,
                "OR" => LogicalFn::Or,
                "NOT" => LogicalFn::Not,
                _ => return None,
            })),
            "DATE" => Some(Self::Date(match name.as_str() {
                "FORMAT" => DateFn::Format,
                "PARSE" => DateFn::Parse,
                "ADD_DAYS" => DateFn::AddDays,
                "SUB_DAYS" => DateFn::SubDays,
                "DIFF_DAYS" => DateFn::DiffDays,
                "CURRENT_DATE" => DateFn::CurrentDate,
                "EXTRACT" => DateFn::Extract,
                _ => return None,
            })),
            "ARRAY" => Some(Self::Array(match name.as_str() {
                "JOIN" => ArrayFn::Join,
                "SPLIT" => ArrayFn::Split,
                "LENGTH" => ArrayFn::Length,
                "GET" => ArrayFn::Get,
                _ => return None,
            })),
            _ => None,
        }
    }

    /// Permitted argument count as `(min, max)`; `None` means unbounded.
    pub fn arity(self) -> (usize, Option<usize>) {
        match self {
            Self::String(f) => match f {
                StringFn::Concat => (1, None),
                StringFn::Substr => (3, Some(3)),
                StringFn::Replace => (3, Some(3)),
                StringFn::Upper | StringFn::Lower | StringFn::Trim | StringFn::Length => {
                    (1, Some(1))
                }
            },
            Self::Math(f) => match f {
                MathFn::Abs => (1, Some(1)),
                _ => (2, Some(2)),
            },
            Self::Logical(f) => match f {
                LogicalFn::If => (3, Some(3)),
                LogicalFn::And | LogicalFn::Or => (2, None),
                LogicalFn::Not => (1, Some(1)),
            },
            Self::Date(f) => match f {
                DateFn::CurrentDate => (0, Some(0)),
                DateFn::Format
                | DateFn::Parse
                | DateFn::AddDays
                | DateFn::SubDays
                | DateFn::DiffDays
                | DateFn::Extract => (2, Some(2)),
            },
            Self::Array(f) => match f {
                ArrayFn::Length => (1, Some(1)),
                ArrayFn::Join | ArrayFn::Split | ArrayFn::Get => (2, Some(2)),
            },
        }
    }

    /// Display name as written in the DSL, e.g. `STRING[CONCAT]`.
    pub fn display_name(self) -> String {
        let (category, name) = match self {
            Self::String(f) => (
                "STRING",
                match f {
                    StringFn::Concat => "CONCAT",
                    StringFn::Substr => "SUBSTR",
                    StringFn::Replace => "REPLACE",
                    StringFn::Upper => "UPPER",
                    StringFn::Lower => "LOWER",
                    StringFn::Trim => "TRIM",
                    StringFn::Length => "LENGTH",
                },
            ),
            Self::Math(f) => (
                "MATH",
                match f {
                    MathFn::Add => "ADD",
                    MathFn::Sub => "SUB",
                    MathFn::Mul => "MUL",
                    MathFn::Div => "DIV",
                    MathFn::Mod => "MOD",
                    MathFn::Round => "ROUND",
                    MathFn::Abs => "ABS",
                },
            ),
            Self::Logical(f) => (
                "LOGICAL",
                match f {
                    LogicalFn::If => "IF",
                    LogicalFn::And => "AND",
                    LogicalFn::Or => "OR",
                    LogicalFn::Not => "NOT",
                },
            ),
            Self::Date(f) => (
                "DATE",
                match f {
                    DateFn::Format => "FORMAT",
                    DateFn::Parse => "PARSE",
                    DateFn::AddDays => "ADD_DAYS",
                    DateFn::SubDays => "SUB_DAYS",
                    DateFn::DiffDays => "DIFF_DAYS",
                    DateFn::CurrentDate => "CURRENT_DATE",
                    DateFn::Extract => "EXTRACT",
                },
            ),
            Self::Array(f) => (
                "ARRAY",
                match f {
                    ArrayFn::Join => "JOIN",
                    ArrayFn::Split => "SPLIT",
                    ArrayFn::Length => "LENGTH",
                    ArrayFn::Get => "GET",
                },
            ),
        };
        format!("{category}[{name}]")
    }

    /// The whole catalogue, for the CLI `functions` listing.
    pub fn catalogue() -> Vec<FunctionId> {
        use self::{ArrayFn as A, DateFn as D, LogicalFn as L, MathFn as M, StringFn as S};
        let mut all = Vec::new();
        for f in [
            S::Concat,
            S::Substr,
            S::Replace,
            S::Upper,
            S::Lower,
            S::Trim,
            S::Length,
        ] {
            all.push(Self::String(f));
        }
        for f in [M::Add, M::Sub, M::Mul, M::Div, M::Mod, M::Round, M::Abs] {
            all.push(Self::Math(f));
        }
        for f in [L::If, L::And, L::Or, L::Not] {
            all.push(Self::Logical(f));
        }
        for f in [
            D::Format,
            D::Parse,
            D::AddDays,
            D::SubDays,
            D::DiffDays,
            D::CurrentDate,
            D::Extract,
        ] {
            all.push(Self::Date(f));
        }
        for f in [A::Join, A::Split, A::Length, A::Get] {
            all.push(Self::Array(f));
        }
        all
    }
}

/// A row-filter directive extracted from a `FILTERS[...]` transform.
///
/// These are markers consumed by the row-filter stage; they never produce
/// a value.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterSpec {
    IncludeIf(Expr),
    ExcludeIf(Expr),
    Limit(usize),
    Offset(usize),
}

/// Result of compiling a transform expression: either a value-producing
/// tree or a filter directive.
#[derive(Debug, Clone, PartialEq)]
pub enum CompiledTransform {
    Value(Expr),
    Filter(FilterSpec),
}
