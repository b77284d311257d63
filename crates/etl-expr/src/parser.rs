//! Recursive-descent parser for transform and validation expressions.
//!
//! Grammar, informally:
//!
//! ```text
//! transform   := ["trns:"] CATEGORY "[" NAME "(" args ")" "]"
//! validation  := expr
//! expr        := and_expr ("or" and_expr)*
//! and_expr    := not_expr ("and" not_expr)*
//! not_expr    := "not" not_expr | comparison
//! comparison  := additive [cmp_op additive] | cmp_op additive   (implicit subject)
//! additive    := term (("+"|"-") term)*
//! term        := unary (("*"|"/"|"%") unary)*
//! unary       := "-" unary | primary
//! primary     := literal | attr | CATEGORY "[" call "]" | "(" expr ")"
//! ```
//!
//! The implicit-subject comparison form (`>=0`) is only accepted when
//! compiling validation rules. The parser never evaluates anything; all
//! evaluation is deferred to [`crate::eval`].

use etl_model::Value;

use crate::ast::{BinaryOp, CompiledTransform, Expr, FilterSpec, FunctionId, UnaryOp};
use crate::error::SyntaxError;
use crate::lexer::{Token, TokenKind, tokenize};

/// Compile a transform expression string.
///
/// Returns either a value-producing tree or, for `FILTERS[...]`, the filter
/// directive consumed by the row-filter stage.
pub fn compile_transform(raw: &str) -> Result<CompiledTransform, SyntaxError> {
    let trimmed_start = raw.len() - raw.trim_start().len();
    let trimmed = raw.trim();

    // Optional `trns:` prefix, case-insensitive.
    let (body, base) = match trimmed.split_once(':') {
        Some((prefix, rest)) if prefix.trim().eq_ignore_ascii_case("trns") => {
            let body_start = trimmed.len() - rest.len();
            (rest, trimmed_start + body_start)
        }
        _ => (trimmed, trimmed_start),
    };

    let mut parser = Parser::new(raw, body, base, false)?;
    let compiled = parser.parse_transform()?;
    parser.expect_end()?;
    Ok(compiled)
}

/// Compile a validation rule: a boolean expression with an implicit subject.
pub fn compile_validation(raw: &str) -> Result<Expr, SyntaxError> {
    let mut parser = Parser::new(raw, raw, 0, true)?;
    let expr = parser.parse_expr()?;
    parser.expect_end()?;
    Ok(expr)
}

struct Parser<'a> {
    /// The original expression, used verbatim in error messages.
    text: &'a str,
    /// Offset of the tokenized slice within `text`.
    base: usize,
    tokens: Vec<Token>,
    pos: usize,
    allow_subject: bool,
}

impl<'a> Parser<'a> {
    fn new(
        text: &'a str,
        body: &str,
        base: usize,
        allow_subject: bool,
    ) -> Result<Self, SyntaxError> {
        let tokens = tokenize(body)
            .map_err(|e| SyntaxError::new(text, e.offset + base, e.message))?;
        Ok(Self {
            text,
            base,
            tokens,
            pos: 0,
            allow_subject,
        })
    }

    fn peek(&self) -> Option<&TokenKind> {
        self.tokens.get(self.pos).map(|t| &t.kind)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        match self.peek() {
            Some(TokenKind::Ident(name)) if name.eq_ignore_ascii_case(keyword) => {
                self.pos += 1;
                true
            }
            _ => false,
        }
    }

    fn offset(&self) -> usize {
        self.tokens
            .get(self.pos)
            .map_or(self.text.len(), |t| t.offset + self.base)
    }

    fn error(&self, message: impl Into<String>) -> SyntaxError {
        SyntaxError::new(self.text, self.offset(), message)
    }

    fn expect(&mut self, kind: &TokenKind, what: &str) -> Result<(), SyntaxError> {
        match self.peek() {
            Some(k) if k == kind => {
                self.pos += 1;
                Ok(())
            }
            Some(_) => Err(self.error(format!("expected {what}"))),
            None => Err(self.error(format!("expected {what}, found end of expression"))),
        }
    }

    fn expect_end(&self) -> Result<(), SyntaxError> {
        if self.pos == self.tokens.len() {
            Ok(())
        } else {
            Err(self.error("unexpected trailing input"))
        }
    }

    fn expect_ident(&mut self, what: &str) -> Result<(String, usize), SyntaxError> {
        let offset = self.offset();
        match self.advance() {
            Some(Token {
                kind: TokenKind::Ident(name),
                ..
            }) => Ok((name, offset)),
            _ => Err(SyntaxError::new(self.text, offset, format!("expected {what}"))),
        }
    }

    // ------------------------------------------------------------------
    // Transform form
    // ------------------------------------------------------------------

    fn parse_transform(&mut self) -> Result<CompiledTransform, SyntaxError> {
        let (category, category_offset) = self.expect_ident("a category name")?;
        self.expect(&TokenKind::LBracket, "'['")?;
        let (name, name_offset) = self.expect_ident("a function name")?;
        self.expect(&TokenKind::LParen, "'('")?;

        if category.eq_ignore_ascii_case("FILTERS") {
            let spec = self.parse_filter(&name, name_offset)?;
            self.expect(&TokenKind::RBracket, "']'")?;
            return Ok(CompiledTransform::Filter(spec));
        }

        if !FunctionId::category_exists(&category) {
            return Err(SyntaxError::new(
                self.text,
                category_offset,
                format!("unknown category '{category}'"),
            ));
        }
        let function = FunctionId::resolve(&category, &name).ok_or_else(|| {
            SyntaxError::new(
                self.text,
                name_offset,
                format!("unknown {} function '{name}'", category.to_ascii_uppercase()),
            )
        })?;

        let args = self.parse_args()?;
        self.check_arity(function, args.len(), name_offset)?;
        self.expect(&TokenKind::RBracket, "']'")?;
        Ok(CompiledTransform::Value(Expr::Call { function, args }))
    }

    fn parse_filter(&mut self, name: &str, offset: usize) -> Result<FilterSpec, SyntaxError> {
        match name.to_ascii_uppercase().as_str() {
            "INCLUDE_IF" | "EXCLUDE_IF" => {
                let predicate = self.parse_expr()?;
                self.expect(&TokenKind::RParen, "')'")?;
                if name.eq_ignore_ascii_case("INCLUDE_IF") {
                    Ok(FilterSpec::IncludeIf(predicate))
                } else {
                    Ok(FilterSpec::ExcludeIf(predicate))
                }
            }
            "LIMIT" | "OFFSET" => {
                let count_offset = self.offset();
                let count = match self.advance() {
                    Some(Token {
                        kind: TokenKind::Int(n),
                        ..
                    }) if n >= 0 => n as usize,
                    _ => {
                        return Err(SyntaxError::new(
                            self.text,
                            count_offset,
                            format!(
                                "{} requires a non-negative integer literal",
                                name.to_ascii_uppercase()
                            ),
                        ));
                    }
                };
                self.expect(&TokenKind::RParen, "')'")?;
                if name.eq_ignore_ascii_case("LIMIT") {
                    Ok(FilterSpec::Limit(count))
                } else {
                    Ok(FilterSpec::Offset(count))
                }
            }
            other => Err(SyntaxError::new(
                self.text,
                offset,
                format!("unknown FILTERS function '{other}'"),
            )),
        }
    }

    fn parse_args(&mut self) -> Result<Vec<Expr>, SyntaxError> {
        let mut args = Vec::new();
        if self.peek() == Some(&TokenKind::RParen) {
            self.pos += 1;
            return Ok(args);
        }
        loop {
            args.push(self.parse_expr()?);
            match self.peek() {
                Some(TokenKind::Comma) => {
                    self.pos += 1;
                }
                Some(TokenKind::RParen) => {
                    self.pos += 1;
                    break;
                }
                _ => return Err(self.error("expected ',' or ')'")),
            }
        }
        Ok(args)
    }

    fn check_arity(
        &self,
        function: FunctionId,
        count: usize,
        offset: usize,
    ) -> Result<(), SyntaxError> {
        let (min, max) = function.arity();
        let ok = count >= min && max.is_none_or(|m| count <= m);
        if ok {
            return Ok(());
        }
        let expected = match max {
            Some(m) if m == min => format!("{min}"),
            Some(m) => format!("{min} to {m}"),
            None => format!("at least {min}"),
        };
        Err(SyntaxError::new(
            self.text,
            offset,
            format!(
                "{} takes {expected} argument(s), found {count}",
                function.display_name()
            ),
        ))
    }

    // ------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------

    fn parse_expr(&mut self) -> Result<Expr, SyntaxError> {
        let mut left = self.parse_and()?;
        while self.eat_keyword("or") {
            let right = self.parse_and()?;
            left = Expr::Binary {
                op: BinaryOp::Or,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, SyntaxError> {
        let mut left = self.parse_not()?;
        while self.eat_keyword("and") {
            let right = self.parse_not()?;
            left = Expr::Binary {
                op: BinaryOp::And,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_not(&mut self) -> Result<Expr, SyntaxError> {
        if self.eat_keyword("not") {
            let operand = self.parse_not()?;
            return Ok(Expr::Unary {
                op: UnaryOp::Not,
                operand: Box::new(operand),
            });
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<Expr, SyntaxError> {
        // Leading comparison operator binds the implicit subject in
        // validation rules: `>=0` means `subject >= 0`.
        if let Some(op) = self.peek_cmp_op() {
            if !self.allow_subject {
                return Err(self.error(
                    "comparison without a left-hand side is only valid in validation rules",
                ));
            }
            self.pos += 1;
            let right = self.parse_additive()?;
            return Ok(Expr::Binary {
                op,
                left: Box::new(Expr::Subject),
                right: Box::new(right),
            });
        }

        let left = self.parse_additive()?;
        if let Some(op) = self.peek_cmp_op() {
            self.pos += 1;
            let right = self.parse_additive()?;
            return Ok(Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            });
        }
        Ok(left)
    }

    fn peek_cmp_op(&self) -> Option<BinaryOp> {
        match self.peek()? {
            TokenKind::EqEq => Some(BinaryOp::Eq),
            TokenKind::NotEq => Some(BinaryOp::Ne),
            TokenKind::Lt => Some(BinaryOp::Lt),
            TokenKind::Le => Some(BinaryOp::Le),
            TokenKind::Gt => Some(BinaryOp::Gt),
            TokenKind::Ge => Some(BinaryOp::Ge),
            _ => None,
        }
    }

    fn parse_additive(&mut self) -> Result<Expr, SyntaxError> {
        let mut left = self.parse_term()?;
        loop {
            let op = match self.peek() {
                Some(TokenKind::Plus) => BinaryOp::Add,
                Some(TokenKind::Minus) => BinaryOp::Sub,
                _ => break,
            };
            self.pos += 1;
            let right = self.parse_term()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_term(&mut self) -> Result<Expr, SyntaxError> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Some(TokenKind::Star) => BinaryOp::Mul,
                Some(TokenKind::Slash) => BinaryOp::Div,
                Some(TokenKind::Percent) => BinaryOp::Mod,
                _ => break,
            };
            self.pos += 1;
            let right = self.parse_unary()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, SyntaxError> {
        if self.peek() == Some(&TokenKind::Minus) {
            self.pos += 1;
            let operand = self.parse_unary()?;
            return Ok(Expr::Unary {
                op: UnaryOp::Neg,
                operand: Box::new(operand),
            });
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Expr, SyntaxError> {
        let offset = self.offset();
        match self.advance() {
            Some(Token {
                kind: TokenKind::Int(n),
                ..
            }) => Ok(Expr::Literal(Value::Int(n))),
            Some(Token {
                kind: TokenKind::Float(f),
                ..
            }) => Ok(Expr::Literal(Value::Float(f))),
            Some(Token {
                kind: TokenKind::Str(s),
                ..
            }) => Ok(Expr::Literal(Value::Str(s))),
            Some(Token {
                kind: TokenKind::LParen,
                ..
            }) => {
                let inner = self.parse_expr()?;
                self.expect(&TokenKind::RParen, "')'")?;
                Ok(inner)
            }
            Some(Token {
                kind: TokenKind::Ident(name),
                ..
            }) => self.parse_ident(&name, offset),
            Some(_) => Err(SyntaxError::new(self.text, offset, "expected a value")),
            None => Err(SyntaxError::new(
                self.text,
                offset,
                "expected a value, found end of expression",
            )),
        }
    }

    fn parse_ident(&mut self, name: &str, offset: usize) -> Result<Expr, SyntaxError> {
        if name.eq_ignore_ascii_case("true") {
            return Ok(Expr::Literal(Value::Bool(true)));
        }
        if name.eq_ignore_ascii_case("false") {
            return Ok(Expr::Literal(Value::Bool(false)));
        }
        if name.eq_ignore_ascii_case("null") {
            return Ok(Expr::Literal(Value::Null));
        }

        // attr('column') reference.
        if name.eq_ignore_ascii_case("attr") {
            self.expect(&TokenKind::LParen, "'(' after attr")?;
            let column_offset = self.offset();
            let column = match self.advance() {
                Some(Token {
                    kind: TokenKind::Str(s),
                    ..
                }) => s,
                _ => {
                    return Err(SyntaxError::new(
                        self.text,
                        column_offset,
                        "attr() takes a quoted column name",
                    ));
                }
            };
            self.expect(&TokenKind::RParen, "')'")?;
            return Ok(Expr::Attribute(column));
        }

        // Nested category call: CATEGORY[NAME(args)].
        if self.peek() == Some(&TokenKind::LBracket) {
            if name.eq_ignore_ascii_case("FILTERS") {
                return Err(SyntaxError::new(
                    self.text,
                    offset,
                    "FILTERS is not allowed in a value position",
                ));
            }
            self.pos += 1;
            let (fn_name, fn_offset) = self.expect_ident("a function name")?;
            let function = FunctionId::resolve(name, &fn_name).ok_or_else(|| {
                SyntaxError::new(
                    self.text,
                    fn_offset,
                    format!("unknown function '{fn_name}' in category '{name}'"),
                )
            })?;
            self.expect(&TokenKind::LParen, "'('")?;
            let args = self.parse_args()?;
            self.check_arity(function, args.len(), fn_offset)?;
            self.expect(&TokenKind::RBracket, "']'")?;
            return Ok(Expr::Call { function, args });
        }

        Err(SyntaxError::new(
            self.text,
            offset,
            format!("unknown identifier '{name}' (column references use attr('{name}'))"),
        ))
    }
}
