//! Tokenizer for the expression DSL.
//!
//! Whitespace-insensitive; every token carries its byte offset so parse
//! errors can point back into the original expression.

use crate::error::SyntaxError;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TokenKind {
    /// Bare identifier: category names, function names, `attr`, `and`, ...
    Ident(String),
    /// Quoted string literal (single or double quotes).
    Str(String),
    Int(i64),
    Float(f64),
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    EqEq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Token {
    pub kind: TokenKind,
    pub offset: usize,
}

pub(crate) fn tokenize(input: &str) -> Result<Vec<Token>, SyntaxError> {
    let bytes = input.as_bytes();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        let start = pos;
        let ch = bytes[pos] as char;

        if ch.is_ascii_whitespace() {
            pos += 1;
            continue;
        }

        let kind = match ch {
            '(' => {
                pos += 1;
                TokenKind::LParen
            }
            ')' => {
                pos += 1;
                TokenKind::RParen
            }
            '[' => {
                pos += 1;
                TokenKind::LBracket
            }
            ']' => {
                pos += 1;
                TokenKind::RBracket
            }
            ',' => {
                pos += 1;
                TokenKind::Comma
            }
            '+' => {
                pos += 1;
                TokenKind::Plus
            }
            '-' => {
                pos += 1;
                TokenKind::Minus
            }
            '*' => {
                pos += 1;
                TokenKind::Star
            }
            '/' => {
                pos += 1;
                TokenKind::Slash
            }
            '%' => {
                pos += 1;
                TokenKind::Percent
            }
            '=' => {
                if bytes.get(pos + 1) == Some(&b'=') {
                    pos += 2;
                    TokenKind::EqEq
                } else {
                    return Err(SyntaxError::new(input, start, "expected '==', found '='"));
                }
            }
            '!' => {
                if bytes.get(pos + 1) == Some(&b'=') {
                    pos += 2;
                    TokenKind::NotEq
                } else {
                    return Err(SyntaxError::new(input, start, "expected '!=', found '!'"));
                }
            }
            '<' => {
                if bytes.get(pos + 1) == Some(&b'=') {
                    pos += 2;
                    TokenKind::Le
                } else {
                    pos += 1;
                    TokenKind::Lt
                }
            }
            '>' => {
                if bytes.get(pos + 1) == Some(&b'=') {
                    pos += 2;
                    TokenKind::Ge
                } else {
                    pos += 1;
                    TokenKind::Gt
                }
            }
            '\'' | '"' => {
                let quote = ch;
                let quote_byte = quote as u8;
                pos += 1;
                let mut raw: Vec<u8> = Vec::new();
                loop {
                    match bytes.get(pos) {
                        None => {
                            return Err(SyntaxError::new(
                                input,
                                start,
                                "unterminated string literal",
                            ));
                        }
                        Some(&b) if b == quote_byte => {
                            pos += 1;
                            break;
                        }
                        Some(&b'\\') if bytes.get(pos + 1) == Some(&quote_byte) => {
                            raw.push(quote_byte);
                            pos += 2;
                        }
                        Some(&b) => {
                            raw.push(b);
                            pos += 1;
                        }
                    }
                }
                // The bytes came from a &str, so this cannot fail unless an
                // escape split a multibyte sequence, which the grammar forbids.
                let text = String::from_utf8(raw)
                    .map_err(|_| SyntaxError::new(input, start, "invalid string literal"))?;
                TokenKind::Str(text)
            }
            c if c.is_ascii_digit() => {
                let mut end = pos;
                let mut is_float = false;
                while end < bytes.len() {
                    let b = bytes[end] as char;
                    if b.is_ascii_digit() {
                        end += 1;
                    } else if b == '.' && !is_float {
                        is_float = true;
                        end += 1;
                    } else {
                        break;
                    }
                }
                let text = &input[pos..end];
                pos = end;
                if is_float {
                    let value = text.parse::<f64>().map_err(|_| {
                        SyntaxError::new(input, start, format!("invalid number literal '{text}'"))
                    })?;
                    TokenKind::Float(value)
                } else {
                    let value = text.parse::<i64>().map_err(|_| {
                        SyntaxError::new(input, start, format!("invalid number literal '{text}'"))
                    })?;
                    TokenKind::Int(value)
                }
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let mut end = pos;
                while end < bytes.len() {
                    let b = bytes[end] as char;
                    if b.is_ascii_alphanumeric() || b == '_' {
                        end += 1;
                    } else {
                        break;
                    }
                }
                let text = input[pos..end].to_string();
                pos = end;
                TokenKind::Ident(text)
            }
            other => {
                return Err(SyntaxError::new(
                    input,
                    start,
                    format!("unexpected character '{other}'"),
                ));
            }
        };

        tokens.push(Token { kind, offset: start });
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenizes_call_with_args() {
        let tokens = tokenize("CONCAT(attr('a'), ' ', 12, 3.5)").unwrap();
        let kinds: Vec<_> = tokens.into_iter().map(|t| t.kind).collect();
        assert_eq!(kinds[0], TokenKind::Ident("CONCAT".to_string()));
        assert!(kinds.contains(&TokenKind::Str(" ".to_string())));
        assert!(kinds.contains(&TokenKind::Int(12)));
        assert!(kinds.contains(&TokenKind::Float(3.5)));
    }

    #[test]
    fn tokenizes_comparison_operators() {
        let tokens = tokenize(">=0 and <=120").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Ge);
        assert_eq!(tokens[2].kind, TokenKind::Ident("and".to_string()));
        assert_eq!(tokens[3].kind, TokenKind::Le);
    }

    #[test]
    fn unterminated_string_reports_offset() {
        let err = tokenize("CONCAT('abc").unwrap_err();
        assert_eq!(err.offset, 7);
        assert!(err.message.contains("unterminated"));
    }

    #[test]
    fn single_equals_is_rejected() {
        assert!(tokenize("a = b").is_err());
    }

    #[test]
    fn string_literals_keep_multibyte_text() {
        let tokens = tokenize("CONCAT('héllo', \"wörld\")").unwrap();
        let kinds: Vec<_> = tokens.into_iter().map(|t| t.kind).collect();
        assert!(kinds.contains(&TokenKind::Str("héllo".to_string())));
        assert!(kinds.contains(&TokenKind::Str("wörld".to_string())));
    }
}
