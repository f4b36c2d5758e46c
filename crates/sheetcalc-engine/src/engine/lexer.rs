//! Formula tokenizer.
//!
//! Turns formula text (without the leading `=`) into tokens carrying their
//! byte span, so callers can slice the original text back out.

use std::ops::Range;

use super::error::{EvalError, Result};

#[derive(Clone, Debug, PartialEq)]
pub enum TokenKind {
    Number(f64),
    /// String literal with quotes removed and `""` unescaped.
    Text(String),
    /// Function name, cell address, or `TRUE`/`FALSE`.
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    Amp,
    Comma,
    Colon,
    LParen,
    RParen,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Range<usize>,
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '$'
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '$' | '.')
}

pub fn tokenize(input: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some(&(start, ch)) = chars.peek() {
        if ch.is_whitespace() {
            chars.next();
            continue;
        }

        if ch == '"' {
            chars.next();
            let mut text = String::new();
            let mut closed = false;
            while let Some((i, c)) = chars.next() {
                if c == '"' {
                    // Doubled quote is an escaped quote.
                    if matches!(chars.peek(), Some(&(_, '"'))) {
                        chars.next();
                        text.push('"');
                        continue;
                    }
                    tokens.push(Token {
                        kind: TokenKind::Text(std::mem::take(&mut text)),
                        span: start..i + 1,
                    });
                    closed = true;
                    break;
                }
                text.push(c);
            }
            if !closed {
                return Err(EvalError::syntax("unterminated string literal"));
            }
            continue;
        }

        if ch.is_ascii_digit() || ch == '.' {
            let mut end = start;
            let mut seen_exp = false;
            let mut prev = ch;
            while let Some(&(i, c)) = chars.peek() {
                let exp_sign = seen_exp && matches!(c, '+' | '-') && matches!(prev, 'e' | 'E');
                if c.is_ascii_digit() || c == '.' || exp_sign {
                    // accepted
                } else if matches!(c, 'e' | 'E') && !seen_exp {
                    seen_exp = true;
                } else {
                    break;
                }
                prev = c;
                end = i + c.len_utf8();
                chars.next();
            }
            let literal = &input[start..end];
            let n = literal
                .parse::<f64>()
                .map_err(|_| EvalError::syntax(format!("invalid number {:?}", literal)))?;
            tokens.push(Token {
                kind: TokenKind::Number(n),
                span: start..end,
            });
            continue;
        }

        if is_ident_start(ch) {
            let mut end = start;
            while let Some(&(i, c)) = chars.peek() {
                if !is_ident_char(c) {
                    break;
                }
                end = i + c.len_utf8();
                chars.next();
            }
            tokens.push(Token {
                kind: TokenKind::Ident(input[start..end].to_string()),
                span: start..end,
            });
            continue;
        }

        chars.next();
        let (kind, len) = match ch {
            '+' => (TokenKind::Plus, 1),
            '-' => (TokenKind::Minus, 1),
            '*' => (TokenKind::Star, 1),
            '/' => (TokenKind::Slash, 1),
            '^' => (TokenKind::Caret, 1),
            '&' => (TokenKind::Amp, 1),
            ',' => (TokenKind::Comma, 1),
            ':' => (TokenKind::Colon, 1),
            '(' => (TokenKind::LParen, 1),
            ')' => (TokenKind::RParen, 1),
            '=' => (TokenKind::Eq, 1),
            '<' => match chars.peek() {
                Some(&(_, '=')) => {
                    chars.next();
                    (TokenKind::Le, 2)
                }
                Some(&(_, '>')) => {
                    chars.next();
                    (TokenKind::Ne, 2)
                }
                _ => (TokenKind::Lt, 1),
            },
            '>' => match chars.peek() {
                Some(&(_, '=')) => {
                    chars.next();
                    (TokenKind::Ge, 2)
                }
                _ => (TokenKind::Gt, 1),
            },
            other => {
                return Err(EvalError::syntax(format!(
                    "unexpected character {:?} at {}",
                    other, start
                )));
            }
        };
        tokens.push(Token {
            kind,
            span: start..start + len,
        });
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        tokenize(input).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_tokenize_arithmetic() {
        assert_eq!(
            kinds("(A1+2.5)*3"),
            vec![
                TokenKind::LParen,
                TokenKind::Ident("A1".into()),
                TokenKind::Plus,
                TokenKind::Number(2.5),
                TokenKind::RParen,
                TokenKind::Star,
                TokenKind::Number(3.0),
            ]
        );
    }

    #[test]
    fn test_tokenize_string_with_escaped_quote() {
        assert_eq!(kinds(r#""say ""hi"", ok""#), vec![TokenKind::Text(r#"say "hi", ok"#.into())]);
    }

    #[test]
    fn test_tokenize_comparisons() {
        assert_eq!(
            kinds("<> <= >= < > ="),
            vec![
                TokenKind::Ne,
                TokenKind::Le,
                TokenKind::Ge,
                TokenKind::Lt,
                TokenKind::Gt,
                TokenKind::Eq,
            ]
        );
    }

    #[test]
    fn test_tokenize_exponent_number() {
        assert_eq!(kinds("1e3-2"), vec![
            TokenKind::Number(1000.0),
            TokenKind::Minus,
            TokenKind::Number(2.0),
        ]);
        assert_eq!(kinds("1.5E-2"), vec![TokenKind::Number(0.015)]);
    }

    #[test]
    fn test_tokenize_spans_slice_original_text() {
        let input = "SUM(A1:B2, 3)";
        let tokens = tokenize(input).unwrap();
        assert_eq!(&input[tokens[0].span.clone()], "SUM");
        assert_eq!(&input[tokens[4].span.clone()], "B2");
    }

    #[test]
    fn test_tokenize_errors() {
        assert!(tokenize("\"open").is_err());
        assert!(tokenize("1 # 2").is_err());
        assert!(tokenize("1..2").is_err());
    }
}
