//! Recursive-descent parser producing the formula AST.
//!
//! Grammar, lowest precedence first:
//!
//! ```text
//! comparison := concat (("=" | "<>" | "<" | "<=" | ">" | ">=") concat)*
//! concat     := additive ("&" additive)*
//! additive   := term (("+" | "-") term)*
//! term       := power (("*" | "/") power)*
//! power      := unary ("^" power)?
//! unary      := ("-" | "+") unary | primary
//! primary    := NUMBER | STRING | TRUE | FALSE | REF | REF ":" REF
//!             | NAME "(" args ")" | "(" comparison ")"
//! ```
//!
//! Operator chains such as `A1+A2+A3` are parsed in a loop. Everything that
//! recurses (parentheses, calls, signs, exponents) counts toward
//! [`MAX_NESTING`], so hostile input fails with `DepthExceeded` instead of
//! exhausting the stack.

use super::args::split_top_level;
use super::cell_ref::CellRef;
use super::error::{EvalError, Result};
use super::lexer::{Token, TokenKind, tokenize};

/// Deepest nesting of parentheses, calls, signs and exponents in one formula.
pub const MAX_NESTING: usize = 64;

/// Longest formula text accepted, in characters.
pub const MAX_FORMULA_CHARS: usize = 8_192;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Plus,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
    Concat,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

/// A rectangular range as typed; corners may be in any order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RangeRef {
    pub start: CellRef,
    pub end: CellRef,
}

impl RangeRef {
    pub fn new(start: CellRef, end: CellRef) -> RangeRef {
        RangeRef { start, end }
    }

    /// Top-left and bottom-right corners.
    pub fn normalized(&self) -> (CellRef, CellRef) {
        (
            CellRef::new(self.start.col.min(self.end.col), self.start.row.min(self.end.row)),
            CellRef::new(self.start.col.max(self.end.col), self.start.row.max(self.end.row)),
        )
    }

    pub fn rows(&self) -> usize {
        self.start.row.abs_diff(self.end.row) + 1
    }

    pub fn cols(&self) -> usize {
        self.start.col.abs_diff(self.end.col) + 1
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Number(f64),
    Text(String),
    Bool(bool),
    /// An omitted argument, as in `F(1,,2)`.
    Missing,
    Cell(CellRef),
    Range(RangeRef),
    Unary {
        op: UnaryOp,
        expr: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    /// Function call; `name` is upper-cased.
    Call {
        name: String,
        args: Vec<Expr>,
    },
}

/// Parse formula text (without the leading `=`).
pub fn parse_formula(input: &str) -> Result<Expr> {
    let len = input.chars().count();
    if len > MAX_FORMULA_CHARS {
        return Err(EvalError::syntax(format!(
            "formula is {} characters, limit is {}",
            len, MAX_FORMULA_CHARS
        )));
    }
    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Err(EvalError::syntax("empty expression"));
    }
    parse_tokens(&tokens, 0)
}

fn parse_tokens(tokens: &[Token], depth: usize) -> Result<Expr> {
    let mut parser = Parser {
        tokens,
        pos: 0,
        depth,
    };
    let expr = parser.parse_comparison()?;
    if let Some(token) = parser.peek() {
        return Err(EvalError::syntax(format!(
            "unexpected {:?} at {}",
            token.kind, token.span.start
        )));
    }
    Ok(expr)
}

struct Parser<'t> {
    tokens: &'t [Token],
    pos: usize,
    depth: usize,
}

fn check_nesting(depth: usize) -> Result<()> {
    if depth > MAX_NESTING {
        return Err(EvalError::depth_exceeded(format!(
            "formula nested deeper than {} levels",
            MAX_NESTING
        )));
    }
    Ok(())
}

impl<'t> Parser<'t> {
    fn peek(&self) -> Option<&'t Token> {
        self.tokens.get(self.pos)
    }

    fn peek_kind(&self) -> Option<&'t TokenKind> {
        self.peek().map(|t| &t.kind)
    }

    fn next(&mut self) -> Option<&'t Token> {
        let token = self.tokens.get(self.pos);
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    /// Run `parse` one nesting level deeper.
    fn nested(&mut self, parse: fn(&mut Self) -> Result<Expr>) -> Result<Expr> {
        check_nesting(self.depth + 1)?;
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Expr {
        Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    fn parse_comparison(&mut self) -> Result<Expr> {
        let mut node = self.parse_concat()?;
        loop {
            let op = match self.peek_kind() {
                Some(TokenKind::Eq) => BinaryOp::Eq,
                Some(TokenKind::Ne) => BinaryOp::Ne,
                Some(TokenKind::Lt) => BinaryOp::Lt,
                Some(TokenKind::Le) => BinaryOp::Le,
                Some(TokenKind::Gt) => BinaryOp::Gt,
                Some(TokenKind::Ge) => BinaryOp::Ge,
                _ => break,
            };
            self.next();
            let rhs = self.parse_concat()?;
            node = Self::binary(op, node, rhs);
        }
        Ok(node)
    }

    fn parse_concat(&mut self) -> Result<Expr> {
        let mut node = self.parse_additive()?;
        while matches!(self.peek_kind(), Some(TokenKind::Amp)) {
            self.next();
            let rhs = self.parse_additive()?;
            node = Self::binary(BinaryOp::Concat, node, rhs);
        }
        Ok(node)
    }

    fn parse_additive(&mut self) -> Result<Expr> {
        let mut node = self.parse_term()?;
        loop {
            let op = match self.peek_kind() {
                Some(TokenKind::Plus) => BinaryOp::Add,
                Some(TokenKind::Minus) => BinaryOp::Sub,
                _ => break,
            };
            self.next();
            let rhs = self.parse_term()?;
            node = Self::binary(op, node, rhs);
        }
        Ok(node)
    }

    fn parse_term(&mut self) -> Result<Expr> {
        let mut node = self.parse_power()?;
        loop {
            let op = match self.peek_kind() {
                Some(TokenKind::Star) => BinaryOp::Mul,
                Some(TokenKind::Slash) => BinaryOp::Div,
                _ => break,
            };
            self.next();
            let rhs = self.parse_power()?;
            node = Self::binary(op, node, rhs);
        }
        Ok(node)
    }

    fn parse_power(&mut self) -> Result<Expr> {
        let base = self.parse_unary()?;
        if matches!(self.peek_kind(), Some(TokenKind::Caret)) {
            self.next();
            let exponent = self.nested(Self::parse_power)?;
            return Ok(Self::binary(BinaryOp::Pow, base, exponent));
        }
        Ok(base)
    }

    fn parse_unary(&mut self) -> Result<Expr> {
        let op = match self.peek_kind() {
            Some(TokenKind::Minus) => UnaryOp::Neg,
            Some(TokenKind::Plus) => UnaryOp::Plus,
            _ => return self.parse_primary(),
        };
        self.next();
        let expr = self.nested(Self::parse_unary)?;
        Ok(Expr::Unary {
            op,
            expr: Box::new(expr),
        })
    }

    fn parse_primary(&mut self) -> Result<Expr> {
        let token = self
            .next()
            .ok_or_else(|| EvalError::syntax("unexpected end of formula"))?;
        match &token.kind {
            TokenKind::Number(n) => Ok(Expr::Number(*n)),
            TokenKind::Text(s) => Ok(Expr::Text(s.clone())),
            TokenKind::LParen => {
                let expr = self.nested(Self::parse_comparison)?;
                match self.next() {
                    Some(Token {
                        kind: TokenKind::RParen,
                        ..
                    }) => Ok(expr),
                    _ => Err(EvalError::syntax("expected ')'")),
                }
            }
            TokenKind::Ident(name) => self.parse_ident(name),
            other => Err(EvalError::syntax(format!(
                "unexpected {:?} at {}",
                other, token.span.start
            ))),
        }
    }

    fn parse_ident(&mut self, name: &str) -> Result<Expr> {
        if matches!(self.peek_kind(), Some(TokenKind::LParen)) {
            return self.parse_call(name);
        }

        if let Some(start) = CellRef::from_str(name) {
            if matches!(self.peek_kind(), Some(TokenKind::Colon)) {
                self.next();
                let end = match self.next().map(|t| &t.kind) {
                    Some(TokenKind::Ident(end)) => CellRef::from_str(end),
                    _ => None,
                }
                .ok_or_else(|| EvalError::syntax(format!("incomplete range after {}:", name)))?;
                return Ok(Expr::Range(RangeRef::new(start, end)));
            }
            return Ok(Expr::Cell(start));
        }

        if name.eq_ignore_ascii_case("TRUE") {
            return Ok(Expr::Bool(true));
        }
        if name.eq_ignore_ascii_case("FALSE") {
            return Ok(Expr::Bool(false));
        }

        Err(EvalError::syntax(format!("unknown name {:?}", name)))
    }

    /// Parse `NAME(...)`; the current token is the opening parenthesis.
    fn parse_call(&mut self, name: &str) -> Result<Expr> {
        let open = self.pos;
        let mut depth = 0usize;
        let mut close = None;
        for (i, token) in self.tokens[open..].iter().enumerate() {
            match token.kind {
                TokenKind::LParen => depth += 1,
                TokenKind::RParen => {
                    depth -= 1;
                    if depth == 0 {
                        close = Some(open + i);
                        break;
                    }
                }
                _ => {}
            }
        }
        let close =
            close.ok_or_else(|| EvalError::syntax(format!("unclosed call to {}", name)))?;
        let depth = self.depth + 1;
        check_nesting(depth)?;

        let args = split_top_level(&self.tokens[open + 1..close])?
            .into_iter()
            .map(|slice| {
                if slice.is_empty() {
                    Ok(Expr::Missing)
                } else {
                    parse_tokens(slice, depth)
                }
            })
            .collect::<Result<Vec<_>>>()?;

        self.pos = close + 1;
        Ok(Expr::Call {
            name: name.to_ascii_uppercase(),
            args,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ErrorKind;

    fn num(n: f64) -> Expr {
        Expr::Number(n)
    }

    fn bin(op: BinaryOp, lhs: Expr, rhs: Expr) -> Expr {
        Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    #[test]
    fn test_precedence() {
        assert_eq!(
            parse_formula("1+2*3").unwrap(),
            bin(BinaryOp::Add, num(1.0), bin(BinaryOp::Mul, num(2.0), num(3.0)))
        );
        assert_eq!(
            parse_formula("(1+2)*3").unwrap(),
            bin(BinaryOp::Mul, bin(BinaryOp::Add, num(1.0), num(2.0)), num(3.0))
        );
    }

    #[test]
    fn test_power_is_right_associative() {
        assert_eq!(
            parse_formula("2^3^2").unwrap(),
            bin(BinaryOp::Pow, num(2.0), bin(BinaryOp::Pow, num(3.0), num(2.0)))
        );
    }

    #[test]
    fn test_unary_minus_binds_tighter_than_power() {
        let neg_two = Expr::Unary {
            op: UnaryOp::Neg,
            expr: Box::new(num(2.0)),
        };
        assert_eq!(
            parse_formula("-2^2").unwrap(),
            bin(BinaryOp::Pow, neg_two, num(2.0))
        );
    }

    #[test]
    fn test_references_and_ranges() {
        assert_eq!(parse_formula("b2").unwrap(), Expr::Cell(CellRef::new(1, 1)));
        assert_eq!(
            parse_formula("A3:$A$1").unwrap(),
            Expr::Range(RangeRef::new(CellRef::new(0, 2), CellRef::new(0, 0)))
        );
    }

    #[test]
    fn test_nested_calls() {
        let expr = parse_formula(r#"if(A1>1, SUM(A1:A3, 2), "no")"#).unwrap();
        let Expr::Call { name, args } = expr else {
            panic!("expected call");
        };
        assert_eq!(name, "IF");
        assert_eq!(args.len(), 3);
        assert!(matches!(&args[1], Expr::Call { name, args } if name == "SUM" && args.len() == 2));
        assert_eq!(args[2], Expr::Text("no".into()));
    }

    #[test]
    fn test_function_name_that_looks_like_a_cell() {
        let expr = parse_formula("LOG10(100)").unwrap();
        assert!(matches!(expr, Expr::Call { ref name, .. } if name == "LOG10"));
    }

    #[test]
    fn test_empty_and_missing_arguments() {
        assert_eq!(
            parse_formula("PI()").unwrap(),
            Expr::Call {
                name: "PI".into(),
                args: vec![]
            }
        );
        assert_eq!(
            parse_formula("F(1,,2)").unwrap(),
            Expr::Call {
                name: "F".into(),
                args: vec![num(1.0), Expr::Missing, num(2.0)]
            }
        );
    }

    #[test]
    fn test_booleans() {
        assert_eq!(parse_formula("true").unwrap(), Expr::Bool(true));
        assert!(matches!(parse_formula("TRUE()").unwrap(), Expr::Call { .. }));
    }

    #[test]
    fn test_nesting_ceiling() {
        let at_limit = format!("{}1{}", "(".repeat(MAX_NESTING), ")".repeat(MAX_NESTING));
        assert_eq!(parse_formula(&at_limit).unwrap(), num(1.0));

        let too_deep = format!("{}1{}", "(".repeat(MAX_NESTING + 1), ")".repeat(MAX_NESTING + 1));
        assert_eq!(parse_formula(&too_deep).unwrap_err().kind, ErrorKind::DepthExceeded);

        let calls = format!("{}1{}", "ABS(".repeat(MAX_NESTING + 1), ")".repeat(MAX_NESTING + 1));
        assert_eq!(parse_formula(&calls).unwrap_err().kind, ErrorKind::DepthExceeded);

        let signs = format!("{}1", "-".repeat(MAX_NESTING + 1));
        assert_eq!(parse_formula(&signs).unwrap_err().kind, ErrorKind::DepthExceeded);

        let powers = vec!["2"; MAX_NESTING + 2].join("^");
        assert_eq!(parse_formula(&powers).unwrap_err().kind, ErrorKind::DepthExceeded);
    }

    #[test]
    fn test_long_operator_chain_is_not_nesting() {
        let terms: Vec<String> = (1..=500).map(|row| format!("A{}", row)).collect();
        assert!(parse_formula(&terms.join("+")).is_ok());
    }

    #[test]
    fn test_formula_length_limit() {
        let long = "1".repeat(MAX_FORMULA_CHARS + 1);
        assert_eq!(parse_formula(&long).unwrap_err().kind, ErrorKind::Syntax);
    }

    #[test]
    fn test_syntax_errors() {
        for bad in ["", "SUM(", "1+", "(1", "1)", "A1:", "A1:5", "foo", "1 2", "SUM(1,(2)"] {
            assert!(parse_formula(bad).is_err(), "{:?} should not parse", bad);
        }
    }
}
