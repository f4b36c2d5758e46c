//! Splitting a function call's argument list.
//!
//! Arguments are separated by commas at nesting depth zero. Commas inside a
//! nested call's parentheses or inside a quoted string never split.

use super::error::{EvalError, Result};
use super::lexer::{Token, TokenKind, tokenize};

/// Indices of the commas that separate top-level arguments.
fn top_level_commas(tokens: &[Token]) -> Result<Vec<usize>> {
    let mut depth = 0usize;
    let mut commas = Vec::new();
    for (i, token) in tokens.iter().enumerate() {
        match token.kind {
            TokenKind::LParen => depth += 1,
            TokenKind::RParen => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| EvalError::syntax("unmatched ')' in argument list"))?;
            }
            TokenKind::Comma if depth == 0 => commas.push(i),
            _ => {}
        }
    }
    if depth != 0 {
        return Err(EvalError::syntax("unmatched '(' in argument list"));
    }
    Ok(commas)
}

/// Split the tokens between a call's parentheses into one slice per argument.
/// No tokens means no arguments; an empty slice is an omitted argument.
pub fn split_top_level(tokens: &[Token]) -> Result<Vec<&[Token]>> {
    if tokens.is_empty() {
        return Ok(Vec::new());
    }
    let mut args = Vec::new();
    let mut start = 0;
    for comma in top_level_commas(tokens)? {
        args.push(&tokens[start..comma]);
        start = comma + 1;
    }
    args.push(&tokens[start..]);
    Ok(args)
}

/// Split the text between a call's parentheses into trimmed argument strings.
///
/// ```
/// use sheetcalc_engine::engine::split_args;
///
/// let args = split_args(r#"A1:A3, IF(B1, "x,y", 2), "a""b""#).unwrap();
/// assert_eq!(args, vec!["A1:A3", r#"IF(B1, "x,y", 2)"#, r#""a""b""#]);
/// ```
pub fn split_args(text: &str) -> Result<Vec<String>> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }
    let tokens = tokenize(text)?;
    let mut args = Vec::new();
    let mut start = 0;
    for comma in top_level_commas(&tokens)? {
        let at = tokens[comma].span.start;
        args.push(text[start..at].trim().to_string());
        start = tokens[comma].span.end;
    }
    args.push(text[start..].trim().to_string());
    Ok(args)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_args_empty() {
        assert!(split_args("").unwrap().is_empty());
        assert!(split_args("   ").unwrap().is_empty());
    }

    #[test]
    fn test_split_args_nested_calls_do_not_split() {
        assert_eq!(
            split_args("SUM(A1, A2), MAX(1, MIN(2, 3)) ,4").unwrap(),
            vec!["SUM(A1, A2)", "MAX(1, MIN(2, 3))", "4"]
        );
    }

    #[test]
    fn test_split_args_keeps_quoted_commas() {
        assert_eq!(
            split_args(r#""a,b", "(", C1"#).unwrap(),
            vec![r#""a,b""#, r#""(""#, "C1"]
        );
    }

    #[test]
    fn test_split_args_omitted_argument() {
        assert_eq!(split_args("1,,2").unwrap(), vec!["1", "", "2"]);
    }

    #[test]
    fn test_split_args_unbalanced() {
        assert!(split_args("SUM(1, 2").is_err());
        assert!(split_args("1), 2").is_err());
    }

    #[test]
    fn test_split_top_level_counts_slices() {
        let tokens = tokenize("A1, F(1, 2), ").unwrap();
        let args = split_top_level(&tokens).unwrap();
        assert_eq!(args.len(), 3);
        assert_eq!(args[0].len(), 1);
        assert_eq!(args[1].len(), 6);
        assert!(args[2].is_empty());
    }
}
