//! Values flowing through evaluation.

use super::error::{EvalError, Result};
use super::format::{format_number, format_value};
use std::fmt;

/// A scalar produced while evaluating a formula.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Empty,
    Number(f64),
    Text(String),
    Bool(bool),
}

impl Value {
    /// Interpret raw literal cell content (anything not starting with `=`).
    /// Numeric-looking text becomes a number, blank becomes `Empty`.
    pub fn from_literal(raw: &str) -> Value {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Value::Empty;
        }
        match parse_number(trimmed) {
            Some(n) => Value::Number(n),
            None => Value::Text(raw.to_string()),
        }
    }

    /// Numeric coercion: empty is 0, booleans are 1/0, text must parse.
    pub fn as_number(&self) -> Result<f64> {
        match self {
            Value::Empty => Ok(0.0),
            Value::Number(n) => Ok(*n),
            Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
            Value::Text(s) => parse_number(s.trim())
                .ok_or_else(|| EvalError::type_mismatch(format!("expected a number, got {:?}", s))),
        }
    }

    /// The number this value holds without coercing text. Used when
    /// aggregating ranges, where text and blanks are skipped.
    pub fn numeric(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> String {
        format_value(self)
    }

    /// Non-zero numbers, `TRUE`, and the text "true" (any case) are true.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Empty => false,
            Value::Number(n) => *n != 0.0,
            Value::Bool(b) => *b,
            Value::Text(s) => s.trim().eq_ignore_ascii_case("true"),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Value::Empty)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_value(self))
    }
}

/// Parse a finite number. `f64::from_str` also accepts "inf" and "NaN",
/// which are never numbers in a sheet.
pub fn parse_number(s: &str) -> Option<f64> {
    let first = s.chars().next()?;
    if !(first.is_ascii_digit() || matches!(first, '-' | '+' | '.')) {
        return None;
    }
    s.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Cells of a rectangular range in row-major order.
#[derive(Clone, Debug, PartialEq)]
pub struct RangeValues {
    pub rows: usize,
    pub cols: usize,
    pub values: Vec<Value>,
}

impl RangeValues {
    pub fn get(&self, row: usize, col: usize) -> Option<&Value> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        self.values.get(row * self.cols + col)
    }

    pub fn numbers(&self) -> impl Iterator<Item = f64> + '_ {
        self.values.iter().filter_map(Value::numeric)
    }

    /// Render as a bracketed list, the textual form of a bare range.
    pub fn to_list_string(&self) -> String {
        let items: Vec<String> = self.values.iter().map(format_value).collect();
        format!("[{}]", items.join(","))
    }
}

/// A function argument after evaluation: a scalar or a whole range.
#[derive(Clone, Debug, PartialEq)]
pub enum Operand {
    Scalar(Value),
    Range(RangeValues),
}

impl Operand {
    /// Every value in the operand, row-major for ranges.
    pub fn into_values(self) -> Vec<Value> {
        match self {
            Operand::Scalar(v) => vec![v],
            Operand::Range(r) => r.values,
        }
    }
}

/// What callers of the engine receive: a number or a string. Errors arrive
/// as the `#ERROR` string.
#[derive(Clone, Debug, PartialEq)]
pub enum Computed {
    Number(f64),
    Text(String),
}

impl Computed {
    pub fn is_error(&self) -> bool {
        matches!(self, Computed::Text(s) if s == super::ERROR_SENTINEL)
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Computed::Number(n) => Some(*n),
            Computed::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Computed::Text(s) => Some(s),
            Computed::Number(_) => None,
        }
    }
}

impl From<Value> for Computed {
    fn from(value: Value) -> Computed {
        match value {
            Value::Number(n) => Computed::Number(n),
            other => Computed::Text(format_value(&other)),
        }
    }
}

impl fmt::Display for Computed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Computed::Number(n) => f.write_str(&format_number(*n)),
            Computed::Text(s) => f.write_str(s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_literal() {
        assert_eq!(Value::from_literal(""), Value::Empty);
        assert_eq!(Value::from_literal("  "), Value::Empty);
        assert_eq!(Value::from_literal("10"), Value::Number(10.0));
        assert_eq!(Value::from_literal("-2.5"), Value::Number(-2.5));
        assert_eq!(Value::from_literal("hello"), Value::Text("hello".into()));
        assert_eq!(Value::from_literal("inf"), Value::Text("inf".into()));
        assert_eq!(Value::from_literal("NaN"), Value::Text("NaN".into()));
    }

    #[test]
    fn test_as_number_coercions() {
        assert_eq!(Value::Empty.as_number(), Ok(0.0));
        assert_eq!(Value::Bool(true).as_number(), Ok(1.0));
        assert_eq!(Value::Text(" 42 ".into()).as_number(), Ok(42.0));
        assert!(Value::Text("abc".into()).as_number().is_err());
    }

    #[test]
    fn test_truthiness() {
        assert!(Value::Number(-1.0).is_truthy());
        assert!(!Value::Number(0.0).is_truthy());
        assert!(Value::Text("TRUE".into()).is_truthy());
        assert!(Value::Text("true".into()).is_truthy());
        assert!(!Value::Text("yes".into()).is_truthy());
        assert!(!Value::Empty.is_truthy());
    }

    #[test]
    fn test_range_get_is_row_major() {
        let range = RangeValues {
            rows: 2,
            cols: 2,
            values: vec![
                Value::Number(1.0),
                Value::Number(2.0),
                Value::Number(3.0),
                Value::Number(4.0),
            ],
        };
        assert_eq!(range.get(1, 0), Some(&Value::Number(3.0)));
        assert_eq!(range.get(2, 0), None);
        assert_eq!(range.to_list_string(), "[1,2,3,4]");
    }

    #[test]
    fn test_computed_from_value() {
        assert_eq!(Computed::from(Value::Number(3.0)), Computed::Number(3.0));
        assert_eq!(Computed::from(Value::Bool(true)), Computed::Text("TRUE".into()));
        assert_eq!(Computed::from(Value::Empty), Computed::Text(String::new()));
        assert!(Computed::Text("#ERROR".into()).is_error());
    }
}
