//! Criteria for `COUNTIF`, `SUMIF` and `AVERAGEIF`: `">5"`, `"<>x"`, `"=3"`
//! or a bare value meaning equality.

use std::cmp::Ordering;

use crate::engine::{Value, parse_number};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum CriteriaOperator {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
}

#[derive(Clone, Debug, PartialEq)]
enum CriteriaValue {
    Number(f64),
    Text(String),
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Criteria {
    op: CriteriaOperator,
    rhs: CriteriaValue,
}

impl Criteria {
    pub(crate) fn parse(criterion: &Value) -> Criteria {
        let text = match criterion {
            Value::Number(n) => {
                return Criteria {
                    op: CriteriaOperator::Eq,
                    rhs: CriteriaValue::Number(*n),
                };
            }
            other => other.as_text(),
        };

        let s = text.trim();
        let (op, rest) = [
            (">=", CriteriaOperator::Ge),
            ("<=", CriteriaOperator::Le),
            ("<>", CriteriaOperator::Ne),
            (">", CriteriaOperator::Gt),
            ("<", CriteriaOperator::Lt),
            ("=", CriteriaOperator::Eq),
        ]
        .into_iter()
        .find_map(|(prefix, op)| s.strip_prefix(prefix).map(|rest| (op, rest)))
        .unwrap_or((CriteriaOperator::Eq, s));

        let rest = rest.trim();
        let rhs = match parse_number(rest) {
            Some(n) => CriteriaValue::Number(n),
            None => CriteriaValue::Text(rest.to_lowercase()),
        };
        Criteria { op, rhs }
    }

    /// Numbers compare numerically; anything else compares as
    /// case-insensitive text.
    pub(crate) fn matches(&self, value: &Value) -> bool {
        let ordering = match &self.rhs {
            CriteriaValue::Number(target) => match value.numeric() {
                Some(n) => n.partial_cmp(target),
                None if self.op == CriteriaOperator::Ne => return true,
                None => return false,
            },
            CriteriaValue::Text(target) => Some(value.as_text().to_lowercase().cmp(target)),
        };
        let Some(ordering) = ordering else {
            return false;
        };
        match self.op {
            CriteriaOperator::Eq => ordering == Ordering::Equal,
            CriteriaOperator::Ne => ordering != Ordering::Equal,
            CriteriaOperator::Gt => ordering == Ordering::Greater,
            CriteriaOperator::Ge => ordering != Ordering::Less,
            CriteriaOperator::Lt => ordering == Ordering::Less,
            CriteriaOperator::Le => ordering != Ordering::Greater,
        }
    }
}
