//! Lookup functions over ranges.

use std::cmp::Ordering;

use crate::engine::{
    ErrorKind, EvalContext, EvalError, Expr, RangeValues, Result, Value, compare_values,
};

use super::{number_arg, opt_number, range_arg, value_arg};

fn not_found(what: &str, needle: &Value) -> EvalError {
    EvalError::new(ErrorKind::NotFound, format!("{}: {:?} not found", what, needle.as_text()))
}

/// 1-based index checked against `len`, returned 0-based.
fn index_in(n: f64, len: usize, what: &str) -> Result<usize> {
    let i = n.trunc();
    if i < 1.0 || i > len as f64 {
        return Err(EvalError::new(
            ErrorKind::InvalidReference,
            format!("{} {} outside 1..={}", what, i, len),
        ));
    }
    Ok(i as usize - 1)
}

/// Position of `needle` among `keys`. Exact matching compares text
/// case-insensitively; approximate matching expects ascending keys and
/// takes the last key not greater than `needle`. Blank keys never match.
fn search_keys<'v>(
    keys: impl Iterator<Item = &'v Value>,
    needle: &Value,
    approximate: bool,
) -> Option<usize> {
    let mut best = None;
    for (i, key) in keys.enumerate() {
        if key.is_empty() {
            continue;
        }
        match compare_values(key, needle) {
            Ordering::Equal if !approximate => return Some(i),
            Ordering::Equal | Ordering::Less if approximate => best = Some(i),
            Ordering::Greater if approximate => break,
            _ => {}
        }
    }
    best
}

fn table_lookup(ctx: &mut EvalContext<'_>, args: &[Expr], by_row: bool) -> Result<Value> {
    let name = if by_row { "HLOOKUP" } else { "VLOOKUP" };
    let needle = value_arg(ctx, args, 0)?;
    let table = range_arg(ctx, args, 1)?;
    let (lines, width) = if by_row {
        (table.cols, table.rows)
    } else {
        (table.rows, table.cols)
    };
    let offset = index_in(number_arg(ctx, args, 2)?, width, "lookup index")?;
    let approximate = match super::arg(args, 3) {
        Some(_) => super::bool_arg(ctx, args, 3)?,
        None => true,
    };

    let cell = |line: usize, offset: usize| {
        if by_row {
            table.get(offset, line)
        } else {
            table.get(line, offset)
        }
    };
    let keys = (0..lines).filter_map(|line| cell(line, 0));
    let line = search_keys(keys, &needle, approximate).ok_or_else(|| not_found(name, &needle))?;
    Ok(cell(line, offset).cloned().unwrap_or(Value::Empty))
}

pub(super) fn vlookup(ctx: &mut EvalContext<'_>, args: &[Expr]) -> Result<Value> {
    table_lookup(ctx, args, false)
}

pub(super) fn hlookup(ctx: &mut EvalContext<'_>, args: &[Expr]) -> Result<Value> {
    table_lookup(ctx, args, true)
}

/// `INDEX(range, row[, col])`. With a single-row range and no column, the
/// second argument selects the column.
pub(super) fn index(ctx: &mut EvalContext<'_>, args: &[Expr]) -> Result<Value> {
    let range = range_arg(ctx, args, 0)?;
    let first = number_arg(ctx, args, 1)?;
    let (row, col) = match opt_number(ctx, args, 2)? {
        Some(col) => (first, col),
        None if range.rows == 1 => (1.0, first),
        None => (first, 1.0),
    };
    let row = index_in(row, range.rows, "INDEX row")?;
    let col = index_in(col, range.cols, "INDEX column")?;
    Ok(range.get(row, col).cloned().unwrap_or(Value::Empty))
}

fn line_values(range: RangeValues) -> Result<Vec<Value>> {
    if range.rows != 1 && range.cols != 1 {
        return Err(EvalError::new(
            ErrorKind::InvalidReference,
            format!("MATCH needs a single row or column, got {}x{}", range.rows, range.cols),
        ));
    }
    Ok(range.values)
}

/// `MATCH(value, range[, type])`. Type 0 finds an exact match, 1 the
/// largest value not above `value` in ascending data, -1 the smallest
/// value not below it in descending data.
pub(super) fn match_(ctx: &mut EvalContext<'_>, args: &[Expr]) -> Result<Value> {
    let needle = value_arg(ctx, args, 0)?;
    let values = line_values(range_arg(ctx, args, 1)?)?;
    let match_type = opt_number(ctx, args, 2)?.unwrap_or(1.0);

    let found = if match_type == 0.0 {
        search_keys(values.iter(), &needle, false)
    } else if match_type > 0.0 {
        search_keys(values.iter(), &needle, true)
    } else {
        let mut best = None;
        for (i, value) in values.iter().enumerate() {
            if value.is_empty() {
                continue;
            }
            if compare_values(value, &needle) == Ordering::Less {
                break;
            }
            best = Some(i);
        }
        best
    };
    let i = found.ok_or_else(|| not_found("MATCH", &needle))?;
    Ok(Value::Number((i + 1) as f64))
}
