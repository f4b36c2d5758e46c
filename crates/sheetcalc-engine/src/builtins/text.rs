//! Text functions. Positions and lengths count characters, 1-based.

use crate::engine::{EvalContext, EvalError, Expr, Result, Value};

use super::{collect_values, number_arg, opt_number, text_arg};

/// A non-negative character count, truncated.
fn count_arg(n: f64, what: &str) -> Result<usize> {
    if n < 0.0 {
        return Err(EvalError::num(format!("{} must not be negative, got {}", what, n)));
    }
    Ok(n.trunc() as usize)
}

/// A 1-based position, returned 0-based.
fn position_arg(n: f64, what: &str) -> Result<usize> {
    if n < 1.0 {
        return Err(EvalError::num(format!("{} must be at least 1, got {}", what, n)));
    }
    Ok(n.trunc() as usize - 1)
}

fn text(s: impl Into<String>) -> Result<Value> {
    Ok(Value::Text(s.into()))
}

pub(super) fn concatenate(ctx: &mut EvalContext<'_>, args: &[Expr]) -> Result<Value> {
    let joined: String = collect_values(ctx, args)?.iter().map(Value::as_text).collect();
    text(joined)
}

pub(super) fn len(ctx: &mut EvalContext<'_>, args: &[Expr]) -> Result<Value> {
    Ok(Value::Number(text_arg(ctx, args, 0)?.chars().count() as f64))
}

pub(super) fn upper(ctx: &mut EvalContext<'_>, args: &[Expr]) -> Result<Value> {
    text(text_arg(ctx, args, 0)?.to_uppercase())
}

pub(super) fn lower(ctx: &mut EvalContext<'_>, args: &[Expr]) -> Result<Value> {
    text(text_arg(ctx, args, 0)?.to_lowercase())
}

/// Upper-case the first letter of every word, lower-case the rest.
pub(super) fn proper(ctx: &mut EvalContext<'_>, args: &[Expr]) -> Result<Value> {
    let mut out = String::new();
    let mut in_word = false;
    for c in text_arg(ctx, args, 0)?.chars() {
        if in_word {
            out.extend(c.to_lowercase());
        } else {
            out.extend(c.to_uppercase());
        }
        in_word = c.is_alphanumeric();
    }
    text(out)
}

pub(super) fn left(ctx: &mut EvalContext<'_>, args: &[Expr]) -> Result<Value> {
    let s = text_arg(ctx, args, 0)?;
    let n = count_arg(opt_number(ctx, args, 1)?.unwrap_or(1.0), "LEFT length")?;
    text(s.chars().take(n).collect::<String>())
}

pub(super) fn right(ctx: &mut EvalContext<'_>, args: &[Expr]) -> Result<Value> {
    let s = text_arg(ctx, args, 0)?;
    let n = count_arg(opt_number(ctx, args, 1)?.unwrap_or(1.0), "RIGHT length")?;
    let skip = s.chars().count().saturating_sub(n);
    text(s.chars().skip(skip).collect::<String>())
}

pub(super) fn mid(ctx: &mut EvalContext<'_>, args: &[Expr]) -> Result<Value> {
    let s = text_arg(ctx, args, 0)?;
    let start = position_arg(number_arg(ctx, args, 1)?, "MID start")?;
    let n = count_arg(number_arg(ctx, args, 2)?, "MID length")?;
    text(s.chars().skip(start).take(n).collect::<String>())
}

pub(super) fn trim(ctx: &mut EvalContext<'_>, args: &[Expr]) -> Result<Value> {
    text(text_arg(ctx, args, 0)?.trim())
}

pub(super) fn substitute(ctx: &mut EvalContext<'_>, args: &[Expr]) -> Result<Value> {
    let s = text_arg(ctx, args, 0)?;
    let old = text_arg(ctx, args, 1)?;
    let new = text_arg(ctx, args, 2)?;
    let instance = match opt_number(ctx, args, 3)? {
        Some(n) => Some(position_arg(n, "SUBSTITUTE instance")?),
        None => None,
    };
    if old.is_empty() {
        return text(s);
    }
    let Some(instance) = instance else {
        return text(s.replace(&old, &new));
    };
    match s.match_indices(&old).nth(instance) {
        Some((at, _)) => text(format!("{}{}{}", &s[..at], new, &s[at + old.len()..])),
        None => text(s),
    }
}

pub(super) fn replace(ctx: &mut EvalContext<'_>, args: &[Expr]) -> Result<Value> {
    let s = text_arg(ctx, args, 0)?;
    let start = position_arg(number_arg(ctx, args, 1)?, "REPLACE start")?;
    let n = count_arg(number_arg(ctx, args, 2)?, "REPLACE length")?;
    let new = text_arg(ctx, args, 3)?;
    let mut out: String = s.chars().take(start).collect();
    out.push_str(&new);
    out.extend(s.chars().skip(start.saturating_add(n)));
    text(out)
}

/// 1-based character position of `needle` in `haystack` at or after `from`
/// (0-based), or -1.
fn position_of(haystack: &[char], needle: &[char], from: usize) -> f64 {
    if from > haystack.len() {
        return -1.0;
    }
    if needle.is_empty() {
        return (from + 1) as f64;
    }
    haystack[from..]
        .windows(needle.len())
        .position(|window| window == needle)
        .map_or(-1.0, |i| (from + i + 1) as f64)
}

fn find_with(
    ctx: &mut EvalContext<'_>,
    args: &[Expr],
    fold: fn(&str) -> String,
) -> Result<Value> {
    let needle: Vec<char> = fold(&text_arg(ctx, args, 0)?).chars().collect();
    let haystack: Vec<char> = fold(&text_arg(ctx, args, 1)?).chars().collect();
    let from = position_arg(opt_number(ctx, args, 2)?.unwrap_or(1.0), "start position")?;
    Ok(Value::Number(position_of(&haystack, &needle, from)))
}

pub(super) fn find(ctx: &mut EvalContext<'_>, args: &[Expr]) -> Result<Value> {
    find_with(ctx, args, str::to_string)
}

pub(super) fn search(ctx: &mut EvalContext<'_>, args: &[Expr]) -> Result<Value> {
    find_with(ctx, args, str::to_lowercase)
}
