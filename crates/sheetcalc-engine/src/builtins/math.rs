//! Math functions.

use rand::Rng;

use crate::engine::{EvalContext, EvalError, Expr, Result, Value};

use super::{finite, number_arg, opt_number};

fn unary(ctx: &mut EvalContext<'_>, args: &[Expr], f: fn(f64) -> f64) -> Result<Value> {
    finite(f(number_arg(ctx, args, 0)?))
}

/// Value and `10^digits` for the rounding family. Digits default to 0 and
/// are truncated to an integer.
fn rounding_args(ctx: &mut EvalContext<'_>, args: &[Expr]) -> Result<(f64, f64)> {
    let x = number_arg(ctx, args, 0)?;
    let digits = opt_number(ctx, args, 1)?.unwrap_or(0.0).trunc();
    Ok((x, 10f64.powi(digits as i32)))
}

/// A scaled value within a couple of ulps of an integer is that integer, so
/// `ROUNDUP(1.1, 1)` is not thrown off by `1.1 * 10`. Anything further away
/// is a real fraction and gets truncated or raised.
fn snap(scaled: f64) -> Option<f64> {
    let nearest = scaled.round();
    let tolerance = scaled.abs().max(1.0) * 2.0 * f64::EPSILON;
    ((scaled - nearest).abs() <= tolerance).then_some(nearest)
}

pub(super) fn abs(ctx: &mut EvalContext<'_>, args: &[Expr]) -> Result<Value> {
    unary(ctx, args, f64::abs)
}

pub(super) fn round(ctx: &mut EvalContext<'_>, args: &[Expr]) -> Result<Value> {
    let (x, scale) = rounding_args(ctx, args)?;
    finite((x * scale).round() / scale)
}

pub(super) fn roundup(ctx: &mut EvalContext<'_>, args: &[Expr]) -> Result<Value> {
    let (x, scale) = rounding_args(ctx, args)?;
    let scaled = x * scale;
    let rounded = snap(scaled).unwrap_or_else(|| scaled.abs().ceil().copysign(scaled));
    finite(rounded / scale)
}

pub(super) fn rounddown(ctx: &mut EvalContext<'_>, args: &[Expr]) -> Result<Value> {
    let (x, scale) = rounding_args(ctx, args)?;
    let scaled = x * scale;
    let rounded = snap(scaled).unwrap_or_else(|| scaled.trunc());
    finite(rounded / scale)
}

pub(super) fn ceil(ctx: &mut EvalContext<'_>, args: &[Expr]) -> Result<Value> {
    unary(ctx, args, f64::ceil)
}

pub(super) fn floor(ctx: &mut EvalContext<'_>, args: &[Expr]) -> Result<Value> {
    unary(ctx, args, f64::floor)
}

pub(super) fn sqrt(ctx: &mut EvalContext<'_>, args: &[Expr]) -> Result<Value> {
    let x = number_arg(ctx, args, 0)?;
    if x < 0.0 {
        return Err(EvalError::num(format!("SQRT of negative number {}", x)));
    }
    finite(x.sqrt())
}

pub(super) fn power(ctx: &mut EvalContext<'_>, args: &[Expr]) -> Result<Value> {
    let base = number_arg(ctx, args, 0)?;
    let exponent = number_arg(ctx, args, 1)?;
    finite(base.powf(exponent))
}

pub(super) fn exp(ctx: &mut EvalContext<'_>, args: &[Expr]) -> Result<Value> {
    unary(ctx, args, f64::exp)
}

pub(super) fn ln(ctx: &mut EvalContext<'_>, args: &[Expr]) -> Result<Value> {
    unary(ctx, args, f64::ln)
}

pub(super) fn log(ctx: &mut EvalContext<'_>, args: &[Expr]) -> Result<Value> {
    let x = number_arg(ctx, args, 0)?;
    match opt_number(ctx, args, 1)? {
        Some(base) => finite(x.ln() / base.ln()),
        None => finite(x.ln()),
    }
}

pub(super) fn log10(ctx: &mut EvalContext<'_>, args: &[Expr]) -> Result<Value> {
    unary(ctx, args, f64::log10)
}

pub(super) fn sin(ctx: &mut EvalContext<'_>, args: &[Expr]) -> Result<Value> {
    unary(ctx, args, f64::sin)
}

pub(super) fn cos(ctx: &mut EvalContext<'_>, args: &[Expr]) -> Result<Value> {
    unary(ctx, args, f64::cos)
}

pub(super) fn tan(ctx: &mut EvalContext<'_>, args: &[Expr]) -> Result<Value> {
    unary(ctx, args, f64::tan)
}

pub(super) fn asin(ctx: &mut EvalContext<'_>, args: &[Expr]) -> Result<Value> {
    unary(ctx, args, f64::asin)
}

pub(super) fn acos(ctx: &mut EvalContext<'_>, args: &[Expr]) -> Result<Value> {
    unary(ctx, args, f64::acos)
}

pub(super) fn atan(ctx: &mut EvalContext<'_>, args: &[Expr]) -> Result<Value> {
    unary(ctx, args, f64::atan)
}

pub(super) fn pi(_ctx: &mut EvalContext<'_>, _args: &[Expr]) -> Result<Value> {
    Ok(Value::Number(std::f64::consts::PI))
}

pub(super) fn rand(_ctx: &mut EvalContext<'_>, _args: &[Expr]) -> Result<Value> {
    Ok(Value::Number(rand::thread_rng().r#gen::<f64>()))
}

pub(super) fn randbetween(ctx: &mut EvalContext<'_>, args: &[Expr]) -> Result<Value> {
    let lo = number_arg(ctx, args, 0)?.ceil();
    let hi = number_arg(ctx, args, 1)?.floor();
    if lo > hi {
        return Err(EvalError::num(format!("RANDBETWEEN bounds {} > {}", lo, hi)));
    }
    // `i64::MAX as f64` rounds up to 2^63, which is itself out of range.
    if lo < i64::MIN as f64 || hi >= i64::MAX as f64 {
        return Err(EvalError::num(format!(
            "RANDBETWEEN bounds {} and {} do not fit a 64-bit integer",
            lo, hi
        )));
    }
    let n = rand::thread_rng().gen_range(lo as i64..=hi as i64);
    Ok(Value::Number(n as f64))
}
