//! Time-value-of-money functions.
//!
//! Sign convention: money paid out is negative, money received positive.
//! `type` 0 means payments at the end of each period, 1 at the start.

use crate::engine::{EvalContext, EvalError, Expr, Result, Value};

use super::{collect_numbers, finite, number_arg, opt_number, range_arg};

const MAX_ITERATIONS: usize = 100;
const TOLERANCE: f64 = 1e-10;
/// Largest residual accepted once Newton steps stop shrinking.
const RESIDUAL: f64 = 1e-7;
/// Rates closer to zero than this use the linear formulas.
const ZERO_RATE: f64 = 1e-10;

fn present_value(rate: f64, nper: f64, pmt: f64, fv: f64, typ: f64) -> f64 {
    if rate.abs() < ZERO_RATE {
        return -(pmt * nper + fv);
    }
    let discount = (1.0 + rate).powf(-nper);
    -(pmt * (1.0 + rate * typ) * (1.0 - discount) / rate + fv * discount)
}

fn future_value(rate: f64, nper: f64, pmt: f64, pv: f64, typ: f64) -> f64 {
    if rate.abs() < ZERO_RATE {
        return -(pv + pmt * nper);
    }
    let growth = (1.0 + rate).powf(nper);
    -(pv * growth + pmt * (1.0 + rate * typ) * (growth - 1.0) / rate)
}

fn payment(rate: f64, nper: f64, pv: f64, fv: f64, typ: f64) -> f64 {
    if rate.abs() < ZERO_RATE {
        return -(pv + fv) / nper;
    }
    let growth = (1.0 + rate).powf(nper);
    -(pv * growth + fv) * rate / ((growth - 1.0) * (1.0 + rate * typ))
}

/// Net present value with the first flow discounted one period.
fn net_present_value(rate: f64, flows: &[f64]) -> f64 {
    flows
        .iter()
        .enumerate()
        .map(|(i, flow)| flow / (1.0 + rate).powi(i as i32 + 1))
        .sum()
}

/// Newton's method with a central-difference derivative.
fn solve(f: impl Fn(f64) -> f64, guess: f64) -> Option<f64> {
    const H: f64 = 1e-6;
    let mut x = guess;
    for _ in 0..MAX_ITERATIONS {
        let y = f(x);
        if y.abs() < TOLERANCE {
            return Some(x);
        }
        let slope = (f(x + H) - f(x - H)) / (2.0 * H);
        if !slope.is_finite() || slope.abs() < 1e-12 {
            return None;
        }
        let next = x - y / slope;
        // Rates at or below -100% have no meaning.
        if !next.is_finite() || next <= -1.0 {
            return None;
        }
        if (next - x).abs() < TOLERANCE {
            return (f(next).abs() < RESIDUAL).then_some(next);
        }
        x = next;
    }
    None
}

/// The optional trailing `[value, type]` pair shared by PMT, PV and FV.
fn value_and_type(ctx: &mut EvalContext<'_>, args: &[Expr]) -> Result<(f64, f64)> {
    let value = opt_number(ctx, args, 3)?.unwrap_or(0.0);
    let typ = opt_number(ctx, args, 4)?.unwrap_or(0.0);
    Ok((value, if typ != 0.0 { 1.0 } else { 0.0 }))
}

pub(super) fn pmt(ctx: &mut EvalContext<'_>, args: &[Expr]) -> Result<Value> {
    let rate = number_arg(ctx, args, 0)?;
    let nper = number_arg(ctx, args, 1)?;
    let pv = number_arg(ctx, args, 2)?;
    let (fv, typ) = value_and_type(ctx, args)?;
    if nper == 0.0 {
        return Err(EvalError::num("PMT needs a non-zero number of periods"));
    }
    finite(payment(rate, nper, pv, fv, typ))
}

pub(super) fn pv(ctx: &mut EvalContext<'_>, args: &[Expr]) -> Result<Value> {
    let rate = number_arg(ctx, args, 0)?;
    let nper = number_arg(ctx, args, 1)?;
    let pmt = number_arg(ctx, args, 2)?;
    let (fv, typ) = value_and_type(ctx, args)?;
    finite(present_value(rate, nper, pmt, fv, typ))
}

pub(super) fn fv(ctx: &mut EvalContext<'_>, args: &[Expr]) -> Result<Value> {
    let rate = number_arg(ctx, args, 0)?;
    let nper = number_arg(ctx, args, 1)?;
    let pmt = number_arg(ctx, args, 2)?;
    let (pv, typ) = value_and_type(ctx, args)?;
    finite(future_value(rate, nper, pmt, pv, typ))
}

/// `RATE(nper, pmt, pv[, fv, type, guess])`.
pub(super) fn rate(ctx: &mut EvalContext<'_>, args: &[Expr]) -> Result<Value> {
    let nper = number_arg(ctx, args, 0)?;
    let pmt = number_arg(ctx, args, 1)?;
    let pv = number_arg(ctx, args, 2)?;
    let fv = opt_number(ctx, args, 3)?.unwrap_or(0.0);
    let typ = if opt_number(ctx, args, 4)?.unwrap_or(0.0) != 0.0 { 1.0 } else { 0.0 };
    let guess = opt_number(ctx, args, 5)?.unwrap_or(0.1);

    // Zero when the payments and future value discount to the present value.
    let balance = |r: f64| pv - present_value(r, nper, pmt, fv, typ);
    solve(balance, guess)
        .map(Value::Number)
        .ok_or_else(|| EvalError::num("RATE did not converge"))
}

pub(super) fn npv(ctx: &mut EvalContext<'_>, args: &[Expr]) -> Result<Value> {
    let rate = number_arg(ctx, args, 0)?;
    let flows = collect_numbers(ctx, &args[1..])?;
    if rate == -1.0 {
        return Err(EvalError::div_by_zero());
    }
    finite(net_present_value(rate, &flows))
}

/// `IRR(values[, guess])`: the rate at which the flows' NPV, with the first
/// flow undiscounted, is zero.
pub(super) fn irr(ctx: &mut EvalContext<'_>, args: &[Expr]) -> Result<Value> {
    let flows: Vec<f64> = range_arg(ctx, args, 0)?.numbers().collect();
    let guess = opt_number(ctx, args, 1)?.unwrap_or(0.1);
    let has_inflow = flows.iter().any(|f| *f > 0.0);
    let has_outflow = flows.iter().any(|f| *f < 0.0);
    if !(has_inflow && has_outflow) {
        return Err(EvalError::num("IRR needs both positive and negative cash flows"));
    }
    let npv_at = |r: f64| (1.0 + r) * net_present_value(r, &flows);
    solve(npv_at, guess)
        .map(Value::Number)
        .ok_or_else(|| EvalError::num("IRR did not converge"))
}
