//! Date and time functions.
//!
//! Dates travel as ISO text (`2024-03-01`, `2024-03-01 13:45:00`). Arguments
//! also accept spreadsheet serial numbers: days since 1899-12-30, with the
//! fraction giving the time of day.

use chrono::{Datelike, Days, Local, Months, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

use crate::engine::{EvalContext, EvalError, Expr, Result, Value, parse_number};

use super::{number_arg, opt_number, text_arg, value_arg};

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const TIME_FORMAT: &str = "%H:%M:%S";
const SECONDS_PER_DAY: i64 = 86_400;
/// Serial numbers beyond this many days are rejected rather than overflowing.
const MAX_SERIAL_DAYS: f64 = 2_958_465.0;

fn serial_epoch() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(1899, 12, 30)
        .unwrap_or(NaiveDate::MIN)
        .and_time(NaiveTime::MIN)
}

fn add_days(date: NaiveDate, days: i64) -> Option<NaiveDate> {
    if days >= 0 {
        date.checked_add_days(Days::new(days as u64))
    } else {
        date.checked_sub_days(Days::new(days.unsigned_abs()))
    }
}

fn add_months(date: NaiveDate, months: i64) -> Option<NaiveDate> {
    let months_u32 = u32::try_from(months.unsigned_abs()).ok()?;
    if months >= 0 {
        date.checked_add_months(Months::new(months_u32))
    } else {
        date.checked_sub_months(Months::new(months_u32))
    }
}

fn from_serial(serial: f64) -> Result<NaiveDateTime> {
    if !(serial.abs() <= MAX_SERIAL_DAYS) {
        return Err(EvalError::num(format!("date serial {} out of range", serial)));
    }
    let total = (serial * SECONDS_PER_DAY as f64).round() as i64;
    let days = total.div_euclid(SECONDS_PER_DAY);
    let seconds = total.rem_euclid(SECONDS_PER_DAY) as u32;
    let epoch = serial_epoch();
    let date = add_days(epoch.date(), days)
        .ok_or_else(|| EvalError::num(format!("date serial {} out of range", serial)))?;
    let time = NaiveTime::from_num_seconds_from_midnight_opt(seconds, 0).unwrap_or(NaiveTime::MIN);
    Ok(date.and_time(time))
}

/// Interpret a value as a date and time.
fn to_datetime(value: &Value) -> Result<NaiveDateTime> {
    let s = match value {
        Value::Empty => return from_serial(0.0),
        Value::Number(n) => return from_serial(*n),
        Value::Bool(_) => return Err(EvalError::type_mismatch("expected a date, got a boolean")),
        Value::Text(s) => s.trim(),
    };
    if let Some(n) = parse_number(s) {
        return from_serial(n);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, DATETIME_FORMAT) {
        return Ok(dt);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Ok(dt);
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, DATE_FORMAT) {
        return Ok(date.and_time(NaiveTime::MIN));
    }
    if let Ok(time) = NaiveTime::parse_from_str(s, TIME_FORMAT) {
        return Ok(serial_epoch().date().and_time(time));
    }
    Err(EvalError::type_mismatch(format!("expected a date, got {:?}", s)))
}

fn datetime_arg(ctx: &mut EvalContext<'_>, args: &[Expr], i: usize) -> Result<NaiveDateTime> {
    to_datetime(&value_arg(ctx, args, i)?)
}

fn text(s: String) -> Result<Value> {
    Ok(Value::Text(s))
}

fn number(n: impl Into<f64>) -> Result<Value> {
    Ok(Value::Number(n.into()))
}

pub(super) fn today(_ctx: &mut EvalContext<'_>, _args: &[Expr]) -> Result<Value> {
    text(Local::now().format(DATE_FORMAT).to_string())
}

pub(super) fn now(_ctx: &mut EvalContext<'_>, _args: &[Expr]) -> Result<Value> {
    text(Local::now().format(DATETIME_FORMAT).to_string())
}

/// Months and days past the end of their unit roll over, so
/// `DATE(2024, 14, 1)` is 2025-02-01 and `DATE(2024, 3, 0)` is 2024-02-29.
pub(super) fn date(ctx: &mut EvalContext<'_>, args: &[Expr]) -> Result<Value> {
    let year = number_arg(ctx, args, 0)?.trunc();
    let month = number_arg(ctx, args, 1)?.trunc();
    let day = number_arg(ctx, args, 2)?.trunc();
    let out_of_range = || EvalError::num(format!("DATE({}, {}, {}) out of range", year, month, day));

    if !(0.0..=9999.0).contains(&year) || month.abs() > 1e6 || day.abs() > 1e8 {
        return Err(out_of_range());
    }
    let date = NaiveDate::from_ymd_opt(year as i32, 1, 1)
        .and_then(|d| add_months(d, month as i64 - 1))
        .and_then(|d| add_days(d, day as i64 - 1))
        .ok_or_else(out_of_range)?;
    text(date.format(DATE_FORMAT).to_string())
}

pub(super) fn time(ctx: &mut EvalContext<'_>, args: &[Expr]) -> Result<Value> {
    let hours = number_arg(ctx, args, 0)?.trunc();
    let minutes = number_arg(ctx, args, 1)?.trunc();
    let seconds = number_arg(ctx, args, 2)?.trunc();
    let total = hours * 3600.0 + minutes * 60.0 + seconds;
    if !(0.0..1e12).contains(&total) {
        return Err(EvalError::num(format!("TIME({}, {}, {}) out of range", hours, minutes, seconds)));
    }
    let secs = (total as i64).rem_euclid(SECONDS_PER_DAY) as u32;
    let time = NaiveTime::from_num_seconds_from_midnight_opt(secs, 0).unwrap_or(NaiveTime::MIN);
    text(time.format(TIME_FORMAT).to_string())
}

pub(super) fn year(ctx: &mut EvalContext<'_>, args: &[Expr]) -> Result<Value> {
    number(datetime_arg(ctx, args, 0)?.year())
}

pub(super) fn month(ctx: &mut EvalContext<'_>, args: &[Expr]) -> Result<Value> {
    number(datetime_arg(ctx, args, 0)?.month())
}

pub(super) fn day(ctx: &mut EvalContext<'_>, args: &[Expr]) -> Result<Value> {
    number(datetime_arg(ctx, args, 0)?.day())
}

pub(super) fn hour(ctx: &mut EvalContext<'_>, args: &[Expr]) -> Result<Value> {
    number(datetime_arg(ctx, args, 0)?.hour())
}

pub(super) fn minute(ctx: &mut EvalContext<'_>, args: &[Expr]) -> Result<Value> {
    number(datetime_arg(ctx, args, 0)?.minute())
}

pub(super) fn second(ctx: &mut EvalContext<'_>, args: &[Expr]) -> Result<Value> {
    number(datetime_arg(ctx, args, 0)?.second())
}

/// Return type 1: Sunday = 1 .. Saturday = 7. Type 2: Monday = 1 ..
/// Sunday = 7. Type 3: Monday = 0 .. Sunday = 6.
pub(super) fn weekday(ctx: &mut EvalContext<'_>, args: &[Expr]) -> Result<Value> {
    let weekday = datetime_arg(ctx, args, 0)?.weekday();
    let n = match opt_number(ctx, args, 1)?.unwrap_or(1.0) as i64 {
        1 => weekday.number_from_sunday(),
        2 => weekday.number_from_monday(),
        3 => weekday.num_days_from_monday(),
        other => return Err(EvalError::num(format!("WEEKDAY return type {} not supported", other))),
    };
    number(n)
}

fn days_in_month(date: NaiveDate) -> i64 {
    let first = date.with_day(1).unwrap_or(date);
    match add_months(first, 1) {
        Some(next) => (next - first).num_days(),
        None => 31,
    }
}

/// Same month and day as `date` in `year`; Feb 29 becomes Feb 28.
fn in_year(date: NaiveDate, year: i32) -> Option<NaiveDate> {
    date.with_year(year)
        .or_else(|| NaiveDate::from_ymd_opt(year, date.month(), 28))
}

/// Whole months from `start` to `end`.
fn whole_months(start: NaiveDate, end: NaiveDate) -> i64 {
    let mut months = (end.year() as i64 - start.year() as i64) * 12 + end.month() as i64
        - start.month() as i64;
    if end.day() < start.day() {
        months -= 1;
    }
    months
}

pub(super) fn datedif(ctx: &mut EvalContext<'_>, args: &[Expr]) -> Result<Value> {
    let start = datetime_arg(ctx, args, 0)?.date();
    let end = datetime_arg(ctx, args, 1)?.date();
    let unit = text_arg(ctx, args, 2)?.trim().to_ascii_uppercase();
    if start > end {
        return Err(EvalError::num("DATEDIF start date is after end date"));
    }

    let n = match unit.as_str() {
        "D" => (end - start).num_days(),
        "M" => whole_months(start, end),
        "Y" => whole_months(start, end) / 12,
        "YM" => whole_months(start, end) % 12,
        "MD" => {
            let (d1, d2) = (start.day() as i64, end.day() as i64);
            if d2 >= d1 {
                d2 - d1
            } else {
                let previous = add_months(end, -1).unwrap_or(end);
                (days_in_month(previous) - d1 + d2).max(0)
            }
        }
        "YD" => {
            let mut shifted = in_year(start, end.year())
                .ok_or_else(|| EvalError::num("DATEDIF date out of range"))?;
            if shifted > end {
                shifted = in_year(start, end.year() - 1)
                    .ok_or_else(|| EvalError::num("DATEDIF date out of range"))?;
            }
            (end - shifted).num_days()
        }
        other => return Err(EvalError::num(format!("DATEDIF unit {:?} not supported", other))),
    };
    number(n as f64)
}

#[cfg(test)]
mod tests {
    use crate::engine::{Computed, ErrorKind, FormulaEngine, Snapshot};

    fn engine() -> FormulaEngine {
        let mut engine = FormulaEngine::new();
        engine.set_snapshot_from(
            Snapshot::from_pairs([
                ("A1", "2024-02-29"),
                ("A2", "2024-03-15 13:45:30"),
                ("A3", "45352"),
            ])
            .unwrap(),
        );
        engine
    }

    fn eval(formula: &str) -> Computed {
        engine().evaluate(formula)
    }

    fn text(s: &str) -> Computed {
        Computed::Text(s.to_string())
    }

    #[test]
    fn test_today_and_now_shapes() {
        let today = eval("=TODAY()");
        let today = today.as_text().unwrap();
        assert_eq!(today.len(), 10);
        assert!(chrono::NaiveDate::parse_from_str(today, "%Y-%m-%d").is_ok());

        let now = eval("=NOW()");
        let now = now.as_text().unwrap();
        assert!(chrono::NaiveDateTime::parse_from_str(now, "%Y-%m-%d %H:%M:%S").is_ok());
    }

    #[test]
    fn test_date_rolls_over() {
        assert_eq!(eval("=DATE(2024, 1, 15)"), text("2024-01-15"));
        assert_eq!(eval("=DATE(2024, 14, 1)"), text("2025-02-01"));
        assert_eq!(eval("=DATE(2024, 3, 0)"), text("2024-02-29"));
        assert_eq!(eval("=DATE(2024, 1, 32)"), text("2024-02-01"));
        assert_eq!(eval("=DATE(2024, 0, 1)"), text("2023-12-01"));
    }

    #[test]
    fn test_time() {
        assert_eq!(eval("=TIME(13, 5, 9)"), text("13:05:09"));
        assert_eq!(eval("=TIME(0, 90, 0)"), text("01:30:00"));
        assert_eq!(eval("=TIME(25, 0, 0)"), text("01:00:00"));
    }

    #[test]
    fn test_parts_of_dates() {
        assert_eq!(eval("=YEAR(A1)"), Computed::Number(2024.0));
        assert_eq!(eval("=MONTH(A1)"), Computed::Number(2.0));
        assert_eq!(eval("=DAY(A1)"), Computed::Number(29.0));
        assert_eq!(eval("=HOUR(A2)"), Computed::Number(13.0));
        assert_eq!(eval("=MINUTE(A2)"), Computed::Number(45.0));
        assert_eq!(eval("=SECOND(A2)"), Computed::Number(30.0));
        assert_eq!(eval("=HOUR(\"08:15:00\")"), Computed::Number(8.0));
        assert_eq!(eval("=YEAR(DATE(1999, 12, 31))"), Computed::Number(1999.0));
    }

    #[test]
    fn test_serial_numbers() {
        // 45352 is 2024-03-01.
        assert_eq!(eval("=YEAR(A3)"), Computed::Number(2024.0));
        assert_eq!(eval("=MONTH(A3)"), Computed::Number(3.0));
        assert_eq!(eval("=DAY(A3)"), Computed::Number(1.0));
        assert_eq!(eval("=HOUR(45352.75)"), Computed::Number(18.0));
        assert_eq!(eval("=DAY(1)"), Computed::Number(31.0));
    }

    #[test]
    fn test_weekday() {
        // 2024-03-01 was a Friday.
        assert_eq!(eval("=WEEKDAY(A3)"), Computed::Number(6.0));
        assert_eq!(eval("=WEEKDAY(A3, 2)"), Computed::Number(5.0));
        assert_eq!(eval("=WEEKDAY(A3, 3)"), Computed::Number(4.0));
        assert!(eval("=WEEKDAY(A3, 9)").is_error());
    }

    #[test]
    fn test_datedif() {
        assert_eq!(eval("=DATEDIF(\"2020-01-15\", \"2024-03-10\", \"Y\")"), Computed::Number(4.0));
        assert_eq!(eval("=DATEDIF(\"2020-01-15\", \"2024-03-10\", \"M\")"), Computed::Number(49.0));
        assert_eq!(eval("=DATEDIF(\"2024-01-01\", \"2024-03-01\", \"D\")"), Computed::Number(60.0));
        assert_eq!(eval("=DATEDIF(\"2020-01-15\", \"2024-03-10\", \"YM\")"), Computed::Number(1.0));
        assert_eq!(eval("=DATEDIF(\"2020-01-15\", \"2024-03-10\", \"MD\")"), Computed::Number(24.0));
        assert_eq!(eval("=DATEDIF(\"2020-01-15\", \"2024-03-10\", \"yd\")"), Computed::Number(55.0));
    }

    #[test]
    fn test_date_errors() {
        let engine = engine();
        let kind = |f: &str| engine.try_evaluate(f).unwrap_err().kind;
        assert_eq!(kind("=YEAR(\"not a date\")"), ErrorKind::TypeMismatch);
        assert_eq!(kind("=DATEDIF(\"2024-02-01\", \"2024-01-01\", \"D\")"), ErrorKind::Num);
        assert_eq!(kind("=DATEDIF(A1, A1, \"W\")"), ErrorKind::Num);
        assert_eq!(kind("=DATE(-1, 1, 1)"), ErrorKind::Num);
    }
}
