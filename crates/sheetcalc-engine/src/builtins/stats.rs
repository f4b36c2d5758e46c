//! Statistical functions. Empty inputs give 0 rather than an error.

use crate::engine::{EvalContext, Expr, RangeValues, Result, Value};

use super::{Criteria, collect_numbers, collect_values, finite, range_arg, value_arg};

pub(super) fn sum(ctx: &mut EvalContext<'_>, args: &[Expr]) -> Result<Value> {
    finite(collect_numbers(ctx, args)?.iter().sum())
}

fn mean(numbers: &[f64]) -> f64 {
    if numbers.is_empty() {
        return 0.0;
    }
    numbers.iter().sum::<f64>() / numbers.len() as f64
}

pub(super) fn average(ctx: &mut EvalContext<'_>, args: &[Expr]) -> Result<Value> {
    finite(mean(&collect_numbers(ctx, args)?))
}

pub(super) fn count(ctx: &mut EvalContext<'_>, args: &[Expr]) -> Result<Value> {
    let n = collect_values(ctx, args)?
        .iter()
        .filter(|v| matches!(v, Value::Number(_)))
        .count();
    Ok(Value::Number(n as f64))
}

pub(super) fn counta(ctx: &mut EvalContext<'_>, args: &[Expr]) -> Result<Value> {
    let n = collect_values(ctx, args)?
        .iter()
        .filter(|v| !v.is_empty())
        .count();
    Ok(Value::Number(n as f64))
}

fn criteria_args(ctx: &mut EvalContext<'_>, args: &[Expr]) -> Result<(RangeValues, Criteria)> {
    let range = range_arg(ctx, args, 0)?;
    let criteria = Criteria::parse(&value_arg(ctx, args, 1)?);
    Ok((range, criteria))
}

/// Numbers paired with matching cells: from `values` when given (aligned by
/// position with `range`), otherwise from `range` itself.
fn matching_numbers(
    range: &RangeValues,
    criteria: &Criteria,
    values: Option<&RangeValues>,
) -> Vec<f64> {
    let mut numbers = Vec::new();
    for row in 0..range.rows {
        for col in 0..range.cols {
            let Some(cell) = range.get(row, col) else {
                continue;
            };
            if !criteria.matches(cell) {
                continue;
            }
            let source = values.map_or(Some(cell), |v| v.get(row, col));
            numbers.extend(source.and_then(Value::numeric));
        }
    }
    numbers
}

pub(super) fn countif(ctx: &mut EvalContext<'_>, args: &[Expr]) -> Result<Value> {
    let (range, criteria) = criteria_args(ctx, args)?;
    let n = range.values.iter().filter(|v| criteria.matches(v)).count();
    Ok(Value::Number(n as f64))
}

pub(super) fn sumif(ctx: &mut EvalContext<'_>, args: &[Expr]) -> Result<Value> {
    let (range, criteria) = criteria_args(ctx, args)?;
    let sum_range = match super::arg(args, 2) {
        Some(_) => Some(range_arg(ctx, args, 2)?),
        None => None,
    };
    finite(matching_numbers(&range, &criteria, sum_range.as_ref()).iter().sum())
}

pub(super) fn averageif(ctx: &mut EvalContext<'_>, args: &[Expr]) -> Result<Value> {
    let (range, criteria) = criteria_args(ctx, args)?;
    let avg_range = match super::arg(args, 2) {
        Some(_) => Some(range_arg(ctx, args, 2)?),
        None => None,
    };
    finite(mean(&matching_numbers(&range, &criteria, avg_range.as_ref())))
}

pub(super) fn max(ctx: &mut EvalContext<'_>, args: &[Expr]) -> Result<Value> {
    let numbers = collect_numbers(ctx, args)?;
    Ok(Value::Number(numbers.into_iter().reduce(f64::max).unwrap_or(0.0)))
}

pub(super) fn min(ctx: &mut EvalContext<'_>, args: &[Expr]) -> Result<Value> {
    let numbers = collect_numbers(ctx, args)?;
    Ok(Value::Number(numbers.into_iter().reduce(f64::min).unwrap_or(0.0)))
}

pub(super) fn median(ctx: &mut EvalContext<'_>, args: &[Expr]) -> Result<Value> {
    let mut numbers = collect_numbers(ctx, args)?;
    if numbers.is_empty() {
        return Ok(Value::Number(0.0));
    }
    numbers.sort_by(f64::total_cmp);
    let mid = numbers.len() / 2;
    let median = if numbers.len() % 2 == 0 {
        (numbers[mid - 1] + numbers[mid]) / 2.0
    } else {
        numbers[mid]
    };
    Ok(Value::Number(median))
}

/// Most frequent number; ties go to the value seen first.
pub(super) fn mode(ctx: &mut EvalContext<'_>, args: &[Expr]) -> Result<Value> {
    let mut counts: Vec<(f64, usize)> = Vec::new();
    for n in collect_numbers(ctx, args)? {
        match counts.iter_mut().find(|(value, _)| *value == n) {
            Some((_, count)) => *count += 1,
            None => counts.push((n, 1)),
        }
    }
    let mut best = (0.0, 0);
    for (value, count) in counts {
        if count > best.1 {
            best = (value, count);
        }
    }
    Ok(Value::Number(best.0))
}

fn sample_variance(numbers: &[f64]) -> f64 {
    if numbers.len() < 2 {
        return 0.0;
    }
    let m = mean(numbers);
    numbers.iter().map(|n| (n - m).powi(2)).sum::<f64>() / (numbers.len() - 1) as f64
}

pub(super) fn var(ctx: &mut EvalContext<'_>, args: &[Expr]) -> Result<Value> {
    finite(sample_variance(&collect_numbers(ctx, args)?))
}

pub(super) fn stdev(ctx: &mut EvalContext<'_>, args: &[Expr]) -> Result<Value> {
    finite(sample_variance(&collect_numbers(ctx, args)?).sqrt())
}

#[cfg(test)]
mod tests {
    use crate::engine::{Computed, FormulaEngine, Snapshot};

    fn engine(pairs: &[(&str, &str)]) -> FormulaEngine {
        let mut engine = FormulaEngine::new();
        engine.set_snapshot_from(Snapshot::from_pairs(pairs.iter().copied()).unwrap());
        engine
    }

    fn number(engine: &FormulaEngine, formula: &str) -> f64 {
        match engine.evaluate(formula) {
            Computed::Number(n) => n,
            other => panic!("{} gave {:?}", formula, other),
        }
    }

    #[test]
    fn test_sum_and_average() {
        let engine = engine(&[("A1", "1"), ("A2", "2"), ("A3", "3")]);
        assert_eq!(number(&engine, "=SUM(A1:A3)"), 6.0);
        assert_eq!(number(&engine, "=SUM(A3:A1)"), 6.0);
        assert_eq!(number(&engine, "=AVERAGE(A1:A3)"), 2.0);
        assert_eq!(number(&engine, "=AVG(A1:A3, 6)"), 3.0);
        assert_eq!(number(&engine, "=SUM(A1:A3, 10, A1)"), 17.0);
        assert_eq!(number(&engine, "=SUM()"), 0.0);
    }

    #[test]
    fn test_text_and_blanks_are_skipped_in_ranges() {
        let engine = engine(&[("A1", "4"), ("A2", "n/a"), ("A4", "8")]);
        assert_eq!(number(&engine, "=AVERAGE(A1:A4)"), 6.0);
        assert_eq!(number(&engine, "=COUNT(A1:A4)"), 2.0);
        assert_eq!(number(&engine, "=COUNTA(A1:A4)"), 3.0);
    }

    #[test]
    fn test_empty_inputs_give_zero() {
        let engine = engine(&[]);
        assert_eq!(number(&engine, "=AVERAGE(A1:A3)"), 0.0);
        assert_eq!(number(&engine, "=MAX(A1:A3)"), 0.0);
        assert_eq!(number(&engine, "=MIN(A1:A3)"), 0.0);
        assert_eq!(number(&engine, "=MEDIAN(A1:A3)"), 0.0);
        assert_eq!(number(&engine, "=STDEV(5)"), 0.0);
    }

    #[test]
    fn test_max_min_median() {
        let engine = engine(&[("A1", "3"), ("A2", "-1"), ("A3", "7"), ("A4", "4")]);
        assert_eq!(number(&engine, "=MAX(A1:A4)"), 7.0);
        assert_eq!(number(&engine, "=MIN(A1:A4)"), -1.0);
        assert_eq!(number(&engine, "=MEDIAN(A1:A4)"), 3.5);
        assert_eq!(number(&engine, "=MEDIAN(A1:A3)"), 3.0);
    }

    #[test]
    fn test_mode_prefers_first_seen_on_ties() {
        let engine = engine(&[]);
        assert_eq!(number(&engine, "=MODE(1, 2, 2, 3, 3)"), 2.0);
        assert_eq!(number(&engine, "=MODE(5, 4, 4, 5)"), 5.0);
    }

    #[test]
    fn test_variance_and_stdev() {
        let engine = engine(&[]);
        assert_eq!(number(&engine, "=VAR(2, 4, 4, 4, 5, 5, 7, 9)"), 32.0 / 7.0);
        let stdev = number(&engine, "=STDEV(2, 4, 4, 4, 5, 5, 7, 9)");
        assert!((stdev - (32.0f64 / 7.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_conditional_aggregates() {
        let engine = engine(&[
            ("A1", "apple"),
            ("A2", "pear"),
            ("A3", "Apple"),
            ("B1", "10"),
            ("B2", "20"),
            ("B3", "30"),
        ]);
        assert_eq!(number(&engine, "=COUNTIF(A1:A3, \"apple\")"), 2.0);
        assert_eq!(number(&engine, "=COUNTIF(B1:B3, \">15\")"), 2.0);
        assert_eq!(number(&engine, "=SUMIF(B1:B3, \"<>20\")"), 40.0);
        assert_eq!(number(&engine, "=SUMIF(A1:A3, \"apple\", B1:B3)"), 40.0);
        assert_eq!(number(&engine, "=AVERAGEIF(B1:B3, \">=20\")"), 25.0);
        assert_eq!(number(&engine, "=AVERAGEIF(A1:A3, \"pear\", B1:B3)"), 20.0);
        assert_eq!(number(&engine, "=AVERAGEIF(B1:B3, \">100\")"), 0.0);
        assert_eq!(number(&engine, "=COUNTIF(B1:B3, 20)"), 1.0);
    }
}
