//! Built-in spreadsheet functions and their metadata.
//!
//! Conventions:
//! - Function names are ALL CAPS (e.g. `SUM`, `VLOOKUP`); lookups are
//!   case-insensitive because the parser upper-cases call names.
//! - Implementations receive the argument expressions unevaluated, so
//!   `IF`/`IFS` only evaluate the branch they take.
//! - If you add a new built-in, add its descriptor to `BUILTINS`; arity is
//!   checked from the descriptor before the implementation runs.

mod criteria;
mod date;
mod financial;
mod logical;
mod lookup;
mod math;
mod stats;
mod text;

use std::collections::HashMap;
use std::sync::OnceLock;

use crate::engine::{
    ErrorKind, EvalContext, EvalError, Expr, Operand, RangeValues, Result, Value,
};

pub(crate) use criteria::Criteria;

pub type BuiltinFn = fn(&mut EvalContext<'_>, &[Expr]) -> Result<Value>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Category {
    Statistical,
    Math,
    Logical,
    Text,
    Date,
    Lookup,
    Financial,
}

pub struct Builtin {
    pub name: &'static str,
    pub min_args: usize,
    /// `None` for variadic functions.
    pub max_args: Option<usize>,
    pub category: Category,
    pub description: &'static str,
    pub eval: BuiltinFn,
}

macro_rules! builtin {
    ($name:literal, $min:expr, $max:expr, $category:ident, $eval:path, $description:literal) => {
        Builtin {
            name: $name,
            min_args: $min,
            max_args: $max,
            category: Category::$category,
            description: $description,
            eval: $eval,
        }
    };
}

pub const BUILTINS: &[Builtin] = &[
    // Statistical
    builtin!("SUM", 0, None, Statistical, stats::sum, "Sum of numeric values"),
    builtin!("AVERAGE", 1, None, Statistical, stats::average, "Arithmetic mean of numeric values"),
    builtin!("AVG", 1, None, Statistical, stats::average, "Alias of AVERAGE"),
    builtin!("COUNT", 0, None, Statistical, stats::count, "Count of numeric values"),
    builtin!("COUNTA", 0, None, Statistical, stats::counta, "Count of non-empty values"),
    builtin!("COUNTIF", 2, Some(2), Statistical, stats::countif, "Count of cells matching a criterion"),
    builtin!("SUMIF", 2, Some(3), Statistical, stats::sumif, "Sum of cells matching a criterion"),
    builtin!("AVERAGEIF", 2, Some(3), Statistical, stats::averageif, "Mean of cells matching a criterion"),
    builtin!("MAX", 0, None, Statistical, stats::max, "Largest numeric value"),
    builtin!("MIN", 0, None, Statistical, stats::min, "Smallest numeric value"),
    builtin!("MEDIAN", 1, None, Statistical, stats::median, "Middle value of the sorted numbers"),
    builtin!("MODE", 1, None, Statistical, stats::mode, "Most frequent number"),
    builtin!("STDEV", 1, None, Statistical, stats::stdev, "Sample standard deviation"),
    builtin!("VAR", 1, None, Statistical, stats::var, "Sample variance"),
    // Math
    builtin!("ABS", 1, Some(1), Math, math::abs, "Absolute value"),
    builtin!("ROUND", 1, Some(2), Math, math::round, "Round half away from zero to N digits"),
    builtin!("ROUNDUP", 1, Some(2), Math, math::roundup, "Round away from zero to N digits"),
    builtin!("ROUNDDOWN", 1, Some(2), Math, math::rounddown, "Round toward zero to N digits"),
    builtin!("CEIL", 1, Some(1), Math, math::ceil, "Smallest integer not below x"),
    builtin!("FLOOR", 1, Some(1), Math, math::floor, "Largest integer not above x"),
    builtin!("SQRT", 1, Some(1), Math, math::sqrt, "Square root"),
    builtin!("POWER", 2, Some(2), Math, math::power, "x raised to y"),
    builtin!("POW", 2, Some(2), Math, math::power, "Alias of POWER"),
    builtin!("EXP", 1, Some(1), Math, math::exp, "e raised to x"),
    builtin!("LN", 1, Some(1), Math, math::ln, "Natural logarithm"),
    builtin!("LOG", 1, Some(2), Math, math::log, "Logarithm, natural unless a base is given"),
    builtin!("LOG10", 1, Some(1), Math, math::log10, "Base-10 logarithm"),
    builtin!("SIN", 1, Some(1), Math, math::sin, "Sine (radians)"),
    builtin!("COS", 1, Some(1), Math, math::cos, "Cosine (radians)"),
    builtin!("TAN", 1, Some(1), Math, math::tan, "Tangent (radians)"),
    builtin!("ASIN", 1, Some(1), Math, math::asin, "Arcsine"),
    builtin!("ACOS", 1, Some(1), Math, math::acos, "Arccosine"),
    builtin!("ATAN", 1, Some(1), Math, math::atan, "Arctangent"),
    builtin!("PI", 0, Some(0), Math, math::pi, "The constant pi"),
    builtin!("RAND", 0, Some(0), Math, math::rand, "Uniform random number in [0, 1)"),
    builtin!("RANDBETWEEN", 2, Some(2), Math, math::randbetween, "Random integer in [lo, hi]"),
    // Logical
    builtin!("IF", 3, Some(3), Logical, logical::if_, "Choose a branch by condition"),
    builtin!("IFS", 2, None, Logical, logical::ifs, "First value whose condition holds"),
    builtin!("AND", 1, None, Logical, logical::and, "True when every argument is true"),
    builtin!("OR", 1, None, Logical, logical::or, "True when any argument is true"),
    builtin!("NOT", 1, Some(1), Logical, logical::not, "Logical negation"),
    builtin!("TRUE", 0, Some(0), Logical, logical::true_, "The value TRUE"),
    builtin!("FALSE", 0, Some(0), Logical, logical::false_, "The value FALSE"),
    // Text
    builtin!("CONCATENATE", 0, None, Text, text::concatenate, "Join values as text"),
    builtin!("CONCAT", 0, None, Text, text::concatenate, "Alias of CONCATENATE"),
    builtin!("LEN", 1, Some(1), Text, text::len, "Number of characters"),
    builtin!("UPPER", 1, Some(1), Text, text::upper, "Upper-case text"),
    builtin!("LOWER", 1, Some(1), Text, text::lower, "Lower-case text"),
    builtin!("PROPER", 1, Some(1), Text, text::proper, "Capitalize each word"),
    builtin!("LEFT", 1, Some(2), Text, text::left, "First N characters"),
    builtin!("RIGHT", 1, Some(2), Text, text::right, "Last N characters"),
    builtin!("MID", 3, Some(3), Text, text::mid, "N characters from a start position"),
    builtin!("TRIM", 1, Some(1), Text, text::trim, "Strip leading and trailing whitespace"),
    builtin!("SUBSTITUTE", 3, Some(4), Text, text::substitute, "Replace occurrences of a substring"),
    builtin!("REPLACE", 4, Some(4), Text, text::replace, "Replace characters by position"),
    builtin!("FIND", 2, Some(3), Text, text::find, "Case-sensitive position of a substring"),
    builtin!("SEARCH", 2, Some(3), Text, text::search, "Case-insensitive position of a substring"),
    // Date
    builtin!("TODAY", 0, Some(0), Date, date::today, "Current date"),
    builtin!("NOW", 0, Some(0), Date, date::now, "Current date and time"),
    builtin!("DATE", 3, Some(3), Date, date::date, "Date from year, month and day"),
    builtin!("TIME", 3, Some(3), Date, date::time, "Time from hour, minute and second"),
    builtin!("YEAR", 1, Some(1), Date, date::year, "Year of a date"),
    builtin!("MONTH", 1, Some(1), Date, date::month, "Month of a date"),
    builtin!("DAY", 1, Some(1), Date, date::day, "Day of month of a date"),
    builtin!("HOUR", 1, Some(1), Date, date::hour, "Hour of a time"),
    builtin!("MINUTE", 1, Some(1), Date, date::minute, "Minute of a time"),
    builtin!("SECOND", 1, Some(1), Date, date::second, "Second of a time"),
    builtin!("WEEKDAY", 1, Some(2), Date, date::weekday, "Day of the week as a number"),
    builtin!("DATEDIF", 3, Some(3), Date, date::datedif, "Difference between two dates"),
    // Lookup
    builtin!("VLOOKUP", 3, Some(4), Lookup, lookup::vlookup, "Look down the first column of a range"),
    builtin!("HLOOKUP", 3, Some(4), Lookup, lookup::hlookup, "Look along the first row of a range"),
    builtin!("INDEX", 2, Some(3), Lookup, lookup::index, "Value at a row and column of a range"),
    builtin!("MATCH", 2, Some(3), Lookup, lookup::match_, "Position of a value in a range"),
    // Financial
    builtin!("PMT", 3, Some(5), Financial, financial::pmt, "Payment per period of a loan"),
    builtin!("PV", 3, Some(5), Financial, financial::pv, "Present value of an annuity"),
    builtin!("FV", 3, Some(5), Financial, financial::fv, "Future value of an annuity"),
    builtin!("RATE", 3, Some(6), Financial, financial::rate, "Interest rate per period"),
    builtin!("NPV", 2, None, Financial, financial::npv, "Net present value of cash flows"),
    builtin!("IRR", 1, Some(2), Financial, financial::irr, "Internal rate of return"),
];

fn index() -> &'static HashMap<&'static str, &'static Builtin> {
    static INDEX: OnceLock<HashMap<&'static str, &'static Builtin>> = OnceLock::new();
    INDEX.get_or_init(|| BUILTINS.iter().map(|b| (b.name, b)).collect())
}

/// Descriptor for a function name, case-insensitive.
pub fn lookup(name: &str) -> Option<&'static Builtin> {
    index().get(name.to_ascii_uppercase().as_str()).copied()
}

/// Every function name the engine knows, in table order.
pub fn names() -> impl Iterator<Item = &'static str> {
    BUILTINS.iter().map(|b| b.name)
}

/// Check arity and run a built-in.
pub(crate) fn call(ctx: &mut EvalContext<'_>, name: &str, args: &[Expr]) -> Result<Value> {
    let builtin = lookup(name).ok_or_else(|| {
        EvalError::new(ErrorKind::UnknownFunction, format!("unknown function {}", name))
    })?;
    let count = args.len();
    let too_many = builtin.max_args.is_some_and(|max| count > max);
    if count < builtin.min_args || too_many {
        let expected = match builtin.max_args {
            Some(max) if max == builtin.min_args => format!("{}", max),
            Some(max) => format!("{} to {}", builtin.min_args, max),
            None => format!("at least {}", builtin.min_args),
        };
        return Err(EvalError::new(
            ErrorKind::Arity,
            format!("{} expects {} arguments, got {}", builtin.name, expected, count),
        ));
    }
    (builtin.eval)(ctx, args)
}

fn err_range_as_scalar() -> EvalError {
    EvalError::type_mismatch("range used where a single value is expected")
}

/// The argument at `i`, or `None` when absent or left empty (`F(1,,2)`).
pub(crate) fn arg(args: &[Expr], i: usize) -> Option<&Expr> {
    args.get(i).filter(|expr| !matches!(expr, Expr::Missing))
}

/// Evaluate one argument to a scalar. A single-cell range counts as that cell.
pub(crate) fn scalar(ctx: &mut EvalContext<'_>, expr: &Expr) -> Result<Value> {
    match ctx.eval_operand(expr)? {
        Operand::Scalar(value) => Ok(value),
        Operand::Range(range) if range.values.len() == 1 => {
            Ok(range.values.into_iter().next().unwrap_or(Value::Empty))
        }
        Operand::Range(_) => Err(err_range_as_scalar()),
    }
}

pub(crate) fn value_arg(ctx: &mut EvalContext<'_>, args: &[Expr], i: usize) -> Result<Value> {
    match arg(args, i) {
        Some(expr) => scalar(ctx, expr),
        None => Ok(Value::Empty),
    }
}

pub(crate) fn number_arg(ctx: &mut EvalContext<'_>, args: &[Expr], i: usize) -> Result<f64> {
    value_arg(ctx, args, i)?.as_number()
}

pub(crate) fn opt_number(
    ctx: &mut EvalContext<'_>,
    args: &[Expr],
    i: usize,
) -> Result<Option<f64>> {
    match arg(args, i) {
        Some(expr) => scalar(ctx, expr)?.as_number().map(Some),
        None => Ok(None),
    }
}

pub(crate) fn text_arg(ctx: &mut EvalContext<'_>, args: &[Expr], i: usize) -> Result<String> {
    Ok(value_arg(ctx, args, i)?.as_text())
}

pub(crate) fn bool_arg(ctx: &mut EvalContext<'_>, args: &[Expr], i: usize) -> Result<bool> {
    Ok(value_arg(ctx, args, i)?.is_truthy())
}

/// Evaluate an argument as a rectangle. A scalar becomes a 1x1 range.
pub(crate) fn range_arg(ctx: &mut EvalContext<'_>, args: &[Expr], i: usize) -> Result<RangeValues> {
    let Some(expr) = arg(args, i) else {
        return Ok(RangeValues {
            rows: 1,
            cols: 1,
            values: vec![Value::Empty],
        });
    };
    match ctx.eval_operand(expr)? {
        Operand::Range(range) => Ok(range),
        Operand::Scalar(value) => Ok(RangeValues {
            rows: 1,
            cols: 1,
            values: vec![value],
        }),
    }
}

/// Numbers from every argument. Ranges and direct cell references contribute
/// only the numeric cells they hold; any other argument must be a number.
pub(crate) fn collect_numbers(ctx: &mut EvalContext<'_>, args: &[Expr]) -> Result<Vec<f64>> {
    let mut numbers = Vec::new();
    for expr in args {
        match expr {
            Expr::Missing => {}
            Expr::Range(range) => numbers.extend(ctx.resolve_range(range)?.numbers()),
            Expr::Cell(cell_ref) => numbers.extend(ctx.resolve_cell(*cell_ref)?.numeric()),
            other => {
                let value = ctx.eval(other)?;
                if !value.is_empty() {
                    numbers.push(value.as_number()?);
                }
            }
        }
    }
    Ok(numbers)
}

/// Every value from every argument, ranges flattened row-major.
pub(crate) fn collect_values(ctx: &mut EvalContext<'_>, args: &[Expr]) -> Result<Vec<Value>> {
    let mut values = Vec::new();
    for expr in args {
        if matches!(expr, Expr::Missing) {
            continue;
        }
        values.extend(ctx.eval_operand(expr)?.into_values());
    }
    Ok(values)
}

/// Fail with a `Num` error unless `n` is finite.
pub(crate) fn finite(n: f64) -> Result<Value> {
    if n.is_finite() {
        Ok(Value::Number(n))
    } else {
        Err(EvalError::num("result is not a finite number"))
    }
}
