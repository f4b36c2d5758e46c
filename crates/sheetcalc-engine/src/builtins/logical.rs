//! Logical functions. `IF` and `IFS` evaluate only the branch they select,
//! so an error in an untaken branch never surfaces.

use crate::engine::{ErrorKind, EvalContext, EvalError, Expr, Result, Value};

use super::{bool_arg, collect_values, value_arg};

pub(super) fn if_(ctx: &mut EvalContext<'_>, args: &[Expr]) -> Result<Value> {
    let branch = if bool_arg(ctx, args, 0)? { 1 } else { 2 };
    value_arg(ctx, args, branch)
}

pub(super) fn ifs(ctx: &mut EvalContext<'_>, args: &[Expr]) -> Result<Value> {
    if args.len() % 2 != 0 {
        return Err(EvalError::new(
            ErrorKind::Arity,
            format!("IFS expects condition/value pairs, got {} arguments", args.len()),
        ));
    }
    for pair in (0..args.len()).step_by(2) {
        if bool_arg(ctx, args, pair)? {
            return value_arg(ctx, args, pair + 1);
        }
    }
    Err(EvalError::new(ErrorKind::NoMatch, "IFS: no condition was true"))
}

/// Non-empty values of every argument as booleans.
fn truth_values(ctx: &mut EvalContext<'_>, args: &[Expr]) -> Result<Vec<bool>> {
    Ok(collect_values(ctx, args)?
        .iter()
        .filter(|v| !v.is_empty())
        .map(Value::is_truthy)
        .collect())
}

pub(super) fn and(ctx: &mut EvalContext<'_>, args: &[Expr]) -> Result<Value> {
    Ok(Value::Bool(truth_values(ctx, args)?.into_iter().all(|b| b)))
}

pub(super) fn or(ctx: &mut EvalContext<'_>, args: &[Expr]) -> Result<Value> {
    Ok(Value::Bool(truth_values(ctx, args)?.into_iter().any(|b| b)))
}

pub(super) fn not(ctx: &mut EvalContext<'_>, args: &[Expr]) -> Result<Value> {
    Ok(Value::Bool(!bool_arg(ctx, args, 0)?))
}

pub(super) fn true_(_ctx: &mut EvalContext<'_>, _args: &[Expr]) -> Result<Value> {
    Ok(Value::Bool(true))
}

pub(super) fn false_(_ctx: &mut EvalContext<'_>, _args: &[Expr]) -> Result<Value> {
    Ok(Value::Bool(false))
}

#[cfg(test)]
mod tests {
    use crate::engine::{Computed, ErrorKind, FormulaEngine, Snapshot};

    fn engine() -> FormulaEngine {
        let mut engine = FormulaEngine::new();
        engine.set_snapshot_from(
            Snapshot::from_pairs([("A1", "5"), ("A2", "=1/0"), ("A3", "true")]).unwrap(),
        );
        engine
    }

    fn text(s: &str) -> Computed {
        Computed::Text(s.to_string())
    }

    #[test]
    fn test_if_branches() {
        let engine = engine();
        assert_eq!(engine.evaluate("=IF(1,\"yes\",\"no\")"), text("yes"));
        assert_eq!(engine.evaluate("=IF(0,\"yes\",\"no\")"), text("no"));
        assert_eq!(engine.evaluate("=IF(A1>3, A1*2, 0)"), Computed::Number(10.0));
        assert_eq!(engine.evaluate("=IF(A3, 1, 2)"), Computed::Number(1.0));
        assert_eq!(engine.evaluate("=IF(\"TRUE\", 1, 2)"), Computed::Number(1.0));
        assert_eq!(engine.evaluate("=IF(Z9, 1, 2)"), Computed::Number(2.0));
    }

    #[test]
    fn test_if_is_lazy() {
        let engine = engine();
        assert_eq!(engine.evaluate("=IF(1, 7, A2)"), Computed::Number(7.0));
        assert_eq!(engine.evaluate("=IF(0, UNKNOWNFN(), 3)"), Computed::Number(3.0));
        assert!(engine.evaluate("=IF(0, 7, A2)").is_error());
    }

    #[test]
    fn test_if_requires_three_arguments() {
        let engine = engine();
        assert_eq!(engine.try_evaluate("=IF(1, 2)").unwrap_err().kind, ErrorKind::Arity);
        assert_eq!(engine.try_evaluate("=IF(1, 2, 3, 4)").unwrap_err().kind, ErrorKind::Arity);
    }

    #[test]
    fn test_ifs() {
        let engine = engine();
        assert_eq!(
            engine.evaluate("=IFS(A1>10, \"big\", A1>3, \"medium\", TRUE, \"small\")"),
            text("medium")
        );
        assert_eq!(engine.evaluate("=IFS(1, 1, 1, A2)"), Computed::Number(1.0));
        assert_eq!(engine.try_evaluate("=IFS(0, 1)").unwrap_err().kind, ErrorKind::NoMatch);
        assert_eq!(engine.try_evaluate("=IFS(0, 1, 2)").unwrap_err().kind, ErrorKind::Arity);
    }

    #[test]
    fn test_and_or_not() {
        let engine = engine();
        assert_eq!(engine.evaluate("=AND(1, A1>0, A3)"), text("TRUE"));
        assert_eq!(engine.evaluate("=AND(1, 0)"), text("FALSE"));
        assert_eq!(engine.evaluate("=OR(0, FALSE, A1=5)"), text("TRUE"));
        assert_eq!(engine.evaluate("=OR(0, FALSE())"), text("FALSE"));
        assert_eq!(engine.evaluate("=NOT(TRUE())"), text("FALSE"));
        assert_eq!(engine.evaluate("=NOT(0)"), text("TRUE"));
        assert!(engine.evaluate("=AND(1, A2)").is_error());
    }
}
