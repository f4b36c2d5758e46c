//! sheetcalc_engine - Spreadsheet formula evaluation over a cell snapshot.

pub mod builtins;
pub mod engine;

#[cfg(test)]
mod tests {
    use crate::engine::*;

    fn engine(pairs: &[(&str, &str)]) -> FormulaEngine {
        let mut engine = FormulaEngine::new();
        engine.set_snapshot_from(Snapshot::from_pairs(pairs.iter().copied()).unwrap());
        engine
    }

    #[test]
    fn test_plain_text_is_returned_unchanged() {
        let engine = engine(&[]);
        assert_eq!(engine.evaluate("hello"), Computed::Text("hello".into()));
    }

    #[test]
    fn test_arithmetic_scenario() {
        let engine = engine(&[("A1", "10"), ("A2", "20")]);
        assert_eq!(engine.evaluate("=A1+A2"), Computed::Number(30.0));
        assert_eq!(engine.evaluate("=A1*A2"), Computed::Number(200.0));
        assert_eq!(engine.evaluate("=(A1+A2)/2"), Computed::Number(15.0));
    }

    #[test]
    fn test_range_functions_scenario() {
        let engine = engine(&[("A1", "1"), ("A2", "2"), ("A3", "3")]);
        assert_eq!(engine.evaluate("=SUM(A1:A3)"), Computed::Number(6.0));
        assert_eq!(engine.evaluate("=AVERAGE(A1:A3)"), Computed::Number(2.0));
        assert_eq!(engine.evaluate("=SUM(A3:A1)"), Computed::Number(6.0));
    }

    #[test]
    fn test_nested_reference_scenario() {
        let engine = engine(&[("A1", "5"), ("A2", "=A1*2")]);
        assert_eq!(engine.evaluate("=A2+1"), Computed::Number(11.0));
    }

    #[test]
    fn test_if_scenario() {
        let engine = engine(&[]);
        assert_eq!(engine.evaluate("=IF(1,\"yes\",\"no\")"), Computed::Text("yes".into()));
        assert_eq!(engine.evaluate("=IF(0,\"yes\",\"no\")"), Computed::Text("no".into()));
    }

    #[test]
    fn test_failures_collapse_to_error_sentinel() {
        let engine = engine(&[]);
        assert_eq!(engine.evaluate("=UNKNOWNFN(1)"), Computed::Text(ERROR_SENTINEL.into()));
        assert_eq!(engine.evaluate("=SUM("), Computed::Text(ERROR_SENTINEL.into()));
    }

    #[test]
    fn test_cycle_is_an_error_not_a_hang() {
        let engine = engine(&[("A1", "=B1"), ("B1", "=A1")]);
        assert!(engine.evaluate("=A1").is_error());
        assert_eq!(
            engine.try_evaluate("=B1+1").unwrap_err().kind,
            ErrorKind::CircularReference
        );
    }

    #[test]
    fn test_untaken_branch_may_reference_broken_cell() {
        let engine = engine(&[("A1", "=1/0"), ("A2", "=A2")]);
        assert_eq!(engine.evaluate("=IF(TRUE, 1, A1)"), Computed::Number(1.0));
        assert_eq!(engine.evaluate("=IF(FALSE, A2, 2)"), Computed::Number(2.0));
    }

    #[test]
    fn test_same_snapshot_gives_same_results() {
        let engine = engine(&[("A1", "4"), ("B1", "=SQRT(A1)"), ("C1", "=B1&\"!\"")]);
        for formula in ["=B1*10", "=C1", "=MAX(A1:B1)", "=VLOOKUP(4, A1:C1, 3, FALSE)"] {
            assert_eq!(engine.evaluate(formula), engine.evaluate(formula));
        }
        assert_eq!(engine.evaluate("=C1"), Computed::Text("2!".into()));
    }

    #[test]
    fn test_snapshot_replacement() {
        let mut engine = FormulaEngine::new();
        engine.set_snapshot(vec![CellInput::new(1, 1, "2"), CellInput::new(2, 1, "=A1^3")]);
        assert_eq!(engine.evaluate("=A2"), Computed::Number(8.0));

        engine.set_snapshot(vec![CellInput::new(1, 1, "3")]);
        assert_eq!(engine.evaluate("=A1+A2"), Computed::Number(3.0));
    }

    #[test]
    fn test_function_names_cover_categories() {
        let names: Vec<_> = function_names().collect();
        for name in ["SUM", "ROUND", "IF", "CONCATENATE", "DATE", "VLOOKUP", "PMT"] {
            assert!(names.contains(&name), "{}", name);
        }
    }
}
