//! Formula evaluation.
//!
//! [`FormulaEngine`] is the entry point: it holds the current snapshot and
//! turns formula text into a [`Computed`] result. Evaluation parses the
//! formula into an [`Expr`] tree and reduces it bottom-up, so innermost
//! function calls are resolved before the calls and operators around them.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::sync::Arc;
use tracing::{debug, trace_span};

use super::cell_ref::CellRef;
use super::error::{ERROR_SENTINEL, EvalError, Result};
use super::parser::{BinaryOp, Expr, UnaryOp, parse_formula};
use super::snapshot::{CellInput, Snapshot};
use super::value::{Computed, Operand, Value};

// Each level costs a few KiB of stack in debug builds; 96 fits a 2 MiB
// thread with room left for parsing.
const MAX_EVAL_DEPTH: usize = 96;
const MAX_RANGE_CELLS: usize = 1_000_000;

/// Engine limits.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Deepest evaluation nesting: every sub-expression and every hop into a
    /// referenced formula cell counts one level. Raise it only for threads
    /// with stacks larger than 2 MiB.
    pub max_depth: usize,
    /// Largest range, in cells, that may be expanded.
    pub max_range_cells: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            max_depth: MAX_EVAL_DEPTH,
            max_range_cells: MAX_RANGE_CELLS,
        }
    }
}

/// Evaluates formulas against an immutable snapshot of the sheet.
#[derive(Clone, Debug, Default)]
pub struct FormulaEngine {
    snapshot: Arc<Snapshot>,
    config: EngineConfig,
}

impl FormulaEngine {
    pub fn new() -> FormulaEngine {
        FormulaEngine::default()
    }

    pub fn with_config(config: EngineConfig) -> FormulaEngine {
        FormulaEngine {
            snapshot: Arc::default(),
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Replace the whole view of the sheet.
    pub fn set_snapshot(&mut self, cells: impl IntoIterator<Item = CellInput>) {
        self.set_snapshot_from(Snapshot::from_cells(cells));
    }

    pub fn set_snapshot_from(&mut self, snapshot: Snapshot) {
        self.snapshot = Arc::new(snapshot);
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    /// Evaluate formula text. Text without a leading `=` is returned as is;
    /// any failure comes back as the `#ERROR` string.
    pub fn evaluate(&self, formula: &str) -> Computed {
        match self.try_evaluate(formula) {
            Ok(value) => Computed::from(value),
            Err(err) => {
                debug!(kind = err.kind.as_str(), %err, formula, "formula evaluation failed");
                Computed::Text(ERROR_SENTINEL.to_string())
            }
        }
    }

    /// Evaluate formula text, keeping the error kind.
    pub fn try_evaluate(&self, formula: &str) -> Result<Value> {
        let _span = trace_span!("evaluate", formula).entered();
        let Some(body) = formula.strip_prefix('=') else {
            return Ok(Value::Text(formula.to_string()));
        };
        let mut ctx = EvalContext::new(&self.snapshot, &self.config);
        ctx.eval_formula_body(body)
    }

    /// Computed value of a cell in the current snapshot.
    pub fn evaluate_cell(&self, cell_ref: CellRef) -> Computed {
        let mut ctx = EvalContext::new(&self.snapshot, &self.config);
        match ctx.resolve_cell(cell_ref) {
            Ok(value) => Computed::from(value),
            Err(err) => {
                debug!(kind = err.kind.as_str(), %err, cell = %cell_ref, "cell evaluation failed");
                Computed::Text(ERROR_SENTINEL.to_string())
            }
        }
    }
}

/// State for a single evaluation: the snapshot, limits, the chain of
/// formula cells currently being resolved and the current nesting depth.
pub struct EvalContext<'a> {
    pub(crate) snapshot: &'a Snapshot,
    pub(crate) config: &'a EngineConfig,
    pub(crate) in_flight: Vec<CellRef>,
    pub(crate) depth: usize,
}

impl<'a> EvalContext<'a> {
    pub(crate) fn new(snapshot: &'a Snapshot, config: &'a EngineConfig) -> EvalContext<'a> {
        EvalContext {
            snapshot,
            config,
            in_flight: Vec::new(),
            depth: 0,
        }
    }

    /// Take one nesting level; pair with [`EvalContext::leave`].
    pub(crate) fn enter(&mut self, at: impl std::fmt::Display) -> Result<()> {
        if self.depth >= self.config.max_depth {
            return Err(EvalError::depth_exceeded(format!(
                "evaluation nested deeper than {} levels at {}",
                self.config.max_depth, at
            )));
        }
        self.depth += 1;
        Ok(())
    }

    pub(crate) fn leave(&mut self) {
        self.depth -= 1;
    }

    /// Evaluate the text after a formula's `=`.
    pub(crate) fn eval_formula_body(&mut self, body: &str) -> Result<Value> {
        if body.trim().is_empty() {
            return Ok(Value::Empty);
        }
        let expr = parse_formula(body)?;
        match &expr {
            // A bare range has no scalar value; show its contents instead.
            Expr::Range(range) => Ok(Value::Text(self.resolve_range(range)?.to_list_string())),
            _ => self.eval(&expr),
        }
    }

    /// Evaluate an expression where a single value is expected.
    pub fn eval(&mut self, expr: &Expr) -> Result<Value> {
        self.enter("expression")?;
        let result = self.eval_node(expr);
        self.leave();
        result
    }

    fn eval_node(&mut self, expr: &Expr) -> Result<Value> {
        match expr {
            Expr::Number(n) => Ok(Value::Number(*n)),
            Expr::Text(s) => Ok(Value::Text(s.clone())),
            Expr::Bool(b) => Ok(Value::Bool(*b)),
            Expr::Missing => Ok(Value::Empty),
            Expr::Cell(cell_ref) => self.resolve_cell(*cell_ref),
            Expr::Range(range) => Err(EvalError::type_mismatch(format!(
                "range {}:{} used where a single value is expected",
                range.start, range.end
            ))),
            Expr::Unary { op, expr } => {
                let n = self.eval(expr)?.as_number()?;
                Ok(Value::Number(match op {
                    UnaryOp::Neg => -n,
                    UnaryOp::Plus => n,
                }))
            }
            Expr::Binary { .. } => {
                // Walk the left spine in a loop: `A1+A2+...+An` is n levels
                // deep but needs no recursion on its left side.
                let mut spine = Vec::new();
                let mut node = expr;
                while let Expr::Binary { op, lhs, rhs } = node {
                    spine.push((*op, &**rhs));
                    node = &**lhs;
                }
                let mut acc = self.eval(node)?;
                for (op, rhs) in spine.into_iter().rev() {
                    let rhs = self.eval(rhs)?;
                    acc = eval_binary(op, &acc, &rhs)?;
                }
                Ok(acc)
            }
            Expr::Call { name, args } => crate::builtins::call(self, name, args),
        }
    }

    /// Evaluate a function argument, keeping ranges whole.
    pub fn eval_operand(&mut self, expr: &Expr) -> Result<Operand> {
        match expr {
            Expr::Range(range) => Ok(Operand::Range(self.resolve_range(range)?)),
            other => Ok(Operand::Scalar(self.eval(other)?)),
        }
    }
}

fn eval_binary(op: BinaryOp, lhs: &Value, rhs: &Value) -> Result<Value> {
    let arithmetic = |f: fn(f64, f64) -> f64| -> Result<Value> {
        let n = f(lhs.as_number()?, rhs.as_number()?);
        if n.is_finite() {
            Ok(Value::Number(n))
        } else {
            Err(EvalError::num("arithmetic result is not a finite number"))
        }
    };

    match op {
        BinaryOp::Add => arithmetic(|a, b| a + b),
        BinaryOp::Sub => arithmetic(|a, b| a - b),
        BinaryOp::Mul => arithmetic(|a, b| a * b),
        BinaryOp::Div => {
            if rhs.as_number()? == 0.0 {
                return Err(EvalError::div_by_zero());
            }
            arithmetic(|a, b| a / b)
        }
        BinaryOp::Pow => arithmetic(f64::powf),
        BinaryOp::Concat => Ok(Value::Text(format!("{}{}", lhs.as_text(), rhs.as_text()))),
        BinaryOp::Eq => Ok(Value::Bool(compare_values(lhs, rhs) == Ordering::Equal)),
        BinaryOp::Ne => Ok(Value::Bool(compare_values(lhs, rhs) != Ordering::Equal)),
        BinaryOp::Lt => Ok(Value::Bool(compare_values(lhs, rhs) == Ordering::Less)),
        BinaryOp::Le => Ok(Value::Bool(compare_values(lhs, rhs) != Ordering::Greater)),
        BinaryOp::Gt => Ok(Value::Bool(compare_values(lhs, rhs) == Ordering::Greater)),
        BinaryOp::Ge => Ok(Value::Bool(compare_values(lhs, rhs) != Ordering::Less)),
    }
}

/// Spreadsheet ordering: numbers sort before text, text before booleans;
/// text compares case-insensitively; an empty cell acts as 0, "" or FALSE
/// depending on what it is compared with.
pub(crate) fn compare_values(lhs: &Value, rhs: &Value) -> Ordering {
    fn rank(v: &Value) -> u8 {
        match v {
            Value::Empty | Value::Number(_) => 0,
            Value::Text(_) => 1,
            Value::Bool(_) => 2,
        }
    }

    match (lhs, rhs) {
        (Value::Empty, Value::Empty) => Ordering::Equal,
        (Value::Empty, Value::Text(s)) => {
            if s.is_empty() { Ordering::Equal } else { Ordering::Less }
        }
        (Value::Text(s), Value::Empty) => {
            if s.is_empty() { Ordering::Equal } else { Ordering::Greater }
        }
        (Value::Empty, Value::Bool(b)) => false.cmp(b),
        (Value::Bool(b), Value::Empty) => b.cmp(&false),
        (Value::Number(_) | Value::Empty, Value::Number(_) | Value::Empty) => {
            let a = lhs.numeric().unwrap_or(0.0);
            let b = rhs.numeric().unwrap_or(0.0);
            a.partial_cmp(&b).unwrap_or(Ordering::Equal)
        }
        (Value::Text(a), Value::Text(b)) => a.to_lowercase().cmp(&b.to_lowercase()),
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        _ => rank(lhs).cmp(&rank(rhs)),
    }
}
