//! Reference resolution against the snapshot.
//!
//! A referenced cell holding a formula is evaluated recursively through the
//! same context. The context keeps the chain of cells currently being
//! resolved; meeting one of them again means the sheet has a cycle
//! (e.g. A1 references B1, B1 references A1), which fails immediately
//! instead of recursing until the stack runs out.

use tracing::trace;

use super::cell_ref::CellRef;
use super::error::{ErrorKind, EvalError, Result};
use super::eval::EvalContext;
use super::parser::RangeRef;
use super::value::{RangeValues, Value};

impl EvalContext<'_> {
    /// Value of a single cell. Absent cells are `Empty`.
    pub fn resolve_cell(&mut self, cell_ref: CellRef) -> Result<Value> {
        let Some(raw) = self.snapshot.get(&cell_ref) else {
            return Ok(Value::Empty);
        };
        let Some(formula) = raw.strip_prefix('=') else {
            return Ok(Value::from_literal(raw));
        };

        if self.in_flight.contains(&cell_ref) {
            let mut path: Vec<String> = self.in_flight.iter().map(CellRef::to_string).collect();
            path.push(cell_ref.to_string());
            return Err(EvalError::new(
                ErrorKind::CircularReference,
                format!("cycle through {}", path.join(" -> ")),
            ));
        }
        self.enter(cell_ref)?;

        trace!(cell = %cell_ref, depth = self.depth, "resolving formula cell");
        self.in_flight.push(cell_ref);
        let result = self.eval_formula_body(formula);
        self.in_flight.pop();
        self.leave();
        result
    }

    /// Values of every cell in the rectangle, row-major. Corner order does
    /// not matter: `A3:A1` covers the same cells as `A1:A3`.
    pub fn resolve_range(&mut self, range: &RangeRef) -> Result<RangeValues> {
        let (top_left, bottom_right) = range.normalized();
        let rows = range.rows();
        let cols = range.cols();
        let cell_count = rows.checked_mul(cols).unwrap_or(usize::MAX);
        if cell_count > self.config.max_range_cells {
            return Err(EvalError::new(
                ErrorKind::InvalidReference,
                format!(
                    "range {}:{} has {} cells, limit is {}",
                    range.start, range.end, cell_count, self.config.max_range_cells
                ),
            ));
        }

        let mut values = Vec::with_capacity(cell_count);
        for row in top_left.row..=bottom_right.row {
            for col in top_left.col..=bottom_right.col {
                values.push(self.resolve_cell(CellRef::new(col, row))?);
            }
        }
        Ok(RangeValues { rows, cols, values })
    }
}
