//! Formula evaluation engine API.
//!
//! - [`CellRef`], [`column_number_to_letters`], [`letters_to_column_number`] - address codec
//! - [`Snapshot`], [`CellInput`] - immutable view of the sheet's raw cell contents
//! - [`split_args`] - split a call's argument text on top-level commas
//! - [`parse_formula`], [`Expr`] - formula text to expression tree
//! - [`FormulaEngine`] - evaluate formulas against a snapshot
//! - [`format_value`], [`format_number`] - render values for display

mod args;
mod cell_ref;
mod error;
mod eval;
mod format;
mod lexer;
mod parser;
mod resolve;
mod snapshot;
mod value;

pub use args::{split_args, split_top_level};
pub use cell_ref::{CellRef, column_number_to_letters, letters_to_column_number};
pub use error::{ERROR_SENTINEL, ErrorKind, EvalError, Result};
pub use eval::{EngineConfig, EvalContext, FormulaEngine};
pub(crate) use eval::compare_values;
pub use format::{format_number, format_value};
pub use lexer::{Token, TokenKind, tokenize};
pub use parser::{BinaryOp, Expr, RangeRef, UnaryOp, parse_formula};
pub use snapshot::{CellInput, Snapshot};
pub use value::{Computed, Operand, RangeValues, Value, parse_number};

pub use crate::builtins::names as function_names;
