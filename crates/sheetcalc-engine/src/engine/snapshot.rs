//! Immutable view of every known cell's raw content.
//!
//! A [`Snapshot`] is rebuilt wholesale by the caller before evaluation and
//! never changes afterwards, so it can be shared across threads behind an
//! `Arc` without locking.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::warn;

use super::cell_ref::CellRef;
use super::error::{ErrorKind, EvalError, Result};

/// One cell as supplied by the cell store. `row` and `column` are 1-based.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CellInput {
    pub row: usize,
    pub column: usize,
    pub value: String,
}

impl CellInput {
    pub fn new(row: usize, column: usize, value: impl Into<String>) -> CellInput {
        CellInput {
            row,
            column,
            value: value.into(),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct Snapshot {
    cells: HashMap<CellRef, String>,
}

impl Snapshot {
    /// Build from cell-store records. Records with a zero row or column have
    /// no address and are skipped.
    pub fn from_cells(cells: impl IntoIterator<Item = CellInput>) -> Snapshot {
        let mut map = HashMap::new();
        for cell in cells {
            match CellRef::from_one_based(cell.row, cell.column) {
                Some(cell_ref) => {
                    map.insert(cell_ref, cell.value);
                }
                None => warn!(
                    row = cell.row,
                    column = cell.column,
                    "skipping cell without a valid address"
                ),
            }
        }
        Snapshot { cells: map }
    }

    /// Build from `("A1", raw)` pairs.
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Result<Snapshot> {
        let mut map = HashMap::new();
        for (address, raw) in pairs {
            let cell_ref = CellRef::from_str(address).ok_or_else(|| {
                EvalError::new(
                    ErrorKind::InvalidReference,
                    format!("invalid address {:?}", address),
                )
            })?;
            map.insert(cell_ref, raw.to_string());
        }
        Ok(Snapshot { cells: map })
    }

    pub fn get(&self, cell_ref: &CellRef) -> Option<&str> {
        self.cells.get(cell_ref).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cells_uses_one_based_coordinates() {
        let snapshot = Snapshot::from_cells(vec![
            CellInput::new(1, 1, "10"),
            CellInput::new(12, 3, "=A1"),
        ]);
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.get(&CellRef::from_str("A1").unwrap()), Some("10"));
        assert_eq!(snapshot.get(&CellRef::from_str("C12").unwrap()), Some("=A1"));
    }

    #[test]
    fn test_default_snapshot_is_empty() {
        let snapshot = Snapshot::default();
        assert!(snapshot.is_empty());
        assert_eq!(snapshot.get(&CellRef::new(0, 0)), None);
    }

    #[test]
    fn test_from_cells_skips_zero_coordinates() {
        let snapshot = Snapshot::from_cells(vec![CellInput::new(0, 1, "x"), CellInput::new(1, 0, "y")]);
        assert!(snapshot.is_empty());
    }

    #[test]
    fn test_later_cells_replace_earlier_ones() {
        let snapshot = Snapshot::from_cells(vec![CellInput::new(1, 1, "1"), CellInput::new(1, 1, "2")]);
        assert_eq!(snapshot.get(&CellRef::new(0, 0)), Some("2"));
    }

    #[test]
    fn test_from_pairs_rejects_bad_address() {
        let err = Snapshot::from_pairs([("A1", "1"), ("1A", "2")]).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidReference);
    }
}
