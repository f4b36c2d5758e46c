//! Cell address codec.
//!
//! Converts between spreadsheet-style addresses (e.g. "A1", "C12", "AA100")
//! and column/row coordinates. Column letters use bijective base-26: there is
//! no zero digit, so 26 is "Z" and 27 is "AA".
//!
//! `CellRef` stores zero-indexed coordinates. The free functions
//! [`column_number_to_letters`] and [`letters_to_column_number`] work on the
//! 1-based column numbers the cell store uses.
//!
//! # Examples
//!
//! ```
//! use sheetcalc_engine::engine::CellRef;
//!
//! let cell = CellRef::from_str("B3").unwrap();
//! assert_eq!(cell.col, 1);
//! assert_eq!(cell.row, 2);
//! assert_eq!(cell.to_string(), "B3");
//! ```

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// A reference to a cell by column and row indices (0-indexed).
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct CellRef {
    pub row: usize,
    pub col: usize,
}

/// Convert a 1-based column number to its letters (1 -> A, 26 -> Z, 27 -> AA).
/// Returns None for 0, which has no representation.
pub fn column_number_to_letters(n: usize) -> Option<String> {
    if n == 0 {
        return None;
    }
    let mut letters = Vec::new();
    let mut n = n;
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    letters.reverse();
    Some(String::from_utf8_lossy(&letters).into_owned())
}

/// Convert column letters to a 1-based column number (A -> 1, AA -> 27).
/// Case-insensitive. Returns None for empty input, non-letters or overflow.
pub fn letters_to_column_number(letters: &str) -> Option<usize> {
    if letters.is_empty() {
        return None;
    }
    let mut acc = 0usize;
    for c in letters.bytes() {
        if !c.is_ascii_alphabetic() {
            return None;
        }
        let digit = (c.to_ascii_uppercase() - b'A') as usize + 1;
        acc = acc.checked_mul(26)?.checked_add(digit)?;
    }
    Some(acc)
}

fn a1_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\$?(?<letters>[A-Za-z]+)\$?(?<numbers>[0-9]+)$")
            .expect("A1 reference regex must compile")
    })
}

impl CellRef {
    pub fn new(col: usize, row: usize) -> CellRef {
        CellRef { row, col }
    }

    /// Build a reference from the 1-based row/column pair used by the cell store.
    pub fn from_one_based(row: usize, column: usize) -> Option<CellRef> {
        Some(CellRef::new(column.checked_sub(1)?, row.checked_sub(1)?))
    }

    /// Parse a cell reference from spreadsheet notation (e.g., "A1", "B2", "AA10").
    /// `$` absolute markers are accepted and ignored.
    /// Returns None if the input is invalid.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(name: &str) -> Option<CellRef> {
        Self::parse_a1(name)
    }

    fn parse_a1(name: &str) -> Option<CellRef> {
        let caps = a1_re().captures(name)?;
        let col = letters_to_column_number(&caps["letters"])?.checked_sub(1)?;
        let row = caps["numbers"].parse::<usize>().ok()?.checked_sub(1)?;
        Some(CellRef::new(col, row))
    }

    /// Convert column index to spreadsheet-style letters (0 -> A, 25 -> Z, 26 -> AA).
    pub fn col_to_letters(col: usize) -> String {
        let mut result = String::new();
        let mut n = col as u128 + 1;
        while n > 0 {
            n -= 1;
            result.insert(0, (b'A' + (n % 26) as u8) as char);
            n /= 26;
        }
        result
    }
}

impl std::str::FromStr for CellRef {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_a1(s).ok_or_else(|| format!("Invalid cell reference: {}", s))
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", CellRef::col_to_letters(self.col), self.row + 1)
    }
}
