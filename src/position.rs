//! Pane position parsing.
//!
//! A pane's place in a tab's grid is written as `column/row` or
//! `column/row/sub_column`, all 1-based:
//!
//! - `column`: top-level vertical slice of the tab (left to right)
//! - `row`: horizontal slice within that column (top to bottom)
//! - `sub_column`: vertical slice within that row (left to right), default 1
//!
//! # Example
//!
//! ```
//! use termis::position::Coordinate;
//!
//! let pos: Coordinate = "2/1".parse().unwrap();
//! assert_eq!(pos, Coordinate::new(2, 1, 1));
//! assert_eq!(pos.to_string(), "2/1/1");
//! ```

use crate::error::{Result, TermisError};
use std::fmt;
use std::str::FromStr;

/// A pane's `(column, row, sub_column)` position within a tab.
///
/// Ordering is lexicographic: column first, then row, then sub_column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Coordinate {
    /// Top-level column, 1-based.
    pub column: u32,
    /// Row within the column, 1-based.
    pub row: u32,
    /// Sub-column within the row, 1-based.
    pub sub_column: u32,
}

impl Coordinate {
    /// The tab's first pane.
    pub const ORIGIN: Coordinate = Coordinate::new(1, 1, 1);

    pub const fn new(column: u32, row: u32, sub_column: u32) -> Self {
        Self {
            column,
            row,
            sub_column,
        }
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.column, self.row, self.sub_column)
    }
}

impl FromStr for Coordinate {
    type Err = TermisError;

    fn from_str(s: &str) -> Result<Self> {
        parse_position(s)
    }
}

/// Parse a position string into a [`Coordinate`].
///
/// Accepts two or three `/`-separated positive integers. Whitespace around
/// the string and around each segment is ignored.
///
/// # Errors
///
/// Returns [`TermisError::InvalidPositionFormat`] on a wrong segment count or
/// any segment that is not a positive integer.
///
/// # Examples
///
/// ```
/// use termis::position::{parse_position, Coordinate};
///
/// assert_eq!(parse_position("1/1/1").unwrap(), Coordinate::new(1, 1, 1));
/// assert_eq!(parse_position(" 1/2 ").unwrap(), Coordinate::new(1, 2, 1));
/// assert!(parse_position("1").is_err());
/// ```
pub fn parse_position(s: &str) -> Result<Coordinate> {
    let invalid = || TermisError::InvalidPositionFormat(s.to_string());

    let parts = s
        .trim()
        .split('/')
        .map(|part| match part.trim().parse::<u32>() {
            Ok(n) if n > 0 => Ok(n),
            _ => Err(invalid()),
        })
        .collect::<Result<Vec<u32>>>()?;

    match parts[..] {
        [column, row] => Ok(Coordinate::new(column, row, 1)),
        [column, row, sub_column] => Ok(Coordinate::new(column, row, sub_column)),
        _ => Err(invalid()),
    }
}
