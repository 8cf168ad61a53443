//! Canonical puzzle grid and the coercion that turns stored grid payloads into it.
//!
//! Stored activities carry grids in two encodings:
//!   - 2-D: `[["A","B"],["C","D"]]`
//!   - compact: `["AB","CD"]` (one string per row)
//!
//! Anything else is treated as "no grid" instead of a partial parse, since a
//! half-decoded grid cannot be rendered cell by cell.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// Marker for a cell that is not part of any word (crossword black square).
pub const BLOCKED: &str = "#";

/// Marker for an empty cell (crossword solutions, generator scratch space).
pub const BLANK: &str = "";

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Grid {
  rows: Vec<Vec<String>>,
}

impl Grid {
  pub fn from_rows(rows: Vec<Vec<String>>) -> Self {
    Self { rows }
  }

  pub fn rows(&self) -> &[Vec<String>] {
    &self.rows
  }

  pub fn height(&self) -> usize {
    self.rows.len()
  }

  /// Column count of the first row; 0 for an empty grid.
  pub fn width(&self) -> usize {
    self.rows.first().map(Vec::len).unwrap_or(0)
  }

  /// True when there is nothing to draw (no rows, or only empty rows).
  pub fn is_empty(&self) -> bool {
    self.rows.iter().all(Vec::is_empty)
  }

  /// Every row has the same column count. An empty grid counts as rectangular.
  pub fn is_rectangular(&self) -> bool {
    let w = self.width();
    self.rows.iter().all(|r| r.len() == w)
  }

  pub fn cell(&self, row: usize, col: usize) -> Option<&str> {
    self.rows.get(row).and_then(|r| r.get(col)).map(String::as_str)
  }

  pub fn is_blocked(&self, row: usize, col: usize) -> bool {
    matches!(self.cell(row, col), Some(BLOCKED))
  }

  /// Copy of the grid with `from` cells replaced by `to`.
  pub fn map_cells(&self, from: &str, to: &str) -> Grid {
    let rows = self
      .rows
      .iter()
      .map(|r| r.iter().map(|c| if c == from { to.to_string() } else { c.clone() }).collect())
      .collect();
    Grid { rows }
  }
}

/// How a raw grid payload was decoded. Kept so callers can log/inspect it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GridEncoding {
  /// Field absent or null.
  Missing,
  /// Already an array of rows.
  Rows,
  /// Array of strings, one per row.
  Compact,
  /// Present but not a recognised encoding; decoded as empty.
  Unsupported,
}

/// Decode a stored grid. Never fails: unknown shapes give an empty grid.
pub fn coerce_grid(raw: Option<&Value>) -> Grid {
  let (grid, encoding) = decode_grid(raw);
  if encoding == GridEncoding::Unsupported {
    debug!(target: "activity", "Unsupported grid encoding; treating as empty");
  }
  grid
}

/// Same as [`coerce_grid`] but also reports which encoding was recognised.
pub fn decode_grid(raw: Option<&Value>) -> (Grid, GridEncoding) {
  let items = match raw {
    None | Some(Value::Null) => return (Grid::default(), GridEncoding::Missing),
    Some(Value::Array(items)) => items,
    Some(_) => return (Grid::default(), GridEncoding::Unsupported),
  };

  if items.iter().all(Value::is_array) {
    let rows = items
      .iter()
      .filter_map(Value::as_array)
      .map(|row| row.iter().map(cell_text).collect())
      .collect();
    return (Grid { rows }, GridEncoding::Rows);
  }

  if items.iter().all(Value::is_string) {
    let rows = items
      .iter()
      .filter_map(Value::as_str)
      .map(|row| row.chars().map(String::from).collect())
      .collect();
    return (Grid { rows }, GridEncoding::Compact);
  }

  (Grid::default(), GridEncoding::Unsupported)
}

fn cell_text(v: &Value) -> String {
  match v {
    Value::String(s) => s.clone(),
    Value::Number(n) => n.to_string(),
    Value::Bool(b) => b.to_string(),
    _ => BLANK.to_string(),
  }
}
