//! Domain models: activity kinds, the raw stored record, and the canonical
//! render-ready models the normalizer produces.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::grid::Grid;

/// Which puzzle an activity record holds.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
  #[serde(alias = "WORD_SEARCH", alias = "word-search")]
  WordSearch,
  #[serde(alias = "CROSSWORD")]
  Crossword,
  #[serde(alias = "WORD_CONNECTION", alias = "word-connection")]
  WordConnection,
}

impl ActivityKind {
  /// Path segment used by the upstream generator (`generate-word-search`, ...).
  pub fn slug(self) -> &'static str {
    match self {
      ActivityKind::WordSearch => "word-search",
      ActivityKind::Crossword => "crossword",
      ActivityKind::WordConnection => "word-connection",
    }
  }
}

/// Raw record as delivered by the document store: a kind tag plus a payload of
/// unknown shape, kept as loose JSON.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RawActivity {
  #[serde(rename = "type")]
  pub kind: ActivityKind,
  #[serde(default)]
  pub data: Value,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
  #[default]
  Across,
  Down,
}

impl Direction {
  /// Lenient parse used for stored clues ("across", "Horizontal", "v", ...).
  pub fn parse(s: &str) -> Option<Self> {
    match s.trim().to_lowercase().as_str() {
      "across" | "horizontal" | "h" | "a" => Some(Direction::Across),
      "down" | "vertical" | "v" | "d" => Some(Direction::Down),
      _ => None,
    }
  }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Clue {
  pub number: u32,
  pub direction: Direction,
  #[serde(rename = "clue")]
  pub text: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub answer: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub row: Option<usize>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub col: Option<usize>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct WordSearchModel {
  pub grid: Grid,
  pub words: Vec<String>,
  pub solution: Grid,
}

impl WordSearchModel {
  pub fn is_renderable(&self) -> bool {
    !self.grid.is_empty() && !self.words.is_empty()
  }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct CrosswordModel {
  pub grid: Grid,
  pub clues: Vec<Clue>,
  pub solution: Grid,
}

/// Something off about a crossword that does not stop it from rendering.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(tag = "issue", rename_all = "snake_case")]
pub enum CrosswordIssue {
  DuplicateNumber { number: u32, direction: Direction },
  StartsOnBlockedCell { number: u32, direction: Direction },
  StartsOutsideGrid { number: u32, direction: Direction },
  ZeroNumber { index: usize },
  RaggedGrid,
}

impl CrosswordModel {
  pub fn is_renderable(&self) -> bool {
    !self.grid.is_empty()
  }

  /// Check the soft invariants: rows of equal width, clue numbers unique per
  /// direction and clue starts on an open cell. Reports instead of failing.
  pub fn inspect(&self) -> Vec<CrosswordIssue> {
    let mut issues = vec![];
    if !self.grid.is_rectangular() {
      issues.push(CrosswordIssue::RaggedGrid);
    }
    let mut seen: Vec<(u32, Direction)> = vec![];
    for (index, c) in self.clues.iter().enumerate() {
      if c.number == 0 {
        issues.push(CrosswordIssue::ZeroNumber { index });
      } else if seen.contains(&(c.number, c.direction)) {
        issues.push(CrosswordIssue::DuplicateNumber { number: c.number, direction: c.direction });
      } else {
        seen.push((c.number, c.direction));
      }

      if let (Some(r), Some(col)) = (c.row, c.col) {
        match self.grid.cell(r, col) {
          None => issues.push(CrosswordIssue::StartsOutsideGrid { number: c.number, direction: c.direction }),
          Some(_) if self.grid.is_blocked(r, col) => {
            issues.push(CrosswordIssue::StartsOnBlockedCell { number: c.number, direction: c.direction })
          }
          Some(_) => {}
        }
      }
    }
    issues
  }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConnectionPair {
  pub left: String,
  pub right: String,
  #[serde(default, skip_serializing_if = "String::is_empty")]
  pub note: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct WordConnectionModel {
  pub items: Vec<ConnectionPair>,
}

impl WordConnectionModel {
  pub fn is_renderable(&self) -> bool {
    !self.items.is_empty()
  }
}

/// Canonical model of any activity kind.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ActivityModel {
  WordSearch(WordSearchModel),
  Crossword(CrosswordModel),
  WordConnection(WordConnectionModel),
}

impl ActivityModel {
  pub fn kind(&self) -> ActivityKind {
    match self {
      ActivityModel::WordSearch(_) => ActivityKind::WordSearch,
      ActivityModel::Crossword(_) => ActivityKind::Crossword,
      ActivityModel::WordConnection(_) => ActivityKind::WordConnection,
    }
  }

  /// False when the renderer has to show a "no data" state instead.
  pub fn is_renderable(&self) -> bool {
    match self {
      ActivityModel::WordSearch(m) => m.is_renderable(),
      ActivityModel::Crossword(m) => m.is_renderable(),
      ActivityModel::WordConnection(m) => m.is_renderable(),
    }
  }
}
