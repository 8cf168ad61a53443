//! Local puzzle generation: word-search grids and crossword layouts.
//!
//! Used when building activities without the upstream generator, and as its
//! fallback. Placement is randomized with a bounded number of tries per word;
//! words that do not fit are reported, not retried forever.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::GeneratorConfig;
use crate::domain::{Clue, CrosswordModel, Direction, WordSearchModel};
use crate::grid::{Grid, BLANK, BLOCKED};

const FALLBACK_ALPHABET: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Word-search placement direction.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Placement {
    Horizontal,
    Vertical,
    Diagonal,
}

impl Placement {
    fn step(self) -> (usize, usize) {
        match self {
            Placement::Horizontal => (0, 1),
            Placement::Vertical => (1, 0),
            Placement::Diagonal => (1, 1),
        }
    }
}

impl From<Direction> for Placement {
    fn from(d: Direction) -> Self {
        match d {
            Direction::Across => Placement::Horizontal,
            Direction::Down => Placement::Vertical,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct GeneratedWordSearch {
    pub model: WordSearchModel,
    pub unplaced: Vec<String>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct CrosswordEntry {
    pub clue: String,
    pub answer: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct GeneratedCrossword {
    pub model: CrosswordModel,
    pub unplaced: Vec<String>,
}

/// Letters of a scratch board; `None` is a free cell.
struct Board {
    size: usize,
    cells: Vec<Vec<Option<char>>>,
}

impl Board {
    fn new(size: usize) -> Self {
        Self { size, cells: vec![vec![None; size]; size] }
    }

    fn get(&self, row: usize, col: usize) -> Option<char> {
        self.cells.get(row).and_then(|r| r.get(col)).copied().flatten()
    }

    /// Cell coordinates for `len` letters from (row, col); None if off-board.
    fn path(&self, len: usize, row: usize, col: usize, step: (usize, usize)) -> Option<Vec<(usize, usize)>> {
        let last_row = row + step.0 * len.saturating_sub(1);
        let last_col = col + step.1 * len.saturating_sub(1);
        if len == 0 || last_row >= self.size || last_col >= self.size {
            return None;
        }
        Some((0..len).map(|i| (row + step.0 * i, col + step.1 * i)).collect())
    }

    /// Random start cell from which `len` letters along `step` stay on the board.
    fn random_start<R: Rng + ?Sized>(&self, len: usize, step: (usize, usize), rng: &mut R) -> Option<(usize, usize)> {
        let span = len.checked_sub(1)?;
        let max_row = self.size.checked_sub(1 + step.0 * span)?;
        let max_col = self.size.checked_sub(1 + step.1 * span)?;
        Some((rng.gen_range(0..=max_row), rng.gen_range(0..=max_col)))
    }

    fn place(&mut self, word: &[char], path: &[(usize, usize)]) {
        for (&ch, &(r, c)) in word.iter().zip(path) {
            self.cells[r][c] = Some(ch);
        }
    }

    fn to_grid(&self, mut fill: impl FnMut() -> String) -> Grid {
        let rows = self
            .cells
            .iter()
            .map(|row| row.iter().map(|c| c.map(String::from).unwrap_or_else(&mut fill)).collect())
            .collect();
        Grid::from_rows(rows)
    }
}

/// Upper-case letters with whitespace removed.
fn clean_word(w: &str) -> Vec<char> {
    w.chars().filter(|c| !c.is_whitespace()).flat_map(char::to_uppercase).collect()
}

/// Square side: at least `min`, grows with the word count, fits the longest
/// word, never above `max`.
fn board_side(count: usize, longest: usize, min: usize, max: usize) -> usize {
    let by_count = ((count * 8) as f64).sqrt().ceil() as usize;
    min.max(by_count).max(longest).min(max.max(1))
}

/// Split cleaned words into those that fit a board of side `max` and the
/// (logged) ones that never can.
fn within_cap<T>(words: Vec<(Vec<char>, T)>, max: usize, unplaced: &mut Vec<String>) -> Vec<(Vec<char>, T)> {
    let max = max.max(1);
    let (fit, long): (Vec<_>, Vec<_>) = words.into_iter().partition(|(w, _)| w.len() <= max);
    for (w, _) in long {
        let text: String = w.iter().collect();
        warn!(target: "activity", len = w.len(), max, "Word longer than the largest board; skipped");
        unplaced.push(text);
    }
    fit
}

pub fn generate_word_search<R: Rng + ?Sized>(words: &[String], cfg: &GeneratorConfig, rng: &mut R) -> GeneratedWordSearch {
    let mut unplaced = vec![];
    let cleaned: Vec<(Vec<char>, ())> = words.iter().map(|w| (clean_word(w), ())).filter(|(w, _)| !w.is_empty()).collect();
    let cleaned = within_cap(cleaned, cfg.max_grid_size, &mut unplaced);
    let longest = cleaned.iter().map(|(w, _)| w.len()).max().unwrap_or(0);
    let mut board = Board::new(board_side(cleaned.len(), longest, cfg.min_grid_size, cfg.max_grid_size));

    let directions = if cfg.directions.is_empty() { vec![Placement::Horizontal] } else { cfg.directions.clone() };
    let mut placed = vec![];

    for (word, ()) in cleaned {
        let mut done = false;
        for _ in 0..cfg.max_placement_attempts {
            let dir = directions.choose(&mut *rng).copied().unwrap_or(Placement::Horizontal);
            let Some((row, col)) = board.random_start(word.len(), dir.step(), rng) else { continue };
            let Some(path) = board.path(word.len(), row, col, dir.step()) else { continue };
            let fits = word.iter().zip(&path).all(|(&ch, &(r, c))| board.get(r, c).map_or(true, |x| x == ch));
            if fits {
                board.place(&word, &path);
                done = true;
                break;
            }
        }
        let text: String = word.iter().collect();
        if done {
            placed.push(text);
        } else {
            warn!(target: "activity", word = %text, "Could not place word in word search");
            unplaced.push(text);
        }
    }

    let alphabet: Vec<char> = match cfg.fill_alphabet.chars().collect::<Vec<_>>() {
        a if a.is_empty() => FALLBACK_ALPHABET.chars().collect(),
        a => a,
    };
    let solution = board.to_grid(|| BLANK.to_string());
    let grid = board.to_grid(|| alphabet.choose(&mut *rng).map(|c| c.to_string()).unwrap_or_default());

    debug!(target: "activity", size = board.size, placed = placed.len(), unplaced = unplaced.len(), "Word search generated");
    GeneratedWordSearch { model: WordSearchModel { grid, words: placed, solution }, unplaced }
}

/// Crossword rules for putting `word` on `path`: letters agree at crossings,
/// fresh letters have no side neighbours, and the cells just before and after
/// the word are free.
fn crossword_fits(board: &Board, word: &[char], path: &[(usize, usize)], dir: Direction) -> bool {
    let (first, last) = (path[0], path[path.len() - 1]);
    let (before, after) = match dir {
        Direction::Across => (first.1.checked_sub(1).map(|c| (first.0, c)), (last.0, last.1 + 1)),
        Direction::Down => (first.0.checked_sub(1).map(|r| (r, first.1)), (last.0 + 1, last.1)),
    };
    if before.is_some_and(|(r, c)| board.get(r, c).is_some()) || board.get(after.0, after.1).is_some() {
        return false;
    }

    let mut fresh = 0;
    for (&ch, &(r, c)) in word.iter().zip(path) {
        match board.get(r, c) {
            Some(existing) if existing != ch => return false,
            Some(_) => {}
            None => {
                fresh += 1;
                let side = match dir {
                    Direction::Across => [r.checked_sub(1).map(|r| (r, c)), Some((r + 1, c))],
                    Direction::Down => [c.checked_sub(1).map(|c| (r, c)), Some((r, c + 1))],
                };
                if side.iter().flatten().any(|&(sr, sc)| board.get(sr, sc).is_some()) {
                    return false;
                }
            }
        }
    }
    // A word made only of existing letters would just shadow another word.
    fresh > 0
}

fn numbered_clue(number: usize, word: &[char], entry: &CrosswordEntry, row: usize, col: usize, direction: Direction) -> Clue {
    Clue {
        number: number as u32,
        direction,
        text: entry.clue.trim().to_string(),
        answer: Some(word.iter().collect()),
        row: Some(row),
        col: Some(col),
    }
}

pub fn generate_crossword<R: Rng + ?Sized>(entries: &[CrosswordEntry], cfg: &GeneratorConfig, rng: &mut R) -> GeneratedCrossword {
    let mut unplaced = vec![];
    let words: Vec<(Vec<char>, &CrosswordEntry)> = entries
        .iter()
        .map(|e| (clean_word(&e.answer), e))
        .filter(|(w, _)| !w.is_empty())
        .collect();
    let mut words = within_cap(words, cfg.max_grid_size, &mut unplaced);
    if words.is_empty() {
        return GeneratedCrossword { model: CrosswordModel::default(), unplaced };
    }
    words.sort_by(|a, b| b.0.len().cmp(&a.0.len()));

    let longest = words[0].0.len();
    let mut board = Board::new(board_side(words.len(), longest, cfg.min_grid_size, cfg.max_grid_size));
    let mut clues: Vec<Clue> = vec![];

    let (first, first_entry) = &words[0];
    let row = board.size / 2;
    let col = (board.size - first.len()) / 2;
    if let Some(path) = board.path(first.len(), row, col, Placement::Horizontal.step()) {
        board.place(first, &path);
        clues.push(numbered_clue(clues.len() + 1, first, first_entry, row, col, Direction::Across));
    }

    for (word, entry) in &words[1..] {
        let mut done = false;
        for attempt in 0..cfg.max_placement_attempts {
            let dir = if attempt % 2 == 0 { Direction::Across } else { Direction::Down };
            let step = Placement::from(dir).step();
            let Some((row, col)) = board.random_start(word.len(), step, rng) else { continue };
            let Some(path) = board.path(word.len(), row, col, step) else { continue };
            if crossword_fits(&board, word, &path, dir) {
                board.place(word, &path);
                clues.push(numbered_clue(clues.len() + 1, word, entry, row, col, dir));
                done = true;
                break;
            }
        }
        if !done {
            let text: String = word.iter().collect();
            warn!(target: "activity", answer = %text, "Could not place answer in crossword");
            unplaced.push(text);
        }
    }

    let grid = board.to_grid(|| BLOCKED.to_string());
    let solution = grid.map_cells(BLOCKED, BLANK);
    debug!(target: "activity", size = board.size, placed = clues.len(), unplaced = unplaced.len(), "Crossword generated");
    GeneratedCrossword { model: CrosswordModel { grid, clues, solution }, unplaced }
}
