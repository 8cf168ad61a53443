//! Activity normalizer: stored payload (any historical shape) -> canonical model.
//!
//! Each canonical field is resolved by an ordered chain of named extraction
//! strategies. The first strategy that yields a non-empty, well-typed value
//! wins; if none does, the field takes its empty default. Nothing here fails:
//! the result always carries a renderable-or-empty model, plus a report of
//! where every field came from and how many entries were thrown away.
//!
//! Accepted shapes:
//!   word search    : words | palabras, grid, solution
//!   crossword      : clues{across,down} | clues[] | pistas[], grid, solution
//!   word connection: connections[] | pairs[] | words[] + definitions[]/concepts[]

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, instrument};

use crate::domain::{
  ActivityKind, ActivityModel, Clue, ConnectionPair, CrosswordModel, Direction, RawActivity,
  WordConnectionModel, WordSearchModel,
};
use crate::grid::{coerce_grid, Grid};

type Payload = Map<String, Value>;

/// Where a canonical field's value came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
  /// The field under its current name.
  Canonical,
  /// An older or localized spelling of the field.
  Legacy,
  /// Computed from another field (e.g. solution copied from grid).
  Derived,
  /// Nothing usable was found; the empty value was used.
  Defaulted,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FieldReport {
  pub field: &'static str,
  pub strategy: &'static str,
  pub provenance: Provenance,
}

/// Best-effort model plus the record of how it was obtained.
#[derive(Clone, Debug, Serialize)]
pub struct Normalized<T> {
  pub model: T,
  pub fields: Vec<FieldReport>,
  /// Entries present in the payload but discarded (non-objects, empty pairs, ...).
  pub dropped: usize,
}

impl<T> Normalized<T> {
  /// True when any field fell back to its default or entries were dropped.
  pub fn is_degraded(&self) -> bool {
    self.dropped > 0 || self.fields.iter().any(|f| f.provenance == Provenance::Defaulted)
  }

  pub fn defaulted(&self) -> Vec<&'static str> {
    self
      .fields
      .iter()
      .filter(|f| f.provenance == Provenance::Defaulted)
      .map(|f| f.field)
      .collect()
  }

  pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Normalized<U> {
    Normalized { model: f(self.model), fields: self.fields, dropped: self.dropped }
  }
}

// ---------------- strategy chain ----------------

struct Found<T> {
  value: T,
  dropped: usize,
}

struct Strategy<T> {
  name: &'static str,
  provenance: Provenance,
  extract: fn(&Payload) -> Option<Found<T>>,
}

/// Accumulates field reports while a model is being assembled.
#[derive(Default)]
struct Resolver {
  fields: Vec<FieldReport>,
  dropped: usize,
}

impl Resolver {
  fn resolve<T>(&mut self, field: &'static str, payload: &Payload, chain: &[Strategy<T>]) -> Option<T> {
    for s in chain {
      if let Some(found) = (s.extract)(payload) {
        self.fields.push(FieldReport { field, strategy: s.name, provenance: s.provenance });
        self.dropped += found.dropped;
        return Some(found.value);
      }
    }
    self.fields.push(FieldReport { field, strategy: "default", provenance: Provenance::Defaulted });
    None
  }

  /// Record a value computed outside the chains (e.g. derived from another field).
  fn note(&mut self, field: &'static str, strategy: &'static str, provenance: Provenance) {
    self.fields.push(FieldReport { field, strategy, provenance });
  }

  fn finish<T>(self, model: T) -> Normalized<T> {
    Normalized { model, fields: self.fields, dropped: self.dropped }
  }
}

// ---------------- field helpers ----------------

fn non_empty_array<'a>(p: &'a Payload, key: &str) -> Option<&'a Vec<Value>> {
  p.get(key).and_then(Value::as_array).filter(|a| !a.is_empty())
}

/// String form of a scalar. Strings are kept verbatim, numbers stringified.
fn scalar_text(v: &Value) -> Option<String> {
  match v {
    Value::String(s) => Some(s.clone()),
    Value::Number(n) => Some(n.to_string()),
    _ => None,
  }
}

/// First key holding a non-empty text value. Empty strings count as absent,
/// so `{ "num": "", "number": 3 }` resolves to the second alias.
fn first_text(obj: &Payload, keys: &[&str]) -> Option<String> {
  keys
    .iter()
    .filter_map(|k| obj.get(*k).and_then(scalar_text))
    .find(|s| !s.is_empty())
}

/// First key holding a positive integer (number or numeric string).
fn first_positive(obj: &Payload, keys: &[&str]) -> Option<u64> {
  keys.iter().find_map(|k| {
    let v = obj.get(*k)?;
    let n = match v {
      Value::Number(n) => n.as_u64().or_else(|| n.as_f64().filter(|f| f.fract() == 0.0 && *f > 0.0).map(|f| f as u64)),
      Value::String(s) => s.trim().parse::<u64>().ok(),
      _ => None,
    };
    n.filter(|n| *n > 0)
  })
}

fn first_index(obj: &Payload, key: &str) -> Option<usize> {
  match obj.get(key)? {
    Value::Number(n) => n.as_u64().map(|n| n as usize),
    Value::String(s) => s.trim().parse::<usize>().ok(),
    _ => None,
  }
}

fn text_list(items: &[Value]) -> Found<Vec<String>> {
  let value: Vec<String> = items.iter().filter_map(scalar_text).collect();
  let dropped = items.len() - value.len();
  Found { value, dropped }
}

fn non_empty<T>(found: Found<Vec<T>>) -> Option<Found<Vec<T>>> {
  if found.value.is_empty() { None } else { Some(found) }
}

// ---------------- grids ----------------

fn grid_field(p: &Payload, key: &str) -> Option<Found<Grid>> {
  let grid = coerce_grid(p.get(key));
  if grid.is_empty() { None } else { Some(Found { value: grid, dropped: 0 }) }
}

const GRID_CHAIN: &[Strategy<Grid>] = &[Strategy {
  name: "grid",
  provenance: Provenance::Canonical,
  extract: |p| grid_field(p, "grid"),
}];

const SOLUTION_CHAIN: &[Strategy<Grid>] = &[Strategy {
  name: "solution",
  provenance: Provenance::Canonical,
  extract: |p| grid_field(p, "solution"),
}];

/// Grid plus solution. Without a usable explicit solution, the solution is a
/// copy of the grid.
fn resolve_grids(r: &mut Resolver, p: &Payload) -> (Grid, Grid) {
  let grid = r.resolve("grid", p, GRID_CHAIN).unwrap_or_default();
  let solution = match SOLUTION_CHAIN.iter().find_map(|s| (s.extract)(p).map(|f| (s, f))) {
    Some((s, found)) => {
      r.note("solution", s.name, s.provenance);
      found.value
    }
    None if !grid.is_empty() => {
      r.note("solution", "grid", Provenance::Derived);
      grid.clone()
    }
    None => {
      r.note("solution", "default", Provenance::Defaulted);
      Grid::default()
    }
  };
  (grid, solution)
}

// ---------------- word search ----------------

const WORDS_CHAIN: &[Strategy<Vec<String>>] = &[
  Strategy {
    name: "words",
    provenance: Provenance::Canonical,
    extract: |p| non_empty(text_list(non_empty_array(p, "words")?)),
  },
  Strategy {
    name: "palabras",
    provenance: Provenance::Legacy,
    extract: |p| non_empty(text_list(non_empty_array(p, "palabras")?)),
  },
];

fn word_search_from(p: &Payload) -> Normalized<WordSearchModel> {
  let mut r = Resolver::default();
  let words = r.resolve("words", p, WORDS_CHAIN).unwrap_or_default();
  let (grid, solution) = resolve_grids(&mut r, p);
  r.finish(WordSearchModel { grid, words, solution })
}

// ---------------- crossword ----------------

/// Key aliases for one clue shape, first listed wins.
struct ClueKeys {
  number: &'static [&'static str],
  direction: &'static [&'static str],
  text: &'static [&'static str],
  answer: &'static [&'static str],
}

const CLUE_KEYS: ClueKeys = ClueKeys {
  number: &["number"],
  direction: &["direction"],
  text: &["clue", "text"],
  answer: &["answer"],
};

const PISTA_KEYS: ClueKeys = ClueKeys {
  number: &["num", "number"],
  direction: &["tipo", "direction"],
  text: &["texto", "clue"],
  answer: &["respuesta", "answer"],
};

/// Parse one clue entry. `forced` overrides whatever direction the entry says;
/// otherwise unknown directions read as across.
fn clue_from(entry: &Value, keys: &ClueKeys, forced: Option<Direction>) -> Option<Clue> {
  let obj = entry.as_object()?;
  let direction = forced
    .or_else(|| first_text(obj, keys.direction).and_then(|d| Direction::parse(&d)))
    .unwrap_or_default();
  Some(Clue {
    number: first_positive(obj, keys.number).and_then(|n| u32::try_from(n).ok()).unwrap_or(0),
    direction,
    text: first_text(obj, keys.text).unwrap_or_default(),
    answer: first_text(obj, keys.answer),
    row: first_index(obj, "row"),
    col: first_index(obj, "col"),
  })
}

fn clue_list(items: &[Value], keys: &ClueKeys, forced: Option<Direction>) -> Found<Vec<Clue>> {
  let value: Vec<Clue> = items.iter().filter_map(|e| clue_from(e, keys, forced)).collect();
  let dropped = items.len() - value.len();
  Found { value, dropped }
}

fn split_clues(p: &Payload) -> Option<Found<Vec<Clue>>> {
  let obj = p.get("clues")?.as_object()?;
  let across = obj.get("across").and_then(Value::as_array);
  let down = obj.get("down").and_then(Value::as_array);
  if across.is_none() && down.is_none() {
    return None;
  }
  let a = clue_list(across.map(Vec::as_slice).unwrap_or(&[]), &CLUE_KEYS, Some(Direction::Across));
  let d = clue_list(down.map(Vec::as_slice).unwrap_or(&[]), &CLUE_KEYS, Some(Direction::Down));
  let mut value = a.value;
  value.extend(d.value);
  non_empty(Found { value, dropped: a.dropped + d.dropped })
}

const CLUES_CHAIN: &[Strategy<Vec<Clue>>] = &[
  Strategy { name: "clues.across/down", provenance: Provenance::Canonical, extract: split_clues },
  Strategy {
    name: "clues",
    provenance: Provenance::Canonical,
    extract: |p| non_empty(clue_list(non_empty_array(p, "clues")?, &CLUE_KEYS, None)),
  },
  Strategy {
    name: "pistas",
    provenance: Provenance::Legacy,
    extract: |p| non_empty(clue_list(non_empty_array(p, "pistas")?, &PISTA_KEYS, None)),
  },
];

fn crossword_from(p: &Payload) -> Normalized<CrosswordModel> {
  let mut r = Resolver::default();
  let clues = r.resolve("clues", p, CLUES_CHAIN).unwrap_or_default();
  let (grid, solution) = resolve_grids(&mut r, p);
  r.finish(CrosswordModel { grid, clues, solution })
}

// ---------------- word connection ----------------

struct PairKeys {
  left: &'static [&'static str],
  right: &'static [&'static str],
  note: &'static [&'static str],
}

/// `connection` is the relation label and is preferred over the raw paired word.
const CONNECTION_KEYS: PairKeys = PairKeys { left: &["word1"], right: &["connection", "word2"], note: &[] };

const PAIR_KEYS: PairKeys = PairKeys {
  left: &["term", "word"],
  right: &["definition", "description", "concept"],
  note: &["relation", "description"],
};

fn pair_from(entry: &Value, keys: &PairKeys) -> Option<ConnectionPair> {
  let obj = entry.as_object()?;
  Some(ConnectionPair {
    left: first_text(obj, keys.left).unwrap_or_default(),
    right: first_text(obj, keys.right).unwrap_or_default(),
    note: first_text(obj, keys.note).unwrap_or_default(),
  })
}

fn pair_list(items: &[Value], keys: &PairKeys) -> Found<Vec<ConnectionPair>> {
  let value: Vec<ConnectionPair> = items.iter().filter_map(|e| pair_from(e, keys)).collect();
  let dropped = items.len() - value.len();
  Found { value, dropped }
}

/// `words[i]` paired with `definitions[i]` (or `concepts[i]`), as the
/// match-the-concept activities store them.
fn parallel_lists(p: &Payload) -> Option<Found<Vec<ConnectionPair>>> {
  let words = non_empty_array(p, "words")?;
  let rights = non_empty_array(p, "definitions").or_else(|| non_empty_array(p, "concepts"))?;
  let value: Vec<ConnectionPair> = words
    .iter()
    .zip(rights.iter())
    .map(|(l, r)| ConnectionPair {
      left: scalar_text(l).unwrap_or_default(),
      right: scalar_text(r).unwrap_or_default(),
      note: String::new(),
    })
    .collect();
  let dropped = words.len().max(rights.len()) - value.len();
  non_empty(Found { value, dropped })
}

const PAIRS_CHAIN: &[Strategy<Vec<ConnectionPair>>] = &[
  Strategy {
    name: "connections",
    provenance: Provenance::Canonical,
    extract: |p| non_empty(pair_list(non_empty_array(p, "connections")?, &CONNECTION_KEYS)),
  },
  Strategy {
    name: "pairs",
    provenance: Provenance::Legacy,
    extract: |p| non_empty(pair_list(non_empty_array(p, "pairs")?, &PAIR_KEYS)),
  },
  Strategy { name: "words+definitions", provenance: Provenance::Legacy, extract: parallel_lists },
];

fn word_connection_from(p: &Payload) -> Normalized<WordConnectionModel> {
  let mut r = Resolver::default();
  let resolved = r.resolve("items", p, PAIRS_CHAIN).unwrap_or_default();
  let total = resolved.len();
  let items: Vec<ConnectionPair> = resolved
    .into_iter()
    .map(|pair| ConnectionPair {
      left: pair.left.trim().to_string(),
      right: pair.right.trim().to_string(),
      note: pair.note.trim().to_string(),
    })
    .filter(|pair| !pair.left.is_empty() && !pair.right.is_empty())
    .collect();
  r.dropped += total - items.len();
  r.finish(WordConnectionModel { items })
}

// ---------------- entry points ----------------

/// Payload as an object. A JSON document stored as a string is unwrapped once.
fn payload_of(data: &Value) -> Payload {
  match data {
    Value::Object(m) => m.clone(),
    Value::String(s) => match serde_json::from_str::<Value>(s) {
      Ok(Value::Object(m)) => m,
      _ => Payload::new(),
    },
    _ => Payload::new(),
  }
}

pub fn normalize_word_search(data: &Value) -> Normalized<WordSearchModel> {
  word_search_from(&payload_of(data))
}

pub fn normalize_crossword(data: &Value) -> Normalized<CrosswordModel> {
  crossword_from(&payload_of(data))
}

pub fn normalize_word_connection(data: &Value) -> Normalized<WordConnectionModel> {
  word_connection_from(&payload_of(data))
}

/// Normalize a stored record according to its kind tag.
#[instrument(level = "debug", skip(record), fields(kind = ?record.kind))]
pub fn normalize(record: &RawActivity) -> Normalized<ActivityModel> {
  let out = match record.kind {
    ActivityKind::WordSearch => normalize_word_search(&record.data).map(ActivityModel::WordSearch),
    ActivityKind::Crossword => normalize_crossword(&record.data).map(ActivityModel::Crossword),
    ActivityKind::WordConnection => normalize_word_connection(&record.data).map(ActivityModel::WordConnection),
  };
  if out.is_degraded() {
    debug!(target: "activity", kind = ?record.kind, defaulted = ?out.defaulted(), dropped = out.dropped, "Normalized with fallbacks");
  }
  out
}
