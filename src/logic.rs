//! Core behaviors behind the HTTP handlers.
//!
//! This includes:
//!   - Normalizing raw records (ad hoc or stored)
//!   - Generating activities (upstream generator first, local fallback)
//!   - Building and grading matching exercises
//!   - Shuffles and local puzzle builds

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::json;
use tracing::{error, info, instrument, warn};

use crate::config::{ActivityConfig, GeneratorConfig};
use crate::domain::{ActivityKind, RawActivity, WordConnectionModel};
use crate::backend::ActivityBackend;
use crate::error::{ApiError, BackendError};
use crate::generator::{generate_crossword, generate_word_search, CrosswordEntry, GeneratedCrossword, GeneratedWordSearch};
use crate::matching::{grade_texts, MatchScore, MatchingState, TextMatch};
use crate::normalize::{normalize, normalize_word_connection};
use crate::protocol::{to_out, ActivityOut, ShuffleOut, StoredOut};
use crate::seeds::seed_vocabulary;
use crate::shuffle::{derange, shuffled};
use crate::state::AppState;

pub fn normalize_record(raw: &RawActivity) -> ActivityOut {
  to_out(normalize(raw))
}

#[instrument(level = "info", skip(state, raw), fields(kind = ?raw.kind))]
pub async fn store_activity(state: &AppState, raw: RawActivity) -> StoredOut {
  let activity = normalize_record(&raw);
  let id = state.insert_activity(raw).await;
  info!(target: "activity", %id, renderable = activity.renderable, degraded = activity.degraded, "Activity stored");
  StoredOut { id, activity }
}

#[instrument(level = "info", skip(state), fields(%id))]
pub async fn load_activity(state: &AppState, id: &str) -> Result<ActivityOut, ApiError> {
  let raw = state.get_activity(id).await.ok_or_else(|| ApiError::NotFound(id.to_string()))?;
  Ok(normalize_record(&raw))
}

/// Selection policy:
/// Ask the upstream generator when configured. On failure (or without it),
/// build the activity locally from the seed vocabulary unless `fallback` is off.
#[instrument(level = "info", skip(state), fields(kind = ?kind, %pdf_id))]
pub async fn generate_activity(
  state: &AppState,
  kind: ActivityKind,
  pdf_id: &str,
  fallback: bool,
) -> Result<(String, &'static str, ActivityOut), ApiError> {
  let mut remote = None;
  if let Some(backend) = &state.backend {
    match remote_activity(backend, kind, pdf_id).await {
      Ok(raw) => remote = Some(raw),
      Err(e) if !fallback => return Err(e.into()),
      Err(e) => error!(target: "activity", kind = ?kind, %pdf_id, error = %e, "Upstream generation failed; using local fallback"),
    }
  } else if !fallback {
    return Err(ApiError::BadRequest("Upstream generator is not configured".into()));
  } else {
    warn!(target: "activity", kind = ?kind, "ACTIVITY_API_BASE_URL not set; generating locally");
  }

  let (raw, origin) = match remote {
    Some(raw) => (raw, "generator"),
    None => (local_raw_activity(kind, &state.config.generator), "local_fallback"),
  };
  let stored = store_activity(state, raw).await;
  info!(target: "activity", id = %stored.id, %origin, "Activity generated");
  Ok((stored.id, origin, stored.activity))
}

/// Upstream payload, accepted only if it normalizes to something renderable.
async fn remote_activity(backend: &ActivityBackend, kind: ActivityKind, pdf_id: &str) -> Result<RawActivity, BackendError> {
  let raw = RawActivity { kind, data: backend.generate(kind, pdf_id).await? };
  if !normalize(&raw).model.is_renderable() {
    return Err(BackendError::Unusable { kind });
  }
  Ok(raw)
}

/// Raw record built from the seed vocabulary, in the same shapes the upstream
/// generator returns.
pub fn local_raw_activity(kind: ActivityKind, cfg: &GeneratorConfig) -> RawActivity {
  let vocab = seed_vocabulary();
  let mut rng = rand::thread_rng();
  let data = match kind {
    ActivityKind::WordSearch => {
      let words: Vec<String> = vocab.iter().map(|e| e.answer.clone()).collect();
      let out = generate_word_search(&words, cfg, &mut rng);
      serde_json::to_value(&out.model).unwrap_or_default()
    }
    ActivityKind::Crossword => {
      let out = generate_crossword(&vocab, cfg, &mut rng);
      serde_json::to_value(&out.model).unwrap_or_default()
    }
    ActivityKind::WordConnection => json!({
      "pairs": vocab
        .iter()
        .map(|e| json!({ "term": e.answer, "definition": e.clue }))
        .collect::<Vec<_>>(),
    }),
  };
  RawActivity { kind, data }
}

/// Word-connection model of a stored activity, or None if the record has no
/// payload yet.
async fn connection_model(state: &AppState, id: &str) -> Result<Option<WordConnectionModel>, ApiError> {
  let raw = state.get_activity(id).await.ok_or_else(|| ApiError::NotFound(id.to_string()))?;
  if raw.kind != ActivityKind::WordConnection {
    return Err(ApiError::WrongKind { id: id.to_string(), expected: ActivityKind::WordConnection, actual: raw.kind });
  }
  if raw.data.is_null() {
    return Ok(None);
  }
  Ok(Some(normalize_word_connection(&raw.data).model))
}

/// Matching layout for a word-connection activity. The same seed always gives
/// the same layout, so label choices can be graded later.
#[instrument(level = "info", skip(state), fields(%id, ?seed))]
pub async fn matching_for(state: &AppState, id: &str, seed: Option<u64>) -> Result<(u64, MatchingState), ApiError> {
  let model = connection_model(state, id).await?;
  let seed = seed.unwrap_or_else(|| rand::thread_rng().gen());
  let mut rng = StdRng::seed_from_u64(seed);
  Ok((seed, MatchingState::from_model(model.as_ref(), state.config.shuffle.max_attempts, &mut rng)))
}

#[instrument(level = "info", skip(state, choices), fields(%id, choices = choices.len()))]
pub async fn grade_choices(state: &AppState, id: &str, seed: u64, choices: &[(usize, String)]) -> Result<MatchScore, ApiError> {
  let score = match matching_for(state, id, Some(seed)).await?.1 {
    MatchingState::Ready { exercise } => exercise.grade(choices),
    _ => MatchScore { correct: 0, total: 0, wrong: vec![] },
  };
  info!(target: "activity", %id, correct = score.correct, total = score.total, "Matching choices graded");
  Ok(score)
}

#[instrument(level = "info", skip(state, answers), fields(%id, answers = answers.len()))]
pub async fn grade_matching(state: &AppState, id: &str, answers: &[TextMatch]) -> Result<MatchScore, ApiError> {
  let model = connection_model(state, id).await?.unwrap_or_default();
  let score = grade_texts(&model, answers);
  info!(target: "activity", %id, correct = score.correct, total = score.total, "Matching graded");
  Ok(score)
}

pub fn shuffle_items(cfg: &ActivityConfig, items: &[String], want_derangement: bool) -> ShuffleOut {
  let mut rng = rand::thread_rng();
  if want_derangement {
    let d = derange(items, cfg.shuffle.max_attempts, &mut rng);
    ShuffleOut { items: d.items, method: Some(d.method) }
  } else {
    ShuffleOut { items: shuffled(items, &mut rng), method: None }
  }
}

pub fn build_word_search(cfg: &GeneratorConfig, words: &[String]) -> Result<GeneratedWordSearch, ApiError> {
  if words.is_empty() {
    return Err(ApiError::BadRequest("No words given".into()));
  }
  Ok(generate_word_search(words, cfg, &mut rand::thread_rng()))
}

pub fn build_crossword(cfg: &GeneratorConfig, entries: &[CrosswordEntry]) -> Result<GeneratedCrossword, ApiError> {
  if entries.iter().all(|e| e.answer.trim().is_empty()) {
    return Err(ApiError::BadRequest("No answers given".into()));
  }
  Ok(generate_crossword(entries, cfg, &mut rand::thread_rng()))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::ActivityConfig;

  fn state() -> AppState {
    AppState::with_parts(ActivityConfig::default(), None)
  }

  #[test]
  fn local_fallbacks_normalize_cleanly() {
    let cfg = GeneratorConfig::default();
    for kind in [ActivityKind::WordSearch, ActivityKind::Crossword, ActivityKind::WordConnection] {
      let raw = local_raw_activity(kind, &cfg);
      let out = normalize_record(&raw);
      assert_eq!(out.model.kind(), kind);
      assert!(out.renderable, "{kind:?} not renderable");
      assert!(!out.degraded, "{kind:?} degraded: {:?}", out.fields);
    }
  }

  #[tokio::test]
  async fn seeded_activities_are_loadable() {
    let s = state();
    let out = load_activity(&s, "sample-crossword").await.unwrap();
    assert!(out.renderable);
    assert!(out.issues.is_empty());
    assert!(matches!(load_activity(&s, "nope").await, Err(ApiError::NotFound(_))));
  }

  #[tokio::test]
  async fn generation_without_backend_uses_local_fallback() {
    let s = state();
    let (id, origin, out) = generate_activity(&s, ActivityKind::WordConnection, "pdf1", true).await.unwrap();
    assert_eq!(origin, "local_fallback");
    assert!(out.renderable);
    assert!(s.get_activity(&id).await.is_some());
  }

  /// Upstream stand-in answering `{}` on every route.
  async fn empty_upstream() -> ActivityBackend {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = axum::Router::new().fallback(|| async { axum::Json(json!({})) });
    tokio::spawn(async move { axum::serve(listener, app).await });
    ActivityBackend::new(&format!("http://{addr}"), std::time::Duration::from_secs(5)).unwrap()
  }

  #[tokio::test]
  async fn empty_upstream_payload_falls_back_locally() {
    let s = AppState::with_parts(ActivityConfig::default(), Some(empty_upstream().await));
    let (_, origin, out) = generate_activity(&s, ActivityKind::WordSearch, "pdf1", true).await.unwrap();
    assert_eq!(origin, "local_fallback");
    assert!(out.renderable);

    let err = generate_activity(&s, ActivityKind::Crossword, "pdf1", false).await.unwrap_err();
    assert!(matches!(err, ApiError::Upstream(BackendError::Unusable { kind: ActivityKind::Crossword })));
    assert_eq!(err.status(), axum::http::StatusCode::BAD_GATEWAY);
  }

  #[tokio::test]
  async fn generation_without_fallback_surfaces_errors() {
    let s = state();
    let res = generate_activity(&s, ActivityKind::Crossword, "pdf1", false).await;
    assert!(matches!(res, Err(ApiError::BadRequest(_))));

    // Nothing listens on port 9; the transport error maps to 502.
    let backend = crate::backend::ActivityBackend::new("http://127.0.0.1:9", std::time::Duration::from_secs(2));
    let s = AppState::with_parts(ActivityConfig::default(), backend);
    let err = generate_activity(&s, ActivityKind::Crossword, "pdf1", false).await.unwrap_err();
    assert_eq!(err.status(), axum::http::StatusCode::BAD_GATEWAY);
  }

  #[tokio::test]
  async fn matching_states_cover_awaiting_empty_and_ready() {
    let s = state();
    let pending = s.insert_activity(RawActivity { kind: ActivityKind::WordConnection, data: serde_json::Value::Null }).await;
    let empty = s
      .insert_activity(RawActivity { kind: ActivityKind::WordConnection, data: json!({ "pairs": [{ "term": "" }] }) })
      .await;

    assert!(matches!(matching_for(&s, &pending, None).await, Ok((_, MatchingState::Awaiting))));
    assert!(matches!(matching_for(&s, &empty, None).await, Ok((_, MatchingState::NoValidPairs))));
    match matching_for(&s, "sample-word-connection", None).await {
      Ok((_, MatchingState::Ready { exercise })) => assert_eq!(exercise.terms.len(), 3),
      other => panic!("unexpected {other:?}"),
    }
    assert!(matches!(matching_for(&s, "sample-crossword", None).await, Err(ApiError::WrongKind { .. })));
  }

  #[tokio::test]
  async fn seeded_layout_grades_label_choices() {
    let s = state();
    let (seed, first) = matching_for(&s, "sample-word-connection", Some(42)).await.unwrap();
    let (_, again) = matching_for(&s, "sample-word-connection", Some(seed)).await.unwrap();
    let (MatchingState::Ready { exercise: a }, MatchingState::Ready { exercise: b }) = (first, again) else {
      panic!("sample connection should be ready");
    };
    assert_eq!(a.answer_key, b.answer_key);

    let choices: Vec<(usize, String)> = a.answer_key.into_iter().collect();
    let score = grade_choices(&s, "sample-word-connection", seed, &choices).await.unwrap();
    assert_eq!((score.correct, score.total), (3, 3));
  }

  #[tokio::test]
  async fn grading_against_stored_pairs() {
    let s = state();
    let answers = vec![
      TextMatch { left: "SEO".into(), right: "Optimización en buscadores".into() },
      TextMatch { left: "SEM".into(), right: "Gestión de marca".into() },
    ];
    let score = grade_matching(&s, "sample-word-connection", &answers).await.unwrap();
    assert_eq!((score.correct, score.total), (1, 3));
  }

  #[test]
  fn shuffle_items_reports_method_only_for_derangements() {
    let cfg = ActivityConfig::default();
    let items: Vec<String> = vec!["a".into(), "b".into(), "c".into()];
    let d = shuffle_items(&cfg, &items, true);
    assert!(d.method.is_some());
    assert!(d.items.iter().zip(&items).all(|(x, y)| x != y));
    assert!(shuffle_items(&cfg, &items, false).method.is_none());
  }

  #[test]
  fn builds_reject_empty_input() {
    let cfg = GeneratorConfig::default();
    assert!(matches!(build_word_search(&cfg, &[]), Err(ApiError::BadRequest(_))));
    assert!(build_crossword(&cfg, &[CrosswordEntry { clue: "x".into(), answer: " ".into() }]).is_err());

    let out = build_word_search(&cfg, &["Z".repeat(5000)]).unwrap();
    assert_eq!(out.model.grid.height(), cfg.min_grid_size);
    assert_eq!(out.unplaced.len(), 1);
  }
}
