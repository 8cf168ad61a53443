//! HTTP endpoint handlers. These are thin wrappers that forward to core logic.
//! Each handler is instrumented and logs parameters and basic result info.

use std::sync::Arc;
use axum::{extract::{Path, Query, State}, Json, response::IntoResponse};
use tracing::{info, instrument};

use crate::domain::RawActivity;
use crate::error::ApiError;
use crate::generator::{GeneratedCrossword, GeneratedWordSearch};
use crate::logic::*;
use crate::matching::MatchScore;
use crate::protocol::*;
use crate::state::AppState;
use crate::util::split_word_list;

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse { Json(HealthOut { ok: true }) }

#[instrument(level = "info", skip(body), fields(kind = ?body.kind))]
pub async fn http_post_normalize(Json(body): Json<RawActivity>) -> impl IntoResponse {
  let out = normalize_record(&body);
  info!(target: "activity", kind = ?body.kind, renderable = out.renderable, degraded = out.degraded, "HTTP normalize served");
  Json(out)
}

#[instrument(level = "info", skip(state, body), fields(kind = ?body.kind))]
pub async fn http_post_activity(
  State(state): State<Arc<AppState>>,
  Json(body): Json<RawActivity>,
) -> impl IntoResponse {
  Json(store_activity(&state, body).await)
}

#[instrument(level = "info", skip(state), fields(%id))]
pub async fn http_get_activity(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
) -> Result<Json<ActivityOut>, ApiError> {
  let out = load_activity(&state, &id).await?;
  info!(target: "activity", %id, renderable = out.renderable, "HTTP activity served");
  Ok(Json(out))
}

#[instrument(level = "info", skip(state, body), fields(kind = ?body.kind, pdf_id = %body.pdf_id, fallback = body.fallback))]
pub async fn http_post_generate(
  State(state): State<Arc<AppState>>,
  Json(body): Json<GenerateIn>,
) -> Result<Json<GenerateOut>, ApiError> {
  let (id, origin, activity) = generate_activity(&state, body.kind, &body.pdf_id, body.fallback).await?;
  Ok(Json(GenerateOut { id, origin, activity }))
}

#[instrument(level = "info", skip(state), fields(%id, seed = ?q.seed))]
pub async fn http_get_matching(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
  Query(q): Query<MatchingQuery>,
) -> Result<Json<MatchingOut>, ApiError> {
  let (seed, matching) = matching_for(&state, &id, q.seed).await?;
  Ok(Json(MatchingOut { seed, state: matching }))
}

#[instrument(level = "info", skip(state, body), fields(%id, answers = body.answers.len(), choices = body.choices.len()))]
pub async fn http_post_grade(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
  Json(body): Json<GradeIn>,
) -> Result<Json<MatchScore>, ApiError> {
  let score = match body.seed {
    Some(seed) if !body.choices.is_empty() => {
      let choices: Vec<(usize, String)> = body.choices.into_iter().map(|c| (c.number, c.label)).collect();
      grade_choices(&state, &id, seed, &choices).await?
    }
    None if !body.choices.is_empty() => return Err(ApiError::BadRequest("Label choices need the layout seed".into())),
    _ => grade_matching(&state, &id, &body.answers).await?,
  };
  Ok(Json(score))
}

#[instrument(level = "info", skip(state, body), fields(items = body.items.len(), derange = body.derange))]
pub async fn http_post_shuffle(
  State(state): State<Arc<AppState>>,
  Json(body): Json<ShuffleIn>,
) -> impl IntoResponse {
  Json(shuffle_items(&state.config, &body.items, body.derange))
}

#[instrument(level = "info", skip(state, body), fields(words = body.words.len()))]
pub async fn http_post_word_search(
  State(state): State<Arc<AppState>>,
  Json(body): Json<WordSearchBuildIn>,
) -> Result<Json<GeneratedWordSearch>, ApiError> {
  let mut words = body.words;
  if let Some(text) = &body.text {
    words.extend(split_word_list(text));
  }
  let out = build_word_search(&state.config.generator, &words)?;
  info!(target: "activity", placed = out.model.words.len(), unplaced = out.unplaced.len(), "HTTP word search built");
  Ok(Json(out))
}

#[instrument(level = "info", skip(state, body), fields(entries = body.entries.len()))]
pub async fn http_post_crossword(
  State(state): State<Arc<AppState>>,
  Json(body): Json<CrosswordBuildIn>,
) -> Result<Json<GeneratedCrossword>, ApiError> {
  let out = build_crossword(&state.config.generator, &body.entries)?;
  info!(target: "activity", clues = out.model.clues.len(), unplaced = out.unplaced.len(), "HTTP crossword built");
  Ok(Json(out))
}
