//! Minimal client for the upstream activity generator.
//!
//! The generator reads an uploaded PDF and returns the raw activity payload:
//!   POST {base}/api/v1/activities/generate-{word-search|crossword|word-connection}?pdf_id=...
//!
//! Payloads are returned as loose JSON; shape handling is the normalizer's job.
//! Calls are instrumented and log status, latency and body sizes (not contents).

use std::time::Duration;

use reqwest::header::{CONTENT_TYPE, USER_AGENT};
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, instrument};

use crate::domain::ActivityKind;
use crate::error::BackendError;
use crate::util::trunc_for_log;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Clone)]
pub struct ActivityBackend {
  pub client: reqwest::Client,
  pub base_url: String,
  pub timeout: Duration,
}

impl ActivityBackend {
  /// Construct the client if ACTIVITY_API_BASE_URL is set; otherwise return None.
  pub fn from_env() -> Option<Self> {
    let base_url = std::env::var("ACTIVITY_API_BASE_URL").ok()?;
    let secs = std::env::var("ACTIVITY_API_TIMEOUT_SECS")
      .ok()
      .and_then(|s| s.parse::<u64>().ok())
      .unwrap_or(DEFAULT_TIMEOUT_SECS);
    Self::new(&base_url, Duration::from_secs(secs))
  }

  pub fn new(base_url: &str, timeout: Duration) -> Option<Self> {
    let client = reqwest::Client::builder().timeout(timeout).build().ok()?;
    Some(Self { client, base_url: base_url.trim_end_matches('/').to_string(), timeout })
  }

  pub fn generate_url(&self, kind: ActivityKind) -> String {
    format!("{}/api/v1/activities/generate-{}", self.base_url, kind.slug())
  }

  /// Ask the generator for a fresh activity built from `pdf_id`.
  #[instrument(level = "info", skip(self), fields(kind = ?kind))]
  pub async fn generate(&self, kind: ActivityKind, pdf_id: &str) -> Result<Value, BackendError> {
    let url = self.generate_url(kind);
    let start = std::time::Instant::now();
    let res = self
      .client
      .post(&url)
      .query(&[("pdf_id", pdf_id)])
      .header(USER_AGENT, "aprende-backend/0.1")
      .header(CONTENT_TYPE, "application/json")
      .send()
      .await?;

    let status = res.status();
    let body = res.text().await?;
    info!(target: "aprende_backend", status = status.as_u16(), elapsed = ?start.elapsed(), body_len = body.len(), "Generator responded");

    if !status.is_success() {
      let message = extract_error_message(&body).unwrap_or_else(|| trunc_for_log(&body, 200));
      return Err(BackendError::Status { status: status.as_u16(), message });
    }
    Ok(serde_json::from_str::<Value>(&body)?)
  }
}

/// Pull `message` (or FastAPI-style `detail`) out of an error body.
pub fn extract_error_message(body: &str) -> Option<String> {
  #[derive(Deserialize)]
  struct EBody {
    #[serde(default)] message: Option<String>,
    #[serde(default)] detail: Option<Value>,
  }
  let b = serde_json::from_str::<EBody>(body).ok()?;
  b.message.or_else(|| match b.detail? {
    Value::String(s) => Some(s),
    other => Some(other.to_string()),
  })
}
