//! Service-level errors. The normalizer and shuffles never fail; these cover
//! the upstream generator call and HTTP request handling.

use axum::{http::StatusCode, response::IntoResponse, Json};
use thiserror::Error;

use crate::domain::ActivityKind;
use crate::protocol::ErrorOut;

#[derive(Error, Debug)]
pub enum BackendError {
  #[error("generator request failed: {0}")]
  Transport(#[from] reqwest::Error),
  #[error("generator HTTP {status}: {message}")]
  Status { status: u16, message: String },
  #[error("generator returned invalid JSON: {0}")]
  Decode(#[from] serde_json::Error),
  #[error("generator returned a {kind:?} payload with nothing to render")]
  Unusable { kind: ActivityKind },
}

#[derive(Error, Debug)]
pub enum ApiError {
  #[error("Unknown activity: {0}")]
  NotFound(String),
  #[error("Activity {id} is {actual:?}, expected {expected:?}")]
  WrongKind { id: String, expected: ActivityKind, actual: ActivityKind },
  #[error("Bad request: {0}")]
  BadRequest(String),
  #[error(transparent)]
  Upstream(#[from] BackendError),
}

impl ApiError {
  pub fn status(&self) -> StatusCode {
    match self {
      ApiError::NotFound(_) => StatusCode::NOT_FOUND,
      ApiError::WrongKind { .. } => StatusCode::UNPROCESSABLE_ENTITY,
      ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
      ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> axum::response::Response {
    (self.status(), Json(ErrorOut { message: self.to_string() })).into_response()
  }
}
