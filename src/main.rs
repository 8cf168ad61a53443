//! Aprende · Activity Backend
//!
//! - Axum HTTP API for word-search, crossword and word-connection activities
//! - Tolerant normalization of stored/generated payloads into canonical models
//! - Derangement shuffles and matching exercises
//! - Optional upstream activity generator (via environment variables)
//! - Static SPA fallback (./static/index.html)
//!
//! Important env variables:
//!   PORT                       : u16 (default 3000)
//!   ACTIVITY_API_BASE_URL      : enables the upstream generator if present
//!   ACTIVITY_API_TIMEOUT_SECS  : generator request timeout (default 30)
//!   ACTIVITY_CONFIG_PATH       : path to TOML config (shuffle + generator tuning)
//!   LOG_LEVEL                  : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT                 : "pretty" (default) or "json"

mod telemetry;
mod util;
mod grid;
mod domain;
mod normalize;
mod shuffle;
mod matching;
mod generator;
mod config;
mod error;
mod backend;
mod seeds;
mod state;
mod protocol;
mod logic;
mod routes;

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::{info, instrument};

use crate::routes::build_router;
use crate::state::AppState;

#[instrument(level = "info", skip_all)]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  // Shared application state (activity store, config, generator client).
  let state = Arc::new(AppState::new());

  // Build the HTTP router with routes, CORS and tracing layers.
  let app = build_router(state.clone());

  // Read port from env or default to 3000.
  let addr: SocketAddr = std::env::var("PORT")
    .ok()
    .and_then(|p| p.parse::<u16>().ok())
    .map(|port| SocketAddr::from(([0, 0, 0, 0], port)))
    .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 3000)));

  let listener = TcpListener::bind(addr).await?;
  info!(target: "aprende_backend", %addr, "HTTP server listening");
  axum::serve(listener, app).await?;
  Ok(())
}
