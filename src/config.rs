//! Loading service configuration (shuffle + generator tuning) from TOML.
//!
//! Every field has a default, so an absent or partial file is fine. See
//! `ActivityConfig` for the expected schema:
//!
//! ```toml
//! [shuffle]
//! max_attempts = 64
//!
//! [store]
//! max_activities = 1000
//!
//! [generator]
//! min_grid_size = 15
//! max_grid_size = 40
//! max_placement_attempts = 100
//! fill_alphabet = "ABCDEFGHIJKLMNÑOPQRSTUVWXYZ"
//! directions = ["horizontal", "vertical", "diagonal"]
//! ```

use serde::Deserialize;
use tracing::{info, error};

use crate::generator::Placement;
use crate::shuffle::DEFAULT_MAX_ATTEMPTS;

#[derive(Clone, Debug, Deserialize, Default)]
pub struct ActivityConfig {
  #[serde(default)]
  pub shuffle: ShuffleConfig,
  #[serde(default)]
  pub generator: GeneratorConfig,
  #[serde(default)]
  pub store: StoreConfig,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
  /// Stored activities kept in memory; the oldest are evicted first.
  /// Sample activities do not count and are never evicted.
  pub max_activities: usize,
}

impl Default for StoreConfig {
  fn default() -> Self {
    Self { max_activities: 1000 }
  }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ShuffleConfig {
  /// Random draws before the deterministic derangement kicks in.
  pub max_attempts: usize,
}

impl Default for ShuffleConfig {
  fn default() -> Self {
    Self { max_attempts: DEFAULT_MAX_ATTEMPTS }
  }
}

/// Knobs for the local word-search / crossword generators.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
  pub min_grid_size: usize,
  /// Upper bound on the board side; longer words are reported as unplaced.
  pub max_grid_size: usize,
  pub max_placement_attempts: usize,
  pub fill_alphabet: String,
  pub directions: Vec<Placement>,
}

impl Default for GeneratorConfig {
  fn default() -> Self {
    Self {
      min_grid_size: 15,
      max_grid_size: 40,
      max_placement_attempts: 100,
      fill_alphabet: "ABCDEFGHIJKLMNÑOPQRSTUVWXYZ".into(),
      directions: vec![Placement::Horizontal, Placement::Vertical],
    }
  }
}

/// Attempt to load `ActivityConfig` from ACTIVITY_CONFIG_PATH. On any parsing/IO error, returns None.
pub fn load_activity_config_from_env() -> Option<ActivityConfig> {
  let path = std::env::var("ACTIVITY_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match parse_config(&s) {
      Ok(cfg) => {
        info!(target: "aprende_backend", %path, "Loaded activity config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "aprende_backend", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "aprende_backend", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}

pub fn parse_config(s: &str) -> Result<ActivityConfig, toml::de::Error> {
  toml::from_str::<ActivityConfig>(s)
}
