//! Application state: in-memory activity store, configuration, and the
//! optional upstream generator client.
//!
//! Raw records are stored as received; normalization happens on read so a
//! fix to the normalizer applies to everything already stored.

use std::{
    collections::{HashMap, VecDeque},
    sync::Arc,
};
use tokio::sync::RwLock;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::backend::ActivityBackend;
use crate::config::{load_activity_config_from_env, ActivityConfig};
use crate::domain::RawActivity;
use crate::seeds::seed_activities;

/// Raw records by id. Inserted records are evicted oldest-first once there
/// are more than `capacity`; seeded records stay.
pub struct ActivityStore {
    by_id: HashMap<String, RawActivity>,
    inserted: VecDeque<String>,
    capacity: usize,
}

impl ActivityStore {
    fn seeded(capacity: usize) -> Self {
        Self { by_id: seed_activities().into_iter().collect(), inserted: VecDeque::new(), capacity }
    }

    fn insert(&mut self, id: String, raw: RawActivity) {
        self.by_id.insert(id.clone(), raw);
        self.inserted.push_back(id);
        while self.inserted.len() > self.capacity.max(1) {
            if let Some(old) = self.inserted.pop_front() {
                self.by_id.remove(&old);
                debug!(target: "activity", id = %old, "Evicted oldest stored activity");
            }
        }
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }
}

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<RwLock<ActivityStore>>,
    pub backend: Option<ActivityBackend>,
    pub config: ActivityConfig,
}

impl AppState {
    /// Build state from env: load config, seed sample activities, init the generator client.
    #[instrument(level = "info", skip_all)]
    pub fn new() -> Self {
        let config = load_activity_config_from_env().unwrap_or_default();

        let backend = ActivityBackend::from_env();
        if let Some(b) = &backend {
            info!(target: "aprende_backend", base_url = %b.base_url, timeout = ?b.timeout, "Upstream generator enabled.");
        } else {
            info!(target: "aprende_backend", "Upstream generator disabled (no ACTIVITY_API_BASE_URL). Using local generation.");
        }

        Self::with_parts(config, backend)
    }

    /// State with explicit parts; seeds the store with the sample activities.
    pub fn with_parts(config: ActivityConfig, backend: Option<ActivityBackend>) -> Self {
        let store = ActivityStore::seeded(config.store.max_activities);
        info!(target: "activity", seeded = store.len(), capacity = store.capacity, "Startup activity inventory");
        Self { store: Arc::new(RwLock::new(store)), backend, config }
    }

    /// Store a raw record under a fresh id.
    #[instrument(level = "debug", skip(self, raw), fields(kind = ?raw.kind))]
    pub async fn insert_activity(&self, raw: RawActivity) -> String {
        let id = Uuid::new_v4().to_string();
        self.store.write().await.insert(id.clone(), raw);
        id
    }

    /// Read-only access to a raw record by id.
    #[instrument(level = "debug", skip(self), fields(%id))]
    pub async fn get_activity(&self, id: &str) -> Option<RawActivity> {
        self.store.read().await.by_id.get(id).cloned()
    }
}
