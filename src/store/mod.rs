//! Durable progress storage for collection jobs.
//!
//! The persistence engine itself is an external collaborator: anything that
//! can get and put opaque blobs under a string key (Redis in a typical
//! deployment) can sit behind [`KvStore`]. [`ProgressStore`] layers the
//! per-user key namespacing and the JSON observation-list encoding on top,
//! and is the durability boundary that makes collection jobs resumable.

use crate::collection::state::CollectionState;
use crate::fetch::observation::Observation;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Storage backend failed for key '{key}': {message}")]
    Backend { key: String, message: String },

    #[error("Failed to serialize collection state for user '{0}'")]
    Serialize(String, #[source] serde_json::Error),

    #[error("Failed to deserialize collection state for user '{0}'")]
    Deserialize(String, #[source] serde_json::Error),
}

/// Minimal contract required of the external key-value engine.
///
/// Both operations must be atomic per key; partially written values must
/// never become visible to a reader.
#[async_trait]
pub trait KvStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;
    async fn put(&self, key: &str, value: Vec<u8>) -> Result<(), StoreError>;
}

/// In-process [`KvStore`] used in tests and embedded deployments.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn put(&self, key: &str, value: Vec<u8>) -> Result<(), StoreError> {
        self.entries.write().await.insert(key.to_string(), value);
        Ok(())
    }
}

/// Per-user collection state persisted as one namespaced key-value record.
///
/// The value is a JSON array of [`Observation`] objects in insertion order,
/// the whole state rewritten on every save.
#[derive(Clone)]
pub struct ProgressStore {
    kv: Arc<dyn KvStore>,
}

impl ProgressStore {
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        Self { kv }
    }

    fn key(user: &str) -> String {
        format!("weather:{user}")
    }

    /// Loads the persisted state for `user`, or `None` if nothing was ever
    /// saved. Callers that want resumable semantics treat `None` as an empty
    /// state; the progress query treats it as "unknown user".
    pub async fn load(&self, user: &str) -> Result<Option<CollectionState>, StoreError> {
        let Some(raw) = self.kv.get(&Self::key(user)).await? else {
            return Ok(None);
        };
        let observations: Vec<Observation> = serde_json::from_slice(&raw)
            .map_err(|e| StoreError::Deserialize(user.to_string(), e))?;
        Ok(Some(CollectionState::from_observations(observations)))
    }

    /// Writes the full state for `user`, replacing any previous value.
    pub async fn save(&self, user: &str, state: &CollectionState) -> Result<(), StoreError> {
        let raw = serde_json::to_vec(state.observations())
            .map_err(|e| StoreError::Serialize(user.to_string(), e))?;
        self.kv.put(&Self::key(user), raw).await
    }
}
