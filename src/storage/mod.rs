mod avatar;
mod file;

use log::{ info, warn };
use std::collections::HashMap;
use std::sync::{ Arc, Mutex, MutexGuard };
use thiserror::Error;

pub use self::avatar::{ avatar_key, AvatarStore, DEFAULT_AVATAR };
pub use self::file::FileStore;

pub const CONVERSATION_KEY: &str = "conversacionId";
pub const LEGACY_CONVERSATION_KEY: &str = "conversationId";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Durable string key-value storage. Writes are synchronous and best effort.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, String>> {
        match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!("Storage lock was poisoned; continuing with last known entries");
                poisoned.into_inner()
            }
        }
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries().remove(key);
        Ok(())
    }
}

pub fn create_store(path: Option<&str>) -> Result<Arc<dyn KeyValueStore>, StorageError> {
    match path {
        Some(path) if !path.trim().is_empty() => {
            info!("Durable storage file: {}", path);
            Ok(Arc::new(FileStore::open(path)?))
        }
        _ => {
            info!("Durable storage: in-memory (lost on exit)");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

/// Reads the persisted active conversation, legacy key first.
pub fn load_conversation_id(store: &dyn KeyValueStore) -> Option<i64> {
    let raw = store.get(LEGACY_CONVERSATION_KEY).or_else(|| store.get(CONVERSATION_KEY))?;
    match raw.trim().parse::<i64>() {
        Ok(id) => Some(id),
        Err(_) => {
            warn!("Ignoring unreadable stored conversation id: {:?}", raw);
            None
        }
    }
}

pub fn save_conversation_id(store: &dyn KeyValueStore, id: i64) {
    let value = id.to_string();
    for key in [CONVERSATION_KEY, LEGACY_CONVERSATION_KEY] {
        if let Err(e) = store.set(key, &value) {
            warn!("Could not persist {}: {}", key, e);
        }
    }
}

pub fn clear_conversation_id(store: &dyn KeyValueStore) {
    for key in [CONVERSATION_KEY, LEGACY_CONVERSATION_KEY] {
        if let Err(e) = store.remove(key) {
            warn!("Could not clear {}: {}", key, e);
        }
    }
}
