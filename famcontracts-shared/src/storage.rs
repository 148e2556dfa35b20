//! Key-value persistence seam. The token lives under a single fixed key.

use std::collections::HashMap;
use std::sync::Mutex;

/// Key under which the bearer token is persisted.
pub const TOKEN_KEY: &str = "token";

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage backend error: {0}")]
    Backend(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("encoding error: {0}")]
    Encoding(String),
}

/// Read/write strings by key, mirroring what a native shell exposes to embedded content.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>, StorageError> {
        self.entries
            .lock()
            .map_err(|_| StorageError::Backend("memory store poisoned".into()))
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.lock()?.remove(key);
        Ok(())
    }
}

/// Empty strings count as "no token".
pub fn read_token(store: &dyn KeyValueStore) -> Result<Option<String>, StorageError> {
    Ok(store.get(TOKEN_KEY)?.filter(|t| !t.trim().is_empty()))
}

pub fn write_token(store: &dyn KeyValueStore, token: &str) -> Result<(), StorageError> {
    store.set(TOKEN_KEY, token)
}

pub fn clear_token(store: &dyn KeyValueStore) -> Result<(), StorageError> {
    store.remove(TOKEN_KEY)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_helpers_use_fixed_key() {
        let store = MemoryStore::new();
        assert_eq!(read_token(&store).unwrap(), None);
        write_token(&store, "t1").unwrap();
        assert_eq!(store.get("token").unwrap().as_deref(), Some("t1"));
        assert_eq!(read_token(&store).unwrap().as_deref(), Some("t1"));
        clear_token(&store).unwrap();
        assert_eq!(read_token(&store).unwrap(), None);
        // removing twice is fine
        clear_token(&store).unwrap();
    }

    #[test]
    fn blank_token_is_absent() {
        let store = MemoryStore::new();
        store.set(TOKEN_KEY, "  ").unwrap();
        assert_eq!(read_token(&store).unwrap(), None);
    }
}
