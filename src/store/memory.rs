use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use super::KeyValueStore;
use crate::error::{StorageError, StorageResult};

/// In-process store, used in tests and for throwaway sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently stored.
    pub fn len(&self) -> usize {
        self.values.lock().map(|v| v.len()).unwrap_or(0)
    }

    /// Whether the store holds no keys.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> StorageResult<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.values.lock().map_err(|_| StorageError::Query {
            message: "memory store lock poisoned".to_string(),
        })
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> StorageResult<()> {
        self.lock()?.remove(key);
        Ok(())
    }

    async fn remove_all(&self, keys: &[&str]) -> StorageResult<()> {
        let mut values = self.lock()?;
        for key in keys {
            values.remove(*key);
        }
        Ok(())
    }
}
