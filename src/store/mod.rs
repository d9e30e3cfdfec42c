//! Persistence port for client-local state.
//!
//! Credentials and analysis history are stored as string values under fixed
//! keys. Consumers receive a [`KeyValueStore`] rather than touching a
//! database directly, so tests can swap in [`MemoryStore`].

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use async_trait::async_trait;

use crate::error::StorageResult;

/// Key holding the user-supplied API key.
pub const USER_API_KEY: &str = "deepread_user_api_key";
/// Key holding the user's model preference.
pub const USER_MODEL: &str = "deepread_user_model";
/// Key holding the serialized history list.
pub const HISTORY: &str = "deepread_history_v1";

/// String key-value persistence.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Get the value stored under `key`.
    async fn get(&self, key: &str) -> StorageResult<Option<String>>;
    /// Store `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: &str) -> StorageResult<()>;
    /// Remove `key`. Removing an absent key is not an error.
    async fn remove(&self, key: &str) -> StorageResult<()>;

    /// Remove several keys.
    ///
    /// Implementations backed by a transactional store override this so the
    /// keys disappear together.
    async fn remove_all(&self, keys: &[&str]) -> StorageResult<()> {
        for key in keys {
            self.remove(key).await?;
        }
        Ok(())
    }
}
