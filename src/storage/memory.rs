//! In-memory durable storage
//!
//! This is primarily for development and testing.
//! Nothing survives the process; use FileStorage or RedisStorage for that.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use super::DurableStorage;
use crate::error::StorageError;

/// In-memory key-value storage
///
/// Clones share the same map, so a test can hand one clone to the session
/// and inspect the other.
#[derive(Default)]
pub struct MemoryStorage {
    entries: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryStorage {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Check whether the store is empty
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl Clone for MemoryStorage {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
        }
    }
}

#[async_trait]
impl DurableStorage for MemoryStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.read().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries
            .write()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries.write().remove(key);
        Ok(())
    }

    async fn clear(&self) -> Result<(), StorageError> {
        self.entries.write().clear();
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>, StorageError> {
        Ok(self.entries.read().keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::assert_ok;

    #[tokio::test]
    async fn test_memory_storage_basic() {
        let storage = MemoryStorage::new();

        assert_ok!(storage.set("username", "alice").await);
        assert_eq!(storage.get("username").await.unwrap(), Some("alice".to_string()));

        // Overwrite
        assert_ok!(storage.set("username", "bob").await);
        assert_eq!(storage.get("username").await.unwrap(), Some("bob".to_string()));

        assert_ok!(storage.remove("username").await);
        assert_eq!(storage.get("username").await.unwrap(), None);

        // Removing again is fine
        assert_ok!(storage.remove("username").await);
    }

    #[tokio::test]
    async fn test_clones_share_entries() {
        let storage = MemoryStorage::new();
        let view = storage.clone();

        storage.set("token", "T1").await.unwrap();
        assert_eq!(view.get("token").await.unwrap(), Some("T1".to_string()));
        assert_eq!(view.len(), 1);

        view.clear().await.unwrap();
        assert!(storage.is_empty());
    }
}
