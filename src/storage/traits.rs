//! Durable storage trait

use async_trait::async_trait;
use crate::error::StorageError;

/// Trait for durable key-value storage backends
///
/// Modeled after a browser's local storage: string keys, string values,
/// each entry read and written independently. There is no transaction
/// spanning several keys.
#[async_trait]
pub trait DurableStorage: Send + Sync + 'static {
    /// Get a value by key
    ///
    /// Returns None if the key doesn't exist
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Set/overwrite a value
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove a value; removing a missing key is not an error
    async fn remove(&self, key: &str) -> Result<(), StorageError>;

    /// Remove every entry (optional)
    async fn clear(&self) -> Result<(), StorageError> {
        Err(StorageError::Backend("clear not implemented".to_string()))
    }

    /// List all keys (optional)
    async fn keys(&self) -> Result<Vec<String>, StorageError> {
        Err(StorageError::Backend("keys not implemented".to_string()))
    }
}
