//! Redis durable storage
//!
//! Keys are stored as `prefix + key` (default prefix: "console:") with plain
//! string values and no TTL, so a session survives until logout.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::sync::Arc;

use super::DurableStorage;
use crate::error::StorageError;

/// Redis-backed key-value storage
///
/// # Example
///
/// ```rust,ignore
/// use console_client::storage::RedisStorage;
///
/// let storage = RedisStorage::from_url("redis://127.0.0.1/").await?;
/// ```
pub struct RedisStorage {
    conn: Arc<ConnectionManager>,
    prefix: String,
}

impl RedisStorage {
    /// Create a new Redis storage with the default prefix
    pub async fn new(client: redis::Client) -> Result<Self, StorageError> {
        let conn = ConnectionManager::new(client).await?;
        Ok(Self::from_connection_manager(conn))
    }

    /// Create a new Redis storage from a connection string
    pub async fn from_url(url: &str) -> Result<Self, StorageError> {
        let client = redis::Client::open(url)
            .map_err(|e| StorageError::Backend(format!("Failed to create Redis client: {}", e)))?;
        Self::new(client).await
    }

    /// Create a new Redis storage from an existing connection manager
    pub fn from_connection_manager(conn: ConnectionManager) -> Self {
        Self {
            conn: Arc::new(conn),
            prefix: "console:".to_string(),
        }
    }

    /// Build with custom prefix
    pub fn with_prefix(mut self, prefix: &str) -> Self {
        self.prefix = prefix.to_string();
        self
    }

    /// Make a storage key
    fn make_key(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }

    async fn prefixed_keys(&self) -> Result<Vec<String>, StorageError> {
        let mut conn = (*self.conn).clone();
        let pattern = format!("{}*", escape_glob(&self.prefix));
        let keys: Vec<String> = redis::cmd("KEYS")
            .arg(&pattern)
            .query_async(&mut conn)
            .await?;
        Ok(keys)
    }
}

/// Escape the characters `KEYS` treats as glob syntax
fn escape_glob(literal: &str) -> String {
    let mut escaped = String::with_capacity(literal.len());
    for c in literal.chars() {
        if matches!(c, '*' | '?' | '[' | ']' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

impl Clone for RedisStorage {
    fn clone(&self) -> Self {
        Self {
            conn: Arc::clone(&self.conn),
            prefix: self.prefix.clone(),
        }
    }
}

#[async_trait]
impl DurableStorage for RedisStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let mut conn = (*self.conn).clone();
        let value: Option<String> = conn.get(self.make_key(key)).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut conn = (*self.conn).clone();
        conn.set::<_, _, ()>(self.make_key(key), value).await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut conn = (*self.conn).clone();
        conn.del::<_, ()>(self.make_key(key)).await?;
        Ok(())
    }

    async fn clear(&self) -> Result<(), StorageError> {
        let keys = self.prefixed_keys().await?;
        if !keys.is_empty() {
            let mut conn = (*self.conn).clone();
            conn.del::<_, ()>(keys).await?;
        }
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>, StorageError> {
        Ok(self
            .prefixed_keys()
            .await?
            .into_iter()
            .filter_map(|k| k.strip_prefix(self.prefix.as_str()).map(str::to_string))
            .collect())
    }
}
