//! JSON file durable storage
//!
//! All entries live in one JSON object on disk. Every write rewrites the
//! file through a uniquely named temporary sibling and a rename, so a crash
//! leaves either the old or the new contents.
//!
//! Writers are serialized per path within the process: independent handles
//! opened on the same path share one lock. Other processes writing the same
//! file are not coordinated.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use tempfile::NamedTempFile;
use tokio::sync::Mutex;

use super::DurableStorage;
use crate::error::StorageError;

type Entries = BTreeMap<String, String>;

/// The write lock shared by every handle on `path`
fn lock_for(path: &Path) -> Arc<Mutex<()>> {
    static LOCKS: OnceLock<parking_lot::Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>> = OnceLock::new();
    let locks = LOCKS.get_or_init(Default::default);
    Arc::clone(locks.lock().entry(path.to_path_buf()).or_default())
}

/// File-backed key-value storage that survives process restarts
pub struct FileStorage {
    path: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl FileStorage {
    /// Use the given file; it is created on first write
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        let path = path.into();
        let write_lock = lock_for(&path);
        Self { path, write_lock }
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<Entries, StorageError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) if contents.trim().is_empty() => Ok(Entries::new()),
            Ok(contents) => Ok(serde_json::from_str(&contents)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Entries::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, entries: &Entries) -> Result<(), StorageError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        tokio::fs::create_dir_all(&dir).await?;

        let json = serde_json::to_vec_pretty(entries)?;
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || -> Result<(), StorageError> {
            let mut tmp = NamedTempFile::new_in(&dir)?;
            tmp.write_all(&json)?;
            tmp.as_file().sync_all()?;
            tmp.persist(&path).map_err(|e| e.error)?;
            Ok(())
        })
        .await
        .map_err(|e| StorageError::Backend(format!("File write task failed: {}", e)))?
    }

    /// Read-modify-write under the write lock
    async fn update<F>(&self, f: F) -> Result<(), StorageError>
    where
        F: FnOnce(&mut Entries) -> bool + Send,
    {
        let _guard = self.write_lock.lock().await;
        let mut entries = self.load().await?;
        if f(&mut entries) {
            self.save(&entries).await?;
        }
        Ok(())
    }
}

impl Clone for FileStorage {
    fn clone(&self) -> Self {
        Self {
            path: self.path.clone(),
            write_lock: Arc::clone(&self.write_lock),
        }
    }
}

#[async_trait]
impl DurableStorage for FileStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.load().await?.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.update(|entries| {
            entries.insert(key.to_string(), value.to_string());
            true
        })
        .await
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.update(|entries| entries.remove(key).is_some()).await
    }

    async fn clear(&self) -> Result<(), StorageError> {
        self.update(|entries| {
            let changed = !entries.is_empty();
            entries.clear();
            changed
        })
        .await
    }

    async fn keys(&self) -> Result<Vec<String>, StorageError> {
        Ok(self.load().await?.into_keys().collect())
    }
}
