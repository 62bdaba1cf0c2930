//! Shared key-value store backends.

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;
use tokio::sync::{broadcast, RwLock};
use tracing::debug;

use crate::error::StoreError;

/// Buffered change events per subscriber before lagging.
const EVENT_CAPACITY: usize = 64;

/// Which mutation a change event describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOp {
    Set,
    Delete,
}

/// Change notification emitted after a successful mutation.
#[derive(Debug, Clone)]
pub struct StoreEvent {
    /// The mutated key.
    pub key: String,
    /// Which mutation happened.
    pub op: StoreOp,
}

/// Key-value store shared by every execution context.
///
/// Multi-writer with no locking at the transport level and no atomic
/// compare-and-swap; safety properties of anything built on top (see
/// [`LeaseLock`](crate::LeaseLock)) come from protocols layered above, not
/// from the store itself.
#[async_trait]
pub trait SharedStore: Send + Sync {
    /// Read a value.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Write a value, replacing any previous one.
    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Remove a value. Removing an absent key is not an error.
    async fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// Subscribe to change notifications for mutations made through this
    /// store instance.
    fn subscribe(&self) -> broadcast::Receiver<StoreEvent>;
}

/// In-memory store for tests and single-process deployments.
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
    events: broadcast::Sender<StoreEvent>,
}

impl MemoryStore {
    /// Create a new empty memory store.
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            entries: RwLock::new(HashMap::new()),
            events,
        }
    }

    fn notify(&self, key: &str, op: StoreOp) {
        // No receivers is fine; events are advisory.
        let _ = self.events.send(StoreEvent {
            key: key.to_string(),
            op,
        });
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SharedStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let entries = self.entries.read().await;
        Ok(entries.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.write().await;
        entries.insert(key.to_string(), value.to_string());
        drop(entries);
        self.notify(key, StoreOp::Set);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.write().await;
        let removed = entries.remove(key).is_some();
        drop(entries);
        if removed {
            self.notify(key, StoreOp::Delete);
        }
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }
}

/// File-backed store: one JSON file per key under a root directory.
///
/// Lets separate OS processes on one machine share lease state. Change
/// notifications cover mutations made through this instance only; writes by
/// other processes are observed by reads, not events.
pub struct FileStore {
    root: PathBuf,
    events: broadcast::Sender<StoreEvent>,
}

impl FileStore {
    /// Create a store rooted at the given directory, creating it if needed.
    pub async fn new(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root).await?;
        debug!("FileStore initialized at {:?}", root);

        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Ok(Self { root, events })
    }

    /// File path for a key, with unsafe characters replaced.
    fn key_path(&self, key: &str) -> Result<PathBuf, StoreError> {
        if key.is_empty() {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        let sanitized: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        Ok(self.root.join(format!("{}.json", sanitized)))
    }

    fn notify(&self, key: &str, op: StoreOp) {
        let _ = self.events.send(StoreEvent {
            key: key.to_string(),
            op,
        });
    }
}

#[async_trait]
impl SharedStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.key_path(key)?;
        match fs::read_to_string(&path).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let path = self.key_path(key)?;
        fs::write(&path, value).await?;
        self.notify(key, StoreOp::Set);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let path = self.key_path(key)?;
        match fs::remove_file(&path).await {
            Ok(()) => {
                self.notify(key, StoreOp::Delete);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }
}
