//! Application mode store.
//!
//! [`AppState`] holds the current [`AppMode`], hydrates it from a
//! [`ModeStorage`] at startup and writes every change back. Owners subscribe
//! to rebuild their [`ApiClient`](crate::ApiClient) when the mode flips.
//!
//! ```
//! use console_client::state::{AppState, MemoryStorage};
//! use console_client::AppMode;
//! use std::sync::Arc;
//!
//! # tokio_test::block_on(async {
//! let state = AppState::load(Arc::new(MemoryStorage::new())).await;
//! assert_eq!(state.mode(), AppMode::Test);
//!
//! let mut changes = state.subscribe();
//! state.set_mode(AppMode::Prod).await;
//! assert!(changes.has_changed().unwrap());
//! assert_eq!(*changes.borrow_and_update(), AppMode::Prod);
//! # });
//! ```

use crate::error::StorageError;
use crate::types::AppMode;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{watch, Mutex};

/// Storage key holding the mode.
pub const MODE_KEY: &str = "app_mode";

/// Durable string key/value storage.
#[async_trait]
pub trait ModeStorage: Send + Sync {
    /// Value for `key`, `None` when absent.
    async fn load(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write `value` under `key`.
    async fn store(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// Storage kept in memory only.
#[derive(Debug, Default, Clone)]
pub struct MemoryStorage {
    entries: Arc<RwLock<BTreeMap<String, String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage pre-populated with one entry.
    pub fn with_entry(key: &str, value: &str) -> Self {
        let storage = Self::new();
        storage.entries.write().insert(key.to_string(), value.to_string());
        storage
    }

    /// Current value for `key`, bypassing the async interface.
    pub fn get(&self, key: &str) -> Option<String> {
        self.entries.read().get(key).cloned()
    }
}

#[async_trait]
impl ModeStorage for MemoryStorage {
    async fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.get(key))
    }

    async fn store(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.write().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Storage backed by a JSON object file.
///
/// A missing file reads as empty. Writes rewrite the whole file.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileStorage {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> Result<BTreeMap<String, String>, StorageError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(BTreeMap::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl ModeStorage for FileStorage {
    async fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.read_all().await?.remove(key))
    }

    async fn store(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().await;
        let mut entries = self.read_all().await?;
        entries.insert(key.to_string(), value.to_string());
        let json = serde_json::to_vec_pretty(&entries)?;
        tokio::fs::write(&self.path, json).await?;
        Ok(())
    }
}

/// The mode store.
pub struct AppState {
    storage: Arc<dyn ModeStorage>,
    mode: watch::Sender<AppMode>,
}

impl AppState {
    /// Hydrate from `storage`.
    ///
    /// Absent, unreadable or unrecognized values fall back to
    /// [`AppMode::Test`].
    pub async fn load(storage: Arc<dyn ModeStorage>) -> Self {
        let mode = match storage.load(MODE_KEY).await {
            Ok(Some(raw)) => raw.parse::<AppMode>().unwrap_or_else(|e| {
                tracing::warn!("ignoring stored mode: {}", e);
                AppMode::default()
            }),
            Ok(None) => AppMode::default(),
            Err(e) => {
                tracing::warn!("failed to read stored mode: {}", e);
                AppMode::default()
            }
        };
        tracing::debug!(%mode, "app state loaded");

        let (mode, _) = watch::channel(mode);
        AppState { storage, mode }
    }

    pub fn mode(&self) -> AppMode {
        *self.mode.borrow()
    }

    /// Switch mode and persist it.
    ///
    /// Subscribers see the new mode even when persisting fails; the failure
    /// is only logged.
    pub async fn set_mode(&self, mode: AppMode) {
        self.mode.send_replace(mode);
        tracing::info!(%mode, "app mode changed");

        if let Err(e) = self.storage.store(MODE_KEY, mode.as_str()).await {
            tracing::warn!("failed to persist app mode: {}", e);
        }
    }

    /// Receiver notified on every [`set_mode`](Self::set_mode).
    pub fn subscribe(&self) -> watch::Receiver<AppMode> {
        self.mode.subscribe()
    }
}
