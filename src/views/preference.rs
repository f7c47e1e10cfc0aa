//! View preference persistence.
//!
//! DESIGN
//! ======
//! Preferences are one map from a caller-chosen persistence key to a view
//! name. Stores are injected into [`super::switcher::ViewSwitcher`] so tests
//! run against memory while the server uses a JSON file. Every successful
//! `set` is broadcast to subscribers, which is how other open sessions on the
//! same list learn about the change.
//!
//! ERROR HANDLING
//! ==============
//! Unknown view names in the stored map read back as `None`. A corrupt file
//! is logged and treated as empty so one bad write cannot lock users out of
//! their lists.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tokio::sync::{Mutex, broadcast};
use tracing::warn;

use super::ViewType;

const CHANGE_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, thiserror::Error)]
pub enum PreferenceError {
    #[error("preference storage unavailable: {0}")]
    Unavailable(String),
    #[error("preference io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("preference encode error: {0}")]
    Encode(#[from] serde_json::Error),
}

impl crate::error::ErrorCode for PreferenceError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Unavailable(_) => "E_PREFERENCE_UNAVAILABLE",
            Self::Io(_) => "E_PREFERENCE_IO",
            Self::Encode(_) => "E_PREFERENCE_ENCODE",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Io(_) | Self::Unavailable(_))
    }
}

/// Broadcast after a preference is written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreferenceChange {
    pub key: String,
    pub view: ViewType,
}

#[async_trait::async_trait]
pub trait PreferenceStore: Send + Sync {
    async fn get(&self, key: &str) -> Option<ViewType>;

    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be written.
    async fn set(&self, key: &str, view: ViewType) -> Result<(), PreferenceError>;

    fn subscribe(&self) -> broadcast::Receiver<PreferenceChange>;
}

// =============================================================================
// MEMORY STORE
// =============================================================================

pub struct MemoryPreferenceStore {
    views: Mutex<HashMap<String, ViewType>>,
    changes: broadcast::Sender<PreferenceChange>,
}

impl MemoryPreferenceStore {
    #[must_use]
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self { views: Mutex::new(HashMap::new()), changes }
    }
}

impl Default for MemoryPreferenceStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl PreferenceStore for MemoryPreferenceStore {
    async fn get(&self, key: &str) -> Option<ViewType> {
        self.views.lock().await.get(key).copied()
    }

    async fn set(&self, key: &str, view: ViewType) -> Result<(), PreferenceError> {
        self.views.lock().await.insert(key.to_owned(), view);
        // No subscribers is fine.
        let _ = self.changes.send(PreferenceChange { key: key.to_owned(), view });
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<PreferenceChange> {
        self.changes.subscribe()
    }
}

// =============================================================================
// FILE STORE
// =============================================================================

/// JSON-file store: `{"<persistence key>": "<view>", ...}`.
pub struct FilePreferenceStore {
    path: PathBuf,
    cache: Mutex<Option<BTreeMap<String, String>>>,
    changes: broadcast::Sender<PreferenceChange>,
}

impl FilePreferenceStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self { path: path.into(), cache: Mutex::new(None), changes }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> BTreeMap<String, String> {
        let raw = match tokio::fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return BTreeMap::new(),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "failed to read view preferences");
                return BTreeMap::new();
            }
        };
        serde_json::from_slice(&raw).unwrap_or_else(|e| {
            warn!(path = %self.path.display(), error = %e, "view preferences file is corrupt; ignoring");
            BTreeMap::new()
        })
    }

    async fn persist(&self, map: &BTreeMap<String, String>) -> Result<(), PreferenceError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let encoded = serde_json::to_vec_pretty(map)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, encoded).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl PreferenceStore for FilePreferenceStore {
    async fn get(&self, key: &str) -> Option<ViewType> {
        let mut cache = self.cache.lock().await;
        if cache.is_none() {
            *cache = Some(self.load().await);
        }
        cache
            .as_ref()
            .and_then(|map| map.get(key))
            .and_then(|raw| ViewType::from_str(raw))
    }

    async fn set(&self, key: &str, view: ViewType) -> Result<(), PreferenceError> {
        let mut cache = self.cache.lock().await;
        let mut map = match cache.take() {
            Some(map) => map,
            None => self.load().await,
        };
        map.insert(key.to_owned(), view.as_str().to_owned());

        let written = self.persist(&map).await;
        // Keep the in-memory view current even if the disk write failed.
        *cache = Some(map);
        written?;

        let _ = self.changes.send(PreferenceChange { key: key.to_owned(), view });
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<PreferenceChange> {
        self.changes.subscribe()
    }
}

#[cfg(test)]
#[path = "preference_test.rs"]
mod tests;
