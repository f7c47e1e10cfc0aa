//! In-flight guards for user-triggered mutations.
//!
//! DESIGN
//! ======
//! A shared `HashSet<String>` of operation keys ("creating:canvas:block",
//! "linking:canvas:block:item", ...). Acquiring a key that is already
//! present fails, so a double-submitted request is rejected instead of
//! racing the first one. Keys are released when the returned token drops,
//! including on early returns and errors.
//!
//! Different operations on the same resource are not rejected but queued:
//! [`InFlight::serialize`] hands out one async lock per key, so two
//! read-modify-write cycles on one block never interleave.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::OwnedMutexGuard;

type Locks = HashMap<String, Arc<tokio::sync::Mutex<()>>>;

#[derive(Clone, Default)]
pub struct InFlight {
    active: Arc<Mutex<HashSet<String>>>,
    locks: Arc<Mutex<Locks>>,
}

impl InFlight {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `key`, or `None` when the same operation is already running.
    #[must_use]
    pub fn try_acquire(&self, key: impl Into<String>) -> Option<InFlightToken> {
        let key = key.into();
        let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        if !active.insert(key.clone()) {
            return None;
        }
        Some(InFlightToken { key, active: Arc::clone(&self.active) })
    }

    #[must_use]
    pub fn is_active(&self, key: &str) -> bool {
        self.active.lock().unwrap_or_else(PoisonError::into_inner).contains(key)
    }

    /// Wait for exclusive use of `key`; released when the guard drops.
    pub async fn serialize(&self, key: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            // Drop locks nobody holds or waits on.
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            Arc::clone(locks.entry(key.to_owned()).or_default())
        };
        lock.lock_owned().await
    }

    #[cfg(test)]
    fn lock_count(&self) -> usize {
        self.locks.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

/// Releases its key on drop.
pub struct InFlightToken {
    key: String,
    active: Arc<Mutex<HashSet<String>>>,
}

impl InFlightToken {
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl Drop for InFlightToken {
    fn drop(&mut self) {
        self.active.lock().unwrap_or_else(PoisonError::into_inner).remove(&self.key);
    }
}

#[cfg(test)]
#[path = "guard_test.rs"]
mod tests;
