use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Per-key async mutual exclusion.
///
/// Tasks locking the same key run one after another in arrival order; tasks on
/// different keys never wait for each other. Entries are evicted once the last
/// holder or waiter for a key is gone.
#[derive(Debug, Clone, Default)]
pub struct KeyedLocks {
    locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until `key` is free and hold it until the guard is dropped.
    pub async fn lock(&self, key: &str) -> KeyGuard {
        let mutex = Arc::clone(
            self.locks
                .entry(key.to_owned())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .value(),
        );
        let guard = mutex.lock_owned().await;
        KeyGuard {
            locks: Arc::clone(&self.locks),
            key: key.to_owned(),
            guard: Some(guard),
        }
    }

    /// Number of keys currently held or awaited.
    pub fn active_keys(&self) -> usize {
        self.locks.len()
    }
}

/// Holds one key of a [`KeyedLocks`].
#[derive(Debug)]
pub struct KeyGuard {
    locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
    key: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl KeyGuard {
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl Drop for KeyGuard {
    fn drop(&mut self) {
        // Release first so the map holds the only remaining reference when idle.
        self.guard.take();
        self.locks
            .remove_if(&self.key, |_, mutex| Arc::strong_count(mutex) == 1);
    }
}
