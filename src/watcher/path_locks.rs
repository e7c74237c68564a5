/// Per-path mutual exclusion
///
/// Concurrent reprocessing attempts for the same path must serialize so
/// an older result can never overwrite a newer one; distinct paths must
/// not contend at all. The map hands out one lazily-created async mutex
/// per path and reclaims it once no worker holds a handle.
///
/// Callers are expected to pass paths from a single source of truth
/// (the scanner and watcher both deliver absolute paths), so the path
/// itself is the key.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::sync::Mutex as AsyncMutex;

/// Lazily-populated map from path to its serialization lock
#[derive(Debug, Default)]
pub struct PathLocks {
    locks: Mutex<HashMap<PathBuf, Arc<AsyncMutex<()>>>>,
}

impl PathLocks {
    /// Create an empty lock map
    pub fn new() -> Self {
        Self::default()
    }

    /// Get (or create) the lock handle for a path
    pub fn lock_for(&self, path: &Path) -> Arc<AsyncMutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        locks
            .entry(path.to_path_buf())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }

    /// Reclaim the handle for a path if it is idle
    ///
    /// Call after dropping the guard and the handle. When the map holds
    /// the only remaining reference, nobody is waiting and the entry
    /// can go.
    pub fn release(&self, path: &Path) {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(handle) = locks.get(path) {
            if Arc::strong_count(handle) == 1 {
                locks.remove(path);
            }
        }
    }

    /// Number of live lock entries
    pub fn len(&self) -> usize {
        self.locks.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Whether the map currently holds no locks
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
