//! Key-scoped mutual exclusion.
//!
//! Keys hash onto a fixed set of stripes. Two operations on the same key
//! always contend on the same stripe; unrelated keys usually do not.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::{Mutex, MutexGuard};

use crate::error::{StoreError, StoreResult};

const DEFAULT_STRIPES: usize = 64;

/// Striped per-key locks.
#[derive(Debug)]
pub struct KeyLocks {
    stripes: Vec<Mutex<()>>,
}

impl KeyLocks {
    pub fn new() -> Self {
        Self::with_stripes(DEFAULT_STRIPES)
    }

    /// `stripes` is clamped to at least 1.
    pub fn with_stripes(stripes: usize) -> Self {
        Self {
            stripes: (0..stripes.max(1)).map(|_| Mutex::new(())).collect(),
        }
    }

    /// Acquire the lock guarding `key`.
    pub fn lock(&self, key: &str) -> StoreResult<MutexGuard<'_, ()>> {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        let idx = (hasher.finish() % self.stripes.len() as u64) as usize;
        self.stripes[idx]
            .lock()
            .map_err(|e| StoreError::Persistence(format!("lock poisoned: {e}")))
    }

    /// Acquire every stripe, in index order. Used by whole-store operations.
    pub fn lock_all(&self) -> StoreResult<Vec<MutexGuard<'_, ()>>> {
        self.stripes
            .iter()
            .map(|m| {
                m.lock()
                    .map_err(|e| StoreError::Persistence(format!("lock poisoned: {e}")))
            })
            .collect()
    }
}

impl Default for KeyLocks {
    fn default() -> Self {
        Self::new()
    }
}
