use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use crate::error::{StoreError, StoreResult};
use crate::traits::KvStore;

/// In-memory, HashMap-based substrate.
///
/// Intended for tests and embedding. Values live behind a `RwLock` and are
/// cloned on read/write. The store can be flipped to read-only, in which case
/// every write fails with a persistence error.
pub struct InMemoryKvStore {
    entries: RwLock<HashMap<String, Vec<u8>>>,
    read_only: AtomicBool,
}

impl InMemoryKvStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            read_only: AtomicBool::new(false),
        }
    }

    /// Number of keys currently stored.
    pub fn len(&self) -> usize {
        self.entries.read().map(|m| m.len()).unwrap_or(0)
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reject (or accept again) every write.
    pub fn set_read_only(&self, read_only: bool) {
        self.read_only.store(read_only, Ordering::SeqCst);
    }

    /// Sorted list of all keys.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .entries
            .read()
            .map(|m| m.keys().cloned().collect())
            .unwrap_or_default();
        keys.sort();
        keys
    }

    fn check_writable(&self) -> StoreResult<()> {
        if self.read_only.load(Ordering::SeqCst) {
            return Err(StoreError::Persistence("store is read-only".into()));
        }
        Ok(())
    }
}

impl Default for InMemoryKvStore {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned<E: std::fmt::Display>(e: E) -> StoreError {
    StoreError::Persistence(format!("lock poisoned: {e}"))
}

impl KvStore for InMemoryKvStore {
    fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        let map = self.entries.read().map_err(poisoned)?;
        Ok(map.get(key).cloned())
    }

    fn put(&self, key: &str, value: &[u8]) -> StoreResult<()> {
        self.check_writable()?;
        let mut map = self.entries.write().map_err(poisoned)?;
        map.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &str) -> StoreResult<bool> {
        self.check_writable()?;
        let mut map = self.entries.write().map_err(poisoned)?;
        Ok(map.remove(key).is_some())
    }

    fn scan(&self) -> StoreResult<Vec<(String, Vec<u8>)>> {
        let map = self.entries.read().map_err(poisoned)?;
        Ok(map.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
    }

    fn clear(&self) -> StoreResult<()> {
        self.check_writable()?;
        self.entries.write().map_err(poisoned)?.clear();
        Ok(())
    }
}

impl std::fmt::Debug for InMemoryKvStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryKvStore")
            .field("key_count", &self.len())
            .field("read_only", &self.read_only.load(Ordering::SeqCst))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_get_delete() {
        let store = InMemoryKvStore::new();
        assert!(store.get("a").unwrap().is_none());

        store.put("a", b"one").unwrap();
        assert_eq!(store.get("a").unwrap().as_deref(), Some(&b"one"[..]));

        store.put("a", b"two").unwrap();
        assert_eq!(store.get("a").unwrap().as_deref(), Some(&b"two"[..]));
        assert_eq!(store.len(), 1);

        assert!(store.delete("a").unwrap());
        assert!(!store.delete("a").unwrap());
        assert!(store.is_empty());
    }

    #[test]
    fn scan_and_clear() {
        let store = InMemoryKvStore::new();
        store.put("b", b"2").unwrap();
        store.put("a", b"1").unwrap();
        assert_eq!(store.scan().unwrap().len(), 2);
        assert_eq!(store.keys(), vec!["a".to_string(), "b".to_string()]);

        store.clear().unwrap();
        assert!(store.is_empty());
        store.clear().unwrap();
    }

    #[test]
    fn read_only_rejects_writes_but_allows_reads() {
        let store = InMemoryKvStore::new();
        store.put("a", b"1").unwrap();
        store.set_read_only(true);

        assert!(matches!(store.put("b", b"2"), Err(StoreError::Persistence(_))));
        assert!(matches!(store.delete("a"), Err(StoreError::Persistence(_))));
        assert!(store.get("a").unwrap().is_some());

        store.set_read_only(false);
        store.put("b", b"2").unwrap();
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn debug_format() {
        let store = InMemoryKvStore::new();
        store.put("x", b"x").unwrap();
        let debug = format!("{store:?}");
        assert!(debug.contains("InMemoryKvStore"));
        assert!(debug.contains("key_count"));
    }
}
