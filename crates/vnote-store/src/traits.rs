use std::sync::Arc;

use crate::error::StoreResult;

/// Durable key-value substrate addressed by canonical key strings.
///
/// Implementations must satisfy these invariants:
/// - `get` of an absent key is `Ok(None)`, not an error.
/// - `put` replaces any previous value atomically per key.
/// - `delete` of an absent key is `Ok(false)`.
/// - Every I/O failure is returned, never silently ignored.
///
/// No transactions across keys are assumed.
pub trait KvStore: Send + Sync {
    /// Point lookup.
    fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>>;

    /// Create or replace the value at `key`.
    fn put(&self, key: &str, value: &[u8]) -> StoreResult<()>;

    /// Remove `key`. Returns `true` if it existed.
    fn delete(&self, key: &str) -> StoreResult<bool>;

    /// Every key/value pair, in no particular order.
    fn scan(&self) -> StoreResult<Vec<(String, Vec<u8>)>>;

    /// Remove every key.
    ///
    /// Default implementation deletes each scanned key. Backends may
    /// override with something cheaper.
    fn clear(&self) -> StoreResult<()> {
        for (key, _) in self.scan()? {
            self.delete(&key)?;
        }
        Ok(())
    }
}

impl<T: KvStore + ?Sized> KvStore for Arc<T> {
    fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        (**self).get(key)
    }

    fn put(&self, key: &str, value: &[u8]) -> StoreResult<()> {
        (**self).put(key, value)
    }

    fn delete(&self, key: &str) -> StoreResult<bool> {
        (**self).delete(key)
    }

    fn scan(&self) -> StoreResult<Vec<(String, Vec<u8>)>> {
        (**self).scan()
    }

    fn clear(&self) -> StoreResult<()> {
        (**self).clear()
    }
}
