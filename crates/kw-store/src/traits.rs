use kw_types::Scalar;

use crate::error::StoreResult;

/// A flat key/value store addressed by string keys.
///
/// All implementations must satisfy these invariants:
/// - `get` of a key never written returns `Ok(None)`, not an error.
/// - `set` either stores the whole value or returns `Err` and leaves the
///   previous entry (if any) in place.
/// - Entries larger than the backend's ceiling are rejected.
/// - Reads never mutate the store.
pub trait KvStore: Send + Sync {
    /// Read the entry at `key`.
    ///
    /// Returns `Ok(None)` if nothing is stored there.
    fn get(&self, key: &str) -> StoreResult<Option<Scalar>>;

    /// Write `value` at `key`, replacing any previous entry.
    fn set(&self, key: &str, value: Scalar) -> StoreResult<()>;

    /// Delete the entry at `key`. Returns `true` if it existed.
    fn remove(&self, key: &str) -> StoreResult<bool>;

    /// List all keys starting with `prefix`, in ascending order.
    fn keys(&self, prefix: &str) -> StoreResult<Vec<String>>;

    /// Check whether an entry exists at `key`.
    fn contains(&self, key: &str) -> StoreResult<bool> {
        Ok(self.get(key)?.is_some())
    }

    /// Write several entries.
    ///
    /// Default implementation calls `set()` for each entry and stops at the
    /// first failure; entries before it stay written.
    fn set_batch(&self, entries: Vec<(String, Scalar)>) -> StoreResult<()> {
        entries
            .into_iter()
            .try_for_each(|(key, value)| self.set(&key, value))
    }
}
