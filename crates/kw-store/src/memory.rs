use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use kw_types::Scalar;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::traits::KvStore;

/// Default per-entry ceiling, in encoded bytes.
pub const DEFAULT_MAX_ENTRY_BYTES: usize = 64 * 1024;

/// In-memory, `BTreeMap`-based key/value store.
///
/// Intended for tests and embedding. Entries live behind a `RwLock` and are
/// cloned on read. Each entry's JSON-encoded size is checked against
/// `max_entry_bytes` on write.
pub struct InMemoryKvStore {
    entries: RwLock<BTreeMap<String, Scalar>>,
    max_entry_bytes: usize,
}

impl InMemoryKvStore {
    /// Create an empty store with the default entry ceiling.
    pub fn new() -> Self {
        Self::with_entry_limit(DEFAULT_MAX_ENTRY_BYTES)
    }

    /// Create an empty store that rejects entries larger than `limit` bytes.
    pub fn with_entry_limit(limit: usize) -> Self {
        Self {
            entries: RwLock::new(BTreeMap::new()),
            max_entry_bytes: limit,
        }
    }

    pub fn max_entry_bytes(&self) -> usize {
        self.max_entry_bytes
    }

    /// Number of entries currently stored.
    pub fn len(&self) -> usize {
        self.read_map().len()
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.read_map().is_empty()
    }

    /// Total encoded bytes across all stored values.
    pub fn total_bytes(&self) -> usize {
        self.read_map()
            .values()
            .filter_map(|v| v.encoded_len().ok())
            .sum()
    }

    /// Remove all entries from the store.
    pub fn clear(&self) {
        self.write_map().clear();
    }

    /// A copy of every entry, ordered by key.
    pub fn snapshot(&self) -> BTreeMap<String, Scalar> {
        self.read_map().clone()
    }

    // Entries are plain data; a poisoned lock still guards a consistent map.
    fn read_map(&self) -> RwLockReadGuard<'_, BTreeMap<String, Scalar>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_map(&self) -> RwLockWriteGuard<'_, BTreeMap<String, Scalar>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for InMemoryKvStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KvStore for InMemoryKvStore {
    fn get(&self, key: &str) -> StoreResult<Option<Scalar>> {
        Ok(self.read_map().get(key).cloned())
    }

    fn set(&self, key: &str, value: Scalar) -> StoreResult<()> {
        if key.is_empty() {
            return Err(StoreError::EmptyKey);
        }
        let size = value.encoded_len()?;
        if size > self.max_entry_bytes {
            debug!(key, size, limit = self.max_entry_bytes, "entry rejected");
            return Err(StoreError::EntryTooLarge {
                key: key.to_string(),
                size,
                limit: self.max_entry_bytes,
            });
        }
        self.write_map().insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&self, key: &str) -> StoreResult<bool> {
        Ok(self.write_map().remove(key).is_some())
    }

    fn keys(&self, prefix: &str) -> StoreResult<Vec<String>> {
        let map = self.read_map();
        Ok(map
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, _)| k.clone())
            .collect())
    }
}

impl std::fmt::Debug for InMemoryKvStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryKvStore")
            .field("entry_count", &self.len())
            .field("max_entry_bytes", &self.max_entry_bytes)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kw_types::Coord;

    // -----------------------------------------------------------------------
    // Core get / set / remove
    // -----------------------------------------------------------------------

    #[test]
    fn set_and_get() {
        let store = InMemoryKvStore::new();
        store.set("a", Scalar::from("hello")).unwrap();
        assert_eq!(store.get("a").unwrap(), Some(Scalar::from("hello")));
    }

    #[test]
    fn get_missing_returns_none() {
        let store = InMemoryKvStore::new();
        assert!(store.get("never-written").unwrap().is_none());
    }

    #[test]
    fn set_replaces_previous_entry() {
        let store = InMemoryKvStore::new();
        store.set("a", Scalar::Int(1)).unwrap();
        store.set("a", Scalar::Int(2)).unwrap();
        assert_eq!(store.get("a").unwrap(), Some(Scalar::Int(2)));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn coord_entries_are_stored() {
        let store = InMemoryKvStore::new();
        store.set("pos", Scalar::Coord(Coord::new(1, 2, 3))).unwrap();
        assert_eq!(store.get("pos").unwrap(), Some(Scalar::Coord(Coord::new(1, 2, 3))));
    }

    #[test]
    fn remove_present_and_missing() {
        let store = InMemoryKvStore::new();
        store.set("a", Scalar::Bool(true)).unwrap();
        assert!(store.remove("a").unwrap());
        assert!(!store.remove("a").unwrap());
        assert!(!store.contains("a").unwrap());
    }

    // -----------------------------------------------------------------------
    // Size ceiling
    // -----------------------------------------------------------------------

    #[test]
    fn oversize_entry_is_rejected() {
        let store = InMemoryKvStore::with_entry_limit(16);
        let err = store.set("big", Scalar::from("x".repeat(64))).unwrap_err();
        assert!(matches!(err, StoreError::EntryTooLarge { limit: 16, .. }));
        assert!(store.get("big").unwrap().is_none());
    }

    #[test]
    fn oversize_write_keeps_previous_entry() {
        let store = InMemoryKvStore::with_entry_limit(16);
        store.set("k", Scalar::from("small")).unwrap();
        assert!(store.set("k", Scalar::from("y".repeat(64))).is_err());
        assert_eq!(store.get("k").unwrap(), Some(Scalar::from("small")));
    }

    #[test]
    fn non_finite_float_is_rejected() {
        let store = InMemoryKvStore::new();
        let err = store.set("nan", Scalar::Float(f64::NAN)).unwrap_err();
        assert!(matches!(err, StoreError::Serialization(_)));
    }

    #[test]
    fn empty_key_is_rejected() {
        let store = InMemoryKvStore::new();
        assert!(matches!(
            store.set("", Scalar::Int(1)).unwrap_err(),
            StoreError::EmptyKey
        ));
    }

    // -----------------------------------------------------------------------
    // Listing and batches
    // -----------------------------------------------------------------------

    #[test]
    fn keys_by_prefix_are_sorted() {
        let store = InMemoryKvStore::new();
        for k in ["rootb", "roota", "other", "root"] {
            store.set(k, Scalar::Int(0)).unwrap();
        }
        assert_eq!(store.keys("root").unwrap(), vec!["root", "roota", "rootb"]);
        assert_eq!(store.keys("").unwrap().len(), 4);
        assert!(store.keys("zzz").unwrap().is_empty());
    }

    #[test]
    fn set_batch_stops_at_first_failure() {
        let store = InMemoryKvStore::with_entry_limit(16);
        let result = store.set_batch(vec![
            ("a".into(), Scalar::Int(1)),
            ("b".into(), Scalar::from("z".repeat(64))),
            ("c".into(), Scalar::Int(3)),
        ]);
        assert!(result.is_err());
        assert!(store.contains("a").unwrap());
        assert!(!store.contains("b").unwrap());
        assert!(!store.contains("c").unwrap());
    }

    // -----------------------------------------------------------------------
    // Utility methods
    // -----------------------------------------------------------------------

    #[test]
    fn len_total_bytes_and_clear() {
        let store = InMemoryKvStore::new();
        assert!(store.is_empty());
        store.set("a", Scalar::Int(7)).unwrap();
        store.set("b", Scalar::Bool(false)).unwrap();
        assert_eq!(store.len(), 2);
        let expected = Scalar::Int(7).encoded_len().unwrap()
            + Scalar::Bool(false).encoded_len().unwrap();
        assert_eq!(store.total_bytes(), expected);
        store.clear();
        assert!(store.is_empty());
    }

    #[test]
    fn snapshot_copies_entries() {
        let store = InMemoryKvStore::new();
        store.set("a", Scalar::Int(1)).unwrap();
        let snap = store.snapshot();
        store.set("b", Scalar::Int(2)).unwrap();
        assert_eq!(snap.len(), 1);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn concurrent_reads_are_safe() {
        use std::sync::Arc;
        use std::thread;

        let store = Arc::new(InMemoryKvStore::new());
        store.set("shared", Scalar::from("data")).unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    assert_eq!(store.get("shared").unwrap(), Some(Scalar::from("data")));
                })
            })
            .collect();

        for h in handles {
            h.join().expect("thread should not panic");
        }
    }

    #[test]
    fn debug_format() {
        let store = InMemoryKvStore::new();
        let debug = format!("{store:?}");
        assert!(debug.contains("InMemoryKvStore"));
        assert!(debug.contains("entry_count"));
    }
}
