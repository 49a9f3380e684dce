use kw_types::TypeError;

/// Errors from key/value store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The entry exceeds the backend's per-entry ceiling.
    #[error("entry {key:?} is {size} bytes, limit is {limit}")]
    EntryTooLarge {
        key: String,
        size: usize,
        limit: usize,
    },

    /// Attempted to write under an empty key.
    #[error("cannot store an entry under an empty key")]
    EmptyKey,

    /// The value could not be encoded for size accounting.
    #[error("serialization error: {0}")]
    Serialization(#[from] TypeError),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
