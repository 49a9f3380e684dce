use kw_store::StoreError;
use kw_types::TypeError;

/// Errors from codec operations.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The storage medium rejected a read or write.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// A value could not be represented in the value domain.
    #[error("type error: {0}")]
    Type(#[from] TypeError),

    /// Stored state is inconsistent with what the decoder expects.
    #[error("malformed entry at {key:?}: {reason}")]
    Malformed { key: String, reason: String },

    /// An object was reached again while still being saved inline; its type
    /// must be stored by reference to persist the cycle.
    #[error("cycle through {discriminator} at {key:?} requires reference storage")]
    UnreferencedCycle { key: String, discriminator: String },

    /// A field's key segment collides with a reserved suffix.
    #[error("field {field:?} at {key:?} collides with a reserved key suffix")]
    ReservedKey { key: String, field: String },

    /// The abbreviation table would stop being invertible.
    #[error("invalid abbreviation {full:?} -> {short:?}: {reason}")]
    Abbreviation {
        full: String,
        short: String,
        reason: String,
    },

    /// A type registration was refused.
    #[error("cannot register {discriminator:?}: {reason}")]
    Registration {
        discriminator: String,
        reason: String,
    },

    /// Configuration could not be read or parsed.
    #[error("config error: {0}")]
    Config(String),
}

impl CodecError {
    /// Shorthand for [`CodecError::Malformed`], for decoders reporting bad
    /// stored state.
    pub fn malformed(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Malformed {
            key: key.into(),
            reason: reason.into(),
        }
    }
}

/// Result alias for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;
