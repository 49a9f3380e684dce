use thiserror::Error;

/// Errors produced by value-domain operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    /// A record field name cannot be persisted as given.
    #[error("invalid field name {name:?}: {reason}")]
    InvalidFieldName { name: String, reason: String },

    /// A scalar could not be encoded (e.g. a non-finite float).
    #[error("serialization error: {0}")]
    Serialization(String),
}
