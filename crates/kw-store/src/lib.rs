//! Flat key/value storage for Keyweave.
//!
//! The codec decomposes object graphs into many small entries addressed by
//! string keys. This crate defines the contract a storage medium must meet
//! and ships an in-memory backend.
//!
//! # Storage Backends
//!
//! All backends implement the [`KvStore`] trait:
//!
//! - [`InMemoryKvStore`] -- `BTreeMap`-based store for tests and embedding
//!
//! # Design Rules
//!
//! 1. Entries hold [`Scalar`](kw_types::Scalar)s only; composite values never
//!    reach the store.
//! 2. Every entry has a hard size ceiling. Oversize writes fail and leave the
//!    previous entry untouched.
//! 3. A write either fully succeeds or returns an error; there is no partial
//!    write and no rollback.
//! 4. The store never interprets keys or values.

pub mod error;
pub mod memory;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use memory::{InMemoryKvStore, DEFAULT_MAX_ENTRY_BYTES};
pub use traits::KvStore;
