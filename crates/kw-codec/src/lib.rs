//! Object-graph codec for Keyweave.
//!
//! Saves arbitrary in-memory graphs (primitives, sequences, sets, maps and
//! typed records, with shared and cyclic references) into a flat
//! [`KvStore`](kw_store::KvStore) of small entries, and rebuilds them.
//!
//! # Pipeline
//!
//! ```text
//! Value ──SaveSession──▶ many (key, Scalar) entries ──LoadSession──▶ Value
//!             │                                           │
//!         SaveRefs (identity → pointer)          LoadRefs (pointer → value)
//!                                                         │
//!                                                  completion sweep
//! ```
//!
//! # Modules
//!
//! - [`keys`] -- storage key construction and reserved suffixes
//! - [`abbrev`] -- invertible field-name abbreviations
//! - [`registry`] -- application types, factories and custom codecs
//! - [`refs`] -- per-pass reference tables
//! - [`save`] / [`load`] -- the two engines
//! - [`sweep`] -- placeholder completion after a cycle resolves
//! - [`config`] -- TOML-backed [`CodecConfig`]
//!
//! # Example
//!
//! ```
//! use kw_codec::{Codec, CodecConfig, TypeRegistry, TypeSpec};
//! use kw_store::InMemoryKvStore;
//! use kw_types::{Record, Value};
//!
//! let registry = TypeRegistry::new().with(TypeSpec::of("Creep")).unwrap();
//! let codec = Codec::new(CodecConfig::default(), registry).unwrap();
//! let store = InMemoryKvStore::new();
//!
//! let creep = Value::from(Record::new("Creep").with("hp", 100i64).unwrap());
//! let report = codec.save("c", &creep, &store);
//! assert!(report.is_complete());
//!
//! let loaded = codec.load("c", &store).unwrap();
//! assert!(loaded.structurally_eq(&creep));
//! ```

pub mod abbrev;
pub mod codec;
pub mod config;
pub mod error;
pub mod keys;
pub mod load;
pub mod refs;
pub mod registry;
pub mod save;
pub mod sweep;

pub use abbrev::AbbreviationTable;
pub use codec::Codec;
pub use config::CodecConfig;
pub use error::{CodecError, CodecResult};
pub use keys::KeyScheme;
pub use load::LoadSession;
pub use refs::{LoadRefs, NodeId, RefState, SaveRefs};
pub use registry::{Factory, RecordCodec, TypeRegistry, TypeSpec};
pub use save::{SaveFailure, SaveReport, SaveSession};
