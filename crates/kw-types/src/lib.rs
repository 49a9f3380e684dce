//! Value domain for Keyweave.
//!
//! Keyweave persists in-memory object graphs into a flat key/value store and
//! rebuilds them later. This crate defines what such a graph is made of:
//!
//! - [`Scalar`] -- the primitives a store entry can hold
//! - [`Value`] -- a slot in the graph: absent, a scalar, a reference
//!   placeholder, or a shared [`ObjectRef`]
//! - [`Object`] -- the closed set of composite kinds: sequence, set, map and
//!   record
//! - [`Record`] -- a field table optionally tagged with a type discriminator
//! - [`ValueSet`] / [`ValueMap`] -- unique-element and key/value collections
//! - [`Pointer`] -- the storage key of an out-of-line shared object
//!
//! Objects are shared through [`ObjectRef`], so one instance may be reachable
//! from many places, including from itself. Identity is the handle's
//! allocation, never its contents.

pub mod collections;
pub mod error;
pub mod object;
pub mod pointer;
pub mod record;
pub mod scalar;
pub mod value;

pub use collections::{ValueMap, ValueSet};
pub use error::TypeError;
pub use object::{Kind, Object, ObjectRef};
pub use pointer::Pointer;
pub use record::Record;
pub use scalar::{Coord, Scalar};
pub use value::Value;

/// Built-in type discriminators.
pub mod discriminator {
    /// Ordered sequence.
    pub const SEQUENCE: &str = "sequence";
    /// Unique-element collection.
    pub const SET: &str = "set";
    /// Key/value collection.
    pub const MAP: &str = "map";
    /// Reference placeholder.
    pub const REFERENCE: &str = "reference";

    /// Returns `true` if `tag` names one of the built-in kinds.
    pub fn is_builtin(tag: &str) -> bool {
        matches!(tag, SEQUENCE | SET | MAP | REFERENCE)
    }
}
