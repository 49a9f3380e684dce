//! Application type registry.
//!
//! Loading a typed record needs a blank instance of its type to fill in.
//! The application registers, per discriminator, a factory producing that
//! blank instance, plus optional persistence hints:
//!
//! - transient fields the default encoder skips (caches, derived data)
//! - whether instances are stored by reference (shared or cyclic types)
//! - a [`RecordCodec`] replacing default field-by-field encoding
//!
//! A discriminator missing from the registry at load time is not an error:
//! the record comes back untyped.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

use kw_types::{discriminator, Record, Value};

use crate::error::{CodecError, CodecResult};
use crate::load::LoadSession;
use crate::save::SaveSession;

/// Produces a blank instance of a registered type.
pub type Factory = Arc<dyn Fn() -> Record + Send + Sync>;

/// Custom encoding for one application type.
///
/// `encode` owns every key under `root` except the type tag, which the
/// engine writes before calling it. `decode` must read back whatever
/// `encode` wrote. Both receive the session so they can write scalars,
/// recurse into children, or fall back to default field encoding via
/// [`SaveSession::save_fields`] / [`LoadSession::load_fields`].
pub trait RecordCodec: Send + Sync {
    fn encode(&self, record: &Record, root: &str, session: &mut SaveSession<'_>) -> CodecResult<()>;

    fn decode(&self, root: &str, session: &mut LoadSession<'_>) -> CodecResult<Value>;
}

/// Registration entry for one discriminator.
#[derive(Clone)]
pub struct TypeSpec {
    discriminator: String,
    factory: Factory,
    transient: BTreeSet<String>,
    by_reference: bool,
    codec: Option<Arc<dyn RecordCodec>>,
}

impl TypeSpec {
    /// A type whose blank instance comes from `factory`.
    pub fn new(
        discriminator: impl Into<String>,
        factory: impl Fn() -> Record + Send + Sync + 'static,
    ) -> Self {
        Self {
            discriminator: discriminator.into(),
            factory: Arc::new(factory),
            transient: BTreeSet::new(),
            by_reference: false,
            codec: None,
        }
    }

    /// A type whose blank instance is an empty record.
    pub fn of(discriminator: impl Into<String>) -> Self {
        let discriminator = discriminator.into();
        let tag = discriminator.clone();
        Self::new(discriminator, move || Record::new(tag.clone()))
    }

    /// Never persist `field`; it reloads with the factory's default.
    pub fn transient(mut self, field: impl Into<String>) -> Self {
        self.transient.insert(field.into());
        self
    }

    /// Store instances out-of-line behind a pointer, deduplicated by
    /// identity. Required for any type that can take part in a cycle.
    pub fn by_reference(mut self) -> Self {
        self.by_reference = true;
        self
    }

    pub fn with_codec(mut self, codec: impl RecordCodec + 'static) -> Self {
        self.codec = Some(Arc::new(codec));
        self
    }

    pub fn discriminator(&self) -> &str {
        &self.discriminator
    }

    pub fn is_transient(&self, field: &str) -> bool {
        self.transient.contains(field)
    }

    pub fn is_by_reference(&self) -> bool {
        self.by_reference
    }

    pub fn codec(&self) -> Option<&Arc<dyn RecordCodec>> {
        self.codec.as_ref()
    }

    /// A fresh blank instance, always tagged with this discriminator.
    pub fn instantiate(&self) -> Record {
        let mut record = (self.factory)();
        record.set_tag(Some(self.discriminator.clone()));
        record
    }
}

impl fmt::Debug for TypeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeSpec")
            .field("discriminator", &self.discriminator)
            .field("transient", &self.transient)
            .field("by_reference", &self.by_reference)
            .field("custom_codec", &self.codec.is_some())
            .finish()
    }
}

/// Discriminator to [`TypeSpec`] table, populated before any load.
#[derive(Clone, Debug, Default)]
pub struct TypeRegistry {
    types: HashMap<String, TypeSpec>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a type. Built-in discriminators and duplicates are refused.
    pub fn register(&mut self, spec: TypeSpec) -> CodecResult<()> {
        let reject = |reason: &str| CodecError::Registration {
            discriminator: spec.discriminator.clone(),
            reason: reason.into(),
        };
        if spec.discriminator.is_empty() {
            return Err(reject("discriminator must not be empty"));
        }
        if discriminator::is_builtin(&spec.discriminator) {
            return Err(reject("built-in kinds cannot be re-registered"));
        }
        if self.types.contains_key(&spec.discriminator) {
            return Err(reject("already registered"));
        }
        self.types.insert(spec.discriminator.clone(), spec);
        Ok(())
    }

    /// Builder form of [`register`](Self::register).
    pub fn with(mut self, spec: TypeSpec) -> CodecResult<Self> {
        self.register(spec)?;
        Ok(self)
    }

    pub fn get(&self, discriminator: &str) -> Option<&TypeSpec> {
        self.types.get(discriminator)
    }

    pub fn is_registered(&self, discriminator: &str) -> bool {
        self.types.contains_key(discriminator)
    }

    /// A blank instance of `discriminator`, or `None` if unregistered.
    pub fn instantiate(&self, discriminator: &str) -> Option<Record> {
        self.get(discriminator).map(TypeSpec::instantiate)
    }

    /// Registered discriminators, sorted.
    pub fn discriminators(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.types.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}
