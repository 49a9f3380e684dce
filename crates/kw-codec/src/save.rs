//! The save engine.
//!
//! [`SaveSession`] walks a value recursively and writes it as many small
//! store entries. Dispatch happens on the runtime discriminator:
//!
//! 1. null writes nothing; scalars write one entry at the root key
//! 2. discriminators stored by reference are written once under a minted
//!    pointer, and every site (the first included) gets a placeholder
//! 3. sequences, sets and maps use their built-in encoders
//! 4. records with a registered [`RecordCodec`](crate::RecordCodec) use it
//! 5. everything else gets default field-by-field encoding
//!
//! Writes are best-effort. A failure while saving one field, element or
//! entry is logged and recorded in the [`SaveReport`], and saving carries on
//! with its siblings; the failed slot reloads as absent.

use std::collections::HashSet;
use std::sync::Arc;

use kw_store::KvStore;
use kw_types::{discriminator, Object, ObjectRef, Pointer, Record, Scalar, Value, ValueMap, ValueSet};
use tracing::{debug, warn};

use crate::codec::Codec;
use crate::error::{CodecError, CodecResult};
use crate::keys::{KeyScheme, LENGTH_FIELD, POINTER_FIELD, SIZE_FIELD};
use crate::refs::{NodeId, SaveRefs};
use crate::registry::TypeSpec;

/// A slot that could not be persisted.
#[derive(Debug)]
pub struct SaveFailure {
    /// Key of the slot whose save failed.
    pub key: String,
    pub error: CodecError,
}

/// Outcome of a save pass.
#[derive(Debug, Default)]
pub struct SaveReport {
    /// Successful store writes.
    pub entries_written: usize,
    /// Objects stored out-of-line under a fresh pointer.
    pub pointers_minted: usize,
    /// Placeholders written for objects already stored out-of-line.
    pub deduplicated: usize,
    /// Isolated failures, in the order they happened.
    pub failures: Vec<SaveFailure>,
}

impl SaveReport {
    /// Returns `true` if every slot was written.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// One save pass over a store.
///
/// The session owns the save-side reference table, so objects shared
/// between several [`save`](Self::save) calls on the same session are
/// written once. [`Codec::save`] uses a fresh session per call.
pub struct SaveSession<'a> {
    codec: &'a Codec,
    store: &'a dyn KvStore,
    refs: SaveRefs,
    in_progress: HashSet<NodeId>,
    report: SaveReport,
}

impl<'a> SaveSession<'a> {
    pub(crate) fn new(codec: &'a Codec, store: &'a dyn KvStore) -> Self {
        Self {
            codec,
            store,
            refs: SaveRefs::new(codec.config().pointer_seed),
            in_progress: HashSet::new(),
            report: SaveReport::default(),
        }
    }

    /// Save `value` under `root`. Failures are recorded, never returned.
    pub fn save(&mut self, root: &str, value: &Value) {
        self.isolate(root, value);
    }

    /// Progress so far.
    pub fn report(&self) -> &SaveReport {
        &self.report
    }

    pub fn refs(&self) -> &SaveRefs {
        &self.refs
    }

    /// End the session and hand back its report.
    pub fn finish(self) -> SaveReport {
        self.report
    }

    // ---------------------------------------------------------------
    // Primitives available to record codecs
    // ---------------------------------------------------------------

    /// Key builder for this session's configuration.
    pub fn keys(&self) -> KeyScheme<'a> {
        self.codec.keys()
    }

    /// Write one scalar entry.
    pub fn write(&mut self, key: &str, value: Scalar) -> CodecResult<()> {
        self.store.set(key, value)?;
        self.report.entries_written += 1;
        Ok(())
    }

    /// Save a child value under `key` with full dispatch, returning any
    /// failure to the caller instead of recording it.
    pub fn save_child(&mut self, key: &str, value: &Value) -> CodecResult<()> {
        self.save_value(key, value)
    }

    /// Default field-by-field encoding of `record`, bypassing any custom
    /// codec registered for its tag.
    ///
    /// Writes the tag (if any), the keys list, then each persisted field.
    /// Ignored and transient fields are skipped. Each field is isolated: its
    /// failure is recorded and does not stop the others.
    pub fn save_fields(&mut self, root: &str, record: &Record) -> CodecResult<()> {
        let codec = self.codec;
        let keys = codec.keys();
        let spec = record.tag().and_then(|tag| codec.registry().get(tag));

        let mut persisted: Vec<(&str, &Value)> = Vec::with_capacity(record.len());
        for (name, value) in record.fields() {
            if codec.config().ignore_fields.contains(name)
                || spec.is_some_and(|s| s.is_transient(name))
            {
                continue;
            }
            if keys.is_reserved_segment(keys.abbreviate(name)) {
                let key = keys.field(root, name);
                self.fail(
                    &key,
                    CodecError::ReservedKey {
                        key: key.clone(),
                        field: name.to_string(),
                    },
                );
                continue;
            }
            persisted.push((name, value));
        }

        if let Some(tag) = record.tag() {
            self.write(&keys.type_key(root), Scalar::from(tag))?;
        }
        let list = keys.join_fields(persisted.iter().map(|(name, _)| *name));
        self.write(&keys.keys_key(root), Scalar::Text(list))?;

        for (name, value) in persisted {
            self.isolate(&keys.field(root, name), value);
        }
        Ok(())
    }

    // ---------------------------------------------------------------
    // Dispatch
    // ---------------------------------------------------------------

    fn isolate(&mut self, key: &str, value: &Value) {
        if let Err(e) = self.save_value(key, value) {
            self.fail(key, e);
        }
    }

    fn fail(&mut self, key: &str, error: CodecError) {
        warn!(key, error = %error, "failed to save slot; continuing with siblings");
        self.report.failures.push(SaveFailure {
            key: key.to_string(),
            error,
        });
    }

    fn save_value(&mut self, root: &str, value: &Value) -> CodecResult<()> {
        match value {
            Value::Null => Ok(()),
            Value::Reference(pointer) => self.write_placeholder(root, pointer),
            Value::Object(object) => self.save_object(root, object),
            primitive => match primitive.as_scalar() {
                Some(scalar) => self.write(root, scalar),
                None => Ok(()),
            },
        }
    }

    fn save_object(&mut self, root: &str, object: &ObjectRef) -> CodecResult<()> {
        let id = self.refs.identify(object);
        let shared = object
            .discriminator()
            .is_some_and(|d| self.codec.stores_by_reference(&d));
        if shared {
            self.save_shared(root, object, id)
        } else {
            self.save_inline(root, object, id)
        }
    }

    fn save_shared(&mut self, root: &str, object: &ObjectRef, id: NodeId) -> CodecResult<()> {
        if let Some(pointer) = self.refs.pointer(id).cloned() {
            self.report.deduplicated += 1;
            return self.write_placeholder(root, &pointer);
        }

        let pointer = self.refs.mint(root);
        self.refs.bind(id, pointer.clone());
        self.report.pointers_minted += 1;
        debug!(site = root, pointer = %pointer, "storing shared object out-of-line");

        // The full instance goes under the pointer; substituting again there
        // would only chain pointer to pointer.
        self.save_inline(pointer.as_str(), object, id)?;
        self.write_placeholder(root, &pointer)
    }

    fn save_inline(&mut self, root: &str, object: &ObjectRef, id: NodeId) -> CodecResult<()> {
        if !self.in_progress.insert(id) {
            return Err(CodecError::UnreferencedCycle {
                key: root.to_string(),
                discriminator: object
                    .discriminator()
                    .unwrap_or_else(|| "untyped record".into()),
            });
        }

        // Work on a shallow copy so no lock is held while recursing.
        let result = match object.snapshot() {
            Object::Sequence(items) => self.save_sequence(root, &items),
            Object::Set(set) => self.save_set(root, &set),
            Object::Map(map) => self.save_map(root, &map),
            Object::Record(record) => self.save_record(root, &record),
        };

        self.in_progress.remove(&id);
        result
    }

    // ---------------------------------------------------------------
    // Built-in encoders
    // ---------------------------------------------------------------

    fn save_sequence(&mut self, root: &str, items: &[Value]) -> CodecResult<()> {
        let keys = self.keys();
        self.write(&keys.type_key(root), Scalar::from(discriminator::SEQUENCE))?;
        self.write(&keys.keys_key(root), Scalar::Text(keys.join_fields([LENGTH_FIELD])))?;
        self.write(&keys.field(root, LENGTH_FIELD), count(items.len()))?;
        for (i, item) in items.iter().enumerate() {
            self.isolate(&keys.index(root, i), item);
        }
        Ok(())
    }

    fn save_set(&mut self, root: &str, set: &ValueSet) -> CodecResult<()> {
        let keys = self.keys();
        self.write(&keys.type_key(root), Scalar::from(discriminator::SET))?;
        self.write(&keys.field(root, SIZE_FIELD), count(set.len()))?;
        for (i, item) in set.iter().enumerate() {
            self.isolate(&keys.item(root, i), item);
        }
        Ok(())
    }

    fn save_map(&mut self, root: &str, map: &ValueMap) -> CodecResult<()> {
        let keys = self.keys();
        self.write(&keys.type_key(root), Scalar::from(discriminator::MAP))?;
        self.write(&keys.field(root, SIZE_FIELD), count(map.len()))?;
        for (i, (key, value)) in map.iter().enumerate() {
            self.isolate(&keys.entry_key(root, i), key);
            self.isolate(&keys.entry_value(root, i), value);
        }
        Ok(())
    }

    fn save_record(&mut self, root: &str, record: &Record) -> CodecResult<()> {
        let codec = self.codec;
        let custom = record
            .tag()
            .and_then(|tag| codec.registry().get(tag))
            .and_then(TypeSpec::codec)
            .map(Arc::clone);

        match (custom, record.tag()) {
            (Some(record_codec), Some(tag)) => {
                self.write(&codec.keys().type_key(root), Scalar::from(tag))?;
                record_codec.encode(record, root, self)
            }
            _ => self.save_fields(root, record),
        }
    }

    /// A placeholder is itself a two-field record, `{type: "reference",
    /// pointer}`, written with default field encoding.
    fn write_placeholder(&mut self, root: &str, pointer: &Pointer) -> CodecResult<()> {
        let keys = self.keys();
        self.write(&keys.type_key(root), Scalar::from(discriminator::REFERENCE))?;
        self.write(&keys.keys_key(root), Scalar::Text(keys.join_fields([POINTER_FIELD])))?;
        self.write(&keys.field(root, POINTER_FIELD), Scalar::from(pointer.as_str()))
    }
}

fn count(n: usize) -> Scalar {
    Scalar::Int(i64::try_from(n).unwrap_or(i64::MAX))
}

impl std::fmt::Debug for SaveSession<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SaveSession")
            .field("refs", &self.refs)
            .field("entries_written", &self.report.entries_written)
            .field("failures", &self.report.failures.len())
            .finish()
    }
}
