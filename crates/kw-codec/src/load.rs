//! The load engine.
//!
//! [`LoadSession`] rebuilds values from the entries a
//! [`SaveSession`](crate::SaveSession) wrote, reading the store and never
//! writing it. For each root key:
//!
//! 1. a built-in tag at `root + "t"` selects the sequence, set, map or
//!    reference decoder; a registered [`RecordCodec`](crate::RecordCodec)
//!    for the tag takes over likewise
//! 2. otherwise a keys list at `root + "keys"` means a record: a blank
//!    instance from the registry when the tag is registered, an untyped
//!    record when it is not
//! 3. with no keys list the root holds a primitive, returned as is (absent
//!    loads as [`Value::Null`])
//!
//! Dereferencing a pointer whose subgraph is still loading yields a
//! placeholder; the completion sweep run when that pointer resolves swaps
//! it for the real value.

use std::sync::Arc;

use kw_store::KvStore;
use kw_types::{Kind, Pointer, Record, Scalar, Value, ValueMap, ValueSet};
use tracing::{debug, warn};

use crate::codec::Codec;
use crate::error::{CodecError, CodecResult};
use crate::keys::{split_fields, KeyScheme, LENGTH_FIELD, POINTER_FIELD, SIZE_FIELD};
use crate::refs::{LoadRefs, RefState};
use crate::registry::TypeSpec;
use crate::sweep;

/// One load pass over a store.
///
/// The session owns the load-side pointer table: loading several roots
/// through one session keeps objects shared between them identical.
/// [`Codec::load`] uses a fresh session per call.
pub struct LoadSession<'a> {
    codec: &'a Codec,
    store: &'a dyn KvStore,
    refs: LoadRefs,
}

impl<'a> LoadSession<'a> {
    pub(crate) fn new(codec: &'a Codec, store: &'a dyn KvStore) -> Self {
        Self {
            codec,
            store,
            refs: LoadRefs::new(),
        }
    }

    /// Rebuild the value stored under `root`.
    pub fn load(&mut self, root: &str) -> CodecResult<Value> {
        let keys = self.keys();
        let tag = self.read_text(&keys.type_key(root))?;

        if let Some(tag) = tag.as_deref() {
            match Kind::from_builtin(tag) {
                Some(Kind::Sequence) => return self.load_sequence(root),
                Some(Kind::Set) => return self.load_set(root),
                Some(Kind::Map) => return self.load_map(root),
                Some(Kind::Reference) => return self.load_reference(root),
                Some(Kind::Record) | None => {}
            }
            let custom = self
                .codec
                .registry()
                .get(tag)
                .and_then(TypeSpec::codec)
                .map(Arc::clone);
            if let Some(record_codec) = custom {
                return record_codec.decode(root, self);
            }
        }

        let Some(list) = self.read_text(&keys.keys_key(root))? else {
            return Ok(self.read(root)?.map_or(Value::Null, Value::from));
        };

        let blank = match tag {
            Some(tag) => self.codec.registry().instantiate(&tag).unwrap_or_else(|| {
                warn!(key = root, discriminator = %tag, "unregistered discriminator; loading untyped record");
                Record::untyped()
            }),
            None => Record::untyped(),
        };
        let record = self.fill_fields(root, blank, &list)?;
        Ok(Value::from(record))
    }

    pub fn refs(&self) -> &LoadRefs {
        &self.refs
    }

    // ---------------------------------------------------------------
    // Primitives available to record codecs
    // ---------------------------------------------------------------

    /// Key builder for this session's configuration.
    pub fn keys(&self) -> KeyScheme<'a> {
        self.codec.keys()
    }

    /// Read one raw entry.
    pub fn read(&self, key: &str) -> CodecResult<Option<Scalar>> {
        Ok(self.store.get(key)?)
    }

    /// Fill `record` from the keys list under `root`, leaving it unchanged
    /// when there is no keys list.
    pub fn load_fields(&mut self, root: &str, record: Record) -> CodecResult<Record> {
        match self.read_text(&self.keys().keys_key(root))? {
            Some(list) => self.fill_fields(root, record, &list),
            None => Ok(record),
        }
    }

    // ---------------------------------------------------------------
    // Decoders
    // ---------------------------------------------------------------

    fn fill_fields(&mut self, root: &str, mut record: Record, list: &str) -> CodecResult<Record> {
        let keys = self.keys();
        for code in split_fields(list) {
            let value = self.load(&keys.raw(root, code))?;
            record
                .insert(keys.expand(code), value)
                .map_err(|e| CodecError::malformed(keys.keys_key(root), e.to_string()))?;
        }
        Ok(record)
    }

    fn load_sequence(&mut self, root: &str) -> CodecResult<Value> {
        let keys = self.keys();
        let len = self.read_count(&keys.field(root, LENGTH_FIELD))?;
        let mut items = Vec::with_capacity(len.min(1024));
        for i in 0..len {
            items.push(self.load(&keys.index(root, i))?);
        }
        Ok(Value::from(items))
    }

    fn load_set(&mut self, root: &str) -> CodecResult<Value> {
        let keys = self.keys();
        let size = self.read_count(&keys.field(root, SIZE_FIELD))?;
        let mut set = ValueSet::new();
        for i in 0..size {
            set.insert(self.load(&keys.item(root, i))?);
        }
        Ok(Value::from(set))
    }

    fn load_map(&mut self, root: &str) -> CodecResult<Value> {
        let keys = self.keys();
        let size = self.read_count(&keys.field(root, SIZE_FIELD))?;
        let mut map = ValueMap::new();
        for i in 0..size {
            let key = self.load(&keys.entry_key(root, i))?;
            let value = self.load(&keys.entry_value(root, i))?;
            map.insert(key, value);
        }
        Ok(Value::from(map))
    }

    fn load_reference(&mut self, root: &str) -> CodecResult<Value> {
        let key = self.keys().field(root, POINTER_FIELD);
        let pointer = match self.read_text(&key)? {
            Some(text) => Pointer::new(text),
            None => return Err(CodecError::malformed(key, "reference without a pointer")),
        };

        match self.refs.state(&pointer) {
            Some(RefState::Resolved(value)) => return Ok(value.clone()),
            Some(RefState::Unresolved) => {
                debug!(pointer = %pointer, "pointer still loading; handing out placeholder");
                return Ok(Value::Reference(pointer));
            }
            None => {}
        }

        self.refs.begin(pointer.clone())?;
        let value = self.load(pointer.as_str())?;
        self.refs.resolve(&pointer, value.clone())?;
        let healed = sweep::complete(&value, &self.refs);
        debug!(pointer = %pointer, healed, "pointer resolved");
        Ok(value)
    }

    // ---------------------------------------------------------------
    // Typed reads
    // ---------------------------------------------------------------

    fn read_text(&self, key: &str) -> CodecResult<Option<String>> {
        match self.read(key)? {
            None => Ok(None),
            Some(Scalar::Text(text)) => Ok(Some(text)),
            Some(other) => Err(CodecError::malformed(
                key,
                format!("expected text, found {}", other.type_name()),
            )),
        }
    }

    fn read_count(&self, key: &str) -> CodecResult<usize> {
        match self.read(key)? {
            Some(Scalar::Int(n)) => usize::try_from(n)
                .map_err(|_| CodecError::malformed(key, format!("negative count {n}"))),
            Some(other) => Err(CodecError::malformed(
                key,
                format!("expected a count, found {}", other.type_name()),
            )),
            None => Err(CodecError::malformed(key, "missing count")),
        }
    }
}

impl std::fmt::Debug for LoadSession<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadSession")
            .field("pointers", &self.refs.len())
            .field("unresolved", &self.refs.unresolved())
            .finish()
    }
}
