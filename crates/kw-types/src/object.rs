use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::collections::{ValueMap, ValueSet};
use crate::discriminator;
use crate::record::Record;
use crate::value::Value;

/// The composite kinds a value can have.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Kind {
    Sequence,
    Set,
    Map,
    Reference,
    Record,
}

impl Kind {
    /// Map a built-in discriminator to its kind. Record tags are open-ended
    /// and never match.
    pub fn from_builtin(tag: &str) -> Option<Self> {
        match tag {
            discriminator::SEQUENCE => Some(Self::Sequence),
            discriminator::SET => Some(Self::Set),
            discriminator::MAP => Some(Self::Map),
            discriminator::REFERENCE => Some(Self::Reference),
            _ => None,
        }
    }

    /// The built-in discriminator, or `None` for records.
    pub fn builtin_tag(self) -> Option<&'static str> {
        match self {
            Self::Sequence => Some(discriminator::SEQUENCE),
            Self::Set => Some(discriminator::SET),
            Self::Map => Some(discriminator::MAP),
            Self::Reference => Some(discriminator::REFERENCE),
            Self::Record => None,
        }
    }
}

/// A composite value stored behind an [`ObjectRef`].
#[derive(Clone, Debug)]
pub enum Object {
    Sequence(Vec<Value>),
    Set(ValueSet),
    Map(ValueMap),
    Record(Record),
}

impl Object {
    pub fn kind(&self) -> Kind {
        match self {
            Self::Sequence(_) => Kind::Sequence,
            Self::Set(_) => Kind::Set,
            Self::Map(_) => Kind::Map,
            Self::Record(_) => Kind::Record,
        }
    }

    /// Runtime type discriminator: the built-in tag for containers, the
    /// record's own tag otherwise.
    pub fn discriminator(&self) -> Option<&str> {
        match self {
            Self::Record(r) => r.tag(),
            other => other.kind().builtin_tag(),
        }
    }

    /// Mutable access to every directly contained value.
    pub fn values_mut(&mut self) -> Box<dyn Iterator<Item = &mut Value> + '_> {
        match self {
            Self::Sequence(items) => Box::new(items.iter_mut()),
            Self::Set(set) => Box::new(set.iter_mut()),
            Self::Map(map) => Box::new(map.iter_mut().flat_map(|(k, v)| [k, v])),
            Self::Record(r) => Box::new(r.fields_mut().map(|(_, v)| v)),
        }
    }
}

/// Shared, identity-bearing handle to an [`Object`].
///
/// Cloning the handle aliases the same object. Two handles are the "same
/// instance" exactly when they share an allocation.
#[derive(Clone)]
pub struct ObjectRef(Arc<RwLock<Object>>);

impl ObjectRef {
    pub fn new(object: Object) -> Self {
        Self(Arc::new(RwLock::new(object)))
    }

    pub fn record(record: Record) -> Self {
        Self::new(Object::Record(record))
    }

    pub fn sequence(items: Vec<Value>) -> Self {
        Self::new(Object::Sequence(items))
    }

    /// Shared access. A poisoned lock is recovered: objects hold plain data
    /// and are never left half-updated by this crate.
    pub fn read(&self) -> RwLockReadGuard<'_, Object> {
        self.0.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Exclusive access.
    pub fn write(&self) -> RwLockWriteGuard<'_, Object> {
        self.0.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// A shallow copy of the current contents; nested objects stay shared.
    pub fn snapshot(&self) -> Object {
        self.read().clone()
    }

    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Address of the shared allocation, stable for the handle's lifetime.
    pub fn addr(&self) -> usize {
        Arc::as_ptr(&self.0) as *const () as usize
    }

    pub fn kind(&self) -> Kind {
        self.read().kind()
    }

    pub fn discriminator(&self) -> Option<String> {
        self.read().discriminator().map(str::to_string)
    }

    /// Run `f` against the record, if this object is one.
    pub fn with_record<R>(&self, f: impl FnOnce(&Record) -> R) -> Option<R> {
        match &*self.read() {
            Object::Record(r) => Some(f(r)),
            _ => None,
        }
    }

    /// Run `f` against the record mutably, if this object is one.
    pub fn with_record_mut<R>(&self, f: impl FnOnce(&mut Record) -> R) -> Option<R> {
        match &mut *self.write() {
            Object::Record(r) => Some(f(r)),
            _ => None,
        }
    }

    /// Clone of the named field, if this is a record holding it.
    pub fn field(&self, name: &str) -> Option<Value> {
        self.with_record(|r| r.get(name).cloned()).flatten()
    }
}

// Objects may be cyclic, so Debug never descends into contents.
impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let guard = self.read();
        match guard.discriminator() {
            Some(tag) => write!(f, "ObjectRef({tag}@{:#x})", self.addr()),
            None => write!(f, "ObjectRef(record@{:#x})", self.addr()),
        }
    }
}
