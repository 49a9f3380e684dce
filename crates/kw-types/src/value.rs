use std::collections::HashSet;

use crate::collections::{ValueMap, ValueSet};
use crate::object::{Kind, Object, ObjectRef};
use crate::pointer::Pointer;
use crate::record::Record;
use crate::scalar::{Coord, Scalar};

/// One slot of an object graph.
///
/// `Reference` is the placeholder left behind while a cyclic structure is
/// still being loaded; a completed load never hands one back unless the
/// stored pointer is dangling.
#[derive(Clone, Debug, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Coord(Coord),
    Reference(Pointer),
    Object(ObjectRef),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// The scalar form of a primitive value; `None` for null, placeholders
    /// and objects.
    pub fn as_scalar(&self) -> Option<Scalar> {
        match self {
            Self::Bool(v) => Some(Scalar::Bool(*v)),
            Self::Int(v) => Some(Scalar::Int(*v)),
            Self::Float(v) => Some(Scalar::Float(*v)),
            Self::Text(v) => Some(Scalar::Text(v.clone())),
            Self::Coord(v) => Some(Scalar::Coord(*v)),
            Self::Null | Self::Reference(_) | Self::Object(_) => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Self::Object(obj) => Some(obj),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Composite kind, or `None` for null and primitives.
    pub fn kind(&self) -> Option<Kind> {
        match self {
            Self::Reference(_) => Some(Kind::Reference),
            Self::Object(obj) => Some(obj.kind()),
            _ => None,
        }
    }

    /// Identity for objects, equality for everything else.
    ///
    /// This is the uniqueness rule used by [`ValueSet`] and [`ValueMap`].
    pub fn same(&self, other: &Value) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Coord(a), Self::Coord(b)) => a == b,
            (Self::Reference(a), Self::Reference(b)) => a == b,
            (Self::Object(a), Self::Object(b)) => a.ptr_eq(b),
            _ => false,
        }
    }

    /// Deep structural comparison that terminates on cyclic graphs.
    ///
    /// Two objects compare equal when they have the same kind, the same tag
    /// and pairwise structurally equal contents; a pair of objects already
    /// under comparison is assumed equal. Sets and maps compare in
    /// insertion order.
    pub fn structurally_eq(&self, other: &Value) -> bool {
        let mut in_progress = HashSet::new();
        structural_eq(self, other, &mut in_progress)
    }
}

fn structural_eq(a: &Value, b: &Value, in_progress: &mut HashSet<(usize, usize)>) -> bool {
    let (x, y) = match (a, b) {
        (Value::Object(x), Value::Object(y)) => (x, y),
        (Value::Object(_), _) | (_, Value::Object(_)) => return false,
        _ => return a.same(b),
    };
    if !in_progress.insert((x.addr(), y.addr())) {
        return true;
    }
    match (x.snapshot(), y.snapshot()) {
        (Object::Sequence(l), Object::Sequence(r)) => {
            l.len() == r.len()
                && l.iter().zip(&r).all(|(l, r)| structural_eq(l, r, in_progress))
        }
        (Object::Set(l), Object::Set(r)) => {
            l.len() == r.len()
                && l.iter().zip(r.iter()).all(|(l, r)| structural_eq(l, r, in_progress))
        }
        (Object::Map(l), Object::Map(r)) => {
            l.len() == r.len()
                && l.iter().zip(r.iter()).all(|((lk, lv), (rk, rv))| {
                    structural_eq(lk, rk, in_progress) && structural_eq(lv, rv, in_progress)
                })
        }
        (Object::Record(l), Object::Record(r)) => {
            l.tag() == r.tag()
                && l.len() == r.len()
                && l.fields().zip(r.fields()).all(|((ln, lv), (rn, rv))| {
                    ln == rn && structural_eq(lv, rv, in_progress)
                })
        }
        _ => false,
    }
}

// Objects compare by identity, like set membership.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.same(other)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<Coord> for Value {
    fn from(v: Coord) -> Self {
        Self::Coord(v)
    }
}

impl From<Pointer> for Value {
    fn from(v: Pointer) -> Self {
        Self::Reference(v)
    }
}

impl From<ObjectRef> for Value {
    fn from(v: ObjectRef) -> Self {
        Self::Object(v)
    }
}

impl From<&ObjectRef> for Value {
    fn from(v: &ObjectRef) -> Self {
        Self::Object(v.clone())
    }
}

impl From<Object> for Value {
    fn from(v: Object) -> Self {
        Self::Object(ObjectRef::new(v))
    }
}

impl From<Record> for Value {
    fn from(v: Record) -> Self {
        Object::Record(v).into()
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Object::Sequence(v).into()
    }
}

impl From<ValueSet> for Value {
    fn from(v: ValueSet) -> Self {
        Object::Set(v).into()
    }
}

impl From<ValueMap> for Value {
    fn from(v: ValueMap) -> Self {
        Object::Map(v).into()
    }
}

impl From<Scalar> for Value {
    fn from(v: Scalar) -> Self {
        match v {
            Scalar::Bool(b) => Self::Bool(b),
            Scalar::Int(n) => Self::Int(n),
            Scalar::Float(f) => Self::Float(f),
            Scalar::Text(s) => Self::Text(s),
            Scalar::Coord(c) => Self::Coord(c),
        }
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(tag: &str, fields: &[(&str, Value)]) -> Value {
        let mut r = Record::new(tag);
        for (name, value) in fields {
            r.insert(*name, value.clone()).unwrap();
        }
        r.into()
    }

    #[test]
    fn scalar_conversion_roundtrip() {
        let v = Value::from(Scalar::from("hi"));
        assert_eq!(v.as_scalar(), Some(Scalar::from("hi")));
        assert!(Value::Null.as_scalar().is_none());
        assert!(Value::from(Vec::<Value>::new()).as_scalar().is_none());
    }

    #[test]
    fn same_uses_identity_for_objects() {
        let a = ObjectRef::new(Object::Sequence(vec![]));
        let b = ObjectRef::new(Object::Sequence(vec![]));
        assert!(Value::from(&a).same(&Value::from(&a)));
        assert!(!Value::from(&a).same(&Value::from(&b)));
        assert!(Value::from(&a).structurally_eq(&Value::from(&b)));
    }

    #[test]
    fn same_uses_equality_for_scalars() {
        assert!(Value::from(3i64).same(&Value::from(3i64)));
        assert!(!Value::from(3i64).same(&Value::from(3.0)));
        assert!(Value::Null.same(&Value::Null));
    }

    #[test]
    fn structural_eq_compares_records() {
        let a = record("Creep", &[("hp", 10i64.into()), ("name", "bob".into())]);
        let b = record("Creep", &[("hp", 10i64.into()), ("name", "bob".into())]);
        let c = record("Tower", &[("hp", 10i64.into()), ("name", "bob".into())]);
        let d = record("Creep", &[("hp", 11i64.into()), ("name", "bob".into())]);
        assert!(a.structurally_eq(&b));
        assert!(!a.structurally_eq(&c));
        assert!(!a.structurally_eq(&d));
    }

    #[test]
    fn structural_eq_terminates_on_cycles() {
        let a = ObjectRef::new(Object::Record(Record::new("Node")));
        let b = ObjectRef::new(Object::Record(Record::new("Node")));
        a.with_record_mut(|r| r.insert("next", Value::from(&a)).map(drop))
            .unwrap()
            .unwrap();
        b.with_record_mut(|r| r.insert("next", Value::from(&b)).map(drop))
            .unwrap()
            .unwrap();
        assert!(Value::from(&a).structurally_eq(&Value::from(&b)));
    }

    #[test]
    fn option_converts_to_null() {
        assert!(Value::from(None::<i64>).is_null());
        assert!(matches!(Value::from(Some(4i64)), Value::Int(4)));
    }

    #[test]
    fn kind_of_values() {
        assert_eq!(Value::from(1i64).kind(), None);
        assert_eq!(Value::from(Pointer::from("p")).kind(), Some(Kind::Reference));
        assert_eq!(Value::from(ValueSet::new()).kind(), Some(Kind::Set));
    }
}
