//! Unique-element and key/value collections over [`Value`].
//!
//! Both keep insertion order. Uniqueness follows [`Value::same`]: objects are
//! compared by identity, everything else by equality.

use crate::value::Value;

/// An insertion-ordered collection of unique values.
#[derive(Clone, Debug, Default)]
pub struct ValueSet {
    items: Vec<Value>,
}

impl ValueSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `value`, returning `false` if an equal element was present.
    pub fn insert(&mut self, value: impl Into<Value>) -> bool {
        let value = value.into();
        if self.contains(&value) {
            return false;
        }
        self.items.push(value);
        true
    }

    pub fn contains(&self, value: &Value) -> bool {
        self.items.iter().any(|v| v.same(value))
    }

    pub fn remove(&mut self, value: &Value) -> bool {
        let before = self.items.len();
        self.items.retain(|v| !v.same(value));
        self.items.len() != before
    }

    pub fn iter(&self) -> impl Iterator<Item = &Value> {
        self.items.iter()
    }

    /// Mutable access to elements in place. Callers must not make two
    /// elements equal.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Value> {
        self.items.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl FromIterator<Value> for ValueSet {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        let mut set = Self::new();
        for v in iter {
            set.insert(v);
        }
        set
    }
}

/// An insertion-ordered key/value collection with unique keys.
#[derive(Clone, Debug, Default)]
pub struct ValueMap {
    entries: Vec<(Value, Value)>,
}

impl ValueMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `key` to `value`, returning the previous value for that key.
    pub fn insert(&mut self, key: impl Into<Value>, value: impl Into<Value>) -> Option<Value> {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| k.same(&key)) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    pub fn get(&self, key: &Value) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(k, _)| k.same(key))
            .map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &Value) -> bool {
        self.get(key).is_some()
    }

    pub fn remove(&mut self, key: &Value) -> Option<Value> {
        let idx = self.entries.iter().position(|(k, _)| k.same(key))?;
        Some(self.entries.remove(idx).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Value, &Value)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    /// Mutable access to keys and values in place. Callers must not make two
    /// keys equal.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&mut Value, &mut Value)> {
        self.entries.iter_mut().map(|(k, v)| (k, v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::ObjectRef;

    #[test]
    fn set_rejects_duplicate_scalars() {
        let mut set = ValueSet::new();
        assert!(set.insert(1i64));
        assert!(!set.insert(1i64));
        assert!(set.insert("1"));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn set_distinguishes_objects_by_identity() {
        let a = ObjectRef::sequence(vec![]);
        let b = ObjectRef::sequence(vec![]);
        let mut set = ValueSet::new();
        assert!(set.insert(&a));
        assert!(set.insert(&b));
        assert!(!set.insert(&a));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn set_remove() {
        let mut set: ValueSet = [Value::from(1i64), Value::from(2i64)].into_iter().collect();
        assert!(set.remove(&Value::from(1i64)));
        assert!(!set.remove(&Value::from(1i64)));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn map_insert_replaces_value() {
        let mut map = ValueMap::new();
        assert!(map.insert("a", 1i64).is_none());
        let prev = map.insert("a", 2i64);
        assert!(matches!(prev, Some(Value::Int(1))));
        assert_eq!(map.len(), 1);
        assert!(matches!(map.get(&Value::from("a")), Some(Value::Int(2))));
    }

    #[test]
    fn map_keeps_insertion_order() {
        let mut map = ValueMap::new();
        map.insert("z", 1i64);
        map.insert("a", 2i64);
        let keys: Vec<_> = map.iter().map(|(k, _)| k.as_text().unwrap().to_string()).collect();
        assert_eq!(keys, vec!["z", "a"]);
    }

    #[test]
    fn map_remove() {
        let mut map = ValueMap::new();
        map.insert(1i64, "one");
        assert!(map.contains_key(&Value::from(1i64)));
        assert!(map.remove(&Value::from(1i64)).is_some());
        assert!(map.is_empty());
    }
}
