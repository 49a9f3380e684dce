//! Completion sweep.
//!
//! Loading a cycle hands out placeholders for pointers still in progress.
//! Once a pointer resolves, [`complete`] walks the freshly loaded subgraph
//! and swaps every placeholder whose pointer is now resolved for the real
//! value, in place in its parent.
//!
//! The walk is depth-first over contained values and visits each object at
//! most once, so it terminates on cyclic graphs. Scalars and nulls end a
//! branch immediately. Only one object is locked at a time.

use std::collections::HashSet;

use kw_types::{ObjectRef, Value};
use tracing::trace;

use crate::refs::LoadRefs;

/// Replace resolved placeholders reachable from `root`. Returns how many
/// were replaced.
pub fn complete(root: &Value, refs: &LoadRefs) -> usize {
    let Some(start) = root.as_object() else {
        return 0;
    };

    let mut visited: HashSet<usize> = HashSet::new();
    let mut stack: Vec<ObjectRef> = vec![start.clone()];
    let mut replaced = 0;

    while let Some(object) = stack.pop() {
        if !visited.insert(object.addr()) {
            continue;
        }
        let mut guard = object.write();
        for slot in guard.values_mut() {
            let resolved = match &*slot {
                Value::Reference(pointer) => refs.resolved(pointer).cloned(),
                _ => None,
            };
            if let Some(value) = resolved {
                *slot = value;
                replaced += 1;
            }
            if let Value::Object(child) = &*slot {
                if !visited.contains(&child.addr()) {
                    stack.push(child.clone());
                }
            }
        }
    }

    trace!(visited = visited.len(), replaced, "completion sweep finished");
    replaced
}

#[cfg(test)]
mod tests {
    use super::*;
    use kw_types::{Object, Pointer, Record, ValueMap};

    fn node() -> ObjectRef {
        ObjectRef::record(Record::new("Node"))
    }

    fn set_field(obj: &ObjectRef, name: &str, value: Value) {
        obj.with_record_mut(|r| r.insert(name, value).map(drop))
            .unwrap()
            .unwrap();
    }

    #[test]
    fn scalars_need_no_sweep() {
        assert_eq!(complete(&Value::from(1i64), &LoadRefs::new()), 0);
    }

    #[test]
    fn replaces_resolved_placeholder() {
        let a = node();
        let p = Pointer::from("p");
        set_field(&a, "me", Value::Reference(p.clone()));

        let mut refs = LoadRefs::new();
        refs.begin(p.clone()).unwrap();
        refs.resolve(&p, Value::from(&a)).unwrap();

        assert_eq!(complete(&Value::from(&a), &refs), 1);
        let me = a.field("me").unwrap();
        assert!(me.as_object().unwrap().ptr_eq(&a));
    }

    #[test]
    fn leaves_unresolved_placeholder() {
        let a = node();
        let p = Pointer::from("p");
        set_field(&a, "other", Value::Reference(p.clone()));

        let mut refs = LoadRefs::new();
        refs.begin(p.clone()).unwrap();

        assert_eq!(complete(&Value::from(&a), &refs), 0);
        assert!(matches!(a.field("other"), Some(Value::Reference(_))));
    }

    #[test]
    fn reaches_nested_containers() {
        let target = node();
        let p = Pointer::from("p");
        let mut map = ValueMap::new();
        map.insert("k", Value::Reference(p.clone()));
        let seq = ObjectRef::sequence(vec![Value::from(Object::Map(map)), Value::Reference(p.clone())]);

        let mut refs = LoadRefs::new();
        refs.begin(p.clone()).unwrap();
        refs.resolve(&p, Value::from(&target)).unwrap();

        assert_eq!(complete(&Value::from(&seq), &refs), 2);
    }

    #[test]
    fn terminates_on_cycles() {
        let a = node();
        let b = node();
        set_field(&a, "next", Value::from(&b));
        set_field(&b, "next", Value::from(&a));
        assert_eq!(complete(&Value::from(&a), &LoadRefs::new()), 0);
    }
}
