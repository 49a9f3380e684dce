//! Reference tables for one save or load pass.
//!
//! [`SaveRefs`] recognises instances seen before. Each object gets a dense
//! [`NodeId`] the first time it is encountered, and ids that were stored
//! out-of-line map to the [`Pointer`] minted for them. The table holds a
//! handle to every identified object, so an address is never reused while
//! the pass runs.
//!
//! [`LoadRefs`] tracks pointers being dereferenced. An entry is created
//! `Unresolved` on first dereference and becomes `Resolved` exactly once,
//! when the pointed-to subgraph has finished loading.

use std::collections::{HashMap, HashSet};

use kw_types::{ObjectRef, Pointer, Value};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{CodecError, CodecResult};

/// Marks the random suffix of a pointer key.
pub const POINTER_MARK: char = '#';

/// Dense per-pass identifier of an object instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Save-side identity table.
pub struct SaveRefs {
    ids: HashMap<usize, NodeId>,
    nodes: Vec<ObjectRef>,
    pointers: HashMap<NodeId, Pointer>,
    minted: HashSet<Pointer>,
    rng: StdRng,
}

impl SaveRefs {
    /// An empty table. `seed` makes pointer suffixes reproducible.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            ids: HashMap::new(),
            nodes: Vec::new(),
            pointers: HashMap::new(),
            minted: HashSet::new(),
            rng,
        }
    }

    /// The id of `object`, assigning the next one on first encounter.
    pub fn identify(&mut self, object: &ObjectRef) -> NodeId {
        if let Some(id) = self.ids.get(&object.addr()) {
            return *id;
        }
        let id = NodeId(self.nodes.len());
        self.ids.insert(object.addr(), id);
        self.nodes.push(object.clone());
        id
    }

    pub fn object(&self, id: NodeId) -> Option<&ObjectRef> {
        self.nodes.get(id.0)
    }

    /// The pointer `id` was stored under, if it was stored out-of-line.
    pub fn pointer(&self, id: NodeId) -> Option<&Pointer> {
        self.pointers.get(&id)
    }

    /// Mint a pointer unique within this pass: `site`, a `#`, and eight
    /// random hex digits.
    pub fn mint(&mut self, site: &str) -> Pointer {
        loop {
            let suffix: [u8; 4] = self.rng.gen();
            let pointer = Pointer::new(format!("{site}{POINTER_MARK}{}", hex::encode(suffix)));
            if self.minted.insert(pointer.clone()) {
                return pointer;
            }
        }
    }

    /// Record that `id` lives under `pointer` from now on.
    pub fn bind(&mut self, id: NodeId, pointer: Pointer) {
        self.pointers.insert(id, pointer);
    }

    /// Number of distinct objects seen.
    pub fn objects_seen(&self) -> usize {
        self.nodes.len()
    }

    /// Number of objects stored out-of-line.
    pub fn pointers_bound(&self) -> usize {
        self.pointers.len()
    }
}

impl std::fmt::Debug for SaveRefs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SaveRefs")
            .field("objects_seen", &self.nodes.len())
            .field("pointers", &self.pointers.len())
            .finish()
    }
}

/// Resolution state of a dereferenced pointer.
#[derive(Clone, Debug)]
pub enum RefState {
    /// Its subgraph is still loading; callers get a placeholder.
    Unresolved,
    /// Fully loaded.
    Resolved(Value),
}

/// Load-side pointer table.
#[derive(Debug, Default)]
pub struct LoadRefs {
    entries: HashMap<Pointer, RefState>,
}

impl LoadRefs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self, pointer: &Pointer) -> Option<&RefState> {
        self.entries.get(pointer)
    }

    /// The loaded value behind `pointer`, once resolved.
    pub fn resolved(&self, pointer: &Pointer) -> Option<&Value> {
        match self.entries.get(pointer) {
            Some(RefState::Resolved(value)) => Some(value),
            _ => None,
        }
    }

    /// Mark `pointer` as being loaded.
    pub fn begin(&mut self, pointer: Pointer) -> CodecResult<()> {
        if self.entries.contains_key(&pointer) {
            return Err(CodecError::malformed(
                pointer.as_str(),
                "pointer dereferenced twice before resolving",
            ));
        }
        self.entries.insert(pointer, RefState::Unresolved);
        Ok(())
    }

    /// Transition `pointer` from unresolved to resolved.
    pub fn resolve(&mut self, pointer: &Pointer, value: Value) -> CodecResult<()> {
        let Some(state) = self.entries.get_mut(pointer) else {
            return Err(CodecError::malformed(
                pointer.as_str(),
                "pointer resolved without being dereferenced",
            ));
        };
        if let RefState::Resolved(_) = state {
            return Err(CodecError::malformed(pointer.as_str(), "pointer resolved twice"));
        }
        *state = RefState::Resolved(value);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn unresolved(&self) -> usize {
        self.entries
            .values()
            .filter(|s| matches!(s, RefState::Unresolved))
            .count()
    }
}
