//! Lock-manager resource tokens and the diagnostic name index.
//!
//! `ResourceId` is a hashed token, deliberately coarser than collection
//! UUIDs: two namespaces can hash to the same id. The index therefore keeps a
//! *set* of names per id and only resolves a name when it is unambiguous.
//! Write traffic here follows database/collection lock lifecycle, not
//! collection metadata changes, so the index carries its own mutex instead of
//! sharing the registry's.

use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, BTreeSet};
use std::hash::{Hash, Hasher};

use parking_lot::Mutex;

use quilldb_commons::{DatabaseName, Namespace};

/// Granularity of the resource a token names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceType {
    Database,
    Collection,
}

/// Lock-manager-style resource token: a type discriminant plus a 64-bit name
/// hash. Collisions are possible by design and handled by the name index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId {
    kind: ResourceType,
    hash: u64,
}

impl ResourceId {
    fn hashed(kind: ResourceType, name: &str) -> Self {
        let mut hasher = DefaultHasher::new();
        name.hash(&mut hasher);
        Self {
            kind,
            hash: hasher.finish(),
        }
    }

    /// Token for a whole database.
    pub fn for_database(db: &DatabaseName) -> Self {
        Self::hashed(ResourceType::Database, db.as_str())
    }

    /// Token for a single collection namespace.
    pub fn for_namespace(ns: &Namespace) -> Self {
        Self::hashed(ResourceType::Collection, &ns.to_string())
    }

    /// The granularity of this token.
    #[inline]
    pub fn kind(&self) -> ResourceType {
        self.kind
    }
}

/// Identifier-keyed set of namespace strings, used to answer "what is locked
/// under this ResourceId" in diagnostics output.
#[derive(Debug, Default)]
pub struct ResourceNameIndex {
    entries: Mutex<BTreeMap<ResourceId, BTreeSet<String>>>,
}

impl ResourceNameIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `name` under `rid`.
    pub fn add(&self, rid: ResourceId, name: &str) {
        let mut entries = self.entries.lock();
        entries.entry(rid).or_default().insert(name.to_string());
    }

    /// Removes `name` from `rid`, dropping the entry when its set empties.
    /// Removing an unknown pairing is a no-op.
    pub fn remove(&self, rid: ResourceId, name: &str) {
        let mut entries = self.entries.lock();
        if let Some(names) = entries.get_mut(&rid) {
            names.remove(name);
            if names.is_empty() {
                entries.remove(&rid);
            }
        }
    }

    /// Resolves `rid` to a name only when exactly one name is recorded for
    /// it. Absent and ambiguous ids both return `None`; ambiguity is not an
    /// error, the caller is producing best-effort diagnostics.
    pub fn lookup(&self, rid: ResourceId) -> Option<String> {
        let entries = self.entries.lock();
        let names = entries.get(&rid)?;
        if names.len() == 1 {
            names.iter().next().cloned()
        } else {
            None
        }
    }
}
