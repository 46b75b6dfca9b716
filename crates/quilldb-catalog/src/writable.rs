//! Pending writable clone of a registered collection.

use std::sync::Arc;

use parking_lot::Mutex;

use quilldb_commons::CollectionUuid;

use crate::collection::Collection;

/// How a writable view of a collection was obtained, and therefore how its
/// changes reach the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifetimeMode {
    /// The working copy is installed when the enclosing unit of work
    /// commits; an abort never touches the catalog.
    ManagedInUnitOfWork,

    /// The caller owns the working copy and must finish it with exactly one
    /// of `commit_unmanaged_clone` or `discard_unmanaged_clone`.
    UnmanagedClone,
}

/// A working copy of a collection's metadata, not yet visible to readers.
///
/// Mutations go through [`update`]; nothing the caller does here is
/// observable through catalog lookups until the copy is installed (unit of
/// work commit for managed mode, `commit_unmanaged_clone` for clones).
/// Ownership enforces the exactly-once rule for unmanaged clones: both
/// commit and discard consume the value.
///
/// [`update`]: WritableCollection::update
pub struct WritableCollection {
    uuid: CollectionUuid,
    mode: LifetimeMode,
    working: Arc<Mutex<Collection>>,
}

impl WritableCollection {
    pub(crate) fn new(
        uuid: CollectionUuid,
        mode: LifetimeMode,
        working: Arc<Mutex<Collection>>,
    ) -> Self {
        Self {
            uuid,
            mode,
            working,
        }
    }

    /// UUID of the collection this copy was cloned from.
    #[inline]
    pub fn uuid(&self) -> CollectionUuid {
        self.uuid
    }

    /// The mode this view was obtained under.
    #[inline]
    pub fn mode(&self) -> LifetimeMode {
        self.mode
    }

    /// Mutates the working copy.
    pub fn update<R>(&self, f: impl FnOnce(&mut Collection) -> R) -> R {
        f(&mut self.working.lock())
    }

    /// Reads the working copy without installing it.
    pub fn peek<R>(&self, f: impl FnOnce(&Collection) -> R) -> R {
        f(&self.working.lock())
    }

    /// Extracts the working copy for installation.
    pub(crate) fn into_collection(self) -> Collection {
        // In managed mode the unit-of-work hook shares the Arc, so unwrap
        // can fail; fall back to cloning the guarded value.
        match Arc::try_unwrap(self.working) {
            Ok(mutex) => mutex.into_inner(),
            Err(shared) => shared.lock().clone(),
        }
    }
}
