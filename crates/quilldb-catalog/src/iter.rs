//! Snapshot-stable iteration over one database's collections.
//!
//! The registry lock is only held inside `next()`, never across the caller's
//! use of a yielded handle, so the ordered index is free to change between
//! steps. The iterator snapshots *keys only*; the handle is fetched from the
//! live ordered index under the lock at each step, so a commit that swaps
//! the stored handle (install, same-database rename) is observed by the very
//! next `next()` call. The iterator carries the generation number captured
//! when its key snapshot was taken: while the live counter still matches,
//! the snapshot is exact (nothing structural happened). On a mismatch it
//! repositions with a bounded lower-bound scan strictly after the last
//! yielded key, which may skip entries removed in the meantime and can never
//! revisit an entry already yielded.

use std::collections::VecDeque;
use std::ops::Bound;
use std::sync::Arc;

use quilldb_commons::{CollectionUuid, DatabaseName};

use crate::catalog::{CatalogInner, CollectionCatalog};
use crate::collection::Collection;

/// Forward-only, single-pass iterator over the visible collections of one
/// database, in (database, UUID) order.
///
/// Safe to hold across yield points if the caller tolerates
/// skip-but-never-revisit semantics; to restart, construct a new iterator.
pub struct CatalogIter {
    catalog: Arc<CollectionCatalog>,
    db: DatabaseName,
    generation: u64,
    cached: VecDeque<CollectionUuid>,
    last_yielded: Option<CollectionUuid>,
    current: Option<CollectionUuid>,
    exhausted: bool,
}

impl CatalogIter {
    pub(crate) fn new(catalog: Arc<CollectionCatalog>, db: DatabaseName) -> Self {
        let mut iter = Self {
            catalog,
            db,
            generation: 0,
            cached: VecDeque::new(),
            last_yielded: None,
            current: None,
            exhausted: false,
        };
        let catalog = Arc::clone(&iter.catalog);
        let inner = catalog.inner.lock();
        iter.reposition(&inner);
        iter
    }

    /// Recaptures the generation number and the remaining keys strictly
    /// after the last yielded key.
    fn reposition(&mut self, inner: &CatalogInner) {
        self.generation = inner.generation;
        let start = match self.last_yielded {
            Some(uuid) => Bound::Excluded((self.db.clone(), uuid)),
            None => Bound::Included((self.db.clone(), CollectionUuid::nil())),
        };
        self.cached = inner
            .ordered
            .range((start, Bound::Unbounded))
            .take_while(|((db, _), _)| db == &self.db)
            .map(|((_, uuid), _)| *uuid)
            .collect();
    }

    /// UUID at the current position: the entry most recently yielded, or
    /// `None` before the first `next()` and after exhaustion.
    pub fn uuid(&self) -> Option<CollectionUuid> {
        self.current
    }

    /// Whether the iterator has run past the last key of its database scope.
    /// Does not reposition: a stale iterator reports its stale exhaustion
    /// state, which is well-defined for comparisons.
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Positional identity: same database scope and same next-to-yield
    /// entry. An iterator with nothing left to yield compares equal to a
    /// drained one, whether or not `next()` has observed the exhaustion yet.
    /// Never forces a reposition of either side.
    pub fn eq_position(&self, other: &CatalogIter) -> bool {
        self.db == other.db && self.next_key() == other.next_key()
    }

    fn next_key(&self) -> Option<CollectionUuid> {
        if self.exhausted {
            None
        } else {
            self.cached.front().copied()
        }
    }
}

impl Iterator for CatalogIter {
    type Item = Arc<Collection>;

    fn next(&mut self) -> Option<Arc<Collection>> {
        if self.exhausted {
            return None;
        }

        let catalog = Arc::clone(&self.catalog);
        let inner = catalog.inner.lock();
        if inner.generation != self.generation {
            self.reposition(&inner);
        }

        // Fetch the handle from the live index so a committed install or
        // same-database rename (which swaps the value without moving any
        // key) is observed immediately. A cached key can only be missing if
        // it was removed since the snapshot; skip it.
        loop {
            match self.cached.pop_front() {
                Some(uuid) => {
                    if let Some(coll) = inner.ordered.get(&(self.db.clone(), uuid)) {
                        let coll = Arc::clone(coll);
                        self.last_yielded = Some(uuid);
                        self.current = Some(uuid);
                        return Some(coll);
                    }
                }
                None => {
                    self.exhausted = true;
                    self.current = None;
                    return None;
                }
            }
        }
    }
}
