//! The collection catalog: authoritative registry mapping collection UUIDs
//! and namespaces to live collection handles.
//!
//! Three indices are kept mutually consistent under one mutex:
//! - `by_uuid` for identifier lookup (includes awaiting-visibility entries)
//! - `ordered`, keyed by (database, UUID), for per-database enumeration
//! - `by_namespace` for name lookup (visible entries only)
//!
//! The same critical section covers the iterator generation counter, the
//! close/reopen epoch counter and the shadow map, so a reader taking the lock
//! always observes a fully-applied mutation or none of it. Critical sections
//! stay short: no I/O and no record-engine calls ever run under the lock.
//!
//! The resource name index and the profile settings store have their own
//! locks (see `resource` and `profile`); they are never held together with
//! the registry lock, so there is no cross-lock ordering to get wrong.

use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;
use std::sync::Arc;

use parking_lot::Mutex;

use quilldb_commons::{CollectionUuid, DatabaseName, Namespace, Timestamp};

use crate::collection::Collection;
use crate::error::CatalogError;
use crate::iter::CatalogIter;
use crate::profile::{ProfileSettings, ProfileSettingsStore};
use crate::resource::{ResourceId, ResourceNameIndex};
use crate::uow::{Change, UnitOfWork};
use crate::writable::{LifetimeMode, WritableCollection};

/// Callback run inside the critical section that installs a committed clone.
///
/// Handlers must not call back into the catalog; the registry lock is held.
pub type CommitHandler = Box<dyn FnOnce(Option<Timestamp>) + Send>;

/// A namespace, or a UUID qualified by the database the caller expects it to
/// live in. Commands address collections either way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NamespaceOrUuid {
    Namespace(Namespace),
    Uuid {
        db: DatabaseName,
        uuid: CollectionUuid,
    },
}

pub(crate) struct CatalogInner {
    by_uuid: HashMap<CollectionUuid, Arc<Collection>>,
    pub(crate) ordered: BTreeMap<(DatabaseName, CollectionUuid), Arc<Collection>>,
    by_namespace: HashMap<Namespace, Arc<Collection>>,

    /// Bumped on every mutation of `ordered`'s key set; iterators compare it
    /// to detect that their cached position may be stale.
    pub(crate) generation: u64,

    /// Bumped only by close/reopen cycles. Collection UUIDs survive a
    /// reopen, so callers that yielded across one need this to notice that
    /// every handle they held is suspect.
    epoch: u64,

    /// Present only while the catalog is closed: frozen UUID-to-namespace
    /// snapshot taken at close time.
    shadow: Option<HashMap<CollectionUuid, Namespace>>,
}

impl CatalogInner {
    /// All visible entries of one database, in (database, UUID) order.
    pub(crate) fn db_entries<'a>(
        &'a self,
        db: &'a DatabaseName,
    ) -> impl Iterator<Item = (&'a CollectionUuid, &'a Arc<Collection>)> + 'a {
        self.ordered
            .range((
                Bound::Included((db.clone(), CollectionUuid::nil())),
                Bound::Unbounded,
            ))
            .take_while(move |((d, _), _)| d == db)
            .map(|((_, uuid), coll)| (uuid, coll))
    }

    /// Installs a replacement handle for an already-registered collection
    /// into every index it currently appears in. Identity and namespace must
    /// be unchanged; renames have their own path.
    fn install(&mut self, installed: Arc<Collection>) {
        let uuid = installed.uuid();
        let ns = installed.ns().clone();
        let visible = self.by_namespace.contains_key(&ns);

        self.by_uuid.insert(uuid, Arc::clone(&installed));
        if visible {
            self.by_namespace.insert(ns.clone(), Arc::clone(&installed));
            self.ordered.insert((ns.db().clone(), uuid), installed);
        }
    }
}

/// The metadata catalog of a QuillDB server context.
///
/// One instance per context, created at startup and torn down at shutdown.
/// Every entry point may be called from any worker thread. Point lookups
/// hand out `Arc` clones of the stored handle; the handle's validity *as the
/// current collection* beyond the call is the caller's contract (typically
/// backed by a held database-level lock), not something the catalog
/// enforces.
pub struct CollectionCatalog {
    pub(crate) inner: Mutex<CatalogInner>,
    resources: ResourceNameIndex,
    profiles: ProfileSettingsStore,
}

impl CollectionCatalog {
    /// Creates an empty catalog whose absent profile entries resolve to
    /// `default_profile`.
    pub fn new(default_profile: ProfileSettings) -> Self {
        Self {
            inner: Mutex::new(CatalogInner {
                by_uuid: HashMap::new(),
                ordered: BTreeMap::new(),
                by_namespace: HashMap::new(),
                generation: 0,
                epoch: 0,
                shadow: None,
            }),
            resources: ResourceNameIndex::new(),
            profiles: ProfileSettingsStore::new(default_profile),
        }
    }

    // ===== Registration and visibility =====

    /// Registers `collection` under `uuid`. The entry starts *awaiting
    /// visibility*: it resolves by UUID immediately but stays out of
    /// namespace lookup and iteration until [`make_collection_visible`]
    /// promotes it, which is how partially-committed creates stay hidden.
    ///
    /// # Panics
    /// Registering an already-present UUID is a collaborator bug (double
    /// registration) and panics.
    ///
    /// [`make_collection_visible`]: CollectionCatalog::make_collection_visible
    pub fn register_collection(&self, uuid: CollectionUuid, collection: Arc<Collection>) {
        assert_eq!(
            uuid,
            collection.uuid(),
            "Registered UUID does not match the collection handle"
        );
        log::debug!("Registering collection '{}' ({})", collection.ns(), uuid);

        let mut inner = self.inner.lock();
        let previous = inner.by_uuid.insert(uuid, collection);
        assert!(
            previous.is_none(),
            "Collection {} is already registered",
            uuid
        );
    }

    /// Promotes an awaiting-visibility entry into the namespace and ordered
    /// indices.
    ///
    /// # Panics
    /// Panics if `uuid` is unknown or already visible; promotion is not
    /// idempotent and calling it twice is caller error.
    pub fn make_collection_visible(&self, uuid: CollectionUuid) {
        let mut inner = self.inner.lock();
        let collection = inner
            .by_uuid
            .get(&uuid)
            .cloned()
            .unwrap_or_else(|| panic!("Cannot make unknown collection {} visible", uuid));
        let ns = collection.ns().clone();

        log::debug!("Making collection '{}' ({}) visible", ns, uuid);
        let previous = inner
            .by_namespace
            .insert(ns.clone(), Arc::clone(&collection));
        assert!(
            previous.is_none(),
            "Collection {} is already visible as '{}'",
            uuid,
            ns
        );
        inner.ordered.insert((ns.db().clone(), uuid), collection);
        inner.generation += 1;
    }

    /// True if `uuid` is registered but not yet promoted to visibility.
    pub fn is_collection_awaiting_visibility(&self, uuid: CollectionUuid) -> bool {
        let inner = self.inner.lock();
        match inner.by_uuid.get(&uuid) {
            Some(coll) => !inner.by_namespace.contains_key(coll.ns()),
            None => false,
        }
    }

    /// Removes `uuid` from every index and returns the owned handle to the
    /// caller (e.g. to be finalized at transaction commit), or `None` if the
    /// UUID is unknown. Serves both true drops and the remove half of a
    /// rename.
    pub fn deregister_collection(&self, uuid: CollectionUuid) -> Option<Arc<Collection>> {
        let mut inner = self.inner.lock();
        let collection = inner.by_uuid.remove(&uuid)?;
        let ns = collection.ns().clone();

        log::debug!("Deregistering collection '{}' ({})", ns, uuid);
        if inner.by_namespace.remove(&ns).is_some() {
            inner.ordered.remove(&(ns.db().clone(), uuid));
            inner.generation += 1;
        }
        Some(collection)
    }

    /// Drops every registered collection, e.g. at context shutdown. The
    /// shadow map of a closed catalog is left in place.
    pub fn deregister_all_collections(&self) {
        let mut inner = self.inner.lock();
        log::info!(
            "Deregistering all collections ({} registered)",
            inner.by_uuid.len()
        );
        inner.by_uuid.clear();
        inner.by_namespace.clear();
        inner.ordered.clear();
        inner.generation += 1;
    }

    // ===== Point lookups =====

    /// Looks up a collection by UUID. Resolves awaiting-visibility entries
    /// too; collaborators rely on UUID lookup succeeding before promotion.
    pub fn lookup_collection_by_uuid(&self, uuid: CollectionUuid) -> Option<Arc<Collection>> {
        self.inner.lock().by_uuid.get(&uuid).cloned()
    }

    /// Looks up a visible collection by namespace.
    pub fn lookup_collection_by_namespace(&self, ns: &Namespace) -> Option<Arc<Collection>> {
        self.inner.lock().by_namespace.get(ns).cloned()
    }

    /// Resolves a UUID to its current namespace. While the catalog is
    /// closed, a miss falls back to the shadow snapshot so that consumers
    /// operating without strong locks (authorization, replication) can still
    /// resolve identifiers that existed before the close.
    pub fn lookup_nss_by_uuid(&self, uuid: CollectionUuid) -> Option<Namespace> {
        let inner = self.inner.lock();
        if let Some(coll) = inner.by_uuid.get(&uuid) {
            return Some(coll.ns().clone());
        }
        inner.shadow.as_ref()?.get(&uuid).cloned()
    }

    /// Returns the UUID registered for `ns`, if any.
    pub fn lookup_uuid_by_nss(&self, ns: &Namespace) -> Option<CollectionUuid> {
        self.inner
            .lock()
            .by_namespace
            .get(ns)
            .map(|coll| coll.uuid())
    }

    /// Resolves a namespace-or-UUID to an actual namespace. A UUID that
    /// resolves into a different database than the caller expected is a
    /// distinguishable namespace-not-found-class failure.
    pub fn resolve_namespace_or_uuid(
        &self,
        target: &NamespaceOrUuid,
    ) -> Result<Namespace, CatalogError> {
        match target {
            NamespaceOrUuid::Namespace(ns) => Ok(ns.clone()),
            NamespaceOrUuid::Uuid { db, uuid } => {
                let ns = self
                    .lookup_nss_by_uuid(*uuid)
                    .ok_or(CatalogError::NamespaceNotFound { uuid: *uuid })?;
                if ns.db() != db {
                    return Err(CatalogError::WrongDatabase {
                        uuid: *uuid,
                        actual: ns,
                        expected_db: db.clone(),
                    });
                }
                Ok(ns)
            }
        }
    }

    /// Whether the collection with `uuid` satisfies `predicate`; false if
    /// the UUID is unknown. The predicate runs under the registry lock and
    /// must not call back into the catalog.
    pub fn check_if_collection_satisfiable(
        &self,
        uuid: CollectionUuid,
        predicate: impl FnOnce(&Collection) -> bool,
    ) -> bool {
        let inner = self.inner.lock();
        match inner.by_uuid.get(&uuid) {
            Some(coll) => predicate(coll),
            None => false,
        }
    }

    // ===== Bulk reads =====

    /// UUIDs of all visible collections in `db`, in UUID order.
    ///
    /// Safe to call under a weak lock: without a strong database lock some
    /// of the returned UUIDs may already be gone by the time this returns.
    /// That race is accepted and documented; callers re-check on use.
    pub fn all_collection_uuids_from_db(&self, db: &DatabaseName) -> Vec<CollectionUuid> {
        let inner = self.inner.lock();
        inner.db_entries(db).map(|(uuid, _)| *uuid).collect()
    }

    /// Namespaces of all visible collections in `db`. The result is not
    /// sorted. The caller must hold a strong database-level lock for this to
    /// be point-in-time accurate.
    pub fn all_collection_names_from_db(&self, db: &DatabaseName) -> Vec<Namespace> {
        let inner = self.inner.lock();
        inner
            .db_entries(db)
            .map(|(_, coll)| coll.ns().clone())
            .collect()
    }

    /// All database names with at least one visible collection, sorted
    /// ascending. Same strong-lock contract as
    /// [`all_collection_names_from_db`].
    ///
    /// [`all_collection_names_from_db`]: CollectionCatalog::all_collection_names_from_db
    pub fn all_db_names(&self) -> Vec<DatabaseName> {
        let inner = self.inner.lock();
        let mut names: Vec<DatabaseName> = Vec::new();
        for (db, _) in inner.ordered.keys() {
            if names.last() != Some(db) {
                names.push(db.clone());
            }
        }
        names
    }

    // ===== Rename =====

    /// Renames the collection `uuid` from `from` to `to`, updating all three
    /// indices in one critical section. Must be called within a unit of
    /// work: the forward rename happens now, and a compensating reverse
    /// rename is registered to run if the unit of work aborts.
    ///
    /// # Panics
    /// Panics if `uuid` is unknown, is not currently named `from`, or if a
    /// visible collection already owns `to` — all collaborator bugs.
    pub fn set_collection_namespace(
        self: &Arc<Self>,
        uow: &mut UnitOfWork,
        uuid: CollectionUuid,
        from: &Namespace,
        to: &Namespace,
    ) {
        log::info!("Renaming collection {} from '{}' to '{}'", uuid, from, to);
        self.rename_now(uuid, from, to);

        let catalog = Arc::clone(self);
        let (from, to) = (from.clone(), to.clone());
        uow.on_rollback(move || {
            log::info!(
                "Rename of {} aborted, restoring namespace '{}'",
                uuid,
                from
            );
            catalog.rename_now(uuid, &to, &from);
        });
    }

    /// The forward index mutation shared by rename and its compensating
    /// rollback action.
    fn rename_now(&self, uuid: CollectionUuid, from: &Namespace, to: &Namespace) {
        let mut inner = self.inner.lock();
        let current = inner
            .by_uuid
            .get(&uuid)
            .cloned()
            .unwrap_or_else(|| panic!("Cannot rename unknown collection {}", uuid));
        assert_eq!(
            current.ns(),
            from,
            "Collection {} is not currently named '{}'",
            uuid,
            from
        );

        let mut renamed = (*current).clone();
        renamed.set_ns(to.clone());
        let renamed = Arc::new(renamed);

        inner.by_uuid.insert(uuid, Arc::clone(&renamed));
        if inner.by_namespace.remove(from).is_some() {
            let previous = inner.by_namespace.insert(to.clone(), Arc::clone(&renamed));
            assert!(
                previous.is_none(),
                "Target namespace '{}' is already registered",
                to
            );
            inner.ordered.remove(&(from.db().clone(), uuid));
            inner.ordered.insert((to.db().clone(), uuid), renamed);
            if from.db() != to.db() {
                inner.generation += 1;
            }
        }
    }

    // ===== Metadata writes (lifetime controller) =====

    /// Obtains a writable view whose lifetime is managed by `uow`: the
    /// working copy is installed into the catalog inside the registry
    /// critical section when the unit of work commits. On abort the catalog
    /// is never touched.
    pub fn collection_for_managed_write(
        self: &Arc<Self>,
        uow: &mut UnitOfWork,
        uuid: CollectionUuid,
    ) -> Option<WritableCollection> {
        let current = self.lookup_collection_by_uuid(uuid)?;
        let working = Arc::new(Mutex::new((*current).clone()));
        let writable =
            WritableCollection::new(uuid, LifetimeMode::ManagedInUnitOfWork, Arc::clone(&working));

        let catalog = Arc::clone(self);
        uow.on_commit(move |commit_time| {
            let committed = working.lock().clone();
            catalog.install_collection(committed, commit_time, Vec::new());
        });
        Some(writable)
    }

    /// Namespace-addressed variant of [`collection_for_managed_write`].
    ///
    /// [`collection_for_managed_write`]: CollectionCatalog::collection_for_managed_write
    pub fn collection_for_managed_write_by_namespace(
        self: &Arc<Self>,
        uow: &mut UnitOfWork,
        ns: &Namespace,
    ) -> Option<WritableCollection> {
        let uuid = self.lookup_uuid_by_nss(ns)?;
        self.collection_for_managed_write(uow, uuid)
    }

    /// Obtains an independent writable clone outside any unit of work. The
    /// caller must finish it with exactly one of [`commit_unmanaged_clone`]
    /// or [`discard_unmanaged_clone`]; ownership makes calling both
    /// impossible.
    ///
    /// [`commit_unmanaged_clone`]: CollectionCatalog::commit_unmanaged_clone
    /// [`discard_unmanaged_clone`]: CollectionCatalog::discard_unmanaged_clone
    pub fn collection_for_unmanaged_clone(
        &self,
        uuid: CollectionUuid,
    ) -> Option<WritableCollection> {
        let current = self.lookup_collection_by_uuid(uuid)?;
        Some(WritableCollection::new(
            uuid,
            LifetimeMode::UnmanagedClone,
            Arc::new(Mutex::new((*current).clone())),
        ))
    }

    /// Namespace-addressed variant of [`collection_for_unmanaged_clone`].
    ///
    /// [`collection_for_unmanaged_clone`]: CollectionCatalog::collection_for_unmanaged_clone
    pub fn collection_for_unmanaged_clone_by_namespace(
        &self,
        ns: &Namespace,
    ) -> Option<WritableCollection> {
        let uuid = self.lookup_uuid_by_nss(ns)?;
        self.collection_for_unmanaged_clone(uuid)
    }

    /// Atomically installs an unmanaged clone in place of the original.
    /// `handlers` run in registration order inside the same critical section
    /// that swaps the handle, so no reader can observe the new handle before
    /// every handler has run, nor a handler's effect before the swap.
    ///
    /// # Panics
    /// Panics if `writable` was not obtained in unmanaged-clone mode, or if
    /// the collection was deregistered since the clone was taken.
    pub fn commit_unmanaged_clone(
        &self,
        writable: WritableCollection,
        commit_time: Option<Timestamp>,
        handlers: Vec<CommitHandler>,
    ) {
        assert_eq!(
            writable.mode(),
            LifetimeMode::UnmanagedClone,
            "commit_unmanaged_clone called on a managed write"
        );
        self.install_collection(writable.into_collection(), commit_time, handlers);
    }

    /// Drops an unmanaged clone without any catalog effect. Lookups keep
    /// returning the original handle.
    pub fn discard_unmanaged_clone(&self, writable: WritableCollection) {
        assert_eq!(
            writable.mode(),
            LifetimeMode::UnmanagedClone,
            "discard_unmanaged_clone called on a managed write"
        );
        log::debug!("Discarding unmanaged clone of {}", writable.uuid());
    }

    /// In-place mutation of the installed handle: `mutator` runs and the
    /// result is installed under the registry lock in one step, immediately
    /// visible, bypassing the clone/commit protocol. Only valid when the
    /// caller can guarantee no concurrent reader depends on the previous
    /// handle (e.g. exclusive server state); the catalog adds no further
    /// synchronization for this mode. Returns false if `uuid` is unknown.
    pub fn update_collection_inplace(
        &self,
        uuid: CollectionUuid,
        mutator: impl FnOnce(&mut Collection),
    ) -> bool {
        let mut inner = self.inner.lock();
        let Some(current) = inner.by_uuid.get(&uuid) else {
            return false;
        };
        let mut updated = (**current).clone();
        mutator(&mut updated);
        assert_eq!(
            updated.ns(),
            current.ns(),
            "Namespace changes must go through set_collection_namespace"
        );
        inner.install(Arc::new(updated));
        true
    }

    fn install_collection(
        &self,
        committed: Collection,
        commit_time: Option<Timestamp>,
        handlers: Vec<CommitHandler>,
    ) {
        let uuid = committed.uuid();
        let mut inner = self.inner.lock();
        let current = inner
            .by_uuid
            .get(&uuid)
            .unwrap_or_else(|| panic!("Cannot install clone of unregistered collection {}", uuid));
        assert_eq!(
            current.ns(),
            committed.ns(),
            "Namespace changes must go through set_collection_namespace"
        );

        // Handlers and the handle swap are one atomic step for readers.
        for handler in handlers {
            handler(commit_time);
        }
        inner.install(Arc::new(committed));
        log::debug!("Installed updated collection handle for {}", uuid);
    }

    /// Builds the reversible finish-drop action for the transaction
    /// subsystem: commit finalizes the drop, rollback restores the
    /// collection into the catalog and re-promotes it to visibility.
    pub fn make_finish_drop_collection_change(
        self: &Arc<Self>,
        collection: Arc<Collection>,
        uuid: CollectionUuid,
    ) -> Box<dyn Change> {
        Box::new(FinishDropChange {
            catalog: Arc::clone(self),
            collection,
            uuid,
        })
    }

    // ===== Close/reopen epoch =====

    /// Puts the catalog in the closed state, snapshotting the current
    /// UUID-to-namespace mapping into the shadow map. The live indices are
    /// untouched. The caller must hold the context's strongest exclusivity
    /// (no concurrent catalog operations); that guarantee lives above this
    /// crate.
    ///
    /// # Panics
    /// Panics if the catalog is already closed.
    pub fn on_close_catalog(&self) {
        let mut inner = self.inner.lock();
        assert!(
            inner.shadow.is_none(),
            "on_close_catalog called on an already closed catalog"
        );
        log::info!(
            "Closing collection catalog ({} collections)",
            inner.by_uuid.len()
        );
        inner.shadow = Some(
            inner
                .by_uuid
                .iter()
                .map(|(uuid, coll)| (*uuid, coll.ns().clone()))
                .collect(),
        );
    }

    /// Reopens the catalog: discards the shadow map and increments the
    /// epoch. Same exclusivity contract as [`on_close_catalog`].
    ///
    /// # Panics
    /// Panics if the catalog is not closed.
    ///
    /// [`on_close_catalog`]: CollectionCatalog::on_close_catalog
    pub fn on_open_catalog(&self) {
        let mut inner = self.inner.lock();
        assert!(
            inner.shadow.take().is_some(),
            "on_open_catalog called on an open catalog"
        );
        inner.epoch += 1;
        log::info!("Collection catalog reopened (epoch {})", inner.epoch);
    }

    /// Monotonically increasing close/reopen counter. Callers compare the
    /// value across a yield point; inequality means the catalog was rebuilt
    /// and every previously obtained handle is suspect.
    pub fn epoch(&self) -> u64 {
        self.inner.lock().epoch
    }

    // ===== Iteration =====

    /// Snapshot-stable iterator over one database's visible collections.
    /// Forward-only and single-pass: entries removed mid-iteration may be
    /// skipped, entries already yielded are never revisited.
    pub fn collections_in_db(self: &Arc<Self>, db: &DatabaseName) -> CatalogIter {
        CatalogIter::new(Arc::clone(self), db.clone())
    }

    // ===== Database close, resource names, profiling =====

    /// Database teardown hook: forgets the database's resource-name entry.
    pub fn on_close_database(&self, db: &DatabaseName) {
        log::debug!("Closing database '{}'", db);
        self.resources
            .remove(ResourceId::for_database(db), db.as_str());
    }

    /// Records `name` under the lock-manager token `rid`.
    pub fn add_resource(&self, rid: ResourceId, name: &str) {
        self.resources.add(rid, name);
    }

    /// Removes `name` from the token `rid`.
    pub fn remove_resource(&self, rid: ResourceId, name: &str) {
        self.resources.remove(rid, name);
    }

    /// Best-effort name for `rid`: `None` when the token is unknown or maps
    /// to more than one name.
    pub fn lookup_resource_name(&self, rid: ResourceId) -> Option<String> {
        self.resources.lookup(rid)
    }

    /// Sets the profiling settings for `db`.
    pub fn set_database_profile_settings(&self, db: &DatabaseName, settings: ProfileSettings) {
        self.profiles.set(db, settings);
    }

    /// Profiling settings for `db`; unknown databases report the server-wide
    /// default.
    pub fn get_database_profile_settings(&self, db: &DatabaseName) -> ProfileSettings {
        self.profiles.get(db)
    }

    /// Convenience accessor for just the profiling level of `db`.
    pub fn get_database_profile_level(&self, db: &DatabaseName) -> u8 {
        self.profiles.get_level(db)
    }

    /// Reverts `db` to the server-wide default profiling settings.
    pub fn clear_database_profile_settings(&self, db: &DatabaseName) {
        self.profiles.clear(db);
    }
}

impl Default for CollectionCatalog {
    fn default() -> Self {
        Self::new(ProfileSettings::default())
    }
}

struct FinishDropChange {
    catalog: Arc<CollectionCatalog>,
    collection: Arc<Collection>,
    uuid: CollectionUuid,
}

impl Change for FinishDropChange {
    fn commit(self: Box<Self>, _commit_time: Option<Timestamp>) {
        log::info!(
            "Finished drop of collection '{}' ({})",
            self.collection.ns(),
            self.uuid
        );
        // Dropping the last reference releases the handle; physical cleanup
        // belongs to the record engine.
    }

    fn rollback(self: Box<Self>) {
        log::info!(
            "Drop of collection '{}' ({}) rolled back, restoring",
            self.collection.ns(),
            self.uuid
        );
        self.catalog
            .register_collection(self.uuid, Arc::clone(&self.collection));
        self.catalog.make_collection_visible(self.uuid);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_collection(db: &str, coll: &str) -> (CollectionUuid, Arc<Collection>) {
        let uuid = CollectionUuid::new();
        let collection = Arc::new(Collection::new(uuid, Namespace::from_strings(db, coll)));
        (uuid, collection)
    }

    fn register_visible(catalog: &CollectionCatalog, db: &str, coll: &str) -> CollectionUuid {
        let (uuid, collection) = create_test_collection(db, coll);
        catalog.register_collection(uuid, collection);
        catalog.make_collection_visible(uuid);
        uuid
    }

    #[test]
    fn test_register_then_lookup_by_uuid_and_namespace() {
        let catalog = CollectionCatalog::default();
        let uuid = register_visible(&catalog, "db1", "a");

        let by_uuid = catalog
            .lookup_collection_by_uuid(uuid)
            .expect("Should resolve by UUID");
        assert_eq!(by_uuid.ns(), &Namespace::from_strings("db1", "a"));

        let by_ns = catalog
            .lookup_collection_by_namespace(&Namespace::from_strings("db1", "a"))
            .expect("Should resolve by namespace");
        assert_eq!(by_ns.uuid(), uuid);

        assert_eq!(
            catalog.lookup_uuid_by_nss(&Namespace::from_strings("db1", "a")),
            Some(uuid)
        );
    }

    #[test]
    fn test_awaiting_visibility_split() {
        let catalog = CollectionCatalog::default();
        let (uuid, collection) = create_test_collection("db1", "pending");
        catalog.register_collection(uuid, collection);

        // UUID lookup succeeds before promotion.
        assert!(catalog.lookup_collection_by_uuid(uuid).is_some());
        assert!(catalog.is_collection_awaiting_visibility(uuid));

        // Namespace lookup and enumeration do not see it.
        let ns = Namespace::from_strings("db1", "pending");
        assert!(catalog.lookup_collection_by_namespace(&ns).is_none());
        assert!(catalog
            .all_collection_uuids_from_db(&DatabaseName::new("db1"))
            .is_empty());

        catalog.make_collection_visible(uuid);
        assert!(!catalog.is_collection_awaiting_visibility(uuid));
        assert!(catalog.lookup_collection_by_namespace(&ns).is_some());
        assert_eq!(
            catalog.all_collection_uuids_from_db(&DatabaseName::new("db1")),
            vec![uuid]
        );
    }

    #[test]
    #[should_panic(expected = "already registered")]
    fn test_duplicate_registration_panics() {
        let catalog = CollectionCatalog::default();
        let (uuid, collection) = create_test_collection("db1", "a");
        catalog.register_collection(uuid, Arc::clone(&collection));
        catalog.register_collection(uuid, collection);
    }

    #[test]
    #[should_panic(expected = "already visible")]
    fn test_double_visibility_promotion_panics() {
        let catalog = CollectionCatalog::default();
        let (uuid, collection) = create_test_collection("db1", "a");
        catalog.register_collection(uuid, collection);
        catalog.make_collection_visible(uuid);
        catalog.make_collection_visible(uuid);
    }

    #[test]
    fn test_deregister_returns_handle_and_clears_indices() {
        let catalog = CollectionCatalog::default();
        let uuid = register_visible(&catalog, "db1", "a");

        let handle = catalog
            .deregister_collection(uuid)
            .expect("Should return the owned handle");
        assert_eq!(handle.uuid(), uuid);

        assert!(catalog.lookup_collection_by_uuid(uuid).is_none());
        assert!(catalog
            .lookup_collection_by_namespace(&Namespace::from_strings("db1", "a"))
            .is_none());
        assert!(catalog
            .all_collection_uuids_from_db(&DatabaseName::new("db1"))
            .is_empty());

        // Unknown UUID is an expected miss, not an error.
        assert!(catalog.deregister_collection(uuid).is_none());
    }

    #[test]
    fn test_all_db_names_sorted_and_deduped() {
        let catalog = CollectionCatalog::default();
        register_visible(&catalog, "zoo", "a");
        register_visible(&catalog, "app", "a");
        register_visible(&catalog, "app", "b");

        let names = catalog.all_db_names();
        assert_eq!(
            names,
            vec![DatabaseName::new("app"), DatabaseName::new("zoo")]
        );
    }

    #[test]
    fn test_resolve_namespace_or_uuid() {
        let catalog = CollectionCatalog::default();
        let uuid = register_visible(&catalog, "db1", "a");

        let ns = catalog
            .resolve_namespace_or_uuid(&NamespaceOrUuid::Uuid {
                db: DatabaseName::new("db1"),
                uuid,
            })
            .expect("Should resolve");
        assert_eq!(ns, Namespace::from_strings("db1", "a"));

        // Wrong database is a distinguishable namespace-not-found failure.
        let err = catalog
            .resolve_namespace_or_uuid(&NamespaceOrUuid::Uuid {
                db: DatabaseName::new("db2"),
                uuid,
            })
            .expect_err("Should fail");
        assert!(matches!(err, CatalogError::WrongDatabase { .. }));
        assert!(err.is_namespace_not_found());

        // Unknown UUID.
        let err = catalog
            .resolve_namespace_or_uuid(&NamespaceOrUuid::Uuid {
                db: DatabaseName::new("db1"),
                uuid: CollectionUuid::new(),
            })
            .expect_err("Should fail");
        assert!(matches!(err, CatalogError::NamespaceNotFound { .. }));

        // The namespace arm resolves verbatim.
        let ns = Namespace::from_strings("db9", "whatever");
        assert_eq!(
            catalog.resolve_namespace_or_uuid(&NamespaceOrUuid::Namespace(ns.clone())),
            Ok(ns)
        );
    }

    #[test]
    fn test_check_if_collection_satisfiable() {
        let catalog = CollectionCatalog::default();
        let uuid = register_visible(&catalog, "db1", "a");

        assert!(catalog.check_if_collection_satisfiable(uuid, |c| !c.options().capped));
        assert!(!catalog.check_if_collection_satisfiable(uuid, |c| c.options().capped));
        assert!(!catalog.check_if_collection_satisfiable(CollectionUuid::new(), |_| true));
    }

    #[test]
    fn test_epoch_and_shadow_fallback() {
        let catalog = CollectionCatalog::default();
        let uuid = register_visible(&catalog, "db1", "a");
        let epoch_before = catalog.epoch();

        catalog.on_close_catalog();
        catalog.deregister_collection(uuid);

        // While closed, the shadow snapshot still resolves the UUID.
        assert_eq!(
            catalog.lookup_nss_by_uuid(uuid),
            Some(Namespace::from_strings("db1", "a"))
        );

        catalog.on_open_catalog();
        assert_eq!(catalog.lookup_nss_by_uuid(uuid), None);
        assert!(catalog.epoch() > epoch_before);
    }

    #[test]
    #[should_panic(expected = "already closed")]
    fn test_double_close_panics() {
        let catalog = CollectionCatalog::default();
        catalog.on_close_catalog();
        catalog.on_close_catalog();
    }

    #[test]
    fn test_close_leaves_live_indices_untouched() {
        let catalog = CollectionCatalog::default();
        let uuid = register_visible(&catalog, "db1", "a");

        catalog.on_close_catalog();
        assert!(catalog.lookup_collection_by_uuid(uuid).is_some());
        assert_eq!(
            catalog.all_collection_uuids_from_db(&DatabaseName::new("db1")),
            vec![uuid]
        );
        catalog.on_open_catalog();
    }

    #[test]
    fn test_rename_atomicity_under_lock() {
        let catalog = Arc::new(CollectionCatalog::default());
        let uuid = register_visible(&catalog, "db1", "a");
        let from = Namespace::from_strings("db1", "a");
        let to = Namespace::from_strings("db1", "b");

        let mut uow = UnitOfWork::new();
        catalog.set_collection_namespace(&mut uow, uuid, &from, &to);

        // Old name gone, new name present, same UUID.
        assert!(catalog.lookup_collection_by_namespace(&from).is_none());
        assert_eq!(catalog.lookup_uuid_by_nss(&to), Some(uuid));
        assert_eq!(catalog.lookup_nss_by_uuid(uuid), Some(to.clone()));
        uow.commit(None);

        assert_eq!(catalog.lookup_uuid_by_nss(&to), Some(uuid));
    }

    #[test]
    fn test_rename_reverts_on_abort() {
        let catalog = Arc::new(CollectionCatalog::default());
        let uuid = register_visible(&catalog, "db1", "a");
        let from = Namespace::from_strings("db1", "a");
        let to = Namespace::from_strings("db1", "b");

        let mut uow = UnitOfWork::new();
        catalog.set_collection_namespace(&mut uow, uuid, &from, &to);
        uow.abort();

        assert_eq!(catalog.lookup_nss_by_uuid(uuid), Some(from.clone()));
        assert_eq!(catalog.lookup_uuid_by_nss(&from), Some(uuid));
        assert!(catalog.lookup_collection_by_namespace(&to).is_none());
    }

    #[test]
    fn test_cross_db_rename_moves_ordered_entry() {
        let catalog = Arc::new(CollectionCatalog::default());
        let uuid = register_visible(&catalog, "db1", "a");
        let from = Namespace::from_strings("db1", "a");
        let to = Namespace::from_strings("db2", "a");

        let mut uow = UnitOfWork::new();
        catalog.set_collection_namespace(&mut uow, uuid, &from, &to);
        uow.commit(None);

        assert!(catalog
            .all_collection_uuids_from_db(&DatabaseName::new("db1"))
            .is_empty());
        assert_eq!(
            catalog.all_collection_uuids_from_db(&DatabaseName::new("db2")),
            vec![uuid]
        );
    }

    #[test]
    fn test_inplace_update_immediately_visible() {
        let catalog = CollectionCatalog::default();
        let uuid = register_visible(&catalog, "db1", "a");

        let updated = catalog.update_collection_inplace(uuid, |c| {
            c.options_mut().comment = Some("inplace".into());
        });
        assert!(updated);

        let coll = catalog
            .lookup_collection_by_uuid(uuid)
            .expect("Should resolve");
        assert_eq!(coll.options().comment.as_deref(), Some("inplace"));

        assert!(!catalog.update_collection_inplace(CollectionUuid::new(), |_| {}));
    }

    #[test]
    fn test_finish_drop_change_rollback_restores() {
        let catalog = Arc::new(CollectionCatalog::default());
        let uuid = register_visible(&catalog, "db1", "a");

        let mut uow = UnitOfWork::new();
        let handle = catalog
            .deregister_collection(uuid)
            .expect("Should deregister");
        uow.register_change(catalog.make_finish_drop_collection_change(handle, uuid));

        assert!(catalog.lookup_collection_by_uuid(uuid).is_none());
        uow.abort();

        // Restored and visible again.
        assert_eq!(
            catalog.lookup_uuid_by_nss(&Namespace::from_strings("db1", "a")),
            Some(uuid)
        );
    }
}
