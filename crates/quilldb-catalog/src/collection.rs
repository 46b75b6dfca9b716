//! Collection handle stored and indexed by the catalog.
//!
//! The catalog never inspects the record engine behind a collection; it only
//! stores and hands out shared references to this handle. Metadata the
//! catalog's clone-for-write protocol exists for (options, validators) lives
//! here; everything physical hides behind [`RecordStore`].

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use quilldb_commons::{CollectionUuid, Namespace};

/// Opaque handle to a collection's physical storage, owned by the record
/// engine. The catalog shares it across metadata clones untouched.
pub trait RecordStore: Send + Sync + fmt::Debug {
    /// Engine-assigned identifier, for diagnostics only.
    fn ident(&self) -> &str;
}

/// Mutable collection metadata. This is what writers actually change through
/// the catalog's managed/clone/in-place write modes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionOptions {
    /// Fixed-size collection flag.
    #[serde(default)]
    pub capped: bool,

    /// Document validator expression, opaque to the catalog.
    #[serde(default)]
    pub validator: Option<String>,

    /// Free-form user comment.
    #[serde(default)]
    pub comment: Option<String>,
}

/// Live in-memory representation of one collection, as seen by the catalog.
///
/// Shared ownership: the catalog holds one `Arc<Collection>` per index entry
/// and every lookup hands out another clone of it. The handle stays alive as
/// long as any holder keeps a reference, including after deregistration.
///
/// `Clone` is the basis of the catalog's write protocol: metadata fields are
/// copied, the record store is shared by `Arc`.
#[derive(Debug, Clone)]
pub struct Collection {
    uuid: CollectionUuid,
    ns: Namespace,
    options: CollectionOptions,
    store: Option<Arc<dyn RecordStore>>,
}

impl Collection {
    /// Creates a handle with default options and no attached store.
    pub fn new(uuid: CollectionUuid, ns: Namespace) -> Self {
        Self {
            uuid,
            ns,
            options: CollectionOptions::default(),
            store: None,
        }
    }

    /// Attaches the record engine's storage handle (builder pattern).
    pub fn with_store(mut self, store: Arc<dyn RecordStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Sets initial options (builder pattern).
    pub fn with_options(mut self, options: CollectionOptions) -> Self {
        self.options = options;
        self
    }

    /// Durable identifier, stable across renames and catalog reopens.
    #[inline]
    pub fn uuid(&self) -> CollectionUuid {
        self.uuid
    }

    /// Current fully qualified namespace.
    #[inline]
    pub fn ns(&self) -> &Namespace {
        &self.ns
    }

    /// Collection options.
    #[inline]
    pub fn options(&self) -> &CollectionOptions {
        &self.options
    }

    /// Mutable access to options, for use through a writable clone.
    #[inline]
    pub fn options_mut(&mut self) -> &mut CollectionOptions {
        &mut self.options
    }

    /// The record engine handle, if one is attached.
    #[inline]
    pub fn store(&self) -> Option<&Arc<dyn RecordStore>> {
        self.store.as_ref()
    }

    /// Rebinds the namespace. Crate-internal: namespace changes must flow
    /// through `CollectionCatalog::set_collection_namespace` so all three
    /// indices stay consistent.
    pub(crate) fn set_ns(&mut self, ns: Namespace) {
        self.ns = ns;
    }
}
