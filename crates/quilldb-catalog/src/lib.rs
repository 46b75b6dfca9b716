//! # quilldb-catalog
//!
//! In-memory metadata catalog for QuillDB: the authoritative registry
//! mapping every collection's durable UUID and human-readable namespace to
//! its live in-memory handle, kept consistent across concurrent readers,
//! in-flight writers, and transaction commit/abort.
//!
//! ## What lives here
//!
//! - [`CollectionCatalog`]: three synchronized indices (by UUID, by ordered
//!   (database, UUID), by namespace), the close/reopen epoch with its shadow
//!   snapshot, and the generation counter backing snapshot-stable iteration.
//! - [`WritableCollection`] and [`UnitOfWork`]: the transaction-managed,
//!   unmanaged-clone, and in-place metadata write modes.
//! - [`CatalogIter`]: forward-only per-database iteration with
//!   skip-but-never-revisit semantics.
//! - [`ResourceNameIndex`] and [`ProfileSettingsStore`]: independently
//!   locked side indices for lock-manager diagnostics and per-database
//!   profiling.
//!
//! ## What deliberately does not
//!
//! Physical storage (behind the [`RecordStore`] seam), transaction
//! bookkeeping beyond the [`UnitOfWork`] callback protocol, query execution,
//! and any persistence.

pub mod catalog;
pub mod collection;
pub mod error;
pub mod iter;
pub mod profile;
pub mod resource;
pub mod service_context;
pub mod settings;
pub mod uow;
pub mod writable;

pub use catalog::{CollectionCatalog, CommitHandler, NamespaceOrUuid};
pub use collection::{Collection, CollectionOptions, RecordStore};
pub use error::CatalogError;
pub use iter::CatalogIter;
pub use profile::{ProfileFilter, ProfileSettings, ProfileSettingsStore};
pub use resource::{ResourceId, ResourceNameIndex, ResourceType};
pub use service_context::ServiceContext;
pub use settings::CatalogSettings;
pub use uow::{Change, UnitOfWork};
pub use writable::{LifetimeMode, WritableCollection};
