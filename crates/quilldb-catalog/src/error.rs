// Error types for the collection catalog
use quilldb_commons::{CollectionUuid, DatabaseName, Namespace};
use thiserror::Error;

/// Errors surfaced by catalog resolution operations.
///
/// Plain index misses on point lookups are returned as `Option::None`, never
/// as an error: absence is an expected, common outcome. This enum covers the
/// resolution paths that must distinguish *why* a name could not be produced.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    /// The UUID could not be resolved to a namespace, neither in the live
    /// catalog nor in the shadow snapshot of a closed catalog.
    #[error("Namespace not found: unable to resolve UUID {uuid}")]
    NamespaceNotFound { uuid: CollectionUuid },

    /// The UUID resolved, but to a collection in a different database than
    /// the caller expected.
    #[error("Namespace not found: UUID {uuid} resolves to '{actual}', which is not in database '{expected_db}'")]
    WrongDatabase {
        uuid: CollectionUuid,
        actual: Namespace,
        expected_db: DatabaseName,
    },
}

impl CatalogError {
    /// Both variants are namespace-resolution failures; callers that only
    /// care about the class (e.g. to retry by name) check this instead of
    /// matching variants.
    pub fn is_namespace_not_found(&self) -> bool {
        matches!(
            self,
            CatalogError::NamespaceNotFound { .. } | CatalogError::WrongDatabase { .. }
        )
    }
}
