//! Per-context owner of the collection catalog.
//!
//! One `ServiceContext` per logical server context: created at startup, torn
//! down at shutdown, and passed explicitly to whatever needs the catalog.
//! There is deliberately no process-global accessor; ambient mutable state
//! makes the catalog's lifetime invisible in call signatures.

use std::sync::Arc;

use quilldb_commons::errors::Result;

use crate::catalog::CollectionCatalog;
use crate::profile::ProfileSettings;
use crate::settings::CatalogSettings;

/// Container owning the shared resources of one server context.
pub struct ServiceContext {
    settings: CatalogSettings,
    catalog: Arc<CollectionCatalog>,
}

impl ServiceContext {
    /// Creates a context with a fresh, empty catalog.
    pub fn new(settings: CatalogSettings) -> Result<Self> {
        settings.validate()?;
        let catalog = Arc::new(CollectionCatalog::new(ProfileSettings::new(
            settings.default_profile_level,
            None,
        )));
        log::info!(
            "Collection catalog initialized (default profile level {})",
            settings.default_profile_level
        );
        Ok(Self { settings, catalog })
    }

    /// The context's collection catalog.
    pub fn catalog(&self) -> &Arc<CollectionCatalog> {
        &self.catalog
    }

    /// The settings this context was created with.
    pub fn settings(&self) -> &CatalogSettings {
        &self.settings
    }
}

impl Drop for ServiceContext {
    fn drop(&mut self) {
        self.catalog.deregister_all_collections();
        log::info!("Collection catalog shut down");
    }
}
