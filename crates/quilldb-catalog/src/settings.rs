//! Catalog configuration surface.

use serde::{Deserialize, Serialize};

use quilldb_commons::errors::{CommonError, Result};

fn default_profile_level() -> u8 {
    0
}

/// Settings applied to a catalog at context startup, usually deserialized
/// from the server configuration file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogSettings {
    /// Server-wide profiling level reported for databases without an
    /// explicit entry. Must be 0, 1 or 2.
    #[serde(default = "default_profile_level")]
    pub default_profile_level: u8,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            default_profile_level: default_profile_level(),
        }
    }
}

impl CatalogSettings {
    /// Validates ranges that serde cannot express. Configuration is runtime
    /// input, so out-of-range values are an error here; only constructing
    /// `ProfileSettings` from an unvalidated level is fatal.
    pub fn validate(&self) -> Result<()> {
        if self.default_profile_level > 2 {
            return Err(CommonError::invalid_input(format!(
                "default_profile_level must be 0, 1 or 2, got {}",
                self.default_profile_level
            )));
        }
        Ok(())
    }
}
