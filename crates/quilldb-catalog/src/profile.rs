//! Per-database operation profiling settings.
//!
//! The profiling subsystem reads these per operation; collection lifecycle
//! never touches them. The store keeps its own mutex for that reason, and
//! only holds *non-default* entries: a database with no entry reports the
//! server-wide default.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use quilldb_commons::DatabaseName;

/// Filter deciding which operations get profiled. Evaluation happens in the
/// profiling subsystem; the catalog only stores and hands back the filter.
pub trait ProfileFilter: Send + Sync + fmt::Debug {
    /// Source expression of the filter, for `currentOp`-style diagnostics.
    fn expression(&self) -> &str;
}

/// Profiling state for one database: a level in {0, 1, 2} plus an optional
/// filter.
///
/// This represents a *state*, not a request to change state, so an
/// out-of-range level is a programming error rejected at construction, not a
/// runtime condition.
#[derive(Debug, Clone)]
pub struct ProfileSettings {
    level: u8,
    filter: Option<Arc<dyn ProfileFilter>>,
}

impl ProfileSettings {
    /// Builds settings with the given level and filter.
    ///
    /// # Panics
    /// Panics if `level` is not 0, 1 or 2.
    pub fn new(level: u8, filter: Option<Arc<dyn ProfileFilter>>) -> Self {
        assert!(level <= 2, "Invalid profiling level: {}", level);
        Self { level, filter }
    }

    /// Profiling level: 0 = off, 1 = slow operations, 2 = all operations.
    #[inline]
    pub fn level(&self) -> u8 {
        self.level
    }

    /// The configured filter, if any.
    #[inline]
    pub fn filter(&self) -> Option<&Arc<dyn ProfileFilter>> {
        self.filter.as_ref()
    }
}

impl Default for ProfileSettings {
    fn default() -> Self {
        Self {
            level: 0,
            filter: None,
        }
    }
}

impl PartialEq for ProfileSettings {
    fn eq(&self, other: &Self) -> bool {
        let same_filter = match (&self.filter, &other.filter) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        };
        self.level == other.level && same_filter
    }
}

/// Per-database profile settings under an independent lock.
#[derive(Debug)]
pub struct ProfileSettingsStore {
    default_settings: ProfileSettings,
    settings: Mutex<HashMap<DatabaseName, ProfileSettings>>,
}

impl ProfileSettingsStore {
    /// Creates a store whose absent entries resolve to `default_settings`.
    pub fn new(default_settings: ProfileSettings) -> Self {
        Self {
            default_settings,
            settings: Mutex::new(HashMap::new()),
        }
    }

    /// Sets the profiling settings for `db`.
    pub fn set(&self, db: &DatabaseName, new_settings: ProfileSettings) {
        log::debug!(
            "Profile level for database '{}' set to {}",
            db,
            new_settings.level()
        );
        self.settings.lock().insert(db.clone(), new_settings);
    }

    /// Fetches the settings for `db`. An unknown database reports the
    /// server-wide default; this is never an error.
    pub fn get(&self, db: &DatabaseName) -> ProfileSettings {
        self.settings
            .lock()
            .get(db)
            .cloned()
            .unwrap_or_else(|| self.default_settings.clone())
    }

    /// Convenience accessor for just the level.
    pub fn get_level(&self, db: &DatabaseName) -> u8 {
        self.get(db).level()
    }

    /// Drops the entry for `db`, reverting it to the default.
    pub fn clear(&self, db: &DatabaseName) {
        self.settings.lock().remove(db);
    }
}
