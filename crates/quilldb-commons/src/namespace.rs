//! Composite (database, collection) namespace key.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::CommonError;
use crate::ids::{CollectionName, DatabaseName};

/// Fully qualified collection namespace: (database, collection name).
///
/// Mutable via rename, and unique among currently registered collections at
/// any instant. Serialized in the usual `"db.coll"` dotted form.
///
/// # Example
///
/// ```
/// use quilldb_commons::Namespace;
///
/// let ns = Namespace::from_strings("app", "events");
/// assert_eq!(ns.db().as_str(), "app");
/// assert_eq!(ns.coll().as_str(), "events");
/// assert_eq!(ns.to_string(), "app.events");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Namespace {
    db: DatabaseName,
    coll: CollectionName,
}

impl Namespace {
    /// Creates a namespace from its two typed components.
    #[inline]
    pub fn new(db: DatabaseName, coll: CollectionName) -> Self {
        Self { db, coll }
    }

    /// Creates a namespace from string components.
    #[inline]
    pub fn from_strings(db: &str, coll: &str) -> Self {
        Self {
            db: DatabaseName::new(db),
            coll: CollectionName::new(coll),
        }
    }

    /// Parses a dotted `"db.coll"` string. The collection part may itself
    /// contain dots, so only the first dot splits.
    pub fn parse(s: &str) -> Result<Self, CommonError> {
        match s.split_once('.') {
            Some((db, coll)) if !db.is_empty() && !coll.is_empty() => {
                Ok(Self::from_strings(db, coll))
            }
            _ => Err(CommonError::invalid_input(format!(
                "Invalid namespace: '{}'",
                s
            ))),
        }
    }

    /// The database component.
    #[inline]
    pub fn db(&self) -> &DatabaseName {
        &self.db
    }

    /// The collection name component.
    #[inline]
    pub fn coll(&self) -> &CollectionName {
        &self.coll
    }

    /// Returns a namespace with the same collection name in another database.
    pub fn with_db(&self, db: DatabaseName) -> Self {
        Self {
            db,
            coll: self.coll.clone(),
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.db, self.coll)
    }
}
