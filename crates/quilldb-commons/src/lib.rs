//! # quilldb-commons
//!
//! Shared types, constants, and utilities for QuillDB.
//!
//! This crate provides the foundational identifier types used across the
//! QuillDB crates. It stays deliberately small to prevent circular
//! dependency issues.
//!
//! ## Type-Safe Wrappers
//!
//! - `CollectionUuid`: durable collection identifier, stable across renames
//! - `DatabaseName`: database name wrapper
//! - `CollectionName`: collection name wrapper
//! - `Namespace`: composite (database, collection) key
//!
//! ## Example Usage
//!
//! ```rust
//! use quilldb_commons::{CollectionUuid, Namespace};
//!
//! let uuid = CollectionUuid::new();
//! let ns = Namespace::from_strings("app", "events");
//! assert_eq!(ns.to_string(), "app.events");
//! ```

pub mod errors;
pub mod ids;
pub mod namespace;
pub mod timestamp;

pub use errors::{CommonError, Result};
pub use ids::{CollectionName, CollectionUuid, DatabaseName};
pub use namespace::Namespace;
pub use timestamp::Timestamp;
