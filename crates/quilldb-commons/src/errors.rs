//! Shared error types for QuillDB.
//!
//! This module provides common error variants that can be used across all
//! QuillDB crates without introducing external dependencies.
//!
//! ## Example Usage
//!
//! ```rust
//! use quilldb_commons::errors::{CommonError, Result};
//!
//! fn validate_database_name(name: &str) -> Result<()> {
//!     if name.is_empty() {
//!         return Err(CommonError::InvalidInput("Database name cannot be empty".to_string()));
//!     }
//!     Ok(())
//! }
//! ```

use std::fmt;

/// Common error type for QuillDB operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommonError {
    /// Invalid input provided to a function
    InvalidInput(String),

    /// Resource not found (collection, namespace, database, etc.)
    NotFound(String),

    /// Resource already exists (duplicate creation)
    AlreadyExists(String),

    /// Internal error (unexpected state)
    Internal(String),
}

impl CommonError {
    /// Creates an InvalidInput error with a message.
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Creates a NotFound error with a message.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Creates an AlreadyExists error with a message.
    pub fn already_exists(msg: impl Into<String>) -> Self {
        Self::AlreadyExists(msg.into())
    }

    /// Creates an Internal error with a message.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

impl fmt::Display for CommonError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommonError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            CommonError::NotFound(msg) => write!(f, "Not found: {}", msg),
            CommonError::AlreadyExists(msg) => write!(f, "Already exists: {}", msg),
            CommonError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for CommonError {}

/// Result alias using [`CommonError`].
pub type Result<T> = std::result::Result<T, CommonError>;
