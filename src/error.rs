//! Error types for CorpusDB.
//!
//! CorpusDB uses a hierarchical error system:
//! - `CorpusDBError` is the top-level error returned by all public APIs
//! - Specific error types (`StorageError`, `ValidationError`) provide detail
//!
//! Structural "not found" conditions (missing collections) are never
//! errors: the read path returns empty results and logs a warning instead.
//! Errors are reserved for conditions that would corrupt collection
//! invariants if ignored — dimension mismatches, unreadable persisted
//! state, an unusable storage root, or a failing embedding provider.
//!
//! # Error Handling Pattern
//! ```rust,ignore
//! use corpusdb::{CorpusDB, Result};
//!
//! async fn example(db: &CorpusDB) -> Result<()> {
//!     let hits = db.search_documents("notes", "query", 5, None).await?;
//!     // a missing collection yields Ok(vec![]), not an error
//!     Ok(())
//! }
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for CorpusDB operations.
pub type Result<T> = std::result::Result<T, CorpusDBError>;

/// Top-level error enum for all CorpusDB operations.
///
/// This is the only error type returned by public APIs.
/// Use pattern matching to handle specific error cases.
#[derive(Debug, Error)]
pub enum CorpusDBError {
    /// Storage layer error (I/O, corruption, unusable root directory).
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Input validation error.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Embedding provider failure, propagated unchanged (no retry here).
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// General I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal invariant failure (poisoned lock, lost worker task).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CorpusDBError {
    /// Creates an embedding error with the given message.
    pub fn embedding(msg: impl Into<String>) -> Self {
        Self::Embedding(msg.into())
    }

    /// Creates an internal error with the given message.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Returns true if this is a storage error.
    pub fn is_storage(&self) -> bool {
        matches!(self, Self::Storage(_))
    }

    /// Returns true if this is a validation error.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns true if this is a dimension mismatch.
    pub fn is_dimension_mismatch(&self) -> bool {
        matches!(
            self,
            Self::Validation(ValidationError::DimensionMismatch { .. })
        )
    }

    /// Returns true if this is an embedding provider failure.
    pub fn is_embedding(&self) -> bool {
        matches!(self, Self::Embedding(_))
    }

    /// Returns true if this is a persisted-state corruption error.
    pub fn is_corruption(&self) -> bool {
        matches!(self, Self::Storage(StorageError::Corrupted(_)))
    }
}

/// Storage-related errors.
///
/// These errors indicate problems with the persisted collection state.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The root storage directory cannot be created or used.
    ///
    /// Fatal at startup — nothing can be persisted without the root.
    #[error("Storage root unavailable: {0}")]
    Unavailable(PathBuf),

    /// A collection's persisted files are unreadable or inconsistent.
    ///
    /// Raised rather than treated as empty: silently dropping a corrupt
    /// collection would be invisible data loss.
    #[error("Collection data corrupted: {0}")]
    Corrupted(String),

    /// Serialization/deserialization error in the persistence codec.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl StorageError {
    /// Creates an unavailable-root error for the given path.
    pub fn unavailable(path: impl Into<PathBuf>) -> Self {
        Self::Unavailable(path.into())
    }

    /// Creates a corruption error with the given message.
    pub fn corrupted(msg: impl Into<String>) -> Self {
        Self::Corrupted(msg.into())
    }

    /// Creates a serialization error with the given message.
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization(msg.into())
    }
}

// Conversions from codec error types
impl From<bincode::Error> for StorageError {
    fn from(err: bincode::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}

// Also allow direct conversion to CorpusDBError for convenience
impl From<bincode::Error> for CorpusDBError {
    fn from(err: bincode::Error) -> Self {
        CorpusDBError::Storage(StorageError::from(err))
    }
}

impl From<serde_json::Error> for CorpusDBError {
    fn from(err: serde_json::Error) -> Self {
        CorpusDBError::Storage(StorageError::from(err))
    }
}

/// Validation errors for input data.
///
/// These errors indicate problems with data provided by the caller.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// Vector width doesn't match the collection's established dimension.
    #[error("Embedding dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch {
        /// Expected dimension, fixed by the collection's first insert.
        expected: usize,
        /// Actual dimension provided.
        got: usize,
    },

    /// A field has an invalid value.
    #[error("Invalid field '{field}': {reason}")]
    InvalidField {
        /// Name of the invalid field.
        field: String,
        /// Why the value is invalid.
        reason: String,
    },
}

impl ValidationError {
    /// Creates a dimension mismatch error.
    pub fn dimension_mismatch(expected: usize, got: usize) -> Self {
        Self::DimensionMismatch { expected, got }
    }

    /// Creates an invalid field error.
    pub fn invalid_field(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field: field.into(),
            reason: reason.into(),
        }
    }
}
