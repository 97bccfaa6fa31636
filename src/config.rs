//! Configuration types for CorpusDB.
//!
//! The [`Config`] struct controls runtime behavior:
//! - Worker pool width for blocking index/disk work
//! - Ingestion batch size and embedding concurrency
//! - Query embedding cache capacity
//!
//! # Example
//! ```rust
//! use corpusdb::Config;
//!
//! // Use defaults
//! let config = Config::default();
//!
//! // Widen the blocking pool for a read-heavy deployment
//! let config = Config {
//!     worker_threads: 8,
//!     ..Default::default()
//! };
//! ```

use crate::error::ValidationError;

/// Runtime configuration options.
///
/// All fields have sensible defaults. Use struct update syntax to override
/// specific settings:
///
/// ```rust
/// use corpusdb::Config;
///
/// let config = Config {
///     ingest_batch_size: 50,
///     ..Default::default()
/// };
/// ```
#[derive(Clone, Debug)]
pub struct Config {
    /// Number of concurrent blocking tasks (index mutation, search,
    /// disk I/O). Default: 4.
    pub worker_threads: usize,

    /// Documents per ingestion batch. Each batch is embedded and
    /// appended as one unit. Default: 10.
    pub ingest_batch_size: usize,

    /// Maximum ingestion batches in flight at once (embedding calls run
    /// concurrently up to this bound; appends to one collection are
    /// serialized regardless). Default: 16.
    pub ingest_concurrency: usize,

    /// Capacity of the query embedding cache.
    ///
    /// Intentionally tiny: it covers the same question asked twice in a
    /// row, not general caching. Default: 3.
    pub query_cache_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            worker_threads: 4,
            ingest_batch_size: 10,
            ingest_concurrency: 16,
            query_cache_capacity: 3,
        }
    }
}

impl Config {
    /// Creates a new Config with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates the configuration.
    ///
    /// Called automatically by `CorpusDB::open()`. You can also call this
    /// explicitly to check configuration before attempting to open.
    ///
    /// # Errors
    /// Returns `ValidationError` if any field is zero.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.worker_threads == 0 {
            return Err(ValidationError::invalid_field(
                "worker_threads",
                "must be greater than 0",
            ));
        }
        if self.ingest_batch_size == 0 {
            return Err(ValidationError::invalid_field(
                "ingest_batch_size",
                "must be greater than 0",
            ));
        }
        if self.ingest_concurrency == 0 {
            return Err(ValidationError::invalid_field(
                "ingest_concurrency",
                "must be greater than 0",
            ));
        }
        if self.query_cache_capacity == 0 {
            return Err(ValidationError::invalid_field(
                "query_cache_capacity",
                "must be greater than 0",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.worker_threads, 4);
        assert_eq!(config.ingest_batch_size, 10);
        assert_eq!(config.ingest_concurrency, 16);
        assert_eq!(config.query_cache_capacity, 3);
    }

    #[test]
    fn test_validate_success() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_validate_zero_workers() {
        let config = Config {
            worker_threads: 0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(
            matches!(err, ValidationError::InvalidField { field, .. } if field == "worker_threads")
        );
    }

    #[test]
    fn test_validate_zero_batch_size() {
        let config = Config {
            ingest_batch_size: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_zero_cache_capacity() {
        let config = Config {
            query_cache_capacity: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
