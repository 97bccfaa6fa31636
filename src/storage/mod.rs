//! Storage layer: the collection catalog and persistence codec.
//!
//! The catalog maps collection names to directories under one root and
//! to lazily loaded in-memory records:
//!
//! ```text
//! <root>/
//!   fruits/
//!     vectors.bin        (absent while the collection is empty)
//!     collection.json
//!   vehicles/
//!     ...
//! ```
//!
//! Disk is the source of truth for existence: `list_collections` reads
//! the directory tree and never consults the cache, and a collection
//! exists iff its sidecar file exists.

pub(crate) mod codec;

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use tracing::{info, warn};

use crate::collection::CollectionRecord;
use crate::error::{CorpusDBError, Result, StorageError, ValidationError};
use crate::types::Metadata;

/// A loaded collection record behind its lock.
///
/// The lock is the per-collection unit of mutual exclusion: appends take
/// the write half, searches and counts take the read half.
pub(crate) type SharedRecord = Arc<RwLock<CollectionRecord>>;

/// Maps collection names to persisted directories and lazily loaded
/// records.
///
/// The outer lock protects the name → record map itself (two callers
/// racing to first-load the same collection resolve to a single record);
/// each record's own lock serializes access to its contents.
pub(crate) struct CollectionCatalog {
    root: PathBuf,
    loaded: RwLock<HashMap<String, SharedRecord>>,
}

/// Rejects names that are empty or could escape the root directory.
fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(ValidationError::invalid_field("collection", "name must not be empty").into());
    }
    if name == "." || name == ".." || name.contains('/') || name.contains('\\') {
        return Err(ValidationError::invalid_field(
            "collection",
            format!("name '{}' must not contain path components", name),
        )
        .into());
    }
    Ok(())
}

impl CollectionCatalog {
    /// Creates a catalog rooted at `root`. Call [`initialize`] before use.
    ///
    /// [`initialize`]: CollectionCatalog::initialize
    pub(crate) fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            loaded: RwLock::new(HashMap::new()),
        }
    }

    /// Ensures the root storage directory exists. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Unavailable` if the directory cannot be
    /// created — fatal at startup.
    pub(crate) fn initialize(&self) -> Result<()> {
        fs::create_dir_all(&self.root).map_err(|err| {
            warn!(root = %self.root.display(), %err, "storage root cannot be created");
            StorageError::unavailable(&self.root)
        })?;
        info!(root = %self.root.display(), "storage root ready");
        Ok(())
    }

    /// Returns the directory for a collection name.
    fn collection_dir(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    fn loaded_read(
        &self,
    ) -> Result<std::sync::RwLockReadGuard<'_, HashMap<String, SharedRecord>>> {
        self.loaded
            .read()
            .map_err(|_| CorpusDBError::internal("catalog lock poisoned"))
    }

    fn loaded_write(
        &self,
    ) -> Result<std::sync::RwLockWriteGuard<'_, HashMap<String, SharedRecord>>> {
        self.loaded
            .write()
            .map_err(|_| CorpusDBError::internal("catalog lock poisoned"))
    }

    /// Creates a collection, persisting an empty record immediately so
    /// the collection is discoverable before any ingestion.
    ///
    /// Returns `false` (logged, no-op) if the collection already exists
    /// on disk; in that case the existing record is loaded into the
    /// cache if it wasn't yet.
    pub(crate) fn create_collection(&self, name: &str, metadata: Option<Metadata>) -> Result<bool> {
        validate_name(name)?;
        let dir = self.collection_dir(name);

        if dir.exists() {
            warn!(collection = name, "collection already exists");
            // Warm the cache so later operations skip the disk probe
            self.get_or_load(name)?;
            return Ok(false);
        }

        let record = CollectionRecord::empty(metadata.unwrap_or_default());
        codec::save_collection(&dir, &record)?;
        self.loaded_write()?
            .insert(name.to_string(), Arc::new(RwLock::new(record)));

        info!(collection = name, "collection created");
        Ok(true)
    }

    /// Deletes a collection: evicts the in-memory record and removes the
    /// persisted directory. Returns `false` if it did not exist.
    pub(crate) fn delete_collection(&self, name: &str) -> Result<bool> {
        validate_name(name)?;
        self.loaded_write()?.remove(name);

        let dir = self.collection_dir(name);
        if !dir.exists() {
            warn!(collection = name, "collection does not exist");
            return Ok(false);
        }
        fs::remove_dir_all(&dir)?;
        info!(collection = name, "collection deleted");
        Ok(true)
    }

    /// Lists collection names by enumerating subdirectories of the root.
    ///
    /// Reflects disk state exactly; the in-memory cache is not consulted.
    pub(crate) fn list_collections(&self) -> Result<Vec<String>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }

    /// Returns the cached record for `name`, loading it from disk on
    /// first access, or `None` if the collection does not exist.
    ///
    /// Two callers racing to first-load the same name resolve to the
    /// same record: the load is re-checked under the write lock.
    pub(crate) fn get_or_load(&self, name: &str) -> Result<Option<SharedRecord>> {
        validate_name(name)?;

        if let Some(record) = self.loaded_read()?.get(name) {
            return Ok(Some(Arc::clone(record)));
        }

        let mut loaded = self.loaded_write()?;
        if let Some(record) = loaded.get(name) {
            return Ok(Some(Arc::clone(record)));
        }

        match codec::load_collection(&self.collection_dir(name))? {
            Some(record) => {
                let shared = Arc::new(RwLock::new(record));
                loaded.insert(name.to_string(), Arc::clone(&shared));
                Ok(Some(shared))
            }
            None => Ok(None),
        }
    }

    /// Persists the given record as collection `name`.
    ///
    /// The caller holds the record lock for the whole append-then-save
    /// step, so the on-disk state always reflects a consistent record.
    pub(crate) fn save(&self, name: &str, record: &CollectionRecord) -> Result<()> {
        codec::save_collection(&self.collection_dir(name), record)
    }
}
