//! CorpusDB main struct and lifecycle operations.
//!
//! [`CorpusDB`] is the primary interface for interacting with the index.
//! It fronts the blocking machinery (index mutation, search, disk I/O)
//! with a fully non-blocking API: every blocking step is dispatched to a
//! bounded worker pool, and callers simply await.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use corpusdb::{Config, CorpusDB};
//!
//! let db = CorpusDB::open("./data/corpus", provider, Config::default()).await?;
//!
//! db.create_collection("fruits", None).await?;
//! db.add_documents("fruits", texts, Some(metadatas), None).await?;
//!
//! let hits = db.search_documents("fruits", "citrus fruit", 3, None).await?;
//! for (document, score) in hits {
//!     println!("{score:.3}  {document}");
//! }
//!
//! db.close()?;
//! ```
//!
//! # Concurrency
//!
//! `CorpusDB` is `Send + Sync`; share it across tasks with `Arc`.
//! Searches run concurrently with each other and with inserts on other
//! collections. Concurrent inserts into the *same* collection embed in
//! parallel but append under the collection's write lock, one batch at a
//! time — the relative order of rows from different calls is
//! unspecified, while rows within one call keep caller order.
//!
//! There is no cooperative cancellation: a caller that abandons an await
//! leaves the underlying worker task running to completion, because a
//! half-appended batch would break the collection invariants.

use std::sync::{Arc, Mutex};

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, instrument, warn};

use crate::collection::CollectionStats;
use crate::config::Config;
use crate::embedding::{EmbeddingProvider, QueryCache};
use crate::error::{CorpusDBError, Result};
use crate::storage::CollectionCatalog;
use crate::types::{DocumentId, Embedding, Metadata, MetadataFilter};
use crate::vector::l2_normalize;

/// The main CorpusDB handle.
///
/// Owns the collection catalog, the embedding provider, the query
/// embedding cache, and the worker-slot semaphores. Create an instance
/// with [`CorpusDB::open()`] and release it with [`CorpusDB::close()`].
pub struct CorpusDB {
    /// Collection name → directory → lazily loaded record.
    catalog: Arc<CollectionCatalog>,

    /// External embedding provider (caller-supplied).
    provider: Arc<dyn EmbeddingProvider>,

    /// Recency cache for query embeddings. Keyed by query text, shared
    /// across collections.
    query_cache: Arc<Mutex<QueryCache>>,

    /// Bounds concurrent blocking work (index mutation, search, disk I/O).
    worker_slots: Arc<Semaphore>,

    /// Bounds concurrent ingestion batches.
    ingest_slots: Arc<Semaphore>,

    /// Configuration used to open this instance.
    config: Config,
}

impl std::fmt::Debug for CorpusDB {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CorpusDB")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Runs a blocking closure on the worker pool, gated by a pool slot.
///
/// The permit moves into the blocking task, so the slot stays occupied
/// until the work finishes even if the caller abandons the await.
async fn dispatch_blocking<T, F>(slots: Arc<Semaphore>, f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    let permit = slots
        .acquire_owned()
        .await
        .map_err(|_| CorpusDBError::internal("worker pool closed"))?;
    tokio::task::spawn_blocking(move || {
        let _permit = permit;
        f()
    })
    .await
    .map_err(|err| CorpusDBError::internal(format!("worker task lost: {}", err)))?
}

impl CorpusDB {
    /// Opens a CorpusDB instance rooted at `root`.
    ///
    /// Ensures the root storage directory exists (creating it if needed)
    /// and builds the worker pool, ingestion semaphore, and query cache
    /// from `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid (see
    /// [`Config::validate`]) or the root directory cannot be created
    /// (`StorageError::Unavailable` — fatal at startup).
    #[instrument(skip(provider, config), fields(root = %root.as_ref().display()))]
    pub async fn open(
        root: impl AsRef<std::path::Path>,
        provider: Arc<dyn EmbeddingProvider>,
        config: Config,
    ) -> Result<Self> {
        config.validate()?;

        let catalog = Arc::new(CollectionCatalog::new(root.as_ref()));
        let worker_slots = Arc::new(Semaphore::new(config.worker_threads));

        {
            let catalog = Arc::clone(&catalog);
            dispatch_blocking(Arc::clone(&worker_slots), move || catalog.initialize()).await?;
        }

        info!(
            workers = config.worker_threads,
            batch_size = config.ingest_batch_size,
            "CorpusDB opened"
        );

        Ok(Self {
            catalog,
            provider,
            query_cache: Arc::new(Mutex::new(QueryCache::new(config.query_cache_capacity))),
            worker_slots,
            ingest_slots: Arc::new(Semaphore::new(config.ingest_concurrency)),
            config,
        })
    }

    /// Closes the instance.
    ///
    /// All writes are persisted synchronously at append time, so there is
    /// nothing to flush; this consumes the handle so it cannot be used
    /// afterwards.
    #[instrument(skip(self))]
    pub fn close(self) -> Result<()> {
        info!("CorpusDB closed");
        Ok(())
    }

    /// Returns a reference to the configuration.
    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Dispatches a blocking closure onto this instance's worker pool.
    async fn run_blocking<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce() -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        dispatch_blocking(Arc::clone(&self.worker_slots), f).await
    }

    // =========================================================================
    // Collection management
    // =========================================================================

    /// Creates a collection, persisting an empty record immediately.
    ///
    /// Returns `true` on creation, `false` (logged, no-op) if the
    /// collection already exists.
    #[instrument(skip(self, metadata))]
    pub async fn create_collection(&self, name: &str, metadata: Option<Metadata>) -> Result<bool> {
        let catalog = Arc::clone(&self.catalog);
        let name = name.to_string();
        self.run_blocking(move || catalog.create_collection(&name, metadata))
            .await
    }

    /// Deletes a collection's persisted directory and in-memory state.
    ///
    /// Returns `false` if the collection did not exist.
    #[instrument(skip(self))]
    pub async fn delete_collection(&self, name: &str) -> Result<bool> {
        let catalog = Arc::clone(&self.catalog);
        let name = name.to_string();
        self.run_blocking(move || catalog.delete_collection(&name))
            .await
    }

    /// Lists all collection names, straight from disk.
    #[instrument(skip(self))]
    pub async fn list_collections(&self) -> Result<Vec<String>> {
        let catalog = Arc::clone(&self.catalog);
        self.run_blocking(move || catalog.list_collections()).await
    }

    /// Returns the number of documents in a collection, or 0 if the
    /// collection does not exist.
    #[instrument(skip(self))]
    pub async fn get_collection_count(&self, name: &str) -> Result<usize> {
        let catalog = Arc::clone(&self.catalog);
        let name = name.to_string();
        self.run_blocking(move || match catalog.get_or_load(&name)? {
            Some(record) => {
                let guard = record
                    .read()
                    .map_err(|_| CorpusDBError::internal("record lock poisoned"))?;
                Ok(guard.count())
            }
            None => Ok(0),
        })
        .await
    }

    /// Returns a stats snapshot for a collection, or `None` if it does
    /// not exist.
    #[instrument(skip(self))]
    pub async fn collection_stats(&self, name: &str) -> Result<Option<CollectionStats>> {
        let catalog = Arc::clone(&self.catalog);
        let name = name.to_string();
        self.run_blocking(move || match catalog.get_or_load(&name)? {
            Some(record) => {
                let guard = record
                    .read()
                    .map_err(|_| CorpusDBError::internal("record lock poisoned"))?;
                Ok(Some(guard.stats(name)))
            }
            None => Ok(None),
        })
        .await
    }

    // =========================================================================
    // Ingestion
    // =========================================================================

    /// Adds documents to a collection, creating it first if missing.
    ///
    /// The call is split into batches of `ingest_batch_size`; up to
    /// `ingest_concurrency` batches have their embeddings computed in
    /// parallel, while the append-and-persist step of each batch runs
    /// under the collection's write lock. Rows within one call keep
    /// caller order per batch; order across batches is unspecified.
    ///
    /// `metadatas` and `ids` align positionally with `texts`; shorter
    /// lists are padded (empty metadata, generated ids). An empty
    /// `texts` is a logged no-op returning `Ok(true)`.
    ///
    /// # Errors
    ///
    /// Embedding provider failures propagate unchanged. A batch whose
    /// vector width conflicts with the collection dimension fails with
    /// `ValidationError::DimensionMismatch` and contributes nothing;
    /// other batches of the same call are independent and may have
    /// landed.
    #[instrument(skip_all, fields(collection = name, documents = texts.len()))]
    pub async fn add_documents(
        &self,
        name: &str,
        texts: Vec<String>,
        metadatas: Option<Vec<Metadata>>,
        ids: Option<Vec<DocumentId>>,
    ) -> Result<bool> {
        if texts.is_empty() {
            info!(collection = name, "no documents to add");
            return Ok(true);
        }

        self.ensure_collection(name).await?;

        let batch_size = self.config.ingest_batch_size;
        let mut tasks: JoinSet<Result<()>> = JoinSet::new();

        let mut start = 0;
        while start < texts.len() {
            let end = (start + batch_size).min(texts.len());
            let batch_texts: Vec<String> = texts[start..end].to_vec();
            let batch_metas: Option<Vec<Metadata>> = metadatas
                .as_ref()
                .map(|m| m.iter().skip(start).take(end - start).cloned().collect());
            let batch_ids: Option<Vec<DocumentId>> = ids
                .as_ref()
                .map(|i| i.iter().skip(start).take(end - start).cloned().collect());

            let provider = Arc::clone(&self.provider);
            let catalog = Arc::clone(&self.catalog);
            let ingest_slots = Arc::clone(&self.ingest_slots);
            let worker_slots = Arc::clone(&self.worker_slots);
            let name = name.to_string();

            tasks.spawn(async move {
                let _slot = ingest_slots
                    .acquire_owned()
                    .await
                    .map_err(|_| CorpusDBError::internal("ingest semaphore closed"))?;

                // The expensive, stateless part runs outside any lock
                let embeddings = provider.embed(&batch_texts).await?;

                dispatch_blocking(worker_slots, move || {
                    let record = catalog.get_or_load(&name)?.ok_or_else(|| {
                        CorpusDBError::internal("collection removed during ingest")
                    })?;
                    let mut guard = record
                        .write()
                        .map_err(|_| CorpusDBError::internal("record lock poisoned"))?;
                    guard.append_documents(
                        &batch_texts,
                        embeddings,
                        batch_metas.as_deref(),
                        batch_ids.as_deref(),
                    )?;
                    catalog.save(&name, &guard)
                })
                .await
            });
            start = end;
        }

        // Drain every batch before reporting: batches are independent,
        // so a failure must not abort siblings mid-append.
        let mut first_error = None;
        while let Some(joined) = tasks.join_next().await {
            let outcome = joined
                .map_err(|err| CorpusDBError::internal(format!("ingest task lost: {}", err)))
                .and_then(|result| result);
            if let Err(err) = outcome {
                if first_error.is_none() {
                    first_error = Some(err);
                }
            }
        }
        match first_error {
            Some(err) => Err(err),
            None => {
                info!(collection = name, added = texts.len(), "documents added");
                Ok(true)
            }
        }
    }

    /// Loads the collection or creates it if missing (ingest path).
    async fn ensure_collection(&self, name: &str) -> Result<()> {
        let catalog = Arc::clone(&self.catalog);
        let name = name.to_string();
        self.run_blocking(move || {
            if catalog.get_or_load(&name)?.is_none() {
                info!(collection = %name, "collection missing, creating before ingest");
                catalog.create_collection(&name, None)?;
            }
            Ok(())
        })
        .await
    }

    // =========================================================================
    // Search
    // =========================================================================

    /// Searches a collection for the `k` documents most similar to
    /// `query_text`, optionally keeping only documents whose metadata
    /// matches every pair in `filter`.
    ///
    /// Returns `(document, similarity)` pairs in descending similarity
    /// order; the score is cosine similarity. A non-existent collection
    /// yields an empty result, never an error.
    ///
    /// The query embedding is served from the recency cache when the
    /// same text was searched recently; otherwise the provider is called
    /// and the normalized result cached.
    ///
    /// # Errors
    ///
    /// Embedding provider failures propagate unchanged.
    #[instrument(skip(self, filter), fields(collection = name))]
    pub async fn search_documents(
        &self,
        name: &str,
        query_text: &str,
        k: usize,
        filter: Option<MetadataFilter>,
    ) -> Result<Vec<(String, f32)>> {
        let record = {
            let catalog = Arc::clone(&self.catalog);
            let name = name.to_string();
            self.run_blocking(move || catalog.get_or_load(&name)).await?
        };
        let Some(record) = record else {
            warn!(collection = name, "collection does not exist");
            return Ok(Vec::new());
        };

        let query = self.query_embedding(query_text).await?;

        self.run_blocking(move || {
            let guard = record
                .read()
                .map_err(|_| CorpusDBError::internal("record lock poisoned"))?;
            guard.search(&query, k, filter.as_ref())
        })
        .await
    }

    /// Resolves a query embedding through the cache, calling the
    /// provider on a miss.
    async fn query_embedding(&self, query_text: &str) -> Result<Embedding> {
        let cached = self
            .query_cache
            .lock()
            .map_err(|_| CorpusDBError::internal("query cache lock poisoned"))?
            .lookup(query_text);
        if let Some(embedding) = cached {
            debug!(query = query_text, "query embedding cache hit");
            return Ok(embedding);
        }

        debug!(query = query_text, "query embedding cache miss");
        let mut vectors = self.provider.embed(&[query_text.to_string()]).await?;
        let returned = vectors.len();
        let mut embedding = match vectors.pop() {
            Some(embedding) if vectors.is_empty() => embedding,
            _ => {
                return Err(CorpusDBError::embedding(format!(
                    "provider returned {} embeddings for one query",
                    returned
                )))
            }
        };
        l2_normalize(&mut embedding);

        self.query_cache
            .lock()
            .map_err(|_| CorpusDBError::internal("query cache lock poisoned"))?
            .insert(query_text, embedding.clone());
        Ok(embedding)
    }
}
