//! Collection records and the operations that mutate and query them.
//!
//! This module owns the append and search paths for one collection:
//!
//! - [`CollectionRecord::append_documents`] — all-or-nothing insertion
//!   that fixes the dimension on first use, normalizes vectors, and
//!   extends every parallel array in lockstep.
//! - [`CollectionRecord::search`] — exact top-k retrieval with optional
//!   metadata filtering, oversampling candidates when a filter is present
//!   since the flat index has no native filtering.
//!
//! # Concurrency
//!
//! Nothing here is internally synchronized. The catalog hands out each
//! record behind its own lock, and the facade takes the write lock for
//! the whole append step — that lock is the unit of mutual exclusion
//! for a collection.

pub mod types;

pub use types::{CollectionRecord, CollectionStats};

use tracing::warn;

use crate::error::{CorpusDBError, Result, ValidationError};
use crate::types::{DocumentId, Embedding, Metadata, MetadataFilter};
use crate::vector::{l2_normalize, FlatIndex};

impl CollectionRecord {
    /// Appends a batch of documents with their embeddings.
    ///
    /// The first successful call fixes the collection dimension from
    /// `embeddings[0]` and allocates the vector store. Every later call
    /// must match that dimension exactly.
    ///
    /// Embeddings are L2-normalized before appending. Ids default to
    /// freshly generated tokens; a caller-supplied id that collides with
    /// an existing id is accepted with a warning and remaps `id_to_row`
    /// to the new row (last write wins). Missing metadata entries are
    /// padded with an empty map.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::DimensionMismatch` if any embedding's
    /// width differs from the established (or batch-establishing)
    /// dimension, and `ValidationError::InvalidField` if the embedding
    /// count differs from the document count or a first batch carries
    /// zero-width vectors. On error the record is unchanged — no partial
    /// rows are appended.
    pub fn append_documents(
        &mut self,
        texts: &[String],
        embeddings: Vec<Embedding>,
        metadatas: Option<&[Metadata]>,
        ids: Option<&[DocumentId]>,
    ) -> Result<()> {
        if texts.is_empty() {
            return Ok(());
        }
        if embeddings.len() != texts.len() {
            return Err(ValidationError::invalid_field(
                "embeddings",
                format!("got {} vectors for {} documents", embeddings.len(), texts.len()),
            )
            .into());
        }

        // Validate the whole batch before touching any state, so a
        // mismatch mid-batch cannot leave partial rows behind.
        let expected = match self.dimension {
            Some(d) => d,
            None => {
                let d = embeddings[0].len();
                if d == 0 {
                    return Err(ValidationError::invalid_field(
                        "embeddings",
                        "zero-width vectors cannot establish a collection dimension",
                    )
                    .into());
                }
                d
            }
        };
        for embedding in &embeddings {
            if embedding.len() != expected {
                return Err(
                    ValidationError::dimension_mismatch(expected, embedding.len()).into(),
                );
            }
        }

        if self.dimension.is_none() {
            self.dimension = Some(expected);
        }
        // A collection loaded empty can carry a recorded dimension but
        // no store yet; allocate on the first actual append either way.
        if self.index.is_none() {
            self.index = Some(FlatIndex::new(expected)?);
        }
        let Some(index) = self.index.as_mut() else {
            return Err(CorpusDBError::internal(
                "vector store missing after dimension was fixed",
            ));
        };

        for (i, mut embedding) in embeddings.into_iter().enumerate() {
            l2_normalize(&mut embedding);
            let row = index.append(&embedding)?;

            let id = match ids.and_then(|ids| ids.get(i)) {
                Some(id) => id.clone(),
                None => DocumentId::generate(),
            };
            if let Some(previous_row) = self.id_to_row.insert(id.as_str().to_string(), row) {
                warn!(
                    id = %id,
                    previous_row,
                    new_row = row,
                    "duplicate document id, id now resolves to the newer row"
                );
            }

            self.documents.push(texts[i].clone());
            self.metadatas.push(
                metadatas
                    .and_then(|m| m.get(i))
                    .cloned()
                    .unwrap_or_default(),
            );
            self.row_to_id.push(id);
        }

        Ok(())
    }

    /// Exact top-k search with optional metadata filtering.
    ///
    /// Returns `(document, similarity)` pairs in descending similarity
    /// order. The similarity is the raw inner product of the two
    /// normalized vectors (cosine similarity, nominally in `[-1, 1]`).
    ///
    /// With a filter present, `min(max(5k, k+10), rows)` candidates are
    /// fetched before filtering, since the flat index has no native
    /// filtering; candidates are scanned in similarity order and the scan
    /// stops once `k` matches are collected.
    ///
    /// An empty collection returns an empty vec.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::DimensionMismatch` if the query width
    /// differs from the collection dimension.
    pub fn search(
        &self,
        query: &[f32],
        k: usize,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<(String, f32)>> {
        let index = match &self.index {
            Some(index) if !index.is_empty() => index,
            _ => return Ok(Vec::new()),
        };
        if k == 0 {
            return Ok(Vec::new());
        }

        let filter = filter.filter(|f| !f.is_empty());
        let k_to_fetch = match filter {
            // Oversample so post-filtering still leaves k candidates
            Some(_) => (5 * k).max(k + 10).min(index.len()),
            None => k,
        };

        let candidates = index.search(query, k_to_fetch)?;

        let mut results = Vec::with_capacity(k.min(candidates.len()));
        for (row, score) in candidates {
            // A stale in-memory cache meeting a newer index file can leave
            // rows the sidecar arrays don't cover; skip rather than panic.
            if row >= self.documents.len() || row >= self.metadatas.len() {
                warn!(row, "search hit a row outside the document arrays, skipping");
                continue;
            }

            if let Some(filter) = filter {
                if !filter.matches(&self.metadatas[row]) {
                    continue;
                }
            }

            results.push((self.documents[row].clone(), score));
            if results.len() >= k {
                break;
            }
        }
        Ok(results)
    }
}
