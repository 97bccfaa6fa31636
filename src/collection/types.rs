//! Type definitions for collections.
//!
//! A **collection** is a named, independently persisted set of vectors,
//! documents, and metadata. Parallel arrays are kept in lockstep: row *i*
//! of the vector store corresponds to `documents[i]`, `metadatas[i]`, and
//! `row_to_id[i]`.

use std::collections::HashMap;

use crate::types::{DocumentId, Metadata};
use crate::vector::FlatIndex;

/// In-memory representation of one named collection.
///
/// # Invariants
///
/// - `index` row count, `documents`, `metadatas`, and `row_to_id` all have
///   the same length at all times.
/// - `dimension` is `None` until the first successful insert and immutable
///   afterwards; when set, `index` is allocated with that width.
/// - Stored vectors are L2-normalized, so inner product equals cosine
///   similarity.
/// - `id_to_row` holds one entry per distinct id; row indices are dense
///   `[0, len)`.
/// - Rows are append-only: no row-level deletion or update. A collection
///   is destroyed whole.
#[derive(Clone, Debug, Default)]
pub struct CollectionRecord {
    /// Vector width, fixed by the first successful insert.
    pub(crate) dimension: Option<usize>,

    /// Flat inner-product store. `None` until `dimension` is fixed.
    pub(crate) index: Option<FlatIndex>,

    /// Document texts, positionally aligned with vector rows.
    pub(crate) documents: Vec<String>,

    /// Per-document metadata, positionally aligned with vector rows.
    pub(crate) metadatas: Vec<Metadata>,

    /// Row index → document id.
    pub(crate) row_to_id: Vec<DocumentId>,

    /// Document id → row index. Last write wins on duplicate ids.
    pub(crate) id_to_row: HashMap<String, usize>,

    /// Free-form collection-level metadata (e.g. provenance).
    pub(crate) extra_metadata: Metadata,
}

impl CollectionRecord {
    /// Creates an empty collection with the given collection-level metadata.
    ///
    /// `dimension` stays unset until the first insert.
    pub fn empty(extra_metadata: Metadata) -> Self {
        Self {
            extra_metadata,
            ..Default::default()
        }
    }

    /// Reassembles a record from persisted parts (codec path).
    ///
    /// The codec validates lockstep lengths before calling this.
    pub(crate) fn from_parts(
        dimension: Option<usize>,
        index: Option<FlatIndex>,
        documents: Vec<String>,
        metadatas: Vec<Metadata>,
        row_to_id: Vec<DocumentId>,
        id_to_row: HashMap<String, usize>,
        extra_metadata: Metadata,
    ) -> Self {
        Self {
            dimension,
            index,
            documents,
            metadatas,
            row_to_id,
            id_to_row,
            extra_metadata,
        }
    }

    /// Returns the number of documents (rows) in the collection.
    pub fn count(&self) -> usize {
        self.documents.len()
    }

    /// Returns true if the collection holds no documents.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Returns the vector dimension, or `None` before the first insert.
    pub fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    /// Returns the collection-level metadata.
    pub fn extra_metadata(&self) -> &Metadata {
        &self.extra_metadata
    }

    /// Returns the row index for a document id, if present.
    pub fn row_for_id(&self, id: &DocumentId) -> Option<usize> {
        self.id_to_row.get(id.as_str()).copied()
    }

    /// Builds a stats snapshot for this collection.
    pub fn stats(&self, name: impl Into<String>) -> CollectionStats {
        CollectionStats {
            name: name.into(),
            document_count: self.count(),
            dimension: self.dimension,
            extra_metadata: self.extra_metadata.clone(),
        }
    }
}

/// Summary statistics for one collection.
#[derive(Clone, Debug, PartialEq)]
pub struct CollectionStats {
    /// Collection name.
    pub name: String,

    /// Number of documents (rows).
    pub document_count: usize,

    /// Vector dimension, or `None` if nothing has been inserted yet.
    pub dimension: Option<usize>,

    /// Collection-level metadata.
    pub extra_metadata: Metadata,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MetadataValue;

    #[test]
    fn test_empty_record() {
        let record = CollectionRecord::empty(Metadata::new());
        assert_eq!(record.count(), 0);
        assert!(record.is_empty());
        assert!(record.dimension().is_none());
    }

    #[test]
    fn test_empty_record_keeps_extra_metadata() {
        let mut extra = Metadata::new();
        extra.insert("origin".to_string(), MetadataValue::from("crawler"));
        let record = CollectionRecord::empty(extra.clone());
        assert_eq!(record.extra_metadata(), &extra);
    }

    #[test]
    fn test_stats_snapshot() {
        let record = CollectionRecord::empty(Metadata::new());
        let stats = record.stats("notes");
        assert_eq!(stats.name, "notes");
        assert_eq!(stats.document_count, 0);
        assert!(stats.dimension.is_none());
    }
}
