//! # CorpusDB
//!
//! Embedded dense-vector similarity index for RAG document collections.
//!
//! CorpusDB stores document embeddings per named collection, persists
//! them to disk (one directory per collection), and answers
//! nearest-neighbor queries with optional metadata filtering. Search is
//! exact: a flat inner-product scan over L2-normalized vectors, so
//! scores are cosine similarities.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use corpusdb::{Config, CorpusDB, MetadataFilter};
//!
//! // Open against a storage root, supplying your embedding provider
//! let db = CorpusDB::open("./data/corpus", provider, Config::default()).await?;
//!
//! // Create a collection and ingest chunks
//! db.create_collection("wiki", None).await?;
//! db.add_documents("wiki", chunks, Some(chunk_metadata), None).await?;
//!
//! // Retrieve, optionally filtered by metadata
//! let filter = MetadataFilter::new().with("source", "crawler");
//! let hits = db.search_documents("wiki", "how do login sessions expire?", 5, Some(filter)).await?;
//!
//! db.close()?;
//! ```
//!
//! ## Key Concepts
//!
//! ### Collection
//!
//! A **collection** is a named, independently persisted set of vectors,
//! documents, and metadata. The vector dimension is fixed by the first
//! insert; rows are append-only, and the only deletion granularity is
//! the whole collection.
//!
//! ### Embedding Provider
//!
//! CorpusDB never computes embeddings itself. The caller supplies an
//! [`EmbeddingProvider`] (an API client, a local model, a test stub);
//! provider failures propagate unchanged.
//!
//! ## Thread Safety
//!
//! [`CorpusDB`] is `Send + Sync` and can be shared across tasks using
//! `Arc`. Blocking work runs on a bounded worker pool; appends to one
//! collection are serialized behind its lock while embedding computation
//! proceeds in parallel.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_op_in_unsafe_fn)]

// ============================================================================
// Module declarations
// ============================================================================

mod config;
mod db;
mod error;
mod types;

pub mod embedding;

// Domain modules
pub mod collection;

mod storage;

/// Flat inner-product vector index.
pub mod vector;

// ============================================================================
// Public API re-exports
// ============================================================================

// Main database interface
pub use db::CorpusDB;

// Configuration
pub use config::Config;

// Error handling
pub use error::{CorpusDBError, Result, StorageError, ValidationError};

// Core types
pub use types::{DocumentId, Embedding, Metadata, MetadataFilter, MetadataValue};

// Domain types
pub use collection::{CollectionRecord, CollectionStats};

// Embedding layer
pub use embedding::{EmbeddingProvider, QueryCache};

// ============================================================================
// Prelude module for convenient imports
// ============================================================================

/// Convenient imports for common CorpusDB usage.
///
/// ```rust
/// use corpusdb::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::db::CorpusDB;
    pub use crate::embedding::EmbeddingProvider;
    pub use crate::error::{CorpusDBError, Result};
    pub use crate::types::{DocumentId, Metadata, MetadataFilter, MetadataValue};
}
