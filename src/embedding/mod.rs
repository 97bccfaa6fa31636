//! Embedding provider abstractions for CorpusDB.
//!
//! CorpusDB never computes embeddings itself: the caller supplies an
//! [`EmbeddingProvider`] (an OpenAI-compatible API client, a local model,
//! a deterministic stub in tests) and the database calls it for document
//! ingestion and query embedding. Provider failures propagate to the
//! caller unchanged — there is no retry or backoff at this layer.
//!
//! # Implementing a Provider
//!
//! ```rust,ignore
//! use async_trait::async_trait;
//! use corpusdb::{embedding::EmbeddingProvider, CorpusDBError, Embedding, Result};
//!
//! struct ApiProvider {
//!     client: MyApiClient,
//! }
//!
//! #[async_trait]
//! impl EmbeddingProvider for ApiProvider {
//!     async fn embed(&self, texts: &[String]) -> Result<Vec<Embedding>> {
//!         self.client
//!             .embeddings(texts)
//!             .await
//!             .map_err(|e| CorpusDBError::embedding(e.to_string()))
//!     }
//! }
//! ```

pub mod cache;

pub use cache::QueryCache;

use async_trait::async_trait;

use crate::error::Result;
use crate::types::Embedding;

/// Asynchronous embedding provider.
///
/// Accepts a list of strings and returns one fixed-length float vector
/// per string, in input order. Implementations must be `Send + Sync`;
/// the facade calls them concurrently from multiple ingestion batches.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generates one embedding per input text.
    ///
    /// All returned vectors must have the same width. An empty input
    /// yields an empty output.
    ///
    /// # Errors
    ///
    /// Implementations surface their transport/model failures as
    /// `CorpusDBError::Embedding`; CorpusDB passes them through without
    /// retrying.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Embedding>>;
}
