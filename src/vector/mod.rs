//! Flat inner-product vector index.
//!
//! This module provides the exact (non-approximate) nearest-neighbor
//! structure backing each collection: a query vector is compared against
//! every stored vector via inner product.
//!
//! Vectors are stored L2-normalized, so inner product equals cosine
//! similarity and scores are nominally in `[-1, 1]`. The store is
//! append-only — row-level deletion and update are unsupported; the only
//! deletion granularity is the whole collection.

mod flat;

pub use flat::{l2_normalize, FlatIndex};
