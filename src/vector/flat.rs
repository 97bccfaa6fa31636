//! Flat inner-product index implementation.
//!
//! Row-major `Vec<f32>` storage with brute-force top-k search. No graph,
//! no quantization: every query scans every row. Exactness is the point —
//! metadata filtering happens after retrieval, and approximate recall
//! under a filter is hard to reason about.
//!
//! # Thread Safety
//!
//! `FlatIndex` has no interior mutability. Mutation of one collection's
//! index is not safe from multiple concurrent callers; the owner
//! (the collection record behind its lock) serializes appends.

use crate::error::{Result, ValidationError};

/// Scales a vector to unit L2 length in place.
///
/// Zero and near-zero vectors are left untouched: dividing by a norm
/// under `EPS` would amplify noise into garbage directions.
pub fn l2_normalize(vector: &mut [f32]) {
    const EPS: f32 = 1e-12;

    let norm_sq: f32 = vector.iter().map(|x| x * x).sum();
    if norm_sq <= EPS {
        return;
    }
    let inv_norm = norm_sq.sqrt().recip();
    for x in vector.iter_mut() {
        *x *= inv_norm;
    }
}

/// Append-only flat inner-product vector store for one collection.
///
/// The dimension is fixed at construction (by the collection's first
/// successful insert) and every appended vector must match it exactly.
/// Callers are expected to normalize vectors before appending so that
/// inner product equals cosine similarity.
#[derive(Clone, Debug)]
pub struct FlatIndex {
    /// Row-major vector data, `rows * dimension` values.
    data: Vec<f32>,

    /// Width of every row. Never zero.
    dimension: usize,
}

impl FlatIndex {
    /// Creates an empty index with the given dimension.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::InvalidField` if `dimension` is zero.
    pub fn new(dimension: usize) -> Result<Self> {
        if dimension == 0 {
            return Err(
                ValidationError::invalid_field("dimension", "must be greater than 0").into(),
            );
        }
        Ok(Self {
            data: Vec::new(),
            dimension,
        })
    }

    /// Rebuilds an index from raw row-major data (persistence path).
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::InvalidField` if `dimension` is zero or
    /// `data` is not a whole number of rows.
    pub fn from_raw(dimension: usize, data: Vec<f32>) -> Result<Self> {
        if dimension == 0 {
            return Err(
                ValidationError::invalid_field("dimension", "must be greater than 0").into(),
            );
        }
        if data.len() % dimension != 0 {
            return Err(ValidationError::invalid_field(
                "data",
                format!(
                    "length {} is not a multiple of dimension {}",
                    data.len(),
                    dimension
                ),
            )
            .into());
        }
        Ok(Self { data, dimension })
    }

    /// Appends one vector, returning its new row index.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::DimensionMismatch` if the vector width
    /// differs from the index dimension. Nothing is appended on error.
    pub fn append(&mut self, vector: &[f32]) -> Result<usize> {
        if vector.len() != self.dimension {
            return Err(
                ValidationError::dimension_mismatch(self.dimension, vector.len()).into(),
            );
        }
        let row = self.len();
        self.data.extend_from_slice(vector);
        Ok(row)
    }

    /// Exact top-k inner-product search.
    ///
    /// Returns up to `min(k, rows)` `(row, score)` pairs sorted by score
    /// descending. For normalized vectors the score is cosine similarity.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::DimensionMismatch` if the query width
    /// differs from the index dimension.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<(usize, f32)>> {
        if query.len() != self.dimension {
            return Err(
                ValidationError::dimension_mismatch(self.dimension, query.len()).into(),
            );
        }
        if k == 0 || self.is_empty() {
            return Ok(Vec::new());
        }

        let mut scored: Vec<(usize, f32)> = self
            .data
            .chunks_exact(self.dimension)
            .map(|row| row.iter().zip(query).map(|(a, b)| a * b).sum::<f32>())
            .enumerate()
            .collect();

        // total_cmp keeps the sort total even if a NaN sneaks in through
        // un-normalizable input
        scored.sort_unstable_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(k);
        Ok(scored)
    }

    /// Returns one row as a slice, or `None` if out of bounds.
    pub fn row(&self, row: usize) -> Option<&[f32]> {
        let start = row.checked_mul(self.dimension)?;
        self.data.get(start..start + self.dimension)
    }

    /// Returns the number of stored vectors.
    pub fn len(&self) -> usize {
        self.data.len() / self.dimension
    }

    /// Returns true if the index has no vectors.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns the fixed row width.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Returns the raw row-major data (persistence path).
    pub fn raw_data(&self) -> &[f32] {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalized(mut v: Vec<f32>) -> Vec<f32> {
        l2_normalize(&mut v);
        v
    }

    #[test]
    fn test_new_index_is_empty() {
        let index = FlatIndex::new(4).unwrap();
        assert_eq!(index.len(), 0);
        assert!(index.is_empty());
        assert_eq!(index.dimension(), 4);
    }

    #[test]
    fn test_zero_dimension_rejected() {
        assert!(FlatIndex::new(0).is_err());
        assert!(FlatIndex::from_raw(0, vec![]).is_err());
    }

    #[test]
    fn test_append_and_len() {
        let mut index = FlatIndex::new(2).unwrap();
        assert_eq!(index.append(&[1.0, 0.0]).unwrap(), 0);
        assert_eq!(index.append(&[0.0, 1.0]).unwrap(), 1);
        assert_eq!(index.len(), 2);
        assert_eq!(index.row(1), Some(&[0.0, 1.0][..]));
        assert_eq!(index.row(2), None);
    }

    #[test]
    fn test_append_dimension_mismatch() {
        let mut index = FlatIndex::new(3).unwrap();
        let err = index.append(&[1.0, 0.0]).unwrap_err();
        assert!(err.is_dimension_mismatch());
        assert!(index.is_empty());
    }

    #[test]
    fn test_search_orders_by_inner_product() {
        let mut index = FlatIndex::new(2).unwrap();
        index.append(&[1.0, 0.0]).unwrap();
        index.append(&[0.0, 1.0]).unwrap();
        index.append(&normalized(vec![1.0, 1.0])).unwrap();

        let results = index.search(&[1.0, 0.0], 3).unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].0, 0);
        assert!((results[0].1 - 1.0).abs() < 1e-6);
        assert_eq!(results[1].0, 2);
        for w in results.windows(2) {
            assert!(w[0].1 >= w[1].1, "results not sorted by score");
        }
    }

    #[test]
    fn test_search_k_larger_than_rows() {
        let mut index = FlatIndex::new(2).unwrap();
        index.append(&[1.0, 0.0]).unwrap();
        let results = index.search(&[1.0, 0.0], 100).unwrap();
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn test_search_k_zero() {
        let mut index = FlatIndex::new(2).unwrap();
        index.append(&[1.0, 0.0]).unwrap();
        assert!(index.search(&[1.0, 0.0], 0).unwrap().is_empty());
    }

    #[test]
    fn test_search_empty_index() {
        let index = FlatIndex::new(2).unwrap();
        assert!(index.search(&[1.0, 0.0], 5).unwrap().is_empty());
    }

    #[test]
    fn test_search_query_dimension_mismatch() {
        let index = FlatIndex::new(3).unwrap();
        assert!(index.search(&[1.0, 0.0], 5).is_err());
    }

    #[test]
    fn test_from_raw_roundtrip() {
        let mut index = FlatIndex::new(2).unwrap();
        index.append(&[1.0, 0.0]).unwrap();
        index.append(&[0.0, 1.0]).unwrap();

        let rebuilt = FlatIndex::from_raw(2, index.raw_data().to_vec()).unwrap();
        assert_eq!(rebuilt.len(), 2);
        assert_eq!(rebuilt.row(0), index.row(0));
    }

    #[test]
    fn test_from_raw_ragged_rejected() {
        assert!(FlatIndex::from_raw(2, vec![1.0, 0.0, 0.5]).is_err());
    }

    #[test]
    fn test_l2_normalize() {
        let mut v = vec![3.0, 4.0];
        l2_normalize(&mut v);
        assert!((v[0] - 0.6).abs() < 1e-6);
        assert!((v[1] - 0.8).abs() < 1e-6);

        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_l2_normalize_zero_vector_untouched() {
        let mut v = vec![0.0, 0.0, 0.0];
        l2_normalize(&mut v);
        assert_eq!(v, vec![0.0, 0.0, 0.0]);
    }
}
