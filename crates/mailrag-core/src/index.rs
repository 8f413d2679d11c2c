//! Exact flat similarity index over embedding vectors.
//!
//! The index stores vectors by build position (`0..N`) and answers
//! k-nearest-neighbour queries by brute force. Distances are squared
//! Euclidean: monotonic with true L2 distance, so the neighbour ordering
//! is identical without the square root.
//!
//! # Ordering
//!
//! Results are sorted by distance ascending, then by position ascending,
//! so equal-distance neighbours always come back in insertion order.

use std::cmp::Ordering;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IndexError {
    #[error("vector dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },
}

/// One search hit: build position and squared distance to the query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub position: usize,
    pub distance: f32,
}

/// An exact, in-memory nearest-neighbour index.
///
/// Built wholesale from a vector sequence; there is no insert or delete.
#[derive(Debug, Clone, Default)]
pub struct FlatIndex {
    dims: usize,
    vectors: Vec<Vec<f32>>,
}

impl FlatIndex {
    /// Build an index from `vectors`, taking ownership.
    ///
    /// An empty input yields a valid empty index. Every vector must share
    /// the length of the first one.
    pub fn build(vectors: Vec<Vec<f32>>) -> Result<Self, IndexError> {
        let dims = vectors.first().map(|v| v.len()).unwrap_or(0);
        if let Some(bad) = vectors.iter().find(|v| v.len() != dims) {
            return Err(IndexError::DimensionMismatch {
                expected: dims,
                got: bad.len(),
            });
        }
        Ok(Self { dims, vectors })
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Vector length shared by all stored vectors (`0` when empty).
    pub fn dims(&self) -> usize {
        self.dims
    }

    /// Return up to `k` nearest neighbours of `query`.
    ///
    /// `k` is clamped to the index size; an empty index returns an empty
    /// result for any query.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>, IndexError> {
        let k = k.min(self.len());
        if k == 0 {
            return Ok(Vec::new());
        }
        if query.len() != self.dims {
            return Err(IndexError::DimensionMismatch {
                expected: self.dims,
                got: query.len(),
            });
        }

        let mut scored: Vec<Neighbor> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(position, v)| Neighbor {
                position,
                distance: squared_euclidean(query, v),
            })
            .collect();

        scored.sort_by(|a, b| match a.distance.total_cmp(&b.distance) {
            Ordering::Equal => a.position.cmp(&b.position),
            other => other,
        });
        scored.truncate(k);
        Ok(scored)
    }
}

/// Squared Euclidean distance between two equal-length vectors.
pub fn squared_euclidean(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}
