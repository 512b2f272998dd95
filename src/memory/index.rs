//! Flat (exhaustive) L2 nearest-neighbor index.
//!
//! Compares a query against every stored vector: exact results, linear time
//! per query. Append-only within a session; there is no delete or update in
//! place, removal happens upstream as filter + full rebuild.

use std::cmp::Ordering;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use anyhow::{Context, Result};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::MemoryError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlatIndex {
    dimension: usize,
    /// Row-major storage, `len() * dimension` floats.
    vectors: Vec<f32>,
}

impl FlatIndex {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            vectors: Vec::new(),
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn len(&self) -> usize {
        if self.dimension == 0 {
            0
        } else {
            self.vectors.len() / self.dimension
        }
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Appends one vector. O(1) amortized; the only mutation the index
    /// supports besides wholesale replacement.
    pub fn append(&mut self, vector: &[f32]) -> Result<(), MemoryError> {
        if vector.len() != self.dimension {
            return Err(MemoryError::DimensionMismatch {
                expected: self.dimension,
                got: vector.len(),
            });
        }
        self.vectors.extend_from_slice(vector);
        Ok(())
    }

    /// Up to `k` positions ordered by ascending L2 distance, with distances.
    /// An empty index yields an empty result, not an error.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<(usize, f32)>, MemoryError> {
        if query.len() != self.dimension {
            return Err(MemoryError::DimensionMismatch {
                expected: self.dimension,
                got: query.len(),
            });
        }
        if self.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .par_chunks(self.dimension)
            .enumerate()
            .map(|(idx, row)| (idx, l2_distance(query, row)))
            .collect();

        // Stable by position on equal distance, so orderings are
        // reproducible for a given index state.
        scored.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));
        scored.truncate(k);
        Ok(scored)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let file =
            File::create(path).with_context(|| format!("creating index file {:?}", path))?;
        bincode::serialize_into(BufWriter::new(file), self)
            .context("serializing flat index")?;
        Ok(())
    }

    /// Loads a persisted index. A dimension other than `expected_dimension`
    /// means the embedding model changed since the index was written; the
    /// store must be wiped or rebuilt, never queried across models.
    pub fn load(path: &Path, expected_dimension: usize) -> Result<Self> {
        let file =
            File::open(path).with_context(|| format!("opening index file {:?}", path))?;
        let index: FlatIndex = bincode::deserialize_from(BufReader::new(file))
            .context("deserializing flat index")?;
        if index.dimension != expected_dimension {
            return Err(MemoryError::DimensionMismatch {
                expected: expected_dimension,
                got: index.dimension,
            }
            .into());
        }
        Ok(index)
    }
}

fn l2_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}
