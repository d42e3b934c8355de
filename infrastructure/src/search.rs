use domain::embedding::squared_l2;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use shared::types::Result;

/// Exact nearest-neighbour index over row-major `f32` vectors.
///
/// Distances are squared L2; on unit vectors this ranks identically to cosine
/// similarity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlatIndex {
    dimension: usize,
    data: Vec<f32>,
}

impl FlatIndex {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            data: Vec::new(),
        }
    }

    pub fn from_vectors(vectors: &[Vec<f32>]) -> Result<Self> {
        let dimension = vectors.first().map(Vec::len).unwrap_or(0);
        let mut index = Self::new(dimension);
        index.data.reserve(dimension * vectors.len());
        for vector in vectors {
            index.add(vector)?;
        }
        Ok(index)
    }

    pub fn add(&mut self, vector: &[f32]) -> Result<()> {
        anyhow::ensure!(
            vector.len() == self.dimension,
            "vector has {} dimensions, index expects {}",
            vector.len(),
            self.dimension
        );
        self.data.extend_from_slice(vector);
        Ok(())
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn len(&self) -> usize {
        if self.dimension == 0 {
            0
        } else {
            self.data.len() / self.dimension
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Up to `k` `(position, distance)` pairs, nearest first; ties by position.
    pub fn search(&self, query: &[f32], k: usize) -> Vec<(usize, f32)> {
        if k == 0 || self.is_empty() || query.len() != self.dimension {
            return Vec::new();
        }
        let mut scored: Vec<(usize, f32)> = self
            .data
            .par_chunks(self.dimension)
            .enumerate()
            .map(|(position, row)| (position, squared_l2(query, row)))
            .collect();
        scored.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
        scored.truncate(k);
        scored
    }
}
