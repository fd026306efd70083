//! Exhaustive L2 similarity index

use jawi_core::{Error, Neighbor, Result, SimilarityIndex};

/// Flat (brute force) index over equally sized vectors.
///
/// Distances are squared Euclidean, the convention the relevance threshold
/// was tuned against. Vector ids are insertion positions.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatL2Index {
    dimensions: usize,
    vectors: Vec<Vec<f32>>,
}

impl FlatL2Index {
    /// Create an empty index
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
            vectors: Vec::new(),
        }
    }

    /// Build an index from vectors in document order
    pub fn from_vectors(dimensions: usize, vectors: Vec<Vec<f32>>) -> Result<Self> {
        let mut index = Self::new(dimensions);
        for vector in vectors {
            index.add(vector)?;
        }
        Ok(index)
    }

    /// Append a vector; its id is the previous length
    pub fn add(&mut self, vector: Vec<f32>) -> Result<usize> {
        self.check_dimensions(&vector)?;
        if vector.iter().any(|v| !v.is_finite()) {
            return Err(Error::Index(format!(
                "vector {} contains a non-finite component",
                self.vectors.len()
            )));
        }
        self.vectors.push(vector);
        Ok(self.vectors.len() - 1)
    }

    pub fn vectors(&self) -> &[Vec<f32>] {
        &self.vectors
    }

    pub fn into_vectors(self) -> Vec<Vec<f32>> {
        self.vectors
    }

    fn check_dimensions(&self, vector: &[f32]) -> Result<()> {
        if vector.len() != self.dimensions {
            return Err(Error::Index(format!(
                "expected a {}-dimensional vector, got {}",
                self.dimensions,
                vector.len()
            )));
        }
        Ok(())
    }
}

/// Squared Euclidean distance
pub fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

impl SimilarityIndex for FlatL2Index {
    fn len(&self) -> usize {
        self.vectors.len()
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn nearest(&self, vector: &[f32], k: usize) -> Result<Vec<Neighbor>> {
        self.check_dimensions(vector)?;

        let mut scored: Vec<Neighbor> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(id, candidate)| Neighbor {
                distance: squared_l2(vector, candidate),
                id,
            })
            .collect();

        // Stable sort keeps the lower id first on equal distances.
        scored.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        scored.truncate(k);
        Ok(scored)
    }
}
