//! Similarity index trait

use serde::{Deserialize, Serialize};

use crate::{DocumentId, Result};

/// One search hit: distance under the index metric and the document position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Neighbor {
    pub distance: f32,
    pub id: DocumentId,
}

/// Read-only nearest-neighbour search over document embeddings.
///
/// Vector `i` of the index belongs to document `i` of the compiled sequence.
pub trait SimilarityIndex: Send + Sync {
    /// Number of indexed vectors
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Vector dimensionality
    fn dimensions(&self) -> usize;

    /// Up to `k` neighbours of `vector`, closest first. Empty when the index is empty.
    fn nearest(&self, vector: &[f32], k: usize) -> Result<Vec<Neighbor>>;
}
