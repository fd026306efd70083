//! Embedding function trait

use async_trait::async_trait;

use crate::Result;

/// A function from text to a fixed-length vector.
///
/// The compiler and the orchestrator must use the same implementation (same
/// [`name`](Embedder::name) and [`dimensions`](Embedder::dimensions)); the
/// index artifact records both and refuses to load against a different one.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a single text
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed several texts, preserving order.
    ///
    /// The default implementation calls [`embed`](Embedder::embed) sequentially.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(texts.len());
        for text in texts {
            vectors.push(self.embed(text).await?);
        }
        Ok(vectors)
    }

    /// Length of every vector this embedder produces
    fn dimensions(&self) -> usize;

    /// Stable identifier of the embedding model
    fn name(&self) -> &str;
}
