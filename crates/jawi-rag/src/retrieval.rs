//! Tier selection: exact match, then semantic match, then nothing

use std::sync::Arc;

use jawi_core::{Embedder, Error, Result, RetrievalOutcome, normalize_key};

use crate::knowledge_base::KnowledgeBase;

/// Maximum squared L2 distance for a semantic hit to count as relevant
pub const DEFAULT_RELEVANCE_THRESHOLD: f32 = 1.0;

/// Classifies a search term into exactly one retrieval tier.
#[derive(Clone)]
pub struct Retriever {
    knowledge: Arc<KnowledgeBase>,
    embedder: Arc<dyn Embedder>,
    relevance_threshold: f32,
}

impl Retriever {
    pub fn new(knowledge: Arc<KnowledgeBase>, embedder: Arc<dyn Embedder>) -> Self {
        Self {
            knowledge,
            embedder,
            relevance_threshold: DEFAULT_RELEVANCE_THRESHOLD,
        }
    }

    pub fn with_relevance_threshold(mut self, threshold: f32) -> Self {
        self.relevance_threshold = threshold;
        self
    }

    pub fn relevance_threshold(&self) -> f32 {
        self.relevance_threshold
    }

    pub fn knowledge(&self) -> &Arc<KnowledgeBase> {
        &self.knowledge
    }

    pub fn embedder(&self) -> &Arc<dyn Embedder> {
        &self.embedder
    }

    /// First tier that matches wins. An exact hit never reaches the embedder.
    pub async fn retrieve(&self, search_term: &str) -> Result<RetrievalOutcome> {
        let key = normalize_key(search_term);
        if key.is_empty() {
            return Err(Error::Validation("Query not found".to_string()));
        }

        if let Some(document) = self.knowledge.exact_match(&key) {
            tracing::info!(key = %key, "exact match");
            return Ok(RetrievalOutcome::ExactMatch(document.clone()));
        }

        if self.knowledge.is_empty() {
            tracing::info!("knowledge base is empty, no semantic lookup");
            return Ok(RetrievalOutcome::NoMatch);
        }

        let vector = self.embedder.embed(search_term).await?;
        let Some(nearest) = self.knowledge.nearest(&vector, 1)?.into_iter().next() else {
            return Ok(RetrievalOutcome::NoMatch);
        };

        if nearest.distance > self.relevance_threshold {
            tracing::info!(
                distance = nearest.distance,
                threshold = self.relevance_threshold,
                "no relevant context via semantic search"
            );
            return Ok(RetrievalOutcome::NoMatch);
        }

        let document = self.knowledge.document(nearest.id).ok_or_else(|| {
            Error::Index(format!(
                "neighbour {} is outside the {} loaded documents",
                nearest.id,
                self.knowledge.len()
            ))
        })?;

        tracing::info!(distance = nearest.distance, id = nearest.id, "semantic match");
        Ok(RetrievalOutcome::SemanticMatch {
            document: document.clone(),
            distance: nearest.distance,
        })
    }
}
