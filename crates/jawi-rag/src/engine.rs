//! Retrieval orchestrator: tier selection, prompt assembly and one generation call

use serde::Serialize;
use std::sync::Arc;

use jawi_core::{
    Embedder, Error, GenerationRequest, Generator, Query, Result, RetrievalOutcome, RetrievalTier,
};

use crate::knowledge_base::KnowledgeBase;
use crate::prompt;
use crate::retrieval::Retriever;

/// A generated answer plus how it was grounded
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Answer {
    pub response: String,
    pub tier: RetrievalTier,
    /// Squared L2 distance, present for semantic matches only
    pub distance: Option<f32>,
}

/// Per-process query engine.
///
/// Built once at startup around an immutable [`KnowledgeBase`] and shared by
/// reference between concurrent requests. Each query makes at most one
/// generation attempt; failures are returned to the caller, never retried.
pub struct RetrievalOrchestrator {
    retriever: Retriever,
    generator: Arc<dyn Generator>,
}

impl RetrievalOrchestrator {
    pub fn new(
        knowledge: Arc<KnowledgeBase>,
        embedder: Arc<dyn Embedder>,
        generator: Arc<dyn Generator>,
    ) -> Self {
        Self {
            retriever: Retriever::new(knowledge, embedder),
            generator,
        }
    }

    pub fn with_relevance_threshold(mut self, threshold: f32) -> Self {
        self.retriever = self.retriever.with_relevance_threshold(threshold);
        self
    }

    pub fn knowledge(&self) -> &KnowledgeBase {
        self.retriever.knowledge()
    }

    pub fn embedder_name(&self) -> &str {
        self.retriever.embedder().name()
    }

    pub fn model_id(&self) -> &str {
        self.generator.model_id()
    }

    pub fn relevance_threshold(&self) -> f32 {
        self.retriever.relevance_threshold()
    }

    /// Run tier selection and build the payload without calling the model
    pub async fn prepare(&self, query: &Query) -> Result<(RetrievalOutcome, GenerationRequest)> {
        query.validate()?;

        let search_term = query.search_term();
        tracing::info!(
            search_term = %search_term,
            hinted = search_term != query.text,
            history = query.history.len(),
            "retrieving context"
        );

        let outcome = self.retriever.retrieve(search_term).await?;
        let request = prompt::assemble(&outcome, query);
        tracing::debug!(tier = %outcome.tier(), mode = %request.mode, "assembled prompt");

        Ok((outcome, request))
    }

    /// Answer a question grounded in the knowledge base when possible
    pub async fn answer(&self, query: &Query) -> Result<Answer> {
        let (outcome, request) = self.prepare(query).await?;
        let response = self.generate(&request).await?;

        Ok(Answer {
            response,
            tier: outcome.tier(),
            distance: match outcome {
                RetrievalOutcome::SemanticMatch { distance, .. } => Some(distance),
                _ => None,
            },
        })
    }

    /// Creative mode: no retrieval, no history
    pub async fn create(&self, request: &str) -> Result<String> {
        if request.trim().is_empty() {
            return Err(Error::Validation("Query not found".to_string()));
        }
        self.generate(&prompt::creative(request)).await
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        let text = self.generator.generate(request).await.inspect_err(|e| {
            tracing::error!(mode = %request.mode, error = %e, "generation failed");
        })?;

        let text = text.trim();
        if text.is_empty() {
            return Err(Error::Delegate("model returned an empty response".to_string()));
        }
        Ok(text.to_string())
    }
}
