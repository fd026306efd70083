//! Knowledge compiler and tiered retrieval engine for JawiAI
//!
//! Offline, the [`KnowledgeCompiler`] turns the knowledge source into a
//! document sequence and a positionally paired similarity index. Online, the
//! [`RetrievalOrchestrator`] picks one of three tiers for each query (exact
//! match, semantic match, no match), assembles the matching instruction
//! payload and makes a single call to the generation delegate.

mod artifacts;
mod compiler;
mod config;
mod embedder;
mod engine;
mod exact_match;
mod flat_index;
mod knowledge_base;
mod prompt;
mod retrieval;

#[cfg(test)]
mod tests;

pub use artifacts::{
    INDEX_FORMAT_VERSION, IndexArtifact, METRIC_L2_SQUARED, fingerprint, load_documents,
    load_index, publish,
};
pub use compiler::{
    CompileReport, CompiledKnowledge, KnowledgeCompiler, LETTER_PREFIX, flatten, parse_records,
    read_records,
};
pub use config::{
    DEFAULT_DOCUMENTS_PATH, DEFAULT_EMBEDDING_MODEL, DEFAULT_EMBEDDING_URL, DEFAULT_INDEX_PATH,
    DEFAULT_KNOWLEDGE_PATH, EmbedderConfig, RagConfig,
};
pub use embedder::{HashEmbedder, OpenAiEmbedder, build_embedder};
pub use engine::{Answer, RetrievalOrchestrator};
pub use exact_match::{ExactMatchIndex, letter_key};
pub use flat_index::{FlatL2Index, squared_l2};
pub use knowledge_base::KnowledgeBase;
pub use prompt::{
    CREATIVE_MAX_TOKENS, CREATIVE_TEMPERATURE, GROUNDED_MAX_TOKENS, GROUNDED_SYSTEM_PROMPT,
    GROUNDED_TEMPERATURE, GUARDED_MAX_TOKENS, GUARDED_SYSTEM_PROMPT, GUARDED_TEMPERATURE,
    assemble, creative, grounded, grounded_turn, guarded_fallback,
};
pub use retrieval::{DEFAULT_RELEVANCE_THRESHOLD, Retriever};

// Re-export core types for convenience
pub use jawi_core::{
    Document, DocumentId, Embedder, Error, GenerationMode, GenerationRequest, Generator,
    KnowledgeRecord, Query, Result, RetrievalOutcome, RetrievalTier, SimilarityIndex,
};
