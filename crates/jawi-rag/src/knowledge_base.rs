//! The read-only retrieval state shared by every request

use std::path::Path;

use jawi_core::{Document, DocumentId, Embedder, Error, Neighbor, Result, SimilarityIndex};

use crate::artifacts::{self, fingerprint};
use crate::compiler::CompiledKnowledge;
use crate::exact_match::ExactMatchIndex;

/// Documents, their similarity index and the derived exact-match index.
///
/// The only constructors check that documents and index vectors pair up one
/// to one, so a `KnowledgeBase` can never hold drifted halves. It is never
/// mutated after construction and is shared behind an `Arc`.
pub struct KnowledgeBase {
    documents: Vec<Document>,
    index: Box<dyn SimilarityIndex>,
    exact: ExactMatchIndex,
}

impl std::fmt::Debug for KnowledgeBase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KnowledgeBase")
            .field("documents", &self.documents.len())
            .field("vectors", &self.index.len())
            .field("exact_keys", &self.exact.len())
            .finish()
    }
}

impl KnowledgeBase {
    /// Pair a document sequence with an index built from it
    pub fn from_parts(documents: Vec<Document>, index: Box<dyn SimilarityIndex>) -> Result<Self> {
        if documents.len() != index.len() {
            return Err(Error::StartupIntegrity(format!(
                "{} documents but {} index entries",
                documents.len(),
                index.len()
            )));
        }

        let exact = ExactMatchIndex::build(&documents);
        tracing::info!(
            documents = documents.len(),
            exact_keys = exact.len(),
            "knowledge base ready"
        );

        Ok(Self {
            documents,
            index,
            exact,
        })
    }

    /// Use freshly compiled knowledge without a trip through the filesystem
    pub fn from_compiled(compiled: CompiledKnowledge) -> Result<Self> {
        Self::from_parts(compiled.documents, Box::new(compiled.index))
    }

    /// Load both artifacts and verify they belong together and to `embedder`.
    ///
    /// Every failure here is a [`Error::StartupIntegrity`]; the service must
    /// not start on a partial or mismatched pair.
    pub fn load(documents_path: &Path, index_path: &Path, embedder: &dyn Embedder) -> Result<Self> {
        let documents = artifacts::load_documents(documents_path)?;
        let artifact = artifacts::load_index(index_path)?;

        if artifact.len() != documents.len() {
            return Err(Error::StartupIntegrity(format!(
                "{} holds {} documents but {} holds {} vectors",
                documents_path.display(),
                documents.len(),
                index_path.display(),
                artifact.len()
            )));
        }

        let expected = fingerprint(&documents);
        if artifact.fingerprint != expected {
            return Err(Error::StartupIntegrity(format!(
                "index was built from different documents (index fingerprint {}, documents {})",
                artifact.fingerprint, expected
            )));
        }

        if artifact.embedder != embedder.name() || artifact.dimensions != embedder.dimensions() {
            return Err(Error::StartupIntegrity(format!(
                "index was built with embedder {} ({} dims) but {} ({} dims) is configured",
                artifact.embedder,
                artifact.dimensions,
                embedder.name(),
                embedder.dimensions()
            )));
        }

        tracing::info!(
            built_at = %artifact.built_at,
            fingerprint = %artifact.fingerprint,
            "loaded compiled knowledge"
        );

        let index = artifact.into_index()?;
        Self::from_parts(documents, Box::new(index))
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn document(&self, id: DocumentId) -> Option<&Document> {
        self.documents.get(id)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn exact_match_index(&self) -> &ExactMatchIndex {
        &self.exact
    }

    /// Exact lookup by an already normalized key
    pub fn exact_match(&self, key: &str) -> Option<&Document> {
        self.exact.get(key).and_then(|id| self.documents.get(id))
    }

    /// Nearest neighbours of an embedded search term
    pub fn nearest(&self, vector: &[f32], k: usize) -> Result<Vec<Neighbor>> {
        self.index.nearest(vector, k)
    }

    pub fn dimensions(&self) -> usize {
        self.index.dimensions()
    }
}
