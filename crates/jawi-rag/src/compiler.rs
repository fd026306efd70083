//! Knowledge compiler: records to documents to a similarity index

use serde_json::Value;
use std::path::Path;
use std::sync::Arc;

use jawi_core::{Document, Embedder, Error, KnowledgeRecord, LetterRecord, Result, TopicRecord};

use crate::artifacts::{self, fingerprint};
use crate::flat_index::FlatL2Index;

/// Fixed prefix of letter documents; exact-match extraction depends on it.
pub const LETTER_PREFIX: &str = "Letter name: ";

const EMBED_BATCH_SIZE: usize = 32;

/// Render one record with its variant's template.
///
/// Missing optional fields render as empty text; the template itself never
/// changes shape.
pub fn flatten(record: &KnowledgeRecord) -> Document {
    match record {
        KnowledgeRecord::Topic(TopicRecord { topic, content }) => {
            Document::new(format!("Topic: {topic}. Explanation: {content}"))
        }
        KnowledgeRecord::Letter(LetterRecord {
            name,
            character,
            info,
            latin_example,
            jawi_example,
        }) => Document::new(format!(
            "{LETTER_PREFIX}{name}. Jawi character form: {}. Info: {info} Example word in Latin is '{}' and in Jawi is '{}'.",
            character.as_deref().unwrap_or_default(),
            latin_example.as_deref().unwrap_or_default(),
            jawi_example.as_deref().unwrap_or_default(),
        )),
    }
}

/// Parse the knowledge source, dropping entries of unknown shape.
pub fn parse_records(source: &str) -> Result<Vec<KnowledgeRecord>> {
    let entries: Vec<Value> = serde_json::from_str(source)
        .map_err(|e| Error::Serialization(format!("knowledge source must be a JSON array: {e}")))?;

    let total = entries.len();
    let records: Vec<KnowledgeRecord> = entries
        .into_iter()
        .enumerate()
        .filter_map(|(position, entry)| {
            let kind = entry
                .get("type")
                .and_then(Value::as_str)
                .unwrap_or("<missing>")
                .to_string();
            match serde_json::from_value::<KnowledgeRecord>(entry) {
                Ok(record) => Some(record),
                Err(e) => {
                    tracing::warn!(position, kind = %kind, error = %e, "dropping knowledge entry");
                    None
                }
            }
        })
        .collect();

    if records.len() < total {
        tracing::warn!(
            kept = records.len(),
            dropped = total - records.len(),
            "some knowledge entries were not recognised"
        );
    }

    Ok(records)
}

/// Read and parse a knowledge source file
pub fn read_records(path: &Path) -> Result<Vec<KnowledgeRecord>> {
    let source = std::fs::read_to_string(path)?;
    parse_records(&source)
}

/// Output of one compiler run: documents and their positionally paired index
#[derive(Debug, Clone)]
pub struct CompiledKnowledge {
    pub documents: Vec<Document>,
    pub index: FlatL2Index,
    pub embedder: String,
}

impl CompiledKnowledge {
    pub fn fingerprint(&self) -> String {
        fingerprint(&self.documents)
    }
}

/// Summary of a compile-and-publish run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileReport {
    pub records: usize,
    pub documents: usize,
    pub dimensions: usize,
    pub fingerprint: String,
}

/// Offline batch compiler
pub struct KnowledgeCompiler {
    embedder: Arc<dyn Embedder>,
}

impl KnowledgeCompiler {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self { embedder }
    }

    /// Embed every document in order and insert the vectors in that order,
    /// so vector `i` belongs to document `i`.
    pub async fn build_index(&self, documents: &[Document]) -> Result<FlatL2Index> {
        let mut index = FlatL2Index::new(self.embedder.dimensions());

        for chunk in documents.chunks(EMBED_BATCH_SIZE) {
            let texts: Vec<&str> = chunk.iter().map(Document::as_str).collect();
            let vectors = self.embedder.embed_batch(&texts).await?;
            if vectors.len() != texts.len() {
                return Err(Error::Embedding(format!(
                    "embedder returned {} vectors for {} documents",
                    vectors.len(),
                    texts.len()
                )));
            }
            for vector in vectors {
                index.add(vector)?;
            }
            tracing::debug!(
                embedded = index.vectors().len(),
                total = documents.len(),
                "embedding documents"
            );
        }

        Ok(index)
    }

    /// Flatten and embed a batch of records
    pub async fn compile(&self, records: &[KnowledgeRecord]) -> Result<CompiledKnowledge> {
        let documents: Vec<Document> = records.iter().map(flatten).collect();
        if documents.is_empty() {
            tracing::warn!("knowledge source produced no documents; every query will fall back");
        }

        let index = self.build_index(&documents).await?;

        Ok(CompiledKnowledge {
            documents,
            index,
            embedder: self.embedder.name().to_string(),
        })
    }

    /// Read the source, compile it and publish both artifacts
    pub async fn compile_file(
        &self,
        source: &Path,
        documents_path: &Path,
        index_path: &Path,
    ) -> Result<CompileReport> {
        let records = read_records(source)?;
        tracing::info!(
            records = records.len(),
            source = %source.display(),
            "loaded knowledge source"
        );

        let compiled = self.compile(&records).await?;
        artifacts::publish(&compiled, documents_path, index_path)?;

        let report = CompileReport {
            records: records.len(),
            documents: compiled.documents.len(),
            dimensions: self.embedder.dimensions(),
            fingerprint: compiled.fingerprint(),
        };
        tracing::info!(
            documents = report.documents,
            fingerprint = %report.fingerprint,
            "published compiled knowledge"
        );
        Ok(report)
    }
}
