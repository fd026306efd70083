//! On-disk form of the compiled knowledge and its atomic publication

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

use jawi_core::{Document, Error, Result, SimilarityIndex};

use crate::compiler::CompiledKnowledge;
use crate::flat_index::FlatL2Index;

pub const INDEX_FORMAT_VERSION: u32 = 1;
pub const METRIC_L2_SQUARED: &str = "l2_squared";

/// Serialized similarity index, with what it takes to check it against the
/// document sequence it was built from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexArtifact {
    pub format_version: u32,
    pub metric: String,
    pub embedder: String,
    pub dimensions: usize,
    /// Fingerprint of the document sequence the vectors were computed from
    pub fingerprint: String,
    pub built_at: DateTime<Utc>,
    pub vectors: Vec<Vec<f32>>,
}

impl IndexArtifact {
    pub fn from_compiled(compiled: &CompiledKnowledge) -> Self {
        Self {
            format_version: INDEX_FORMAT_VERSION,
            metric: METRIC_L2_SQUARED.to_string(),
            embedder: compiled.embedder.clone(),
            dimensions: compiled.index.dimensions(),
            fingerprint: compiled.fingerprint(),
            built_at: Utc::now(),
            vectors: compiled.index.vectors().to_vec(),
        }
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Rebuild the in-memory index, rejecting malformed vectors
    pub fn into_index(self) -> Result<FlatL2Index> {
        if self.format_version != INDEX_FORMAT_VERSION {
            return Err(Error::StartupIntegrity(format!(
                "unsupported index format version {}",
                self.format_version
            )));
        }
        if self.metric != METRIC_L2_SQUARED {
            return Err(Error::StartupIntegrity(format!(
                "unsupported index metric '{}'",
                self.metric
            )));
        }
        FlatL2Index::from_vectors(self.dimensions, self.vectors)
            .map_err(|e| Error::StartupIntegrity(format!("corrupt index: {e}")))
    }
}

/// Order-sensitive digest of a document sequence
pub fn fingerprint(documents: &[Document]) -> String {
    let mut context = md5::Context::new();
    for document in documents {
        context.consume(document.as_str().as_bytes());
        context.consume([0u8]);
    }
    format!("{:x}", context.compute())
}

/// Write and sync `bytes` to a temporary file in `path`'s directory
fn stage(path: &Path, bytes: &[u8]) -> Result<NamedTempFile> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(bytes)?;
    file.as_file().sync_all()?;
    Ok(file)
}

fn commit(staged: NamedTempFile, path: &Path) -> Result<()> {
    staged.persist(path).map_err(|e| Error::Io(e.error))?;
    Ok(())
}

/// Write `bytes` next to `path` and rename over it, so readers see the old
/// file or the new one and never a partial write.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    commit(stage(path, bytes)?, path)
}

/// Publish both artifacts.
///
/// Both files are fully written and synced before either is renamed into
/// place, so a failed write leaves the previous pair untouched. The only
/// window left is between the two renames: the documents go first and the
/// index, which carries the fingerprint, last, so a crash there leaves a pair
/// whose fingerprints disagree and the loader refuses it.
pub fn publish(
    compiled: &CompiledKnowledge,
    documents_path: &Path,
    index_path: &Path,
) -> Result<()> {
    let documents = serde_json::to_vec_pretty(&compiled.documents)?;
    let index = serde_json::to_vec(&IndexArtifact::from_compiled(compiled))?;

    let staged_documents = stage(documents_path, &documents)?;
    let staged_index = stage(index_path, &index)?;

    commit(staged_documents, documents_path)?;
    commit(staged_index, index_path)?;
    Ok(())
}

fn read_artifact(path: &Path, what: &str) -> Result<String> {
    fs::read_to_string(path).map_err(|e| {
        Error::StartupIntegrity(format!("cannot read {what} at {}: {e}", path.display()))
    })
}

/// Load the ordered document sequence
pub fn load_documents(path: &Path) -> Result<Vec<Document>> {
    let raw = read_artifact(path, "documents")?;
    serde_json::from_str(&raw).map_err(|e| {
        Error::StartupIntegrity(format!("documents at {} are malformed: {e}", path.display()))
    })
}

/// Load the serialized index
pub fn load_index(path: &Path) -> Result<IndexArtifact> {
    let raw = read_artifact(path, "index")?;
    serde_json::from_str(&raw).map_err(|e| {
        Error::StartupIntegrity(format!("index at {} is malformed: {e}", path.display()))
    })
}
