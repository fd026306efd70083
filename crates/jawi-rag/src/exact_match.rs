//! Exact-match lookup over letter documents

use std::collections::HashMap;

use jawi_core::{Document, DocumentId, normalize_key};

use crate::compiler::LETTER_PREFIX;

/// Normalized letter name of a letter document.
///
/// The name is the text between the letter prefix and the first `.`,
/// trimmed and lower-cased. Other documents, and letters with an empty
/// name, yield nothing.
pub fn letter_key(document: &Document) -> Option<String> {
    let text = document.as_str();
    if !text.starts_with(LETTER_PREFIX.trim_end()) {
        return None;
    }

    let segment = text.split('.').next()?;
    let name = segment
        .strip_prefix(LETTER_PREFIX)
        .or_else(|| segment.strip_prefix(LETTER_PREFIX.trim_end()))?;

    let key = normalize_key(name);
    (!key.is_empty()).then_some(key)
}

/// Map from normalized letter name to document position.
///
/// Built once from the loaded document sequence and never modified.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExactMatchIndex {
    keys: HashMap<String, DocumentId>,
}

impl ExactMatchIndex {
    /// Scan documents in order; a later duplicate name replaces an earlier one.
    pub fn build(documents: &[Document]) -> Self {
        let mut keys = HashMap::new();
        for (id, document) in documents.iter().enumerate() {
            if let Some(key) = letter_key(document) {
                if let Some(previous) = keys.insert(key.clone(), id) {
                    tracing::debug!(
                        key = %key,
                        previous,
                        replacement = id,
                        "duplicate letter name"
                    );
                }
            }
        }
        Self { keys }
    }

    /// Look up an already normalized key
    pub fn get(&self, key: &str) -> Option<DocumentId> {
        self.keys.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.keys.keys().map(String::as_str)
    }
}
