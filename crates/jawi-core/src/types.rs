//! Data model shared by the compiler, the orchestrator and the service layer

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use crate::{Error, Result};

/// One entry of the editable knowledge source.
///
/// The source file tags every entry with a `type` field. Entries whose tag is
/// not one of the variants below fail to deserialize and are dropped by the
/// compiler with a warning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum KnowledgeRecord {
    #[serde(rename = "general_topic")]
    Topic(TopicRecord),
    #[serde(rename = "letter")]
    Letter(LetterRecord),
}

/// General explanation about the script.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicRecord {
    #[serde(default, deserialize_with = "lenient_text")]
    pub topic: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub content: String,
}

/// Details of a single letter of the script.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LetterRecord {
    #[serde(default, deserialize_with = "lenient_text")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_optional_text")]
    pub character: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub info: String,
    #[serde(default, alias = "latinExample", deserialize_with = "lenient_optional_text")]
    pub latin_example: Option<String>,
    #[serde(default, alias = "jawiExample", deserialize_with = "lenient_optional_text")]
    pub jawi_example: Option<String>,
}

/// Text of a scalar field: `null` is absent, numbers and booleans render as written.
fn scalar_text(value: serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::String(text) => Some(text),
        other => Some(other.to_string()),
    }
}

fn lenient_text<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(scalar_text(serde_json::Value::deserialize(deserializer)?).unwrap_or_default())
}

fn lenient_optional_text<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(scalar_text(serde_json::Value::deserialize(deserializer)?))
}

impl KnowledgeRecord {
    /// Discriminant as it appears in the source file
    pub fn kind(&self) -> &'static str {
        match self {
            KnowledgeRecord::Topic(_) => "general_topic",
            KnowledgeRecord::Letter(_) => "letter",
        }
    }
}

/// Position of a document in the compiled sequence. Also the similarity index id.
pub type DocumentId = usize;

/// Canonical text flattened from exactly one knowledge record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document(String);

impl Document {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for Document {
    fn from(text: String) -> Self {
        Self(text)
    }
}

/// A single conversation turn, forwarded verbatim to the generation service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new("system", content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new("user", content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new("assistant", content)
    }
}

/// A question from the user, plus an optional retrieval hint and prior turns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    pub text: String,
    pub context_hint: Option<String>,
    pub history: Vec<ChatMessage>,
}

impl Query {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn with_context_hint(mut self, hint: impl Into<String>) -> Self {
        self.context_hint = Some(hint.into());
        self
    }

    pub fn with_history(mut self, history: Vec<ChatMessage>) -> Self {
        self.history = history;
        self
    }

    /// Reject queries that would normalize to nothing.
    pub fn validate(&self) -> Result<()> {
        if self.text.trim().is_empty() {
            return Err(Error::Validation("Query not found".to_string()));
        }
        Ok(())
    }

    /// The string used for retrieval: a non-blank hint wins over the raw text.
    pub fn search_term(&self) -> &str {
        match self.context_hint.as_deref() {
            Some(hint) if !hint.trim().is_empty() => hint,
            _ => &self.text,
        }
    }
}

/// Lower-case and trim, the only folding applied before exact lookup.
pub fn normalize_key(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Which of the three retrieval tiers produced an outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetrievalTier {
    Exact,
    Semantic,
    None,
}

impl fmt::Display for RetrievalTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RetrievalTier::Exact => "exact",
            RetrievalTier::Semantic => "semantic",
            RetrievalTier::None => "none",
        };
        f.write_str(label)
    }
}

/// Result of tier selection for one query. Consumed by prompt assembly.
#[derive(Debug, Clone, PartialEq)]
pub enum RetrievalOutcome {
    ExactMatch(Document),
    SemanticMatch { document: Document, distance: f32 },
    NoMatch,
}

impl RetrievalOutcome {
    /// The grounding document, if any tier found one
    pub fn document(&self) -> Option<&Document> {
        match self {
            RetrievalOutcome::ExactMatch(document)
            | RetrievalOutcome::SemanticMatch { document, .. } => Some(document),
            RetrievalOutcome::NoMatch => None,
        }
    }

    pub fn tier(&self) -> RetrievalTier {
        match self {
            RetrievalOutcome::ExactMatch(_) => RetrievalTier::Exact,
            RetrievalOutcome::SemanticMatch { .. } => RetrievalTier::Semantic,
            RetrievalOutcome::NoMatch => RetrievalTier::None,
        }
    }
}
