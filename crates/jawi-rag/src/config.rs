//! Retrieval configuration

use jawi_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

use crate::embedder::HashEmbedder;
use crate::retrieval::DEFAULT_RELEVANCE_THRESHOLD;

pub const DEFAULT_KNOWLEDGE_PATH: &str = "jawi_knowledge.json";
pub const DEFAULT_DOCUMENTS_PATH: &str = "documents.json";
pub const DEFAULT_INDEX_PATH: &str = "jawi_index.json";
pub const DEFAULT_EMBEDDING_URL: &str = "https://api.openai.com/v1/embeddings";
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";

/// Which embedding function to use at compile and query time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EmbedderConfig {
    Hash {
        dimensions: usize,
    },
    OpenAi {
        api_url: String,
        model: String,
        #[serde(skip_serializing)]
        api_key: Option<String>,
        dimensions: usize,
    },
}

impl Default for EmbedderConfig {
    fn default() -> Self {
        EmbedderConfig::Hash {
            dimensions: HashEmbedder::DEFAULT_DIMENSIONS,
        }
    }
}

/// Paths of the knowledge source and compiled artifacts, plus retrieval tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RagConfig {
    pub knowledge_path: PathBuf,
    pub documents_path: PathBuf,
    pub index_path: PathBuf,
    /// Maximum squared L2 distance accepted as a semantic match. Tied to the
    /// embedder in use; re-tune it whenever the embedder changes.
    pub relevance_threshold: f32,
    pub embedder: EmbedderConfig,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            knowledge_path: PathBuf::from(DEFAULT_KNOWLEDGE_PATH),
            documents_path: PathBuf::from(DEFAULT_DOCUMENTS_PATH),
            index_path: PathBuf::from(DEFAULT_INDEX_PATH),
            relevance_threshold: DEFAULT_RELEVANCE_THRESHOLD,
            embedder: EmbedderConfig::default(),
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Result<Option<T>> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| Error::Configuration(format!("{name} has an invalid value: {raw}"))),
        Err(_) => Ok(None),
    }
}

impl RagConfig {
    /// Create configuration from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        let defaults = Self::default();

        let knowledge_path = env::var("JAWI_KNOWLEDGE_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.knowledge_path);
        let documents_path = env::var("JAWI_DOCUMENTS_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.documents_path);
        let index_path = env::var("JAWI_INDEX_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.index_path);
        let relevance_threshold =
            parse_var::<f32>("JAWI_RELEVANCE_THRESHOLD")?.unwrap_or(defaults.relevance_threshold);

        let dimensions = parse_var::<usize>("JAWI_EMBEDDING_DIMENSIONS")?;
        let embedder = match env::var("JAWI_EMBEDDER").as_deref() {
            Ok("hash") | Err(_) => EmbedderConfig::Hash {
                dimensions: dimensions.unwrap_or(HashEmbedder::DEFAULT_DIMENSIONS),
            },
            Ok("openai") => EmbedderConfig::OpenAi {
                api_url: env::var("JAWI_EMBEDDING_URL")
                    .unwrap_or_else(|_| DEFAULT_EMBEDDING_URL.to_string()),
                model: env::var("JAWI_EMBEDDING_MODEL")
                    .unwrap_or_else(|_| DEFAULT_EMBEDDING_MODEL.to_string()),
                api_key: env::var("JAWI_EMBEDDING_API_KEY")
                    .or_else(|_| env::var("OPENAI_API_KEY"))
                    .ok(),
                dimensions: dimensions.unwrap_or(1536),
            },
            Ok(other) => {
                return Err(Error::Configuration(format!(
                    "JAWI_EMBEDDER must be 'hash' or 'openai', got '{other}'"
                )));
            }
        };

        let config = Self {
            knowledge_path,
            documents_path,
            index_path,
            relevance_threshold,
            embedder,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.relevance_threshold.is_finite() || self.relevance_threshold < 0.0 {
            return Err(Error::Configuration(format!(
                "relevance threshold must be a non-negative number, got {}",
                self.relevance_threshold
            )));
        }

        let dimensions = match &self.embedder {
            EmbedderConfig::Hash { dimensions } => *dimensions,
            EmbedderConfig::OpenAi {
                api_url,
                dimensions,
                ..
            } => {
                url::Url::parse(api_url).map_err(|e| {
                    Error::Configuration(format!("invalid embedding URL '{api_url}': {e}"))
                })?;
                *dimensions
            }
        };
        if dimensions == 0 {
            return Err(Error::Configuration(
                "embedding dimensions must be positive".to_string(),
            ));
        }

        Ok(())
    }
}
