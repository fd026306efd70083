//! Embedding function implementations

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use jawi_core::{Embedder, Error, Result};

use crate::config::EmbedderConfig;

/// Deterministic offline embedder using feature hashing.
///
/// Words and adjacent word pairs are hashed into a fixed number of buckets,
/// earlier words weigh more, and the result is L2-normalised. No model files
/// or network access are needed, and the same text always yields the same
/// vector, so compiled indexes are reproducible bit for bit.
#[derive(Debug, Clone)]
pub struct HashEmbedder {
    dimensions: usize,
    name: String,
}

impl HashEmbedder {
    pub const DEFAULT_DIMENSIONS: usize = 384;

    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
            name: format!("feature-hash-v1-{dimensions}"),
        }
    }

    fn bucket_hash(token: &str) -> u64 {
        let digest = md5::compute(token.as_bytes());
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&digest.0[..8]);
        u64::from_le_bytes(bytes)
    }

    fn generate(&self, text: &str) -> Vec<f32> {
        let normalized_text = text.to_lowercase();
        let words: Vec<&str> = normalized_text.split_whitespace().collect();
        let dims = self.dimensions as u64;

        let mut embedding = vec![0.0f32; self.dimensions];

        for (pos, word) in words.iter().enumerate() {
            let hash = Self::bucket_hash(word);

            let idx1 = (hash % dims) as usize;
            let idx2 = ((hash >> 16) % dims) as usize;
            let idx3 = ((hash >> 32) % dims) as usize;

            let position_weight = 1.0 / (pos as f32 + 1.0);

            embedding[idx1] += position_weight;
            embedding[idx2] += position_weight * 0.7;
            embedding[idx3] += position_weight * 0.5;
        }

        for pair in words.windows(2) {
            let bigram = format!("{} {}", pair[0], pair[1]);
            let idx = (Self::bucket_hash(&bigram) % dims) as usize;
            embedding[idx] += 0.8;
        }

        let magnitude: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if magnitude > 0.0 {
            for val in embedding.iter_mut() {
                *val /= magnitude;
            }
        }

        embedding
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(Self::DEFAULT_DIMENSIONS)
    }
}

#[async_trait]
impl Embedder for HashEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.generate(text))
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Embedder backed by an OpenAI-compatible `/embeddings` endpoint
pub struct OpenAiEmbedder {
    client: reqwest::Client,
    api_url: String,
    api_key: Option<String>,
    model: String,
    dimensions: usize,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [&'a str],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    #[serde(default)]
    index: Option<usize>,
}

impl OpenAiEmbedder {
    pub fn new(
        api_url: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<String>,
        dimensions: usize,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| Error::Configuration(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_url: api_url.into(),
            api_key: api_key.filter(|key| !key.is_empty()),
            model: model.into(),
            dimensions,
        })
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_batch(&[text])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::Embedding("embedding API returned no vectors".to_string()))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        tracing::debug!(model = %self.model, batch_size = texts.len(), "embedding batch");

        let body = EmbeddingRequest {
            model: &self.model,
            input: texts,
        };

        let mut request = self.client.post(&self.api_url).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::Embedding(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(Error::Embedding(format!(
                "embedding API returned {status}: {detail}"
            )));
        }

        let parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| Error::Embedding(format!("failed to parse response: {e}")))?;

        let mut data = parsed.data;
        if data.len() != texts.len() {
            return Err(Error::Embedding(format!(
                "asked for {} embeddings, got {}",
                texts.len(),
                data.len()
            )));
        }
        data.sort_by_key(|d| d.index.unwrap_or(usize::MAX));

        data.into_iter()
            .map(|d| {
                if d.embedding.len() == self.dimensions {
                    Ok(d.embedding)
                } else {
                    Err(Error::Embedding(format!(
                        "model {} returned {} dimensions, expected {}",
                        self.model,
                        d.embedding.len(),
                        self.dimensions
                    )))
                }
            })
            .collect()
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        &self.model
    }
}

/// Instantiate the embedder described by configuration
pub fn build_embedder(config: &EmbedderConfig) -> Result<Arc<dyn Embedder>> {
    match config {
        EmbedderConfig::Hash { dimensions } => Ok(Arc::new(HashEmbedder::new(*dimensions))),
        EmbedderConfig::OpenAi {
            api_url,
            model,
            api_key,
            dimensions,
        } => Ok(Arc::new(OpenAiEmbedder::new(
            api_url.clone(),
            model.clone(),
            api_key.clone(),
            *dimensions,
        )?)),
    }
}
