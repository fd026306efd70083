//! Qwen chat-completions client implementation

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::timeout;

use jawi_core::{ChatMessage, Error, GenerationRequest, Generator, Result};

use crate::config::QwenConfig;

/// Client for an OpenAI-compatible `/chat/completions` endpoint serving Qwen
pub struct QwenClient {
    config: QwenConfig,
    client: Client,
    timeout: Duration,
}

#[derive(Serialize)]
pub(crate) struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

impl QwenClient {
    /// Create a new client from configuration
    pub fn new(config: QwenConfig) -> Result<Self> {
        config.validate()?;
        let timeout = config.timeout();
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Configuration(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            config,
            client,
            timeout,
        })
    }

    /// Create a new client from environment variables
    pub fn from_env() -> Result<Self> {
        let config = QwenConfig::from_env()?;
        Self::new(config)
    }

    /// Override the round-trip bound (the HTTP client keeps the configured one)
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn config(&self) -> &QwenConfig {
        &self.config
    }

    pub(crate) fn request_body<'a>(
        &'a self,
        request: &'a GenerationRequest,
    ) -> ChatCompletionRequest<'a> {
        ChatCompletionRequest {
            model: &self.config.model_id,
            messages: &request.messages,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        }
    }

    /// Perform the actual chat-completions request
    async fn perform_generation(&self, request: &GenerationRequest) -> Result<String> {
        let body = self.request_body(request);

        let response = self
            .client
            .post(&self.config.api_url)
            .bearer_auth(&self.config.api_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Delegate(format!("request failed: {e}")))?;

        let status = response.status();
        let response_text = response
            .text()
            .await
            .map_err(|e| Error::Delegate(format!("failed to read response body: {e}")))?;

        if !status.is_success() {
            return Err(Error::Delegate(format!(
                "Qwen API request failed with status {status}: {response_text}"
            )));
        }

        extract_content(&response_text)
    }
}

/// Pull the first choice's message content out of a completion body.
pub(crate) fn extract_content(body: &str) -> Result<String> {
    let parsed: ChatCompletionResponse = serde_json::from_str(body)
        .map_err(|e| Error::Delegate(format!("unexpected response shape: {e}")))?;

    let content = parsed
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| Error::Delegate("response carried no message content".to_string()))?;

    let answer = content.trim();
    if answer.is_empty() {
        return Err(Error::Delegate("empty completion from Qwen API".to_string()));
    }

    Ok(answer.to_string())
}

#[async_trait]
impl Generator for QwenClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        tracing::debug!(
            model = %self.config.model_id,
            mode = %request.mode,
            messages = request.messages.len(),
            max_tokens = request.max_tokens,
            temperature = request.temperature,
            "calling generation delegate"
        );

        match timeout(self.timeout, self.perform_generation(request)).await {
            Ok(result) => result,
            Err(_) => Err(Error::Delegate(format!(
                "request timed out after {}s",
                self.timeout.as_secs_f32()
            ))),
        }
    }

    fn model_id(&self) -> &str {
        &self.config.model_id
    }
}
