//! Generation delegate trait and request types

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{ChatMessage, Result};

/// Which instruction set a request was assembled under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationMode {
    /// Answer constrained to a retrieved document.
    Grounded,
    /// No document found; stay inside the domain and ask for clarification.
    GuardedFallback,
    /// Free-form writing, no retrieval at all.
    Creative,
}

impl fmt::Display for GenerationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            GenerationMode::Grounded => "grounded",
            GenerationMode::GuardedFallback => "guarded_fallback",
            GenerationMode::Creative => "creative",
        };
        f.write_str(label)
    }
}

/// Instruction payload handed to a [`Generator`].
///
/// The model identifier is not part of the payload; the delegate adds its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub mode: GenerationMode,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl GenerationRequest {
    /// Content of the last turn, i.e. the one the model answers
    pub fn final_turn(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }
}

/// Trait for text-generation services.
///
/// One call is one synchronous round trip. Implementations must bound the call
/// with a timeout and collapse every failure (transport, status, response
/// shape, timeout) into [`Error::Delegate`](crate::Error::Delegate). Callers
/// never retry.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Send the payload and return the generated text
    async fn generate(&self, request: &GenerationRequest) -> Result<String>;

    /// Get the model ID being used
    fn model_id(&self) -> &str;
}
