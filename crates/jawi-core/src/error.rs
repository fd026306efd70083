//! Error types for JawiAI

use thiserror::Error;

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for the JawiAI system
#[derive(Error, Debug)]
pub enum Error {
    /// Missing or empty required input. Never reaches retrieval or generation.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Compiled artifacts missing, unreadable or not paired with each other.
    #[error("Startup integrity error: {0}")]
    StartupIntegrity(String),

    /// Anything that went wrong during the generation round trip, timeouts included.
    #[error("Generation delegate error: {0}")]
    Delegate(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Similarity index error: {0}")]
    Index(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether the caller is at fault (reported as a 4xx rather than a 5xx).
    pub fn is_client_error(&self) -> bool {
        matches!(self, Error::Validation(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}
