//! Qwen integration for JawiAI
//!
//! This crate provides the generation delegate: an implementation of the
//! [`Generator`] trait that talks to an OpenAI-compatible chat-completions
//! endpoint serving a Qwen model.

mod client;
mod config;


pub use client::QwenClient;
pub use config::{DEFAULT_API_URL, DEFAULT_MODEL, DEFAULT_TIMEOUT_SECS, QwenConfig};

// Re-export core types for convenience
pub use jawi_core::{Error, GenerationMode, GenerationRequest, Generator, Result};
