//! Core traits and types for JawiAI
//!
//! This crate defines the data model and the capability-facing interfaces
//! (embedding function, similarity index, generation delegate) that the
//! retrieval engine is written against, so the decision logic can be tested
//! with fakes substituted for every external service.

pub mod embedding;
pub mod error;
pub mod llm;
pub mod similarity;
pub mod types;


pub use embedding::Embedder;
pub use error::{Error, Result};
pub use llm::{GenerationMode, GenerationRequest, Generator};
pub use similarity::{Neighbor, SimilarityIndex};
pub use types::*;
