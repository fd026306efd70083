//! HTTP service boundary for JawiAI
//!
//! Exposes the retrieval orchestrator as `POST /chat`, `POST /chat-creative`
//! and `GET /health`. Successful calls answer `{"response": ...}`; failures
//! answer `{"error": ...}` with a 400 for missing input and a 500 otherwise.

mod error;
mod routes;
mod server;


pub use error::ApiError;
pub use routes::{ChatRequest, ChatResponse, CreativeRequest};
pub use server::{AppState, DEFAULT_HOST, DEFAULT_PORT, ServerConfig, bind, build_router, serve};
