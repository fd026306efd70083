//! API route handlers

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::Instrument;
use uuid::Uuid;

use jawi_core::{ChatMessage, Query};

use crate::error::ApiError;
use crate::server::AppState;

/// Body of `POST /chat`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub history: Vec<ChatMessage>,
    /// Retrieval hint from an upstream feature, e.g. a detected letter
    #[serde(default)]
    pub context: Option<String>,
}

impl ChatRequest {
    pub fn into_query(self) -> Query {
        let mut query = Query::new(self.query.unwrap_or_default()).with_history(self.history);
        query.context_hint = self.context;
        query
    }
}

/// Body of `POST /chat-creative`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreativeRequest {
    #[serde(default)]
    pub query: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
}

/// Grounded chat with tiered retrieval.
pub async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let Json(request) = payload?;
    let query = request.into_query();

    let span = tracing::info_span!("chat", request_id = %Uuid::new_v4());
    async move {
        tracing::info!(
            query = %query.text,
            context = ?query.context_hint,
            history = query.history.len(),
            "received query"
        );

        let answer = state.orchestrator.answer(&query).await.inspect_err(|e| {
            tracing::warn!(error = %e, "chat request failed");
        })?;

        tracing::info!(tier = %answer.tier, "answered");
        Ok::<_, ApiError>(Json(ChatResponse {
            response: answer.response,
        }))
    }
    .instrument(span)
    .await
}

/// Free-form creative writing, no retrieval.
pub async fn chat_creative(
    State(state): State<AppState>,
    payload: Result<Json<CreativeRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let Json(request) = payload?;
    let text = request.query.unwrap_or_default();

    let span = tracing::info_span!("chat_creative", request_id = %Uuid::new_v4());
    async move {
        let response = state.orchestrator.create(&text).await.inspect_err(|e| {
            tracing::warn!(error = %e, "creative request failed");
        })?;
        Ok::<_, ApiError>(Json(ChatResponse { response }))
    }
    .instrument(span)
    .await
}

/// Health check endpoint.
pub async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    let orchestrator = &state.orchestrator;
    let knowledge = orchestrator.knowledge();
    Json(json!({
        "status": "ok",
        "service": "jawiai",
        "version": env!("CARGO_PKG_VERSION"),
        "documents": knowledge.len(),
        "exact_keys": knowledge.exact_match_index().len(),
        "embedder": orchestrator.embedder_name(),
        "model": orchestrator.model_id(),
        "relevance_threshold": orchestrator.relevance_threshold(),
    }))
}
