//! HTTP server implementation using Axum.

use axum::Router;
use axum::routing::{get, post};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use jawi_core::{Error, Result};
use jawi_rag::RetrievalOrchestrator;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 5000;

/// Shared state for every request handler.
///
/// Holds only the read-only orchestrator; nothing in here is mutated after
/// startup, so handlers share it without locking.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<RetrievalOrchestrator>,
}

impl AppState {
    pub fn new(orchestrator: Arc<RetrievalOrchestrator>) -> Self {
        Self { orchestrator }
    }
}

/// Listen address
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

/// Bind the listen address, resolving host names such as `localhost`.
pub async fn bind(config: &ServerConfig) -> Result<TcpListener> {
    TcpListener::bind((config.host.as_str(), config.port))
        .await
        .map_err(|e| {
            Error::Configuration(format!("cannot listen on {}:{}: {e}", config.host, config.port))
        })
}

/// Build the Axum router with all routes.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/chat", post(crate::routes::chat))
        .route("/chat-creative", post(crate::routes::chat_creative))
        .route("/health", get(crate::routes::health_check))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Bind and serve until Ctrl-C.
pub async fn serve(orchestrator: Arc<RetrievalOrchestrator>, config: &ServerConfig) -> Result<()> {
    let listener = bind(config).await?;
    let addr = listener.local_addr()?;
    tracing::info!(%addr, "server is ready to accept requests");

    axum::serve(listener, build_router(AppState::new(orchestrator)))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
}
