//! Axum-based HTTP gateway.
//!
//! Two routes: a health probe and the analyze endpoint. Requests carry
//! base64-encoded photos, so the body limit is generous; the request timeout
//! brackets the provider call, which dominates latency. Any core failure is
//! answered with the canned fallback response instead of an error state —
//! that product decision lives here, not in the pipeline.

mod handlers;

use crate::config::Config;
use crate::core::Pipeline;
use crate::provider::GeminiClient;
use anyhow::Result;
use axum::{
    Router,
    routing::{get, post},
};
use handlers::{handle_analyze, handle_health};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;

/// Maximum request body size (50MB) — two base64 photos plus JSON framing.
pub const MAX_BODY_SIZE: usize = 50 * 1024 * 1024;
/// Request timeout — brackets the upstream model call.
pub const REQUEST_TIMEOUT_SECS: u64 = 120;

/// Shared state for all axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub provider: Arc<GeminiClient>,
    pub pipeline: Arc<Pipeline>,
}

/// Build the router. Split from [`run_gateway`] so tests can drive the
/// HTTP surface against a mocked provider.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handle_health))
        .route("/api/face/analyze", post(handle_analyze))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_SIZE))
        .layer(TimeoutLayer::new(Duration::from_secs(REQUEST_TIMEOUT_SECS)))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Run the HTTP gateway until the process is stopped.
pub async fn run_gateway(config: Config) -> Result<()> {
    let provider = Arc::new(GeminiClient::new(
        config.provider.api_key.as_deref(),
        config.provider.model.clone(),
    ));
    if !provider.has_api_key() {
        tracing::warn!(
            "no Gemini API key configured — every analysis will serve the canned fallback"
        );
    }

    let state = AppState {
        provider,
        pipeline: Arc::new(Pipeline::new(config.calibration)),
    };

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "facegauge gateway listening");

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutdown signal received");
        })
        .await?;
    Ok(())
}
