//! Axum-based HTTP surface.
//!
//! Thin by design: every route delegates to the orchestrator, the report
//! assembler, or the asset store. Body limits and request timeouts are
//! applied router-wide; the body limit is sized for report images arriving
//! as base64 data URLs.

mod handlers;

use crate::config::Config;
use crate::llm::{OpenAiProvider, Provider};
use crate::report::CodeFormat;
use crate::session::Orchestrator;
use crate::storage::{AssetStore, HttpAssetStore, MemoryAssetStore};
use anyhow::Result;
use axum::{
    Router,
    routing::{get, post},
};
use handlers::{handle_chat, handle_health, handle_report, handle_storage_get, handle_storage_put};
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;

/// Maximum request body size (8 MB): a captured report PNG as a base64 data
/// URL comfortably fits, anything larger is rejected.
pub const MAX_BODY_SIZE: usize = 8 * 1024 * 1024;
/// Request timeout; must cover one upstream chat-completions round trip.
pub const REQUEST_TIMEOUT_SECS: u64 = 120;

/// Shared state for all axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
}

/// `POST /chat` request body.
#[derive(Deserialize)]
pub struct ChatBody {
    pub messages: Vec<crate::session::ConversationMessage>,
    #[serde(default)]
    pub report_image_url: Option<String>,
    /// Code already bound to this conversation, if any; carried into the
    /// background report regeneration.
    #[serde(default)]
    pub code: Option<String>,
}

/// `POST /report` request body.
#[derive(Deserialize)]
pub struct ReportBody {
    pub history: crate::session::ConversationHistory,
}

/// `POST /storage` request body.
#[derive(Deserialize)]
pub struct StorageBody {
    pub data_url: String,
    pub code: String,
}

/// `GET /storage` query parameters.
#[derive(Deserialize)]
pub struct StorageQuery {
    pub code: Option<String>,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handle_health))
        .route("/chat", post(handle_chat))
        .route("/report", post(handle_report))
        .route("/storage", post(handle_storage_put).get(handle_storage_get))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_SIZE))
        .layer(TimeoutLayer::new(Duration::from_secs(REQUEST_TIMEOUT_SECS)))
        .with_state(state)
}

/// Wire up provider, store, and orchestrator from config.
pub fn build_state(config: &Config) -> AppState {
    let provider: Arc<dyn Provider> = Arc::new(OpenAiProvider::new(
        config.provider.api_url.clone(),
        config.provider.api_key.as_deref(),
    ));
    let format = CodeFormat::new(&config.report.code_prefix);
    let store: Arc<dyn AssetStore> = match &config.storage.base_url {
        Some(base_url) => Arc::new(HttpAssetStore::new(base_url.clone(), &config.storage, format)),
        None => {
            tracing::warn!("no storage.base_url configured, using in-memory asset store");
            Arc::new(MemoryAssetStore::new(format))
        }
    };
    AppState {
        orchestrator: Arc::new(Orchestrator::new(provider, store, config)),
    }
}

/// Run the HTTP gateway on `host:port`.
pub async fn run_gateway(host: &str, port: u16, config: Config) -> Result<()> {
    let addr: SocketAddr = format!("{host}:{port}").parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    run_gateway_with_listener(listener, config).await
}

/// Run the HTTP gateway from a pre-bound listener.
pub async fn run_gateway_with_listener(
    listener: tokio::net::TcpListener,
    config: Config,
) -> Result<()> {
    serve_with_state(listener, build_state(&config)).await
}

/// Serve an explicit state; integration tests inject scripted providers and
/// in-memory stores through this entry point.
pub async fn serve_with_state(listener: tokio::net::TcpListener, state: AppState) -> Result<()> {
    let display_addr = listener.local_addr()?;
    tracing::info!(%display_addr, "gateway listening");
    axum::serve(listener, build_router(state)).await?;
    Ok(())
}
