//! HTTP surface
//!
//! An axum router over shared [`AppState`]. CORS is wide open since the
//! service sits behind the web backend that calls it.

pub mod error;
pub mod handlers;
pub mod types;

use anyhow::Context;
use axum::routing::{delete, get, post};
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use crate::config::{Config, RetrievalConfig};
use crate::errors::Result;
use crate::models::ModelRegistry;
use crate::rag::{MaterialStore, TextChunker};
use crate::telemetry::{ServiceEvent, StatsCollector};

pub use error::ApiError;

/// Everything a handler can reach
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<ModelRegistry>,
    /// Materials ingested from raw text (`/ingest`)
    pub materials: Arc<MaterialStore>,
    /// Lectures ingested from caller chunks (`/embed`)
    pub lectures: Arc<MaterialStore>,
    pub retrieval: RetrievalConfig,
    pub stats: StatsCollector,
}

impl AppState {
    pub fn new(config: &Config, registry: Arc<ModelRegistry>) -> Result<Self> {
        let chunker = TextChunker::new(config.chunking)?;
        Ok(Self {
            registry,
            materials: Arc::new(MaterialStore::new(chunker.clone())),
            lectures: Arc::new(MaterialStore::new(chunker)),
            retrieval: config.retrieval.clone(),
            stats: StatsCollector::new(),
        })
    }

    /// Count and log a failed request, passing the error through
    pub(crate) fn failed(&self, err: ApiError) -> ApiError {
        self.stats.record(ServiceEvent::RequestFailed);
        warn!(status = %err.status, "request failed: {}", err.detail);
        err
    }
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health))
        .route("/process-material", post(handlers::process_material))
        .route("/ingest", post(handlers::ingest))
        .route("/chat", post(handlers::chat))
        .route("/generate-quiz", post(handlers::generate_quiz))
        .route("/embed", post(handlers::embed))
        .route("/study-buddy", post(handlers::study_buddy))
        .route("/lecture/{lecture_id}", delete(handlers::delete_lecture))
        .layer(cors)
        .with_state(state)
}

/// Bind `bind` and serve until the process is stopped
pub async fn serve(bind: &str, state: AppState) -> anyhow::Result<()> {
    let addr: SocketAddr = bind
        .parse()
        .with_context(|| format!("invalid bind address {}", bind))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    info!("PrepEase AI service listening on http://{}", addr);
    axum::serve(listener, router(state))
        .await
        .context("server shutdown")?;
    Ok(())
}
