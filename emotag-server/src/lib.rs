//! emotag-server library - batch sentence emotion tagging service
//!
//! Accepts batches of raw sentences over HTTP, tags each with an emotion
//! label, and caches results in the shared database so no two invocations
//! ever recompute the same normalized sentence.

use axum::routing::{get, post};
use axum::Router;
use emotag_common::db::SentenceCache;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod artifact;
pub mod engine;
pub mod init;
pub mod pipeline;

use init::EngineInitializer;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Shared sentence result cache
    pub cache: SentenceCache,
    /// Lazily built emotion engine, shared for the process lifetime
    pub engine: EngineInitializer,
}

impl AppState {
    pub fn new(cache: SentenceCache, engine: EngineInitializer) -> Self {
        Self { cache, engine }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(api::health_check))
        .route("/api/tag", post(api::tag_sentences))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
