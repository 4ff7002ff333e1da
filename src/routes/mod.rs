// HTTP + WebSocket routes

mod http;
mod ws;

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use tokio::sync::broadcast;
use tower_http::cors::{Any, CorsLayer};

use crate::config::AppConfig;
use crate::relay::PushUpdate;
use crate::store::MemoryStore;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) store: Arc<MemoryStore>,
    pub(crate) push_tx: broadcast::Sender<PushUpdate>,
    pub(crate) ws_connections: Arc<AtomicUsize>,
    pub(crate) config: AppConfig,
}

pub fn app(
    store: Arc<MemoryStore>,
    push_tx: broadcast::Sender<PushUpdate>,
    ws_connections: Arc<AtomicUsize>,
    config: AppConfig,
) -> Router {
    let state = AppState {
        store,
        push_tx,
        ws_connections,
        config,
    };
    Router::new()
        .route("/", get(|| async { "Pulsedash: real-time analytics dashboard" })) // GET /
        .route("/version", get(http::version_handler)) // GET /version
        .route("/api/latest", get(http::latest_handler)) // GET /api/latest
        .route("/api/ingest", post(http::ingest_handler)) // POST /api/ingest
        .route("/ws/dashboard", get(ws::ws_dashboard)) // WS /ws/dashboard
        .layer(CorsLayer::new().allow_origin(Any))
        .with_state(state)
}
