// GET/POST handlers: version, latest records, ingest

use axum::{Json, extract::State, response::IntoResponse};

use super::AppState;
use crate::forwarder::{self, IngestEnvelope};
use crate::version::{NAME, VERSION};

/// GET /version — returns service name and version (from Cargo.toml at build time).
pub(super) async fn version_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "name": NAME,
        "version": VERSION,
    }))
}

/// GET /api/latest — newest host record plus recent usage events, one-shot.
pub(super) async fn latest_handler(State(state): State<AppState>) -> impl IntoResponse {
    let host = state
        .store
        .query(&state.config.store.host_partition_key, 1)
        .await
        .into_iter()
        .next();
    let events = state
        .store
        .query(
            &state.config.store.events_partition_key,
            state.config.relay.max_events,
        )
        .await;
    Json(serde_json::json!({ "host": host, "events": events }))
}

/// POST /api/ingest — decode a record envelope and upsert into the store.
pub(super) async fn ingest_handler(
    State(state): State<AppState>,
    Json(envelope): Json<IngestEnvelope>,
) -> impl IntoResponse {
    let summary = forwarder::process(&state.store, envelope).await;
    Json(summary)
}
