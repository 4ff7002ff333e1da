// WebSocket dashboard sessions

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use bytes::Bytes;
use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use tokio::sync::broadcast;
use tokio::time::{Duration, timeout};

use super::AppState;
use crate::config::AppConfig;
use crate::engine::DashboardEngine;
use crate::models::SnapshotPair;
use crate::relay::PushUpdate;
use crate::source::{self, DataSource, IngestError};
use crate::store::MemoryStore;

pub(super) const WS_PING_INTERVAL: Duration = Duration::from_secs(30);
pub(super) const WS_SEND_TIMEOUT: Duration = Duration::from_secs(10);

/// Decrements dashboard connection count on drop (connect = +1, drop = -1).
struct WsDashboardGuard(Arc<AtomicUsize>);

impl Drop for WsDashboardGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, std::sync::atomic::Ordering::Relaxed);
    }
}

pub(super) async fn ws_dashboard(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let store = state.store.clone();
    let push_tx = state.push_tx.clone();
    let conn_count = state.ws_connections.clone();
    let config = state.config.clone();
    ws.on_upgrade(move |socket| async move {
        conn_count.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        let _guard = WsDashboardGuard(conn_count);
        if let Err(e) = stream_dashboard(socket, store, push_tx, config).await {
            tracing::info!("Dashboard stream error: {}", e);
        }
    })
}

/// One dashboard session. Engine and source live here and die with the
/// socket; the session timer stops when the client disconnects.
async fn stream_dashboard(
    socket: WebSocket,
    store: Arc<MemoryStore>,
    push_tx: broadcast::Sender<PushUpdate>,
    config: AppConfig,
) -> anyhow::Result<()> {
    tracing::info!("Client connected to dashboard stream");
    let demo = config.dashboard.demo_mode;
    let mut engine = DashboardEngine::new(config.dashboard.max_data_points, demo);
    let mut data_source = if demo {
        DataSource::demo()
    } else {
        DataSource::live(store)
    };

    if !demo && config.relay.enabled {
        stream_relay(socket, &mut engine, &mut data_source, push_tx).await
    } else {
        stream_poll(
            socket,
            &mut engine,
            &mut data_source,
            config.dashboard.refresh_interval_ms,
        )
        .await
    }
}

/// Poll mode: a per-session timer pulls one pair per tick. The fetch is
/// awaited inline in the select arm, so a slow source delays the next tick
/// (and Skip drops the missed ones) instead of overlapping updates.
async fn stream_poll(
    mut socket: WebSocket,
    engine: &mut DashboardEngine,
    data_source: &mut DataSource,
    refresh_interval_ms: u64,
) -> anyhow::Result<()> {
    let mut tick = tokio::time::interval(Duration::from_millis(refresh_interval_ms));
    tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    let mut ping_interval = tokio::time::interval(WS_PING_INTERVAL);
    ping_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    loop {
        tokio::select! {
            _ = tick.tick() => {
                let outcome = data_source.fetch_pair().await;
                if !publish_tick(engine, outcome, &mut socket).await? {
                    break;
                }
            }
            msg = socket.recv() => {
                match handle_client_message(msg) {
                    ClientAction::Refresh => {
                        // Manual trigger: identical routine to the timer path.
                        let outcome = data_source.fetch_pair().await;
                        if !publish_tick(engine, outcome, &mut socket).await? {
                            break;
                        }
                    }
                    ClientAction::Ignore => {}
                    ClientAction::Disconnect => break,
                }
            }
            _ = ping_interval.tick() => {
                let r = timeout(WS_SEND_TIMEOUT, socket.send(Message::Ping(Bytes::new()))).await;
                if r.is_err() || r.unwrap_or(Ok(())).is_err() {
                    break;
                }
            }
        }
    }
    Ok(())
}

/// Relay mode: updates arrive on the push channel; each one is treated
/// identically to a pulled pair. Manual refresh still pulls from the store.
async fn stream_relay(
    mut socket: WebSocket,
    engine: &mut DashboardEngine,
    data_source: &mut DataSource,
    push_tx: broadcast::Sender<PushUpdate>,
) -> anyhow::Result<()> {
    let mut rx = push_tx.subscribe();
    let mut ping_interval = tokio::time::interval(WS_PING_INTERVAL);
    ping_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    loop {
        tokio::select! {
            result = rx.recv() => {
                match result {
                    Ok(update) => {
                        let outcome = source::pair_from_push(&update);
                        if !publish_tick(engine, outcome, &mut socket).await? {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!("Dashboard session lagged, skipped {} updates", n);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            msg = socket.recv() => {
                match handle_client_message(msg) {
                    ClientAction::Refresh => {
                        let outcome = data_source.fetch_pair().await;
                        if !publish_tick(engine, outcome, &mut socket).await? {
                            break;
                        }
                    }
                    ClientAction::Ignore => {}
                    ClientAction::Disconnect => break,
                }
            }
            _ = ping_interval.tick() => {
                let r = timeout(WS_SEND_TIMEOUT, socket.send(Message::Ping(Bytes::new()))).await;
                if r.is_err() || r.unwrap_or(Ok(())).is_err() {
                    break;
                }
            }
        }
    }
    Ok(())
}

enum ClientAction {
    Refresh,
    Ignore,
    Disconnect,
}

fn handle_client_message(msg: Option<Result<Message, axum::Error>>) -> ClientAction {
    match msg {
        Some(Ok(Message::Text(text))) if text.as_str() == "refresh" => ClientAction::Refresh,
        Some(Ok(Message::Close(_))) | Some(Err(_)) | None => ClientAction::Disconnect,
        Some(Ok(_)) => ClientAction::Ignore,
    }
}

/// Apply one tick outcome and send the resulting view model, if any.
/// Returns false when the socket is gone. Every ingestion failure is absorbed
/// here; nothing propagates to the scheduling loop as an error.
async fn publish_tick(
    engine: &mut DashboardEngine,
    outcome: Result<SnapshotPair, IngestError>,
    socket: &mut WebSocket,
) -> anyhow::Result<bool> {
    let view = match outcome {
        Ok(pair) => Some(engine.apply_pair(&pair)),
        // Half a pair: drop the tick entirely, keep the last view on screen.
        Err(IngestError::IncompletePair) => None,
        Err(e) => {
            tracing::warn!(error = %e, operation = "fetch_pair", "ingestion failed");
            engine.record_failure();
            Some(engine.current_view())
        }
    };
    if let Some(view) = view {
        let json = serde_json::to_string(&view)?;
        let r = timeout(WS_SEND_TIMEOUT, socket.send(Message::Text(json.into()))).await;
        if r.is_err() || r.unwrap_or(Ok(())).is_err() {
            return Ok(false);
        }
    }
    Ok(true)
}
