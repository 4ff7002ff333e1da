// Background relay worker (same role as the Node server.js poll loop).
// Polls the record store on a fixed timer and republishes the newest host
// record plus recent usage events to every dashboard session.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize};

use tokio::sync::{broadcast, oneshot};
use tokio::time::{Duration, Instant, interval};

use crate::store::{MemoryStore, StoredRecord};

/// Rate limit for "no receivers" logging (avoid a line every poll when no one
/// is on /ws/dashboard).
const NO_RECEIVERS_WARN_INTERVAL: Duration = Duration::from_secs(60);

/// Snapshots kept in the broadcast channel for slow sessions.
pub const PUSH_CHANNEL_CAPACITY: usize = 32;

/// One relay poll result: newest host record (if any) and up to max_events
/// usage events, newest first. Sessions treat this identically to a pulled
/// pair.
#[derive(Debug, Clone)]
pub struct PushUpdate {
    pub host: Option<StoredRecord>,
    pub events: Vec<StoredRecord>,
}

/// Store, channel, and shutdown for the relay.
pub struct RelayDeps {
    pub store: Arc<MemoryStore>,
    pub tx: broadcast::Sender<PushUpdate>,
    pub ws_connections: Arc<AtomicUsize>,
    pub updates_published_total: Arc<AtomicU64>,
    pub shutdown_rx: oneshot::Receiver<()>,
}

/// Relay timing: poll cadence, event fan-in, partition identity.
pub struct RelayWorkerConfig {
    pub interval_ms: u64,
    pub max_events: usize,
    pub host_partition_key: String,
    pub events_partition_key: String,
    /// How often to log app stats (real seconds).
    pub stats_log_interval_secs: u64,
}

pub fn spawn(deps: RelayDeps, config: RelayWorkerConfig) -> tokio::task::JoinHandle<()> {
    let RelayDeps {
        store,
        tx,
        ws_connections,
        updates_published_total,
        mut shutdown_rx,
    } = deps;
    let RelayWorkerConfig {
        interval_ms,
        max_events,
        host_partition_key,
        events_partition_key,
        stats_log_interval_secs,
    } = config;

    tokio::spawn(async move {
        let mut tick = interval(Duration::from_millis(interval_ms));
        tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        let mut stats_log_tick = interval(Duration::from_secs(stats_log_interval_secs));
        stats_log_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        let mut last_no_receivers_warn: Option<Instant> = None;

        let relay_span = tracing::span!(tracing::Level::DEBUG, "relay", interval_ms);
        let _guard = relay_span.enter();

        loop {
            tokio::select! {
                _ = tick.tick() => {
                    let host = store
                        .query(&host_partition_key, 1)
                        .await
                        .into_iter()
                        .next();
                    let events = store.query(&events_partition_key, max_events).await;
                    let update = PushUpdate { host, events };

                    if tx.send(update).is_err() {
                        let should_warn = last_no_receivers_warn
                            .is_none_or(|t| t.elapsed() >= NO_RECEIVERS_WARN_INTERVAL);
                        if should_warn {
                            tracing::debug!(
                                operation = "publish_update",
                                "No active dashboard sessions; push channel has no receivers"
                            );
                            last_no_receivers_warn = Some(Instant::now());
                        }
                    } else {
                        updates_published_total
                            .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
                    }
                }
                _ = &mut shutdown_rx => {
                    tracing::debug!("Relay shutting down");
                    break;
                }
                _ = stats_log_tick.tick() => {
                    let records_stored = store.record_count().await;
                    tracing::info!(
                        ws_dashboard_clients =
                            ws_connections.load(std::sync::atomic::Ordering::Relaxed),
                        updates_published_total = updates_published_total
                            .load(std::sync::atomic::Ordering::Relaxed),
                        records_stored,
                        "app stats"
                    );
                }
            }
        }
    })
}
