use anyhow::Result;
use pulsedash::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize};
use tokio::sync::broadcast;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(filter)
        .init();

    let app_config = config::AppConfig::load()?;
    tracing::info!(
        region = %app_config.store.region,
        table = %app_config.store.table,
        demo_mode = app_config.dashboard.demo_mode,
        relay = app_config.relay.enabled,
        "Starting dashboard server"
    );

    let store = Arc::new(store::MemoryStore::new(app_config.store.table.clone()));
    let (push_tx, _) = broadcast::channel::<relay::PushUpdate>(relay::PUSH_CHANNEL_CAPACITY);
    let ws_connections = Arc::new(AtomicUsize::new(0));
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();

    // The relay only makes sense against the real store; demo sessions
    // synthesize their own data.
    let relay_handle = if app_config.relay.enabled && !app_config.dashboard.demo_mode {
        Some(relay::spawn(
            relay::RelayDeps {
                store: store.clone(),
                tx: push_tx.clone(),
                ws_connections: ws_connections.clone(),
                updates_published_total: Arc::new(AtomicU64::new(0)),
                shutdown_rx,
            },
            relay::RelayWorkerConfig {
                interval_ms: app_config.relay.interval_ms,
                max_events: app_config.relay.max_events,
                host_partition_key: app_config.store.host_partition_key.clone(),
                events_partition_key: app_config.store.events_partition_key.clone(),
                stats_log_interval_secs: app_config.monitoring.stats_log_interval_secs,
            },
        ))
    } else {
        None
    };

    let app = routes::app(store, push_tx, ws_connections, app_config.clone());
    let addr = format!("{}:{}", app_config.server.host, app_config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on http://{}", addr);

    tokio::select! {
        result = axum::serve(listener, app) => {
            result?;
        }
        _ = shutdown_signal() => {
            tracing::info!("Received shutdown signal");
            let _ = shutdown_tx.send(());
            if let Some(handle) = relay_handle {
                let _ = handle.await;
            }
        }
    }

    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        let mut sigterm = match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(s) => s,
            Err(_) => {
                let _ = tokio::signal::ctrl_c().await;
                return;
            }
        };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
