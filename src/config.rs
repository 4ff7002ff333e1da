use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub dashboard: DashboardConfig,
    pub relay: RelayConfig,
    pub monitoring: MonitoringConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

/// Identity of the record table plus the partition keys the collectors write to.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    pub region: String,
    pub table: String,
    #[serde(default = "default_host_partition_key")]
    pub host_partition_key: String,
    #[serde(default = "default_events_partition_key")]
    pub events_partition_key: String,
}

fn default_host_partition_key() -> String {
    "vm-server-01".into()
}

fn default_events_partition_key() -> String {
    "global-app-events".into()
}

#[derive(Debug, Clone, Deserialize)]
pub struct DashboardConfig {
    /// Tick period for per-session polling (ms).
    #[serde(default = "default_refresh_interval_ms")]
    pub refresh_interval_ms: u64,
    /// Max points retained per chart channel; oldest evicted first.
    #[serde(default = "default_max_data_points")]
    pub max_data_points: usize,
    /// Bypass the record store entirely and synthesize data locally.
    #[serde(default)]
    pub demo_mode: bool,
}

fn default_refresh_interval_ms() -> u64 {
    5000
}

fn default_max_data_points() -> usize {
    20
}

#[derive(Debug, Clone, Deserialize)]
pub struct RelayConfig {
    /// When enabled, a background worker polls the store and pushes updates
    /// to every session instead of each session polling on its own.
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_relay_interval_ms")]
    pub interval_ms: u64,
    /// Usage-event records fetched per poll (newest first).
    #[serde(default = "default_max_events")]
    pub max_events: usize,
}

fn default_relay_interval_ms() -> u64 {
    2000
}

fn default_max_events() -> usize {
    10
}

#[derive(Debug, Clone, Deserialize)]
pub struct MonitoringConfig {
    /// How often to log app stats (ws clients, updates published) at INFO level.
    pub stats_log_interval_secs: u64,
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".into());
        let s = std::fs::read_to_string(&path)?;
        Self::load_from_str(&s)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.server.port > 0,
            "server.port must be between 1 and 65535, got {}",
            self.server.port
        );
        anyhow::ensure!(!self.store.table.is_empty(), "store.table must be non-empty");
        anyhow::ensure!(
            !self.store.host_partition_key.is_empty(),
            "store.host_partition_key must be non-empty"
        );
        anyhow::ensure!(
            !self.store.events_partition_key.is_empty(),
            "store.events_partition_key must be non-empty"
        );
        anyhow::ensure!(
            self.dashboard.refresh_interval_ms > 0,
            "dashboard.refresh_interval_ms must be > 0, got {}",
            self.dashboard.refresh_interval_ms
        );
        anyhow::ensure!(
            self.dashboard.max_data_points > 0,
            "dashboard.max_data_points must be > 0, got {}",
            self.dashboard.max_data_points
        );
        anyhow::ensure!(
            self.relay.interval_ms > 0,
            "relay.interval_ms must be > 0, got {}",
            self.relay.interval_ms
        );
        anyhow::ensure!(
            self.relay.max_events > 0,
            "relay.max_events must be > 0, got {}",
            self.relay.max_events
        );
        anyhow::ensure!(
            self.monitoring.stats_log_interval_secs > 0,
            "monitoring.stats_log_interval_secs must be > 0, got {}",
            self.monitoring.stats_log_interval_secs
        );
        Ok(())
    }
}
