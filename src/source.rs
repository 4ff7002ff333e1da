// Data sources feeding the dashboard: record normalization, the synthetic
// demo generator, and the store-backed live source.

use std::collections::BTreeMap;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::models::{
    HostMetrics, MetricPayload, MetricSnapshot, RecordKind, SnapshotPair, UsageMetrics,
};
use crate::relay::PushUpdate;
use crate::store::{RecordReader, StoredRecord};

/// Ingestion failure taxonomy. None of these are fatal to a session; the
/// orchestrator converts them to health-state transitions.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("data source unavailable: {0}")]
    SourceUnavailable(String),
    #[error("unrecognized record kind: {0}")]
    UnrecognizedKind(String),
    #[error("incomplete snapshot pair")]
    IncompletePair,
}

// Raw collector record shapes (snake_case JSON, nested sections). Missing
// sections default so a sparse record still normalizes.

#[derive(Debug, Default, serde::Deserialize)]
struct RawSystemInfo {
    #[serde(default)]
    hostname: String,
    #[serde(default)]
    platform: String,
    #[serde(default)]
    uptime_hours: f64,
}

#[derive(Debug, Default, serde::Deserialize)]
struct RawGauge {
    #[serde(default)]
    usage_percent: f64,
}

#[derive(Debug, Default, serde::Deserialize)]
struct RawMemory {
    #[serde(default)]
    usage_percent: f64,
    #[serde(default)]
    used_gb: f64,
    #[serde(default)]
    total_gb: f64,
}

#[derive(Debug, Default, serde::Deserialize)]
struct RawVmRecord {
    #[serde(default)]
    timestamp: u64,
    #[serde(default)]
    system_info: RawSystemInfo,
    #[serde(default)]
    cpu: RawGauge,
    #[serde(default)]
    memory: RawMemory,
    #[serde(default)]
    disk: RawGauge,
}

#[derive(Debug, Default, serde::Deserialize)]
struct RawUsage {
    #[serde(default)]
    active_users: u64,
    #[serde(default)]
    requests_per_second: f64,
    #[serde(default)]
    error_rate_percent: f64,
    #[serde(default)]
    avg_page_load_ms: f64,
    #[serde(default)]
    traffic_sources: BTreeMap<String, u64>,
}

#[derive(Debug, Default, serde::Deserialize)]
struct RawPerformance {
    #[serde(default)]
    current_response_time_ms: f64,
}

#[derive(Debug, Default, serde::Deserialize)]
struct RawWebappRecord {
    #[serde(default)]
    timestamp: u64,
    #[serde(default)]
    usage: RawUsage,
    #[serde(default)]
    performance: RawPerformance,
}

/// Normalize one raw collector record into the internal snapshot shape.
/// The "type" discriminator decides the kind; unknown or missing kinds are
/// rejected, as are bodies that fail to deserialize. No retries here.
pub fn normalize(raw: &serde_json::Value) -> Result<MetricSnapshot, IngestError> {
    let kind = raw
        .get("type")
        .and_then(serde_json::Value::as_str)
        .ok_or_else(|| IngestError::UnrecognizedKind("<missing>".into()))?;

    match RecordKind::parse(kind) {
        Some(RecordKind::VmMetrics) => {
            let r: RawVmRecord = serde_json::from_value(raw.clone())
                .map_err(|e| IngestError::UnrecognizedKind(format!("malformed vm-metrics: {e}")))?;
            Ok(MetricSnapshot {
                timestamp: r.timestamp,
                payload: MetricPayload::Host(HostMetrics {
                    hostname: r.system_info.hostname,
                    platform: r.system_info.platform,
                    uptime_hours: r.system_info.uptime_hours,
                    cpu_percent: r.cpu.usage_percent,
                    memory_percent: r.memory.usage_percent,
                    memory_used_gb: r.memory.used_gb,
                    memory_total_gb: r.memory.total_gb,
                    disk_percent: r.disk.usage_percent,
                }),
            })
        }
        Some(RecordKind::WebappMetrics) => {
            let r: RawWebappRecord = serde_json::from_value(raw.clone()).map_err(|e| {
                IngestError::UnrecognizedKind(format!("malformed webapp-metrics: {e}"))
            })?;
            Ok(MetricSnapshot {
                timestamp: r.timestamp,
                payload: MetricPayload::Usage(UsageMetrics {
                    active_users: r.usage.active_users,
                    requests_per_second: r.usage.requests_per_second,
                    error_rate_percent: r.usage.error_rate_percent,
                    avg_page_load_ms: r.usage.avg_page_load_ms,
                    current_response_time_ms: r.performance.current_response_time_ms,
                    traffic_sources: r.usage.traffic_sources,
                }),
            })
        }
        None => Err(IngestError::UnrecognizedKind(kind.into())),
    }
}

/// Pair up the newest host and usage records for one tick. Either half
/// missing drops the whole tick (partial pairs are never rendered).
pub fn pair_from_records(
    host: Option<&StoredRecord>,
    usage: Option<&StoredRecord>,
) -> Result<SnapshotPair, IngestError> {
    let (host, usage) = match (host, usage) {
        (Some(h), Some(u)) => (h, u),
        _ => return Err(IngestError::IncompletePair),
    };
    let host_snapshot = normalize(&host.raw)?;
    let usage_snapshot = normalize(&usage.raw)?;
    match (host_snapshot.payload, usage_snapshot.payload) {
        (MetricPayload::Host(h), MetricPayload::Usage(u)) => Ok(SnapshotPair {
            timestamp: host_snapshot.timestamp,
            host: h,
            usage: u,
        }),
        _ => Err(IngestError::IncompletePair),
    }
}

/// Treat one relay push identically to a pulled pair: newest host record plus
/// the first (newest) usage event.
pub fn pair_from_push(update: &PushUpdate) -> Result<SnapshotPair, IngestError> {
    pair_from_records(update.host.as_ref(), update.events.first())
}

/// Synthetic pair generator with the original demo bounds. Never fails.
pub struct DemoSource {
    rng: StdRng,
}

impl DemoSource {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }

    /// Deterministic generator for tests.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn generate_pair(&mut self) -> SnapshotPair {
        let timestamp = chrono::Utc::now().timestamp_millis() as u64;
        let host = HostMetrics {
            hostname: "web-server-01".into(),
            platform: std::env::consts::OS.into(),
            uptime_hours: 72.5,
            cpu_percent: self.rng.random_range(45.0..75.0),
            memory_percent: self.rng.random_range(60.0..80.0),
            memory_used_gb: 6.4,
            memory_total_gb: 16.0,
            disk_percent: 45.0,
        };
        let mut traffic_sources = BTreeMap::new();
        traffic_sources.insert("direct".into(), self.rng.random_range(20..40));
        traffic_sources.insert("organic".into(), self.rng.random_range(15..35));
        traffic_sources.insert("referral".into(), self.rng.random_range(10..25));
        traffic_sources.insert("social".into(), self.rng.random_range(5..15));
        let usage = UsageMetrics {
            active_users: self.rng.random_range(50..80),
            requests_per_second: self.rng.random_range(20..40) as f64,
            error_rate_percent: self.rng.random_range(0.0..2.0),
            avg_page_load_ms: self.rng.random_range(300.0..700.0),
            current_response_time_ms: self.rng.random_range(150.0..350.0),
            traffic_sources,
        };
        SnapshotPair {
            timestamp,
            host,
            usage,
        }
    }
}

impl Default for DemoSource {
    fn default() -> Self {
        Self::new()
    }
}

/// Store-backed source: newest record of each kind, paired.
pub struct LiveSource {
    reader: Arc<dyn RecordReader>,
}

impl LiveSource {
    pub fn new(reader: Arc<dyn RecordReader>) -> Self {
        Self { reader }
    }

    pub async fn fetch_pair(&self) -> Result<SnapshotPair, IngestError> {
        let host = self
            .reader
            .newest_by_kind(RecordKind::VmMetrics, 1)
            .await
            .map_err(|e| IngestError::SourceUnavailable(e.to_string()))?;
        let usage = self
            .reader
            .newest_by_kind(RecordKind::WebappMetrics, 1)
            .await
            .map_err(|e| IngestError::SourceUnavailable(e.to_string()))?;
        pair_from_records(host.first(), usage.first())
    }
}

/// Tagged source variant selected by configuration, not by scattered
/// conditionals.
pub enum DataSource {
    Demo(DemoSource),
    Live(LiveSource),
}

impl DataSource {
    pub fn demo() -> Self {
        DataSource::Demo(DemoSource::new())
    }

    pub fn live(reader: Arc<dyn RecordReader>) -> Self {
        DataSource::Live(LiveSource::new(reader))
    }

    /// One HostMetrics+UsageMetrics pair for the current tick. The demo path
    /// never fails; the live path reports store failures as values.
    pub async fn fetch_pair(&mut self) -> Result<SnapshotPair, IngestError> {
        match self {
            DataSource::Demo(demo) => Ok(demo.generate_pair()),
            DataSource::Live(live) => live.fetch_pair().await,
        }
    }
}
