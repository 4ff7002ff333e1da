// Domain models (ported from the JS dashboard and collectors)

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Record kind discriminator as written by the collectors ("type" attribute).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordKind {
    #[serde(rename = "vm-metrics")]
    VmMetrics,
    #[serde(rename = "webapp-metrics")]
    WebappMetrics,
}

impl RecordKind {
    /// Parse from a raw "type" attribute (e.g. "vm-metrics").
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "vm-metrics" => Some(RecordKind::VmMetrics),
            "webapp-metrics" => Some(RecordKind::WebappMetrics),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::VmMetrics => "vm-metrics",
            RecordKind::WebappMetrics => "webapp-metrics",
        }
    }
}

/// Host/VM half of a snapshot pair, flattened from the collector record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostMetrics {
    pub hostname: String,
    pub platform: String,
    pub uptime_hours: f64,
    pub cpu_percent: f64,
    pub memory_percent: f64,
    pub memory_used_gb: f64,
    pub memory_total_gb: f64,
    pub disk_percent: f64,
}

/// Web-application half of a snapshot pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetrics {
    pub active_users: u64,
    pub requests_per_second: f64,
    pub error_rate_percent: f64,
    pub avg_page_load_ms: f64,
    pub current_response_time_ms: f64,
    pub traffic_sources: BTreeMap<String, u64>,
}

/// One normalized point-in-time measurement.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricSnapshot {
    pub timestamp: u64,
    pub payload: MetricPayload,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum MetricPayload {
    Host(HostMetrics),
    Usage(UsageMetrics),
}

/// One HostMetrics + one UsageMetrics record sharing a logical tick.
/// The dashboard never renders from half a pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotPair {
    pub timestamp: u64,
    pub host: HostMetrics,
    pub usage: UsageMetrics,
}

/// Change classification for a metric card relative to the last displayed value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Stable,
}

/// Per-card view state: current value plus change vs. the previous tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricCard {
    pub value: f64,
    pub change_direction: Direction,
    pub change_percent: f64,
}

/// One chart's data: labels and values are the same length, oldest first.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesView {
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

/// 3-state connection indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthState {
    Connecting,
    Connected,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthView {
    pub state: HealthState,
    pub label: String,
}

/// Static host identity shown in the system-info panel.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemInfoView {
    pub hostname: String,
    pub platform: String,
    pub uptime_hours: f64,
}

/// Everything the presentation layer needs for one render.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewModel {
    pub cards: BTreeMap<String, MetricCard>,
    pub series: BTreeMap<String, SeriesView>,
    pub traffic_shares: BTreeMap<String, f64>,
    pub system_info: SystemInfoView,
    pub health: HealthView,
    pub last_update: String,
}
