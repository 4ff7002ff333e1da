// Model serialization tests (JSON camelCase wire format)

use std::collections::BTreeMap;

use pulsedash::models::*;

#[test]
fn test_host_metrics_serialization_camel_case() {
    let host = HostMetrics {
        hostname: "web-server-01".into(),
        platform: "Linux".into(),
        uptime_hours: 72.5,
        cpu_percent: 51.0,
        memory_percent: 63.0,
        memory_used_gb: 6.4,
        memory_total_gb: 16.0,
        disk_percent: 45.0,
    };
    let json = serde_json::to_string(&host).unwrap();
    assert!(json.contains("\"cpuPercent\""));
    assert!(json.contains("\"memoryUsedGb\""));
    assert!(json.contains("\"uptimeHours\""));
    let back: HostMetrics = serde_json::from_str(&json).unwrap();
    assert_eq!(back.cpu_percent, host.cpu_percent);
}

#[test]
fn test_usage_metrics_json_roundtrip() {
    let mut traffic_sources = BTreeMap::new();
    traffic_sources.insert("direct".to_string(), 30u64);
    let usage = UsageMetrics {
        active_users: 64,
        requests_per_second: 27.0,
        error_rate_percent: 0.8,
        avg_page_load_ms: 410.0,
        current_response_time_ms: 210.0,
        traffic_sources,
    };
    let json = serde_json::to_string(&usage).unwrap();
    assert!(json.contains("\"activeUsers\""));
    assert!(json.contains("\"trafficSources\""));
    let back: UsageMetrics = serde_json::from_str(&json).unwrap();
    assert_eq!(back.active_users, usage.active_users);
}

#[test]
fn test_record_kind_wire_names() {
    assert_eq!(
        serde_json::to_string(&RecordKind::VmMetrics).unwrap(),
        "\"vm-metrics\""
    );
    assert_eq!(
        serde_json::to_string(&RecordKind::WebappMetrics).unwrap(),
        "\"webapp-metrics\""
    );
    assert_eq!(RecordKind::parse("vm-metrics"), Some(RecordKind::VmMetrics));
    assert_eq!(RecordKind::parse("bogus"), None);
}

#[test]
fn test_direction_serializes_lowercase() {
    assert_eq!(serde_json::to_string(&Direction::Up).unwrap(), "\"up\"");
    assert_eq!(
        serde_json::to_string(&Direction::Stable).unwrap(),
        "\"stable\""
    );
}

#[test]
fn test_health_state_serializes_lowercase() {
    assert_eq!(
        serde_json::to_string(&HealthState::Connecting).unwrap(),
        "\"connecting\""
    );
    assert_eq!(
        serde_json::to_string(&HealthState::Error).unwrap(),
        "\"error\""
    );
}

#[test]
fn test_view_model_json_roundtrip() {
    let mut cards = BTreeMap::new();
    cards.insert(
        "cpu".to_string(),
        MetricCard {
            value: 55.0,
            change_direction: Direction::Up,
            change_percent: 10.0,
        },
    );
    let mut series = BTreeMap::new();
    series.insert(
        "cpu".to_string(),
        SeriesView {
            labels: vec!["10:00:00".into()],
            values: vec![55.0],
        },
    );
    let view = ViewModel {
        cards,
        series,
        traffic_shares: BTreeMap::new(),
        system_info: SystemInfoView {
            hostname: "web-server-01".into(),
            platform: "Linux".into(),
            uptime_hours: 72.5,
        },
        health: HealthView {
            state: HealthState::Connected,
            label: "Connected".into(),
        },
        last_update: "2026-01-01 10:00:00".into(),
    };
    let json = serde_json::to_string(&view).unwrap();
    assert!(json.contains("\"changeDirection\""));
    assert!(json.contains("\"trafficShares\""));
    assert!(json.contains("\"lastUpdate\""));
    let back: ViewModel = serde_json::from_str(&json).unwrap();
    assert_eq!(back.cards["cpu"].value, 55.0);
    assert_eq!(back.health.state, HealthState::Connected);
}
