// Dashboard engine tests: tick application, health transitions, no-op ticks

use std::collections::BTreeMap;

use pulsedash::engine::{CARD_CPU, CARD_REQUESTS, DashboardEngine};
use pulsedash::models::{Direction, HealthState, HostMetrics, SnapshotPair, UsageMetrics};
use pulsedash::series::Channel;
use pulsedash::source::{self, IngestError};
use pulsedash::store::StoredRecord;

fn pair_with_cpu(cpu_percent: f64) -> SnapshotPair {
    let mut traffic_sources = BTreeMap::new();
    traffic_sources.insert("direct".to_string(), 3);
    traffic_sources.insert("organic".to_string(), 1);
    SnapshotPair {
        timestamp: 1_700_000_000_000,
        host: HostMetrics {
            hostname: "web-server-01".into(),
            platform: "linux".into(),
            uptime_hours: 72.5,
            cpu_percent,
            memory_percent: 62.0,
            memory_used_gb: 6.4,
            memory_total_gb: 16.0,
            disk_percent: 45.0,
        },
        usage: UsageMetrics {
            active_users: 60,
            requests_per_second: 25.0,
            error_rate_percent: 0.5,
            avg_page_load_ms: 420.0,
            current_response_time_ms: 200.0,
            traffic_sources,
        },
    }
}

#[test]
fn test_two_ticks_build_cpu_series_and_card_delta() {
    let mut engine = DashboardEngine::new(20, false);
    engine.apply_pair(&pair_with_cpu(50.0));
    let view = engine.apply_pair(&pair_with_cpu(55.0));

    let cpu_series = &view.series["cpu"];
    assert_eq!(cpu_series.values, vec![50.0, 55.0]);
    assert_eq!(cpu_series.labels.len(), 2);

    let cpu_card = &view.cards[CARD_CPU];
    assert_eq!(cpu_card.value, 55.0);
    assert_eq!(cpu_card.change_direction, Direction::Up);
    assert_eq!(cpu_card.change_percent, 10.0);
}

#[test]
fn test_first_tick_cards_are_stable() {
    let mut engine = DashboardEngine::new(20, false);
    let view = engine.apply_pair(&pair_with_cpu(50.0));
    for card in view.cards.values() {
        assert_eq!(card.change_direction, Direction::Stable);
        assert_eq!(card.change_percent, 0.0);
    }
}

#[test]
fn test_view_model_contains_all_four_channels_and_shares() {
    let mut engine = DashboardEngine::new(20, false);
    let view = engine.apply_pair(&pair_with_cpu(50.0));
    for name in ["cpu", "memory", "requests", "response"] {
        let s = view.series.get(name).expect("channel present");
        assert_eq!(s.values.len(), 1);
    }
    assert_eq!(view.traffic_shares.get("direct"), Some(&75.0));
    assert_eq!(view.traffic_shares.get("organic"), Some(&25.0));
    assert_eq!(view.system_info.hostname, "web-server-01");
    assert!(!view.last_update.is_empty());
}

#[test]
fn test_series_respects_max_data_points_across_ticks() {
    let mut engine = DashboardEngine::new(3, false);
    for i in 0..10 {
        engine.apply_pair(&pair_with_cpu(40.0 + i as f64));
    }
    let points = engine.series_snapshot(Channel::Cpu);
    assert_eq!(points.len(), 3);
    let values: Vec<f64> = points.iter().map(|(_, v)| *v).collect();
    assert_eq!(values, vec![47.0, 48.0, 49.0]);
}

#[test]
fn test_previous_table_tracks_last_displayed_value() {
    let mut engine = DashboardEngine::new(20, false);
    assert_eq!(engine.previous_value(CARD_REQUESTS), None);
    engine.apply_pair(&pair_with_cpu(50.0));
    assert_eq!(engine.previous_value(CARD_REQUESTS), Some(25.0));
    assert_eq!(engine.previous_value(CARD_CPU), Some(50.0));
    engine.apply_pair(&pair_with_cpu(55.0));
    assert_eq!(engine.previous_value(CARD_CPU), Some(55.0));
}

#[test]
fn test_incomplete_pair_leaves_state_untouched() {
    let mut engine = DashboardEngine::new(20, false);
    engine.apply_pair(&pair_with_cpu(50.0));
    let series_before = engine.series_snapshot(Channel::Cpu);
    let prev_before = engine.previous_value(CARD_CPU);
    let health_before = engine.health();

    // One half of the pair missing this tick: the orchestrator drops the
    // tick without touching the engine.
    let vm_record = StoredRecord {
        id: "vm-server-01".into(),
        timestamp: 1,
        kind: Some(pulsedash::models::RecordKind::VmMetrics),
        raw: serde_json::json!({ "type": "vm-metrics", "timestamp": 1 }),
    };
    let outcome = source::pair_from_records(Some(&vm_record), None);
    match outcome {
        Err(IngestError::IncompletePair) => {}
        other => panic!("expected IncompletePair, got {other:?}"),
    }

    assert_eq!(engine.series_snapshot(Channel::Cpu), series_before);
    assert_eq!(engine.previous_value(CARD_CPU), prev_before);
    assert_eq!(engine.health(), health_before);
}

#[test]
fn test_health_starts_connecting() {
    let engine = DashboardEngine::new(20, false);
    assert_eq!(engine.health(), HealthState::Connecting);
    let view = engine.current_view();
    assert_eq!(view.health.state, HealthState::Connecting);
    assert!(view.cards.is_empty());
}

#[test]
fn test_failure_before_first_success_yields_error_view() {
    let mut engine = DashboardEngine::new(20, false);
    engine.record_failure();

    // No tick has ever rendered; the view is an empty shell but the health
    // indicator must still show the failure.
    let view = engine.current_view();
    assert_eq!(view.health.state, HealthState::Error);
    assert_eq!(view.health.label, "Error");
    assert!(view.cards.is_empty());
    assert!(view.traffic_shares.is_empty());
    for name in ["cpu", "memory", "requests", "response"] {
        assert!(view.series[name].values.is_empty());
    }
}

#[test]
fn test_health_error_then_recovers_on_single_success() {
    let mut engine = DashboardEngine::new(20, false);
    engine.apply_pair(&pair_with_cpu(50.0));
    assert_eq!(engine.health(), HealthState::Connected);

    engine.record_failure();
    assert_eq!(engine.health(), HealthState::Error);

    // One success is enough, no hysteresis
    engine.apply_pair(&pair_with_cpu(51.0));
    assert_eq!(engine.health(), HealthState::Connected);
}

#[test]
fn test_failure_keeps_last_view_with_error_indicator() {
    let mut engine = DashboardEngine::new(20, false);
    let rendered = engine.apply_pair(&pair_with_cpu(50.0));
    engine.record_failure();

    let degraded = engine.current_view();
    assert_eq!(degraded.health.state, HealthState::Error);
    assert_eq!(degraded.health.label, "Error");
    // Data is the last rendered tick, unchanged
    assert_eq!(degraded.series["cpu"].values, rendered.series["cpu"].values);
    assert_eq!(degraded.cards[CARD_CPU].value, 50.0);
}

#[test]
fn test_connected_label_reflects_demo_source() {
    let mut demo_engine = DashboardEngine::new(20, true);
    let view = demo_engine.apply_pair(&pair_with_cpu(50.0));
    assert_eq!(view.health.label, "Demo Mode");

    let mut live_engine = DashboardEngine::new(20, false);
    let view = live_engine.apply_pair(&pair_with_cpu(50.0));
    assert_eq!(view.health.label, "Connected");
}
