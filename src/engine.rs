// Session-scoped dashboard engine: series, card deltas, traffic shares,
// and the connection health indicator. One instance per connected client;
// nothing here is shared across sessions.

use std::collections::{BTreeMap, HashMap};

use crate::calc;
use crate::models::{
    HealthState, HealthView, MetricCard, SnapshotPair, SystemInfoView, ViewModel,
};
use crate::series::{Channel, SeriesStore};

/// Card identifiers, matching the original UI element ids.
pub const CARD_ACTIVE_USERS: &str = "active-users";
pub const CARD_REQUESTS: &str = "requests";
pub const CARD_CPU: &str = "cpu";
pub const CARD_MEMORY: &str = "memory";

pub struct DashboardEngine {
    series: SeriesStore,
    /// Last displayed value per card; created on first display, overwritten
    /// every tick, never evicted.
    previous: HashMap<String, f64>,
    health: HealthState,
    demo: bool,
    last_view: Option<ViewModel>,
}

impl DashboardEngine {
    pub fn new(max_data_points: usize, demo: bool) -> Self {
        Self {
            series: SeriesStore::new(max_data_points),
            previous: HashMap::new(),
            health: HealthState::Connecting,
            demo,
            last_view: None,
        }
    }

    pub fn health(&self) -> HealthState {
        self.health
    }

    fn health_view(&self) -> HealthView {
        let label = match self.health {
            HealthState::Connecting => "Connecting...",
            HealthState::Connected if self.demo => "Demo Mode",
            HealthState::Connected => "Connected",
            HealthState::Error => "Error",
        };
        HealthView {
            state: self.health,
            label: label.into(),
        }
    }

    /// One complete tick: append a point per channel, compute card deltas
    /// against the previously displayed values, compute traffic shares, and
    /// assemble the view model. Runs to completion synchronously; no partial
    /// state is ever observable. Flips health to Connected.
    pub fn apply_pair(&mut self, pair: &SnapshotPair) -> ViewModel {
        let label = chrono::Local::now().format("%H:%M:%S").to_string();

        self.series
            .append(Channel::Cpu, label.clone(), pair.host.cpu_percent);
        self.series
            .append(Channel::Memory, label.clone(), pair.host.memory_percent);
        self.series.append(
            Channel::Requests,
            label.clone(),
            pair.usage.requests_per_second,
        );
        self.series.append(
            Channel::ResponseTime,
            label,
            pair.usage.current_response_time_ms,
        );

        let card_values = [
            (CARD_ACTIVE_USERS, pair.usage.active_users as f64),
            (CARD_REQUESTS, pair.usage.requests_per_second),
            (CARD_CPU, pair.host.cpu_percent),
            (CARD_MEMORY, pair.host.memory_percent),
        ];
        let mut cards = BTreeMap::new();
        for (id, value) in card_values {
            let d = calc::delta(id, value, &self.previous);
            // Delta is against the value displayed before this tick; record
            // the new one only after computing.
            self.previous.insert(id.to_string(), value);
            cards.insert(
                id.to_string(),
                MetricCard {
                    value,
                    change_direction: d.direction,
                    change_percent: d.magnitude_percent,
                },
            );
        }

        let traffic_shares = calc::shares(&pair.usage.traffic_sources);

        let mut series = BTreeMap::new();
        for channel in Channel::ALL {
            series.insert(channel.as_str().to_string(), self.series.view(channel));
        }

        self.health = HealthState::Connected;
        let view = ViewModel {
            cards,
            series,
            traffic_shares,
            system_info: SystemInfoView {
                hostname: pair.host.hostname.clone(),
                platform: pair.host.platform.clone(),
                uptime_hours: pair.host.uptime_hours,
            },
            health: self.health_view(),
            last_update: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        };
        self.last_view = Some(view.clone());
        view
    }

    /// Ingestion failed this tick: flip the indicator to Error and keep the
    /// last rendered data as-is. A single subsequent success clears it.
    pub fn record_failure(&mut self) {
        self.health = HealthState::Error;
    }

    /// Last view model with the current health indicator applied. Before the
    /// first rendered tick this is an empty shell carrying only the health
    /// indicator, so a failure is visible even when no data ever arrived.
    pub fn current_view(&self) -> ViewModel {
        match self.last_view.clone() {
            Some(mut view) => {
                view.health = self.health_view();
                view
            }
            None => {
                let mut series = BTreeMap::new();
                for channel in Channel::ALL {
                    series.insert(channel.as_str().to_string(), self.series.view(channel));
                }
                ViewModel {
                    cards: BTreeMap::new(),
                    series,
                    traffic_shares: BTreeMap::new(),
                    system_info: SystemInfoView {
                        hostname: String::new(),
                        platform: String::new(),
                        uptime_hours: 0.0,
                    },
                    health: self.health_view(),
                    last_update: "--".into(),
                }
            }
        }
    }

    pub fn series_snapshot(&self, channel: Channel) -> Vec<(String, f64)> {
        self.series.snapshot(channel)
    }

    pub fn previous_value(&self, card_id: &str) -> Option<f64> {
        self.previous.get(card_id).copied()
    }
}
