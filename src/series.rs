// Bounded per-channel time series for the dashboard charts

use std::collections::{HashMap, VecDeque};

use crate::models::SeriesView;

/// One named chart slot. Names match the element ids in the original UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Cpu,
    Memory,
    Requests,
    ResponseTime,
}

impl Channel {
    pub const ALL: [Channel; 4] = [
        Channel::Cpu,
        Channel::Memory,
        Channel::Requests,
        Channel::ResponseTime,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Cpu => "cpu",
            Channel::Memory => "memory",
            Channel::Requests => "requests",
            Channel::ResponseTime => "response",
        }
    }
}

/// Fixed-capacity ordered buffers of (label, value) points, one per channel.
/// Append beyond `max_data_points` evicts exactly the oldest point (FIFO by
/// age; access order is irrelevant).
#[derive(Debug, Clone)]
pub struct SeriesStore {
    max_data_points: usize,
    channels: HashMap<Channel, VecDeque<(String, f64)>>,
}

impl SeriesStore {
    pub fn new(max_data_points: usize) -> Self {
        Self {
            max_data_points,
            channels: HashMap::new(),
        }
    }

    /// Push one point onto the named channel, initializing the buffer for a
    /// previously-unseen channel. Append adds exactly one point, so at most
    /// one eviction is ever needed.
    pub fn append(&mut self, channel: Channel, label: impl Into<String>, value: f64) {
        let buf = self.channels.entry(channel).or_default();
        buf.push_back((label.into(), value));
        if buf.len() > self.max_data_points {
            buf.pop_front();
        }
    }

    /// Current buffer contents in chronological order. Read-only.
    pub fn snapshot(&self, channel: Channel) -> Vec<(String, f64)> {
        self.channels
            .get(&channel)
            .map(|buf| buf.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn len(&self, channel: Channel) -> usize {
        self.channels.get(&channel).map_or(0, VecDeque::len)
    }

    pub fn is_empty(&self, channel: Channel) -> bool {
        self.len(channel) == 0
    }

    /// Chart-ready view: parallel label/value vectors, oldest first.
    pub fn view(&self, channel: Channel) -> SeriesView {
        let (labels, values) = match self.channels.get(&channel) {
            Some(buf) => buf.iter().map(|(l, v)| (l.clone(), *v)).unzip(),
            None => (Vec::new(), Vec::new()),
        };
        SeriesView { labels, values }
    }
}
