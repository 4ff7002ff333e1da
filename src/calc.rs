// Derived metric computations: card deltas and traffic-source shares

use std::collections::{BTreeMap, HashMap};

use crate::models::Direction;

/// Result of comparing a card's new value against its last displayed value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricDelta {
    pub direction: Direction,
    pub magnitude_percent: f64,
}

/// Substitute magnitude when the previous displayed value was 0 and the new
/// one is not (the true percent change is unbounded).
const ZERO_BASE_CHANGE_PERCENT: f64 = 100.0;

/// Percentage change of `new_value` against the value displayed on the
/// previous tick. With no prior entry the previous defaults to `new_value`
/// itself, so the first observation is always Stable/0. Magnitudes under 1%
/// classify Stable; exactly 1.0% is already Up or Down.
///
/// The caller owns the side effect: after rendering it must overwrite
/// `previous[card_id]` with `new_value`.
pub fn delta(card_id: &str, new_value: f64, previous: &HashMap<String, f64>) -> MetricDelta {
    let previous = previous.get(card_id).copied().unwrap_or(new_value);

    let percent = if previous == 0.0 {
        if new_value == 0.0 {
            0.0
        } else {
            ZERO_BASE_CHANGE_PERCENT.copysign(new_value)
        }
    } else {
        (new_value - previous) / previous * 100.0
    };
    // Display rounding first (one decimal, as the UI shows), then classify.
    let percent = round1(percent);

    let direction = if percent.abs() < 1.0 {
        Direction::Stable
    } else if percent > 0.0 {
        Direction::Up
    } else {
        Direction::Down
    };

    MetricDelta {
        direction,
        magnitude_percent: percent.abs(),
    }
}

/// Percentage share of each category in a categorical breakdown, one decimal
/// place. A zero total yields all-zero shares; shares are not renormalized to
/// force an exact 100.0 sum after rounding.
pub fn shares(counts: &BTreeMap<String, u64>) -> BTreeMap<String, f64> {
    let total: u64 = counts.values().sum();
    counts
        .iter()
        .map(|(name, count)| {
            let percent = if total > 0 {
                round1(*count as f64 / total as f64 * 100.0)
            } else {
                0.0
            };
            (name.clone(), percent)
        })
        .collect()
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}
