//! Conviction Engine — pure detection of meaningful YES-price shifts.
//!
//! `evaluate` is a deterministic function of `(subscription, snapshot,
//! state)` modulo the `detected_at` timestamp; it performs no I/O and
//! never panics on well-formed inputs. Ported from the original
//! `detect_conviction_change` with the same threshold precedence and
//! zero-baseline handling.

use chrono::{DateTime, Utc};

use super::snapshot::MarketSnapshot;
use super::subscription::Subscription;

/// Sane, conservative defaults when a subscription sets no overrides.
const DEFAULT_ABS_THRESHOLD: f64 = 0.10;
const DEFAULT_PCT_THRESHOLD: f64 = 0.20;

/// Per-market conviction tracking state, owned exclusively by the
/// orchestrator and mutated by at most one task at a time.
#[derive(Debug, Clone, Default)]
pub struct ConvictionState {
    pub last_yes_price: Option<f64>,
    pub last_event_yes_price: Option<f64>,
    pub last_event_at: Option<DateTime<Utc>>,
}

/// Direction of a detected conviction change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Yes,
    No,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Yes => "yes",
            Direction::No => "no",
        }
    }
}

/// A single detected conviction change, consumed once by the orchestrator
/// to build a `PolymarketEvent`.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvictionChange {
    pub direction: Direction,
    pub magnitude: f64,
    pub magnitude_pct: f64,
    pub previous_yes_price: Option<f64>,
    pub detected_at: DateTime<Utc>,
}

fn resolve_thresholds(subscription: &Subscription) -> (f64, f64) {
    let abs_threshold = subscription
        .conviction_threshold
        .filter(|v| *v > 0.0)
        .unwrap_or(DEFAULT_ABS_THRESHOLD);
    let pct_threshold = subscription
        .conviction_threshold_pct
        .filter(|v| *v > 0.0)
        .unwrap_or(DEFAULT_PCT_THRESHOLD);
    (abs_threshold, pct_threshold)
}

/// Evaluate one `(subscription, snapshot, state)` triple.
///
/// On the first observation for a market, records the baseline and
/// returns no change. On every later observation, fires iff the absolute
/// or percentage move since `last_yes_price` crosses its threshold, and
/// always advances `state.last_yes_price` to the current price regardless
/// of whether it fired.
pub fn evaluate(
    subscription: &Subscription,
    snapshot: &MarketSnapshot,
    state: &mut ConvictionState,
) -> Option<ConvictionChange> {
    let current = snapshot.yes_price;
    let previous = match state.last_yes_price {
        None => {
            state.last_yes_price = Some(current);
            return None;
        }
        Some(p) => p,
    };

    let (abs_threshold, pct_threshold) = resolve_thresholds(subscription);

    let change_abs = (current - previous).abs();
    let change_pct = if previous == 0.0 {
        if change_abs > 0.0 {
            f64::INFINITY
        } else {
            0.0
        }
    } else {
        change_abs / previous
    };

    state.last_yes_price = Some(current);

    if change_abs < abs_threshold && change_pct < pct_threshold {
        return None;
    }

    let direction = if current > previous {
        Direction::Yes
    } else {
        Direction::No
    };
    let detected_at = Utc::now();

    state.last_event_yes_price = Some(current);
    state.last_event_at = Some(detected_at);

    Some(ConvictionChange {
        direction,
        magnitude: change_abs,
        magnitude_pct: change_pct,
        previous_yes_price: Some(previous),
        detected_at,
    })
}
