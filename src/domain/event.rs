//! PolymarketEvent — the immutable record published to the log and
//! archived downstream.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::conviction::{ConvictionChange, Direction};
use super::snapshot::MarketSnapshot;

/// Data source identifier stamped on every event.
pub const EVENT_SOURCE: &str = "polymarket-kafka";

/// A single conviction-change event, built once per detected shift and
/// serialized verbatim to the log. `published_at` starts unset and is
/// filled in by the publisher at publish time, not at construction time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PolymarketEvent {
    pub event_id: String,
    pub timestamp: DateTime<Utc>,
    pub market_id: String,
    pub question: String,
    pub yes_price: f64,
    pub no_price: f64,
    pub source: String,
    pub published_at: Option<DateTime<Utc>>,
    pub conviction_direction: String,
    pub conviction_magnitude: f64,
    pub conviction_magnitude_pct: f64,
    pub previous_yes_price: Option<f64>,
    pub volume: Option<f64>,
    pub liquidity: Option<f64>,
}

impl PolymarketEvent {
    /// Build an event from a snapshot and the conviction change it
    /// produced. `event_id` is freshly generated; `published_at` is left
    /// unset until the publisher stamps it.
    pub fn new(snapshot: &MarketSnapshot, change: &ConvictionChange) -> Self {
        Self {
            event_id: Uuid::new_v4().to_string(),
            timestamp: snapshot.fetched_at,
            market_id: snapshot.market_id.clone(),
            question: snapshot.question.clone(),
            yes_price: snapshot.yes_price,
            no_price: snapshot.no_price,
            source: EVENT_SOURCE.to_string(),
            published_at: None,
            conviction_direction: change.direction.as_str().to_string(),
            conviction_magnitude: change.magnitude,
            conviction_magnitude_pct: change.magnitude_pct,
            previous_yes_price: change.previous_yes_price,
            volume: snapshot.volume,
            liquidity: snapshot.liquidity,
        }
    }
}

impl Direction {
    /// Parse the wire representation back into a `Direction`, used by
    /// tests that round-trip a consumed event.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "yes" => Some(Direction::Yes),
            "no" => Some(Direction::No),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> MarketSnapshot {
        MarketSnapshot {
            market_id: "0xabc".to_string(),
            question: "Will it rain tomorrow?".to_string(),
            yes_price: 0.62,
            no_price: 0.38,
            volume: Some(1000.0),
            liquidity: Some(500.0),
            active: true,
            closed: false,
            fetched_at: Utc::now(),
        }
    }

    fn change() -> ConvictionChange {
        ConvictionChange {
            direction: Direction::Yes,
            magnitude: 0.15,
            magnitude_pct: 0.33,
            previous_yes_price: Some(0.47),
            detected_at: Utc::now(),
        }
    }

    #[test]
    fn new_event_has_no_published_at() {
        let event = PolymarketEvent::new(&snapshot(), &change());
        assert!(event.published_at.is_none());
        assert_eq!(event.source, EVENT_SOURCE);
        assert_eq!(event.market_id, "0xabc");
        assert_eq!(event.conviction_direction, "yes");
    }

    #[test]
    fn event_ids_are_unique() {
        let a = PolymarketEvent::new(&snapshot(), &change());
        let b = PolymarketEvent::new(&snapshot(), &change());
        assert_ne!(a.event_id, b.event_id);
    }

    #[test]
    fn json_round_trip_preserves_fields() {
        let mut event = PolymarketEvent::new(&snapshot(), &change());
        event.published_at = Some(Utc::now());
        let json = serde_json::to_string(&event).unwrap();
        let back: PolymarketEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(event, back);
    }
}
