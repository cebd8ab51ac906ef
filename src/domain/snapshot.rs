//! Market Snapshot — a point-in-time observation of a market's prices.
//!
//! Produced fresh on every poll by the Market Data Source and discarded
//! after a single poll cycle; never persisted as-is.

use chrono::{DateTime, Utc};

/// One market's prices and metadata as observed at `fetched_at`.
#[derive(Debug, Clone, PartialEq)]
pub struct MarketSnapshot {
    pub market_id: String,
    pub question: String,
    pub yes_price: f64,
    pub no_price: f64,
    pub volume: Option<f64>,
    pub liquidity: Option<f64>,
    pub active: bool,
    pub closed: bool,
    pub fetched_at: DateTime<Utc>,
}
