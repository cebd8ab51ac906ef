//! Subscription — a reference-counted declaration of interest in a market.
//!
//! Owned by the Subscription Store; mutated only through atomic
//! increment/decrement. A subscription is active iff `ref_count > 0`.

use mongodb::bson::DateTime as BsonDateTime;
use serde::{Deserialize, Serialize};

/// A subscription record as read from the subscription store.
///
/// Unknown fields on the stored document are tolerated (spec §4.1) and
/// captured in `extra` so a round-trip through this type never silently
/// drops data another tool wrote into the document; `extra` is read-only
/// here, nothing in this crate writes it back.
///
/// `created_at`/`updated_at` are the driver's native `bson::DateTime`
/// rather than `chrono::DateTime<Utc>`: the bundled bson crate only
/// implements `Into<Bson>`/round-trip `Deserialize` for `chrono::DateTime`
/// behind its `chrono-0_4` feature, which this crate does not enable, so
/// the native BSON datetime element type is used directly instead.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Subscription {
    pub market_id: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub ref_count: i64,
    #[serde(default)]
    pub created_at: Option<BsonDateTime>,
    #[serde(default)]
    pub updated_at: Option<BsonDateTime>,
    #[serde(default)]
    pub conviction_threshold: Option<f64>,
    #[serde(default)]
    pub conviction_threshold_pct: Option<f64>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Subscription {
    /// Active iff `ref_count > 0`. Transient zero/negative counts from
    /// concurrent edits are simply not active — no lower bound is enforced.
    pub fn is_active(&self) -> bool {
        self.ref_count > 0
    }
}
