//! Event Log Port — partitioned publish/consume of `PolymarketEvent`.

use async_trait::async_trait;

use crate::domain::PolymarketEvent;

/// Publishes events to a partitioned log topic, keyed by `market_id` so
/// per-market ordering is preserved within a partition.
///
/// Publish failures are asynchronous (logged via the delivery callback,
/// see spec §7 kind 5); this trait's `publish` returning `Ok` only means
/// the record was handed to the producer, not that it was acknowledged.
#[async_trait]
pub trait EventPublisher: Send + Sync + 'static {
    /// Stamp `published_at` and hand the event to the producer.
    async fn publish(&self, event: PolymarketEvent);

    /// Block until outstanding records are delivered or `timeout` elapses.
    async fn flush(&self, timeout: std::time::Duration);
}

/// Consumes events from the same topic within a named consumer group.
#[async_trait]
pub trait EventConsumer: Send + Sync + 'static {
    /// Poll for a single event, or `None` on timeout. Decode failures are
    /// logged and swallowed — the offending record is skipped and its
    /// offset still auto-committed (spec §7 kind 6).
    async fn poll(&self, timeout_ms: u64) -> Option<PolymarketEvent>;
}
