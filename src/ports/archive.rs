//! Archive Store Port — dual-document persistence per consumed event.

use async_trait::async_trait;

use crate::domain::PolymarketEvent;
use crate::error::ArchiveError;

/// Persists the latest-per-market view and the immutable event history.
///
/// Implementors upsert two documents per call: `market::{market_id}`
/// (overwritten every time) and `event::{event_id}` (idempotent under
/// re-delivery, since `event_id` is unique per publication). The two
/// writes are independent — a failure of one does not roll back the
/// other (spec §4.7).
#[async_trait]
pub trait ArchiveStore: Send + Sync + 'static {
    async fn upsert_latest(&self, event: &PolymarketEvent) -> Result<(), ArchiveError>;
    async fn upsert_history(&self, event: &PolymarketEvent) -> Result<(), ArchiveError>;
}
