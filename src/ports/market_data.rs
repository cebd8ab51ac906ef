//! Market Data Source Port — snapshot retrieval from the public feed.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::domain::MarketSnapshot;
use crate::error::ApiError;

/// Fetches market price snapshots from the upstream prediction-market
/// API. Implementors are responsible for rate limiting, retries, and
/// pagination; see spec §4.2.
#[async_trait]
pub trait MarketDataSource: Send + Sync + 'static {
    /// Every active market, keyed by `market_id`. A parse failure on one
    /// record never aborts the bulk fetch — the record is simply absent
    /// from the returned map.
    async fn fetch_all_active(&self) -> Result<HashMap<String, MarketSnapshot>, ApiError>;

    /// A single market by its Gamma API slug, or `None` if not found.
    async fn fetch_by_slug(&self, slug: &str) -> Result<Option<MarketSnapshot>, ApiError>;
}
