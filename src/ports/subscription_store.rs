//! Subscription Store Port — the active-subscription boundary.

use async_trait::async_trait;

use crate::domain::Subscription;
use crate::error::SubscriptionStoreError;

/// Optional per-market overrides accepted on `subscribe`.
#[derive(Debug, Clone, Default)]
pub struct SubscribeOverrides {
    pub slug: Option<String>,
    pub conviction_threshold: Option<f64>,
    pub conviction_threshold_pct: Option<f64>,
}

/// Reads and mutates the set of active market subscriptions.
///
/// `list_active` pushes the `ref_count > 0` filter down to the store
/// rather than filtering client-side; documents with unknown keys are
/// tolerated (see `Subscription::extra`).
#[async_trait]
pub trait SubscriptionStore: Send + Sync + 'static {
    /// Every subscription with `ref_count > 0`.
    async fn list_active(&self) -> Result<Vec<Subscription>, SubscriptionStoreError>;

    /// Atomically increment `ref_count` by 1, upserting the document.
    /// `created_at` is set only on insert; `updated_at` always refreshes.
    async fn subscribe(
        &self,
        market_id: &str,
        overrides: SubscribeOverrides,
    ) -> Result<(), SubscriptionStoreError>;

    /// Atomically decrement `ref_count` by 1. No lower bound is enforced.
    async fn unsubscribe(&self, market_id: &str) -> Result<(), SubscriptionStoreError>;
}
