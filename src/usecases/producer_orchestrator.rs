//! Producer Orchestrator - Poll, Detect, Publish Loop
//!
//! The producer's main loop: load active subscriptions, bulk-fetch
//! market snapshots, run conviction detection per subscription, and
//! fan out publication of any resulting events. Mirrors the shape of
//! `ArbitrageEngine::run` — a `tokio::select!` against a shutdown
//! broadcast — but on a fixed poll cadence rather than event-driven.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use futures_util::future::join_all;
use tokio::sync::{broadcast, Mutex};
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};

use crate::adapters::metrics::health::HealthState;
use crate::adapters::metrics::prometheus::MetricsRegistry;
use crate::config::ProducerConfig;
use crate::domain::{self, ConvictionState, MarketSnapshot, PolymarketEvent, Subscription};
use crate::ports::event_log::EventPublisher;
use crate::ports::market_data::MarketDataSource;
use crate::ports::subscription_store::SubscriptionStore;

/// The polling orchestrator, generic over its three port dependencies
/// so it can be driven against mock adapters in tests.
pub struct ProducerOrchestrator<S, M, P>
where
    S: SubscriptionStore,
    M: MarketDataSource,
    P: EventPublisher,
{
    subscription_store: Arc<S>,
    market_data: Arc<M>,
    publisher: Arc<P>,
    config: ProducerConfig,
    states: Mutex<HashMap<String, ConvictionState>>,
    metrics: Option<Arc<MetricsRegistry>>,
    health: Option<Arc<HealthState>>,
}

impl<S, M, P> ProducerOrchestrator<S, M, P>
where
    S: SubscriptionStore,
    M: MarketDataSource,
    P: EventPublisher,
{
    pub fn new(
        subscription_store: Arc<S>,
        market_data: Arc<M>,
        publisher: Arc<P>,
        config: ProducerConfig,
        metrics: Option<Arc<MetricsRegistry>>,
        health: Option<Arc<HealthState>>,
    ) -> Self {
        Self {
            subscription_store,
            market_data,
            publisher,
            config,
            states: Mutex::new(HashMap::new()),
            metrics,
            health,
        }
    }

    /// Run the polling loop until `shutdown_rx` fires.
    pub async fn run(&self, mut shutdown_rx: broadcast::Receiver<()>) {
        info!(
            poll_interval_seconds = self.config.poll_interval_seconds,
            "starting producer orchestrator"
        );

        loop {
            self.tick().await;

            tokio::select! {
                _ = shutdown_rx.recv() => {
                    info!("shutdown signal received, stopping producer orchestrator");
                    break;
                }
                _ = sleep(std::time::Duration::from_secs(self.config.poll_interval_seconds)) => {}
            }
        }

        self.publisher
            .flush(std::time::Duration::from_secs(10))
            .await;
    }

    /// Run a single poll-detect-publish cycle. Exposed at crate-visible
    /// granularity (rather than folded into `run`) so tests can drive
    /// individual ticks against mock ports without a sleep loop.
    #[instrument(skip(self))]
    pub async fn tick(&self) {
        let started = Instant::now();

        let subscriptions = match self.subscription_store.list_active().await {
            Ok(subs) => subs,
            Err(e) => {
                warn!(error = %e, "failed to fetch active subscriptions");
                if let Some(health) = &self.health {
                    health.mark_upstream(false);
                }
                Vec::new()
            }
        };

        if let Some(metrics) = &self.metrics {
            metrics.active_subscriptions.set(subscriptions.len() as f64);
        }

        if subscriptions.is_empty() {
            debug!("no active subscriptions, waiting for next poll");
            return;
        }

        info!(count = subscriptions.len(), "processing active subscriptions");

        let snapshots = match self.market_data.fetch_all_active().await {
            Ok(snapshots) => {
                if let Some(health) = &self.health {
                    health.mark_upstream(true);
                }
                snapshots
            }
            Err(e) => {
                warn!(error = %e, "failed to fetch markets from Gamma API");
                if let Some(health) = &self.health {
                    health.mark_upstream(false);
                }
                if let Some(metrics) = &self.metrics {
                    metrics
                        .market_data_errors_total
                        .with_label_values(&[error_kind(&e)])
                        .inc();
                }
                HashMap::new()
            }
        };

        if let Some(metrics) = &self.metrics {
            metrics
                .snapshots_fetched_total
                .with_label_values(&["gamma"])
                .inc_by(snapshots.len() as u64);
        }

        let events = self.evaluate_all(subscriptions, &snapshots).await;

        let published = events.len();
        join_all(events.into_iter().map(|event| {
            let publisher = Arc::clone(&self.publisher);
            async move { publisher.publish(event).await }
        }))
        .await;

        if let Some(metrics) = &self.metrics {
            metrics
                .poll_duration_seconds
                .with_label_values(&["ok"])
                .observe(started.elapsed().as_secs_f64());
        }

        debug!(published, elapsed_ms = started.elapsed().as_millis(), "tick complete");
    }

    /// Run conviction detection across every active subscription with a
    /// matching snapshot, mutating per-market state sequentially (the
    /// engine is pure but the state map is shared), returning any events
    /// that fired — ready for concurrent publish.
    async fn evaluate_all(
        &self,
        subscriptions: Vec<Subscription>,
        snapshots: &HashMap<String, MarketSnapshot>,
    ) -> Vec<PolymarketEvent> {
        let mut states = self.states.lock().await;
        let mut events = Vec::new();

        for sub in subscriptions {
            let Some(snapshot) = snapshots.get(&sub.market_id) else {
                warn!(market_id = %sub.market_id, "market not found in Gamma API response");
                continue;
            };

            if !snapshot.active || snapshot.closed {
                info!(market_id = %sub.market_id, "market inactive or closed; skipping");
                continue;
            }

            let state = states.entry(sub.market_id.clone()).or_default();
            let change = domain::evaluate(&sub, snapshot, state);

            match change {
                Some(change) => {
                    if let Some(metrics) = &self.metrics {
                        metrics
                            .events_published_total
                            .with_label_values(&[change.direction.as_str()])
                            .inc();
                    }
                    events.push(PolymarketEvent::new(snapshot, &change));
                }
                None => debug!(market_id = %sub.market_id, "no significant conviction change"),
            }
        }

        events
    }
}

fn error_kind(error: &crate::error::ApiError) -> &'static str {
    match error {
        crate::error::ApiError::Transient(_) => "transient",
        crate::error::ApiError::Terminal(_) => "terminal",
    }
}
