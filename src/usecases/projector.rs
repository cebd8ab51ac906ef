//! Projector - Consume, Persist Loop
//!
//! The consumer's main loop: poll the event log and, for every decoded
//! event, perform the dual upsert into the archive (latest-per-market
//! and immutable history). Errors on either write are logged; the
//! Kafka offset is still considered committed (`enable.auto.commit`
//! handles this at the consumer adapter level), matching spec §4.7's
//! self-healing tolerance for a partial dual write.

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{error, info};

use crate::adapters::metrics::health::HealthState;
use crate::adapters::metrics::prometheus::MetricsRegistry;
use crate::config::ConsumerConfig;
use crate::ports::archive::ArchiveStore;
use crate::ports::event_log::EventConsumer;

const LOG_EVERY_N_EMPTY_POLLS: u64 = 30;

/// Consumes conviction events and projects them into the archive.
pub struct Projector<C, A>
where
    C: EventConsumer,
    A: ArchiveStore,
{
    consumer: Arc<C>,
    archive: Arc<A>,
    config: ConsumerConfig,
    metrics: Option<Arc<MetricsRegistry>>,
    health: Option<Arc<HealthState>>,
}

impl<C, A> Projector<C, A>
where
    C: EventConsumer,
    A: ArchiveStore,
{
    pub fn new(
        consumer: Arc<C>,
        archive: Arc<A>,
        config: ConsumerConfig,
        metrics: Option<Arc<MetricsRegistry>>,
        health: Option<Arc<HealthState>>,
    ) -> Self {
        Self {
            consumer,
            archive,
            config,
            metrics,
            health,
        }
    }

    /// Run the consume loop until `shutdown_rx` fires.
    pub async fn run(&self, mut shutdown_rx: broadcast::Receiver<()>) {
        info!(
            poll_interval_ms = self.config.poll_interval_ms,
            "starting projector"
        );

        let mut empty_polls: u64 = 0;

        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    info!("shutdown signal received, stopping projector");
                    break;
                }
                event = self.consumer.poll(self.config.poll_interval_ms) => {
                    match event {
                        None => {
                            empty_polls += 1;
                            if empty_polls % LOG_EVERY_N_EMPTY_POLLS == 0 {
                                info!(empty_polls, "consumer alive, waiting for conviction events");
                            }
                        }
                        Some(event) => {
                            empty_polls = 0;
                            if let Some(health) = &self.health {
                                health.mark_upstream(true);
                            }
                            if let Some(metrics) = &self.metrics {
                                metrics
                                    .events_consumed_total
                                    .with_label_values(&["ok"])
                                    .inc();
                            }
                            info!(
                                market_id = %event.market_id,
                                direction = %event.conviction_direction,
                                magnitude = event.conviction_magnitude,
                                yes_price = event.yes_price,
                                no_price = event.no_price,
                                "conviction event received"
                            );
                            self.persist(&event).await;
                        }
                    }
                }
            }
        }
    }

    async fn persist(&self, event: &crate::domain::PolymarketEvent) {
        let latest_result = self.archive.upsert_latest(event).await;
        if let Err(e) = &latest_result {
            error!(error = %e, market_id = %event.market_id, "failed to persist latest market state");
        }

        let history_result = self.archive.upsert_history(event).await;
        if let Err(e) = &history_result {
            error!(error = %e, event_id = %event.event_id, "failed to persist event history");
        }

        let ok = latest_result.is_ok() && history_result.is_ok();
        if let Some(health) = &self.health {
            health.mark_sink(ok);
        }
        if let Some(metrics) = &self.metrics {
            let outcome = if ok { "ok" } else { "error" };
            metrics
                .archive_writes_total
                .with_label_values(&["dual", outcome])
                .inc();
        }
    }
}
