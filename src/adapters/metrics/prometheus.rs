//! Prometheus Metrics Registry - Pipeline Observability
//!
//! Registers and exposes Prometheus metrics on `/metrics` for Grafana
//! dashboards. Covers polling cadence, conviction events, and archive
//! write outcomes for both binaries.

use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use prometheus::{Encoder, Gauge, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder};
use tokio::sync::broadcast;
use tracing::{info, instrument};

/// Centralized Prometheus metrics for the event pipeline.
///
/// All metrics follow the naming convention `polymarket_pipeline_*`.
/// Producer and consumer share one registry shape; each binary only
/// touches the fields relevant to its own role.
pub struct MetricsRegistry {
    registry: Registry,
    /// Poll cycle duration, producer side (seconds).
    pub poll_duration_seconds: HistogramVec,
    /// Active subscriptions observed on the last poll.
    pub active_subscriptions: Gauge,
    /// Market snapshots fetched per poll.
    pub snapshots_fetched_total: IntCounterVec,
    /// Conviction-change events detected and published.
    pub events_published_total: IntCounterVec,
    /// Market Data Source failures, by kind (transient/terminal).
    pub market_data_errors_total: IntCounterVec,
    /// Events consumed from the log, consumer side.
    pub events_consumed_total: IntCounterVec,
    /// Archive write outcomes, by document kind and result.
    pub archive_writes_total: IntCounterVec,
}

impl MetricsRegistry {
    /// Create and register all Prometheus metrics.
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let poll_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "polymarket_pipeline_poll_duration_seconds",
                "Duration of a single producer poll cycle",
            )
            .buckets(vec![0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0]),
            &["outcome"],
        )?;

        let active_subscriptions = Gauge::new(
            "polymarket_pipeline_active_subscriptions",
            "Active subscriptions observed on the last poll",
        )?;

        let snapshots_fetched_total = IntCounterVec::new(
            Opts::new(
                "polymarket_pipeline_snapshots_fetched_total",
                "Market snapshots fetched per poll cycle",
            ),
            &["source"],
        )?;

        let events_published_total = IntCounterVec::new(
            Opts::new(
                "polymarket_pipeline_events_published_total",
                "Conviction-change events published to the log",
            ),
            &["direction"],
        )?;

        let market_data_errors_total = IntCounterVec::new(
            Opts::new(
                "polymarket_pipeline_market_data_errors_total",
                "Market Data Source failures by kind",
            ),
            &["kind"],
        )?;

        let events_consumed_total = IntCounterVec::new(
            Opts::new(
                "polymarket_pipeline_events_consumed_total",
                "Events consumed from the log",
            ),
            &["outcome"],
        )?;

        let archive_writes_total = IntCounterVec::new(
            Opts::new(
                "polymarket_pipeline_archive_writes_total",
                "Archive write outcomes by document kind",
            ),
            &["document", "outcome"],
        )?;

        registry.register(Box::new(poll_duration_seconds.clone()))?;
        registry.register(Box::new(active_subscriptions.clone()))?;
        registry.register(Box::new(snapshots_fetched_total.clone()))?;
        registry.register(Box::new(events_published_total.clone()))?;
        registry.register(Box::new(market_data_errors_total.clone()))?;
        registry.register(Box::new(events_consumed_total.clone()))?;
        registry.register(Box::new(archive_writes_total.clone()))?;

        Ok(Self {
            registry,
            poll_duration_seconds,
            active_subscriptions,
            snapshots_fetched_total,
            events_published_total,
            market_data_errors_total,
            events_consumed_total,
            archive_writes_total,
        })
    }

    /// Serve Prometheus metrics on the configured bind address.
    #[instrument(skip(self, shutdown_rx))]
    pub async fn serve(
        self: Arc<Self>,
        bind_address: String,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) -> anyhow::Result<()> {
        let metrics_self = Arc::clone(&self);

        let app = Router::new().route(
            "/metrics",
            get(move || {
                let registry = metrics_self.registry.clone();
                async move {
                    let encoder = TextEncoder::new();
                    let metric_families = registry.gather();
                    let mut buffer = Vec::new();
                    encoder.encode(&metric_families, &mut buffer).unwrap();
                    String::from_utf8(buffer).unwrap_or_default()
                }
            }),
        );

        let listener = tokio::net::TcpListener::bind(&bind_address).await?;
        info!(address = %bind_address, "Prometheus metrics server started");

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
            })
            .await?;

        Ok(())
    }
}
