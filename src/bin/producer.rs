//! Polymarket Event Pipeline — Producer Entry Point
//!
//! Polls the Gamma API for active subscriptions, detects conviction
//! changes, and publishes them to the partitioned event log.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::broadcast;
use tracing::{error, info};

use polymarket_event_pipeline::adapters::event_log::KafkaEventPublisher;
use polymarket_event_pipeline::adapters::market_data::GammaClient;
use polymarket_event_pipeline::adapters::metrics::health::{HealthServer, HealthState};
use polymarket_event_pipeline::adapters::metrics::prometheus::MetricsRegistry;
use polymarket_event_pipeline::adapters::subscription_store::MongoSubscriptionStore;
use polymarket_event_pipeline::config;
use polymarket_event_pipeline::usecases::ProducerOrchestrator;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let log_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(log_filter)
        .with_target(true)
        .init();

    info!(version = VERSION, pid = std::process::id(), "starting producer");

    let config = config::loader::load_producer_config().context("failed to load configuration")?;

    let (shutdown_tx, _) = broadcast::channel::<()>(1);

    let metrics = if config.metrics.enabled {
        Some(Arc::new(MetricsRegistry::new().context("failed to create metrics registry")?))
    } else {
        None
    };
    let health = Arc::new(HealthState::new());

    if config.metrics.enabled {
        if let Some(metrics) = metrics.clone() {
            let addr = format!("0.0.0.0:{}", config.metrics.health_port + 1);
            let shutdown_rx = shutdown_tx.subscribe();
            tokio::spawn(async move {
                if let Err(e) = metrics.serve(addr, shutdown_rx).await {
                    error!(error = %e, "metrics server exited with error");
                }
            });
        }

        let health_server = HealthServer::new(Arc::clone(&health), config.metrics.health_port);
        let shutdown_rx = shutdown_tx.subscribe();
        tokio::spawn(async move {
            if let Err(e) = health_server.run(shutdown_rx).await {
                error!(error = %e, "health server exited with error");
            }
        });
    }

    let subscription_store = Arc::new(
        MongoSubscriptionStore::connect(&config.mongodb)
            .await
            .context("failed to connect subscription store")?,
    );
    let market_data = Arc::new(
        GammaClient::new(config.polymarket.clone()).context("failed to build Gamma API client")?,
    );
    let publisher = Arc::new(
        KafkaEventPublisher::connect(&config.kafka)
            .await
            .context("failed to connect Kafka producer")?,
    );

    let orchestrator = ProducerOrchestrator::new(
        subscription_store,
        market_data,
        publisher,
        config,
        metrics,
        Some(health),
    );

    let orchestrator_shutdown = shutdown_tx.subscribe();
    let run_handle = tokio::spawn(async move {
        orchestrator.run(orchestrator_shutdown).await;
    });

    wait_for_shutdown_signal().await;

    let _ = shutdown_tx.send(());
    let _ = run_handle.await;

    info!("producer shutdown complete");
    Ok(())
}

/// Wait for SIGINT (Ctrl+C) or, on Unix, SIGTERM — whichever arrives
/// first triggers the same graceful-shutdown path (spec §6).
async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = match signal(SignalKind::terminate()) {
            Ok(s) => s,
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                let _ = tokio::signal::ctrl_c().await;
                return;
            }
        };
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                match result {
                    Ok(()) => info!("SIGINT received, initiating graceful shutdown"),
                    Err(e) => error!(error = %e, "failed to listen for SIGINT"),
                }
            }
            _ = sigterm.recv() => {
                info!("SIGTERM received, initiating graceful shutdown");
            }
        }
    }
    #[cfg(not(unix))]
    {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("shutdown signal received, initiating graceful shutdown"),
            Err(e) => error!(error = %e, "failed to listen for shutdown signal"),
        }
    }
}
