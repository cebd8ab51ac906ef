//! Integration Tests - Orchestrator and Projector Against Mock Ports
//!
//! Exercises the use-cases layer end to end with mockall-based fakes
//! for every port, so the wiring between conviction detection,
//! publishing, and archiving is verified without any real network,
//! Kafka, or MongoDB dependency.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::Utc;
use mockall::mock;
use tokio::sync::broadcast;

use polymarket_event_pipeline::config::{
    ConsumerConfig, KafkaConsumerConfig, KafkaProducerConfig, KafkaSecurity, MetricsConfig,
    MongoConfig, PolymarketConfig, ProducerConfig,
};
use polymarket_event_pipeline::domain::{MarketSnapshot, PolymarketEvent, Subscription};
use polymarket_event_pipeline::error::{ApiError, ArchiveError, SubscriptionStoreError};
use polymarket_event_pipeline::ports::archive::ArchiveStore;
use polymarket_event_pipeline::ports::event_log::{EventConsumer, EventPublisher};
use polymarket_event_pipeline::ports::market_data::MarketDataSource;
use polymarket_event_pipeline::ports::subscription_store::{SubscribeOverrides, SubscriptionStore};
use polymarket_event_pipeline::usecases::{ProducerOrchestrator, Projector};

mock! {
    pub SubStore {}

    #[async_trait::async_trait]
    impl SubscriptionStore for SubStore {
        async fn list_active(&self) -> Result<Vec<Subscription>, SubscriptionStoreError>;
        async fn subscribe(&self, market_id: &str, overrides: SubscribeOverrides) -> Result<(), SubscriptionStoreError>;
        async fn unsubscribe(&self, market_id: &str) -> Result<(), SubscriptionStoreError>;
    }
}

mock! {
    pub MarketData {}

    #[async_trait::async_trait]
    impl MarketDataSource for MarketData {
        async fn fetch_all_active(&self) -> Result<HashMap<String, MarketSnapshot>, ApiError>;
        async fn fetch_by_slug(&self, slug: &str) -> Result<Option<MarketSnapshot>, ApiError>;
    }
}

mock! {
    pub Publisher {}

    #[async_trait::async_trait]
    impl EventPublisher for Publisher {
        async fn publish(&self, event: PolymarketEvent);
        async fn flush(&self, timeout: std::time::Duration);
    }
}

mock! {
    pub Consumer {}

    #[async_trait::async_trait]
    impl EventConsumer for Consumer {
        async fn poll(&self, timeout_ms: u64) -> Option<PolymarketEvent>;
    }
}

mock! {
    pub Archive {}

    #[async_trait::async_trait]
    impl ArchiveStore for Archive {
        async fn upsert_latest(&self, event: &PolymarketEvent) -> Result<(), ArchiveError>;
        async fn upsert_history(&self, event: &PolymarketEvent) -> Result<(), ArchiveError>;
    }
}

fn subscription(market_id: &str) -> Subscription {
    Subscription {
        market_id: market_id.to_string(),
        slug: None,
        ref_count: 1,
        created_at: None,
        updated_at: None,
        conviction_threshold: Some(0.05),
        conviction_threshold_pct: Some(0.10),
        extra: Default::default(),
    }
}

fn snapshot(market_id: &str, yes_price: f64, active: bool, closed: bool) -> MarketSnapshot {
    MarketSnapshot {
        market_id: market_id.to_string(),
        question: "integration test market".to_string(),
        yes_price,
        no_price: 1.0 - yes_price,
        volume: Some(100.0),
        liquidity: Some(50.0),
        active,
        closed,
        fetched_at: Utc::now(),
    }
}

fn producer_config() -> ProducerConfig {
    ProducerConfig {
        polymarket: PolymarketConfig {
            base_url: "https://gamma-api.polymarket.com".to_string(),
            request_timeout_seconds: 30,
            rate_limit_delay_ms: 200,
            pagination_cap: 10_000,
        },
        kafka: KafkaProducerConfig {
            bootstrap_servers: "localhost:9092".to_string(),
            topic: "polymarket-events".to_string(),
            topic_prefix: String::new(),
            security: KafkaSecurity {
                protocol: "PLAINTEXT".to_string(),
                sasl_mechanisms: "PLAIN".to_string(),
                sasl_username: String::new(),
                sasl_password: String::new(),
            },
        },
        mongodb: MongoConfig {
            uri: "mongodb://localhost:27017".to_string(),
            database: "polymarket".to_string(),
            collection: "polymarket_subscriptions".to_string(),
        },
        poll_interval_seconds: 30,
        metrics: MetricsConfig {
            enabled: false,
            health_port: 8080,
        },
    }
}

fn consumer_config() -> ConsumerConfig {
    ConsumerConfig {
        kafka: KafkaConsumerConfig {
            bootstrap_servers: "localhost:9092".to_string(),
            topic: "polymarket-events".to_string(),
            group_id: "strategy-injestor".to_string(),
            security: KafkaSecurity {
                protocol: "PLAINTEXT".to_string(),
                sasl_mechanisms: "PLAIN".to_string(),
                sasl_username: String::new(),
                sasl_password: String::new(),
            },
        },
        archive: MongoConfig {
            uri: "mongodb://localhost:27017".to_string(),
            database: "polymarket".to_string(),
            collection: "polymarket_archive".to_string(),
        },
        poll_interval_ms: 1,
        metrics: MetricsConfig {
            enabled: false,
            health_port: 8080,
        },
    }
}

#[tokio::test]
async fn orchestrator_publishes_on_conviction_change() {
    let mut sub_store = MockSubStore::new();
    sub_store
        .expect_list_active()
        .returning(|| Ok(vec![subscription("0xabc")]));

    let mut market_data = MockMarketData::new();
    let call_count = Arc::new(AtomicUsize::new(0));
    let call_count_clone = Arc::clone(&call_count);
    market_data.expect_fetch_all_active().returning(move || {
        let n = call_count_clone.fetch_add(1, Ordering::SeqCst);
        let price = if n == 0 { 0.5 } else { 0.7 };
        let mut map = HashMap::new();
        map.insert("0xabc".to_string(), snapshot("0xabc", price, true, false));
        Ok(map)
    });

    let published = Arc::new(AtomicUsize::new(0));
    let published_clone = Arc::clone(&published);
    let mut publisher = MockPublisher::new();
    publisher.expect_publish().returning(move |_| {
        published_clone.fetch_add(1, Ordering::SeqCst);
    });
    publisher.expect_flush().returning(|_| ());

    let orchestrator = ProducerOrchestrator::new(
        Arc::new(sub_store),
        Arc::new(market_data),
        Arc::new(publisher),
        producer_config(),
        None,
        None,
    );

    // First tick establishes the baseline (0.5), never fires.
    orchestrator.tick().await;
    assert_eq!(published.load(Ordering::SeqCst), 0);

    // Second tick crosses both thresholds (0.5 -> 0.7), must fire.
    orchestrator.tick().await;
    assert_eq!(published.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn orchestrator_skips_inactive_and_closed_markets() {
    let mut sub_store = MockSubStore::new();
    sub_store
        .expect_list_active()
        .returning(|| Ok(vec![subscription("0xclosed")]));

    let mut market_data = MockMarketData::new();
    market_data.expect_fetch_all_active().returning(|| {
        let mut map = HashMap::new();
        map.insert("0xclosed".to_string(), snapshot("0xclosed", 0.5, false, true));
        Ok(map)
    });

    let mut publisher = MockPublisher::new();
    publisher.expect_publish().times(0);
    publisher.expect_flush().returning(|_| ());

    let orchestrator = ProducerOrchestrator::new(
        Arc::new(sub_store),
        Arc::new(market_data),
        Arc::new(publisher),
        producer_config(),
        None,
        None,
    );

    orchestrator.tick().await;
}

#[tokio::test]
async fn orchestrator_proceeds_with_no_subscriptions_on_store_error() {
    let mut sub_store = MockSubStore::new();
    sub_store
        .expect_list_active()
        .returning(|| Err(SubscriptionStoreError::Transport("connection refused".to_string())));

    let mut market_data = MockMarketData::new();
    market_data.expect_fetch_all_active().times(0);

    let mut publisher = MockPublisher::new();
    publisher.expect_publish().times(0);
    publisher.expect_flush().returning(|_| ());

    let orchestrator = ProducerOrchestrator::new(
        Arc::new(sub_store),
        Arc::new(market_data),
        Arc::new(publisher),
        producer_config(),
        None,
        None,
    );

    orchestrator.tick().await;
}

#[tokio::test]
async fn projector_persists_latest_and_history_for_each_event() {
    let event = PolymarketEvent::new(
        &snapshot("0xabc", 0.7, true, false),
        &polymarket_event_pipeline::domain::ConvictionChange {
            direction: polymarket_event_pipeline::domain::Direction::Yes,
            magnitude: 0.2,
            magnitude_pct: 0.4,
            previous_yes_price: Some(0.5),
            detected_at: Utc::now(),
        },
    );

    let mut call_count = 0;
    let mut consumer = MockConsumer::new();
    let event_clone = event.clone();
    consumer.expect_poll().returning(move |_| {
        call_count += 1;
        if call_count == 1 {
            Some(event_clone.clone())
        } else {
            None
        }
    });

    let latest_calls = Arc::new(AtomicUsize::new(0));
    let history_calls = Arc::new(AtomicUsize::new(0));
    let latest_clone = Arc::clone(&latest_calls);
    let history_clone = Arc::clone(&history_calls);

    let mut archive = MockArchive::new();
    archive.expect_upsert_latest().returning(move |_| {
        latest_clone.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });
    archive.expect_upsert_history().returning(move |_| {
        history_clone.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });

    let projector = Projector::new(
        Arc::new(consumer),
        Arc::new(archive),
        consumer_config(),
        None,
        None,
    );

    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let run = tokio::spawn(async move { projector.run(shutdown_rx).await });

    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    let _ = shutdown_tx.send(());
    let _ = run.await;

    assert_eq!(latest_calls.load(Ordering::SeqCst), 1);
    assert_eq!(history_calls.load(Ordering::SeqCst), 1);
}
