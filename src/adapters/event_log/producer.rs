//! Kafka event publisher — producer side of the partitioned log.

use std::time::Duration;

use async_trait::async_trait;
use rdkafka::admin::{AdminClient, AdminOptions, NewTopic, TopicReplication};
use rdkafka::config::ClientConfig;
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::util::Timeout;
use tracing::{error, info, warn};

use crate::config::KafkaProducerConfig;
use crate::domain::PolymarketEvent;
use crate::ports::event_log::EventPublisher;

const TOPIC_PARTITIONS: i32 = 3;
const TOPIC_REPLICATION: i32 = 1;

fn base_client_config(config: &KafkaProducerConfig) -> ClientConfig {
    let mut client_config = ClientConfig::new();
    client_config.set("bootstrap.servers", &config.bootstrap_servers);
    if !config.security.is_plaintext() {
        client_config
            .set("security.protocol", &config.security.protocol)
            .set("sasl.mechanisms", &config.security.sasl_mechanisms)
            .set("sasl.username", &config.security.sasl_username)
            .set("sasl.password", &config.security.sasl_password);
    }
    client_config
}

/// Publishes `PolymarketEvent`s to a partitioned Kafka topic keyed by
/// `market_id`. Delivery is asynchronous: `publish` hands the record to
/// librdkafka's internal queue and returns immediately, logging the
/// delivery outcome from a detached task once it resolves.
pub struct KafkaEventPublisher {
    producer: FutureProducer,
    topic: String,
}

impl KafkaEventPublisher {
    pub async fn connect(config: &KafkaProducerConfig) -> anyhow::Result<Self> {
        let producer: FutureProducer = base_client_config(config)
            .set("acks", "all")
            .set("enable.idempotence", "true")
            .set("compression.type", "zstd")
            .set("batch.num.messages", "10000")
            .set("linger.ms", "10")
            .set("queue.buffering.max.kbytes", "32768")
            .set("delivery.timeout.ms", "60000")
            .set("message.max.bytes", &(5 * 1024 * 1024).to_string())
            .create()?;

        let topic = config.full_topic();
        ensure_topic_exists(config, &topic).await;

        info!(%topic, bootstrap_servers = %config.bootstrap_servers, "Kafka producer initialized");
        Ok(Self { producer, topic })
    }
}

/// Best-effort topic creation. A pre-existing topic, or any admin-client
/// failure, is logged and otherwise ignored — the broker's auto-create
/// setting (if enabled) covers the rest.
async fn ensure_topic_exists(config: &KafkaProducerConfig, topic: &str) {
    let admin: Result<AdminClient<_>, _> = base_client_config(config)
        .create();
    let admin = match admin {
        Ok(admin) => admin,
        Err(e) => {
            warn!(error = %e, "failed to build admin client for topic provisioning");
            return;
        }
    };

    let new_topic = NewTopic::new(topic, TOPIC_PARTITIONS, TopicReplication::Fixed(TOPIC_REPLICATION));
    let result = admin
        .create_topics(&[new_topic], &AdminOptions::new().operation_timeout(Some(Timeout::After(Duration::from_secs(30)))))
        .await;

    match result {
        Ok(results) => {
            for r in results {
                match r {
                    Ok(name) => info!(topic = %name, "topic created"),
                    Err((name, e)) => {
                        info!(topic = %name, error = %e, "topic already exists or creation skipped")
                    }
                }
            }
        }
        Err(e) => warn!(error = %e, "failed to ensure topic exists; proceeding anyway"),
    }
}

#[async_trait]
impl EventPublisher for KafkaEventPublisher {
    async fn publish(&self, mut event: PolymarketEvent) {
        event.published_at = Some(chrono::Utc::now());

        let market_id = event.market_id.clone();
        let event_id = event.event_id.clone();
        let direction = event.conviction_direction.clone();
        let magnitude = event.conviction_magnitude;

        let payload = match serde_json::to_vec(&event) {
            Ok(bytes) => bytes,
            Err(e) => {
                error!(error = %e, %event_id, "failed to serialize event; dropping");
                return;
            }
        };

        info!(%market_id, %event_id, %direction, magnitude, "publishing conviction event");

        let record = FutureRecord::to(&self.topic).key(&market_id).payload(&payload);

        // Hand the record to librdkafka's internal queue and return; the
        // delivery outcome is awaited in a detached task so a slow broker
        // never stalls the polling loop (spec §4.5: publish != acked).
        let send_future = self.producer.send_result(record);
        let topic = self.topic.clone();
        match send_future {
            Ok(future) => {
                tokio::spawn(async move {
                    match future.await {
                        Ok(Ok((partition, offset))) => {
                            tracing::debug!(%market_id, %topic, partition, offset, "message delivered");
                        }
                        Ok(Err((e, _))) => {
                            error!(%market_id, %event_id, error = %e, "failed to deliver message");
                        }
                        Err(e) => {
                            error!(%market_id, %event_id, error = %e, "delivery future cancelled");
                        }
                    }
                });
            }
            Err((e, _)) => {
                error!(%market_id, %event_id, error = %e, "failed to enqueue message");
            }
        }
    }

    async fn flush(&self, timeout: Duration) {
        if let Err(e) = self.producer.flush(timeout) {
            warn!(error = %e, "producer flush failed");
        }
    }
}
