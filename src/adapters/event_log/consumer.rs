//! Kafka event consumer — consumption side of the partitioned log.

use async_trait::async_trait;
use rdkafka::config::ClientConfig;
use rdkafka::consumer::{Consumer, StreamConsumer};
use rdkafka::message::Message;
use tracing::{error, info};

use crate::config::KafkaConsumerConfig;
use crate::domain::PolymarketEvent;
use crate::ports::event_log::EventConsumer;

/// Consumes `PolymarketEvent`s from the topic within a named consumer
/// group. `auto.offset.reset = earliest` means a first-time group
/// replays history; `enable.auto.commit = true` gives at-least-once
/// delivery, matching the producer side's idempotent re-publish story.
pub struct KafkaEventConsumer {
    consumer: StreamConsumer,
}

impl KafkaEventConsumer {
    pub fn connect(config: &KafkaConsumerConfig) -> anyhow::Result<Self> {
        let mut client_config = ClientConfig::new();
        client_config
            .set("bootstrap.servers", &config.bootstrap_servers)
            .set("group.id", &config.group_id)
            .set("auto.offset.reset", "earliest")
            .set("enable.auto.commit", "true");

        if !config.security.is_plaintext() {
            client_config
                .set("security.protocol", &config.security.protocol)
                .set("sasl.mechanisms", &config.security.sasl_mechanisms)
                .set("sasl.username", &config.security.sasl_username)
                .set("sasl.password", &config.security.sasl_password);
        }

        let consumer: StreamConsumer = client_config.create()?;
        consumer.subscribe(&[config.topic.as_str()])?;

        info!(
            bootstrap_servers = %config.bootstrap_servers,
            topic = %config.topic,
            group_id = %config.group_id,
            "Kafka consumer initialized and subscribed"
        );

        Ok(Self { consumer })
    }
}

#[async_trait]
impl EventConsumer for KafkaEventConsumer {
    async fn poll(&self, timeout_ms: u64) -> Option<PolymarketEvent> {
        let recv = self.consumer.recv();
        let timeout = std::time::Duration::from_millis(timeout_ms);

        let message = match tokio::time::timeout(timeout, recv).await {
            Ok(Ok(message)) => message,
            Ok(Err(e)) => {
                error!(error = %e, "Kafka consumer error");
                return None;
            }
            Err(_) => return None,
        };

        let payload = message.payload()?;
        match serde_json::from_slice::<PolymarketEvent>(payload) {
            Ok(event) => {
                tracing::debug!(
                    topic = message.topic(),
                    partition = message.partition(),
                    offset = message.offset(),
                    "received message"
                );
                Some(event)
            }
            Err(e) => {
                error!(error = %e, "failed to decode JSON message");
                None
            }
        }
    }
}
