//! Configuration Module - Environment-Variable Driven Configuration
//!
//! Loads and validates configuration from environment variables (with
//! an optional `.env` file), per the variable contract in spec §6.
//! Nothing in the domain layer hardcodes a URL, topic, or collection
//! name — it is all externalized here.

pub mod loader;

use std::time::Duration;

/// Configuration shared by both binaries for reaching the Gamma API.
#[derive(Debug, Clone)]
pub struct PolymarketConfig {
    pub base_url: String,
    pub request_timeout_seconds: u64,
    pub rate_limit_delay_ms: u64,
    /// Safety cap on offset-based pagination (spec §9 — made configurable).
    pub pagination_cap: u32,
}

impl PolymarketConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    pub fn rate_limit_delay(&self) -> Duration {
        Duration::from_millis(self.rate_limit_delay_ms)
    }
}

/// Kafka producer-side configuration (used by the `producer` binary).
#[derive(Debug, Clone)]
pub struct KafkaProducerConfig {
    pub bootstrap_servers: String,
    pub topic: String,
    pub topic_prefix: String,
    pub security: KafkaSecurity,
}

/// Kafka consumer-side configuration (used by the `consumer` binary).
#[derive(Debug, Clone)]
pub struct KafkaConsumerConfig {
    pub bootstrap_servers: String,
    pub topic: String,
    pub group_id: String,
    pub security: KafkaSecurity,
}

/// SASL/security settings, shared shape across producer and consumer.
#[derive(Debug, Clone)]
pub struct KafkaSecurity {
    pub protocol: String,
    pub sasl_mechanisms: String,
    pub sasl_username: String,
    pub sasl_password: String,
}

impl KafkaSecurity {
    pub fn is_plaintext(&self) -> bool {
        self.protocol.eq_ignore_ascii_case("PLAINTEXT")
    }
}

impl KafkaProducerConfig {
    /// Fully-qualified topic name, including the optional prefix.
    pub fn full_topic(&self) -> String {
        format!("{}{}", self.topic_prefix, self.topic)
    }
}

/// Subscription store / archive store connection settings (MongoDB).
#[derive(Debug, Clone)]
pub struct MongoConfig {
    pub uri: String,
    pub database: String,
    pub collection: String,
}

/// Metrics/health server bind settings, ambient to both binaries.
#[derive(Debug, Clone)]
pub struct MetricsConfig {
    pub enabled: bool,
    pub health_port: u16,
}

/// Top-level configuration for the `producer` binary.
#[derive(Debug, Clone)]
pub struct ProducerConfig {
    pub polymarket: PolymarketConfig,
    pub kafka: KafkaProducerConfig,
    pub mongodb: MongoConfig,
    pub poll_interval_seconds: u64,
    pub metrics: MetricsConfig,
}

/// Top-level configuration for the `consumer` binary.
#[derive(Debug, Clone)]
pub struct ConsumerConfig {
    pub kafka: KafkaConsumerConfig,
    /// Archive store connection. Spec names no required env vars for the
    /// archive store; see DESIGN.md for the resolution reusing MongoDB.
    pub archive: MongoConfig,
    pub poll_interval_ms: u64,
    pub metrics: MetricsConfig,
}
