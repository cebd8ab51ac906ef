//! Configuration Loader - Environment Loading and Validation
//!
//! Reads the environment variables in spec §6, applies defaults, and
//! fails fast with a clear `ConfigError` when a required variable is
//! missing or a numeric variable doesn't parse.

use std::env;

use tracing::info;

use crate::error::ConfigError;

use super::{
    ConsumerConfig, KafkaConsumerConfig, KafkaProducerConfig, KafkaSecurity, MetricsConfig,
    MongoConfig, PolymarketConfig, ProducerConfig,
};

fn load_dotenv() {
    // Best-effort: a missing .env file is not an error, matching the
    // original service's fallback-to-process-environment behavior.
    let _ = dotenvy::dotenv();
}

fn get_env(name: &'static str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn get_env_required(name: &'static str) -> Result<String, ConfigError> {
    match env::var(name) {
        Ok(value) if !value.is_empty() => Ok(value),
        _ => Err(ConfigError::MissingRequired(name)),
    }
}

fn get_env_parsed<T: std::str::FromStr>(
    name: &'static str,
    default: T,
    expected: &'static str,
) -> Result<T, ConfigError> {
    match env::var(name) {
        Err(_) => Ok(default),
        Ok(value) => value
            .parse::<T>()
            .map_err(|_| ConfigError::Invalid { name, value, expected }),
    }
}

fn load_polymarket_config() -> Result<PolymarketConfig, ConfigError> {
    Ok(PolymarketConfig {
        base_url: get_env("POLYMARKET_BASE_URL", "https://gamma-api.polymarket.com"),
        request_timeout_seconds: get_env_parsed(
            "POLYMARKET_REQUEST_TIMEOUT_SECONDS",
            30,
            "u64",
        )?,
        rate_limit_delay_ms: get_env_parsed("POLYMARKET_RATE_LIMIT_DELAY_MS", 200, "u64")?,
        pagination_cap: get_env_parsed("POLYMARKET_PAGINATION_CAP", 10_000, "u32")?,
    })
}

fn load_kafka_security() -> Result<KafkaSecurity, ConfigError> {
    Ok(KafkaSecurity {
        protocol: get_env("KAFKA_SECURITY_PROTOCOL", "PLAINTEXT"),
        sasl_mechanisms: get_env("KAFKA_SASL_MECHANISMS", "PLAIN"),
        sasl_username: get_env("KAFKA_SASL_USERNAME", ""),
        sasl_password: get_env("KAFKA_SASL_PASSWORD", ""),
    })
}

fn load_metrics_config() -> Result<MetricsConfig, ConfigError> {
    Ok(MetricsConfig {
        enabled: get_env("METRICS_ENABLED", "true") != "false",
        health_port: get_env_parsed("HEALTH_PORT", 8080, "u16")?,
    })
}

/// Load and validate configuration for the `producer` binary.
pub fn load_producer_config() -> Result<ProducerConfig, ConfigError> {
    load_dotenv();

    let polymarket = load_polymarket_config()?;

    let kafka = KafkaProducerConfig {
        bootstrap_servers: get_env_required("KAFKA_BOOTSTRAP_SERVERS")?,
        topic: get_env_required("KAFKA_TOPIC")?,
        topic_prefix: get_env("KAFKA_TOPIC_PREFIX", ""),
        security: load_kafka_security()?,
    };

    let mongodb = MongoConfig {
        uri: get_env_required("MONGODB_URI")?,
        database: get_env_required("MONGODB_DATABASE")?,
        collection: get_env("MONGODB_COLLECTION", "polymarket_subscriptions"),
    };

    let poll_interval_seconds = get_env_parsed("POLL_INTERVAL_SECONDS", 30, "u64")?;
    let metrics = load_metrics_config()?;

    info!(
        base_url = %polymarket.base_url,
        topic = %kafka.full_topic(),
        poll_interval_seconds,
        "Producer configuration loaded"
    );

    Ok(ProducerConfig {
        polymarket,
        kafka,
        mongodb,
        poll_interval_seconds,
        metrics,
    })
}

/// Load and validate configuration for the `consumer` binary.
pub fn load_consumer_config() -> Result<ConsumerConfig, ConfigError> {
    load_dotenv();

    let kafka = KafkaConsumerConfig {
        bootstrap_servers: get_env_required("KAFKA_BOOTSTRAP_SERVERS")?,
        topic: get_env_required("KAFKA_TOPIC")?,
        group_id: get_env("KAFKA_GROUP_ID", "strategy-injestor"),
        security: load_kafka_security()?,
    };

    // Spec names no required env vars for the archive store; default to
    // the subscription store's MongoDB connection with a distinct
    // collection (see DESIGN.md).
    let archive = MongoConfig {
        uri: get_env_required("MONGODB_URI")?,
        database: get_env_required("MONGODB_DATABASE")?,
        collection: get_env("MONGODB_ARCHIVE_COLLECTION", "polymarket_archive"),
    };

    let poll_interval_ms = get_env_parsed("POLL_INTERVAL_MS", 1000, "u64")?;
    let metrics = load_metrics_config()?;

    info!(
        topic = %kafka.topic,
        group_id = %kafka.group_id,
        poll_interval_ms,
        "Consumer configuration loaded"
    );

    Ok(ConsumerConfig {
        kafka,
        archive,
        poll_interval_ms,
        metrics,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Environment variables are process-global; serialize tests that
    // mutate them so they don't race under the default test runner.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn missing_required_kafka_var_is_reported() {
        let _guard = ENV_LOCK.lock().unwrap();
        for var in [
            "KAFKA_BOOTSTRAP_SERVERS",
            "KAFKA_TOPIC",
            "MONGODB_URI",
            "MONGODB_DATABASE",
        ] {
            env::remove_var(var);
        }
        let result = load_producer_config();
        assert!(matches!(result, Err(ConfigError::MissingRequired(_))));
    }

    #[test]
    fn defaults_apply_when_optional_vars_unset() {
        let _guard = ENV_LOCK.lock().unwrap();
        env::set_var("KAFKA_BOOTSTRAP_SERVERS", "localhost:9092");
        env::set_var("KAFKA_TOPIC", "polymarket-events");
        env::set_var("MONGODB_URI", "mongodb://localhost:27017");
        env::set_var("MONGODB_DATABASE", "polymarket");
        env::remove_var("POLL_INTERVAL_SECONDS");

        let config = load_producer_config().unwrap();
        assert_eq!(config.poll_interval_seconds, 30);
        assert_eq!(
            config.polymarket.base_url,
            "https://gamma-api.polymarket.com"
        );

        for var in [
            "KAFKA_BOOTSTRAP_SERVERS",
            "KAFKA_TOPIC",
            "MONGODB_URI",
            "MONGODB_DATABASE",
        ] {
            env::remove_var(var);
        }
    }

    #[test]
    fn invalid_numeric_var_is_reported() {
        let _guard = ENV_LOCK.lock().unwrap();
        env::set_var("KAFKA_BOOTSTRAP_SERVERS", "localhost:9092");
        env::set_var("KAFKA_TOPIC", "polymarket-events");
        env::set_var("MONGODB_URI", "mongodb://localhost:27017");
        env::set_var("MONGODB_DATABASE", "polymarket");
        env::set_var("POLL_INTERVAL_SECONDS", "not-a-number");

        let result = load_producer_config();
        assert!(matches!(result, Err(ConfigError::Invalid { .. })));

        for var in [
            "KAFKA_BOOTSTRAP_SERVERS",
            "KAFKA_TOPIC",
            "MONGODB_URI",
            "MONGODB_DATABASE",
            "POLL_INTERVAL_SECONDS",
        ] {
            env::remove_var(var);
        }
    }
}
