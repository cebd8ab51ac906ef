//! Typed error kinds for the pipeline's external-boundary failures.
//!
//! Per spec §7, only transport-level failures ever propagate as errors;
//! parse failures, publish failures, and archive-write failures are
//! logged and swallowed at their own boundaries instead of surfaced here.

use thiserror::Error;

/// Errors raised loading and validating configuration from environment
/// variables. Fatal at startup — the process exits nonzero.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("required environment variable {0:?} is not set")]
    MissingRequired(&'static str),
    #[error("environment variable {name:?}={value:?} is not a valid {expected}")]
    Invalid {
        name: &'static str,
        value: String,
        expected: &'static str,
    },
}

/// Errors from the Market Data Source adapter.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Network/timeout/5xx after exhausting retries. The orchestrator
    /// treats this as "no snapshots this tick".
    #[error("transient upstream failure after retries: {0}")]
    Transient(String),
    /// 4xx response or malformed top-level body. Surfaced after one
    /// attempt, no retry.
    #[error("terminal upstream failure: {0}")]
    Terminal(String),
}

/// Errors from the Subscription Store adapter. Swallowed by the
/// orchestrator, which proceeds as "no active subscriptions this tick".
#[derive(Debug, Error)]
pub enum SubscriptionStoreError {
    #[error("subscription store transport error: {0}")]
    Transport(String),
}

/// Errors from the archive adapter. Logged; the consumer still commits
/// the Kafka offset, since re-delivery of the same event is idempotent.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("archive write failed for key {key:?}: {source}")]
    Write {
        key: String,
        #[source]
        source: anyhow::Error,
    },
}
