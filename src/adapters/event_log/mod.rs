//! Event Log Adapter — rdkafka-backed publisher and consumer.

mod consumer;
mod producer;

pub use consumer::KafkaEventConsumer;
pub use producer::KafkaEventPublisher;
