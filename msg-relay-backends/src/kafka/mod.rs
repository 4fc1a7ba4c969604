//! Kafka-protocol consumer-group source.

mod config;
mod consumer;
#[cfg(feature = "kafka")]
mod rdkafka_consumer;
mod source;

pub use config::{Assignor, KafkaConfig, DEFAULT_CONSUMER_GROUP};
pub use consumer::{ConsumeError, GroupConsumer};
#[cfg(feature = "kafka")]
pub use rdkafka_consumer::{register_kafka_source, RdKafkaGroupConsumer};
pub use source::KafkaSource;

/// Registry key of the Kafka source.
pub const KAFKA_SOURCE_NAME: &str = "kafka";
