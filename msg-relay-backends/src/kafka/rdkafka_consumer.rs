/********************************************************************************
 * Copyright (c) 2026 Contributors to the Eclipse Foundation
 *
 * See the NOTICE file(s) distributed with this work for additional
 * information regarding copyright ownership.
 *
 * This program and the accompanying materials are made available under the
 * terms of the Apache License Version 2.0 which is available at
 * https://www.apache.org/licenses/LICENSE-2.0
 *
 * SPDX-License-Identifier: Apache-2.0
 ********************************************************************************/

use super::config::KafkaConfig;
use super::consumer::{ConsumeError, GroupConsumer};
use super::source::KafkaSource;
use super::KAFKA_SOURCE_NAME;
use async_trait::async_trait;
use bytes::Bytes;
use msg_relay::observability::events;
use msg_relay::{BackendConfig, BoxError, RelayError, SourceInstance, SourceRegistry};
use rdkafka::config::ClientConfig;
use rdkafka::consumer::{Consumer, StreamConsumer};
use rdkafka::error::KafkaError;
use rdkafka::message::BorrowedMessage;
use rdkafka::Message;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Consumer-group membership backed by librdkafka.
pub struct RdKafkaGroupConsumer {
    consumer: StreamConsumer,
    closed: AtomicBool,
}

impl RdKafkaGroupConsumer {
    /// Creates the consumer and subscribes it to the configured topics.
    pub fn new(config: &KafkaConfig) -> Result<Self, KafkaError> {
        let consumer: StreamConsumer = client_config(config).create()?;
        let topics: Vec<&str> = config.topics.iter().map(String::as_str).collect();
        consumer.subscribe(&topics)?;

        info!(
            event = events::TRANSPORT_CONNECTED,
            brokers = config.addr.join(",").as_str(),
            group = config.consumer_group(),
            topics = ?config.topics,
            "kafka consumer subscribed"
        );
        Ok(Self {
            consumer,
            closed: AtomicBool::new(false),
        })
    }

    /// Marks `message` for the next auto-commit.
    fn store_offset(&self, message: &BorrowedMessage<'_>) {
        if let Err(err) = self.consumer.store_offset_from_message(message) {
            warn!(
                event = events::SOURCE_OFFSET_STORE_FAILED,
                topic = message.topic(),
                partition = message.partition(),
                offset = message.offset(),
                err = %err,
                "unable to store kafka offset"
            );
        }
    }
}

fn client_config(config: &KafkaConfig) -> ClientConfig {
    let mut client = ClientConfig::new();
    client
        .set("bootstrap.servers", config.addr.join(","))
        .set("group.id", config.consumer_group())
        .set("enable.auto.commit", "true")
        .set("enable.auto.offset.store", "false")
        .set(
            "auto.offset.reset",
            if config.kafka_oldest {
                "earliest"
            } else {
                "latest"
            },
        )
        .set("partition.assignment.strategy", config.assignor().strategy());

    if !config.version.is_empty() {
        client.set("broker.version.fallback", config.version.as_str());
    }
    if config.uses_sasl() {
        client
            .set("security.protocol", "SASL_PLAINTEXT")
            .set("sasl.mechanisms", "PLAIN")
            .set("sasl.username", config.username.as_str())
            .set("sasl.password", config.password.as_str());
    }
    client
}

#[async_trait]
impl GroupConsumer for RdKafkaGroupConsumer {
    async fn consume(
        &self,
        cancel: &CancellationToken,
        output: &flume::Sender<Bytes>,
    ) -> Result<(), ConsumeError> {
        loop {
            if self.closed.load(Ordering::Acquire) {
                return Err(ConsumeError::Closed);
            }

            let message = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Ok(()),
                received = self.consumer.recv() => {
                    received.map_err(|err| ConsumeError::Transient(Box::new(err)))?
                }
            };

            let Some(payload) = message.payload().map(Bytes::copy_from_slice) else {
                debug!("skipping kafka record without payload");
                self.store_offset(&message);
                continue;
            };
            // Only records handed to the relay are committed; one cut off here is redelivered.
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Ok(()),
                sent = output.send_async(payload) => {
                    if sent.is_err() {
                        return Err(ConsumeError::Closed);
                    }
                }
            }
            self.store_offset(&message);
        }
    }

    async fn close(&self) -> Result<(), BoxError> {
        self.closed.store(true, Ordering::Release);
        self.consumer.unsubscribe();
        Ok(())
    }
}

/// Registers the librdkafka-backed source under `"kafka"`.
pub fn register_kafka_source(registry: &mut SourceRegistry) -> Result<(), RelayError> {
    registry.register_source(KAFKA_SOURCE_NAME, |config: &BackendConfig| {
        let config: KafkaConfig = config.decode()?;
        config.validate()?;
        let consumer = RdKafkaGroupConsumer::new(&config)?;
        Ok(Box::new(KafkaSource::new(KAFKA_SOURCE_NAME, consumer, &config))
            as Box<dyn SourceInstance>)
    })
}

#[cfg(test)]
mod tests {
    use super::client_config;
    use crate::kafka::KafkaConfig;

    #[test]
    fn client_config_carries_group_offsets_and_credentials() {
        let config = KafkaConfig {
            addr: vec!["b1:9092".to_string(), "b2:9092".to_string()],
            username: "relay".to_string(),
            password: "secret".to_string(),
            version: "2.8.0".to_string(),
            kafka_oldest: true,
            kafka_assignor: "roundrobin".to_string(),
            topics: vec!["alerts".to_string()],
            ..KafkaConfig::default()
        };
        let client = client_config(&config);

        assert_eq!(client.get("bootstrap.servers"), Some("b1:9092,b2:9092"));
        assert_eq!(client.get("group.id"), Some("kafka_default_consumer_group"));
        assert_eq!(client.get("enable.auto.offset.store"), Some("false"));
        assert_eq!(client.get("auto.offset.reset"), Some("earliest"));
        assert_eq!(client.get("partition.assignment.strategy"), Some("roundrobin"));
        assert_eq!(client.get("broker.version.fallback"), Some("2.8.0"));
        assert_eq!(client.get("sasl.mechanisms"), Some("PLAIN"));
    }

    #[test]
    fn sasl_needs_both_credentials() {
        let config = KafkaConfig {
            addr: vec!["b1:9092".to_string()],
            username: "relay".to_string(),
            ..KafkaConfig::default()
        };
        assert_eq!(client_config(&config).get("security.protocol"), None);
    }
}
