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

use msg_relay::RelayError;
use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_CONSUMER_GROUP: &str = "kafka_default_consumer_group";
const DEFAULT_WORKERS: usize = 3;
const DEFAULT_RETRY_BACKOFF_MS: u64 = 1000;

/// Partition assignment strategy of the consumer group.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Assignor {
    Sticky,
    RoundRobin,
    #[default]
    Range,
}

impl Assignor {
    /// Parses the configured name. Unknown names fall back to `range`.
    pub fn from_name(name: &str) -> Self {
        match name {
            "sticky" => Assignor::Sticky,
            "roundrobin" => Assignor::RoundRobin,
            _ => Assignor::Range,
        }
    }

    /// Value of librdkafka's `partition.assignment.strategy`.
    pub fn strategy(self) -> &'static str {
        match self {
            Assignor::Sticky => "cooperative-sticky",
            Assignor::RoundRobin => "roundrobin",
            Assignor::Range => "range",
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct KafkaConfig {
    pub addr: Vec<String>,
    pub username: String,
    pub password: String,
    pub version: String,
    pub kafka_consumer_group: String,
    pub kafka_oldest: bool,
    pub kafka_assignor: String,
    pub topics: Vec<String>,
    pub worker: i64,
    pub retry_backoff_ms: u64,
}

impl Default for KafkaConfig {
    fn default() -> Self {
        Self {
            addr: Vec::new(),
            username: String::new(),
            password: String::new(),
            version: String::new(),
            kafka_consumer_group: DEFAULT_CONSUMER_GROUP.to_string(),
            kafka_oldest: false,
            kafka_assignor: String::new(),
            topics: Vec::new(),
            worker: DEFAULT_WORKERS as i64,
            retry_backoff_ms: DEFAULT_RETRY_BACKOFF_MS,
        }
    }
}

impl KafkaConfig {
    pub fn validate(&self) -> Result<(), RelayError> {
        if self.addr.is_empty() {
            return Err(RelayError::InvalidOption {
                option: "addr",
                reason: "at least one broker address is required".to_string(),
            });
        }
        if self.topics.is_empty() {
            return Err(RelayError::InvalidOption {
                option: "topics",
                reason: "at least one topic is required".to_string(),
            });
        }
        Ok(())
    }

    /// Consumer workers to start; non-positive values mean the default.
    pub fn worker_count(&self) -> usize {
        usize::try_from(self.worker)
            .ok()
            .filter(|count| *count > 0)
            .unwrap_or(DEFAULT_WORKERS)
    }

    pub fn consumer_group(&self) -> &str {
        if self.kafka_consumer_group.is_empty() {
            DEFAULT_CONSUMER_GROUP
        } else {
            &self.kafka_consumer_group
        }
    }

    pub fn assignor(&self) -> Assignor {
        Assignor::from_name(&self.kafka_assignor)
    }

    /// SASL PLAIN is only enabled when both credentials are present.
    pub fn uses_sasl(&self) -> bool {
        !self.username.is_empty() && !self.password.is_empty()
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::{Assignor, KafkaConfig, DEFAULT_CONSUMER_GROUP};
    use msg_relay::BackendConfig;
    use serde_json::json;

    #[test]
    fn decode_applies_defaults_and_ignores_unknown_keys() {
        let config: KafkaConfig = BackendConfig::new()
            .with("addr", json!(["broker-1:9092", "broker-2:9092"]))
            .with("topics", json!(["alerts"]))
            .with("unrelated", json!(true))
            .decode()
            .unwrap();

        assert_eq!(config.addr.len(), 2);
        assert_eq!(config.consumer_group(), DEFAULT_CONSUMER_GROUP);
        assert_eq!(config.worker_count(), 3);
        assert_eq!(config.assignor(), Assignor::Range);
        assert!(!config.uses_sasl());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn non_positive_worker_falls_back_to_default() {
        let config = KafkaConfig {
            worker: -2,
            ..KafkaConfig::default()
        };
        assert_eq!(config.worker_count(), 3);

        let config = KafkaConfig {
            worker: 8,
            ..KafkaConfig::default()
        };
        assert_eq!(config.worker_count(), 8);
    }

    #[test]
    fn assignor_names_map_to_strategies() {
        assert_eq!(Assignor::from_name("sticky").strategy(), "cooperative-sticky");
        assert_eq!(Assignor::from_name("roundrobin").strategy(), "roundrobin");
        assert_eq!(Assignor::from_name("bogus"), Assignor::Range);
    }

    #[test]
    fn validate_requires_brokers_and_topics() {
        let err = KafkaConfig::default().validate().unwrap_err();
        assert!(err.to_string().contains("addr"));

        let config = KafkaConfig {
            addr: vec!["localhost:9092".to_string()],
            ..KafkaConfig::default()
        };
        assert!(config.validate().unwrap_err().to_string().contains("topics"));
    }
}
