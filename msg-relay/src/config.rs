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

//! Untyped per-backend configuration and the relay-wide tuning options.

use crate::error::RelayError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const DEFAULT_CHANNEL_CAPACITY: usize = 500;
pub const DEFAULT_DISPATCH_WORKERS: usize = 3;

/// String-keyed configuration for one backend, decoded on demand by the backend itself.
///
/// Backends decode into their own struct with [`BackendConfig::decode`]. Those structs are
/// expected to carry `#[serde(default)]` so unknown keys are ignored and missing keys fall back
/// to defaults; only a value of the wrong shape is an error.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(transparent)]
pub struct BackendConfig(Map<String, Value>);

impl BackendConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(Value::Object(self.0.clone()))
    }
}

impl From<Map<String, Value>> for BackendConfig {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl FromIterator<(String, Value)> for BackendConfig {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Buffer and pool sizes used by the services.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct RelayOptions {
    /// Capacity of the shared source output channel and of the sender inbound channel.
    pub channel_capacity: usize,
    /// Number of dispatch tasks routing inbound messages to sender instances.
    pub dispatch_workers: usize,
}

impl Default for RelayOptions {
    fn default() -> Self {
        Self {
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            dispatch_workers: DEFAULT_DISPATCH_WORKERS,
        }
    }
}

impl RelayOptions {
    pub fn validate(&self) -> Result<(), RelayError> {
        if self.channel_capacity == 0 {
            return Err(RelayError::InvalidOption {
                option: "channel_capacity",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.dispatch_workers == 0 {
            return Err(RelayError::InvalidOption {
                option: "dispatch_workers",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{BackendConfig, RelayOptions};
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Default, Deserialize, PartialEq)]
    #[serde(default)]
    struct SampleConfig {
        worker: usize,
        topics: Vec<String>,
        end_point: String,
    }

    #[test]
    fn decode_ignores_unknown_keys_and_defaults_missing_ones() {
        let config = BackendConfig::new()
            .with("worker", 5)
            .with("unrelated", "value");

        let decoded: SampleConfig = config.decode().expect("lenient decode");
        assert_eq!(
            decoded,
            SampleConfig {
                worker: 5,
                topics: Vec::new(),
                end_point: String::new(),
            }
        );
    }

    #[test]
    fn decode_fails_on_structurally_incompatible_value() {
        let config = BackendConfig::new().with("topics", "not-a-list");

        let err = config.decode::<SampleConfig>().unwrap_err();
        assert!(err.to_string().contains("invalid type"));
    }

    #[test]
    fn backend_config_deserializes_from_plain_object() {
        let config: BackendConfig =
            serde_json::from_value(json!({"end_point": "/tmp/agent.sock"})).unwrap();
        assert_eq!(config.get("end_point"), Some(&json!("/tmp/agent.sock")));
    }

    #[test]
    fn relay_options_default_and_validation() {
        let options = RelayOptions::default();
        assert_eq!(options.channel_capacity, 500);
        assert_eq!(options.dispatch_workers, 3);
        assert!(options.validate().is_ok());

        let zero_capacity = RelayOptions {
            channel_capacity: 0,
            ..RelayOptions::default()
        };
        assert!(zero_capacity.validate().is_err());

        let partial: RelayOptions = serde_json::from_value(json!({"dispatch_workers": 8})).unwrap();
        assert_eq!(partial.channel_capacity, 500);
        assert_eq!(partial.dispatch_workers, 8);
    }
}
