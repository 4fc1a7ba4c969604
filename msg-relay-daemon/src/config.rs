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

use anyhow::{bail, Context};
use msg_relay::{BackendConfig, Registry, RelayOptions, SenderRegistry, SourceRegistry};
use msg_relay_backends::backend_feature;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;

#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub(crate) pid_file_path: Option<String>,
    #[serde(default)]
    pub(crate) logger_config: LoggerConfig,
    #[serde(default)]
    pub(crate) relay: RelayOptions,
    pub(crate) source_config: HashMap<String, BackendConfig>,
    pub(crate) sender_config: HashMap<String, BackendConfig>,
    pub(crate) forward: ForwardConfig,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct LoggerConfig {
    #[serde(default)]
    pub(crate) level: String,
    #[serde(default)]
    pub(crate) output_path: Option<String>,
}

/// Sender tag and options attached to every payload taken from the sources.
#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct ForwardConfig {
    pub(crate) sender: String,
    #[serde(default)]
    pub(crate) options: HashMap<String, Value>,
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Unable to read config file {}", path.display()))?;
        Self::parse(&contents)
            .with_context(|| format!("Unable to parse config file {}", path.display()))
    }

    pub fn parse(contents: &str) -> anyhow::Result<Self> {
        let config: Config = json5::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if !self.sender_config.contains_key(&self.forward.sender) {
            bail!(
                "forward.sender {:?} has no entry in sender_config",
                self.forward.sender
            );
        }
        self.relay.validate()?;
        Ok(())
    }

    /// Rejects configured backends that this build does not provide.
    pub fn check_backends(
        &self,
        sources: &SourceRegistry,
        senders: &SenderRegistry,
    ) -> anyhow::Result<()> {
        let mut missing = unknown_backends("source", &self.source_config, sources);
        missing.extend(unknown_backends("sender", &self.sender_config, senders));
        if !missing.is_empty() {
            bail!("{}", missing.join("; "));
        }
        Ok(())
    }
}

fn unknown_backends<F>(
    kind: &str,
    configs: &HashMap<String, BackendConfig>,
    registry: &Registry<F>,
) -> Vec<String> {
    let mut names: Vec<&String> = configs
        .keys()
        .filter(|name| !registry.contains(name))
        .collect();
    names.sort();
    names
        .into_iter()
        .map(|name| match backend_feature(name) {
            Some(feature) => format!("{kind} {name:?} needs the {feature:?} cargo feature"),
            None => format!("{kind} {name:?} has no backend in this build"),
        })
        .collect()
}
