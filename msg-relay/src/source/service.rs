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

use crate::config::{BackendConfig, RelayOptions};
use crate::error::{BackendKind, RelayError, StartupErrors};
use crate::lifecycle::ServiceState;
use crate::observability::events;
use crate::registry::SourceRegistry;
use crate::source::SourceInstance;
use bytes::Bytes;
use futures::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info, warn};

const COMPONENT: &str = "source_service";

/// Owns the configured source instances and the single channel they all write into.
///
/// Payloads leave the service through [`SourceService::chan`]. The channel is closed by
/// [`SourceService::stop`] once every instance has stopped.
pub struct SourceService {
    registry: Arc<SourceRegistry>,
    configs: HashMap<String, BackendConfig>,
    output_tx: Option<flume::Sender<Bytes>>,
    output_rx: flume::Receiver<Bytes>,
    instances: HashMap<String, Box<dyn SourceInstance>>,
    state: ServiceState,
}

impl SourceService {
    pub fn new(
        registry: Arc<SourceRegistry>,
        configs: HashMap<String, BackendConfig>,
    ) -> Result<Self, RelayError> {
        Self::with_options(registry, configs, RelayOptions::default())
    }

    pub fn with_options(
        registry: Arc<SourceRegistry>,
        configs: HashMap<String, BackendConfig>,
        options: RelayOptions,
    ) -> Result<Self, RelayError> {
        if configs.is_empty() {
            return Err(RelayError::ConfigurationMissing {
                service: BackendKind::Source,
            });
        }
        options.validate()?;

        let (output_tx, output_rx) = flume::bounded(options.channel_capacity);
        Ok(Self {
            registry,
            configs,
            output_tx: Some(output_tx),
            output_rx,
            instances: HashMap::new(),
            state: ServiceState::Created,
        })
    }

    /// Builds and runs every configured source.
    ///
    /// A failing backend does not stop the others: each failure is collected and returned as
    /// one [`RelayError::Startup`] while the instances that did start keep running. The service
    /// is `Running` afterwards either way and must be stopped with [`SourceService::stop`].
    pub async fn start(&mut self) -> Result<(), RelayError> {
        if self.state != ServiceState::Created {
            return Err(RelayError::InvalidState {
                service: BackendKind::Source,
                operation: "start",
                state: self.state,
            });
        }
        let Some(output_tx) = self.output_tx.clone() else {
            return Err(RelayError::InvalidState {
                service: BackendKind::Source,
                operation: "start",
                state: self.state,
            });
        };
        self.state = ServiceState::Starting;
        info!(
            event = events::SERVICE_START,
            component = COMPONENT,
            configured = self.configs.len(),
            "starting sources"
        );

        let mut names: Vec<&String> = self.configs.keys().collect();
        names.sort();

        let mut errors = Vec::new();
        for name in names {
            let config = &self.configs[name];
            let Some(factory) = self.registry.lookup(name) else {
                warn!(
                    event = events::BACKEND_NOT_REGISTERED,
                    component = COMPONENT,
                    backend = name.as_str(),
                    "source not registered"
                );
                errors.push(RelayError::BackendNotRegistered {
                    kind: BackendKind::Source,
                    name: name.clone(),
                });
                continue;
            };

            let mut instance = match factory(config) {
                Ok(instance) => instance,
                Err(err) => {
                    error!(
                        event = events::BACKEND_CONSTRUCTION_FAILED,
                        component = COMPONENT,
                        backend = name.as_str(),
                        err = %err,
                        "failed to create source instance"
                    );
                    errors.push(RelayError::BackendConstructionFailed {
                        kind: BackendKind::Source,
                        name: name.clone(),
                        source: err,
                    });
                    continue;
                }
            };

            if let Err(err) = instance.run(output_tx.clone()).await {
                error!(
                    event = events::BACKEND_START_FAILED,
                    component = COMPONENT,
                    backend = name.as_str(),
                    err = %err,
                    "failed to run source"
                );
                errors.push(RelayError::BackendStartFailed {
                    kind: BackendKind::Source,
                    name: name.clone(),
                    source: err,
                });
                continue;
            }

            info!(
                event = events::BACKEND_STARTED,
                component = COMPONENT,
                backend = name.as_str(),
                instance = instance.name(),
                "source running"
            );
            self.instances.insert(name.clone(), instance);
        }

        self.state = ServiceState::Running;

        if !errors.is_empty() {
            warn!(
                event = events::SERVICE_START_PARTIAL,
                component = COMPONENT,
                running = self.instances.len(),
                failed = errors.len(),
                "sources started with failures"
            );
            return Err(RelayError::Startup(StartupErrors::new(
                BackendKind::Source,
                errors,
            )));
        }
        if self.instances.is_empty() {
            return Err(RelayError::NoInstanceStarted {
                service: BackendKind::Source,
            });
        }

        info!(
            event = events::SERVICE_START_OK,
            component = COMPONENT,
            running = self.instances.len(),
            "sources started"
        );
        Ok(())
    }

    /// Stops every running instance, then closes the output channel.
    ///
    /// Only acts on a `Running` service; any other call is logged and ignored.
    pub async fn stop(&mut self) {
        if self.state != ServiceState::Running {
            warn!(
                event = events::SERVICE_STOP_IGNORED,
                component = COMPONENT,
                state = %self.state,
                "stop ignored"
            );
            return;
        }
        self.state = ServiceState::Stopping;
        info!(
            event = events::SERVICE_STOP,
            component = COMPONENT,
            running = self.instances.len(),
            "stopping sources"
        );

        join_all(self.instances.iter_mut().map(|(name, instance)| async move {
            instance.stop().await;
            info!(
                event = events::BACKEND_STOPPED,
                component = COMPONENT,
                backend = name.as_str(),
                "source stopped"
            );
        }))
        .await;
        self.instances.clear();

        // Receivers see the end of the stream once this last sender is gone.
        self.output_tx.take();
        self.state = ServiceState::Stopped;
        info!(
            event = events::SERVICE_STOP_OK,
            component = COMPONENT,
            "sources stopped"
        );
    }

    /// Read side of the shared output channel.
    pub fn chan(&self) -> flume::Receiver<Bytes> {
        self.output_rx.clone()
    }

    pub fn state(&self) -> ServiceState {
        self.state
    }

    /// Names of the instances currently running, sorted.
    pub fn instance_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.instances.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }
}
