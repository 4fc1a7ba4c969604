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

use async_trait::async_trait;
use bytes::Bytes;
use msg_relay::{BackendConfig, BoxError, RelayError, SourceInstance, SourceRegistry, WorkerGroup};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Shared view of what every instance built by one mock factory has done.
#[derive(Clone, Default)]
pub struct SourceProbe {
    emitted: Arc<AtomicUsize>,
    runs: Arc<AtomicUsize>,
    stopped: Arc<AtomicBool>,
}

impl SourceProbe {
    /// Payloads accepted by the output channel so far.
    pub fn emitted(&self) -> usize {
        self.emitted.load(Ordering::SeqCst)
    }

    pub fn runs(&self) -> usize {
        self.runs.load(Ordering::SeqCst)
    }

    pub fn stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

/// Emits a fixed list of payloads, in order, then idles until stopped.
pub struct MockSource {
    name: String,
    script: Vec<Bytes>,
    fail_run: bool,
    probe: SourceProbe,
    workers: WorkerGroup,
}

impl MockSource {
    pub fn new(name: impl Into<String>, script: Vec<Bytes>, probe: SourceProbe) -> Self {
        let name = name.into();
        Self {
            workers: WorkerGroup::new(format!("{name}-mock")),
            name,
            script,
            fail_run: false,
            probe,
        }
    }

    /// Makes `run` fail instead of starting the emitter.
    pub fn failing_run(mut self) -> Self {
        self.fail_run = true;
        self
    }
}

#[async_trait]
impl SourceInstance for MockSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&mut self, output: flume::Sender<Bytes>) -> Result<(), BoxError> {
        self.probe.runs.fetch_add(1, Ordering::SeqCst);
        if self.fail_run {
            return Err(format!("{} refused to run", self.name).into());
        }

        let script = self.script.clone();
        let emitted = self.probe.emitted.clone();
        let token = self.workers.token();
        let name = self.name.clone();
        self.workers.spawn(async move {
            for payload in script {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => return,
                    sent = output.send_async(payload) => {
                        if sent.is_err() {
                            return;
                        }
                        emitted.fetch_add(1, Ordering::SeqCst);
                    }
                }
            }
            debug!(source = name.as_str(), "script exhausted");
            token.cancelled().await;
        });
        Ok(())
    }

    async fn stop(&mut self) {
        self.workers.cancel_and_join().await;
        self.probe.stopped.store(true, Ordering::SeqCst);
    }
}

/// Registers a factory under `name` whose instances replay `script`.
pub fn register_mock_source(
    registry: &mut SourceRegistry,
    name: &str,
    script: Vec<Bytes>,
) -> Result<SourceProbe, RelayError> {
    let probe = SourceProbe::default();
    let shared = probe.clone();
    let instance_name = name.to_string();
    registry.register_source(name, move |_config: &BackendConfig| {
        Ok(Box::new(MockSource::new(
            instance_name.clone(),
            script.clone(),
            shared.clone(),
        )) as Box<dyn SourceInstance>)
    })?;
    Ok(probe)
}
