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
use msg_relay::{
    BackendConfig, BoxError, MessageHandler, QueueStats, RelayError, SenderInstance, SenderMsg,
    SenderQueue, SenderRegistry,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

const MOCK_QUEUE_CAPACITY: usize = 64;

/// Records every message a mock sender delivered, across all of its instances.
#[derive(Clone, Default)]
pub struct SenderProbe {
    delivered: Arc<Mutex<Vec<SenderMsg>>>,
    stopped: Arc<AtomicBool>,
}

impl SenderProbe {
    pub fn delivered(&self) -> Vec<SenderMsg> {
        self.delivered
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn delivered_count(&self) -> usize {
        self.delivered
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MessageHandler for SenderProbe {
    async fn handle(&self, _worker: usize, msg: SenderMsg) -> Result<(), RelayError> {
        self.delivered
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(msg);
        Ok(())
    }
}

/// Queue-backed sender that stores what it delivers in a [`SenderProbe`].
pub struct MockSender {
    name: String,
    workers: usize,
    queue: SenderQueue,
    probe: SenderProbe,
}

impl MockSender {
    pub fn new(name: impl Into<String>, workers: usize, probe: SenderProbe) -> Self {
        let name = name.into();
        Self {
            queue: SenderQueue::new(name.clone(), MOCK_QUEUE_CAPACITY),
            name,
            workers,
            probe,
        }
    }

    pub fn queue_stats(&self) -> QueueStats {
        self.queue.stats()
    }
}

#[async_trait]
impl SenderInstance for MockSender {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&mut self) -> Result<(), BoxError> {
        self.queue.spawn_workers(self.workers, Arc::new(self.probe.clone()));
        Ok(())
    }

    async fn push(&self, msg: SenderMsg) -> bool {
        self.queue.push(msg).await
    }

    async fn stop(&self) {
        self.queue.close_and_join().await;
        self.probe.stopped.store(true, Ordering::SeqCst);
    }
}

/// Registers a single-worker mock sender under `name`, so delivery order equals push order.
pub fn register_mock_sender(
    registry: &mut SenderRegistry,
    name: &str,
) -> Result<SenderProbe, RelayError> {
    let probe = SenderProbe::default();
    let shared = probe.clone();
    let instance_name = name.to_string();
    registry.register_sender(name, move |_config: &BackendConfig| {
        Ok(Box::new(MockSender::new(instance_name.clone(), 1, shared.clone()))
            as Box<dyn SenderInstance>)
    })?;
    Ok(probe)
}
