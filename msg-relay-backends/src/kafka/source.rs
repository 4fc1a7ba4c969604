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
use async_trait::async_trait;
use bytes::Bytes;
use msg_relay::observability::{events, fields};
use msg_relay::{BoxError, SourceInstance, WorkerGroup};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

const COMPONENT: &str = "kafka_source";

/// Source that runs a fixed number of workers against one consumer group.
///
/// A worker whose group is closed exits on its own; the others keep consuming. Broker errors
/// are logged and the worker consumes again after `retry_backoff_ms`, unless the source is
/// stopping.
pub struct KafkaSource<C> {
    name: String,
    consumer: Arc<C>,
    worker_count: usize,
    retry_backoff: Duration,
    workers: WorkerGroup,
}

impl<C: GroupConsumer> KafkaSource<C> {
    pub fn new(name: impl Into<String>, consumer: C, config: &KafkaConfig) -> Self {
        let name = name.into();
        Self {
            workers: WorkerGroup::new(format!("{name}-consumers")),
            name,
            consumer: Arc::new(consumer),
            worker_count: config.worker_count(),
            retry_backoff: config.retry_backoff(),
        }
    }

    /// Workers that have not exited yet.
    pub fn active_workers(&self) -> usize {
        self.workers.active()
    }
}

#[async_trait]
impl<C: GroupConsumer> SourceInstance for KafkaSource<C> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&mut self, output: flume::Sender<Bytes>) -> Result<(), BoxError> {
        for index in 0..self.worker_count {
            self.workers.spawn(consume_loop(
                self.name.clone(),
                index,
                self.consumer.clone(),
                self.workers.token(),
                output.clone(),
                self.retry_backoff,
            ));
        }
        info!(
            event = events::BACKEND_STARTED,
            component = COMPONENT,
            source = self.name.as_str(),
            workers = self.worker_count,
            "kafka consumers started"
        );
        Ok(())
    }

    async fn stop(&mut self) {
        self.workers.cancel_and_join().await;
        if let Err(err) = self.consumer.close().await {
            error!(
                event = events::TRANSPORT_CLOSE_FAILED,
                component = COMPONENT,
                source = self.name.as_str(),
                err = %err,
                "failed to close kafka consumer group"
            );
        }
    }
}

async fn consume_loop<C: GroupConsumer>(
    name: String,
    index: usize,
    consumer: Arc<C>,
    token: CancellationToken,
    output: flume::Sender<Bytes>,
    retry_backoff: Duration,
) {
    loop {
        match consumer.consume(&token, &output).await {
            Ok(()) => {}
            Err(ConsumeError::Closed) => {
                error!(
                    event = events::SOURCE_WORKER_FATAL,
                    component = COMPONENT,
                    source = name.as_str(),
                    worker = index,
                    "consumer group closed, worker exiting"
                );
                return;
            }
            Err(ConsumeError::Transient(err)) => {
                warn!(
                    event = events::SOURCE_WORKER_TRANSIENT,
                    component = COMPONENT,
                    source = name.as_str(),
                    worker = index,
                    err = %err,
                    "failed to consume from kafka"
                );
                tokio::select! {
                    _ = token.cancelled() => {}
                    _ = tokio::time::sleep(retry_backoff) => {}
                }
            }
        }

        if token.is_cancelled() {
            info!(
                event = events::SOURCE_WORKER_CANCELLED,
                component = COMPONENT,
                source = name.as_str(),
                worker = index,
                reason = fields::REASON_CANCELLED,
                "kafka worker exiting"
            );
            return;
        }
    }
}
