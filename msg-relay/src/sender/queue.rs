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

//! Bounded per-sender queue drained by a fixed pool of worker tasks.

use crate::error::RelayError;
use crate::message::SenderMsg;
use crate::observability::{events, fields};
use crate::runtime::WorkerGroup;
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, info, warn, Level};

const COMPONENT: &str = "sender_queue";

/// Per-message transport callback run by the queue workers.
///
/// Errors are logged and counted by the queue and the message is dropped. Handlers should
/// report unusable metadata as [`RelayError::MalformedMessage`] and transport failures as
/// [`RelayError::DeliveryFailed`].
#[async_trait]
pub trait MessageHandler: Send + Sync + 'static {
    async fn handle(&self, worker: usize, msg: SenderMsg) -> Result<(), RelayError>;
}

/// Counters describing what happened to pushed messages.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct QueueStats {
    pub delivered: u64,
    pub failed: u64,
    pub rejected: u64,
}

#[derive(Default)]
struct QueueCounters {
    delivered: AtomicU64,
    failed: AtomicU64,
    rejected: AtomicU64,
}

/// Bounded FIFO shared by a sender's workers.
///
/// The write half sits behind a lock and is taken out on close, so a push that races with
/// [`SenderQueue::close`] either lands before the close (and is drained) or is rejected.
pub struct SenderQueue {
    name: String,
    tx: RwLock<Option<flume::Sender<SenderMsg>>>,
    rx: flume::Receiver<SenderMsg>,
    workers: WorkerGroup,
    counters: Arc<QueueCounters>,
}

impl SenderQueue {
    /// Creates an open queue. A zero capacity is raised to one.
    pub fn new(name: impl Into<String>, capacity: usize) -> Self {
        let name = name.into();
        let (tx, rx) = flume::bounded(capacity.max(1));
        Self {
            workers: WorkerGroup::new(format!("{name}-workers")),
            name,
            tx: RwLock::new(Some(tx)),
            rx,
            counters: Arc::new(QueueCounters::default()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Starts `count` workers, each taking messages off the queue and handing them to `handler`.
    ///
    /// Workers exit once the queue is closed and empty.
    pub fn spawn_workers<H: MessageHandler>(&self, count: usize, handler: Arc<H>) {
        for worker in 0..count {
            let rx = self.rx.clone();
            let handler = handler.clone();
            let counters = self.counters.clone();
            let name = self.name.clone();

            self.workers.spawn(async move {
                while let Ok(msg) = rx.recv_async().await {
                    Self::deliver(&name, worker, handler.as_ref(), &counters, msg).await;
                }
                info!(
                    event = events::SENDER_WORKER_EXIT,
                    component = COMPONENT,
                    sender = name.as_str(),
                    worker,
                    "sender worker exiting"
                );
            });
        }
    }

    async fn deliver<H: MessageHandler>(
        name: &str,
        worker: usize,
        handler: &H,
        counters: &QueueCounters,
        msg: SenderMsg,
    ) {
        let preview = tracing::enabled!(Level::DEBUG).then(|| {
            (
                fields::payload_preview(msg.data()),
                fields::format_options(&msg),
            )
        });

        match handler.handle(worker, msg).await {
            Ok(()) => {
                counters.delivered.fetch_add(1, Ordering::Relaxed);
            }
            Err(err) => {
                counters.failed.fetch_add(1, Ordering::Relaxed);
                let event = match err {
                    RelayError::MalformedMessage { .. } => events::SENDER_MESSAGE_MALFORMED,
                    _ => events::SENDER_DELIVERY_FAILED,
                };
                warn!(
                    event = event,
                    component = COMPONENT,
                    sender = name,
                    worker,
                    err = %err,
                    "dropping message"
                );
                if let Some((payload, options)) = preview {
                    debug!(
                        event = event,
                        component = COMPONENT,
                        sender = name,
                        worker,
                        payload = payload.as_str(),
                        options = options.as_str(),
                        "dropped message detail"
                    );
                }
            }
        }
    }

    /// Enqueues `msg`, waiting while the queue is full. Returns `false` if it was dropped
    /// because the queue is closed.
    pub async fn push(&self, msg: SenderMsg) -> bool {
        let tx = self
            .tx
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        let Some(tx) = tx else {
            self.reject(fields::REASON_QUEUE_CLOSED);
            return false;
        };
        if tx.send_async(msg).await.is_err() {
            self.reject(fields::REASON_CHANNEL_DISCONNECTED);
            return false;
        }
        true
    }

    fn reject(&self, reason: &'static str) {
        self.counters.rejected.fetch_add(1, Ordering::Relaxed);
        warn!(
            event = events::SENDER_PUSH_REJECTED,
            component = COMPONENT,
            sender = self.name.as_str(),
            reason,
            "push failed: queue closed"
        );
    }

    /// Stops accepting pushes. Already queued messages are still drained.
    pub fn close(&self) {
        let closed = self
            .tx
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if closed.is_some() {
            debug!(
                event = events::SENDER_QUEUE_CLOSED,
                component = COMPONENT,
                sender = self.name.as_str(),
                pending = self.rx.len(),
                "queue closed"
            );
        }
    }

    /// Closes the queue and waits until the workers have drained it and exited.
    pub async fn close_and_join(&self) {
        self.close();
        self.workers.join().await;
    }

    pub fn is_closed(&self) -> bool {
        self.tx
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }

    /// Messages waiting in the queue.
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    pub fn stats(&self) -> QueueStats {
        QueueStats {
            delivered: self.counters.delivered.load(Ordering::Relaxed),
            failed: self.counters.failed.load(Ordering::Relaxed),
            rejected: self.counters.rejected.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{MessageHandler, SenderQueue};
    use crate::error::RelayError;
    use crate::message::SenderMsg;
    use async_trait::async_trait;
    use bytes::Bytes;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<Bytes>>,
    }

    #[async_trait]
    impl MessageHandler for Recorder {
        async fn handle(&self, _worker: usize, msg: SenderMsg) -> Result<(), RelayError> {
            if msg.option_i64("dataid").is_none() {
                return Err(RelayError::MalformedMessage {
                    sender: msg.sender().to_string(),
                    reason: "missing dataid".to_string(),
                });
            }
            self.seen.lock().unwrap().push(msg.data().clone());
            Ok(())
        }
    }

    fn msg(payload: &'static str) -> SenderMsg {
        SenderMsg::new("test", payload).with_option("dataid", 1)
    }

    #[tokio::test]
    async fn single_worker_preserves_push_order() {
        let queue = SenderQueue::new("test", 8);
        let recorder = Arc::new(Recorder::default());
        queue.spawn_workers(1, recorder.clone());

        for payload in ["m1", "m2", "m3"] {
            assert!(queue.push(msg(payload)).await);
        }
        queue.close_and_join().await;

        let seen = recorder.seen.lock().unwrap().clone();
        assert_eq!(
            seen,
            vec![
                Bytes::from_static(b"m1"),
                Bytes::from_static(b"m2"),
                Bytes::from_static(b"m3")
            ]
        );
        assert_eq!(queue.stats().delivered, 3);
    }

    #[tokio::test]
    async fn push_after_close_is_rejected_without_growing_the_queue() {
        let queue = SenderQueue::new("test", 8);
        queue.spawn_workers(2, Arc::new(Recorder::default()));
        queue.close_and_join().await;

        assert!(!queue.push(msg("late")).await);
        assert!(queue.is_closed());
        assert!(queue.is_empty());
        assert_eq!(queue.stats().rejected, 1);
    }

    #[tokio::test]
    async fn close_drains_messages_queued_before_workers_start() {
        let queue = SenderQueue::new("test", 8);
        assert!(queue.push(msg("a")).await);
        assert!(queue.push(msg("b")).await);
        assert_eq!(queue.len(), 2);

        let recorder = Arc::new(Recorder::default());
        queue.spawn_workers(3, recorder.clone());
        tokio::time::timeout(Duration::from_secs(1), queue.close_and_join())
            .await
            .expect("workers drain and exit");

        assert_eq!(recorder.seen.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn handler_errors_drop_the_message_and_keep_the_worker_alive() {
        let queue = SenderQueue::new("test", 8);
        let recorder = Arc::new(Recorder::default());
        queue.spawn_workers(1, recorder.clone());

        assert!(queue.push(SenderMsg::new("test", "no-id")).await);
        assert!(queue.push(msg("ok")).await);
        queue.close_and_join().await;

        let stats = queue.stats();
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.delivered, 1);
        assert_eq!(
            recorder.seen.lock().unwrap().clone(),
            vec![Bytes::from_static(b"ok")]
        );
    }
}
