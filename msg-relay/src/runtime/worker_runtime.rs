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

//! Runtime helper for spawning a fixed set of cooperating worker tasks.

use crate::observability::events;
use std::future::Future;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::debug;

/// A set of tasks sharing one cancellation signal and one join barrier.
///
/// Cancellation is cooperative: workers observe [`WorkerGroup::token`] at their own loop
/// boundaries, so in-flight calls complete before a worker exits.
pub struct WorkerGroup {
    label: String,
    token: CancellationToken,
    tracker: TaskTracker,
}

impl WorkerGroup {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            token: CancellationToken::new(),
            tracker: TaskTracker::new(),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Cancellation signal to hand to each worker.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn spawn<F>(&self, worker: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.tracker.spawn(worker);
    }

    /// Number of spawned workers that have not exited yet.
    pub fn active(&self) -> usize {
        self.tracker.len()
    }

    /// Waits until every spawned worker has exited, without signalling them.
    pub async fn join(&self) {
        self.tracker.close();
        self.tracker.wait().await;
        debug!(
            event = events::WORKER_GROUP_JOINED,
            group = self.label.as_str(),
            "all workers exited"
        );
    }

    /// Signals cancellation, then waits for every worker to exit.
    pub async fn cancel_and_join(&self) {
        self.token.cancel();
        self.join().await;
    }
}
