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

//! Sender side of the relay: the backend contract, the reusable queue + worker pool, and the
//! service that routes inbound messages to instances by name.

mod queue;
mod service;

pub use queue::{MessageHandler, QueueStats, SenderQueue};
pub use service::{DispatchStats, SenderService};

use crate::error::BoxError;
use crate::message::SenderMsg;
use async_trait::async_trait;

/// A running backend that forwards messages to an outbound transport.
///
/// `push` and `stop` take `&self` because several dispatch tasks share one instance.
#[async_trait]
pub trait SenderInstance: Send + Sync {
    fn name(&self) -> &str;

    /// Opens the outbound transport and starts the worker pool draining the internal queue.
    async fn run(&mut self) -> Result<(), BoxError>;

    /// Enqueues a message, waiting while the queue is full. Returns whether it was accepted.
    ///
    /// Once the instance is stopping the message is dropped and logged and `false` is returned;
    /// this never panics and never grows the queue.
    async fn push(&self, msg: SenderMsg) -> bool;

    /// Closes the queue, waits for the workers to drain it, then releases the transport.
    async fn stop(&self);
}
