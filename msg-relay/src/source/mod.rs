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

//! Source side of the relay: the backend contract and the service that owns instances.

mod service;

pub use service::SourceService;

use crate::error::BoxError;
use async_trait::async_trait;
use bytes::Bytes;

/// A running backend that pulls records from somewhere and emits raw payloads.
///
/// An instance lives for exactly one `run`/`stop` cycle and is then discarded.
#[async_trait]
pub trait SourceInstance: Send {
    /// Stable identifier, equal to the registry key the instance was built from.
    fn name(&self) -> &str;

    /// Starts the background workers and returns without waiting for them.
    ///
    /// Workers write payloads into `output` and block while it is full, which throttles
    /// consumption instead of dropping data.
    async fn run(&mut self, output: flume::Sender<Bytes>) -> Result<(), BoxError>;

    /// Signals every worker to stop, waits for all of them, then releases the upstream
    /// connection. Called once, after a successful `run`.
    async fn stop(&mut self);
}
