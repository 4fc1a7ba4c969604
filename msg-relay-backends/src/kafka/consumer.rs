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
use msg_relay::BoxError;
use tokio_util::sync::CancellationToken;

/// Outcome of one consume session that did not end through cancellation.
#[derive(Debug, thiserror::Error)]
pub enum ConsumeError {
    /// The group or the output channel is gone. The calling worker must exit.
    #[error("consumer group closed")]
    Closed,

    /// A broker-side failure. The worker logs it and consumes again.
    #[error("consume failed: {0}")]
    Transient(#[source] BoxError),
}

/// A consumer-group membership shared by all workers of one source.
#[async_trait]
pub trait GroupConsumer: Send + Sync + 'static {
    /// Forwards record payloads into `output` until `cancel` fires or the session ends.
    ///
    /// Blocks on a full `output`. Returns `Ok(())` once cancelled or when the group session
    /// ends normally, for example on rebalance.
    async fn consume(
        &self,
        cancel: &CancellationToken,
        output: &flume::Sender<Bytes>,
    ) -> Result<(), ConsumeError>;

    /// Leaves the group and releases the broker connection.
    async fn close(&self) -> Result<(), BoxError>;
}
