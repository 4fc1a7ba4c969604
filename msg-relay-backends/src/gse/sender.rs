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

use super::config::GseConfig;
use super::message::GseMessage;
use super::transport::GseTransport;
use super::GSE_SENDER_NAME;
use async_trait::async_trait;
use msg_relay::observability::fields;
use msg_relay::{
    BackendConfig, BoxError, MessageHandler, QueueStats, RelayError, SenderInstance, SenderMsg,
    SenderQueue, SenderRegistry,
};
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

/// Option carrying the agent data channel of a message.
pub const DATA_ID_OPTION: &str = "dataid";

/// Forwards each message to the agent data channel named by its `dataid` option.
pub struct GseSender {
    name: String,
    worker_count: usize,
    queue: SenderQueue,
    transport: Arc<dyn GseTransport>,
}

impl GseSender {
    /// Builds a sender over the agent's unix socket.
    #[cfg(unix)]
    pub fn new(config: &GseConfig) -> Self {
        let transport = super::transport::UnixSocketTransport::new(config);
        Self::with_transport(config, Arc::new(transport))
    }

    pub fn with_transport(config: &GseConfig, transport: Arc<dyn GseTransport>) -> Self {
        Self {
            name: GSE_SENDER_NAME.to_string(),
            worker_count: config.worker_count(),
            queue: SenderQueue::new(GSE_SENDER_NAME, config.buffer_size()),
            transport,
        }
    }

    pub fn queue_stats(&self) -> QueueStats {
        self.queue.stats()
    }
}

struct GseHandler {
    sender: String,
    transport: Arc<dyn GseTransport>,
}

fn data_id(sender: &str, msg: &SenderMsg) -> Result<u32, RelayError> {
    let malformed = |reason: String| RelayError::MalformedMessage {
        sender: sender.to_string(),
        reason,
    };
    match msg.option(DATA_ID_OPTION) {
        None | Some(Value::Null) => Err(malformed(format!(
            "{}: no {DATA_ID_OPTION} option",
            fields::REASON_MISSING_ROUTING_ID
        ))),
        Some(value) => value
            .as_u64()
            .and_then(|id| u32::try_from(id).ok())
            .ok_or_else(|| malformed(format!("invalid {DATA_ID_OPTION} {value}"))),
    }
}

#[async_trait]
impl MessageHandler for GseHandler {
    async fn handle(&self, _worker: usize, msg: SenderMsg) -> Result<(), RelayError> {
        let data_id = data_id(&self.sender, &msg)?;
        self.transport
            .send(GseMessage::new(data_id, msg.data().clone()))
            .await
            .map_err(|err| RelayError::DeliveryFailed {
                sender: self.sender.clone(),
                source: Box::new(err),
            })
    }
}

#[async_trait]
impl SenderInstance for GseSender {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&mut self) -> Result<(), BoxError> {
        self.transport.start().await?;
        let handler = GseHandler {
            sender: self.name.clone(),
            transport: self.transport.clone(),
        };
        self.queue.spawn_workers(self.worker_count, Arc::new(handler));
        info!(
            sender = self.name.as_str(),
            workers = self.worker_count,
            "gse sender running"
        );
        Ok(())
    }

    async fn push(&self, msg: SenderMsg) -> bool {
        self.queue.push(msg).await
    }

    async fn stop(&self) {
        self.queue.close_and_join().await;
        self.transport.close().await;
        info!(
            sender = self.name.as_str(),
            stats = ?self.queue.stats(),
            "gse sender stopped"
        );
    }
}

/// Registers the unix-socket GSE sender under `"gse"`.
#[cfg(unix)]
pub fn register_gse_sender(registry: &mut SenderRegistry) -> Result<(), RelayError> {
    registry.register_sender(GSE_SENDER_NAME, |config: &BackendConfig| {
        let config: GseConfig = config.decode()?;
        Ok(Box::new(GseSender::new(&config)) as Box<dyn SenderInstance>)
    })
}

#[cfg(test)]
mod tests {
    use super::{data_id, GseSender};
    use crate::gse::{GseConfig, GseError, GseMessage, GseTransport};
    use async_trait::async_trait;
    use bytes::Bytes;
    use msg_relay::{RelayError, SenderInstance, SenderMsg};
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct FlakyTransport {
        sent: Mutex<Vec<GseMessage>>,
        closed: Mutex<bool>,
    }

    #[async_trait]
    impl GseTransport for FlakyTransport {
        async fn start(&self) -> Result<(), GseError> {
            Ok(())
        }

        async fn send(&self, msg: GseMessage) -> Result<(), GseError> {
            if msg.data.as_ref() == b"poison" {
                return Err(GseError::Closed);
            }
            self.sent.lock().unwrap().push(msg);
            Ok(())
        }

        async fn close(&self) {
            *self.closed.lock().unwrap() = true;
        }
    }

    #[test]
    fn data_id_must_be_a_u32() {
        let sender = "gse";
        assert_eq!(
            data_id(sender, &SenderMsg::new(sender, "x").with_option("dataid", 7)).unwrap(),
            7
        );
        for msg in [
            SenderMsg::new(sender, "x"),
            SenderMsg::new(sender, "x").with_option("dataid", -1),
            SenderMsg::new(sender, "x").with_option("dataid", u64::from(u32::MAX) + 1),
            SenderMsg::new(sender, "x").with_option("dataid", "7"),
        ] {
            assert!(matches!(
                data_id(sender, &msg),
                Err(RelayError::MalformedMessage { .. })
            ));
        }
    }

    #[tokio::test]
    async fn malformed_and_failed_messages_are_dropped_and_the_rest_delivered() {
        let transport = Arc::new(FlakyTransport::default());
        let config = GseConfig {
            worker: 1,
            ..GseConfig::default()
        };
        let mut sender = GseSender::with_transport(&config, transport.clone());
        sender.run().await.unwrap();

        sender.push(SenderMsg::new("gse", "no-id")).await;
        sender
            .push(SenderMsg::new("gse", "poison").with_option("dataid", 1))
            .await;
        sender
            .push(SenderMsg::new("gse", "fine").with_option("dataid", 2))
            .await;
        sender.stop().await;

        let sent = transport.sent.lock().unwrap().clone();
        assert_eq!(sent, vec![GseMessage::new(2, Bytes::from_static(b"fine"))]);
        let stats = sender.queue_stats();
        assert_eq!(stats.failed, 2);
        assert_eq!(stats.delivered, 1);
        assert!(*transport.closed.lock().unwrap());
    }
}
