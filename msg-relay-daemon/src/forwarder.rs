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

use crate::config::ForwardConfig;
use bytes::Bytes;
use msg_relay::SenderMsg;
use serde_json::Value;
use std::collections::HashMap;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Turns raw source payloads into tagged sender messages.
pub(crate) struct Forwarder {
    sender: String,
    options: HashMap<String, Value>,
}

impl Forwarder {
    pub(crate) fn new(rule: &ForwardConfig) -> Self {
        Self {
            sender: rule.sender.clone(),
            options: rule.options.clone(),
        }
    }

    pub(crate) fn wrap(&self, payload: Bytes) -> SenderMsg {
        SenderMsg::new(self.sender.as_str(), payload).with_options(self.options.clone())
    }

    /// Forwards until the source channel closes or the sender side stops accepting.
    /// The task yields the number of forwarded payloads.
    pub(crate) fn spawn(
        self,
        input: flume::Receiver<Bytes>,
        output: flume::Sender<SenderMsg>,
    ) -> JoinHandle<u64> {
        tokio::spawn(async move {
            let mut forwarded = 0u64;
            while let Ok(payload) = input.recv_async().await {
                if output.send_async(self.wrap(payload)).await.is_err() {
                    warn!(
                        sender = self.sender.as_str(),
                        "sender inbound closed, forwarder exiting"
                    );
                    break;
                }
                forwarded += 1;
            }
            info!(sender = self.sender.as_str(), forwarded, "forwarder finished");
            forwarded
        })
    }
}
