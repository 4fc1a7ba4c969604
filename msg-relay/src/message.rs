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

use bytes::Bytes;
use serde_json::Value;
use std::collections::HashMap;

/// A payload on its way to a named sender.
///
/// `options` carries sender-specific metadata, for example the numeric `dataid` a local-agent
/// sender needs. The message is immutable once built and moves from channel to channel.
///
/// ```
/// use msg_relay::SenderMsg;
///
/// let msg = SenderMsg::new("gse", "x").with_option("dataid", 7);
/// assert_eq!(msg.sender(), "gse");
/// assert_eq!(msg.option_i64("dataid"), Some(7));
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct SenderMsg {
    data: Bytes,
    options: HashMap<String, Value>,
    sender: String,
}

impl SenderMsg {
    pub fn new(sender: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            options: HashMap::new(),
            sender: sender.into(),
        }
    }

    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    pub fn with_options(mut self, options: HashMap<String, Value>) -> Self {
        self.options.extend(options);
        self
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }

    pub fn options(&self) -> &HashMap<String, Value> {
        &self.options
    }

    pub fn option(&self, key: &str) -> Option<&Value> {
        self.options.get(key)
    }

    /// Integer option, if present and integral.
    pub fn option_i64(&self, key: &str) -> Option<i64> {
        self.options.get(key).and_then(Value::as_i64)
    }

    pub fn sender(&self) -> &str {
        &self.sender
    }
}
