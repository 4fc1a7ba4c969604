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

use serde::Deserialize;
use std::time::Duration;

const DEFAULT_WORKERS: usize = 3;
const DEFAULT_BUFFER: usize = 500;
pub(crate) const DEFAULT_END_POINT: &str = "/var/run/ipc.state.report";

/// Settings of the GSE sender and its agent connection.
///
/// `worker` and `buffer` fall back to their defaults when not positive, an empty `end_point`
/// falls back to the agent's standard socket.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct GseConfig {
    pub worker: i64,
    pub buffer: i64,
    pub end_point: String,
    pub write_timeout_ms: u64,
    pub retry_times: u32,
    pub retry_interval_ms: u64,
    pub reconnect_times: u32,
}

impl Default for GseConfig {
    fn default() -> Self {
        Self {
            worker: DEFAULT_WORKERS as i64,
            buffer: DEFAULT_BUFFER as i64,
            end_point: DEFAULT_END_POINT.to_string(),
            write_timeout_ms: 5000,
            retry_times: 3,
            retry_interval_ms: 3000,
            reconnect_times: 3,
        }
    }
}

fn positive_or(value: i64, default: usize) -> usize {
    usize::try_from(value)
        .ok()
        .filter(|value| *value > 0)
        .unwrap_or(default)
}

impl GseConfig {
    pub fn worker_count(&self) -> usize {
        positive_or(self.worker, DEFAULT_WORKERS)
    }

    pub fn buffer_size(&self) -> usize {
        positive_or(self.buffer, DEFAULT_BUFFER)
    }

    pub fn end_point(&self) -> &str {
        if self.end_point.is_empty() {
            DEFAULT_END_POINT
        } else {
            &self.end_point
        }
    }

    pub fn write_timeout(&self) -> Duration {
        Duration::from_millis(self.write_timeout_ms)
    }

    pub fn retry_interval(&self) -> Duration {
        Duration::from_millis(self.retry_interval_ms)
    }
}
