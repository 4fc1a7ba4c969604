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

//! Canonical structured field values and formatting helpers.

use crate::message::SenderMsg;

pub const REASON_QUEUE_CLOSED: &str = "queue_closed";
pub const REASON_CHANNEL_DISCONNECTED: &str = "channel_disconnected";
pub const REASON_CANCELLED: &str = "cancelled";
pub const REASON_UNKNOWN_SENDER: &str = "unknown_sender";
pub const REASON_MISSING_ROUTING_ID: &str = "missing_routing_id";

/// Longest payload prefix rendered in debug logs.
pub const PAYLOAD_PREVIEW_LEN: usize = 64;

/// Lossy, truncated rendering of a payload for diagnostics.
pub fn payload_preview(data: &[u8]) -> String {
    let end = data.len().min(PAYLOAD_PREVIEW_LEN);
    let mut preview = String::from_utf8_lossy(&data[..end]).into_owned();
    if data.len() > PAYLOAD_PREVIEW_LEN {
        preview.push_str("...");
    }
    preview
}

/// Compact `key=value` rendering of message options, sorted by key.
pub fn format_options(msg: &SenderMsg) -> String {
    let mut pairs: Vec<String> = msg
        .options()
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect();
    pairs.sort();
    pairs.join(",")
}

#[cfg(test)]
mod tests {
    use super::{format_options, payload_preview, PAYLOAD_PREVIEW_LEN};
    use crate::message::SenderMsg;

    #[test]
    fn payload_preview_truncates_long_payloads() {
        let long = vec![b'a'; PAYLOAD_PREVIEW_LEN + 10];
        let preview = payload_preview(&long);

        assert_eq!(preview.len(), PAYLOAD_PREVIEW_LEN + 3);
        assert!(preview.ends_with("..."));
        assert_eq!(payload_preview(b"short"), "short");
    }

    #[test]
    fn format_options_is_stable() {
        let msg = SenderMsg::new("gse", "x")
            .with_option("dataid", 7)
            .with_option("biz", "cmdb");

        assert_eq!(format_options(&msg), "biz=\"cmdb\",dataid=7");
    }
}
