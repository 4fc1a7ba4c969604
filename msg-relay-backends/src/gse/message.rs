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

use bytes::{BufMut, Bytes, BytesMut};
use std::time::{SystemTime, UNIX_EPOCH};

/// Message type of the agent's common data frame.
pub const GSE_COMMON_MSG_TYPE: u32 = 0xc01;

/// Six big-endian `u32` words precede every body.
pub const GSE_HEADER_LEN: usize = 24;

/// A payload addressed to one agent data channel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GseMessage {
    pub data_id: u32,
    pub data: Bytes,
}

impl GseMessage {
    pub fn new(data_id: u32, data: Bytes) -> Self {
        Self { data_id, data }
    }

    /// Frames the message, stamped with the current UTC time.
    pub fn encode(&self) -> Bytes {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs())
            .unwrap_or_default();
        self.encode_at(u32::try_from(now).unwrap_or(u32::MAX))
    }

    /// Frame layout: type, data id, timestamp, body length, two reserved words, body.
    pub fn encode_at(&self, utc_seconds: u32) -> Bytes {
        let body_len = u32::try_from(self.data.len()).unwrap_or(u32::MAX);
        let mut frame = BytesMut::with_capacity(GSE_HEADER_LEN + self.data.len());
        frame.put_u32(GSE_COMMON_MSG_TYPE);
        frame.put_u32(self.data_id);
        frame.put_u32(utc_seconds);
        frame.put_u32(body_len);
        frame.put_u32(0);
        frame.put_u32(0);
        frame.put_slice(&self.data);
        frame.freeze()
    }
}

#[cfg(test)]
mod tests {
    use super::{GseMessage, GSE_HEADER_LEN};
    use bytes::Bytes;

    #[test]
    fn frame_header_is_big_endian() {
        let frame = GseMessage::new(7, Bytes::from_static(b"xyz")).encode_at(0x0102_0304);

        assert_eq!(frame.len(), GSE_HEADER_LEN + 3);
        assert_eq!(&frame[0..4], &[0x00, 0x00, 0x0c, 0x01]);
        assert_eq!(&frame[4..8], &[0, 0, 0, 7]);
        assert_eq!(&frame[8..12], &[1, 2, 3, 4]);
        assert_eq!(&frame[12..16], &[0, 0, 0, 3]);
        assert_eq!(&frame[16..24], &[0; 8]);
        assert_eq!(&frame[24..], b"xyz");
    }
}
