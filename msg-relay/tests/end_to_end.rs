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
use msg_relay::{
    BackendConfig, SenderMsg, SenderRegistry, SenderService, SourceRegistry, SourceService,
};
use relay_test_utils::{init_logging, register_mock_sender, register_mock_source, wait_until};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test(flavor = "multi_thread")]
async fn payloads_flow_from_sources_to_the_tagged_sender() {
    init_logging();

    let mut sources = SourceRegistry::new();
    let script: Vec<Bytes> = (0..10).map(|seq| Bytes::from(format!("rec-{seq}"))).collect();
    let upstream = register_mock_source(&mut sources, "upstream", script).unwrap();

    let mut senders = SenderRegistry::new();
    let downstream = register_mock_sender(&mut senders, "downstream").unwrap();

    let mut source_service = SourceService::new(
        Arc::new(sources),
        HashMap::from([("upstream".to_string(), BackendConfig::new())]),
    )
    .unwrap();
    let mut sender_service = SenderService::new(
        Arc::new(senders),
        HashMap::from([("downstream".to_string(), BackendConfig::new())]),
    )
    .unwrap();

    sender_service.start().await.unwrap();
    source_service.start().await.unwrap();

    let chan = source_service.chan();
    let inbound = sender_service.inbound();
    let forwarder = tokio::spawn(async move {
        while let Ok(payload) = chan.recv_async().await {
            let msg = SenderMsg::new("downstream", payload).with_option("dataid", 42);
            if inbound.send_async(msg).await.is_err() {
                break;
            }
        }
    });

    assert!(wait_until(Duration::from_secs(2), || downstream.delivered_count() == 10).await);

    source_service.stop().await;
    forwarder.await.unwrap();
    sender_service.stop().await;

    assert_eq!(upstream.emitted(), 10);
    let delivered = downstream.delivered();
    assert!(delivered
        .iter()
        .all(|msg| msg.option_i64("dataid") == Some(42)));
}
