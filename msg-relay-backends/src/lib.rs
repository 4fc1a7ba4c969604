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

//! Built-in backends for `msg-relay`.
//!
//! - [`kafka`]: a consumer-group source. The librdkafka client is only compiled with the
//!   `kafka` feature; [`kafka::KafkaSource`] itself works with any [`kafka::GroupConsumer`].
//! - [`gse`]: a sender that writes framed messages to the local GSE agent socket.

pub mod gse;
pub mod kafka;

use msg_relay::{RelayError, SenderRegistry, SourceRegistry};

/// Registers every backend compiled into this build.
pub fn register_builtin_backends(
    sources: &mut SourceRegistry,
    senders: &mut SenderRegistry,
) -> Result<(), RelayError> {
    #[cfg(feature = "kafka")]
    kafka::register_kafka_source(sources)?;
    #[cfg(unix)]
    gse::register_gse_sender(senders)?;

    tracing::debug!(
        sources = ?sources.names().collect::<Vec<_>>(),
        senders = ?senders.names().collect::<Vec<_>>(),
        "builtin backends registered"
    );
    Ok(())
}

/// Cargo feature that compiles in the backend registered as `name`, if it is feature-gated.
pub fn backend_feature(name: &str) -> Option<&'static str> {
    match name {
        kafka::KAFKA_SOURCE_NAME => Some("kafka"),
        _ => None,
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::{backend_feature, register_builtin_backends};
    use msg_relay::{RelayError, SenderRegistry, SourceRegistry};

    #[test]
    fn builtins_register_once() {
        let mut sources = SourceRegistry::new();
        let mut senders = SenderRegistry::new();
        register_builtin_backends(&mut sources, &mut senders).unwrap();

        assert!(senders.contains("gse"));
        assert_eq!(sources.contains("kafka"), cfg!(feature = "kafka"));
        assert!(matches!(
            register_builtin_backends(&mut sources, &mut senders),
            Err(RelayError::AlreadyRegistered { .. })
        ));
    }

    #[test]
    fn only_kafka_is_feature_gated() {
        assert_eq!(backend_feature("kafka"), Some("kafka"));
        assert_eq!(backend_feature("gse"), None);
    }
}
