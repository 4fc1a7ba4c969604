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

//! Error taxonomy shared by the registry and both services.

use std::fmt;

/// Error type reported by backend implementations.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Which side of the relay a backend plugs into.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum BackendKind {
    Source,
    Sender,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Source => f.write_str("source"),
            BackendKind::Sender => f.write_str("sender"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// The service was created with an empty configuration map.
    #[error("no {service} configurations provided")]
    ConfigurationMissing { service: BackendKind },

    #[error("{kind} {name} already registered")]
    AlreadyRegistered { kind: BackendKind, name: String },

    #[error("{kind} {name} not registered")]
    BackendNotRegistered { kind: BackendKind, name: String },

    /// The factory could not produce a usable instance.
    #[error("failed to create {kind} {name}: {source}")]
    BackendConstructionFailed {
        kind: BackendKind,
        name: String,
        #[source]
        source: BoxError,
    },

    #[error("failed to run {kind} {name}: {source}")]
    BackendStartFailed {
        kind: BackendKind,
        name: String,
        #[source]
        source: BoxError,
    },

    #[error("no {service}s started successfully")]
    NoInstanceStarted { service: BackendKind },

    /// Aggregated per-backend failures collected during `start`.
    #[error(transparent)]
    Startup(StartupErrors),

    #[error("{service} service cannot {operation} while {state}")]
    InvalidState {
        service: BackendKind,
        operation: &'static str,
        state: crate::lifecycle::ServiceState,
    },

    #[error("invalid option {option}: {reason}")]
    InvalidOption {
        option: &'static str,
        reason: String,
    },

    /// A message referenced a sender that is not running. Logged, never returned by dispatch.
    #[error("dispatch to sender {sender}, instance not found")]
    RoutingFailed { sender: String },

    /// A message lacks metadata its sender needs. Logged, never retried.
    #[error("{sender} dropped malformed message: {reason}")]
    MalformedMessage { sender: String, reason: String },

    /// A transport rejected a message. Logged, never returned by push.
    #[error("{sender} failed to deliver message: {source}")]
    DeliveryFailed {
        sender: String,
        #[source]
        source: BoxError,
    },
}

impl RelayError {
    /// Name of the backend this error is about, when there is one.
    pub fn backend_name(&self) -> Option<&str> {
        match self {
            RelayError::AlreadyRegistered { name, .. }
            | RelayError::BackendNotRegistered { name, .. }
            | RelayError::BackendConstructionFailed { name, .. }
            | RelayError::BackendStartFailed { name, .. } => Some(name.as_str()),
            RelayError::RoutingFailed { sender }
            | RelayError::MalformedMessage { sender, .. }
            | RelayError::DeliveryFailed { sender, .. } => Some(sender.as_str()),
            _ => None,
        }
    }
}

/// Independent startup failures combined into one error value.
#[derive(Debug)]
pub struct StartupErrors {
    service: BackendKind,
    errors: Vec<RelayError>,
}

impl StartupErrors {
    pub(crate) fn new(service: BackendKind, errors: Vec<RelayError>) -> Self {
        Self { service, errors }
    }

    pub fn service(&self) -> BackendKind {
        self.service
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RelayError> {
        self.errors.iter()
    }

    /// Backend names that contributed an error, in the order they failed.
    pub fn failed_backends(&self) -> Vec<&str> {
        self.errors
            .iter()
            .filter_map(RelayError::backend_name)
            .collect()
    }

    pub fn into_inner(self) -> Vec<RelayError> {
        self.errors
    }
}

impl fmt::Display for StartupErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "errors occurred while starting {}s:", self.service)?;
        for err in &self.errors {
            write!(f, "\n{err}")?;
        }
        Ok(())
    }
}

impl std::error::Error for StartupErrors {}

#[cfg(test)]
mod tests {
    use super::{BackendKind, RelayError, StartupErrors};

    #[test]
    fn startup_errors_display_lists_every_failure() {
        let errors = StartupErrors::new(
            BackendKind::Sender,
            vec![
                RelayError::BackendNotRegistered {
                    kind: BackendKind::Sender,
                    name: "missing".to_string(),
                },
                RelayError::BackendStartFailed {
                    kind: BackendKind::Sender,
                    name: "broken".to_string(),
                    source: "connection refused".into(),
                },
            ],
        );

        let rendered = errors.to_string();
        assert!(rendered.starts_with("errors occurred while starting senders:"));
        assert!(rendered.contains("sender missing not registered"));
        assert!(rendered.contains("failed to run sender broken: connection refused"));
        assert_eq!(errors.failed_backends(), vec!["missing", "broken"]);
    }

    #[test]
    fn configuration_missing_names_the_service() {
        let err = RelayError::ConfigurationMissing {
            service: BackendKind::Source,
        };
        assert_eq!(err.to_string(), "no source configurations provided");
        assert!(err.backend_name().is_none());
    }
}
