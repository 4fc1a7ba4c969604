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

//! Name -> factory registries used to build backend instances from configuration.
//!
//! Registries are plain values owned by process initialisation. They are filled once, before
//! any service is created, and then shared read-only behind an `Arc`. Registration takes
//! `&mut self`, so it cannot race with lookups.

use crate::config::BackendConfig;
use crate::error::{BackendKind, BoxError, RelayError};
use crate::sender::SenderInstance;
use crate::source::SourceInstance;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Builds a source instance from its backend configuration.
pub type SourceFactory =
    Arc<dyn Fn(&BackendConfig) -> Result<Box<dyn SourceInstance>, BoxError> + Send + Sync>;

/// Builds a sender instance from its backend configuration.
pub type SenderFactory =
    Arc<dyn Fn(&BackendConfig) -> Result<Box<dyn SenderInstance>, BoxError> + Send + Sync>;

pub type SourceRegistry = Registry<SourceFactory>;
pub type SenderRegistry = Registry<SenderFactory>;

/// Append-only mapping from backend name to factory.
pub struct Registry<F> {
    kind: BackendKind,
    factories: HashMap<String, F>,
}

impl<F> Registry<F> {
    fn with_kind(kind: BackendKind) -> Self {
        Self {
            kind,
            factories: HashMap::new(),
        }
    }

    /// Stores `factory` under `name`. A name can be registered only once.
    pub fn register(&mut self, name: impl Into<String>, factory: F) -> Result<(), RelayError> {
        let name = name.into();
        if self.factories.contains_key(&name) {
            return Err(RelayError::AlreadyRegistered {
                kind: self.kind,
                name,
            });
        }
        debug!(kind = %self.kind, backend = name.as_str(), "registered backend");
        self.factories.insert(name, factory);
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Option<&F> {
        self.factories.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    pub fn kind(&self) -> BackendKind {
        self.kind
    }
}

impl Registry<SourceFactory> {
    pub fn new() -> Self {
        Self::with_kind(BackendKind::Source)
    }

    pub fn register_source<C>(
        &mut self,
        name: impl Into<String>,
        factory: C,
    ) -> Result<(), RelayError>
    where
        C: Fn(&BackendConfig) -> Result<Box<dyn SourceInstance>, BoxError> + Send + Sync + 'static,
    {
        self.register(name, Arc::new(factory))
    }
}

impl Default for Registry<SourceFactory> {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry<SenderFactory> {
    pub fn new() -> Self {
        Self::with_kind(BackendKind::Sender)
    }

    pub fn register_sender<C>(
        &mut self,
        name: impl Into<String>,
        factory: C,
    ) -> Result<(), RelayError>
    where
        C: Fn(&BackendConfig) -> Result<Box<dyn SenderInstance>, BoxError> + Send + Sync + 'static,
    {
        self.register(name, Arc::new(factory))
    }
}

impl Default for Registry<SenderFactory> {
    fn default() -> Self {
        Self::new()
    }
}
