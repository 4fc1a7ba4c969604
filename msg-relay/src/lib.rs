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

//! # msg-relay
//!
//! `msg-relay` moves opaque payloads from pluggable inbound backends to pluggable outbound
//! backends. Backends are looked up by name in a [`SourceRegistry`] or [`SenderRegistry`] and
//! built from a per-backend [`BackendConfig`].
//!
//! - [`SourceService`] runs every configured [`SourceInstance`] and merges what they emit into
//!   one bounded channel, exposed by [`SourceService::chan`].
//! - [`SenderService`] runs every configured [`SenderInstance`] and a fixed pool of dispatch
//!   tasks that route each [`SenderMsg`] from [`SenderService::inbound`] to the instance
//!   named by [`SenderMsg::sender`].
//!
//! Both services start each backend independently. Failures are collected into one
//! [`RelayError::Startup`] while healthy backends keep running.
//!
//! ## Quick start
//!
//! ```
//! use std::collections::HashMap;
//! use std::sync::Arc;
//! use async_trait::async_trait;
//! use msg_relay::{
//!     BackendConfig, BoxError, SenderInstance, SenderMsg, SenderRegistry, SenderService,
//! };
//!
//! struct Discard;
//!
//! #[async_trait]
//! impl SenderInstance for Discard {
//!     fn name(&self) -> &str { "discard" }
//!     async fn run(&mut self) -> Result<(), BoxError> { Ok(()) }
//!     async fn push(&self, _msg: SenderMsg) -> bool { true }
//!     async fn stop(&self) {}
//! }
//!
//! # tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
//! let mut registry = SenderRegistry::new();
//! registry
//!     .register_sender("discard", |_config: &BackendConfig| {
//!         Ok(Box::new(Discard) as Box<dyn SenderInstance>)
//!     })
//!     .unwrap();
//!
//! let configs = HashMap::from([("discard".to_string(), BackendConfig::new())]);
//! let mut senders = SenderService::new(Arc::new(registry), configs).unwrap();
//! senders.start().await.unwrap();
//!
//! senders
//!     .inbound()
//!     .send_async(SenderMsg::new("discard", "hello"))
//!     .await
//!     .unwrap();
//! senders.stop().await;
//! # });
//! ```
//!
//! ## Internal architecture
//!
//! - `registry`: name to factory maps, filled once at process start.
//! - `source`: source contract and [`SourceService`].
//! - `sender`: sender contract, [`SenderQueue`] worker pool and [`SenderService`] dispatch.
//! - `runtime`: [`WorkerGroup`], the cancel + join helper every worker pool is built on.
//! - `observability`: stable `event` names and field helpers used in tracing output.
//!
//! ## Observability
//!
//! All diagnostics go through `tracing`. Every record carries an `event` field with a stable
//! name from `observability::events` and a `component` field naming the emitter. Payload
//! previews are only rendered when `DEBUG` is enabled.

mod config;
mod error;
mod lifecycle;
mod message;
mod registry;
mod runtime;
mod sender;
mod source;

#[doc(hidden)]
pub mod observability;

pub use config::{BackendConfig, RelayOptions, DEFAULT_CHANNEL_CAPACITY, DEFAULT_DISPATCH_WORKERS};
pub use error::{BackendKind, BoxError, RelayError, StartupErrors};
pub use lifecycle::ServiceState;
pub use message::SenderMsg;
pub use registry::{Registry, SenderFactory, SenderRegistry, SourceFactory, SourceRegistry};
pub use runtime::WorkerGroup;
pub use sender::{
    DispatchStats, MessageHandler, QueueStats, SenderInstance, SenderQueue, SenderService,
};
pub use source::{SourceInstance, SourceService};
