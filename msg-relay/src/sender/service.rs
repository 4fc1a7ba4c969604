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

use crate::config::{BackendConfig, RelayOptions};
use crate::error::{BackendKind, RelayError, StartupErrors};
use crate::lifecycle::ServiceState;
use crate::message::SenderMsg;
use crate::observability::{events, fields};
use crate::registry::SenderRegistry;
use crate::runtime::WorkerGroup;
use crate::sender::SenderInstance;
use futures::future::join_all;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

const COMPONENT: &str = "sender_service";

type InstanceMap = HashMap<String, Arc<dyn SenderInstance>>;

/// Routing counters of the dispatch pool.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct DispatchStats {
    /// Messages accepted by a running instance.
    pub routed: u64,
    /// Messages dropped because no running instance matched their sender tag.
    pub routing_failed: u64,
    /// Messages a matching instance refused because it was already closing.
    pub rejected: u64,
    /// Messages still in the inbound channel after the last receiver went away during stop.
    pub abandoned: u64,
}

#[derive(Default)]
struct DispatchCounters {
    routed: AtomicU64,
    routing_failed: AtomicU64,
    rejected: AtomicU64,
    abandoned: AtomicU64,
}

/// Owns the configured sender instances and the dispatch pool feeding them.
///
/// Producers send [`SenderMsg`] values into [`SenderService::inbound`]; a fixed pool of
/// dispatch tasks routes each one to the instance named by [`SenderMsg::sender`].
pub struct SenderService {
    registry: Arc<SenderRegistry>,
    configs: HashMap<String, BackendConfig>,
    options: RelayOptions,
    inbound_tx: flume::Sender<SenderMsg>,
    inbound_rx: Option<flume::Receiver<SenderMsg>>,
    instances: Arc<InstanceMap>,
    dispatchers: WorkerGroup,
    counters: Arc<DispatchCounters>,
    state: ServiceState,
}

impl SenderService {
    pub fn new(
        registry: Arc<SenderRegistry>,
        configs: HashMap<String, BackendConfig>,
    ) -> Result<Self, RelayError> {
        Self::with_options(registry, configs, RelayOptions::default())
    }

    pub fn with_options(
        registry: Arc<SenderRegistry>,
        configs: HashMap<String, BackendConfig>,
        options: RelayOptions,
    ) -> Result<Self, RelayError> {
        if configs.is_empty() {
            return Err(RelayError::ConfigurationMissing {
                service: BackendKind::Sender,
            });
        }
        options.validate()?;

        let (inbound_tx, inbound_rx) = flume::bounded(options.channel_capacity);
        Ok(Self {
            registry,
            configs,
            options,
            inbound_tx,
            inbound_rx: Some(inbound_rx),
            instances: Arc::new(HashMap::new()),
            dispatchers: WorkerGroup::new("dispatch"),
            counters: Arc::new(DispatchCounters::default()),
            state: ServiceState::Created,
        })
    }

    /// Builds and runs every configured sender, then launches the dispatch pool.
    ///
    /// Failures are aggregated exactly like [`crate::SourceService::start`]; the dispatch pool
    /// runs regardless, so healthy senders keep receiving traffic.
    pub async fn start(&mut self) -> Result<(), RelayError> {
        if self.state != ServiceState::Created {
            return Err(RelayError::InvalidState {
                service: BackendKind::Sender,
                operation: "start",
                state: self.state,
            });
        }
        let Some(inbound_rx) = self.inbound_rx.clone() else {
            return Err(RelayError::InvalidState {
                service: BackendKind::Sender,
                operation: "start",
                state: self.state,
            });
        };
        self.state = ServiceState::Starting;
        info!(
            event = events::SERVICE_START,
            component = COMPONENT,
            configured = self.configs.len(),
            "starting senders"
        );

        let mut names: Vec<&String> = self.configs.keys().collect();
        names.sort();

        let mut instances = InstanceMap::new();
        let mut errors = Vec::new();
        for name in names {
            let config = &self.configs[name];
            let Some(factory) = self.registry.lookup(name) else {
                warn!(
                    event = events::BACKEND_NOT_REGISTERED,
                    component = COMPONENT,
                    backend = name.as_str(),
                    "sender not registered"
                );
                errors.push(RelayError::BackendNotRegistered {
                    kind: BackendKind::Sender,
                    name: name.clone(),
                });
                continue;
            };

            let mut instance = match factory(config) {
                Ok(instance) => instance,
                Err(err) => {
                    error!(
                        event = events::BACKEND_CONSTRUCTION_FAILED,
                        component = COMPONENT,
                        backend = name.as_str(),
                        err = %err,
                        "failed to create sender"
                    );
                    errors.push(RelayError::BackendConstructionFailed {
                        kind: BackendKind::Sender,
                        name: name.clone(),
                        source: err,
                    });
                    continue;
                }
            };

            if let Err(err) = instance.run().await {
                error!(
                    event = events::BACKEND_START_FAILED,
                    component = COMPONENT,
                    backend = name.as_str(),
                    instance = instance.name(),
                    err = %err,
                    "failed to run sender"
                );
                errors.push(RelayError::BackendStartFailed {
                    kind: BackendKind::Sender,
                    name: name.clone(),
                    source: err,
                });
                continue;
            }

            info!(
                event = events::BACKEND_STARTED,
                component = COMPONENT,
                backend = name.as_str(),
                instance = instance.name(),
                "sender running"
            );
            instances.insert(name.clone(), Arc::from(instance));
        }

        self.instances = Arc::new(instances);
        self.spawn_dispatchers(inbound_rx);
        self.state = ServiceState::Running;

        if !errors.is_empty() {
            warn!(
                event = events::SERVICE_START_PARTIAL,
                component = COMPONENT,
                running = self.instances.len(),
                failed = errors.len(),
                "senders started with failures"
            );
            return Err(RelayError::Startup(StartupErrors::new(
                BackendKind::Sender,
                errors,
            )));
        }
        if self.instances.is_empty() {
            return Err(RelayError::NoInstanceStarted {
                service: BackendKind::Sender,
            });
        }

        info!(
            event = events::SERVICE_START_OK,
            component = COMPONENT,
            running = self.instances.len(),
            dispatch_workers = self.options.dispatch_workers,
            "senders started"
        );
        Ok(())
    }

    fn spawn_dispatchers(&self, inbound_rx: flume::Receiver<SenderMsg>) {
        for index in 0..self.options.dispatch_workers {
            let rx = inbound_rx.clone();
            let instances = self.instances.clone();
            let counters = self.counters.clone();
            let token = self.dispatchers.token();
            self.dispatchers.spawn(dispatch(index, rx, instances, counters, token));
        }
    }

    /// Stops the dispatch pool, then every sender instance.
    ///
    /// Dispatchers first route whatever is already buffered in the inbound channel, so no
    /// instance is closed while a dispatcher could still push to it. The service then routes
    /// anything that arrived after the dispatchers' final drain before it drops the last
    /// receiver, and logs whatever slipped in after that. Each instance then drains its own
    /// queue before this returns. Once stopped, sends into the inbound channel fail.
    /// Only acts on a `Running` service; any other call is logged and ignored.
    pub async fn stop(&mut self) {
        if self.state != ServiceState::Running {
            warn!(
                event = events::SERVICE_STOP_IGNORED,
                component = COMPONENT,
                state = %self.state,
                "stop ignored"
            );
            return;
        }
        self.state = ServiceState::Stopping;
        info!(
            event = events::SERVICE_STOP,
            component = COMPONENT,
            running = self.instances.len(),
            "stopping senders"
        );

        let inbound_rx = self.inbound_rx.take();
        self.dispatchers.cancel_and_join().await;
        if let Some(rx) = inbound_rx {
            for msg in rx.drain() {
                route(&self.instances, &self.counters, msg).await;
            }
        }
        // Producers see a disconnected channel from here on.
        self.count_abandoned();

        join_all(self.instances.iter().map(|(name, instance)| async move {
            instance.stop().await;
            info!(
                event = events::BACKEND_STOPPED,
                component = COMPONENT,
                backend = name.as_str(),
                "sender stopped"
            );
        }))
        .await;
        self.instances = Arc::new(HashMap::new());

        self.state = ServiceState::Stopped;
        info!(
            event = events::SERVICE_STOP_OK,
            component = COMPONENT,
            stats = ?self.stats(),
            "senders stopped"
        );
    }

    fn count_abandoned(&self) {
        let abandoned = self.inbound_tx.len();
        if abandoned == 0 {
            return;
        }
        self.counters
            .abandoned
            .fetch_add(abandoned as u64, Ordering::Relaxed);
        warn!(
            event = events::DISPATCH_MESSAGES_ABANDONED,
            component = COMPONENT,
            abandoned,
            "messages sent during stop were not routed"
        );
    }

    /// Write side of the inbound message channel.
    pub fn inbound(&self) -> flume::Sender<SenderMsg> {
        self.inbound_tx.clone()
    }

    pub fn state(&self) -> ServiceState {
        self.state
    }

    pub fn stats(&self) -> DispatchStats {
        DispatchStats {
            routed: self.counters.routed.load(Ordering::Relaxed),
            routing_failed: self.counters.routing_failed.load(Ordering::Relaxed),
            rejected: self.counters.rejected.load(Ordering::Relaxed),
            abandoned: self.counters.abandoned.load(Ordering::Relaxed),
        }
    }

    /// Names of the instances currently running, sorted.
    pub fn instance_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.instances.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }

    /// Running instance registered under `name`.
    pub fn instance(&self, name: &str) -> Option<Arc<dyn SenderInstance>> {
        self.instances.get(name).cloned()
    }
}

async fn dispatch(
    index: usize,
    rx: flume::Receiver<SenderMsg>,
    instances: Arc<InstanceMap>,
    counters: Arc<DispatchCounters>,
    token: CancellationToken,
) {
    loop {
        let msg = tokio::select! {
            biased;
            _ = token.cancelled() => break,
            msg = rx.recv_async() => match msg {
                Ok(msg) => msg,
                Err(_) => break,
            },
        };
        route(&instances, &counters, msg).await;
    }

    // Messages buffered before the stop signal are still delivered.
    for msg in rx.drain() {
        route(&instances, &counters, msg).await;
    }
    info!(
        event = events::DISPATCH_WORKER_EXIT,
        component = COMPONENT,
        index,
        "dispatch worker exit"
    );
}

async fn route(instances: &InstanceMap, counters: &DispatchCounters, msg: SenderMsg) {
    let Some(instance) = instances.get(msg.sender()) else {
        counters.routing_failed.fetch_add(1, Ordering::Relaxed);
        let err = RelayError::RoutingFailed {
            sender: msg.sender().to_string(),
        };
        error!(
            event = events::DISPATCH_ROUTING_FAILED,
            component = COMPONENT,
            sender = msg.sender(),
            reason = fields::REASON_UNKNOWN_SENDER,
            "{err}"
        );
        return;
    };

    debug!(
        event = events::DISPATCH_ROUTED,
        component = COMPONENT,
        sender = msg.sender(),
        bytes = msg.data().len(),
        "routing message"
    );
    if instance.push(msg).await {
        counters.routed.fetch_add(1, Ordering::Relaxed);
    } else {
        counters.rejected.fetch_add(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::SenderService;
    use crate::config::{BackendConfig, RelayOptions};
    use crate::error::{BackendKind, BoxError, RelayError};
    use crate::lifecycle::ServiceState;
    use crate::message::SenderMsg;
    use crate::registry::SenderRegistry;
    use crate::sender::{MessageHandler, SenderInstance, SenderQueue};
    use async_trait::async_trait;
    use bytes::Bytes;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct Delivered {
        payloads: Mutex<Vec<Bytes>>,
    }

    #[async_trait]
    impl MessageHandler for Delivered {
        async fn handle(&self, _worker: usize, msg: SenderMsg) -> Result<(), RelayError> {
            self.payloads.lock().unwrap().push(msg.data().clone());
            Ok(())
        }
    }

    struct QueueSender {
        name: String,
        queue: SenderQueue,
        delivered: Arc<Delivered>,
    }

    #[async_trait]
    impl SenderInstance for QueueSender {
        fn name(&self) -> &str {
            &self.name
        }

        async fn run(&mut self) -> Result<(), BoxError> {
            self.queue.spawn_workers(2, self.delivered.clone());
            Ok(())
        }

        async fn push(&self, msg: SenderMsg) -> bool {
            self.queue.push(msg).await
        }

        async fn stop(&self) {
            self.queue.close_and_join().await;
        }
    }

    /// Registers but never gets past `run`.
    struct FailsToRun {
        pushed: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl SenderInstance for FailsToRun {
        fn name(&self) -> &str {
            "broken_run"
        }

        async fn run(&mut self) -> Result<(), BoxError> {
            Err("agent socket missing".into())
        }

        async fn push(&self, _msg: SenderMsg) -> bool {
            self.pushed.fetch_add(1, Ordering::SeqCst);
            true
        }

        async fn stop(&self) {}
    }

    fn registry(delivered: Arc<Delivered>) -> Arc<SenderRegistry> {
        Arc::new(queue_registry(delivered))
    }

    fn queue_registry(delivered: Arc<Delivered>) -> SenderRegistry {
        let mut registry = SenderRegistry::new();
        registry
            .register_sender("queue", move |_config: &BackendConfig| {
                Ok(Box::new(QueueSender {
                    name: "queue".to_string(),
                    queue: SenderQueue::new("queue", 16),
                    delivered: delivered.clone(),
                }) as Box<dyn SenderInstance>)
            })
            .unwrap();
        registry
    }

    fn configs(names: &[&str]) -> HashMap<String, BackendConfig> {
        names
            .iter()
            .map(|name| (name.to_string(), BackendConfig::new()))
            .collect()
    }

    #[test]
    fn new_rejects_empty_configuration() {
        let result = SenderService::new(registry(Arc::default()), HashMap::new());
        assert!(matches!(
            result,
            Err(RelayError::ConfigurationMissing {
                service: BackendKind::Sender
            })
        ));
    }

    #[test]
    fn new_rejects_zero_dispatch_workers() {
        let options = RelayOptions {
            dispatch_workers: 0,
            ..RelayOptions::default()
        };
        let result =
            SenderService::with_options(registry(Arc::default()), configs(&["queue"]), options);
        assert!(matches!(result, Err(RelayError::InvalidOption { .. })));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn stop_delivers_everything_buffered_before_it() {
        let delivered = Arc::new(Delivered::default());
        let mut service = SenderService::new(registry(delivered.clone()), configs(&["queue"]))
            .expect("non-empty configuration");
        service.start().await.expect("queue sender starts");

        let inbound = service.inbound();
        for idx in 0..50 {
            inbound
                .send_async(SenderMsg::new("queue", format!("m{idx}")))
                .await
                .unwrap();
        }
        service.stop().await;

        assert_eq!(delivered.payloads.lock().unwrap().len(), 50);
        assert_eq!(service.stats().routed, 50);
        assert_eq!(service.state(), ServiceState::Stopped);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn inbound_rejects_sends_after_stop() {
        let mut service =
            SenderService::new(registry(Arc::default()), configs(&["queue"])).unwrap();
        service.start().await.unwrap();
        let inbound = service.inbound();
        service.stop().await;

        assert!(inbound
            .send_async(SenderMsg::new("queue", "late"))
            .await
            .is_err());
    }

    #[tokio::test]
    async fn partial_failure_still_dispatches_to_healthy_senders() {
        let delivered = Arc::new(Delivered::default());
        let mut service =
            SenderService::new(registry(delivered.clone()), configs(&["queue", "ghost"])).unwrap();

        let err = service.start().await.unwrap_err();
        assert!(matches!(err, RelayError::Startup(ref errors) if errors.len() == 1));
        assert_eq!(service.instance_names(), vec!["queue"]);

        service
            .inbound()
            .send_async(SenderMsg::new("queue", "still-flows"))
            .await
            .unwrap();
        service.stop().await;

        assert_eq!(
            delivered.payloads.lock().unwrap().clone(),
            vec![Bytes::from_static(b"still-flows")]
        );
    }

    #[tokio::test]
    async fn construction_and_run_failures_are_reported_in_name_order() {
        let delivered = Arc::new(Delivered::default());
        let pushed = Arc::new(AtomicUsize::new(0));
        let mut registry = queue_registry(delivered.clone());
        registry
            .register_sender("broken_build", |_config: &BackendConfig| {
                Err("endpoint not configured".into())
            })
            .unwrap();
        let counter = pushed.clone();
        registry
            .register_sender("broken_run", move |_config: &BackendConfig| {
                Ok(Box::new(FailsToRun {
                    pushed: counter.clone(),
                }) as Box<dyn SenderInstance>)
            })
            .unwrap();

        let mut service = SenderService::new(
            Arc::new(registry),
            configs(&["queue", "broken_run", "broken_build"]),
        )
        .unwrap();
        let Err(RelayError::Startup(errors)) = service.start().await else {
            panic!("expected aggregated startup errors");
        };

        assert_eq!(errors.failed_backends(), vec!["broken_build", "broken_run"]);
        let mut failures = errors.iter();
        assert!(matches!(
            failures.next(),
            Some(RelayError::BackendConstructionFailed { .. })
        ));
        assert!(matches!(
            failures.next(),
            Some(RelayError::BackendStartFailed { .. })
        ));
        assert_eq!(service.instance_names(), vec!["queue"]);
        assert_eq!(service.state(), ServiceState::Running);

        let inbound = service.inbound();
        inbound
            .send_async(SenderMsg::new("broken_run", "lost"))
            .await
            .unwrap();
        inbound
            .send_async(SenderMsg::new("queue", "kept"))
            .await
            .unwrap();
        service.stop().await;

        let stats = service.stats();
        assert_eq!(stats.routing_failed, 1);
        assert_eq!(stats.routed, 1);
        assert_eq!(pushed.load(Ordering::SeqCst), 0);
        assert_eq!(
            delivered.payloads.lock().unwrap().clone(),
            vec![Bytes::from_static(b"kept")]
        );
    }

    #[tokio::test]
    async fn pushes_refused_by_a_closed_instance_are_not_counted_as_routed() {
        let delivered = Arc::new(Delivered::default());
        let mut service =
            SenderService::new(registry(delivered.clone()), configs(&["queue"])).unwrap();
        service.start().await.unwrap();

        service.instance("queue").unwrap().stop().await;
        service
            .inbound()
            .send_async(SenderMsg::new("queue", "refused"))
            .await
            .unwrap();
        service.stop().await;

        let stats = service.stats();
        assert_eq!(stats.rejected, 1);
        assert_eq!(stats.routed, 0);
        assert!(delivered.payloads.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn stop_routes_messages_sent_after_the_dispatchers_exit() {
        let delivered = Arc::new(Delivered::default());
        let mut service =
            SenderService::new(registry(delivered.clone()), configs(&["queue"])).unwrap();
        service.start().await.unwrap();

        // Dispatchers are gone but the service still holds a receiver.
        service.dispatchers.cancel_and_join().await;
        service
            .inbound()
            .send_async(SenderMsg::new("queue", "late"))
            .await
            .unwrap();
        service.stop().await;

        let stats = service.stats();
        assert_eq!(stats.routed, 1);
        assert_eq!(stats.abandoned, 0);
        assert_eq!(
            delivered.payloads.lock().unwrap().clone(),
            vec![Bytes::from_static(b"late")]
        );
    }
}
