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

use super::message::GseMessage;
use async_trait::async_trait;
use std::io;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum GseError {
    #[error("failed to connect to {end_point}: {source}")]
    Connect {
        end_point: String,
        #[source]
        source: io::Error,
    },

    #[error("write to {end_point} timed out after {timeout:?}")]
    WriteTimeout { end_point: String, timeout: Duration },

    #[error("write to {end_point} failed: {source}")]
    Write {
        end_point: String,
        #[source]
        source: io::Error,
    },

    #[error("transport closed")]
    Closed,
}

/// Connection to the local agent, shared by every worker of one sender.
#[async_trait]
pub trait GseTransport: Send + Sync + 'static {
    /// Opens the connection. Called once by `run`.
    async fn start(&self) -> Result<(), GseError>;

    async fn send(&self, msg: GseMessage) -> Result<(), GseError>;

    /// Releases the connection. Later sends fail with [`GseError::Closed`].
    async fn close(&self);
}

#[cfg(unix)]
pub use unix::UnixSocketTransport;

#[cfg(unix)]
mod unix {
    use super::{GseError, GseTransport};
    use crate::gse::config::GseConfig;
    use crate::gse::message::GseMessage;
    use async_trait::async_trait;
    use bytes::Bytes;
    use msg_relay::observability::events;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;
    use tokio::io::AsyncWriteExt;
    use tokio::net::UnixStream;
    use tokio::sync::Mutex;
    use tracing::{info, warn};

    const COMPONENT: &str = "gse_transport";

    /// Agent connection over a unix domain socket.
    ///
    /// A failed write drops the connection; the next attempt reconnects. Each send is tried
    /// `retry_times + 1` times, each connect `reconnect_times + 1` times, with
    /// `retry_interval_ms` between attempts.
    pub struct UnixSocketTransport {
        end_point: String,
        write_timeout: Duration,
        retry_times: u32,
        retry_interval: Duration,
        reconnect_times: u32,
        stream: Mutex<Option<UnixStream>>,
        closed: AtomicBool,
    }

    impl UnixSocketTransport {
        pub fn new(config: &GseConfig) -> Self {
            Self {
                end_point: config.end_point().to_string(),
                write_timeout: config.write_timeout(),
                retry_times: config.retry_times,
                retry_interval: config.retry_interval(),
                reconnect_times: config.reconnect_times,
                stream: Mutex::new(None),
                closed: AtomicBool::new(false),
            }
        }

        pub fn end_point(&self) -> &str {
            &self.end_point
        }

        async fn connect(&self) -> Result<UnixStream, GseError> {
            let mut attempt = 0;
            loop {
                match UnixStream::connect(&self.end_point).await {
                    Ok(stream) => {
                        info!(
                            event = events::TRANSPORT_CONNECTED,
                            component = COMPONENT,
                            end_point = self.end_point.as_str(),
                            "connected to gse agent"
                        );
                        return Ok(stream);
                    }
                    Err(source) => {
                        warn!(
                            event = events::TRANSPORT_CONNECT_FAILED,
                            component = COMPONENT,
                            end_point = self.end_point.as_str(),
                            attempt,
                            err = %source,
                            "failed to connect to gse agent"
                        );
                        if attempt >= self.reconnect_times {
                            return Err(GseError::Connect {
                                end_point: self.end_point.clone(),
                                source,
                            });
                        }
                    }
                }
                attempt += 1;
                tokio::time::sleep(self.retry_interval).await;
            }
        }

        async fn write_once(&self, frame: &Bytes) -> Result<(), GseError> {
            let mut guard = self.stream.lock().await;
            if self.closed.load(Ordering::Acquire) {
                return Err(GseError::Closed);
            }
            if guard.is_none() {
                *guard = Some(self.connect().await?);
            }
            let Some(stream) = guard.as_mut() else {
                return Err(GseError::Closed);
            };

            let outcome = tokio::time::timeout(self.write_timeout, stream.write_all(frame)).await;
            let result = match outcome {
                Ok(Ok(())) => Ok(()),
                Ok(Err(source)) => Err(GseError::Write {
                    end_point: self.end_point.clone(),
                    source,
                }),
                Err(_) => Err(GseError::WriteTimeout {
                    end_point: self.end_point.clone(),
                    timeout: self.write_timeout,
                }),
            };
            if result.is_err() {
                guard.take();
            }
            result
        }
    }

    #[async_trait]
    impl GseTransport for UnixSocketTransport {
        async fn start(&self) -> Result<(), GseError> {
            let stream = self.connect().await?;
            *self.stream.lock().await = Some(stream);
            Ok(())
        }

        async fn send(&self, msg: GseMessage) -> Result<(), GseError> {
            let frame = msg.encode();
            let mut attempt = 0;
            loop {
                match self.write_once(&frame).await {
                    Ok(()) => return Ok(()),
                    Err(GseError::Closed) => return Err(GseError::Closed),
                    Err(err) if attempt >= self.retry_times => return Err(err),
                    Err(err) => {
                        warn!(
                            event = events::TRANSPORT_SEND_RETRY,
                            component = COMPONENT,
                            end_point = self.end_point.as_str(),
                            data_id = msg.data_id,
                            attempt,
                            err = %err,
                            "retrying gse send"
                        );
                    }
                }
                attempt += 1;
                tokio::time::sleep(self.retry_interval).await;
            }
        }

        async fn close(&self) {
            self.closed.store(true, Ordering::Release);
            let Some(mut stream) = self.stream.lock().await.take() else {
                return;
            };
            if let Err(err) = stream.shutdown().await {
                warn!(
                    event = events::TRANSPORT_CLOSE_FAILED,
                    component = COMPONENT,
                    end_point = self.end_point.as_str(),
                    err = %err,
                    "failed to shut down gse connection"
                );
            }
            info!(
                event = events::TRANSPORT_CLOSED,
                component = COMPONENT,
                end_point = self.end_point.as_str(),
                "gse connection closed"
            );
        }
    }

}
