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

mod config;
mod forwarder;
mod logging;
mod pidfile;

use crate::config::Config;
use crate::forwarder::Forwarder;
use clap::Parser;
use msg_relay::{SenderRegistry, SenderService, SourceRegistry, SourceService};
use msg_relay_backends::register_builtin_backends;
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info};

#[derive(Parser)]
#[command(version, about = "Relays records from source backends to sender backends")]
struct RelayArgs {
    #[arg(short, long, value_name = "FILE")]
    config: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = RelayArgs::parse();
    let config = Config::load(&args.config)?;

    let exe_name = pidfile::executable_name()?;
    let _log_guard = logging::init(&config.logger_config, &exe_name)?;
    info!("Started msg-relay-daemon");

    if let Some(dir) = config.pid_file_path.as_deref() {
        let path = pidfile::write_pid_file(Path::new(dir), &exe_name)?;
        info!(path = %path.display(), "pid file written");
    }

    let mut sources = SourceRegistry::new();
    let mut senders = SenderRegistry::new();
    register_builtin_backends(&mut sources, &mut senders)?;
    config.check_backends(&sources, &senders)?;

    let mut sender_service =
        SenderService::with_options(Arc::new(senders), config.sender_config, config.relay)?;
    let mut source_service =
        SourceService::with_options(Arc::new(sources), config.source_config, config.relay)?;

    // Senders first, so nothing the sources emit waits on a missing consumer.
    if let Err(err) = sender_service.start().await {
        error!("sender startup reported errors: {err}");
        if sender_service.instance_count() == 0 {
            sender_service.stop().await;
            return Err(err.into());
        }
    }
    if let Err(err) = source_service.start().await {
        error!("source startup reported errors: {err}");
        if source_service.instance_count() == 0 {
            source_service.stop().await;
            sender_service.stop().await;
            return Err(err.into());
        }
    }

    let forwarder =
        Forwarder::new(&config.forward).spawn(source_service.chan(), sender_service.inbound());
    info!(
        sources = ?source_service.instance_names(),
        senders = ?sender_service.instance_names(),
        "msg-relay-daemon running"
    );

    shutdown_signal().await;
    info!("Shutdown signal received, stopping");

    source_service.stop().await;
    match forwarder.await {
        Ok(forwarded) => info!(forwarded, "forwarder drained"),
        Err(err) => error!("forwarder task failed: {err}"),
    }
    sender_service.stop().await;

    info!(dispatch = ?sender_service.stats(), "msg-relay-daemon stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!("unable to listen for ctrl-c: {err}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!("unable to listen for SIGTERM: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
