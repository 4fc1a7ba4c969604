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

use crate::config::LoggerConfig;
use crate::pidfile::is_dir_writable;
use anyhow::{anyhow, bail, Context};
use std::path::Path;
use tracing_appender::non_blocking;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::EnvFilter;

const DEFAULT_LEVEL: &str = "debug";
/// Daily files kept on disk, a week of logs.
const MAX_LOG_FILES: usize = 7;

/// Maps the configured level onto a filter directive. Unknown levels mean `debug`.
fn level_directive(level: &str) -> &'static str {
    match level {
        "error" => "error",
        "warn" => "warn",
        "info" => "info",
        "debug" => "debug",
        _ => DEFAULT_LEVEL,
    }
}

/// Daily-rotated `<exe_name>.<date>.log` files in `dir`, pruned to [`MAX_LOG_FILES`].
fn file_appender(dir: &Path, exe_name: &str) -> anyhow::Result<RollingFileAppender> {
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(exe_name)
        .filename_suffix("log")
        .max_log_files(MAX_LOG_FILES)
        .build(dir)
        .with_context(|| format!("unable to open log file in {}", dir.display()))
}

/// Installs the process-wide subscriber. `RUST_LOG` overrides the configured level.
///
/// With `output_path` set, logs go to daily-rotated files in that directory and the returned
/// guard must be held until exit so buffered lines are flushed.
pub(crate) fn init(config: &LoggerConfig, exe_name: &str) -> anyhow::Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level_directive(&config.level)));

    let Some(output_path) = config.output_path.as_deref() else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .try_init()
            .map_err(|e| anyhow!("unable to install logger: {e}"))?;
        return Ok(None);
    };

    let dir = Path::new(output_path);
    if !is_dir_writable(dir) {
        bail!("log directory is not writable: {}", dir.display());
    }
    let (writer, guard) = non_blocking(file_appender(dir, exe_name)?);
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(writer)
        .try_init()
        .map_err(|e| anyhow!("unable to install logger: {e}"))?;
    Ok(Some(guard))
}

#[cfg(test)]
mod tests {
    use super::{file_appender, level_directive};
    use std::io::Write;

    #[test]
    fn unknown_levels_fall_back_to_debug() {
        assert_eq!(level_directive("warn"), "warn");
        assert_eq!(level_directive("error"), "error");
        assert_eq!(level_directive(""), "debug");
        assert_eq!(level_directive("verbose"), "debug");
    }

    #[test]
    fn log_files_are_named_after_the_executable() {
        let dir = std::env::temp_dir().join(format!("relay-logs-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();

        let mut appender = file_appender(&dir, "relay-test").unwrap();
        appender.write_all(b"fresh\n").unwrap();
        appender.flush().unwrap();

        let names: Vec<String> = std::fs::read_dir(&dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names.len(), 1);
        assert!(names[0].starts_with("relay-test."));
        assert!(names[0].ends_with(".log"));

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
