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

use anyhow::{bail, Context};
use std::path::{Path, PathBuf};

/// File name of the running executable.
pub(crate) fn executable_name() -> anyhow::Result<String> {
    let path = std::env::current_exe().context("unable to locate the running executable")?;
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .context("executable path has no file name")
}

/// Probes `dir` by creating and removing a scratch file.
pub(crate) fn is_dir_writable(dir: &Path) -> bool {
    let probe = dir.join(".writetest");
    match std::fs::File::create(&probe) {
        Ok(_) => {
            let _ = std::fs::remove_file(&probe);
            true
        }
        Err(_) => false,
    }
}

/// Writes the current process id to `<dir>/<exe_name>.pid`.
pub(crate) fn write_pid_file(dir: &Path, exe_name: &str) -> anyhow::Result<PathBuf> {
    if !is_dir_writable(dir) {
        bail!("directory is not writable: {}", dir.display());
    }
    let path = dir.join(format!("{exe_name}.pid"));
    std::fs::write(&path, std::process::id().to_string())
        .with_context(|| format!("unable to write pid file {}", path.display()))?;
    Ok(path)
}
