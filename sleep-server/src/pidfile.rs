/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Pid file for daemon mode.
//!
//! [`PidFile::create`] refuses to start a second daemon while the recorded
//! process is still alive, replaces a stale file otherwise, and the guard
//! removes the file when dropped.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use tracing::{info, warn};

#[derive(Debug)]
pub struct PidFile {
    path: PathBuf,
}

impl PidFile {
    /// Write the current process id to `path`.
    ///
    /// # Errors
    /// Fails if `path` names a running process or cannot be written.
    pub fn create(path: &Path) -> Result<Self> {
        if let Ok(existing) = fs::read_to_string(path) {
            match existing.trim().parse::<u32>() {
                Ok(pid) if process_alive(pid) => {
                    bail!(
                        "sleep server already running with pid {pid} (pid file {})",
                        path.display()
                    );
                }
                _ => warn!("replacing stale pid file {}", path.display()),
            }
        }

        let pid = std::process::id();
        fs::write(path, format!("{pid}\n"))
            .with_context(|| format!("Cannot write pid file: {}", path.display()))?;
        info!(pid, "pid file written to {}", path.display());

        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for PidFile {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            warn!("cannot remove pid file {}: {e}", self.path.display());
        }
    }
}

#[cfg(target_os = "linux")]
fn process_alive(pid: u32) -> bool {
    Path::new(&format!("/proc/{pid}")).exists()
}

#[cfg(not(target_os = "linux"))]
fn process_alive(pid: u32) -> bool {
    std::process::Command::new("kill")
        .args(["-0", &pid.to_string()])
        .stderr(std::process::Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
