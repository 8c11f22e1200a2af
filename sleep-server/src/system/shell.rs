/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! [`SystemControl`] backed by platform shell commands.
//!
//! | Operation | macOS | Linux |
//! |---|---|---|
//! | sleep | `osascript -e 'tell application "System Events" to sleep'` | `systemctl suspend` |
//! | set volume | `osascript -e 'set volume output volume N'` | `pactl set-sink-volume @DEFAULT_SINK@ N%` |
//! | get volume | `osascript -e 'output volume of (get volume settings)'` | `pactl get-sink-volume @DEFAULT_SINK@` |
//!
//! The dry-run backend only logs.  Whenever a volume cannot be read the last
//! volume set is reported instead (100 % before the first set).

use std::process::Command;
use std::sync::{Mutex, PoisonError};

use tracing::{debug, info, warn};

use super::{Backend, SystemControl, SystemError};
use crate::config::SystemConfig;
use crate::state::clamp_volume;

const FALLBACK_VOLUME: f64 = 100.0;

pub struct ShellSystemControl {
    backend: Backend,
    last_volume: Mutex<f64>,
}

impl ShellSystemControl {
    pub fn new(config: &SystemConfig) -> Self {
        let backend = config.backend.resolve();
        if config.backend == Backend::Auto && backend == Backend::DryRun {
            warn!("sleep and volume control are not implemented for this platform; running dry");
        }
        info!(%backend, "system control ready");

        Self {
            backend,
            last_volume: Mutex::new(FALLBACK_VOLUME),
        }
    }

    fn remember(&self, percent: f64) {
        *self
            .last_volume
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = percent;
    }

    fn last_volume(&self) -> f64 {
        *self
            .last_volume
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn read_volume(&self) -> Result<f64, SystemError> {
        match self.backend {
            Backend::Macos => {
                let out = run("osascript", &["-e", "output volume of (get volume settings)"])?;
                parse_osascript_volume(&out)
            }
            Backend::Linux => {
                let out = run("pactl", &["get-sink-volume", "@DEFAULT_SINK@"])?;
                parse_pactl_volume(&out)
            }
            Backend::Auto | Backend::DryRun => Ok(self.last_volume()),
        }
    }
}

impl SystemControl for ShellSystemControl {
    fn put_system_to_sleep(&self) {
        info!("Sleep now. Good night!");
        let result = match self.backend {
            Backend::Macos => run(
                "osascript",
                &["-e", "tell application \"System Events\" to sleep"],
            ),
            Backend::Linux => run("systemctl", &["suspend"]),
            Backend::Auto | Backend::DryRun => {
                info!("dry run: not putting the system to sleep");
                return;
            }
        };
        if let Err(e) = result {
            warn!("sleep request failed: {e}");
        }
    }

    fn set_volume(&self, percent: f64) {
        let percent = clamp_volume(percent);
        let level = percent.round() as u8;
        debug!(percent, level, "setting volume");

        let result = match self.backend {
            Backend::Macos => run(
                "osascript",
                &["-e", &format!("set volume output volume {level}")],
            ),
            Backend::Linux => run(
                "pactl",
                &["set-sink-volume", "@DEFAULT_SINK@", &format!("{level}%")],
            ),
            Backend::Auto | Backend::DryRun => Ok(String::new()),
        };

        match result {
            Ok(_) => self.remember(percent),
            Err(e) => warn!("setting the volume to {percent}% failed: {e}"),
        }
    }

    fn get_volume(&self) -> f64 {
        match self.read_volume() {
            Ok(v) => clamp_volume(v),
            Err(e) => {
                let fallback = self.last_volume();
                warn!("reading the volume failed, reporting {fallback}%: {e}");
                fallback
            }
        }
    }
}

// ── Process helpers ───────────────────────────────────────────────────────────

/// Run `program` to completion and return its stdout.
fn run(program: &str, args: &[&str]) -> Result<String, SystemError> {
    debug!(program, ?args, "spawning");
    let output = Command::new(program)
        .args(args)
        .output()
        .map_err(|source| SystemError::Spawn {
            program: program.to_string(),
            source,
        })?;

    if !output.status.success() {
        return Err(SystemError::Exit {
            program: program.to_string(),
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// `osascript` prints the output volume as a bare integer (`"42\n"`).
pub fn parse_osascript_volume(output: &str) -> Result<f64, SystemError> {
    let trimmed = output.trim();
    trimmed
        .parse::<f64>()
        .map_err(|_| SystemError::UnparsableVolume(trimmed.to_string()))
}

/// First percentage in `pactl get-sink-volume` output, e.g.
/// `Volume: front-left: 32768 /  50% / -18.06 dB, ...` → `50`.
pub fn parse_pactl_volume(output: &str) -> Result<f64, SystemError> {
    output
        .split_whitespace()
        .find_map(|token| token.trim_end_matches(',').strip_suffix('%')?.parse::<f64>().ok())
        .ok_or_else(|| SystemError::UnparsableVolume(output.trim().to_string()))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
