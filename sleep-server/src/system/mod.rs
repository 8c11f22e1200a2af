/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! OS-facing sleep and volume control.
//!
//! The control loop depends only on the [`SystemControl`] trait.  Calls are
//! best-effort: implementations log their own failures and never report them
//! back, so a failed sleep still leaves the control state reset to idle.

pub mod mock;
pub mod shell;

pub use mock::MockSystemControl;
pub use shell::ShellSystemControl;

use serde::Deserialize;
use thiserror::Error;

// ── SystemControl ─────────────────────────────────────────────────────────────

/// Sleep and volume primitives of the host machine.
///
/// Implementations may block (they usually spawn a process); the control
/// loop calls them from its own task, one at a time.
pub trait SystemControl: Send + Sync {
    /// Put the machine to sleep.
    fn put_system_to_sleep(&self);

    /// Set the output volume in percent; values are clamped to `[0, 100]`.
    fn set_volume(&self, percent: f64);

    /// Current output volume in percent, within `[0, 100]`.
    fn get_volume(&self) -> f64;
}

// ── Backend selection ─────────────────────────────────────────────────────────

/// Which shell commands [`ShellSystemControl`] invokes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Backend {
    /// Pick by target OS; dry-run where the OS is unsupported.
    #[default]
    Auto,
    /// `osascript`
    Macos,
    /// `systemctl` + `pactl`
    Linux,
    /// Log only, remember the volume in memory.
    DryRun,
}

impl Backend {
    /// Replace [`Backend::Auto`] with the backend for the current OS.
    pub fn resolve(self) -> Backend {
        match self {
            Backend::Auto if cfg!(target_os = "macos") => Backend::Macos,
            Backend::Auto if cfg!(target_os = "linux") => Backend::Linux,
            Backend::Auto => Backend::DryRun,
            other => other,
        }
    }
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Backend::Auto => "auto",
            Backend::Macos => "macos",
            Backend::Linux => "linux",
            Backend::DryRun => "dry-run",
        };
        f.write_str(name)
    }
}

// ── Errors ────────────────────────────────────────────────────────────────────

/// Failure of one shell invocation.  Logged, never propagated to clients.
#[derive(Debug, Error)]
pub enum SystemError {
    #[error("failed to run '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{program}' exited with {status}: {stderr}")]
    Exit {
        program: String,
        status: String,
        stderr: String,
    },

    #[error("cannot read a volume from '{0}'")]
    UnparsableVolume(String),
}
