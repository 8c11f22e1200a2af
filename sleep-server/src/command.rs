/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Messages exchanged with the control loop.
//!
//! Every request is one [`Command`]; every answer is one [`Reply`].  Payloads
//! are typed, so a malformed message cannot reach the loop: anything the
//! gateway cannot turn into a `Command` is answered there.

use thiserror::Error;

use crate::state::StatusSnapshot;

// ── Commands ──────────────────────────────────────────────────────────────────

/// A request for the control loop.
///
/// Timer payloads are signed so that the loop itself, not only the gateway,
/// enforces the "positive seconds" precondition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    ImmediateSleep,
    SetSleepTimer { seconds: i64 },
    SetSilenceTimer { seconds: i64 },
    SetGoodNightTimer { seconds: i64 },
    SetVolume { percent: f64 },
    UnsetTimer,
    GetStatus,
}

impl Command {
    /// Short name used in log lines.
    pub fn name(&self) -> &'static str {
        match self {
            Command::ImmediateSleep => "immediate_sleep",
            Command::SetSleepTimer { .. } => "set_sleep_timer",
            Command::SetSilenceTimer { .. } => "set_silence_timer",
            Command::SetGoodNightTimer { .. } => "set_good_night_timer",
            Command::SetVolume { .. } => "set_volume",
            Command::UnsetTimer => "unset_timer",
            Command::GetStatus => "get_status",
        }
    }

    /// `true` for the read-only status query.
    pub fn is_query(&self) -> bool {
        matches!(self, Command::GetStatus)
    }
}

// ── Errors ────────────────────────────────────────────────────────────────────

/// Validation failures and policy rejections.
///
/// The `Display` text is exactly the `error` string sent to clients.  A
/// rejected command never mutates state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("bad sleep time")]
    BadSleepTime,

    #[error("bad silence time")]
    BadSilenceTime,

    #[error("bad good night time")]
    BadGoodNightTime,

    #[error("bad volume percentage")]
    BadVolume,

    /// A silence or good-night fade currently owns the volume.
    #[error("volume is auto-controlled")]
    VolumeAutoControlled,
}

// ── Replies ───────────────────────────────────────────────────────────────────

/// The control loop's answer to one [`Command`].
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Status(StatusSnapshot),
    Rejected(CommandError),
}

impl Reply {
    pub fn status(&self) -> Option<&StatusSnapshot> {
        match self {
            Reply::Status(snapshot) => Some(snapshot),
            Reply::Rejected(_) => None,
        }
    }

    pub fn error(&self) -> Option<CommandError> {
        match self {
            Reply::Status(_) => None,
            Reply::Rejected(e) => Some(*e),
        }
    }
}

impl From<Result<StatusSnapshot, CommandError>> for Reply {
    fn from(result: Result<StatusSnapshot, CommandError>) -> Self {
        match result {
            Ok(snapshot) => Reply::Status(snapshot),
            Err(e) => Reply::Rejected(e),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
