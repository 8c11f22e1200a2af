/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Request-path parsing.
//!
//! A request path is split into `/`-separated tokens.  It must contain the
//! [`API_ROOT`] token; the first keyword found (in [`KEYWORDS`] order)
//! selects the command and the token right after it is the argument:
//!
//! ```text
//! /sleepApi/setSleepTime/1800   → SetSleepTimer { seconds: 1800 }
//! /sleepApi/setVolume/35.5      → SetVolume { percent: 35.5 }
//! /sleepApi/status              → GetStatus
//! ```

use crate::command::{Command, CommandError};

use super::GatewayError;

pub const API_ROOT: &str = "sleepApi";

// ── Arguments ─────────────────────────────────────────────────────────────────

/// A value that can follow a keyword in the request path.
pub trait CommandArg: Sized {
    fn parse_arg(raw: &str) -> Option<Self>;
}

impl CommandArg for i64 {
    fn parse_arg(raw: &str) -> Option<Self> {
        raw.parse().ok()
    }
}

impl CommandArg for f64 {
    fn parse_arg(raw: &str) -> Option<Self> {
        raw.parse::<f64>().ok().filter(|v| v.is_finite())
    }
}

// ── Keywords ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Keyword {
    ImmediateSleep,
    SetSleepTime,
    SetSilenceTime,
    SetGoodNightTime,
    SetVolume,
    Reset,
    Status,
}

/// Path keywords in matching precedence.
const KEYWORDS: [(&str, Keyword); 7] = [
    ("immediateSleep", Keyword::ImmediateSleep),
    ("setSleepTime", Keyword::SetSleepTime),
    ("setSilenceTime", Keyword::SetSilenceTime),
    ("setGoodNightTime", Keyword::SetGoodNightTime),
    ("setVolume", Keyword::SetVolume),
    ("reset", Keyword::Reset),
    ("status", Keyword::Status),
];

/// Argument following `position`, or `err` if absent or unparsable.
fn arg_after<T: CommandArg>(
    tokens: &[&str],
    position: usize,
    err: CommandError,
) -> Result<T, CommandError> {
    tokens
        .get(position + 1)
        .and_then(|raw| T::parse_arg(raw))
        .ok_or(err)
}

// ── parse_request ─────────────────────────────────────────────────────────────

/// Translate a request path into a [`Command`].
///
/// # Errors
/// * [`GatewayError::UnknownResource`]: no API root or no known keyword.
/// * [`GatewayError::Invalid`]: a keyword whose argument is missing or not
///   a number.  Range checks (e.g. positive seconds) are left to the
///   control loop.
pub fn parse_request(path: &str) -> Result<Command, GatewayError> {
    let tokens: Vec<&str> = path.split('/').filter(|t| !t.is_empty()).collect();

    if !tokens.contains(&API_ROOT) {
        return Err(GatewayError::UnknownResource);
    }

    let (keyword, position) = KEYWORDS
        .iter()
        .find_map(|(name, keyword)| {
            tokens
                .iter()
                .position(|t| t == name)
                .map(|position| (*keyword, position))
        })
        .ok_or(GatewayError::UnknownResource)?;

    let command = match keyword {
        Keyword::ImmediateSleep => Command::ImmediateSleep,
        Keyword::SetSleepTime => Command::SetSleepTimer {
            seconds: arg_after(&tokens, position, CommandError::BadSleepTime)?,
        },
        Keyword::SetSilenceTime => Command::SetSilenceTimer {
            seconds: arg_after(&tokens, position, CommandError::BadSilenceTime)?,
        },
        Keyword::SetGoodNightTime => Command::SetGoodNightTimer {
            seconds: arg_after(&tokens, position, CommandError::BadGoodNightTime)?,
        },
        Keyword::SetVolume => Command::SetVolume {
            percent: arg_after(&tokens, position, CommandError::BadVolume)?,
        },
        Keyword::Reset => Command::UnsetTimer,
        Keyword::Status => Command::GetStatus,
    };

    Ok(command)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
