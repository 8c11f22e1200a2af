/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Control-state data model for the sleep server.
//!
//! A single [`ControlState`] is owned by the control loop.  The running timer
//! is modelled as one [`Timer`] value so that "exactly one mode at a time" is
//! enforced by the type system instead of by a set of independent flags:
//!
//! ```text
//!                 ┌──────────── start(Sleep/Silence/GoodNight) ───────────┐
//!                 ▼                                                        │
//!   Idle ──► Sleep(countdown)        ──(expiry tick)──► sleep ──► Idle     │
//!        ──► Silence{countdown, vol} ──(expiry tick)──────────► Idle      │
//!        ──► GoodNight{countdown,vol}──(expiry tick)──► sleep ──► Idle     │
//!        ──► ImmediateSleep          ──(after reply)──► sleep ──► Idle     │
//!                 └──────────── any start / unset resets first ───────────┘
//! ```
//!
//! The wire model still speaks in `timeLeftSeconds == -1` terms; the
//! accessors on [`ControlState`] translate the typed representation back
//! to that convention.

use serde::Serialize;

// ── Mode ──────────────────────────────────────────────────────────────────────

/// Mutually exclusive operating mode, as reported in status snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Mode {
    Idle,
    SleepTimer,
    SilenceTimer,
    GoodNightTimer,
    ImmediateSleep,
}

impl Mode {
    /// Wire name of the mode (`"sleepTimer"`, ...).
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Idle => "idle",
            Mode::SleepTimer => "sleepTimer",
            Mode::SilenceTimer => "silenceTimer",
            Mode::GoodNightTimer => "goodNightTimer",
            Mode::ImmediateSleep => "immediateSleep",
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Countdown ─────────────────────────────────────────────────────────────────

/// Remaining and initial seconds of one timer run.
///
/// `initial` is fixed at construction; `time_left` only ever decreases, so
/// `time_left <= initial` holds for the whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Countdown {
    time_left: u32,
    initial: u32,
}

impl Countdown {
    pub fn new(seconds: u32) -> Self {
        Self {
            time_left: seconds,
            initial: seconds,
        }
    }

    pub fn time_left(&self) -> u32 {
        self.time_left
    }

    pub fn initial(&self) -> u32 {
        self.initial
    }

    /// Advance by one second and return the new remaining time.
    pub fn tick(&mut self) -> u32 {
        self.time_left = self.time_left.saturating_sub(1);
        self.time_left
    }

    pub fn is_expired(&self) -> bool {
        self.time_left == 0
    }
}

// ── Timer ─────────────────────────────────────────────────────────────────────

/// The currently active timer, carrying the data only that mode needs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Timer {
    Idle,
    /// Transient: set while an immediate-sleep command is being resolved.
    ImmediateSleep,
    Sleep(Countdown),
    Silence {
        countdown: Countdown,
        volume_at_start: f64,
    },
    /// `volume_at_start` is captured when the timer starts and moves with a
    /// manual volume change made before the fade window opens (see
    /// [`ControlState::rebase_good_night`]).  It is fixed once fading begins.
    GoodNight {
        countdown: Countdown,
        volume_at_start: f64,
    },
}

impl Timer {
    pub fn mode(&self) -> Mode {
        match self {
            Timer::Idle => Mode::Idle,
            Timer::ImmediateSleep => Mode::ImmediateSleep,
            Timer::Sleep(_) => Mode::SleepTimer,
            Timer::Silence { .. } => Mode::SilenceTimer,
            Timer::GoodNight { .. } => Mode::GoodNightTimer,
        }
    }

    pub fn countdown(&self) -> Option<&Countdown> {
        match self {
            Timer::Sleep(countdown)
            | Timer::Silence { countdown, .. }
            | Timer::GoodNight { countdown, .. } => Some(countdown),
            Timer::Idle | Timer::ImmediateSleep => None,
        }
    }
}

// ── Status snapshot ───────────────────────────────────────────────────────────

/// Extra acknowledgement attached to a status reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Acknowledgement {
    UnsettingTimer,
}

/// Point-in-time view of [`ControlState`] as returned to clients.
///
/// Serialises to `{"mode", "currentVolume"}` plus `timeToSleep` for the
/// sleep and good-night timers, or `timeToSilence` for the silence timer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSnapshot {
    pub mode: Mode,
    pub current_volume: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_to_sleep: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_to_silence: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acknowledge: Option<Acknowledgement>,
}

// ── ControlState ──────────────────────────────────────────────────────────────

/// Clamp a volume percentage into `[0, 100]`.
pub fn clamp_volume(percent: f64) -> f64 {
    percent.clamp(0.0, 100.0)
}

/// The single mutable state of the daemon.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlState {
    timer: Timer,
    current_volume: f64,
}

impl ControlState {
    /// Idle state with the volume read from the system at startup.
    pub fn new(current_volume: f64) -> Self {
        Self {
            timer: Timer::Idle,
            current_volume: clamp_volume(current_volume),
        }
    }

    pub fn timer(&self) -> &Timer {
        &self.timer
    }

    pub(crate) fn timer_mut(&mut self) -> &mut Timer {
        &mut self.timer
    }

    pub fn mode(&self) -> Mode {
        self.timer.mode()
    }

    /// `true` while a countdown is running (sleep, silence or good night).
    pub fn is_running(&self) -> bool {
        self.timer.countdown().is_some()
    }

    /// Remaining seconds, or `-1` when no countdown is running.
    pub fn time_left_seconds(&self) -> i64 {
        self.timer
            .countdown()
            .map_or(-1, |c| i64::from(c.time_left()))
    }

    /// Seconds the running countdown started with, or `-1`.
    pub fn initial_time_seconds(&self) -> i64 {
        self.timer
            .countdown()
            .map_or(-1, |c| i64::from(c.initial()))
    }

    /// Fade ceiling of a silence or good-night timer.  For good night it may
    /// have been moved since the start by a pre-fade volume change.
    pub fn volume_at_timer_start(&self) -> Option<f64> {
        match self.timer {
            Timer::Silence {
                volume_at_start, ..
            }
            | Timer::GoodNight {
                volume_at_start, ..
            } => Some(volume_at_start),
            _ => None,
        }
    }

    pub fn current_volume(&self) -> f64 {
        self.current_volume
    }

    pub fn set_current_volume(&mut self, percent: f64) {
        self.current_volume = clamp_volume(percent);
    }

    /// Move the fade ceiling of a good-night timer that has not started
    /// fading yet.  No-op for every other timer.
    pub fn rebase_good_night(&mut self, percent: f64) {
        if let Timer::GoodNight {
            volume_at_start, ..
        } = &mut self.timer
        {
            *volume_at_start = clamp_volume(percent);
        }
    }

    /// Replace whatever was running with `timer`.
    pub fn start(&mut self, timer: Timer) {
        self.reset();
        self.timer = timer;
    }

    /// Back to [`Timer::Idle`]; the cached volume is kept.
    pub fn reset(&mut self) {
        self.timer = Timer::Idle;
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        let remaining = self.timer.countdown().map(Countdown::time_left);
        let (time_to_sleep, time_to_silence) = match self.timer {
            Timer::Sleep(_) | Timer::GoodNight { .. } => (remaining, None),
            Timer::Silence { .. } => (None, remaining),
            Timer::Idle | Timer::ImmediateSleep => (None, None),
        };

        StatusSnapshot {
            mode: self.mode(),
            current_volume: self.current_volume,
            time_to_sleep,
            time_to_silence,
            acknowledge: None,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
