/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! The control loop: sole owner of the [`ControlState`].
//!
//! [`ControlLoop`] is the synchronous core.  It applies one [`Command`] or
//! one tick at a time and performs the resulting [`SystemControl`] calls.
//! [`ControlLoop::spawn`] (see `actor.rs`) moves it onto a tokio task that
//! multiplexes a command channel and a one-second ticker, which is the only
//! way the rest of the daemon reaches the state.
//!
//! | Concern | Mechanism |
//! |---|---|
//! | Messages | [`Command`] / [`Reply`] enums |
//! | Timer state | one [`Timer`] enum value inside [`ControlState`] |
//! | Tick | `tokio::time::interval` polled in the same `select!` as commands |
//! | Reply path | one `oneshot` channel per request |
//! | Settings | [`TimerConfig`] passed to [`ControlLoop::new`] |

mod actor;
pub mod error;

pub use actor::ControlHandle;
pub use error::ControlError;

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::command::{Command, CommandError, Reply};
use crate::config::TimerConfig;
use crate::engine::TimerEngine;
use crate::state::{clamp_volume, Acknowledgement, ControlState, Countdown, StatusSnapshot, Timer};
use crate::system::SystemControl;

// ── Handling results ──────────────────────────────────────────────────────────

/// Work that must wait until the client has its reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AfterReply {
    /// Put the machine to sleep, then return to idle.
    Sleep,
}

/// Result of [`ControlLoop::handle`].
#[derive(Debug, Clone, PartialEq)]
pub struct Handled {
    pub reply: Reply,
    pub after_reply: Option<AfterReply>,
}

impl From<Reply> for Handled {
    fn from(reply: Reply) -> Self {
        Self {
            reply,
            after_reply: None,
        }
    }
}

// ── ControlLoop ───────────────────────────────────────────────────────────────

pub struct ControlLoop {
    state: ControlState,
    engine: TimerEngine,
    system: Arc<dyn SystemControl>,
}

impl ControlLoop {
    /// Idle loop whose cached volume is read from `system`.
    pub fn new(timer: &TimerConfig, system: Arc<dyn SystemControl>) -> Self {
        let volume = system.get_volume();
        info!(
            current_volume = volume,
            fade_threshold_secs = timer.fade_threshold_secs,
            "control loop initialised"
        );

        Self {
            state: ControlState::new(volume),
            engine: TimerEngine::new(timer.fade_threshold_secs),
            system,
        }
    }

    pub fn state(&self) -> &ControlState {
        &self.state
    }

    /// Apply `command` and build its reply.
    ///
    /// A rejected command leaves the state untouched.  Anything returned in
    /// [`Handled::after_reply`] must be passed to [`complete`](Self::complete)
    /// once the reply is on its way.
    pub fn handle(&mut self, command: Command) -> Handled {
        debug!(command = command.name(), "command received");

        let result = match command {
            Command::ImmediateSleep => {
                info!("immediate sleep requested");
                self.state.start(Timer::ImmediateSleep);
                return Handled {
                    reply: Reply::Status(self.state.snapshot()),
                    after_reply: Some(AfterReply::Sleep),
                };
            }
            Command::SetSleepTimer { seconds } => self.start_sleep_timer(seconds),
            Command::SetSilenceTimer { seconds } => self.start_silence_timer(seconds),
            Command::SetGoodNightTimer { seconds } => self.start_good_night_timer(seconds),
            Command::SetVolume { percent } => self.set_volume(percent),
            Command::UnsetTimer => Ok(self.unset_timer()),
            Command::GetStatus => {
                self.refresh_volume();
                Ok(self.state.snapshot())
            }
        };

        if let Err(e) = &result {
            warn!(command = command.name(), "command rejected: {e}");
        }
        Reply::from(result).into()
    }

    /// Run deferred work from [`handle`](Self::handle).
    pub fn complete(&mut self, after: AfterReply) {
        match after {
            AfterReply::Sleep => {
                self.state.reset();
                self.system.put_system_to_sleep();
            }
        }
    }

    /// [`handle`](Self::handle) followed by [`complete`](Self::complete).
    pub fn execute(&mut self, command: Command) -> Reply {
        let handled = self.handle(command);
        if let Some(after) = handled.after_reply {
            self.complete(after);
        }
        handled.reply
    }

    /// One timer-engine tick plus its side effects.
    pub fn tick(&mut self) {
        let effects = self.engine.advance(&mut self.state);

        if let Some(volume) = effects.volume {
            self.system.set_volume(volume);
            self.state.set_current_volume(volume);
        }
        if effects.sleep {
            info!("timer elapsed, putting the system to sleep");
            self.system.put_system_to_sleep();
        }
    }

    // ── Command handlers ──────────────────────────────────────────────────────

    fn start_sleep_timer(&mut self, seconds: i64) -> Result<StatusSnapshot, CommandError> {
        let seconds = positive_seconds(seconds, CommandError::BadSleepTime)?;
        self.state.start(Timer::Sleep(Countdown::new(seconds)));
        info!(seconds, "sleep timer started");
        Ok(self.state.snapshot())
    }

    fn start_silence_timer(&mut self, seconds: i64) -> Result<StatusSnapshot, CommandError> {
        let seconds = positive_seconds(seconds, CommandError::BadSilenceTime)?;
        let volume_at_start = self.refresh_volume();
        self.state.start(Timer::Silence {
            countdown: Countdown::new(seconds),
            volume_at_start,
        });
        info!(seconds, volume_at_start, "silence timer started");
        Ok(self.state.snapshot())
    }

    fn start_good_night_timer(&mut self, seconds: i64) -> Result<StatusSnapshot, CommandError> {
        let seconds = positive_seconds(seconds, CommandError::BadGoodNightTime)?;
        let volume_at_start = self.refresh_volume();
        self.state.start(Timer::GoodNight {
            countdown: Countdown::new(seconds),
            volume_at_start,
        });
        info!(seconds, volume_at_start, "good night timer started");
        Ok(self.state.snapshot())
    }

    fn set_volume(&mut self, percent: f64) -> Result<StatusSnapshot, CommandError> {
        if !percent.is_finite() || percent < 0.0 {
            return Err(CommandError::BadVolume);
        }
        if self.engine.is_volume_auto_controlled(self.state.timer()) {
            return Err(CommandError::VolumeAutoControlled);
        }

        let percent = clamp_volume(percent);
        self.system.set_volume(percent);
        self.state.set_current_volume(percent);
        // only reachable before the fade window opens
        self.state.rebase_good_night(percent);
        Ok(self.state.snapshot())
    }

    fn unset_timer(&mut self) -> StatusSnapshot {
        let was_running = self.state.is_running();
        self.state.reset();

        let mut snapshot = self.state.snapshot();
        if was_running {
            info!("timer unset");
            snapshot.acknowledge = Some(Acknowledgement::UnsettingTimer);
        }
        snapshot
    }

    fn refresh_volume(&mut self) -> f64 {
        self.state.set_current_volume(self.system.get_volume());
        self.state.current_volume()
    }
}

/// Timer length in `1..=u32::MAX`, or `err`.
fn positive_seconds(seconds: i64, err: CommandError) -> Result<u32, CommandError> {
    u32::try_from(seconds)
        .ok()
        .filter(|s| *s > 0)
        .ok_or(err)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
