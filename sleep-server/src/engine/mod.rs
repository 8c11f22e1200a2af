/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Per-second timer engine.
//!
//! [`TimerEngine::advance`] is one tick: it moves the running countdown one
//! second forward, resets the state when the countdown expires, and returns
//! the OS side effects the caller must perform as [`TickEffects`].  Keeping
//! the side effects out of the engine lets the control loop apply them
//! through its `SystemControl` and keeps this module free of I/O.
//!
//! | Timer | Each tick | On expiry |
//! |---|---|---|
//! | Sleep | count down | sleep, reset |
//! | Silence | count down, fade over the whole run | volume 0, reset |
//! | GoodNight | count down, fade once inside `min(initial, T)` | volume 0, sleep, reset |
//! | Idle / ImmediateSleep | nothing | – |

pub mod fade;

use tracing::{debug, info};

use crate::state::{ControlState, Timer};

use fade::{faded_volume, good_night_window};

// ── Tick effects ──────────────────────────────────────────────────────────────

/// Side effects requested by one tick, applied in field order.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TickEffects {
    /// New system volume, if the fade moved it.
    pub volume: Option<f64>,
    /// Put the machine to sleep.
    pub sleep: bool,
}

impl TickEffects {
    pub fn is_empty(&self) -> bool {
        self.volume.is_none() && !self.sleep
    }
}

// ── TimerEngine ───────────────────────────────────────────────────────────────

/// Tick logic, parameterised by the good-night fade threshold `T`.
#[derive(Debug, Clone, Copy)]
pub struct TimerEngine {
    fade_threshold_secs: u32,
}

impl Default for TimerEngine {
    fn default() -> Self {
        Self::new(fade::DEFAULT_FADE_THRESHOLD_SECS)
    }
}

impl TimerEngine {
    pub fn new(fade_threshold_secs: u32) -> Self {
        Self {
            fade_threshold_secs,
        }
    }

    /// Run one tick against `state`.
    pub fn advance(&self, state: &mut ControlState) -> TickEffects {
        let effects = match state.timer_mut() {
            Timer::Idle | Timer::ImmediateSleep => return TickEffects::default(),

            Timer::Sleep(countdown) => {
                let left = countdown.tick();
                debug!(time_left = left, "sleep timer tick");
                TickEffects {
                    volume: None,
                    sleep: left == 0,
                }
            }

            Timer::Silence {
                countdown,
                volume_at_start,
            } => {
                let left = countdown.tick();
                let volume = faded_volume(*volume_at_start, left, countdown.initial());
                debug!(time_left = left, volume, "silence timer tick");
                TickEffects {
                    volume: Some(volume),
                    sleep: false,
                }
            }

            Timer::GoodNight {
                countdown,
                volume_at_start,
            } => {
                let left = countdown.tick();
                let window = good_night_window(countdown.initial(), self.fade_threshold_secs);
                let volume = (left <= window).then(|| faded_volume(*volume_at_start, left, window));
                debug!(time_left = left, ?volume, "good night timer tick");
                TickEffects {
                    volume,
                    sleep: left == 0,
                }
            }
        };

        if state.timer().countdown().is_some_and(|c| c.is_expired()) {
            info!(mode = %state.mode(), "timer expired");
            state.reset();
        }

        effects
    }

    /// `true` while a fade owns the volume and manual changes must be refused.
    ///
    /// The silence timer fades for its entire run; the good-night timer only
    /// once the remaining time is inside its fade window.
    pub fn is_volume_auto_controlled(&self, timer: &Timer) -> bool {
        match timer {
            Timer::Silence { .. } => true,
            Timer::GoodNight { countdown, .. } => {
                countdown.time_left()
                    <= good_night_window(countdown.initial(), self.fade_threshold_secs)
            }
            Timer::Idle | Timer::ImmediateSleep | Timer::Sleep(_) => false,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
