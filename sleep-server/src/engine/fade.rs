/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Pure arithmetic for linear volume fades.
//!
//! Free functions so the fade rules can be tested without a running timer.

use crate::state::clamp_volume;

/// Length of the good-night fade phase (10 minutes).
pub const DEFAULT_FADE_THRESHOLD_SECS: u32 = 600;

/// Fade window of a good-night run: the whole run if it is shorter than the
/// threshold, otherwise only its last `threshold` seconds.
pub fn good_night_window(initial: u32, threshold: u32) -> u32 {
    initial.min(threshold)
}

/// Volume after a linear fade: `volume_at_start * time_left / window`.
///
/// An empty window means the fade is over.
pub fn faded_volume(volume_at_start: f64, time_left: u32, window: u32) -> f64 {
    if window == 0 {
        return 0.0;
    }
    clamp_volume(volume_at_start * f64::from(time_left.min(window)) / f64::from(window))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
