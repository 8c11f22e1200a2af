/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Recording [`SystemControl`] for tests.

use std::sync::{Mutex, MutexGuard, PoisonError};

use super::SystemControl;
use crate::state::clamp_volume;

#[derive(Debug, Default)]
struct Recorded {
    volume: f64,
    sleeps: usize,
    volume_history: Vec<f64>,
}

/// A system that never touches the host: it remembers the volume, counts
/// sleep requests and records every volume change.
///
/// ```
/// use sleep_server::system::{MockSystemControl, SystemControl};
///
/// let mock = MockSystemControl::new(80.0);
/// mock.set_volume(120.0);
/// assert_eq!(mock.get_volume(), 100.0);
/// assert_eq!(mock.sleep_count(), 0);
/// ```
#[derive(Debug, Default)]
pub struct MockSystemControl {
    recorded: Mutex<Recorded>,
}

impl MockSystemControl {
    pub fn new(volume: f64) -> Self {
        Self {
            recorded: Mutex::new(Recorded {
                volume: clamp_volume(volume),
                ..Default::default()
            }),
        }
    }

    fn recorded(&self) -> MutexGuard<'_, Recorded> {
        self.recorded.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of `put_system_to_sleep` calls so far.
    pub fn sleep_count(&self) -> usize {
        self.recorded().sleeps
    }

    /// Every value passed to `set_volume`, after clamping.
    pub fn volume_history(&self) -> Vec<f64> {
        self.recorded().volume_history.clone()
    }

    /// Simulate the user changing the volume outside the daemon.
    pub fn set_external_volume(&self, percent: f64) {
        self.recorded().volume = clamp_volume(percent);
    }
}

impl SystemControl for MockSystemControl {
    fn put_system_to_sleep(&self) {
        self.recorded().sleeps += 1;
    }

    fn set_volume(&self, percent: f64) {
        let mut recorded = self.recorded();
        recorded.volume = clamp_volume(percent);
        let v = recorded.volume;
        recorded.volume_history.push(v);
    }

    fn get_volume(&self) -> f64 {
        self.recorded().volume
    }
}
