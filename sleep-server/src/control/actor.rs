/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Tokio driver for [`ControlLoop`].
//!
//! One task owns the loop and waits on two sources: the command channel and
//! the ticker.  Each wake-up is a synchronous step that may block in a
//! `SystemControl` call, so the step is moved onto tokio's blocking pool and
//! awaited.  The next message is only taken once the step has returned the
//! loop, so commands and ticks are applied in a single total order.

use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::{self, JoinError, JoinHandle};
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, error, info};

use super::{ControlError, ControlLoop};
use crate::command::{Command, Reply};

/// Commands buffered before senders start waiting.
const COMMAND_QUEUE_DEPTH: usize = 64;

struct Envelope {
    command: Command,
    reply_tx: oneshot::Sender<Reply>,
}

/// Cloneable client of a running control loop.
///
/// The loop stops once every handle has been dropped.
#[derive(Debug, Clone)]
pub struct ControlHandle {
    tx: mpsc::Sender<Envelope>,
}

impl ControlHandle {
    /// Send `command` and wait for its reply.  There is no deadline.
    pub async fn dispatch(&self, command: Command) -> Result<Reply, ControlError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(Envelope { command, reply_tx })
            .await
            .map_err(|_| ControlError::LoopClosed)?;
        reply_rx.await.map_err(|_| ControlError::ReplyDropped)
    }
}

impl ControlLoop {
    /// Move the loop onto a tokio task ticking every `tick_interval`.
    pub fn spawn(self, tick_interval: Duration) -> (ControlHandle, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(COMMAND_QUEUE_DEPTH);
        let task = tokio::spawn(self.run(rx, tick_interval));
        (ControlHandle { tx }, task)
    }

    async fn run(self, mut rx: mpsc::Receiver<Envelope>, tick_interval: Duration) {
        // First tick one period from now, not immediately.
        let mut ticker = time::interval_at(Instant::now() + tick_interval, tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(tick_interval_ms = tick_interval.as_millis() as u64, "control loop running");

        let mut control = self;
        loop {
            let stepped = tokio::select! {
                message = rx.recv() => {
                    let Some(envelope) = message else {
                        break;
                    };
                    control.step(move |cl| cl.serve(envelope)).await
                }
                _ = ticker.tick() => control.step(ControlLoop::tick).await,
            };

            match stepped {
                Ok((next, ())) => control = next,
                Err(e) => {
                    error!("control loop step failed, stopping: {e}");
                    return;
                }
            }
        }

        info!("all handles dropped, control loop stopped");
    }

    /// Run `f` on the blocking pool and hand the loop back with its result.
    async fn step<F, R>(self, f: F) -> Result<(Self, R), JoinError>
    where
        F: FnOnce(&mut ControlLoop) -> R + Send + 'static,
        R: Send + 'static,
    {
        task::spawn_blocking(move || {
            let mut control = self;
            let out = f(&mut control);
            (control, out)
        })
        .await
    }

    /// Answer one request, then run any work deferred until after the reply.
    fn serve(&mut self, Envelope { command, reply_tx }: Envelope) {
        let handled = self.handle(command);
        if reply_tx.send(handled.reply).is_err() {
            debug!(command = command.name(), "requester went away before the reply");
        }
        if let Some(after) = handled.after_reply {
            self.complete(after);
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use tokio::task::JoinSet;

    use crate::command::CommandError;
    use crate::config::TimerConfig;
    use crate::state::{Mode, StatusSnapshot};
    use crate::system::{MockSystemControl, SystemControl};

    const SECOND: Duration = Duration::from_secs(1);

    fn spawn_loop(volume: f64) -> (ControlHandle, JoinHandle<()>, Arc<MockSystemControl>) {
        let system = Arc::new(MockSystemControl::new(volume));
        let (handle, task) =
            ControlLoop::new(&TimerConfig::default(), system.clone()).spawn(SECOND);
        (handle, task, system)
    }

    async fn status(handle: &ControlHandle) -> StatusSnapshot {
        match handle.dispatch(Command::GetStatus).await.unwrap() {
            Reply::Status(s) => s,
            Reply::Rejected(e) => panic!("status rejected: {e}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn ticker_drives_sleep_timer_to_expiry() {
        let (handle, _task, system) = spawn_loop(50.0);
        handle
            .dispatch(Command::SetSleepTimer { seconds: 3 })
            .await
            .unwrap();

        time::sleep(Duration::from_millis(1_500)).await;
        assert_eq!(status(&handle).await.time_to_sleep, Some(2));

        time::sleep(Duration::from_secs(2)).await;
        assert_eq!(system.sleep_count(), 1);
        assert_eq!(status(&handle).await.mode, Mode::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn ticker_fades_silence_timer() {
        let (handle, _task, system) = spawn_loop(80.0);
        handle
            .dispatch(Command::SetSilenceTimer { seconds: 10 })
            .await
            .unwrap();

        time::sleep(Duration::from_millis(5_500)).await;
        assert_eq!(status(&handle).await.current_volume, 40.0);

        time::sleep(Duration::from_secs(5)).await;
        let snap = status(&handle).await;
        assert_eq!(snap.mode, Mode::Idle);
        assert_eq!(snap.current_volume, 0.0);
        assert_eq!(system.sleep_count(), 0);
    }

    #[tokio::test]
    async fn immediate_sleep_reply_precedes_sleep_call() {
        let (handle, _task, system) = spawn_loop(50.0);
        let reply = handle.dispatch(Command::ImmediateSleep).await.unwrap();
        assert_eq!(reply.status().map(|s| s.mode), Some(Mode::ImmediateSleep));

        // the next command is only served after the deferred sleep ran
        let snap = status(&handle).await;
        assert_eq!(snap.mode, Mode::Idle);
        assert_eq!(system.sleep_count(), 1);
    }

    /// Blocks the calling thread in `set_volume`, like a slow shell command.
    struct SlowVolume {
        inner: MockSystemControl,
        delay: Duration,
    }

    impl SystemControl for SlowVolume {
        fn put_system_to_sleep(&self) {
            self.inner.put_system_to_sleep();
        }

        fn set_volume(&self, percent: f64) {
            std::thread::sleep(self.delay);
            self.inner.set_volume(percent);
        }

        fn get_volume(&self) -> f64 {
            self.inner.get_volume()
        }
    }

    #[tokio::test]
    async fn slow_system_call_leaves_runtime_free_and_keeps_order() {
        let system = Arc::new(SlowVolume {
            inner: MockSystemControl::new(50.0),
            delay: Duration::from_millis(300),
        });
        let (handle, _task) = ControlLoop::new(&TimerConfig::default(), system.clone())
            .spawn(Duration::from_secs(3600));

        let set = {
            let handle = handle.clone();
            tokio::spawn(async move { handle.dispatch(Command::SetVolume { percent: 20.0 }).await })
        };
        let queued = {
            let handle = handle.clone();
            tokio::spawn(async move { status(&handle).await })
        };

        // single-threaded runtime: this timer only fires on time if the
        // volume call is not holding the thread
        let started = std::time::Instant::now();
        time::sleep(Duration::from_millis(20)).await;
        assert!(started.elapsed() < Duration::from_millis(250));

        let reply = set.await.unwrap().unwrap();
        assert_eq!(reply.status().map(|s| s.current_volume), Some(20.0));
        assert_eq!(queued.await.unwrap().current_volume, 20.0);
        assert_eq!(system.inner.volume_history(), vec![20.0]);
    }

    #[tokio::test]
    async fn rejections_travel_as_replies() {
        let (handle, _task, _) = spawn_loop(50.0);
        let reply = handle
            .dispatch(Command::SetGoodNightTimer { seconds: 0 })
            .await
            .unwrap();
        assert_eq!(reply, Reply::Rejected(CommandError::BadGoodNightTime));
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_status_reads_are_never_torn() {
        let (handle, _task, _) = spawn_loop(60.0);
        handle
            .dispatch(Command::SetGoodNightTimer { seconds: 4 })
            .await
            .unwrap();

        let mut set = JoinSet::new();
        for i in 0..64u64 {
            let handle = handle.clone();
            set.spawn(async move {
                time::sleep(Duration::from_millis(i * 100)).await;
                status(&handle).await
            });
        }

        let mut saw_running = false;
        let mut saw_idle = false;
        while let Some(joined) = set.join_next().await {
            let snap = joined.unwrap();
            match snap.mode {
                Mode::GoodNightTimer => {
                    saw_running = true;
                    let left = snap.time_to_sleep.expect("running timer reports its time");
                    assert!((1..=4).contains(&left));
                    assert_eq!(snap.current_volume, 60.0 * f64::from(left) / 4.0);
                }
                Mode::Idle => {
                    saw_idle = true;
                    assert_eq!(snap.time_to_sleep, None);
                    assert_eq!(snap.current_volume, 0.0);
                }
                other => panic!("unexpected mode {other}"),
            }
            assert_eq!(snap.time_to_silence, None);
        }
        assert!(saw_running && saw_idle);
    }

    #[tokio::test]
    async fn dispatch_after_shutdown_reports_loop_closed() {
        let (handle, task, _) = spawn_loop(50.0);
        task.abort();
        let _ = task.await;

        let err = handle.dispatch(Command::GetStatus).await.unwrap_err();
        assert_eq!(err, ControlError::LoopClosed);
    }

    #[tokio::test]
    async fn loop_stops_when_handles_are_dropped() {
        let (handle, task, _) = spawn_loop(50.0);
        drop(handle);
        task.await.unwrap();
    }
}
