/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Sleep server – HTTP-controlled sleep, silence and good-night timers.
//!
//! Module layout:
//!
//! ```text
//! lib.rs
//! ├── state/      – ControlState, Timer, status snapshots
//! ├── command/    – Command / Reply messages, CommandError
//! ├── engine/     – per-second tick and volume fade arithmetic
//! ├── control/    – the control loop and its tokio actor
//! ├── system/     – SystemControl trait, shell backends, mock
//! ├── gateway/    – axum router and path parsing
//! ├── config/     – YAML configuration + CLI overrides
//! └── pidfile     – daemon-mode pid file
//! ```
//!
//! Data flow: gateway → [`command::Command`] → [`control::ControlHandle`] →
//! control loop (mutates state, calls [`system::SystemControl`]) →
//! [`command::Reply`] → gateway → client.  The ticker runs inside the same
//! loop.

pub mod command;
pub mod config;
pub mod control;
pub mod engine;
pub mod gateway;
pub mod pidfile;
pub mod state;
pub mod system;
