/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Transport failures between a [`ControlHandle`](super::ControlHandle) and
//! the control-loop task.
//!
//! Command rejections are not errors at this layer; they travel inside
//! [`Reply::Rejected`](crate::command::Reply::Rejected).  These variants only
//! mean the loop itself is unreachable, which the gateway reports as
//! `503 Service Unavailable`.

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ControlError {
    /// The loop has stopped and no longer accepts commands.
    #[error("control loop is not running")]
    LoopClosed,

    /// The loop accepted the command but dropped the reply channel.
    #[error("control loop dropped the reply")]
    ReplyDropped,
}
