//! Application input events.
//!
//! This module defines [`AppEvent`], the comprehensive set of inputs that drive
//! the [`crate::App`] state machine.
//!
//! Events originate from three sources:
//! - User interactions (Keyboard, Resize) and system ticks.
//! - Gateway notifications translated by the [`crate::Bridge`].
//! - Results of REST calls and session persistence run by the driver.

use darkchat_proto::{Identity, PushEvent};

use crate::{KeyInput, Reply, RequestId, RequestKind};

/// Events processed by the App state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// Keyboard input.
    Key(KeyInput),

    /// Periodic tick.
    Tick,

    /// Terminal resize (columns, rows).
    Resize(u16, u16),

    /// Identity loaded from the session store at startup.
    SessionRestored(Identity),

    /// Event socket handshake completed.
    Connected,

    /// Event socket closed or could not be opened.
    Disconnected {
        /// Why.
        reason: String,
    },

    /// Reply to a request.
    Reply {
        /// Request the reply answers.
        id: RequestId,
        /// Decoded payload.
        reply: Reply,
    },

    /// Request failed: error status, undecodable reply, or not connected.
    RequestFailed {
        /// Failed request.
        id: RequestId,
        /// Kind of the failed request.
        kind: RequestKind,
        /// Failure description.
        message: String,
    },

    /// Server push.
    Push(PushEvent),

    /// Login accepted.
    LoginSucceeded(Identity),

    /// Login rejected or unreachable.
    LoginFailed {
        /// Failure description.
        message: String,
    },

    /// Account created.
    Registered,

    /// Registration rejected or unreachable.
    RegisterFailed {
        /// Failure description.
        message: String,
    },

    /// Error occurred.
    Error {
        /// Error description.
        message: String,
    },
}
