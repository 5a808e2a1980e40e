//! Application side-effects and intents.
//!
//! This module defines the [`AppAction`] enum, which represents instructions
//! produced by the [`crate::App`] state machine for the runtime to execute.

use darkchat_proto::{EventName, Identity};

use crate::{Request, RequestId};

/// Actions produced by the App state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppAction {
    /// Render the UI.
    Render,

    /// Quit the application.
    Quit,

    /// Open the event socket as `identity`.
    Connect {
        /// Identity presented at connection time.
        identity: Identity,
    },

    /// Close the event socket.
    Disconnect,

    /// Forward pushes for `event`.
    Subscribe {
        /// Push event name.
        event: EventName,
    },

    /// Send a request over the event socket.
    Request {
        /// Token the reply is paired with.
        id: RequestId,
        /// What to send.
        request: Request,
    },

    /// `POST /user/login`.
    Login {
        /// Account email.
        email: String,
        /// Account password.
        password: String,
    },

    /// `POST /user/register`.
    Register {
        /// Display name for the new account.
        display_name: String,
        /// Account email.
        email: String,
        /// Account password.
        password: String,
    },

    /// Persist the identity.
    StoreIdentity(Identity),

    /// Remove the persisted identity.
    ClearIdentity,
}
