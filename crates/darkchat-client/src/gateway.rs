//! Messages exchanged with the gateway connection task.
//!
//! The gateway is a thin pipe: requests go out tagged with an id, replies
//! come back with the same id, and pushes arrive untagged. Pairing a reply
//! with what it answers is the caller's job.

use darkchat_proto::EventName;
use serde_json::Value;

/// Instruction for the gateway.
#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    /// Send a request event. The reply carries the same `id`.
    Request {
        /// Request id, used as the Socket.IO ack id.
        id: u64,
        /// Event to emit.
        event: EventName,
        /// Event payload.
        payload: Value,
    },

    /// Forward pushes for `event` from now on.
    ///
    /// Subscribing twice to the same event has no further effect.
    Subscribe(EventName),
}

/// Notification from the gateway.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    /// Namespace handshake completed.
    Connected,

    /// Reply to an earlier [`Outbound::Request`].
    Reply {
        /// Id of the answered request.
        id: u64,
        /// Raw reply envelope.
        payload: Value,
    },

    /// Server-initiated event the caller subscribed to.
    Push {
        /// Event name.
        event: EventName,
        /// Raw event payload.
        payload: Value,
    },

    /// Connection ended. No further messages follow.
    Closed {
        /// Why the connection ended.
        reason: String,
    },
}
