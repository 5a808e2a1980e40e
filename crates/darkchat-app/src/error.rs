//! Application error types.

use darkchat_proto::ProtocolError;
use thiserror::Error;

/// Errors surfaced by the application layer and its drivers.
#[derive(Debug, Error)]
pub enum AppError {
    /// Payload could not be encoded or a reply not decoded.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Request payload could not be serialized.
    #[error("encode failed: {0}")]
    Encode(#[from] serde_json::Error),

    /// Server answered with a non-success status.
    #[error("{message} (status {status})")]
    Rejected {
        /// Status code from the reply envelope.
        status: u16,
        /// Server-provided reason.
        message: String,
    },

    /// Login or registration was rejected.
    #[error("{0}")]
    Auth(String),

    /// Event socket could not be opened.
    #[error("connection failed: {0}")]
    Connection(String),

    /// Persisted session could not be written or removed.
    #[error("session error: {0}")]
    Session(String),
}
