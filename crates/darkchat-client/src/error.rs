//! Client error types.

use std::io;

use darkchat_proto::ProtocolError;
use thiserror::Error;

/// Errors from the persisted session store.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Reading or writing the session file failed.
    #[error("session I/O error: {0}")]
    Io(#[from] io::Error),

    /// Identity could not be encoded.
    #[error("session encode failed: {0}")]
    Encode(String),

    /// Session file exists but is not a valid identity.
    #[error("session decode failed: {0}")]
    Decode(String),
}

/// Gateway errors.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Connection could not be established.
    #[error("connection failed: {0}")]
    Connection(String),

    /// Stream error on an open connection.
    #[error("stream error: {0}")]
    Stream(String),

    /// Packet could not be encoded or decoded.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}
