//! Protocol error types.

use thiserror::Error;

/// Result alias for protocol operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors produced while encoding or decoding wire data.
///
/// Decoding never panics on hostile input; every malformed packet maps to
/// one of these variants.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Packet text was empty.
    #[error("empty packet")]
    Empty,

    /// Leading packet type is not known to this layer.
    #[error("unknown {layer} packet type {found:?}")]
    UnknownPacketType {
        /// Which layer rejected the packet (`engine` or `socket`).
        layer: &'static str,
        /// The offending type character.
        found: char,
    },

    /// Ack id digits did not fit in a `u64`.
    #[error("malformed ack id")]
    MalformedAckId,

    /// Packet required an ack id but carried none.
    #[error("ack packet without id")]
    MissingAckId,

    /// Binary attachments are not supported by this client.
    #[error("binary packets are not supported")]
    BinaryUnsupported,

    /// Event packet data was not a `[name, ...]` array.
    #[error("invalid event: {0}")]
    InvalidEvent(&'static str),

    /// JSON body could not be parsed or produced.
    #[error("json error: {0}")]
    Json(String),

    /// Numeric enum value outside its known range.
    #[error("unknown {kind} value {value}")]
    UnknownValue {
        /// Enum being decoded.
        kind: &'static str,
        /// The value received.
        value: u8,
    },
}

impl From<serde_json::Error> for ProtocolError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}
