//! DarkChat wire protocol
//!
//! Types exchanged with the DarkChat backend and the text codec for the
//! Socket.IO transport that carries them.
//!
//! # Components
//!
//! - [`auth`]: REST login and registration bodies
//! - [`types`]: conversations, messages, directory entries and the identity
//! - [`envelope`]: the `{success, errormessage, response}` reply envelope
//! - [`events`]: event names and typed request payloads
//! - [`packet`]: Engine.IO / Socket.IO packet encoding and decoding
//!
//! The backend speaks JSON with its own field naming (`chatId`, `_id`,
//! `senderName`). Rust-side names follow Rust conventions and `serde` renames
//! bridge the two.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod auth;
pub mod envelope;
pub mod errors;
pub mod events;
pub mod packet;
pub mod types;

pub use envelope::{STATUS_OK, SocketResponse};
pub use errors::{ProtocolError, Result};
pub use events::{EventName, PushEvent};
pub use packet::{EnginePacket, Handshake, SocketPacket};
pub use types::{ChatKind, Conversation, ConversationId, DirectoryEntry, Identity, Message, MessageStatus};
