//! Domain types shared by the client and the backend.
//!
//! # Invariants
//!
//! - A [`ConversationId`] is either server-issued or synthetic. Synthetic ids
//!   always start with [`ConversationId::SYNTHETIC_PREFIX`] followed by the
//!   counterpart's user id, so the counterpart can be recovered from the id.
//! - [`ChatKind`] travels as the backend's numeric code (`1` group, `2`
//!   direct) and nothing else.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ProtocolError;

/// Conversation kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum ChatKind {
    /// Group channel with any number of participants.
    Group,
    /// One-to-one conversation.
    Direct,
}

impl ChatKind {
    /// Numeric code the backend uses for this kind.
    pub fn code(self) -> u8 {
        match self {
            Self::Group => 1,
            Self::Direct => 2,
        }
    }
}

impl From<ChatKind> for u8 {
    fn from(kind: ChatKind) -> Self {
        kind.code()
    }
}

impl TryFrom<u8> for ChatKind {
    type Error = ProtocolError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Group),
            2 => Ok(Self::Direct),
            value => Err(ProtocolError::UnknownValue { kind: "chat type", value }),
        }
    }
}

/// Delivery status of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum MessageStatus {
    /// Accepted by the backend.
    Sent,
    /// Delivered to at least one recipient device.
    Delivered,
    /// Read by at least one recipient.
    Read,
}

impl From<MessageStatus> for u8 {
    fn from(status: MessageStatus) -> Self {
        match status {
            MessageStatus::Sent => 1,
            MessageStatus::Delivered => 2,
            MessageStatus::Read => 3,
        }
    }
}

impl TryFrom<u8> for MessageStatus {
    type Error = ProtocolError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Sent),
            2 => Ok(Self::Delivered),
            3 => Ok(Self::Read),
            value => Err(ProtocolError::UnknownValue { kind: "message status", value }),
        }
    }
}

/// Conversation identifier, server-issued or synthetic.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationId(String);

impl ConversationId {
    /// Prefix marking a locally fabricated direct conversation.
    pub const SYNTHETIC_PREFIX: &'static str = "temp-";

    /// Wrap a server-issued id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Synthetic id standing in for a direct conversation with `user_id`.
    pub fn synthetic(user_id: &str) -> Self {
        Self(format!("{}{user_id}", Self::SYNTHETIC_PREFIX))
    }

    /// Whether this id was fabricated locally.
    pub fn is_synthetic(&self) -> bool {
        self.0.starts_with(Self::SYNTHETIC_PREFIX)
    }

    /// Raw id string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Dashboard entry: one direct or group conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    /// Stable id, or a synthetic one for a not-yet-created direct chat.
    #[serde(rename = "chatId")]
    pub conversation_id: ConversationId,
    /// Direct or group.
    #[serde(rename = "type")]
    pub kind: ChatKind,
    /// Name shown in the sidebar.
    #[serde(rename = "name")]
    pub display_name: String,
    /// Group channel id. Set for groups only.
    #[serde(rename = "channelId", default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    /// Other participant. Set for direct conversations only.
    #[serde(rename = "userId", default, skip_serializing_if = "Option::is_none")]
    pub counterpart_user_id: Option<String>,
}

impl Conversation {
    /// Fabricate a placeholder direct conversation with `entry`.
    pub fn synthetic_direct(entry: &DirectoryEntry) -> Self {
        Self {
            conversation_id: ConversationId::synthetic(&entry.user_id),
            kind: ChatKind::Direct,
            display_name: entry.display_name().to_owned(),
            group_id: None,
            counterpart_user_id: Some(entry.user_id.clone()),
        }
    }

    /// Whether this is a direct conversation with `user_id`.
    pub fn is_direct_with(&self, user_id: &str) -> bool {
        self.kind == ChatKind::Direct && self.counterpart_user_id.as_deref() == Some(user_id)
    }

    /// Whether this is the group with channel id `group_id`.
    pub fn is_group(&self, group_id: &str) -> bool {
        self.kind == ChatKind::Group && self.group_id.as_deref() == Some(group_id)
    }

    /// Whether this conversation is a local placeholder.
    pub fn is_synthetic(&self) -> bool {
        self.conversation_id.is_synthetic()
    }
}

/// A chat message as returned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Server-issued message id.
    #[serde(rename = "_id")]
    pub message_id: String,
    /// Message text.
    #[serde(rename = "message")]
    pub body: String,
    /// Display name of the sender.
    #[serde(rename = "senderName")]
    pub sender_display_name: String,
    /// User ids that have read this message.
    #[serde(rename = "readBy", default, skip_serializing_if = "Option::is_none")]
    pub read_by: Option<Vec<String>>,
    /// ISO-8601 creation timestamp.
    #[serde(rename = "createdAt", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl Message {
    /// Number of readers, zero when unknown.
    pub fn read_count(&self) -> usize {
        self.read_by.as_ref().map_or(0, Vec::len)
    }
}

/// A user available as chat counterpart or group participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryEntry {
    /// User id.
    #[serde(rename = "_id")]
    pub user_id: String,
    /// Account user name.
    #[serde(rename = "userName")]
    pub user_name: String,
    /// Contact email.
    pub email: String,
    /// Profile name, overrides the user name for display when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Presence flag as last reported.
    #[serde(rename = "isOnline", default)]
    pub online: bool,
}

impl DirectoryEntry {
    /// Name used in the UI: profile name, falling back to user name.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().filter(|n| !n.is_empty()).unwrap_or(&self.user_name)
    }
}

/// Authenticated identity.
///
/// Exactly one exists per process while signed in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// User id.
    #[serde(rename = "userId")]
    pub user_id: String,
    /// Bearer token passed at connection time.
    #[serde(rename = "authToken")]
    pub auth_token: String,
    /// Account email.
    pub email: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synthetic_id_roundtrip() {
        let id = ConversationId::synthetic("u2");
        assert_eq!(id.as_str(), "temp-u2");
        assert!(id.is_synthetic());
        assert!(!ConversationId::new("c77").is_synthetic());
    }

    #[test]
    fn conversation_decodes_backend_fields() {
        let json = r#"{"chatId":"c77","type":2,"name":"Bo","userId":"u2","unread":3}"#;
        let conv: Conversation = serde_json::from_str(json).expect("decode");

        assert_eq!(conv.conversation_id, ConversationId::new("c77"));
        assert_eq!(conv.kind, ChatKind::Direct);
        assert!(conv.is_direct_with("u2"));
        assert_eq!(conv.group_id, None);
    }

    #[test]
    fn unknown_chat_type_rejected() {
        let json = r#"{"chatId":"c1","type":7,"name":"x"}"#;
        assert!(serde_json::from_str::<Conversation>(json).is_err());
    }

    #[test]
    fn display_name_prefers_profile_name() {
        let mut entry = DirectoryEntry {
            user_id: "u1".into(),
            user_name: "bo".into(),
            email: "bo@example.com".into(),
            name: Some("Bo".into()),
            online: false,
        };
        assert_eq!(entry.display_name(), "Bo");

        entry.name = Some(String::new());
        assert_eq!(entry.display_name(), "bo");
    }

    #[test]
    fn message_without_optional_fields() {
        let json = r#"{"_id":"m1","message":"hi","senderName":"Al"}"#;
        let msg: Message = serde_json::from_str(json).expect("decode");
        assert_eq!(msg.read_count(), 0);
        assert_eq!(msg.created_at, None);
    }
}
