//! Typed requests and replies for the event socket.
//!
//! The [`crate::App`] speaks in [`Request`] and [`Reply`]; the
//! [`crate::Bridge`] turns them into gateway messages and back. Every
//! request carries a [`RequestId`] that doubles as the Socket.IO ack id.

use std::fmt;

use darkchat_proto::{
    Conversation, ConversationId, DirectoryEntry, EventName, Message,
    events::{CreateGroupRequest, CreatedGroup, HistoryQuery, SendMessageRequest, UpdateProfileRequest},
};
use serde_json::{Value, json};

use crate::AppError;

/// Monotonic request token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(pub u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Request over the event socket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// Fetch the conversation list.
    Dashboard,
    /// Fetch the user directory.
    Directory,
    /// Fetch one conversation's history.
    History {
        /// Conversation the history is for.
        conversation: ConversationId,
        /// Wire query.
        query: HistoryQuery,
    },
    /// Send a message.
    SendMessage(SendMessageRequest),
    /// Create a group.
    CreateGroup(CreateGroupRequest),
    /// Change the profile name.
    UpdateProfile(UpdateProfileRequest),
    /// End the server session.
    LogOut,
    /// Delete the account.
    DeleteProfile,
}

impl Request {
    /// Kind of request, used to pair and decode the reply.
    pub fn kind(&self) -> RequestKind {
        match self {
            Self::Dashboard => RequestKind::Dashboard,
            Self::Directory => RequestKind::Directory,
            Self::History { .. } => RequestKind::History,
            Self::SendMessage(_) => RequestKind::SendMessage,
            Self::CreateGroup(_) => RequestKind::CreateGroup,
            Self::UpdateProfile(_) => RequestKind::UpdateProfile,
            Self::LogOut => RequestKind::LogOut,
            Self::DeleteProfile => RequestKind::DeleteProfile,
        }
    }

    /// Event the request is emitted as.
    pub fn event(&self) -> EventName {
        self.kind().event()
    }

    /// JSON payload.
    pub fn payload(&self) -> Result<Value, AppError> {
        let value = match self {
            Self::Dashboard | Self::Directory | Self::LogOut | Self::DeleteProfile => json!({}),
            Self::History { query, .. } => serde_json::to_value(query)?,
            Self::SendMessage(req) => serde_json::to_value(req)?,
            Self::CreateGroup(req) => serde_json::to_value(req)?,
            Self::UpdateProfile(req) => serde_json::to_value(req)?,
        };
        Ok(value)
    }
}

/// Request kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    /// `dashBoard`
    Dashboard,
    /// `userList`
    Directory,
    /// `chat`
    History,
    /// `message`
    SendMessage,
    /// `createGroup`
    CreateGroup,
    /// `updateProfile`
    UpdateProfile,
    /// `logOut`
    LogOut,
    /// `deleteProfile`
    DeleteProfile,
}

impl RequestKind {
    /// Event name on the wire.
    pub fn event(self) -> EventName {
        match self {
            Self::Dashboard => EventName::Dashboard,
            Self::Directory => EventName::UserList,
            Self::History => EventName::Chat,
            Self::SendMessage => EventName::Message,
            Self::CreateGroup => EventName::CreateGroup,
            Self::UpdateProfile => EventName::UpdateProfile,
            Self::LogOut => EventName::LogOut,
            Self::DeleteProfile => EventName::DeleteProfile,
        }
    }

    /// Operation name for status lines.
    pub fn operation(self) -> &'static str {
        match self {
            Self::Dashboard => "load conversations",
            Self::Directory => "load users",
            Self::History => "load messages",
            Self::SendMessage => "send message",
            Self::CreateGroup => "create group",
            Self::UpdateProfile => "update profile",
            Self::LogOut => "log out",
            Self::DeleteProfile => "delete account",
        }
    }
}

/// Decoded reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Server conversation snapshot.
    Dashboard(Vec<Conversation>),
    /// All known users.
    Directory(Vec<DirectoryEntry>),
    /// History of the requested conversation.
    History(Vec<Message>),
    /// Server copy of a sent message. `None` when the server returned none.
    MessageSent(Option<Message>),
    /// Group created. `None` when the server returned no id.
    GroupCreated(Option<CreatedGroup>),
    /// Profile name changed.
    ProfileUpdated,
    /// Server session ended.
    LoggedOut,
    /// Account deleted.
    ProfileDeleted,
}

#[cfg(test)]
mod tests {
    use darkchat_proto::ChatKind;

    use super::*;

    #[test]
    fn history_payload_by_kind() {
        let group = Request::History {
            conversation: ConversationId::new("g1"),
            query: HistoryQuery::group("ch1"),
        };
        assert_eq!(group.event(), EventName::Chat);
        assert_eq!(group.payload().expect("payload"), json!({"channelId": "ch1", "type": 1}));

        let direct = Request::History {
            conversation: ConversationId::synthetic("u2"),
            query: HistoryQuery::direct("u2"),
        };
        assert_eq!(direct.payload().expect("payload"), json!({"userId": "u2", "type": 2}));
    }

    #[test]
    fn send_payload_omits_channel_for_direct() {
        let req = Request::SendMessage(SendMessageRequest {
            user_id: "u2".into(),
            kind: ChatKind::Direct,
            channel_id: None,
            message: "hi".into(),
        });
        assert_eq!(req.event(), EventName::Message);
        assert_eq!(req.payload().expect("payload"), json!({"userId": "u2", "type": 2, "message": "hi"}));
    }

    #[test]
    fn empty_payloads() {
        for req in [Request::Dashboard, Request::Directory, Request::LogOut, Request::DeleteProfile] {
            assert_eq!(req.payload().expect("payload"), json!({}));
        }
        assert_eq!(Request::Directory.event(), EventName::UserList);
    }
}
