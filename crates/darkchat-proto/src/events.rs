//! Event names and request payloads for the event socket.
//!
//! Request/response events are sent with an ack id and answered with a
//! [`crate::SocketResponse`]. Push events arrive without an ack id and expect
//! no answer.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{ChatKind, Message, ProtocolError, Result};

/// Every event name the client sends or understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventName {
    /// Fetch the conversation list.
    Dashboard,
    /// Fetch the user directory.
    UserList,
    /// Fetch a conversation's history.
    Chat,
    /// Send a message.
    Message,
    /// Create a group channel.
    CreateGroup,
    /// Change the profile name.
    UpdateProfile,
    /// End the session server-side.
    LogOut,
    /// Delete the account.
    DeleteProfile,
    /// Push: a message arrived.
    NewMessage,
    /// Push: a group the user belongs to was created.
    GroupCreated,
}

impl EventName {
    /// Wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Dashboard => "dashBoard",
            Self::UserList => "userList",
            Self::Chat => "chat",
            Self::Message => "message",
            Self::CreateGroup => "createGroup",
            Self::UpdateProfile => "updateProfile",
            Self::LogOut => "logOut",
            Self::DeleteProfile => "deleteProfile",
            Self::NewMessage => "newMessage",
            Self::GroupCreated => "groupCreated",
        }
    }

    /// Whether the server initiates this event.
    pub fn is_push(self) -> bool {
        matches!(self, Self::NewMessage | Self::GroupCreated)
    }
}

impl fmt::Display for EventName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventName {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "dashBoard" => Ok(Self::Dashboard),
            "userList" => Ok(Self::UserList),
            "chat" => Ok(Self::Chat),
            "message" => Ok(Self::Message),
            "createGroup" => Ok(Self::CreateGroup),
            "updateProfile" => Ok(Self::UpdateProfile),
            "logOut" => Ok(Self::LogOut),
            "deleteProfile" => Ok(Self::DeleteProfile),
            "newMessage" => Ok(Self::NewMessage),
            "groupCreated" => Ok(Self::GroupCreated),
            _ => Err(ProtocolError::InvalidEvent("unknown event name")),
        }
    }
}

/// `chat` request: which history to load.
///
/// Groups are addressed by channel id, direct conversations by the
/// counterpart's user id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryQuery {
    /// Group channel id.
    #[serde(rename = "channelId", default, skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<String>,
    /// Counterpart user id.
    #[serde(rename = "userId", default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// Conversation kind code.
    #[serde(rename = "type")]
    pub kind: ChatKind,
}

impl HistoryQuery {
    /// Query for a group's history.
    pub fn group(channel_id: impl Into<String>) -> Self {
        Self { channel_id: Some(channel_id.into()), user_id: None, kind: ChatKind::Group }
    }

    /// Query for a direct conversation's history.
    pub fn direct(user_id: impl Into<String>) -> Self {
        Self { channel_id: None, user_id: Some(user_id.into()), kind: ChatKind::Direct }
    }
}

/// `message` request.
///
/// `user_id` is the counterpart for direct conversations but the sender's
/// own id for groups. The backend routes on that shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendMessageRequest {
    /// Counterpart (direct) or sender (group) user id.
    #[serde(rename = "userId")]
    pub user_id: String,
    /// Conversation kind code.
    #[serde(rename = "type")]
    pub kind: ChatKind,
    /// Group channel id, absent for direct conversations.
    #[serde(rename = "channelId", default, skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<String>,
    /// Message text.
    pub message: String,
}

/// Group participant in a `createGroup` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    /// Participant user id.
    #[serde(rename = "userId")]
    pub user_id: String,
    /// Participant user name.
    #[serde(rename = "userName")]
    pub user_name: String,
}

/// `createGroup` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateGroupRequest {
    /// Group name.
    #[serde(rename = "channelName")]
    pub channel_name: String,
    /// Initial members.
    pub participants: Vec<Participant>,
}

/// `createGroup` response payload. Only the id is consumed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedGroup {
    /// Channel id of the new group.
    #[serde(rename = "_id")]
    pub id: String,
}

/// `updateProfile` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateProfileRequest {
    /// New profile name.
    pub name: String,
}

/// Server-initiated event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushEvent {
    /// A message was posted to one of the user's conversations.
    NewMessage(Message),
    /// A group including the user was created.
    GroupCreated,
}

impl PushEvent {
    /// Decode a push from its event name and payload.
    ///
    /// Returns `Ok(None)` for events that are not pushes.
    pub fn decode(name: &str, payload: Value) -> Result<Option<Self>> {
        match name.parse::<EventName>() {
            Ok(EventName::NewMessage) => {
                Ok(Some(Self::NewMessage(serde_json::from_value(payload)?)))
            },
            Ok(EventName::GroupCreated) => Ok(Some(Self::GroupCreated)),
            _ => Ok(None),
        }
    }

    /// Event name this push arrives under.
    pub fn name(&self) -> EventName {
        match self {
            Self::NewMessage(_) => EventName::NewMessage,
            Self::GroupCreated => EventName::GroupCreated,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn event_names_roundtrip() {
        for name in [
            EventName::Dashboard,
            EventName::UserList,
            EventName::Chat,
            EventName::Message,
            EventName::CreateGroup,
            EventName::UpdateProfile,
            EventName::LogOut,
            EventName::DeleteProfile,
            EventName::NewMessage,
            EventName::GroupCreated,
        ] {
            assert_eq!(name.as_str().parse::<EventName>(), Ok(name));
        }
    }

    #[test]
    fn history_query_shapes() {
        assert_eq!(
            serde_json::to_value(HistoryQuery::group("ch1")).expect("encode"),
            json!({"channelId": "ch1", "type": 1})
        );
        assert_eq!(
            serde_json::to_value(HistoryQuery::direct("u2")).expect("encode"),
            json!({"userId": "u2", "type": 2})
        );
    }

    #[test]
    fn create_group_wire_shape() {
        let req = CreateGroupRequest {
            channel_name: "ops".into(),
            participants: vec![Participant { user_id: "u2".into(), user_name: "bo".into() }],
        };
        assert_eq!(
            serde_json::to_value(req).expect("encode"),
            json!({"channelName": "ops", "participants": [{"userId": "u2", "userName": "bo"}]})
        );
    }

    #[test]
    fn push_decode() {
        let payload = json!({"_id": "m1", "message": "hi", "senderName": "Bo"});
        let push = PushEvent::decode("newMessage", payload).expect("decode");
        assert!(matches!(push, Some(PushEvent::NewMessage(ref m)) if m.body == "hi"));

        assert_eq!(PushEvent::decode("groupCreated", Value::Null), Ok(Some(PushEvent::GroupCreated)));
        assert_eq!(PushEvent::decode("typing", Value::Null), Ok(None));
    }
}
