//! In-memory DarkChat backend.
//!
//! Answers every event-socket request and both REST auth calls the way the
//! real backend does, from plain Rust collections. Several simulated clients
//! can share one backend through [`SharedBackend`]; pushes are queued per
//! user and collected by that user's [`crate::SimDriver`].
//!
//! Direct conversations do not exist until the first message is sent, which
//! is what makes the client fabricate a synthetic entry.

#![allow(clippy::disallowed_types, reason = "Synchronous locking operations only")]

use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use darkchat_proto::{
    ChatKind, Conversation, ConversationId, DirectoryEntry, EventName, Identity, Message,
    STATUS_OK,
    events::{CreateGroupRequest, CreatedGroup, HistoryQuery, SendMessageRequest, UpdateProfileRequest},
};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

/// Backend shared by several simulated clients.
#[derive(Clone, Default)]
pub struct SharedBackend(Arc<Mutex<SimBackend>>);

impl SharedBackend {
    /// Wrap `backend` for sharing.
    pub fn new(backend: SimBackend) -> Self {
        Self(Arc::new(Mutex::new(backend)))
    }

    /// Lock the backend. A poisoned lock is recovered; the state is plain data.
    pub fn lock(&self) -> MutexGuard<'_, SimBackend> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Failure returned by the REST calls: status code and message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    /// HTTP-like status.
    pub status: u16,
    /// Reason.
    pub message: String,
}

impl Rejection {
    fn new(status: u16, message: impl Into<String>) -> Self {
        Self { status, message: message.into() }
    }
}

#[derive(Debug, Clone)]
struct SimUser {
    id: String,
    user_name: String,
    email: String,
    password: String,
    name: Option<String>,
    token: Option<String>,
}

impl SimUser {
    fn display_name(&self) -> &str {
        self.name.as_deref().filter(|n| !n.is_empty()).unwrap_or(&self.user_name)
    }

    fn entry(&self) -> DirectoryEntry {
        DirectoryEntry {
            user_id: self.id.clone(),
            user_name: self.user_name.clone(),
            email: self.email.clone(),
            name: self.name.clone(),
            online: self.token.is_some(),
        }
    }
}

#[derive(Debug, Clone)]
enum SimChat {
    Direct { id: String, members: [String; 2] },
    Group { id: String, channel_id: String, name: String, members: Vec<String> },
}

impl SimChat {
    fn id(&self) -> &str {
        match self {
            Self::Direct { id, .. } | Self::Group { id, .. } => id,
        }
    }

    fn has_member(&self, user_id: &str) -> bool {
        match self {
            Self::Direct { members, .. } => members.iter().any(|m| m == user_id),
            Self::Group { members, .. } => members.iter().any(|m| m == user_id),
        }
    }

    fn members(&self) -> Vec<String> {
        match self {
            Self::Direct { members, .. } => members.to_vec(),
            Self::Group { members, .. } => members.clone(),
        }
    }
}

#[derive(Debug, Clone)]
struct SimMessage {
    chat_id: String,
    id: String,
    sender_id: String,
    body: String,
}

/// In-memory backend state.
#[derive(Debug, Default)]
pub struct SimBackend {
    users: Vec<SimUser>,
    chats: Vec<SimChat>,
    messages: Vec<SimMessage>,
    next_id: u64,
    outbox: HashMap<String, VecDeque<(EventName, Value)>>,
    failures: HashMap<EventName, Rejection>,
    duplicate_directs: bool,
}

impl SimBackend {
    /// Empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Share this backend between simulated clients.
    pub fn shared(self) -> SharedBackend {
        SharedBackend::new(self)
    }

    /// Seed an account. Returns its user id.
    pub fn add_user(&mut self, user_name: &str, email: &str, password: &str) -> String {
        let id = format!("u{}", self.users.len() + 1);
        self.users.push(SimUser {
            id: id.clone(),
            user_name: user_name.to_owned(),
            email: email.to_owned(),
            password: password.to_owned(),
            name: None,
            token: None,
        });
        id
    }

    /// Seed a message from `sender_id` to `recipient_id`, creating the direct
    /// conversation if needed. Returns the conversation id.
    pub fn seed_direct(&mut self, sender_id: &str, recipient_id: &str, body: &str) -> Option<String> {
        let chat_id = self.direct_chat(sender_id, recipient_id)?;
        self.post(&chat_id, sender_id, body);
        Some(chat_id)
    }

    /// Seed a group. Returns its channel id.
    pub fn seed_group(&mut self, name: &str, members: &[&str]) -> String {
        let id = self.fresh_id("g");
        let channel_id = self.fresh_id("ch");
        self.chats.push(SimChat::Group {
            id,
            channel_id: channel_id.clone(),
            name: name.to_owned(),
            members: members.iter().map(|m| (*m).to_owned()).collect(),
        });
        channel_id
    }

    /// Make the next request for `event` fail with `status`.
    pub fn fail_next(&mut self, event: EventName, status: u16, message: &str) {
        self.failures.insert(event, Rejection::new(status, message));
    }

    /// Repeat every direct conversation in dashboards under a second id.
    pub fn set_duplicate_directs(&mut self, enabled: bool) {
        self.duplicate_directs = enabled;
    }

    /// User id registered under `email`.
    pub fn user_id(&self, email: &str) -> Option<String> {
        self.users.iter().find(|u| u.email == email).map(|u| u.id.clone())
    }

    /// Whether `user_id` currently holds a token.
    pub fn is_signed_in(&self, user_id: &str) -> bool {
        self.user(user_id).is_some_and(|u| u.token.is_some())
    }

    /// Number of direct conversations between `a` and `b`.
    pub fn direct_count(&self, a: &str, b: &str) -> usize {
        self.chats
            .iter()
            .filter(|c| matches!(c, SimChat::Direct { .. }) && c.has_member(a) && c.has_member(b))
            .count()
    }

    /// `POST /user/register`.
    pub fn register(&mut self, display_name: &str, email: &str, password: &str) -> Result<(), Rejection> {
        if self.user_id(email).is_some() {
            return Err(Rejection::new(409, "Email already registered"));
        }
        self.add_user(display_name, email, password);
        Ok(())
    }

    /// `POST /user/login`.
    pub fn login(&mut self, email: &str, password: &str) -> Result<Identity, Rejection> {
        let token = self.fresh_id("token-");
        let user = self
            .users
            .iter_mut()
            .find(|u| u.email == email && u.password == password)
            .ok_or_else(|| Rejection::new(401, "Invalid email or password"))?;

        user.token = Some(token.clone());
        Ok(Identity { user_id: user.id.clone(), auth_token: token, email: user.email.clone() })
    }

    /// Whether `identity` may open the event socket.
    pub fn authenticate(&self, identity: &Identity) -> bool {
        self.user(&identity.user_id)
            .is_some_and(|u| u.token.as_deref() == Some(identity.auth_token.as_str()))
    }

    /// Answer a request from `user_id`. Returns the reply envelope.
    pub fn handle(&mut self, user_id: &str, event: EventName, payload: Value) -> Value {
        if let Some(rejection) = self.failures.remove(&event) {
            return json!({"success": rejection.status, "errormessage": rejection.message});
        }

        let result = match event {
            EventName::Dashboard => Ok(self.dashboard(user_id)),
            EventName::UserList => Ok(json!(self.users.iter().map(SimUser::entry).collect::<Vec<_>>())),
            EventName::Chat => decode(payload).map(|query| self.history(user_id, &query)),
            EventName::Message => decode(payload).and_then(|req| self.send(user_id, &req)),
            EventName::CreateGroup => decode(payload).map(|req| self.create_group(user_id, &req)),
            EventName::UpdateProfile => {
                decode(payload).and_then(|req| self.update_profile(user_id, &req))
            },
            EventName::LogOut => {
                if let Some(user) = self.user_mut(user_id) {
                    user.token = None;
                }
                Ok(Value::Null)
            },
            EventName::DeleteProfile => Ok(self.delete_profile(user_id)),
            EventName::NewMessage | EventName::GroupCreated => {
                Err(Rejection::new(400, format!("{event} is not a request")))
            },
        };

        match result {
            Ok(response) => json!({"success": STATUS_OK, "errormessage": "", "response": response}),
            Err(rejection) => {
                json!({"success": rejection.status, "errormessage": rejection.message})
            },
        }
    }

    /// Take the pushes queued for `user_id`.
    pub fn take_pushes(&mut self, user_id: &str) -> Vec<(EventName, Value)> {
        self.outbox.remove(user_id).map(Vec::from).unwrap_or_default()
    }

    /// Whether pushes are queued for `user_id`.
    pub fn has_pushes(&self, user_id: &str) -> bool {
        self.outbox.get(user_id).is_some_and(|queue| !queue.is_empty())
    }

    fn dashboard(&self, user_id: &str) -> Value {
        let mut items = Vec::new();
        for chat in self.chats.iter().filter(|c| c.has_member(user_id)) {
            match chat {
                SimChat::Direct { id, members } => {
                    let Some(other) = members.iter().find(|m| *m != user_id) else {
                        continue;
                    };
                    let Some(other) = self.user(other) else {
                        continue;
                    };
                    let conversation = Conversation {
                        conversation_id: ConversationId::new(id.clone()),
                        kind: ChatKind::Direct,
                        display_name: other.display_name().to_owned(),
                        group_id: None,
                        counterpart_user_id: Some(other.id.clone()),
                    };
                    if self.duplicate_directs {
                        let mut twin = conversation.clone();
                        twin.conversation_id = ConversationId::new(format!("{id}-dup"));
                        items.push(conversation);
                        items.push(twin);
                    } else {
                        items.push(conversation);
                    }
                },
                SimChat::Group { id, channel_id, name, .. } => items.push(Conversation {
                    conversation_id: ConversationId::new(id.clone()),
                    kind: ChatKind::Group,
                    display_name: name.clone(),
                    group_id: Some(channel_id.clone()),
                    counterpart_user_id: None,
                }),
            }
        }
        json!(items)
    }

    fn history(&self, user_id: &str, query: &HistoryQuery) -> Value {
        let chat_id = match query.kind {
            ChatKind::Group => query.channel_id.as_deref().and_then(|ch| self.group_id(ch, user_id)),
            ChatKind::Direct => {
                query.user_id.as_deref().and_then(|other| self.find_direct(user_id, other))
            },
        };
        let Some(chat_id) = chat_id else {
            return json!([]);
        };

        let messages: Vec<Message> = self
            .messages
            .iter()
            .filter(|m| m.chat_id == chat_id)
            .map(|m| self.render_message(m))
            .collect();
        json!(messages)
    }

    fn send(&mut self, user_id: &str, req: &SendMessageRequest) -> Result<Value, Rejection> {
        let chat_id = match req.kind {
            ChatKind::Direct => self
                .direct_chat(user_id, &req.user_id)
                .ok_or_else(|| Rejection::new(404, "User not found"))?,
            ChatKind::Group => req
                .channel_id
                .as_deref()
                .and_then(|ch| self.group_id(ch, user_id))
                .ok_or_else(|| Rejection::new(404, "Group not found"))?,
        };

        let message = self.post(&chat_id, user_id, &req.message);
        Ok(json!(message))
    }

    fn create_group(&mut self, user_id: &str, req: &CreateGroupRequest) -> Value {
        let mut members = vec![user_id.to_owned()];
        for participant in &req.participants {
            if !members.contains(&participant.user_id) {
                members.push(participant.user_id.clone());
            }
        }

        let id = self.fresh_id("g");
        let channel_id = self.fresh_id("ch");
        for member in members.iter().filter(|m| *m != user_id) {
            self.enqueue(member, EventName::GroupCreated, json!({"_id": channel_id}));
        }
        self.chats.push(SimChat::Group {
            id,
            channel_id: channel_id.clone(),
            name: req.channel_name.clone(),
            members,
        });
        json!(CreatedGroup { id: channel_id })
    }

    fn update_profile(&mut self, user_id: &str, req: &UpdateProfileRequest) -> Result<Value, Rejection> {
        let user = self.user_mut(user_id).ok_or_else(|| Rejection::new(404, "User not found"))?;
        user.name = Some(req.name.clone());
        Ok(json!("Profile updated"))
    }

    fn delete_profile(&mut self, user_id: &str) -> Value {
        self.users.retain(|u| u.id != user_id);
        self.chats.retain(|c| !(matches!(c, SimChat::Direct { .. }) && c.has_member(user_id)));
        for chat in &mut self.chats {
            if let SimChat::Group { members, .. } = chat {
                members.retain(|m| m != user_id);
            }
        }
        self.outbox.remove(user_id);
        Value::Null
    }

    /// Append a message and queue it for every other member.
    fn post(&mut self, chat_id: &str, sender_id: &str, body: &str) -> Message {
        let message = SimMessage {
            chat_id: chat_id.to_owned(),
            id: self.fresh_id("m"),
            sender_id: sender_id.to_owned(),
            body: body.to_owned(),
        };
        let rendered = self.render_message(&message);
        self.messages.push(message);

        let recipients: Vec<String> = self
            .chats
            .iter()
            .find(|c| c.id() == chat_id)
            .map(SimChat::members)
            .unwrap_or_default();
        for recipient in recipients.iter().filter(|r| *r != sender_id) {
            self.enqueue(recipient, EventName::NewMessage, json!(rendered));
        }
        rendered
    }

    fn render_message(&self, message: &SimMessage) -> Message {
        let sender = self
            .user(&message.sender_id)
            .map_or_else(|| "Deleted user".to_owned(), |u| u.user_name.clone());
        Message {
            message_id: message.id.clone(),
            body: message.body.clone(),
            sender_display_name: sender,
            read_by: None,
            created_at: None,
        }
    }

    /// Direct conversation between `a` and `b`, created on first use.
    fn direct_chat(&mut self, a: &str, b: &str) -> Option<String> {
        if let Some(id) = self.find_direct(a, b) {
            return Some(id);
        }
        self.user(b)?;

        let id = self.fresh_id("c");
        self.chats.push(SimChat::Direct { id: id.clone(), members: [a.to_owned(), b.to_owned()] });
        Some(id)
    }

    fn find_direct(&self, a: &str, b: &str) -> Option<String> {
        self.chats
            .iter()
            .find(|c| matches!(c, SimChat::Direct { .. }) && c.has_member(a) && c.has_member(b))
            .map(|c| c.id().to_owned())
    }

    fn group_id(&self, channel: &str, member: &str) -> Option<String> {
        self.chats
            .iter()
            .find(|c| {
                matches!(c, SimChat::Group { channel_id, .. } if channel_id == channel)
                    && c.has_member(member)
            })
            .map(|c| c.id().to_owned())
    }

    fn enqueue(&mut self, user_id: &str, event: EventName, payload: Value) {
        self.outbox.entry(user_id.to_owned()).or_default().push_back((event, payload));
    }

    fn fresh_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}{}", self.next_id)
    }

    fn user(&self, user_id: &str) -> Option<&SimUser> {
        self.users.iter().find(|u| u.id == user_id)
    }

    fn user_mut(&mut self, user_id: &str) -> Option<&mut SimUser> {
        self.users.iter_mut().find(|u| u.id == user_id)
    }
}

fn decode<T: DeserializeOwned>(payload: Value) -> Result<T, Rejection> {
    serde_json::from_value(payload).map_err(|e| Rejection::new(400, format!("bad payload: {e}")))
}
