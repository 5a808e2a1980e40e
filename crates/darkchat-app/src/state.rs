//! Application state types.
//!
//! Connection and history lifecycles, the active screen, and the form and
//! modal state the view renders from.

use darkchat_proto::{ConversationId, Message};

use crate::TextField;

/// Connection lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// No event socket.
    #[default]
    Disconnected,
    /// Socket opening.
    Connecting,
    /// Connected, initial conversation and directory fetches in flight.
    Synced,
    /// Connected and settled.
    Idle,
}

impl ConnectionState {
    /// Whether the event socket is up.
    pub fn is_connected(self) -> bool {
        matches!(self, Self::Synced | Self::Idle)
    }
}

/// Message history lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HistoryState {
    /// No conversation selected, or the last load failed.
    #[default]
    Idle,
    /// Fetch in flight.
    Loading,
    /// Messages present.
    Loaded,
    /// Conversation has no messages.
    Empty,
}

/// History of the active conversation.
///
/// Append-only in arrival order and bound to exactly one conversation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct History {
    conversation: Option<ConversationId>,
    state: HistoryState,
    messages: Vec<Message>,
}

impl History {
    /// Conversation this history belongs to.
    pub fn conversation(&self) -> Option<&ConversationId> {
        self.conversation.as_ref()
    }

    /// Lifecycle state.
    pub fn state(&self) -> HistoryState {
        self.state
    }

    /// Messages in arrival order.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Start loading `conversation`, discarding what was held.
    pub(crate) fn begin(&mut self, conversation: ConversationId) {
        self.conversation = Some(conversation);
        self.state = HistoryState::Loading;
        self.messages.clear();
    }

    /// Apply a loaded page.
    ///
    /// Messages appended while the fetch was in flight are kept after the
    /// server's list unless the server already returned them.
    pub(crate) fn load(&mut self, messages: Vec<Message>) {
        let held = std::mem::replace(&mut self.messages, messages);
        for message in held {
            self.push_unique(message);
        }
        self.settle();
    }

    /// Append one message. Returns `false` if its id is already present.
    pub(crate) fn append(&mut self, message: Message) -> bool {
        let added = self.push_unique(message);
        self.settle();
        added
    }

    /// Rebind to a promoted conversation id, keeping every message.
    pub(crate) fn rebind(&mut self, conversation: ConversationId) {
        self.conversation = Some(conversation);
    }

    /// Mark a failed load.
    pub(crate) fn fail(&mut self) {
        if self.messages.is_empty() {
            self.state = HistoryState::Idle;
        }
    }

    /// Drop the history and its binding.
    pub(crate) fn clear(&mut self) {
        *self = Self::default();
    }

    fn push_unique(&mut self, message: Message) -> bool {
        if self.messages.iter().any(|m| m.message_id == message.message_id) {
            return false;
        }
        self.messages.push(message);
        true
    }

    fn settle(&mut self) {
        self.state =
            if self.messages.is_empty() { HistoryState::Empty } else { HistoryState::Loaded };
    }
}

/// Top-level screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Screen {
    /// Sign-in form.
    #[default]
    Login,
    /// Account creation form.
    Register,
    /// Sidebar, messages and composer.
    Chat,
    /// Profile and account management.
    Settings,
}

/// Login form fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoginField {
    /// Email address.
    #[default]
    Email,
    /// Password.
    Password,
}

/// Login form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginForm {
    /// Email input.
    pub email: TextField,
    /// Password input.
    pub password: TextField,
    /// Focused field.
    pub focus: LoginField,
    /// Last validation or server error.
    pub error: Option<String>,
    /// Request in flight.
    pub submitting: bool,
}

impl LoginForm {
    pub(crate) fn focused_mut(&mut self) -> &mut TextField {
        match self.focus {
            LoginField::Email => &mut self.email,
            LoginField::Password => &mut self.password,
        }
    }

    pub(crate) fn cycle_focus(&mut self) {
        self.focus = match self.focus {
            LoginField::Email => LoginField::Password,
            LoginField::Password => LoginField::Email,
        };
    }
}

/// Registration form fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RegisterField {
    /// Display name.
    #[default]
    DisplayName,
    /// Email address.
    Email,
    /// Password.
    Password,
}

/// Registration form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegisterForm {
    /// Display name input.
    pub display_name: TextField,
    /// Email input.
    pub email: TextField,
    /// Password input.
    pub password: TextField,
    /// Focused field.
    pub focus: RegisterField,
    /// Last validation or server error.
    pub error: Option<String>,
    /// Request in flight.
    pub submitting: bool,
}

impl RegisterForm {
    pub(crate) fn focused_mut(&mut self) -> &mut TextField {
        match self.focus {
            RegisterField::DisplayName => &mut self.display_name,
            RegisterField::Email => &mut self.email,
            RegisterField::Password => &mut self.password,
        }
    }

    pub(crate) fn cycle_focus(&mut self, forward: bool) {
        self.focus = match (self.focus, forward) {
            (RegisterField::DisplayName, true) | (RegisterField::Password, false) => {
                RegisterField::Email
            },
            (RegisterField::Email, true) | (RegisterField::DisplayName, false) => {
                RegisterField::Password
            },
            (RegisterField::Password, true) | (RegisterField::Email, false) => {
                RegisterField::DisplayName
            },
        };
    }
}

/// Settings screen items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SettingsField {
    /// Profile name input.
    #[default]
    Name,
    /// Save the profile name.
    Save,
    /// Log out.
    Logout,
    /// Delete the account.
    Delete,
}

impl SettingsField {
    const ORDER: [Self; 4] = [Self::Name, Self::Save, Self::Logout, Self::Delete];

    fn step(self, forward: bool) -> Self {
        let len = Self::ORDER.len();
        let idx = Self::ORDER.iter().position(|f| *f == self).unwrap_or(0);
        let next = if forward { (idx + 1) % len } else { (idx + len - 1) % len };
        Self::ORDER.get(next).copied().unwrap_or_default()
    }
}

/// Settings form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsForm {
    /// New profile name.
    pub name: TextField,
    /// Focused item.
    pub focus: SettingsField,
    /// Deletion awaits a second confirm.
    pub delete_armed: bool,
    /// Last validation error.
    pub error: Option<String>,
}

impl SettingsForm {
    pub(crate) fn move_focus(&mut self, forward: bool) {
        self.focus = self.focus.step(forward);
        self.delete_armed = false;
    }
}

/// Group creator focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DraftFocus {
    /// Group name input.
    #[default]
    Name,
    /// Participant checklist.
    Participants,
}

/// Group creation draft.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupDraft {
    /// Group name input.
    pub name: TextField,
    /// Selected participant user ids, in selection order.
    pub participants: Vec<String>,
    /// Highlighted row in the checklist.
    pub cursor: usize,
    /// Focused part of the form.
    pub focus: DraftFocus,
}

impl GroupDraft {
    /// Whether `user_id` is selected.
    pub fn is_selected(&self, user_id: &str) -> bool {
        self.participants.iter().any(|id| id == user_id)
    }

    /// Select or deselect `user_id`.
    pub fn toggle(&mut self, user_id: &str) {
        if let Some(pos) = self.participants.iter().position(|id| id == user_id) {
            self.participants.remove(pos);
        } else {
            self.participants.push(user_id.to_owned());
        }
    }
}

/// Modal over the chat screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Modal {
    /// Pick a user to chat with.
    DirectPicker {
        /// Highlighted row.
        cursor: usize,
    },
    /// Name a group and pick participants.
    GroupCreator(GroupDraft),
}
