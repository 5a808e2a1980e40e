//! Application state machine.
//!
//! This module defines the [`App`] state machine, which owns the conversation
//! list, the active history and every piece of UI state, completely
//! decoupled from I/O and protocol mechanics.
//!
//! This is a pure state machine: it consumes [`crate::AppEvent`] inputs and
//! produces [`crate::AppAction`] instructions for the runtime to execute.
//!
//! # Responsibilities
//!
//! - Issues requests with fresh [`RequestId`]s and discards stale replies.
//! - Rebuilds the conversation list from every dashboard snapshot and
//!   promotes a synthetic direct conversation once the server has a real one.
//! - Drives the login, registration and settings flows.
//!
//! # Invariants
//!
//! - At most one direct conversation per counterpart is visible.
//! - The active conversation, if any, is in the visible list.
//! - The history belongs to the active conversation and never contains the
//!   same message id twice.

use std::collections::HashMap;

use darkchat_proto::{
    ChatKind, Conversation, ConversationId, DirectoryEntry, EventName, Identity, Message,
    PushEvent,
    events::{
        CreateGroupRequest, CreatedGroup, HistoryQuery, Participant, SendMessageRequest,
        UpdateProfileRequest,
    },
};

use crate::{
    AppAction, AppEvent, ConnectionState, ConversationList, DraftFocus, GroupDraft, History,
    HistoryState, KeyInput, LoginField, LoginForm, Modal, Reconciliation, RegisterForm, Reply, Request, RequestId,
    RequestKind, RequestTracker, Screen, SettingsField, SettingsForm, Slot, TextField, validate,
    view,
};

/// Application state machine.
///
/// Pure state machine that processes events and produces actions.
/// No I/O dependencies - fully testable in simulation.
#[derive(Debug, Clone)]
pub struct App {
    /// Active screen.
    screen: Screen,
    /// Event socket lifecycle.
    connection: ConnectionState,
    /// Signed-in user. `None` while signed out.
    identity: Option<Identity>,
    /// Sidebar conversations.
    conversations: ConversationList,
    /// All users, including the signed-in one.
    directory: Vec<DirectoryEntry>,
    /// Selected conversation.
    active: Option<ConversationId>,
    /// Messages of the selected conversation.
    history: History,
    /// Message being typed.
    composer: TextField,
    /// Open modal over the chat screen.
    modal: Option<Modal>,
    /// Channel id of a just-created group to open once it is listed.
    pending_group: Option<String>,
    /// Conversation each in-flight send was addressed to.
    sends: HashMap<RequestId, Conversation>,
    /// Request ids and per-slot latest requests.
    tracker: RequestTracker,
    login: LoginForm,
    register: RegisterForm,
    settings: SettingsForm,
    /// Terminal dimensions (columns, rows).
    terminal_size: (u16, u16),
    /// Transient status message. `None` if no message.
    status_message: Option<String>,
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

impl App {
    /// Create a signed-out App on the login screen.
    pub fn new() -> Self {
        Self {
            screen: Screen::Login,
            connection: ConnectionState::Disconnected,
            identity: None,
            conversations: ConversationList::new(),
            directory: Vec::new(),
            active: None,
            history: History::default(),
            composer: TextField::new(),
            modal: None,
            pending_group: None,
            sends: HashMap::new(),
            tracker: RequestTracker::new(),
            login: LoginForm::default(),
            register: RegisterForm::default(),
            settings: SettingsForm::default(),
            terminal_size: (80, 24),
            status_message: None,
        }
    }

    /// Process an event and return actions.
    pub fn handle(&mut self, event: AppEvent) -> Vec<AppAction> {
        match event {
            AppEvent::Key(key) => self.handle_key(key),
            AppEvent::Tick => vec![],
            AppEvent::Resize(cols, rows) => {
                self.terminal_size = (cols, rows);
                vec![AppAction::Render]
            },
            AppEvent::SessionRestored(identity) => {
                tracing::info!(user_id = %identity.user_id, "restoring session");
                self.sign_in(identity, false)
            },
            AppEvent::Connected => self.on_connected(),
            AppEvent::Disconnected { reason } => self.on_disconnected(&reason),
            AppEvent::Reply { id, reply } => self.on_reply(id, reply),
            AppEvent::RequestFailed { id, kind, message } => {
                self.on_request_failed(id, kind, &message)
            },
            AppEvent::Push(push) => self.on_push(push),
            AppEvent::LoginSucceeded(identity) => {
                self.login = LoginForm::default();
                self.sign_in(identity, true)
            },
            AppEvent::LoginFailed { message } => {
                self.login.submitting = false;
                self.status_message = Some(format!("Login failed: {message}"));
                self.login.error = Some(message);
                vec![AppAction::Render]
            },
            AppEvent::Registered => {
                let email = self.register.email.text().to_owned();
                self.register = RegisterForm::default();
                self.login = LoginForm {
                    email: TextField::with_text(email),
                    focus: LoginField::Password,
                    ..LoginForm::default()
                };
                self.screen = Screen::Login;
                self.status_message = Some("Account created, sign in to continue".to_owned());
                vec![AppAction::Render]
            },
            AppEvent::RegisterFailed { message } => {
                self.register.submitting = false;
                self.status_message = Some(format!("Registration failed: {message}"));
                self.register.error = Some(message);
                vec![AppAction::Render]
            },
            AppEvent::Error { message } => {
                self.status_message = Some(format!("Error: {message}"));
                vec![AppAction::Render]
            },
        }
    }

    /// Quit the application.
    pub fn quit(&self) -> Vec<AppAction> {
        vec![AppAction::Quit]
    }

    /// Submit credentials after local validation.
    pub fn login(&mut self, email: &str, password: &str) -> Vec<AppAction> {
        if let Err(message) = validate::login(email, password) {
            return self.form_error(Screen::Login, message);
        }

        self.login.error = None;
        self.login.submitting = true;
        self.status_message = Some("Signing in...".to_owned());
        vec![
            AppAction::Login { email: email.to_owned(), password: password.to_owned() },
            AppAction::Render,
        ]
    }

    /// Create an account after local validation.
    pub fn register(&mut self, display_name: &str, email: &str, password: &str) -> Vec<AppAction> {
        if let Err(message) = validate::registration(display_name, email, password) {
            return self.form_error(Screen::Register, message);
        }

        self.register.error = None;
        self.register.submitting = true;
        self.status_message = Some("Creating account...".to_owned());
        vec![
            AppAction::Register {
                display_name: display_name.to_owned(),
                email: email.to_owned(),
                password: password.to_owned(),
            },
            AppAction::Render,
        ]
    }

    /// Fetch the conversation list. The reply replaces the whole list.
    pub fn list_conversations(&mut self) -> Vec<AppAction> {
        vec![self.request_dashboard(), AppAction::Render]
    }

    /// Fetch the user directory.
    pub fn list_directory(&mut self) -> Vec<AppAction> {
        vec![self.request_directory(), AppAction::Render]
    }

    /// Select a listed conversation and load its history.
    ///
    /// Clears the composer and closes any modal before the fetch is issued.
    pub fn open_conversation(&mut self, id: &ConversationId) -> Vec<AppAction> {
        let Some(conversation) = self.conversations.get(id).cloned() else {
            tracing::debug!(conversation_id = %id, "ignoring open of unlisted conversation");
            return vec![];
        };

        self.active = Some(id.clone());
        self.composer.clear();
        self.modal = None;
        self.conversations.drop_synthetic_except(id);
        self.history.begin(id.clone());

        let Some(query) = history_query(&conversation) else {
            tracing::warn!(conversation_id = %id, "conversation has no address, history unavailable");
            self.tracker.invalidate(Slot::History);
            self.history.load(Vec::new());
            return vec![AppAction::Render];
        };

        let request_id = self.tracker.issue_for(Slot::History);
        tracing::debug!(%request_id, conversation_id = %id, "loading history");
        vec![
            AppAction::Request {
                id: request_id,
                request: Request::History { conversation: id.clone(), query },
            },
            AppAction::Render,
        ]
    }

    /// Open the conversation with `entry`, fabricating a synthetic one if the
    /// server has none yet.
    pub fn start_direct_conversation(&mut self, entry: &DirectoryEntry) -> Vec<AppAction> {
        if let Some(existing) = self.conversations.direct_with(&entry.user_id) {
            let id = existing.conversation_id.clone();
            return self.open_conversation(&id);
        }

        let conversation = Conversation::synthetic_direct(entry);
        let id = conversation.conversation_id.clone();
        self.conversations.insert_synthetic(conversation);
        tracing::debug!(conversation_id = %id, "started synthetic conversation");
        self.open_conversation(&id)
    }

    /// Send `text` to the active conversation.
    ///
    /// No-op without an identity, without an active conversation, or when
    /// `text` is blank. Direct messages address the counterpart; group
    /// messages address the sender alongside the channel id.
    pub fn send_message(&mut self, text: &str) -> Vec<AppAction> {
        if text.trim().is_empty() {
            return vec![];
        }
        let Some(identity) = &self.identity else {
            return vec![];
        };
        let Some(conversation) = self.active_conversation().cloned() else {
            return vec![];
        };

        let user_id = match conversation.kind {
            ChatKind::Direct => conversation.counterpart_user_id.clone().unwrap_or_default(),
            ChatKind::Group => identity.user_id.clone(),
        };
        let request = SendMessageRequest {
            user_id,
            kind: conversation.kind,
            channel_id: conversation.group_id.clone(),
            message: text.to_owned(),
        };

        let id = self.tracker.issue();
        self.sends.insert(id, conversation);
        vec![AppAction::Request { id, request: Request::SendMessage(request) }, AppAction::Render]
    }

    /// Create a group named `name` with `participants` (user ids).
    ///
    /// No-op when the name is blank or no participant is given.
    pub fn create_group(&mut self, name: &str, participants: &[String]) -> Vec<AppAction> {
        if name.trim().is_empty() || participants.is_empty() {
            return vec![];
        }

        let participants = participants
            .iter()
            .map(|user_id| Participant {
                user_id: user_id.clone(),
                user_name: self
                    .directory
                    .iter()
                    .find(|e| &e.user_id == user_id)
                    .map(|e| e.user_name.clone())
                    .unwrap_or_default(),
            })
            .collect();

        let id = self.tracker.issue();
        let request =
            Request::CreateGroup(CreateGroupRequest { channel_name: name.to_owned(), participants });
        vec![AppAction::Request { id, request }, AppAction::Render]
    }

    /// Change the profile name.
    pub fn update_profile(&mut self, name: &str) -> Vec<AppAction> {
        if name.trim().is_empty() {
            return self.form_error(Screen::Settings, "Name is required");
        }

        self.settings.error = None;
        let id = self.tracker.issue();
        let request = Request::UpdateProfile(UpdateProfileRequest { name: name.to_owned() });
        vec![AppAction::Request { id, request }, AppAction::Render]
    }

    /// End the session.
    pub fn log_out(&mut self) -> Vec<AppAction> {
        let id = self.tracker.issue();
        vec![AppAction::Request { id, request: Request::LogOut }, AppAction::Render]
    }

    /// Delete the account, asking for confirmation first.
    ///
    /// The first call arms the deletion; the second call sends it.
    pub fn delete_account(&mut self) -> Vec<AppAction> {
        if !self.settings.delete_armed {
            self.settings.delete_armed = true;
            self.status_message = Some("Press Enter again to delete your account".to_owned());
            return vec![AppAction::Render];
        }

        self.settings.delete_armed = false;
        let id = self.tracker.issue();
        vec![AppAction::Request { id, request: Request::DeleteProfile }, AppAction::Render]
    }

    /// Show the settings screen.
    pub fn open_settings(&mut self) -> Vec<AppAction> {
        self.settings = SettingsForm::default();
        self.modal = None;
        self.screen = Screen::Settings;
        vec![AppAction::Render]
    }

    /// Leave the settings screen.
    pub fn close_settings(&mut self) -> Vec<AppAction> {
        self.settings = SettingsForm::default();
        self.screen = Screen::Chat;
        vec![AppAction::Render]
    }

    /// Open the direct-chat picker and refresh the directory.
    pub fn open_direct_picker(&mut self) -> Vec<AppAction> {
        self.modal = Some(Modal::DirectPicker { cursor: 0 });
        self.list_directory()
    }

    /// Open the group creator and refresh the directory.
    pub fn open_group_creator(&mut self) -> Vec<AppAction> {
        self.modal = Some(Modal::GroupCreator(GroupDraft::default()));
        self.list_directory()
    }

    /// Close any modal.
    pub fn close_modal(&mut self) -> Vec<AppAction> {
        self.modal = None;
        vec![AppAction::Render]
    }

    /// Active screen.
    pub fn screen(&self) -> Screen {
        self.screen
    }

    /// Connection state.
    pub fn connection_state(&self) -> ConnectionState {
        self.connection
    }

    /// Signed-in identity.
    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    /// Visible conversations.
    pub fn conversations(&self) -> &ConversationList {
        &self.conversations
    }

    /// All users, including the signed-in one.
    pub fn directory(&self) -> &[DirectoryEntry] {
        &self.directory
    }

    /// Users shown in the direct-chat picker.
    pub fn picker_entries(&self) -> Vec<&DirectoryEntry> {
        view::others(&self.directory, self.identity.as_ref())
    }

    /// Selected conversation id.
    pub fn active_conversation_id(&self) -> Option<&ConversationId> {
        self.active.as_ref()
    }

    /// Selected conversation.
    pub fn active_conversation(&self) -> Option<&Conversation> {
        self.active.as_ref().and_then(|id| self.conversations.get(id))
    }

    /// History of the selected conversation.
    pub fn history(&self) -> &History {
        &self.history
    }

    /// Whether `message` was sent by the signed-in user.
    pub fn is_mine(&self, message: &Message) -> bool {
        view::is_mine(message, self.identity.as_ref(), &self.directory)
    }

    /// Composer input.
    pub fn composer(&self) -> &TextField {
        &self.composer
    }

    /// Open modal.
    pub fn modal(&self) -> Option<&Modal> {
        self.modal.as_ref()
    }

    /// Login form.
    pub fn login_form(&self) -> &LoginForm {
        &self.login
    }

    /// Registration form.
    pub fn register_form(&self) -> &RegisterForm {
        &self.register
    }

    /// Settings form.
    pub fn settings_form(&self) -> &SettingsForm {
        &self.settings
    }

    /// Terminal dimensions (columns, rows).
    pub fn terminal_size(&self) -> (u16, u16) {
        self.terminal_size
    }

    /// Transient status message. `None` if no message.
    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }

    fn request_dashboard(&mut self) -> AppAction {
        AppAction::Request { id: self.tracker.issue_for(Slot::Dashboard), request: Request::Dashboard }
    }

    fn request_directory(&mut self) -> AppAction {
        AppAction::Request { id: self.tracker.issue_for(Slot::Directory), request: Request::Directory }
    }

    fn form_error(&mut self, screen: Screen, message: &str) -> Vec<AppAction> {
        let slot = match screen {
            Screen::Login => &mut self.login.error,
            Screen::Register => &mut self.register.error,
            Screen::Settings => &mut self.settings.error,
            Screen::Chat => &mut self.status_message,
        };
        *slot = Some(message.to_owned());
        self.status_message = Some(message.to_owned());
        vec![AppAction::Render]
    }

    fn sign_in(&mut self, identity: Identity, persist: bool) -> Vec<AppAction> {
        self.reset_session();
        self.identity = Some(identity.clone());
        self.screen = Screen::Chat;
        self.connection = ConnectionState::Connecting;
        self.status_message = Some("Connecting...".to_owned());

        let mut actions = Vec::with_capacity(3);
        if persist {
            actions.push(AppAction::StoreIdentity(identity.clone()));
        }
        actions.push(AppAction::Connect { identity });
        actions.push(AppAction::Render);
        actions
    }

    fn sign_out(&mut self, status: &str) -> Vec<AppAction> {
        let email = self.identity.take().map(|identity| identity.email).unwrap_or_default();
        tracing::info!("signed out");

        self.reset_session();
        self.screen = Screen::Login;
        self.login = LoginForm { email: TextField::with_text(email), ..LoginForm::default() };
        self.status_message = Some(status.to_owned());
        vec![AppAction::ClearIdentity, AppAction::Disconnect, AppAction::Render]
    }

    fn reset_session(&mut self) {
        self.connection = ConnectionState::Disconnected;
        self.conversations.clear();
        self.directory.clear();
        self.active = None;
        self.history.clear();
        self.composer.clear();
        self.modal = None;
        self.pending_group = None;
        self.sends.clear();
        self.tracker.reset();
        self.settings = SettingsForm::default();
    }

    fn on_connected(&mut self) -> Vec<AppAction> {
        if self.identity.is_none() {
            tracing::debug!("ignoring connect while signed out");
            return vec![];
        }

        tracing::info!("event socket ready, syncing");
        self.connection = ConnectionState::Synced;
        self.status_message = None;
        vec![
            AppAction::Subscribe { event: EventName::NewMessage },
            AppAction::Subscribe { event: EventName::GroupCreated },
            self.request_dashboard(),
            self.request_directory(),
            AppAction::Render,
        ]
    }

    fn on_disconnected(&mut self, reason: &str) -> Vec<AppAction> {
        tracing::info!(%reason, "event socket down");
        self.connection = ConnectionState::Disconnected;
        self.tracker.reset();
        self.sends.clear();
        self.pending_group = None;
        if self.history.state() == HistoryState::Loading {
            self.history.fail();
        }
        if self.identity.is_some() {
            self.status_message = Some(format!("Disconnected: {reason}"));
        }
        vec![AppAction::Render]
    }

    fn settle_sync(&mut self) {
        if self.connection == ConnectionState::Synced
            && !self.tracker.is_pending(Slot::Dashboard)
            && !self.tracker.is_pending(Slot::Directory)
        {
            self.connection = ConnectionState::Idle;
        }
    }

    fn on_reply(&mut self, id: RequestId, reply: Reply) -> Vec<AppAction> {
        match reply {
            Reply::Dashboard(items) => self.apply_dashboard(id, items),
            Reply::Directory(entries) => {
                if !self.tracker.complete(Slot::Directory, id) {
                    tracing::debug!(%id, "discarding stale directory reply");
                    return vec![];
                }
                self.directory = entries;
                self.clamp_modal_cursor();
                self.settle_sync();
                vec![AppAction::Render]
            },
            Reply::History(messages) => {
                if !self.tracker.complete(Slot::History, id) {
                    tracing::debug!(%id, "discarding stale history reply");
                    return vec![];
                }
                if self.history.conversation() != self.active.as_ref() {
                    tracing::debug!(%id, "discarding history for a conversation no longer open");
                    return vec![];
                }
                self.history.load(messages);
                vec![AppAction::Render]
            },
            Reply::MessageSent(message) => self.apply_sent(id, message),
            Reply::GroupCreated(created) => self.apply_group_created(created),
            Reply::ProfileUpdated => {
                self.status_message = Some("Profile updated".to_owned());
                let mut actions = self.close_settings();
                actions.insert(0, self.request_directory());
                actions
            },
            Reply::LoggedOut => self.sign_out("Signed out"),
            Reply::ProfileDeleted => self.sign_out("Account deleted"),
        }
    }

    fn apply_dashboard(&mut self, id: RequestId, items: Vec<Conversation>) -> Vec<AppAction> {
        if !self.tracker.complete(Slot::Dashboard, id) {
            tracing::debug!(%id, "discarding stale dashboard reply");
            return vec![];
        }

        match self.conversations.reconcile(items, self.active.as_ref()) {
            Reconciliation::Promoted { from, to } => {
                tracing::info!(%from, %to, "promoted synthetic conversation");
                self.history.rebind(to.clone());
                self.active = Some(to);
            },
            Reconciliation::Cleared => {
                tracing::debug!("active conversation left the dashboard");
                self.tracker.invalidate(Slot::History);
                self.active = None;
                self.history.clear();
            },
            Reconciliation::NoSelection | Reconciliation::Kept | Reconciliation::KeptSynthetic => {},
        }
        self.settle_sync();

        let mut actions = Vec::new();
        if let Some(group_id) = self.pending_group.take() {
            let listed = self.conversations.group(&group_id).map(|c| c.conversation_id.clone());
            match listed {
                Some(group) => actions.extend(self.open_conversation(&group)),
                None => tracing::debug!(%group_id, "created group not yet listed"),
            }
        }
        actions.push(AppAction::Render);
        actions
    }

    fn apply_sent(&mut self, id: RequestId, message: Option<Message>) -> Vec<AppAction> {
        let Some(target) = self.sends.remove(&id) else {
            tracing::debug!(%id, "discarding reply for unknown send");
            return vec![];
        };

        let still_open = self.active_conversation().is_some_and(|c| same_thread(c, &target));
        if still_open {
            if let Some(message) = message {
                self.history.append(message);
            }
            self.composer.clear();
        } else {
            tracing::debug!(%id, "send confirmed for a conversation no longer open");
        }

        vec![self.request_dashboard(), AppAction::Render]
    }

    fn apply_group_created(&mut self, created: Option<CreatedGroup>) -> Vec<AppAction> {
        if matches!(self.modal, Some(Modal::GroupCreator(_))) {
            self.modal = None;
        }
        self.pending_group = created.map(|group| group.id);
        self.status_message = Some("Group created".to_owned());
        vec![self.request_dashboard(), AppAction::Render]
    }

    fn on_request_failed(&mut self, id: RequestId, kind: RequestKind, message: &str) -> Vec<AppAction> {
        tracing::warn!(%id, operation = kind.operation(), %message, "request failed");

        match kind {
            RequestKind::Dashboard => {
                if self.tracker.complete(Slot::Dashboard, id) {
                    self.settle_sync();
                }
            },
            RequestKind::Directory => {
                if self.tracker.complete(Slot::Directory, id) {
                    self.settle_sync();
                }
            },
            RequestKind::History => {
                if self.tracker.complete(Slot::History, id) {
                    self.history.fail();
                }
            },
            RequestKind::SendMessage => {
                self.sends.remove(&id);
            },
            RequestKind::LogOut => {
                return self.sign_out(&format!("Signed out locally ({message})"));
            },
            RequestKind::CreateGroup | RequestKind::UpdateProfile | RequestKind::DeleteProfile => {},
        }

        self.status_message = Some(format!("Could not {}: {message}", kind.operation()));
        vec![AppAction::Render]
    }

    /// A pushed message names no conversation, so the open thread is
    /// re-fetched rather than appended to.
    fn on_push(&mut self, push: PushEvent) -> Vec<AppAction> {
        let mut actions = Vec::with_capacity(3);
        match push {
            PushEvent::NewMessage(message) => {
                tracing::debug!(message_id = %message.message_id, "message pushed");
                actions.extend(self.refresh_history());
            },
            PushEvent::GroupCreated => {},
        }
        actions.push(self.request_dashboard());
        actions.push(AppAction::Render);
        actions
    }

    /// Reload the open conversation in place. Held messages stay visible
    /// until the reply lands.
    fn refresh_history(&mut self) -> Option<AppAction> {
        let id = self.active.clone()?;
        if self.history.conversation() != Some(&id) {
            return None;
        }
        let query = self.conversations.get(&id).and_then(history_query)?;

        let request_id = self.tracker.issue_for(Slot::History);
        tracing::debug!(%request_id, conversation_id = %id, "refreshing history");
        Some(AppAction::Request { id: request_id, request: Request::History { conversation: id, query } })
    }

    fn clamp_modal_cursor(&mut self) {
        let picker_len = self.picker_entries().len();
        let directory_len = self.directory.len();
        match &mut self.modal {
            Some(Modal::DirectPicker { cursor }) => {
                *cursor = (*cursor).min(picker_len.saturating_sub(1));
            },
            Some(Modal::GroupCreator(draft)) => {
                draft.cursor = draft.cursor.min(directory_len.saturating_sub(1));
            },
            None => {},
        }
    }

    /// Select the neighbouring conversation in sidebar order, wrapping.
    fn select_relative(&mut self, forward: bool) -> Vec<AppAction> {
        let order: Vec<ConversationId> =
            self.conversations.sidebar_order().iter().map(|c| c.conversation_id.clone()).collect();
        if order.is_empty() {
            return vec![];
        }

        let len = order.len();
        let current = self.active.as_ref().and_then(|id| order.iter().position(|c| c == id));
        let next = match (current, forward) {
            (None, true) => 0,
            (None, false) => len - 1,
            (Some(idx), true) => (idx + 1) % len,
            (Some(idx), false) => (idx + len - 1) % len,
        };

        match order.get(next) {
            Some(id) if Some(id) != self.active.as_ref() => {
                let id = id.clone();
                self.open_conversation(&id)
            },
            _ => vec![],
        }
    }

    fn handle_key(&mut self, key: KeyInput) -> Vec<AppAction> {
        if key == KeyInput::Ctrl('c') {
            return self.quit();
        }

        match self.screen {
            Screen::Login => self.login_key(key),
            Screen::Register => self.register_key(key),
            Screen::Settings => self.settings_key(key),
            Screen::Chat => match self.modal {
                Some(Modal::DirectPicker { .. }) => self.picker_key(key),
                Some(Modal::GroupCreator(_)) => self.group_key(key),
                None => self.chat_key(key),
            },
        }
    }

    fn login_key(&mut self, key: KeyInput) -> Vec<AppAction> {
        match key {
            KeyInput::Tab | KeyInput::BackTab | KeyInput::Up | KeyInput::Down => {
                self.login.cycle_focus();
                vec![AppAction::Render]
            },
            KeyInput::Enter if !self.login.submitting => {
                let email = self.login.email.text().to_owned();
                let password = self.login.password.text().to_owned();
                self.login(&email, &password)
            },
            KeyInput::Ctrl('r') => {
                self.register = RegisterForm::default();
                self.screen = Screen::Register;
                vec![AppAction::Render]
            },
            other => edit(self.login.focused_mut(), other),
        }
    }

    fn register_key(&mut self, key: KeyInput) -> Vec<AppAction> {
        match key {
            KeyInput::Tab | KeyInput::Down => {
                self.register.cycle_focus(true);
                vec![AppAction::Render]
            },
            KeyInput::BackTab | KeyInput::Up => {
                self.register.cycle_focus(false);
                vec![AppAction::Render]
            },
            KeyInput::Enter if !self.register.submitting => {
                let display_name = self.register.display_name.text().to_owned();
                let email = self.register.email.text().to_owned();
                let password = self.register.password.text().to_owned();
                self.register(&display_name, &email, &password)
            },
            KeyInput::Esc => {
                self.screen = Screen::Login;
                vec![AppAction::Render]
            },
            other => edit(self.register.focused_mut(), other),
        }
    }

    fn chat_key(&mut self, key: KeyInput) -> Vec<AppAction> {
        match key {
            KeyInput::Ctrl('n') => self.open_direct_picker(),
            KeyInput::Ctrl('g') => self.open_group_creator(),
            KeyInput::Ctrl('s') => self.open_settings(),
            KeyInput::Up => self.select_relative(false),
            KeyInput::Down => self.select_relative(true),
            KeyInput::Enter => {
                if self.composer.is_blank() {
                    return vec![];
                }
                if self.active.is_none() {
                    self.status_message = Some("Select a conversation first".to_owned());
                    return vec![AppAction::Render];
                }
                let text = self.composer.text().to_owned();
                self.send_message(&text)
            },
            other => edit(&mut self.composer, other),
        }
    }

    fn picker_key(&mut self, key: KeyInput) -> Vec<AppAction> {
        let len = self.picker_entries().len();
        let Some(Modal::DirectPicker { cursor }) = &mut self.modal else {
            return vec![];
        };

        match key {
            KeyInput::Esc => self.close_modal(),
            KeyInput::Up => {
                *cursor = cursor.saturating_sub(1);
                vec![AppAction::Render]
            },
            KeyInput::Down => {
                if *cursor + 1 < len {
                    *cursor += 1;
                }
                vec![AppAction::Render]
            },
            KeyInput::Enter => {
                let index = *cursor;
                let picked = self.picker_entries().get(index).map(|e| (*e).clone());
                match picked {
                    Some(entry) => self.start_direct_conversation(&entry),
                    None => vec![],
                }
            },
            _ => vec![],
        }
    }

    fn group_key(&mut self, key: KeyInput) -> Vec<AppAction> {
        let directory_len = self.directory.len();
        let Some(Modal::GroupCreator(draft)) = &mut self.modal else {
            return vec![];
        };

        match (key, draft.focus) {
            (KeyInput::Esc, _) => self.close_modal(),
            (KeyInput::Enter, _) => {
                let name = draft.name.text().to_owned();
                let participants = draft.participants.clone();
                if name.trim().is_empty() || participants.is_empty() {
                    self.status_message =
                        Some("Enter a group name and pick at least one participant".to_owned());
                    return vec![AppAction::Render];
                }
                self.create_group(&name, &participants)
            },
            (KeyInput::Tab | KeyInput::BackTab, focus) => {
                draft.focus = match focus {
                    DraftFocus::Name => DraftFocus::Participants,
                    DraftFocus::Participants => DraftFocus::Name,
                };
                vec![AppAction::Render]
            },
            (KeyInput::Up, DraftFocus::Participants) => {
                draft.cursor = draft.cursor.saturating_sub(1);
                vec![AppAction::Render]
            },
            (KeyInput::Down, DraftFocus::Participants) => {
                if draft.cursor + 1 < directory_len {
                    draft.cursor += 1;
                }
                vec![AppAction::Render]
            },
            (KeyInput::Char(' '), DraftFocus::Participants) => {
                if let Some(entry) = self.directory.get(draft.cursor) {
                    draft.toggle(&entry.user_id);
                }
                vec![AppAction::Render]
            },
            (other, DraftFocus::Name) => edit(&mut draft.name, other),
            (_, DraftFocus::Participants) => vec![],
        }
    }

    fn settings_key(&mut self, key: KeyInput) -> Vec<AppAction> {
        match key {
            KeyInput::Esc => self.close_settings(),
            KeyInput::Tab | KeyInput::Down => {
                self.settings.move_focus(true);
                vec![AppAction::Render]
            },
            KeyInput::BackTab | KeyInput::Up => {
                self.settings.move_focus(false);
                vec![AppAction::Render]
            },
            KeyInput::Enter => match self.settings.focus {
                SettingsField::Name | SettingsField::Save => {
                    self.settings.delete_armed = false;
                    let name = self.settings.name.text().to_owned();
                    self.update_profile(&name)
                },
                SettingsField::Logout => {
                    self.settings.delete_armed = false;
                    self.log_out()
                },
                SettingsField::Delete => self.delete_account(),
            },
            other => {
                self.settings.delete_armed = false;
                if self.settings.focus == SettingsField::Name {
                    edit(&mut self.settings.name, other)
                } else {
                    vec![AppAction::Render]
                }
            },
        }
    }
}

/// History query addressing `conversation`. `None` if it lacks the id its
/// kind is addressed by.
fn history_query(conversation: &Conversation) -> Option<HistoryQuery> {
    match conversation.kind {
        ChatKind::Group => conversation.group_id.as_deref().map(HistoryQuery::group),
        ChatKind::Direct => conversation.counterpart_user_id.as_deref().map(HistoryQuery::direct),
    }
}

/// Whether two conversations are the same thread, treating a synthetic
/// direct conversation and its promoted successor as one.
fn same_thread(a: &Conversation, b: &Conversation) -> bool {
    if a.conversation_id == b.conversation_id {
        return true;
    }
    a.kind == ChatKind::Direct
        && b.kind == ChatKind::Direct
        && a.counterpart_user_id.is_some()
        && a.counterpart_user_id == b.counterpart_user_id
}

fn edit(field: &mut TextField, key: KeyInput) -> Vec<AppAction> {
    if field.handle_key(key) { vec![AppAction::Render] } else { vec![] }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity() -> Identity {
        Identity { user_id: "u1".into(), auth_token: "t".into(), email: "al@example.com".into() }
    }

    fn connected_app() -> App {
        let mut app = App::new();
        let _ = app.handle(AppEvent::SessionRestored(identity()));
        let _ = app.handle(AppEvent::Connected);
        app
    }

    fn group(id: &str, channel: &str) -> Conversation {
        Conversation {
            conversation_id: ConversationId::new(id),
            kind: ChatKind::Group,
            display_name: channel.into(),
            group_id: Some(channel.into()),
            counterpart_user_id: None,
        }
    }

    fn request_ids(actions: &[AppAction]) -> Vec<(RequestId, RequestKind)> {
        actions
            .iter()
            .filter_map(|a| match a {
                AppAction::Request { id, request } => Some((*id, request.kind())),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn restore_connects_without_storing() {
        let mut app = App::new();
        let actions = app.handle(AppEvent::SessionRestored(identity()));

        assert!(matches!(actions.as_slice(), [AppAction::Connect { .. }, AppAction::Render]));
        assert_eq!(app.screen(), Screen::Chat);
        assert_eq!(app.connection_state(), ConnectionState::Connecting);
    }

    #[test]
    fn login_success_stores_and_connects() {
        let mut app = App::new();
        let actions = app.handle(AppEvent::LoginSucceeded(identity()));

        assert!(matches!(actions.as_slice(), [
            AppAction::StoreIdentity(_),
            AppAction::Connect { .. },
            AppAction::Render
        ]));
    }

    #[test]
    fn connect_subscribes_and_syncs() {
        let mut app = App::new();
        let _ = app.handle(AppEvent::SessionRestored(identity()));
        let actions = app.handle(AppEvent::Connected);

        assert_eq!(app.connection_state(), ConnectionState::Synced);
        let kinds: Vec<_> = request_ids(&actions).into_iter().map(|(_, k)| k).collect();
        assert_eq!(kinds, [RequestKind::Dashboard, RequestKind::Directory]);
        assert!(actions.contains(&AppAction::Subscribe { event: EventName::NewMessage }));
        assert!(actions.contains(&AppAction::Subscribe { event: EventName::GroupCreated }));
    }

    #[test]
    fn synced_settles_to_idle() {
        let mut app = App::new();
        let _ = app.handle(AppEvent::SessionRestored(identity()));
        let requests = request_ids(&app.handle(AppEvent::Connected));

        let _ = app.handle(AppEvent::Reply { id: requests[0].0, reply: Reply::Dashboard(vec![]) });
        assert_eq!(app.connection_state(), ConnectionState::Synced);

        let _ = app.handle(AppEvent::Reply { id: requests[1].0, reply: Reply::Directory(vec![]) });
        assert_eq!(app.connection_state(), ConnectionState::Idle);
    }

    #[test]
    fn stale_dashboard_is_discarded() {
        let mut app = connected_app();
        let old = request_ids(&app.list_conversations())[0].0;
        let new = request_ids(&app.list_conversations())[0].0;

        let _ = app.handle(AppEvent::Reply { id: new, reply: Reply::Dashboard(vec![group("g1", "ch1")]) });
        let actions = app.handle(AppEvent::Reply { id: old, reply: Reply::Dashboard(vec![]) });

        assert!(actions.is_empty());
        assert_eq!(app.conversations().len(), 1);
    }

    #[test]
    fn blank_send_is_noop() {
        let mut app = connected_app();
        assert!(app.send_message("   ").is_empty());
        assert!(app.send_message("hi").is_empty(), "no active conversation");
    }

    #[test]
    fn create_group_requires_name_and_participants() {
        let mut app = connected_app();
        assert!(app.create_group("", &["u2".to_owned()]).is_empty());
        assert!(app.create_group("ops", &[]).is_empty());
        assert_eq!(request_ids(&app.create_group("ops", &["u2".to_owned()])).len(), 1);
    }

    #[test]
    fn delete_requires_confirmation() {
        let mut app = connected_app();
        let _ = app.open_settings();

        assert!(request_ids(&app.delete_account()).is_empty());
        assert!(app.settings_form().delete_armed);

        let requests = request_ids(&app.delete_account());
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].1, RequestKind::DeleteProfile);
    }

    #[test]
    fn navigation_disarms_delete() {
        let mut app = connected_app();
        let _ = app.open_settings();
        let _ = app.delete_account();
        let _ = app.handle(AppEvent::Key(KeyInput::Up));

        assert!(!app.settings_form().delete_armed);
    }

    #[test]
    fn logout_failure_still_signs_out() {
        let mut app = connected_app();
        let id = request_ids(&app.log_out())[0].0;
        let actions = app.handle(AppEvent::RequestFailed {
            id,
            kind: RequestKind::LogOut,
            message: "not connected".into(),
        });

        assert!(actions.contains(&AppAction::ClearIdentity));
        assert!(actions.contains(&AppAction::Disconnect));
        assert_eq!(app.screen(), Screen::Login);
        assert!(app.identity().is_none());
    }

    #[test]
    fn failed_request_sets_status() {
        let mut app = connected_app();
        let id = request_ids(&app.list_conversations())[0].0;
        let _ = app.handle(AppEvent::RequestFailed {
            id,
            kind: RequestKind::Dashboard,
            message: "not connected".into(),
        });

        assert_eq!(app.status_message(), Some("Could not load conversations: not connected"));
    }

    #[test]
    fn invalid_email_blocks_login() {
        let mut app = App::new();
        let actions = app.login("nope", "pw");

        assert_eq!(actions, vec![AppAction::Render]);
        assert_eq!(app.login_form().error.as_deref(), Some("Please enter a valid email address"));
    }

    #[test]
    fn ctrl_c_quits_anywhere() {
        let mut app = App::new();
        assert_eq!(app.handle(AppEvent::Key(KeyInput::Ctrl('c'))), vec![AppAction::Quit]);
    }
}
