//! Observable state snapshots for invariant checking.
//!
//! Snapshots capture the observable state of the system at a point in time.
//! Invariants operate on snapshots rather than live state to ensure
//! consistent, atomic checks.

use darkchat_app::App;
use darkchat_proto::ChatKind;
use serde::Serialize;

/// Snapshot of the entire system state.
///
/// Contains observable state from one or more clients for invariant checking.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SystemSnapshot {
    /// Per-client state snapshots.
    pub clients: Vec<ClientSnapshot>,
}

impl SystemSnapshot {
    /// Create an empty snapshot (no clients).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Create a snapshot with a single client.
    pub fn single(client: ClientSnapshot) -> Self {
        Self { clients: vec![client] }
    }

    /// Create a snapshot from multiple clients.
    pub fn from_clients(clients: Vec<ClientSnapshot>) -> Self {
        Self { clients }
    }
}

/// Snapshot of a single client's observable state.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ClientSnapshot {
    /// Client label.
    pub name: String,
    /// Listed conversations in list order.
    pub conversations: Vec<ConversationSnapshot>,
    /// Selected conversation id.
    pub active: Option<String>,
    /// Conversation the history is bound to.
    pub history_for: Option<String>,
    /// Message ids in the history, in order.
    pub message_ids: Vec<String>,
}

impl ClientSnapshot {
    /// Capture `app` under `name`.
    pub fn from_app(name: &str, app: &App) -> Self {
        Self {
            name: name.to_owned(),
            conversations: app
                .conversations()
                .items()
                .iter()
                .map(|c| ConversationSnapshot {
                    id: c.conversation_id.to_string(),
                    direct: c.kind == ChatKind::Direct,
                    counterpart: c.counterpart_user_id.clone(),
                    synthetic: c.is_synthetic(),
                })
                .collect(),
            active: app.active_conversation_id().map(ToString::to_string),
            history_for: app.history().conversation().map(ToString::to_string),
            message_ids: app.history().messages().iter().map(|m| m.message_id.clone()).collect(),
        }
    }
}

/// Snapshot of one listed conversation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConversationSnapshot {
    /// Conversation id.
    pub id: String,
    /// Whether this is a direct conversation.
    pub direct: bool,
    /// Counterpart user id, for direct conversations.
    pub counterpart: Option<String>,
    /// Whether the entry is a local placeholder.
    pub synthetic: bool,
}
