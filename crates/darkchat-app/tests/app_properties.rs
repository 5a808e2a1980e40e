//! Property-based tests for the conversation list and history.
//!
//! Dashboard snapshots, selections and pushes are generated at random and
//! fed straight into the App as events.
//!
//! # Oracle Pattern
//!
//! After every event:
//! - No counterpart has two visible direct conversations
//! - The active conversation, if any, is visible
//! - The history holds no message id twice

use std::collections::HashSet;

use darkchat_app::{App, AppAction, AppEvent, KeyInput, Reply, Request, RequestId};
use darkchat_proto::{ChatKind, Conversation, ConversationId, DirectoryEntry, Identity, Message, PushEvent};
use proptest::prelude::*;

const PEERS: [&str; 3] = ["u2", "u3", "u4"];

/// One generated input.
#[derive(Debug, Clone)]
enum Op {
    /// Dashboard snapshot listing these (chat id, peer index) directs.
    Dashboard(Vec<(u8, usize)>),
    /// Start a direct chat with a peer.
    Start(usize),
    /// Move the sidebar selection.
    Select(bool),
    /// Push a message with this id.
    Push(u8),
    /// Send text.
    Send(String),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => prop::collection::vec((0u8..6, 0usize..3), 0..6).prop_map(Op::Dashboard),
        2 => (0usize..3).prop_map(Op::Start),
        2 => any::<bool>().prop_map(Op::Select),
        2 => (0u8..8).prop_map(Op::Push),
        1 => "[a-z ]{0,4}".prop_map(Op::Send),
    ]
}

fn peer(index: usize) -> DirectoryEntry {
    let user_id = PEERS[index % PEERS.len()];
    DirectoryEntry {
        user_id: user_id.to_owned(),
        user_name: user_id.to_owned(),
        email: format!("{user_id}@example.com"),
        name: None,
        online: false,
    }
}

fn message(id: u8) -> Message {
    Message {
        message_id: format!("m{id}"),
        body: "hi".into(),
        sender_display_name: "u2".into(),
        read_by: None,
        created_at: None,
    }
}

/// Ids of the requests in `actions`.
fn requests(actions: &[AppAction]) -> Vec<RequestId> {
    actions
        .iter()
        .filter_map(|a| match a {
            AppAction::Request { id, .. } => Some(*id),
            _ => None,
        })
        .collect()
}

fn signed_in() -> App {
    let mut app = App::new();
    app.handle(AppEvent::SessionRestored(Identity {
        user_id: "u1".into(),
        auth_token: "t".into(),
        email: "al@example.com".into(),
    }));
    app.handle(AppEvent::Connected);
    app
}

fn check(app: &App) {
    let visible = app.conversations().items();

    for user_id in PEERS {
        let directs = visible.iter().filter(|c| c.is_direct_with(user_id)).count();
        assert!(directs <= 1, "{directs} direct conversations with {user_id}");
    }

    if let Some(active) = app.active_conversation_id() {
        assert!(visible.iter().any(|c| &c.conversation_id == active), "{active} not listed");
        assert_eq!(app.history().conversation(), Some(active));
    }

    let mut seen = HashSet::new();
    for m in app.history().messages() {
        assert!(seen.insert(&m.message_id), "duplicate message {}", m.message_id);
    }
}

proptest! {
    #[test]
    fn conversation_invariants_hold(ops in prop::collection::vec(op_strategy(), 1..40)) {
        let mut app = signed_in();

        for op in ops {
            match op {
                Op::Dashboard(rows) => {
                    let items = rows
                        .into_iter()
                        .map(|(chat, index)| Conversation {
                            conversation_id: ConversationId::new(format!("c{chat}")),
                            kind: ChatKind::Direct,
                            display_name: peer(index).user_name,
                            group_id: None,
                            counterpart_user_id: Some(peer(index).user_id),
                        })
                        .collect();
                    let refresh = app.list_conversations();
                    let [id] = requests(&refresh)[..] else {
                        panic!("refresh issued {refresh:?}");
                    };
                    app.handle(AppEvent::Reply { id, reply: Reply::Dashboard(items) });
                },
                Op::Start(index) => {
                    app.start_direct_conversation(&peer(index));
                },
                Op::Select(forward) => {
                    app.handle(AppEvent::Key(if forward { KeyInput::Down } else { KeyInput::Up }));
                },
                Op::Push(id) => {
                    app.handle(AppEvent::Push(PushEvent::NewMessage(message(id))));
                },
                Op::Send(text) => {
                    app.send_message(&text);
                },
            }
            check(&app);
        }
    }

    #[test]
    fn blank_send_issues_no_request(spaces in "[ \t]{0,6}") {
        let mut app = signed_in();
        app.start_direct_conversation(&peer(0));

        prop_assert!(requests(&app.send_message(&spaces)).is_empty());
    }

    #[test]
    fn pushed_messages_appear_once(ids in prop::collection::vec(0u8..5, 1..20)) {
        let mut app = signed_in();
        app.start_direct_conversation(&peer(0));

        // Each push is followed by a reload answered with the server's log.
        let mut stored: Vec<Message> = Vec::new();
        for id in &ids {
            if !stored.iter().any(|m| m.message_id == message(*id).message_id) {
                stored.push(message(*id));
            }
            let actions = app.handle(AppEvent::Push(PushEvent::NewMessage(message(*id))));
            let reload = actions.iter().find_map(|a| match a {
                AppAction::Request { id, request: Request::History { .. } } => Some(*id),
                _ => None,
            });
            let reload = reload.expect("push reloads the open thread");
            app.handle(AppEvent::Reply { id: reload, reply: Reply::History(stored.clone()) });
            check(&app);
        }

        let distinct: HashSet<_> = ids.iter().collect();
        prop_assert_eq!(app.history().messages().len(), distinct.len());
    }
}
