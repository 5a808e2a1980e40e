//! Conversations sidebar
//!
//! Direct conversations first, then groups. The active conversation is
//! marked; directs show the counterpart's last known presence.

use darkchat_app::App;
use darkchat_proto::{ChatKind, Conversation};
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem},
};

const ACTIVE_PREFIX: &str = ">";
const INACTIVE_PREFIX: &str = " ";
const GROUP_MARKER: &str = "# ";
const ONLINE_MARKER: &str = "● ";
const OFFLINE_MARKER: &str = "○ ";

/// Render the sidebar.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let mut items = vec![header("Direct Messages")];
    items.extend(app.conversations().of_kind(ChatKind::Direct).map(|c| row(app, c)));
    items.push(ListItem::new(Line::default()));
    items.push(header("Groups"));
    items.extend(app.conversations().of_kind(ChatKind::Group).map(|c| row(app, c)));

    let block = Block::default().borders(Borders::ALL).title(" Chats ");
    frame.render_widget(List::new(items).block(block), area);
}

fn header(title: &str) -> ListItem<'_> {
    ListItem::new(Line::styled(
        title,
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
    ))
}

fn row<'a>(app: &App, conversation: &'a Conversation) -> ListItem<'a> {
    let active = app.active_conversation_id() == Some(&conversation.conversation_id);

    let marker = match conversation.kind {
        ChatKind::Group => Span::raw(GROUP_MARKER),
        ChatKind::Direct => {
            let online = conversation.counterpart_user_id.as_deref().is_some_and(|user_id| {
                app.directory().iter().any(|e| e.user_id == user_id && e.online)
            });
            if online {
                Span::styled(ONLINE_MARKER, Style::default().fg(Color::Green))
            } else {
                Span::styled(OFFLINE_MARKER, Style::default().fg(Color::DarkGray))
            }
        },
    };

    let mut name_style = if active {
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };
    if conversation.is_synthetic() {
        name_style = name_style.add_modifier(Modifier::ITALIC);
    }

    ListItem::new(Line::from(vec![
        Span::raw(if active { ACTIVE_PREFIX } else { INACTIVE_PREFIX }),
        marker,
        Span::styled(conversation.display_name.as_str(), name_style),
    ]))
}
