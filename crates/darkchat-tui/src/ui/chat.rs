//! Message pane
//!
//! Displays the active conversation's history in arrival order.

use darkchat_app::{App, HistoryState, view};
use darkchat_proto::{ChatKind, Message, MessageStatus};
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem},
};

const BORDER_SIZE: u16 = 2;

/// Render the message pane.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let title = app.active_conversation().map_or_else(
        || " No conversation ".to_owned(),
        |c| match c.kind {
            ChatKind::Direct => format!(" {} ", c.display_name),
            ChatKind::Group => format!(" # {} ", c.display_name),
        },
    );
    let block = Block::default().borders(Borders::ALL).title(title);

    let items: Vec<ListItem> = match (app.active_conversation(), app.history().state()) {
        (None, _) => vec![placeholder("Press Ctrl-N to start a chat")],
        (Some(_), HistoryState::Loading) => vec![placeholder("Loading messages...")],
        (Some(_), HistoryState::Idle) => vec![placeholder("Messages unavailable")],
        (Some(_), HistoryState::Empty) => vec![placeholder("No messages yet, say hi")],
        (Some(_), HistoryState::Loaded) => {
            app.history().messages().iter().map(|m| message_item(app, m)).collect()
        },
    };

    let visible_height = area.height.saturating_sub(BORDER_SIZE) as usize;
    let skip = items.len().saturating_sub(visible_height);
    let visible_items: Vec<_> = items.into_iter().skip(skip).collect();

    frame.render_widget(List::new(visible_items).block(block), area);
}

fn placeholder(text: &str) -> ListItem<'_> {
    ListItem::new(Line::styled(text, Style::default().fg(Color::DarkGray)))
}

fn message_item<'a>(app: &App, message: &'a Message) -> ListItem<'a> {
    let mine = app.is_mine(message);
    let sender_style = if mine {
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
    };

    let mut spans = Vec::with_capacity(5);
    if let Some(time) = message.created_at.as_deref().and_then(clock_time) {
        spans.push(Span::styled(format!("{time} "), Style::default().fg(Color::DarkGray)));
    }
    spans.push(Span::styled(format!("<{}>", message.sender_display_name), sender_style));
    spans.push(Span::raw(" "));
    spans.push(Span::raw(message.body.as_str()));
    if mine {
        let receipt = match view::delivery_status(message) {
            MessageStatus::Read => " ✓✓",
            MessageStatus::Sent | MessageStatus::Delivered => " ✓",
        };
        spans.push(Span::styled(receipt, Style::default().fg(Color::DarkGray)));
    }

    ListItem::new(Line::from(spans))
}

/// `HH:MM` from an ISO-8601 timestamp.
fn clock_time(timestamp: &str) -> Option<&str> {
    let (_, time) = timestamp.split_once('T')?;
    time.get(..5)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_time_from_iso() {
        assert_eq!(clock_time("2024-05-01T09:30:00.000Z"), Some("09:30"));
        assert_eq!(clock_time("2024-05-01"), None);
        assert_eq!(clock_time("2024-05-01T9"), None);
    }
}
