//! Modals over the chat screen: direct picker and group creator.

use darkchat_app::{App, DraftFocus, GroupDraft};
use darkchat_proto::DirectoryEntry;
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
};

use super::{centered, field_cursor, field_line, hint_line};

const MODAL_WIDTH: u16 = 50;
const MODAL_MAX_ROWS: usize = 12;

/// Render the direct picker.
pub fn render_picker(frame: &mut Frame, app: &App, cursor: usize, area: Rect) {
    let entries = app.picker_entries();

    let mut lines: Vec<Line> = if entries.is_empty() {
        vec![hint_line("No other users yet")]
    } else {
        window(&entries, cursor)
            .map(|(idx, entry)| entry_line(entry, idx == cursor, None))
            .collect()
    };
    lines.push(Line::default());
    lines.push(hint_line("Up/Down move | Enter chat | Esc close"));

    let area = centered(area, MODAL_WIDTH, lines.len() as u16 + 2);
    let block = Block::default().borders(Borders::ALL).title(" New chat ");
    frame.render_widget(Clear, area);
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

/// Render the group creator.
pub fn render_group_creator(frame: &mut Frame, app: &App, draft: &GroupDraft, area: Rect) {
    let entries: Vec<&DirectoryEntry> = app.directory().iter().collect();
    let in_list = draft.focus == DraftFocus::Participants;

    let mut lines = vec![field_line("Name", &draft.name, !in_list, false), Line::default()];
    lines.extend(window(&entries, draft.cursor).map(|(idx, entry)| {
        entry_line(entry, in_list && idx == draft.cursor, Some(draft.is_selected(&entry.user_id)))
    }));
    lines.push(Line::default());
    lines.push(Line::styled(
        format!("{} selected", draft.participants.len()),
        Style::default().fg(Color::DarkGray),
    ));
    lines.push(hint_line("Tab switch | Space toggle | Enter create | Esc close"));

    let area = centered(area, MODAL_WIDTH, lines.len() as u16 + 2);
    let block = Block::default().borders(Borders::ALL).title(" New group ");
    frame.render_widget(Clear, area);
    frame.render_widget(Paragraph::new(lines).block(block), area);

    if !in_list {
        let inner = Rect { x: area.x.saturating_add(1), width: area.width.saturating_sub(2), ..area };
        frame.set_cursor_position(field_cursor(inner, area.y.saturating_add(1), &draft.name));
    }
}

/// Rows around `cursor` that fit in the modal, with their indices.
fn window<'e>(
    entries: &[&'e DirectoryEntry],
    cursor: usize,
) -> impl Iterator<Item = (usize, &'e DirectoryEntry)> {
    let start = (cursor + 1).saturating_sub(MODAL_MAX_ROWS);
    entries.iter().copied().enumerate().skip(start).take(MODAL_MAX_ROWS)
}

/// One directory row. `checked` adds a checkbox.
fn entry_line(entry: &DirectoryEntry, highlighted: bool, checked: Option<bool>) -> Line<'static> {
    let style = if highlighted {
        Style::default().fg(Color::Black).bg(Color::Yellow).add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };

    let mut spans = vec![Span::raw(if highlighted { "> " } else { "  " })];
    match checked {
        Some(true) => spans.push(Span::raw("[x] ")),
        Some(false) => spans.push(Span::raw("[ ] ")),
        None => {},
    }
    spans.push(Span::styled(entry.display_name().to_owned(), style));
    spans.push(Span::styled(format!("  {}", entry.email), Style::default().fg(Color::DarkGray)));
    if entry.online {
        spans.push(Span::styled(" ●", Style::default().fg(Color::Green)));
    }
    Line::from(spans)
}
