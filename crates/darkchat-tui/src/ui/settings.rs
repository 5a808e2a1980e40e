//! Settings screen: profile name, logout and account deletion.

use darkchat_app::{App, SettingsField};
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use super::{centered, error_line, field_cursor, field_line, hint_line};

const SETTINGS_WIDTH: u16 = 56;

/// Render the settings screen.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let form = app.settings_form();
    let email = app.identity().map_or("", |identity| identity.email.as_str());

    let delete_label =
        if form.delete_armed { "Delete account (Enter again to confirm)" } else { "Delete account" };

    let lines = vec![
        Line::from(vec![
            Span::styled("  Signed in as ", Style::default().fg(Color::Gray)),
            Span::raw(email),
        ]),
        Line::default(),
        field_line("Name", &form.name, form.focus == SettingsField::Name, false),
        Line::default(),
        button("Save profile", form.focus == SettingsField::Save, false),
        button("Log out", form.focus == SettingsField::Logout, false),
        button(delete_label, form.focus == SettingsField::Delete, form.delete_armed),
        Line::default(),
        error_line(form.error.as_deref()),
        hint_line("Tab/Up/Down move | Enter select | Esc back"),
    ];

    let area = centered(area, SETTINGS_WIDTH, lines.len() as u16 + 2);
    let block = Block::default().borders(Borders::ALL).title(" Settings ");
    frame.render_widget(Paragraph::new(lines).block(block), area);

    if form.focus == SettingsField::Name {
        let inner = Rect { x: area.x.saturating_add(1), width: area.width.saturating_sub(2), ..area };
        frame.set_cursor_position(field_cursor(inner, area.y.saturating_add(3), &form.name));
    }
}

fn button(label: &str, focused: bool, danger: bool) -> Line<'_> {
    let style = match (focused, danger) {
        (true, true) => Style::default().fg(Color::White).bg(Color::Red).add_modifier(Modifier::BOLD),
        (true, false) => Style::default().fg(Color::Black).bg(Color::Yellow).add_modifier(Modifier::BOLD),
        (false, _) => Style::default(),
    };
    Line::from(vec![
        Span::raw(if focused { "  > " } else { "    " }),
        Span::styled(format!("[ {label} ]"), style),
    ])
}
