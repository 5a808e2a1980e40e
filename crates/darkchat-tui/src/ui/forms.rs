//! Login and registration forms.

use darkchat_app::{LoginField, LoginForm, RegisterField, RegisterForm};
use ratatui::{
    Frame,
    layout::Rect,
    text::Line,
    widgets::{Block, Borders, Paragraph},
};

use super::{centered, error_line, field_cursor, field_line, hint_line};

const FORM_WIDTH: u16 = 56;

/// Render the sign-in form.
pub fn render_login(frame: &mut Frame, form: &LoginForm, area: Rect) {
    let lines = vec![
        Line::default(),
        field_line("Email", &form.email, form.focus == LoginField::Email, false),
        field_line("Password", &form.password, form.focus == LoginField::Password, true),
        Line::default(),
        if form.submitting { hint_line("Signing in...") } else { error_line(form.error.as_deref()) },
        Line::default(),
        hint_line("Enter sign in | Tab next field | Ctrl-R create account"),
    ];

    let area = centered(area, FORM_WIDTH, lines.len() as u16 + 2);
    let block = Block::default().borders(Borders::ALL).title(" DarkChat - Sign in ");
    frame.render_widget(Paragraph::new(lines).block(block), area);

    let (field, row) = match form.focus {
        LoginField::Email => (&form.email, 2),
        LoginField::Password => (&form.password, 3),
    };
    frame.set_cursor_position(field_cursor(inner(area), area.y.saturating_add(row), field));
}

/// Render the account creation form.
pub fn render_register(frame: &mut Frame, form: &RegisterForm, area: Rect) {
    let lines = vec![
        Line::default(),
        field_line("Name", &form.display_name, form.focus == RegisterField::DisplayName, false),
        field_line("Email", &form.email, form.focus == RegisterField::Email, false),
        field_line("Password", &form.password, form.focus == RegisterField::Password, true),
        Line::default(),
        if form.submitting {
            hint_line("Creating account...")
        } else {
            error_line(form.error.as_deref())
        },
        Line::default(),
        hint_line("Enter create | Tab next field | Esc back"),
    ];

    let area = centered(area, FORM_WIDTH, lines.len() as u16 + 2);
    let block = Block::default().borders(Borders::ALL).title(" DarkChat - Create account ");
    frame.render_widget(Paragraph::new(lines).block(block), area);

    let (field, row) = match form.focus {
        RegisterField::DisplayName => (&form.display_name, 2),
        RegisterField::Email => (&form.email, 3),
        RegisterField::Password => (&form.password, 4),
    };
    frame.set_cursor_position(field_cursor(inner(area), area.y.saturating_add(row), field));
}

/// Area inside a one-cell border.
fn inner(area: Rect) -> Rect {
    Rect {
        x: area.x.saturating_add(1),
        y: area.y.saturating_add(1),
        width: area.width.saturating_sub(2),
        height: area.height.saturating_sub(2),
    }
}
