//! Status bar
//!
//! Displays connection state and the latest status message.

use darkchat_app::{App, ConnectionState};
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
};

/// Render the status bar.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    frame.render_widget(status_bar(app), area);
}

fn status_bar(app: &App) -> Paragraph<'_> {
    let connection_status = match app.connection_state() {
        ConnectionState::Disconnected => {
            Span::styled("Offline", Style::default().fg(Color::Red))
        },
        ConnectionState::Connecting => {
            Span::styled("Connecting...", Style::default().fg(Color::Yellow))
        },
        ConnectionState::Synced => Span::styled("Syncing...", Style::default().fg(Color::Yellow)),
        ConnectionState::Idle => Span::styled(
            "Online",
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        ),
    };

    let mut spans = vec![Span::raw(" "), connection_status];
    if let Some(message) = app.status_message() {
        spans.push(Span::raw(" | "));
        spans.push(Span::raw(message));
    }

    Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::DarkGray).fg(Color::White))
}

#[cfg(test)]
mod tests {
    use darkchat_app::{AppEvent, KeyInput};
    use ratatui::{Terminal, backend::TestBackend};

    use super::*;

    fn line(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(48, 1)).expect("terminal");
        terminal.draw(|frame| render(frame, app, frame.area())).expect("draw");
        let buffer = terminal.backend().buffer();
        (0..48).map(|x| buffer[(x, 0)].symbol()).collect::<String>().trim_end().to_owned()
    }

    #[test]
    fn signed_out() {
        insta::assert_snapshot!(line(&App::new()), @" Offline");
    }

    #[test]
    fn validation_message() {
        let mut app = App::new();
        app.handle(AppEvent::Key(KeyInput::Enter));
        insta::assert_snapshot!(line(&app), @" Offline | Please enter a valid email address");
    }
}
