//! UI rendering
//!
//! Rendering functions that convert App state into terminal output using
//! ratatui widgets. All functions are pure (no I/O), taking state and
//! returning widget trees.

mod chat;
mod composer;
mod forms;
mod modals;
mod settings;
mod sidebar;
mod status;

use darkchat_app::{Modal, Screen, TextField};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
};

use crate::App;

const STATUS_HEIGHT: u16 = 1;

/// Render the entire UI.
pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(STATUS_HEIGHT)])
        .split(frame.area());

    let [body, status_area] = chunks.as_ref() else {
        return;
    };

    match app.screen() {
        Screen::Login => forms::render_login(frame, app.login_form(), *body),
        Screen::Register => forms::render_register(frame, app.register_form(), *body),
        Screen::Settings => settings::render(frame, app, *body),
        Screen::Chat => render_chat_screen(frame, app, *body),
    }
    status::render(frame, app, *status_area);
}

/// Render the chat screen: sidebar, messages, composer and any modal.
fn render_chat_screen(frame: &mut Frame, app: &App, area: Rect) {
    const MAIN_AREA_MIN_HEIGHT: u16 = 3;
    const COMPOSER_HEIGHT: u16 = 3;
    const SIDEBAR_WIDTH: u16 = 24;
    const CHAT_AREA_MIN_WIDTH: u16 = 20;

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(MAIN_AREA_MIN_HEIGHT), Constraint::Length(COMPOSER_HEIGHT)])
        .split(area);

    let [main_area, composer_area] = rows.as_ref() else {
        return;
    };

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(CHAT_AREA_MIN_WIDTH)])
        .split(*main_area);

    let [sidebar_area, chat_area] = columns.as_ref() else {
        return;
    };

    sidebar::render(frame, app, *sidebar_area);
    chat::render(frame, app, *chat_area);
    composer::render(frame, app, *composer_area);

    match app.modal() {
        Some(Modal::DirectPicker { cursor }) => modals::render_picker(frame, app, *cursor, area),
        Some(Modal::GroupCreator(draft)) => modals::render_group_creator(frame, app, draft, area),
        None => {},
    }
}

/// Rectangle of at most `width` x `height` centred in `area`.
fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

/// One labelled input line. Masked fields show a `*` per character.
fn field_line(label: &str, field: &TextField, focused: bool, masked: bool) -> Line<'static> {
    let value = if masked { "*".repeat(field.text().chars().count()) } else { field.text().to_owned() };
    let label_style = if focused {
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Gray)
    };
    Line::from(vec![Span::styled(format!("{label:>10}: "), label_style), Span::raw(value)])
}

/// Cursor position for a field rendered by [`field_line`] on row `y`.
fn field_cursor(area: Rect, y: u16, field: &TextField) -> (u16, u16) {
    const LABEL_WIDTH: u16 = 12;
    let max_x = area.x.saturating_add(area.width).saturating_sub(1);
    let x = area.x.saturating_add(LABEL_WIDTH).saturating_add(field.cursor() as u16);
    (x.min(max_x), y)
}

/// Error line below a form.
fn error_line(error: Option<&str>) -> Line<'_> {
    error.map_or_else(Line::default, |e| Line::styled(e, Style::default().fg(Color::Red)))
}

/// Key hints in the muted style.
fn hint_line(text: &str) -> Line<'_> {
    Line::styled(text, Style::default().fg(Color::DarkGray))
}

#[cfg(test)]
mod tests {
    use darkchat_app::{AppAction, AppEvent, KeyInput, Reply, RequestId};
    use darkchat_proto::{ChatKind, Conversation, ConversationId, DirectoryEntry, Identity, Message};
    use ratatui::{Terminal, backend::TestBackend};

    use super::*;

    /// Render `app` and return the screen as text, one line per row.
    fn draw(app: &App, width: u16, height: u16) -> String {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).expect("terminal");
        terminal.draw(|frame| render(frame, app)).expect("draw");

        let buffer = terminal.backend().buffer();
        (0..height)
            .map(|y| {
                let row: String = (0..width).map(|x| buffer[(x, y)].symbol()).collect();
                row.trim_end().to_owned()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn press(app: &mut App, keys: &[KeyInput]) {
        for key in keys {
            app.handle(AppEvent::Key(*key));
        }
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            app.handle(AppEvent::Key(KeyInput::Char(c)));
        }
    }

    fn request_ids(actions: &[AppAction]) -> Vec<RequestId> {
        actions
            .iter()
            .filter_map(|a| match a {
                AppAction::Request { id, .. } => Some(*id),
                _ => None,
            })
            .collect()
    }

    fn entry(user_id: &str, user_name: &str, online: bool) -> DirectoryEntry {
        DirectoryEntry {
            user_id: user_id.into(),
            user_name: user_name.into(),
            email: format!("{user_name}@example.com"),
            name: None,
            online,
        }
    }

    fn message(id: &str, sender: &str, body: &str) -> Message {
        Message {
            message_id: id.into(),
            body: body.into(),
            sender_display_name: sender.into(),
            read_by: None,
            created_at: Some("2024-05-01T09:30:00.000Z".into()),
        }
    }

    /// Signed in as `al` with one direct chat with `bo` and one group.
    fn chat_app() -> App {
        let mut app = App::new();
        app.handle(AppEvent::SessionRestored(Identity {
            user_id: "u1".into(),
            auth_token: "t".into(),
            email: "al@example.com".into(),
        }));
        let ids = request_ids(&app.handle(AppEvent::Connected));
        let [dashboard, directory] = ids[..] else {
            panic!("expected dashboard and directory requests, got {ids:?}");
        };

        app.handle(AppEvent::Reply {
            id: dashboard,
            reply: Reply::Dashboard(vec![
                Conversation {
                    conversation_id: ConversationId::new("g1"),
                    kind: ChatKind::Group,
                    display_name: "ops".into(),
                    group_id: Some("ch1".into()),
                    counterpart_user_id: None,
                },
                Conversation {
                    conversation_id: ConversationId::new("c1"),
                    kind: ChatKind::Direct,
                    display_name: "bo".into(),
                    group_id: None,
                    counterpart_user_id: Some("u2".into()),
                },
            ]),
        });
        app.handle(AppEvent::Reply {
            id: directory,
            reply: Reply::Directory(vec![entry("u1", "al", true), entry("u2", "bo", true), entry("u3", "cy", false)]),
        });
        app
    }

    /// [`chat_app`] with the direct chat open and two messages loaded.
    fn open_chat_app() -> App {
        let mut app = chat_app();
        let ids = request_ids(&app.open_conversation(&ConversationId::new("c1")));
        let [history] = ids[..] else {
            panic!("expected one history request, got {ids:?}");
        };
        app.handle(AppEvent::Reply {
            id: history,
            reply: Reply::History(vec![message("m1", "bo", "hey al"), message("m2", "al", "hi bo")]),
        });
        app
    }

    #[test]
    fn login_screen_masks_password() {
        let mut app = App::new();
        type_text(&mut app, "al@example.com");
        press(&mut app, &[KeyInput::Tab]);
        type_text(&mut app, "secret");

        let screen = draw(&app, 60, 16);
        assert!(screen.contains("al@example.com"), "{screen}");
        assert!(screen.contains("******"), "{screen}");
        assert!(!screen.contains("secret"), "{screen}");
    }

    #[test]
    fn login_validation_error_is_shown() {
        let mut app = App::new();
        type_text(&mut app, "not-an-email");
        press(&mut app, &[KeyInput::Tab]);
        type_text(&mut app, "pw");
        press(&mut app, &[KeyInput::Enter]);

        let screen = draw(&app, 60, 16);
        assert!(screen.contains("valid email"), "{screen}");
    }

    #[test]
    fn register_screen_fields() {
        let mut app = App::new();
        press(&mut app, &[KeyInput::Ctrl('r')]);
        type_text(&mut app, "Al");

        let screen = draw(&app, 60, 16);
        assert!(screen.contains("Create account"), "{screen}");
        assert!(screen.contains("Name: Al"), "{screen}");
    }

    #[test]
    fn chat_screen_layout() {
        let app = open_chat_app();
        let screen = draw(&app, 80, 20);

        assert!(screen.contains("Direct Messages"), "{screen}");
        assert!(screen.contains("Groups"), "{screen}");
        assert!(screen.contains("# ops"), "{screen}");
        assert!(screen.contains("hey al"), "{screen}");
        assert!(screen.contains("hi bo"), "{screen}");
    }

    #[test]
    fn messages_render_in_arrival_order() {
        let app = open_chat_app();
        let screen = draw(&app, 80, 20);

        let first = screen.find("hey al").expect("first message");
        let second = screen.find("hi bo").expect("second message");
        assert!(first < second);
    }

    #[test]
    fn empty_chat_prompts_for_selection() {
        let app = chat_app();
        let screen = draw(&app, 80, 20);
        assert!(screen.contains("Ctrl-N"), "{screen}");
    }

    #[test]
    fn picker_excludes_self() {
        let mut app = chat_app();
        press(&mut app, &[KeyInput::Ctrl('n')]);

        let screen = draw(&app, 80, 20);
        assert!(screen.contains("New chat"), "{screen}");
        assert!(screen.contains("cy"), "{screen}");
        assert!(!screen.contains("al@example.com"), "{screen}");
    }

    #[test]
    fn group_creator_checklist() {
        let mut app = chat_app();
        press(&mut app, &[KeyInput::Ctrl('g')]);
        type_text(&mut app, "team");
        press(&mut app, &[KeyInput::Tab, KeyInput::Down, KeyInput::Char(' ')]);

        let screen = draw(&app, 80, 20);
        assert!(screen.contains("New group"), "{screen}");
        assert!(screen.contains("Name: team"), "{screen}");
        assert!(screen.contains("[x] bo"), "{screen}");
        assert!(screen.contains("[ ] cy"), "{screen}");
    }

    #[test]
    fn settings_delete_confirmation() {
        let mut app = chat_app();
        press(&mut app, &[KeyInput::Ctrl('s'), KeyInput::Up, KeyInput::Enter]);

        let screen = draw(&app, 80, 20);
        assert!(screen.contains("Settings"), "{screen}");
        assert!(screen.contains("Enter again"), "{screen}");
    }

    #[test]
    fn tiny_terminal_does_not_panic() {
        let app = open_chat_app();
        let _ = draw(&app, 8, 3);
        let _ = draw(&App::new(), 1, 1);
    }
}
