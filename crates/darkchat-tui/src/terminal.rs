//! Terminal driver for the TUI.
//!
//! Implements the [`Driver`] trait for terminal I/O using crossterm for
//! keyboard events and ratatui for rendering. The event socket goes through
//! the client's [`Gateway`], login and registration through [`AuthApi`].

use std::io::{self, Stdout, stdout};

use crossterm::{
    ExecutableCommand,
    event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use darkchat_client::{
    ClientConfig, GatewayError, Inbound, Outbound, SessionError, SessionStore,
    api::{ApiError, AuthApi},
    transport::Gateway,
};
use darkchat_proto::Identity;
use futures::StreamExt;
use ratatui::{Terminal, backend::CrosstermBackend};
use thiserror::Error;

use crate::{App, AppEvent, Driver, KeyInput, ui};

/// How long to wait for terminal input before yielding a tick.
const POLL_INTERVAL: tokio::time::Duration = tokio::time::Duration::from_millis(50);

/// Terminal driver errors.
#[derive(Debug, Error)]
pub enum TerminalError {
    /// I/O error from terminal operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Event socket error.
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// REST API error.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Session file error.
    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Terminal driver implementing the [`Driver`] trait.
///
/// Handles terminal I/O (crossterm), rendering (ratatui), the event socket
/// and the REST calls. Owns the session store.
pub struct TerminalDriver {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    event_stream: EventStream,
    gateway: Gateway,
    api: AuthApi,
    session: SessionStore,
}

impl TerminalDriver {
    /// Enter the alternate screen and build a driver for `config`.
    pub fn new(config: &ClientConfig, session: SessionStore) -> Result<Self, TerminalError> {
        let api = AuthApi::new(&config.api_url)?;

        enable_raw_mode()?;
        stdout().execute(EnterAlternateScreen)?;

        let backend = CrosstermBackend::new(stdout());
        let terminal = Terminal::new(backend)?;

        Ok(Self {
            terminal,
            event_stream: EventStream::new(),
            gateway: Gateway::new(config.server_url.clone()),
            api,
            session,
        })
    }
}

/// Convert a crossterm key event to `KeyInput`.
///
/// Control-modified characters become [`KeyInput::Ctrl`] in lower case.
pub fn convert_key(event: KeyEvent) -> Option<KeyInput> {
    if event.modifiers.contains(KeyModifiers::CONTROL)
        && let KeyCode::Char(c) = event.code
    {
        return Some(KeyInput::Ctrl(c.to_ascii_lowercase()));
    }

    match event.code {
        KeyCode::Char(c) => Some(KeyInput::Char(c)),
        KeyCode::Enter => Some(KeyInput::Enter),
        KeyCode::Backspace => Some(KeyInput::Backspace),
        KeyCode::Delete => Some(KeyInput::Delete),
        KeyCode::Tab if event.modifiers.contains(KeyModifiers::SHIFT) => Some(KeyInput::BackTab),
        KeyCode::Tab => Some(KeyInput::Tab),
        KeyCode::BackTab => Some(KeyInput::BackTab),
        KeyCode::Esc => Some(KeyInput::Esc),
        KeyCode::Left => Some(KeyInput::Left),
        KeyCode::Right => Some(KeyInput::Right),
        KeyCode::Up => Some(KeyInput::Up),
        KeyCode::Down => Some(KeyInput::Down),
        KeyCode::Home => Some(KeyInput::Home),
        KeyCode::End => Some(KeyInput::End),
        _ => None,
    }
}

impl Driver for TerminalDriver {
    type Error = TerminalError;

    async fn poll_event(&mut self) -> Result<Option<AppEvent>, Self::Error> {
        tokio::select! {
            biased;

            // Terminal events
            maybe_event = self.event_stream.next() => {
                match maybe_event {
                    Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                        Ok(convert_key(key).map(AppEvent::Key))
                    },
                    Some(Ok(Event::Resize(cols, rows))) => Ok(Some(AppEvent::Resize(cols, rows))),
                    Some(Err(e)) => Err(TerminalError::Io(e)),
                    _ => Ok(None),
                }
            }

            // Tick timeout, lets the runtime drain the gateway
            () = tokio::time::sleep(POLL_INTERVAL) => Ok(Some(AppEvent::Tick)),
        }
    }

    async fn send(&mut self, message: Outbound) -> bool {
        self.gateway.send(message).await
    }

    fn recv(&mut self) -> Option<Inbound> {
        self.gateway.try_recv()
    }

    async fn connect(&mut self, identity: &Identity) -> Result<(), Self::Error> {
        self.gateway.connect(Some(identity)).await?;
        Ok(())
    }

    fn disconnect(&mut self) {
        self.gateway.disconnect();
    }

    fn is_connected(&self) -> bool {
        self.gateway.is_connected()
    }

    async fn login(&mut self, email: &str, password: &str) -> Result<Identity, Self::Error> {
        Ok(self.api.login(email, password).await?)
    }

    async fn register(
        &mut self,
        display_name: &str,
        email: &str,
        password: &str,
    ) -> Result<(), Self::Error> {
        Ok(self.api.register(display_name, email, password).await?)
    }

    fn stored_identity(&self) -> Option<Identity> {
        self.session.identity().cloned()
    }

    fn store_identity(&mut self, identity: &Identity) -> Result<(), Self::Error> {
        Ok(self.session.store(identity.clone())?)
    }

    fn clear_identity(&mut self) -> Result<(), Self::Error> {
        Ok(self.session.clear()?)
    }

    fn render(&mut self, app: &App) -> Result<(), Self::Error> {
        self.terminal.draw(|frame| {
            ui::render(frame, app);
        })?;
        Ok(())
    }

    fn stop(&mut self) {
        self.gateway.disconnect();
    }
}

impl Drop for TerminalDriver {
    fn drop(&mut self) {
        self.stop();
        let _ = disable_raw_mode();
        let _ = stdout().execute(LeaveAlternateScreen);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    #[test]
    fn control_characters() {
        assert_eq!(convert_key(key(KeyCode::Char('n'), KeyModifiers::CONTROL)), Some(KeyInput::Ctrl('n')));
        assert_eq!(convert_key(key(KeyCode::Char('C'), KeyModifiers::CONTROL)), Some(KeyInput::Ctrl('c')));
    }

    #[test]
    fn shifted_characters_stay_plain() {
        assert_eq!(convert_key(key(KeyCode::Char('A'), KeyModifiers::SHIFT)), Some(KeyInput::Char('A')));
    }

    #[test]
    fn back_tab_variants() {
        assert_eq!(convert_key(key(KeyCode::BackTab, KeyModifiers::SHIFT)), Some(KeyInput::BackTab));
        assert_eq!(convert_key(key(KeyCode::Tab, KeyModifiers::SHIFT)), Some(KeyInput::BackTab));
        assert_eq!(convert_key(key(KeyCode::Tab, KeyModifiers::NONE)), Some(KeyInput::Tab));
    }

    #[test]
    fn unmapped_keys() {
        assert_eq!(convert_key(key(KeyCode::F(1), KeyModifiers::NONE)), None);
        assert_eq!(convert_key(key(KeyCode::PageUp, KeyModifiers::NONE)), None);
    }
}
