//! Terminal-agnostic keyboard input and single-line text editing.

/// Keyboard input abstraction.
///
/// Decouples application logic from terminal libraries (crossterm, termion,
/// etc.) enabling deterministic simulation testing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyInput {
    /// Printable character.
    Char(char),
    /// Character typed with Control held.
    Ctrl(char),
    /// Enter/Return key.
    Enter,
    /// Backspace key (delete character before cursor).
    Backspace,
    /// Delete key (delete character at cursor).
    Delete,
    /// Tab key (next field).
    Tab,
    /// Shift+Tab (previous field).
    BackTab,
    /// Escape key (close or go back).
    Esc,
    /// Left arrow key.
    Left,
    /// Right arrow key.
    Right,
    /// Up arrow key.
    Up,
    /// Down arrow key.
    Down,
    /// Home key (cursor to start).
    Home,
    /// End key (cursor to end).
    End,
}

/// Single-line editable text with a cursor.
///
/// The cursor counts characters, not bytes, so multi-byte input edits
/// cleanly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextField {
    text: String,
    cursor: usize,
}

impl TextField {
    /// Empty field.
    pub fn new() -> Self {
        Self::default()
    }

    /// Field holding `text` with the cursor at the end.
    pub fn with_text(text: impl Into<String>) -> Self {
        let text = text.into();
        let cursor = text.chars().count();
        Self { text, cursor }
    }

    /// Current text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Cursor position in characters.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Whether the text is empty after trimming whitespace.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Remove and return the text.
    pub fn take(&mut self) -> String {
        self.cursor = 0;
        std::mem::take(&mut self.text)
    }

    /// Clear the text.
    pub fn clear(&mut self) {
        self.text.clear();
        self.cursor = 0;
    }

    /// Apply an editing key. Returns `false` for keys that do not edit text.
    pub fn handle_key(&mut self, key: KeyInput) -> bool {
        match key {
            KeyInput::Char(c) => {
                let at = self.byte_offset(self.cursor);
                self.text.insert(at, c);
                self.cursor = self.cursor.saturating_add(1);
            },
            KeyInput::Backspace => {
                if self.cursor > 0 {
                    self.cursor = self.cursor.saturating_sub(1);
                    let at = self.byte_offset(self.cursor);
                    self.text.remove(at);
                }
            },
            KeyInput::Delete => {
                if self.cursor < self.len() {
                    let at = self.byte_offset(self.cursor);
                    self.text.remove(at);
                }
            },
            KeyInput::Left => self.cursor = self.cursor.saturating_sub(1),
            KeyInput::Right => {
                if self.cursor < self.len() {
                    self.cursor = self.cursor.saturating_add(1);
                }
            },
            KeyInput::Home => self.cursor = 0,
            KeyInput::End => self.cursor = self.len(),
            KeyInput::Ctrl(_)
            | KeyInput::Enter
            | KeyInput::Tab
            | KeyInput::BackTab
            | KeyInput::Esc
            | KeyInput::Up
            | KeyInput::Down => return false,
        }
        true
    }

    fn len(&self) -> usize {
        self.text.chars().count()
    }

    fn byte_offset(&self, chars: usize) -> usize {
        self.text.char_indices().nth(chars).map_or(self.text.len(), |(i, _)| i)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn typed(text: &str) -> TextField {
        let mut field = TextField::new();
        for c in text.chars() {
            field.handle_key(KeyInput::Char(c));
        }
        field
    }

    #[test]
    fn char_input_adds_to_text() {
        let field = typed("hi");
        assert_eq!(field.text(), "hi");
        assert_eq!(field.cursor(), 2);
    }

    #[test]
    fn backspace_removes_char() {
        let mut field = typed("ab");
        field.handle_key(KeyInput::Backspace);
        assert_eq!(field.text(), "a");
        assert_eq!(field.cursor(), 1);
    }

    #[test]
    fn cursor_movement_and_mid_insert() {
        let mut field = typed("ac");
        field.handle_key(KeyInput::Left);
        field.handle_key(KeyInput::Char('b'));
        assert_eq!(field.text(), "abc");

        field.handle_key(KeyInput::Home);
        field.handle_key(KeyInput::Delete);
        assert_eq!(field.text(), "bc");
        assert_eq!(field.cursor(), 0);

        field.handle_key(KeyInput::End);
        assert_eq!(field.cursor(), 2);
    }

    #[test]
    fn multibyte_editing() {
        let mut field = typed("héllo");
        field.handle_key(KeyInput::Home);
        field.handle_key(KeyInput::Right);
        field.handle_key(KeyInput::Delete);
        assert_eq!(field.text(), "hllo");
    }

    #[test]
    fn take_clears() {
        let mut field = typed("  ");
        assert!(field.is_blank());
        assert_eq!(field.take(), "  ");
        assert_eq!(field.text(), "");
        assert_eq!(field.cursor(), 0);
    }

    #[test]
    fn navigation_keys_are_not_edits() {
        let mut field = TextField::new();
        assert!(!field.handle_key(KeyInput::Enter));
        assert!(!field.handle_key(KeyInput::Ctrl('n')));
    }
}
