//! Composer
//!
//! Displays the message being typed with a cursor.

use darkchat_app::App;
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Style},
    widgets::{Block, Borders, Paragraph},
};

const PROMPT_WIDTH: u16 = 3; // "> "
const INPUT_LINE_OFFSET_Y: u16 = 1; // inside top border
const RIGHT_PADDING: u16 = 1; // inside right border

/// Render the composer.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let hint = if app.active_conversation().is_some() {
        " Enter send | Ctrl-N chat | Ctrl-G group | Ctrl-S settings "
    } else {
        " Ctrl-N chat | Ctrl-G group | Ctrl-S settings "
    };
    let block = Block::default().borders(Borders::ALL).title_bottom(hint);

    let input = app.composer();
    let paragraph = Paragraph::new(format!("> {}", input.text()))
        .style(Style::default().fg(Color::White))
        .block(block);

    frame.render_widget(paragraph, area);

    if app.modal().is_some() {
        return;
    }

    let available_width = area.width.saturating_sub(PROMPT_WIDTH + RIGHT_PADDING);
    let cursor_offset = (input.cursor() as u16).min(available_width);

    let cursor_x = area.x.saturating_add(PROMPT_WIDTH).saturating_add(cursor_offset);
    let cursor_y = area.y.saturating_add(INPUT_LINE_OFFSET_Y);
    let max_x = area.x.saturating_add(area.width).saturating_sub(RIGHT_PADDING);
    let cursor_x = cursor_x.min(max_x);

    frame.set_cursor_position((cursor_x, cursor_y));
}
