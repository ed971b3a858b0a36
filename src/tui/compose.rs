//! Compose box: single-line message input.

use ratatui::{
    layout::{Position, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph},
    Frame,
};
use unicode_width::UnicodeWidthStr;

/// Height of the compose box: border + input line + border.
pub const COMPOSE_HEIGHT: u16 = 3;

/// State for the compose box.
#[derive(Default)]
pub struct ComposeState {
    /// Current input text.
    pub input: String,
    /// Cursor position (character offset into `input`).
    pub cursor_pos: usize,
}

impl ComposeState {
    pub fn insert_char(&mut self, c: char) {
        let byte_pos = self.char_to_byte(self.cursor_pos);
        self.input.insert(byte_pos, c);
        self.cursor_pos += 1;
    }

    /// Delete the character before the cursor.
    pub fn backspace(&mut self) {
        if self.cursor_pos == 0 {
            return;
        }
        let end = self.char_to_byte(self.cursor_pos);
        let start = self.char_to_byte(self.cursor_pos - 1);
        self.input.drain(start..end);
        self.cursor_pos -= 1;
    }

    /// Delete the character under the cursor.
    pub fn delete(&mut self) {
        if self.cursor_pos < self.input.chars().count() {
            let start = self.char_to_byte(self.cursor_pos);
            let end = self.char_to_byte(self.cursor_pos + 1);
            self.input.drain(start..end);
        }
    }

    pub fn move_left(&mut self) {
        self.cursor_pos = self.cursor_pos.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        if self.cursor_pos < self.input.chars().count() {
            self.cursor_pos += 1;
        }
    }

    pub fn move_home(&mut self) {
        self.cursor_pos = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor_pos = self.input.chars().count();
    }

    pub fn clear(&mut self) {
        self.input.clear();
        self.cursor_pos = 0;
    }

    pub fn is_blank(&self) -> bool {
        self.input.trim().is_empty()
    }

    /// Take the current text and clear the box.
    /// Returns None if the input is empty or whitespace-only.
    pub fn take(&mut self) -> Option<String> {
        if self.is_blank() {
            return None;
        }
        let text = std::mem::take(&mut self.input);
        self.cursor_pos = 0;
        Some(text)
    }

    fn char_to_byte(&self, char_pos: usize) -> usize {
        self.input
            .char_indices()
            .nth(char_pos)
            .map(|(i, _)| i)
            .unwrap_or(self.input.len())
    }

    /// Display width of the text before the cursor.
    fn cursor_width(&self) -> usize {
        let byte_pos = self.char_to_byte(self.cursor_pos);
        self.input[..byte_pos].width()
    }
}

/// Render the compose box. `enabled` is false while a reply is in flight.
pub fn render(area: Rect, frame: &mut Frame, state: &ComposeState, focused: bool, enabled: bool) {
    let border_style = match (focused, enabled) {
        (_, false) => Style::default().fg(Color::DarkGray),
        (true, true) => Style::default().fg(Color::Yellow),
        (false, true) => Style::default().fg(Color::Gray),
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(if focused {
            BorderType::Double
        } else {
            BorderType::Plain
        })
        .border_style(border_style)
        .title(Span::styled(" Message ", border_style));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    if inner.width == 0 || inner.height == 0 {
        return;
    }

    let placeholder_style = Style::default()
        .fg(Color::DarkGray)
        .add_modifier(Modifier::ITALIC);

    let line = if !enabled {
        Line::from(Span::styled(
            " Waiting for the avatar to answer...",
            placeholder_style,
        ))
    } else if state.input.is_empty() {
        Line::from(Span::styled(
            " Type your message here... (Enter to send)",
            placeholder_style,
        ))
    } else {
        // Keep the cursor in view by scrolling the text horizontally.
        let visible = inner.width.saturating_sub(2) as usize;
        let offset = state.cursor_width().saturating_sub(visible);
        let shown: String = skip_width(&state.input, offset);
        Line::from(vec![Span::raw(" "), Span::raw(shown)])
    };

    frame.render_widget(Paragraph::new(line), inner);

    if focused && enabled {
        let visible = inner.width.saturating_sub(2) as usize;
        let cursor_col = state.cursor_width().min(visible) as u16;
        frame.set_cursor_position(Position::new(inner.x + 1 + cursor_col, inner.y));
    }
}

/// Drop leading characters until `width` columns are skipped.
fn skip_width(text: &str, width: usize) -> String {
    let mut skipped = 0;
    text.chars()
        .skip_while(|c| {
            if skipped >= width {
                return false;
            }
            skipped += unicode_width::UnicodeWidthChar::width(*c).unwrap_or(0);
            true
        })
        .collect()
}
