//! Debug log pane showing captured tracing output.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};
use tracing::Level;

use super::log_capture::{LogBuffer, LogLine};

/// Scroll history kept by the pane (the ring buffer only bridges refreshes).
const MAX_HISTORY: usize = 1000;

/// Height of the pane when visible.
pub const DEBUG_LOG_HEIGHT: u16 = 10;

pub struct DebugLogState {
    buffer: LogBuffer,
    lines: Vec<LogLine>,
    pub visible: bool,
    /// Lines scrolled up from the newest (0 = follow).
    scroll_offset: usize,
}

impl DebugLogState {
    pub fn new(buffer: LogBuffer, visible: bool) -> Self {
        Self {
            buffer,
            lines: Vec::new(),
            visible,
            scroll_offset: 0,
        }
    }

    /// Pull new lines from the ring buffer. Call once per loop iteration.
    pub fn refresh(&mut self) {
        self.lines.extend(self.buffer.drain());
        if self.lines.len() > MAX_HISTORY {
            let excess = self.lines.len() - MAX_HISTORY;
            self.lines.drain(..excess);
            self.scroll_offset = self.scroll_offset.saturating_sub(excess);
        }
    }

    pub fn toggle(&mut self) {
        self.visible = !self.visible;
        if self.visible {
            self.scroll_offset = 0;
        }
    }

    pub fn scroll_up(&mut self, n: usize) {
        let max = self.lines.len().saturating_sub(1);
        self.scroll_offset = (self.scroll_offset + n).min(max);
    }

    pub fn scroll_down(&mut self, n: usize) {
        self.scroll_offset = self.scroll_offset.saturating_sub(n);
    }

    #[cfg(test)]
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }
}

pub fn render(area: Rect, buf: &mut Buffer, state: &DebugLogState) {
    let block = Block::default()
        .borders(Borders::TOP)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            " Debug Log (F12 to hide, Shift+PgUp/PgDn to scroll) ",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ));

    let inner = block.inner(area);
    block.render(area, buf);

    if inner.height == 0 || inner.width == 0 {
        return;
    }

    let end = state.lines.len().saturating_sub(state.scroll_offset);
    let start = end.saturating_sub(inner.height as usize);

    let lines: Vec<Line> = state.lines[start..end]
        .iter()
        .map(|line| {
            Line::from(Span::styled(
                line.text.clone(),
                Style::default().fg(level_color(line.level)),
            ))
        })
        .collect();

    Paragraph::new(lines).render(inner, buf);
}

fn level_color(level: Option<Level>) -> Color {
    match level {
        Some(Level::ERROR) => Color::Red,
        Some(Level::WARN) => Color::Yellow,
        Some(Level::INFO) => Color::Green,
        Some(_) => Color::DarkGray,
        None => Color::White,
    }
}
