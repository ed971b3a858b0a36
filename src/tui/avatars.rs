//! Avatar list pane: browse and pick the avatar that answers.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph, Widget},
};

use crate::chat::{AvatarDirectory, AvatarSource};

/// Width of the avatar pane in columns.
pub const AVATARS_WIDTH: u16 = 28;

/// Cursor within the avatar list (separate from the actual selection).
#[derive(Default)]
pub struct AvatarListState {
    pub highlighted: usize,
}

impl AvatarListState {
    /// Put the cursor on the directory's current selection.
    pub fn sync(&mut self, directory: &AvatarDirectory) {
        self.highlighted = directory
            .selected()
            .and_then(|key| directory.position(key))
            .unwrap_or(0);
    }

    pub fn move_up(&mut self) {
        self.highlighted = self.highlighted.saturating_sub(1);
    }

    pub fn move_down(&mut self, count: usize) {
        if self.highlighted + 1 < count {
            self.highlighted += 1;
        }
    }

    /// Make the highlighted avatar the selected one.
    pub fn confirm(&self, directory: &mut AvatarDirectory) -> Option<String> {
        let key = directory.avatars().get(self.highlighted)?.file_key.clone();
        directory.select(&key).then_some(key)
    }
}

pub fn render(
    area: Rect,
    buf: &mut Buffer,
    directory: &AvatarDirectory,
    state: &AvatarListState,
    focused: bool,
    locked: bool,
) {
    let border_style = if focused {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(if focused {
            BorderType::Double
        } else {
            BorderType::Plain
        })
        .border_style(border_style)
        .title(Span::styled(
            format!(" Avatars ({}) ", directory.len()),
            border_style,
        ));

    let inner = block.inner(area);
    block.render(area, buf);

    if inner.height == 0 || inner.width == 0 {
        return;
    }

    let max_name = inner.width.saturating_sub(4) as usize;
    let mut lines: Vec<Line> = directory
        .avatars()
        .iter()
        .enumerate()
        .map(|(i, avatar)| {
            let is_selected = directory.selected() == Some(avatar.file_key.as_str());
            let is_cursor = focused && i == state.highlighted;

            let marker = if is_selected { "* " } else { "  " };
            let mut style = if is_selected {
                Style::default()
                    .fg(Color::Green)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Gray)
            };
            if locked {
                style = style.add_modifier(Modifier::DIM);
            }
            if is_cursor {
                style = style.bg(Color::DarkGray);
            }

            Line::from(vec![
                Span::styled(marker, style),
                Span::styled(truncate(&avatar.display_name, max_name), style),
            ])
        })
        .collect();

    if directory.source() == AvatarSource::Fallback {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            " (built-in list)",
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        )));
    }

    Paragraph::new(lines).render(inner, buf);
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max.saturating_sub(1)).collect();
    out.push('~');
    out
}
