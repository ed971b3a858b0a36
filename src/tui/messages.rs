//! Messages pane: the conversation as cards, newest at the bottom.

use chrono::Local;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph, Widget},
};
use unicode_width::UnicodeWidthStr;

use crate::models::{Message, Sender};

/// Scroll state for the messages pane.
#[derive(Default)]
pub struct MessagesState {
    /// Lines scrolled up from the bottom (0 = follow newest).
    pub scroll_from_bottom: usize,
}

impl MessagesState {
    pub fn scroll_up(&mut self, n: usize) {
        self.scroll_from_bottom = self.scroll_from_bottom.saturating_add(n);
    }

    pub fn scroll_down(&mut self, n: usize) {
        self.scroll_from_bottom = self.scroll_from_bottom.saturating_sub(n);
    }

    pub fn follow(&mut self) {
        self.scroll_from_bottom = 0;
    }
}

/// What the pane needs from the app for one frame.
pub struct MessagesView<'a> {
    pub messages: &'a [Message],
    pub processing: bool,
    /// Display name used on avatar cards.
    pub avatar_name: &'a str,
}

pub fn render(
    area: Rect,
    buf: &mut Buffer,
    view: &MessagesView<'_>,
    state: &MessagesState,
    focused: bool,
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
        .title(Span::styled(" Conversation ", border_style));

    let inner = block.inner(area);
    block.render(area, buf);

    if inner.height == 0 || inner.width == 0 {
        return;
    }

    let lines = if view.messages.is_empty() && !view.processing {
        welcome_lines()
    } else {
        build_lines(view, inner.width as usize)
    };

    let total = lines.len();
    let height = inner.height as usize;
    let max_scroll = total.saturating_sub(height);
    let scroll_from_bottom = state.scroll_from_bottom.min(max_scroll);
    let start = max_scroll - scroll_from_bottom;

    let visible: Vec<Line> = lines.into_iter().skip(start).take(height).collect();
    Paragraph::new(visible).render(inner, buf);

    if total > height {
        let x = inner.x + inner.width.saturating_sub(1);
        if start > 0 {
            let cell = &mut buf[(x, inner.y)];
            cell.set_char('^');
            cell.set_style(Style::default().fg(Color::DarkGray));
        }
        if scroll_from_bottom > 0 {
            let cell = &mut buf[(x, inner.y + inner.height - 1)];
            cell.set_char('v');
            cell.set_style(Style::default().fg(Color::DarkGray));
        }
    }
}

fn welcome_lines() -> Vec<Line<'static>> {
    vec![
        Line::from(""),
        Line::from(Span::styled(
            "  Welcome!",
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "  Select an avatar and start chatting.",
            Style::default().fg(Color::Gray),
        )),
        Line::from(Span::styled(
            "  Your avatar will respond with an animated video.",
            Style::default().fg(Color::Gray),
        )),
    ]
}

fn build_lines(view: &MessagesView<'_>, width: usize) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    for msg in view.messages {
        let (name, name_color) = match msg.sender() {
            Sender::User => ("You", Color::Cyan),
            Sender::Avatar => (view.avatar_name, Color::Magenta),
        };
        let time = msg.timestamp().with_timezone(&Local).format("%H:%M:%S").to_string();

        let mut body: Vec<Line<'static>> = wrap_text(msg.text(), card_text_width(width))
            .into_iter()
            .map(Line::from)
            .collect();
        if let Some(url) = msg.media_ref() {
            body.push(Line::from(Span::styled(
                format!("[video] {}", url),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::DIM),
            )));
        }

        push_card(&mut lines, width, name, name_color, &time, body);
        lines.push(Line::from(""));
    }

    if view.processing {
        let body = vec![Line::from(Span::styled(
            "Thinking and generating response...",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::ITALIC),
        ))];
        push_card(&mut lines, width, view.avatar_name, Color::Magenta, "", body);
    }

    lines
}

fn card_text_width(width: usize) -> usize {
    width.saturating_sub(4)
}

/// A card: header with name and time, body lines, bottom rule.
fn push_card(
    lines: &mut Vec<Line<'static>>,
    width: usize,
    name: &str,
    name_color: Color,
    time: &str,
    body: Vec<Line<'static>>,
) {
    let rule_style = Style::default().fg(Color::DarkGray);
    let pad = width
        .saturating_sub(name.width())
        .saturating_sub(time.width())
        .saturating_sub(4);

    lines.push(Line::from(vec![
        Span::styled("+ ".to_string(), rule_style),
        Span::styled(
            name.to_string(),
            Style::default().fg(name_color).add_modifier(Modifier::BOLD),
        ),
        Span::raw(" ".repeat(pad)),
        Span::styled(time.to_string(), rule_style),
    ]));

    for line in body {
        let mut spans = vec![Span::styled("| ".to_string(), rule_style)];
        spans.extend(line.spans);
        lines.push(Line::from(spans));
    }

    lines.push(Line::from(Span::styled(
        format!("+{}", "-".repeat(width.saturating_sub(2).min(40))),
        rule_style,
    )));
}

/// Word-wrap by display width; words longer than a line are split.
fn wrap_text(text: &str, max_width: usize) -> Vec<String> {
    if max_width == 0 {
        return Vec::new();
    }

    let mut result = Vec::new();
    for raw in text.lines() {
        let mut current = String::new();
        for word in raw.split_whitespace() {
            let needed = if current.is_empty() {
                word.width()
            } else {
                current.width() + 1 + word.width()
            };
            if needed <= max_width {
                if !current.is_empty() {
                    current.push(' ');
                }
                current.push_str(word);
                continue;
            }
            if !current.is_empty() {
                result.push(std::mem::take(&mut current));
            }
            for c in word.chars() {
                let cw = unicode_width::UnicodeWidthChar::width(c).unwrap_or(0);
                if current.width() + cw > max_width && !current.is_empty() {
                    result.push(std::mem::take(&mut current));
                }
                current.push(c);
            }
        }
        result.push(current);
    }
    result
}
