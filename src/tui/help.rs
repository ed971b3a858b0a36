//! Help popup listing the key bindings.

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

const POPUP_WIDTH: u16 = 52;

/// (section title, [(key, description)])
const SECTIONS: &[(&str, &[(&str, &str)])] = &[
    (
        "NAVIGATION",
        &[
            ("Tab", "Next pane"),
            ("Shift+Tab", "Previous pane"),
            ("Up/Down", "Move in avatar list / scroll"),
            ("PgUp/PgDn", "Scroll conversation"),
            ("End", "Jump to newest message"),
        ],
    ),
    (
        "CHAT",
        &[
            ("Enter", "Send message / choose avatar"),
            ("Ctrl+U", "Clear message box"),
            ("Esc", "Leave message box"),
        ],
    ),
    (
        "MISC",
        &[
            ("F12", "Toggle debug log"),
            ("S-PgUp/PgDn", "Scroll debug log"),
            ("? / F1", "Toggle this help"),
            ("q / Ctrl+C", "Quit"),
        ],
    ),
];

pub fn render_help_popup(frame: &mut Frame) {
    let area = frame.area();
    let lines = build_lines();

    let width = POPUP_WIDTH.min(area.width.saturating_sub(2));
    let height = (lines.len() as u16 + 2).min(area.height.saturating_sub(2));
    let popup = Rect::new(
        area.x + area.width.saturating_sub(width) / 2,
        area.y + area.height.saturating_sub(height) / 2,
        width,
        height,
    );

    frame.render_widget(Clear, popup);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(Span::styled(
            " HELP ",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ))
        .title_bottom(Line::from(Span::styled(
            " Press any key to close ",
            Style::default().fg(Color::Gray),
        )));

    frame.render_widget(Paragraph::new(lines).block(block), popup);
}

fn build_lines() -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    for (i, (title, keys)) in SECTIONS.iter().enumerate() {
        if i > 0 {
            lines.push(Line::from(""));
        }
        lines.push(Line::from(Span::styled(
            format!(" {}", title),
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )));
        for (key, desc) in keys.iter() {
            lines.push(Line::from(vec![
                Span::styled(format!("   {:<13}", key), Style::default().fg(Color::Yellow)),
                Span::styled(*desc, Style::default().fg(Color::Gray)),
            ]));
        }
    }

    lines
}
