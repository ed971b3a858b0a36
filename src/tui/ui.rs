//! UI rendering for the TUI

use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
    Frame,
};

use super::app::{App, Pane};
use super::avatars;
use super::compose;
use super::debug_log;
use super::help;
use super::messages::{self, MessagesView};

const TITLE: &str = " Avatar Chat";

/// Returns status indicator symbol and color based on backend connectivity
fn status_indicator(is_connected: bool) -> (&'static str, Color) {
    if is_connected {
        ("*", Color::Green)
    } else {
        ("o", Color::Red)
    }
}

/// Main render function
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    let debug_height = if app.debug_log.visible {
        debug_log::DEBUG_LOG_HEIGHT
    } else {
        0
    };

    // Layout: header (1 line) + main content + debug log + status bar (1 line)
    let [header_area, main_area, debug_area, status_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Fill(1),
        Constraint::Length(debug_height),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(header_area, frame.buffer_mut(), app);

    match &app.directory {
        None => render_loading(main_area, frame.buffer_mut(), app),
        Some(directory) => {
            let processing = app.is_processing();

            let [avatars_area, content_area] = Layout::horizontal([
                Constraint::Length(avatars::AVATARS_WIDTH),
                Constraint::Fill(1),
            ])
            .areas(main_area);

            avatars::render(
                avatars_area,
                frame.buffer_mut(),
                directory,
                &app.avatar_list,
                app.active_pane == Pane::Avatars,
                processing,
            );

            let [messages_area, compose_area] = Layout::vertical([
                Constraint::Fill(1),
                Constraint::Length(compose::COMPOSE_HEIGHT),
            ])
            .areas(content_area);

            let history = app.session.messages();
            let view = MessagesView {
                messages: &history,
                processing: app.session.is_processing(),
                avatar_name: app.avatar_name(),
            };
            messages::render(
                messages_area,
                frame.buffer_mut(),
                &view,
                &app.messages,
                app.active_pane == Pane::Messages,
            );

            compose::render(
                compose_area,
                frame,
                &app.compose,
                app.active_pane == Pane::Compose,
                !processing,
            );
        }
    }

    if debug_height > 0 {
        debug_log::render(debug_area, frame.buffer_mut(), &app.debug_log);
    }

    render_status(status_area, frame.buffer_mut(), app);

    // Help popup goes on top of everything else
    if app.show_help {
        help::render_help_popup(frame);
    }
}

fn render_loading(area: Rect, buf: &mut Buffer, app: &App) {
    let [_, text_area, _] = Layout::vertical([
        Constraint::Fill(1),
        Constraint::Length(3),
        Constraint::Fill(1),
    ])
    .areas(area);

    let lines = vec![
        Line::from(Span::styled(
            "Connecting to backend...",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ))
        .centered(),
        Line::from(""),
        Line::from(Span::styled(
            app.backend_url.clone(),
            Style::default().fg(Color::DarkGray),
        ))
        .centered(),
    ];

    Paragraph::new(lines).render(text_area, buf);
}

/// Render the header bar
fn render_header(area: Rect, buf: &mut Buffer, app: &App) {
    let title = Span::styled(
        TITLE,
        Style::default()
            .fg(Color::White)
            .add_modifier(Modifier::BOLD),
    );

    let help_indicator = "[?] Help ".to_string();
    let (connection, avatar_info, status_color) = match &app.directory {
        None => (
            "... connecting ".to_string(),
            String::new(),
            Color::Yellow,
        ),
        Some(directory) => {
            let (symbol, color) = status_indicator(directory.is_connected());
            let state = if directory.is_connected() {
                "connected"
            } else {
                "disconnected"
            };
            (
                format!("{} {} ", symbol, state),
                format!(" {} avatars | {} ", directory.len(), app.avatar_name()),
                color,
            )
        }
    };

    // Right-align everything after the title
    let right_width = help_indicator.len() + connection.len() + avatar_info.chars().count();
    let padding_width = (area.width as usize).saturating_sub(TITLE.len() + right_width);

    let header_line = Line::from(vec![
        title,
        Span::raw(" ".repeat(padding_width)),
        Span::styled(help_indicator, Style::default().fg(Color::Gray)),
        Span::styled(connection, Style::default().fg(status_color)),
        Span::styled(avatar_info, Style::default().fg(Color::Cyan)),
    ]);

    Paragraph::new(header_line)
        .style(Style::default().bg(Color::DarkGray))
        .render(area, buf);
}

/// Render the status bar
fn render_status(area: Rect, buf: &mut Buffer, app: &App) {
    // If there's a status message, show it prominently.
    if let Some(ref msg) = app.status_message {
        let style = if app.status_is_error {
            Style::default().fg(Color::Red).bg(Color::DarkGray)
        } else {
            Style::default().fg(Color::Green).bg(Color::DarkGray)
        };
        let line = Line::from(Span::styled(format!(" {} ", msg), style));
        Paragraph::new(line)
            .style(Style::default().bg(Color::DarkGray))
            .render(area, buf);
        return;
    }

    let sep_style = Style::default().fg(Color::DarkGray);

    let activity = if app.is_loading() {
        Span::styled(" loading ", Style::default().fg(Color::Yellow))
    } else if app.is_processing() {
        Span::styled(" thinking... ", Style::default().fg(Color::Yellow))
    } else {
        Span::styled(" ready ", Style::default().fg(Color::Green))
    };

    let count = Span::styled(
        format!("{} messages", app.session.len()),
        Style::default().fg(Color::Yellow),
    );

    let pane = Span::styled(
        format!("Tab: {} ", app.active_pane.as_str()),
        Style::default().fg(Color::Cyan),
    );

    let status_line = Line::from(vec![
        activity,
        Span::styled(" | ", sep_style),
        count,
        Span::styled(" | ", sep_style),
        pane,
        Span::styled(" | ", sep_style),
        Span::styled("?: help", Style::default().fg(Color::Gray)),
        Span::styled(" | ", sep_style),
        Span::styled("F12: log", Style::default().fg(Color::Gray)),
    ]);

    Paragraph::new(status_line)
        .style(Style::default().bg(Color::DarkGray))
        .render(area, buf);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::fake::FakeBackend;
    use crate::chat::{AvatarDirectory, Session};
    use crate::tui::log_capture::LogBuffer;
    use crate::tui::worker::WorkerEvent;
    use ratatui::{backend::TestBackend, Terminal};

    fn screen_text(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|frame| render(frame, app)).unwrap();
        let buffer = terminal.backend().buffer().clone();
        buffer
            .content()
            .chunks(buffer.area.width as usize)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn new_app() -> App {
        App::new(
            Session::new(),
            LogBuffer::new(),
            "http://localhost:5000/".to_string(),
            false,
        )
    }

    #[test]
    fn test_status_indicator() {
        assert_eq!(status_indicator(true), ("*", Color::Green));
        assert_eq!(status_indicator(false), ("o", Color::Red));
    }

    #[test]
    fn test_loading_screen() {
        let text = screen_text(&new_app());
        assert!(text.contains("Connecting to backend..."));
        assert!(text.contains("http://localhost:5000/"));
    }

    #[tokio::test]
    async fn test_ready_screen() {
        let mut app = new_app();
        let directory = AvatarDirectory::initialize(&FakeBackend::healthy(), None).await;
        app.handle_worker_event(WorkerEvent::DirectoryReady(directory));

        let text = screen_text(&app);
        assert!(text.contains("Avatars (1)"));
        assert!(text.contains("Art - Bob Ross"));
        assert!(text.contains("connected"));
        assert!(text.contains("Welcome!"));
    }

    #[tokio::test]
    async fn test_disconnected_header() {
        let mut app = new_app();
        let directory = AvatarDirectory::initialize(&FakeBackend::unreachable(), None).await;
        app.handle_worker_event(WorkerEvent::DirectoryReady(directory));

        let text = screen_text(&app);
        assert!(text.contains("disconnected"));
        assert!(text.contains("(built-in list)"));
    }
}
