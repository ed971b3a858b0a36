//! TUI application state and main event loop

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use crossterm::event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use futures::{FutureExt, StreamExt};
use ratatui::DefaultTerminal;

use super::avatars::AvatarListState;
use super::compose::ComposeState;
use super::debug_log::DebugLogState;
use super::log_capture::LogBuffer;
use super::messages::MessagesState;
use super::ui;
use super::worker::{Worker, WorkerCommand, WorkerEvent};
use crate::api::client::BackendClient;
use crate::chat::{AvatarDirectory, ChatOrchestrator, Session, Submission};
use crate::config::Config;

/// Target frame rate for UI updates (~30 fps)
const FRAME_DURATION_MS: u64 = 33;

const PAGE_LINES: usize = 10;

/// Active pane in the TUI
#[derive(Default, Clone, Copy, PartialEq, Eq, Debug)]
pub enum Pane {
    Avatars,
    Messages,
    #[default]
    Compose,
}

impl Pane {
    pub fn as_str(&self) -> &'static str {
        match self {
            Pane::Avatars => "avatars",
            Pane::Messages => "messages",
            Pane::Compose => "compose",
        }
    }

    fn next(self) -> Self {
        match self {
            Pane::Avatars => Pane::Messages,
            Pane::Messages => Pane::Compose,
            Pane::Compose => Pane::Avatars,
        }
    }

    fn prev(self) -> Self {
        match self {
            Pane::Avatars => Pane::Compose,
            Pane::Messages => Pane::Avatars,
            Pane::Compose => Pane::Messages,
        }
    }
}

/// Application state
pub struct App {
    pub should_exit: bool,
    pub active_pane: Pane,
    /// `None` until startup initialization finishes (loading screen).
    pub directory: Option<AvatarDirectory>,
    /// Shared with the orchestrator; read fresh on every frame.
    pub session: Session,
    pub avatar_list: AvatarListState,
    pub messages: MessagesState,
    pub compose: ComposeState,
    pub debug_log: DebugLogState,
    pub show_help: bool,
    pub status_message: Option<String>,
    pub status_is_error: bool,
    pub backend_url: String,
    /// A submit was sent to the worker and its result has not come back yet.
    awaiting_reply: bool,
}

impl App {
    pub fn new(session: Session, log_buffer: LogBuffer, backend_url: String, show_debug: bool) -> Self {
        Self {
            should_exit: false,
            active_pane: Pane::default(),
            directory: None,
            session,
            avatar_list: AvatarListState::default(),
            messages: MessagesState::default(),
            compose: ComposeState::default(),
            debug_log: DebugLogState::new(log_buffer, show_debug),
            show_help: false,
            status_message: None,
            status_is_error: false,
            backend_url,
            awaiting_reply: false,
        }
    }

    /// A reply is in flight: compose and avatar switching are locked.
    pub fn is_processing(&self) -> bool {
        self.awaiting_reply || self.session.is_processing()
    }

    pub fn is_loading(&self) -> bool {
        self.directory.is_none()
    }

    /// Display name of the selected avatar, for message cards and the header.
    pub fn avatar_name(&self) -> &str {
        self.directory
            .as_ref()
            .and_then(|d| d.selected_avatar())
            .map(|a| a.display_name.as_str())
            .unwrap_or("Avatar")
    }

    fn set_status(&mut self, msg: impl Into<String>, is_error: bool) {
        self.status_message = Some(msg.into());
        self.status_is_error = is_error;
    }

    /// Per-frame housekeeping.
    pub fn tick(&mut self) {
        self.debug_log.refresh();
    }

    /// Handle one key press. Returns a command for the worker, if any.
    pub fn handle_key(&mut self, key: KeyEvent) -> Option<WorkerCommand> {
        if key.kind != KeyEventKind::Press {
            return None;
        }

        if self.show_help {
            self.show_help = false;
            return None;
        }

        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char('c') if ctrl => {
                self.should_exit = true;
                return None;
            }
            KeyCode::F(12) => {
                self.debug_log.toggle();
                return None;
            }
            KeyCode::F(1) => {
                self.show_help = true;
                return None;
            }
            _ => {}
        }

        if self.is_loading() {
            if key.code == KeyCode::Char('q') {
                self.should_exit = true;
            }
            return None;
        }

        match key.code {
            KeyCode::Tab => {
                self.active_pane = self.active_pane.next();
                return None;
            }
            KeyCode::BackTab => {
                self.active_pane = self.active_pane.prev();
                return None;
            }
            KeyCode::PageUp if key.modifiers.contains(KeyModifiers::SHIFT) => {
                self.debug_log.scroll_up(PAGE_LINES);
                return None;
            }
            KeyCode::PageDown if key.modifiers.contains(KeyModifiers::SHIFT) => {
                self.debug_log.scroll_down(PAGE_LINES);
                return None;
            }
            KeyCode::PageUp => {
                self.messages.scroll_up(PAGE_LINES);
                return None;
            }
            KeyCode::PageDown => {
                self.messages.scroll_down(PAGE_LINES);
                return None;
            }
            _ => {}
        }

        match self.active_pane {
            Pane::Compose => self.handle_compose_key(key),
            Pane::Messages => {
                self.handle_messages_key(key);
                None
            }
            Pane::Avatars => {
                self.handle_avatars_key(key);
                None
            }
        }
    }

    fn handle_common_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char('q') => self.should_exit = true,
            KeyCode::Char('?') => self.show_help = true,
            _ => {}
        }
    }

    fn handle_compose_key(&mut self, key: KeyEvent) -> Option<WorkerCommand> {
        if key.code == KeyCode::Esc {
            self.active_pane = Pane::Messages;
            return None;
        }
        if self.is_processing() {
            return None;
        }

        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Enter => return self.submit(),
            KeyCode::Char('u') if ctrl => self.compose.clear(),
            KeyCode::Char(c) if !ctrl => self.compose.insert_char(c),
            KeyCode::Backspace => self.compose.backspace(),
            KeyCode::Delete => self.compose.delete(),
            KeyCode::Left => self.compose.move_left(),
            KeyCode::Right => self.compose.move_right(),
            KeyCode::Home => self.compose.move_home(),
            KeyCode::End => self.compose.move_end(),
            _ => {}
        }
        None
    }

    fn handle_messages_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Up => self.messages.scroll_up(1),
            KeyCode::Down => self.messages.scroll_down(1),
            KeyCode::End => self.messages.follow(),
            KeyCode::Enter => self.active_pane = Pane::Compose,
            code => self.handle_common_key(code),
        }
    }

    fn handle_avatars_key(&mut self, key: KeyEvent) {
        let Some(directory) = self.directory.as_mut() else {
            return;
        };
        match key.code {
            KeyCode::Up => self.avatar_list.move_up(),
            KeyCode::Down => self.avatar_list.move_down(directory.len()),
            KeyCode::Enter => {
                if self.awaiting_reply || self.session.is_processing() {
                    self.set_status("Wait for the current reply before switching avatars", true);
                    return;
                }
                if let Some(key) = self.avatar_list.confirm(directory) {
                    tracing::info!("Selected avatar {}", key);
                    let name = self.avatar_name().to_string();
                    self.set_status(format!("Now chatting with {}", name), false);
                    self.active_pane = Pane::Compose;
                }
            }
            code => self.handle_common_key(code),
        }
    }

    fn submit(&mut self) -> Option<WorkerCommand> {
        let Some(avatar) = self
            .directory
            .as_ref()
            .and_then(|d| d.selected())
            .map(str::to_string)
        else {
            self.set_status("Select an avatar first", true);
            return None;
        };
        let text = self.compose.take()?;

        self.awaiting_reply = true;
        self.messages.follow();
        self.status_message = None;
        Some(WorkerCommand::Submit { text, avatar })
    }

    pub fn handle_worker_event(&mut self, event: WorkerEvent) {
        match event {
            WorkerEvent::DirectoryReady(directory) => {
                self.avatar_list.sync(&directory);
                if directory.is_connected() {
                    self.set_status(format!("Connected to {}", self.backend_url), false);
                } else {
                    self.set_status(
                        format!("Backend unavailable at {}", self.backend_url),
                        true,
                    );
                }
                self.directory = Some(directory);
            }
            WorkerEvent::Submitted(result) => {
                self.awaiting_reply = false;
                self.messages.follow();
                match result {
                    Submission::Answered { message } => {
                        tracing::debug!("Reply {} ready", message);
                        self.set_status("Reply ready", false)
                    }
                    Submission::Failed { stage } => {
                        self.set_status(format!("Reply failed ({} stage)", stage), true)
                    }
                    Submission::Ignored(reason) => {
                        self.set_status(format!("Not sent: {}", reason), true)
                    }
                }
            }
        }
    }

    /// Render the UI
    pub fn render(&self, frame: &mut ratatui::Frame) {
        ui::render(frame, self);
    }
}

/// Run the TUI application with panic-safe terminal restore
pub async fn run(config: &Config, log_buffer: LogBuffer) -> Result<()> {
    let backend_url = config.backend_url()?;
    let client = BackendClient::new(backend_url.clone())?;
    let session = Session::new();
    let orchestrator = Arc::new(ChatOrchestrator::new(
        client,
        session.clone(),
        config.static_base()?,
    ));
    let worker = Worker::start(orchestrator, config.default_avatar.clone());
    let app = App::new(
        session,
        log_buffer,
        backend_url.to_string(),
        config.mode.is_development(),
    );

    let mut terminal = ratatui::init();
    let result = AssertUnwindSafe(run_app(&mut terminal, app, worker))
        .catch_unwind()
        .await;
    ratatui::restore();

    match result {
        Ok(r) => r,
        Err(e) => std::panic::resume_unwind(e),
    }
}

async fn run_app(terminal: &mut DefaultTerminal, mut app: App, mut worker: Worker) -> Result<()> {
    let mut events = EventStream::new();
    let mut ticker = tokio::time::interval(Duration::from_millis(FRAME_DURATION_MS));

    while !app.should_exit {
        app.tick();
        terminal.draw(|frame| app.render(frame))?;

        tokio::select! {
            maybe_event = events.next() => match maybe_event {
                Some(Ok(Event::Key(key))) => {
                    if let Some(cmd) = app.handle_key(key) {
                        worker.send(cmd);
                    }
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(e.into()),
                None => break,
            },
            Some(event) = worker.recv() => app.handle_worker_event(event),
            _ = ticker.tick() => {}
        }
    }

    Ok(())
}
