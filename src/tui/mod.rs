//! Terminal user interface using Ratatui.

mod app;
mod avatars;
mod compose;
mod debug_log;
mod help;
mod log_capture;
mod messages;
mod ui;
mod worker;

pub use app::run;
pub use log_capture::LogBuffer;
