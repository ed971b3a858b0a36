//! Log capture for TUI mode
//!
//! tracing-subscriber writes formatted lines into a shared ring buffer
//! instead of stderr, so log output never lands on the alternate screen.

use std::collections::VecDeque;
use std::io::Write;
use std::sync::{Arc, Mutex};

use tracing::Level;
use tracing_subscriber::fmt::MakeWriter;

/// Lines kept between two drains of the buffer.
const RING_CAPACITY: usize = 500;

/// One captured log line with the level parsed from the fmt output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    pub level: Option<Level>,
    pub text: String,
}

impl LogLine {
    fn parse(text: String) -> Self {
        // fmt output looks like "2024-01-15T10:30:00Z  INFO message".
        let level = text
            .split_whitespace()
            .take(3)
            .find_map(|word| match word {
                "ERROR" => Some(Level::ERROR),
                "WARN" => Some(Level::WARN),
                "INFO" => Some(Level::INFO),
                "DEBUG" => Some(Level::DEBUG),
                "TRACE" => Some(Level::TRACE),
                _ => None,
            });
        Self { level, text }
    }
}

/// Thread-safe ring buffer shared between the subscriber and the log pane.
#[derive(Clone, Default)]
pub struct LogBuffer {
    inner: Arc<Mutex<VecDeque<LogLine>>>,
}

impl LogBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a line, dropping the oldest one when full.
    pub fn push(&self, text: String) {
        // Logging must keep working after a panic on another thread.
        let mut guard = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if guard.len() >= RING_CAPACITY {
            guard.pop_front();
        }
        guard.push_back(LogLine::parse(text));
    }

    /// Take every buffered line, oldest first.
    pub fn drain(&self) -> Vec<LogLine> {
        let mut guard = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        guard.drain(..).collect()
    }
}

/// Per-event writer: collects bytes and pushes complete lines.
pub struct LineWriter {
    buffer: LogBuffer,
    pending: Vec<u8>,
}

impl LineWriter {
    fn push_pending(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let line = String::from_utf8_lossy(&self.pending).into_owned();
        self.buffer.push(line);
        self.pending.clear();
    }
}

impl Write for LineWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        for &b in buf {
            if b == b'\n' {
                self.push_pending();
            } else {
                self.pending.push(b);
            }
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.push_pending();
        Ok(())
    }
}

impl Drop for LineWriter {
    fn drop(&mut self) {
        self.push_pending();
    }
}

impl<'a> MakeWriter<'a> for LogBuffer {
    type Writer = LineWriter;

    fn make_writer(&'a self) -> Self::Writer {
        LineWriter {
            buffer: self.clone(),
            pending: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ring_drops_oldest() {
        let buf = LogBuffer::new();
        for i in 0..RING_CAPACITY + 20 {
            buf.push(format!("line {}", i));
        }

        let lines = buf.drain();
        assert_eq!(lines.len(), RING_CAPACITY);
        assert_eq!(lines[0].text, "line 20");
        assert!(buf.drain().is_empty());
    }

    #[test]
    fn test_writer_splits_lines() {
        let buf = LogBuffer::new();
        {
            let mut writer = buf.make_writer();
            write!(writer, "2024-01-15T10:30:00Z  WARN slow\n2024-01-15T10:30:01Z ").unwrap();
            assert_eq!(buf.drain().len(), 1);
            write!(writer, "ERROR boom").unwrap();
        }

        let lines = buf.drain();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].level, Some(Level::ERROR));
        assert_eq!(lines[0].text, "2024-01-15T10:30:01Z ERROR boom");
    }

    #[test]
    fn test_level_parse() {
        assert_eq!(LogLine::parse(" INFO ready".into()).level, Some(Level::INFO));
        assert_eq!(LogLine::parse("plain output".into()).level, None);
        // Only the prefix counts, not words inside the message.
        assert_eq!(
            LogLine::parse("2024-01-15T10:30:00Z DEBUG saw ERROR in payload".into()).level,
            Some(Level::DEBUG)
        );
    }
}
