//! In-memory chat session: ordered message log plus the processing flag.
//!
//! Readers (the UI) take snapshots at any time. The only way to change the
//! session is through a [`Turn`], which owns the processing flag for the
//! lifetime of one pipeline run.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use url::Url;

use super::ERROR_REPLY;
use crate::models::{Message, MessageId, Sender};

#[derive(Debug, Default)]
struct SessionState {
    messages: Vec<Message>,
    processing: bool,
    last_id: u64,
}

impl SessionState {
    fn push(&mut self, sender: Sender, text: String, media_ref: Option<Url>) -> MessageId {
        self.last_id += 1;
        let id = MessageId::new(self.last_id);
        tracing::debug!("Appended {} message {}", sender.as_str(), id);
        self.messages.push(Message::new(id, sender, text, media_ref));
        id
    }
}

/// Shared handle to the chat history. Clones refer to the same session.
#[derive(Debug, Clone, Default)]
pub struct Session {
    inner: Arc<RwLock<SessionState>>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    // A panic elsewhere must not take the chat history down with it,
    // so poisoned locks are recovered.
    fn read(&self) -> RwLockReadGuard<'_, SessionState> {
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, SessionState> {
        self.inner.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Copy of all messages, oldest first.
    pub fn messages(&self) -> Vec<Message> {
        self.read().messages.clone()
    }

    #[cfg(test)]
    pub fn last_message(&self) -> Option<Message> {
        self.read().messages.last().cloned()
    }

    pub fn len(&self) -> usize {
        self.read().messages.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.read().messages.is_empty()
    }

    pub fn is_processing(&self) -> bool {
        self.read().processing
    }

    /// Start a turn: set the processing flag and append the user message in
    /// one step. Returns `None` if a turn is already in flight.
    pub(crate) fn begin_turn(&self, text: &str) -> Option<Turn> {
        let mut state = self.write();
        if state.processing {
            return None;
        }
        state.processing = true;
        let user_message = state.push(Sender::User, text.to_string(), None);

        Some(Turn {
            session: self.clone(),
            user_message,
            finished: false,
        })
    }
}

/// Ownership of the processing flag for one pipeline run.
///
/// Finishing appends the avatar reply and clears the flag in one step.
/// Dropping an unfinished turn records the error reply, so every user
/// message gets exactly one answer.
#[derive(Debug)]
pub(crate) struct Turn {
    session: Session,
    user_message: MessageId,
    finished: bool,
}

impl Turn {
    pub fn user_message(&self) -> MessageId {
        self.user_message
    }

    pub fn complete(mut self, text: String, media_ref: Option<Url>) -> MessageId {
        self.finish(text, media_ref)
    }

    pub fn fail(mut self) -> MessageId {
        self.finish(ERROR_REPLY.to_string(), None)
    }

    fn finish(&mut self, text: String, media_ref: Option<Url>) -> MessageId {
        let mut state = self.session.write();
        let id = state.push(Sender::Avatar, text, media_ref);
        state.processing = false;
        self.finished = true;
        id
    }
}

impl Drop for Turn {
    fn drop(&mut self) {
        if !self.finished {
            tracing::warn!(
                "Turn for message {} ended without a reply; recording error reply",
                self.user_message
            );
            self.finish(ERROR_REPLY.to_string(), None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_begin_turn_gates_second_turn() {
        let session = Session::new();
        let turn = session.begin_turn("hello").unwrap();
        assert!(session.is_processing());
        assert_eq!(session.len(), 1);

        assert!(session.begin_turn("again").is_none());
        assert_eq!(session.len(), 1);

        turn.complete("hi there".to_string(), None);
        assert!(!session.is_processing());
        assert_eq!(session.len(), 2);
        assert!(session.begin_turn("third").is_some());
    }

    #[test]
    fn test_ids_strictly_increase() {
        let session = Session::new();
        for i in 0..5 {
            session
                .begin_turn(&format!("q{}", i))
                .unwrap()
                .complete(format!("a{}", i), None);
        }

        let ids: Vec<u64> = session.messages().iter().map(|m| m.id().get()).collect();
        assert_eq!(ids.len(), 10);
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_fail_records_error_reply() {
        let session = Session::new();
        session.begin_turn("hello").unwrap().fail();

        let last = session.last_message().unwrap();
        assert_eq!(last.sender(), Sender::Avatar);
        assert_eq!(last.text(), ERROR_REPLY);
        assert!(last.media_ref().is_none());
        assert!(!session.is_processing());
    }

    #[test]
    fn test_dropped_turn_clears_flag() {
        let session = Session::new();
        {
            let _turn = session.begin_turn("hello").unwrap();
            assert!(session.is_processing());
        }
        assert!(!session.is_processing());
        assert_eq!(session.len(), 2);
        assert_eq!(session.last_message().unwrap().text(), ERROR_REPLY);
    }

    #[test]
    fn test_concurrent_begin_only_one_wins() {
        let session = Session::new();
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let session = session.clone();
                std::thread::spawn(move || {
                    // Leak the winning turn so the flag stays set.
                    session.begin_turn(&format!("q{}", i)).map(std::mem::forget).is_some()
                })
            })
            .collect();

        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();
        assert_eq!(winners, 1);
        assert_eq!(session.len(), 1);
        assert!(session.is_processing());
    }
}
