//! Chat message models

use std::fmt;

use chrono::{DateTime, Utc};
use url::Url;

/// Per-session message identifier. Strictly increasing in append order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MessageId(u64);

impl MessageId {
    pub(crate) fn new(raw: u64) -> Self {
        Self(raw)
    }

    #[cfg(test)]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Who authored a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    User,
    Avatar,
}

impl Sender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sender::User => "user",
            Sender::Avatar => "avatar",
        }
    }
}

/// One turn in the conversation. Immutable once created.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    id: MessageId,
    text: String,
    sender: Sender,
    timestamp: DateTime<Utc>,
    media_ref: Option<Url>,
}

impl Message {
    pub(crate) fn new(id: MessageId, sender: Sender, text: String, media_ref: Option<Url>) -> Self {
        Self {
            id,
            text,
            sender,
            timestamp: Utc::now(),
            media_ref,
        }
    }

    #[cfg(test)]
    pub fn id(&self) -> MessageId {
        self.id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn sender(&self) -> Sender {
        self.sender
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Playable video for completed avatar turns.
    pub fn media_ref(&self) -> Option<&Url> {
        self.media_ref.as_ref()
    }
}
