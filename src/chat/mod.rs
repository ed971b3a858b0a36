//! Chat core: session state, the reply pipeline, and the avatar directory.

mod directory;
mod orchestrator;
mod session;

#[cfg(test)]
pub(crate) mod fake;

pub use directory::{AvatarDirectory, AvatarSource};
pub use orchestrator::{ChatOrchestrator, Submission};

#[cfg(test)]
pub use orchestrator::IgnoreReason;
pub use session::Session;

/// Reply shown for any pipeline failure. Which stage failed is only logged.
pub const ERROR_REPLY: &str = "Sorry, I encountered an error processing your message.";
