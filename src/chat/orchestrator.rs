//! Chat orchestration: one user message in, one avatar reply out.
//!
//! The pipeline is strictly sequential (question -> speech -> video) since
//! each stage consumes the previous stage's output.

use std::fmt;

use thiserror::Error;
use url::Url;

use super::session::Session;
use crate::api::{self, Answer, AvatarBackend, BackendError};
use crate::models::MessageId;

/// One step of the reply pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Ask,
    Synthesize,
    Animate,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Ask => "ask",
            Stage::Synthesize => "synthesize",
            Stage::Animate => "animate",
        }
    }

    fn failed(self) -> impl FnOnce(BackendError) -> StageFailure {
        move |source| StageFailure {
            stage: self,
            source,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A backend error tagged with the stage it happened in.
#[derive(Debug, Error)]
#[error("{stage} stage failed: {source}")]
pub struct StageFailure {
    pub stage: Stage,
    #[source]
    pub source: BackendError,
}

/// Why a submission was dropped without touching the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    EmptyText,
    NoAvatarSelected,
    Busy,
}

impl fmt::Display for IgnoreReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            IgnoreReason::EmptyText => "message is empty",
            IgnoreReason::NoAvatarSelected => "no avatar selected",
            IgnoreReason::Busy => "a reply is already in progress",
        };
        f.write_str(s)
    }
}

/// Result of [`ChatOrchestrator::submit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    /// Preconditions not met; nothing was appended.
    Ignored(IgnoreReason),
    /// All stages succeeded; `message` is the avatar reply.
    Answered { message: MessageId },
    /// A stage failed; the error reply was appended.
    Failed { stage: Stage },
}

/// Drives the ask/synthesize/animate pipeline against a backend and
/// records both sides of the conversation in the session.
pub struct ChatOrchestrator<B> {
    backend: B,
    session: Session,
    media_base: Url,
}

impl<B: AvatarBackend> ChatOrchestrator<B> {
    /// `media_base` is the static-file prefix generated videos are served under.
    pub fn new(backend: B, session: Session, media_base: Url) -> Self {
        Self {
            backend,
            session,
            media_base: api::with_trailing_slash(media_base),
        }
    }

    #[cfg(test)]
    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Submit one user message for `avatar`.
    ///
    /// Returns once the avatar reply (or the error reply) is in the session.
    pub async fn submit(&self, text: &str, avatar: Option<&str>) -> Submission {
        if text.trim().is_empty() {
            return Submission::Ignored(IgnoreReason::EmptyText);
        }
        let Some(avatar) = avatar.filter(|a| !a.trim().is_empty()) else {
            return Submission::Ignored(IgnoreReason::NoAvatarSelected);
        };
        let Some(turn) = self.session.begin_turn(text) else {
            tracing::debug!("Submission ignored: reply already in progress");
            return Submission::Ignored(IgnoreReason::Busy);
        };

        tracing::info!("Processing message {} for avatar {}", turn.user_message(), avatar);

        match self.run_pipeline(text, avatar).await {
            Ok((answer, media)) => {
                tracing::info!("Reply ready: {}", media);
                let message = turn.complete(answer.text, Some(media));
                Submission::Answered { message }
            }
            Err(failure) => {
                tracing::warn!(
                    stage = failure.stage.as_str(),
                    kind = failure.source.kind(),
                    "Error processing message: {}",
                    failure
                );
                let stage = failure.stage;
                turn.fail();
                Submission::Failed { stage }
            }
        }
    }

    async fn run_pipeline(&self, question: &str, avatar: &str) -> Result<(Answer, Url), StageFailure> {
        let answer = self
            .backend
            .ask(question)
            .await
            .map_err(Stage::Ask.failed())?;
        tracing::debug!("ask: {} chars", answer.text.len());

        let audio = self
            .backend
            .synthesize(&answer.text, avatar)
            .await
            .map_err(Stage::Synthesize.failed())?;
        tracing::debug!("synthesize: {}", audio.file);

        let video = self
            .backend
            .animate(avatar, &audio.file)
            .await
            .map_err(Stage::Animate.failed())?;
        let media = api::static_url(&self.media_base, &video.file).map_err(Stage::Animate.failed())?;

        Ok((answer, media))
    }
}
