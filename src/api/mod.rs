//! API client module for the avatar backend

pub mod client;
mod error;

use anyhow::{Context, Result};
use async_trait::async_trait;
use url::Url;

use crate::chat::{AvatarDirectory, ChatOrchestrator, Session, Submission};
use crate::config::Config;
use crate::models::{AvatarIdentity, Sender};

pub use client::BackendClient;
pub use error::BackendError;

/// Text answer produced by the `ask` stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer {
    pub text: String,
}

/// Speech produced by the `synthesize` stage (backend-side file reference).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioClip {
    pub file: String,
}

/// Video produced by the `animate` stage (backend-side file reference).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoClip {
    pub file: String,
}

/// Operations the chat core needs from the backend service.
#[async_trait]
pub trait AvatarBackend: Send + Sync {
    async fn ask(&self, question: &str) -> Result<Answer, BackendError>;

    async fn synthesize(&self, text: &str, avatar: &str) -> Result<AudioClip, BackendError>;

    async fn animate(&self, avatar: &str, audio_file: &str) -> Result<VideoClip, BackendError>;

    /// An empty list is not an error; callers fall back to built-in avatars.
    async fn list_avatars(&self) -> Result<Vec<AvatarIdentity>, BackendError>;

    /// Never fails; any problem reads as "not healthy".
    async fn health_check(&self) -> bool;
}

/// Append a backend file reference to the static-file base.
///
/// The reference is a path below the static directory, never a URL: each
/// `/`-separated segment is percent-encoded as-is, so `:`, `#`, `?` and
/// spaces stay part of the file name. Empty, `.` and `..` segments are
/// rejected, which keeps the result under `base`.
pub fn static_url(base: &Url, file: &str) -> Result<Url, BackendError> {
    let bad = |detail: String| BackendError::empty(base.as_str(), detail);

    // A leading `/` is rooted at the static directory, not the host.
    let file = file.trim_start_matches('/');
    if file.trim().is_empty() {
        return Err(bad("empty media file reference".to_string()));
    }
    let segments: Vec<&str> = file.split('/').collect();
    if segments.iter().any(|s| matches!(*s, "" | "." | "..")) {
        return Err(bad(format!("bad media reference {:?}", file)));
    }

    let mut url = with_trailing_slash(base.clone());
    url.path_segments_mut()
        .map_err(|_| bad("static base cannot carry a path".to_string()))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

pub(crate) fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

/// Print whether the backend answers.
pub async fn health(config: &Config) -> Result<()> {
    let client = BackendClient::new(config.backend_url()?).context("Invalid backend URL")?;

    if client.health_check().await {
        println!("Backend at {}: connected", client.base_url());
    } else {
        println!("Backend at {}: disconnected", client.base_url());
    }
    Ok(())
}

/// Print the avatar list the UI would offer.
pub async fn list_avatars(config: &Config) -> Result<()> {
    let client = BackendClient::new(config.backend_url()?).context("Invalid backend URL")?;
    let directory = AvatarDirectory::initialize(&client, config.default_avatar.as_deref()).await;

    println!("\nAvatars ({}):", directory.source().as_str());
    println!("{:-<60}", "");

    for avatar in directory.avatars() {
        let marker = if directory.selected() == Some(avatar.file_key.as_str()) {
            "*"
        } else {
            " "
        };
        println!("{} {}", marker, avatar.display_name);
        println!("    key: {}", avatar.file_key);
    }

    if !directory.is_connected() {
        println!("\n(backend unreachable, showing built-in avatars)");
    }
    Ok(())
}

/// Run one message through the ask/synthesize/animate pipeline and print the transcript.
pub async fn ask(config: &Config, message: &str, avatar: Option<&str>) -> Result<()> {
    let client = BackendClient::new(config.backend_url()?).context("Invalid backend URL")?;
    let preferred = avatar.or(config.default_avatar.as_deref());
    let directory = AvatarDirectory::initialize(&client, preferred).await;

    // An explicit --avatar is sent as-is even if the directory does not list it.
    let selected = avatar.or(directory.selected()).map(String::from);

    let session = Session::new();
    let orchestrator = ChatOrchestrator::new(client, session.clone(), config.static_base()?);

    match orchestrator.submit(message, selected.as_deref()).await {
        Submission::Ignored(reason) => {
            println!("Nothing sent: {}", reason);
            return Ok(());
        }
        Submission::Failed { stage } => {
            tracing::debug!("Pipeline stopped at {}", stage);
        }
        Submission::Answered { .. } => {}
    }

    for msg in session.messages() {
        let who = match msg.sender() {
            Sender::User => "you".to_string(),
            Sender::Avatar => selected.clone().unwrap_or_else(|| "avatar".to_string()),
        };
        println!("[{}]: {}", who, msg.text());
        if let Some(url) = msg.media_ref() {
            println!("  video: {}", url);
        }
    }
    Ok(())
}
