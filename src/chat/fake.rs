//! Scriptable in-memory backend for chat tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use super::orchestrator::Stage;
use super::session::Session;
use crate::api::{Answer, AudioClip, AvatarBackend, BackendError, VideoClip};
use crate::models::AvatarIdentity;

pub struct FakeBackend {
    healthy: bool,
    avatars: Result<Vec<AvatarIdentity>, ()>,
    fail_at: Option<Stage>,
    video_file: Option<String>,
    observer: Option<Session>,
    gate: Option<(Arc<Notify>, Arc<Notify>)>,
    calls: Mutex<Vec<Stage>>,
    observed: Mutex<Vec<(bool, usize)>>,
    list_calls: AtomicUsize,
}

impl FakeBackend {
    pub fn healthy() -> Self {
        Self {
            healthy: true,
            avatars: Ok(vec![AvatarIdentity::new("Art - Bob Ross", "Art")]),
            fail_at: None,
            video_file: None,
            observer: None,
            gate: None,
            calls: Mutex::new(Vec::new()),
            observed: Mutex::new(Vec::new()),
            list_calls: AtomicUsize::new(0),
        }
    }

    pub fn unreachable() -> Self {
        Self {
            healthy: false,
            ..Self::healthy()
        }
    }

    pub fn with_avatars(mut self, avatars: Vec<AvatarIdentity>) -> Self {
        self.avatars = Ok(avatars);
        self
    }

    pub fn failing_list(mut self) -> Self {
        self.avatars = Err(());
        self
    }

    pub fn failing_at(mut self, stage: Stage) -> Self {
        self.fail_at = Some(stage);
        self
    }

    pub fn with_video_file(mut self, file: &str) -> Self {
        self.video_file = Some(file.to_string());
        self
    }

    /// Record `(is_processing, len)` of `session` at every stage call.
    pub fn observing(mut self, session: Session) -> Self {
        self.observer = Some(session);
        self
    }

    /// Make `ask` signal entry and then wait for a release.
    pub fn gated(mut self) -> Self {
        self.gate = Some((Arc::new(Notify::new()), Arc::new(Notify::new())));
        self
    }

    /// `(entered, release)` notifiers of a gated backend.
    pub fn gate_handles(&self) -> (Arc<Notify>, Arc<Notify>) {
        let (entered, release) = self.gate.as_ref().expect("backend is not gated");
        (Arc::clone(entered), Arc::clone(release))
    }

    pub fn calls(&self) -> Vec<Stage> {
        self.calls.lock().unwrap().clone()
    }

    pub fn observed(&self) -> Vec<(bool, usize)> {
        self.observed.lock().unwrap().clone()
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    fn enter(&self, stage: Stage) -> Result<(), BackendError> {
        self.calls.lock().unwrap().push(stage);
        if let Some(session) = &self.observer {
            self.observed
                .lock()
                .unwrap()
                .push((session.is_processing(), session.len()));
        }
        if self.fail_at == Some(stage) {
            return Err(BackendError::RequestFailed {
                url: format!("fake://{}", stage),
                status: 500,
                body: "injected failure".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl AvatarBackend for FakeBackend {
    async fn ask(&self, question: &str) -> Result<Answer, BackendError> {
        if let Some((entered, release)) = &self.gate {
            entered.notify_one();
            release.notified().await;
        }
        self.enter(Stage::Ask)?;
        Ok(Answer {
            text: format!("Answer to: {}", question),
        })
    }

    async fn synthesize(&self, _text: &str, avatar: &str) -> Result<AudioClip, BackendError> {
        self.enter(Stage::Synthesize)?;
        Ok(AudioClip {
            file: format!("{}_speech.wav", avatar),
        })
    }

    async fn animate(&self, avatar: &str, _audio_file: &str) -> Result<VideoClip, BackendError> {
        self.enter(Stage::Animate)?;
        let file = self
            .video_file
            .clone()
            .unwrap_or_else(|| format!("{}_video.mp4", avatar));
        Ok(VideoClip { file })
    }

    async fn list_avatars(&self) -> Result<Vec<AvatarIdentity>, BackendError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.avatars.clone().map_err(|()| BackendError::RequestFailed {
            url: "fake://avatars".to_string(),
            status: 503,
            body: String::new(),
        })
    }

    async fn health_check(&self) -> bool {
        self.healthy
    }
}
