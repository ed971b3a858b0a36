//! Async worker: runs backend work off the UI loop.
//!
//! The UI sends `WorkerCommand` values over an mpsc channel; a background
//! tokio task executes them and sends `WorkerEvent` values back. The chat
//! session itself is shared, so the UI sees pipeline progress directly.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::api::AvatarBackend;
use crate::chat::{AvatarDirectory, ChatOrchestrator, Submission};

/// Commands sent from the UI to the worker.
pub enum WorkerCommand {
    Submit { text: String, avatar: String },
}

/// Events sent from the worker to the UI.
pub enum WorkerEvent {
    /// Startup initialization finished (always succeeds, possibly with fallbacks).
    DirectoryReady(AvatarDirectory),
    Submitted(Submission),
}

/// UI-side handle to the worker task.
pub struct Worker {
    cmd_tx: mpsc::UnboundedSender<WorkerCommand>,
    event_rx: mpsc::UnboundedReceiver<WorkerEvent>,
}

impl Worker {
    /// Spawn the worker. It initializes the avatar directory first, then
    /// processes commands until the handle is dropped.
    pub fn start<B>(orchestrator: Arc<ChatOrchestrator<B>>, preferred_avatar: Option<String>) -> Self
    where
        B: AvatarBackend + 'static,
    {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        tokio::spawn(worker_loop(orchestrator, preferred_avatar, cmd_rx, event_tx));

        Self { cmd_tx, event_rx }
    }

    pub fn send(&self, cmd: WorkerCommand) {
        if self.cmd_tx.send(cmd).is_err() {
            tracing::error!("Worker channel closed -- command dropped");
        }
    }

    /// Next event; `None` once the worker has exited. Use inside `tokio::select!`.
    pub async fn recv(&mut self) -> Option<WorkerEvent> {
        self.event_rx.recv().await
    }
}

async fn worker_loop<B: AvatarBackend + 'static>(
    orchestrator: Arc<ChatOrchestrator<B>>,
    preferred_avatar: Option<String>,
    mut cmd_rx: mpsc::UnboundedReceiver<WorkerCommand>,
    event_tx: mpsc::UnboundedSender<WorkerEvent>,
) {
    let directory =
        AvatarDirectory::initialize(orchestrator.backend(), preferred_avatar.as_deref()).await;
    let _ = event_tx.send(WorkerEvent::DirectoryReady(directory));

    while let Some(cmd) = cmd_rx.recv().await {
        let orchestrator = Arc::clone(&orchestrator);
        let event_tx = event_tx.clone();

        // Each submission runs in its own task; the session's processing
        // flag turns overlapping submissions into no-ops.
        tokio::spawn(async move {
            match cmd {
                WorkerCommand::Submit { text, avatar } => {
                    let result = orchestrator.submit(&text, Some(&avatar)).await;
                    let _ = event_tx.send(WorkerEvent::Submitted(result));
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::fake::FakeBackend;
    use crate::chat::Session;
    use url::Url;

    #[tokio::test]
    async fn test_directory_then_submission() {
        let session = Session::new();
        let orchestrator = Arc::new(ChatOrchestrator::new(
            FakeBackend::healthy(),
            session.clone(),
            Url::parse("http://localhost:5000/static/").unwrap(),
        ));
        let mut worker = Worker::start(orchestrator, None);

        let avatar = match worker.recv().await {
            Some(WorkerEvent::DirectoryReady(directory)) => {
                directory.selected().unwrap().to_string()
            }
            _ => panic!("expected DirectoryReady first"),
        };
        assert_eq!(avatar, "Art");

        worker.send(WorkerCommand::Submit {
            text: "hello".to_string(),
            avatar,
        });
        match worker.recv().await {
            Some(WorkerEvent::Submitted(Submission::Answered { .. })) => {}
            _ => panic!("expected an answered submission"),
        }
        assert_eq!(session.len(), 2);
    }
}
