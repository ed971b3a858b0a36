//! Backend process supervision
//!
//! Starts the backend service as a child process, forwards its output to
//! tracing, and terminates it when the client shuts down.

use std::process::Stdio;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};

use crate::config::BackendProcessConfig;

/// A running backend child process. Killed on drop if not shut down.
pub struct BackendProcess {
    child: Child,
    program: String,
}

impl BackendProcess {
    /// Spawn the backend and wait out its startup delay.
    pub async fn start(config: &BackendProcessConfig) -> Result<Self> {
        let process = Self::spawn(config)?;

        if config.startup_delay_ms > 0 {
            tracing::debug!("Waiting {}ms for backend startup", config.startup_delay_ms);
            tokio::time::sleep(Duration::from_millis(config.startup_delay_ms)).await;
        }

        Ok(process)
    }

    fn spawn(config: &BackendProcessConfig) -> Result<Self> {
        let mut cmd = Command::new(&config.program);
        cmd.args(&config.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(ref dir) = config.working_dir {
            cmd.current_dir(dir);
        }

        tracing::info!("Starting backend: {} {}", config.program, config.args.join(" "));
        let mut child = cmd
            .spawn()
            .with_context(|| format!("Failed to start backend process {:?}", config.program))?;

        if let Some(stdout) = child.stdout.take() {
            tokio::spawn(forward_output(stdout, false));
        }
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(forward_output(stderr, true));
        }

        Ok(Self {
            child,
            program: config.program.clone(),
        })
    }

    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }

    /// Kill the child (if still running) and reap it.
    pub async fn shutdown(mut self) -> Result<()> {
        match self.child.try_wait().context("Failed to poll backend process")? {
            Some(status) => {
                tracing::info!("Backend {} already exited with {}", self.program, status);
            }
            None => {
                self.child
                    .start_kill()
                    .context("Failed to signal backend process")?;
                let status = self
                    .child
                    .wait()
                    .await
                    .context("Failed to wait for backend process")?;
                tracing::info!("Backend {} exited with {}", self.program, status);
            }
        }
        Ok(())
    }
}

/// Forward each line the backend prints into the log.
async fn forward_output<R: AsyncRead + Unpin>(stream: R, is_stderr: bool) {
    let mut lines = BufReader::new(stream).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) if is_stderr => tracing::warn!(target: "backend", "{}", line),
            Ok(Some(line)) => tracing::info!(target: "backend", "{}", line),
            Ok(None) => break,
            Err(e) => {
                tracing::debug!("Backend output closed: {}", e);
                break;
            }
        }
    }
}
