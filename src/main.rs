//! Avatar Chat - terminal client for a local avatar backend
//!
//! Sends questions to the backend, which answers, speaks and animates
//! them as a talking-head video.

mod api;
mod chat;
mod config;
mod models;
mod shell;
mod tui;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::shell::BackendProcess;

#[derive(Parser)]
#[command(name = "avatar-chat")]
#[command(about = "Chat with talking avatars served by a local backend", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Backend base URL (overrides the config file)
    #[arg(long, global = true)]
    backend_url: Option<String>,

    /// Start the backend process before connecting
    #[arg(long, global = true)]
    spawn_backend: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Launch the terminal user interface (default)
    Tui,

    /// Send one message and print the reply
    Ask {
        /// Message content
        message: String,

        /// Avatar key (defaults to the configured or first listed avatar)
        #[arg(short, long)]
        avatar: Option<String>,
    },

    /// List available avatars
    Avatars,

    /// Check whether the backend is reachable
    Health,

    /// Show the effective configuration
    Config {
        /// Write the effective configuration to the config file
        #[arg(long)]
        write: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let (mut config, load_error) = Config::load_or_default();
    if let Some(url) = cli.backend_url {
        config.backend_url = url;
    }
    if cli.spawn_backend {
        config.spawn_backend = true;
    }

    let command = cli.command.unwrap_or(Commands::Tui);
    let tui_mode = matches!(command, Commands::Tui);

    // Initialize logging. The TUI owns the terminal, so its logs go to the
    // in-app debug pane instead of stderr.
    let filter = if cli.verbose || config.mode.is_development() {
        "debug"
    } else {
        "info"
    };
    let log_buffer = tui::LogBuffer::new();
    let tui_layer = tui_mode.then(|| {
        tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(log_buffer.clone())
    });
    let stderr_layer =
        (!tui_mode).then(|| tracing_subscriber::fmt::layer().with_target(false));
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tui_layer)
        .with(stderr_layer)
        .init();

    if let Some(e) = load_error {
        tracing::warn!("Using default configuration: {:#}", e);
    }

    let backend = match config.backend_process() {
        Some(process_config) if !matches!(command, Commands::Config { .. }) => {
            match BackendProcess::start(&process_config).await {
                Ok(process) => {
                    tracing::info!("Backend process started (pid {:?})", process.id());
                    Some(process)
                }
                Err(e) => {
                    tracing::error!("Could not start backend: {:#}", e);
                    None
                }
            }
        }
        _ => None,
    };

    let result = run_command(command, &config, log_buffer).await;

    if let Some(process) = backend {
        if let Err(e) = process.shutdown().await {
            tracing::warn!("Backend shutdown failed: {:#}", e);
        }
    }

    result
}

async fn run_command(command: Commands, config: &Config, log_buffer: tui::LogBuffer) -> Result<()> {
    match command {
        Commands::Tui => {
            tui::run(config, log_buffer).await?;
        }
        Commands::Ask { message, avatar } => {
            tracing::info!("Sending message...");
            api::ask(config, &message, avatar.as_deref()).await?;
        }
        Commands::Avatars => {
            api::list_avatars(config).await?;
        }
        Commands::Health => {
            api::health(config).await?;
        }
        Commands::Config { write } => {
            let path = Config::config_path()?;
            println!("# {}", path.display());
            println!(
                "{}",
                toml::to_string_pretty(config).context("Failed to serialize config")?
            );
            if write {
                config.save()?;
                println!("Saved configuration to {}", path.display());
            }
        }
    }

    Ok(())
}
