//! Configuration storage

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use url::Url;

/// Environment variable that overrides the configured mode.
pub const MODE_ENV: &str = "AVATAR_CHAT_MODE";

const DEFAULT_BACKEND_URL: &str = "http://localhost:5000";
const DEFAULT_STATIC_PATH: &str = "static";

/// Development or production behavior (log verbosity, debug pane at startup).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Development,
    #[default]
    Production,
}

impl Mode {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Some(Mode::Development),
            "production" | "prod" => Some(Mode::Production),
            _ => None,
        }
    }

    pub fn is_development(&self) -> bool {
        *self == Mode::Development
    }
}

/// How to launch the backend service as a child process.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendProcessConfig {
    /// Interpreter or executable
    pub program: String,
    pub args: Vec<String>,
    /// Working directory for the child (defaults to the current one)
    pub working_dir: Option<PathBuf>,
    /// How long to wait after spawning before talking to the backend
    pub startup_delay_ms: u64,
}

impl Default for BackendProcessConfig {
    fn default() -> Self {
        Self {
            program: "python".to_string(),
            args: vec!["avatar_api.py".to_string()],
            working_dir: None,
            startup_delay_ms: 2000,
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the avatar backend
    pub backend_url: String,
    /// Path under the backend URL where generated media is served
    pub static_path: String,
    pub mode: Mode,
    /// Avatar key to select at startup, if the backend offers it
    pub default_avatar: Option<String>,
    /// Start the backend process before connecting
    pub spawn_backend: bool,
    pub backend_process: Option<BackendProcessConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            static_path: DEFAULT_STATIC_PATH.to_string(),
            mode: Mode::default(),
            default_avatar: None,
            spawn_backend: false,
            backend_process: None,
        }
    }
}

impl Config {
    /// Get config directory path
    fn config_dir() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("com", "avatar-chat", "avatar-chat")
            .context("Could not determine config directory")?;
        Ok(proj_dirs.config_dir().to_path_buf())
    }

    /// Get config file path
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load configuration from disk, falling back to defaults when the file
    /// cannot be read or parsed. The load error is handed back so it can be
    /// logged once logging is set up.
    pub fn load_or_default() -> (Self, Option<anyhow::Error>) {
        Self::or_default(Self::config_path().and_then(|path| Self::load_from(&path)))
    }

    /// Load `path` (defaults if it does not exist), then apply the mode
    /// environment override.
    fn load_from(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            Self::from_toml(&content)
                .with_context(|| format!("Bad config file {}", path.display()))?
        } else {
            Self::default()
        };
        config.apply_env();
        Ok(config)
    }

    fn or_default(loaded: Result<Self>) -> (Self, Option<anyhow::Error>) {
        match loaded {
            Ok(config) => (config, None),
            Err(e) => {
                let mut config = Self::default();
                config.apply_env();
                (config, Some(e))
            }
        }
    }

    fn apply_env(&mut self) {
        if let Ok(value) = std::env::var(MODE_ENV) {
            match Mode::parse(&value) {
                Some(mode) => self.mode = mode,
                None => tracing::warn!("Ignoring unknown {}={:?}", MODE_ENV, value),
            }
        }
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse config file")
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        let dir = Self::config_dir()?;
        fs::create_dir_all(&dir).context("Failed to create config directory")?;

        let path = Self::config_path()?;
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(&path, content).context("Failed to write config file")?;

        Ok(())
    }

    /// Backend base URL, always ending in `/`.
    pub fn backend_url(&self) -> Result<Url> {
        let url = Url::parse(&self.backend_url)
            .with_context(|| format!("Invalid backend_url {:?}", self.backend_url))?;
        Ok(crate::api::with_trailing_slash(url))
    }

    /// Base URL generated media files are served under.
    /// An empty `static_path` means media is served from the backend root.
    pub fn static_base(&self) -> Result<Url> {
        let backend = self.backend_url()?;
        let path = self.static_path.trim_matches('/');
        if path.is_empty() {
            return Ok(backend);
        }
        backend
            .join(&format!("{}/", path))
            .with_context(|| format!("Invalid static_path {:?}", self.static_path))
    }

    /// Backend process settings when spawning is enabled.
    pub fn backend_process(&self) -> Option<BackendProcessConfig> {
        if !self.spawn_backend {
            return None;
        }
        Some(self.backend_process.clone().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.backend_url().unwrap().as_str(), "http://localhost:5000/");
        assert_eq!(
            config.static_base().unwrap().as_str(),
            "http://localhost:5000/static/"
        );
        assert_eq!(config.mode, Mode::Production);
        assert!(config.backend_process().is_none());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = tokio_test::assert_ok!(Config::from_toml(
            r#"
            mode = "development"
            default_avatar = "Art"
            "#
        ));
        assert!(config.mode.is_development());
        assert_eq!(config.default_avatar.as_deref(), Some("Art"));
        assert_eq!(config.backend_url, DEFAULT_BACKEND_URL);
    }

    #[test]
    fn test_static_path_under_prefixed_backend() {
        let config = Config::from_toml(
            r#"
            backend_url = "http://127.0.0.1:8080/api"
            static_path = "/media/"
            "#,
        )
        .unwrap();
        assert_eq!(
            config.static_base().unwrap().as_str(),
            "http://127.0.0.1:8080/api/media/"
        );
    }

    #[test]
    fn test_empty_static_path_is_backend_root() {
        let config = Config::from_toml(
            r#"
            backend_url = "http://127.0.0.1:8080/api"
            static_path = ""
            "#,
        )
        .unwrap();
        assert_eq!(config.static_base().unwrap().as_str(), "http://127.0.0.1:8080/api/");

        let config = Config {
            static_path: "/".to_string(),
            ..Config::default()
        };
        assert_eq!(config.static_base().unwrap().as_str(), "http://localhost:5000/");
    }

    #[test]
    fn test_malformed_file_falls_back_to_defaults() {
        let path = std::env::temp_dir().join(format!("avatar-chat-bad-{}.toml", std::process::id()));
        fs::write(&path, "backend_url = [not toml").unwrap();

        let loaded = Config::load_from(&path);
        fs::remove_file(&path).unwrap();
        assert!(loaded.is_err());

        let (config, error) = Config::or_default(loaded);
        assert!(error.is_some());
        assert_eq!(config.backend_url, DEFAULT_BACKEND_URL);
        assert_eq!(config.static_path, DEFAULT_STATIC_PATH);
    }

    #[test]
    fn test_missing_file_is_defaults() {
        let path = std::env::temp_dir().join("avatar-chat-does-not-exist.toml");
        let (config, error) = Config::or_default(Config::load_from(&path));
        assert!(error.is_none());
        assert_eq!(config.backend_url, DEFAULT_BACKEND_URL);
    }

    #[test]
    fn test_backend_process_section() {
        let config = Config::from_toml(
            r#"
            spawn_backend = true

            [backend_process]
            program = "python3"
            startup_delay_ms = 500
            "#,
        )
        .unwrap();
        let process = config.backend_process().unwrap();
        assert_eq!(process.program, "python3");
        assert_eq!(process.args, vec!["avatar_api.py"]);
        assert_eq!(process.startup_delay_ms, 500);

        // Spawning enabled without a section uses the defaults.
        let config = Config::from_toml("spawn_backend = true").unwrap();
        assert_eq!(config.backend_process().unwrap().program, "python");
    }

    #[test]
    fn test_invalid_values() {
        assert!(Config::from_toml(r#"mode = "staging""#).is_err());

        let config = Config::from_toml(r#"backend_url = "not a url""#).unwrap();
        assert!(config.backend_url().is_err());
    }

    #[test]
    fn test_mode_parse() {
        assert_eq!(Mode::parse("Development"), Some(Mode::Development));
        assert_eq!(Mode::parse(" prod "), Some(Mode::Production));
        assert_eq!(Mode::parse("test"), None);
    }
}
