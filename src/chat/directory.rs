//! Avatar directory: the selectable avatar list, loaded once at startup.

use crate::api::AvatarBackend;
use crate::models::{fallback_avatars, AvatarIdentity};

/// Where the avatar list came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AvatarSource {
    Backend,
    Fallback,
}

impl AvatarSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            AvatarSource::Backend => "backend",
            AvatarSource::Fallback => "built-in",
        }
    }
}

/// Avatar list plus the current selection.
///
/// The list never changes after [`AvatarDirectory::initialize`]; only the
/// selection does, and only to a key that is in the list.
#[derive(Debug, Clone)]
pub struct AvatarDirectory {
    avatars: Vec<AvatarIdentity>,
    source: AvatarSource,
    connected: bool,
    selected: Option<String>,
}

impl AvatarDirectory {
    /// Health check, then list; any problem falls back to the built-in avatars.
    ///
    /// `preferred` is kept as the selection if it names a listed avatar,
    /// otherwise the first avatar is selected.
    pub async fn initialize<B: AvatarBackend + ?Sized>(backend: &B, preferred: Option<&str>) -> Self {
        let connected = backend.health_check().await;

        let (avatars, source) = if !connected {
            tracing::warn!("Backend not reachable, using built-in avatars");
            (fallback_avatars(), AvatarSource::Fallback)
        } else {
            match backend.list_avatars().await {
                Ok(list) if !list.is_empty() => (list, AvatarSource::Backend),
                Ok(_) => {
                    tracing::warn!("Backend listed no avatars, using built-in avatars");
                    (fallback_avatars(), AvatarSource::Fallback)
                }
                Err(e) => {
                    tracing::warn!("Failed to load avatars: {}", e);
                    (fallback_avatars(), AvatarSource::Fallback)
                }
            }
        };

        let mut directory = Self {
            avatars,
            source,
            connected,
            selected: None,
        };

        if let Some(key) = preferred {
            if !directory.select(key) {
                tracing::debug!("Preferred avatar {:?} not available", key);
            }
        }
        if directory.selected.is_none() {
            directory.selected = directory.avatars.first().map(|a| a.file_key.clone());
        }

        tracing::info!(
            "Loaded {} avatars ({}), selected {:?}",
            directory.avatars.len(),
            directory.source.as_str(),
            directory.selected
        );
        directory
    }

    pub fn avatars(&self) -> &[AvatarIdentity] {
        &self.avatars
    }

    pub fn len(&self) -> usize {
        self.avatars.len()
    }

    pub fn source(&self) -> AvatarSource {
        self.source
    }

    /// Whether the health check succeeded at startup.
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// File key of the selected avatar.
    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn selected_avatar(&self) -> Option<&AvatarIdentity> {
        let key = self.selected.as_deref()?;
        self.avatars.iter().find(|a| a.file_key == key)
    }

    pub fn position(&self, file_key: &str) -> Option<usize> {
        self.avatars.iter().position(|a| a.file_key == file_key)
    }

    /// Select by file key. Unknown keys leave the selection unchanged.
    pub fn select(&mut self, file_key: &str) -> bool {
        if self.position(file_key).is_none() {
            return false;
        }
        self.selected = Some(file_key.to_string());
        true
    }
}
