//! Avatar identity models

use serde::{Deserialize, Serialize};

/// A selectable persona served by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvatarIdentity {
    /// Human-readable name, e.g. "Art - Bob Ross".
    #[serde(rename = "name")]
    pub display_name: String,
    /// Stable key the backend expects in synthesize/animate requests.
    #[serde(rename = "filename")]
    pub file_key: String,
}

impl AvatarIdentity {
    pub fn new(display_name: impl Into<String>, file_key: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            file_key: file_key.into(),
        }
    }
}

/// Built-in avatars used when the backend is unreachable or lists none.
pub fn fallback_avatars() -> Vec<AvatarIdentity> {
    vec![
        AvatarIdentity::new("Philosophy - Einstein", "Philosophy"),
        AvatarIdentity::new("Art - Bob Ross", "Art"),
        AvatarIdentity::new("Travel - Carmen Sandiego", "Travel"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_names() {
        let avatar: AvatarIdentity =
            serde_json::from_str(r#"{"name": "Art - Bob Ross", "filename": "Art"}"#).unwrap();
        assert_eq!(avatar.display_name, "Art - Bob Ross");
        assert_eq!(avatar.file_key, "Art");
    }

    #[test]
    fn test_fallback_order() {
        let keys: Vec<_> = fallback_avatars().into_iter().map(|a| a.file_key).collect();
        assert_eq!(keys, vec!["Philosophy", "Art", "Travel"]);
    }
}
