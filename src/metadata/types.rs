//! Manifest records from `users.json` and `channels.json`

use serde::Deserialize;

/// One entry of `channels.json`
#[derive(Debug, Clone, Deserialize)]
pub struct ChannelRecord {
    /// Channel ID (e.g., C09NU1KFXHT)
    pub id: String,

    /// Channel name without # (e.g., "engineering", "general")
    #[serde(default)]
    pub name: Option<String>,
}

impl ChannelRecord {
    pub fn display_name(&self) -> Option<&str> {
        self.name.as_deref().filter(|n| !n.is_empty())
    }
}

/// One entry of `users.json`
#[derive(Debug, Clone, Deserialize)]
pub struct UserRecord {
    /// User ID (e.g., U09JDBT2MCM)
    pub id: String,

    /// Username/handle (e.g., "john.doe")
    #[serde(default)]
    pub name: Option<String>,

    /// Real name (e.g., "John Doe"); integrations and some bots have none
    #[serde(default)]
    pub real_name: Option<String>,
}

impl UserRecord {
    /// Get best available name for display
    pub fn best_name(&self) -> Option<&str> {
        self.real_name
            .as_deref()
            .filter(|n| !n.is_empty())
            .or(self.name.as_deref().filter(|n| !n.is_empty()))
    }
}
