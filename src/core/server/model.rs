use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::promotion::LoaderQuery;
use crate::core::version::MinecraftVersion;

/// One configured game server, persisted as `servers/<id>/server.json`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    /// Unique within a root; also the directory name.
    pub id: String,
    pub minecraft_version: MinecraftVersion,
    /// `None` for a server without a mod loader.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loader: Option<LoaderQuery>,
    /// Root-relative directory of this server.
    pub path: String,
    pub created_at: DateTime<Utc>,
}

impl ServerConfig {
    pub fn new(
        id: impl Into<String>,
        minecraft_version: MinecraftVersion,
        loader: Option<LoaderQuery>,
    ) -> Self {
        let id = id.into();
        Self {
            path: format!("{}/{}", super::SERVERS_DIR, id),
            id,
            minecraft_version,
            loader,
            created_at: Utc::now(),
        }
    }
}
