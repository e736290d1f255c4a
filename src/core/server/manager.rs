use std::path::{Path, PathBuf};

use tracing::{info, warn};

use super::model::ServerConfig;
use crate::core::cache::write_atomic;
use crate::core::error::{DistroError, DistroResult};

/// Root-relative directory holding one subdirectory per server.
pub const SERVERS_DIR: &str = "servers";
/// File name of a server descriptor inside its directory.
pub const SERVER_DESCRIPTOR: &str = "server.json";

/// Reads and writes server descriptors under a distribution root.
pub struct ServerManager {
    servers_dir: PathBuf,
}

impl ServerManager {
    pub fn new(root: &Path) -> Self {
        Self {
            servers_dir: root.join(SERVERS_DIR),
        }
    }

    fn descriptor_path(&self, id: &str) -> PathBuf {
        self.servers_dir.join(id).join(SERVER_DESCRIPTOR)
    }

    /// Scaffold a new server directory and write its descriptor.
    pub async fn create(&self, config: ServerConfig) -> DistroResult<ServerConfig> {
        validate_id(&config.id)?;

        let descriptor = self.descriptor_path(&config.id);
        if tokio::fs::try_exists(&descriptor).await.unwrap_or(false) {
            return Err(DistroError::DuplicateServerId(config.id));
        }

        self.save(&config).await?;
        info!(
            "Created server '{}' for Minecraft {}",
            config.id, config.minecraft_version
        );
        Ok(config)
    }

    pub async fn save(&self, config: &ServerConfig) -> DistroResult<()> {
        let json = serde_json::to_vec_pretty(config)?;
        write_atomic(&self.descriptor_path(&config.id), &json).await
    }

    /// Load a single server by id.
    pub async fn load(&self, id: &str) -> DistroResult<ServerConfig> {
        let descriptor = self.descriptor_path(id);
        let json = match tokio::fs::read(&descriptor).await {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(DistroError::ServerNotFound(id.to_string()));
            }
            Err(e) => return Err(DistroError::io(descriptor)(e)),
        };
        Ok(serde_json::from_slice(&json)?)
    }

    /// Every readable descriptor, ordered by id. Corrupt entries are
    /// skipped with a warning.
    pub async fn list(&self) -> DistroResult<Vec<ServerConfig>> {
        let mut servers = Vec::new();

        let mut entries = match tokio::fs::read_dir(&self.servers_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(servers),
            Err(e) => return Err(DistroError::io(&self.servers_dir)(e)),
        };

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(DistroError::io(&self.servers_dir))?
        {
            let descriptor = entry.path().join(SERVER_DESCRIPTOR);
            let json = match tokio::fs::read(&descriptor).await {
                Ok(json) => json,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => {
                    warn!("Cannot read {:?}: {}", descriptor, e);
                    continue;
                }
            };
            match serde_json::from_slice::<ServerConfig>(&json) {
                Ok(config) => servers.push(config),
                Err(e) => warn!("Corrupt server.json at {:?}: {}", descriptor, e),
            }
        }

        servers.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(servers)
    }
}

fn validate_id(id: &str) -> DistroResult<()> {
    let valid = !id.is_empty()
        && id != "."
        && id != ".."
        && !id.contains(['/', '\\']);
    if valid {
        Ok(())
    } else {
        Err(DistroError::Other(format!("Invalid server id '{}'", id)))
    }
}
