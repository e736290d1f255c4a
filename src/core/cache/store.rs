use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;
use uuid::Uuid;

use crate::core::distribution::Artifact;
use crate::core::error::{DistroError, DistroResult};

/// Directory under the root holding artifact metadata entries.
pub const ARTIFACT_CACHE_DIR: &str = ".cache/artifacts";

/// Persistence for artifact metadata and materialized artifact bytes.
///
/// Keys are root-relative, `/`-separated artifact paths. An unreadable
/// metadata entry is reported as absent, never as an error.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    async fn get(&self, path: &str) -> Option<Artifact>;
    async fn put(&self, path: &str, artifact: &Artifact) -> DistroResult<()>;
    async fn delete(&self, path: &str) -> DistroResult<()>;

    async fn write_bytes(&self, path: &str, bytes: &[u8]) -> DistroResult<()>;
    async fn read_bytes(&self, path: &str) -> Option<Vec<u8>>;
    async fn discard_bytes(&self, path: &str) -> DistroResult<()>;
}

/// Store rooted at the distribution root: bytes live at `<root>/<path>`,
/// metadata at `<root>/.cache/artifacts/<path>.json`.
pub struct DiskArtifactStore {
    root: PathBuf,
}

impl DiskArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn bytes_path(&self, path: &str) -> DistroResult<PathBuf> {
        Ok(self.root.join(relative(path)?))
    }

    fn meta_path(&self, path: &str) -> DistroResult<PathBuf> {
        let mut rel = relative(path)?.into_os_string();
        rel.push(".json");
        Ok(self.root.join(ARTIFACT_CACHE_DIR).join(rel))
    }
}

#[async_trait]
impl ArtifactStore for DiskArtifactStore {
    async fn get(&self, path: &str) -> Option<Artifact> {
        let meta_path = self.meta_path(path).ok()?;
        let bytes = tokio::fs::read(&meta_path).await.ok()?;
        match serde_json::from_slice::<Artifact>(&bytes) {
            Ok(artifact) if artifact.path == path => Some(artifact),
            Ok(_) => {
                debug!("Cache entry {:?} belongs to another path, ignoring", meta_path);
                None
            }
            Err(e) => {
                debug!("Corrupt cache entry {:?}: {}", meta_path, e);
                None
            }
        }
    }

    async fn put(&self, path: &str, artifact: &Artifact) -> DistroResult<()> {
        let payload = serde_json::to_vec_pretty(artifact)?;
        write_atomic(&self.meta_path(path)?, &payload).await
    }

    async fn delete(&self, path: &str) -> DistroResult<()> {
        remove_if_exists(&self.meta_path(path)?).await
    }

    async fn write_bytes(&self, path: &str, bytes: &[u8]) -> DistroResult<()> {
        write_atomic(&self.bytes_path(path)?, bytes).await
    }

    async fn read_bytes(&self, path: &str) -> Option<Vec<u8>> {
        tokio::fs::read(self.bytes_path(path).ok()?).await.ok()
    }

    async fn discard_bytes(&self, path: &str) -> DistroResult<()> {
        remove_if_exists(&self.bytes_path(path)?).await
    }
}

/// Convert a `/`-separated key into a relative path that cannot escape the root.
fn relative(path: &str) -> DistroResult<PathBuf> {
    let candidate = Path::new(path);
    let escapes = candidate
        .components()
        .any(|c| !matches!(c, Component::Normal(_)));
    if path.is_empty() || escapes {
        return Err(DistroError::Other(format!(
            "Artifact path '{}' must be relative to the root",
            path
        )));
    }
    Ok(path.split('/').collect())
}

/// Write through a sibling temp file and rename it into place so readers
/// never observe a partial file.
pub async fn write_atomic(dest: &Path, bytes: &[u8]) -> DistroResult<()> {
    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(DistroError::io(parent))?;
    }

    let file_name = dest
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let temp = dest.with_file_name(format!(".{}.{}.tmp", file_name, Uuid::new_v4()));

    tokio::fs::write(&temp, bytes)
        .await
        .map_err(DistroError::io(&temp))?;

    if let Err(source) = tokio::fs::rename(&temp, dest).await {
        let _ = tokio::fs::remove_file(&temp).await;
        return Err(DistroError::Io {
            path: dest.to_path_buf(),
            source,
        });
    }

    Ok(())
}

async fn remove_if_exists(path: &Path) -> DistroResult<()> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(DistroError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}
