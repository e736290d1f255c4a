use std::path::Path;
use std::sync::Arc;

use chrono::Duration;
use tracing::info;

use super::settings::Settings;
use crate::core::cache::{DiskArtifactStore, ARTIFACT_CACHE_DIR};
use crate::core::distribution::ManifestBuilder;
use crate::core::downloader::HttpFetcher;
use crate::core::error::{DistroError, DistroResult};
use crate::core::loaders::{ResolverRegistry, ResolverServices, LIBRARY_ROOT, VERSIONS_ROOT};
use crate::core::promotion::{PromotionCache, PromotionResolver, PROMOTIONS_TTL_SECS};
use crate::core::server::{ServerManager, SERVERS_DIR};

/// Root-relative location of the persisted promotion index.
const PROMOTIONS_CACHE_FILE: &str = ".cache/promotions.json";

/// Long-lived collaborators for one run, wired from [`Settings`].
pub struct AppState {
    pub settings: Settings,
    pub registry: Arc<ResolverRegistry>,
    pub server_manager: ServerManager,
}

impl AppState {
    pub fn new(settings: Settings) -> DistroResult<Self> {
        let fetcher = Arc::new(HttpFetcher::new()?);
        let store = Arc::new(DiskArtifactStore::new(&settings.root));
        let promotions = Arc::new(
            PromotionCache::new(fetcher.clone(), settings.promotions_url.clone()).persisted_at(
                settings.root.join(PROMOTIONS_CACHE_FILE),
                Duration::seconds(PROMOTIONS_TTL_SECS),
            ),
        );

        let services = ResolverServices::new(fetcher, store, promotions)
            .with_hash_algorithm(settings.hash_algorithm);

        let registry = Arc::new(ResolverRegistry::forge(services)?);
        let server_manager = ServerManager::new(&settings.root);

        Ok(Self {
            settings,
            registry,
            server_manager,
        })
    }

    pub fn manifest_builder(&self) -> ManifestBuilder {
        ManifestBuilder::new(
            self.registry.clone(),
            &self.settings.root,
            &self.settings.base_url,
            self.settings.build_options(),
        )
    }

    pub fn promotion_resolver(&self) -> PromotionResolver {
        PromotionResolver::new(self.registry.promotions().clone())
    }

    /// Create the empty directory layout under the root.
    pub async fn init_root(&self) -> DistroResult<()> {
        let root = &self.settings.root;
        let servers = root.join(SERVERS_DIR);
        let libraries = root.join(LIBRARY_ROOT);
        let versions = root.join(VERSIONS_ROOT);
        let cache = root.join(ARTIFACT_CACHE_DIR);
        tokio::try_join!(
            create_dir_safe(&servers),
            create_dir_safe(&libraries),
            create_dir_safe(&versions),
            create_dir_safe(&cache),
        )?;
        info!("Initialized distribution root at {:?}", root);
        Ok(())
    }
}

async fn create_dir_safe(path: &Path) -> DistroResult<()> {
    tokio::fs::create_dir_all(path)
        .await
        .map_err(DistroError::io(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn init_root_creates_layout() {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState::new(Settings::new(dir.path(), "https://cdn.example").unwrap()).unwrap();

        state.init_root().await.unwrap();

        for sub in ["servers", "repo/lib", "repo/versions", ".cache/artifacts"] {
            assert!(dir.path().join(sub).is_dir(), "{} missing", sub);
        }
        assert_eq!(state.registry.segments().count(), 3);
        assert!(state.server_manager.list().await.unwrap().is_empty());
    }
}
