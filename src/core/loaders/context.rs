use std::path::PathBuf;
use std::sync::Arc;

use crate::core::cache::{ArtifactStore, PathLocks};
use crate::core::downloader::{Fetcher, HashAlgorithm};
use crate::core::error::{DistroError, DistroResult};
use crate::core::promotion::{LoaderQuery, PromotionCache, PromotionResolver};
use crate::core::version::MinecraftVersion;

use super::pipeline::ArtifactPipeline;

/// Default number of libraries fetched at once by one resolver.
pub const DEFAULT_LIBRARY_CONCURRENCY: usize = 8;

/// Per-server inputs, passed explicitly into every resolver.
#[derive(Debug, Clone)]
pub struct ResolveOptions {
    pub root: PathBuf,
    pub server_id: String,
    /// Base URL of the file host, always ending in `/`.
    pub base_url: String,
    /// Drop materialized bytes once they are hashed.
    pub discard_output: bool,
    /// Ignore and delete cached artifact metadata as it is encountered.
    pub invalidate_cache: bool,
    /// Report a missing `recommended` promotion instead of using `latest`.
    pub strict_promotions: bool,
}

impl ResolveOptions {
    pub fn new(root: impl Into<PathBuf>, server_id: impl Into<String>, base_url: &str) -> Self {
        let mut base_url = base_url.to_string();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        Self {
            root: root.into(),
            server_id: server_id.into(),
            base_url,
            discard_output: false,
            invalidate_cache: false,
            strict_promotions: false,
        }
    }

    /// URL launchers use to download the artifact stored at `path`.
    pub fn artifact_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path.trim_start_matches('/'))
    }
}

/// Collaborators shared by every resolver the registry hands out.
#[derive(Clone)]
pub struct ResolverServices {
    pub fetcher: Arc<dyn Fetcher>,
    pub store: Arc<dyn ArtifactStore>,
    pub promotions: Arc<PromotionCache>,
    pub locks: Arc<PathLocks>,
    pub hash_algorithm: HashAlgorithm,
    pub library_concurrency: usize,
}

impl ResolverServices {
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        store: Arc<dyn ArtifactStore>,
        promotions: Arc<PromotionCache>,
    ) -> Self {
        Self {
            fetcher,
            store,
            promotions,
            locks: Arc::new(PathLocks::new()),
            hash_algorithm: HashAlgorithm::default(),
            library_concurrency: DEFAULT_LIBRARY_CONCURRENCY,
        }
    }

    pub fn with_hash_algorithm(mut self, algorithm: HashAlgorithm) -> Self {
        self.hash_algorithm = algorithm;
        self
    }
}

/// Everything one era resolver needs to resolve one server.
#[derive(Clone)]
pub struct ResolverContext {
    pub game_version: MinecraftVersion,
    pub options: ResolveOptions,
    pub services: ResolverServices,
}

impl ResolverContext {
    pub fn pipeline(&self) -> ArtifactPipeline<'_> {
        ArtifactPipeline::new(self)
    }

    /// Turn the query into a concrete build id.
    pub async fn resolve_build(&self, query: &LoaderQuery) -> DistroResult<String> {
        let resolver = PromotionResolver::new(self.services.promotions.clone());
        resolver
            .resolve(&self.game_version, query, self.options.strict_promotions)
            .await?
            .ok_or_else(|| DistroError::UnresolvedLoaderVersion {
                game_version: self.game_version.short(),
                query: query.to_string(),
            })
    }

    /// The version string Forge publishes a build under: `<mc>-<build>`.
    pub fn forge_version(&self, build: &str) -> String {
        format!("{}-{}", self.game_version.short(), build)
    }
}
