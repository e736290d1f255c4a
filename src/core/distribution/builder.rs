// ─── Manifest Builder ───
// Resolves every configured server and assembles the distribution document.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use futures_util::stream::{self, StreamExt};
use tracing::{info, warn};

use super::model::{Distribution, ServerFailure, ServerManifest};
use crate::core::error::{DistroError, DistroResult};
use crate::core::loaders::{ResolveOptions, ResolverRegistry};
use crate::core::promotion::LoaderQuery;
use crate::core::server::{ServerConfig, ServerManager};
use crate::core::version::MinecraftVersion;

/// Servers resolved at once by default.
pub const DEFAULT_SERVER_PARALLELISM: usize = 4;

/// Knobs for one build, applied to every server in it.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    pub discard_output: bool,
    pub invalidate_cache: bool,
    pub strict_promotions: bool,
    /// Return the first server failure instead of recording it.
    pub fail_fast: bool,
    pub parallelism: usize,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            discard_output: false,
            invalidate_cache: false,
            strict_promotions: false,
            fail_fast: false,
            parallelism: DEFAULT_SERVER_PARALLELISM,
        }
    }
}

pub struct ManifestBuilder {
    registry: Arc<ResolverRegistry>,
    root: PathBuf,
    base_url: String,
    options: BuildOptions,
}

impl ManifestBuilder {
    pub fn new(
        registry: Arc<ResolverRegistry>,
        root: impl Into<PathBuf>,
        base_url: impl Into<String>,
        options: BuildOptions,
    ) -> Self {
        Self {
            registry,
            root: root.into(),
            base_url: base_url.into(),
            options,
        }
    }

    fn resolve_options(&self, server_id: &str) -> ResolveOptions {
        let mut options = ResolveOptions::new(&self.root, server_id, &self.base_url);
        options.discard_output = self.options.discard_output;
        options.invalidate_cache = self.options.invalidate_cache;
        options.strict_promotions = self.options.strict_promotions;
        options
    }

    /// Module tree for one server. A server without a loader has no modules.
    pub async fn build_server(&self, config: &ServerConfig) -> DistroResult<ServerManifest> {
        let mut modules = Vec::new();

        if let Some(query) = &config.loader {
            let options = self.resolve_options(&config.id);
            let resolver = self
                .registry
                .select(&config.minecraft_version, &options)
                .ok_or_else(|| DistroError::UnsupportedGameVersion(config.minecraft_version.short()))?;
            modules.push(resolver.resolve(query).await?);
        }

        Ok(ServerManifest {
            id: config.id.clone(),
            minecraft_version: config.minecraft_version,
            modules,
        })
    }

    /// Resolve `configs` concurrently and join them in input order.
    ///
    /// Servers finish in any order, so a slow server never holds a free slot.
    /// One server failing does not stop the others: its failure is recorded
    /// in the document, unless `fail_fast` is set, in which case the first
    /// failure to arrive is returned and the rest are dropped.
    pub async fn build_distribution(&self, configs: Vec<ServerConfig>) -> DistroResult<Distribution> {
        if self.options.invalidate_cache {
            self.registry.promotions().invalidate().await;
        }

        let mut seen = HashSet::new();
        let entries: Vec<(usize, ServerConfig, bool)> = configs
            .into_iter()
            .enumerate()
            .map(|(index, config)| {
                let duplicate = !seen.insert(config.id.clone());
                (index, config, duplicate)
            })
            .collect();

        info!("Building distribution for {} server(s)", entries.len());
        let mut results = stream::iter(entries)
            .map(|(index, config, duplicate)| async move {
                let result = if duplicate {
                    Err(DistroError::DuplicateServerId(config.id.clone()))
                } else {
                    self.build_server(&config).await
                };
                (index, config.id, result)
            })
            .buffer_unordered(self.options.parallelism.max(1));

        let mut outcomes = Vec::new();
        while let Some((index, id, result)) = results.next().await {
            match result {
                Err(e) if self.options.fail_fast => return Err(e),
                result => outcomes.push((index, id, result)),
            }
        }
        outcomes.sort_by_key(|(index, _, _)| *index);

        let mut distribution = Distribution::new(self.base_url.clone());
        for (_, id, result) in outcomes {
            match result {
                Ok(server) => distribution.servers.push(server),
                Err(e) => {
                    warn!("Server '{}' failed: {}", id, e);
                    distribution.failures.push(ServerFailure {
                        id,
                        reason: e.to_string(),
                    });
                }
            }
        }

        info!(
            "Distribution built: {} server(s), {} failure(s)",
            distribution.servers.len(),
            distribution.failures.len()
        );
        Ok(distribution)
    }

    /// Build every server configured under the root.
    pub async fn build_all(&self) -> DistroResult<Distribution> {
        let configs = ServerManager::new(&self.root).list().await?;
        self.build_distribution(configs).await
    }

    /// Build only the named servers, in the order given.
    pub async fn build_selected(&self, ids: &[String]) -> DistroResult<Distribution> {
        let manager = ServerManager::new(&self.root);
        let mut configs = Vec::with_capacity(ids.len());
        for id in ids {
            configs.push(manager.load(id).await?);
        }
        self.build_distribution(configs).await
    }

    /// Scaffold a new server descriptor under the root.
    pub async fn create_server(
        &self,
        id: &str,
        minecraft_version: MinecraftVersion,
        loader: Option<LoaderQuery>,
    ) -> DistroResult<ServerConfig> {
        ServerManager::new(&self.root)
            .create(ServerConfig::new(id, minecraft_version, loader))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::downloader::Fetcher;
    use crate::core::loaders::ResolverServices;
    use crate::core::promotion::PromotionCache;
    use crate::core::test_support::{
        jar, services, FixtureFetcher, MemoryArtifactStore, PROMOTIONS_FIXTURE_URL, TEST_BASE_URL,
    };
    use std::time::Duration;

    const UNIVERSAL_URL: &str = "https://maven.minecraftforge.net/net/minecraftforge/forge/1.12.2-14.23.5.2860/forge-1.12.2-14.23.5.2860-universal.jar";
    const LIB_URL: &str = "https://libraries.minecraft.net/net/minecraft/launchwrapper/1.12/launchwrapper-1.12.jar";

    fn fetcher() -> Arc<FixtureFetcher> {
        let version_json = r#"{"libraries":[{"name":"net.minecraft:launchwrapper:1.12"}]}"#;
        Arc::new(
            FixtureFetcher::new()
                .with(UNIVERSAL_URL, jar(&[("version.json", version_json.as_bytes())]))
                .with(LIB_URL, "launchwrapper")
                .with(
                    PROMOTIONS_FIXTURE_URL,
                    r#"{"promos":{"1.12.2-recommended":"14.23.5.2860"}}"#,
                ),
        )
    }

    fn builder(
        fetcher: Arc<FixtureFetcher>,
        store: Arc<MemoryArtifactStore>,
        options: BuildOptions,
    ) -> ManifestBuilder {
        let registry = ResolverRegistry::forge(services(fetcher, store)).unwrap();
        ManifestBuilder::new(Arc::new(registry), "/tmp/forge-distro-test", TEST_BASE_URL, options)
    }

    fn server(id: &str, version: &str, loader: Option<&str>) -> ServerConfig {
        ServerConfig::new(id, version.parse().unwrap(), loader.map(LoaderQuery::parse))
    }

    #[tokio::test]
    async fn one_bad_server_does_not_block_the_rest() {
        let builder = builder(fetcher(), Arc::new(MemoryArtifactStore::new()), BuildOptions::default());
        let configs = vec![
            server("alpha", "1.12.2", Some("recommended")),
            server("vanilla", "1.20.1", None),
            server("ancient", "1.5.2", Some("latest")),
            server("beta", "1.12.2", Some("14.23.5.2860")),
        ];

        let distribution = builder.build_distribution(configs).await.unwrap();

        let ids: Vec<&str> = distribution.servers.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["alpha", "vanilla", "beta"]);
        assert!(distribution.servers[1].modules.is_empty());
        assert_eq!(distribution.failures.len(), 1);
        assert_eq!(distribution.failures[0].id, "ancient");
        assert!(distribution.failures[0].reason.contains("1.5.2"));
        assert_eq!(distribution.base_url, TEST_BASE_URL);
    }

    fn universal_url(build: &str) -> String {
        format!(
            "https://maven.minecraftforge.net/net/minecraftforge/forge/1.12.2-{0}/forge-1.12.2-{0}-universal.jar",
            build
        )
    }

    /// Holds the fetch of `wait_on` until `release_on` has been requested.
    struct GatedFetcher {
        inner: Arc<FixtureFetcher>,
        wait_on: String,
        release_on: String,
        gate: tokio::sync::Notify,
    }

    #[async_trait::async_trait]
    impl Fetcher for GatedFetcher {
        async fn fetch(&self, url: &str) -> DistroResult<Vec<u8>> {
            if url == self.release_on {
                self.gate.notify_one();
            }
            if url == self.wait_on {
                tokio::time::timeout(Duration::from_secs(2), self.gate.notified())
                    .await
                    .map_err(|_| DistroError::Other("later server never started".into()))?;
            }
            self.inner.fetch(url).await
        }
    }

    #[tokio::test]
    async fn slow_server_does_not_hold_back_later_ones() {
        let version_json = r#"{"libraries":[{"name":"net.minecraft:launchwrapper:1.12"}]}"#;
        let builds = ["14.23.5.2847", "14.23.5.2855", "14.23.5.2860"];
        let inner = FixtureFetcher::new().with(LIB_URL, "launchwrapper");
        for build in builds {
            inner.insert(&universal_url(build), jar(&[("version.json", version_json.as_bytes())]));
        }
        let fetcher: Arc<dyn Fetcher> = Arc::new(GatedFetcher {
            inner: Arc::new(inner),
            wait_on: universal_url(builds[0]),
            release_on: universal_url(builds[2]),
            gate: tokio::sync::Notify::new(),
        });
        let promotions = Arc::new(PromotionCache::new(fetcher.clone(), PROMOTIONS_FIXTURE_URL));
        let services = ResolverServices::new(fetcher, Arc::new(MemoryArtifactStore::new()), promotions);
        let options = BuildOptions {
            parallelism: 2,
            ..BuildOptions::default()
        };
        let builder = ManifestBuilder::new(
            Arc::new(ResolverRegistry::forge(services).unwrap()),
            "/tmp/forge-distro-test",
            TEST_BASE_URL,
            options,
        );
        let configs = vec![
            server("s1", "1.12.2", Some(builds[0])),
            server("s2", "1.12.2", Some(builds[1])),
            server("s3", "1.12.2", Some(builds[2])),
        ];

        let distribution = builder.build_distribution(configs).await.unwrap();

        assert!(distribution.failures.is_empty(), "{:?}", distribution.failures);
        let ids: Vec<&str> = distribution.servers.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["s1", "s2", "s3"]);
    }

    #[tokio::test]
    async fn duplicate_ids_are_recorded_as_failures() {
        let builder = builder(fetcher(), Arc::new(MemoryArtifactStore::new()), BuildOptions::default());
        let configs = vec![
            server("alpha", "1.20.1", None),
            server("alpha", "1.12.2", None),
        ];

        let distribution = builder.build_distribution(configs).await.unwrap();
        assert_eq!(distribution.servers.len(), 1);
        assert_eq!(distribution.servers[0].minecraft_version.short(), "1.20.1");
        assert!(distribution.failures[0].reason.contains("alpha"));
    }

    #[tokio::test]
    async fn fail_fast_returns_the_error() {
        let options = BuildOptions {
            fail_fast: true,
            ..BuildOptions::default()
        };
        let builder = builder(fetcher(), Arc::new(MemoryArtifactStore::new()), options);
        let err = builder
            .build_distribution(vec![server("ancient", "1.5.2", Some("latest"))])
            .await
            .unwrap_err();
        assert!(matches!(err, DistroError::UnsupportedGameVersion(_)));
    }

    #[tokio::test]
    async fn rebuild_is_served_from_cache() {
        let fetcher = fetcher();
        let store = Arc::new(MemoryArtifactStore::new());
        let configs = vec![server("alpha", "1.12.2", Some("14.23.5.2860"))];

        let first = builder(fetcher.clone(), store.clone(), BuildOptions::default())
            .build_distribution(configs.clone())
            .await
            .unwrap();
        let calls = fetcher.total_calls();

        let second = builder(fetcher.clone(), store, BuildOptions::default())
            .build_distribution(configs)
            .await
            .unwrap();

        assert_eq!(first.servers, second.servers);
        assert_eq!(fetcher.total_calls(), calls);
    }

    #[tokio::test]
    async fn servers_sharing_artifacts_fetch_them_once() {
        let fetcher = fetcher();
        let builder = builder(fetcher.clone(), Arc::new(MemoryArtifactStore::new()), BuildOptions::default());
        let configs = vec![
            server("alpha", "1.12.2", Some("14.23.5.2860")),
            server("beta", "1.12.2", Some("14.23.5.2860")),
        ];

        let distribution = builder.build_distribution(configs).await.unwrap();
        assert_eq!(distribution.servers.len(), 2);
        assert_eq!(fetcher.calls_for(LIB_URL), 1);
    }

    #[tokio::test]
    async fn invalidate_cache_refetches_promotions_once() {
        let fetcher = fetcher();
        let options = BuildOptions {
            invalidate_cache: true,
            ..BuildOptions::default()
        };
        let builder = builder(fetcher.clone(), Arc::new(MemoryArtifactStore::new()), options);
        let configs = vec![
            server("alpha", "1.12.2", Some("recommended")),
            server("beta", "1.12.2", Some("recommended")),
        ];

        builder.build_distribution(configs).await.unwrap();
        assert_eq!(fetcher.calls_for(PROMOTIONS_FIXTURE_URL), 1);
    }

    #[tokio::test]
    async fn create_server_scaffolds_descriptor() {
        let dir = tempfile::tempdir().unwrap();
        let registry = ResolverRegistry::forge(services(
            fetcher(),
            Arc::new(MemoryArtifactStore::new()),
        ))
        .unwrap();
        let builder = ManifestBuilder::new(
            Arc::new(registry),
            dir.path(),
            TEST_BASE_URL,
            BuildOptions::default(),
        );

        builder
            .create_server("alpha", "1.12.2".parse().unwrap(), Some(LoaderQuery::parse("14.23.5.2860")))
            .await
            .unwrap();
        let distribution = builder.build_all().await.unwrap();
        assert_eq!(distribution.servers.len(), 1);
        assert_eq!(distribution.servers[0].modules[0].sub_modules.len(), 1);
    }

    #[tokio::test]
    async fn build_selected_keeps_requested_order() {
        let dir = tempfile::tempdir().unwrap();
        let registry = ResolverRegistry::forge(services(
            fetcher(),
            Arc::new(MemoryArtifactStore::new()),
        ))
        .unwrap();
        let builder = ManifestBuilder::new(
            Arc::new(registry),
            dir.path(),
            TEST_BASE_URL,
            BuildOptions::default(),
        );
        for id in ["alpha", "beta", "gamma"] {
            builder
                .create_server(id, "1.20.1".parse().unwrap(), None)
                .await
                .unwrap();
        }

        let distribution = builder
            .build_selected(&["gamma".to_string(), "alpha".to_string()])
            .await
            .unwrap();
        let ids: Vec<&str> = distribution.servers.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["gamma", "alpha"]);

        let err = builder.build_selected(&["ghost".to_string()]).await.unwrap_err();
        assert!(matches!(err, DistroError::ServerNotFound(id) if id == "ghost"));
    }
}
