use futures_util::future::BoxFuture;
use futures_util::stream::{self, StreamExt, TryStreamExt};
use futures_util::FutureExt;
use tracing::debug;

use super::context::ResolverContext;
use super::profile::LibraryDecl;
use crate::core::distribution::{Artifact, Module, ModuleType};
use crate::core::downloader::HashAlgorithm;
use crate::core::error::{DistroError, DistroResult};

/// Root-relative directory holding loader jars and libraries.
pub const LIBRARY_ROOT: &str = "repo/lib";
/// Root-relative directory holding extracted loader version manifests.
pub const VERSIONS_ROOT: &str = "repo/versions";

pub fn library_path(repo_path: &str) -> String {
    format!("{}/{}", LIBRARY_ROOT, repo_path.trim_start_matches('/'))
}

/// Cache-or-fetch handling for every artifact a resolver touches.
///
/// Each path is handled under its own lock: cached metadata is reused
/// unless the cache is being invalidated; otherwise the bytes are fetched,
/// hashed, written atomically, recorded, and dropped again when output is
/// discarded.
pub struct ArtifactPipeline<'a> {
    ctx: &'a ResolverContext,
}

impl<'a> ArtifactPipeline<'a> {
    pub fn new(ctx: &'a ResolverContext) -> Self {
        Self { ctx }
    }

    /// Metadata for `path`, fetching it through `source` on a cache miss.
    pub async fn artifact<'s, F>(&self, path: &str, source: F) -> DistroResult<Artifact>
    where
        F: FnOnce() -> BoxFuture<'s, DistroResult<Vec<u8>>> + Send,
    {
        let _guard = self.ctx.services.locks.acquire(path).await;

        if let Some(artifact) = self.cached(path).await? {
            debug!("Cache hit for {}", path);
            self.discard_if_requested(path).await?;
            return Ok(artifact);
        }

        let bytes = source().await?;
        self.record(path, &bytes).await
    }

    /// Like [`artifact`](Self::artifact) but also hands back the content.
    /// A cache hit is only used when the materialized bytes are still on
    /// disk.
    pub async fn artifact_with_bytes<'s, F>(
        &self,
        path: &str,
        source: F,
    ) -> DistroResult<(Artifact, Vec<u8>)>
    where
        F: FnOnce() -> BoxFuture<'s, DistroResult<Vec<u8>>> + Send,
    {
        let _guard = self.ctx.services.locks.acquire(path).await;

        if let Some(artifact) = self.cached(path).await? {
            let local = self.ctx.services.store.read_bytes(path).await;
            if let Some(bytes) = local.filter(|b| b.len() as u64 == artifact.size) {
                debug!("Cache hit for {} (with local bytes)", path);
                self.discard_if_requested(path).await?;
                return Ok((artifact, bytes));
            }
            debug!("Cache entry for {} has no local bytes, fetching again", path);
        }

        let bytes = source().await?;
        let artifact = self.record(path, &bytes).await?;
        Ok((artifact, bytes))
    }

    /// Fetch `url` for the artifact at `path`, checking the upstream SHA-1
    /// when the loader manifest declares one.
    pub async fn fetch(
        &self,
        path: &str,
        url: &str,
        expected_sha1: Option<&str>,
    ) -> DistroResult<Vec<u8>> {
        let bytes = self
            .ctx
            .services
            .fetcher
            .fetch(url)
            .await
            .map_err(|e| unavailable(path, url, e))?;

        if let Some(expected) = expected_sha1.filter(|s| !s.is_empty()) {
            let actual = HashAlgorithm::Sha1.digest(&bytes);
            if !actual.eq_ignore_ascii_case(expected) {
                return Err(DistroError::Sha1Mismatch {
                    path: path.to_string(),
                    expected: expected.to_string(),
                    actual,
                });
            }
        }

        debug!("Fetched {} -> {}", url, path);
        Ok(bytes)
    }

    /// Metadata for a remote artifact.
    pub async fn remote(
        &self,
        path: &str,
        url: &str,
        expected_sha1: Option<&str>,
    ) -> DistroResult<Artifact> {
        self.artifact(path, || self.fetch(path, url, expected_sha1).boxed())
            .await
    }

    /// First candidate `(path, url)` that is cached or published, with its
    /// content and position in `candidates`.
    ///
    /// Only a 404 moves on to the next candidate. Any other failure is
    /// returned, so a flaky origin never selects the wrong coordinate.
    pub async fn first_available(
        &self,
        candidates: &[(String, String)],
    ) -> DistroResult<(Artifact, Vec<u8>, usize)> {
        let fetcher = &self.ctx.services.fetcher;
        let mut last_err = None;

        for (position, (path, url)) in candidates.iter().enumerate() {
            match self.artifact_with_bytes(path, || fetcher.fetch(url)).await {
                Ok((artifact, bytes)) => return Ok((artifact, bytes, position)),
                Err(e @ DistroError::DownloadFailed { status: 404, .. }) => {
                    debug!("Candidate {} not published: {}", path, e);
                    last_err = Some(unavailable(path, url, e));
                }
                Err(e @ (DistroError::DownloadFailed { .. } | DistroError::Http(_))) => {
                    return Err(unavailable(path, url, e));
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_err.unwrap_or_else(|| DistroError::ArtifactUnavailable {
            path: String::new(),
            reason: "no candidate locations".to_string(),
        }))
    }

    /// Library sub-modules in declaration order.
    ///
    /// Fetches run concurrently but `buffered` yields results in input
    /// order, which is the classpath order launchers rely on.
    pub async fn libraries(&self, libraries: Vec<LibraryDecl>) -> DistroResult<Vec<Module>> {
        let concurrency = self.ctx.services.library_concurrency.max(1);

        stream::iter(libraries)
            .map(|lib| async move {
                let path = library_path(&lib.repo_path);
                let artifact = self.remote(&path, &lib.url, lib.sha1.as_deref()).await?;
                Ok::<_, DistroError>(Module::new(
                    lib.id,
                    lib.name,
                    ModuleType::Library,
                    artifact,
                ))
            })
            .buffered(concurrency)
            .try_collect()
            .await
    }

    /// Cached metadata for `path`. An entry hashed with another algorithm
    /// is rehashed from local bytes, or treated as a miss without them.
    async fn cached(&self, path: &str) -> DistroResult<Option<Artifact>> {
        let store = &self.ctx.services.store;

        if self.ctx.options.invalidate_cache {
            store.delete(path).await?;
            return Ok(None);
        }

        let Some(mut artifact) = store.get(path).await else {
            return Ok(None);
        };

        let algorithm = self.ctx.services.hash_algorithm;
        if artifact.algorithm != algorithm {
            let local = store.read_bytes(path).await;
            match local.filter(|b| b.len() as u64 == artifact.size) {
                Some(bytes) => {
                    debug!("Rehashing {} with {:?}", path, algorithm);
                    artifact = Artifact::describe(path, None, &bytes, algorithm);
                    store.put(path, &artifact).await?;
                }
                None => {
                    debug!("Cache entry for {} uses {:?}, fetching again", path, artifact.algorithm);
                    return Ok(None);
                }
            }
        }

        artifact.url = Some(self.ctx.options.artifact_url(path));
        Ok(Some(artifact))
    }

    async fn discard_if_requested(&self, path: &str) -> DistroResult<()> {
        if self.ctx.options.discard_output {
            self.ctx.services.store.discard_bytes(path).await?;
        }
        Ok(())
    }

    async fn record(&self, path: &str, bytes: &[u8]) -> DistroResult<Artifact> {
        let store = &self.ctx.services.store;
        let artifact = Artifact::describe(
            path,
            Some(self.ctx.options.artifact_url(path)),
            bytes,
            self.ctx.services.hash_algorithm,
        );

        store.write_bytes(path, bytes).await?;
        store.put(path, &artifact).await?;
        self.discard_if_requested(path).await?;

        Ok(artifact)
    }
}

fn unavailable(path: &str, url: &str, e: DistroError) -> DistroError {
    DistroError::ArtifactUnavailable {
        path: path.to_string(),
        reason: format!("{}: {}", url, e),
    }
}
