//! Test doubles shared by the unit tests.

use std::collections::HashMap;
use std::io::Write;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::core::cache::ArtifactStore;
use crate::core::distribution::Artifact;
use crate::core::downloader::Fetcher;
use crate::core::error::{DistroError, DistroResult};
use crate::core::loaders::{ResolveOptions, ResolverContext, ResolverServices};
use crate::core::promotion::PromotionCache;

/// Where test contexts expect the promotion index to be served.
pub const PROMOTIONS_FIXTURE_URL: &str = "https://promotions.test/promotions_slim.json";
/// Base URL every test context publishes artifacts under.
pub const TEST_BASE_URL: &str = "https://cdn.test/";

/// Serves canned responses and counts every request.
#[derive(Default)]
pub struct FixtureFetcher {
    responses: Mutex<HashMap<String, Vec<u8>>>,
    statuses: Mutex<HashMap<String, u16>>,
    calls: Mutex<Vec<String>>,
}

impl FixtureFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, url: &str, body: impl Into<Vec<u8>>) -> Self {
        self.insert(url, body);
        self
    }

    pub fn insert(&self, url: &str, body: impl Into<Vec<u8>>) {
        self.responses
            .lock()
            .unwrap()
            .insert(url.to_string(), body.into());
    }

    /// Answer `url` with an HTTP error status.
    pub fn fail_with(self, url: &str, status: u16) -> Self {
        self.statuses.lock().unwrap().insert(url.to_string(), status);
        self
    }

    pub fn calls_for(&self, url: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|u| *u == url).count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Fetcher for FixtureFetcher {
    async fn fetch(&self, url: &str) -> DistroResult<Vec<u8>> {
        self.calls.lock().unwrap().push(url.to_string());
        if let Some(status) = self.statuses.lock().unwrap().get(url).copied() {
            return Err(DistroError::DownloadFailed {
                url: url.to_string(),
                status,
            });
        }
        self.responses
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or_else(|| DistroError::DownloadFailed {
                url: url.to_string(),
                status: 404,
            })
    }
}

/// In-memory artifact store.
#[derive(Default)]
pub struct MemoryArtifactStore {
    meta: Mutex<HashMap<String, Artifact>>,
    bytes: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn byte_paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.bytes.lock().unwrap().keys().cloned().collect();
        paths.sort();
        paths
    }

    pub fn meta_paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.meta.lock().unwrap().keys().cloned().collect();
        paths.sort();
        paths
    }
}

#[async_trait]
impl ArtifactStore for MemoryArtifactStore {
    async fn get(&self, path: &str) -> Option<Artifact> {
        self.meta.lock().unwrap().get(path).cloned()
    }

    async fn put(&self, path: &str, artifact: &Artifact) -> DistroResult<()> {
        self.meta
            .lock()
            .unwrap()
            .insert(path.to_string(), artifact.clone());
        Ok(())
    }

    async fn delete(&self, path: &str) -> DistroResult<()> {
        self.meta.lock().unwrap().remove(path);
        Ok(())
    }

    async fn write_bytes(&self, path: &str, bytes: &[u8]) -> DistroResult<()> {
        self.bytes
            .lock()
            .unwrap()
            .insert(path.to_string(), bytes.to_vec());
        Ok(())
    }

    async fn read_bytes(&self, path: &str) -> Option<Vec<u8>> {
        self.bytes.lock().unwrap().get(path).cloned()
    }

    async fn discard_bytes(&self, path: &str) -> DistroResult<()> {
        self.bytes.lock().unwrap().remove(path);
        Ok(())
    }
}

/// Build an in-memory jar (zip) holding the given entries.
pub fn jar(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    let options = zip::write::SimpleFileOptions::default();
    for (name, body) in entries {
        writer.start_file(*name, options).unwrap();
        writer.write_all(body).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

/// Services wired to the given doubles.
pub fn services(fetcher: Arc<FixtureFetcher>, store: Arc<MemoryArtifactStore>) -> ResolverServices {
    let promotions = Arc::new(PromotionCache::new(fetcher.clone(), PROMOTIONS_FIXTURE_URL));
    ResolverServices::new(fetcher, store, promotions)
}

/// Resolver context for server `test` on `version`, with options tweaked
/// by `configure`.
pub fn resolver_context(
    version: &str,
    fetcher: Arc<FixtureFetcher>,
    store: Arc<MemoryArtifactStore>,
    configure: impl FnOnce(&mut ResolveOptions),
) -> ResolverContext {
    let mut options = ResolveOptions::new("/tmp/forge-distro-test", "test", TEST_BASE_URL);
    configure(&mut options);
    ResolverContext {
        game_version: version.parse().unwrap(),
        options,
        services: services(fetcher, store),
    }
}
