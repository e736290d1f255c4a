// ─── Promotion Index ───
// Fetches and caches Forge's promotions_slim.json.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::query::Channel;
use crate::core::cache::write_atomic;
use crate::core::downloader::Fetcher;
use crate::core::error::{DistroError, DistroResult};
use crate::core::version::MinecraftVersion;

pub const PROMOTIONS_URL: &str =
    "https://files.minecraftforge.net/net/minecraftforge/forge/promotions_slim.json";

/// Persisted promotion indexes older than this are fetched again.
pub const PROMOTIONS_TTL_SECS: i64 = 60 * 30;

/// Map of `"<gameVersion>-<channel>"` to a Forge build id.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PromotionIndex {
    #[serde(default)]
    promos: HashMap<String, String>,
}

impl PromotionIndex {
    #[cfg(test)]
    pub(crate) fn from_promos(promos: HashMap<String, String>) -> Self {
        Self { promos }
    }

    /// Retrieve and parse the promotions document. Not retried.
    pub async fn fetch(fetcher: &dyn Fetcher, url: &str) -> DistroResult<Self> {
        let failed = |reason: String| DistroError::PromotionFetch {
            url: url.to_string(),
            reason,
        };

        let bytes = fetcher.fetch(url).await.map_err(|e| failed(e.to_string()))?;
        let index: PromotionIndex =
            serde_json::from_slice(&bytes).map_err(|e| failed(e.to_string()))?;

        info!("Loaded {} Forge promotions", index.promos.len());
        Ok(index)
    }

    pub fn key(version: &MinecraftVersion, channel: Channel) -> String {
        format!("{}-{}", version.short(), channel)
    }

    /// Absent means no promoted build for this channel and version.
    pub fn lookup(&self, version: &MinecraftVersion, channel: Channel) -> Option<&str> {
        self.promos
            .get(&Self::key(version, channel))
            .map(String::as_str)
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PersistedPromotions {
    fetched_at: DateTime<Utc>,
    #[serde(flatten)]
    index: PromotionIndex,
}

struct Persistence {
    path: PathBuf,
    ttl: Duration,
}

/// Lazily fetched promotion index shared by every resolver in a run.
///
/// At most one fetch happens per invalidation epoch: callers arriving while
/// a fetch is in flight wait on the same lock and reuse its result.
pub struct PromotionCache {
    fetcher: Arc<dyn Fetcher>,
    url: String,
    persistence: Option<Persistence>,
    current: Mutex<Option<Arc<PromotionIndex>>>,
}

impl PromotionCache {
    pub fn new(fetcher: Arc<dyn Fetcher>, url: impl Into<String>) -> Self {
        Self {
            fetcher,
            url: url.into(),
            persistence: None,
            current: Mutex::new(None),
        }
    }

    /// Also keep the index on disk, reusing it across runs until `ttl` passes.
    pub fn persisted_at(mut self, path: impl Into<PathBuf>, ttl: Duration) -> Self {
        self.persistence = Some(Persistence {
            path: path.into(),
            ttl,
        });
        self
    }

    pub async fn index(&self) -> DistroResult<Arc<PromotionIndex>> {
        let mut current = self.current.lock().await;
        if let Some(index) = current.as_ref() {
            return Ok(index.clone());
        }

        if let Some(index) = self.read_persisted().await {
            let index = Arc::new(index);
            *current = Some(index.clone());
            return Ok(index);
        }

        info!("Fetching Forge promotion index from {}", self.url);
        let index = Arc::new(PromotionIndex::fetch(self.fetcher.as_ref(), &self.url).await?);
        self.write_persisted(&index).await;
        *current = Some(index.clone());
        Ok(index)
    }

    /// Start a new epoch: the next lookup fetches again.
    pub async fn invalidate(&self) {
        let mut current = self.current.lock().await;
        *current = None;
        if let Some(persistence) = &self.persistence {
            if let Err(e) = tokio::fs::remove_file(&persistence.path).await {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!("Cannot remove {:?}: {}", persistence.path, e);
                }
            }
        }
        debug!("Promotion index invalidated");
    }

    async fn read_persisted(&self) -> Option<PromotionIndex> {
        let persistence = self.persistence.as_ref()?;
        let bytes = tokio::fs::read(&persistence.path).await.ok()?;
        let persisted: PersistedPromotions = match serde_json::from_slice(&bytes) {
            Ok(p) => p,
            Err(e) => {
                debug!("Ignoring corrupt promotion cache {:?}: {}", persistence.path, e);
                return None;
            }
        };

        if Utc::now() - persisted.fetched_at > persistence.ttl {
            debug!("Persisted promotion index is stale");
            return None;
        }
        Some(persisted.index)
    }

    async fn write_persisted(&self, index: &PromotionIndex) {
        let Some(persistence) = &self.persistence else {
            return;
        };
        let persisted = PersistedPromotions {
            fetched_at: Utc::now(),
            index: index.clone(),
        };
        let result = match serde_json::to_vec_pretty(&persisted) {
            Ok(payload) => write_atomic(&persistence.path, &payload).await,
            Err(e) => Err(e.into()),
        };
        if let Err(e) = result {
            warn!("Cannot persist promotion index: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::test_support::FixtureFetcher;

    const URL: &str = "https://promotions.test/promotions_slim.json";
    const FIXTURE: &str = r#"{
        "homepage": "https://files.minecraftforge.net/",
        "promos": {
            "1.12.2-recommended": "14.23.5.2860",
            "1.12.2-latest": "14.23.5.2865",
            "1.13-latest": "25.0.219"
        }
    }"#;

    fn v(text: &str) -> MinecraftVersion {
        text.parse().unwrap()
    }

    #[tokio::test]
    async fn fetch_parses_promos() {
        let fetcher = FixtureFetcher::new().with(URL, FIXTURE);
        let index = PromotionIndex::fetch(&fetcher, URL).await.unwrap();
        assert_eq!(index.promos.len(), 3);
        assert_eq!(index.lookup(&v("1.12.2"), Channel::Recommended), Some("14.23.5.2860"));
        assert_eq!(index.lookup(&v("1.13.0"), Channel::Latest), Some("25.0.219"));
        assert_eq!(index.lookup(&v("1.13"), Channel::Recommended), None);
    }

    #[tokio::test]
    async fn fetch_failures_are_promotion_errors() {
        let missing = FixtureFetcher::new();
        assert!(matches!(
            PromotionIndex::fetch(&missing, URL).await,
            Err(DistroError::PromotionFetch { .. })
        ));

        let garbage = FixtureFetcher::new().with(URL, "<html>");
        assert!(matches!(
            PromotionIndex::fetch(&garbage, URL).await,
            Err(DistroError::PromotionFetch { .. })
        ));
    }

    #[tokio::test]
    async fn concurrent_lookups_share_one_fetch() {
        let fetcher = Arc::new(FixtureFetcher::new().with(URL, FIXTURE));
        let cache = Arc::new(PromotionCache::new(fetcher.clone(), URL));

        let lookups = (0..8).map(|_| {
            let cache = cache.clone();
            tokio::spawn(async move { cache.index().await.map(|i| i.promos.len()) })
        });
        for handle in lookups {
            assert_eq!(handle.await.unwrap().unwrap(), 3);
        }
        assert_eq!(fetcher.calls_for(URL), 1);
    }

    #[tokio::test]
    async fn invalidate_forces_refetch() {
        let fetcher = Arc::new(FixtureFetcher::new().with(URL, FIXTURE));
        let cache = PromotionCache::new(fetcher.clone(), URL);

        cache.index().await.unwrap();
        cache.index().await.unwrap();
        assert_eq!(fetcher.calls_for(URL), 1);

        cache.invalidate().await;
        cache.index().await.unwrap();
        assert_eq!(fetcher.calls_for(URL), 2);
    }

    #[tokio::test]
    async fn persisted_index_survives_new_cache_until_invalidated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".cache/promotions.json");
        let fetcher = Arc::new(FixtureFetcher::new().with(URL, FIXTURE));

        let first = PromotionCache::new(fetcher.clone(), URL)
            .persisted_at(&path, Duration::seconds(PROMOTIONS_TTL_SECS));
        first.index().await.unwrap();
        assert!(path.exists());

        let second = PromotionCache::new(fetcher.clone(), URL)
            .persisted_at(&path, Duration::seconds(PROMOTIONS_TTL_SECS));
        assert_eq!(second.index().await.unwrap().promos.len(), 3);
        assert_eq!(fetcher.calls_for(URL), 1);

        second.invalidate().await;
        assert!(!path.exists());
        second.index().await.unwrap();
        assert_eq!(fetcher.calls_for(URL), 2);
    }

    #[tokio::test]
    async fn stale_persisted_index_is_refetched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("promotions.json");
        let stale = serde_json::json!({
            "fetchedAt": (Utc::now() - Duration::hours(2)).to_rfc3339(),
            "promos": { "1.12.2-latest": "old" }
        });
        std::fs::write(&path, serde_json::to_vec(&stale).unwrap()).unwrap();

        let fetcher = Arc::new(FixtureFetcher::new().with(URL, FIXTURE));
        let cache = PromotionCache::new(fetcher.clone(), URL)
            .persisted_at(&path, Duration::seconds(PROMOTIONS_TTL_SECS));
        let index = cache.index().await.unwrap();

        assert_eq!(index.lookup(&v("1.12.2"), Channel::Latest), Some("14.23.5.2865"));
        assert_eq!(fetcher.calls_for(URL), 1);
    }
}
