use std::sync::Arc;

use tracing::{debug, warn};

use super::index::{PromotionCache, PromotionIndex};
use super::query::{Channel, LoaderQuery};
use crate::core::error::DistroResult;
use crate::core::version::MinecraftVersion;

/// Turns a loader query into a concrete Forge build id.
#[derive(Clone)]
pub struct PromotionResolver {
    cache: Arc<PromotionCache>,
}

impl PromotionResolver {
    pub fn new(cache: Arc<PromotionCache>) -> Self {
        Self { cache }
    }

    /// Explicit queries come back unchanged and never touch the index.
    ///
    /// In strict mode a missing `recommended` promotion is reported as
    /// `None`; otherwise it falls back to `latest`.
    pub async fn resolve(
        &self,
        version: &MinecraftVersion,
        query: &LoaderQuery,
        strict: bool,
    ) -> DistroResult<Option<String>> {
        let channel = match query {
            LoaderQuery::Explicit(build) => return Ok(Some(build.clone())),
            LoaderQuery::Channel(channel) => *channel,
        };

        let index = self.cache.index().await?;
        Ok(resolve_in(&index, version, channel, strict))
    }
}

/// Pure lookup with the fallback rule applied.
pub fn resolve_in(
    index: &PromotionIndex,
    version: &MinecraftVersion,
    channel: Channel,
    strict: bool,
) -> Option<String> {
    if let Some(build) = index.lookup(version, channel) {
        debug!("Forge {} build for {}: {}", channel, version.short(), build);
        return Some(build.to_string());
    }

    if strict || channel != Channel::Recommended {
        return None;
    }

    warn!(
        "No recommended Forge build for {}, falling back to latest",
        version.short()
    );
    index
        .lookup(version, Channel::Latest)
        .map(str::to_string)
}
