// ─── Resolver Registry ───
// Game-version segments mapped to the resolver for that packaging era.

use std::sync::Arc;

use tracing::debug;

use super::context::{ResolveOptions, ResolverContext, ResolverServices};
use super::forge::InstallerProfileResolver;
use super::legacy::LegacyUniversalResolver;
use super::modern::ModernInstallerResolver;
use super::resolver::ModuleResolver;
use crate::core::error::{DistroError, DistroResult};
use crate::core::promotion::PromotionCache;
use crate::core::version::{MinecraftVersion, VersionRange};

/// Builds a resolver bound to one server's context.
pub type ResolverFactory = Box<dyn Fn(ResolverContext) -> Box<dyn ModuleResolver> + Send + Sync>;

struct Segment {
    range: VersionRange,
    factory: ResolverFactory,
}

/// Ordered, non-overlapping table of game-version segments.
pub struct ResolverRegistry {
    services: ResolverServices,
    segments: Vec<Segment>,
}

impl ResolverRegistry {
    /// An empty registry.
    pub fn new(services: ResolverServices) -> Self {
        Self {
            services,
            segments: Vec::new(),
        }
    }

    /// Registry with every Forge era this crate knows about.
    pub fn forge(services: ResolverServices) -> DistroResult<Self> {
        let mut registry = Self::new(services);
        registry.register(
            VersionRange::half_open(MinecraftVersion::new(1, 7, 0), MinecraftVersion::new(1, 13, 0)),
            |ctx| Box::new(LegacyUniversalResolver::new(ctx)),
        )?;
        registry.register(
            VersionRange::half_open(MinecraftVersion::new(1, 13, 0), MinecraftVersion::new(1, 17, 0)),
            |ctx| Box::new(InstallerProfileResolver::new(ctx)),
        )?;
        registry.register(
            VersionRange::at_least(MinecraftVersion::new(1, 17, 0)),
            |ctx| Box::new(ModernInstallerResolver::new(ctx)),
        )?;
        Ok(registry)
    }

    /// Add a segment. Ranges may leave gaps but must not overlap.
    pub fn register<F>(&mut self, range: VersionRange, factory: F) -> DistroResult<()>
    where
        F: Fn(ResolverContext) -> Box<dyn ModuleResolver> + Send + Sync + 'static,
    {
        if let Some(existing) = self.segments.iter().find(|s| s.range.overlaps(&range)) {
            return Err(DistroError::OverlappingRange {
                range: range.to_string(),
                existing: existing.range.to_string(),
            });
        }

        self.segments.push(Segment {
            range,
            factory: Box::new(factory),
        });
        Ok(())
    }

    /// Resolver for `version`, bound to `options`. `None` means no segment
    /// covers the version.
    pub fn select(
        &self,
        version: &MinecraftVersion,
        options: &ResolveOptions,
    ) -> Option<Box<dyn ModuleResolver>> {
        let segment = self.segments.iter().find(|s| s.range.contains(version))?;
        let resolver = (segment.factory)(ResolverContext {
            game_version: *version,
            options: options.clone(),
            services: self.services.clone(),
        });
        debug!(
            "Selected {} resolver for {} ({})",
            resolver.era(),
            version,
            segment.range
        );
        Some(resolver)
    }

    /// Registered ranges in registration order.
    pub fn segments(&self) -> impl Iterator<Item = &VersionRange> {
        self.segments.iter().map(|s| &s.range)
    }

    pub fn promotions(&self) -> &Arc<PromotionCache> {
        &self.services.promotions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::test_support::{services, FixtureFetcher, MemoryArtifactStore, TEST_BASE_URL};

    fn v(text: &str) -> MinecraftVersion {
        text.parse().unwrap()
    }

    fn registry() -> ResolverRegistry {
        let services = services(
            Arc::new(FixtureFetcher::new()),
            Arc::new(MemoryArtifactStore::new()),
        );
        ResolverRegistry::forge(services).unwrap()
    }

    fn era_of(registry: &ResolverRegistry, version: &str) -> Option<&'static str> {
        let options = ResolveOptions::new("/srv", "alpha", TEST_BASE_URL);
        registry.select(&v(version), &options).map(|r| r.era())
    }

    #[test]
    fn selects_era_at_each_boundary() {
        let registry = registry();
        assert_eq!(era_of(&registry, "1.7"), Some("legacy-universal"));
        assert_eq!(era_of(&registry, "1.12.2"), Some("legacy-universal"));
        assert_eq!(era_of(&registry, "1.13"), Some("installer-profile"));
        assert_eq!(era_of(&registry, "1.16.5"), Some("installer-profile"));
        assert_eq!(era_of(&registry, "1.17"), Some("modern-installer"));
        assert_eq!(era_of(&registry, "1.21.1"), Some("modern-installer"));
    }

    #[test]
    fn versions_outside_every_segment_are_unsupported() {
        let registry = registry();
        assert_eq!(era_of(&registry, "1.6.4"), None);
        assert_eq!(era_of(&registry, "0.30"), None);
    }

    #[test]
    fn overlapping_ranges_are_rejected() {
        let mut registry = registry();
        let err = registry
            .register(
                VersionRange::closed(v("1.12.2"), v("1.13")),
                |ctx| Box::new(LegacyUniversalResolver::new(ctx)),
            )
            .unwrap_err();
        assert!(matches!(err, DistroError::OverlappingRange { .. }));
        assert_eq!(registry.segments().count(), 3);
    }

    #[test]
    fn disjoint_ranges_register_and_select() {
        let services = services(
            Arc::new(FixtureFetcher::new()),
            Arc::new(MemoryArtifactStore::new()),
        );
        let mut registry = ResolverRegistry::new(services);
        registry
            .register(VersionRange::closed(v("1.5"), v("1.5.2")), |ctx| {
                Box::new(LegacyUniversalResolver::new(ctx))
            })
            .unwrap();
        registry
            .register(VersionRange::half_open(v("1.6"), v("1.7")), |ctx| {
                Box::new(InstallerProfileResolver::new(ctx))
            })
            .unwrap();

        assert_eq!(era_of(&registry, "1.5.2"), Some("legacy-universal"));
        assert_eq!(era_of(&registry, "1.5.3"), None);
        assert_eq!(era_of(&registry, "1.6"), Some("installer-profile"));
        assert_eq!(era_of(&registry, "1.7"), None);
    }
}
